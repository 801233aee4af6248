use rjudge_util::model::{ProblemRef, SubmissionId};
use rjudge_util::select;
use rjudge_util::service::scrape::Scrape;
use scraper::{ElementRef, Html};

/// Submission history of the logged in account in one contest, newest first.
pub struct MyPage {
    content: Html,
}

impl MyPage {
    pub fn path(problem: &ProblemRef) -> String {
        format!("contest/{}/my", problem.group_id())
    }

    pub fn new(body: &str) -> Self {
        Self {
            content: Html::parse_document(body),
        }
    }

    pub fn extract_latest_submission_id(&self) -> Option<SubmissionId> {
        self.find_first(select!("a.view-source[submissionid]"))?
            .value()
            .attr("submissionid")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(SubmissionId::from)
    }
}

impl Scrape for MyPage {
    fn elem(&self) -> ElementRef {
        self.content.root_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path() {
        let problem = ProblemRef::parse("1201E2").unwrap();
        assert_eq!(MyPage::path(&problem), "contest/1201/my");
    }

    #[test]
    fn test_extract_latest_submission_id() {
        let page = MyPage::new(include_str!("../../tests/fixtures/my.html"));
        assert_eq!(
            page.extract_latest_submission_id(),
            Some(SubmissionId::from("176856006"))
        );
    }

    #[test]
    fn test_empty_history() {
        let page = MyPage::new("<html><body><table class=\"status-frame-datatable\"></table></body></html>");
        assert_eq!(page.extract_latest_submission_id(), None);
    }
}

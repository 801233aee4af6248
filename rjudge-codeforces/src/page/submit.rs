use rjudge_util::model::{LangIdRef, ProblemRef};
use rjudge_util::service::scrape::Scrape;
use scraper::{ElementRef, Html};

use crate::page::HasFormErrors;

/// Submit page, returned again with inline errors when a submission is refused.
pub struct SubmitPage {
    content: Html,
}

impl SubmitPage {
    const TAB_SIZE: &'static str = "4";

    pub fn path(problem: &ProblemRef, token: &str) -> String {
        format!("contest/{}/submit?csrf_token={}", problem.group_id(), token)
    }

    pub fn submit_form<'a>(
        problem: &'a ProblemRef,
        lang_id: LangIdRef<'a>,
        source: &'a str,
        token: &'a str,
    ) -> [(&'static str, &'a str); 7] {
        [
            ("csrf_token", token),
            ("action", "submitSolutionFormSubmitted"),
            ("tabSize", Self::TAB_SIZE),
            ("source", source),
            ("contestId", problem.group_id().as_str()),
            ("submittedProblemIndex", problem.index().as_str()),
            ("programTypeId", lang_id),
        ]
    }

    pub fn new(body: &str) -> Self {
        Self {
            content: Html::parse_document(body),
        }
    }
}

impl Scrape for SubmitPage {
    fn elem(&self) -> ElementRef {
        self.content.root_element()
    }
}

impl HasFormErrors for SubmitPage {}

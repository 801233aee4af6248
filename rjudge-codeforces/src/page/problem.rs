use rjudge_util::error::{RemoteError, RemoteResult};
use rjudge_util::model::{ProblemRef, ProblemStatement, Sample};
use rjudge_util::select;
use rjudge_util::service::scrape::{parse_first_number, Scrape};
use scraper::{ElementRef, Html};

use crate::render::{render_section, sample_text};

pub struct ProblemPage {
    content: Html,
}

impl ProblemPage {
    pub fn path(problem: &ProblemRef) -> String {
        format!("contest/{}/problem/{}", problem.group_id(), problem.index())
    }

    pub fn new(body: &str) -> Self {
        Self {
            content: Html::parse_document(body),
        }
    }

    pub fn extract_statement(&self) -> RemoteResult<ProblemStatement> {
        let statement = self
            .find_first(select!("div.problem-statement"))
            .map(StatementElem)
            .ok_or_else(|| parse_error("Could not find problem statement"))?;
        Ok(ProblemStatement::new(
            statement.extract_title()?,
            statement.extract_time_limit_ms()?,
            statement.extract_memory_limit_mb()?,
            statement.extract_legend(),
            statement.extract_section(select!("div.input-specification")),
            statement.extract_section(select!("div.output-specification")),
            statement.extract_section(select!("div.note")),
            statement.extract_samples(),
        ))
    }
}

impl Scrape for ProblemPage {
    fn elem(&self) -> ElementRef {
        self.content.root_element()
    }
}

struct StatementElem<'a>(ElementRef<'a>);

impl StatementElem<'_> {
    fn select_header_text(&self, selector: &scraper::Selector, name: &str) -> RemoteResult<String> {
        self.find_first(selector)
            .map(|elem| elem.inner_text())
            .ok_or_else(|| parse_error(format!("Could not find {}", name)))
    }

    fn extract_title(&self) -> RemoteResult<String> {
        let title = self.select_header_text(select!(".header .title"), "problem title")?;
        let title = title.trim();
        let name = title.splitn(2, ". ").nth(1).unwrap_or(title);
        Ok(name.trim().to_owned())
    }

    fn extract_time_limit_ms(&self) -> RemoteResult<u64> {
        let text = self.select_header_text(select!(".header .time-limit"), "time limit")?;
        let seconds = parse_first_number(&text)
            .ok_or_else(|| parse_error(format!("Could not parse time limit : {}", text)))?;
        Ok((seconds * 1000.0).round() as u64)
    }

    fn extract_memory_limit_mb(&self) -> RemoteResult<f64> {
        let text = self.select_header_text(select!(".header .memory-limit"), "memory limit")?;
        parse_first_number(&text)
            .ok_or_else(|| parse_error(format!("Could not parse memory limit : {}", text)))
    }

    /// The legend is the only direct child block without a class.
    fn extract_legend(&self) -> String {
        self.0
            .children()
            .filter_map(ElementRef::wrap)
            .find(|elem| elem.value().name() == "div" && elem.value().attr("class").is_none())
            .map(render_section)
            .unwrap_or_default()
    }

    fn extract_section(&self, selector: &scraper::Selector) -> String {
        self.find_first(selector)
            .map(render_section)
            .unwrap_or_default()
    }

    fn extract_samples(&self) -> Vec<Sample> {
        let inputs = self.0.select(select!("div.input pre")).map(sample_text);
        let outputs = self.0.select(select!("div.output pre")).map(sample_text);
        inputs
            .zip(outputs)
            .enumerate()
            .map(|(i, (input, output))| Sample::new((i + 1).to_string(), input, output))
            .collect()
    }
}

impl Scrape for StatementElem<'_> {
    fn elem(&self) -> ElementRef {
        self.0
    }
}

fn parse_error(message: impl Into<String>) -> RemoteError {
    RemoteError::Parse(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rjudge_util::assert_matches;

    fn statement() -> ProblemStatement {
        ProblemPage::new(include_str!("../../tests/fixtures/problem.html"))
            .extract_statement()
            .unwrap()
    }

    #[test]
    fn test_path() {
        let problem = ProblemRef::parse("1200A").unwrap();
        assert_eq!(ProblemPage::path(&problem), "contest/1200/problem/A");
    }

    #[test]
    fn test_extract_header() {
        let statement = statement();
        assert_eq!(statement.title(), "Hotelier");
        assert_eq!(statement.time_limit_ms(), 1000);
        assert!((statement.memory_limit_mb() - 256.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_prose() {
        let statement = statement();
        assert_eq!(
            statement.description(),
            "Amugae has a hotel consisting of $10$ rooms.\n\n\
             Initially the hotel was empty. Amugae remembers **all** events."
        );
        assert_eq!(
            statement.input_format(),
            "The first line consists of an integer $n$ ($1 \\le n \\le 10^5$)."
        );
        assert_eq!(
            statement.output_format(),
            "In the only line, output the hotel room's assignment status."
        );
        assert_eq!(statement.notes(), "In the first example, rooms are filled from the left.");
    }

    #[test]
    fn test_extract_samples() {
        let statement = statement();
        assert_eq!(
            statement.samples(),
            &vec![
                Sample::new("1", "8\nLLRL1RL1", "1010000011"),
                Sample::new("2", "9\nL0L0LLRR9", "1100000010"),
            ]
        );
    }

    #[test]
    fn test_missing_statement() {
        let page = ProblemPage::new("<html><body><div class=\"datatable\"></div></body></html>");
        assert_matches!(page.extract_statement() => Err(RemoteError::Parse(_)));
    }
}

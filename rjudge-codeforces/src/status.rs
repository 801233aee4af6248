use std::collections::HashMap;

use rjudge_util::error::{RemoteError, RemoteResult};
use rjudge_util::model::{CaseResult, NormalizedVerdict, Verdict};
use rjudge_util::regex;
use rjudge_util::service::scrape::Scrape as _;
use scraper::Html;
use serde_json::Value;

/// Checked in order; the first fragment contained in the raw verdict wins.
static STATUS_TABLE: &[(&str, Verdict)] = &[
    ("Accepted", Verdict::Accepted),
    ("Wrong answer", Verdict::WrongAnswer),
    ("Runtime error", Verdict::RuntimeError),
    ("Time limit exceeded", Verdict::TimeLimitExceeded),
    ("Memory limit exceeded", Verdict::MemoryLimitExceeded),
    ("Compilation error", Verdict::CompileError),
    ("Running", Verdict::Waiting),
    ("queue", Verdict::Waiting),
    ("Pending", Verdict::Waiting),
];

static IN_PROGRESS_MARKERS: &[&str] = &["Running", "Pending", "queue"];

/// Maps a raw codeforces verdict to the platform vocabulary.
///
/// Verdicts missing from the table become `RuntimeError`.
pub fn map_status(raw: &str) -> Verdict {
    STATUS_TABLE
        .iter()
        .find(|(fragment, _)| raw.contains(fragment))
        .map(|&(_, verdict)| verdict)
        .unwrap_or(Verdict::RuntimeError)
}

pub fn is_in_progress(raw: &str) -> bool {
    IN_PROGRESS_MARKERS.iter().any(|marker| raw.contains(marker))
}

/// Key/value payload of `data/submitSource`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPayload(HashMap<String, Value>);

impl StatusPayload {
    pub fn parse(body: &str) -> RemoteResult<Self> {
        serde_json::from_str(body)
            .map(Self)
            .map_err(|err| RemoteError::VerdictUnavailable(format!("Malformed payload : {}", err)))
    }

    fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn get_u64(&self, key: &str) -> Option<u64> {
        self.get_str(key)?.trim().parse().ok()
    }

    /// Verdict text with markup removed.
    pub fn verdict_text(&self) -> RemoteResult<String> {
        let raw = self
            .get_str("verdict")
            .ok_or_else(|| RemoteError::VerdictUnavailable("No verdict in payload".into()))?;
        let text = Html::parse_fragment(&raw).root_element().inner_text();
        let text = regex!(r"\s+").replace_all(text.trim(), " ").into_owned();
        if text.is_empty() {
            return Err(RemoteError::VerdictUnavailable("Verdict is empty".into()));
        }
        Ok(text)
    }

    pub fn normalize(&self) -> RemoteResult<NormalizedVerdict> {
        let info = self.verdict_text()?;
        let status = map_status(&info);
        if is_in_progress(&info) {
            return Ok(NormalizedVerdict::in_progress(status, info));
        }
        if status == Verdict::CompileError {
            let message = self.get_str("checkerStdoutAndStderr#1");
            return Ok(NormalizedVerdict::compile_error(info, message));
        }

        let score = if status == Verdict::Accepted { 100 } else { 0 };
        let test_count = self.get_u64("testCount").unwrap_or(0) as usize;
        let cases = self.reconstruct_cases(status, &info, score, test_count);
        Ok(NormalizedVerdict::judged(status, info, score, cases))
    }

    /// Codeforces only reports the first failing test, so every earlier test
    /// is taken as passed and later ones are scored like the failing one.
    fn reconstruct_cases(
        &self,
        status: Verdict,
        info: &str,
        score: u32,
        test_count: usize,
    ) -> Vec<CaseResult> {
        let failing = failing_case(info, test_count);
        let rate = f64::from(score) / 100.0;
        let mut time_ms = 0;
        (1..=test_count)
            .map(|i| {
                time_ms = time_ms.max(self.get_u64(&format!("timeConsumed#{}", i)).unwrap_or(0));
                let memory_kb = self.get_u64(&format!("memoryConsumed#{}", i)).unwrap_or(0) / 1024;
                let (case_status, case_rate) = if i < failing {
                    (Verdict::Accepted, 1.0)
                } else if i == failing {
                    (status, rate)
                } else {
                    (Verdict::Accepted, rate)
                };
                CaseResult::new(case_status, case_rate, time_ms, memory_kb).with_data(
                    self.get_str(&format!("input#{}", i)),
                    self.get_str(&format!("answer#{}", i)),
                    self.get_str(&format!("output#{}", i)),
                    self.get_str(&format!("checkerStdoutAndStderr#{}", i)),
                )
            })
            .collect()
    }
}

/// One-based index of the failing test: the `on test N` of the verdict,
/// otherwise the last test.
fn failing_case(info: &str, test_count: usize) -> usize {
    regex!(r"on test (\d+)")
        .captures(info)
        .and_then(|caps| caps[1].parse::<usize>().ok())
        .filter(|&n| n >= 1 && n <= test_count)
        .unwrap_or(test_count)
}

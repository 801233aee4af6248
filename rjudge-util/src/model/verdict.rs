use std::fmt;

use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// Verdict vocabulary exposed to the platform.
#[derive(
    Serialize,
    Deserialize,
    EnumVariantNames,
    IntoStaticStr,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
)]
pub enum Verdict {
    #[serde(rename = "Accepted")]
    #[strum(serialize = "Accepted")]
    Accepted,
    #[serde(rename = "Wrong Answer")]
    #[strum(serialize = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Runtime Error")]
    #[strum(serialize = "Runtime Error")]
    RuntimeError,
    #[serde(rename = "Time Limit Exceeded")]
    #[strum(serialize = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[serde(rename = "Memory Limit Exceeded")]
    #[strum(serialize = "Memory Limit Exceeded")]
    MemoryLimitExceeded,
    #[serde(rename = "Compile Error")]
    #[strum(serialize = "Compile Error")]
    CompileError,
    #[serde(rename = "Waiting")]
    #[strum(serialize = "Waiting")]
    Waiting,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.into())
    }
}

/// Result of a single test case.
#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq)]
pub struct CaseResult {
    #[get_copy = "pub"]
    status: Verdict,
    #[get_copy = "pub"]
    scoring_rate: f64,
    #[get_copy = "pub"]
    time_ms: u64,
    #[get_copy = "pub"]
    memory_kb: u64,
    #[get = "pub"]
    input: Option<String>,
    #[get = "pub"]
    answer: Option<String>,
    #[get = "pub"]
    user_output: Option<String>,
    #[get = "pub"]
    checker_message: Option<String>,
}

impl CaseResult {
    pub fn new(status: Verdict, scoring_rate: f64, time_ms: u64, memory_kb: u64) -> Self {
        Self {
            status,
            scoring_rate,
            time_ms,
            memory_kb,
            input: None,
            answer: None,
            user_output: None,
            checker_message: None,
        }
    }

    pub fn with_data(
        mut self,
        input: Option<String>,
        answer: Option<String>,
        user_output: Option<String>,
        checker_message: Option<String>,
    ) -> Self {
        self.input = input;
        self.answer = answer;
        self.user_output = user_output;
        self.checker_message = checker_message;
        self
    }
}

/// Judging result in the platform's own schema.
///
/// A fresh value is built on every poll.
#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq)]
pub struct NormalizedVerdict {
    #[get_copy = "pub"]
    status: Verdict,
    #[get_copy = "pub"]
    is_terminal: bool,
    /// Raw verdict text shown by the remote judge.
    #[get = "pub"]
    info: String,
    #[get_copy = "pub"]
    score: u32,
    #[get_copy = "pub"]
    time_ms: u64,
    #[get_copy = "pub"]
    memory_kb: u64,
    #[get = "pub"]
    cases: Vec<CaseResult>,
    #[get = "pub"]
    compile_message: Option<String>,
}

impl NormalizedVerdict {
    pub fn in_progress(status: Verdict, info: impl Into<String>) -> Self {
        Self {
            status,
            is_terminal: false,
            info: info.into(),
            score: 0,
            time_ms: 0,
            memory_kb: 0,
            cases: Vec::new(),
            compile_message: None,
        }
    }

    pub fn compile_error(info: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status: Verdict::CompileError,
            is_terminal: true,
            info: info.into(),
            score: 0,
            time_ms: 0,
            memory_kb: 0,
            cases: Vec::new(),
            compile_message: message,
        }
    }

    /// Builds a terminal verdict; time and memory are the maxima over `cases`.
    pub fn judged(
        status: Verdict,
        info: impl Into<String>,
        score: u32,
        cases: Vec<CaseResult>,
    ) -> Self {
        let time_ms = cases.iter().map(CaseResult::time_ms).max().unwrap_or(0);
        let memory_kb = cases.iter().map(CaseResult::memory_kb).max().unwrap_or(0);
        Self {
            status,
            is_terminal: true,
            info: info.into(),
            score,
            time_ms,
            memory_kb,
            cases,
            compile_message: None,
        }
    }
}

impl fmt::Display for NormalizedVerdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.status, self.info)?;
        if self.is_terminal && self.status != Verdict::CompileError {
            write!(
                f,
                " score: {}, time: {}ms, memory: {}KB",
                self.score, self.time_ms, self.memory_kb
            )?;
        }
        Ok(())
    }
}

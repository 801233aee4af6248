use std::fmt;
use std::fmt::Write as _;

use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

use crate::model::Sample;

/// Reference to a problem on the remote judge, e.g. `1200A` or `1201E2`.
#[derive(Serialize, Deserialize, Getters, Debug, Clone, PartialEq, Eq, Hash)]
#[get = "pub"]
pub struct ProblemRef {
    group_id: String,
    index: String,
}

impl ProblemRef {
    /// Splits `raw` at its first letter.
    ///
    /// Returns `None` when there is no letter or nothing precedes it.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let pos = raw.find(|c: char| c.is_ascii_alphabetic())?;
        if pos == 0 {
            return None;
        }
        let (group_id, index) = raw.split_at(pos);
        Some(Self {
            group_id: group_id.to_owned(),
            index: index.to_owned(),
        })
    }
}

impl fmt::Display for ProblemRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.group_id, self.index)
    }
}

#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq)]
pub struct ProblemStatement {
    #[get = "pub"]
    title: String,
    #[get_copy = "pub"]
    time_limit_ms: u64,
    #[get_copy = "pub"]
    memory_limit_mb: f64,
    #[get = "pub"]
    description: String,
    #[get = "pub"]
    input_format: String,
    #[get = "pub"]
    output_format: String,
    #[get = "pub"]
    notes: String,
    #[get = "pub"]
    samples: Vec<Sample>,
}

impl ProblemStatement {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        time_limit_ms: u64,
        memory_limit_mb: f64,
        description: impl Into<String>,
        input_format: impl Into<String>,
        output_format: impl Into<String>,
        notes: impl Into<String>,
        samples: Vec<Sample>,
    ) -> Self {
        Self {
            title: title.into(),
            time_limit_ms,
            memory_limit_mb,
            description: description.into(),
            input_format: input_format.into(),
            output_format: output_format.into(),
            notes: notes.into(),
            samples,
        }
    }

    /// Renders samples as fenced markdown blocks.
    pub fn samples_markdown(&self) -> String {
        let mut md = String::new();
        for sample in &self.samples {
            if !md.is_empty() {
                md.push('\n');
            }
            // writing to String never fails
            let _ = write!(
                md,
                "#### Sample Input {name}\n```plain\n{input}\n```\n\n\
                 #### Sample Output {name}\n```plain\n{output}\n```\n",
                name = sample.name(),
                input = sample.input().trim_end(),
                output = sample.output().trim_end(),
            );
        }
        md
    }
}

use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use rjudge_codeforces::Codeforces;
use rjudge_config::Config;
use rjudge_util::console::Console;
use rjudge_util::model::ProblemStatement;

use crate::cmd::{Outcome, Run};
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct ProblemOpt {
    /// Problem reference such as 1200A
    problem_ref: String,
}

impl Run for ProblemOpt {
    fn run(&self, conf: &Config, _cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let codeforces = Codeforces::new(conf)?;
        let statement = codeforces.get_problem(&self.problem_ref)?;
        Ok(Box::new(ProblemOutcome {
            problem_ref: self.problem_ref.clone(),
            statement,
        }))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProblemOutcome {
    problem_ref: String,
    statement: Option<ProblemStatement>,
}

impl fmt::Display for ProblemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let statement = match &self.statement {
            Some(statement) => statement,
            None => return write!(f, "Could not find problem : {}", self.problem_ref),
        };
        writeln!(f, "# {}", statement.title())?;
        writeln!(
            f,
            "\ntime limit: {}ms, memory limit: {}MB",
            statement.time_limit_ms(),
            statement.memory_limit_mb()
        )?;
        let sections = [
            ("Statement", statement.description()),
            ("Input", statement.input_format()),
            ("Output", statement.output_format()),
            ("Note", statement.notes()),
        ];
        for (title, body) in sections.iter() {
            if !body.is_empty() {
                writeln!(f, "\n## {}\n\n{}", title, body)?;
            }
        }
        if !statement.samples().is_empty() {
            write!(f, "\n## Samples\n\n{}", statement.samples_markdown())?;
        }
        Ok(())
    }
}

impl Outcome for ProblemOutcome {
    fn is_error(&self) -> bool {
        self.statement.is_none()
    }
}

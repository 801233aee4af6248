use std::fmt;
use std::io::Write as _;

use serde::Serialize;
use structopt::StructOpt;

use rjudge_codeforces::Codeforces;
use rjudge_config::Config;
use rjudge_util::console::Console;
use rjudge_util::model::{NormalizedVerdict, SubmissionId};

use crate::cmd::{is_failed, styled_verdict, Outcome, Run};
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct StatusOpt {
    /// Submission id shown by the submit command
    submission_id: String,
    /// Polls until the submission is judged
    #[structopt(long, short = "w")]
    wait: bool,
}

impl Run for StatusOpt {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let codeforces = Codeforces::new(conf)?;
        let id = SubmissionId::from(self.submission_id.as_str());
        let verdict = if self.wait {
            codeforces.wait_verdict(&id, |verdict| {
                writeln!(cnsl, "{}", styled_verdict(verdict)).ok();
            })?
        } else {
            codeforces.get_submission_status(&id)?
        };
        Ok(Box::new(StatusOutcome::new(id, verdict)))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusOutcome {
    submission_id: SubmissionId,
    verdict: NormalizedVerdict,
}

impl StatusOutcome {
    pub fn new(submission_id: SubmissionId, verdict: NormalizedVerdict) -> Self {
        Self {
            submission_id,
            verdict,
        }
    }
}

impl fmt::Display for StatusOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} : {}", self.submission_id, styled_verdict(&self.verdict))?;
        for (i, case) in self.verdict.cases().iter().enumerate() {
            write!(
                f,
                "\n  #{:<3} {} {}ms {}KB",
                i + 1,
                case.status(),
                case.time_ms(),
                case.memory_kb()
            )?;
        }
        if let Some(message) = self.verdict.compile_message() {
            write!(f, "\n{}", message)?;
        }
        Ok(())
    }
}

impl Outcome for StatusOutcome {
    fn is_error(&self) -> bool {
        is_failed(&self.verdict)
    }
}

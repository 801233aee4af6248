use std::fmt;
use std::io::{Read as _, Write as _};
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{anyhow, Context as _};
use serde::Serialize;
use structopt::StructOpt;

use rjudge_codeforces::Codeforces;
use rjudge_config::Config;
use rjudge_util::abs_path::AbsPathBuf;
use rjudge_util::console::Console;
use rjudge_util::model::{NormalizedVerdict, SubmissionId};

use crate::cmd::{is_failed, styled_verdict, Outcome, Run};
use crate::{Error, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct SubmitOpt {
    /// Problem reference such as 1200A
    problem_ref: String,
    /// Codeforces language id such as 54 (GNU G++17)
    lang_id: String,
    /// Source file to submit
    source: PathBuf,
    /// Waits until the submission is judged
    #[structopt(long, short = "w")]
    wait: bool,
}

impl SubmitOpt {
    fn load_source(&self, cnsl: &mut Console) -> Result<String> {
        let cwd = AbsPathBuf::cwd()?;
        let source = cwd.join(&self.source).load_pretty(
            |mut file| {
                let mut source = String::new();
                file.read_to_string(&mut source)?;
                Ok(source)
            },
            Some(&cwd),
            cnsl,
        )?;
        if source.trim().is_empty() {
            return Err(Error::msg("Found empty source file"));
        }
        Ok(source)
    }
}

impl Run for SubmitOpt {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let source = self
            .load_source(cnsl)
            .context("Could not load source file")?;

        let message = format!(
            "Submit {} to {} with language {}?",
            self.source.display(),
            self.problem_ref,
            self.lang_id
        );
        if !cnsl.confirm(&message, true)? {
            return Err(Error::msg("Submission was cancelled"));
        }

        let codeforces = Codeforces::new(conf)?;
        let (tx, rx) = mpsc::channel();
        let handle = codeforces
            .submit_code(
                source,
                self.problem_ref.as_str(),
                self.lang_id.as_str(),
                move |result| {
                    tx.send(result).ok();
                },
            )?
            .to_owned();
        writeln!(cnsl, "Submitting {} as {} ...", self.problem_ref, handle)?;

        let submission_id = match rx.recv().context("Worker stopped without an answer")? {
            Ok(id) => id,
            Err(err) if err.is_partial_success() => {
                cnsl.warn("Submission reached codeforces, check the history before resubmitting")?;
                return Err(err.into());
            }
            Err(err) => return Err(anyhow!(err).context("Could not submit")),
        };
        writeln!(cnsl, "Submitted as {}", submission_id)?;

        let verdict = if self.wait {
            let verdict = codeforces.wait_verdict(&submission_id, |verdict| {
                writeln!(cnsl, "{}", styled_verdict(verdict)).ok();
            })?;
            Some(verdict)
        } else {
            None
        };

        Ok(Box::new(SubmitOutcome {
            problem_ref: self.problem_ref.clone(),
            handle,
            submission_id,
            verdict,
        }))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    problem_ref: String,
    handle: String,
    submission_id: SubmissionId,
    verdict: Option<NormalizedVerdict>,
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Submitted {} as {} : {}",
            self.problem_ref, self.handle, self.submission_id
        )?;
        if let Some(verdict) = &self.verdict {
            write!(f, "\n{}", styled_verdict(verdict))?;
        }
        Ok(())
    }
}

impl Outcome for SubmitOutcome {
    fn is_error(&self) -> bool {
        self.verdict.as_ref().map_or(false, is_failed)
    }
}

use std::{fmt, io};

use anyhow::Context as _;
use serde::Serialize;
use structopt::StructOpt;

use rjudge_config::Config;
use rjudge_util::console::{sty_g, sty_r, sty_y, Console};
use rjudge_util::model::{NormalizedVerdict, Verdict};

use crate::{OutputFormat, Result};

mod init;
mod problem;
mod status;
mod submit;

pub use init::{InitOpt, InitOutcome};
pub use problem::{ProblemOpt, ProblemOutcome};
pub use status::{StatusOpt, StatusOutcome};
pub use submit::{SubmitOpt, SubmitOutcome};

pub trait Outcome: OutcomeSerialize {
    fn is_error(&self) -> bool;
}

pub trait OutcomeSerialize: fmt::Display + fmt::Debug {
    fn write_json(&self, writer: &mut dyn io::Write) -> Result<()>;

    fn write_yaml(&self, writer: &mut dyn io::Write) -> Result<()>;

    fn print(&self, stdout: &mut dyn io::Write, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Default => writeln!(stdout, "{}", self)?,
            OutputFormat::Debug => writeln!(stdout, "{:?}", self)?,
            OutputFormat::Json => {
                self.write_json(stdout)?;
                writeln!(stdout)?;
            }
            OutputFormat::Yaml => self.write_yaml(stdout)?,
        }
        Ok(())
    }
}

impl<T: Serialize + fmt::Display + fmt::Debug> OutcomeSerialize for T {
    fn write_json(&self, writer: &mut dyn io::Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).context("Could not print outcome as json")
    }

    fn write_yaml(&self, writer: &mut dyn io::Write) -> Result<()> {
        serde_yaml::to_writer(writer, self).context("Could not print outcome as yaml")
    }
}

pub trait Run {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>>;
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub enum Cmd {
    /// Creates config file
    Init(InitOpt),
    /// Fetches a problem statement
    Problem(ProblemOpt),
    /// Submits source code through one of the configured accounts
    Submit(SubmitOpt),
    /// Shows the verdict of a submission
    Status(StatusOpt),
}

impl Run for Cmd {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        match self {
            Self::Init(opt) => Ok(Box::new(opt.run(cnsl)?)),
            Self::Problem(opt) => opt.run(conf, cnsl),
            Self::Submit(opt) => opt.run(conf, cnsl),
            Self::Status(opt) => opt.run(conf, cnsl),
        }
    }
}

/// A terminal verdict other than Accepted.
fn is_failed(verdict: &NormalizedVerdict) -> bool {
    verdict.is_terminal() && verdict.status() != Verdict::Accepted
}

fn styled_verdict(verdict: &NormalizedVerdict) -> String {
    if !verdict.is_terminal() {
        sty_y(verdict).to_string()
    } else if verdict.status() == Verdict::Accepted {
        sty_g(verdict).to_string()
    } else {
        sty_r(verdict).to_string()
    }
}

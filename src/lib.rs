#![warn(clippy::all)]

#[macro_use]
extern crate strum;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context as _;
use structopt::StructOpt;
use strum::VariantNames;
use tracing::debug;

mod cmd;

use rjudge_config::Config;
use rjudge_util::abs_path::AbsPathBuf;
use rjudge_util::console::{Console, ConsoleConfig};

use cmd::{Cmd, Outcome, Run as _};

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

#[derive(
    EnumString, EnumVariantNames, IntoStaticStr, Debug, Copy, Clone, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    Default,
    Debug,
    Json,
    Yaml,
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct Opt {
    #[structopt(flatten)]
    global_opt: GlobalOpt,
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct GlobalOpt {
    /// Directory that contains rjudge.yaml. Searched upward from the current directory if omitted.
    #[structopt(long, global = true, env = "RJUDGE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
    /// Format of the command outcome
    #[structopt(
        long,
        global = true,
        default_value = OutputFormat::Default.into(),
        possible_values = &OutputFormat::VARIANTS,
    )]
    output: OutputFormat,
    /// Assumes yes for every confirmation
    #[structopt(long, short = "y", global = true)]
    assume_yes: bool,
    /// Prints debug logs
    #[structopt(long, global = true)]
    debug: bool,
}

impl Opt {
    pub fn is_debug(&self) -> bool {
        self.global_opt.debug
    }

    pub fn console_config(&self) -> ConsoleConfig {
        ConsoleConfig {
            assume_yes: self.global_opt.assume_yes,
        }
    }

    pub fn run(&self, cnsl: &mut Console, stdout: &mut dyn Write) -> Result<()> {
        debug!("Running {:?}", self.cmd);
        let outcome = match &self.cmd {
            Cmd::Init(opt) => Box::new(opt.run(cnsl)?) as Box<dyn Outcome>,
            cmd => {
                let conf = self.load_config(cnsl).context("Could not load config")?;
                cmd.run(&conf, cnsl)?
            }
        };
        outcome.print(stdout, self.global_opt.output)?;
        if outcome.is_error() {
            Err(Error::msg("Command exited with error"))
        } else {
            Ok(())
        }
    }

    fn load_config(&self, cnsl: &mut Console) -> Result<Config> {
        match &self.global_opt.config_dir {
            Some(dir) => Config::load(AbsPathBuf::cwd()?.join(dir), cnsl),
            None => Config::search(cnsl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() -> anyhow::Result<()> {
        let opt = Opt::from_iter_safe(&["rjudge", "--output", "json", "status", "176856006"])?;
        assert_eq!(opt.global_opt.output, OutputFormat::Json);
        assert!(Opt::from_iter_safe(&["rjudge", "--output", "xml", "status", "1"]).is_err());
        Ok(())
    }
}

#![warn(clippy::all)]

use std::io::{self, Write as _};

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use rjudge::{Opt, Result};
use rjudge_util::console::Console;

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let default_directive = if opt.is_debug() { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut cnsl = Console::term(opt.console_config());
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    opt.run(&mut cnsl, &mut stdout).map_err(|err| {
        stdout.flush().ok();
        eprintln!();
        err
    })
}

//! Track Relay CLI.

use clap::Parser;
use std::io::{self, IsTerminal};
use tr_core::cli::{run, Cli};
use tr_core::logging::{init_logging, LogConfig};

fn main() {
    let cli = Cli::parse();
    let log_config = LogConfig::from_verbosity(cli.verbose)
        .with_format(cli.log_format)
        .with_ansi(io::stderr().is_terminal());
    if !init_logging(&log_config) {
        eprintln!("warning: logging already initialized");
    }
    let code = run(&cli);
    std::process::exit(code.as_i32());
}

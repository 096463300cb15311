//! CLI tests: argument parsing and the simulator behind `rpcretry simulate`.

use super::{Cli, CliCommand};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn second_logging_init_reports_why() {
    let _ = super::init_logging();
    let msg = super::init_logging().expect("a subscriber is already installed");
    assert!(msg.contains("stderr subscriber"), "{msg}");
}

//! spritedb - Command-line tool for validating game content tables and
//! composing their sprites

use std::process::ExitCode;

use spritedb::cli;

fn main() -> ExitCode {
    cli::run()
}

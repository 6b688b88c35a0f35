//! `thriftgen` command line tool.
//!
//! Run with: `thriftgen -inputFile idl/echo.thrift -outputDir gen`

use std::process::ExitCode;
use thriftgen::driver::{self, DriverOptions, USAGE};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = match DriverOptions::from_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("thriftgen: {}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };
    if options.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    match driver::run(&options) {
        Ok(path) => {
            tracing::info!(path = %path.display(), "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("thriftgen: {}", e);
            ExitCode::from(if e.is_usage() { 2 } else { 1 })
        }
    }
}

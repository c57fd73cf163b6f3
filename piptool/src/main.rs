#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

mod args;
mod options;

use std::process::ExitCode;

use clap::Parser;
use log::{debug, LevelFilter};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::args::PiptoolArgs;
use crate::options::{run, Outcome};

/// Configures log4rs from the given YAML file or, failing that, to write messages to stderr
fn configure_logging(logging_config: &Option<String>) {
    if let Some(logging_config) = logging_config {
        match log4rs::init_file(logging_config, Default::default()) {
            Ok(_) => return,
            Err(e) => eprintln!(
                "ERROR: failed to configure logging using {} with {:?}. Continuing with stderr.",
                logging_config, e
            ),
        }
    }

    // stdout is reserved for results
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build();
    match Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Info))
    {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!(
                    "ERROR: failed to configure logging for stderr with {:?}. Continuing without logging.",
                    e
                );
            }
        }
        Err(e) => {
            eprintln!("ERROR: failed to prepare default logging configuration with {:?}. Continuing without logging", e);
        }
    }
}

/// Point of entry for piptool
fn main() -> ExitCode {
    let args = PiptoolArgs::parse();
    configure_logging(&args.logging_config);
    debug!("piptool start");

    let code = match run(&args) {
        Ok(Outcome::Populated(request)) => match serde_json::to_string_pretty(&request) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("ERROR: failed to serialize request: {}", e);
                ExitCode::FAILURE
            }
        },
        Ok(Outcome::NotApplicable) => {
            println!("Not applicable");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Listing(names)) => {
            for name in names {
                println!("{}", name);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    };

    debug!("piptool end");
    code
}

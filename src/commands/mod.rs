//! Command-line plumbing for the gyre binary.
//!
//! The `run` command wires the crawl core together: it loads configuration,
//! builds the gateway/governor/frontier/store stack, runs the crawler, and
//! prints the end-of-run summary. The `init` command generates a default
//! configuration file.

mod common;
mod init;
mod progress_reporter;
mod run;

pub use init::{InitArgs, init_config};
pub use run::{RunArgs, process_run};

//! # card-ingest CLI
//!
//! Command-line interface for the card ingest tool.
//!
//! ## Usage
//! ```bash
//! card-ingest dates /Volumes/EOS_DIGITAL
//! card-ingest copy /Volumes/EOS_DIGITAL --activity wedding --date 20240101
//! ```

mod cli;

use card_ingest::Result;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    cli::run()
}

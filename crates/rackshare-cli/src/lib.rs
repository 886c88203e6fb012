//! rackshare - command line front end for the rack analyzer
//!
//! Decodes Ableton Live rack presets (`.adg`) in batches and prints the
//! analysis as JSON or as a readable device tree.
//!
//! - Fixed pool of worker threads with a per-file time budget
//! - Configurable via TOML file
//!
//! # Usage as a Library
//!
//! ```no_run
//! use rackshare_cli::{analyze_all, BatchOptions, Config, Job};
//! use rackshare_adg::RackFileDecoder;
//!
//! let config = Config::load_or_default();
//! let decoder = RackFileDecoder::new(config.analyzer.clone()).unwrap();
//! let options = BatchOptions { jobs: config.batch.jobs, timeout: config.batch.timeout() };
//!
//! for outcome in analyze_all(&decoder, vec![Job::new("bass.adg")], options) {
//!     match outcome.result {
//!         Ok(analysis) => println!("{}: {}", analysis.name, analysis.required_edition),
//!         Err(e) => eprintln!("{}", e),
//!     }
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod report;

// Re-export main types
pub use batch::{analyze_all, run_jobs, BatchOptions, FileOutcome, Job};
pub use config::{BatchSettings, Config};
pub use error::{Error, Result};
pub use report::{edition_line, render, render_text, OutputFormat};

//! NJ School Data Library
//!
//! Fetches Form 990 summaries and tuition/cost data for New Jersey schools
//! and writes them to flat CSV and status files.

pub mod config;
pub mod error;
pub mod http;
pub mod nonprofit;
pub mod normalize;
pub mod paginate;
pub mod pipeline;
pub mod scorecard;
pub mod source_health;
pub mod storage;
pub mod types;
pub mod workbook;

pub use types::*;

/// Log to stderr, `info` unless `RUST_LOG` says otherwise
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

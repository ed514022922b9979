//! Election Coordination Engine
//!
//! Coordinates a single-election voting process driven by biometric
//! scanning devices: idempotent voter registration, strictly one ballot
//! per voter under concurrent submission, a setup/open/closed lifecycle,
//! and winner-or-tie tally resolution.

pub mod config;
pub mod engine;
pub mod errors;
pub mod types;

// Re-export commonly used types
pub use errors::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the election engine with proper logging
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "urna=info".into()),
        )
        .init();

    tracing::info!("🗳️  Election engine v{} initialized", VERSION);
    Ok(())
}

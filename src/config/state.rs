// Application state module
// Request-independent state shared by every connection

use std::io;
use std::path::{Path, PathBuf};

use super::types::Config;

/// Application state
///
/// Immutable for the lifetime of the process; requests hold it behind an
/// `Arc` and never mutate it, so no locking is involved.
pub struct AppState {
    pub config: Config,
    /// Canonicalized serving root. Every resolved request path must stay
    /// underneath it.
    pub root: PathBuf,
}

impl AppState {
    /// Build state from a loaded configuration.
    ///
    /// Fails if the serving directory does not exist or is unreadable.
    pub fn new(config: Config) -> io::Result<Self> {
        let root = Path::new(&config.server.directory).canonicalize()?;
        Ok(Self { config, root })
    }
}

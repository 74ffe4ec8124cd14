//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. Cache capacity and pool size are fixed for the process
/// lifetime; there is no dynamic resizing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub cache_capacity: usize,
    /// Number of dispatcher workers handling connections
    pub pool_size: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Snapshot file for the durable store; in-memory store when unset
    pub data_file: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_SIZE` - Maximum cache entries (default: 1000)
    /// - `WORKER_POOL_SIZE` - Dispatcher worker count (default: 8)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `DATA_FILE` - Path to the store snapshot (default: unset)
    pub fn from_env() -> Self {
        Self {
            cache_capacity: env::var("CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            pool_size: env::var("WORKER_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            data_file: env::var("DATA_FILE").ok().map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            pool_size: 8,
            server_port: 8080,
            data_file: None,
        }
    }
}

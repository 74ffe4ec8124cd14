//! Cachefront - a key-value server with a cache-aside layer
//!
//! Serves GET/PUT/DELETE over HTTP from a bounded LRU cache backed by a
//! pluggable durable store.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod store;

pub use api::AppState;
pub use config::Config;
pub use coordinator::{Operation, OperationCoordinator, OperationOutcome};
pub use dispatch::{Dispatcher, DispatcherState};

//! API Module
//!
//! HTTP handlers and routing for the key-value server REST API.
//!
//! # Endpoints
//! - `POST /api/kv` - Store a key-value pair
//! - `GET /api/kv?key=<key>` - Retrieve a value by key
//! - `DELETE /api/kv?key=<key>` - Delete a key
//! - `GET /stats` - Get request statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

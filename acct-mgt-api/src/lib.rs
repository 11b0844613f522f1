//! acct-mgt API Library
//!
//! HTTP facade that provisions projects, users, role bindings and resource
//! quotas on an OpenShift cluster. Exposed as a library for the binary and
//! for integration tests.

// Core modules
pub mod config;
pub mod error;

// Application state
pub mod state;
pub use state::AppState;

// Cluster API integration
pub mod kubernetes;

// HTTP routes
pub mod api;
pub use api::build_router;

// Logging configuration
pub mod logging;

// Graceful shutdown handling
pub mod shutdown;

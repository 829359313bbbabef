//! Codesketch server library: HTTP routes, interactive pages and application
//! state. Kept apart from main.rs so integration tests can build the router.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;

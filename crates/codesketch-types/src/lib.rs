//! Shared types for the codesketch prompt-to-code service.

mod analysis;
mod api;
mod interaction;

pub use analysis::*;
pub use api::*;
pub use interaction::*;

// HTTP API routes
//
// This module contains all HTTP route handlers for the public API.
// Each submodule handles a specific resource type with its own AppState.

pub mod activities;
pub mod common;
pub mod notes;
pub mod uploads;
pub mod users;

// Re-export common types
pub use common::{Envelope, MessageBody};

//! crew-hub - ClassCrew roster hub service
//!
//! Keeps a deduplicated, validated, member-enriched roster of study groups
//! continuously synchronized with the backing document store, and serves it
//! over HTTP/SSE. The core pipeline is:
//!
//! store change notice → normalize → dedup → coordinate filter →
//! concurrent member enrichment → guarded publish

pub mod api;
pub mod error;
pub mod roster;
pub mod seed;
pub mod server;
pub mod state;
pub mod store;

pub use error::{Error, Result};

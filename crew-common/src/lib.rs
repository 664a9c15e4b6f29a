//! # ClassCrew Common Library
//!
//! Shared code for the ClassCrew roster hub:
//! - Domain model (StudyGroup, Member)
//! - Event types (CrewEvent enum) and the EventBus
//! - Service configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod model;

pub use error::{Error, Result};
pub use events::{CrewEvent, EventBus};
pub use model::{Member, StudyGroup};

//! Document store layer
//!
//! The roster core consumes the backing store through the [`RosterSource`]
//! contract: a change-notification stream, a full collection read, and a
//! batched member lookup. [`SqliteStore`] is the production implementation;
//! tests script their own sources.

mod sqlite;

pub use sqlite::{ClearSummary, SqliteStore};

use crate::error::Result;
use crew_common::model::Member;
use std::future::Future;
use tokio::sync::broadcast;

/// Collection holding user profile documents
pub const USERS_COLLECTION: &str = "users";
/// Collection holding study group documents
pub const GROUPS_COLLECTION: &str = "studyGroups";
/// Collection holding the username registry
pub const USERNAMES_COLLECTION: &str = "usernames";

/// Maximum number of values per `in`-style batched lookup
pub const IN_QUERY_LIMIT: usize = 10;

/// A raw stored document: store-assigned id plus opaque JSON payload
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub id: String,
    pub data: serde_json::Value,
}

/// Notification that a collection's contents changed
#[derive(Debug, Clone)]
pub struct ChangeNotice {
    pub collection: String,
}

/// The document-store contract consumed by the roster synchronizer
///
/// Implementations must be cheap to clone (shared handles) since the
/// synchronizer clones the source into detached enrichment tasks.
pub trait RosterSource: Clone + Send + Sync + 'static {
    /// Subscribe to change notifications for all collections.
    fn subscribe_changes(&self) -> broadcast::Receiver<ChangeNotice>;

    /// Read the full study group collection, in insertion order.
    fn list_groups(&self) -> impl Future<Output = Result<Vec<RawDocument>>> + Send;

    /// Resolve up to [`IN_QUERY_LIMIT`] member ids to profile records in one
    /// batched lookup. Unknown ids contribute no entry; a transport failure
    /// fails the whole call.
    fn members_by_ids(&self, ids: Vec<String>)
        -> impl Future<Output = Result<Vec<Member>>> + Send;
}

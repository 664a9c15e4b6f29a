//! Domain model for the published roster
//!
//! Field names serialize in camelCase to match the stored document schema
//! (`memberCount`, `profilePicture`, ...), so roster entries round-trip
//! cleanly between the store, the hub API, and SSE payloads.

use serde::{Deserialize, Serialize};

/// An enriched member profile record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Stable user identifier
    pub id: String,
    /// Display name (may be empty)
    #[serde(default)]
    pub name: String,
    /// Optional profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl Member {
    /// Build a member from a raw stored user document.
    ///
    /// User documents carry their own `id` field (the original store wrote
    /// it explicitly); the document id is the fallback. `displayName` maps
    /// to `name`, with a legacy `name` field accepted. Returns `None` when
    /// no usable id is present.
    pub fn from_document(doc_id: &str, data: &serde_json::Value) -> Option<Self> {
        let id = data
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(doc_id);
        if id.is_empty() {
            return None;
        }

        let name = data
            .get("displayName")
            .or_else(|| data.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let profile_picture = data
            .get("profilePicture")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Some(Self {
            id: id.to_string(),
            name,
            profile_picture,
        })
    }
}

/// A published study group, enriched and validated
///
/// `member_ids` is the authoritative membership list as stored;
/// `members` is the best-effort enriched view and may be shorter when
/// individual profile lookups miss. `coordinates` is always a validated
/// `[longitude, latitude]` pair of finite numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGroup {
    /// Store-assigned stable identifier
    pub id: String,
    pub title: String,
    pub subject: String,
    pub mood: String,
    pub time: String,
    pub location: String,
    pub description: String,
    /// Informational count; membership truth is `member_ids`
    pub member_count: i64,
    /// Raw member identifier list as stored
    #[serde(default)]
    pub member_ids: Vec<String>,
    /// Enriched member profiles (best-effort)
    #[serde(default)]
    pub members: Vec<Member>,
    /// Static display distance, not computed from geolocation
    pub distance: String,
    /// Validated `[longitude, latitude]`
    pub coordinates: [f64; 2],
}

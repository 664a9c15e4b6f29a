//! Record normalization
//!
//! Converts raw stored study group documents into the canonical
//! [`StudyGroup`] shape, tolerating the historical coordinate encodings.
//! Normalization failure is per-record: a malformed document drops out of
//! the snapshot, it never aborts the batch.

use crate::store::RawDocument;
use crew_common::model::StudyGroup;
use std::collections::HashSet;
use tracing::debug;

/// Normalize one raw document. `None` means the record is excluded from the
/// roster (missing id, or no valid coordinate pair).
pub fn normalize_group(doc: &RawDocument) -> Option<StudyGroup> {
    if doc.id.is_empty() {
        return None;
    }
    let data = &doc.data;

    let coordinates = match parse_coordinates(data.get("coordinates")) {
        Some(pair) => pair,
        None => {
            debug!(id = %doc.id, "dropping group without valid coordinates");
            return None;
        }
    };

    Some(StudyGroup {
        id: doc.id.clone(),
        title: str_field(data, "title"),
        subject: str_field(data, "subject"),
        mood: str_field(data, "mood"),
        time: str_field(data, "time"),
        location: str_field(data, "location"),
        description: str_field(data, "description"),
        member_count: data
            .get("memberCount")
            .and_then(|v| v.as_i64())
            .unwrap_or(0),
        member_ids: member_ids(data),
        // Enrichment is a separate step
        members: Vec::new(),
        distance: str_field(data, "distance"),
        coordinates,
    })
}

/// Normalize a full snapshot: per-record normalization, then dedup by id
/// keeping the first occurrence in encounter order.
pub fn normalize_snapshot(docs: &[RawDocument]) -> Vec<StudyGroup> {
    let mut seen = HashSet::new();
    docs.iter()
        .filter_map(normalize_group)
        .filter(|group| seen.insert(group.id.clone()))
        .collect()
}

/// Accepts either a `[longitude, latitude]` pair or a structured
/// `{longitude, latitude}` object; both values must be finite numbers.
fn parse_coordinates(value: Option<&serde_json::Value>) -> Option<[f64; 2]> {
    let value = value?;

    let (lng, lat) = if let Some(pair) = value.as_array() {
        if pair.len() != 2 {
            return None;
        }
        (pair[0].as_f64()?, pair[1].as_f64()?)
    } else if value.is_object() {
        (
            value.get("longitude")?.as_f64()?,
            value.get("latitude")?.as_f64()?,
        )
    } else {
        return None;
    };

    if lng.is_finite() && lat.is_finite() {
        Some([lng, lat])
    } else {
        None
    }
}

/// Member ids come from `users`; legacy documents stored them under
/// `members`. Non-string entries are skipped, absence yields an empty list.
fn member_ids(data: &serde_json::Value) -> Vec<String> {
    let raw = data
        .get("users")
        .and_then(|v| v.as_array())
        .or_else(|| data.get("members").and_then(|v| v.as_array()));

    match raw {
        Some(entries) => entries
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

fn str_field(data: &serde_json::Value, field: &str) -> String {
    data.get(field)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, data: serde_json::Value) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            data,
        }
    }

    #[test]
    fn test_normalize_accepts_array_coordinates() {
        let group = normalize_group(&doc(
            "g1",
            json!({
                "title": "Calculus II Group",
                "subject": "math",
                "mood": "homework",
                "time": "2:00 PM - 4:00 PM",
                "location": "Mason Hall",
                "description": "Integration techniques",
                "memberCount": 5,
                "users": ["u1", "u2"],
                "distance": "0.1 mi",
                "coordinates": [-83.7382, 42.2744],
            }),
        ))
        .expect("group should normalize");

        assert_eq!(group.id, "g1");
        assert_eq!(group.coordinates, [-83.7382, 42.2744]);
        assert_eq!(group.member_ids, vec!["u1", "u2"]);
        assert!(group.members.is_empty(), "enrichment is a separate step");
        assert_eq!(group.member_count, 5);
    }

    #[test]
    fn test_normalize_accepts_structured_coordinates() {
        let group = normalize_group(&doc(
            "g2",
            json!({
                "title": "Chem Review",
                "coordinates": { "latitude": 42.2789, "longitude": -83.7403 },
            }),
        ))
        .expect("group should normalize");

        // Output order is always [longitude, latitude]
        assert_eq!(group.coordinates, [-83.7403, 42.2789]);
    }

    #[test]
    fn test_normalize_rejects_bad_coordinates() {
        let bad_coordinates = [
            json!("invalid"),
            json!([f64::NAN, 1.0]),
            json!(["x", "y"]),
            json!([1.0]),
            json!([1.0, 2.0, 3.0]),
            json!({ "longitude": -83.7 }),
            json!(null),
        ];
        for coordinates in bad_coordinates {
            let raw = doc("g", json!({ "title": "t", "coordinates": coordinates }));
            assert!(
                normalize_group(&raw).is_none(),
                "coordinates {:?} should fail normalization",
                raw.data.get("coordinates")
            );
        }

        // Missing entirely
        assert!(normalize_group(&doc("g", json!({ "title": "t" }))).is_none());
    }

    #[test]
    fn test_normalize_tolerates_missing_display_fields() {
        let group = normalize_group(&doc("g3", json!({ "coordinates": [-83.7, 42.2] })))
            .expect("group should normalize");
        assert_eq!(group.title, "");
        assert_eq!(group.member_count, 0);
        assert!(group.member_ids.is_empty());
        assert_eq!(group.distance, "");
    }

    #[test]
    fn test_member_ids_fall_back_to_legacy_field() {
        let group = normalize_group(&doc(
            "g4",
            json!({
                "coordinates": [-83.7, 42.2],
                "members": ["u7", "u8"],
            }),
        ))
        .expect("group should normalize");
        assert_eq!(group.member_ids, vec!["u7", "u8"]);

        // `users` wins when both are present
        let group = normalize_group(&doc(
            "g5",
            json!({
                "coordinates": [-83.7, 42.2],
                "users": ["u1"],
                "members": ["u7"],
            }),
        ))
        .expect("group should normalize");
        assert_eq!(group.member_ids, vec!["u1"]);
    }

    #[test]
    fn test_member_ids_skip_non_string_entries() {
        let group = normalize_group(&doc(
            "g6",
            json!({
                "coordinates": [-83.7, 42.2],
                "users": ["u1", 7, { "id": "u2" }, "", "u3"],
            }),
        ))
        .expect("group should normalize");
        assert_eq!(group.member_ids, vec!["u1", "u3"]);
    }

    #[test]
    fn test_snapshot_dedup_first_occurrence_wins() {
        let docs = vec![
            doc(
                "a",
                json!({ "coordinates": [-83.7, 42.2], "users": ["u1", "u2"] }),
            ),
            doc(
                "a",
                json!({ "coordinates": [-83.7, 42.2], "users": ["u9"] }),
            ),
            doc("b", json!({ "coordinates": ["x", "y"], "users": [] })),
        ];

        let roster = normalize_snapshot(&docs);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, "a");
        // First occurrence's data is kept
        assert_eq!(roster[0].member_ids, vec!["u1", "u2"]);
    }

    #[test]
    fn test_snapshot_preserves_encounter_order() {
        let docs = vec![
            doc("c", json!({ "coordinates": [1.0, 2.0] })),
            doc("a", json!({ "coordinates": [3.0, 4.0] })),
            doc("b", json!({ "coordinates": [5.0, 6.0] })),
            doc("a", json!({ "coordinates": [7.0, 8.0] })),
        ];

        let ids: Vec<_> = normalize_snapshot(&docs)
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}

//! Sample data seeding
//!
//! Writes the demo campus data set: six users and five study groups around
//! Ann Arbor. Groups are stored with the structured `{latitude, longitude}`
//! coordinate encoding, the same shape the original migration wrote, so
//! seeded data exercises that normalizer path.

use crate::error::Result;
use crate::store::{SqliteStore, GROUPS_COLLECTION, USERS_COLLECTION};
use serde_json::json;
use tracing::info;

/// Counts reported by a seeding run
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SeedSummary {
    pub users_seeded: usize,
    pub groups_seeded: usize,
}

struct SampleMember {
    id: &'static str,
    name: &'static str,
    picture: &'static str,
}

struct SampleGroup {
    title: &'static str,
    subject: &'static str,
    mood: &'static str,
    time: &'static str,
    location: &'static str,
    description: &'static str,
    distance: &'static str,
    /// `[longitude, latitude]`
    coordinates: [f64; 2],
    member_count: usize,
}

const SAMPLE_MEMBERS: &[SampleMember] = &[
    SampleMember { id: "1", name: "Alex", picture: "https://i.pravatar.cc/150?img=1" },
    SampleMember { id: "2", name: "Jordan", picture: "https://i.pravatar.cc/150?img=2" },
    SampleMember { id: "3", name: "Taylor", picture: "https://i.pravatar.cc/150?img=3" },
    SampleMember { id: "4", name: "Morgan", picture: "https://i.pravatar.cc/150?img=4" },
    SampleMember { id: "5", name: "Casey", picture: "https://i.pravatar.cc/150?img=5" },
    SampleMember { id: "6", name: "Sam", picture: "https://i.pravatar.cc/150?img=6" },
];

const SAMPLE_MAJORS: &[&str] = &[
    "Computer Science",
    "Business",
    "Biology",
    "Art",
    "History",
    "Engineering",
];

const SAMPLE_GROUPS: &[SampleGroup] = &[
    SampleGroup {
        title: "EECS 280 Study Session",
        subject: "computer",
        mood: "exam_prep",
        time: "3:00 PM - 5:00 PM",
        location: "Bob and Betty Beyster Building (BBB)",
        description: "Reviewing data structures and algorithms for the upcoming exam. Bring your laptops!",
        distance: "0.2 mi",
        coordinates: [-83.7174, 42.2927],
        member_count: 4,
    },
    SampleGroup {
        title: "Organic Chemistry Review",
        subject: "science",
        mood: "focused",
        time: "4:30 PM - 6:30 PM",
        location: "Chemistry Building",
        description: "Going through reaction mechanisms and synthesis problems. Bring your molecular models!",
        distance: "0.3 mi",
        coordinates: [-83.7403, 42.2789],
        member_count: 6,
    },
    SampleGroup {
        title: "Calculus II Group",
        subject: "math",
        mood: "homework",
        time: "2:00 PM - 4:00 PM",
        location: "Mason Hall",
        description: "Working on integration techniques and series problems. Bring your calculators!",
        distance: "0.1 mi",
        coordinates: [-83.7382, 42.2744],
        member_count: 5,
    },
    SampleGroup {
        title: "Business Strategy Project",
        subject: "business",
        mood: "project",
        time: "1:00 PM - 3:00 PM",
        location: "Ross School of Business",
        description: "Finalizing our case study presentation. Need help with market analysis slides.",
        distance: "0.4 mi",
        coordinates: [-83.7382, 42.2723],
        member_count: 4,
    },
    SampleGroup {
        title: "Art History Discussion",
        subject: "art",
        mood: "casual",
        time: "5:00 PM - 6:30 PM",
        location: "Michigan Union",
        description: "Discussing Renaissance art movements over coffee. All art lovers welcome!",
        distance: "0.2 mi",
        coordinates: [-83.7418, 42.2749],
        member_count: 3,
    },
];

/// Write the sample users and groups to the store.
///
/// Users are written at stable ids (idempotent upserts); groups get fresh
/// store-assigned ids per run.
pub async fn seed_sample_data(store: &SqliteStore) -> Result<SeedSummary> {
    let now = chrono::Utc::now().to_rfc3339();

    for (idx, member) in SAMPLE_MEMBERS.iter().enumerate() {
        let user = json!({
            "id": member.id,
            "email": format!("{}@example.com", member.name.to_lowercase()),
            "displayName": member.name,
            "major": SAMPLE_MAJORS[idx % SAMPLE_MAJORS.len()],
            "year": (idx % 4) + 1,
            "createdAt": now,
            "joinedGroups": [],
            "profilePicture": member.picture,
        });
        store.put_document(USERS_COLLECTION, member.id, &user).await?;
    }

    for group in SAMPLE_GROUPS {
        let users: Vec<&str> = SAMPLE_MEMBERS
            .iter()
            .take(group.member_count)
            .map(|m| m.id)
            .collect();
        let doc = json!({
            "title": group.title,
            "subject": group.subject,
            "mood": group.mood,
            "time": group.time,
            "location": group.location,
            "description": group.description,
            "memberCount": group.member_count,
            "users": users,
            "distance": group.distance,
            "coordinates": {
                "latitude": group.coordinates[1],
                "longitude": group.coordinates[0],
            },
            "createdAt": now,
            "status": "active",
        });
        store.create_document(GROUPS_COLLECTION, &doc).await?;
    }

    info!(
        "Seeded {} users and {} study groups",
        SAMPLE_MEMBERS.len(),
        SAMPLE_GROUPS.len()
    );
    Ok(SeedSummary {
        users_seeded: SAMPLE_MEMBERS.len(),
        groups_seeded: SAMPLE_GROUPS.len(),
    })
}

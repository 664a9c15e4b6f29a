//! HTTP request handlers
//!
//! Thin layer over the store and roster state: validation happens here,
//! everything else is delegated.

use crate::error::{Error, Result};
use crate::seed::{self, SeedSummary};
use crate::state::AppState;
use crate::store::{ClearSummary, GROUPS_COLLECTION, USERNAMES_COLLECTION, USERS_COLLECTION};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use crew_common::events::CrewEvent;
use crew_common::model::StudyGroup;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    groups: Vec<StudyGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    title: String,
    subject: String,
    mood: String,
    time: String,
    location: String,
    description: String,
    coordinates: CoordinatesBody,
    #[serde(default)]
    users: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoordinatesBody {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupResponse {
    group_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameResponse {
    username: String,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimUsernameRequest {
    username: String,
    user_id: String,
}

// ============================================================================
// Health
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "crew-hub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Roster
// ============================================================================

/// GET /api/roster - Latest published roster
pub async fn get_roster(State(state): State<AppState>) -> Json<RosterResponse> {
    Json(RosterResponse {
        groups: state.roster().await,
    })
}

// ============================================================================
// Groups
// ============================================================================

/// POST /api/groups - Create a study group
pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<CreateGroupResponse>)> {
    let text_fields = [
        ("title", &req.title),
        ("subject", &req.subject),
        ("mood", &req.mood),
        ("time", &req.time),
        ("location", &req.location),
        ("description", &req.description),
    ];
    for (name, value) in text_fields {
        if value.trim().is_empty() {
            return Err(Error::InvalidInput(format!("{name} must not be empty")));
        }
    }
    if !req.coordinates.latitude.is_finite() || !req.coordinates.longitude.is_finite() {
        return Err(Error::InvalidInput(
            "coordinates must be finite numbers".to_string(),
        ));
    }

    let doc = json!({
        "title": req.title,
        "subject": req.subject,
        "mood": req.mood,
        "time": req.time,
        "location": req.location,
        "description": req.description,
        "memberCount": req.users.len(),
        "users": req.users,
        "coordinates": {
            "latitude": req.coordinates.latitude,
            "longitude": req.coordinates.longitude,
        },
        "createdAt": chrono::Utc::now().to_rfc3339(),
        "status": "active",
    });

    let group_id = state.store.create_document(GROUPS_COLLECTION, &doc).await?;
    info!(group_id, "study group created");
    state.bus.emit_lossy(CrewEvent::GroupCreated {
        group_id: group_id.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(CreateGroupResponse { group_id })))
}

// ============================================================================
// User Profiles
// ============================================================================

/// GET /api/users/:id/profile - Fetch a user profile
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let doc = state
        .store
        .get_document(USERS_COLLECTION, &id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {id}")))?;
    Ok(Json(doc.data))
}

/// PUT /api/users/:id/profile - Merge-save a user profile
///
/// Provided top-level fields overwrite stored ones; fields absent from the
/// request are preserved. Creates the profile if it does not exist. Every
/// save stamps `profileComplete` and `updatedAt` server-side.
pub async fn put_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>> {
    let updates = update
        .as_object()
        .ok_or_else(|| Error::InvalidInput("profile body must be a JSON object".to_string()))?;

    let mut profile = match state.store.get_document(USERS_COLLECTION, &id).await? {
        Some(doc) => doc.data,
        None => json!({ "id": id, "createdAt": chrono::Utc::now().to_rfc3339() }),
    };
    if let Some(existing) = profile.as_object_mut() {
        for (key, value) in updates {
            existing.insert(key.clone(), value.clone());
        }
        existing.insert("profileComplete".to_string(), json!(true));
        existing.insert(
            "updatedAt".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );
    }

    state
        .store
        .put_document(USERS_COLLECTION, &id, &profile)
        .await?;
    Ok(Json(profile))
}

// ============================================================================
// Usernames
// ============================================================================

/// GET /api/usernames/:name - Check username availability
pub async fn get_username(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<UsernameResponse>> {
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        return Err(Error::InvalidInput("username must not be empty".to_string()));
    }

    let claimed = state.store.get_document(USERNAMES_COLLECTION, &key).await?;
    let user_id = claimed
        .as_ref()
        .and_then(|doc| doc.data.get("userId"))
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(Json(UsernameResponse {
        username: key,
        available: claimed.is_none(),
        user_id,
    }))
}

/// POST /api/usernames - Claim a username
///
/// Usernames are case-insensitive (stored lowercase). Claiming a name you
/// already hold is a no-op; claiming someone else's name is a conflict.
pub async fn claim_username(
    State(state): State<AppState>,
    Json(req): Json<ClaimUsernameRequest>,
) -> Result<Json<UsernameResponse>> {
    let key = req.username.trim().to_lowercase();
    if key.is_empty() || req.user_id.trim().is_empty() {
        return Err(Error::InvalidInput(
            "username and userId must not be empty".to_string(),
        ));
    }

    if let Some(existing) = state.store.get_document(USERNAMES_COLLECTION, &key).await? {
        let holder = existing
            .data
            .get("userId")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        if holder != req.user_id {
            return Err(Error::UsernameTaken(key));
        }
    }

    let claim = json!({
        "username": key,
        "userId": req.user_id,
        "claimedAt": chrono::Utc::now().to_rfc3339(),
    });
    state
        .store
        .put_document(USERNAMES_COLLECTION, &key, &claim)
        .await?;

    // Reflect the claim on the profile as well
    let mut profile = match state.store.get_document(USERS_COLLECTION, &req.user_id).await? {
        Some(doc) => doc.data,
        None => json!({ "id": req.user_id }),
    };
    if let Some(obj) = profile.as_object_mut() {
        obj.insert("username".to_string(), json!(key));
    }
    state
        .store
        .put_document(USERS_COLLECTION, &req.user_id, &profile)
        .await?;

    info!(username = %key, user_id = %req.user_id, "username claimed");
    Ok(Json(UsernameResponse {
        username: key,
        available: false,
        user_id: Some(req.user_id),
    }))
}

// ============================================================================
// Admin
// ============================================================================

/// POST /api/admin/clear - Delete all users and study groups
///
/// Emits `DataCleared`, the reset signal every roster subscriber reacts to.
pub async fn clear_data(State(state): State<AppState>) -> Result<Json<ClearSummary>> {
    let summary = state.store.clear_all().await?;
    info!(
        users = summary.users_cleared,
        groups = summary.groups_cleared,
        "data cleared"
    );
    state.bus.emit_lossy(CrewEvent::DataCleared {
        timestamp: chrono::Utc::now(),
    });
    Ok(Json(summary))
}

/// POST /api/admin/seed - Write the sample data set
pub async fn seed_data(State(state): State<AppState>) -> Result<Json<SeedSummary>> {
    let summary = seed::seed_sample_data(&state.store).await?;
    state.bus.emit_lossy(CrewEvent::SampleDataSeeded {
        users_seeded: summary.users_seeded,
        groups_seeded: summary.groups_seeded,
        timestamp: chrono::Utc::now(),
    });
    Ok(Json(summary))
}

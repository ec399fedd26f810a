// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use haven_core::{
    Application, ApplicationId, ApplicationRecord, ApplicationStatus, ChatMessage, HistoryEntry,
    Party, Pet, PetId, TransitionRecord, UserId,
};
use haven_lifecycle::{HistoryFilter, LifecycleManager};
use haven_messaging::ChatContact;

use crate::auth::{bearer_token, Actor};
use crate::error::ApiError;
use crate::server::GatewayState;

/// Which side of the application the caller is viewing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Shelter,
    Adopter,
}

impl Role {
    fn party(self, user: UserId) -> Party {
        match self {
            Role::Shelter => Party::Shelter(user),
            Role::Adopter => Party::Adopter(user),
        }
    }
}

/// Request body for POST /v1/applications.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub pet_id: String,
    pub message: String,
}

/// Request body for POST /v1/applications/{id}/reject.
///
/// `password` is required when reverting an approval.
#[derive(Deserialize)]
pub struct RejectRequest {
    pub reason: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request body for POST /v1/applications/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// Query for GET /v1/applications.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub role: Role,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}

/// Query for GET /v1/conversations.
#[derive(Debug, Deserialize)]
pub struct ConversationsQuery {
    pub role: Role,
}

/// Query for GET /v1/history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub role: Role,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub q: Option<String>,
}

/// An application as returned by the API.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    #[serde(flatten)]
    pub application: ApplicationRecord,
    /// Whole days until the scheduled purge, if one is scheduled.
    pub days_until_deletion: Option<i64>,
}

impl ApplicationResponse {
    fn new(application: &Application, lifecycle: &LifecycleManager) -> Self {
        Self {
            application: application.to_record(),
            days_until_deletion: lifecycle.days_until_deletion(application),
        }
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Response body for a successful cleanup trigger.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: u64,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// POST /v1/applications
pub async fn post_application(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Json(body): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse>), ApiError> {
    let application = state
        .lifecycle
        .submit(&actor, &PetId::from(body.pet_id), &body.message)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse::new(&application, &state.lifecycle)),
    ))
}

/// GET /v1/applications?role=shelter|adopter&status=
pub async fn list_applications(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError> {
    let applications = match query.role {
        Role::Shelter => state.lifecycle.list_for_shelter(&actor, query.status).await?,
        Role::Adopter => state.lifecycle.list_for_adopter(&actor, query.status).await?,
    };
    Ok(Json(
        applications
            .iter()
            .map(|a| ApplicationResponse::new(a, &state.lifecycle))
            .collect(),
    ))
}

/// GET /v1/applications/{id}
pub async fn get_application(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let application = state.lifecycle.get(&actor, &ApplicationId::from(id)).await?;
    Ok(Json(ApplicationResponse::new(&application, &state.lifecycle)))
}

/// DELETE /v1/applications/{id}
pub async fn withdraw_application(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .withdraw(&actor, &ApplicationId::from(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/applications/{id}/approve
pub async fn approve_application(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let application = state
        .lifecycle
        .approve(&actor, &ApplicationId::from(id))
        .await?;
    Ok(Json(ApplicationResponse::new(&application, &state.lifecycle)))
}

/// POST /v1/applications/{id}/reject
pub async fn reject_application(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let password = body.password.map(SecretString::from);
    let application = state
        .lifecycle
        .reject(
            &actor,
            &ApplicationId::from(id),
            &body.reason,
            password.as_ref(),
        )
        .await?;
    Ok(Json(ApplicationResponse::new(&application, &state.lifecycle)))
}

/// POST /v1/applications/{id}/ignore
pub async fn ignore_application(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let application = state
        .lifecycle
        .ignore(&actor, &ApplicationId::from(id))
        .await?;
    Ok(Json(ApplicationResponse::new(&application, &state.lifecycle)))
}

/// GET /v1/applications/{id}/transitions
pub async fn list_transitions(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TransitionRecord>>, ApiError> {
    let records = state
        .lifecycle
        .transitions(&actor, &ApplicationId::from(id))
        .await?;
    Ok(Json(records))
}

/// GET /v1/applications/{id}/messages
pub async fn list_messages(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let messages = state
        .messaging
        .list_messages(&actor, &ApplicationId::from(id))
        .await?;
    Ok(Json(messages))
}

/// POST /v1/applications/{id}/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    let message = state
        .messaging
        .send(&actor, &ApplicationId::from(id), &body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /v1/history?role=shelter|adopter&status=&q=
pub async fn list_history(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let filter = HistoryFilter {
        status: query.status,
        search: query.q,
    };
    let entries = state
        .lifecycle
        .history(&query.role.party(actor), &filter)
        .await?;
    Ok(Json(entries))
}

/// GET /v1/conversations
pub async fn list_conversations(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Query(query): Query<ConversationsQuery>,
) -> Result<Json<Vec<ChatContact>>, ApiError> {
    let contacts = state
        .messaging
        .list_contacts(&query.role.party(actor))
        .await?;
    Ok(Json(contacts))
}

/// POST /v1/pets/{id}/available
pub async fn mark_pet_available(
    State(state): State<GatewayState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Pet>, ApiError> {
    let pet = state
        .lifecycle
        .mark_pet_available(&actor, &PetId::from(id))
        .await?;
    Ok(Json(pet))
}

/// POST /internal/cleanup-applications
///
/// Authenticated with the retention cron secret rather than the API token.
pub async fn post_cleanup_applications(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Response {
    if haven_retention::authorize_trigger(state.cron_secret.as_deref(), bearer_token(&headers))
        .is_err()
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    match state.retention.run_once().await {
        Ok(report) => (
            StatusCode::OK,
            Json(CleanupResponse {
                success: true,
                message: report.summary(),
                deleted_count: report.deleted_count,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "cleanup trigger failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

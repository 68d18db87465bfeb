use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use super::ApiError;
use crate::application::dto::EventView;
use crate::application::services::AttackReport;
use crate::domain::entities::GuardOutcome;
use crate::domain::value_objects::{CharacterId, MonsterId, SessionId};
use crate::infrastructure::state::AppState;

/// The session's currently active event
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventView>, ApiError> {
    let view = state
        .orchestrator
        .event_view(SessionId::from_uuid(id))
        .await?;
    Ok(Json(view))
}

#[derive(serde::Deserialize)]
pub struct EventActionRequest {
    pub character_id: Uuid,
    pub action: String,
}

/// Submit one player's action against the active non-combat event
pub async fn submit_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<EventActionRequest>,
) -> Result<Json<EventView>, ApiError> {
    let view = state
        .orchestrator
        .submit_event_action(
            SessionId::from_uuid(id),
            CharacterId::from_uuid(body.character_id),
            body.action,
        )
        .await?;
    Ok(Json(view))
}

#[derive(serde::Deserialize)]
pub struct AttackRequest {
    pub character_id: Uuid,
    pub monster_id: Uuid,
}

/// Player attack submission
pub async fn submit_attack(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<AttackRequest>,
) -> Result<Json<AttackReport>, ApiError> {
    let report = state
        .orchestrator
        .submit_attack(
            SessionId::from_uuid(id),
            CharacterId::from_uuid(body.character_id),
            MonsterId::from_uuid(body.monster_id),
        )
        .await?;
    Ok(Json(report))
}

#[derive(serde::Serialize)]
pub struct GuardResponse {
    pub outcome: GuardOutcome,
}

/// Block/parry input against a telegraphed attack
pub async fn submit_guard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<AttackRequest>,
) -> Result<Json<GuardResponse>, ApiError> {
    let outcome = state
        .orchestrator
        .submit_guard(
            SessionId::from_uuid(id),
            CharacterId::from_uuid(body.character_id),
            MonsterId::from_uuid(body.monster_id),
        )
        .await?;
    Ok(Json(GuardResponse { outcome }))
}

#[derive(serde::Deserialize)]
pub struct ReviveRequest {
    pub character_id: Uuid,
    pub target_id: Uuid,
}

#[derive(serde::Serialize)]
pub struct ReviveResponse {
    pub restored_health: i32,
}

/// Revive a downed party member mid-combat
pub async fn revive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviveRequest>,
) -> Result<Json<ReviveResponse>, ApiError> {
    let restored_health = state
        .orchestrator
        .revive(
            SessionId::from_uuid(id),
            CharacterId::from_uuid(body.character_id),
            CharacterId::from_uuid(body.target_id),
        )
        .await?;
    Ok(Json(ReviveResponse { restored_health }))
}

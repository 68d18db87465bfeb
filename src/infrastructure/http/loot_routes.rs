use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use super::ApiError;
use crate::application::dto::DropView;
use crate::domain::entities::RollKind;
use crate::domain::value_objects::{CharacterId, DropId, SessionId};
use crate::infrastructure::state::AppState;

/// All drops in the session, pending and claimed
pub async fn list_drops(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DropView>>, ApiError> {
    let views = state
        .orchestrator
        .loot_views(SessionId::from_uuid(id))
        .await?;
    Ok(Json(views))
}

#[derive(serde::Deserialize)]
pub struct RollRequest {
    pub character_id: Uuid,
    pub kind: RollKind,
}

#[derive(serde::Serialize)]
pub struct RollResponse {
    /// Set once every player has rolled and the drop resolved
    pub winner: Option<CharacterId>,
}

/// Submit a NEED or GREED roll against a pending drop
pub async fn submit_roll(
    State(state): State<Arc<AppState>>,
    Path((id, drop_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<RollRequest>,
) -> Result<Json<RollResponse>, ApiError> {
    let winner = state
        .orchestrator
        .submit_loot_roll(
            SessionId::from_uuid(id),
            DropId::from_uuid(drop_id),
            CharacterId::from_uuid(body.character_id),
            body.kind,
        )
        .await?;
    Ok(Json(RollResponse { winner }))
}

#[derive(serde::Deserialize)]
pub struct AssignRequest {
    pub character_id: Uuid,
    pub recipient_id: Uuid,
}

/// Master-looter manual assignment
pub async fn assign_drop(
    State(state): State<Arc<AppState>>,
    Path((id, drop_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<AssignRequest>,
) -> Result<Json<Vec<DropView>>, ApiError> {
    let session_id = SessionId::from_uuid(id);
    state
        .orchestrator
        .assign_loot(
            session_id,
            DropId::from_uuid(drop_id),
            CharacterId::from_uuid(body.character_id),
            CharacterId::from_uuid(body.recipient_id),
        )
        .await?;
    let views = state.orchestrator.loot_views(session_id).await?;
    Ok(Json(views))
}

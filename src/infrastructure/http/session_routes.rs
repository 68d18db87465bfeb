use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use super::ApiError;
use crate::application::dto::SessionView;
use crate::domain::value_objects::{CharacterId, MissionId, PartyId, SessionId};
use crate::infrastructure::state::AppState;

#[derive(serde::Deserialize)]
pub struct StartSessionRequest {
    pub party_id: Uuid,
}

/// Start a mission session for a party
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Path(mission_id): Path<Uuid>,
    Json(body): Json<StartSessionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .orchestrator
        .start_session(
            MissionId::from_uuid(mission_id),
            PartyId::from_uuid(body.party_id),
        )
        .await?;
    Ok(Json(view))
}

/// Session snapshot for polling clients
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .orchestrator
        .session_view(SessionId::from_uuid(id))
        .await?;
    Ok(Json(view))
}

#[derive(serde::Deserialize)]
pub struct AbandonRequest {
    pub character_id: Uuid,
}

/// Abandon the mission (leader only)
pub async fn abandon_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<AbandonRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let session_id = SessionId::from_uuid(id);
    state
        .orchestrator
        .abandon_session(session_id, CharacterId::from_uuid(body.character_id))
        .await?;
    let view = state.orchestrator.session_view(session_id).await?;
    Ok(Json(view))
}

#[derive(serde::Deserialize)]
pub struct RestChoiceRequest {
    pub character_id: Uuid,
    pub rest: bool,
}

/// Rest-or-continue choice at a phase boundary (leader only)
pub async fn choose_rest(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<RestChoiceRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .orchestrator
        .choose_rest(
            SessionId::from_uuid(id),
            CharacterId::from_uuid(body.character_id),
            body.rest,
        )
        .await?;
    Ok(Json(view))
}

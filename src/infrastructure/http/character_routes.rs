use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use super::ApiError;
use crate::domain::value_objects::CharacterId;
use crate::infrastructure::state::AppState;

#[derive(serde::Serialize)]
pub struct BalanceResponse {
    pub character_id: CharacterId,
    pub balance: u64,
}

/// Current currency balance; 0 when the character has no record
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let character_id = CharacterId::from_uuid(id);
    let balance = state.ledger.balance(character_id).await?;
    Ok(Json(BalanceResponse {
        character_id,
        balance,
    }))
}

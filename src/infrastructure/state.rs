//! Shared application state

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::application::services::{
    CombatEngine, CurrencyLedger, LootDistributionEngine, PhaseController, SessionOrchestrator,
};
use crate::domain::aggregates::MissionRuntime;
use crate::domain::value_objects::SessionId;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::{
    InMemoryCatalog, InMemoryCharacterDirectory, InMemoryInventory, InMemoryPartyDirectory,
};

/// Live mission sessions, one lock per session.
///
/// The outer lock only guards the map; all session mutation happens under
/// the per-session mutex, so one slow session cannot stall the others.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<MissionRuntime>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, runtime: MissionRuntime) -> Arc<Mutex<MissionRuntime>> {
        let session_id = runtime.id();
        let handle = Arc::new(Mutex::new(runtime));
        self.sessions
            .write()
            .await
            .insert(session_id, handle.clone());
        handle
    }

    pub async fn get(&self, session_id: SessionId) -> Option<Arc<Mutex<MissionRuntime>>> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    pub async fn remove(&self, session_id: SessionId) {
        self.sessions.write().await.remove(&session_id);
    }

    pub async fn ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().copied().collect()
    }
}

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<SessionRegistry>,
    pub orchestrator: Arc<SessionOrchestrator>,
    pub ledger: Arc<CurrencyLedger>,
    // Adapters stay exposed for catalog seeding and admin tooling
    pub catalog: Arc<InMemoryCatalog>,
    pub parties: Arc<InMemoryPartyDirectory>,
    pub characters: Arc<InMemoryCharacterDirectory>,
    pub inventory: Arc<InMemoryInventory>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let parties = Arc::new(InMemoryPartyDirectory::new());
        let characters = Arc::new(InMemoryCharacterDirectory::new());
        let inventory = Arc::new(InMemoryInventory::new());
        let registry = Arc::new(SessionRegistry::new());

        let ledger = Arc::new(CurrencyLedger::new(inventory.clone()));
        let loot = Arc::new(LootDistributionEngine::new(
            ledger.clone(),
            inventory.clone(),
        ));
        let combat = Arc::new(CombatEngine::new(characters.clone(), catalog.clone()));
        let phases = Arc::new(PhaseController::new(
            characters.clone(),
            loot.clone(),
            ledger.clone(),
        ));
        let orchestrator = Arc::new(SessionOrchestrator::new(
            registry.clone(),
            catalog.clone(),
            parties.clone(),
            characters.clone(),
            combat,
            phases,
            loot,
            config.session_cleanup_secs,
        ));

        Self {
            config,
            registry,
            orchestrator,
            ledger,
            catalog,
            parties,
            characters,
            inventory,
        }
    }
}

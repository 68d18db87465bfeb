//! Loot distribution engine
//!
//! Resolves ownership of dropped stacks according to the party's loot rule
//! and settles currency drops against the ledger. Currency is always split
//! immediately: companions take their upkeep share off the top, the rest is
//! divided among player members with the integer remainder handed out one
//! unit at a time in roster order, so the split always conserves the total.

use std::sync::Arc;

use rand::Rng;

use crate::application::error::{CoreError, CoreResult};
use crate::application::ports::outbound::InventoryPort;
use crate::application::services::currency_service::CurrencyLedger;
use crate::domain::aggregates::MissionRuntime;
use crate::domain::entities::{
    pick_winner, DropKind, LootDrop, LootMode, LootRoll, LootRule, RollKind, NEED_ROLL_VALUE,
};
use crate::domain::value_objects::{CharacterId, DropId};

/// Upkeep fraction of a currency drop retained per NPC companion
pub const NPC_UPKEEP_FRACTION: f64 = 0.2;

/// Result of splitting one currency drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldSplit {
    /// Retained for companion upkeep; never paid out to anyone
    pub npc_share: u64,
    /// Per-player shares, in roster order
    pub player_shares: Vec<u64>,
}

/// Split `total` gold: companions take `0.2 * npc_count` off the top, the
/// remainder is divided evenly among players with the integer remainder going
/// one unit at a time to the first players in roster order.
pub fn split_gold(total: u64, player_count: usize, npc_count: usize) -> GoldSplit {
    let npc_share = ((total as f64 * NPC_UPKEEP_FRACTION * npc_count as f64).floor() as u64)
        .min(total);
    let remaining = total - npc_share;

    if player_count == 0 {
        return GoldSplit {
            npc_share,
            player_shares: Vec::new(),
        };
    }

    let base = remaining / player_count as u64;
    let remainder = (remaining % player_count as u64) as usize;
    let player_shares = (0..player_count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect();

    GoldSplit {
        npc_share,
        player_shares,
    }
}

pub struct LootDistributionEngine {
    ledger: Arc<CurrencyLedger>,
    inventory: Arc<dyn InventoryPort>,
}

impl LootDistributionEngine {
    pub fn new(ledger: Arc<CurrencyLedger>, inventory: Arc<dyn InventoryPort>) -> Self {
        Self { ledger, inventory }
    }

    /// Dispatch every unclaimed, unstamped drop in the session according to
    /// the party's loot rule. Currency settles immediately; need/greed drops
    /// wait for rolls; master-looter drops wait for manual assignment.
    pub async fn distribute(&self, runtime: &mut MissionRuntime) -> CoreResult<()> {
        let rule = runtime.party.loot_rule;
        let master = runtime.party.loot_master();

        for idx in 0..runtime.drops.len() {
            if runtime.drops[idx].is_claimed() || runtime.drops[idx].assigned_to.is_some() {
                continue;
            }
            match runtime.drops[idx].kind.clone() {
                DropKind::Currency { amount } => {
                    let (shares, anchor) = {
                        let party = &runtime.party;
                        let split =
                            split_gold(amount, party.player_count(), party.companion_count());
                        let recipients: Vec<CharacterId> = party
                            .player_members()
                            .map(|m| m.character_id)
                            .collect();
                        let paired: Vec<(CharacterId, u64)> = recipients
                            .iter()
                            .copied()
                            .zip(split.player_shares.iter().copied())
                            .collect();
                        (paired, recipients.first().copied())
                    };
                    for (character_id, share) in shares {
                        self.ledger.credit(character_id, share).await?;
                    }
                    let drop = &mut runtime.drops[idx];
                    drop.mode = LootMode::GoldSplit;
                    drop.claimed_by = anchor;
                }
                DropKind::Item { item_id, quantity } => match rule {
                    LootRule::Auto => {
                        let recipients: Vec<CharacterId> = runtime
                            .party
                            .player_members()
                            .map(|m| m.character_id)
                            .collect();
                        // Every player gets a full copy; companions never do
                        for character_id in &recipients {
                            self.inventory
                                .grant_item(*character_id, item_id, quantity)
                                .await?;
                        }
                        let drop = &mut runtime.drops[idx];
                        drop.mode = LootMode::Auto;
                        drop.claimed_by = recipients.first().copied();
                    }
                    LootRule::NeedGreed => {
                        runtime.drops[idx].mode = LootMode::NeedGreed;
                    }
                    LootRule::MasterLooter => {
                        let drop = &mut runtime.drops[idx];
                        drop.mode = LootMode::MasterLooter;
                        drop.assigned_to = Some(master);
                    }
                },
            }
        }
        Ok(())
    }

    /// Submit one NEED or GREED roll. Rejects duplicates from the same
    /// character. Once every player member has rolled, the drop resolves and
    /// the winner is returned.
    pub async fn submit_roll<R: Rng>(
        &self,
        runtime: &mut MissionRuntime,
        drop_id: DropId,
        character_id: CharacterId,
        kind: RollKind,
        rng: &mut R,
    ) -> CoreResult<Option<CharacterId>> {
        let is_player = runtime
            .party
            .player_members()
            .any(|m| m.character_id == character_id);
        if !is_player {
            return Err(CoreError::unauthorized(
                "only player party members may roll for loot",
            ));
        }

        let drop = runtime
            .drop_by_id(drop_id)
            .ok_or_else(|| CoreError::not_found("drop", drop_id))?;
        if drop.mode != LootMode::NeedGreed {
            return Err(CoreError::invalid_state("drop is not open for rolls"));
        }
        if drop.is_claimed() {
            return Err(CoreError::invalid_state("drop already claimed"));
        }

        let rolls = runtime.rolls.entry(drop_id).or_default();
        if rolls.iter().any(|r| r.character_id == character_id) {
            return Err(CoreError::invalid_state(
                "character already rolled for this drop",
            ));
        }

        let value = match kind {
            RollKind::Need => NEED_ROLL_VALUE,
            RollKind::Greed => rng.gen_range(1..=100),
        };
        rolls.push(LootRoll {
            drop_id,
            character_id,
            kind,
            value,
            submitted_at: chrono::Utc::now(),
        });
        tracing::debug!(%drop_id, %character_id, ?kind, value, "loot roll submitted");

        let everyone_rolled = {
            let rolls = &runtime.rolls[&drop_id];
            runtime
                .party
                .player_members()
                .all(|m| rolls.iter().any(|r| r.character_id == m.character_id))
        };
        if !everyone_rolled {
            return Ok(None);
        }

        let winner = pick_winner(&runtime.rolls[&drop_id])
            .expect("at least one roll exists once everyone rolled");
        self.grant_drop(runtime, drop_id, winner).await?;
        tracing::info!(%drop_id, %winner, "need/greed drop resolved");
        Ok(Some(winner))
    }

    /// Master-looter assignment: grant plus mark-assigned as one atomic
    /// operation, authorized only for the designated master looter (or the
    /// leader when unset).
    pub async fn assign_manually(
        &self,
        runtime: &mut MissionRuntime,
        drop_id: DropId,
        assigner: CharacterId,
        recipient: CharacterId,
    ) -> CoreResult<()> {
        if assigner != runtime.party.loot_master() {
            return Err(CoreError::unauthorized(
                "only the master looter may assign this drop",
            ));
        }
        let drop = runtime
            .drop_by_id(drop_id)
            .ok_or_else(|| CoreError::not_found("drop", drop_id))?;
        if drop.mode != LootMode::MasterLooter {
            return Err(CoreError::invalid_state("drop is not master-looter pending"));
        }
        if drop.is_claimed() {
            return Err(CoreError::invalid_state("drop already claimed"));
        }
        let recipient_is_player = runtime
            .party
            .player_members()
            .any(|m| m.character_id == recipient);
        if !recipient_is_player {
            return Err(CoreError::invalid_state(
                "loot can only be assigned to player members",
            ));
        }
        self.grant_drop(runtime, drop_id, recipient).await?;
        tracing::info!(%drop_id, %recipient, "drop assigned by master looter");
        Ok(())
    }

    /// Shared grant path for roll winners and manual assignment
    async fn grant_drop(
        &self,
        runtime: &mut MissionRuntime,
        drop_id: DropId,
        recipient: CharacterId,
    ) -> CoreResult<()> {
        let kind = runtime
            .drop_by_id(drop_id)
            .ok_or_else(|| CoreError::not_found("drop", drop_id))?
            .kind
            .clone();
        match kind {
            DropKind::Item { item_id, quantity } => {
                self.inventory
                    .grant_item(recipient, item_id, quantity)
                    .await?;
            }
            DropKind::Currency { amount } => {
                self.ledger.credit(recipient, amount).await?;
            }
        }
        let drop = runtime
            .drop_by_id_mut(drop_id)
            .ok_or_else(|| CoreError::not_found("drop", drop_id))?;
        drop.assigned_to = Some(recipient);
        drop.claimed_by = Some(recipient);
        Ok(())
    }
}

/// Convenience constructor used at combat and mission resolution
pub fn currency_drop(runtime: &mut MissionRuntime, amount: u64) {
    if amount == 0 {
        return;
    }
    let drop = LootDrop::currency(runtime.id(), amount, LootMode::GoldSplit);
    runtime.drops.push(drop);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::domain::entities::{
        LootDrop, MemberKind, MissionSession, MissionTemplate, PartyMember, PartyRoster,
    };
    use crate::domain::value_objects::{ItemId, MissionId, PartyId};
    use crate::infrastructure::persistence::InMemoryInventory;

    fn mission() -> MissionTemplate {
        MissionTemplate {
            id: MissionId::new(),
            name: "Sunken Crypt".into(),
            difficulty: 2,
            total_phases: 3,
            events_per_phase: 2,
            spawn_interval_min_secs: 10,
            spawn_interval_max_secs: 30,
            rest_duration_secs: 20,
            reward_gold: 100,
            reward_items: Vec::new(),
            monster_pool: Vec::new(),
        }
    }

    fn runtime(players: usize, npcs: usize, rule: LootRule) -> MissionRuntime {
        let mut members = Vec::new();
        for i in 0..players {
            members.push(PartyMember {
                character_id: CharacterId::new(),
                name: format!("player-{i}"),
                kind: MemberKind::Player,
            });
        }
        for i in 0..npcs {
            members.push(PartyMember {
                character_id: CharacterId::new(),
                name: format!("companion-{i}"),
                kind: MemberKind::Companion,
            });
        }
        let leader = members[0].character_id;
        let party = PartyRoster {
            party_id: PartyId::new(),
            members,
            leader_id: leader,
            master_looter: None,
            loot_rule: rule,
        };
        let mission = mission();
        let session = MissionSession::new(mission.id, party.party_id, mission.total_phases);
        MissionRuntime::new(session, mission, party)
    }

    fn engine() -> (LootDistributionEngine, Arc<InMemoryInventory>, Arc<CurrencyLedger>) {
        let inventory = Arc::new(InMemoryInventory::new());
        let ledger = Arc::new(CurrencyLedger::new(inventory.clone()));
        (
            LootDistributionEngine::new(ledger.clone(), inventory.clone()),
            inventory,
            ledger,
        )
    }

    #[test]
    fn gold_split_takes_npc_upkeep_off_the_top() {
        // 100 gold, 1 NPC, 3 players: upkeep 20, remaining 80 split 27/27/26
        let split = split_gold(100, 3, 1);
        assert_eq!(split.npc_share, 20);
        assert_eq!(split.player_shares, vec![27, 27, 26]);
        assert_eq!(
            split.npc_share + split.player_shares.iter().sum::<u64>(),
            100
        );
    }

    #[test]
    fn gold_split_without_npcs_still_conserves() {
        let split = split_gold(10, 3, 0);
        assert_eq!(split.npc_share, 0);
        assert_eq!(split.player_shares, vec![4, 3, 3]);
    }

    #[test]
    fn npc_share_never_exceeds_the_total() {
        // 6 NPCs would claim 120% of the drop
        let split = split_gold(50, 2, 6);
        assert_eq!(split.npc_share, 50);
        assert_eq!(split.player_shares, vec![0, 0]);
    }

    #[tokio::test]
    async fn currency_drops_settle_immediately_and_conserve() {
        let (engine, _, ledger) = engine();
        let mut rt = runtime(3, 1, LootRule::NeedGreed);
        currency_drop(&mut rt, 100);

        engine.distribute(&mut rt).await.unwrap();

        let players: Vec<CharacterId> =
            rt.party.player_members().map(|m| m.character_id).collect();
        let mut balances = Vec::new();
        for p in &players {
            balances.push(ledger.balance(*p).await.unwrap());
        }
        assert_eq!(balances, vec![27, 27, 26]);
        // First player member anchors the claim
        assert_eq!(rt.drops[0].claimed_by, Some(players[0]));
        assert_eq!(rt.drops[0].mode, LootMode::GoldSplit);
    }

    #[tokio::test]
    async fn auto_items_give_every_player_a_full_copy() {
        let (engine, inventory, _) = engine();
        let mut rt = runtime(2, 1, LootRule::Auto);
        let item = ItemId::new();
        rt.drops
            .push(LootDrop::item(rt.id(), item, 3, LootMode::Auto));

        engine.distribute(&mut rt).await.unwrap();

        let players: Vec<CharacterId> =
            rt.party.player_members().map(|m| m.character_id).collect();
        for p in &players {
            assert_eq!(inventory.item_quantity(*p, item).await, 3);
        }
        let companion = rt
            .party
            .members
            .iter()
            .find(|m| m.kind == MemberKind::Companion)
            .unwrap()
            .character_id;
        assert_eq!(inventory.item_quantity(companion, item).await, 0);
    }

    #[tokio::test]
    async fn need_beats_greed_and_ties_go_to_first_submission() {
        let (engine, inventory, _) = engine();
        let mut rt = runtime(3, 0, LootRule::NeedGreed);
        let item = ItemId::new();
        rt.drops
            .push(LootDrop::item(rt.id(), item, 1, LootMode::Auto));
        engine.distribute(&mut rt).await.unwrap();
        let drop_id = rt.drops[0].id;

        let players: Vec<CharacterId> =
            rt.party.player_members().map(|m| m.character_id).collect();
        let mut rng = StdRng::seed_from_u64(7);

        // Greed first, then two tied NEED rolls: the earlier NEED wins
        assert_eq!(
            engine
                .submit_roll(&mut rt, drop_id, players[0], RollKind::Greed, &mut rng)
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            engine
                .submit_roll(&mut rt, drop_id, players[1], RollKind::Need, &mut rng)
                .await
                .unwrap(),
            None
        );
        let winner = engine
            .submit_roll(&mut rt, drop_id, players[2], RollKind::Need, &mut rng)
            .await
            .unwrap();
        assert_eq!(winner, Some(players[1]));
        assert_eq!(rt.drops[0].claimed_by, Some(players[1]));
        assert_eq!(inventory.item_quantity(players[1], item).await, 1);
        assert_eq!(inventory.item_quantity(players[0], item).await, 0);
    }

    #[tokio::test]
    async fn double_roll_is_rejected_not_overwritten() {
        let (engine, _, _) = engine();
        let mut rt = runtime(3, 0, LootRule::NeedGreed);
        rt.drops
            .push(LootDrop::item(rt.id(), ItemId::new(), 1, LootMode::Auto));
        engine.distribute(&mut rt).await.unwrap();
        let drop_id = rt.drops[0].id;
        let roller = rt.party.members[0].character_id;
        let mut rng = StdRng::seed_from_u64(1);

        engine
            .submit_roll(&mut rt, drop_id, roller, RollKind::Greed, &mut rng)
            .await
            .unwrap();
        let err = engine
            .submit_roll(&mut rt, drop_id, roller, RollKind::Need, &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        assert_eq!(rt.rolls[&drop_id].len(), 1);
        assert_eq!(rt.rolls[&drop_id][0].kind, RollKind::Greed);
    }

    #[tokio::test]
    async fn master_looter_assignment_requires_authority() {
        let (engine, inventory, _) = engine();
        let mut rt = runtime(3, 0, LootRule::MasterLooter);
        let item = ItemId::new();
        rt.drops
            .push(LootDrop::item(rt.id(), item, 2, LootMode::Auto));
        engine.distribute(&mut rt).await.unwrap();
        let drop_id = rt.drops[0].id;

        let players: Vec<CharacterId> =
            rt.party.player_members().map(|m| m.character_id).collect();
        // Leader is the fallback master looter; players[1] is not authorized
        let err = engine
            .assign_manually(&mut rt, drop_id, players[1], players[2])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));

        let leader_id = rt.party.leader_id;
        engine
            .assign_manually(&mut rt, drop_id, leader_id, players[2])
            .await
            .unwrap();
        assert_eq!(rt.drops[0].claimed_by, Some(players[2]));
        assert_eq!(inventory.item_quantity(players[2], item).await, 2);

        // Atomic: a second assignment is rejected
        let err = engine
            .assign_manually(&mut rt, drop_id, leader_id, players[0])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }
}

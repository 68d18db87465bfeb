//! Party roster snapshot
//!
//! Party CRUD lives with an external collaborator; the mission core consumes
//! a read-only roster snapshot resolved at session start. Roster order is
//! authoritative: gold-split remainders go to the first members in this
//! order.

use serde::{Deserialize, Serialize};

use crate::domain::entities::loot::LootRule;
use crate::domain::value_objects::{CharacterId, PartyId};

/// Player character or hired NPC companion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Player,
    Companion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyMember {
    pub character_id: CharacterId,
    pub name: String,
    pub kind: MemberKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRoster {
    pub party_id: PartyId,
    pub members: Vec<PartyMember>,
    pub leader_id: CharacterId,
    /// Designated master looter; falls back to the leader when unset
    pub master_looter: Option<CharacterId>,
    pub loot_rule: LootRule,
}

impl PartyRoster {
    pub fn is_member(&self, character_id: CharacterId) -> bool {
        self.members.iter().any(|m| m.character_id == character_id)
    }

    pub fn player_members(&self) -> impl Iterator<Item = &PartyMember> {
        self.members.iter().filter(|m| m.kind == MemberKind::Player)
    }

    pub fn player_count(&self) -> usize {
        self.player_members().count()
    }

    pub fn companion_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::Companion)
            .count()
    }

    /// The member with assignment authority over pending drops
    pub fn loot_master(&self) -> CharacterId {
        self.master_looter.unwrap_or(self.leader_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> PartyRoster {
        let leader = CharacterId::new();
        PartyRoster {
            party_id: PartyId::new(),
            members: vec![
                PartyMember {
                    character_id: leader,
                    name: "Aria".into(),
                    kind: MemberKind::Player,
                },
                PartyMember {
                    character_id: CharacterId::new(),
                    name: "Sellsword".into(),
                    kind: MemberKind::Companion,
                },
            ],
            leader_id: leader,
            master_looter: None,
            loot_rule: LootRule::Auto,
        }
    }

    #[test]
    fn loot_master_falls_back_to_leader() {
        let mut r = roster();
        assert_eq!(r.loot_master(), r.leader_id);
        let designated = CharacterId::new();
        r.master_looter = Some(designated);
        assert_eq!(r.loot_master(), designated);
    }

    #[test]
    fn member_counts_split_by_kind() {
        let r = roster();
        assert_eq!(r.player_count(), 1);
        assert_eq!(r.companion_count(), 1);
    }
}

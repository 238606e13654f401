use crate::types::{ArchetypeName, GridPos};
use serde::{Deserialize, Serialize};

/// All player-issued intents.
/// Invalid intents are no-ops: the engine reports them as
/// `CommandRejected` and leaves state untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// Plant one owned seed of `archetype` at `cell`.
    Place {
        archetype: ArchetypeName,
        cell:      GridPos,
    },
    /// Buy the shop offering in `slot` into the inventory.
    Purchase {
        slot: usize,
    },
    /// Pay the reroll cost for a fresh set of offerings.
    Reroll,
    /// Open or close the storefront panel.
    ToggleShop,
}

impl PlayerCommand {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Place { .. }    => "place",
            Self::Purchase { .. } => "purchase",
            Self::Reroll          => "reroll",
            Self::ToggleShop      => "toggle_shop",
        }
    }
}

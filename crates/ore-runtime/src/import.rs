//! Player import: rewarded-ad gate, remote equipment lookup and the merge of
//! imported levels into the plan list.

use ore_core::{Catalog, UpgradePlan};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// Result of asking the ad network for a rewarded view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdOutcome {
    Rewarded,
    /// The viewer closed the ad before the reward.
    Dismissed,
    /// No ad could be loaded (network or inventory).
    FailedToLoad,
    /// The ad loaded but could not be prepared or shown.
    PrepareOrShowFailed,
}

/// Gate that must grant a reward before a remote lookup runs.
pub trait AdGate {
    fn request_rewarded_view(&mut self) -> impl Future<Output = AdOutcome>;
}

/// Gate that grants every request; used where no ad network exists.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAdGate;

impl AdGate for NoAdGate {
    async fn request_rewarded_view(&mut self) -> AdOutcome {
        debug!("no ad network; granting reward");
        AdOutcome::Rewarded
    }
}

/// One equipment level reported for a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentLevel {
    pub name: String,
    pub level: u32,
}

/// A player's name and equipment as returned by the lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub equipment: Vec<EquipmentLevel>,
}

/// Remote source of per-player equipment levels.
pub trait EquipmentLookup {
    fn fetch_player(&self, tag: &str) -> impl Future<Output = Result<PlayerProfile, LookupError>>;
}

/// Failures of the remote lookup, with their user-facing messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Player not found. Please check the Player Tag.")]
    NotFound,
    /// Server unreachable; the detail is for logs only.
    #[error("Network error: Could not connect to the server. It might be down or misconfigured.")]
    Network(String),
    #[error("Request to server failed with status {0}")]
    Status(u16),
    #[error("An unknown API error occurred.")]
    Unknown,
    /// Reason string forwarded by the server.
    #[error("{0}")]
    Remote(String),
    #[error("Invalid data format received from the server.")]
    Malformed,
}

/// Why an import did not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Player Tag is required.")]
    EmptyTag,
    #[error("An import is already in progress.")]
    Busy,
    #[error("{}", ad_refusal_message(.0))]
    AdNotRewarded(AdOutcome),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

fn ad_refusal_message(outcome: &AdOutcome) -> &'static str {
    match outcome {
        AdOutcome::FailedToLoad => {
            "Ad could not be loaded. Please check your connection and try again."
        }
        _ => "Please watch the full ad to import player data.",
    }
}

/// Ad gate first, then the lookup only if the reward was granted.
pub async fn run_import<G, L>(gate: &mut G, lookup: &L, tag: &str) -> Result<PlayerProfile, ImportError>
where
    G: AdGate,
    L: EquipmentLookup,
{
    let outcome = gate.request_rewarded_view().await;
    if outcome != AdOutcome::Rewarded {
        return Err(ImportError::AdNotRewarded(outcome));
    }
    let profile = lookup.fetch_player(tag).await?;
    Ok(profile)
}

/// Build the plan list after a successful import.
///
/// Items are matched by exact name. Matched items take the imported level,
/// unmatched ones drop to 0. Targets are kept from `previous` when the item
/// had a plan there, otherwise reset to max; a target below the imported
/// level is raised to it.
pub fn merge_imported_levels(
    catalog: &Catalog,
    previous: &[UpgradePlan],
    profile: &PlayerProfile,
) -> Vec<UpgradePlan> {
    catalog
        .equipment()
        .iter()
        .map(|def| {
            let level = profile
                .equipment
                .iter()
                .find(|e| e.name == def.name)
                .map_or(0, |e| e.level);
            let target = previous
                .iter()
                .find(|p| p.equipment.name == def.name)
                .map_or(def.max_level, UpgradePlan::target_level);
            let mut plan = UpgradePlan::new(def.clone());
            plan.set_current_level(0);
            plan.set_target_level(i64::from(target));
            plan.adopt_imported_level(level);
            plan
        })
        .collect()
}

#![deny(warnings)]

//! Planner runtime: owns the editable state and keeps the derived projection
//! consistent with it after every change.

mod import;
mod remote;

pub use import::{
    merge_imported_levels, run_import, AdGate, AdOutcome, EquipmentLevel, EquipmentLookup,
    ImportError, LookupError, NoAdGate, PlayerProfile,
};
pub use remote::{decode_lookup_response, ProxyLookup, RawResponse, Transport};

use ore_core::{Bookmark, Catalog, Hero, IncomeSettings, OreKind, Ores, PlayerIdentity, UpgradePlan};
use ore_econ::{
    daily_income, farm_estimate, net_cost, total_cost, EconError, FarmEstimate, IncomeBreakdown,
    MonthlyBreakdown,
};
use persistence::{BookmarkBook, StoreError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything derived from the planner state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Projection {
    pub daily: IncomeBreakdown,
    pub monthly: MonthlyBreakdown,
    pub total_cost: Ores<u64>,
    pub net_cost: Ores<u64>,
    pub farm: FarmEstimate,
}

/// Compute a projection from scratch.
pub fn project(
    catalog: &Catalog,
    plans: &[UpgradePlan],
    held: Ores<u64>,
    settings: &IncomeSettings,
) -> Result<Projection, EconError> {
    let daily = daily_income(settings, catalog)?;
    let total = total_cost(plans);
    let net = net_cost(total, held);
    Ok(Projection {
        daily,
        monthly: daily.monthly(),
        total_cost: total,
        net_cost: net,
        farm: farm_estimate(net, daily.total),
    })
}

/// Single owner of plans, held ore, income settings, the imported player and
/// bookmarks.
#[derive(Debug)]
pub struct Planner {
    catalog: Arc<Catalog>,
    plans: Vec<UpgradePlan>,
    held: Ores<u64>,
    settings: IncomeSettings,
    tag_input: String,
    player: Option<PlayerIdentity>,
    bookmarks: BookmarkBook,
    importing: bool,
    last_error: Option<String>,
    projection: Projection,
}

impl Planner {
    /// One fresh plan per catalog item with default settings.
    pub fn new(catalog: Arc<Catalog>, bookmarks: BookmarkBook) -> Result<Self, EconError> {
        let plans: Vec<UpgradePlan> = catalog
            .equipment()
            .iter()
            .cloned()
            .map(UpgradePlan::new)
            .collect();
        let settings = IncomeSettings::default().clamped(&catalog);
        let held = Ores::ZERO;
        let projection = project(&catalog, &plans, held, &settings)?;
        Ok(Self {
            catalog,
            plans,
            held,
            settings,
            tag_input: String::new(),
            player: None,
            bookmarks,
            importing: false,
            last_error: None,
            projection,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn plans(&self) -> &[UpgradePlan] {
        &self.plans
    }

    /// Plans for one hero, in catalog order.
    pub fn plans_for(&self, hero: Hero) -> impl Iterator<Item = &UpgradePlan> {
        self.plans.iter().filter(move |p| p.equipment.hero == hero)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.plans.iter().position(|p| p.equipment.name == name)
    }

    /// Edit a current level from raw text; unparseable input counts as 0.
    /// Returns `false` when `index` is out of range.
    pub fn edit_current_level(&mut self, index: usize, raw: &str) -> bool {
        let Some(plan) = self.plans.get_mut(index) else {
            return false;
        };
        plan.set_current_level(parse_leading_int(raw).unwrap_or(0));
        self.refresh();
        true
    }

    /// Edit a target level from raw text; unparseable input clamps up to
    /// the current level.
    pub fn edit_target_level(&mut self, index: usize, raw: &str) -> bool {
        let Some(plan) = self.plans.get_mut(index) else {
            return false;
        };
        let level = parse_leading_int(raw).unwrap_or(i64::from(plan.current_level()));
        plan.set_target_level(level);
        self.refresh();
        true
    }

    /// Set both levels of a plan; current first so the target clamp sees it.
    pub fn set_levels(&mut self, index: usize, current: i64, target: i64) -> bool {
        let Some(plan) = self.plans.get_mut(index) else {
            return false;
        };
        plan.set_current_level(current);
        plan.set_target_level(target);
        self.refresh();
        true
    }

    pub fn held(&self) -> Ores<u64> {
        self.held
    }

    /// Edit one held amount from raw text.
    ///
    /// Empty or negative input stores 0; trailing text after the leading
    /// number is dropped; input without leading digits is ignored.
    pub fn edit_held(&mut self, kind: OreKind, raw: &str) {
        let value = if raw.trim().is_empty() {
            0
        } else {
            match parse_leading_int(raw) {
                Some(n) => u64::try_from(n).unwrap_or(0),
                None => return,
            }
        };
        self.held.set(kind, value);
        self.refresh();
    }

    pub fn set_held(&mut self, held: Ores<u64>) {
        self.held = held;
        self.refresh();
    }

    pub fn settings(&self) -> &IncomeSettings {
        &self.settings
    }

    /// Replace the income settings; they are stored clamped.
    pub fn update_settings(&mut self, settings: IncomeSettings) {
        self.settings = settings.clamped(&self.catalog);
        self.refresh();
    }

    pub fn tag_input(&self) -> &str {
        &self.tag_input
    }

    /// Store the player tag as typed (upper-cased); clears the imported
    /// player.
    pub fn set_tag_input(&mut self, raw: &str) {
        self.tag_input = raw.trim().to_uppercase();
        self.player = None;
    }

    pub fn player(&self) -> Option<&PlayerIdentity> {
        self.player.as_ref()
    }

    /// Message of the last failed import, cleared when a new one starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    /// Claim the single import slot for `tag`, returning the normalised tag.
    pub fn begin_import(&mut self, tag: &str) -> Result<String, ImportError> {
        if self.importing {
            return Err(ImportError::Busy);
        }
        let tag = tag.trim().to_uppercase();
        if tag.is_empty() {
            self.player = None;
            self.last_error = Some(ImportError::EmptyTag.to_string());
            return Err(ImportError::EmptyTag);
        }
        self.importing = true;
        self.last_error = None;
        debug!(%tag, "import started");
        Ok(tag)
    }

    /// Release the import slot and apply `outcome` all-or-nothing.
    pub fn finish_import(
        &mut self,
        tag: &str,
        outcome: Result<PlayerProfile, ImportError>,
    ) -> Result<(), ImportError> {
        self.importing = false;
        match outcome {
            Ok(profile) => {
                self.plans = merge_imported_levels(&self.catalog, &self.plans, &profile);
                info!(%tag, name = %profile.name, items = profile.equipment.len(), "player imported");
                self.player = Some(PlayerIdentity {
                    tag: tag.to_string(),
                    name: profile.name,
                });
                self.refresh();
                Ok(())
            }
            Err(e) => {
                warn!(%tag, error = %e, "import failed");
                self.player = None;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Import the player named by the tag input: ad gate, lookup, merge.
    pub async fn import_player<G, L>(&mut self, gate: &mut G, lookup: &L) -> Result<(), ImportError>
    where
        G: AdGate,
        L: EquipmentLookup,
    {
        let requested = self.tag_input.clone();
        let tag = self.begin_import(&requested)?;
        let outcome = run_import(gate, lookup, &tag).await;
        self.finish_import(&tag, outcome)
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        self.bookmarks.entries()
    }

    /// Bookmark the imported player. `Ok(false)` when there is none or the
    /// tag is already saved.
    pub fn bookmark_current_player(&mut self) -> Result<bool, StoreError> {
        match &self.player {
            Some(player) => self.bookmarks.add(Bookmark::from(player)),
            None => Ok(false),
        }
    }

    pub fn remove_bookmark(&mut self, tag: &str) -> Result<bool, StoreError> {
        self.bookmarks.remove(tag)
    }

    /// Put a bookmarked tag back into the tag input.
    pub fn select_bookmark(&mut self, tag: &str) -> bool {
        if !self.bookmarks.contains(tag) {
            return false;
        }
        self.set_tag_input(tag);
        true
    }

    /// Derived outputs for the current state.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    fn refresh(&mut self) {
        match project(&self.catalog, &self.plans, self.held, &self.settings) {
            Ok(p) => {
                debug!(net = ?p.net_cost, farm = %p.farm.time, "projection refreshed");
                self.projection = p;
            }
            Err(e) => warn!(error = %e, "projection not refreshed"),
        }
    }
}

/// Leading optionally-signed integer of `raw`, ignoring trailing text.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let n = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * n)
}

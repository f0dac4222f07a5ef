#![deny(warnings)]

//! Core domain models and invariants for the ore planner.
//!
//! This crate defines the serializable types shared by the income and cost
//! models, the static [`Catalog`] of equipment and income tables, and
//! validation helpers that guarantee basic invariants.

mod catalog;

pub use catalog::{validate_catalog, Catalog, CatalogError, League, TraderRates, WarLoot};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Index};
use std::sync::Arc;
use thiserror::Error;

/// Lowest town-hall tier with a war loot entry.
pub const WAR_TOWN_HALL_MIN: u8 = 8;
/// Highest town-hall tier with a war loot entry.
pub const WAR_TOWN_HALL_MAX: u8 = 17;
/// Upper bound of the weekly war attack count.
pub const MAX_WAR_ATTACKS_PER_WEEK: u8 = 7;
/// Win ratio is expressed in percent.
pub const MAX_WAR_WIN_RATIO: u8 = 100;
/// Weekly purchase caps for the raid-medal trader.
pub const MEDAL_PURCHASE_CAPS: Ores<u32> = Ores::new(2, 2, 2);
/// Weekly purchase caps for the gem trader.
pub const GEM_PURCHASE_CAPS: Ores<u32> = Ores::new(5, 2, 1);

/// The three upgrade currencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OreKind {
    Shiny,
    Glowy,
    Starry,
}

impl OreKind {
    /// All ore kinds in display order.
    pub const ALL: [OreKind; 3] = [OreKind::Shiny, OreKind::Glowy, OreKind::Starry];

    pub fn label(self) -> &'static str {
        match self {
            OreKind::Shiny => "Shiny Ore",
            OreKind::Glowy => "Glowy Ore",
            OreKind::Starry => "Starry Ore",
        }
    }
}

impl fmt::Display for OreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One quantity per ore kind.
///
/// Used as `Ores<u64>` for costs, held balances and rounded monthly figures,
/// and as `Ores<f64>` for fractional daily rates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ores<T> {
    #[serde(default)]
    pub shiny: T,
    #[serde(default)]
    pub glowy: T,
    #[serde(default)]
    pub starry: T,
}

impl<T: Copy> Ores<T> {
    pub const fn new(shiny: T, glowy: T, starry: T) -> Self {
        Self {
            shiny,
            glowy,
            starry,
        }
    }

    /// Same value for every ore kind.
    pub const fn splat(value: T) -> Self {
        Self::new(value, value, value)
    }

    pub fn get(&self, kind: OreKind) -> T {
        match kind {
            OreKind::Shiny => self.shiny,
            OreKind::Glowy => self.glowy,
            OreKind::Starry => self.starry,
        }
    }

    pub fn set(&mut self, kind: OreKind, value: T) {
        match kind {
            OreKind::Shiny => self.shiny = value,
            OreKind::Glowy => self.glowy = value,
            OreKind::Starry => self.starry = value,
        }
    }

    pub fn map<U: Copy>(self, f: impl Fn(T) -> U) -> Ores<U> {
        Ores::new(f(self.shiny), f(self.glowy), f(self.starry))
    }

    /// Combine two triples component by component.
    pub fn zip_with<U: Copy, V: Copy>(self, other: Ores<U>, f: impl Fn(T, U) -> V) -> Ores<V> {
        Ores::new(
            f(self.shiny, other.shiny),
            f(self.glowy, other.glowy),
            f(self.starry, other.starry),
        )
    }

    /// Iterate `(kind, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (OreKind, T)> + '_ {
        OreKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

impl Ores<u64> {
    pub const ZERO: Ores<u64> = Ores::splat(0);

    /// Elementwise `max(0, self - other)`.
    pub fn saturating_sub(self, other: Ores<u64>) -> Ores<u64> {
        self.zip_with(other, u64::saturating_sub)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_f64(self) -> Ores<f64> {
        self.map(|v| v as f64)
    }
}

impl<T: Copy + Add<Output = T>> Add for Ores<T> {
    type Output = Ores<T>;

    fn add(self, rhs: Ores<T>) -> Ores<T> {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<T: Copy + Add<Output = T>> AddAssign for Ores<T> {
    fn add_assign(&mut self, rhs: Ores<T>) {
        *self = *self + rhs;
    }
}

impl<T: Copy + Default + Add<Output = T>> Sum for Ores<T> {
    fn sum<I: Iterator<Item = Ores<T>>>(iter: I) -> Ores<T> {
        iter.fold(Ores::default(), |acc, o| acc + o)
    }
}

impl<T: Copy> Index<OreKind> for Ores<T> {
    type Output = T;

    fn index(&self, kind: OreKind) -> &T {
        match kind {
            OreKind::Shiny => &self.shiny,
            OreKind::Glowy => &self.glowy,
            OreKind::Starry => &self.starry,
        }
    }
}

/// The five hero classes that own equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hero {
    #[serde(rename = "Barbarian King")]
    BarbarianKing,
    #[serde(rename = "Archer Queen")]
    ArcherQueen,
    #[serde(rename = "Minion Prince")]
    MinionPrince,
    #[serde(rename = "Grand Warden")]
    GrandWarden,
    #[serde(rename = "Royal Champion")]
    RoyalChampion,
}

impl Hero {
    /// Heroes in the order the planner groups them.
    pub const ALL: [Hero; 5] = [
        Hero::BarbarianKing,
        Hero::ArcherQueen,
        Hero::MinionPrince,
        Hero::GrandWarden,
        Hero::RoyalChampion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Hero::BarbarianKing => "Barbarian King",
            Hero::ArcherQueen => "Archer Queen",
            Hero::MinionPrince => "Minion Prince",
            Hero::GrandWarden => "Grand Warden",
            Hero::RoyalChampion => "Royal Champion",
        }
    }
}

impl fmt::Display for Hero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Equipment rarity; selects the cost curve an item upgrades along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Epic,
}

/// One upgradeable equipment item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDefinition {
    /// Display name, also the key matched against imported player data.
    pub name: String,
    /// Owning hero.
    pub hero: Hero,
    /// Rarity of the item.
    pub rarity: Rarity,
    /// Highest reachable level.
    pub max_level: u32,
    /// Entry `i` is the cost of going from level `i` to `i + 1`.
    pub levels: Vec<Ores<u64>>,
    /// Icon reference for presentation layers.
    pub icon: String,
}

impl EquipmentDefinition {
    /// Cost of the single step `level -> level + 1`, if the table has one.
    pub fn step_cost(&self, level: u32) -> Option<Ores<u64>> {
        self.levels.get(level as usize).copied()
    }
}

/// Current/target level pair for one catalog item.
///
/// Invariant: `current_level <= target_level <= equipment.max_level`.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradePlan {
    pub equipment: Arc<EquipmentDefinition>,
    current_level: u32,
    target_level: u32,
}

impl UpgradePlan {
    /// Fresh plan: level 1 aiming for the max level.
    pub fn new(equipment: Arc<EquipmentDefinition>) -> Self {
        let max = equipment.max_level;
        Self {
            equipment,
            current_level: 1.min(max),
            target_level: max,
        }
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn target_level(&self) -> u32 {
        self.target_level
    }

    pub fn max_level(&self) -> u32 {
        self.equipment.max_level
    }

    /// Clamp `level` into `[0, max]`; raises the target when it would fall
    /// below the new current level.
    pub fn set_current_level(&mut self, level: i64) {
        let clamped = clamp_level(level, 0, self.max_level());
        self.current_level = clamped;
        if clamped > self.target_level {
            self.target_level = clamped;
        }
    }

    /// Clamp `level` into `[current, max]`.
    pub fn set_target_level(&mut self, level: i64) {
        self.target_level = clamp_level(level, self.current_level, self.max_level());
    }

    /// Adopt a level reported by an import, keeping the existing target.
    pub fn adopt_imported_level(&mut self, level: u32) {
        self.set_current_level(i64::from(level));
    }

    pub fn is_complete(&self) -> bool {
        self.current_level >= self.target_level
    }
}

fn clamp_level(level: i64, min: u32, max: u32) -> u32 {
    let clamped = level.clamp(i64::from(min), i64::from(max.max(min)));
    u32::try_from(clamped).unwrap_or(min)
}

/// User-editable income assumptions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeSettings {
    /// Index into the catalog league table.
    pub league_index: usize,
    /// Town hall tier used for war loot, in `[8, 17]`.
    pub war_town_hall: u8,
    /// War attacks per week, `0..=7`.
    pub war_attacks_per_week: u8,
    /// Percent of war attacks won, `0..=100`.
    pub war_win_ratio: u8,
    /// Weekly raid-medal trader purchases per ore.
    pub medal_purchases: Ores<u32>,
    /// Weekly gem trader purchases per ore.
    pub gem_purchases: Ores<u32>,
    /// Whether the free weekly glowy bundle is claimed.
    pub claim_free_glowy: bool,
    /// Hand-entered monthly income from any other source.
    pub misc_monthly: Ores<u64>,
}

impl Default for IncomeSettings {
    fn default() -> Self {
        Self {
            league_index: 33,
            war_town_hall: WAR_TOWN_HALL_MAX,
            war_attacks_per_week: MAX_WAR_ATTACKS_PER_WEEK,
            war_win_ratio: MAX_WAR_WIN_RATIO,
            medal_purchases: MEDAL_PURCHASE_CAPS,
            gem_purchases: Ores::splat(0),
            claim_free_glowy: true,
            misc_monthly: Ores::ZERO,
        }
    }
}

impl IncomeSettings {
    /// Copy of these settings with every field inside its legal range.
    pub fn clamped(&self, catalog: &Catalog) -> IncomeSettings {
        let last_league = catalog.leagues().len().saturating_sub(1);
        IncomeSettings {
            league_index: self.league_index.min(last_league),
            war_town_hall: self
                .war_town_hall
                .clamp(WAR_TOWN_HALL_MIN, WAR_TOWN_HALL_MAX),
            war_attacks_per_week: self.war_attacks_per_week.min(MAX_WAR_ATTACKS_PER_WEEK),
            war_win_ratio: self.war_win_ratio.min(MAX_WAR_WIN_RATIO),
            medal_purchases: self.medal_purchases.zip_with(MEDAL_PURCHASE_CAPS, u32::min),
            gem_purchases: self.gem_purchases.zip_with(GEM_PURCHASE_CAPS, u32::min),
            claim_free_glowy: self.claim_free_glowy,
            misc_monthly: self.misc_monthly,
        }
    }
}

/// A remote player account reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub tag: String,
    pub name: String,
}

/// A saved player, deduplicated by tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub tag: String,
    pub name: String,
}

impl From<&PlayerIdentity> for Bookmark {
    fn from(p: &PlayerIdentity) -> Self {
        Bookmark {
            tag: p.tag.clone(),
            name: p.name.clone(),
        }
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Equipment names must be non-empty.
    #[error("equipment name must not be empty")]
    EmptyName,
    /// Cost table must have one entry per level.
    #[error("equipment {name}: cost table has {len} entries but max level is {max_level}")]
    CostTableLength {
        name: String,
        len: usize,
        max_level: u32,
    },
    /// Two catalog items share a name.
    #[error("duplicate equipment name: {0}")]
    DuplicateEquipment(String),
    /// A hero category has no equipment at all.
    #[error("hero {0} has no equipment")]
    EmptyHero(Hero),
    /// League table must not be empty.
    #[error("league table is empty")]
    NoLeagues,
    /// War loot table must cover every supported town hall tier.
    #[error("war loot missing for town hall {0}")]
    MissingWarTier(u8),
}

/// Validate a single equipment definition.
pub fn validate_equipment(def: &EquipmentDefinition) -> Result<(), ValidationError> {
    if def.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if def.levels.len() != def.max_level as usize {
        return Err(ValidationError::CostTableLength {
            name: def.name.clone(),
            len: def.levels.len(),
            max_level: def.max_level,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(max_level: u32) -> Arc<EquipmentDefinition> {
        Arc::new(EquipmentDefinition {
            name: "Rage Vial".to_string(),
            hero: Hero::BarbarianKing,
            rarity: Rarity::Common,
            max_level,
            levels: (0..max_level)
                .map(|i| Ores::new(u64::from(i) * 10, 0, 0))
                .collect(),
            icon: String::new(),
        })
    }

    #[test]
    fn new_plan_starts_at_one_and_targets_max() {
        let plan = UpgradePlan::new(item(18));
        assert_eq!(plan.current_level(), 1);
        assert_eq!(plan.target_level(), 18);
    }

    #[test]
    fn raising_current_above_target_drags_target_up() {
        let mut plan = UpgradePlan::new(item(18));
        plan.set_target_level(5);
        plan.set_current_level(9);
        assert_eq!(plan.current_level(), 9);
        assert_eq!(plan.target_level(), 9);
    }

    #[test]
    fn target_never_drops_below_current() {
        let mut plan = UpgradePlan::new(item(18));
        plan.set_current_level(7);
        plan.set_target_level(2);
        assert_eq!(plan.target_level(), 7);
        plan.set_target_level(99);
        assert_eq!(plan.target_level(), 18);
    }

    #[test]
    fn current_clamps_into_range() {
        let mut plan = UpgradePlan::new(item(18));
        plan.set_current_level(-4);
        assert_eq!(plan.current_level(), 0);
        plan.set_current_level(40);
        assert_eq!(plan.current_level(), 18);
        assert_eq!(plan.target_level(), 18);
    }

    #[test]
    fn ores_saturating_sub_never_negative() {
        let total = Ores::new(100, 5, 0);
        let held = Ores::new(40, 10, 3);
        assert_eq!(total.saturating_sub(held), Ores::new(60, 0, 0));
    }

    #[test]
    fn ores_sum_and_index() {
        let sum: Ores<u64> = vec![Ores::new(1, 2, 3), Ores::new(4, 5, 6)]
            .into_iter()
            .sum();
        assert_eq!(sum, Ores::new(5, 7, 9));
        assert_eq!(sum[OreKind::Glowy], 7);
        let kinds: Vec<OreKind> = sum.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, OreKind::ALL.to_vec());
    }

    #[test]
    fn ores_missing_fields_default_to_zero() {
        let o: Ores<u64> = serde_json::from_str(r#"{"glowy": 20}"#).unwrap();
        assert_eq!(o, Ores::new(0, 20, 0));
    }

    #[test]
    fn settings_roundtrip_with_defaults() {
        let s: IncomeSettings = serde_json::from_str(r#"{"war_town_hall": 12}"#).unwrap();
        assert_eq!(s.war_town_hall, 12);
        assert_eq!(s.league_index, 33);
        assert!(s.claim_free_glowy);
        let back: IncomeSettings = serde_json::from_str(&serde_json::to_string(&s).unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn validate_rejects_short_cost_table() {
        let mut def = (*item(18)).clone();
        def.levels.pop();
        assert!(matches!(
            validate_equipment(&def),
            Err(ValidationError::CostTableLength { len: 17, .. })
        ));
    }

    proptest! {
        #[test]
        fn level_edits_keep_plan_invariant(max in 1u32..40,
                                           edits in proptest::collection::vec((any::<bool>(), -50i64..80), 1..20)) {
            let mut plan = UpgradePlan::new(item(max));
            for (is_current, level) in edits {
                if is_current {
                    plan.set_current_level(level);
                } else {
                    plan.set_target_level(level);
                }
                prop_assert!(plan.current_level() <= plan.target_level());
                prop_assert!(plan.target_level() <= max);
            }
        }
    }
}

//! Static reference data: equipment cost tables, league bonuses, war loot
//! and trader exchange rates.

use crate::{
    validate_equipment, EquipmentDefinition, Hero, Ores, Rarity, ValidationError,
    WAR_TOWN_HALL_MAX, WAR_TOWN_HALL_MIN,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.yaml");

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("equipment {name} uses unknown cost curve {rarity:?}")]
    UnknownCurve { name: String, rarity: Rarity },
    #[error("invalid catalog: {0}")]
    Invalid(#[from] ValidationError),
}

/// A trophy league tier and the ore it awards every day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub name: String,
    pub icon: String,
    /// Star bonus ore; already a daily figure.
    pub daily_bonus: Ores<u64>,
}

/// Ore awarded per war attack at one town hall tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WarLoot {
    pub win: Ores<u64>,
    pub loss: Ores<u64>,
}

/// Ore received per trader purchase, per currency channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraderRates {
    /// Raid-medal channel.
    pub medal: Ores<u64>,
    /// Gem channel.
    pub gem: Ores<u64>,
    /// Free weekly glowy bundle on the gem channel.
    pub free_glowy: u64,
}

#[derive(Deserialize)]
struct EquipmentEntry {
    name: String,
    hero: Hero,
    rarity: Rarity,
    icon: String,
}

#[derive(Deserialize)]
struct CatalogFile {
    cost_curves: BTreeMap<Rarity, Vec<Ores<u64>>>,
    equipment: Vec<EquipmentEntry>,
    leagues: Vec<League>,
    war_loot: BTreeMap<u8, WarLoot>,
    trader: TraderRates,
}

/// Immutable lookup tables shared by the income and cost models.
#[derive(Clone, Debug)]
pub struct Catalog {
    equipment: Vec<Arc<EquipmentDefinition>>,
    leagues: Vec<League>,
    war_loot: BTreeMap<u8, WarLoot>,
    trader: TraderRates,
}

impl Catalog {
    /// The reference data compiled into the crate.
    pub fn builtin() -> Result<Catalog, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate a catalog document.
    pub fn from_yaml_str(text: &str) -> Result<Catalog, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(text)?;
        let mut equipment = Vec::with_capacity(file.equipment.len());
        for entry in file.equipment {
            let levels = file
                .cost_curves
                .get(&entry.rarity)
                .ok_or_else(|| CatalogError::UnknownCurve {
                    name: entry.name.clone(),
                    rarity: entry.rarity,
                })?
                .clone();
            let def = EquipmentDefinition {
                max_level: levels.len() as u32,
                name: entry.name,
                hero: entry.hero,
                rarity: entry.rarity,
                levels,
                icon: entry.icon,
            };
            equipment.push(Arc::new(def));
        }
        let catalog = Catalog {
            equipment,
            leagues: file.leagues,
            war_loot: file.war_loot,
            trader: file.trader,
        };
        validate_catalog(&catalog)?;
        debug!(
            equipment = catalog.equipment.len(),
            leagues = catalog.leagues.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Every item, in catalog order.
    pub fn equipment(&self) -> &[Arc<EquipmentDefinition>] {
        &self.equipment
    }

    pub fn equipment_named(&self, name: &str) -> Option<&Arc<EquipmentDefinition>> {
        self.equipment.iter().find(|e| e.name == name)
    }

    pub fn equipment_for(&self, hero: Hero) -> impl Iterator<Item = &Arc<EquipmentDefinition>> {
        self.equipment.iter().filter(move |e| e.hero == hero)
    }

    pub fn leagues(&self) -> &[League] {
        &self.leagues
    }

    pub fn league(&self, index: usize) -> Option<&League> {
        self.leagues.get(index)
    }

    /// War loot for a town hall tier in `[8, 17]`.
    pub fn war_loot(&self, town_hall: u8) -> Option<&WarLoot> {
        self.war_loot.get(&town_hall)
    }

    pub fn trader(&self) -> &TraderRates {
        &self.trader
    }
}

/// Validate cross-table invariants of a loaded catalog.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    let mut names = BTreeSet::new();
    for def in &catalog.equipment {
        validate_equipment(def)?;
        if !names.insert(def.name.as_str()) {
            return Err(ValidationError::DuplicateEquipment(def.name.clone()));
        }
    }
    for hero in Hero::ALL {
        if catalog.equipment_for(hero).next().is_none() {
            return Err(ValidationError::EmptyHero(hero));
        }
    }
    if catalog.leagues.is_empty() {
        return Err(ValidationError::NoLeagues);
    }
    for th in WAR_TOWN_HALL_MIN..=WAR_TOWN_HALL_MAX {
        if !catalog.war_loot.contains_key(&th) {
            return Err(ValidationError::MissingWarTier(th));
        }
    }
    Ok(())
}

#![deny(warnings)]

//! Headless planner: loads a scenario, optionally imports a player from a
//! saved lookup payload, manages bookmarks and prints the projection.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use ore_core::{Catalog, Hero, IncomeSettings, OreKind, Ores};
use ore_econ::{trader_purchase_preview, IncomeSource};
use ore_runtime::{NoAdGate, Planner, ProxyLookup, RawResponse, Transport};
use persistence::{default_store_dir, BookmarkBook, FileStore};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<PathBuf>,
    catalog: Option<PathBuf>,
    import: Option<String>,
    player_file: Option<PathBuf>,
    bookmarks_dir: Option<PathBuf>,
    bookmark: bool,
    forget: Option<String>,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next().map(PathBuf::from),
            "--catalog" => args.catalog = it.next().map(PathBuf::from),
            "--import" => args.import = it.next(),
            "--player-file" => args.player_file = it.next().map(PathBuf::from),
            "--bookmarks-dir" => args.bookmarks_dir = it.next().map(PathBuf::from),
            "--bookmark" => args.bookmark = true,
            "--forget" => args.forget = it.next(),
            "--json" => args.json = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    args
}

/// Scenario file: held ore, income settings and per-item level overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scenario {
    held: Ores<u64>,
    income: Option<IncomeSettings>,
    plans: Vec<PlanOverride>,
}

#[derive(Debug, Deserialize)]
struct PlanOverride {
    name: String,
    current: Option<i64>,
    target: Option<i64>,
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))
}

fn apply_scenario(planner: &mut Planner, scenario: Scenario) -> Result<()> {
    planner.set_held(scenario.held);
    if let Some(income) = scenario.income {
        planner.update_settings(income);
    }
    for o in scenario.plans {
        let Some(index) = planner.index_of(&o.name) else {
            bail!("scenario names unknown equipment '{}'", o.name);
        };
        let plan = &planner.plans()[index];
        let current = o.current.unwrap_or(i64::from(plan.current_level()));
        let target = o.target.unwrap_or(i64::from(plan.target_level()));
        planner.set_levels(index, current, target);
    }
    Ok(())
}

/// Transport answering every request with a saved proxy response on disk.
struct FileTransport {
    path: PathBuf,
}

impl Transport for FileTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, String> {
        debug!(%url, path = %self.path.display(), "serving saved response");
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| format!("{}: {e}", self.path.display()))?;
        Ok((200, body))
    }
}

fn print_summary(planner: &Planner) {
    let p = planner.projection();
    println!("{:<16} {:>10} {:>10} {:>10}", "Monthly income", "Shiny", "Glowy", "Starry");
    for source in IncomeSource::ALL {
        let m = p.monthly.source(source);
        println!(
            "{:<16} {:>10} {:>10} {:>10}",
            source.label(),
            m.shiny,
            m.glowy,
            m.starry
        );
    }
    let t = p.monthly.total;
    println!("{:<16} {:>10} {:>10} {:>10}", "Total", t.shiny, t.glowy, t.starry);
    let settings = planner.settings();
    let trader = planner.catalog().trader();
    for (label, bought) in [
        ("Medals / week", trader_purchase_preview(settings.medal_purchases, trader.medal)),
        ("Gems / week", trader_purchase_preview(settings.gem_purchases, trader.gem)),
    ] {
        println!(
            "{:<16} {:>10} {:>10} {:>10}",
            label, bought.shiny, bought.glowy, bought.starry
        );
    }
    println!();

    for hero in Hero::ALL {
        let open: Vec<String> = planner
            .plans_for(hero)
            .filter(|pl| !pl.is_complete())
            .map(|pl| {
                format!(
                    "{} {}->{}",
                    pl.equipment.name,
                    pl.current_level(),
                    pl.target_level()
                )
            })
            .collect();
        if !open.is_empty() {
            println!("{hero}: {}", open.join(", "));
        }
    }
    println!();

    let ore_line = |ores: Ores<u64>| {
        OreKind::ALL
            .iter()
            .map(|k| format!("{} {}", ores[*k], k.label()))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    println!("Total cost: {}", ore_line(p.total_cost));
    println!("Held:       {}", ore_line(planner.held()));
    println!("Still need: {}", ore_line(p.net_cost));

    let farm = &p.farm;
    match (farm.is_unbounded(), farm.bottleneck) {
        _ if p.net_cost.is_zero() => println!("Farm time:  {} (nothing left to farm)", farm.time),
        (true, Some(kind)) => println!("Farm time:  never ({} has no income)", kind.label()),
        (true, None) => println!("Farm time:  {} (an ore without income governs)", farm.time),
        (false, None) => println!("Farm time:  {}", farm.time),
        (false, Some(kind)) => {
            let eta = farm
                .projected_completion(Utc::now().date_naive())
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "Farm time:  {} (bottleneck {}, done around {eta})",
                farm.time,
                kind.label()
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    info!(?args, "starting ore planner");

    let catalog = match &args.catalog {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::builtin().context("loading built-in catalog")?,
    };
    let store_dir = args
        .bookmarks_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_store_dir()));
    let store = FileStore::open(&store_dir)
        .with_context(|| format!("opening bookmark store {}", store_dir.display()))?;
    let mut planner = Planner::new(Arc::new(catalog), BookmarkBook::load(store))?;

    if let Some(path) = &args.scenario {
        let scenario = load_scenario(path)?;
        apply_scenario(&mut planner, scenario)?;
    }

    if let Some(tag) = &args.import {
        let Some(path) = args.player_file.clone() else {
            bail!("--import needs --player-file with a saved lookup response");
        };
        planner.set_tag_input(tag);
        let endpoint = format!("file://{}", path.display());
        let lookup = ProxyLookup::new(endpoint, FileTransport { path });
        if let Err(e) = planner.import_player(&mut NoAdGate, &lookup).await {
            bail!("import failed: {e}");
        }
        if let Some(player) = planner.player() {
            println!("Imported {} ({})", player.name, player.tag);
        }
    }

    if args.bookmark {
        match planner.bookmark_current_player()? {
            true => println!("Bookmarked {}", planner.tag_input()),
            false if planner.player().is_none() => warn!("--bookmark needs a successful --import"),
            false => println!("{} is already bookmarked", planner.tag_input()),
        }
    }
    if let Some(tag) = &args.forget {
        let tag = tag.trim().to_uppercase();
        if !planner.remove_bookmark(&tag)? {
            warn!(%tag, "no bookmark to remove");
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(planner.projection())?);
    } else {
        print_summary(&planner);
    }

    let bookmarks = planner.bookmarks();
    if !bookmarks.is_empty() {
        println!();
        println!("Bookmarks:");
        for b in bookmarks {
            println!("  {:<12} {}", b.tag, b.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ore_runtime::{EquipmentLookup, LookupError};

    fn sample_player() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/player.json")
    }

    #[tokio::test]
    async fn saved_response_goes_through_proxy_lookup() {
        let path = sample_player();
        let lookup = ProxyLookup::new(
            format!("file://{}", path.display()),
            FileTransport { path: path.clone() },
        );
        assert!(lookup.url_for("#2PP").ends_with("player.json?tag=%232PP"));
        let profile = lookup.fetch_player("#2PP").await.unwrap();
        assert_eq!(profile.name, "Chief Ada");
        assert_eq!(profile.equipment.len(), 6);
    }

    #[tokio::test]
    async fn missing_file_is_a_network_error() {
        let path = PathBuf::from("does/not/exist.json");
        let lookup = ProxyLookup::new("file://nowhere", FileTransport { path });
        assert!(matches!(
            lookup.fetch_player("#2PP").await,
            Err(LookupError::Network(_))
        ));
    }
}

//! Daily income by source.
//!
//! All daily figures stay fractional; rounding only happens when converting
//! to the monthly view, independently per source and per ore.

use crate::{EconError, DAYS_PER_MONTH, DAYS_PER_WEEK};
use ore_core::{Catalog, IncomeSettings, Ores, WarLoot};
use serde::Serialize;
use tracing::debug;

/// Where a slice of income comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeSource {
    LeagueBonus,
    War,
    MedalTrader,
    GemTrader,
    Misc,
}

impl IncomeSource {
    pub const ALL: [IncomeSource; 5] = [
        IncomeSource::LeagueBonus,
        IncomeSource::War,
        IncomeSource::MedalTrader,
        IncomeSource::GemTrader,
        IncomeSource::Misc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IncomeSource::LeagueBonus => "Star Bonus",
            IncomeSource::War => "Clan Wars",
            IncomeSource::MedalTrader => "Trader (Raids)",
            IncomeSource::GemTrader => "Trader (Gems)",
            IncomeSource::Misc => "Other",
        }
    }
}

/// Daily income per source plus the combined total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct IncomeBreakdown {
    pub league_bonus: Ores<f64>,
    pub war: Ores<f64>,
    pub medal_trader: Ores<f64>,
    pub gem_trader: Ores<f64>,
    pub misc: Ores<f64>,
    pub total: Ores<f64>,
}

/// Monthly income per source, each figure rounded on its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyBreakdown {
    pub league_bonus: Ores<u64>,
    pub war: Ores<u64>,
    pub medal_trader: Ores<u64>,
    pub gem_trader: Ores<u64>,
    pub misc: Ores<u64>,
    pub total: Ores<u64>,
}

impl IncomeBreakdown {
    pub fn source(&self, source: IncomeSource) -> Ores<f64> {
        match source {
            IncomeSource::LeagueBonus => self.league_bonus,
            IncomeSource::War => self.war,
            IncomeSource::MedalTrader => self.medal_trader,
            IncomeSource::GemTrader => self.gem_trader,
            IncomeSource::Misc => self.misc,
        }
    }

    /// Scale every component, total included, to 30 days and round.
    ///
    /// The rounded components need not add up to the rounded total.
    pub fn monthly(&self) -> MonthlyBreakdown {
        MonthlyBreakdown {
            league_bonus: to_monthly(self.league_bonus),
            war: to_monthly(self.war),
            medal_trader: to_monthly(self.medal_trader),
            gem_trader: to_monthly(self.gem_trader),
            misc: to_monthly(self.misc),
            total: to_monthly(self.total),
        }
    }
}

impl MonthlyBreakdown {
    pub fn source(&self, source: IncomeSource) -> Ores<u64> {
        match source {
            IncomeSource::LeagueBonus => self.league_bonus,
            IncomeSource::War => self.war,
            IncomeSource::MedalTrader => self.medal_trader,
            IncomeSource::GemTrader => self.gem_trader,
            IncomeSource::Misc => self.misc,
        }
    }
}

/// Daily rate to a rounded 30-day figure.
pub fn to_monthly(daily: Ores<f64>) -> Ores<u64> {
    daily.map(|v| (v * DAYS_PER_MONTH).round().max(0.0) as u64)
}

/// Expected daily war loot.
///
/// `(attacks / 7) * (win * r + loss * (1 - r))` with `r = win_ratio_pct / 100`.
pub fn war_income(loot: &WarLoot, attacks_per_week: u8, win_ratio_pct: u8) -> Ores<f64> {
    let win_rate = f64::from(win_ratio_pct) / 100.0;
    let loss_rate = 1.0 - win_rate;
    let daily_attacks = f64::from(attacks_per_week) / DAYS_PER_WEEK;
    loot.win.as_f64().zip_with(loot.loss.as_f64(), |win, loss| {
        daily_attacks * (win * win_rate + loss * loss_rate)
    })
}

/// Weekly trader purchases spread over seven days.
///
/// `bonus` is added to the weekly amount before the division.
pub fn trader_income(purchases: Ores<u32>, rate: Ores<u64>, bonus: Ores<u64>) -> Ores<f64> {
    trader_purchase_preview(purchases, rate)
        .zip_with(bonus, |bought, free| (bought + free) as f64 / DAYS_PER_WEEK)
}

/// Ore bought per week on one channel, as shown next to each slider.
pub fn trader_purchase_preview(purchases: Ores<u32>, rate: Ores<u64>) -> Ores<u64> {
    purchases.zip_with(rate, |count, per| u64::from(count) * per)
}

/// Hand-entered monthly amounts as a daily rate.
pub fn misc_income(monthly: Ores<u64>) -> Ores<f64> {
    monthly.as_f64().map(|v| v / DAYS_PER_MONTH)
}

/// Compute the daily income breakdown for `settings`.
///
/// Settings must index inside the catalog tables; use
/// [`IncomeSettings::clamped`] first when they come from user input.
pub fn daily_income(
    settings: &IncomeSettings,
    catalog: &Catalog,
) -> Result<IncomeBreakdown, EconError> {
    let league = catalog
        .league(settings.league_index)
        .ok_or(EconError::UnknownLeague(settings.league_index))?;
    let loot = catalog
        .war_loot(settings.war_town_hall)
        .ok_or(EconError::UnknownTownHall(settings.war_town_hall))?;
    let trader = catalog.trader();

    let league_bonus = league.daily_bonus.as_f64();
    let war = war_income(
        loot,
        settings.war_attacks_per_week,
        settings.war_win_ratio,
    );
    let medal_trader = trader_income(settings.medal_purchases, trader.medal, Ores::ZERO);
    let free_glowy = if settings.claim_free_glowy {
        trader.free_glowy
    } else {
        0
    };
    let gem_trader = trader_income(
        settings.gem_purchases,
        trader.gem,
        Ores::new(0, free_glowy, 0),
    );
    let misc = misc_income(settings.misc_monthly);
    let total = league_bonus + war + medal_trader + gem_trader + misc;

    debug!(league = %league.name, town_hall = settings.war_town_hall, ?total, "daily income computed");
    Ok(IncomeBreakdown {
        league_bonus,
        war,
        medal_trader,
        gem_trader,
        misc,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn close(a: Ores<f64>, b: Ores<f64>) -> bool {
        a.iter().zip(b.iter()).all(|((_, x), (_, y))| (x - y).abs() < EPS)
    }

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn war_income_blends_win_and_loss() {
        let loot = WarLoot {
            win: Ores::new(300, 14, 7),
            loss: Ores::new(100, 7, 0),
        };
        // 7 attacks a week is one a day; 50% win.
        let daily = war_income(&loot, 7, 50);
        assert!(close(daily, Ores::new(200.0, 10.5, 3.5)));
        assert!(close(war_income(&loot, 0, 50), Ores::splat(0.0)));
        assert!(close(war_income(&loot, 7, 0), loot.loss.as_f64()));
    }

    #[test]
    fn trader_bonus_added_before_weekly_split() {
        let rate = Ores::new(1000, 30, 15);
        let daily = trader_income(Ores::new(0, 2, 0), rate, Ores::new(0, 10, 0));
        assert!(close(daily, Ores::new(0.0, 70.0 / 7.0, 0.0)));
    }

    #[test]
    fn misc_is_spread_over_thirty_days() {
        let daily = misc_income(Ores::new(300, 60, 0));
        assert!(close(daily, Ores::new(10.0, 2.0, 0.0)));
    }

    #[test]
    fn breakdown_total_is_sum_of_sources() {
        let catalog = catalog();
        let settings = IncomeSettings {
            gem_purchases: Ores::new(3, 1, 1),
            misc_monthly: Ores::new(90, 30, 3),
            ..IncomeSettings::default()
        };
        let b = daily_income(&settings, &catalog).unwrap();
        let sum = IncomeSource::ALL
            .into_iter()
            .map(|s| b.source(s))
            .fold(Ores::splat(0.0), |acc, o| acc + o);
        assert!(close(sum, b.total));
        assert!(close(
            b.league_bonus,
            catalog.leagues()[33].daily_bonus.as_f64()
        ));
    }

    #[test]
    fn free_glowy_only_when_claimed() {
        let catalog = catalog();
        let mut settings = IncomeSettings {
            gem_purchases: Ores::splat(0),
            ..IncomeSettings::default()
        };
        let with = daily_income(&settings, &catalog).unwrap();
        settings.claim_free_glowy = false;
        let without = daily_income(&settings, &catalog).unwrap();
        let free = catalog.trader().free_glowy as f64 / 7.0;
        assert!((with.gem_trader.glowy - free).abs() < EPS);
        assert_eq!(without.gem_trader.glowy, 0.0);
        assert_eq!(with.gem_trader.shiny, 0.0);
    }

    #[test]
    fn out_of_range_lookups_are_errors() {
        let catalog = catalog();
        let bad_league = IncomeSettings {
            league_index: 500,
            ..IncomeSettings::default()
        };
        assert_eq!(
            daily_income(&bad_league, &catalog),
            Err(EconError::UnknownLeague(500))
        );
        let bad_th = IncomeSettings {
            war_town_hall: 3,
            ..IncomeSettings::default()
        };
        assert_eq!(
            daily_income(&bad_th, &catalog),
            Err(EconError::UnknownTownHall(3))
        );
        assert!(daily_income(&bad_th.clamped(&catalog), &catalog).is_ok());
    }

    #[test]
    fn monthly_rounds_each_component_independently() {
        // 1/3 + 1/3 + 1/3 per day: each rounds to 10, total to 30.
        let third = Ores::new(1.0 / 3.0, 0.0, 0.0);
        let b = IncomeBreakdown {
            league_bonus: Ores::splat(0.0),
            war: third,
            medal_trader: third,
            gem_trader: third,
            misc: Ores::splat(0.0),
            total: third + third + third,
        };
        let m = b.monthly();
        assert_eq!(m.war.shiny, 10);
        assert_eq!(m.total.shiny, 30);

        // 0.05 per day on three sources: each rounds 1.5 up to 2, so the
        // components add up to 6 while the total rounds 4.5 to 5.
        let bit = Ores::new(0.05, 0.0, 0.0);
        let b = IncomeBreakdown {
            league_bonus: Ores::splat(0.0),
            war: bit,
            medal_trader: bit,
            gem_trader: bit,
            misc: Ores::splat(0.0),
            total: bit + bit + bit,
        };
        let m = b.monthly();
        let parts: u64 = IncomeSource::ALL.into_iter().map(|s| m.source(s).shiny).sum();
        assert_eq!(m.war.shiny, 2);
        assert_eq!(parts, 6);
        assert_eq!(m.total.shiny, 5);
    }

    proptest! {
        #[test]
        fn monthly_components_track_total(league in 0usize..34,
                                          th in 8u8..=17,
                                          attacks in 0u8..=7,
                                          ratio in 0u8..=100,
                                          medal in (0u32..=2, 0u32..=2, 0u32..=2),
                                          gem in (0u32..=5, 0u32..=2, 0u32..=1),
                                          free in any::<bool>(),
                                          misc in (0u64..1000, 0u64..1000, 0u64..1000)) {
            let catalog = catalog();
            let settings = IncomeSettings {
                league_index: league,
                war_town_hall: th,
                war_attacks_per_week: attacks,
                war_win_ratio: ratio,
                medal_purchases: Ores::new(medal.0, medal.1, medal.2),
                gem_purchases: Ores::new(gem.0, gem.1, gem.2),
                claim_free_glowy: free,
                // whole days keep the misc share exact in floating point
                misc_monthly: Ores::new(misc.0 * 30, misc.1 * 30, misc.2 * 30),
            };
            let daily = daily_income(&settings, &catalog).unwrap();
            let monthly = daily.monthly();
            for kind in ore_core::OreKind::ALL {
                let parts: i64 = IncomeSource::ALL
                    .into_iter()
                    .map(|s| monthly.source(s)[kind] as i64)
                    .sum();
                prop_assert!((parts - monthly.total[kind] as i64).abs() <= 1);
                prop_assert_eq!(monthly.war[kind], (daily.war[kind] * 30.0).round() as u64);
                prop_assert!(daily.total[kind] >= 0.0);
            }
        }
    }
}

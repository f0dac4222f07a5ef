//! Upgrade cost totals and farm-time estimates.

use crate::{DAYS_PER_MONTH, DAYS_PER_WEEK, DAYS_PER_YEAR};
use chrono::{Days, NaiveDate};
use ore_core::{OreKind, Ores, UpgradePlan};
use serde::Serialize;
use std::fmt;

/// Ore needed to take one plan from its current to its target level.
///
/// Sums the step costs at indices `current..target`; steps missing from the
/// table cost nothing.
pub fn plan_cost(plan: &UpgradePlan) -> Ores<u64> {
    (plan.current_level()..plan.target_level())
        .filter_map(|level| plan.equipment.step_cost(level))
        .sum()
}

/// Combined cost of every plan.
pub fn total_cost<'a, I>(plans: I) -> Ores<u64>
where
    I: IntoIterator<Item = &'a UpgradePlan>,
{
    plans.into_iter().map(plan_cost).sum()
}

/// Cost still to be farmed once held ore is spent.
pub fn net_cost(total: Ores<u64>, held: Ores<u64>) -> Ores<u64> {
    total.saturating_sub(held)
}

/// Days needed per ore; infinite where that ore has no income.
pub fn days_to_farm(net: Ores<u64>, daily_income: Ores<f64>) -> Ores<f64> {
    net.as_f64().zip_with(daily_income, |need, rate| {
        if rate > 0.0 {
            need / rate
        } else {
            f64::INFINITY
        }
    })
}

/// Mixed-unit duration.
///
/// Uses fixed 365-day years, 30-day months and 7-day weeks. It is a display
/// convenience and does not follow the calendar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FarmTime {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
}

impl FarmTime {
    pub const ZERO: FarmTime = FarmTime {
        years: 0,
        months: 0,
        weeks: 0,
        days: 0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for FarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0d");
        }
        let parts = [
            (self.years, 'y'),
            (self.months, 'm'),
            (self.weeks, 'w'),
            (self.days, 'd'),
        ];
        let text: Vec<String> = parts
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, unit)| format!("{n}{unit}"))
            .collect();
        f.write_str(&text.join(" "))
    }
}

/// Split a day count into years, months, weeks and days.
///
/// Each unit takes the remainder left by the larger one; the final day count
/// is rounded, so it can read 7 when the remainder is close to a week.
pub fn decompose_days(days: f64) -> FarmTime {
    if !days.is_finite() || days <= 0.0 {
        return FarmTime::ZERO;
    }
    let years = (days / DAYS_PER_YEAR).floor();
    let rest = days % DAYS_PER_YEAR;
    let months = (rest / DAYS_PER_MONTH).floor();
    let rest = rest % DAYS_PER_MONTH;
    let weeks = (rest / DAYS_PER_WEEK).floor();
    let rest = (rest % DAYS_PER_WEEK).round();
    FarmTime {
        years: years as u32,
        months: months as u32,
        weeks: weeks as u32,
        days: rest as u32,
    }
}

/// Time to close the deficit, governed by the slowest ore.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FarmEstimate {
    /// Zero when nothing is owed or the governing ore has no income.
    pub time: FarmTime,
    /// Governing day count; `None` when it is unbounded.
    pub governing_days: Option<f64>,
    /// Ore with the largest day count, if any ore is still owed.
    pub bottleneck: Option<OreKind>,
}

impl FarmEstimate {
    pub fn is_unbounded(&self) -> bool {
        self.governing_days.is_none()
    }

    /// Calendar date once the governing day count (rounded up) has passed.
    pub fn projected_completion(&self, start: NaiveDate) -> Option<NaiveDate> {
        let days = self.governing_days.filter(|d| *d > 0.0)?;
        start.checked_add_days(Days::new(days.ceil() as u64))
    }
}

/// Estimate farm time for `net` at `daily_income`.
///
/// The maximum per-ore day count governs. An unbounded or zero maximum
/// yields the zero duration.
pub fn farm_estimate(net: Ores<u64>, daily_income: Ores<f64>) -> FarmEstimate {
    let per_ore = days_to_farm(net, daily_income);
    let (kind, max_days) = per_ore
        .iter()
        .fold((OreKind::Shiny, f64::NEG_INFINITY), |best, (k, d)| {
            if d > best.1 {
                (k, d)
            } else {
                best
            }
        });
    if max_days.is_infinite() {
        // an unpaid ore without income, if any, is the one to report
        let owed = OreKind::ALL
            .into_iter()
            .find(|k| per_ore[*k].is_infinite() && net[*k] > 0);
        return FarmEstimate {
            time: FarmTime::ZERO,
            governing_days: None,
            bottleneck: owed,
        };
    }
    if max_days == 0.0 {
        return FarmEstimate {
            time: FarmTime::ZERO,
            governing_days: Some(0.0),
            bottleneck: None,
        };
    }
    FarmEstimate {
        time: decompose_days(max_days),
        governing_days: Some(max_days),
        bottleneck: Some(kind),
    }
}

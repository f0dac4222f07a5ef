#![deny(warnings)]

//! Economic models for the ore planner.
//!
//! This crate provides pure calculations for:
//! - Daily ore income by source and its rounded monthly view
//! - Total and net upgrade cost across equipment plans
//! - Farm-time estimates from a net deficit and a daily income

mod cost;
mod income;

pub use cost::{
    days_to_farm, decompose_days, farm_estimate, net_cost, plan_cost, total_cost, FarmEstimate,
    FarmTime,
};
pub use income::{
    daily_income, misc_income, to_monthly, trader_income, trader_purchase_preview, war_income,
    IncomeBreakdown, IncomeSource, MonthlyBreakdown,
};

use thiserror::Error;

/// Days per week used for weekly cadences.
pub const DAYS_PER_WEEK: f64 = 7.0;
/// Fixed month length used for every daily/monthly conversion.
pub const DAYS_PER_MONTH: f64 = 30.0;
/// Fixed year length used by the farm-time decomposition.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// League index has no entry in the catalog table.
    #[error("league index {0} is out of range")]
    UnknownLeague(usize),
    /// Town hall tier has no war loot entry.
    #[error("no war loot for town hall {0}")]
    UnknownTownHall(u8),
}

//! Forward replenishment projection.
//!
//! Advances the buffer day by day from today's position: scheduled receipts
//! land, one day of ADU is consumed, the NFP is re-derived and classified, and
//! an order is suggested whenever the NFP sits at or below TOY. Suggested
//! orders are advisory and are not fed back into the running on-order.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use ddmrp_core::{DomainError, DomainResult, ensure_finite, ensure_non_negative};
use serde::{Deserialize, Serialize};

use crate::net_flow::net_flow_position;
use crate::purchase_order::ReceiptCalendar;
use crate::status::{BufferStatus, classify};
use crate::zones::BufferZoneSet;

pub const DEFAULT_HORIZON_DAYS: u32 = 14;
pub const DEFAULT_HORIZON_WEEKS: u32 = 4;
/// Longest simulated horizon, daily or weekly (in days).
pub const MAX_HORIZON_DAYS: u32 = 3_660;

/// Round `qty` up to the next multiple of `multiple`. Multiples ≤ 0 leave `qty` unchanged.
pub fn round_up_to_multiple(qty: f64, multiple: f64) -> f64 {
    if multiple <= 0.0 {
        return qty;
    }
    (qty / multiple).ceil() * multiple
}

/// Suggested order size for a launch at `nfp`.
pub fn order_quantity(nfp: f64, zones: &BufferZoneSet, moq: f64, rounding_multiple: f64) -> f64 {
    round_up_to_multiple((zones.tog - nfp).max(moq), rounding_multiple)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub start_date: NaiveDate,
    pub on_hand: f64,
    pub on_order: f64,
    pub qualified_demand: f64,
    pub adu: f64,
    pub zones: BufferZoneSet,
    pub receipts: ReceiptCalendar,
    pub moq: f64,
    pub rounding_multiple: f64,
    pub horizon_days: u32,
}

impl ProjectionInput {
    pub fn validate(&self) -> DomainResult<()> {
        ensure_finite("on_hand", self.on_hand)?;
        ensure_finite("on_order", self.on_order)?;
        ensure_finite("qualified_demand", self.qualified_demand)?;
        ensure_non_negative("adu", self.adu)?;
        ensure_non_negative("moq", self.moq)?;
        let rounding = ensure_finite("rounding_multiple", self.rounding_multiple)?;
        if rounding <= 0.0 {
            return Err(DomainError::invalid_config(format!(
                "rounding_multiple must be > 0 (got {rounding})"
            )));
        }
        if !self.zones.is_ordered() {
            return Err(DomainError::invalid_config("zone thresholds are not ordered"));
        }
        ensure_horizon(self.horizon_days)?;
        Ok(())
    }
}

fn ensure_horizon(days: u32) -> DomainResult<u32> {
    if days > MAX_HORIZON_DAYS {
        return Err(DomainError::invalid_config(format!(
            "projection horizon of {days} days exceeds {MAX_HORIZON_DAYS}"
        )));
    }
    Ok(days)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayProjection {
    pub day: u32,
    pub date: NaiveDate,
    pub demand: f64,
    pub on_hand_start: f64,
    pub incoming_supply: f64,
    pub on_hand_end: f64,
    pub on_order: f64,
    pub qualified_demand: f64,
    pub nfp: f64,
    pub status: BufferStatus,
    pub launch_order: bool,
    pub order_qty: f64,
    pub is_weekend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekProjection {
    /// 1-based week number.
    pub week: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_demand: f64,
    pub start_inventory: f64,
    pub incoming_supply: f64,
    pub end_inventory: f64,
    pub avg_nfp: f64,
    pub launch_order: bool,
    pub order_qty: f64,
    /// Most urgent daily status in the bucket.
    pub status: BufferStatus,
    pub days: Vec<DayProjection>,
}

/// Daily and weekly views over the same starting position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentProjection {
    pub daily: Vec<DayProjection>,
    pub weekly: Vec<WeekProjection>,
}

impl ReplenishmentProjection {
    pub fn build(input: &ProjectionInput, weeks: u32) -> DomainResult<Self> {
        Ok(Self {
            daily: project_daily(input)?,
            weekly: project_weekly(input, weeks)?,
        })
    }

    pub fn first_launch(&self) -> Option<&DayProjection> {
        self.daily.iter().find(|d| d.launch_order)
    }
}

/// Simulate `input.horizon_days` days.
pub fn project_daily(input: &ProjectionInput) -> DomainResult<Vec<DayProjection>> {
    input.validate()?;
    simulate(input, input.horizon_days)
}

/// Simulate `weeks * 7` days and bucket them into weeks.
pub fn project_weekly(input: &ProjectionInput, weeks: u32) -> DomainResult<Vec<WeekProjection>> {
    input.validate()?;
    let days = simulate(input, ensure_horizon(weeks.saturating_mul(7))?)?;
    Ok(days
        .chunks(7)
        .zip(1u32..)
        .filter_map(|(chunk, week)| aggregate_week(week, chunk))
        .collect())
}

fn simulate(input: &ProjectionInput, horizon: u32) -> DomainResult<Vec<DayProjection>> {
    let mut running_on_hand = input.on_hand;
    let mut running_on_order = input.on_order;
    let mut days = Vec::with_capacity(horizon as usize);

    for day in 0..horizon {
        let date = input
            .start_date
            .checked_add_days(Days::new(u64::from(day)))
            .ok_or_else(|| {
                DomainError::invalid_config(format!(
                    "projection day {day} from {} is out of range",
                    input.start_date
                ))
            })?;
        let on_hand_start = running_on_hand;

        let incoming_supply = input.receipts.on(date);
        running_on_hand += incoming_supply;
        running_on_order -= incoming_supply;

        running_on_hand -= input.adu;

        let nfp = net_flow_position(running_on_hand, running_on_order, input.qualified_demand);
        let status = classify(nfp, &input.zones);
        let launch_order = nfp <= input.zones.toy;
        let order_qty = if launch_order {
            order_quantity(nfp, &input.zones, input.moq, input.rounding_multiple)
        } else {
            0.0
        };

        days.push(DayProjection {
            day,
            date,
            demand: input.adu,
            on_hand_start,
            incoming_supply,
            on_hand_end: running_on_hand,
            on_order: running_on_order.max(0.0),
            qualified_demand: input.qualified_demand,
            nfp,
            status,
            launch_order,
            order_qty,
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        });
    }
    Ok(days)
}

fn aggregate_week(week: u32, days: &[DayProjection]) -> Option<WeekProjection> {
    let first = days.first()?;
    let last = days.last()?;
    let status = days
        .iter()
        .map(|d| d.status)
        .fold(BufferStatus::Blue, BufferStatus::worst);

    Some(WeekProjection {
        week,
        start_date: first.date,
        end_date: last.date,
        total_demand: days.iter().map(|d| d.demand).sum(),
        start_inventory: first.on_hand_start,
        incoming_supply: days.iter().map(|d| d.incoming_supply).sum(),
        end_inventory: last.on_hand_end,
        avg_nfp: days.iter().map(|d| d.nfp).sum::<f64>() / days.len() as f64,
        launch_order: days.iter().any(|d| d.launch_order),
        order_qty: days.iter().map(|d| d.order_qty).sum(),
        status,
        days: days.to_vec(),
    })
}

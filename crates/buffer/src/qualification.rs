//! Qualified demand: which customer orders count against the buffer today.
//!
//! Past-due and due-today orders always qualify. Future orders only qualify
//! when their due date falls inside the spike horizon and that day's total
//! demand reaches the spike threshold.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use ddmrp_core::{DomainError, DomainResult, ProductLocationPair, ensure_non_negative};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOrder {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub pair: ProductLocationPair,
    pub order_qty: f64,
    pub due_date: NaiveDate,
}

/// Order spike tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeParameters {
    /// Horizon length as a multiple of DLT days.
    pub horizon_factor: f64,
    /// Spike threshold as a multiple of TOR.
    pub threshold_factor: f64,
}

impl Default for SpikeParameters {
    fn default() -> Self {
        Self {
            horizon_factor: 1.0,
            threshold_factor: 0.5,
        }
    }
}

impl SpikeParameters {
    pub fn validate(&self) -> DomainResult<()> {
        ensure_non_negative("spike.horizon_factor", self.horizon_factor)?;
        ensure_non_negative("spike.threshold_factor", self.threshold_factor)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationReason {
    PastDue,
    DueToday,
    Spike,
    BelowSpikeThreshold,
    BeyondHorizon,
}

impl QualificationReason {
    pub fn qualifies(self) -> bool {
        matches!(
            self,
            QualificationReason::PastDue | QualificationReason::DueToday | QualificationReason::Spike
        )
    }
}

/// Per-order outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderQualification {
    pub order_id: String,
    pub due_date: NaiveDate,
    pub order_qty: f64,
    pub qualified_qty: f64,
    pub reason: QualificationReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualifiedDemand {
    pub total: f64,
    pub horizon_end: Option<NaiveDate>,
    pub spike_threshold: f64,
    pub lines: Vec<OrderQualification>,
}

/// Qualify `orders` for one pair as of `eval_date`.
pub fn qualify_demand(
    orders: &[CustomerOrder],
    eval_date: NaiveDate,
    dlt_days: f64,
    tor: f64,
    params: &SpikeParameters,
) -> DomainResult<QualifiedDemand> {
    params.validate()?;
    let dlt_days = ensure_non_negative("dlt", dlt_days)?;
    let tor = ensure_non_negative("tor", tor)?;
    for order in orders {
        ensure_non_negative("order_qty", order.order_qty)?;
    }

    // Saturating cast: absurd lead times fail the date check below.
    let horizon_days = (dlt_days * params.horizon_factor).ceil() as u64;
    let horizon_end = eval_date
        .checked_add_days(Days::new(horizon_days))
        .ok_or_else(|| {
            DomainError::invalid_config(format!(
                "spike horizon of {horizon_days} days from {eval_date} is out of range (dlt {dlt_days})"
            ))
        })?;
    let spike_threshold = params.threshold_factor * tor;

    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for order in orders {
        if order.due_date > eval_date && order.due_date <= horizon_end {
            *daily.entry(order.due_date).or_insert(0.0) += order.order_qty;
        }
    }

    let lines: Vec<OrderQualification> = orders
        .iter()
        .map(|order| {
            let reason = if order.due_date < eval_date {
                QualificationReason::PastDue
            } else if order.due_date == eval_date {
                QualificationReason::DueToday
            } else if order.due_date > horizon_end {
                QualificationReason::BeyondHorizon
            } else if daily.get(&order.due_date).copied().unwrap_or(0.0) >= spike_threshold {
                QualificationReason::Spike
            } else {
                QualificationReason::BelowSpikeThreshold
            };
            OrderQualification {
                order_id: order.id.clone(),
                due_date: order.due_date,
                order_qty: order.order_qty,
                qualified_qty: if reason.qualifies() { order.order_qty } else { 0.0 },
                reason,
            }
        })
        .collect();

    Ok(QualifiedDemand {
        total: lines.iter().map(|l| l.qualified_qty).sum(),
        horizon_end: Some(horizon_end),
        spike_threshold,
        lines,
    })
}

//! Open purchase orders and the receipt calendar fed into projections.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ddmrp_core::{DomainError, DomainResult, ProductLocationPair, ensure_finite};
use serde::{Deserialize, Serialize};

/// Purchase order status lifecycle. Terminal at `Received`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Open,
    InTransit,
    Received,
}

/// An open-PO row supplied by procurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPurchaseOrder {
    pub id: String,
    #[serde(flatten)]
    pub pair: ProductLocationPair,
    pub ordered_qty: f64,
    #[serde(default)]
    pub received_qty: Option<f64>,
    pub order_date: NaiveDate,
    #[serde(default)]
    pub expected_date: Option<NaiveDate>,
    pub status: PurchaseOrderStatus,
}

impl OpenPurchaseOrder {
    pub fn new(
        id: impl Into<String>,
        pair: ProductLocationPair,
        ordered_qty: f64,
        order_date: NaiveDate,
        expected_date: Option<NaiveDate>,
    ) -> DomainResult<Self> {
        let ordered_qty = ensure_finite("ordered_qty", ordered_qty)?;
        if ordered_qty <= 0.0 {
            return Err(DomainError::validation("ordered quantity must be positive"));
        }
        Ok(Self {
            id: id.into(),
            pair,
            ordered_qty,
            received_qty: None,
            order_date,
            expected_date,
            status: PurchaseOrderStatus::Open,
        })
    }

    /// Quantity still expected from the supplier.
    pub fn outstanding_qty(&self) -> f64 {
        if self.status == PurchaseOrderStatus::Received {
            return 0.0;
        }
        (self.ordered_qty - self.received_qty.unwrap_or(0.0)).max(0.0)
    }

    pub fn is_open(&self) -> bool {
        self.status != PurchaseOrderStatus::Received
    }

    /// OPEN -> IN_TRANSIT.
    pub fn dispatch(&mut self) -> DomainResult<()> {
        if self.status != PurchaseOrderStatus::Open {
            return Err(DomainError::invariant(
                "only open purchase orders can be dispatched",
            ));
        }
        self.status = PurchaseOrderStatus::InTransit;
        Ok(())
    }

    /// Record a (partial) receipt; moves to RECEIVED once nothing is outstanding.
    pub fn receive(&mut self, qty: f64) -> DomainResult<()> {
        if self.status == PurchaseOrderStatus::Received {
            return Err(DomainError::invariant(
                "cannot receive goods on a received purchase order",
            ));
        }
        let qty = ensure_finite("received qty", qty)?;
        if qty <= 0.0 {
            return Err(DomainError::validation("received quantity must be positive"));
        }

        let received = self.received_qty.unwrap_or(0.0) + qty;
        self.received_qty = Some(received);
        if received >= self.ordered_qty {
            self.status = PurchaseOrderStatus::Received;
        }
        Ok(())
    }

    /// Row-level sanity for externally supplied orders.
    pub fn validate(&self) -> DomainResult<()> {
        let ordered = ensure_finite("ordered_qty", self.ordered_qty)?;
        if ordered < 0.0 {
            return Err(DomainError::validation(format!(
                "purchase order {} has negative ordered quantity",
                self.id
            )));
        }
        if let Some(received) = self.received_qty {
            if !received.is_finite() || received < 0.0 {
                return Err(DomainError::validation(format!(
                    "purchase order {} has invalid received quantity",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// Total outstanding quantity across non-received orders.
pub fn on_order<'a>(orders: impl IntoIterator<Item = &'a OpenPurchaseOrder>) -> f64 {
    orders
        .into_iter()
        .filter(|po| po.is_open())
        .map(OpenPurchaseOrder::outstanding_qty)
        .sum()
}

/// Outstanding receipts grouped by expected delivery date.
///
/// Orders without an expected date stay in on-order but are never scheduled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptCalendar {
    receipts: BTreeMap<NaiveDate, f64>,
}

impl ReceiptCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a OpenPurchaseOrder>) -> Self {
        let mut calendar = Self::new();
        for po in orders {
            if let Some(date) = po.expected_date {
                let qty = po.outstanding_qty();
                if qty > 0.0 {
                    calendar.add(date, qty);
                }
            }
        }
        calendar
    }

    pub fn add(&mut self, date: NaiveDate, qty: f64) {
        *self.receipts.entry(date).or_insert(0.0) += qty;
    }

    /// Scheduled quantity for `date` (0 when nothing is due).
    pub fn on(&self, date: NaiveDate) -> f64 {
        self.receipts.get(&date).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.receipts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &f64)> {
        self.receipts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }
}

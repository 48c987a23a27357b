//! Command structs for engine operations.
//!
//! These types group the parameters of the create/update operations,
//! keeping call sites readable and avoiding long argument lists.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{BillPayment, GroupedPresence, RidePayment};

/// Create a bill split among `person_count` people.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewBillCmd {
    pub description: String,
    pub total_minor: i64,
    pub person_count: u32,
    /// Optional per-slot overrides; slot `i` uses `payments[i]`.
    #[serde(default)]
    pub payments: Vec<BillPayment>,
}

impl NewBillCmd {
    #[must_use]
    pub fn new(description: impl Into<String>, total_minor: i64, person_count: u32) -> Self {
        Self {
            description: description.into(),
            total_minor,
            person_count,
            payments: Vec::new(),
        }
    }

    #[must_use]
    pub fn payment(mut self, payment: BillPayment) -> Self {
        self.payments.push(payment);
        self
    }
}

/// Replace the root fields and the payment list of a stored bill.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateBillCmd {
    pub bill_id: i64,
    pub description: String,
    pub total_minor: i64,
    pub person_count: u32,
    #[serde(default)]
    pub payments: Vec<BillPayment>,
}

impl UpdateBillCmd {
    #[must_use]
    pub fn new(
        bill_id: i64,
        description: impl Into<String>,
        total_minor: i64,
        person_count: u32,
    ) -> Self {
        Self {
            bill_id,
            description: description.into(),
            total_minor,
            person_count,
            payments: Vec::new(),
        }
    }

    /// Start from a bill as it was read, keeping its payments.
    #[must_use]
    pub fn from_bill(bill: &crate::Bill) -> Self {
        Self {
            bill_id: bill.id,
            description: bill.description.clone(),
            total_minor: bill.total_minor,
            person_count: bill.person_count,
            payments: bill.payments.clone(),
        }
    }

    #[must_use]
    pub fn payments(mut self, payments: Vec<BillPayment>) -> Self {
        self.payments = payments;
        self
    }
}

/// Create a ride and its (empty) attendance calendar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewRideCmd {
    pub description: String,
    pub unit_cost_minor: i64,
    pub occurrence_count: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub include_weekends: bool,
    #[serde(default)]
    pub participants: Vec<String>,
}

impl NewRideCmd {
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        unit_cost_minor: i64,
        occurrence_count: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            unit_cost_minor,
            occurrence_count,
            start_date,
            end_date,
            include_weekends: false,
            participants: Vec::new(),
        }
    }

    #[must_use]
    pub fn include_weekends(mut self, include_weekends: bool) -> Self {
        self.include_weekends = include_weekends;
        self
    }

    #[must_use]
    pub fn participant(mut self, label: impl Into<String>) -> Self {
        self.participants.push(label.into());
        self
    }
}

/// Replace the root fields, participants and attendance of a stored ride.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateRideCmd {
    pub ride_id: i64,
    pub description: String,
    pub unit_cost_minor: i64,
    pub occurrence_count: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub include_weekends: bool,
    #[serde(default)]
    pub payments: Vec<RidePayment>,
    #[serde(default)]
    pub presence_groups: Vec<GroupedPresence>,
}

impl UpdateRideCmd {
    /// Start from a ride as it was read, keeping participants and attendance.
    #[must_use]
    pub fn from_ride(ride: &crate::Ride) -> Self {
        Self {
            ride_id: ride.id,
            description: ride.description.clone(),
            unit_cost_minor: ride.unit_cost_minor,
            occurrence_count: ride.occurrence_count,
            start_date: ride.start_date,
            end_date: ride.end_date,
            include_weekends: ride.include_weekends,
            payments: ride.payments.clone(),
            presence_groups: ride.presence_groups.clone(),
        }
    }

    /// Set the attendance of one participant on one date, replacing any
    /// value already present for that pair.
    #[must_use]
    pub fn attendance(mut self, ride_payment_id: i64, date: NaiveDate, attendance: u32) -> Self {
        let presence = crate::Presence::new(ride_payment_id, date, attendance);
        match self.presence_groups.iter_mut().find(|g| g.date == date) {
            Some(group) => {
                group.presences.retain(|p| p.ride_payment_id != ride_payment_id);
                group.presences.push(presence);
            }
            None => self.presence_groups.push(GroupedPresence {
                date,
                presences: vec![presence],
            }),
        }
        self
    }
}

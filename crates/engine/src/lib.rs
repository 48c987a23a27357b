//! Cost splitting and reconciliation engine.
//!
//! Two aggregates are handled:
//!
//! - [`Bill`]: a fixed amount divided among a fixed number of people, some of
//!   whom may have a custom value.
//! - [`Ride`]: a per-occurrence cost spread over a calendar of dates and
//!   shared each day in proportion to attendance.
//!
//! Updates diff the caller's child records against the stored ones
//! ([`reconcile`]) so unchanged records keep their identity, then recompute
//! every derived amount so the shares always add back up to the total.
//! Amounts are integer cents throughout.

pub use bill_payments::BillPayment;
pub use bills::Bill;
pub use calendar::{Calendar, ChronoCalendar, active_dates};
pub use commands::{NewBillCmd, NewRideCmd, UpdateBillCmd, UpdateRideCmd};
pub use error::{EngineError, ErrorKind};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder};
pub use presences::{GroupedPresence, Presence, group_presences};
pub use reconcile::{Identified, Reconciliation, UnknownIdPolicy};
pub use ride_payments::RidePayment;
pub use rides::Ride;

pub mod allocation;
pub mod calendar;
pub mod distribution;
pub mod reconcile;
pub mod split;

mod bill_payments;
mod bills;
mod commands;
mod error;
mod money;
mod ops;
mod presences;
mod ride_payments;
mod rides;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

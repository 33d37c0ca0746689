// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! appliance-sync: C9, central sync. Periodic checkin, sequential order
//! dispatch with per-order completion, and the two-phase `rebuild-os`
//! marker handshake. Order *content* handling (what `sync-rules` or
//! `healing-run` actually does) is injected via [`orders::OrderHandlers`];
//! this crate owns only the wire protocol and the dispatch/verification
//! skeleton around it.

pub mod checkin;
pub mod error;
pub mod orders;
pub mod rebuild;

pub use checkin::{lift_target, CheckinClient};
pub use error::SyncError;
pub use orders::{OrderHandlers, OrderProcessor};
pub use rebuild::RebuildCoordinator;

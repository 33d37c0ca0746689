// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! appliance-storage: C10, crash-recoverable runtime state persistence.
//! Everything here is a plain file on disk — a small JSON snapshot, an
//! Ed25519 private key, and the two-phase rebuild markers — written with
//! owner-only permissions and atomic rename where the write needs to never
//! be observed half-done.

pub mod markers;
pub mod signing_key;
pub mod state;

pub use markers::{MarkerError, PendingRebuildOrder, RebuildMarkers, VerifiedMarker};
pub use signing_key::{SigningKey, SigningKeyError};
pub use state::{DaemonState, StateError, StatePersistor};

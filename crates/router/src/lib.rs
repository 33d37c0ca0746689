// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! appliance-router: C8, the healing router. Owns the (host, check)
//! cooldown/flap table and orchestrates L1 (`appliance-rules`) -> L2
//! (`appliance-planner`) -> L3 (structured-log escalation), fanning
//! telemetry, dashboard writes, and the firewall/GPO root-cause fix out to
//! background tasks it never awaits.

pub mod cooldown;
pub mod router;
pub mod sink;

pub use cooldown::{CooldownDecision, CooldownPolicy, HealingCooldownTable};
pub use router::{Disposition, HealingRouter, RouterConfig};
pub use sink::{HealingSideEffects, NullSideEffects};

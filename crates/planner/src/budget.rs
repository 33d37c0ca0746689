// SPDX-License-Identifier: MIT

//! The three budget gates the planner client checks before every call:
//! daily spend, calls in the last hour, and in-flight concurrency. All
//! three must pass or the call fails fast without ever reaching the
//! network — the router treats that failure as "planner unavailable" and
//! proceeds straight to L3.

use crate::error::PlannerError;
use appliance_core::Clock;
use parking_lot::Mutex;

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_DAY: u64 = 86_400_000;

#[derive(Debug, Clone, Copy)]
pub struct BudgetLimits {
    pub daily_spend_cap_usd: f64,
    pub calls_per_hour_cap: u32,
    pub concurrent_calls_cap: u32,
}

struct BudgetState {
    day_bucket: u64,
    daily_spend_usd: f64,
    hour_bucket: u64,
    calls_this_hour: u32,
    in_flight: u32,
}

pub struct BudgetGate<C: Clock> {
    limits: BudgetLimits,
    clock: C,
    state: Mutex<BudgetState>,
}

impl<C: Clock> BudgetGate<C> {
    pub fn new(limits: BudgetLimits, clock: C) -> Self {
        Self {
            limits,
            clock,
            state: Mutex::new(BudgetState { day_bucket: 0, daily_spend_usd: 0.0, hour_bucket: 0, calls_this_hour: 0, in_flight: 0 }),
        }
    }

    /// Checks all three gates and, if they pass, reserves one in-flight
    /// slot and one hourly call slot for the duration of the returned
    /// permit.
    pub fn acquire(&self) -> Result<BudgetPermit<'_, C>, PlannerError> {
        let now = self.clock.epoch_ms();
        let mut state = self.state.lock();

        let day_bucket = now / MS_PER_DAY;
        if day_bucket != state.day_bucket {
            state.day_bucket = day_bucket;
            state.daily_spend_usd = 0.0;
        }
        let hour_bucket = now / MS_PER_HOUR;
        if hour_bucket != state.hour_bucket {
            state.hour_bucket = hour_bucket;
            state.calls_this_hour = 0;
        }

        if state.daily_spend_usd >= self.limits.daily_spend_cap_usd {
            return Err(PlannerError::DailyBudgetExhausted);
        }
        if state.calls_this_hour >= self.limits.calls_per_hour_cap {
            return Err(PlannerError::HourlyCapReached);
        }
        if state.in_flight >= self.limits.concurrent_calls_cap {
            return Err(PlannerError::ConcurrencyCapReached);
        }

        state.calls_this_hour += 1;
        state.in_flight += 1;
        Ok(BudgetPermit { gate: self })
    }

    fn record_spend(&self, usd: f64) {
        self.state.lock().daily_spend_usd += usd;
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

/// Held for the lifetime of one planner call. Releases its in-flight slot
/// on drop regardless of how the call ended.
pub struct BudgetPermit<'a, C: Clock> {
    gate: &'a BudgetGate<C>,
}

impl<C: Clock> BudgetPermit<'_, C> {
    pub fn record_spend(&self, usd: f64) {
        self.gate.record_spend(usd);
    }
}

impl<C: Clock> Drop for BudgetPermit<'_, C> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod tests;

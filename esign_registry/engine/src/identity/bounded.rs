//! Bounded calls into identity components.
//!
//! Identity logic is external and possibly hostile. Every call runs on the blocking
//! pool with a fuel [`Meter`] and a wall-clock timeout; errors, fuel exhaustion,
//! panics and timeouts all collapse into a negative result for the caller. No
//! registry lock is ever held while a call is in flight.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::IdentityError;
use crate::identity::{EthIdentity, Meter};
use crate::types::{Address, SignatoryName};

/// Resources granted to a single identity call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallBudget {
    pub timeout: Duration,
    pub fuel: u64,
}

impl Default for CallBudget {
    fn default() -> Self {
        CallBudget {
            timeout: Duration::from_millis(250),
            fuel: 1_000,
        }
    }
}

/// How a bounded identity call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    Completed(T),
    Failed(IdentityError),
    TimedOut,
    Panicked,
}

impl CallOutcome<bool> {
    /// Only an explicit `true` inside the budget counts as verified.
    pub fn verified(&self) -> bool {
        matches!(self, CallOutcome::Completed(true))
    }
}

async fn run_bounded<T, F>(identity: Arc<dyn EthIdentity>, budget: CallBudget, call: F) -> CallOutcome<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn EthIdentity, &mut Meter) -> Result<T, IdentityError> + Send + 'static,
{
    let fuel = budget.fuel;
    let task = tokio::task::spawn_blocking(move || {
        let mut meter = Meter::new(fuel);
        call(identity.as_ref(), &mut meter)
    });

    // A timed-out task keeps its blocking thread until it returns, but the registry
    // stops waiting on it here.
    match tokio::time::timeout(budget.timeout, task).await {
        Ok(Ok(Ok(value))) => CallOutcome::Completed(value),
        Ok(Ok(Err(e))) => CallOutcome::Failed(e),
        Ok(Err(join_err)) if join_err.is_panic() => CallOutcome::Panicked,
        Ok(Err(join_err)) => CallOutcome::Failed(IdentityError::Unavailable(join_err.to_string())),
        Err(_) => CallOutcome::TimedOut,
    }
}

/// Asks `identity` whether `caller` controls it, within `budget`.
pub async fn verify_owner(
    identity: &Arc<dyn EthIdentity>,
    caller: &Address,
    budget: CallBudget,
) -> CallOutcome<bool> {
    let candidate = *caller;
    let outcome = run_bounded(Arc::clone(identity), budget, move |id, meter| {
        id.check_owner(&candidate, meter)
    })
    .await;

    if !outcome.verified() {
        warn!(
            caller = %caller,
            outcome = ?outcome,
            "ownership check rejected"
        );
    }
    outcome
}

/// Reads the display name of `identity`; any failure yields [`SignatoryName::Unavailable`].
pub async fn fetch_name(identity: &Arc<dyn EthIdentity>, budget: CallBudget) -> SignatoryName {
    match run_bounded(Arc::clone(identity), budget, |id, meter| id.get_identity_name(meter)).await {
        CallOutcome::Completed(name) => SignatoryName::Named(name.to_display_string()),
        other => {
            warn!(outcome = ?other, "identity name unavailable");
            SignatoryName::Unavailable
        }
    }
}

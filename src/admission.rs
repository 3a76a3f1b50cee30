//! Admission control.
//!
//! A counting gate bounding the number of concurrently in-flight item
//! pipelines. Waiters are woken in FIFO arrival order, and a released permit
//! is handed directly to the oldest waiter rather than returned to the pool,
//! so later arrivals cannot barge past earlier ones.

use crate::error::PipelineError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::oneshot;
use tracing::error;

struct GateState {
    available: usize,
    held: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// Bounded-concurrency gate. Invariant: `held <= max_concurrent` and
/// `held + available == max_concurrent` whenever no handoff is in flight.
pub struct AdmissionController {
    max_concurrent: usize,
    state: Mutex<GateState>,
}

impl AdmissionController {
    /// `max_concurrent` must be at least one; a zero-permit gate would
    /// deadlock every caller.
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            max_concurrent,
            state: Mutex::new(GateState {
                available: max_concurrent,
                held: 0,
                waiters: VecDeque::new(),
            }),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of currently-held permits.
    pub fn in_flight(&self) -> usize {
        self.state.lock().held
    }

    /// Suspend until a permit is free, then take it.
    ///
    /// The returned guard releases the permit on drop.
    pub async fn acquire(&self) -> AdmissionPermit<'_> {
        let waiter = {
            let mut state = self.state.lock();
            if state.available > 0 {
                state.available -= 1;
                state.held += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            }
        };

        if let Some(rx) = waiter {
            // The releaser transfers its permit through the channel; held
            // count was already moved to this waiter at send time.
            let _ = rx.await;
        }

        AdmissionPermit { gate: self }
    }

    /// Return a permit to the gate, waking the oldest waiter if any.
    ///
    /// Calling this without a matching outstanding `acquire` is a
    /// programming error and is reported as `PermitImbalance`.
    pub fn release(&self) -> Result<(), PipelineError> {
        let mut state = self.state.lock();
        if state.held == 0 {
            return Err(PipelineError::PermitImbalance);
        }

        // Hand the permit to the first live waiter; held count is unchanged
        // because ownership transfers directly.
        while let Some(tx) = state.waiters.pop_front() {
            if tx.send(()).is_ok() {
                return Ok(());
            }
        }

        state.held -= 1;
        state.available += 1;
        Ok(())
    }
}

/// RAII permit returned by [`AdmissionController::acquire`].
pub struct AdmissionPermit<'a> {
    gate: &'a AdmissionController,
}

impl Drop for AdmissionPermit<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.gate.release() {
            // Unreachable through the guard API, but never ignored.
            error!(error = %err, "admission permit release failed");
        }
    }
}

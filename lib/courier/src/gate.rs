//! The client's pause gate.
//!
//! Locking the gate parks new requests before they enter the pipeline;
//! requests already past the gate are unaffected. Unlocking releases the
//! parked waiters in arrival order.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::oneshot;

#[derive(Debug, Default)]
struct GateState {
    locked: bool,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// A FIFO admission gate.
#[derive(Debug, Default)]
pub(crate) struct Gate {
    inner: Mutex<GateState>,
}

impl Gate {
    /// Locks the gate; subsequent requests wait in [`Gate::admitted`].
    pub(crate) fn lock(&self) {
        self.state().locked = true;
    }

    /// Unlocks the gate, releasing parked waiters in arrival order.
    pub(crate) fn unlock(&self) {
        let waiters = {
            let mut state = self.state();
            state.locked = false;
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            // A dropped receiver means the request was abandoned while parked.
            let _ = waiter.send(());
        }
    }

    /// Whether the gate is currently locked.
    pub(crate) fn is_locked(&self) -> bool {
        self.state().locked
    }

    /// Resolves once the gate admits this request.
    pub(crate) async fn admitted(&self) {
        loop {
            let receiver = {
                let mut state = self.state();
                if !state.locked {
                    return;
                }
                let (sender, receiver) = oneshot::channel();
                state.waiters.push_back(sender);
                receiver
            };
            // A dropped sender (not a send) means we should re-check the gate.
            let _ = receiver.await;
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, GateState> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn starts_unlocked() {
        let gate = Gate::default();
        assert!(!gate.is_locked());
        gate.lock();
        assert!(gate.is_locked());
        gate.unlock();
        assert!(!gate.is_locked());
    }

    #[tokio::test]
    async fn admits_immediately_when_unlocked() {
        let gate = Gate::default();
        gate.admitted().await;
    }

    #[tokio::test]
    async fn releases_waiters_in_arrival_order() {
        let gate = Arc::new(Gate::default());
        gate.lock();

        let order = Arc::new(Mutex::new(Vec::new()));
        let parked = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for i in 0..3 {
            let gate = Arc::clone(&gate);
            let order = Arc::clone(&order);
            let task_parked = Arc::clone(&parked);
            handles.push(tokio::spawn(async move {
                task_parked.fetch_add(1, Ordering::SeqCst);
                gate.admitted().await;
                order
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .push(i);
            }));
            // Park tasks one at a time so arrival order is deterministic.
            while parked.load(Ordering::SeqCst) <= i {
                tokio::task::yield_now().await;
            }
            tokio::task::yield_now().await;
        }

        gate.unlock();
        for handle in handles {
            handle.await.expect("waiter completes");
        }

        let order = order
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        assert_eq!(order, vec![0, 1, 2]);
    }
}

//! One-shot readiness gate for deferred business calls.
//!
//! Calls made before the login handshake completes queue up in arrival order
//! and are released, in that order, exactly once when the gate opens. A caller
//! that stops waiting leaves the queue.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

#[derive(Debug)]
enum GateState {
    Pending {
        next_ticket: u64,
        queue: VecDeque<(u64, oneshot::Sender<()>)>,
    },
    Open,
}

#[derive(Debug)]
pub(crate) struct ReadinessGate {
    state: Mutex<GateState>,
}

impl ReadinessGate {
    /// A gate that queues callers until [`open`](Self::open).
    pub(crate) fn pending() -> Self {
        Self {
            state: Mutex::new(GateState::Pending {
                next_ticket: 0,
                queue: VecDeque::new(),
            }),
        }
    }

    /// A gate that never queues.
    pub(crate) fn opened() -> Self {
        Self {
            state: Mutex::new(GateState::Open),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            GateState::Open
        )
    }

    /// Number of callers currently queued.
    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            GateState::Pending { queue, .. } => queue.len(),
            GateState::Open => 0,
        }
    }

    /// Returns immediately once open; otherwise waits for its turn in the queue.
    pub(crate) async fn wait(&self) {
        let (ticket, turn) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                GateState::Open => return,
                GateState::Pending { next_ticket, queue } => {
                    let ticket = *next_ticket;
                    *next_ticket = next_ticket.wrapping_add(1);
                    let (tx, rx) = oneshot::channel();
                    queue.push_back((ticket, tx));
                    (ticket, rx)
                }
            }
        };
        let _place = Place { gate: self, ticket };
        // The sender lives in the gate; it is only dropped if the gate is.
        let _ = turn.await;
    }

    fn leave(&self, ticket: u64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let GateState::Pending { queue, .. } = &mut *state {
            queue.retain(|(queued, _)| *queued != ticket);
        }
    }

    /// Opens the gate and releases queued callers front to back.
    /// Returns how many were released; later calls release nobody.
    pub(crate) fn open(&self) -> usize {
        let previous = std::mem::replace(
            &mut *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            GateState::Open,
        );
        match previous {
            GateState::Pending { queue, .. } => {
                let released = queue.len();
                for (_, waiter) in queue {
                    let _ = waiter.send(());
                }
                released
            }
            GateState::Open => 0,
        }
    }
}

/// A waiter's slot in the queue, given up when its future is dropped.
struct Place<'a> {
    gate: &'a ReadinessGate,
    ticket: u64,
}

impl Drop for Place<'_> {
    fn drop(&mut self) {
        self.gate.leave(self.ticket);
    }
}

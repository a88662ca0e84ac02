// Lifecycle notifications and observer registration.
//
// The orchestrator and session report what happened as `SessionEvent`s:
// run started/finished, reset, error (with message and cell), success, level
// completed, cells cleared. Each is stamped with the tick it happened on.
// `LevelSession::step()` returns them in a `StepResult`, and also pushes them
// to every registered `Observer` (the terminal display, audio cues, a test
// log).
//
// Observers are registered through `ObserverRegistry::subscribe`, which
// returns a `Subscription` guard. Dropping the guard unregisters the
// observer, so a component that holds its subscription for its own lifetime
// is unsubscribed automatically on teardown. There is no global event bus:
// each session owns its registry.
//
// Observers are called in subscription order. Dispatch works on a copy of
// the observer list, so an observer may subscribe or unsubscribe others
// while being notified.
//
// **Critical constraint: determinism.** Notifications are derived purely from
// session state and commands, so every participant emits the identical
// sequence at identical ticks.

use crate::types::CellIndex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use tracing::warn;

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A notification stamped with the session tick it fired on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub tick: u64,
    pub kind: Notification,
}

/// Lifecycle notifications for UI, audio and scene collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// A run was accepted and the program started.
    RunStarted,
    /// The program ran to completion (or stopped on success).
    RunFinished,
    /// An active run was aborted and the robot returned to its baseline.
    Reset,
    /// A compile, objective or runtime error. `cell` is the cell to
    /// highlight, when one is known.
    Error {
        message: String,
        cell: Option<CellIndex>,
    },
    /// The objective reported success.
    Success,
    /// The level was completed by the run that just finished.
    LevelCompleted,
    /// Every cell was emptied by the Clear action.
    CellsCleared,
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

pub trait Observer {
    fn notify(&mut self, event: &SessionEvent);
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: BTreeMap<u64, Rc<RefCell<dyn Observer>>>,
}

/// The set of observers attached to one session. Cloning shares the set.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    inner: Rc<RefCell<Registry>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer` until the returned guard is dropped.
    pub fn subscribe<O: Observer + 'static>(&self, observer: Rc<RefCell<O>>) -> Subscription {
        let observer: Rc<RefCell<dyn Observer>> = observer;
        let mut registry = self.inner.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.insert(id, observer);
        Subscription {
            id,
            registry: Rc::downgrade(&self.inner),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dispatch(&self, event: &SessionEvent) {
        let observers: Vec<_> = self.inner.borrow().observers.values().cloned().collect();
        for observer in observers {
            match observer.try_borrow_mut() {
                Ok(mut observer) => observer.notify(event),
                // Re-entrant dispatch into an observer that is already
                // handling an event.
                Err(_) => warn!(kind = ?event.kind, "observer busy, notification dropped"),
            }
        }
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

/// Keeps an observer registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the observer immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    /// Unsubscribe now rather than at end of scope.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(shared) = self.registry.upgrade() else {
            return;
        };
        if let Ok(mut registry) = shared.try_borrow_mut() {
            registry.observers.remove(&self.id);
        }
    }
}

/// Records every notification it receives.
#[derive(Clone, Debug, Default)]
pub struct NotificationLog {
    pub events: Vec<SessionEvent>,
}

impl NotificationLog {
    pub fn kinds(&self) -> Vec<Notification> {
        self.events.iter().map(|e| e.kind.clone()).collect()
    }
}

impl Observer for NotificationLog {
    fn notify(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}

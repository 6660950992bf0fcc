//! Process-local idempotency cache
//!
//! Collapses duplicate submissions of the same logical action:
//! - while an execution is in flight, duplicates wait on its outcome;
//! - a successful outcome is replayed for the dedup window;
//! - a pull request opened for a key is remembered so a later merge of the
//!   same key does not open a second one;
//! - the create step is single-flight per key, whatever the action kind.

use crate::action::{ActionKind, ActionOutcome, IdempotencyKey};
use crate::types::PullRequest;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::time::Instant;
use tracing::debug;

/// Cache slot: the same fields submitted as a different kind are distinct
pub(crate) type SlotKey = (ActionKind, IdempotencyKey);

type OutcomeReceiver = watch::Receiver<Option<ActionOutcome>>;
type OutcomeSender = watch::Sender<Option<ActionOutcome>>;

/// Held while a pull request is being opened for a key
pub(crate) type CreateLock = Arc<AsyncMutex<()>>;

enum Entry {
    InFlight(OutcomeReceiver),
    Completed { outcome: ActionOutcome, at: Instant },
}

#[derive(Default)]
struct State {
    slots: HashMap<SlotKey, Entry>,
    created: HashMap<IdempotencyKey, (PullRequest, Instant)>,
    creating: HashMap<IdempotencyKey, CreateLock>,
}

/// Result of trying to claim a slot
pub(crate) enum Claim {
    /// A recent success exists; return it as-is
    Replay(ActionOutcome),
    /// Another caller is executing; wait for its outcome
    Wait(OutcomeReceiver),
    /// The caller owns the slot and must execute
    Lead(OutcomeSender),
}

/// Bounded, concurrency-safe idempotency cache
pub struct IdempotencyCache {
    state: Mutex<State>,
    window: Duration,
    capacity: usize,
}

impl IdempotencyCache {
    /// Create a cache keeping successes for `window`, holding at most
    /// `capacity` slots (in-flight slots are never evicted)
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            window,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(at) < self.window
    }

    /// Claim `slot`, or learn how to obtain its outcome
    pub(crate) fn claim(&self, slot: &SlotKey) -> Claim {
        let now = Instant::now();
        let mut state = self.lock();

        match state.slots.get(slot) {
            Some(Entry::Completed { outcome, at }) if self.is_fresh(*at, now) => {
                return Claim::Replay(outcome.clone());
            }
            Some(Entry::InFlight(rx)) => return Claim::Wait(rx.clone()),
            _ => {}
        }

        let (tx, rx) = watch::channel(None);
        state.slots.insert(slot.clone(), Entry::InFlight(rx));
        self.evict(&mut state, now);
        Claim::Lead(tx)
    }

    /// Publish the outcome of a led execution.
    ///
    /// Successes stay replayable; anything else frees the slot so the next
    /// submission executes again.
    fn complete(&self, slot: &SlotKey, tx: &OutcomeSender, outcome: &ActionOutcome) {
        {
            let mut state = self.lock();
            if outcome.is_success() {
                state.slots.insert(
                    slot.clone(),
                    Entry::Completed {
                        outcome: outcome.clone(),
                        at: Instant::now(),
                    },
                );
            } else {
                state.slots.remove(slot);
            }
        }
        tx.send_replace(Some(outcome.clone()));
    }

    /// Drop an in-flight slot whose leader went away without an outcome
    fn abandon(&self, slot: &SlotKey) {
        let mut state = self.lock();
        if matches!(state.slots.get(slot), Some(Entry::InFlight(_))) {
            state.slots.remove(slot);
            debug!(key = slot.1.short(), "released abandoned slot");
        }
    }

    /// Pull request previously opened for `key`, if still remembered
    pub(crate) fn created_pull_request(&self, key: &IdempotencyKey) -> Option<PullRequest> {
        let now = Instant::now();
        let state = self.lock();
        state
            .created
            .get(key)
            .filter(|(_, at)| self.is_fresh(*at, now))
            .map(|(pr, _)| pr.clone())
    }

    /// Remember the pull request opened for `key`
    pub(crate) fn remember_created(&self, key: &IdempotencyKey, pr: &PullRequest) {
        let now = Instant::now();
        let mut state = self.lock();
        state.created.insert(key.clone(), (pr.clone(), now));
        self.evict(&mut state, now);
    }

    /// Lock serializing the create step for `key`.
    ///
    /// Hand it back through [`IdempotencyCache::release_create_lock`].
    pub(crate) fn create_lock(&self, key: &IdempotencyKey) -> CreateLock {
        Arc::clone(self.lock().creating.entry(key.clone()).or_default())
    }

    /// Return a lock from [`IdempotencyCache::create_lock`], dropping the
    /// entry once no one else holds it
    pub(crate) fn release_create_lock(&self, key: &IdempotencyKey, lock: CreateLock) {
        let mut state = self.lock();
        drop(lock);
        // Clones are only taken under the state mutex, so a count of one is final
        if state
            .creating
            .get(key)
            .is_some_and(|held| Arc::strong_count(held) == 1)
        {
            state.creating.remove(key);
        }
    }

    /// Forget the pull request for `key` (it has been merged)
    pub(crate) fn forget_created(&self, key: &IdempotencyKey) {
        self.lock().created.remove(key);
    }

    /// Number of slots currently held (in flight or completed)
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    /// Whether no slots are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(&self, state: &mut State, now: Instant) {
        let window = self.window;
        state
            .created
            .retain(|_, (_, at)| now.saturating_duration_since(*at) < window);

        if state.slots.len() <= self.capacity {
            return;
        }

        state.slots.retain(|_, entry| match entry {
            Entry::InFlight(_) => true,
            Entry::Completed { at, .. } => now.saturating_duration_since(*at) < window,
        });

        while state.slots.len() > self.capacity {
            let oldest = state
                .slots
                .iter()
                .filter_map(|(key, entry)| match entry {
                    Entry::Completed { at, .. } => Some((key.clone(), *at)),
                    Entry::InFlight(_) => None,
                })
                .min_by_key(|(_, at)| *at)
                .map(|(key, _)| key);
            let Some(oldest) = oldest else { break };
            state.slots.remove(&oldest);
        }

        while state.created.len() > self.capacity {
            let oldest = state
                .created
                .iter()
                .min_by_key(|(_, (_, at))| *at)
                .map(|(key, _)| key.clone());
            let Some(oldest) = oldest else { break };
            state.created.remove(&oldest);
        }
    }
}

/// Ownership of a claimed slot.
///
/// Dropping the guard without calling [`SlotGuard::complete`] releases the
/// slot and wakes waiters with a closed channel.
pub(crate) struct SlotGuard {
    cache: Arc<IdempotencyCache>,
    slot: SlotKey,
    tx: Option<OutcomeSender>,
}

impl SlotGuard {
    pub(crate) fn new(cache: Arc<IdempotencyCache>, slot: SlotKey, tx: OutcomeSender) -> Self {
        Self {
            cache,
            slot,
            tx: Some(tx),
        }
    }

    pub(crate) fn complete(mut self, outcome: &ActionOutcome) {
        if let Some(tx) = self.tx.take() {
            self.cache.complete(&self.slot, &tx, outcome);
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if self.tx.is_some() {
            self.cache.abandon(&self.slot);
        }
    }
}

/// Wait for the leader of a slot to publish its outcome
pub(crate) async fn wait_for_outcome(mut rx: OutcomeReceiver) -> Option<ActionOutcome> {
    rx.wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|outcome| outcome.clone())
}

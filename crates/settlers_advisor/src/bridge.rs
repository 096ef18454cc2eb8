use crate::reasoner::{ActionReasoner, AdvisorQuery};
use settlers_core::advisor::Advisor;
use settlers_core::brain::FeatureVector;
use settlers_core::config::AdvisorConfig;
use settlers_data::{Action, Agent, AgentId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cached {
    action: Action,
    tick: u64,
}

#[derive(Debug, Default)]
struct Shared {
    cache: Mutex<HashMap<AgentId, Cached>>,
    pending: Mutex<HashSet<AgentId>>,
    answered: AtomicU64,
    declined: AtomicU64,
    timeouts: AtomicU64,
}

/// Counters for how the background reasoner has been doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvisorStats {
    pub answered: u64,
    pub declined: u64,
    pub timeouts: u64,
    pub cached: usize,
}

/// Non-blocking [`Advisor`] over an async reasoner.
///
/// `suggest_action` returns the most recent cached answer for the agent, if it
/// is at most `max_staleness_ticks` old, and queues a fresh query unless one
/// is already in flight. Queries run one at a time on a tokio task; each is
/// abandoned after `timeout_ms`.
pub struct AsyncAdvisor {
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<AdvisorQuery>,
    max_staleness_ticks: u64,
}

impl std::fmt::Debug for AsyncAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncAdvisor")
            .field("max_staleness_ticks", &self.max_staleness_ticks)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl AsyncAdvisor {
    /// Spawns the worker on the current tokio runtime.
    ///
    /// # Panics
    /// Outside a tokio runtime, like `tokio::spawn`.
    pub fn new(reasoner: Arc<dyn ActionReasoner>, config: &AdvisorConfig) -> Self {
        Self::spawn_on(&tokio::runtime::Handle::current(), reasoner, config)
    }

    pub fn spawn_on(
        handle: &tokio::runtime::Handle,
        reasoner: Arc<dyn ActionReasoner>,
        config: &AdvisorConfig,
    ) -> Self {
        let shared = Arc::new(Shared::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<AdvisorQuery>();
        let timeout = Duration::from_millis(config.timeout_ms.max(1));

        let worker = Arc::clone(&shared);
        handle.spawn(async move {
            while let Some(query) = rx.recv().await {
                let agent = query.agent;
                match tokio::time::timeout(timeout, reasoner.reason(&query)).await {
                    Ok(Some(suggestion)) => {
                        worker.answered.fetch_add(1, Ordering::Relaxed);
                        lock(&worker.cache).insert(
                            agent,
                            Cached {
                                action: suggestion.action,
                                tick: query.tick,
                            },
                        );
                    }
                    Ok(None) => {
                        worker.declined.fetch_add(1, Ordering::Relaxed);
                        lock(&worker.cache).remove(&agent);
                    }
                    Err(_) => {
                        worker.timeouts.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(%agent, "Advisor query timed out");
                    }
                }
                lock(&worker.pending).remove(&agent);
            }
            tracing::debug!("Advisor worker stopped");
        });

        Self {
            shared,
            tx,
            max_staleness_ticks: config.max_staleness_ticks,
        }
    }

    /// Cached action for `agent` regardless of age.
    #[must_use]
    pub fn cached(&self, agent: AgentId) -> Option<Action> {
        lock(&self.shared.cache).get(&agent).map(|c| c.action)
    }

    #[must_use]
    pub fn stats(&self) -> AdvisorStats {
        AdvisorStats {
            answered: self.shared.answered.load(Ordering::Relaxed),
            declined: self.shared.declined.load(Ordering::Relaxed),
            timeouts: self.shared.timeouts.load(Ordering::Relaxed),
            cached: lock(&self.shared.cache).len(),
        }
    }

    fn is_fresh(&self, cached: &Cached, tick: u64) -> bool {
        tick.saturating_sub(cached.tick) <= self.max_staleness_ticks
    }
}

impl Advisor for AsyncAdvisor {
    fn suggest_action(&self, agent: &Agent, features: &FeatureVector, tick: u64) -> Option<Action> {
        let current = lock(&self.shared.cache)
            .get(&agent.id)
            .filter(|c| self.is_fresh(c, tick))
            .map(|c| c.action);

        if lock(&self.shared.pending).insert(agent.id) {
            let query = AdvisorQuery::new(agent, features, tick);
            if self.tx.send(query).is_err() {
                lock(&self.shared.pending).remove(&agent.id);
            }
        }
        current
    }

    /// Drops answers that can no longer be served, including those for
    /// agents that have died.
    fn end_tick(&self, tick: u64) {
        let limit = self.max_staleness_ticks;
        lock(&self.shared.cache).retain(|_, c| tick.saturating_sub(c.tick) <= limit);
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

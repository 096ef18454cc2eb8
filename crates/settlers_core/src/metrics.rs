//! Simulation counters and logging setup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const MALFORMED_GENOME: &str = "malformed_genome";
pub const DUPLICATE_FITNESS: &str = "duplicate_fitness";
pub const BIRTHS: &str = "births";
pub const DEATHS: &str = "deaths";
pub const RESEEDS: &str = "reseeds";
pub const ADVISOR_OVERRIDES: &str = "advisor_overrides";

/// Tick and population counters plus named event counters.
pub struct Metrics {
    tick_count: AtomicU64,
    population: AtomicU64,
    generation: AtomicU64,
    counters: Mutex<HashMap<String, u64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("tick_count", &self.tick_count())
            .field("population", &self.population())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            population: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            counters: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick. Logs a summary every 1000 ticks.
    pub fn record_tick(&self, duration: Duration, population: usize, generation: u32) {
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.population.store(population as u64, Ordering::Relaxed);
        self.generation
            .store(u64::from(generation), Ordering::Relaxed);

        if tick % 1000 == 0 {
            tracing::info!(
                tick,
                population,
                generation,
                births = self.counter(BIRTHS),
                deaths = self.counter(DEATHS),
                duration_us = duration.as_micros() as u64,
                "Simulation tick"
            );
        }
    }

    pub fn increment_counter(&self, name: &str) {
        self.add_to_counter(name, 1);
    }

    pub fn add_to_counter(&self, name: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        *counters.entry(name.to_string()).or_insert(0) += amount;
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.get(name).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn population(&self) -> u64 {
        self.population.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}

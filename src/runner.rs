use anyhow::{Context, Result};
use serde::Serialize;
use settlers_advisor::{AsyncAdvisor, HeuristicReasoner};
use settlers_core::config::AppConfig;
use settlers_core::metrics;
use settlers_core::world::World;
use settlers_core::CoreError;
use settlers_data::PopulationStats;
use settlers_io::{HistoryLogger, PopulationSnapshot};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where agent decisions may come from besides the genome network.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdvisorMode {
    #[default]
    None,
    /// Rule-based reasoner on a background task.
    Heuristic,
}

/// What to do when every agent has died and nothing is left to breed from.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtinctionPolicy {
    /// Start over with random founders.
    #[default]
    Reseed,
    /// Stop the run.
    Halt,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// TOML config; defaults are used when absent.
    pub config: Option<PathBuf>,
    pub ticks: u64,
    /// Overrides `world.seed` from the config.
    pub seed: Option<u64>,
    /// Population snapshot to start from.
    pub load: Option<PathBuf>,
    /// Where to write the population snapshot on exit.
    pub save: Option<PathBuf>,
    /// Directory for the JSONL lifecycle history.
    pub log_dir: Option<PathBuf>,
    pub advisor: AdvisorMode,
    pub on_extinction: ExtinctionPolicy,
    /// Maximum genomes written to the snapshot.
    pub snapshot_limit: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: None,
            ticks: 1000,
            seed: None,
            load: None,
            save: None,
            log_dir: None,
            advisor: AdvisorMode::None,
            on_extinction: ExtinctionPolicy::Reseed,
            snapshot_limit: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub final_tick: u64,
    /// Agents taken from the loaded snapshot.
    pub restored: usize,
    pub births: u64,
    pub deaths: u64,
    pub reseeds: u64,
    pub extinctions: u32,
    pub advisor_overrides: u64,
    pub halted: bool,
    pub stats: PopulationStats,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.stats;
        writeln!(f, "Ticks run:     {} (final tick {})", self.ticks_run, self.final_tick)?;
        writeln!(
            f,
            "Population:    {} ({} children, {} adults, {} elders, {} sheltered)",
            s.population, s.children, s.adults, s.elders, s.sheltered
        )?;
        writeln!(f, "Generation:    {}", s.generation)?;
        writeln!(f, "Best fitness:  {:.2}", s.best_fitness)?;
        writeln!(
            f,
            "Mean health:   {:.1}  mean hunger: {:.1}",
            s.mean_health, s.mean_hunger
        )?;
        writeln!(
            f,
            "Births: {}  deaths: {}  reseeds: {}  extinctions: {}",
            self.births, self.deaths, self.reseeds, self.extinctions
        )?;
        if self.advisor_overrides > 0 {
            writeln!(f, "Advisor overrides: {}", self.advisor_overrides)?;
        }
        if self.halted {
            writeln!(f, "Run halted after extinction.")?;
        }
        Ok(())
    }
}

/// Reads and validates a TOML config, or returns the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    AppConfig::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
}

/// Builds the world described by `options`, restoring a snapshot if one was
/// given. Returns the world and the number of restored agents.
pub fn prepare_world(options: &RunOptions) -> Result<(World, usize)> {
    let mut config = load_config(options.config.as_deref())?;
    if let Some(seed) = options.seed {
        config.world.seed = Some(seed);
    }
    if options.advisor == AdvisorMode::Heuristic {
        config.advisor.enabled = true;
    }
    let mut world = World::new(config)?;

    let Some(path) = options.load.as_deref() else {
        return Ok((world, 0));
    };
    let snapshot = PopulationSnapshot::load(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
    if !snapshot.matches_config(&world.config.fingerprint()) {
        tracing::warn!(
            path = %path.display(),
            "Snapshot was evolved under different rules"
        );
    }
    let restored = snapshot
        .restore_into(&mut world)
        .with_context(|| format!("No usable genomes in {}", path.display()))?;
    Ok((world, restored))
}

/// Runs a headless simulation to completion.
///
/// Must be called inside a tokio runtime; the ticks themselves run on the
/// blocking pool so the advisor task keeps making progress.
pub async fn run(options: RunOptions) -> Result<RunSummary> {
    let (mut world, restored) = prepare_world(&options)?;

    let history = match options.log_dir.as_deref() {
        Some(dir) => Some(Arc::new(HistoryLogger::new_at(dir)?)),
        None => None,
    };
    if let Some(logger) = &history {
        world = world.with_observer(logger.clone());
    }

    let advisor = world.config.advisor.enabled.then(|| {
        Arc::new(AsyncAdvisor::new(
            Arc::new(HeuristicReasoner::default()),
            &world.config.advisor,
        ))
    });
    if let Some(advisor) = &advisor {
        world = world.with_advisor(advisor.clone());
    }

    tracing::info!(
        population = world.population(),
        ticks = options.ticks,
        restored,
        "Starting headless run"
    );
    let ticks = options.ticks;
    let policy = options.on_extinction;
    let (world, mut summary) = tokio::task::spawn_blocking(move || simulate(world, ticks, policy))
        .await
        .context("Simulation task panicked")??;
    summary.restored = restored;

    if let Some(advisor) = &advisor {
        let stats = advisor.stats();
        tracing::info!(
            answered = stats.answered,
            declined = stats.declined,
            timeouts = stats.timeouts,
            "Advisor finished"
        );
    }
    if let Some(path) = options.save.as_deref() {
        PopulationSnapshot::capture(&world, options.snapshot_limit)
            .save(path)
            .with_context(|| format!("Failed to save snapshot {}", path.display()))?;
    }
    if let Some(logger) = &history {
        logger.close();
    }
    Ok(summary)
}

/// Drives `world` for up to `ticks` updates under the extinction policy.
pub fn simulate(
    mut world: World,
    ticks: u64,
    policy: ExtinctionPolicy,
) -> Result<(World, RunSummary)> {
    let mut ticks_run = 0;
    let mut extinctions = 0;
    let mut halted = false;

    for _ in 0..ticks {
        let extinct = match world.update() {
            Ok(_) => world.is_extinct(),
            Err(CoreError::EmptyPopulation) => true,
            Err(e) => return Err(e.into()),
        };
        ticks_run += 1;
        if !extinct {
            continue;
        }
        extinctions += 1;
        match policy {
            ExtinctionPolicy::Reseed => {
                let added = world.reseed_from_scratch();
                tracing::warn!(tick = world.tick(), added, "Population extinct, reseeded");
            }
            ExtinctionPolicy::Halt => {
                tracing::warn!(tick = world.tick(), "Population extinct, halting");
                halted = true;
                break;
            }
        }
    }

    let m = &world.metrics;
    let summary = RunSummary {
        ticks_run,
        final_tick: world.tick(),
        restored: 0,
        births: m.counter(metrics::BIRTHS),
        deaths: m.counter(metrics::DEATHS),
        reseeds: m.counter(metrics::RESEEDS),
        extinctions,
        advisor_overrides: m.counter(metrics::ADVISOR_OVERRIDES),
        halted,
        stats: world.pop_stats.clone(),
    };
    Ok((world, summary))
}

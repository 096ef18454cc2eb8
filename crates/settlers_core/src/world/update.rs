use crate::brain::forward;
use crate::error::{CoreError, CoreResult};
use crate::lifecycle::{self, LifecycleUpdate, Surroundings};
use crate::metrics;
use crate::sensors::{self, SenseContext};
use crate::systems::action::{self, ActionContext, ActionOutput};
use crate::systems::reproduction::{self, ReproductionContext};
use crate::systems::stats::{self, StatsContext};
use crate::world::{agent_seed, TickReport, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use settlers_data::{AgentId, DeathCause, HouseId, LifeStage, MilestoneKind};
use std::time::Instant;

/// Result of one agent's parallel step, applied in the commit phase.
#[derive(Debug, Clone)]
pub(crate) struct AgentStep {
    pub id: AgentId,
    pub output: ActionOutput,
    pub lifecycle: LifecycleUpdate,
    pub malformed: bool,
    pub advised: bool,
}

impl World {
    /// Advances the simulation by one tick.
    ///
    /// Only [`CoreError::EmptyPopulation`] escapes: the population fell below
    /// `min_population` and there is nothing left to reseed from.
    pub fn update(&mut self) -> CoreResult<TickReport> {
        let started = Instant::now();
        self.ctx.tick += 1;
        let tick = self.ctx.tick;
        let dt = self.config.world.tick_seconds;
        if self.config.world.deterministic {
            self.rng = ChaCha8Rng::seed_from_u64(agent_seed(self.ctx.world_seed, tick, AgentId(0)));
        }

        let steps = self.pass_decide_and_act(dt);

        let mut report = TickReport {
            tick,
            ..Default::default()
        };
        self.commit_steps(steps, &mut report);
        self.commit_deaths(&mut report);
        self.pass_reproduction(dt, &mut report);

        let settlers: Vec<(f64, f64)> = self
            .agents
            .iter()
            .filter(|a| a.is_alive())
            .map(|a| (a.position.x, a.position.z))
            .collect();
        self.resources.advance(dt, &settlers);
        self.resources.regrow(dt);
        self.ctx.clock.advance(dt);

        self.pass_population_floor(&mut report)?;
        self.refresh_stats();
        report.population = self.agents.len();

        self.metrics.record_tick(
            started.elapsed(),
            self.agents.len(),
            self.ctx.engine.current_generation(),
        );
        self.advisor.end_tick(tick);
        Ok(report)
    }

    /// Sense, decide, act and age every agent in parallel.
    ///
    /// Each agent mutates only itself; collaborators are read as committed
    /// by the previous tick.
    fn pass_decide_and_act(&mut self, dt: f64) -> Vec<AgentStep> {
        let tick = self.ctx.tick;
        let world_seed = self.ctx.world_seed;
        let lifecycle_cfg = &self.config.lifecycle;
        let sense_ctx = SenseContext {
            spatial: &*self.resources,
            shelters: &*self.shelters,
            clock: &self.ctx.clock,
            lifecycle: lifecycle_cfg,
        };
        let action_ctx = ActionContext {
            terrain: &*self.terrain,
            lifecycle: lifecycle_cfg,
            dt,
            half_width: self.config.world.width / 2.0,
            half_depth: self.config.world.depth / 2.0,
        };
        let night = self.ctx.clock.is_night();
        let advisor = &*self.advisor;

        self.agents
            .par_iter_mut()
            .map(|agent| {
                let mut rng = ChaCha8Rng::seed_from_u64(agent_seed(world_seed, tick, agent.id));
                let obs = sensors::assemble(agent, &sense_ctx);

                let (mut chosen, err) =
                    forward::evaluate_or_fallback(&agent.genome.weights, &obs.features);
                if let Some(e) = &err {
                    tracing::warn!(agent = %agent.id, error = %e, "Falling back to wander");
                }
                let suggestion = advisor.suggest_action(agent, &obs.features, tick);
                if let Some(action) = suggestion {
                    chosen = action;
                }

                let output = action::execute(chosen, agent, &obs, &action_ctx, &mut rng);
                let surroundings = Surroundings {
                    night,
                    threat_distance: obs
                        .threat
                        .map(|t| t.distance_from(agent.position.x, agent.position.z)),
                };
                let update = lifecycle::advance(
                    agent,
                    output.exertion,
                    surroundings,
                    lifecycle_cfg,
                    dt,
                    &mut rng,
                );

                AgentStep {
                    id: agent.id,
                    output,
                    lifecycle: update,
                    malformed: err.is_some(),
                    advised: suggestion.is_some(),
                }
            })
            .collect()
    }

    /// Applies shared effects in ascending agent-id order.
    fn commit_steps(&mut self, steps: Vec<AgentStep>, report: &mut TickReport) {
        let tick = self.ctx.tick;
        for step in steps {
            if step.malformed {
                report.malformed_genomes += 1;
                self.metrics.increment_counter(metrics::MALFORMED_GENOME);
            }
            if step.advised {
                report.advisor_overrides += 1;
                self.metrics.increment_counter(metrics::ADVISOR_OVERRIDES);
            }

            if let Some(house) = step.output.release {
                self.shelters.release_slot(house, step.id);
            }

            let Some(idx) = reproduction::roster_index(&self.agents, step.id) else {
                continue;
            };
            let mut milestones = step.lifecycle.milestones;

            if self.agents[idx].is_alive() {
                if let Some(food) = step.output.harvest {
                    if self.resources.harvest(food) {
                        if lifecycle::eat(&mut self.agents[idx], &self.config.lifecycle) {
                            milestones.push(MilestoneKind::FirstHarvest);
                        }
                    } else {
                        self.agents[idx].target = None;
                    }
                }
                if let Some(house) = step.output.claim {
                    self.commit_claim(idx, house);
                }
            }

            for kind in milestones {
                self.observer.on_milestone(&self.agents[idx], kind, tick);
            }
        }
    }

    fn commit_claim(&mut self, idx: usize, house: HouseId) {
        let agent = &mut self.agents[idx];
        if !self.shelters.claim_slot(house, agent.id) {
            tracing::debug!(
                agent = %agent.id,
                error = %CoreError::HouseClaimConflict(house),
                "House claim lost"
            );
            agent.target = None;
            return;
        }
        agent.house = Some(house);
        agent.target = None;
        if let Some(pos) = self.shelters.position(house) {
            agent.position.x = pos.x;
            agent.position.z = pos.z;
            agent.position.y = self.terrain.height(pos.x, pos.z);
        }
    }

    /// Records fitness, notifies, frees house slots and removes the dead.
    fn commit_deaths(&mut self, report: &mut TickReport) {
        let tick = self.ctx.tick;
        for agent in self.agents.iter().filter(|a| !a.is_alive()) {
            let cause = agent.cause_of_death.unwrap_or(DeathCause::OldAge);
            let fitness = match self.ctx.engine.record_agent(agent) {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(agent = %agent.id, error = %e, "Fitness not recorded");
                    self.metrics.increment_counter(metrics::DUPLICATE_FITNESS);
                    self.ctx.engine.fitness_of(&agent.fitness)
                }
            };
            if let Some(house) = agent.house {
                self.shelters.release_slot(house, agent.id);
            }
            tracing::debug!(
                agent = %agent.id,
                name = %agent.name,
                cause = cause.label(),
                age = agent.age,
                fitness,
                "Agent died"
            );
            self.observer.on_death(agent, cause, fitness, tick);
            self.metrics.increment_counter(metrics::DEATHS);
            report.deaths.push((agent.id, cause));
        }
        self.agents.retain(|a| a.is_alive());
    }

    /// Gives each eligible house its per-tick chance of a child.
    fn pass_reproduction(&mut self, dt: f64, report: &mut TickReport) {
        let chance = (self.config.lifecycle.reproduction_chance * dt).clamp(0.0, 1.0);
        if chance <= 0.0 {
            return;
        }
        for house in self.shelters.house_ids() {
            if reproduction::is_eligible(house, &self.agents, &*self.shelters).is_none() {
                continue;
            }
            if !self.rng.gen_bool(chance) {
                continue;
            }
            if let Some(child) = self.try_reproduce(house) {
                report.births.push(child);
            }
        }
    }

    /// Runs the reproduction coordinator for `house` without the random gate.
    ///
    /// Returns the child's id, or `None` with nothing changed when the house
    /// is not eligible.
    pub fn try_reproduce(&mut self, house: HouseId) -> Option<AgentId> {
        let tick = self.ctx.tick;
        let child_id = AgentId(self.ctx.next_agent_id);
        let birth = {
            let ctx = ReproductionContext {
                shelters: &*self.shelters,
                terrain: &*self.terrain,
                engine: &self.ctx.engine,
                lifecycle: &self.config.lifecycle,
                tick,
            };
            reproduction::try_reproduce(house, &mut self.agents, child_id, &ctx, &mut self.rng)?
        };
        self.ctx.next_agent_id += 1;

        self.observer
            .on_reproduction(birth.parents, &birth.child, birth.house, tick);
        self.observer.on_birth(&birth.child, tick);
        for parent in birth.parents {
            if let Some(p) = self.agent(parent) {
                if p.fitness.reproductions == 1 {
                    self.observer.on_milestone(p, MilestoneKind::HadOffspring, tick);
                }
            }
        }
        self.ctx.engine.observe_generation(birth.child.generation);
        self.metrics.increment_counter(metrics::BIRTHS);

        let id = birth.child.id;
        self.agents.push(birth.child);
        Some(id)
    }

    /// Refills the roster from the fitness archive when it drops below the floor.
    fn pass_population_floor(&mut self, report: &mut TickReport) -> CoreResult<()> {
        let floor = self.config.world.min_population;
        if self.agents.len() >= floor {
            return Ok(());
        }
        let target = self.config.world.initial_population.saturating_sub(self.agents.len());
        if target == 0 {
            return Ok(());
        }
        report.reseeded = self.reseed(target)?;
        Ok(())
    }

    /// Adds `count` agents bred from live agents and the archive.
    pub fn reseed(&mut self, count: usize) -> CoreResult<usize> {
        let live = self.scored_live();
        let seeds = self
            .ctx
            .engine
            .reseed_with_rng(live, count, &mut self.rng)?;
        let genomes = seeds.into_iter().map(|s| (s.genome, s.generation)).collect();
        let added = self.spawn_founders(genomes).len();
        self.observer
            .on_reseed(added, self.ctx.engine.current_generation(), self.ctx.tick);
        self.metrics.increment_counter(metrics::RESEEDS);
        Ok(added)
    }

    pub(crate) fn refresh_stats(&mut self) {
        stats::update_population_stats(
            &mut self.pop_stats,
            StatsContext {
                agents: &self.agents,
                shelters: &*self.shelters,
                generation: self.ctx.engine.current_generation(),
                best_fitness: self.ctx.engine.best_fitness(),
            },
        );
    }

    /// Runs `ticks` updates, stopping at the first error.
    pub fn run(&mut self, ticks: u64) -> CoreResult<Vec<TickReport>> {
        (0..ticks).map(|_| self.update()).collect()
    }

    /// Number of live agents in each life stage, for quick assertions.
    #[must_use]
    pub fn stage_count(&self, stage: LifeStage) -> usize {
        self.agents.iter().filter(|a| a.stage == stage).count()
    }
}

mod common;

use common::{genome_choosing, AgentSpec, WorldBuilder};
use settlers_core::advisor::Advisor;
use settlers_core::brain::{FeatureVector, PARAMETER_COUNT};
use settlers_core::clock::DayClock;
use settlers_core::config::AppConfig;
use settlers_core::events::{EventBuffer, LifecycleEvent};
use settlers_core::evolution::ScoredGenome;
use settlers_core::interfaces::SpatialIndex;
use settlers_core::world::World;
use settlers_core::CoreError;
use settlers_data::{Action, Agent, DeathCause, Genome, LifeStage, MilestoneKind, TargetKind, TargetRef};
use std::sync::Arc;

struct Always(Action);

impl Advisor for Always {
    fn suggest_action(&self, _agent: &Agent, _features: &FeatureVector, _tick: u64) -> Option<Action> {
        Some(self.0)
    }
}

#[test]
fn test_same_seed_same_history() {
    let mut config = AppConfig::default();
    config.world.seed = Some(12345);
    config.world.deterministic = true;
    config.world.initial_population = 30;

    let mut world1 = World::new(config.clone()).unwrap();
    let mut world2 = World::new(config).unwrap();

    for _ in 0..300 {
        let r1 = world1.update().unwrap();
        let r2 = world2.update().unwrap();
        assert_eq!(r1, r2, "Tick reports diverged at tick {}", r1.tick);
    }

    assert_eq!(world1.population(), world2.population());
    for (a, b) in world1.agents.iter().zip(&world2.agents) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.position, b.position, "Position of {} diverged", a.id);
        assert_eq!(a.stats, b.stats, "Stats of {} diverged", a.id);
        assert_eq!(a.genome, b.genome);
        assert_eq!(a.last_action, b.last_action);
    }
    assert_eq!(world1.pop_stats, world2.pop_stats);
}

#[test]
fn test_threats_roam_between_ticks() {
    let mut config = AppConfig::default();
    config.world.seed = Some(31);
    config.world.initial_threats = 2;
    let mut world = World::new(config).unwrap();
    let threat = TargetRef {
        kind: TargetKind::Threat,
        id: 0,
    };
    let before = world.resources.resolve(threat).unwrap();
    world.run(20).unwrap();
    let after = world.resources.resolve(threat).unwrap();
    assert!(after.distance_from(before.x, before.z) > 0.0);
    assert!(after.x.abs() <= world.config.world.width / 2.0);
}

#[test]
fn test_different_seeds_diverge() {
    let mut config = AppConfig::default();
    config.world.seed = Some(1);
    let world1 = World::new(config.clone()).unwrap();
    config.world.seed = Some(2);
    let world2 = World::new(config).unwrap();
    let same = world1
        .agents
        .iter()
        .zip(&world2.agents)
        .all(|(a, b)| a.genome == b.genome);
    assert!(!same);
}

#[test]
fn test_roster_stays_sorted_and_consistent() {
    let mut config = AppConfig::default();
    config.world.seed = Some(99);
    config.world.initial_population = 40;
    let mut world = World::new(config).unwrap();

    for _ in 0..500 {
        world.update().unwrap();
        assert!(world.agents.windows(2).all(|w| w[0].id < w[1].id));
        for agent in &world.agents {
            assert!(agent.is_alive());
            assert!(agent.stats.health > 0.0 && agent.stats.health <= 100.0);
            assert!((0.0..=100.0).contains(&agent.stats.hunger));
            assert!((0.0..=100.0).contains(&agent.stats.stamina));
            assert!(agent.genome.traits.is_within_bounds());
            if let Some(house) = agent.house {
                assert!(world.shelters.occupants(house).contains(&agent.id));
            }
        }
        for house in world.shelters.house_ids() {
            let occupants = world.shelters.occupants(house);
            assert!(occupants.len() <= world.shelters.capacity(house));
            for id in occupants {
                assert_eq!(world.agent(*id).and_then(|a| a.house), Some(house));
            }
        }
    }
}

#[test]
fn test_night_exposure_kills_outdoor_agent() {
    let (mut world, ids, _) = WorldBuilder::new()
        .with_config(|c| {
            c.lifecycle.exposure_damage = 2000.0;
            c.lifecycle.hunger_rate = 0.0;
        })
        .with_agent(AgentSpec::at(0.0, 0.0).adult())
        .build();
    world.ctx.clock = DayClock::starting_at_hour(world.config.world.day_length, 0.0);

    let report = world.update().unwrap();
    assert_eq!(report.deaths, vec![(ids[0], DeathCause::Exposure)]);
    assert!(world.is_extinct());
    assert!(world.engine().has_record(ids[0]));
}

#[test]
fn test_shelter_protects_from_night() {
    let (mut world, ids, houses) = WorldBuilder::new()
        .with_config(|c| c.lifecycle.exposure_damage = 2000.0)
        .with_house(0.0, 0.0)
        .with_agent(
            AgentSpec::at(0.0, 0.0)
                .adult()
                .with_genome(genome_choosing(Action::StayInShelter))
                .in_house(0),
        )
        .build();
    world.ctx.clock = DayClock::starting_at_hour(world.config.world.day_length, 0.0);

    for _ in 0..20 {
        let report = world.update().unwrap();
        assert!(report.deaths.is_empty());
    }
    let agent = world.agent(ids[0]).unwrap();
    assert_eq!(agent.house, Some(houses[0]));
    assert_eq!(agent.last_action, Action::StayInShelter);
}

#[test]
fn test_walking_out_releases_house() {
    let (mut world, ids, houses) = WorldBuilder::new()
        .with_house(0.0, 0.0)
        .with_agent(AgentSpec::at(0.0, 0.0).adult().in_house(0))
        .build();
    world.update().unwrap();
    assert_eq!(world.agent(ids[0]).unwrap().house, None);
    assert!(world.shelters.occupants(houses[0]).is_empty());
}

#[test]
fn test_malformed_genome_wanders_without_crashing() {
    let (mut world, ids, _) = WorldBuilder::new()
        .with_agent(AgentSpec::at(0.0, 0.0).with_genome(Genome::zeroed(PARAMETER_COUNT - 1)))
        .with_agent(AgentSpec::at(10.0, 0.0))
        .build();

    let report = world.update().unwrap();
    assert_eq!(report.malformed_genomes, 1);
    assert_eq!(world.population(), 2);
    assert_eq!(world.agent(ids[0]).unwrap().last_action, Action::Wander);
    assert_eq!(
        world.metrics.counter(settlers_core::metrics::MALFORMED_GENOME),
        1
    );
}

#[test]
fn test_advisor_overrides_network() {
    let (world, ids, _) = WorldBuilder::new()
        .with_agent(AgentSpec::at(0.0, 0.0))
        .with_agent(AgentSpec::at(5.0, 5.0))
        .build();
    let mut world = world.with_advisor(Arc::new(Always(Action::Rest)));

    let before = world.agent(ids[1]).unwrap().position;
    let report = world.update().unwrap();
    assert_eq!(report.advisor_overrides, 2);
    for id in &ids {
        assert_eq!(world.agent(*id).unwrap().last_action, Action::Rest);
    }
    assert_eq!(world.agent(ids[1]).unwrap().position, before);
}

#[test]
fn test_harvest_feeds_agent_and_fires_milestone() {
    let events = Arc::new(EventBuffer::new());
    let (world, ids, _) = WorldBuilder::new()
        .with_food(0.5, 0.0, 1)
        .with_agent(AgentSpec::at(0.0, 0.0).with_genome(genome_choosing(Action::Eat)))
        .build();
    let mut world = world.with_observer(events.clone());
    world.agent_mut(ids[0]).unwrap().stats.hunger = 60.0;

    world.update().unwrap();
    let agent = world.agent(ids[0]).unwrap();
    assert_eq!(agent.fitness.resources_gathered, 1);
    assert!(agent.stats.hunger < 60.0 - world.config.lifecycle.eat_amount + 1.0);

    let drained = events.drain();
    assert!(drained.iter().any(|e| matches!(
        e,
        LifecycleEvent::Milestone { kind: MilestoneKind::FirstHarvest, .. }
    )));

    // The single serving is gone; a second bite finds nothing.
    world.update().unwrap();
    assert_eq!(world.agent(ids[0]).unwrap().fitness.resources_gathered, 1);
}

#[test]
fn test_observer_sees_reproduction_and_birth() {
    let events = Arc::new(EventBuffer::new());
    let (world, ids, houses) = WorldBuilder::new()
        .with_house(0.0, 0.0)
        .with_agent(AgentSpec::at(0.0, 0.0).adult().in_house(0))
        .with_agent(AgentSpec::at(0.0, 0.0).adult().in_house(0))
        .build();
    let mut world = world.with_observer(events.clone());

    let child = world.try_reproduce(houses[0]).unwrap();
    let drained = events.drain();
    assert!(drained.iter().any(|e| matches!(
        e,
        LifecycleEvent::Reproduction { child: c, .. } if *c == child
    )));
    assert!(drained
        .iter()
        .any(|e| matches!(e, LifecycleEvent::Birth { agent, .. } if *agent == child)));
    let offspring_milestones = drained
        .iter()
        .filter(|e| {
            matches!(
                e,
                LifecycleEvent::Milestone { kind: MilestoneKind::HadOffspring, .. }
            )
        })
        .count();
    assert_eq!(offspring_milestones, ids.len());
}

#[test]
fn test_population_floor_reseeds_from_survivors() {
    let (mut world, _, _) = WorldBuilder::new()
        .with_config(|c| {
            c.world.initial_population = 5;
            c.world.min_population = 2;
        })
        .with_agent(AgentSpec::at(0.0, 0.0).adult())
        .build();

    let report = world.update().unwrap();
    assert_eq!(report.reseeded, 4);
    assert_eq!(world.population(), 5);
    assert!(world
        .agents
        .iter()
        .all(|a| a.genome.weights.len() == PARAMETER_COUNT));
}

#[test]
fn test_empty_world_below_floor_is_an_error() {
    let (mut world, _, _) = WorldBuilder::new()
        .with_config(|c| {
            c.world.initial_population = 4;
            c.world.min_population = 2;
        })
        .build();
    assert_eq!(world.update().unwrap_err(), CoreError::EmptyPopulation);
}

#[test]
fn test_reseed_after_extinction_uses_archive() {
    let (mut world, ids, _) = WorldBuilder::new()
        .with_config(|c| {
            c.world.initial_population = 3;
            c.world.min_population = 1;
            c.lifecycle.exposure_damage = 2000.0;
        })
        .with_agent(AgentSpec::at(0.0, 0.0).adult())
        .build();
    world.ctx.clock = DayClock::starting_at_hour(world.config.world.day_length, 0.0);
    let lost = world.agent(ids[0]).unwrap().genome.clone();

    let report = world.update().unwrap();
    assert_eq!(report.deaths.len(), 1);
    assert_eq!(report.reseeded, 3);
    assert!(world.agents.iter().any(|a| a.genome == lost));
}

fn scored(genome: Genome, fitness: f64, generation: u32) -> ScoredGenome {
    ScoredGenome {
        genome,
        fitness,
        generation,
    }
}

#[test]
fn test_restore_rejects_only_malformed() {
    let (mut world, _, _) = WorldBuilder::new()
        .with_agent(AgentSpec::at(0.0, 0.0))
        .build();

    let bad = vec![
        scored(Genome::zeroed(3), 1.0, 0),
        scored(Genome::zeroed(PARAMETER_COUNT + 1), 2.0, 0),
    ];
    assert_eq!(
        world.restore_population(bad, 4, 2.0),
        Err(CoreError::EmptyPopulation)
    );
    assert_eq!(world.population(), 1);

    let mixed = vec![
        scored(Genome::zeroed(PARAMETER_COUNT), 1.0, 4),
        scored(Genome::zeroed(7), 9.0, 4),
        scored(Genome::zeroed(PARAMETER_COUNT), 2.0, 4),
    ];
    world.config.world.initial_population = 5;
    assert_eq!(world.restore_population(mixed, 4, 2.0), Ok(2));
    assert_eq!(world.population(), 2);
    assert!(world.agents.iter().all(|a| a.generation == 4));
    assert_eq!(world.engine().current_generation(), 4);
}

#[test]
fn test_restore_keeps_generations_and_caps_population() {
    let (mut world, _, _) = WorldBuilder::new()
        .with_config(|c| c.world.initial_population = 3)
        .with_agent(AgentSpec::at(0.0, 0.0))
        .build();

    let saved = vec![
        scored(Genome::zeroed(PARAMETER_COUNT), 5.0, 2),
        scored(Genome::zeroed(PARAMETER_COUNT), 40.0, 7),
        scored(Genome::zeroed(PARAMETER_COUNT), 1.0, 1),
        scored(Genome::zeroed(PARAMETER_COUNT), 20.0, 3),
        scored(Genome::zeroed(PARAMETER_COUNT), 3.0, 9),
    ];
    assert_eq!(world.restore_population(saved, 11, 55.0), Ok(3));

    let mut generations: Vec<u32> = world.agents.iter().map(|a| a.generation).collect();
    generations.sort_unstable();
    assert_eq!(generations, vec![2, 3, 7]);

    let archived: Vec<u32> = world.engine().archive().iter().map(|s| s.generation).collect();
    assert_eq!(archived, vec![9, 1]);
    assert_eq!(world.engine().current_generation(), 11);
    assert_eq!(world.engine().best_fitness(), 55.0);
    assert_eq!(world.pop_stats.generation, 11);
}

#[test]
fn test_founders_start_adult_when_configured() {
    let mut config = AppConfig::default();
    config.world.seed = Some(3);
    config.world.founders_start_adult = true;
    let world = World::new(config.clone()).unwrap();
    assert_eq!(world.stage_count(LifeStage::Adult), config.world.initial_population);

    config.world.founders_start_adult = false;
    let world = World::new(config.clone()).unwrap();
    assert_eq!(world.stage_count(LifeStage::Child), config.world.initial_population);
}

#[test]
fn test_run_counts_ticks() {
    let mut config = AppConfig::default();
    config.world.seed = Some(8);
    let mut world = World::new(config).unwrap();
    let reports = world.run(25).unwrap();
    assert_eq!(reports.len(), 25);
    assert_eq!(world.tick(), 25);
    assert_eq!(world.metrics.tick_count(), 25);
    assert_eq!(reports.last().map(|r| r.population), Some(world.population()));
}

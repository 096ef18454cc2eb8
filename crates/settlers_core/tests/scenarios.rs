mod common;

use common::{genome_choosing, AgentSpec, WorldBuilder};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use settlers_core::brain::{forward, GenomeLogic, NETWORK_INPUTS, PARAMETER_COUNT};
use settlers_core::clock::DayClock;
use settlers_core::config::LifecycleConfig;
use settlers_core::environment::{HouseRegistry, ResourceField};
use settlers_core::lifecycle;
use settlers_core::sensors::{self, SenseContext, ABSENT_DISTANCE, FOOD_DIR, FOOD_DIST, HUNGER};
use settlers_core::CoreError;
use settlers_data::{Action, AgentId, Genome, LifeStage, Position};

#[test]
fn test_zero_genome_neutral_input_picks_wander() {
    let genome = Genome::zeroed(PARAMETER_COUNT);
    let features = [0.0; NETWORK_INPUTS];
    for _ in 0..5 {
        assert_eq!(genome.evaluate(&features), Ok(Action::Wander));
    }
}

#[test]
fn test_short_genome_is_malformed_and_falls_back() {
    let genome = Genome::zeroed(PARAMETER_COUNT - 1);
    let features = [0.0; NETWORK_INPUTS];
    assert_eq!(
        genome.evaluate(&features),
        Err(CoreError::MalformedGenome {
            expected: PARAMETER_COUNT,
            actual: PARAMETER_COUNT - 1,
        })
    );
    let (action, err) = forward::evaluate_or_fallback(&genome.weights, &features);
    assert_eq!(action, Action::Wander);
    assert!(err.is_some());
}

#[test]
fn test_crossover_without_mutation_only_uses_parent_weights() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let a = Genome::new_random_with_rng(&mut rng);
    let b = Genome::new_random_with_rng(&mut rng);
    let mut child = a.crossover_with_rng(&b, &mut rng).expect("same length");
    child.mutate_with_rng(0.0, 0.2, 0.1, &mut rng);

    assert_eq!(child.weights.len(), PARAMETER_COUNT);
    for (i, w) in child.weights.iter().enumerate() {
        assert!(
            *w == a.weights[i] || *w == b.weights[i],
            "weight {i} = {w} came from neither parent"
        );
    }
}

#[test]
fn test_starving_agent_without_food_senses_absent_target() {
    let field = ResourceField::new(20.0);
    let houses = HouseRegistry::new();
    let clock = DayClock::starting_at_hour(120.0, 12.0);
    let lifecycle_cfg = LifecycleConfig::default();
    let ctx = SenseContext {
        spatial: &field,
        shelters: &houses,
        clock: &clock,
        lifecycle: &lifecycle_cfg,
    };

    let mut agent = lifecycle::create_agent(
        AgentId(1),
        Genome::zeroed(PARAMETER_COUNT),
        0,
        Vec::new(),
        Position::new(3.0, 0.0, -2.0),
        0,
    );
    agent.stats.hunger = 100.0;

    let obs = sensors::assemble(&agent, &ctx);
    assert!(obs.food.is_none());
    assert_eq!(obs.features[HUNGER], 1.0);
    assert_eq!(obs.features[FOOD_DIST], ABSENT_DISTANCE);
    assert_eq!(obs.features[FOOD_DIR], 0.0);
    assert_eq!(obs.features[FOOD_DIR + 1], 0.0);
    assert!(obs.features.iter().all(|f| (-1.0..=1.0).contains(f)));
    assert!(agent.genome.evaluate(&obs.features).is_ok());
}

#[test]
fn test_two_ready_adults_in_house_have_a_child() {
    let (mut world, ids, houses) = WorldBuilder::new()
        .with_house(0.0, 0.0)
        .with_agent(AgentSpec::at(0.0, 0.0).adult().generation(2).in_house(0))
        .with_agent(AgentSpec::at(0.0, 0.0).adult().generation(5).in_house(0))
        .build();

    let child_id = world.try_reproduce(houses[0]).expect("eligible house");
    let child = world.agent(child_id).expect("child in roster");
    assert_eq!(child.stage, LifeStage::Child);
    assert_eq!(child.generation, 6);
    assert_eq!(child.parents, ids);
    assert_eq!(child.genome.weights.len(), PARAMETER_COUNT);
    assert!(child.genome.traits.is_within_bounds());
    assert!(child.position.planar_distance(0.0, 0.0) <= 1.0 + 1e-9);

    let cooldown = world.config.lifecycle.reproduction_cooldown;
    for id in &ids {
        let parent = world.agent(*id).expect("parent alive");
        assert_eq!(parent.reproduction_cooldown, cooldown);
        assert_eq!(parent.fitness.reproductions, 1);
    }
    // Cooldown now blocks a second child.
    assert_eq!(world.try_reproduce(houses[0]), None);
}

#[test]
fn test_single_occupant_never_reproduces() {
    let (mut world, ids, houses) = WorldBuilder::new()
        .with_house(0.0, 0.0)
        .with_agent(AgentSpec::at(0.0, 0.0).adult().in_house(0))
        .build();
    for _ in 0..50 {
        assert_eq!(world.try_reproduce(houses[0]), None);
    }
    assert_eq!(world.population(), 1);
    assert_eq!(world.agent(ids[0]).map(|a| a.fitness.reproductions), Some(0));
}

#[test]
fn test_child_occupant_blocks_reproduction() {
    let (mut world, _, houses) = WorldBuilder::new()
        .with_house(0.0, 0.0)
        .with_agent(AgentSpec::at(0.0, 0.0).adult().in_house(0))
        .with_agent(AgentSpec::at(0.0, 0.0).in_house(0))
        .build();
    assert_eq!(world.try_reproduce(houses[0]), None);
    assert_eq!(world.population(), 2);
}

#[test]
fn test_pair_in_house_with_spare_room_never_reproduces() {
    let (mut world, ids, houses) = WorldBuilder::new()
        .with_config(|c| c.lifecycle.house_capacity = 3)
        .with_house(0.0, 0.0)
        .with_agent(AgentSpec::at(0.0, 0.0).adult().in_house(0))
        .with_agent(AgentSpec::at(0.0, 0.0).adult().in_house(0))
        .build();
    assert_eq!(world.shelters.capacity(houses[0]), 3);
    assert_eq!(world.try_reproduce(houses[0]), None);
    assert_eq!(world.population(), 2);
    for id in &ids {
        assert_eq!(world.agent(*id).map(|a| a.fitness.reproductions), Some(0));
    }
}

#[test]
fn test_sheltered_pair_reproduces_during_ticks() {
    let stay = genome_choosing(Action::StayInShelter);
    let (mut world, _, houses) = WorldBuilder::new()
        .with_config(|c| {
            c.world.tick_seconds = 1.0;
            c.lifecycle.reproduction_chance = 1.0;
        })
        .with_house(0.0, 0.0)
        .with_agent(AgentSpec::at(0.0, 0.0).adult().with_genome(stay.clone()).in_house(0))
        .with_agent(AgentSpec::at(0.0, 0.0).adult().with_genome(stay).in_house(0))
        .build();

    let report = world.update().expect("population present");
    assert_eq!(report.births.len(), 1);
    assert_eq!(world.population(), 3);
    assert_eq!(world.shelters.occupants(houses[0]).len(), 2);
    assert_eq!(world.engine().current_generation(), 1);
}

#[test]
fn test_house_position_snaps_claiming_agent() {
    let (mut world, ids, houses) = WorldBuilder::new()
        .with_house(4.0, 4.0)
        .with_agent(AgentSpec::at(5.0, 5.0).with_genome(genome_choosing(Action::SeekShelter)))
        .build();

    world.update().expect("population present");
    let agent = world.agent(ids[0]).expect("alive");
    assert_eq!(agent.house, Some(houses[0]));
    assert_eq!(agent.position, Position::new(4.0, 0.0, 4.0));
    assert_eq!(world.shelters.occupants(houses[0]), &[ids[0]]);
}

use settlers_core::brain::{layer_spans, LAYER_COUNT, PARAMETER_COUNT};
use settlers_core::config::AppConfig;
use settlers_core::environment::{FlatTerrain, HouseRegistry, ResourceField};
use settlers_core::world::World;
use settlers_data::{Action, AgentId, Genome, HouseId, LifeStage, Position};

/// Founder placed by the builder before the first tick.
#[allow(dead_code)]
#[derive(Clone)]
pub struct AgentSpec {
    pub genome: Genome,
    pub x: f64,
    pub z: f64,
    pub age: f64,
    pub generation: u32,
    /// Index into the builder's houses.
    pub house: Option<usize>,
}

#[allow(dead_code)]
impl AgentSpec {
    pub fn at(x: f64, z: f64) -> Self {
        Self {
            genome: Genome::zeroed(PARAMETER_COUNT),
            x,
            z,
            age: 0.0,
            generation: 0,
            house: None,
        }
    }

    pub fn adult(mut self) -> Self {
        self.age = 100.0;
        self
    }

    pub fn with_genome(mut self, genome: Genome) -> Self {
        self.genome = genome;
        self
    }

    pub fn generation(mut self, generation: u32) -> Self {
        self.generation = generation;
        self
    }

    pub fn in_house(mut self, house: usize) -> Self {
        self.house = Some(house);
        self
    }
}

/// Empty world on flat ground with hand-placed food, threats, houses and agents.
#[allow(dead_code)]
pub struct WorldBuilder {
    config: AppConfig,
    food: Vec<(f64, f64, u32)>,
    threats: Vec<(f64, f64)>,
    houses: Vec<(f64, f64)>,
    agents: Vec<AgentSpec>,
}

#[allow(dead_code)]
impl WorldBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.world.seed = Some(42);
        config.world.initial_population = 1;
        config.world.min_population = 0;
        config.world.initial_food = 0;
        config.world.initial_game = 0;
        config.world.initial_threats = 0;
        config.world.house_count = 0;
        config.world.founders_start_adult = false;
        Self {
            config,
            food: Vec::new(),
            threats: Vec::new(),
            houses: Vec::new(),
            agents: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_food(mut self, x: f64, z: f64, servings: u32) -> Self {
        self.food.push((x, z, servings));
        self
    }

    pub fn with_threat(mut self, x: f64, z: f64) -> Self {
        self.threats.push((x, z));
        self
    }

    pub fn with_house(mut self, x: f64, z: f64) -> Self {
        self.houses.push((x, z));
        self
    }

    pub fn with_agent(mut self, agent: AgentSpec) -> Self {
        self.agents.push(agent);
        self
    }

    /// Returns the world, the ids of the placed agents and the house ids in
    /// insertion order.
    pub fn build(self) -> (World, Vec<AgentId>, Vec<HouseId>) {
        let mut field = ResourceField::new(20.0);
        for (x, z, servings) in self.food {
            field.add_food(x, z, servings);
        }
        for (x, z) in self.threats {
            field.add_threat(x, z);
        }
        let mut registry = HouseRegistry::new();
        let houses: Vec<HouseId> = self
            .houses
            .iter()
            .map(|&(x, z)| registry.add_house(Position::new(x, 0.0, z), self.config.lifecycle.house_capacity))
            .collect();

        let lifecycle = self.config.lifecycle.clone();
        let mut world = World::with_collaborators(
            self.config,
            Box::new(FlatTerrain::default()),
            Box::new(field),
            Box::new(registry),
        )
        .expect("valid test config");

        let mut ids = Vec::with_capacity(self.agents.len());
        for spec in self.agents {
            let id = world.spawn_agent(spec.genome, spec.x, spec.z, spec.generation, Vec::new());
            let house = spec.house.map(|i| houses[i]);
            if let Some(house) = house {
                assert!(world.shelters.claim_slot(house, id), "house slot available");
            }
            let agent = world.agent_mut(id).expect("just spawned");
            agent.age = spec.age;
            agent.stage = settlers_core::lifecycle::stage_for_age(spec.age, &lifecycle);
            agent.house = house;
            ids.push(id);
        }
        (world, ids, houses)
    }
}

/// Genome whose output layer bias makes it pick `action` for every input.
#[allow(dead_code)]
pub fn genome_choosing(action: Action) -> Genome {
    let mut genome = Genome::zeroed(PARAMETER_COUNT);
    let output = layer_spans()[LAYER_COUNT - 1];
    genome.weights[output.bias_offset + action.index()] = 1.0;
    genome
}

#[allow(dead_code)]
pub fn stage_of(world: &World, id: AgentId) -> Option<LifeStage> {
    world.agent(id).map(|a| a.stage)
}

//! Simulation engine - main entry point for running the stage

use codingland_logic::constants::{BUILDING_SLOT, DIRECT_ATTACKER_THRESHOLD, TERRAIN_SLOT};
use codingland_logic::{Direction, Vector};
use hecs::Entity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::time::Duration;

use crate::actions::{render_actions, ActionKind, PopupOptions};
use crate::components::*;
use crate::config::EngineConfig;
use crate::error::StageError;
use crate::events::{EventBus, Message, StageEvent};
use crate::generation::{generate_map, prefabs};
use crate::inventory::Inventory;
use crate::map::{blocks_movement, ChunkRef};
use crate::persistence::{self, SaveError};
use crate::stage::Stage;
use crate::systems::*;

/// A task a robot can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotTask {
    Move(Direction),
    Wait,
}

/// Main simulation engine
pub struct SimulationEngine {
    /// Node arena
    pub stage: Stage,
    pub bus: EventBus,
    pub inventory: Inventory,
    /// Messages for the player, oldest first
    pub messages: Vec<Message>,
    config: EngineConfig,
    map: Option<Entity>,
    robots: BTreeMap<String, Entity>,
    paths: PathScheduler,
    pursuits: Pursuits,
    rng: StdRng,
    tick_count: u64,
}

impl SimulationEngine {
    /// Create an engine with an empty stage.
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            stage: Stage::new(),
            bus: EventBus::new(),
            inventory: Inventory::new(),
            messages: Vec::new(),
            config,
            map: None,
            robots: BTreeMap::new(),
            paths: PathScheduler::new(),
            pursuits: Pursuits::new(),
            rng,
            tick_count: 0,
        }
    }

    /// Build the map described by the configuration, replacing any existing one.
    pub fn generate(&mut self) -> Result<Entity, StageError> {
        if let Some(old) = self.map.take() {
            self.reset_paths();
            self.stage.dispose_tree(old)?;
            self.robots.clear();
        }
        let (map, _) = generate_map(&mut self.stage, &self.config.map, &mut self.rng)?;
        self.map = Some(map);
        Ok(map)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn map(&self) -> Option<Entity> {
        self.map
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Settle every outstanding path request as cancelled and start over.
    fn reset_paths(&mut self) {
        self.paths.cancel_all();
        self.paths = PathScheduler::new();
        self.pursuits = Pursuits::new();
    }

    fn require_map(&self) -> Result<Entity, StageError> {
        self.map
            .ok_or_else(|| StageError::PreconditionViolation("no map has been generated".to_string()))
    }

    /// Run one tick.
    ///
    /// Order: queued path searches, then every node under the map in
    /// pre-order, then cosmetic effects, then reaping of faded nodes.
    pub fn update(&mut self) {
        self.paths.run_pending(&self.stage);

        if let Some(map) = self.map {
            for node in self.stage.walk(map) {
                if !self.stage.is_alive(node) {
                    continue;
                }
                if let Err(e) = self.update_node(node) {
                    log::warn!("Update of {:?} failed: {}", node, e);
                }
            }
        }

        self.stage
            .age_presentations(Duration::from_millis(self.config.tick_interval_ms));
        self.stage.reap();
        self.tick_count += 1;
    }

    fn update_node(&mut self, node: Entity) -> Result<(), StageError> {
        match self.stage.kind(node) {
            Some(NodeKind::Building(BuildingKind::ResourceMiner)) => {
                if let Some(production) = update_miner(&mut self.stage, node) {
                    self.inventory.add_item(&production.item, production.count);
                    self.emit(StageEvent::ProduceResource {
                        source: production.source,
                        item: production.item,
                        count: production.count,
                    });
                }
            }
            Some(NodeKind::Actor(kind)) => {
                if is_defeated(&self.stage, node) {
                    return self.dispose(node);
                }
                if kind == ActorKind::Robot {
                    drain_robot(&mut self.stage, node);
                }
                if kind.is_enemy() {
                    self.pursuits.advance(&mut self.stage, &mut self.paths, node)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    // ── Events ─────────────────────────────────────────────────────────

    /// Publish an event. Enemy spawn requests are carried out before
    /// listeners hear about them; messages are also kept in the log.
    pub fn emit(&mut self, event: StageEvent) {
        match &event {
            StageEvent::SpawnEnemy { position } => {
                if let Err(e) = self.spawn_enemy(*position) {
                    log::warn!("Could not spawn enemy at {}: {}", position, e);
                }
            }
            StageEvent::Message(message) => self.messages.push(message.clone()),
            _ => {}
        }
        self.bus.emit(&event);
    }

    fn push_message(&mut self, message: Message) {
        self.emit(StageEvent::Message(message));
    }

    // ── Spawning and placement ─────────────────────────────────────────

    /// Spawn a random enemy at `position`.
    pub fn spawn_enemy(&mut self, position: Vector) -> Result<Entity, StageError> {
        let kind = if self.rng.gen::<f64>() > DIRECT_ATTACKER_THRESHOLD {
            ActorKind::EnemyDirectAttacker
        } else {
            ActorKind::EnemyEngineer
        };
        self.spawn_enemy_kind(kind, position)
    }

    pub fn spawn_enemy_kind(&mut self, kind: ActorKind, position: Vector) -> Result<Entity, StageError> {
        let map = self.require_map()?;
        self.chunk_at(position)?;
        let enemy = prefabs::enemy(&mut self.stage, kind, position, self.config.enemy_step_interval);
        self.stage.add_child(map, enemy)?;
        log::debug!("Spawned {} at {}", NodeKind::Actor(kind).tag(), position);
        Ok(enemy)
    }

    pub fn spawn_robot(&mut self, name: &str, position: Vector) -> Result<Entity, StageError> {
        let map = self.require_map()?;
        if self.robots.contains_key(name) {
            return Err(StageError::PreconditionViolation(format!(
                "a robot named {} already exists",
                name
            )));
        }
        self.chunk_at(position)?;
        let robot = prefabs::robot(&mut self.stage, name, position, self.config.robot_battery);
        self.stage.add_child(map, robot)?;
        self.robots.insert(name.to_string(), robot);
        Ok(robot)
    }

    pub fn robot(&self, name: &str) -> Option<Entity> {
        self.robots.get(name).copied()
    }

    /// The chunk under `cell`. Absent positions and cells off the grid are
    /// out of bounds.
    fn chunk_at(&self, cell: Vector) -> Result<Entity, StageError> {
        let map = self.require_map()?;
        if cell.is_empty() {
            return Err(StageError::OutOfBounds(cell));
        }
        self.stage
            .get_chunk(map, cell)
            .map(|c| c.entity())
            .ok_or(StageError::OutOfBounds(cell))
    }

    /// Put a terrain feature on a cell, replacing the previous one.
    pub fn place_terrain(&mut self, cell: Vector, kind: TerrainKind) -> Result<Entity, StageError> {
        let chunk = self.chunk_at(cell)?;
        let resource = self.config.map.resource.clone();
        let terrain = prefabs::terrain(&mut self.stage, kind, &resource);
        if let Some(previous) = self.stage.set_child(chunk, TERRAIN_SLOT, terrain)? {
            self.announce_disposal(previous);
        }
        Ok(terrain)
    }

    /// Build a miner on a cell. The building slot must be free.
    pub fn place_miner(&mut self, cell: Vector, level: u32) -> Result<Entity, StageError> {
        let chunk = self.chunk_at(cell)?;
        if self
            .stage
            .chunk(chunk)
            .and_then(|c| c.occupant(BUILDING_SLOT))
            .is_some()
        {
            return Err(StageError::SlotOccupied {
                chunk,
                slot: BUILDING_SLOT,
            });
        }
        let miner = prefabs::miner(&mut self.stage, level);
        self.stage.set_child(chunk, BUILDING_SLOT, miner)?;
        if !miner_is_valid(&self.stage, miner) {
            log::warn!("Miner placed at {} is not on a resource point", cell);
        }
        Ok(miner)
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Dispose a node, cancelling its path requests.
    pub fn dispose(&mut self, entity: Entity) -> Result<(), StageError> {
        if !self.stage.is_alive(entity) {
            return Ok(());
        }
        self.paths.cancel_for(entity);
        self.pursuits.forget(entity);
        self.robots.retain(|_, e| *e != entity);
        self.stage.dispose(entity)?;
        self.announce_disposal(entity);
        Ok(())
    }

    fn announce_disposal(&mut self, entity: Entity) {
        let (Some(id), Some(kind)) = (self.stage.object_id(entity), self.stage.kind(entity)) else {
            return;
        };
        self.emit(StageEvent::NodeDisposed { entity, id, kind });
    }

    // ── Actor operations ───────────────────────────────────────────────

    pub fn move_entity(&mut self, entity: Entity, direction: Vector) -> Result<bool, StageError> {
        move_entity(&mut self.stage, entity, direction)
    }

    pub fn take_damage(&mut self, entity: Entity, amount: f64) -> Result<f64, StageError> {
        take_damage(&mut self.stage, entity, amount)
    }

    /// Path from `entity` to the nearest of `targets`, avoiding impassable chunks.
    pub fn lookup_path(&mut self, entity: Entity, targets: Vec<Vector>) -> PathRequest {
        self.lookup_path_with(entity, targets, blocks_movement)
    }

    /// Path search with a custom blocking rule.
    pub fn lookup_path_with(
        &mut self,
        entity: Entity,
        targets: Vec<Vector>,
        validator: impl Fn(Option<ChunkRef<'_>>) -> bool + 'static,
    ) -> PathRequest {
        let mode = if self.config.inline_search {
            SearchMode::Inline
        } else {
            SearchMode::Queued
        };
        self.paths.request(&self.stage, entity, targets, validator, mode)
    }

    /// Ask a robot to do something. An empty battery refuses the task with
    /// a warning message.
    pub fn execute_task(&mut self, robot: Entity, task: RobotTask) -> Result<bool, StageError> {
        if !self.stage.is_alive(robot) {
            return Err(StageError::Disposed(robot));
        }
        if let Err(message) = before_execute_task(&self.stage, robot) {
            self.push_message(message);
            return Ok(false);
        }
        match task {
            RobotTask::Move(direction) => move_entity(&mut self.stage, robot, direction.vector()),
            RobotTask::Wait => Ok(true),
        }
    }

    // ── UI hooks ───────────────────────────────────────────────────────

    /// Build a node's action popup and publish it.
    pub fn open_actions(&mut self, entity: Entity) -> Option<PopupOptions> {
        let options = render_actions(&self.stage, entity)?;
        self.emit(StageEvent::ShowActions(options.clone()));
        Some(options)
    }

    /// Run a popup callback. Returns false when the node does not offer it.
    pub fn perform_action(&mut self, entity: Entity, action: ActionKind) -> Result<bool, StageError> {
        let offered = render_actions(&self.stage, entity).map_or(false, |o| o.has_action(action));
        if !offered {
            return Ok(false);
        }
        match action {
            ActionKind::Destroy => {
                let cell = self.stage.world_position(entity);
                self.dispose(entity)?;
                if let Some(cell) = cell {
                    log::debug!("Destroyed {:?} at {}", entity, cell);
                }
            }
        }
        Ok(true)
    }

    pub fn render(&self) -> Option<RenderFrame> {
        self.map.map(|map| render_frame(&self.stage, map))
    }

    // ── Persistence ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Result<persistence::SaveData, SaveError> {
        let map = self.map.ok_or(SaveError::MissingMap)?;
        persistence::snapshot(&self.stage, map, &self.inventory, self.tick_count)
    }

    /// Save the stage to a writer (bincode)
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::write_binary(writer, &self.snapshot()?)
    }

    /// Load the stage from a reader (bincode)
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let data = persistence::read_binary(reader)?;
        self.apply(data)
    }

    pub fn save_json(&self) -> Result<String, SaveError> {
        persistence::to_json(&self.snapshot()?)
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), SaveError> {
        let data = persistence::from_json(json)?;
        self.apply(data)
    }

    fn apply(&mut self, data: persistence::SaveData) -> Result<(), SaveError> {
        let restored = persistence::restore(data)?;
        self.reset_paths();
        self.stage = restored.stage;
        self.map = Some(restored.map);
        self.robots = restored.robots;
        self.inventory = restored.inventory;
        self.tick_count = restored.tick;
        Ok(())
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::events::Channel;
    use codingland_logic::constants::RESOURCE_WOOD;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn blank(width: u32, height: u32) -> SimulationEngine {
        let config = EngineConfig::default()
            .with_seed(7)
            .with_map(MapConfig::blank(width, height));
        let mut engine = SimulationEngine::new(config);
        engine.generate().unwrap();
        engine
    }

    #[test]
    fn test_engine_generation() {
        let mut engine = SimulationEngine::new(EngineConfig::default().with_seed(1));
        let map = engine.generate().unwrap();
        assert_eq!(engine.stage.map_size(map), Some(Vector::new(8.0, 5.0)));
        assert_eq!(engine.stage.children(map).len(), 40);
    }

    #[test]
    fn test_engine_update_counts_ticks() {
        let mut engine = blank(2, 2);
        for _ in 0..5 {
            engine.update();
        }
        assert_eq!(engine.tick_count(), 5);
    }

    #[test]
    fn test_miner_fills_inventory_and_emits() {
        let mut engine = blank(2, 1);
        engine.place_terrain(Vector::ZERO, TerrainKind::ResourcePoint).unwrap();
        engine.place_miner(Vector::ZERO, 1).unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        engine.bus.add_listener(Channel::ProduceResource, move |event| {
            if let StageEvent::ProduceResource { item, count, .. } = event {
                sink.borrow_mut().push((item.clone(), *count));
            }
        });

        for _ in 0..30 {
            engine.update();
        }
        assert_eq!(*events.borrow(), vec![(RESOURCE_WOOD.to_string(), 10)]);
        assert_eq!(engine.inventory.count(RESOURCE_WOOD), 10);
    }

    #[test]
    fn test_place_miner_requires_free_slot() {
        let mut engine = blank(1, 1);
        let first = engine.place_miner(Vector::ZERO, 1).unwrap();
        assert!(matches!(
            engine.place_miner(Vector::ZERO, 1),
            Err(StageError::SlotOccupied { slot: 1, .. })
        ));
        assert!(engine.perform_action(first, ActionKind::Destroy).unwrap());
        assert!(engine.place_miner(Vector::ZERO, 1).is_ok());
    }

    #[test]
    fn test_defeated_actor_disposed_on_update() {
        let mut engine = blank(2, 2);
        let enemy = engine
            .spawn_enemy_kind(ActorKind::EnemyDirectAttacker, Vector::ZERO)
            .unwrap();
        engine.take_damage(enemy, 150.0).unwrap();
        engine.update();
        assert!(!engine.stage.is_alive(enemy));
    }

    #[test]
    fn test_spawn_event_adds_enemy() {
        let mut engine = blank(3, 3);
        let map = engine.map().unwrap();
        engine.emit(StageEvent::SpawnEnemy {
            position: Vector::new(1.0, 1.0),
        });
        let spawned = engine.stage.get_entities(map, Vector::new(1.0, 1.0));
        assert_eq!(spawned.len(), 1);
        assert!(engine.stage.kind(spawned[0]).unwrap().actor().unwrap().is_enemy());
    }

    #[test]
    fn test_spawns_off_the_grid_are_refused() {
        let mut engine = blank(3, 3);
        let map = engine.map().unwrap();
        let before = engine.stage.children(map).len();

        let off = Vector::new(-1.0, 1.0);
        assert_eq!(
            engine.spawn_enemy_kind(ActorKind::EnemyEngineer, off),
            Err(StageError::OutOfBounds(off))
        );
        assert!(matches!(
            engine.spawn_robot("stray", Vector::new(3.0, 0.0)),
            Err(StageError::OutOfBounds(_))
        ));
        assert!(matches!(
            engine.spawn_robot("nowhere", Vector::NULL),
            Err(StageError::OutOfBounds(_))
        ));
        engine.emit(StageEvent::SpawnEnemy { position: off });

        assert_eq!(engine.stage.children(map).len(), before);
        assert_eq!(engine.robot("stray"), None);
    }

    #[test]
    fn test_robot_battery_gate() {
        let mut config = EngineConfig::default()
            .with_seed(3)
            .with_map(MapConfig::blank(3, 1));
        config.robot_battery = 2;
        let mut engine = SimulationEngine::new(config);
        engine.generate().unwrap();
        let robot = engine.spawn_robot("rover", Vector::ZERO).unwrap();

        assert!(engine.execute_task(robot, RobotTask::Move(Direction::Right)).unwrap());
        engine.update();
        engine.update();
        assert!(!engine.execute_task(robot, RobotTask::Wait).unwrap());
        assert_eq!(
            engine.messages.last().map(|m| m.text.as_str()),
            Some("Robot rover has run out of battery and cannot perform tasks")
        );
        assert_eq!(engine.stage.position(robot), Some(Vector::new(1.0, 0.0)));
    }

    #[test]
    fn test_dispose_cancels_queued_paths() {
        let mut engine = blank(3, 3);
        let robot = engine.spawn_robot("rover", Vector::ZERO).unwrap();
        let request = engine.lookup_path(robot, vec![Vector::new(2.0, 2.0)]);
        assert!(request.is_pending());

        engine.dispose(robot).unwrap();
        assert_eq!(
            request.try_result(),
            Some(Err(crate::error::PathError::Cancelled))
        );
        assert_eq!(engine.robot("rover"), None);
        assert!(engine.move_entity(robot, Vector::new(1.0, 0.0)).is_err());
    }

    #[test]
    fn test_queued_path_settles_next_tick() {
        let mut engine = blank(3, 3);
        let robot = engine.spawn_robot("rover", Vector::ZERO).unwrap();
        let request = engine.lookup_path(robot, vec![Vector::new(2.0, 0.0)]);
        engine.update();
        let result = request.try_result().unwrap().unwrap();
        assert_eq!(result.steps(), 2);
    }

    #[test]
    fn test_open_actions_publishes_popup() {
        let mut engine = blank(1, 1);
        let miner = engine.place_miner(Vector::ZERO, 1).unwrap();
        let shown = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&shown);
        engine
            .bus
            .add_listener(Channel::ShowActions, move |_| *counter.borrow_mut() += 1);

        let options = engine.open_actions(miner).unwrap();
        assert_eq!(options.caller, miner);
        assert_eq!(*shown.borrow(), 1);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut engine = SimulationEngine::new(EngineConfig::default().with_seed(11));
        engine.generate().unwrap();
        engine.spawn_robot("digger", Vector::new(1.0, 1.0)).unwrap();
        engine.inventory.add_item(RESOURCE_WOOD, 4);
        for _ in 0..3 {
            engine.update();
        }

        let mut buffer = Vec::new();
        engine.save(&mut buffer).unwrap();

        let mut loaded = SimulationEngine::default();
        loaded.load(&buffer[..]).unwrap();
        assert_eq!(loaded.tick_count(), 3);
        assert_eq!(loaded.inventory.count(RESOURCE_WOOD), 4);
        let robot = loaded.robot("digger").unwrap();
        let battery = *loaded.stage.world.get::<&Battery>(robot).unwrap();
        assert_eq!(battery.power, 1597);
        assert_eq!(loaded.snapshot().unwrap(), engine.snapshot().unwrap());
    }
}

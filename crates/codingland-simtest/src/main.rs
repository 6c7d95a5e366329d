//! CodingLand Headless Simulation Harness
//!
//! Drives the stage engine through scripted scenarios without a renderer.
//! Runs entirely in-process: no DOM, no timers, no networking.
//!
//! Usage:
//!   cargo run -p codingland-simtest
//!   cargo run -p codingland-simtest -- --verbose
//!
//! Set `RUST_LOG=debug` to see engine logging.

use codingland_core::actions::ActionKind;
use codingland_core::components::{ActorKind, Lifecycle, TerrainKind};
use codingland_core::config::{EngineConfig, MapConfig};
use codingland_core::engine::{RobotTask, SimulationEngine};
use codingland_core::events::{Channel, StageEvent};
use codingland_core::systems::base_targets;
use codingland_logic::constants::{BUILDING_SLOT, RESOURCE_WOOD, TERRAIN_SLOT};
use codingland_logic::pathfinding::lookup_path;
use codingland_logic::{Direction, Vector};
use std::cell::RefCell;
use std::rc::Rc;

// ── Scenario configuration (same JSON a game session would load) ────────
const SCENARIO_JSON: &str = include_str!("../../../data/scenario.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    env_logger::init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== CodingLand Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Scenario config and map generation
    results.extend(validate_generation(verbose));

    // 2. BFS pathfinding on synthetic grids
    results.extend(validate_pathfinding(verbose));

    // 3. Scene tree lifecycle
    results.extend(validate_scene_tree(verbose));

    // 4. Miner production cycle
    results.extend(validate_production(verbose));

    // 5. Robot battery
    results.extend(validate_robots(verbose));

    // 6. Enemy pursuit
    results.extend(validate_pursuit(verbose));

    // 7. Save / load
    results.extend(validate_persistence(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn blank_engine(width: u32, height: u32) -> Option<SimulationEngine> {
    let config = EngineConfig::default()
        .with_seed(1)
        .with_map(MapConfig::blank(width, height));
    let mut engine = SimulationEngine::new(config);
    engine.generate().ok()?;
    Some(engine)
}

// ── 1. Generation ───────────────────────────────────────────────────────

fn validate_generation(verbose: bool) -> Vec<TestResult> {
    println!("--- Map Generation ---");
    let mut results = Vec::new();

    let config = match EngineConfig::from_json(SCENARIO_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(check("scenario_parse", false, format!("JSON parse error: {}", e)));
            return results;
        }
    };
    results.push(check(
        "scenario_parse",
        config.seed.is_some(),
        format!("{}x{} map, seed {:?}", config.map.width, config.map.height, config.seed),
    ));

    let mut engine = SimulationEngine::new(config.clone());
    let map = match engine.generate() {
        Ok(m) => m,
        Err(e) => {
            results.push(check("map_generate", false, e.to_string()));
            return results;
        }
    };

    let cells = (config.map.width * config.map.height) as usize;
    let chunks = engine.stage.children(map).len();
    results.push(check(
        "map_chunk_count",
        chunks == cells,
        format!("{} chunks for {} cells", chunks, cells),
    ));

    let entrances = engine
        .stage
        .lookup_chunk(map, |c| c.terrain() == Some(TerrainKind::Entrance))
        .iter()
        .map(|c| c.position())
        .collect::<Vec<_>>();
    let bases = base_targets(&engine.stage, map);
    results.push(check(
        "landmarks_placed",
        entrances.len() == 1 && bases.len() == 1 && entrances[0] != bases[0],
        format!("entrances {:?}, bases {:?}", entrances, bases),
    ));

    let walls = engine
        .stage
        .lookup_chunk(map, |c| c.terrain() == Some(TerrainKind::Wall))
        .len();
    let resources = engine
        .stage
        .lookup_chunk(map, |c| c.terrain() == Some(TerrainKind::ResourcePoint))
        .len();
    if verbose {
        println!("    {} walls, {} resource points", walls, resources);
    }

    let mut twin = SimulationEngine::new(config);
    let same = match (twin.generate(), engine.save_json()) {
        (Ok(_), Ok(first)) => twin.save_json().map(|second| first == second).unwrap_or(false),
        _ => false,
    };
    results.push(check(
        "seed_determinism",
        same,
        "two engines with one seed produce identical saves",
    ));

    results
}

// ── 2. Pathfinding ──────────────────────────────────────────────────────

fn validate_pathfinding(verbose: bool) -> Vec<TestResult> {
    println!("--- Pathfinding ---");
    let mut results = Vec::new();

    let size = Vector::new(5.0, 5.0);
    let open = lookup_path(size, Vector::ZERO, &[Vector::new(4.0, 4.0)], |_| false);
    results.push(check(
        "open_grid_shortest",
        open.success && open.steps() == 8,
        format!("{} steps, {} expanded", open.steps(), open.stats.expanded),
    ));

    let origin = lookup_path(size, Vector::new(2.0, 2.0), &[Vector::new(2.0, 2.0)], |_| true);
    results.push(check(
        "start_on_target",
        origin.is_at_target() && origin.next_direction == Vector::ZERO,
        format!("next {}, direction {}", origin.next, origin.next_direction),
    ));

    // Target in the middle of a 3x3 ring of walls.
    let ring = |cell: Vector| {
        let (x, y) = cell.extract();
        (1.0..=3.0).contains(&x) && (1.0..=3.0).contains(&y) && cell != Vector::new(2.0, 2.0)
    };
    let enclosed = lookup_path(size, Vector::ZERO, &[Vector::new(2.0, 2.0)], ring);
    results.push(check(
        "enclosed_target_fails",
        !enclosed.success && enclosed.next.is_empty() && enclosed.history.is_empty(),
        format!("success {}, expanded {}", enclosed.success, enclosed.stats.expanded),
    ));

    let nearest = lookup_path(
        size,
        Vector::ZERO,
        &[Vector::new(4.0, 0.0), Vector::new(0.0, 2.0)],
        |_| false,
    );
    results.push(check(
        "nearest_of_many",
        nearest.history.last() == Some(&Vector::new(0.0, 2.0)),
        format!("reached {:?}", nearest.history.last()),
    ));

    if let Some(mut engine) = blank_engine(4, 4) {
        let robot = engine.spawn_robot("scout", Vector::ZERO).ok();
        if let Some(robot) = robot {
            let request = engine.lookup_path(robot, vec![Vector::new(3.0, 3.0)]);
            let pending = request.is_pending();
            engine.update();
            let steps = request
                .try_result()
                .and_then(|r| r.ok())
                .map(|r| r.steps());
            if verbose {
                println!("    queued search resolved with {:?} steps", steps);
            }
            results.push(check(
                "queued_search_next_tick",
                pending && steps == Some(6),
                format!("pending before tick {}, steps {:?}", pending, steps),
            ));
        }
    }

    results
}

// ── 3. Scene tree ───────────────────────────────────────────────────────

fn validate_scene_tree(verbose: bool) -> Vec<TestResult> {
    println!("--- Scene Tree ---");
    let mut results = Vec::new();

    let Some(mut engine) = blank_engine(2, 2) else {
        results.push(check("scene_setup", false, "blank map failed"));
        return results;
    };
    let Some(map) = engine.map() else {
        return results;
    };

    let disposed = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&disposed);
    engine.bus.add_listener(Channel::NodeDisposed, move |_| {
        *counter.borrow_mut() += 1;
    });

    let setup = engine
        .place_terrain(Vector::ZERO, TerrainKind::ResourcePoint)
        .and_then(|terrain| Ok((terrain, engine.place_miner(Vector::ZERO, 1)?)));
    let (terrain, miner) = match setup {
        Ok(pair) => pair,
        Err(e) => {
            results.push(check("scene_setup", false, e.to_string()));
            return results;
        }
    };

    let chunk = engine.stage.parent(miner);
    results.push(check(
        "chunk_depths",
        engine.stage.depth(map) == Some(0)
            && chunk.and_then(|c| engine.stage.depth(c)) == Some(1)
            && engine.stage.depth(miner) == Some(2),
        format!("miner depth {:?}", engine.stage.depth(miner)),
    ));

    let _ = engine.dispose(terrain);
    let slots = chunk.map(|c| {
        (
            engine.stage.child_at(c, TERRAIN_SLOT),
            engine.stage.child_at(c, BUILDING_SLOT),
        )
    });
    results.push(check(
        "building_slot_stable",
        slots == Some((None, Some(miner))),
        format!("slots after terrain dispose {:?}", slots),
    ));

    let destroyed = engine.perform_action(miner, ActionKind::Destroy).unwrap_or(false);
    results.push(check(
        "destroy_action",
        destroyed && engine.stage.state(miner) == Some(Lifecycle::Disposed),
        format!("state {:?}", engine.stage.state(miner)),
    ));

    let double = engine.dispose(miner).is_ok();
    results.push(check(
        "dispose_idempotent",
        double && *disposed.borrow() == 2,
        format!("{} disposal events", disposed.borrow()),
    ));

    // Fade-out lasts 100ms, one tick.
    engine.update();
    engine.update();
    let reaped = !engine.stage.contains(miner) && !engine.stage.contains(terrain);
    if verbose {
        println!("    {} nodes left after reaping", engine.stage.len());
    }
    results.push(check(
        "faded_nodes_reaped",
        reaped,
        format!("{} nodes on stage", engine.stage.len()),
    ));

    results
}

// ── 4. Production ───────────────────────────────────────────────────────

fn validate_production(verbose: bool) -> Vec<TestResult> {
    println!("--- Miner Production ---");
    let mut results = Vec::new();

    for (level, ticks, expected) in [(1u32, 30u32, 10u32), (1, 29, 0), (3, 56, 28)] {
        let Some(mut engine) = blank_engine(1, 1) else {
            continue;
        };
        let placed = engine
            .place_terrain(Vector::ZERO, TerrainKind::ResourcePoint)
            .and_then(|_| engine.place_miner(Vector::ZERO, level));
        if let Err(e) = placed {
            results.push(check("miner_setup", false, e.to_string()));
            continue;
        }

        let events = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&events);
        engine.bus.add_listener(Channel::ProduceResource, move |event| {
            if let StageEvent::ProduceResource { .. } = event {
                *sink.borrow_mut() += 1;
            }
        });

        for _ in 0..ticks {
            engine.update();
        }
        let wood = engine.inventory.count(RESOURCE_WOOD);
        if verbose {
            println!("    level {} after {} ticks: {} wood, {} events", level, ticks, wood, events.borrow());
        }
        results.push(check(
            &format!("miner_l{}_{}_ticks", level, ticks),
            wood == expected,
            format!("{} wood (expected {})", wood, expected),
        ));
    }

    // A miner off a resource point produces nothing.
    if let Some(mut engine) = blank_engine(1, 1) {
        if engine.place_miner(Vector::ZERO, 1).is_ok() {
            for _ in 0..60 {
                engine.update();
            }
            results.push(check(
                "miner_without_resource",
                engine.inventory.is_empty(),
                format!("{} wood", engine.inventory.count(RESOURCE_WOOD)),
            ));
        }
    }

    results
}

// ── 5. Robots ───────────────────────────────────────────────────────────

fn validate_robots(verbose: bool) -> Vec<TestResult> {
    println!("--- Robots ---");
    let mut results = Vec::new();

    let config = EngineConfig {
        robot_battery: 3,
        ..EngineConfig::default()
            .with_seed(5)
            .with_map(MapConfig::blank(3, 1))
    };
    let mut engine = SimulationEngine::new(config);
    if engine.generate().is_err() {
        results.push(check("robot_setup", false, "blank map failed"));
        return results;
    }
    let Ok(robot) = engine.spawn_robot("rover", Vector::ZERO) else {
        results.push(check("robot_setup", false, "spawn failed"));
        return results;
    };

    let moved = engine.execute_task(robot, RobotTask::Move(Direction::Right));
    results.push(check(
        "robot_moves",
        matches!(moved, Ok(true)) && engine.stage.position(robot) == Some(Vector::new(1.0, 0.0)),
        format!("position {:?}", engine.stage.position(robot)),
    ));

    let blocked = engine.execute_task(robot, RobotTask::Move(Direction::Down));
    results.push(check(
        "robot_bounces_off_edge",
        matches!(blocked, Ok(false)) && engine.stage.position(robot) == Some(Vector::new(1.0, 0.0)),
        format!("result {:?}", blocked),
    ));

    for _ in 0..3 {
        engine.update();
    }
    let refused = engine.execute_task(robot, RobotTask::Wait);
    let warning = engine.messages.last().map(|m| m.text.clone()).unwrap_or_default();
    if verbose {
        println!("    last message: {}", warning);
    }
    results.push(check(
        "empty_battery_refuses",
        matches!(refused, Ok(false)) && warning.contains("run out of battery"),
        warning,
    ));

    let popup = engine.open_actions(robot);
    results.push(check(
        "robot_popup_title",
        popup.as_ref().map(|p| p.title.as_str()) == Some("rover"),
        format!("{:?}", popup.map(|p| p.title)),
    ));

    results
}

// ── 6. Pursuit ──────────────────────────────────────────────────────────

fn validate_pursuit(verbose: bool) -> Vec<TestResult> {
    println!("--- Enemy Pursuit ---");
    let mut results = Vec::new();

    let config = EngineConfig {
        enemy_step_interval: 1,
        ..EngineConfig::default()
            .with_seed(9)
            .with_map(MapConfig::blank(5, 1))
    };
    let mut engine = SimulationEngine::new(config);
    let setup = engine
        .generate()
        .and_then(|_| engine.place_terrain(Vector::new(4.0, 0.0), TerrainKind::Base))
        .and_then(|_| engine.spawn_enemy_kind(ActorKind::EnemyDirectAttacker, Vector::ZERO));
    let enemy = match setup {
        Ok(e) => e,
        Err(e) => {
            results.push(check("pursuit_setup", false, e.to_string()));
            return results;
        }
    };

    let mut arrival = None;
    for tick in 1..=10u32 {
        engine.update();
        if verbose {
            println!("    tick {}: enemy at {:?}", tick, engine.stage.position(enemy));
        }
        if arrival.is_none() && engine.stage.position(enemy) == Some(Vector::new(4.0, 0.0)) {
            arrival = Some(tick);
        }
    }
    // One tick to queue the first search, then one cell per tick.
    results.push(check(
        "enemy_reaches_base",
        arrival == Some(5),
        format!("arrived on tick {:?}", arrival),
    ));

    let health = engine.take_damage(enemy, 500.0);
    engine.update();
    results.push(check(
        "defeated_enemy_disposed",
        health.is_ok() && !engine.stage.is_alive(enemy),
        format!("state {:?}", engine.stage.state(enemy)),
    ));

    results
}

// ── 7. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(verbose: bool) -> Vec<TestResult> {
    println!("--- Save / Load ---");
    let mut results = Vec::new();

    let config = match EngineConfig::from_json(SCENARIO_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(check("persistence_setup", false, e.to_string()));
            return results;
        }
    };
    let mut engine = SimulationEngine::new(config);
    if engine.generate().is_err() || engine.spawn_robot("digger", Vector::new(1.0, 1.0)).is_err() {
        results.push(check("persistence_setup", false, "engine setup failed"));
        return results;
    }
    engine.inventory.add_item(RESOURCE_WOOD, 12);
    for _ in 0..7 {
        engine.update();
    }

    match engine.save_json() {
        Ok(json) => {
            if verbose {
                println!("    JSON save is {} bytes", json.len());
            }
            let mut loaded = SimulationEngine::default();
            let restored = loaded.load_json(&json);
            let same = restored.is_ok() && loaded.save_json().ok().as_deref() == Some(json.as_str());
            results.push(check(
                "json_round_trip",
                same && loaded.tick_count() == 7 && loaded.robot("digger").is_some(),
                format!("tick {}, wood {}", loaded.tick_count(), loaded.inventory.count(RESOURCE_WOOD)),
            ));
        }
        Err(e) => results.push(check("json_round_trip", false, e.to_string())),
    }

    let mut buffer = Vec::new();
    match engine.save(&mut buffer) {
        Ok(()) => {
            if verbose {
                println!("    binary save is {} bytes", buffer.len());
            }
            let mut loaded = SimulationEngine::default();
            let ok = loaded.load(&buffer[..]).is_ok()
                && loaded.snapshot().ok() == engine.snapshot().ok()
                && loaded.inventory.count(RESOURCE_WOOD) == 12;
            results.push(check("binary_round_trip", ok, format!("{} bytes", buffer.len())));
        }
        Err(e) => results.push(check("binary_round_trip", false, e.to_string())),
    }

    let mut garbage = SimulationEngine::default();
    results.push(check(
        "rejects_garbage",
        garbage.load_json("{\"version\": 99}").is_err(),
        "malformed save refused",
    ));

    results
}

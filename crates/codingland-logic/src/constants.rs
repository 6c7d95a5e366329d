//! Shared constants for the stage: sizes, timings and identifiers.

/// Rendered edge length of one map chunk, in pixels.
pub const CHUNK_SIZE_PX: f64 = 96.0;

/// Map size used when a configuration does not provide one.
pub const DEFAULT_MAP_WIDTH: u32 = 8;
pub const DEFAULT_MAP_HEIGHT: u32 = 5;

/// Interval between engine ticks.
pub const TICK_INTERVAL_MS: u64 = 100;

// ── Slots ───────────────────────────────────────────────────────────────

/// Chunk child slot holding the terrain feature (resource, wall, entrance, base).
pub const TERRAIN_SLOT: usize = 0;
/// Chunk child slot holding a building.
pub const BUILDING_SLOT: usize = 1;

// ── Actors ──────────────────────────────────────────────────────────────

pub const ENTITY_MAX_HEALTH: f64 = 100.0;
/// Entity diameter relative to a chunk.
pub const ENTITY_SCALE: f64 = 0.5;
pub const MINER_MAX_HEALTH: f64 = 20.0;

/// Ticks between enemy steps (engineers take twice as long).
pub const ENEMY_STEP_INTERVAL: u32 = 5;

// ── Cosmetic effect durations ───────────────────────────────────────────

/// Half-step nudge shown when a move is refused.
pub const BOUNCE_MS: u64 = 50;
/// Fade before a disposed node's presentation is released.
pub const FADE_OUT_MS: u64 = 100;
/// Highlight after taking damage.
pub const UNDER_ATTACK_MS: u64 = 250;

// ── Resources ───────────────────────────────────────────────────────────

pub const RESOURCE_WOOD: &str = "codingland.wood";

/// Generation odds: a wall when a roll exceeds this.
pub const WALL_THRESHOLD: f64 = 0.75;
/// Generation odds: otherwise a resource point when a second roll exceeds this.
pub const RESOURCE_THRESHOLD: f64 = 0.45;
/// Spawned enemies are direct attackers when a roll exceeds this.
pub const DIRECT_ATTACKER_THRESHOLD: f64 = 0.6;

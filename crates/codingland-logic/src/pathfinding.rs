//! Breadth-first pathfinding over the tile grid.
//!
//! The search expands four-way from the start cell and stops at the first
//! frontier task whose cell matches any target, so the returned path is the
//! shortest in move count. Ties between equally distant targets resolve in
//! [`Direction::CARDINAL`] order (Up, Down, Left, Right).
//!
//! The grid itself is opaque here: callers pass a `blocks` predicate that
//! says whether a cell may not be entered (walls, out-of-bounds, ...).

use serde::{Deserialize, Serialize};

use crate::queue::StageQueue;
use crate::vector::{Direction, Vector};

/// One BFS frontier record. `parent` indexes the task that reached it;
/// the root (search origin) has none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTask {
    pub position: Vector,
    pub direction: Option<Direction>,
    pub parent: Option<usize>,
}

/// Counters from a single search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Tasks popped from the frontier.
    pub expanded: usize,
    /// Tasks ever pushed, including the root.
    pub enqueued: usize,
    /// Largest frontier length observed.
    pub peak_frontier: usize,
}

/// Outcome of a path lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    /// Cell of the first step, or the start when already at a target.
    /// [`Vector::NULL`] on failure.
    pub next: Vector,
    /// Unit move toward `next`, [`Vector::ZERO`] when already at a target,
    /// [`Vector::NULL`] on failure.
    pub next_direction: Vector,
    /// Positions from start to target inclusive; empty on failure.
    pub history: Vec<Vector>,
    pub success: bool,
    #[serde(default)]
    pub stats: SearchStats,
}

impl LookupResult {
    pub fn failure(stats: SearchStats) -> Self {
        Self {
            next: Vector::NULL,
            next_direction: Vector::NULL,
            history: Vec::new(),
            success: false,
            stats,
        }
    }

    /// The start already matched a target.
    pub fn is_at_target(&self) -> bool {
        self.success && self.history.len() < 2
    }

    /// Number of moves along the path.
    pub fn steps(&self) -> usize {
        self.history.len().saturating_sub(1)
    }

    /// The direction to move next, if the path calls for a move.
    pub fn direction(&self) -> Option<Direction> {
        if !self.success || self.is_at_target() {
            return None;
        }
        Direction::from_vector(self.next_direction)
    }
}

/// Grid dimensions from a size vector; negative or absent axes become 0.
pub fn grid_dimensions(size: Vector) -> (usize, usize) {
    let (w, h) = size.floor().extract();
    (w.max(0.0) as usize, h.max(0.0) as usize)
}

/// Find the shortest four-way path from `start` to any of `targets`.
///
/// `blocks` receives each floored neighbor cell and returns true when the
/// cell cannot be entered. Targets and frontier cells are compared after
/// flooring. Each cell of the `size` grid is enqueued at most once.
pub fn lookup_path<F>(size: Vector, start: Vector, targets: &[Vector], mut blocks: F) -> LookupResult
where
    F: FnMut(Vector) -> bool,
{
    let (width, height) = grid_dimensions(size);
    let targets: Vec<Vector> = targets.iter().map(Vector::floor).collect();

    let mut visited = vec![false; width * height];
    let mut tasks: Vec<LookupTask> = Vec::with_capacity(width * height + 1);
    let mut frontier: StageQueue<usize> = StageQueue::with_capacity(width * height + 1);
    let mut stats = SearchStats::default();

    if let Some((x, y)) = start.cell() {
        if x < width && y < height {
            visited[y * width + x] = true;
        }
    }
    tasks.push(LookupTask {
        position: start,
        direction: None,
        parent: None,
    });
    frontier.push(0);
    stats.enqueued = 1;
    stats.peak_frontier = 1;

    while let Some(index) = frontier.shift() {
        stats.expanded += 1;
        let pin = tasks[index];
        let cell = pin.position.floor();

        if targets.iter().any(|t| *t == cell) {
            return backtrack(&tasks, index, start, stats);
        }

        if width == 0 || height == 0 {
            continue;
        }

        for choice in Direction::CARDINAL {
            let neighbor = pin.position.add(choice.vector()).floor();
            if blocks(neighbor) {
                continue;
            }

            // Clamp into the grid so the visited index is always valid.
            let clamped = neighbor.clamp_to(Vector::new((width - 1) as f64, (height - 1) as f64));
            let (x, y) = clamped.extract();
            let slot = y as usize * width + x as usize;
            if !visited[slot] {
                visited[slot] = true;
                tasks.push(LookupTask {
                    position: clamped,
                    direction: Some(choice),
                    parent: Some(index),
                });
                frontier.push(tasks.len() - 1);
                stats.enqueued += 1;
                stats.peak_frontier = stats.peak_frontier.max(frontier.size());
            }
        }
    }

    LookupResult::failure(stats)
}

/// Walk parent links from `found` back to the root and build the result.
fn backtrack(tasks: &[LookupTask], found: usize, start: Vector, stats: SearchStats) -> LookupResult {
    let mut chain = vec![found];
    let mut pointer = tasks[found].parent;
    while let Some(p) = pointer {
        chain.push(p);
        pointer = tasks[p].parent;
    }
    chain.reverse();

    let history: Vec<Vector> = chain.iter().map(|&i| tasks[i].position).collect();
    match chain.get(1) {
        Some(&second) => {
            let step = tasks[second];
            LookupResult {
                next: step.position,
                next_direction: step.direction.map(Direction::vector).unwrap_or(Vector::ZERO),
                history,
                success: true,
                stats,
            }
        }
        None => LookupResult {
            next: start,
            next_direction: Vector::ZERO,
            history,
            success: true,
            stats,
        },
    }
}

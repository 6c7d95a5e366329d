//! Components for terrain, buildings and actors with their own behavior.

use codingland_logic::production::{miner_cycle_ticks, miner_output};
use serde::{Deserialize, Serialize};

/// A terrain occupant that yields a resource to a miner above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSource {
    pub resource: String,
}

/// Resource miner production state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Miner {
    pub level: u32,
    /// Ticks until the next production attempt.
    pub countdown: u32,
}

impl Miner {
    pub fn new(level: u32) -> Self {
        let level = level.max(1);
        Self {
            level,
            countdown: miner_cycle_ticks(level),
        }
    }

    pub fn output_count(&self) -> u32 {
        miner_output(self.level)
    }

    pub fn max_countdown(&self) -> u32 {
        miner_cycle_ticks(self.level)
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(1)
    }
}

/// A scriptable, named robot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Robot {
    pub name: String,
    /// Player script. Stored for the sandbox, never executed here.
    pub script: String,
}

impl Robot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: "// Start your coding here.".to_string(),
        }
    }
}

/// Battery charge of a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battery {
    pub power: u32,
    pub capacity: u32,
}

impl Battery {
    pub fn full(capacity: u32) -> Self {
        Self {
            power: capacity,
            capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.power == 0
    }
}

/// Enemy pursuit pacing: a step is taken every `step_interval` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seeker {
    pub step_interval: u32,
    pub cooldown: u32,
}

impl Seeker {
    pub fn new(step_interval: u32) -> Self {
        let step_interval = step_interval.max(1);
        Self {
            step_interval,
            cooldown: step_interval,
        }
    }

    /// Count down one tick; true when a step is due (the cooldown restarts).
    pub fn tick(&mut self) -> bool {
        self.cooldown = self.cooldown.saturating_sub(1);
        if self.cooldown == 0 {
            self.cooldown = self.step_interval;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miner_levels() {
        let miner = Miner::new(3);
        assert_eq!(miner.output_count(), 14);
        assert_eq!(miner.max_countdown(), 28);
        assert_eq!(miner.countdown, 28);
        assert_eq!(Miner::new(0).level, 1);
    }

    #[test]
    fn test_seeker_paces_steps() {
        let mut seeker = Seeker::new(3);
        let due: Vec<bool> = (0..6).map(|_| seeker.tick()).collect();
        assert_eq!(due, vec![false, false, true, false, false, true]);
    }
}

//! Production and battery rules for stationary units and robots.

/// Resource produced per cycle by a miner: every level adds 2.
pub fn miner_output(level: u32) -> u32 {
    10 + level.saturating_sub(1) * 2
}

/// Cycle length in ticks: every level removes 1, down to a floor of 5.
pub fn miner_cycle_ticks(level: u32) -> u32 {
    30 - level.saturating_sub(1).min(25)
}

/// Battery charge a robot starts with (1 Wh per tick of activity).
pub const ROBOT_BATTERY_CAPACITY: u32 = 1600;

/// Charge used per tick while the battery is not empty.
pub const ROBOT_DRAIN_PER_TICK: u32 = 1;

/// Battery level after one tick of drain.
pub fn drain_battery(power: u32) -> u32 {
    power.saturating_sub(ROBOT_DRAIN_PER_TICK)
}

/// Countdown state of a production cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub remaining: u32,
}

impl Countdown {
    pub fn new(ticks: u32) -> Self {
        Self { remaining: ticks }
    }

    /// Advance one tick. Returns true when the cycle completes, in which case
    /// the countdown restarts at `cycle`.
    pub fn tick(&mut self, cycle: u32) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = cycle.max(1);
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
    fn output_scales_with_level() {
        assert_eq!(miner_output(1), 10);
        assert_eq!(miner_output(3), 14);
        assert_eq!(miner_output(0), 10);
    }

    #[test]
    fn cycle_shrinks_with_floor() {
        assert_eq!(miner_cycle_ticks(1), 30);
        assert_eq!(miner_cycle_ticks(3), 28);
        assert_eq!(miner_cycle_ticks(26), 5);
        assert_eq!(miner_cycle_ticks(100), 5);
    }

    #[test]
    fn countdown_completes_once_per_cycle() {
        let mut countdown = Countdown::new(miner_cycle_ticks(1));
        let completions = (0..30).filter(|_| countdown.tick(30)).count();
        assert_eq!(completions, 1);
        assert_eq!(countdown.remaining, 30);
        let completions = (0..60).filter(|_| countdown.tick(30)).count();
        assert_eq!(completions, 2);
    }

    #[test]
    fn battery_drains_to_zero() {
        assert_eq!(drain_battery(2), 1);
        assert_eq!(drain_battery(0), 0);
    }
}

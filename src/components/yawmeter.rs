//! Quadrature yaw decoding with a once-per-revolution reference.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering};

use crate::config::TICKS_PER_REV;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

const PHASE_A: u8 = 0b01;
const PHASE_B: u8 = 0b10;

fn levels(a: bool, b: bool) -> u8 {
    (a as u8) * PHASE_A | (b as u8) * PHASE_B
}

pub struct Yawmeter {
    ticks: AtomicI32,
    levels: AtomicU8,
    clockwise: AtomicBool,
    calibrated: AtomicBool,
    reference_armed: AtomicBool,
}

impl Yawmeter {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicI32::new(0),
            levels: AtomicU8::new(0),
            clockwise: AtomicBool::new(true),
            calibrated: AtomicBool::new(false),
            reference_armed: AtomicBool::new(true),
        }
    }

    /// Levels of both channels at power on, before any edge.
    pub fn init(&self, a: bool, b: bool) {
        self.levels.store(levels(a, b), Ordering::Relaxed);
    }

    /// Called on every edge of either channel with both current levels.
    ///
    /// Clockwise order is 00, 01, 11, 10. An event where neither level
    /// changed still counts, as clockwise.
    pub fn on_edge(&self, a: bool, b: bool) -> Direction {
        let previous = self.levels.swap(levels(a, b), Ordering::Relaxed);
        let direction = if previous & PHASE_A != levels(a, false) {
            if a == b { Direction::Clockwise } else { Direction::CounterClockwise }
        } else if previous & PHASE_B != levels(false, b) {
            if a != b { Direction::Clockwise } else { Direction::CounterClockwise }
        } else {
            trace!("Spurious yaw edge");
            Direction::Clockwise
        };
        let delta = match direction {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        };
        let step = |ticks: i32| Some((ticks + delta).rem_euclid(TICKS_PER_REV));
        self.ticks.fetch_update(Ordering::Release, Ordering::Relaxed, step).ok();
        self.clockwise.store(direction == Direction::Clockwise, Ordering::Relaxed);
        direction
    }

    /// Zeroes the count at the reference mark while armed.
    pub fn on_reference(&self) -> bool {
        if !self.reference_armed.load(Ordering::Acquire) {
            return false;
        }
        self.ticks.store(0, Ordering::Release);
        self.calibrated.store(true, Ordering::Release);
        debug!("Yaw reference reached");
        true
    }

    pub fn disarm_reference(&self) {
        self.reference_armed.store(false, Ordering::Release);
    }

    /// Forgets the reference and waits for the next pass.
    pub fn request_calibration(&self) {
        self.calibrated.store(false, Ordering::Release);
        self.reference_armed.store(true, Ordering::Release);
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated.load(Ordering::Acquire)
    }

    pub fn is_reference_armed(&self) -> bool {
        self.reference_armed.load(Ordering::Acquire)
    }

    pub fn ticks(&self) -> i32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Whole degrees in [0, 360).
    pub fn bearing(&self) -> u16 {
        (self.ticks() * 360 / TICKS_PER_REV) as u16
    }

    pub fn direction(&self) -> Direction {
        match self.clockwise.load(Ordering::Relaxed) {
            true => Direction::Clockwise,
            false => Direction::CounterClockwise,
        }
    }
}

impl Default for Yawmeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed shortest rotation from `current` to `reference` in degrees.
/// A half-turn difference resolves to +180.
pub fn angular_difference(reference: u16, current: u16) -> i32 {
    let difference = reference as i32 - current as i32;
    if difference < -180 {
        difference + 360
    } else if difference > 180 {
        difference - 360
    } else {
        difference
    }
}

mod test {
    #[cfg(test)]
    const CLOCKWISE: [(bool, bool); 4] =
        [(false, true), (true, true), (true, false), (false, false)];

    #[test]
    fn test_clockwise_revolution() {
        use pretty_assertions::assert_eq;

        use super::{Direction, Yawmeter};

        let yawmeter = Yawmeter::new();
        for (a, b) in CLOCKWISE {
            assert_eq!(yawmeter.on_edge(a, b), Direction::Clockwise);
        }
        assert_eq!(yawmeter.ticks(), 4);
        for _ in 1..112 {
            for (a, b) in CLOCKWISE {
                yawmeter.on_edge(a, b);
            }
        }
        assert_eq!(yawmeter.ticks(), 0);
        assert_eq!(yawmeter.bearing(), 0);
    }

    #[test]
    fn test_counter_clockwise_wraps() {
        use pretty_assertions::assert_eq;

        use super::{Direction, Yawmeter};

        let yawmeter = Yawmeter::new();
        assert_eq!(yawmeter.on_edge(true, false), Direction::CounterClockwise);
        assert_eq!(yawmeter.ticks(), 447);
        assert_eq!(yawmeter.bearing(), 359);
        assert_eq!(yawmeter.direction(), Direction::CounterClockwise);
    }

    #[test]
    fn test_spurious_edge() {
        use super::{Direction, Yawmeter};

        let yawmeter = Yawmeter::new();
        assert_eq!(yawmeter.on_edge(false, false), Direction::Clockwise);
        assert_eq!(yawmeter.ticks(), 1);
    }

    #[test]
    fn test_skipped_phase() {
        use super::{Direction, Yawmeter};

        let yawmeter = Yawmeter::new();
        // Both levels changed, decided by channel A alone
        assert_eq!(yawmeter.on_edge(true, true), Direction::Clockwise);
        assert_eq!(yawmeter.on_edge(false, false), Direction::Clockwise);
        yawmeter.on_edge(false, true);
        assert_eq!(yawmeter.on_edge(true, false), Direction::CounterClockwise);
        assert_eq!(yawmeter.ticks(), 2);
    }

    #[test]
    fn test_bearing() {
        use super::Yawmeter;

        let yawmeter = Yawmeter::new();
        for _ in 0..56 {
            for (a, b) in CLOCKWISE {
                yawmeter.on_edge(a, b);
            }
        }
        assert_eq!(yawmeter.ticks(), 224);
        assert_eq!(yawmeter.bearing(), 180);
        yawmeter.on_edge(false, true);
        // 225 * 360 / 448 = 180.8
        assert_eq!(yawmeter.bearing(), 180);
    }

    #[test]
    fn test_reference() {
        use super::Yawmeter;

        let yawmeter = Yawmeter::new();
        yawmeter.on_edge(false, true);
        yawmeter.on_edge(true, true);
        assert!(!yawmeter.is_calibrated());
        assert!(yawmeter.on_reference());
        assert_eq!(yawmeter.ticks(), 0);
        assert!(yawmeter.is_calibrated());

        yawmeter.disarm_reference();
        yawmeter.on_edge(true, false);
        assert!(!yawmeter.on_reference());
        assert_eq!(yawmeter.ticks(), 1);

        yawmeter.request_calibration();
        assert!(!yawmeter.is_calibrated());
        assert!(yawmeter.on_reference());
        assert_eq!(yawmeter.ticks(), 0);
    }

    #[test]
    fn test_angular_difference() {
        use super::angular_difference;

        assert_eq!(angular_difference(10, 350), 20);
        assert_eq!(angular_difference(350, 10), -20);
        assert_eq!(angular_difference(0, 180), -180);
        assert_eq!(angular_difference(180, 0), 180);
        assert_eq!(angular_difference(90, 90), 0);
        assert_eq!(angular_difference(0, 270), 90);
    }

    #[test]
    fn test_initial_levels() {
        use super::{Direction, Yawmeter};

        // Resting at 11, clockwise is 10 next
        let yawmeter = Yawmeter::new();
        yawmeter.init(true, true);
        assert_eq!(yawmeter.on_edge(true, false), Direction::Clockwise);
        assert_eq!(yawmeter.ticks(), 1);

        let yawmeter = Yawmeter::new();
        yawmeter.init(true, true);
        assert_eq!(yawmeter.on_edge(false, true), Direction::CounterClockwise);
        assert_eq!(yawmeter.ticks(), 447);
    }

    #[test]
    fn test_bearing_range() {
        use super::Yawmeter;
        use crate::config::TICKS_PER_REV;

        let yawmeter = Yawmeter::new();
        for (a, b) in CLOCKWISE.iter().cycle().take(TICKS_PER_REV as usize * 2) {
            yawmeter.on_edge(*a, *b);
            assert!(yawmeter.bearing() < 360);
        }
        for (a, b) in CLOCKWISE.iter().rev().cycle().skip(1).take(TICKS_PER_REV as usize) {
            yawmeter.on_edge(*a, *b);
            assert!(yawmeter.bearing() < 360);
        }
        assert_eq!(yawmeter.ticks(), 0);
    }

    #[test]
    fn test_angular_difference_range() {
        use super::angular_difference;

        for reference in 0..360 {
            for current in 0..360 {
                let difference = angular_difference(reference, current);
                assert!((-180..=180).contains(&difference));
                assert_eq!((current as i32 + difference).rem_euclid(360), reference as i32);
            }
        }
    }

    #[test]
    fn test_edge_after_reference() {
        use super::Yawmeter;

        let yawmeter = Yawmeter::new();
        for (a, b) in CLOCKWISE.iter().cycle().take(100) {
            yawmeter.on_edge(*a, *b);
        }
        yawmeter.on_reference();
        yawmeter.on_edge(false, true);
        assert_eq!(yawmeter.ticks(), 1);
    }
}

//! Tethered helicopter model.

use heli_flight::{components::altimeter::RANGE_CODES, config::TICKS_PER_REV};

/// Sensor reading on the ground.
pub const GROUND_SAMPLE: u16 = 3000;

/// Altitude percent gained per main duty percent above hover.
const LIFT_PER_DUTY: f32 = 2.0;
const HOVER_DUTY: f32 = 20.0;
/// Seconds
const LIFT_LAG: f32 = 0.5;
/// Degrees per second per tail duty percent off neutral.
const YAW_RATE_PER_DUTY: f32 = 8.0;
const TAIL_NEUTRAL_DUTY: f32 = 10.0;

/// Clockwise order of quadrature levels.
const QUADRATURE: [(bool, bool); 4] = [(false, false), (false, true), (true, true), (true, false)];

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Signal {
    Edge(bool, bool),
    Reference,
}

pub struct Plant {
    altitude: f32,
    angle: f32,
    position: i64,
}

impl Plant {
    pub fn new(start_yaw: u16) -> Self {
        let position = start_yaw as i64 * TICKS_PER_REV as i64 / 360;
        Self { altitude: 0.0, angle: start_yaw as f32, position }
    }

    pub fn altitude(&self) -> f32 {
        self.altitude
    }

    pub fn bearing(&self) -> f32 {
        self.angle.rem_euclid(360.0)
    }

    /// Current levels of both encoder channels.
    pub fn quadrature(&self) -> (bool, bool) {
        QUADRATURE[self.position.rem_euclid(4) as usize]
    }

    pub fn sample(&self) -> u16 {
        (GROUND_SAMPLE as f32 - self.altitude * RANGE_CODES as f32 / 100.0) as u16
    }

    /// Duty 0 means the rotor is off. Emits quadrature edges for every tick crossed
    /// and the reference pulse at mechanical zero.
    pub fn advance<F: FnMut(Signal)>(&mut self, dt: f32, main_duty: u8, tail_duty: u8, mut emit: F) {
        let lift = (LIFT_PER_DUTY * (main_duty as f32 - HOVER_DUTY)).max(0.0);
        self.altitude = (self.altitude + (lift - self.altitude) * dt / LIFT_LAG).max(0.0);
        if tail_duty > 0 {
            self.angle += YAW_RATE_PER_DUTY * (tail_duty as f32 - TAIL_NEUTRAL_DUTY) * dt;
        }

        let ticks = TICKS_PER_REV as i64;
        let target = (self.angle * ticks as f32 / 360.0).floor() as i64;
        while self.position != target {
            self.position += if self.position < target { 1 } else { -1 };
            let (a, b) = QUADRATURE[self.position.rem_euclid(4) as usize];
            emit(Signal::Edge(a, b));
            if self.position.rem_euclid(ticks) == 0 {
                emit(Signal::Reference);
            }
        }
    }
}

mod test {
    #[test]
    fn test_rotation_signals() {
        use super::{Plant, Signal};

        let mut plant = Plant::new(359);
        let mut signals = Vec::new();
        // 25 degrees clockwise
        plant.advance(0.1, 0, 41, |signal| signals.push(signal));
        let edges = signals.iter().filter(|s| matches!(s, Signal::Edge(_, _))).count();
        assert!(edges >= 31 && edges <= 36);
        assert_eq!(signals.iter().filter(|&&s| s == Signal::Reference).count(), 1);
        assert!(plant.bearing() > 23.0 && plant.bearing() < 25.0);
    }

    #[test]
    fn test_lift() {
        use super::{Plant, GROUND_SAMPLE};

        let mut plant = Plant::new(0);
        for _ in 0..1000 {
            plant.advance(0.005, 40, 0, |_| ());
        }
        assert!((plant.altitude() - 40.0).abs() < 0.1);
        assert_eq!(plant.sample(), GROUND_SAMPLE - 397);
        plant.advance(0.005, 0, 0, |_| ());
        assert!(plant.altitude() < 40.0);
    }
}

//! Scripted flight: arm, climb, turn, land.

use heli_flight::{
    components::{buttons::Input, yawmeter::angular_difference},
    fcs::{out::Telemetry, State},
};

use crate::peripherals::Panel;

/// Arming delay after boot, milliseconds
const ARM_AT: u64 = 500;
/// Press and release durations, milliseconds
const PRESS: u64 = 50;
const CLIMB_PRESSES: u8 = 3;
const TURN_PRESSES: u8 = 2;
/// Accepted distance to a target before moving on
const ALTITUDE_SETTLED: i32 = 3;
const YAW_SETTLED: i32 = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Arm,
    TakeOff,
    Climb(u8),
    Settle,
    Turn(u8),
    Align,
    Land,
    Done,
}

struct Pulse {
    input: Input,
    started: u64,
}

pub struct Mission {
    phase: Phase,
    pulse: Option<Pulse>,
}

impl Mission {
    pub fn new() -> Self {
        Self { phase: Phase::Arm, pulse: None }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Presses and releases `input`, true once released for as long as it was held.
    fn pulse(&mut self, now: u64, input: Input, panel: &mut Panel) -> bool {
        let pulse = self.pulse.get_or_insert(Pulse { input, started: now });
        let held = now - pulse.started;
        panel.set(pulse.input, held < PRESS);
        if held < 2 * PRESS {
            return false;
        }
        self.pulse = None;
        true
    }

    fn next(&self, now: u64, telemetry: &Telemetry, panel: &mut Panel) -> Phase {
        match self.phase {
            Phase::Arm if now >= ARM_AT => {
                panel.set(Input::FlightSwitch, true);
                Phase::TakeOff
            }
            Phase::TakeOff if telemetry.state == State::Flying => Phase::Climb(CLIMB_PRESSES),
            Phase::Climb(0) => Phase::Settle,
            Phase::Settle => {
                let error = telemetry.target_altitude - telemetry.altitude;
                match error.abs() <= ALTITUDE_SETTLED {
                    true => Phase::Turn(TURN_PRESSES),
                    false => Phase::Settle,
                }
            }
            Phase::Turn(0) => Phase::Align,
            Phase::Align => {
                if angular_difference(telemetry.target_yaw, telemetry.yaw).abs() > YAW_SETTLED {
                    return Phase::Align;
                }
                panel.set(Input::FlightSwitch, false);
                Phase::Land
            }
            Phase::Land if telemetry.state == State::Idle => Phase::Done,
            phase => phase,
        }
    }

    /// Advances the script by one step at `now` milliseconds.
    pub fn step(&mut self, now: u64, telemetry: Option<Telemetry>, panel: &mut Panel) {
        let phase = match self.phase {
            Phase::Climb(n) if n > 0 => match self.pulse(now, Input::Up, panel) {
                true => Phase::Climb(n - 1),
                false => return,
            },
            Phase::Turn(n) if n > 0 => match self.pulse(now, Input::Right, panel) {
                true => Phase::Turn(n - 1),
                false => return,
            },
            _ => match telemetry {
                Some(telemetry) => self.next(now, &telemetry, panel),
                None => return,
            },
        };
        if phase != self.phase {
            info!("Mission {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

impl Default for Mission {
    fn default() -> Self {
        Self::new()
    }
}

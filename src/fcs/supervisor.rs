//! Flight state machine, ticked at the control rate.

use core::mem;

use derive_more::Display;
use hal::{motor::Motor, telemetry::Sink};

use super::{out::Telemetry, pid::PIDController};
use crate::{
    components::{
        altimeter::CalibrationStatus,
        buttons::{Event, Input},
        rig::Rig,
        yawmeter::angular_difference,
    },
    config::Config,
};

const MAX_ALTITUDE: i32 = 100;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum State {
    #[display(fmt = "idle")]
    Idle,
    #[display(fmt = "taking-off")]
    TakingOff,
    #[display(fmt = "flying")]
    Flying,
    #[display(fmt = "landing")]
    Landing,
}

fn wrap_yaw(yaw: i32) -> u16 {
    yaw.rem_euclid(360) as u16
}

pub struct Supervisor<'a, M, T, S> {
    rig: &'a Rig,
    main: M,
    tail: T,
    sink: S,
    config: Config,
    altitude_pid: PIDController,
    yaw_pid: PIDController,

    state: State,
    entered: bool,
    flight_active: bool,
    altitude: i32,
    target_altitude: i32,
    yaw: u16,
    target_yaw: u16,
    yaw_debounce: u8,
    altitude_debounce: u8,
}

impl<'a, M: Motor, T: Motor, S: Sink<Telemetry>> Supervisor<'a, M, T, S> {
    pub fn new(rig: &'a Rig, main: M, tail: T, sink: S, config: Config) -> Self {
        Self {
            rig,
            main,
            tail,
            sink,
            altitude_pid: PIDController::new(&config.pids.altitude),
            yaw_pid: PIDController::new(&config.pids.yaw),
            config,
            state: State::Idle,
            entered: true,
            flight_active: false,
            altitude: 0,
            target_altitude: 0,
            yaw: 0,
            target_yaw: 0,
            yaw_debounce: 0,
            altitude_debounce: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_flight_active(&self) -> bool {
        self.flight_active
    }

    pub fn target_altitude(&self) -> i32 {
        self.target_altitude
    }

    pub fn target_yaw(&self) -> u16 {
        self.target_yaw
    }

    pub fn main_motor(&self) -> &M {
        &self.main
    }

    pub fn tail_motor(&self) -> &T {
        &self.tail
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            altitude: self.altitude,
            target_altitude: self.target_altitude,
            yaw: self.yaw,
            target_yaw: self.target_yaw,
            main_duty: self.main.duty(),
            tail_duty: self.tail.duty(),
            state: self.state,
        }
    }

    fn flight_switch(&self) -> Option<Event> {
        self.rig.buttons.check(Input::FlightSwitch)
    }

    fn pressed(&self, input: Input) -> bool {
        self.rig.buttons.check(input) == Some(Event::Activated)
    }

    fn disable_motors(&mut self) {
        self.main.disable();
        self.tail.disable();
    }

    fn idle(&mut self, entered: bool) -> State {
        if entered {
            self.disable_motors();
            self.flight_active = false;
        }
        if self.flight_switch() != Some(Event::Activated) {
            return State::Idle;
        }
        self.altitude_pid.reset();
        self.yaw_pid.reset();
        self.target_altitude = self.config.take_off.correction_altitude;
        State::TakingOff
    }

    fn enter_take_off(&mut self) -> bool {
        match self.rig.altimeter.poll_calibration() {
            CalibrationStatus::Done(_) => (),
            CalibrationStatus::Pending { samples, capacity } => {
                warn!("Altimeter calibration pending, {} of {} samples", samples, capacity);
                return false;
            }
        }
        self.main.enable();
        self.tail.enable();
        self.flight_active = true;
        self.target_altitude = self.config.take_off.correction_altitude;
        self.yaw_debounce = 0;
        true
    }

    fn taking_off(&mut self, entered: bool) -> State {
        if entered && !self.enter_take_off() {
            // Retried on the next tick
            self.entered = true;
        }
        if self.flight_switch() == Some(Event::Deactivated) {
            return State::Idle;
        }
        if self.entered {
            return State::TakingOff;
        }

        let yawmeter = &self.rig.yawmeter;
        if yawmeter.is_calibrated() {
            self.target_yaw = 0;
            yawmeter.disarm_reference();
            return State::Flying;
        }

        let config = &self.config.take_off;
        let yaw_error = angular_difference(self.target_yaw, self.yaw).abs();
        let altitude_error = (self.target_altitude - self.altitude).abs();
        if yaw_error < config.yaw_tolerance && altitude_error < config.altitude_tolerance {
            self.yaw_debounce = self.yaw_debounce.saturating_add(1);
            if self.yaw_debounce > config.yaw_debounce {
                self.target_yaw = wrap_yaw(self.target_yaw as i32 + config.yaw_step);
                debug!("Searching yaw reference at {}", self.target_yaw);
            }
        } else {
            self.yaw_debounce = 0;
        }
        State::TakingOff
    }

    fn flying(&mut self) -> State {
        if self.flight_switch() == Some(Event::Deactivated) {
            return State::Landing;
        }
        let config = self.config.flying;
        if self.pressed(Input::Up) {
            self.target_altitude = (self.target_altitude + config.altitude_step).min(MAX_ALTITUDE);
        }
        if self.pressed(Input::Down) {
            self.target_altitude = (self.target_altitude - config.altitude_step).max(0);
        }
        if self.pressed(Input::Right) {
            self.target_yaw = wrap_yaw(self.target_yaw as i32 + config.yaw_step);
        }
        if self.pressed(Input::Left) {
            self.target_yaw = wrap_yaw(self.target_yaw as i32 - config.yaw_step);
        }
        trace!("Target altitude {} yaw {}", self.target_altitude, self.target_yaw);
        State::Flying
    }

    /// Steps target yaw towards the reference along the shorter way.
    fn approach_reference(&mut self) {
        let config = &self.config.landing;
        let yaw_error = angular_difference(self.target_yaw, self.yaw).abs();
        if yaw_error >= config.yaw_tolerance {
            self.yaw_debounce = 0;
            return;
        }
        self.yaw_debounce = self.yaw_debounce.saturating_add(1);
        if self.yaw_debounce <= config.yaw_debounce || self.target_yaw == 0 {
            return;
        }
        let target = self.target_yaw as i32;
        let target = match angular_difference(0, self.target_yaw) < 0 {
            true => (target - config.yaw_step).max(0),
            false if target + config.yaw_step >= 360 => 0,
            false => target + config.yaw_step,
        };
        self.target_yaw = target as u16;
        debug!("Landing target yaw {}", self.target_yaw);
    }

    fn landing(&mut self, entered: bool) -> State {
        if entered {
            self.yaw_debounce = 0;
            self.altitude_debounce = 0;
        }
        if self.flight_switch() == Some(Event::Activated) {
            return State::Flying;
        }

        self.approach_reference();

        let config = &self.config.landing;
        if angular_difference(0, self.yaw).abs() >= config.yaw_tolerance {
            return State::Landing;
        }
        if self.altitude <= config.ground_altitude {
            return State::Idle;
        }
        if (self.target_altitude - self.altitude).abs() < config.altitude_tolerance {
            self.altitude_debounce = self.altitude_debounce.saturating_add(1);
            if self.altitude_debounce > config.altitude_debounce {
                self.target_altitude = (self.target_altitude - config.altitude_step).max(0);
                debug!("Descending to {}", self.target_altitude);
            }
        } else {
            self.altitude_debounce = 0;
        }
        State::Landing
    }

    fn control(&mut self) {
        let delta_t = self.config.timing.delta_t();
        let altitude_error = (self.target_altitude - self.altitude) as f32;
        let yaw_error = angular_difference(self.target_yaw, self.yaw) as f32;
        let main = self.altitude_pid.update(altitude_error, delta_t);
        let tail = self.yaw_pid.update(yaw_error, delta_t);
        let motors = &self.config.motors;
        self.main.set(motors.main_frequency, main as i32);
        self.tail.set(motors.tail_frequency, tail as i32);
    }

    /// One control period: sample estimators, step the state machine, drive
    /// the rotors while in flight and publish a snapshot.
    pub fn tick(&mut self) {
        self.altitude = self.rig.altimeter.altitude().unwrap_or(0);
        self.yaw = self.rig.yawmeter.bearing();

        let entered = mem::replace(&mut self.entered, false);
        let next = match self.state {
            State::Idle => self.idle(entered),
            State::TakingOff => self.taking_off(entered),
            State::Flying => self.flying(),
            State::Landing => self.landing(entered),
        };
        if next != self.state {
            info!("State {} -> {}", self.state, next);
            self.state = next;
            self.entered = true;
        }

        if self.flight_active {
            self.control();
        }
        let telemetry = self.telemetry();
        self.sink.publish(telemetry);
    }
}

mod test {
    #[cfg(test)]
    use hal::motor::Motor;

    #[cfg(test)]
    use crate::components::buttons::Input;

    #[cfg(test)]
    #[derive(Default)]
    struct Rotor {
        enabled: bool,
        frequency: u32,
        duty: u8,
    }

    #[cfg(test)]
    impl Motor for Rotor {
        fn enable(&mut self) {
            self.enabled = true;
        }

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn set(&mut self, frequency: fugit::HertzU32, duty: i32) {
            self.frequency = frequency.raw();
            self.duty = duty.clamp(2, 98) as u8;
        }

        fn duty(&self) -> u8 {
            if self.enabled { self.duty } else { 0 }
        }
    }

    #[cfg(test)]
    type Supervisor<'a> = super::Supervisor<'a, Rotor, Rotor, hal::telemetry::NoSink>;

    #[cfg(test)]
    const GROUND: u16 = 3000;

    #[cfg(test)]
    fn released(input: Input) -> bool {
        matches!(input, Input::Left | Input::Right | Input::Abort)
    }

    #[cfg(test)]
    fn rig() -> crate::components::rig::Rig {
        use crate::components::{buttons::Buttons, rig::Rig};

        let rig = Rig::new(Buttons::rig(&mut released).unwrap(), (false, false));
        hold(&rig, GROUND);
        rig
    }

    /// Fills the altitude buffer with one reading.
    #[cfg(test)]
    fn hold(rig: &crate::components::rig::Rig, raw: u16) {
        for _ in 0..crate::config::ALTITUDE_BUFFER_SIZE {
            rig.altimeter.ingest(raw);
        }
    }

    /// Raw reading for an altitude percentage above `GROUND`.
    #[cfg(test)]
    fn raw(altitude: i32) -> u16 {
        (GROUND as i32 - altitude * crate::components::altimeter::RANGE_CODES / 100) as u16
    }

    #[cfg(test)]
    fn press(rig: &crate::components::rig::Rig, input: Input, high: bool) {
        for _ in 0..crate::config::DEBOUNCE_POLLS {
            rig.buttons.update(input, high);
        }
    }

    #[cfg(test)]
    fn turn(rig: &crate::components::rig::Rig, edges: usize) {
        const CLOCKWISE: [(bool, bool); 4] =
            [(false, true), (true, true), (true, false), (false, false)];
        for (a, b) in CLOCKWISE.iter().cycle().take(edges) {
            rig.on_yaw_edge(*a, *b);
        }
    }

    #[cfg(test)]
    fn supervisor(rig: &crate::components::rig::Rig) -> Supervisor {
        let config = crate::config::Config::default();
        Supervisor::new(rig, Rotor::default(), Rotor::default(), hal::telemetry::NoSink, config)
    }

    /// Drives a fresh supervisor from IDLE to FLYING.
    #[cfg(test)]
    fn fly(rig: &crate::components::rig::Rig) -> Supervisor {
        use super::State;

        let mut supervisor = supervisor(rig);
        supervisor.tick();
        press(rig, Input::FlightSwitch, true);
        supervisor.tick();
        supervisor.tick();
        rig.on_yaw_reference();
        supervisor.tick();
        assert_eq!(supervisor.state(), State::Flying);
        supervisor
    }

    #[test]
    fn test_idle() {
        use super::State;

        let rig = rig();
        let mut supervisor = supervisor(&rig);
        for _ in 0..10 {
            supervisor.tick();
        }
        assert_eq!(supervisor.state(), State::Idle);
        assert!(!supervisor.is_flight_active());
        assert_eq!(supervisor.main_motor().duty(), 0);
    }

    #[test]
    fn test_take_off_yaw_search() {
        use pretty_assertions::assert_eq;

        use super::State;
        use crate::{components::buttons::Input, config::Config};

        let rig = rig();
        let config = Config::default();
        let mut supervisor = supervisor(&rig);
        supervisor.tick();
        press(&rig, Input::FlightSwitch, true);
        supervisor.tick();
        assert_eq!(supervisor.state(), State::TakingOff);
        assert_eq!(supervisor.target_altitude(), 10);

        // Entry, rotors spin up, altitude still out of tolerance
        supervisor.tick();
        assert!(supervisor.is_flight_active());
        assert!(supervisor.main_motor().enabled);
        assert_eq!(supervisor.main_motor().frequency, 150);
        assert_eq!(rig.altimeter.calibration().map(|c| c.low()), Some(GROUND as i32));

        hold(&rig, raw(10));
        for _ in 0..config.take_off.yaw_debounce {
            supervisor.tick();
        }
        assert_eq!(supervisor.target_yaw(), 0);
        supervisor.tick();
        assert_eq!(supervisor.target_yaw(), 30);

        // Yaw error of 30 resets the run
        supervisor.tick();
        assert_eq!(supervisor.target_yaw(), 30);
        turn(&rig, 40);
        for _ in 0..config.take_off.yaw_debounce {
            supervisor.tick();
        }
        assert_eq!(supervisor.target_yaw(), 30);
        supervisor.tick();
        assert_eq!(supervisor.target_yaw(), 60);

        rig.on_yaw_reference();
        supervisor.tick();
        assert_eq!(supervisor.state(), State::Flying);
        assert_eq!(supervisor.target_yaw(), 0);
        assert!(!rig.yawmeter.is_reference_armed());
    }

    #[test]
    fn test_take_off_waits_for_calibration() {
        use super::State;
        use crate::components::{
            buttons::{Buttons, Input},
            rig::Rig,
        };

        let rig = Rig::new(Buttons::rig(&mut released).unwrap(), (false, false));
        let mut supervisor = supervisor(&rig);
        supervisor.tick();
        press(&rig, Input::FlightSwitch, true);
        supervisor.tick();
        supervisor.tick();
        assert_eq!(supervisor.state(), State::TakingOff);
        assert!(!supervisor.is_flight_active());

        hold(&rig, GROUND);
        supervisor.tick();
        assert!(supervisor.is_flight_active());
        assert!(supervisor.tail_motor().enabled);
    }

    #[test]
    fn test_take_off_abandoned() {
        use super::State;
        use crate::components::buttons::Input;

        let rig = rig();
        let mut supervisor = supervisor(&rig);
        supervisor.tick();
        press(&rig, Input::FlightSwitch, true);
        supervisor.tick();
        supervisor.tick();
        press(&rig, Input::FlightSwitch, false);
        supervisor.tick();
        assert_eq!(supervisor.state(), State::Idle);
        supervisor.tick();
        assert!(!supervisor.is_flight_active());
        assert!(!supervisor.main_motor().enabled);
    }

    #[test]
    fn test_flying_inputs() {
        use pretty_assertions::assert_eq;

        use crate::components::buttons::Input;

        let rig = rig();
        let mut supervisor = fly(&rig);
        press(&rig, Input::Up, true);
        supervisor.tick();
        assert_eq!(supervisor.target_altitude(), 20);
        press(&rig, Input::Up, false);
        press(&rig, Input::Down, true);
        supervisor.tick();
        supervisor.tick();
        assert_eq!(supervisor.target_altitude(), 10);

        press(&rig, Input::Right, false);
        supervisor.tick();
        assert_eq!(supervisor.target_yaw(), 15);
        press(&rig, Input::Left, false);
        press(&rig, Input::Right, true);
        supervisor.tick();
        assert_eq!(supervisor.target_yaw(), 0);
        press(&rig, Input::Left, true);
        press(&rig, Input::Left, false);
        supervisor.tick();
        assert_eq!(supervisor.target_yaw(), 345);

        for _ in 0..12 {
            press(&rig, Input::Up, true);
            supervisor.tick();
            press(&rig, Input::Up, false);
        }
        assert_eq!(supervisor.target_altitude(), 100);
    }

    #[test]
    fn test_landing() {
        use pretty_assertions::assert_eq;

        use super::State;
        use crate::components::buttons::Input;

        let rig = rig();
        let mut supervisor = fly(&rig);
        for _ in 0..3 {
            press(&rig, Input::Up, true);
            supervisor.tick();
            press(&rig, Input::Up, false);
        }
        assert_eq!(supervisor.target_altitude(), 40);
        hold(&rig, raw(40));

        press(&rig, Input::FlightSwitch, false);
        supervisor.tick();
        assert_eq!(supervisor.state(), State::Landing);

        // Yaw at reference, a step down once the run exceeds 10 ticks
        for _ in 0..10 {
            supervisor.tick();
        }
        assert_eq!(supervisor.target_altitude(), 40);
        supervisor.tick();
        assert_eq!(supervisor.target_altitude(), 30);

        hold(&rig, raw(2));
        supervisor.tick();
        assert_eq!(supervisor.state(), State::Idle);
        assert!(supervisor.is_flight_active());
        supervisor.tick();
        assert!(!supervisor.is_flight_active());
        assert_eq!(supervisor.telemetry().main_duty, 0);
        assert_eq!(supervisor.telemetry().tail_duty, 0);
    }

    #[test]
    fn test_landing_waits_for_yaw() {
        use super::State;
        use crate::components::buttons::Input;

        let rig = rig();
        let mut supervisor = fly(&rig);
        turn(&rig, 100);
        hold(&rig, raw(0));
        press(&rig, Input::FlightSwitch, false);
        supervisor.tick();
        for _ in 0..5 {
            supervisor.tick();
        }
        assert_eq!(supervisor.state(), State::Landing);

        press(&rig, Input::FlightSwitch, true);
        supervisor.tick();
        assert_eq!(supervisor.state(), State::Flying);
    }

    #[test]
    fn test_landing_yaw_steps() {
        use pretty_assertions::assert_eq;

        use super::State;
        use crate::components::buttons::Input;

        let rig = rig();
        let mut supervisor = fly(&rig);
        for _ in 0..4 {
            press(&rig, Input::Left, true);
            press(&rig, Input::Left, false);
            supervisor.tick();
        }
        assert_eq!(supervisor.target_yaw(), 300);
        // Reference pulses are ignored once flying, the count keeps going
        turn(&rig, 373);
        rig.on_yaw_reference();
        assert_eq!(rig.yawmeter.bearing(), 299);

        press(&rig, Input::FlightSwitch, false);
        supervisor.tick();
        assert_eq!(supervisor.state(), State::Landing);
        for _ in 0..16 {
            supervisor.tick();
        }
        assert_eq!(supervisor.target_yaw(), 330);
    }

    #[test]
    fn test_state_display() {
        use super::State;

        assert_eq!(format!("{}", State::TakingOff), "taking-off");
        assert_eq!(serde_json::to_string(&State::Landing).unwrap(), "\"landing\"");
    }
}

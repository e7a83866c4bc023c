use heli_flight::{config::Config, fcs::State};
use simulator::{mission::Mission, Options, Simulator};

const TIMEOUT_MS: u64 = 60_000;

/// Flies the scripted mission, returns the distinct supervisor states seen.
fn fly(start_yaw: u16) -> (Mission, Vec<State>) {
    let options = Options { start_yaw };
    let mut simulator = Simulator::new(Config::default(), options).unwrap();
    let mut mission = Mission::new();
    let mut states = vec![State::Idle];
    while !mission.is_done() && simulator.elapsed_ms() < TIMEOUT_MS {
        mission.step(simulator.elapsed_ms(), simulator.telemetry(), simulator.panel());
        simulator.step();
        let state = simulator.telemetry().map(|t| t.state).unwrap();
        if states.last() != Some(&state) {
            states.push(state);
        }
    }
    (mission, states)
}

#[test]
fn test_mission() {
    use pretty_assertions::assert_eq;

    let (mission, states) = fly(200);
    assert!(mission.is_done());
    let expected = vec![State::Idle, State::TakingOff, State::Flying, State::Landing, State::Idle];
    assert_eq!(states, expected);
}

#[test]
fn test_mission_near_reference() {
    let (mission, states) = fly(350);
    assert!(mission.is_done());
    assert_eq!(states.last(), Some(&State::Idle));
}

#[test]
fn test_boot_calibration() {
    use simulator::plant::GROUND_SAMPLE;

    let simulator = Simulator::new(Config::default(), Options::default()).unwrap();
    let calibration = simulator.datastore().read_calibration().unwrap();
    assert_eq!(calibration.low(), GROUND_SAMPLE as i32);
    assert_eq!(calibration.high(), GROUND_SAMPLE as i32 - 992);
}

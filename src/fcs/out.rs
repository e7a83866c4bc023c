use super::supervisor::State;

/// Per-tick snapshot for the advisory loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Telemetry {
    pub altitude: i32,
    pub target_altitude: i32,
    pub yaw: u16,
    pub target_yaw: u16,
    pub main_duty: u8,
    pub tail_duty: u8,
    pub state: State,
}

mod test {
    #[test]
    fn test_serialize() {
        use pretty_assertions::assert_eq;

        use super::{State, Telemetry};

        let telemetry = Telemetry {
            altitude: 12,
            target_altitude: 20,
            yaw: 359,
            target_yaw: 0,
            main_duty: 40,
            tail_duty: 2,
            state: State::TakingOff,
        };
        let expected = concat!(
            r#"{"altitude":12,"target-altitude":20,"yaw":359,"target-yaw":0,"#,
            r#""main-duty":40,"tail-duty":2,"state":"taking-off"}"#
        );
        assert_eq!(serde_json::to_string(&telemetry).unwrap(), expected);
    }
}

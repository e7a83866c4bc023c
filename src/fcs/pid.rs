use crate::config::fcs::PID;

/// Textbook PID without anti-windup or output limits, the motor clamps.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PIDController {
    kp: f32,
    ki: f32,
    kd: f32,
    integral: f32,
    previous_error: f32,
}

impl PIDController {
    pub fn new(config: &PID) -> Self {
        Self { kp: config.kp, ki: config.ki, kd: config.kd, integral: 0.0, previous_error: 0.0 }
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
    }

    pub fn update(&mut self, error: f32, delta_t: f32) -> f32 {
        self.integral += error * delta_t;
        let derivative = (error - self.previous_error) / delta_t;
        self.previous_error = error;
        self.kp * error + self.ki * self.integral + self.kd * derivative
    }
}

mod test {
    #[test]
    fn test_zero_error() {
        use super::PIDController;
        use crate::config::fcs::PID;

        let mut pid = PIDController::new(&PID { kp: 1.0, ki: 0.5, kd: 0.2 });
        assert_eq!(pid.update(0.0, 0.01), 0.0);
        let mut pid = PIDController::new(&PID { kp: 1.0, ki: 0.5, kd: 0.2 });
        assert_eq!(pid.update(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_update() {
        use pretty_assertions::assert_eq;

        use super::PIDController;
        use crate::config::fcs::PID;

        let mut pid = PIDController::new(&PID { kp: 2.0, ki: 1.0, kd: 0.5 });
        // p 20, i 10 * 0.5, d 10 / 0.5 * 0.5
        assert_eq!(pid.update(10.0, 0.5), 35.0);
        // p 20, i 10, d 0
        assert_eq!(pid.update(10.0, 0.5), 30.0);
        // p 0, i 10, d -10
        assert_eq!(pid.update(0.0, 0.5), 0.0);

        pid.reset();
        assert_eq!(pid.update(0.0, 0.5), 0.0);
    }
}

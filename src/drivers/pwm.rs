use embedded_hal::Pwm;
use fugit::HertzU32;
use hal::motor::Motor;

use crate::config::DutyRange;

/// Rotor on one channel of a PWM timer.
pub struct PwmMotor<P: Pwm> {
    pwm: P,
    channel: P::Channel,
    range: DutyRange,
    frequency: Option<HertzU32>,
    duty: u8,
    enabled: bool,
}

impl<P> PwmMotor<P>
where
    P: Pwm<Duty = u16>,
    P::Channel: Copy,
    P::Time: From<HertzU32>,
{
    /// Starts disabled.
    pub fn new(mut pwm: P, channel: P::Channel, range: DutyRange) -> Self {
        pwm.disable(channel);
        Self { pwm, channel, range, frequency: None, duty: 0, enabled: false }
    }

    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P> Motor for PwmMotor<P>
where
    P: Pwm<Duty = u16>,
    P::Channel: Copy,
    P::Time: From<HertzU32>,
{
    fn enable(&mut self) {
        self.pwm.enable(self.channel);
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.pwm.disable(self.channel);
        self.enabled = false;
    }

    fn set(&mut self, frequency: HertzU32, duty: i32) {
        if self.frequency != Some(frequency) {
            self.pwm.set_period(frequency);
            self.frequency = Some(frequency);
        }
        self.duty = self.range.clamp(duty);
        let max_duty = self.pwm.get_max_duty() as u32;
        self.pwm.set_duty(self.channel, (max_duty * self.duty as u32 / 100) as u16);
    }

    fn duty(&self) -> u8 {
        match self.enabled {
            true => self.duty,
            false => 0,
        }
    }
}

mod test {
    #[cfg(test)]
    #[derive(Default)]
    struct Timer {
        period: u32,
        enabled: bool,
        duty: u16,
        periods: usize,
    }

    #[cfg(test)]
    impl embedded_hal::Pwm for Timer {
        type Channel = ();
        type Time = fugit::HertzU32;
        type Duty = u16;

        fn disable(&mut self, _: ()) {
            self.enabled = false;
        }

        fn enable(&mut self, _: ()) {
            self.enabled = true;
        }

        fn get_period(&self) -> fugit::HertzU32 {
            fugit::HertzU32::from_raw(self.period)
        }

        fn get_duty(&self, _: ()) -> u16 {
            self.duty
        }

        fn get_max_duty(&self) -> u16 {
            1000
        }

        fn set_duty(&mut self, _: (), duty: u16) {
            self.duty = duty;
        }

        fn set_period<P: Into<fugit::HertzU32>>(&mut self, period: P) {
            self.period = period.into().raw();
            self.periods += 1;
        }
    }

    #[test]
    fn test_pwm_motor() {
        use fugit::HertzU32;
        use hal::motor::Motor;
        use pretty_assertions::assert_eq;

        use super::PwmMotor;
        use crate::config::DutyRange;

        let mut motor = PwmMotor::new(Timer::default(), (), DutyRange { min: 2, max: 98 });
        motor.set(HertzU32::from_raw(150), 50);
        assert_eq!(motor.duty(), 0);
        motor.enable();
        assert_eq!(motor.duty(), 50);

        motor.set(HertzU32::from_raw(150), -1000);
        assert_eq!(motor.duty(), 2);
        motor.set(HertzU32::from_raw(150), 1000);
        assert_eq!(motor.duty(), 98);
        motor.disable();
        assert_eq!(motor.duty(), 0);

        let timer = motor.release();
        assert_eq!((timer.period, timer.periods), (150, 1));
        assert_eq!(timer.duty, 980);
        assert!(!timer.enabled);
    }
}

//! Interrupt-side context shared by the poll, edge and control handlers.

use hal::{altitude::SampleSource, input::DigitalInputs, reset::Reset};

use super::{
    altimeter::Altimeter,
    buttons::{Buttons, Event, Input},
    yawmeter::{Direction, Yawmeter},
};

pub struct Rig {
    pub altimeter: Altimeter,
    pub yawmeter: Yawmeter,
    pub buttons: Buttons,
}

impl Rig {
    /// `quadrature` holds the yaw channel levels at power on.
    pub fn new(buttons: Buttons, quadrature: (bool, bool)) -> Self {
        let yawmeter = Yawmeter::new();
        yawmeter.init(quadrature.0, quadrature.1);
        Self { altimeter: Altimeter::new(), yawmeter, buttons }
    }

    /// High-rate handler: altitude sampling and input debounce.
    /// An activated abort input resets immediately.
    pub fn poll<S, D, R>(&self, source: &mut S, inputs: &mut D, reset: &mut R)
    where
        S: SampleSource,
        D: DigitalInputs<Input>,
        R: Reset,
    {
        self.altimeter.update(source);
        self.buttons.poll(inputs);
        if self.buttons.check(Input::Abort) == Some(Event::Activated) {
            warn!("Abort requested, resetting");
            reset.reset()
        }
    }

    pub fn on_yaw_edge(&self, a: bool, b: bool) -> Direction {
        self.yawmeter.on_edge(a, b)
    }

    pub fn on_yaw_reference(&self) {
        if !self.yawmeter.on_reference() {
            trace!("Yaw reference ignored");
        }
    }
}

mod test {
    #[cfg(test)]
    struct Source(u16);

    #[cfg(test)]
    impl hal::altitude::SampleSource for Source {
        type Error = ();

        fn take(&mut self) -> nb::Result<u16, ()> {
            Ok(self.0)
        }

        fn trigger(&mut self) {}
    }

    #[cfg(test)]
    struct Panic;

    #[cfg(test)]
    impl hal::reset::Reset for Panic {
        fn reset(&mut self) -> ! {
            panic!("reset")
        }
    }

    #[cfg(test)]
    fn released(input: super::Input) -> bool {
        use super::Input;
        matches!(input, Input::Left | Input::Right | Input::Abort)
    }

    #[test]
    fn test_poll() {
        use super::{Buttons, Event, Input, Rig};

        let rig = Rig::new(Buttons::rig(&mut released).unwrap(), (false, false));
        let mut armed = |input: Input| released(input) ^ (input == Input::FlightSwitch);
        for _ in 0..3 {
            rig.poll(&mut Source(2000), &mut armed, &mut Panic);
        }
        assert_eq!(rig.altimeter.samples(), 3);
        assert_eq!(rig.buttons.check(Input::FlightSwitch), Some(Event::Activated));
    }

    #[test]
    #[should_panic(expected = "reset")]
    fn test_abort() {
        use super::{Buttons, Input, Rig};

        let rig = Rig::new(Buttons::rig(&mut released).unwrap(), (false, false));
        let mut abort = |input: Input| released(input) ^ (input == Input::Abort);
        for _ in 0..3 {
            rig.poll(&mut Source(2000), &mut abort, &mut Panic);
        }
    }

    #[test]
    fn test_edges() {
        use super::{Buttons, Rig};

        let rig = Rig::new(Buttons::new(), (false, false));
        rig.on_yaw_edge(false, true);
        rig.on_yaw_reference();
        assert!(rig.yawmeter.is_calibrated());
        assert_eq!(rig.yawmeter.ticks(), 0);
    }

    #[test]
    fn test_initial_quadrature() {
        use super::{Buttons, Direction, Rig};

        let rig = Rig::new(Buttons::new(), (true, false));
        assert_eq!(rig.on_yaw_edge(false, false), Direction::Clockwise);
        assert_eq!(rig.yawmeter.ticks(), 1);
    }
}

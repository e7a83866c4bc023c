use embedded_hal::digital::v2::InputPin;

/// Raw electrical level of an input, true means high.
pub trait DigitalInputs<I> {
    fn is_high(&mut self, input: I) -> bool;
}

/// Pins indexed by input identifier, a pin that fails to read counts as low.
pub struct Pins<P, const N: usize>(pub [P; N]);

impl<I: Into<usize>, P: InputPin, const N: usize> DigitalInputs<I> for Pins<P, N> {
    fn is_high(&mut self, input: I) -> bool {
        match self.0.get(input.into()) {
            Some(pin) => pin.is_high().unwrap_or(false),
            None => false,
        }
    }
}

impl<I, F: FnMut(I) -> bool> DigitalInputs<I> for F {
    fn is_high(&mut self, input: I) -> bool {
        self(input)
    }
}

mod test {
    #[test]
    fn test_pins() {
        use core::convert::Infallible;

        use embedded_hal::digital::v2::InputPin;

        use super::{DigitalInputs, Pins};

        struct Pin(bool);

        impl InputPin for Pin {
            type Error = Infallible;

            fn is_high(&self) -> Result<bool, Infallible> {
                Ok(self.0)
            }

            fn is_low(&self) -> Result<bool, Infallible> {
                Ok(!self.0)
            }
        }

        let mut pins = Pins([Pin(true), Pin(false)]);
        assert!(pins.is_high(0usize));
        assert!(!pins.is_high(1usize));
        assert!(!pins.is_high(7usize));

        let mut levels = |input: usize| input == 1;
        assert!(levels.is_high(1usize));
    }
}

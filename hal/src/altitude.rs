use core::marker::PhantomData;

use embedded_hal::adc::{Channel, OneShot};

/// Pull-with-trigger source of raw altitude samples.
pub trait SampleSource {
    type Error;

    /// Takes the finished conversion, `WouldBlock` while it is still running.
    fn take(&mut self) -> nb::Result<u16, Self::Error>;
    fn trigger(&mut self);
}

/// Adapts a one-shot ADC channel. `OneShot::read` starts a conversion on first
/// call and yields it once complete, so `trigger` only has to poll once.
pub struct OneShotSource<A, ADC, PIN> {
    adc: ADC,
    pin: PIN,
    pending: Option<u16>,
    _adc: PhantomData<A>,
}

impl<A, ADC, PIN> OneShotSource<A, ADC, PIN> {
    pub fn new(adc: ADC, pin: PIN) -> Self {
        Self { adc, pin, pending: None, _adc: PhantomData }
    }

    pub fn release(self) -> (ADC, PIN) {
        (self.adc, self.pin)
    }
}

impl<A, ADC, PIN> SampleSource for OneShotSource<A, ADC, PIN>
where
    ADC: OneShot<A, u16, PIN>,
    PIN: Channel<A>,
{
    type Error = ADC::Error;

    fn take(&mut self) -> nb::Result<u16, Self::Error> {
        if let Some(sample) = self.pending.take() {
            return Ok(sample);
        }
        self.adc.read(&mut self.pin)
    }

    fn trigger(&mut self) {
        if let Ok(sample) = self.adc.read(&mut self.pin) {
            self.pending = Some(sample);
        }
    }
}

mod test {
    #[test]
    fn test_one_shot_source() {
        use embedded_hal::adc::{Channel, OneShot};

        use super::{OneShotSource, SampleSource};

        struct Adc(u16, usize);
        struct Pin;

        impl Channel<Adc> for Pin {
            type ID = u8;

            fn channel() -> u8 {
                9
            }
        }

        impl OneShot<Adc, u16, Pin> for Adc {
            type Error = ();

            fn read(&mut self, _: &mut Pin) -> nb::Result<u16, ()> {
                self.1 += 1;
                if self.1 % 2 == 1 {
                    return Err(nb::Error::WouldBlock);
                }
                self.0 += 1;
                Ok(self.0)
            }
        }

        let mut source: OneShotSource<Adc, _, _> = OneShotSource::new(Adc(100, 0), Pin);
        assert_eq!(source.take(), Err(nb::Error::WouldBlock));
        assert_eq!(source.take(), Ok(101));
        source.trigger();
        assert_eq!(source.take(), Ok(102));
    }
}

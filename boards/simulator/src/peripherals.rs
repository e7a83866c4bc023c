//! Simulated rig peripherals.

use std::{cell::Cell, rc::Rc};

use embedded_hal::{
    adc::{Channel, OneShot},
    blocking::delay::DelayUs,
    Pwm,
};
use fugit::HertzU32;
use hal::{input::DigitalInputs, reset::Reset};
use heli_flight::components::buttons::Input;

/// ADC whose conversions take one read to complete.
pub struct Adc {
    sample: Rc<Cell<u16>>,
    converting: bool,
}

impl Adc {
    pub fn new(sample: Rc<Cell<u16>>) -> Self {
        Self { sample, converting: false }
    }
}

pub struct AltitudePin;

impl Channel<Adc> for AltitudePin {
    type ID = u8;

    fn channel() -> u8 {
        9
    }
}

impl OneShot<Adc, u16, AltitudePin> for Adc {
    type Error = ();

    fn read(&mut self, _: &mut AltitudePin) -> nb::Result<u16, ()> {
        if !self.converting {
            self.converting = true;
            return Err(nb::Error::WouldBlock);
        }
        self.converting = false;
        Ok(self.sample.get())
    }
}

pub struct Timer {
    period: HertzU32,
    duty: u16,
    enabled: bool,
}

impl Timer {
    const MAX_DUTY: u16 = 1000;

    pub fn new() -> Self {
        Self { period: HertzU32::from_raw(0), duty: 0, enabled: false }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pwm for Timer {
    type Channel = ();
    type Time = HertzU32;
    type Duty = u16;

    fn disable(&mut self, _: ()) {
        self.enabled = false;
    }

    fn enable(&mut self, _: ()) {
        self.enabled = true;
    }

    fn get_period(&self) -> HertzU32 {
        self.period
    }

    fn get_duty(&self, _: ()) -> u16 {
        self.duty
    }

    fn get_max_duty(&self) -> u16 {
        Self::MAX_DUTY
    }

    fn set_duty(&mut self, _: (), duty: u16) {
        self.duty = duty;
    }

    fn set_period<P: Into<HertzU32>>(&mut self, period: P) {
        self.period = period.into();
        debug!("PWM period set to {}Hz", self.period.raw());
    }
}

/// Front panel levels, starts with everything released.
pub struct Panel {
    levels: [bool; 6],
}

impl Panel {
    pub fn new() -> Self {
        let mut panel = Self { levels: [false; 6] };
        for input in Input::ALL {
            panel.set(input, false);
        }
        panel
    }

    pub fn set(&mut self, input: Input, active: bool) {
        self.levels[usize::from(input)] = input.polarity().level(active);
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalInputs<Input> for Panel {
    fn is_high(&mut self, input: Input) -> bool {
        self.levels[usize::from(input)]
    }
}

/// Boot calibration pacing, only accounts the time.
#[derive(Default)]
pub struct Delay {
    pub elapsed_us: u64,
}

impl DelayUs<u32> for Delay {
    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}

pub struct Halt;

impl Reset for Halt {
    fn reset(&mut self) -> ! {
        error!("Abort pressed, stopping simulation");
        std::process::exit(2)
    }
}

//! Build-time configuration. Nothing here is editable at runtime or persisted.

pub mod fcs;
pub mod pwm;

use fugit::HertzU32;
use serde::Serializer;

pub use fcs::{Flying, Landing, TakeOff, PID, PIDs};
pub use pwm::{DutyRange, Motors};

/// Altitude samples averaged by the altimeter.
pub const ALTITUDE_BUFFER_SIZE: usize = 25;
pub const ADC_WIDTH_BITS: u32 = 12;
pub const ADC_REFERENCE_MILLIVOLTS: i32 = 3300;
/// Sensor swing between ground and full altitude.
pub const ALTITUDE_RANGE_MILLIVOLTS: i32 = 800;

pub const SLOTS_PER_REV: i32 = 112;
pub const EDGES_PER_SLOT: i32 = 2;
pub const QUADRATURE_CHANNELS: i32 = 2;
pub const TICKS_PER_REV: i32 = SLOTS_PER_REV * EDGES_PER_SLOT * QUADRATURE_CHANNELS;

/// Consecutive opposite polls before an input flips.
pub const DEBOUNCE_POLLS: u8 = 3;

pub(crate) fn hertz<S: Serializer>(rate: &HertzU32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u32(rate.raw())
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Timing {
    /// Altitude sampling and input debounce
    #[serde(serialize_with = "hertz")]
    pub poll_rate: HertzU32,
    #[serde(serialize_with = "hertz")]
    pub control_rate: HertzU32,
    /// Pacing of the blocking boot calibration
    #[serde(serialize_with = "hertz")]
    pub calibration_rate: HertzU32,
}

impl Timing {
    pub const DEFAULT: Self = Self {
        poll_rate: HertzU32::from_raw(200),
        control_rate: HertzU32::from_raw(100),
        calibration_rate: HertzU32::from_raw(200),
    };

    /// Control period in seconds
    pub fn delta_t(&self) -> f32 {
        1.0 / self.control_rate.raw() as f32
    }

    pub fn calibration_delay_us(&self) -> u32 {
        1_000_000 / self.calibration_rate.raw()
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub timing: Timing,
    pub pids: PIDs,
    pub take_off: TakeOff,
    pub flying: Flying,
    pub landing: Landing,
    pub motors: Motors,
}

impl Config {
    pub const DEFAULT: Self = Self {
        timing: Timing::DEFAULT,
        pids: PIDs::DEFAULT,
        take_off: TakeOff::DEFAULT,
        flying: Flying::DEFAULT,
        landing: Landing::DEFAULT,
        motors: Motors::DEFAULT,
    };
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

mod test {
    #[test]
    fn test_derived_constants() {
        use pretty_assertions::assert_eq;

        use super::{Config, TICKS_PER_REV};

        assert_eq!(TICKS_PER_REV, 448);
        let config = Config::default();
        assert_eq!(config.timing.delta_t(), 0.01);
        assert_eq!(config.timing.calibration_delay_us(), 5000);
    }
}

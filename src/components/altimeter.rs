//! Altitude estimation from an analogue height sensor.
//!
//! The sensor voltage drops as the rig climbs, so the calibrated `high`
//! reference is numerically below the `low` (ground) one.

use core::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use embedded_hal::blocking::delay::DelayUs;
use hal::altitude::SampleSource;

use crate::{
    config::{
        ADC_REFERENCE_MILLIVOLTS, ADC_WIDTH_BITS, ALTITUDE_BUFFER_SIZE, ALTITUDE_RANGE_MILLIVOLTS,
    },
    datastructures::ring_buffer::RingBuffer,
    sync::ReadSpinLock,
};

/// Sample codes between ground and full altitude.
pub const RANGE_CODES: i32 =
    ALTITUDE_RANGE_MILLIVOLTS * (1 << ADC_WIDTH_BITS) / ADC_REFERENCE_MILLIVOLTS;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Uncalibrated,
    ZeroRange,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Uncalibrated => write!(f, "altimeter not calibrated"),
            Self::ZeroRange => write!(f, "altitude calibration range is zero"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Calibration {
    low: i32,
    high: i32,
}

impl Calibration {
    pub fn new(low: i32, high: i32) -> Result<Self, Error> {
        if low == high {
            return Err(Error::ZeroRange);
        }
        Ok(Self { low, high })
    }

    /// Derives `high` from a ground reading by the fixed sensor range.
    pub fn from_ground(low: i32) -> Self {
        Self { low, high: low - RANGE_CODES }
    }

    pub fn low(&self) -> i32 {
        self.low
    }

    pub fn high(&self) -> i32 {
        self.high
    }

    /// Percentage altitude for a mean sample, rounded and floored at zero.
    /// Not clamped above 100, equipment variation may read higher.
    pub fn percentage(&self, mean: i32) -> i32 {
        let numerator = (mean - self.high) * 100;
        let denominator = self.high - self.low;
        let altitude = (2 * numerator - denominator) / (2 * denominator) + 100;
        altitude.max(0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CalibrationStatus {
    Pending { samples: usize, capacity: usize },
    Done(Calibration),
}

pub struct Altimeter {
    buffer: RingBuffer<ALTITUDE_BUFFER_SIZE>,
    samples: AtomicUsize,
    calibration: ReadSpinLock<Option<Calibration>>,
}

impl Altimeter {
    pub const fn new() -> Self {
        Self {
            buffer: RingBuffer::new(),
            samples: AtomicUsize::new(0),
            calibration: ReadSpinLock::new(None),
        }
    }

    pub fn ingest(&self, raw: u16) {
        self.buffer.write(raw as u32);
        let samples = self.samples.load(Ordering::Relaxed);
        if samples < ALTITUDE_BUFFER_SIZE {
            self.samples.store(samples + 1, Ordering::Release);
        }
    }

    /// Takes a finished sample if there is one and starts the next conversion.
    pub fn update<S: SampleSource>(&self, source: &mut S) {
        match source.take() {
            Ok(raw) => self.ingest(raw),
            Err(nb::Error::WouldBlock) => return,
            Err(nb::Error::Other(_)) => warn!("Altitude sample failed"),
        }
        source.trigger();
    }

    /// Samples received, saturating at capacity.
    pub fn samples(&self) -> usize {
        self.samples.load(Ordering::Acquire)
    }

    pub fn is_filled(&self) -> bool {
        self.samples() >= self.buffer.capacity()
    }

    pub fn mean(&self) -> u32 {
        self.buffer.mean()
    }

    pub fn calibration(&self) -> Option<Calibration> {
        self.calibration.read()
    }

    fn store(&self, calibration: Calibration) {
        if self.calibration.write(Some(calibration)).is_err() {
            error!("Altitude calibration write conflict");
        }
    }

    /// Non-blocking calibration, completes once the buffer has been filled.
    pub fn poll_calibration(&self) -> CalibrationStatus {
        if !self.is_filled() {
            let capacity = self.buffer.capacity();
            return CalibrationStatus::Pending { samples: self.samples(), capacity };
        }
        let calibration = Calibration::from_ground(self.mean() as i32);
        self.store(calibration);
        info!("Altimeter calibrated, low {} high {}", calibration.low, calibration.high);
        CalibrationStatus::Done(calibration)
    }

    /// Blocks until the buffer is filled, driving the sample source itself.
    /// There is no timeout: a source that never produces samples hangs here.
    pub fn calibrate<S, D>(&self, source: &mut S, delay: &mut D, delay_us: u32) -> Calibration
    where
        S: SampleSource,
        D: DelayUs<u32>,
    {
        loop {
            if let CalibrationStatus::Done(calibration) = self.poll_calibration() {
                return calibration;
            }
            self.update(source);
            delay.delay_us(delay_us);
        }
    }

    /// Current altitude in percent of the calibrated range.
    pub fn altitude(&self) -> Result<i32, Error> {
        let calibration = self.calibration().ok_or(Error::Uncalibrated)?;
        Ok(calibration.percentage(self.mean() as i32))
    }
}

impl Default for Altimeter {
    fn default() -> Self {
        Self::new()
    }
}

mod test {
    #[cfg(test)]
    use hal::altitude::SampleSource;

    #[cfg(test)]
    struct Source {
        samples: std::vec::Vec<nb::Result<u16, ()>>,
        triggers: usize,
    }

    #[cfg(test)]
    impl SampleSource for Source {
        type Error = ();

        fn take(&mut self) -> nb::Result<u16, ()> {
            if self.samples.is_empty() {
                return Err(nb::Error::WouldBlock);
            }
            self.samples.remove(0)
        }

        fn trigger(&mut self) {
            self.triggers += 1;
        }
    }

    #[test]
    fn test_range_codes() {
        assert_eq!(super::RANGE_CODES, 992);
    }

    #[test]
    fn test_calibration_percentage() {
        use pretty_assertions::assert_eq;

        use super::Calibration;

        let calibration = Calibration::from_ground(2000);
        assert_eq!(calibration.high(), 1008);
        assert_eq!(calibration.percentage(2000), 0);
        assert_eq!(calibration.percentage(1008), 100);
        assert_eq!(calibration.percentage(1504), 50);
        // Below ground reads are floored
        assert_eq!(calibration.percentage(2100), 0);
        // Above the range is not clamped
        assert_eq!(calibration.percentage(900), 110);
    }

    #[test]
    fn test_calibration_zero_range() {
        use super::{Calibration, Error};

        assert_eq!(Calibration::new(1000, 1000), Err(Error::ZeroRange));
        assert!(Calibration::new(1000, 8).is_ok());
    }

    #[test]
    fn test_uncalibrated() {
        use super::{Altimeter, Error};

        let altimeter = Altimeter::new();
        assert_eq!(altimeter.altitude(), Err(Error::Uncalibrated));
    }

    #[test]
    fn test_update_pull_with_trigger() {
        use super::Altimeter;

        let altimeter = Altimeter::new();
        let samples = vec![Ok(1000), Err(nb::Error::WouldBlock), Err(nb::Error::Other(())), Ok(1)];
        let mut source = Source { samples, triggers: 0 };
        altimeter.update(&mut source);
        assert_eq!((altimeter.samples(), source.triggers), (1, 1));
        altimeter.update(&mut source);
        assert_eq!((altimeter.samples(), source.triggers), (1, 1));
        altimeter.update(&mut source);
        assert_eq!((altimeter.samples(), source.triggers), (1, 2));
        altimeter.update(&mut source);
        assert_eq!((altimeter.samples(), source.triggers), (2, 3));
    }

    #[test]
    fn test_poll_calibration() {
        use super::{Altimeter, CalibrationStatus, Calibration};
        use crate::config::ALTITUDE_BUFFER_SIZE;

        let altimeter = Altimeter::new();
        for _ in 0..ALTITUDE_BUFFER_SIZE - 1 {
            altimeter.ingest(2500);
        }
        let pending = CalibrationStatus::Pending {
            samples: ALTITUDE_BUFFER_SIZE - 1,
            capacity: ALTITUDE_BUFFER_SIZE,
        };
        assert_eq!(altimeter.poll_calibration(), pending);
        assert!(!altimeter.is_filled());
        altimeter.ingest(2500);
        assert!(altimeter.is_filled());
        let done = CalibrationStatus::Done(Calibration::from_ground(2500));
        assert_eq!(altimeter.poll_calibration(), done);
        assert_eq!(altimeter.altitude(), Ok(0));

        for _ in 0..ALTITUDE_BUFFER_SIZE * 2 {
            altimeter.ingest(2500 - 496);
        }
        assert_eq!(altimeter.samples(), ALTITUDE_BUFFER_SIZE);
        assert_eq!(altimeter.altitude(), Ok(50));
    }

    #[test]
    fn test_blocking_calibrate() {
        use embedded_hal::blocking::delay::DelayUs;

        use super::{Altimeter, Calibration};
        use crate::config::ALTITUDE_BUFFER_SIZE;

        struct Delay(u32);

        impl DelayUs<u32> for Delay {
            fn delay_us(&mut self, us: u32) {
                self.0 += us;
            }
        }

        let mut samples = std::vec::Vec::new();
        for i in 0..ALTITUDE_BUFFER_SIZE {
            samples.push(Err(nb::Error::WouldBlock));
            samples.push(Ok(3000 + (i % 2) as u16));
        }
        let mut source = Source { samples, triggers: 0 };
        let mut delay = Delay(0);
        let calibration = Altimeter::new().calibrate(&mut source, &mut delay, 5000);
        // 12 odd samples among 25, mean 3000.48
        assert_eq!(calibration, Calibration::from_ground(3000));
        assert_eq!(source.triggers, ALTITUDE_BUFFER_SIZE);
        assert_eq!(delay.0, 5000 * 2 * ALTITUDE_BUFFER_SIZE as u32);
    }
}

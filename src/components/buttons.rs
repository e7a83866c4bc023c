//! Debounced rig inputs.

use core::{
    fmt,
    sync::atomic::{AtomicBool, AtomicU8, Ordering},
};

use hal::input::DigitalInputs;
use heapless::LinearMap;

use crate::config::DEBOUNCE_POLLS;

pub const MAX_INPUTS: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Input {
    Up,
    Down,
    Left,
    Right,
    /// Hard reset, bypasses the supervisor
    Abort,
    /// Slider switch arming the rig
    FlightSwitch,
}

impl Input {
    pub const ALL: [Input; 6] =
        [Self::Up, Self::Down, Self::Left, Self::Right, Self::Abort, Self::FlightSwitch];

    /// Rig wiring
    pub fn polarity(self) -> Polarity {
        match self {
            Self::Up | Self::Down | Self::FlightSwitch => Polarity::ActiveHigh,
            Self::Left | Self::Right | Self::Abort => Polarity::ActiveLow,
        }
    }
}

impl From<Input> for usize {
    fn from(input: Input) -> usize {
        input as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    pub fn is_active(self, high: bool) -> bool {
        match self {
            Self::ActiveHigh => high,
            Self::ActiveLow => !high,
        }
    }

    /// Electrical level for a logical state
    pub fn level(self, active: bool) -> bool {
        match self {
            Self::ActiveHigh => active,
            Self::ActiveLow => !active,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Activated,
    Deactivated,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Duplicate(Input),
    Full,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Duplicate(input) => write!(f, "input {:?} already registered", input),
            Self::Full => write!(f, "no room for more than {} inputs", MAX_INPUTS),
        }
    }
}

struct Record {
    polarity: Polarity,
    run: AtomicU8,
    high: AtomicBool,
    changed: AtomicBool,
}

impl Record {
    fn new(polarity: Polarity, high: bool) -> Self {
        Self {
            polarity,
            run: AtomicU8::new(0),
            high: AtomicBool::new(high),
            changed: AtomicBool::new(false),
        }
    }

    fn update(&self, high: bool) {
        if high == self.high.load(Ordering::Relaxed) {
            self.run.store(0, Ordering::Relaxed);
            return;
        }
        let run = self.run.load(Ordering::Relaxed) + 1;
        if run < DEBOUNCE_POLLS {
            self.run.store(run, Ordering::Relaxed);
            return;
        }
        self.run.store(0, Ordering::Relaxed);
        self.high.store(high, Ordering::Release);
        self.changed.store(true, Ordering::Release);
    }
}

/// Inputs are registered up front, afterwards polling and checking only need
/// shared access so the poll interrupt and the control tick can share one table.
pub struct Buttons {
    records: LinearMap<Input, Record, MAX_INPUTS>,
}

impl Buttons {
    pub fn new() -> Self {
        Self { records: LinearMap::new() }
    }

    /// The six rig inputs with their wiring, initial levels read from `inputs`.
    pub fn rig<D: DigitalInputs<Input>>(inputs: &mut D) -> Result<Self, Error> {
        let mut buttons = Self::new();
        for input in Input::ALL {
            buttons.register(input, input.polarity(), inputs.is_high(input))?;
        }
        Ok(buttons)
    }

    /// `high` is the current electrical level, taken as the initial stable state.
    pub fn register(&mut self, input: Input, polarity: Polarity, high: bool) -> Result<(), Error> {
        if self.records.contains_key(&input) {
            return Err(Error::Duplicate(input));
        }
        let record = Record::new(polarity, high);
        self.records.insert(input, record).map_err(|_| Error::Full)?;
        Ok(())
    }

    pub fn update(&self, input: Input, high: bool) {
        if let Some(record) = self.records.get(&input) {
            record.update(high)
        }
    }

    pub fn poll<D: DigitalInputs<Input>>(&self, inputs: &mut D) {
        for (&input, record) in self.records.iter() {
            record.update(inputs.is_high(input));
        }
    }

    /// Consumes a pending change. Only one consumer per input.
    pub fn check(&self, input: Input) -> Option<Event> {
        let record = self.records.get(&input)?;
        if !record.changed.swap(false, Ordering::AcqRel) {
            return None;
        }
        match record.polarity.is_active(record.high.load(Ordering::Acquire)) {
            true => Some(Event::Activated),
            false => Some(Event::Deactivated),
        }
    }

    pub fn is_active(&self, input: Input) -> bool {
        self.records
            .get(&input)
            .map(|record| record.polarity.is_active(record.high.load(Ordering::Acquire)))
            .unwrap_or(false)
    }
}

impl Default for Buttons {
    fn default() -> Self {
        Self::new()
    }
}

mod test {
    #[test]
    fn test_debounce_aborted() {
        use super::{Buttons, Input, Polarity};

        let mut buttons = Buttons::new();
        buttons.register(Input::Up, Polarity::ActiveHigh, false).ok();
        buttons.update(Input::Up, true);
        buttons.update(Input::Up, true);
        buttons.update(Input::Up, false);
        assert_eq!(buttons.check(Input::Up), None);
        assert!(!buttons.is_active(Input::Up));
        // Run restarted from zero
        buttons.update(Input::Up, true);
        buttons.update(Input::Up, true);
        assert_eq!(buttons.check(Input::Up), None);
    }

    #[test]
    fn test_debounce_flip() {
        use pretty_assertions::assert_eq;

        use super::{Buttons, Event, Input, Polarity};

        let mut buttons = Buttons::new();
        buttons.register(Input::Up, Polarity::ActiveHigh, false).ok();
        for _ in 0..3 {
            buttons.update(Input::Up, true);
        }
        assert!(buttons.is_active(Input::Up));
        assert_eq!(buttons.check(Input::Up), Some(Event::Activated));
        assert_eq!(buttons.check(Input::Up), None);
        // Holding produces nothing more
        for _ in 0..10 {
            buttons.update(Input::Up, true);
        }
        assert_eq!(buttons.check(Input::Up), None);
        for _ in 0..3 {
            buttons.update(Input::Up, false);
        }
        assert_eq!(buttons.check(Input::Up), Some(Event::Deactivated));
    }

    #[test]
    fn test_active_low() {
        use super::{Buttons, Event, Input, Polarity};

        let mut buttons = Buttons::new();
        buttons.register(Input::Left, Polarity::ActiveLow, true).ok();
        assert!(!buttons.is_active(Input::Left));
        for _ in 0..3 {
            buttons.update(Input::Left, false);
        }
        assert_eq!(buttons.check(Input::Left), Some(Event::Activated));
    }

    #[test]
    fn test_register() {
        use super::{Buttons, Error, Input, Polarity, MAX_INPUTS};

        let mut buttons = Buttons::new();
        assert_eq!(buttons.register(Input::Up, Polarity::ActiveHigh, false), Ok(()));
        let result = buttons.register(Input::Up, Polarity::ActiveLow, false);
        assert_eq!(result, Err(Error::Duplicate(Input::Up)));
        let expected = format!("no room for more than {} inputs", MAX_INPUTS);
        assert_eq!(format!("{}", Error::Full), expected);
        assert_eq!(buttons.check(Input::Down), None);
    }

    #[test]
    fn test_rig_poll() {
        use super::{Buttons, Event, Input};

        // Released levels: active-high inputs low, active-low inputs high
        let released = |input: Input| matches!(input, Input::Left | Input::Right | Input::Abort);
        let mut levels = released;
        let buttons = Buttons::rig(&mut levels).unwrap();
        for input in Input::ALL {
            assert!(!buttons.is_active(input));
        }

        let mut pressed = |input: Input| match input {
            Input::FlightSwitch | Input::Right => !released(input),
            _ => released(input),
        };
        for _ in 0..3 {
            buttons.poll(&mut pressed);
        }
        assert_eq!(buttons.check(Input::FlightSwitch), Some(Event::Activated));
        assert_eq!(buttons.check(Input::Right), Some(Event::Activated));
        assert_eq!(buttons.check(Input::Left), None);
        assert_eq!(buttons.check(Input::Abort), None);
    }
}

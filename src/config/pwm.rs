use fugit::HertzU32;

use super::hertz;

/// Safe duty percent window of one rotor.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct DutyRange {
    pub min: u8,
    pub max: u8,
}

impl DutyRange {
    pub fn clamp(&self, duty: i32) -> u8 {
        duty.clamp(self.min as i32, self.max as i32) as u8
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Motors {
    #[serde(serialize_with = "hertz")]
    pub main_frequency: HertzU32,
    pub main_duty: DutyRange,
    #[serde(serialize_with = "hertz")]
    pub tail_frequency: HertzU32,
    pub tail_duty: DutyRange,
}

impl Motors {
    pub const DEFAULT: Self = Self {
        main_frequency: HertzU32::from_raw(150),
        main_duty: DutyRange { min: 2, max: 98 },
        tail_frequency: HertzU32::from_raw(150),
        tail_duty: DutyRange { min: 2, max: 98 },
    };
}

impl Default for Motors {
    fn default() -> Self {
        Self::DEFAULT
    }
}

mod test {
    #[test]
    fn test_duty_range_clamp() {
        use super::DutyRange;

        let range = DutyRange { min: 2, max: 98 };
        assert_eq!(range.clamp(-300), 2);
        assert_eq!(range.clamp(0), 2);
        assert_eq!(range.clamp(50), 50);
        assert_eq!(range.clamp(98), 98);
        assert_eq!(range.clamp(1000), 98);
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize)]
pub struct PID {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct PIDs {
    pub altitude: PID,
    pub yaw: PID,
}

impl PIDs {
    pub const DEFAULT: Self = Self {
        altitude: PID { kp: 1.0, ki: 0.5, kd: 0.2 },
        yaw: PID { kp: 1.0, ki: 0.2, kd: 0.2 },
    };
}

impl Default for PIDs {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Yaw reference search performed right after lift-off.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TakeOff {
    /// Altitude held while searching, percent
    pub correction_altitude: i32,
    pub yaw_tolerance: i32,
    pub altitude_tolerance: i32,
    pub yaw_step: i32,
    /// Ticks within tolerance before the next step
    pub yaw_debounce: u8,
}

impl TakeOff {
    pub const DEFAULT: Self = Self {
        correction_altitude: 10,
        yaw_tolerance: 15,
        altitude_tolerance: 8,
        yaw_step: 30,
        yaw_debounce: 15,
    };
}

impl Default for TakeOff {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Flying {
    pub altitude_step: i32,
    pub yaw_step: i32,
}

impl Flying {
    pub const DEFAULT: Self = Self { altitude_step: 10, yaw_step: 15 };
}

impl Default for Flying {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Landing {
    pub yaw_tolerance: i32,
    pub yaw_step: i32,
    pub yaw_debounce: u8,
    pub altitude_tolerance: i32,
    pub altitude_step: i32,
    pub altitude_debounce: u8,
    /// At or below this altitude the rotors are cut
    pub ground_altitude: i32,
}

impl Landing {
    pub const DEFAULT: Self = Self {
        yaw_tolerance: 3,
        yaw_step: 30,
        yaw_debounce: 15,
        altitude_tolerance: 8,
        altitude_step: 10,
        altitude_debounce: 10,
        ground_altitude: 3,
    };
}

impl Default for Landing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

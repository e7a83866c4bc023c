use fugit::HertzU32;

pub trait Motor {
    fn enable(&mut self);
    fn disable(&mut self);
    /// Applies frequency and duty percent, duty is clamped into the motor's safe range.
    fn set(&mut self, frequency: HertzU32, duty: i32);
    /// Last applied duty percent, 0 while disabled.
    fn duty(&self) -> u8;
}

pub mod altimeter;
pub mod buttons;
pub mod rig;
pub mod yawmeter;

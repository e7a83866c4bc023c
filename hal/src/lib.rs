#![cfg_attr(not(test), no_std)]

pub mod altitude;
pub mod input;
pub mod motor;
pub mod reset;
pub mod telemetry;

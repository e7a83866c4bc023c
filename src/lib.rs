#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub mod components;
pub mod config;
pub mod datastore;
pub mod datastructures;
pub mod drivers;
pub mod fcs;
pub mod sync;

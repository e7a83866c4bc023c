pub mod out;
pub mod pid;
pub mod supervisor;

pub use supervisor::{State, Supervisor};

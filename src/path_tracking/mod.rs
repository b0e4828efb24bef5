// Plan execution and offline replay

pub mod executor;
pub mod simulation;

pub use executor::*;
pub use simulation::*;

// Vehicle implementations

pub mod simulated;

pub use simulated::*;

//! Common types, traits, and error definitions for grid_coverage
//!
//! This module provides the foundational building blocks shared by the
//! sensing model, the planners and the executor.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;

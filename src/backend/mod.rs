//! Backend abstraction layer
//!
//! Provides the types and traits the host renderer implements so the compositor
//! can stay independent of any GPU API.

pub mod traits;
pub mod types;

pub use traits::*;
pub use types::*;

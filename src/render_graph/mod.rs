//! Render Graph System
//!
//! The declarative execution path. Passes declare which resources they read and
//! write; compilation derives the execution order from those declarations, so
//! passes never author barriers themselves.

pub mod executor;
pub mod graph;
pub mod pass;
pub mod resource;

pub use executor::*;
pub use graph::*;
pub use pass::*;
pub use resource::*;

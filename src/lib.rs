//! PostFX Compositor - frame-synchronous post-processing orchestration
//!
//! Runs registered effects at four injection points of a camera's frame and
//! merges their output with a single uber composite draw. The host renderer
//! stays in charge of the GPU: the compositor talks to it through the traits in
//! [`backend`].
//!
//! # Features
//! - Static effect registry with per-point fan-out and shared instances
//! - Per-frame active sets with scene-view filtering
//! - Immediate execution through a command sink
//! - Declarative execution through a render graph with hazard-derived ordering
//! - Lazy, once-only effect initialization and de-duplicated teardown
//!
//! # Example
//!
//! ```ignore
//! let profile = SharedProfile::default();
//! let mut registry = EffectRegistry::new();
//! register_builtin_effects(&mut registry, &profile)?;
//!
//! let mut compositor = FrameCompositor::create(&registry, CompositorConfig::default());
//! compositor.render_frame(&mut renderer, &mut sink, &frame)?;
//! ```

pub mod backend;
pub mod compositor;
pub mod effect;
pub mod effects;
pub mod error;
pub mod frame;
pub mod profiling;
pub mod render_graph;

pub use compositor::{CompositorConfig, FrameCompositor, InjectionStage, ResourceHandles};
pub use effect::{
    Effect, EffectDescriptor, EffectRegistry, InjectionPoint, LifecycleState, RequiredInputs,
};
pub use effects::{register_builtin_effects, SharedProfile, VolumeProfile};
pub use error::{CompositorError, CompositorResult, EffectError, EffectResult, RegistryError};
pub use frame::{CameraData, FrameContext, FrameResources};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Built-in effects
//!
//! Each effect reads its settings from a shared [`VolumeProfile`] so the host
//! can change values between frames without touching the compositor.

mod ambient_probe;
mod depth_offset;
mod edge_detection;

pub use ambient_probe::{AmbientProbeSettings, AmbientProbeUpdate};
pub use depth_offset::{DepthOffset, DepthOffsetSettings};
pub use edge_detection::{EdgeDetection, EdgeDetectionSettings};

use std::sync::Arc;

use parking_lot::RwLock;

use crate::effect::{EffectDescriptor, EffectRegistry, InjectionPoint};
use crate::error::RegistryError;

/// Settings of every built-in effect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeProfile {
    pub ambient_probe: AmbientProbeSettings,
    pub depth_offset: DepthOffsetSettings,
    pub edge_detection: EdgeDetectionSettings,
}

pub type SharedProfile = Arc<RwLock<VolumeProfile>>;

pub const AMBIENT_PROBE_UPDATE: EffectDescriptor =
    EffectDescriptor::new("Ambient Probe Update", InjectionPoint::BEFORE_OPAQUE);
pub const DEPTH_OFFSET: EffectDescriptor =
    EffectDescriptor::new("Depth Offset", InjectionPoint::BEFORE_OPAQUE);
pub const EDGE_DETECTION: EffectDescriptor =
    EffectDescriptor::new("Edge Detection", InjectionPoint::BEFORE_POST_PROCESS);

/// Register the built-in effects in their execution order
pub fn register_builtin_effects(
    registry: &mut EffectRegistry,
    profile: &SharedProfile,
) -> Result<(), RegistryError> {
    let shared = Arc::clone(profile);
    registry.register(AMBIENT_PROBE_UPDATE, move || {
        AmbientProbeUpdate::new(Arc::clone(&shared))
    })?;

    let shared = Arc::clone(profile);
    registry.register(DEPTH_OFFSET, move || DepthOffset::new(Arc::clone(&shared)))?;

    let shared = Arc::clone(profile);
    registry.register(EDGE_DETECTION, move || EdgeDetection::new(Arc::clone(&shared)))?;

    Ok(())
}

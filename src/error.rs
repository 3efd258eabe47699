//! Compositor error types.

use crate::backend::{BackendError, TextureHandle};
use crate::effect::InjectionPoint;
use crate::render_graph::GraphError;
use thiserror::Error;

/// Errors raised by a single effect. They never leave the effect's slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    #[error("render failed: {0}")]
    RenderFailed(String),
    #[error("missing resource: {0}")]
    MissingResource(&'static str),
}

pub type EffectResult<T> = Result<T, EffectError>;

/// Errors raised while building the effect registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("effect descriptor has an empty name")]
    EmptyName,
    #[error("effect `{0}` is not assigned to any injection point")]
    NoInjectionPoint(String),
    #[error("effect `{0}` is already registered")]
    DuplicateName(String),
}

/// Errors surfaced to the host by the compositor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositorError {
    #[error("composite material `{0}` is not available")]
    MissingCompositeMaterial(String),
    #[error("composite source and destination alias target {0:?}")]
    AliasedCompositeTargets(TextureHandle),
    #[error("{0:?} does not name a single injection point")]
    InvalidInjectionPoint(InjectionPoint),
    #[error("compositor has been disposed")]
    Disposed,
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type CompositorResult<T> = Result<T, CompositorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompositorError::MissingCompositeMaterial("Hidden/PostFX/Uber".into());
        assert_eq!(
            err.to_string(),
            "composite material `Hidden/PostFX/Uber` is not available"
        );

        let err = RegistryError::NoInjectionPoint("Bloom".into());
        assert_eq!(
            err.to_string(),
            "effect `Bloom` is not assigned to any injection point"
        );
    }

    #[test]
    fn test_backend_error_converts() {
        let err: CompositorError = BackendError::DeviceLost.into();
        assert_eq!(err.to_string(), "Device lost");
    }
}

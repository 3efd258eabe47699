//! Host-facing traits
//!
//! The compositor never talks to a GPU API directly. The host renderer implements
//! these traits to receive commands, hand out camera targets and allocate the
//! transient images a render graph asks for.

use crate::backend::types::*;
use glam::Vec4;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Immediate command submission.
///
/// Commands are recorded in call order. Implementations must not assume the sink
/// outlives the call that received it.
pub trait CommandSink {
    /// Open a named profiling sample
    fn begin_sample(&mut self, name: &str);

    /// Close the innermost profiling sample
    fn end_sample(&mut self, name: &str);

    /// Bind a global vector visible to every subsequent draw
    fn set_global_vector(&mut self, name: &'static str, value: Vec4);

    /// Bind a global texture visible to every subsequent draw
    fn set_global_texture(&mut self, name: &'static str, texture: TextureHandle);

    /// Bind the color target for subsequent draws
    fn set_render_target(&mut self, target: TextureHandle, load: LoadAction, store: StoreAction);

    fn set_viewport(&mut self, rect: Rect);

    /// Draw `source` into the bound target with the host's default blit material
    fn blit_texture(&mut self, source: TextureHandle, scale_bias: Vec4);

    /// Draw procedural geometry with `material`, applying `properties` on top
    fn draw_procedural(
        &mut self,
        material: &MaterialHandle,
        pass: u32,
        topology: MeshTopology,
        vertex_count: u32,
        instance_count: u32,
        properties: &PropertyBlock,
    );
}

/// Allocation of transient images for the declarative path
pub trait TextureAllocator {
    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle>;

    fn release_texture(&mut self, texture: TextureHandle);
}

/// Pass scheduling request handed to the host when a stage has work this frame
#[derive(Debug, Clone, PartialEq)]
pub struct PassRequest {
    pub name: &'static str,
    pub event: RenderPassEvent,
    pub injection_point: crate::effect::InjectionPoint,
    /// Union of the inputs every active effect of the stage reads
    pub inputs: crate::effect::RequiredInputs,
}

/// The host renderer driving one camera
pub trait HostRenderer {
    /// Current camera color target (the back buffer of the swap chain pair)
    fn camera_color_target(&self) -> TextureHandle;

    fn camera_depth_target(&self) -> TextureHandle;

    /// Descriptor of the camera color target
    fn camera_target_descriptor(&self) -> &TextureDescriptor;

    /// The color buffer that is not currently the camera target
    fn camera_color_front_buffer(&mut self, sink: &mut dyn CommandSink) -> TextureHandle;

    /// Make the front buffer the new camera color target
    fn swap_color_buffer(&mut self, sink: &mut dyn CommandSink);

    /// Create a material from a built-in shader, `None` if the shader is unavailable
    fn create_engine_material(&mut self, shader: &str) -> Option<MaterialHandle>;

    fn enqueue_pass(&mut self, request: PassRequest);
}

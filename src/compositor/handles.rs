//! Per-frame image handles shared with the effects

use crate::backend::{DepthBits, TextureDescriptor, TextureFormat, TextureHandle};

/// Source, destination and depth images of the stage currently executing.
///
/// Owned by the compositor and rebound once per camera per frame. Effects get a
/// shared reference for the duration of one `render` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceHandles {
    /// Current camera color target
    pub source: TextureHandle,
    /// Front buffer acquired for the composite, `None` outside of it
    pub dest: Option<TextureHandle>,
    pub depth: TextureHandle,
    /// Camera target descriptor with mipmapping disabled
    descriptor: TextureDescriptor,
}

impl ResourceHandles {
    pub fn new(source: TextureHandle, depth: TextureHandle, camera: &TextureDescriptor) -> Self {
        let mut handles = Self {
            source,
            dest: None,
            depth,
            descriptor: TextureDescriptor::default(),
        };
        handles.bind(source, depth, camera);
        handles
    }

    /// Rebind to the current camera, reusing the stored descriptor
    pub fn bind(&mut self, source: TextureHandle, depth: TextureHandle, camera: &TextureDescriptor) {
        self.source = source;
        self.dest = None;
        self.depth = depth;
        self.descriptor.clone_from(camera);
        self.descriptor.use_mip_map = false;
        self.descriptor.auto_generate_mips = false;
    }

    /// Camera target descriptor as bound for this frame
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Scratch descriptor matching the camera's size and format
    pub fn compatible_descriptor(&self) -> TextureDescriptor {
        compatible_descriptor(
            &self.descriptor,
            self.descriptor.width,
            self.descriptor.height,
            self.descriptor.format,
            DepthBits::None,
        )
    }

    /// Scratch descriptor with overridden size, format and depth
    pub fn compatible_descriptor_with(
        &self,
        width: u32,
        height: u32,
        format: TextureFormat,
        depth_bits: DepthBits,
    ) -> TextureDescriptor {
        compatible_descriptor(&self.descriptor, width, height, format, depth_bits)
    }
}

/// Derive a single-sampled, mip-less descriptor from `base`
pub fn compatible_descriptor(
    base: &TextureDescriptor,
    width: u32,
    height: u32,
    format: TextureFormat,
    depth_bits: DepthBits,
) -> TextureDescriptor {
    TextureDescriptor {
        width,
        height,
        format,
        depth_bits,
        sample_count: 1,
        mip_levels: 1,
        use_mip_map: false,
        auto_generate_mips: false,
        ..base.clone()
    }
}

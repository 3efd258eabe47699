//! Virtual resources for the render graph

use crate::backend::types::*;

/// Unique identifier for a render graph resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u32);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Virtual texture resource in the render graph
#[derive(Debug, Clone)]
pub struct VirtualTexture {
    pub id: ResourceId,
    pub desc: TextureDescriptor,
    pub name: String,
}

/// Resource type enumeration
#[derive(Debug, Clone)]
pub enum VirtualResource {
    /// Allocated by the executor for the span of passes that use it
    Transient(VirtualTexture),
    /// Owned by the host (camera color, camera depth)
    Imported {
        texture: VirtualTexture,
        handle: TextureHandle,
    },
}

impl VirtualResource {
    pub fn desc(&self) -> &TextureDescriptor {
        &self.texture().desc
    }

    fn texture(&self) -> &VirtualTexture {
        match self {
            VirtualResource::Transient(texture) => texture,
            VirtualResource::Imported { texture, .. } => texture,
        }
    }
}

/// How a pass uses a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceUsage {
    /// Read as a texture (sampled)
    TextureRead,
    /// Write as a color attachment
    RenderTarget { index: u32 },
    /// Read/write as a color attachment that is also loaded
    RenderTargetLoad { index: u32 },
    /// Depth/stencil attachment
    DepthStencilRead,
    DepthStencilWrite,
}

/// Resource access declaration for a pass
#[derive(Debug, Clone)]
pub struct ResourceAccess {
    pub resource: ResourceId,
    pub usage: ResourceUsage,
}

impl ResourceAccess {
    pub fn is_read(&self) -> bool {
        matches!(
            self.usage,
            ResourceUsage::TextureRead
                | ResourceUsage::RenderTargetLoad { .. }
                | ResourceUsage::DepthStencilRead
        )
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self.usage,
            ResourceUsage::RenderTarget { .. }
                | ResourceUsage::RenderTargetLoad { .. }
                | ResourceUsage::DepthStencilWrite
        )
    }
}

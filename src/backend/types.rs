//! Common types shared between the compositor and the host renderer

use glam::Vec4;

/// Handle to a GPU image owned by the host (camera target, intermediate, scratch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Handle to a material created by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialHandle {
    id: u64,
    shader: String,
}

impl MaterialHandle {
    pub fn new(id: u64, shader: impl Into<String>) -> Self {
        Self {
            id,
            shader: shader.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn shader(&self) -> &str {
        &self.shader
    }
}

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Rgba16Float,
    Rgba32Float,
    R32Float,
    Rg16Float,
    Depth32Float,
    Depth24PlusStencil8,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32Float | TextureFormat::Depth24PlusStencil8
        )
    }
}

/// Depth buffer precision requested for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthBits {
    #[default]
    None,
    Depth16,
    Depth24,
    Depth32,
}

/// Describes an image target, as reported by the camera or requested for scratch space
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub sample_count: u32,
    pub mip_levels: u32,
    pub use_mip_map: bool,
    pub auto_generate_mips: bool,
    pub depth_bits: DepthBits,
    /// Whether the graph should clear the target on first use
    pub clear_buffer: bool,
}

impl TextureDescriptor {
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// `(w, h, 1/w, 1/h)` as expected by `_SourceSize`
    pub fn size_vector(&self) -> Vec4 {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        Vec4::new(w, h, 1.0 / w, 1.0 / h)
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8Unorm,
            sample_count: 1,
            mip_levels: 1,
            use_mip_map: false,
            auto_generate_mips: false,
            depth_bits: DepthBits::None,
            clear_buffer: true,
        }
    }
}

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAction {
    Load,
    Clear,
    DontCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Store,
    Resolve,
    DontCare,
}

/// Primitive topology for procedural draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshTopology {
    Triangles,
    Lines,
    Points,
}

/// Kind of camera being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraType {
    #[default]
    Game,
    /// Editor scene view camera
    SceneView,
    /// Asset/material preview camera
    Preview,
    Reflection,
}

/// Point in the host's camera sequence where a pass is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderPassEvent {
    BeforeRenderingOpaques,
    AfterRenderingSkybox,
    BeforeRenderingPostProcessing,
    AfterRendering,
}

/// Shader property names bound by the compositor
pub mod shader_ids {
    pub const BLIT_TEXTURE: &str = "_BlitTexture";
    pub const BLIT_SCALE_BIAS: &str = "_BlitScaleBias";
    pub const SOURCE_SIZE: &str = "_SourceSize";
    pub const CAMERA_DEPTH_TEXTURE: &str = "_CameraDepthTexture";
}

/// Scale/bias used for an unscaled full-screen blit
pub const IDENTITY_SCALE_BIAS: Vec4 = Vec4::new(1.0, 1.0, 0.0, 0.0);

/// Value bound to a material property
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Texture(TextureHandle),
    Vector(Vec4),
    Float(f32),
}

/// Per-draw material property overrides.
///
/// Capacity survives `clear`, so a block reused across draws stops allocating
/// once it has seen its largest binding set.
#[derive(Debug, Clone, Default)]
pub struct PropertyBlock {
    entries: Vec<(&'static str, PropertyValue)>,
}

impl PropertyBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn set_texture(&mut self, name: &'static str, texture: TextureHandle) {
        self.set(name, PropertyValue::Texture(texture));
    }

    pub fn set_vector(&mut self, name: &'static str, value: Vec4) {
        self.set(name, PropertyValue::Vector(value));
    }

    pub fn set_float(&mut self, name: &'static str, value: f32) {
        self.set(name, PropertyValue::Float(value));
    }

    fn set(&mut self, name: &'static str, value: PropertyValue) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }

    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        match self.get(name) {
            Some(PropertyValue::Texture(handle)) => Some(handle),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, PropertyValue)> + '_ {
        self.entries.iter().copied()
    }
}

//! Uber composite material and the full-screen draw that applies it

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{
    shader_ids, CommandSink, HostRenderer, LoadAction, MaterialHandle, MeshTopology,
    PropertyBlock, StoreAction, TextureHandle, IDENTITY_SCALE_BIAS,
};
use crate::error::{CompositorError, CompositorResult};

use super::CompositorConfig;

/// Material used by the final composite, read-only once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UberMaterial {
    handle: MaterialHandle,
    pass_index: u32,
}

impl UberMaterial {
    pub fn new(handle: MaterialHandle, pass_index: u32) -> Self {
        Self { handle, pass_index }
    }

    pub fn handle(&self) -> &MaterialHandle {
        &self.handle
    }

    pub fn pass_index(&self) -> u32 {
        self.pass_index
    }
}

/// Composite state owned by one compositor: the lazily created material and
/// the property block reused by every composite draw.
pub struct UberComposite {
    shader: String,
    pass_index: u32,
    material: Option<UberMaterial>,
    properties: Arc<Mutex<PropertyBlock>>,
}

impl UberComposite {
    pub fn new(config: &CompositorConfig) -> Self {
        Self {
            shader: config.uber_shader.clone(),
            pass_index: config.uber_pass_index,
            material: None,
            properties: Arc::new(Mutex::new(PropertyBlock::new())),
        }
    }

    pub fn shader(&self) -> &str {
        &self.shader
    }

    pub fn material(&self) -> Option<&UberMaterial> {
        self.material.as_ref()
    }

    /// Create the material if it does not exist yet. An existing material is
    /// never replaced.
    pub fn ensure_material(&mut self, renderer: &mut dyn HostRenderer) -> Option<&UberMaterial> {
        if self.material.is_none() {
            match renderer.create_engine_material(&self.shader) {
                Some(handle) => {
                    log::debug!("Created composite material from `{}`", self.shader);
                    self.material = Some(UberMaterial::new(handle, self.pass_index));
                }
                None => log::warn!("Composite shader `{}` is not available yet", self.shader),
            }
        }
        self.material.as_ref()
    }

    pub(crate) fn shared_properties(&self) -> Arc<Mutex<PropertyBlock>> {
        Arc::clone(&self.properties)
    }

    /// Composite `source` into `dest` with the uber material.
    ///
    /// Falls back to a plain copy when the material is missing, so the frame
    /// still reaches `dest`. Fails if both handles name the same image.
    pub fn composite(
        &self,
        sink: &mut dyn CommandSink,
        source: TextureHandle,
        dest: TextureHandle,
    ) -> CompositorResult<()> {
        if source == dest {
            return Err(CompositorError::AliasedCompositeTargets(dest));
        }

        sink.set_render_target(dest, LoadAction::DontCare, StoreAction::Store);
        if let Err(err) = self.draw(sink, source) {
            log::error!("{}; copying the source through unchanged", err);
            sink.blit_texture(source, IDENTITY_SCALE_BIAS);
        }
        Ok(())
    }

    /// Full-screen triangle with the uber material into the bound target
    pub fn draw(&self, sink: &mut dyn CommandSink, source: TextureHandle) -> CompositorResult<()> {
        let material = self
            .material
            .as_ref()
            .ok_or_else(|| CompositorError::MissingCompositeMaterial(self.shader.clone()))?;
        draw_full_screen(sink, material, &self.properties, source);
        Ok(())
    }

    /// Drop the material at teardown
    pub(crate) fn invalidate(&mut self) {
        self.material = None;
        self.properties.lock().clear();
    }
}

pub(crate) fn draw_full_screen(
    sink: &mut dyn CommandSink,
    material: &UberMaterial,
    properties: &Mutex<PropertyBlock>,
    source: TextureHandle,
) {
    let mut properties = properties.lock();
    properties.clear();
    properties.set_texture(shader_ids::BLIT_TEXTURE, source);
    properties.set_vector(shader_ids::BLIT_SCALE_BIAS, IDENTITY_SCALE_BIAS);

    sink.draw_procedural(
        material.handle(),
        material.pass_index(),
        MeshTopology::Triangles,
        3,
        1,
        &properties,
    );
}

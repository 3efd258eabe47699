//! Render graph passes of the final composite

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{LoadAction, PropertyBlock, StoreAction, IDENTITY_SCALE_BIAS};
use crate::render_graph::*;

use super::material::{draw_full_screen, UberMaterial};

pub const COPY_PASS_NAME: &str = "Copy Color Full Screen";
pub const UBER_PASS_NAME: &str = "Uber Post Processing";

/// Copies the active color into a graph-owned intermediate
pub struct CopyColorPass {
    source: ResourceId,
    dest: ResourceId,
}

impl CopyColorPass {
    pub fn new(source: ResourceId, dest: ResourceId) -> Self {
        Self { source, dest }
    }
}

impl RenderPass for CopyColorPass {
    fn name(&self) -> &str {
        COPY_PASS_NAME
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(self.source, ResourceUsage::TextureRead);
        ctx.write(self.dest, ResourceUsage::RenderTarget { index: 0 });
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let (Some(source), Some(dest)) = (ctx.get_texture(self.source), ctx.get_texture(self.dest))
        else {
            log::error!("{}: unresolved textures", COPY_PASS_NAME);
            return;
        };

        ctx.sink
            .set_render_target(dest, LoadAction::DontCare, StoreAction::Store);
        ctx.sink.blit_texture(source, IDENTITY_SCALE_BIAS);
    }
}

/// Applies the uber material to the intermediate, writing the active color
pub struct UberCompositePass {
    source: ResourceId,
    dest: ResourceId,
    material: Option<UberMaterial>,
    properties: Arc<Mutex<PropertyBlock>>,
}

impl UberCompositePass {
    pub fn new(
        source: ResourceId,
        dest: ResourceId,
        material: Option<UberMaterial>,
        properties: Arc<Mutex<PropertyBlock>>,
    ) -> Self {
        Self {
            source,
            dest,
            material,
            properties,
        }
    }
}

impl RenderPass for UberCompositePass {
    fn name(&self) -> &str {
        UBER_PASS_NAME
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(self.source, ResourceUsage::TextureRead);
        ctx.write(self.dest, ResourceUsage::RenderTarget { index: 0 });
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let (Some(source), Some(dest)) = (ctx.get_texture(self.source), ctx.get_texture(self.dest))
        else {
            log::error!("{}: unresolved textures", UBER_PASS_NAME);
            return;
        };
        if source == dest {
            log::error!("{}: source and destination alias {:?}", UBER_PASS_NAME, dest);
            return;
        }

        ctx.sink
            .set_render_target(dest, LoadAction::DontCare, StoreAction::Store);
        match &self.material {
            Some(material) => draw_full_screen(&mut *ctx.sink, material, &self.properties, source),
            None => ctx.sink.blit_texture(source, IDENTITY_SCALE_BIAS),
        }
    }
}

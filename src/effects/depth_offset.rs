//! View-space depth offset applied before opaque geometry

use glam::Vec4;

use crate::backend::{shader_ids, CommandSink};
use crate::compositor::{ResourceHandles, UberMaterial};
use crate::effect::{Effect, InjectionPoint, RequiredInputs};
use crate::error::{EffectError, EffectResult};
use crate::frame::{FrameContext, FrameResources};
use crate::render_graph::*;

use super::SharedProfile;

pub const DEPTH_OFFSET_PARAMS: &str = "_DepthOffsetParams";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthOffsetSettings {
    pub enabled: bool,
    /// View-space offset in world units, pushing geometry away from the camera
    pub offset: f32,
    /// Largest accepted `|offset|`
    pub max_offset: f32,
}

impl Default for DepthOffsetSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            offset: 0.0,
            max_offset: 10.0,
        }
    }
}

impl DepthOffsetSettings {
    fn params(&self) -> Vec4 {
        let limit = self.max_offset.abs();
        let offset = self.offset.max(-limit).min(limit);
        Vec4::new(offset, limit, 0.0, 0.0)
    }
}

/// Publishes a depth offset for the opaque pass. Hidden in the scene view so
/// editing happens on undistorted depth.
pub struct DepthOffset {
    profile: SharedProfile,
    settings: DepthOffsetSettings,
}

impl DepthOffset {
    pub fn new(profile: SharedProfile) -> Self {
        Self {
            profile,
            settings: DepthOffsetSettings::default(),
        }
    }
}

impl Effect for DepthOffset {
    fn visible_in_scene_view(&self) -> bool {
        false
    }

    fn required_inputs(&self) -> RequiredInputs {
        RequiredInputs::DEPTH
    }

    fn initialize(&mut self) -> EffectResult<()> {
        let max_offset = self.profile.read().depth_offset.max_offset;
        if !(max_offset.is_finite() && max_offset > 0.0) {
            return Err(EffectError::InitializationFailed(format!(
                "max offset must be positive, got {max_offset}"
            )));
        }
        Ok(())
    }

    fn setup(
        &mut self,
        _frame: &FrameContext,
        _point: InjectionPoint,
        _composite: Option<&UberMaterial>,
    ) -> bool {
        self.settings = self.profile.read().depth_offset;
        self.settings.enabled && self.settings.offset != 0.0
    }

    fn render(
        &mut self,
        sink: &mut dyn CommandSink,
        handles: &ResourceHandles,
        _frame: &FrameContext,
        _point: InjectionPoint,
    ) -> EffectResult<()> {
        sink.set_global_texture(shader_ids::CAMERA_DEPTH_TEXTURE, handles.depth);
        sink.set_global_vector(DEPTH_OFFSET_PARAMS, self.settings.params());
        Ok(())
    }

    fn record_render_graph(
        &mut self,
        graph: &mut RenderGraph,
        resources: &FrameResources,
        _point: InjectionPoint,
    ) -> EffectResult<()> {
        graph.add_pass(DepthOffsetPass {
            color: resources.active_color,
            depth: resources.camera_depth,
            params: self.settings.params(),
        });
        Ok(())
    }

    fn dispose(&mut self) {}
}

struct DepthOffsetPass {
    color: ResourceId,
    depth: ResourceId,
    params: Vec4,
}

impl RenderPass for DepthOffsetPass {
    fn name(&self) -> &str {
        "Depth Offset"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(self.depth, ResourceUsage::DepthStencilRead);
        ctx.write(self.color, ResourceUsage::RenderTargetLoad { index: 0 });
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        if let Some(depth) = ctx.get_texture(self.depth) {
            ctx.sink.set_global_texture(shader_ids::CAMERA_DEPTH_TEXTURE, depth);
        }
        ctx.sink.set_global_vector(DEPTH_OFFSET_PARAMS, self.params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_offset_is_clamped() {
        let settings = DepthOffsetSettings {
            enabled: true,
            offset: -25.0,
            max_offset: 4.0,
        };
        assert_eq!(settings.params().x, -4.0);
    }

    #[test]
    fn test_invalid_range_fails_initialize() {
        let profile = SharedProfile::default();
        profile.write().depth_offset.max_offset = 0.0;
        let mut effect = DepthOffset::new(Arc::clone(&profile));

        assert!(matches!(
            effect.initialize(),
            Err(EffectError::InitializationFailed(_))
        ));
    }
}

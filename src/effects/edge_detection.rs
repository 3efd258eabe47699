//! Depth/normal edge detection, resolved by the uber composite

use glam::Vec4;

use crate::backend::{shader_ids, CommandSink};
use crate::compositor::{ResourceHandles, UberMaterial};
use crate::effect::{Effect, InjectionPoint, RequiredInputs};
use crate::error::EffectResult;
use crate::frame::{FrameContext, FrameResources};
use crate::render_graph::*;

use super::SharedProfile;

pub const EDGE_DETECTION_PARAMS: &str = "_EdgeDetectionParams";
pub const EDGE_COLOR: &str = "_EdgeColor";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDetectionSettings {
    pub enabled: bool,
    pub depth_threshold: f32,
    pub normal_threshold: f32,
    /// Edge width in pixels
    pub thickness: f32,
    pub color: Vec4,
}

impl Default for EdgeDetectionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            depth_threshold: 0.1,
            normal_threshold: 0.4,
            thickness: 1.0,
            color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

impl EdgeDetectionSettings {
    fn params(&self) -> Vec4 {
        Vec4::new(
            self.depth_threshold,
            self.normal_threshold,
            self.thickness.max(0.0),
            0.0,
        )
    }
}

/// Feeds the edge parameters to the uber shader.
///
/// The effect itself draws nothing: the uber composite samples depth and
/// normals and blends edges in, so the effect is only active while the
/// composite material exists.
pub struct EdgeDetection {
    profile: SharedProfile,
    settings: EdgeDetectionSettings,
}

impl EdgeDetection {
    pub fn new(profile: SharedProfile) -> Self {
        Self {
            profile,
            settings: EdgeDetectionSettings::default(),
        }
    }
}

impl Effect for EdgeDetection {
    fn visible_in_scene_view(&self) -> bool {
        true
    }

    fn required_inputs(&self) -> RequiredInputs {
        RequiredInputs::DEPTH | RequiredInputs::NORMAL
    }

    fn initialize(&mut self) -> EffectResult<()> {
        Ok(())
    }

    fn setup(
        &mut self,
        _frame: &FrameContext,
        _point: InjectionPoint,
        composite: Option<&UberMaterial>,
    ) -> bool {
        self.settings = self.profile.read().edge_detection;
        self.settings.enabled && self.settings.thickness > 0.0 && composite.is_some()
    }

    fn render(
        &mut self,
        sink: &mut dyn CommandSink,
        handles: &ResourceHandles,
        _frame: &FrameContext,
        _point: InjectionPoint,
    ) -> EffectResult<()> {
        sink.set_global_texture(shader_ids::CAMERA_DEPTH_TEXTURE, handles.depth);
        sink.set_global_vector(EDGE_DETECTION_PARAMS, self.settings.params());
        sink.set_global_vector(EDGE_COLOR, self.settings.color);
        Ok(())
    }

    fn record_render_graph(
        &mut self,
        graph: &mut RenderGraph,
        resources: &FrameResources,
        _point: InjectionPoint,
    ) -> EffectResult<()> {
        graph.add_pass(EdgeParamsPass {
            color: resources.active_color,
            depth: resources.camera_depth,
            params: self.settings.params(),
            edge_color: self.settings.color,
        });
        Ok(())
    }

    fn dispose(&mut self) {}
}

struct EdgeParamsPass {
    color: ResourceId,
    depth: ResourceId,
    params: Vec4,
    edge_color: Vec4,
}

impl RenderPass for EdgeParamsPass {
    fn name(&self) -> &str {
        "Edge Detection"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(self.depth, ResourceUsage::TextureRead);
        // Edges are blended by the uber pass, which rewrites this target
        ctx.write(self.color, ResourceUsage::RenderTargetLoad { index: 0 });
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        if let Some(depth) = ctx.get_texture(self.depth) {
            ctx.sink.set_global_texture(shader_ids::CAMERA_DEPTH_TEXTURE, depth);
        }
        ctx.sink.set_global_vector(EDGE_DETECTION_PARAMS, self.params);
        ctx.sink.set_global_vector(EDGE_COLOR, self.edge_color);
    }
}

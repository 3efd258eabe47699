//! Ambient probe refresh before opaque geometry

use glam::Vec4;

use crate::backend::CommandSink;
use crate::compositor::{ResourceHandles, UberMaterial};
use crate::effect::{Effect, InjectionPoint, RequiredInputs};
use crate::error::EffectResult;
use crate::frame::{FrameContext, FrameResources};
use crate::render_graph::*;

use super::SharedProfile;

pub const AMBIENT_PROBE_PARAMS: &str = "_AmbientProbeParams";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientProbeSettings {
    pub enabled: bool,
    pub intensity: f32,
    /// Frames between two refreshes, `0` refreshes every frame
    pub update_interval: u32,
}

impl Default for AmbientProbeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 1.0,
            update_interval: 0,
        }
    }
}

impl AmbientProbeSettings {
    fn params(&self, frame_index: u64) -> Vec4 {
        Vec4::new(self.intensity, frame_index as f32, 0.0, 0.0)
    }
}

/// Pushes refreshed ambient lighting parameters to the opaque shaders
pub struct AmbientProbeUpdate {
    profile: SharedProfile,
    settings: AmbientProbeSettings,
    /// Frame the last `setup` call was made for
    frame_index: u64,
    last_update: Option<u64>,
}

impl AmbientProbeUpdate {
    pub fn new(profile: SharedProfile) -> Self {
        Self {
            profile,
            settings: AmbientProbeSettings::default(),
            frame_index: 0,
            last_update: None,
        }
    }

    fn is_due(&self, frame_index: u64) -> bool {
        match self.last_update {
            None => true,
            Some(last) if last == frame_index => true,
            Some(last) => frame_index >= last + self.settings.update_interval as u64,
        }
    }
}

impl Effect for AmbientProbeUpdate {
    fn visible_in_scene_view(&self) -> bool {
        true
    }

    fn required_inputs(&self) -> RequiredInputs {
        RequiredInputs::empty()
    }

    fn initialize(&mut self) -> EffectResult<()> {
        self.last_update = None;
        Ok(())
    }

    fn setup(
        &mut self,
        frame: &FrameContext,
        _point: InjectionPoint,
        _composite: Option<&UberMaterial>,
    ) -> bool {
        self.settings = self.profile.read().ambient_probe;
        self.frame_index = frame.frame_index;
        self.settings.enabled && self.is_due(frame.frame_index)
    }

    fn render(
        &mut self,
        sink: &mut dyn CommandSink,
        _handles: &ResourceHandles,
        frame: &FrameContext,
        _point: InjectionPoint,
    ) -> EffectResult<()> {
        sink.set_global_vector(AMBIENT_PROBE_PARAMS, self.settings.params(frame.frame_index));
        self.last_update = Some(frame.frame_index);
        Ok(())
    }

    fn record_render_graph(
        &mut self,
        graph: &mut RenderGraph,
        resources: &FrameResources,
        _point: InjectionPoint,
    ) -> EffectResult<()> {
        graph.add_pass(AmbientProbePass {
            color: resources.active_color,
            params: self.settings.params(self.frame_index),
        });
        self.last_update = Some(self.frame_index);
        Ok(())
    }

    fn dispose(&mut self) {
        self.last_update = None;
    }
}

struct AmbientProbePass {
    color: ResourceId,
    params: Vec4,
}

impl RenderPass for AmbientProbePass {
    fn name(&self) -> &str {
        "Ambient Probe Update"
    }

    /// The probe globals are consumed by whatever draws into the color target next.
    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.write(self.color, ResourceUsage::RenderTargetLoad { index: 0 });
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        ctx.sink.set_global_vector(AMBIENT_PROBE_PARAMS, self.params);
    }
}

//! One injection point's effects and their per-frame active set

use crate::backend::{shader_ids, CommandSink, HostRenderer, PassRequest};
use crate::effect::{InjectionPoint, RequiredInputs, SharedEffect};
use crate::error::{CompositorError, CompositorResult};
use crate::frame::{FrameContext, FrameResources};
use crate::profiling::ProfilingSampler;
use crate::render_graph::{GraphError, RenderGraph};

use super::handles::ResourceHandles;
use super::material::{UberComposite, UberMaterial};
use super::passes::{CopyColorPass, UberCompositePass, COPY_PASS_NAME};

/// Effects registered at one injection point.
///
/// The active set is rebuilt by every [`InjectionStage::prepare_active_set`]
/// call and only ever holds indices into `effects`, in registration order.
pub struct InjectionStage {
    point: InjectionPoint,
    effects: Vec<SharedEffect>,
    samplers: Vec<ProfilingSampler>,
    active: Vec<usize>,
    inputs: RequiredInputs,
}

impl InjectionStage {
    pub fn new(point: InjectionPoint, effects: Vec<SharedEffect>) -> Self {
        let samplers = effects
            .iter()
            .map(|slot| ProfilingSampler::new(slot.lock().descriptor().name))
            .collect();
        let active = Vec::with_capacity(effects.len());

        Self {
            point,
            effects,
            samplers,
            active,
            inputs: RequiredInputs::empty(),
        }
    }

    pub fn point(&self) -> InjectionPoint {
        self.point
    }

    pub fn name(&self) -> &'static str {
        self.point.pass_name()
    }

    pub fn effects(&self) -> &[SharedEffect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Indices of the effects that accepted this frame
    pub fn active_indices(&self) -> &[usize] {
        &self.active
    }

    /// Display names of the active effects, in execution order
    pub fn active_names(&self) -> Vec<&'static str> {
        self.active
            .iter()
            .map(|&index| self.effects[index].lock().descriptor().name)
            .collect()
    }

    /// Union of the inputs the active effects read
    pub fn required_inputs(&self) -> RequiredInputs {
        self.inputs
    }

    /// Whether this stage performs the uber composite after its effects
    pub fn composites(&self) -> bool {
        self.point == InjectionPoint::BEFORE_POST_PROCESS
    }

    /// Scheduling request for the host, `None` for points without a host event
    pub fn pass_request(&self) -> Option<PassRequest> {
        self.point.render_pass_event().map(|event| PassRequest {
            name: self.name(),
            event,
            injection_point: self.point,
            inputs: self.inputs,
        })
    }

    /// Rebuild the active set for `frame`. Returns whether any effect accepted.
    pub fn prepare_active_set(
        &mut self,
        frame: &FrameContext,
        material: Option<&UberMaterial>,
    ) -> bool {
        let scene_view = frame.is_scene_view();
        self.active.clear();
        self.inputs = RequiredInputs::empty();

        for (index, slot) in self.effects.iter().enumerate() {
            let mut slot = slot.lock();
            if !slot.is_schedulable() {
                continue;
            }
            let effect = slot.effect_mut();
            if scene_view && !effect.visible_in_scene_view() {
                continue;
            }
            if effect.setup(frame, self.point, material) {
                self.active.push(index);
                self.inputs |= effect.required_inputs();
            }
        }

        log::trace!(
            "{}: {} of {} effects active",
            self.name(),
            self.active.len(),
            self.effects.len()
        );
        !self.active.is_empty()
    }

    /// Immediate path: run the active effects, then composite if this is the
    /// pre-post-processing stage.
    pub fn execute(
        &mut self,
        sink: &mut dyn CommandSink,
        renderer: &mut dyn HostRenderer,
        handles: &mut ResourceHandles,
        frame: &FrameContext,
        composite: &UberComposite,
    ) -> CompositorResult<()> {
        if self.active.is_empty() {
            return Ok(());
        }

        sink.set_global_vector(shader_ids::SOURCE_SIZE, handles.descriptor().size_vector());

        for &index in &self.active {
            let mut slot = self.effects[index].lock();
            if !slot.ensure_initialized() {
                continue;
            }
            let point = self.point;
            let result = self.samplers[index].scope(sink, |sink| {
                slot.effect_mut().render(sink, handles, frame, point)
            });
            if let Err(err) = result {
                log::error!("Effect `{}` failed at {}: {}", slot.descriptor().name, self.name(), err);
            }
        }

        if self.composites() {
            let dest = renderer.camera_color_front_buffer(sink);
            // The swap is not undone, so reject aliasing before it happens
            if dest == handles.source {
                return Err(CompositorError::AliasedCompositeTargets(dest));
            }
            renderer.swap_color_buffer(sink);
            handles.dest = Some(dest);
            composite.composite(sink, handles.source, dest)?;
        }
        Ok(())
    }

    /// Declarative path: let the active effects add their passes, then add the
    /// composite passes if this is the pre-post-processing stage.
    pub fn record_graph(
        &mut self,
        graph: &mut RenderGraph,
        resources: &FrameResources,
        composite: &UberComposite,
        intermediate_name: &str,
    ) -> CompositorResult<()> {
        if self.active.is_empty() {
            return Ok(());
        }

        for &index in &self.active {
            let mut slot = self.effects[index].lock();
            if !slot.ensure_initialized() {
                continue;
            }
            if let Err(err) = slot.effect_mut().record_render_graph(graph, resources, self.point) {
                log::error!(
                    "Effect `{}` failed to record at {}: {}",
                    slot.descriptor().name,
                    self.name(),
                    err
                );
            }
        }

        if self.composites() {
            record_composite(graph, resources, composite, intermediate_name)?;
        }
        Ok(())
    }
}

/// Copy the active color into an intermediate, then composite it back
fn record_composite(
    graph: &mut RenderGraph,
    resources: &FrameResources,
    composite: &UberComposite,
    intermediate_name: &str,
) -> CompositorResult<()> {
    let mut desc = graph
        .texture_desc(resources.camera_color)
        .cloned()
        .ok_or_else(|| GraphError::UnknownResource {
            pass: COPY_PASS_NAME.to_string(),
            resource: resources.camera_color,
        })?;
    desc.label = Some(intermediate_name.to_string());
    desc.clear_buffer = false;

    let intermediate = graph.create_texture(intermediate_name, desc);
    graph.add_pass(CopyColorPass::new(resources.active_color, intermediate));
    graph.add_pass(UberCompositePass::new(
        intermediate,
        resources.active_color,
        composite.material().cloned(),
        composite.shared_properties(),
    ));

    if composite.material().is_none() {
        log::error!(
            "Composite material `{}` is not available; recording a pass-through copy",
            composite.shader()
        );
    }
    Ok(())
}

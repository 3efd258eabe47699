//! Frame compositor
//!
//! Drives the four injection stages of a camera in pipeline order:
//!
//! ```text
//! BeforeOpaque -> AfterOpaqueAndSky -> BeforePostProcess (+ uber composite) -> AfterPostProcess
//! ```
//!
//! Per frame the host calls [`FrameCompositor::add_render_passes`] to compute
//! every stage's active set and get a [`PassRequest`](crate::backend::PassRequest)
//! for each stage with work. It then runs the enqueued stages either
//! immediately through [`FrameCompositor::execute`] or declaratively through
//! [`FrameCompositor::record_render_graph`].

mod handles;
mod material;
mod passes;
mod stage;

pub use handles::{compatible_descriptor, ResourceHandles};
pub use material::{UberComposite, UberMaterial};
pub use passes::{CopyColorPass, UberCompositePass, COPY_PASS_NAME, UBER_PASS_NAME};
pub use stage::InjectionStage;

use std::sync::Arc;

use crate::backend::{CommandSink, HostRenderer};
use crate::effect::{EffectRegistry, InjectionPoint, LifecycleState, SharedEffect};
use crate::error::{CompositorError, CompositorResult};
use crate::frame::{FrameContext, FrameResources};
use crate::render_graph::RenderGraph;

/// Compositor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositorConfig {
    /// Built-in shader the uber composite material is created from
    pub uber_shader: String,
    pub uber_pass_index: u32,
    /// Name of the graph intermediate the composite copies into
    pub intermediate_name: String,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            uber_shader: "Hidden/PostFX/Uber".to_string(),
            uber_pass_index: 0,
            intermediate_name: "_CameraColorFullScreenPass".to_string(),
        }
    }
}

/// Per-camera post-processing driver.
///
/// Owns one [`InjectionStage`] per injection point, the frame's
/// [`ResourceHandles`] and the uber composite state. Effect instances are
/// disposed exactly once, either by [`FrameCompositor::dispose`] or on drop.
pub struct FrameCompositor {
    config: CompositorConfig,
    stages: Vec<InjectionStage>,
    handles: Option<ResourceHandles>,
    composite: UberComposite,
    disposed: bool,
}

impl FrameCompositor {
    /// Instantiate every registered effect and build the stages
    pub fn create(registry: &EffectRegistry, config: CompositorConfig) -> Self {
        let stages: Vec<InjectionStage> = InjectionPoint::PIPELINE_ORDER
            .iter()
            .zip(registry.instantiate())
            .map(|(&point, effects)| InjectionStage::new(point, effects))
            .collect();

        log::info!(
            "Created post-processing compositor: {} registrations, {} stage slots",
            registry.len(),
            stages.iter().map(|s| s.effects().len()).sum::<usize>()
        );

        Self {
            composite: UberComposite::new(&config),
            config,
            stages,
            handles: None,
            disposed: false,
        }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Stages in pipeline order
    pub fn stages(&self) -> &[InjectionStage] {
        &self.stages
    }

    pub fn stage(&self, point: InjectionPoint) -> Option<&InjectionStage> {
        point.stage_index().and_then(|index| self.stages.get(index))
    }

    pub fn material(&self) -> Option<&UberMaterial> {
        self.composite.material()
    }

    /// Handles bound by the most recent `execute`
    pub fn handles(&self) -> Option<&ResourceHandles> {
        self.handles.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Prepare every stage for `frame` and enqueue the ones with active
    /// effects. Returns the number of enqueued stages.
    pub fn add_render_passes(
        &mut self,
        renderer: &mut dyn HostRenderer,
        frame: &FrameContext,
    ) -> CompositorResult<usize> {
        self.ensure_live()?;
        self.composite.ensure_material(renderer);

        let material = self.composite.material();
        let mut enqueued = 0;
        for stage in &mut self.stages {
            if !stage.prepare_active_set(frame, material) {
                continue;
            }
            if let Some(request) = stage.pass_request() {
                log::debug!(
                    "Enqueue `{}` at {:?} for camera `{}` ({} active)",
                    request.name,
                    request.event,
                    frame.camera.name,
                    stage.active_indices().len()
                );
                renderer.enqueue_pass(request);
                enqueued += 1;
            }
        }
        Ok(enqueued)
    }

    /// Immediate path for the stage at `point`
    pub fn execute(
        &mut self,
        point: InjectionPoint,
        renderer: &mut dyn HostRenderer,
        sink: &mut dyn CommandSink,
        frame: &FrameContext,
    ) -> CompositorResult<()> {
        self.ensure_live()?;
        let index = point
            .stage_index()
            .ok_or(CompositorError::InvalidInjectionPoint(point))?;

        let source = renderer.camera_color_target();
        let depth = renderer.camera_depth_target();
        let descriptor = renderer.camera_target_descriptor();
        let handles = self
            .handles
            .get_or_insert_with(|| ResourceHandles::new(source, depth, descriptor));
        handles.bind(source, depth, descriptor);

        self.stages[index].execute(sink, renderer, handles, frame, &self.composite)
    }

    /// Declarative path for the stage at `point`
    pub fn record_render_graph(
        &mut self,
        point: InjectionPoint,
        graph: &mut RenderGraph,
        resources: &FrameResources,
    ) -> CompositorResult<()> {
        self.ensure_live()?;
        let index = point
            .stage_index()
            .ok_or(CompositorError::InvalidInjectionPoint(point))?;

        self.stages[index].record_graph(
            graph,
            resources,
            &self.composite,
            &self.config.intermediate_name,
        )
    }

    /// Prepare and immediately execute every stage of one camera frame.
    /// Returns the number of stages that ran.
    pub fn render_frame(
        &mut self,
        renderer: &mut dyn HostRenderer,
        sink: &mut dyn CommandSink,
        frame: &FrameContext,
    ) -> CompositorResult<usize> {
        let enqueued = self.add_render_passes(renderer, frame)?;
        for point in InjectionPoint::PIPELINE_ORDER {
            if self.has_active(point) {
                self.execute(point, renderer, sink, frame)?;
            }
        }
        Ok(enqueued)
    }

    /// Prepare every stage and record the active ones into `graph`, after
    /// importing the camera targets. Returns the number of recorded stages.
    pub fn record_frame(
        &mut self,
        renderer: &mut dyn HostRenderer,
        graph: &mut RenderGraph,
        frame: &FrameContext,
    ) -> CompositorResult<usize> {
        let enqueued = self.add_render_passes(renderer, frame)?;
        let resources = FrameResources::import(graph, renderer);
        for point in InjectionPoint::PIPELINE_ORDER {
            if self.has_active(point) {
                self.record_render_graph(point, graph, &resources)?;
            }
        }
        Ok(enqueued)
    }

    /// Lifecycle state of every distinct instance registered as `name`
    pub fn lifecycle_of(&self, name: &str) -> Vec<LifecycleState> {
        self.distinct_instances()
            .into_iter()
            .filter_map(|slot| {
                let slot = slot.lock();
                (slot.descriptor().name == name).then_some(slot.state())
            })
            .collect()
    }

    /// Dispose every distinct effect instance once and drop the composite
    /// material. Returns the number of instances disposed by this call.
    pub fn dispose(&mut self) -> usize {
        if self.disposed {
            return 0;
        }

        let disposed = self
            .distinct_instances()
            .into_iter()
            .filter(|slot| slot.lock().dispose())
            .count();
        self.composite.invalidate();
        self.handles = None;
        self.disposed = true;

        log::info!(
            "Disposed post-processing compositor ({} effect instances)",
            disposed
        );
        disposed
    }

    fn has_active(&self, point: InjectionPoint) -> bool {
        self.stage(point)
            .is_some_and(|stage| !stage.active_indices().is_empty())
    }

    /// Instances in stage then registration order, shared ones listed once
    fn distinct_instances(&self) -> Vec<SharedEffect> {
        let mut instances: Vec<SharedEffect> = Vec::new();
        for slot in self.stages.iter().flat_map(|stage| stage.effects()) {
            if !instances.iter().any(|seen| Arc::ptr_eq(seen, slot)) {
                instances.push(Arc::clone(slot));
            }
        }
        instances
    }

    fn ensure_live(&self) -> CompositorResult<()> {
        if self.disposed {
            Err(CompositorError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl Drop for FrameCompositor {
    fn drop(&mut self) {
        self.dispose();
    }
}

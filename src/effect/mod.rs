//! Effect contract
//!
//! Every effect the compositor can run implements [`Effect`]. Effects are bound
//! to injection points through an [`EffectDescriptor`] in the
//! [`EffectRegistry`], and the compositor owns their lifecycle through
//! [`EffectSlot`].

mod lifecycle;
mod registry;

pub use lifecycle::{EffectSlot, LifecycleState, SharedEffect};
pub use registry::{EffectRegistration, EffectRegistry};

use crate::backend::{CommandSink, RenderPassEvent};
use crate::compositor::{ResourceHandles, UberMaterial};
use crate::error::EffectResult;
use crate::frame::{FrameContext, FrameResources};
use crate::render_graph::RenderGraph;

bitflags::bitflags! {
    /// Points in the camera sequence where effects can be injected.
    ///
    /// An effect registration may set several flags to run at more than one point.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InjectionPoint: u8 {
        const BEFORE_OPAQUE = 1 << 0;
        const AFTER_OPAQUE_AND_SKY = 1 << 1;
        const BEFORE_POST_PROCESS = 1 << 2;
        const AFTER_POST_PROCESS = 1 << 3;
    }
}

impl InjectionPoint {
    /// Stage execution order, fixed for every camera
    pub const PIPELINE_ORDER: [InjectionPoint; 4] = [
        InjectionPoint::BEFORE_OPAQUE,
        InjectionPoint::AFTER_OPAQUE_AND_SKY,
        InjectionPoint::BEFORE_POST_PROCESS,
        InjectionPoint::AFTER_POST_PROCESS,
    ];

    /// Position of a single point in [`Self::PIPELINE_ORDER`]
    pub fn stage_index(self) -> Option<usize> {
        Self::PIPELINE_ORDER.iter().position(|&point| point == self)
    }

    /// Host event the stage for this point is scheduled at
    pub fn render_pass_event(self) -> Option<RenderPassEvent> {
        self.stage_entry().map(|(_, event, _)| *event)
    }

    /// Display name of the stage for this point
    pub fn pass_name(self) -> &'static str {
        self.stage_entry().map_or("PostFX", |(_, _, name)| *name)
    }

    fn stage_entry(self) -> Option<&'static (InjectionPoint, RenderPassEvent, &'static str)> {
        STAGE_TABLE.iter().find(|(point, _, _)| *point == self)
    }
}

static STAGE_TABLE: [(InjectionPoint, RenderPassEvent, &str); 4] = [
    (
        InjectionPoint::BEFORE_OPAQUE,
        RenderPassEvent::BeforeRenderingOpaques,
        "PostFX before Opaque",
    ),
    (
        InjectionPoint::AFTER_OPAQUE_AND_SKY,
        RenderPassEvent::AfterRenderingSkybox,
        "PostFX after Opaque & Sky",
    ),
    (
        InjectionPoint::BEFORE_POST_PROCESS,
        RenderPassEvent::BeforeRenderingPostProcessing,
        "PostFX before PostProcess",
    ),
    (
        InjectionPoint::AFTER_POST_PROCESS,
        RenderPassEvent::AfterRendering,
        "PostFX after PostProcess",
    ),
];

bitflags::bitflags! {
    /// Upstream buffers an effect reads
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RequiredInputs: u8 {
        const DEPTH = 1 << 0;
        const NORMAL = 1 << 1;
        const COLOR = 1 << 2;
        const MOTION = 1 << 3;
    }
}

/// Static metadata bound to an effect type at registration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectDescriptor {
    /// Display name, also the name of the effect's profiling sample
    pub name: &'static str,
    pub injection_points: InjectionPoint,
    /// One instance serves every flagged point instead of one instance per point
    pub share_instance: bool,
}

impl EffectDescriptor {
    pub const fn new(name: &'static str, injection_points: InjectionPoint) -> Self {
        Self {
            name,
            injection_points,
            share_instance: false,
        }
    }

    pub const fn shared(mut self) -> Self {
        self.share_instance = true;
        self
    }
}

/// Capability interface of a compositor effect.
///
/// The compositor calls `setup` once per camera per stage, and only calls
/// `render` or `record_render_graph` for effects whose `setup` returned `true`
/// in that frame. A shared instance receives one call per stage it is
/// registered under, told apart by `point`; the calls are strictly sequential.
pub trait Effect: Send {
    /// Whether the effect runs for editor scene view cameras.
    /// Checked before `setup`, so opted-out effects cost nothing there.
    fn visible_in_scene_view(&self) -> bool;

    /// Buffers this effect reads when active
    fn required_inputs(&self) -> RequiredInputs;

    /// One-time setup before the first execution.
    /// An error excludes the effect from all later frames.
    fn initialize(&mut self) -> EffectResult<()>;

    /// Cheap per-frame activation test. Must not submit GPU work and must
    /// return the same answer when called again with the same frame.
    fn setup(
        &mut self,
        frame: &FrameContext,
        point: InjectionPoint,
        composite: Option<&UberMaterial>,
    ) -> bool;

    /// Immediate path: record commands reading `handles.source`
    fn render(
        &mut self,
        sink: &mut dyn CommandSink,
        handles: &ResourceHandles,
        frame: &FrameContext,
        point: InjectionPoint,
    ) -> EffectResult<()>;

    /// Declarative path: add passes declaring their reads and writes
    fn record_render_graph(
        &mut self,
        graph: &mut RenderGraph,
        resources: &FrameResources,
        point: InjectionPoint,
    ) -> EffectResult<()>;

    /// Release owned resources. Called once, even if never initialized.
    fn dispose(&mut self);
}

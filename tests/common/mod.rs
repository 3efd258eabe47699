//! Common utilities for compositor integration tests.
//!
//! Provides a recording command sink, a fake host renderer with a
//! double-buffered camera color target and configurable test effects whose
//! calls are counted through shared statistics.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::Vec4;
use parking_lot::Mutex;

use postfx_compositor::backend::{
    shader_ids, BackendResult, CameraType, CommandSink, HostRenderer, LoadAction, MaterialHandle,
    MeshTopology, PassRequest, PropertyBlock, Rect, StoreAction, TextureAllocator,
    TextureDescriptor, TextureFormat, TextureHandle,
};
use postfx_compositor::compositor::{ResourceHandles, UberMaterial};
use postfx_compositor::render_graph::{
    PassExecuteContext, PassSetupContext, RenderGraph, RenderGraphExecutor, RenderPass,
    ResourceId, ResourceUsage,
};
use postfx_compositor::{
    CameraData, CompositorResult, Effect, EffectDescriptor, EffectError, EffectRegistry,
    EffectResult, FrameCompositor, FrameContext, FrameResources, InjectionPoint, RequiredInputs,
};

pub const COLOR_A: TextureHandle = TextureHandle::new(1);
pub const COLOR_B: TextureHandle = TextureHandle::new(2);
pub const DEPTH: TextureHandle = TextureHandle::new(3);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Command Recording
// ============================================================================

/// One command received by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginSample(String),
    EndSample(String),
    GlobalVector(&'static str, Vec4),
    GlobalTexture(&'static str, TextureHandle),
    Target(TextureHandle),
    Viewport(Rect),
    Blit(TextureHandle),
    Draw {
        shader: String,
        pass: u32,
        vertex_count: u32,
        source: Option<TextureHandle>,
    },
    Alloc(TextureHandle, String),
    Release(TextureHandle),
}

/// Command sink and transient allocator that records everything it receives.
#[derive(Debug)]
pub struct RecordingSink {
    pub commands: Vec<Command>,
    next_texture: u64,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            next_texture: 100,
        }
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Names of every opened profiling sample, in order
    pub fn samples(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::BeginSample(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every composite draw as (target, source)
    pub fn draws(&self) -> Vec<(Option<TextureHandle>, Option<TextureHandle>)> {
        let mut target = None;
        let mut draws = Vec::new();
        for command in &self.commands {
            match command {
                Command::Target(t) => target = Some(*t),
                Command::Draw { source, .. } => draws.push((target, *source)),
                _ => {}
            }
        }
        draws
    }

    /// Every blit as (target, source)
    pub fn blits(&self) -> Vec<(Option<TextureHandle>, TextureHandle)> {
        let mut target = None;
        let mut blits = Vec::new();
        for command in &self.commands {
            match command {
                Command::Target(t) => target = Some(*t),
                Command::Blit(source) => blits.push((target, *source)),
                _ => {}
            }
        }
        blits
    }

    pub fn allocations(&self) -> Vec<(TextureHandle, &str)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Alloc(handle, label) => Some((*handle, label.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<TextureHandle> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Release(handle) => Some(*handle),
                _ => None,
            })
            .collect()
    }

    pub fn global_vector(&self, name: &str) -> Option<Vec4> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::GlobalVector(n, value) if *n == name => Some(*value),
            _ => None,
        })
    }
}

impl CommandSink for RecordingSink {
    fn begin_sample(&mut self, name: &str) {
        self.commands.push(Command::BeginSample(name.to_string()));
    }

    fn end_sample(&mut self, name: &str) {
        self.commands.push(Command::EndSample(name.to_string()));
    }

    fn set_global_vector(&mut self, name: &'static str, value: Vec4) {
        self.commands.push(Command::GlobalVector(name, value));
    }

    fn set_global_texture(&mut self, name: &'static str, texture: TextureHandle) {
        self.commands.push(Command::GlobalTexture(name, texture));
    }

    fn set_render_target(&mut self, target: TextureHandle, _load: LoadAction, _store: StoreAction) {
        self.commands.push(Command::Target(target));
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.commands.push(Command::Viewport(rect));
    }

    fn blit_texture(&mut self, source: TextureHandle, _scale_bias: Vec4) {
        self.commands.push(Command::Blit(source));
    }

    fn draw_procedural(
        &mut self,
        material: &MaterialHandle,
        pass: u32,
        _topology: MeshTopology,
        vertex_count: u32,
        _instance_count: u32,
        properties: &PropertyBlock,
    ) {
        self.commands.push(Command::Draw {
            shader: material.shader().to_string(),
            pass,
            vertex_count,
            source: properties.texture(shader_ids::BLIT_TEXTURE),
        });
    }
}

impl TextureAllocator for RecordingSink {
    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        let handle = TextureHandle::new(self.next_texture);
        self.next_texture += 1;
        self.commands.push(Command::Alloc(
            handle,
            desc.label.clone().unwrap_or_default(),
        ));
        Ok(handle)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.commands.push(Command::Release(texture));
    }
}

// ============================================================================
// Host Renderer
// ============================================================================

/// Fake host with two camera color buffers that swap on request.
pub struct TestRenderer {
    colors: [TextureHandle; 2],
    current: usize,
    desc: TextureDescriptor,
    pub material_available: bool,
    pub material_requests: usize,
    pub swaps: usize,
    pub enqueued: Vec<PassRequest>,
}

impl Default for TestRenderer {
    fn default() -> Self {
        Self {
            colors: [COLOR_A, COLOR_B],
            current: 0,
            desc: TextureDescriptor::new_2d(1280, 720, TextureFormat::Rgba16Float),
            material_available: true,
            material_requests: 0,
            swaps: 0,
            enqueued: Vec::new(),
        }
    }
}

impl TestRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_material() -> Self {
        Self {
            material_available: false,
            ..Self::default()
        }
    }

    /// Front and back buffer are the same texture
    pub fn single_buffered() -> Self {
        Self {
            colors: [COLOR_A, COLOR_A],
            ..Self::default()
        }
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }
}

impl HostRenderer for TestRenderer {
    fn camera_color_target(&self) -> TextureHandle {
        self.colors[self.current]
    }

    fn camera_depth_target(&self) -> TextureHandle {
        DEPTH
    }

    fn camera_target_descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    fn camera_color_front_buffer(&mut self, _sink: &mut dyn CommandSink) -> TextureHandle {
        self.colors[1 - self.current]
    }

    fn swap_color_buffer(&mut self, _sink: &mut dyn CommandSink) {
        self.current = 1 - self.current;
        self.swaps += 1;
    }

    fn create_engine_material(&mut self, shader: &str) -> Option<MaterialHandle> {
        self.material_requests += 1;
        self.material_available
            .then(|| MaterialHandle::new(self.material_requests as u64, shader))
    }

    fn enqueue_pass(&mut self, request: PassRequest) {
        self.enqueued.push(request);
    }
}

// ============================================================================
// Frames
// ============================================================================

pub fn game_frame(index: u64) -> FrameContext {
    frame(index, CameraType::Game)
}

pub fn scene_frame(index: u64) -> FrameContext {
    frame(index, CameraType::SceneView)
}

fn frame(index: u64, camera_type: CameraType) -> FrameContext {
    let target = TextureDescriptor::new_2d(1280, 720, TextureFormat::Rgba16Float);
    FrameContext::new(index, CameraData::new("Main", camera_type, target))
}

// ============================================================================
// TestEffect Effects
// ============================================================================

/// Call counters shared between a test effect and the test
#[derive(Debug, Default)]
pub struct EffectStats {
    pub setups: AtomicUsize,
    pub inits: AtomicUsize,
    pub renders: AtomicUsize,
    pub records: AtomicUsize,
    pub disposals: AtomicUsize,
}

impl EffectStats {
    pub fn setups(&self) -> usize {
        self.setups.load(Ordering::SeqCst)
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> usize {
        self.records.load(Ordering::SeqCst)
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }

    /// Executions through either path
    pub fn executions(&self) -> usize {
        self.renders() + self.records()
    }
}

/// Ordered log of executions, shared by every test effect of a test
pub type Trace = Arc<Mutex<Vec<String>>>;

/// Configurable test effect
#[derive(Clone)]
pub struct TestEffect {
    pub name: &'static str,
    pub accept: fn(&FrameContext) -> bool,
    pub visible_in_scene_view: bool,
    pub inputs: RequiredInputs,
    pub fail_init: bool,
    pub fail_render: bool,
    pub stats: Arc<EffectStats>,
    pub trace: Trace,
}

impl TestEffect {
    pub fn new(name: &'static str, trace: &Trace) -> Self {
        Self {
            name,
            accept: |_| true,
            visible_in_scene_view: true,
            inputs: RequiredInputs::COLOR,
            fail_init: false,
            fail_render: false,
            stats: Arc::new(EffectStats::default()),
            trace: Arc::clone(trace),
        }
    }

    pub fn declining(mut self) -> Self {
        self.accept = |_| false;
        self
    }

    pub fn hidden_in_scene_view(mut self) -> Self {
        self.visible_in_scene_view = false;
        self
    }

    pub fn with_inputs(mut self, inputs: RequiredInputs) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }

    /// Register a fresh copy of this effect per instantiation, all sharing the stats
    pub fn register(&self, registry: &mut EffectRegistry, points: InjectionPoint) {
        self.register_with(registry, EffectDescriptor::new(self.name, points));
    }

    pub fn register_shared(&self, registry: &mut EffectRegistry, points: InjectionPoint) {
        self.register_with(registry, EffectDescriptor::new(self.name, points).shared());
    }

    fn register_with(&self, registry: &mut EffectRegistry, descriptor: EffectDescriptor) {
        let template = self.clone();
        registry
            .register(descriptor, move || template.clone())
            .expect("effect registration");
    }

    fn log(&self, event: &str, point: InjectionPoint) {
        self.trace
            .lock()
            .push(format!("{event}:{}@{}", self.name, point.pass_name()));
    }
}

impl Effect for TestEffect {
    fn visible_in_scene_view(&self) -> bool {
        self.visible_in_scene_view
    }

    fn required_inputs(&self) -> RequiredInputs {
        self.inputs
    }

    fn initialize(&mut self) -> EffectResult<()> {
        self.stats.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(EffectError::InitializationFailed(format!(
                "{} cannot start",
                self.name
            )));
        }
        Ok(())
    }

    fn setup(
        &mut self,
        frame: &FrameContext,
        _point: InjectionPoint,
        _composite: Option<&UberMaterial>,
    ) -> bool {
        self.stats.setups.fetch_add(1, Ordering::SeqCst);
        (self.accept)(frame)
    }

    fn render(
        &mut self,
        _sink: &mut dyn CommandSink,
        handles: &ResourceHandles,
        _frame: &FrameContext,
        point: InjectionPoint,
    ) -> EffectResult<()> {
        self.stats.renders.fetch_add(1, Ordering::SeqCst);
        self.log("render", point);
        if handles.dest.is_some() {
            return Err(EffectError::RenderFailed("dest bound before composite".into()));
        }
        if self.fail_render {
            return Err(EffectError::RenderFailed(format!("{} broke", self.name)));
        }
        Ok(())
    }

    fn record_render_graph(
        &mut self,
        graph: &mut RenderGraph,
        resources: &FrameResources,
        point: InjectionPoint,
    ) -> EffectResult<()> {
        self.stats.records.fetch_add(1, Ordering::SeqCst);
        self.log("record", point);
        if self.fail_render {
            return Err(EffectError::RenderFailed(format!("{} broke", self.name)));
        }
        graph.add_pass(RecordedPass {
            name: self.name,
            color: resources.active_color,
        });
        Ok(())
    }

    fn dispose(&mut self) {
        self.stats.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

/// Graph pass of a test effect: shades the active color in place
struct RecordedPass {
    name: &'static str,
    color: ResourceId,
}

impl RenderPass for RecordedPass {
    fn name(&self) -> &str {
        self.name
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.write(self.color, ResourceUsage::RenderTargetLoad { index: 0 });
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        if let Some(color) = ctx.get_texture(self.color) {
            ctx.sink
                .set_render_target(color, LoadAction::Load, StoreAction::Store);
        }
    }
}

// ============================================================================
// Frame Drivers
// ============================================================================

/// Host rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Immediate,
    RenderGraph,
}

/// Run one camera frame in `mode`, returning the number of enqueued stages
pub fn run_frame(
    mode: Mode,
    compositor: &mut FrameCompositor,
    renderer: &mut TestRenderer,
    sink: &mut RecordingSink,
    frame: &FrameContext,
) -> CompositorResult<usize> {
    match mode {
        Mode::Immediate => compositor.render_frame(renderer, sink, frame),
        Mode::RenderGraph => {
            let mut graph = RenderGraph::new();
            let enqueued = compositor.record_frame(renderer, &mut graph, frame)?;
            let compiled = graph.compile()?;
            RenderGraphExecutor::new().execute(&graph, &compiled, sink)?;
            Ok(enqueued)
        }
    }
}

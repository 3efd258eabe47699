//! Render graph executor

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::graph::*;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;

/// Runs a compiled graph against the host's command sink.
///
/// Transient textures are allocated right before their first use and released
/// right after their last use. Each pass runs inside a profiling sample named
/// after the pass.
#[derive(Default)]
pub struct RenderGraphExecutor {
    /// Physical texture per resource id, rebuilt for every execution
    textures: Vec<Option<TextureHandle>>,
}

impl RenderGraphExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute the render graph
    pub fn execute<B: CommandSink + TextureAllocator>(
        &mut self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
        backend: &mut B,
    ) -> Result<(), GraphError> {
        self.textures.clear();
        self.textures.resize(graph.resources().len(), None);

        for resource in graph.resources() {
            if let VirtualResource::Imported { texture, handle } = resource {
                self.textures[texture.id.index()] = Some(*handle);
            }
        }

        for (step, &pass_id) in compiled.pass_order.iter().enumerate() {
            if let Err(err) = self.allocate_for_step(graph, compiled, step, backend) {
                self.release_all(graph, backend);
                return Err(err);
            }

            if let (Some(pass), Some(node)) = (graph.get_pass(pass_id), graph.get_pass_node(pass_id))
            {
                backend.begin_sample(&node.name);
                {
                    let mut ctx = PassExecuteContext {
                        sink: &mut *backend,
                        textures: &self.textures,
                    };
                    pass.execute(&mut ctx);
                }
                backend.end_sample(&node.name);
            }

            self.release_after_step(graph, compiled, step, backend);
        }

        Ok(())
    }

    fn allocate_for_step<B: TextureAllocator>(
        &mut self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
        step: usize,
        backend: &mut B,
    ) -> Result<(), GraphError> {
        for resource in graph.resources() {
            let VirtualResource::Transient(texture) = resource else {
                continue;
            };
            let first_use = compiled
                .resource_lifetimes
                .get(texture.id.index())
                .copied()
                .flatten()
                .map(|l| l.first_use);
            if first_use != Some(step) {
                continue;
            }

            let mut desc = texture.desc.clone();
            desc.label.get_or_insert_with(|| texture.name.clone());
            let handle = backend
                .create_texture(&desc)
                .map_err(|source| GraphError::Allocation {
                    name: texture.name.clone(),
                    source,
                })?;
            log::trace!("Allocated transient `{}` as {:?}", texture.name, handle);
            self.textures[texture.id.index()] = Some(handle);
        }
        Ok(())
    }

    fn release_after_step<B: TextureAllocator>(
        &mut self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
        step: usize,
        backend: &mut B,
    ) {
        for resource in graph.resources() {
            let VirtualResource::Transient(texture) = resource else {
                continue;
            };
            let last_use = compiled
                .resource_lifetimes
                .get(texture.id.index())
                .copied()
                .flatten()
                .map(|l| l.last_use);
            if last_use == Some(step) {
                if let Some(handle) = self.textures[texture.id.index()].take() {
                    backend.release_texture(handle);
                }
            }
        }
    }

    fn release_all<B: TextureAllocator>(&mut self, graph: &RenderGraph, backend: &mut B) {
        for resource in graph.resources() {
            if let VirtualResource::Transient(texture) = resource {
                if let Some(handle) = self.textures[texture.id.index()].take() {
                    backend.release_texture(handle);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
        next_texture: u64,
        live: Vec<TextureHandle>,
        fail_allocation: bool,
    }

    impl CommandSink for Recorder {
        fn begin_sample(&mut self, name: &str) {
            self.log.push(format!("begin:{name}"));
        }
        fn end_sample(&mut self, name: &str) {
            self.log.push(format!("end:{name}"));
        }
        fn set_global_vector(&mut self, _: &'static str, _: Vec4) {}
        fn set_global_texture(&mut self, _: &'static str, _: TextureHandle) {}
        fn set_render_target(&mut self, target: TextureHandle, _: LoadAction, _: StoreAction) {
            self.log.push(format!("target:{}", target.id()));
        }
        fn set_viewport(&mut self, _: Rect) {}
        fn blit_texture(&mut self, source: TextureHandle, _: Vec4) {
            self.log.push(format!("blit:{}", source.id()));
        }
        fn draw_procedural(
            &mut self,
            _: &MaterialHandle,
            _: u32,
            _: MeshTopology,
            _: u32,
            _: u32,
            _: &PropertyBlock,
        ) {
        }
    }

    impl TextureAllocator for Recorder {
        fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
            if self.fail_allocation {
                return Err(BackendError::OutOfMemory);
            }
            self.next_texture += 1;
            let handle = TextureHandle::new(100 + self.next_texture);
            self.live.push(handle);
            self.log.push(format!("alloc:{}", desc.label.as_deref().unwrap_or("")));
            Ok(handle)
        }

        fn release_texture(&mut self, texture: TextureHandle) {
            self.live.retain(|&t| t != texture);
            self.log.push(format!("release:{}", texture.id()));
        }
    }

    struct CopyPass {
        source: ResourceId,
        dest: ResourceId,
    }

    impl RenderPass for CopyPass {
        fn name(&self) -> &str {
            "copy"
        }

        fn setup(&mut self, ctx: &mut PassSetupContext) {
            ctx.read(self.source, ResourceUsage::TextureRead);
            ctx.write(self.dest, ResourceUsage::RenderTarget { index: 0 });
        }

        fn execute(&self, ctx: &mut PassExecuteContext) {
            let (Some(source), Some(dest)) = (ctx.get_texture(self.source), ctx.get_texture(self.dest))
            else {
                return;
            };
            ctx.sink
                .set_render_target(dest, LoadAction::DontCare, StoreAction::Store);
            ctx.sink.blit_texture(source, IDENTITY_SCALE_BIAS);
        }
    }

    fn build_round_trip() -> (RenderGraph, CompiledGraph) {
        let desc = TextureDescriptor::new_2d(64, 64, TextureFormat::Rgba16Float);
        let mut graph = RenderGraph::new();
        let color = graph.import_texture("camera_color", desc.clone(), TextureHandle::new(1));
        let scratch = graph.create_texture("scratch", desc);
        graph.add_pass(CopyPass {
            source: color,
            dest: scratch,
        });
        graph.add_pass(CopyPass {
            source: scratch,
            dest: color,
        });
        let compiled = graph.compile().unwrap();
        (graph, compiled)
    }

    #[test]
    fn test_execute_allocates_and_releases_transients() {
        let (graph, compiled) = build_round_trip();
        let mut recorder = Recorder::default();
        let mut executor = RenderGraphExecutor::new();

        executor.execute(&graph, &compiled, &mut recorder).unwrap();

        assert_eq!(
            recorder.log,
            vec![
                "alloc:scratch",
                "begin:copy",
                "target:101",
                "blit:1",
                "end:copy",
                "begin:copy",
                "target:1",
                "blit:101",
                "end:copy",
                "release:101",
            ]
        );
        assert!(recorder.live.is_empty());
    }

    #[test]
    fn test_allocation_failure_surfaces() {
        let (graph, compiled) = build_round_trip();
        let mut recorder = Recorder {
            fail_allocation: true,
            ..Default::default()
        };
        let mut executor = RenderGraphExecutor::new();

        let err = executor.execute(&graph, &compiled, &mut recorder).unwrap_err();
        assert!(matches!(err, GraphError::Allocation { .. }));
        assert!(recorder.log.iter().all(|entry| !entry.starts_with("begin")));
    }
}

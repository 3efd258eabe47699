//! Render graph definition and compilation

use crate::backend::traits::BackendError;
use crate::backend::types::*;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur during graph construction or compilation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("pass `{pass}` references unknown resource {resource:?}")]
    UnknownResource { pass: String, resource: ResourceId },
    #[error("failed to allocate `{name}`: {source}")]
    Allocation { name: String, source: BackendError },
}

/// The main render graph structure
#[derive(Default)]
pub struct RenderGraph {
    passes: Vec<Box<dyn RenderPass>>,
    pass_nodes: Vec<PassNode>,
    resources: Vec<VirtualResource>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host-owned texture (camera color, camera depth)
    pub fn import_texture(
        &mut self,
        name: &str,
        desc: TextureDescriptor,
        handle: TextureHandle,
    ) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(VirtualResource::Imported {
            texture: VirtualTexture {
                id,
                desc,
                name: name.to_string(),
            },
            handle,
        });
        id
    }

    /// Create a transient texture, allocated by the executor around its uses
    pub fn create_texture(&mut self, name: &str, desc: TextureDescriptor) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(VirtualResource::Transient(VirtualTexture {
            id,
            desc,
            name: name.to_string(),
        }));
        id
    }

    /// Descriptor of a resource
    pub fn texture_desc(&self, resource: ResourceId) -> Option<&TextureDescriptor> {
        self.resources.get(resource.index()).map(|r| r.desc())
    }

    /// Add a render pass to the graph. Its `setup` runs immediately.
    pub fn add_pass<P: RenderPass + 'static>(&mut self, pass: P) -> PassId {
        let id = PassId(self.passes.len() as u32);
        let mut boxed_pass = Box::new(pass);

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        {
            let mut ctx = PassSetupContext {
                inputs: &mut inputs,
                outputs: &mut outputs,
            };
            boxed_pass.setup(&mut ctx);
        }

        self.pass_nodes.push(PassNode {
            id,
            name: boxed_pass.name().to_string(),
            inputs,
            outputs,
        });
        self.passes.push(boxed_pass);

        id
    }

    /// Compile the graph - topological sort and resource lifetimes
    pub fn compile(&self) -> Result<CompiledGraph, GraphError> {
        let pass_count = self.pass_nodes.len();

        for node in &self.pass_nodes {
            for access in node.inputs.iter().chain(node.outputs.iter()) {
                if access.resource.index() >= self.resources.len() {
                    return Err(GraphError::UnknownResource {
                        pass: node.name.clone(),
                        resource: access.resource,
                    });
                }
            }
        }

        // (dependent, dependency) from resource hazards
        let mut dependencies: Vec<(PassId, PassId)> = Vec::new();
        for (later_index, later) in self.pass_nodes.iter().enumerate() {
            for earlier in &self.pass_nodes[..later_index] {
                if later.has_hazard_after(earlier) {
                    dependencies.push((later.id, earlier.id));
                }
            }
        }

        // Kahn's algorithm, lowest registration index first
        let mut in_degree = vec![0usize; pass_count];
        for (dependent, _) in &dependencies {
            in_degree[dependent.index()] += 1;
        }
        let mut ready: BTreeSet<usize> = (0..pass_count).filter(|&i| in_degree[i] == 0).collect();
        let mut pass_order = Vec::with_capacity(pass_count);

        while let Some(index) = ready.pop_first() {
            pass_order.push(PassId(index as u32));
            for (dependent, dependency) in &dependencies {
                if dependency.index() == index {
                    let degree = &mut in_degree[dependent.index()];
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent.index());
                    }
                }
            }
        }

        // Hazards only point at earlier registrations, so nothing is left over
        debug_assert_eq!(pass_order.len(), pass_count);

        let mut resource_lifetimes: Vec<Option<ResourceLifetime>> = vec![None; self.resources.len()];
        for (order, pass_id) in pass_order.iter().enumerate() {
            let node = &self.pass_nodes[pass_id.index()];
            for access in node.inputs.iter().chain(node.outputs.iter()) {
                let lifetime = resource_lifetimes[access.resource.index()].get_or_insert(
                    ResourceLifetime {
                        first_use: order,
                        last_use: order,
                    },
                );
                lifetime.last_use = order;
            }
        }

        log::trace!(
            "Compiled render graph: {} passes, {} resources, {} dependencies",
            pass_count,
            self.resources.len(),
            dependencies.len()
        );

        Ok(CompiledGraph {
            pass_order,
            resource_lifetimes,
            dependencies,
        })
    }

    /// Get pass metadata
    pub fn pass_nodes(&self) -> &[PassNode] {
        &self.pass_nodes
    }

    /// Get all resources
    pub fn resources(&self) -> &[VirtualResource] {
        &self.resources
    }

    /// Get pass by ID
    pub fn get_pass(&self, id: PassId) -> Option<&dyn RenderPass> {
        self.passes.get(id.index()).map(|p| p.as_ref())
    }

    /// Get pass node by ID
    pub fn get_pass_node(&self, id: PassId) -> Option<&PassNode> {
        self.pass_nodes.get(id.index())
    }
}

/// Resource lifetime in terms of pass execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLifetime {
    pub first_use: usize,
    pub last_use: usize,
}

/// Compiled render graph with execution order and resource lifetimes
#[derive(Debug)]
pub struct CompiledGraph {
    pub pass_order: Vec<PassId>,
    /// Indexed by resource; `None` for resources no pass touches
    pub resource_lifetimes: Vec<Option<ResourceLifetime>>,
    /// (dependent, dependency) pairs
    pub dependencies: Vec<(PassId, PassId)>,
}

impl CompiledGraph {
    /// Whether `dependent` directly depends on `dependency`
    pub fn depends_on(&self, dependent: PassId, dependency: PassId) -> bool {
        self.dependencies.contains(&(dependent, dependency))
    }
}

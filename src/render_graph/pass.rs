//! Render pass definitions for the render graph

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::resource::*;

/// Unique identifier for a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(pub(crate) u32);

impl PassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Context for declaring a pass's resources
pub struct PassSetupContext<'a> {
    pub(crate) inputs: &'a mut Vec<ResourceAccess>,
    pub(crate) outputs: &'a mut Vec<ResourceAccess>,
}

impl<'a> PassSetupContext<'a> {
    /// Declare that this pass reads from a resource
    pub fn read(&mut self, resource: ResourceId, usage: ResourceUsage) {
        let access = ResourceAccess { resource, usage };
        if access.is_write() {
            self.outputs.push(access.clone());
        }
        self.inputs.push(access);
    }

    /// Declare that this pass writes to a resource
    pub fn write(&mut self, resource: ResourceId, usage: ResourceUsage) {
        let access = ResourceAccess { resource, usage };
        if access.is_read() {
            self.inputs.push(access.clone());
        }
        self.outputs.push(access);
    }
}

/// Context for executing a render pass
pub struct PassExecuteContext<'a> {
    pub sink: &'a mut dyn CommandSink,
    pub(crate) textures: &'a [Option<TextureHandle>],
}

impl<'a> PassExecuteContext<'a> {
    /// Get the physical texture bound to a resource
    pub fn get_texture(&self, resource: ResourceId) -> Option<TextureHandle> {
        self.textures.get(resource.index()).copied().flatten()
    }
}

/// Trait for render passes
pub trait RenderPass: Send {
    /// Get the pass name, also used as its profiling sample
    fn name(&self) -> &str;

    /// Setup phase - declare resources and dependencies
    fn setup(&mut self, ctx: &mut PassSetupContext);

    /// Execute phase - record commands
    fn execute(&self, ctx: &mut PassExecuteContext);
}

/// Metadata about a pass in the graph
#[derive(Debug)]
pub struct PassNode {
    pub id: PassId,
    pub name: String,
    pub inputs: Vec<ResourceAccess>,
    pub outputs: Vec<ResourceAccess>,
}

impl PassNode {
    pub fn reads_resource(&self, resource: ResourceId) -> bool {
        self.inputs.iter().any(|a| a.resource == resource)
    }

    pub fn writes_resource(&self, resource: ResourceId) -> bool {
        self.outputs.iter().any(|a| a.resource == resource)
    }

    /// Whether this pass has to run after `earlier` because of a shared resource
    pub fn has_hazard_after(&self, earlier: &PassNode) -> bool {
        let read_after_write = self.inputs.iter().any(|a| earlier.writes_resource(a.resource));
        let write_after_read = self.outputs.iter().any(|a| earlier.reads_resource(a.resource));
        let write_after_write = self.outputs.iter().any(|a| earlier.writes_resource(a.resource));
        read_after_write || write_after_read || write_after_write
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, inputs: &[u32], outputs: &[u32]) -> PassNode {
        let access = |r: &u32, usage| ResourceAccess {
            resource: ResourceId(*r),
            usage,
        };
        PassNode {
            id: PassId(id),
            name: format!("pass_{id}"),
            inputs: inputs
                .iter()
                .map(|r| access(r, ResourceUsage::TextureRead))
                .collect(),
            outputs: outputs
                .iter()
                .map(|r| access(r, ResourceUsage::RenderTarget { index: 0 }))
                .collect(),
        }
    }

    #[test]
    fn test_hazards() {
        let writer = node(0, &[], &[1]);
        let reader = node(1, &[1], &[2]);
        let unrelated = node(2, &[3], &[4]);
        let overwriter = node(3, &[], &[1]);

        assert!(reader.has_hazard_after(&writer));
        assert!(overwriter.has_hazard_after(&writer));
        assert!(overwriter.has_hazard_after(&reader));
        assert!(!unrelated.has_hazard_after(&writer));
    }

    #[test]
    fn test_setup_context_records_both_sides_for_load() {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut ctx = PassSetupContext {
            inputs: &mut inputs,
            outputs: &mut outputs,
        };

        ctx.write(ResourceId(0), ResourceUsage::RenderTargetLoad { index: 0 });
        ctx.read(ResourceId(1), ResourceUsage::TextureRead);

        assert_eq!(inputs.len(), 2);
        assert_eq!(outputs.len(), 1);
    }
}

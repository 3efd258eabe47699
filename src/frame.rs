//! Per-frame camera context handed to the compositor by the host

use crate::backend::{CameraType, HostRenderer, Rect, TextureDescriptor, TextureFormat};
use crate::render_graph::{RenderGraph, ResourceId};

/// Camera state for the camera currently being rendered
#[derive(Debug, Clone)]
pub struct CameraData {
    pub name: String,
    pub camera_type: CameraType,
    /// Descriptor of the camera's color target
    pub target_descriptor: TextureDescriptor,
    /// Viewport of the camera in target pixels
    pub pixel_rect: Rect,
}

impl CameraData {
    pub fn new(name: impl Into<String>, camera_type: CameraType, target: TextureDescriptor) -> Self {
        let pixel_rect = Rect::new(0.0, 0.0, target.width as f32, target.height as f32);
        Self {
            name: name.into(),
            camera_type,
            target_descriptor: target,
            pixel_rect,
        }
    }
}

/// Everything an effect may inspect while deciding whether to run
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub frame_index: u64,
    /// Seconds since the host started rendering
    pub time: f32,
    pub camera: CameraData,
}

impl FrameContext {
    pub fn new(frame_index: u64, camera: CameraData) -> Self {
        Self {
            frame_index,
            time: 0.0,
            camera,
        }
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    /// Editor scene view cameras skip effects that opt out of the scene view
    pub fn is_scene_view(&self) -> bool {
        self.camera.camera_type == CameraType::SceneView
    }
}

/// Graph resources of the current camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameResources {
    pub camera_color: ResourceId,
    pub camera_depth: ResourceId,
    /// Color the next pass should read and write; starts as the camera color
    pub active_color: ResourceId,
}

impl FrameResources {
    pub const CAMERA_COLOR: &'static str = "_CameraColorAttachment";
    pub const CAMERA_DEPTH: &'static str = "_CameraDepthAttachment";

    /// Import the renderer's current camera targets into `graph`
    pub fn import(graph: &mut RenderGraph, renderer: &dyn HostRenderer) -> Self {
        let color_desc = renderer.camera_target_descriptor().clone();
        let mut depth_desc = color_desc.clone();
        depth_desc.format = TextureFormat::Depth32Float;

        let camera_color =
            graph.import_texture(Self::CAMERA_COLOR, color_desc, renderer.camera_color_target());
        let camera_depth =
            graph.import_texture(Self::CAMERA_DEPTH, depth_desc, renderer.camera_depth_target());

        Self {
            camera_color,
            camera_depth,
            active_color: camera_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_view_detection() {
        let target = TextureDescriptor::new_2d(800, 600, TextureFormat::Rgba16Float);
        let game = FrameContext::new(0, CameraData::new("Main", CameraType::Game, target.clone()));
        let scene = FrameContext::new(0, CameraData::new("Scene", CameraType::SceneView, target));

        assert!(!game.is_scene_view());
        assert!(scene.is_scene_view());
        assert_eq!(game.camera.pixel_rect.width, 800.0);
    }
}

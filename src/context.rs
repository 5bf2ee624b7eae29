use crate::backend::MaterialAttachment;
use crate::frame::FrameHandle;
use crate::registry::MaterialRegistry;
use std::sync::Arc;

/// Errors that can occur when setting up a scene context.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContextError {
    /// The material attachment declares no pipeline layouts, so no material
    /// could ever resolve a pipeline.
    #[error("material attachment '{0}' declares no pipeline layouts")]
    MissingMaterialAttachment(String),
}

/// Long-lived half of the scene: owns the material registry and hands out
/// per-frame [`FrameHandle`]s.
///
/// One context serves one material attachment. Frames are strictly
/// sequential; [`SceneContext::begin_frame`] borrows the registry
/// exclusively until the handle is finished.
pub struct SceneContext {
    registry: MaterialRegistry,
    frame_index: u64,
}

impl SceneContext {
    pub fn new(attachment: Arc<MaterialAttachment>) -> Result<Self, ContextError> {
        if attachment.layouts().is_empty() {
            return Err(ContextError::MissingMaterialAttachment(attachment.name().to_string()));
        }
        Ok(Self {
            registry: MaterialRegistry::new(attachment),
            frame_index: 0,
        })
    }

    /// Number of frames begun so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MaterialRegistry {
        &mut self.registry
    }

    /// Starts recording a new frame.
    pub fn begin_frame(&mut self) -> FrameHandle<'_> {
        self.frame_index += 1;
        FrameHandle::new(&mut self.registry)
    }

    /// Queues removal of every revokable material referencing any of the
    /// textures. Meant for asset eviction between frames; the removals join
    /// the next frame's compilation batch.
    pub fn revoke_images(&mut self, images: &[crate::id::TextureId]) {
        self.registry.revoke_images(images);
    }

    pub fn material_count(&self) -> usize {
        self.registry.material_count()
    }

    pub fn list_materials(&self) -> String {
        self.registry.list_materials()
    }
}

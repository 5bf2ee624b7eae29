use crate::frame::{DrawOp, FrameHandle};
use crate::id::MaterialId;
use crate::material::{MaterialDescriptor, MaterialImage, PipelineParams};
use crate::node::{NodeGeometry, SceneComponent};

/// Drawable component that renders its node with a registry material.
///
/// The sprite owns a material prototype (images, samplers, color modes,
/// pipeline parameters). On its node's self phase it resolves the
/// prototype to a material id, sharing an already registered material when
/// one matches, and records a draw under the state scope in effect. The
/// resolution is cached until the prototype changes.
pub struct Sprite {
    descriptor: MaterialDescriptor,
    images: Vec<MaterialImage>,
    owner_data: Option<Vec<u8>>,
    revokable: bool,
    material: MaterialId,
    resolved_for: Option<MaterialDescriptor>,
}

impl Sprite {
    pub fn new(images: Vec<MaterialImage>, pipeline: PipelineParams) -> Self {
        Self {
            descriptor: MaterialDescriptor::from_images(&images, pipeline),
            images,
            owner_data: None,
            revokable: true,
            material: MaterialId::NONE,
            resolved_for: None,
        }
    }

    /// Opaque bytes attached to the acquired material for the backend's
    /// use.
    pub fn with_owner_data(mut self, data: Vec<u8>) -> Self {
        self.owner_data = Some(data);
        self
    }

    /// Marks the material as permanent: it survives revocation of the
    /// textures it references.
    pub fn non_revokable(mut self) -> Self {
        self.revokable = false;
        self
    }

    pub fn set_pipeline_params(&mut self, pipeline: PipelineParams) {
        self.descriptor = MaterialDescriptor::from_images(&self.images, pipeline);
    }

    pub fn set_images(&mut self, images: Vec<MaterialImage>, pipeline: PipelineParams) {
        self.descriptor = MaterialDescriptor::from_images(&images, pipeline);
        self.images = images;
    }

    pub fn descriptor(&self) -> &MaterialDescriptor {
        &self.descriptor
    }

    /// Material resolved by the last visit, [`MaterialId::NONE`] before
    /// the first visit or when no pipeline matched.
    pub fn material_id(&self) -> MaterialId {
        self.material
    }

    fn resolve(&mut self, frame: &mut FrameHandle<'_>) {
        let existing = frame.get_material(&self.descriptor);
        self.material = if existing.is_none() {
            frame.acquire_material(
                &self.descriptor,
                self.images.clone(),
                self.owner_data.clone(),
                self.revokable,
            )
        } else {
            existing
        };
        self.resolved_for = Some(self.descriptor);
    }
}

impl SceneComponent for Sprite {
    fn handle_visit_self(&mut self, _node: &NodeGeometry, frame: &mut FrameHandle<'_>) {
        if self.resolved_for != Some(self.descriptor) {
            self.resolve(frame);
        }
        if self.material.is_none() {
            return;
        }
        frame.push_draw(DrawOp {
            material: self.material,
            state: frame.current_state_id(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MaterialAttachment;
    use crate::registry::MaterialRegistry;
    use crate::pipeline::{GraphicPipeline, PipelineLayout};
    use std::sync::Arc;

    fn attachment() -> Arc<MaterialAttachment> {
        let solid = Arc::new(GraphicPipeline {
            name: "solid".into(),
            params: PipelineParams::default(),
        });
        let blended = Arc::new(GraphicPipeline {
            name: "blended".into(),
            params: PipelineParams::default().with_blend(wgpu::BlendState::ALPHA_BLENDING),
        });
        Arc::new(MaterialAttachment::new(
            "sprite-tests",
            vec![PipelineLayout { name: "2d".into(), pipelines: vec![solid, blended] }],
        ))
    }

    fn geometry() -> NodeGeometry {
        NodeGeometry::default()
    }

    #[test]
    fn a_sprite_acquires_its_material_and_records_a_draw() {
        let mut registry = MaterialRegistry::new(attachment());
        let mut frame = FrameHandle::new(&mut registry);

        let mut sprite = Sprite::new(Vec::new(), PipelineParams::default());
        sprite.handle_visit_self(&geometry(), &mut frame);

        assert!(!sprite.material_id().is_none());
        assert_eq!(frame.draw_ops().len(), 1);
        assert_eq!(frame.draw_ops()[0].material, sprite.material_id());
    }

    #[test]
    fn matching_sprites_share_one_material() {
        let mut registry = MaterialRegistry::new(attachment());
        let mut frame = FrameHandle::new(&mut registry);

        let mut first = Sprite::new(Vec::new(), PipelineParams::default());
        let mut second = Sprite::new(Vec::new(), PipelineParams::default());
        first.handle_visit_self(&geometry(), &mut frame);
        second.handle_visit_self(&geometry(), &mut frame);

        assert_eq!(first.material_id(), second.material_id());
        assert_eq!(frame.draw_ops().len(), 2);
        drop(frame);
        assert_eq!(registry.material_count(), 1);
    }

    #[test]
    fn draws_carry_the_state_in_effect() {
        let mut registry = MaterialRegistry::new(attachment());
        let mut frame = FrameHandle::new(&mut registry);

        let state = {
            use crate::draw_state::{DrawState, DrawStateFlags};
            use crate::rect::URect;
            frame.register_state(DrawState {
                flags: DrawStateFlags::SCISSOR,
                scissor: URect::new(0, 0, 32, 32),
                ..DrawState::default()
            })
        };
        frame.push_raw_state(state);

        let mut sprite = Sprite::new(Vec::new(), PipelineParams::default());
        sprite.handle_visit_self(&geometry(), &mut frame);

        assert_eq!(frame.draw_ops()[0].state, state);
        frame.pop_state_scope(crate::id::ScopeOwnerId::ORPHAN);
    }

    #[test]
    fn a_sprite_without_a_matching_pipeline_draws_nothing() {
        let mut registry = MaterialRegistry::new(attachment());
        let mut frame = FrameHandle::new(&mut registry);

        let params = PipelineParams::default().with_line_width(crate::material::LineWidth(2.0));
        let mut sprite = Sprite::new(Vec::new(), params);
        sprite.handle_visit_self(&geometry(), &mut frame);

        assert!(sprite.material_id().is_none());
        assert!(frame.draw_ops().is_empty());
    }

    #[test]
    fn changing_pipeline_params_re_resolves_the_material() {
        let mut registry = MaterialRegistry::new(attachment());
        let mut frame = FrameHandle::new(&mut registry);

        let mut sprite = Sprite::new(Vec::new(), PipelineParams::default());
        sprite.handle_visit_self(&geometry(), &mut frame);
        let solid_material = sprite.material_id();

        sprite.set_pipeline_params(
            PipelineParams::default().with_blend(wgpu::BlendState::ALPHA_BLENDING),
        );
        sprite.handle_visit_self(&geometry(), &mut frame);
        let blended_material = sprite.material_id();

        assert_ne!(solid_material, blended_material);
        assert_eq!(frame.draw_ops().len(), 2);
        assert_ne!(frame.draw_ops()[0].material, frame.draw_ops()[1].material);
    }
}

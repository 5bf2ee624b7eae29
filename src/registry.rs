use std::collections::VecDeque;
use std::fmt::Write as _;
use std::mem;
use std::sync::Arc;

use ahash::{HashMap, RandomState};
use tracing::{trace, warn};

use crate::batch::{CompilationBatch, DependencyEvent, DependencyToken, MaterialCompiler};
use crate::backend::MaterialAttachment;
use crate::id::{MaterialId, TextureId};
use crate::material::{
    ImageViewInfo, Material, MaterialDescriptor, MaterialImage, MAX_MATERIAL_IMAGES,
};
use crate::pipeline::PipelineResolver;

#[derive(Debug, Clone)]
pub(crate) struct RegisteredMaterial {
    pub(crate) descriptor: MaterialDescriptor,
    pub(crate) id: MaterialId,
    pub(crate) revokable: bool,
}

/// Scene-lived registry of every material the scene has acquired.
///
/// Lookup is a content hash over the descriptor with an exact-equality scan
/// inside the bucket. Acquisitions and revocations only mutate the lookup
/// tables immediately; the GPU-side work is batched and handed to the
/// compiler once per frame by [`MaterialRegistry::flush`].
pub struct MaterialRegistry {
    attachment: Arc<MaterialAttachment>,
    resolver: PipelineResolver,
    materials: HashMap<u64, Vec<RegisteredMaterial>>,
    pending_to_add: Vec<Material>,
    pending_to_remove: Vec<MaterialId>,
    revoked_ids: VecDeque<MaterialId>,
    dependency: Option<DependencyToken>,
    hasher: RandomState,
}

impl MaterialRegistry {
    pub fn new(attachment: Arc<MaterialAttachment>) -> Self {
        let resolver = PipelineResolver::new(attachment.layouts());
        let hasher = RandomState::new();
        let mut materials: HashMap<u64, Vec<RegisteredMaterial>> = HashMap::default();
        for material in attachment.predefined() {
            let descriptor = material.descriptor();
            let hash = descriptor.content_hash(&hasher);
            materials.entry(hash).or_default().push(RegisteredMaterial {
                descriptor,
                id: material.id,
                revokable: false,
            });
        }
        Self {
            attachment,
            resolver,
            materials,
            pending_to_add: Vec::new(),
            pending_to_remove: Vec::new(),
            revoked_ids: VecDeque::new(),
            dependency: None,
            hasher,
        }
    }

    pub fn attachment(&self) -> &Arc<MaterialAttachment> {
        &self.attachment
    }

    /// Id of the registered material with an equal descriptor,
    /// [`MaterialId::NONE`] when nothing matches.
    pub fn get_material(&self, descriptor: &MaterialDescriptor) -> MaterialId {
        let hash = descriptor.content_hash(&self.hasher);
        if let Some(bucket) = self.materials.get(&hash) {
            if let Some(entry) = bucket.iter().find(|entry| entry.descriptor == *descriptor) {
                return entry.id;
            }
        }
        MaterialId::NONE
    }

    /// Registers a new material for the descriptor and queues it for
    /// compilation.
    ///
    /// The descriptor is authoritative for the stored images: each slot
    /// takes its sampler index and view configuration from it, whatever the
    /// passed images carried.
    ///
    /// The returned id is visible to [`MaterialRegistry::get_material`]
    /// immediately; GPU-side availability waits on the dependency token the
    /// next flush produces. When no pipeline matches the descriptor's
    /// parameters this is a configuration error: the registry logs a
    /// warning, stays untouched, and returns [`MaterialId::NONE`].
    pub fn acquire_material(
        &mut self,
        descriptor: &MaterialDescriptor,
        mut images: Vec<MaterialImage>,
        owner_data: Option<Vec<u8>>,
        revokable: bool,
    ) -> MaterialId {
        let pipeline = match self.resolver.resolve(descriptor) {
            Some(pipeline) => pipeline.clone(),
            None => {
                warn!(
                    "no pipeline for material {} in attachment '{}'",
                    descriptor,
                    self.attachment.name()
                );
                return MaterialId::NONE;
            }
        };

        for (idx, image) in images.iter_mut().take(MAX_MATERIAL_IMAGES).enumerate() {
            image.sampler = descriptor.samplers[idx];
            image.view = ImageViewInfo::new(
                &image.image,
                pipeline.params.view_dimension,
                descriptor.color_modes[idx],
            );
        }

        let id = if revokable {
            self.revoked_ids
                .pop_front()
                .unwrap_or_else(|| self.attachment.next_material_id())
        } else {
            self.attachment.next_material_id()
        };
        debug_assert!(!id.is_none());

        self.push_pending(Material { id, pipeline, images, owner_data });
        self.add_material(*descriptor, id, revokable);
        id
    }

    /// Drops every revokable material that binds any of the given images.
    ///
    /// The entries disappear from lookup immediately; the removal itself
    /// rides the next flush batch, and only then do the freed ids become
    /// reusable. Non-revokable materials are never touched.
    pub fn revoke_images(&mut self, images: &[TextureId]) {
        let pending = &mut self.pending_to_remove;
        for bucket in self.materials.values_mut() {
            bucket.retain(|entry| {
                if entry.revokable
                    && images.iter().any(|image| entry.descriptor.has_image(*image))
                {
                    trace!("revoking material {}", entry.id);
                    pending.push(entry.id);
                    false
                } else {
                    true
                }
            });
        }
    }

    /// Hands this frame's pending mutations to the compiler as one batch:
    /// additions in acquisition order, then removals in revocation order.
    ///
    /// Returns the dependency token gating the added materials, `None` when
    /// the frame had nothing to add. Removed ids enter the reuse pool here,
    /// not at revocation time.
    pub fn flush(&mut self, compiler: &dyn MaterialCompiler) -> Option<DependencyToken> {
        if self.pending_to_add.is_empty() && self.pending_to_remove.is_empty() {
            debug_assert!(self.dependency.is_none());
            return None;
        }

        let to_add = mem::take(&mut self.pending_to_add);
        let to_remove = mem::take(&mut self.pending_to_remove);
        self.revoked_ids.extend(to_remove.iter().copied());
        let dependency = self.dependency.take();

        trace!(
            "flushing material batch: {} to add, {} to remove",
            to_add.len(),
            to_remove.len()
        );
        compiler.compile_materials(CompilationBatch { to_add, to_remove }, dependency.clone());
        dependency
    }

    pub fn material_count(&self) -> usize {
        self.materials.values().map(Vec::len).sum()
    }

    /// Debug listing of every registered material, bucket by bucket.
    pub fn list_materials(&self) -> String {
        let mut out = String::new();
        for (hash, bucket) in &self.materials {
            let _ = writeln!(out, "{}:", hash);
            for entry in bucket {
                let _ = writeln!(out, "\t{} -> {}", entry.descriptor, entry.id);
            }
        }
        out
    }

    fn push_pending(&mut self, material: Material) {
        if self.dependency.is_none() {
            self.dependency = Some(Arc::new(DependencyEvent::new()));
        }
        self.pending_to_add.push(material);
    }

    fn add_material(&mut self, descriptor: MaterialDescriptor, id: MaterialId, revokable: bool) {
        let hash = descriptor.content_hash(&self.hasher);
        self.materials
            .entry(hash)
            .or_default()
            .push(RegisteredMaterial { descriptor, id, revokable });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{ColorMode, ImageData, PipelineParams, StencilParams};
    use crate::pipeline::{GraphicPipeline, PipelineLayout};
    use std::cell::RefCell;

    struct RecordingCompiler {
        batches: RefCell<Vec<(CompilationBatch, Option<DependencyToken>)>>,
    }

    impl RecordingCompiler {
        fn new() -> Self {
            Self { batches: RefCell::new(Vec::new()) }
        }

        fn batch_count(&self) -> usize {
            self.batches.borrow().len()
        }
    }

    impl MaterialCompiler for RecordingCompiler {
        fn compile_materials(&self, batch: CompilationBatch, dependency: Option<DependencyToken>) {
            self.batches.borrow_mut().push((batch, dependency));
        }
    }

    fn solid_pipeline() -> Arc<GraphicPipeline> {
        Arc::new(GraphicPipeline { name: "solid".into(), params: PipelineParams::default() })
    }

    fn attachment() -> Arc<MaterialAttachment> {
        let solid = solid_pipeline();
        let blended = Arc::new(GraphicPipeline {
            name: "blended".into(),
            params: PipelineParams::default().with_blend(wgpu::BlendState::ALPHA_BLENDING),
        });
        let mut attachment = MaterialAttachment::new(
            "ui",
            vec![PipelineLayout { name: "2d".into(), pipelines: vec![solid.clone(), blended] }],
        );
        attachment.add_predefined(solid, vec![], None);
        Arc::new(attachment)
    }

    fn image(id: u64) -> Arc<ImageData> {
        Arc::new(ImageData {
            id: TextureId(id),
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            width: 4,
            height: 4,
        })
    }

    fn textured(texture: u64) -> (MaterialDescriptor, Vec<MaterialImage>) {
        let images = vec![MaterialImage::new(image(texture), 0, ColorMode::SOLID)];
        let descriptor = MaterialDescriptor::from_images(&images, PipelineParams::default());
        (descriptor, images)
    }

    #[test]
    fn predefined_materials_resolve_without_acquisition() {
        let registry = MaterialRegistry::new(attachment());
        let descriptor = MaterialDescriptor::new(PipelineParams::default());
        assert_eq!(registry.get_material(&descriptor), MaterialId(1));
        assert_eq!(registry.material_count(), 1);
    }

    #[test]
    fn acquired_materials_are_found_by_equal_descriptors() {
        let mut registry = MaterialRegistry::new(attachment());
        let (descriptor, images) = textured(10);
        let id = registry.acquire_material(&descriptor, images, None, true);
        assert!(!id.is_none());
        assert_eq!(registry.get_material(&descriptor), id);

        let (copy, _) = textured(10);
        assert_eq!(registry.get_material(&copy), id);
    }

    #[test]
    fn descriptors_differing_by_a_sampler_get_distinct_ids() {
        let mut registry = MaterialRegistry::new(attachment());
        let (descriptor, images) = textured(10);
        let first = registry.acquire_material(&descriptor, images, None, true);

        let (mut other, mut other_images) = textured(10);
        other.samplers[0] = 1;
        other_images[0].sampler = 1;
        let second = registry.acquire_material(&other, other_images, None, true);
        assert_ne!(first, second);
        assert_eq!(registry.get_material(&other), second);
        assert_eq!(registry.get_material(&descriptor), first);
    }

    #[test]
    fn unresolvable_params_leave_the_registry_untouched() {
        let mut registry = MaterialRegistry::new(attachment());
        let before = registry.material_count();
        let (mut descriptor, images) = textured(10);
        descriptor.pipeline = PipelineParams::default().with_stencil(StencilParams::default());

        let id = registry.acquire_material(&descriptor, images, None, true);
        assert!(id.is_none());
        assert_eq!(registry.material_count(), before);

        let compiler = RecordingCompiler::new();
        assert!(registry.flush(&compiler).is_none());
        assert_eq!(compiler.batch_count(), 0);
    }

    #[test]
    fn acquisition_fills_image_views_from_the_resolved_pipeline() {
        let mut registry = MaterialRegistry::new(attachment());
        let (descriptor, images) = textured(10);
        registry.acquire_material(&descriptor, images, None, true);

        let compiler = RecordingCompiler::new();
        registry.flush(&compiler).expect("token");
        let batches = compiler.batches.borrow();
        let material = &batches[0].0.to_add[0];
        assert_eq!(material.images[0].view.dimension, wgpu::TextureViewDimension::D2);
        assert_eq!(material.images[0].view.format, wgpu::TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn acquired_images_take_their_sampler_from_the_descriptor() {
        let mut registry = MaterialRegistry::new(attachment());
        // The passed image still carries sampler 0; the descriptor the
        // material is registered under says 2.
        let (mut descriptor, images) = textured(10);
        descriptor.samplers[0] = 2;
        let id = registry.acquire_material(&descriptor, images, None, true);
        assert_eq!(registry.get_material(&descriptor), id);

        let compiler = RecordingCompiler::new();
        registry.flush(&compiler).expect("token");
        let batches = compiler.batches.borrow();
        let batch = &batches[0].0;
        assert_eq!(batch.to_add[0].images[0].sampler, 2);
        assert_eq!(batch.encode_entries()[0].sampler_slots[0], 2);
    }

    #[test]
    fn revoking_an_image_drops_only_revokable_materials() {
        let mut registry = MaterialRegistry::new(attachment());
        let (kept, kept_images) = textured(10);
        let kept_id = registry.acquire_material(&kept, kept_images, None, false);
        let (dropped, dropped_images) = textured(11);
        let dropped_id = registry.acquire_material(&dropped, dropped_images, None, true);

        registry.revoke_images(&[TextureId(10), TextureId(11)]);
        assert_eq!(registry.get_material(&kept), kept_id);
        assert_eq!(registry.get_material(&dropped), MaterialId::NONE);
        assert_ne!(dropped_id, MaterialId::NONE);
    }

    #[test]
    fn one_flush_carries_adds_then_removes_in_call_order() {
        let mut registry = MaterialRegistry::new(attachment());
        let (first, first_images) = textured(10);
        let first_id = registry.acquire_material(&first, first_images, None, true);
        let (second, second_images) = textured(11);
        let second_id = registry.acquire_material(&second, second_images, None, true);
        registry.revoke_images(&[TextureId(10)]);

        let compiler = RecordingCompiler::new();
        let token = registry.flush(&compiler).expect("adds produce a token");
        assert!(!token.is_satisfied());
        assert_eq!(compiler.batch_count(), 1);

        let batches = compiler.batches.borrow();
        let (batch, batch_token) = &batches[0];
        let added: Vec<_> = batch.to_add.iter().map(|m| m.id).collect();
        assert_eq!(added, vec![first_id, second_id]);
        assert_eq!(batch.to_remove, vec![first_id]);
        batch_token.as_ref().expect("token travels with the batch").signal();
        assert!(token.is_satisfied());
    }

    #[test]
    fn an_idle_frame_flushes_nothing() {
        let mut registry = MaterialRegistry::new(attachment());
        let compiler = RecordingCompiler::new();
        assert!(registry.flush(&compiler).is_none());
        assert_eq!(compiler.batch_count(), 0);
    }

    #[test]
    fn removal_only_batches_carry_no_dependency() {
        let mut registry = MaterialRegistry::new(attachment());
        let (descriptor, images) = textured(10);
        registry.acquire_material(&descriptor, images, None, true);
        let compiler = RecordingCompiler::new();
        registry.flush(&compiler).expect("token");

        registry.revoke_images(&[TextureId(10)]);
        assert!(registry.flush(&compiler).is_none());
        let batches = compiler.batches.borrow();
        let (batch, token) = &batches[1];
        assert!(batch.to_add.is_empty());
        assert_eq!(batch.to_remove.len(), 1);
        assert!(token.is_none());
    }

    #[test]
    fn revoked_ids_are_reused_fifo_and_only_after_the_flush() {
        let mut registry = MaterialRegistry::new(attachment());
        let compiler = RecordingCompiler::new();

        let (first, first_images) = textured(10);
        let first_id = registry.acquire_material(&first, first_images, None, true);
        let (second, second_images) = textured(11);
        let second_id = registry.acquire_material(&second, second_images, None, true);
        registry.flush(&compiler);

        registry.revoke_images(&[TextureId(10)]);
        registry.revoke_images(&[TextureId(11)]);

        // Ids are not reusable until the removal has been flushed.
        let (early, early_images) = textured(12);
        let early_id = registry.acquire_material(&early, early_images, None, true);
        assert_ne!(early_id, first_id);
        assert_ne!(early_id, second_id);
        registry.flush(&compiler);

        let (reuse_a, reuse_a_images) = textured(13);
        assert_eq!(registry.acquire_material(&reuse_a, reuse_a_images, None, true), first_id);
        let (reuse_b, reuse_b_images) = textured(14);
        assert_eq!(registry.acquire_material(&reuse_b, reuse_b_images, None, true), second_id);

        let (fresh, fresh_images) = textured(15);
        let fresh_id = registry.acquire_material(&fresh, fresh_images, None, true);
        assert_ne!(fresh_id, first_id);
        assert_ne!(fresh_id, second_id);
    }

    #[test]
    fn listing_contains_every_registered_id() {
        let mut registry = MaterialRegistry::new(attachment());
        let (descriptor, images) = textured(10);
        let id = registry.acquire_material(&descriptor, images, None, true);
        let listing = registry.list_materials();
        assert!(listing.contains(&format!("-> {}", id)));
        assert!(listing.contains("-> 1"));
    }
}

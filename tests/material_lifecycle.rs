/// Material lifecycle tests across sequential frames: predefined
/// materials, texture revocation, id reuse and compilation gating.
///
/// Run with:   cargo test --test material_lifecycle
use std::cell::RefCell;
use std::sync::Arc;

use sceno::wgpu;
use sceno::{
    ColorMode, CompilationBatch, DependencyEvent, DependencyToken, GraphicPipeline, ImageData,
    MaterialAttachment, MaterialCompiler, MaterialDescriptor, MaterialImage, Node, PipelineLayout,
    PipelineParams, SceneContext, SceneTree, Sprite, TextureId,
};
use sceno_test_scenes::{test_attachment, RecordingCompiler};

fn image(id: u64) -> Arc<ImageData> {
    Arc::new(ImageData {
        id: TextureId(id),
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        width: 16,
        height: 16,
    })
}

fn textured_descriptor(texture: u64) -> (MaterialDescriptor, Vec<MaterialImage>) {
    let images = vec![MaterialImage::new(image(texture), 0, ColorMode::SOLID)];
    let descriptor = MaterialDescriptor::from_images(&images, PipelineParams::default());
    (descriptor, images)
}

/// Materials baked into the attachment resolve on the very first frame,
/// with nothing to compile and nothing to wait on.
#[test]
fn predefined_materials_draw_without_compilation() {
    let solid = Arc::new(GraphicPipeline {
        name: "solid".into(),
        params: PipelineParams::default(),
    });
    let mut attachment = MaterialAttachment::new(
        "ui",
        vec![PipelineLayout { name: "2d".into(), pipelines: vec![solid.clone()] }],
    );
    let predefined = attachment.add_predefined(solid, Vec::new(), None);
    let mut context = SceneContext::new(Arc::new(attachment)).expect("context");

    let mut scene = SceneTree::new();
    scene.add_root(Node::new().with_component(Sprite::new(Vec::new(), PipelineParams::default())));

    let compiler = RecordingCompiler::new();
    let mut frame = context.begin_frame();
    scene.visit(&mut frame);
    let submission = frame.finish(&compiler);

    assert_eq!(submission.draw_ops.len(), 1);
    assert_eq!(submission.draw_ops[0].material, predefined);
    assert!(submission.wait_dependencies.is_empty());
    assert_eq!(compiler.batch_count(), 0);
}

/// Revoking a texture between frames drops its materials from lookup right
/// away, while the GPU-side removal rides the next frame's batch with no
/// dependency token.
#[test]
fn texture_revocation_rides_the_next_frames_batch() {
    let mut context = SceneContext::new(test_attachment()).expect("context");
    let compiler = RecordingCompiler::new();

    let (descriptor, images) = textured_descriptor(7);
    let mut frame = context.begin_frame();
    let id = frame.acquire_material(&descriptor, images, None, true);
    assert!(!id.is_none());
    frame.finish(&compiler);
    assert_eq!(compiler.batch_count(), 1);

    context.revoke_images(&[TextureId(7)]);
    assert_eq!(context.material_count(), 0);

    let frame = context.begin_frame();
    let submission = frame.finish(&compiler);
    assert!(submission.wait_dependencies.is_empty());
    assert_eq!(compiler.batch_count(), 2);
    let batches = compiler.batches();
    assert!(batches[1].to_add.is_empty());
    assert_eq!(batches[1].to_remove, vec![id]);
}

/// A revoked id stays out of circulation until its removal has flushed,
/// then comes back first-in first-out.
#[test]
fn revoked_ids_reenter_circulation_after_the_removal_flush() {
    let mut context = SceneContext::new(test_attachment()).expect("context");
    let compiler = RecordingCompiler::new();

    let (first, first_images) = textured_descriptor(1);
    let (second, second_images) = textured_descriptor(2);
    let mut frame = context.begin_frame();
    let first_id = frame.acquire_material(&first, first_images, None, true);
    let second_id = frame.acquire_material(&second, second_images, None, true);
    frame.finish(&compiler);

    context.revoke_images(&[TextureId(1)]);

    let (third, third_images) = textured_descriptor(3);
    let mut frame = context.begin_frame();
    let third_id = frame.acquire_material(&third, third_images, None, true);
    assert_ne!(third_id, first_id);
    assert_ne!(third_id, second_id);
    frame.finish(&compiler);

    let (fourth, fourth_images) = textured_descriptor(4);
    let mut frame = context.begin_frame();
    let fourth_id = frame.acquire_material(&fourth, fourth_images, None, true);
    assert_eq!(fourth_id, first_id);
    frame.finish(&compiler);
}

/// Compiler double that holds its tokens instead of signaling them.
#[derive(Default)]
struct PendingCompiler {
    tokens: RefCell<Vec<Option<DependencyToken>>>,
}

impl MaterialCompiler for PendingCompiler {
    fn compile_materials(&self, _batch: CompilationBatch, dependency: Option<DependencyToken>) {
        self.tokens.borrow_mut().push(dependency);
    }
}

/// A frame that acquired materials hands back unsatisfied tokens, one from
/// the flush and any the caller added, and draws must wait until each one
/// is signaled.
#[test]
fn submissions_wait_on_unsignaled_compilation() {
    let mut context = SceneContext::new(test_attachment()).expect("context");
    let compiler = PendingCompiler::default();
    let external: DependencyToken = Arc::new(DependencyEvent::new());

    let (descriptor, images) = textured_descriptor(3);
    let mut frame = context.begin_frame();
    frame.add_wait_dependency(external.clone());
    assert!(!frame.acquire_material(&descriptor, images, None, true).is_none());
    let submission = frame.finish(&compiler);

    assert_eq!(submission.wait_dependencies.len(), 2);
    assert!(!submission.wait_dependencies.iter().any(|token| token.is_satisfied()));

    external.signal();
    let tokens = compiler.tokens.borrow();
    tokens[0].as_ref().expect("flush token").signal();
    assert!(submission.wait_dependencies.iter().all(|token| token.is_satisfied()));
}

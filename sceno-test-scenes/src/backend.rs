use sceno::{
    CompilationBatch, DependencyToken, GraphicPipeline, MaterialAttachment, MaterialCompiler,
    PipelineLayout, PipelineParams,
};
use std::cell::{Ref, RefCell};
use std::sync::Arc;

/// Builds the attachment shared by the test scenes: one layout with a
/// plain opaque pipeline and an alpha-blended one.
pub fn test_attachment() -> Arc<MaterialAttachment> {
    let solid = Arc::new(GraphicPipeline {
        name: "solid".to_string(),
        params: PipelineParams::default(),
    });
    let blended = Arc::new(GraphicPipeline {
        name: "blended".to_string(),
        params: PipelineParams::default().with_blend(sceno::wgpu::BlendState::ALPHA_BLENDING),
    });
    Arc::new(MaterialAttachment::new(
        "test-scenes",
        vec![PipelineLayout {
            name: "2d".to_string(),
            pipelines: vec![solid, blended],
        }],
    ))
}

/// Material compiler double: records every batch it receives and signals
/// the dependency token immediately, as a backend that compiled the batch
/// synchronously would.
#[derive(Default)]
pub struct RecordingCompiler {
    batches: RefCell<Vec<CompilationBatch>>,
}

impl RecordingCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.borrow().len()
    }

    pub fn batches(&self) -> Ref<'_, Vec<CompilationBatch>> {
        self.batches.borrow()
    }
}

impl MaterialCompiler for RecordingCompiler {
    fn compile_materials(&self, batch: CompilationBatch, dependency: Option<DependencyToken>) {
        self.batches.borrow_mut().push(batch);
        if let Some(token) = dependency {
            token.signal();
        }
    }
}

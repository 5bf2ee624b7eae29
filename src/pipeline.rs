use std::sync::Arc;

use ahash::{HashMap, HashMapExt, RandomState};

use crate::material::{MaterialDescriptor, PipelineParams};

/// A compiled graphics pipeline as enumerated by the backend attachment.
///
/// The resolver never compiles anything; it only picks between pipelines the
/// backend already built, by comparing their parameter blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicPipeline {
    pub name: String,
    pub params: PipelineParams,
}

/// One pipeline layout scope and the pipelines bound to it.
#[derive(Debug, Clone)]
pub struct PipelineLayout {
    pub name: String,
    pub pipelines: Vec<Arc<GraphicPipeline>>,
}

struct LayoutScope {
    name: String,
    buckets: HashMap<u64, Vec<Arc<GraphicPipeline>>>,
}

/// Maps material descriptors to concrete pipelines.
///
/// Built once from the attachment's layout enumeration. Lookup hashes the
/// descriptor's parameter block, scans the matching bucket for an exact
/// parameter match, and walks layout scopes in enumeration order, so
/// resolution is deterministic: the first compatible pipeline wins.
pub struct PipelineResolver {
    scopes: Vec<LayoutScope>,
    hasher: RandomState,
}

impl PipelineResolver {
    pub fn new(layouts: &[PipelineLayout]) -> Self {
        let hasher = RandomState::new();
        let mut scopes = Vec::with_capacity(layouts.len());
        for layout in layouts {
            let mut buckets: HashMap<u64, Vec<Arc<GraphicPipeline>>> = HashMap::new();
            for pipeline in &layout.pipelines {
                let hash = pipeline.params.content_hash(&hasher);
                buckets.entry(hash).or_default().push(pipeline.clone());
            }
            scopes.push(LayoutScope { name: layout.name.clone(), buckets });
        }
        Self { scopes, hasher }
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn layout_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|scope| scope.name.as_str())
    }

    /// Resolves the pipeline for a descriptor, scanning every layout scope
    /// in enumeration order.
    pub fn resolve(&self, descriptor: &MaterialDescriptor) -> Option<&Arc<GraphicPipeline>> {
        let hash = descriptor.pipeline.content_hash(&self.hasher);
        self.scopes
            .iter()
            .find_map(|scope| self.resolve_in_scope(scope, hash, descriptor))
    }

    /// Resolves within a single named layout scope.
    pub fn resolve_in(
        &self,
        layout: &str,
        descriptor: &MaterialDescriptor,
    ) -> Option<&Arc<GraphicPipeline>> {
        let hash = descriptor.pipeline.content_hash(&self.hasher);
        self.scopes
            .iter()
            .find(|scope| scope.name == layout)
            .and_then(|scope| self.resolve_in_scope(scope, hash, descriptor))
    }

    fn resolve_in_scope<'a>(
        &self,
        scope: &'a LayoutScope,
        hash: u64,
        descriptor: &MaterialDescriptor,
    ) -> Option<&'a Arc<GraphicPipeline>> {
        scope.buckets.get(&hash)?.iter().find(|pipeline| {
            pipeline.params == descriptor.pipeline
                && self.is_pipeline_compatible(pipeline, descriptor)
        })
    }

    /// Secondary compatibility check after the exact parameter match.
    ///
    /// Accepts everything for now; correctness rests on the parameter
    /// equality above.
    // TODO: validate the descriptor's image slots against the pipeline's
    // layout once attachments describe their texture-set shapes.
    fn is_pipeline_compatible(
        &self,
        _pipeline: &GraphicPipeline,
        _descriptor: &MaterialDescriptor,
    ) -> bool {
        true
    }
}

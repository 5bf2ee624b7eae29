use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::id::MaterialId;
use crate::material::{Material, MaterialImage};
use crate::pipeline::{GraphicPipeline, PipelineLayout};

/// The backend contract a material registry is built over: the pipeline
/// layout enumeration, the material id counter, and the materials the
/// backend predefines.
///
/// Ids start at 1; zero stays reserved for [`MaterialId::NONE`]. Predefined
/// materials draw their ids from the same counter and are registered
/// non-revokable, so image revocation never touches them.
#[derive(Debug)]
pub struct MaterialAttachment {
    name: String,
    layouts: Vec<PipelineLayout>,
    next_id: AtomicU32,
    predefined: Vec<Material>,
}

impl MaterialAttachment {
    pub fn new(name: impl Into<String>, layouts: Vec<PipelineLayout>) -> Self {
        Self { name: name.into(), layouts, next_id: AtomicU32::new(1), predefined: Vec::new() }
    }

    /// Registers a built-in material, assigning it the next id. Call before
    /// handing the attachment to a context.
    pub fn add_predefined(
        &mut self,
        pipeline: Arc<GraphicPipeline>,
        images: Vec<MaterialImage>,
        owner_data: Option<Vec<u8>>,
    ) -> MaterialId {
        let id = self.next_material_id();
        self.predefined.push(Material { id, pipeline, images, owner_data });
        id
    }

    pub fn next_material_id(&self) -> MaterialId {
        MaterialId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layouts(&self) -> &[PipelineLayout] {
        &self.layouts
    }

    pub fn predefined(&self) -> &[Material] {
        &self.predefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::PipelineParams;

    #[test]
    fn material_ids_start_at_one_and_increment() {
        let attachment = MaterialAttachment::new("test", vec![]);
        assert_eq!(attachment.next_material_id(), MaterialId(1));
        assert_eq!(attachment.next_material_id(), MaterialId(2));
        assert!(!attachment.next_material_id().is_none());
    }

    #[test]
    fn predefined_materials_share_the_id_counter() {
        let pipeline = Arc::new(GraphicPipeline {
            name: "solid".into(),
            params: PipelineParams::default(),
        });
        let mut attachment = MaterialAttachment::new("test", vec![]);
        let first = attachment.add_predefined(pipeline.clone(), vec![], None);
        let second = attachment.add_predefined(pipeline, vec![], None);
        assert_eq!(first, MaterialId(1));
        assert_eq!(second, MaterialId(2));
        assert_eq!(attachment.next_material_id(), MaterialId(3));
        assert_eq!(attachment.predefined().len(), 2);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytemuck::Zeroable;

use crate::id::MaterialId;
use crate::material::{Material, MAX_MATERIAL_IMAGES};

/// One frame's worth of material mutations, handed to the compiler in a
/// single piece: additions first, in acquisition order, then removals in
/// revocation order.
#[derive(Debug, Default)]
pub struct CompilationBatch {
    pub to_add: Vec<Material>,
    pub to_remove: Vec<MaterialId>,
}

impl CompilationBatch {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Upload records for the added materials, in batch order.
    pub fn encode_entries(&self) -> Vec<MaterialTableEntry> {
        self.to_add.iter().map(MaterialTableEntry::from_material).collect()
    }
}

/// GPU-uploadable record of one material-table slot. Texture ids are
/// truncated to their texture-set slot, color modes are packed via
/// [`crate::ColorMode::to_bits`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialTableEntry {
    pub material_id: u32,
    pub image_slots: [u32; MAX_MATERIAL_IMAGES],
    pub sampler_slots: [u32; MAX_MATERIAL_IMAGES],
    pub color_modes: [u32; MAX_MATERIAL_IMAGES],
    pub owner_data_len: u32,
}

impl MaterialTableEntry {
    pub fn from_material(material: &Material) -> Self {
        let mut entry = Self::zeroed();
        entry.material_id = material.id.0;
        for (idx, image) in material.images.iter().take(MAX_MATERIAL_IMAGES).enumerate() {
            entry.image_slots[idx] = image.image.id.0 as u32;
            entry.sampler_slots[idx] = image.sampler as u32;
            entry.color_modes[idx] = image.view.color_mode.to_bits();
        }
        entry.owner_data_len =
            material.owner_data.as_ref().map(|data| data.len() as u32).unwrap_or(0);
        entry
    }
}

/// One-shot gate between a flushed material batch and the draws that use it.
///
/// The compiler signals the event once the batch has landed on the GPU; draw
/// commands referencing the batch's materials must not execute earlier.
/// Signaling is idempotent and cannot be undone.
#[derive(Debug, Default)]
pub struct DependencyEvent {
    satisfied: AtomicBool,
}

/// Shared handle to a [`DependencyEvent`].
pub type DependencyToken = Arc<DependencyEvent>;

impl DependencyEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.satisfied.store(true, Ordering::Release);
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied.load(Ordering::Acquire)
    }
}

/// Backend collaborator that lands material batches on the GPU.
///
/// `dependency` is `None` for removal-only batches, which gate nothing.
pub trait MaterialCompiler {
    fn compile_materials(&self, batch: CompilationBatch, dependency: Option<DependencyToken>);
}

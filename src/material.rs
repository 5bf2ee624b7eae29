use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

use ahash::RandomState;

use crate::id::TextureId;
use crate::pipeline::GraphicPipeline;

/// Number of image slots a single material can bind.
pub const MAX_MATERIAL_IMAGES: usize = 4;

/// Source channel for one component of a sampled color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ChannelSource {
    Identity = 0,
    Zero = 1,
    One = 2,
    R = 3,
    G = 4,
    B = 5,
    A = 6,
}

/// How a bound image's channels map to the shader's color input.
///
/// `Solid` samples the image as-is; `Custom` remaps every component. The
/// presets cover the common single-channel cases: [`ColorMode::INTENSITY`]
/// broadcasts the red channel over RGB with opaque alpha, and
/// [`ColorMode::ALPHA`] turns the red channel into an alpha mask over white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMode {
    #[default]
    Solid,
    Custom {
        r: ChannelSource,
        g: ChannelSource,
        b: ChannelSource,
        a: ChannelSource,
    },
}

impl ColorMode {
    pub const SOLID: Self = Self::Solid;

    pub const INTENSITY: Self = Self::Custom {
        r: ChannelSource::R,
        g: ChannelSource::R,
        b: ChannelSource::R,
        a: ChannelSource::One,
    };

    pub const ALPHA: Self = Self::Custom {
        r: ChannelSource::One,
        g: ChannelSource::One,
        b: ChannelSource::One,
        a: ChannelSource::R,
    };

    /// Packs the mode into a u32 for material-table upload: mode in the low
    /// 4 bits, then 7 bits per component.
    pub fn to_bits(&self) -> u32 {
        match self {
            ColorMode::Solid => 0,
            ColorMode::Custom { r, g, b, a } => {
                1 | (*r as u32) << 4 | (*g as u32) << 11 | (*b as u32) << 18 | (*a as u32) << 25
            }
        }
    }
}

/// Primitive class a pipeline rasterizes, derived from its line width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveClass {
    Triangles,
    Lines,
    Points,
}

/// Line width with primitive-class encoding.
///
/// Zero means filled triangles, a positive value means line primitives of
/// that width, a negative value means point primitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineWidth(pub f32);

impl LineWidth {
    pub const FILL: Self = Self(0.0);

    pub fn lines(width: f32) -> Self {
        Self(width.max(0.0))
    }

    pub fn points() -> Self {
        Self(-1.0)
    }

    pub fn primitive_class(&self) -> PrimitiveClass {
        if self.0 == 0.0 {
            PrimitiveClass::Triangles
        } else if self.0 > 0.0 {
            PrimitiveClass::Lines
        } else {
            PrimitiveClass::Points
        }
    }
}

impl PartialEq for LineWidth {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for LineWidth {}

impl Hash for LineWidth {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Depth test and write configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthParams {
    pub write_enabled: bool,
    pub test_enabled: bool,
    pub compare: wgpu::CompareFunction,
}

impl Default for DepthParams {
    fn default() -> Self {
        Self { write_enabled: false, test_enabled: false, compare: wgpu::CompareFunction::Always }
    }
}

/// Depth bounds test range. Ignored by comparison when disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthBounds {
    pub enabled: bool,
    pub min: f32,
    pub max: f32,
}

impl PartialEq for DepthBounds {
    fn eq(&self, other: &Self) -> bool {
        if self.enabled != other.enabled {
            return false;
        }
        if !self.enabled {
            return true;
        }
        self.min.to_bits() == other.min.to_bits() && self.max.to_bits() == other.max.to_bits()
    }
}

impl Eq for DepthBounds {}

impl Hash for DepthBounds {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.enabled.hash(state);
        if self.enabled {
            self.min.to_bits().hash(state);
            self.max.to_bits().hash(state);
        }
    }
}

/// Stencil configuration for both faces.
///
/// Wrapped in an `Option` on [`PipelineParams`], so face state takes part in
/// equality and hashing only when the stencil test is enabled at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StencilParams {
    pub front: wgpu::StencilFaceState,
    pub back: wgpu::StencilFaceState,
    pub read_mask: u32,
    pub write_mask: u32,
}

/// The fixed-function parameter block that selects a concrete compiled
/// pipeline.
///
/// Two materials with equal `PipelineParams` resolve to the same pipeline;
/// any difference (one blend factor, one stencil mask) selects another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineParams {
    pub blend: Option<wgpu::BlendState>,
    pub write_mask: wgpu::ColorWrites,
    pub depth: DepthParams,
    pub depth_bounds: DepthBounds,
    pub stencil: Option<StencilParams>,
    pub line_width: LineWidth,
    pub view_dimension: wgpu::TextureViewDimension,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
            depth: DepthParams::default(),
            depth_bounds: DepthBounds::default(),
            stencil: None,
            line_width: LineWidth::FILL,
            view_dimension: wgpu::TextureViewDimension::D2,
        }
    }
}

impl PipelineParams {
    /// Bucket key for resolver lookups. Equal params always produce equal
    /// hashes under the same hasher state.
    pub fn content_hash(&self, hasher: &RandomState) -> u64 {
        hasher.hash_one(self)
    }

    pub fn with_blend(mut self, blend: wgpu::BlendState) -> Self {
        self.blend = Some(blend);
        self
    }

    pub fn with_depth(mut self, depth: DepthParams) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_stencil(mut self, stencil: StencilParams) -> Self {
        self.stencil = Some(stencil);
        self
    }

    pub fn with_line_width(mut self, line_width: LineWidth) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn with_view_dimension(mut self, view_dimension: wgpu::TextureViewDimension) -> Self {
        self.view_dimension = view_dimension;
        self
    }
}

impl fmt::Display for PipelineParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blend:{} depth:{}{} stencil:{} {:?}",
            if self.blend.is_some() { "on" } else { "off" },
            if self.depth.test_enabled { "t" } else { "-" },
            if self.depth.write_enabled { "w" } else { "-" },
            if self.stencil.is_some() { "on" } else { "off" },
            self.line_width.primitive_class(),
        )
    }
}

/// An image registered with the backend's texture-set cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub id: TextureId,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

/// View configuration for one image bound by a material, computed during
/// acquisition from the image's format, the resolved pipeline's view
/// dimension, and the descriptor's color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageViewInfo {
    pub format: wgpu::TextureFormat,
    pub dimension: wgpu::TextureViewDimension,
    pub color_mode: ColorMode,
}

impl ImageViewInfo {
    pub fn new(
        image: &ImageData,
        dimension: wgpu::TextureViewDimension,
        color_mode: ColorMode,
    ) -> Self {
        Self { format: image.format, dimension, color_mode }
    }
}

/// One image slot of a material: the image, its sampler index, and the view
/// the material samples through.
#[derive(Debug, Clone)]
pub struct MaterialImage {
    pub image: Arc<ImageData>,
    pub sampler: u16,
    pub color_mode: ColorMode,
    pub view: ImageViewInfo,
}

impl MaterialImage {
    pub fn new(image: Arc<ImageData>, sampler: u16, color_mode: ColorMode) -> Self {
        let view = ImageViewInfo::new(&image, wgpu::TextureViewDimension::D2, color_mode);
        Self { image, sampler, color_mode, view }
    }
}

/// The identity key of a material.
///
/// Registry lookups hash the descriptor and then disambiguate hash
/// collisions with full equality, so every field takes part in identity:
/// bound image ids, per-slot sampler indices and color modes, and the whole
/// pipeline parameter block.
///
/// # Examples
///
/// ```
/// use sceno::{ColorMode, MaterialDescriptor, PipelineParams, TextureId};
///
/// let mut descriptor = MaterialDescriptor::new(PipelineParams::default());
/// descriptor.set_image(0, TextureId(7), 0, ColorMode::SOLID);
/// assert!(descriptor.has_image(TextureId(7)));
/// assert!(!descriptor.has_image(TextureId(8)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialDescriptor {
    pub images: [TextureId; MAX_MATERIAL_IMAGES],
    pub samplers: [u16; MAX_MATERIAL_IMAGES],
    pub color_modes: [ColorMode; MAX_MATERIAL_IMAGES],
    pub pipeline: PipelineParams,
}

impl MaterialDescriptor {
    pub fn new(pipeline: PipelineParams) -> Self {
        Self {
            images: [TextureId(0); MAX_MATERIAL_IMAGES],
            samplers: [0; MAX_MATERIAL_IMAGES],
            color_modes: [ColorMode::SOLID; MAX_MATERIAL_IMAGES],
            pipeline,
        }
    }

    /// Builds the descriptor for a set of bound images. Slots beyond
    /// [`MAX_MATERIAL_IMAGES`] are ignored.
    pub fn from_images(images: &[MaterialImage], pipeline: PipelineParams) -> Self {
        let mut ret = Self::new(pipeline);
        for (idx, image) in images.iter().take(MAX_MATERIAL_IMAGES).enumerate() {
            ret.images[idx] = image.image.id;
            ret.samplers[idx] = image.sampler;
            ret.color_modes[idx] = image.color_mode;
        }
        ret
    }

    pub fn set_image(&mut self, slot: usize, id: TextureId, sampler: u16, color_mode: ColorMode) {
        debug_assert!(slot < MAX_MATERIAL_IMAGES);
        if slot < MAX_MATERIAL_IMAGES {
            self.images[slot] = id;
            self.samplers[slot] = sampler;
            self.color_modes[slot] = color_mode;
        }
    }

    /// Whether any slot binds the given image.
    pub fn has_image(&self, id: TextureId) -> bool {
        id.0 != 0 && self.images.contains(&id)
    }

    /// Bucket key for registry lookups.
    pub fn content_hash(&self, hasher: &RandomState) -> u64 {
        hasher.hash_one(self)
    }
}

impl fmt::Display for MaterialDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "images:[")?;
        let mut first = true;
        for (idx, image) in self.images.iter().enumerate() {
            if image.0 != 0 {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "{}/{}", image, self.samplers[idx])?;
                first = false;
            }
        }
        write!(f, "] {}", self.pipeline)
    }
}

/// A fully assembled material: the resolved pipeline, the bound images with
/// their computed views, and optional opaque data owned by whoever acquired
/// the material.
#[derive(Debug, Clone)]
pub struct Material {
    pub id: crate::id::MaterialId,
    pub pipeline: Arc<GraphicPipeline>,
    pub images: Vec<MaterialImage>,
    pub owner_data: Option<Vec<u8>>,
}

impl Material {
    /// Rebuilds the identity descriptor from the assembled record. Used when
    /// registering predefined materials delivered by the attachment.
    pub fn descriptor(&self) -> MaterialDescriptor {
        debug_assert!(self.images.len() <= MAX_MATERIAL_IMAGES);
        MaterialDescriptor::from_images(&self.images, self.pipeline.params)
    }
}

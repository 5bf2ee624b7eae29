pub use lyon;
pub use wgpu;

mod backend;
mod batch;
mod context;
mod draw_state;
mod frame;
mod id;
mod material;
mod node;
mod pipeline;
mod rect;
mod registry;
mod scene;
mod sprite;
mod state_scope;

pub use backend::MaterialAttachment;
pub use batch::{
    CompilationBatch, DependencyEvent, DependencyToken, MaterialCompiler, MaterialTableEntry,
};
pub use context::{ContextError, SceneContext};
pub use draw_state::{DrawState, DrawStateFlags, StackEntry, StateModifier, StateStack, StateTable};
pub use frame::{DrawOp, FrameHandle, FrameSubmission};
pub use id::{MaterialId, ScopeOwnerId, StateId, TextureId};
pub use material::{
    ChannelSource, ColorMode, DepthBounds, DepthParams, ImageData, ImageViewInfo, LineWidth,
    Material, MaterialDescriptor, MaterialImage, PipelineParams, PrimitiveClass, StencilParams,
    MAX_MATERIAL_IMAGES,
};
pub use node::{Node, NodeGeometry, SceneComponent};
pub use pipeline::{GraphicPipeline, PipelineLayout, PipelineResolver};
pub use rect::{Padding, URect};
pub use registry::MaterialRegistry;
pub use scene::SceneTree;
pub use sprite::Sprite;
pub use state_scope::{StateApplyMode, StateScope};

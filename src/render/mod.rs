pub mod apply;
pub mod material;
pub mod texture;

pub use apply::{ApplyReport, SceneMaterialApplicator};
pub use material::{Material, MaterialError, MaterialFactory, MaterialHandle, MaterialKind};
pub use texture::{
    ImageFileLoader, LoadOutcome, Sampler, SourceState, Texture, TextureCache, TextureError,
    TextureLoader, TextureSource,
};

pub mod coupling;
pub mod exclusion;
pub mod material;
pub mod part;
pub mod selector;

pub use coupling::CouplingRule;
pub use exclusion::ExclusionFilter;
pub use material::{resolve_finish, resolve_material_definition, FinishSource, ResolvedFinish};
pub use part::resolve_part;
pub use selector::matches;

pub mod normalize;
pub mod system;
pub mod tier;

pub use normalize::{normalize, normalize_detailed, Normalized};
pub use system::{GradingSystemModel, ScaleKind};
pub use tier::{classify, Tier};

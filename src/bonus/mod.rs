pub mod config;
pub mod engine;
pub mod factors;
pub mod levels;
pub mod validation;

pub use config::{BonusConfig, FactorOverride};
pub use engine::{
    calculate_single_grade_bonus, calculate_term_bonus, round2, BonusBreakdown, NormalizedResult,
    RawGradeEntry, SkippedEntry, TermBonus,
};
pub use factors::{
    resolve, BonusFactor, EffectiveFactorTable, FactorKind, FactorSource, FactorType, FactorValue,
};
pub use levels::{LevelBand, RangeOp};
pub use validation::validate_bonus;

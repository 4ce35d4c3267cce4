//! Grade normalization and bonus calculation.
//!
//! Raw grades from heterogeneous grading systems are mapped onto a common
//! 0-100 scale, classified into quality tiers and turned into bonuses using
//! default factors that can be overridden per user and per child.

pub mod bonus;
pub mod config;
pub mod error;
pub mod grading;
pub mod ledger;
pub mod output;
pub mod term;

pub use bonus::{
    calculate_single_grade_bonus, calculate_term_bonus, resolve, BonusFactor,
    EffectiveFactorTable, FactorType, NormalizedResult, RawGradeEntry, TermBonus,
};
pub use error::GradeError;
pub use grading::{classify, normalize, GradingSystemModel, ScaleKind, Tier};

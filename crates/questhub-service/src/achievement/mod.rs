//! Achievement evaluation.

pub mod evaluator;

pub use evaluator::{AchievementEvaluator, UnlockOutcome, first_achievable};

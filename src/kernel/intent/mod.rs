//! Transcript classification.
//!
//! Pure and side-effect free: matching never touches speech, network or
//! session state, so it can be exercised on its own.

pub mod classifier;
pub mod types;

pub use classifier::{classify, recipe_query, Rule, RULES};
pub use types::{Intent, IntentKind};

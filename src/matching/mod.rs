pub mod category;
pub mod matcher;
pub mod tokenizer;

pub use category::{compatible, infer_category, PantryCategory};
pub use matcher::{best_match, MatchCandidate, MatchOutcome, MATCH_THRESHOLD};
pub use tokenizer::tokenize;

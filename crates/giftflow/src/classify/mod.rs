//! Classify - token extraction and destination code resolution

pub mod classifier;
pub mod tokens;

pub use classifier::{classify, classify_with, detect_code, match_event, Classification};
pub use tokens::{normalize, split_tokens, tokenize};

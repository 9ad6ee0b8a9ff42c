//! Scout - image reference discovery
//!
//! Finds the files worth looking at ([`Scanner`]) and the image references
//! inside them ([`ImagePattern`]).

pub mod patterns;
pub mod scanner;

pub use patterns::{ImageMatch, ImagePattern, PatternCache, RESERVED_TAGS};
pub use scanner::{ScanConfig, Scanner};

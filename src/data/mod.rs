//! Choice data preparation.
//!
//! - column mapping and validated array building (`arrays`)
//! - descriptive statistics (`descriptives`)
//! - seeded synthetic panels with a known VTT distribution (`synthetic`)

pub mod arrays;
pub mod descriptives;
pub mod synthetic;

pub use arrays::*;
pub use descriptives::*;
pub use synthetic::*;

//! Promotion Types

mod bogo;
mod bundle;

pub use bogo::*;
pub use bundle::*;

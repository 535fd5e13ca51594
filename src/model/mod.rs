//! Measurements and their line protocol encoding

mod field;
mod measurement;
mod precision;
pub(crate) mod rules;
mod timestamp;

pub use field::*;
pub use measurement::*;
pub use precision::*;
pub use timestamp::*;

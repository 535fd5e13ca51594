//! Database administration

mod create_database;
mod drop_database;

pub use create_database::*;
pub use drop_database::*;

//! the test_utils folder here will share utils or test components between
//! unit tests
mod common;
mod log_builder;

pub use common::*;
pub use log_builder::*;

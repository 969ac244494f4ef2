//! dpitune library - exposes modules for integration tests

pub mod probe;
pub mod select;
pub mod service;
pub mod trial;

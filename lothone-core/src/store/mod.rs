//! Account store implementations

mod json_file;

pub use json_file::JsonFileStore;

pub mod document;
pub mod entity;
pub mod file;

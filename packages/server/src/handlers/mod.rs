pub mod documents;
pub mod entities;
pub mod files;

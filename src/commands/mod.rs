pub mod export;
pub mod project;

pub mod camera;
pub mod effects;
pub mod events;
pub mod project;

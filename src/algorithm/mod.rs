pub mod bounds;
pub mod camera_engine;
pub mod cursor_signal;
pub mod follow;
pub mod framing;
pub mod freeze;
pub mod motion;
pub mod physics;
pub mod scale;
pub mod zoom_blocks;

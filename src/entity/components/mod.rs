pub mod character_physics;
pub mod fall_monitor;
pub mod objects;

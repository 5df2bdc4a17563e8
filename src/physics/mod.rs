pub mod character_controller;
pub mod collision_flags;
pub mod physics_world;

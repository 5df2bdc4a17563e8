pub mod character_physics_system;

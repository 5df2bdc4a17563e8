pub mod components;
pub mod entity_tracker;
pub mod messages;
pub mod systems;

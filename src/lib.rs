//! Kinematic character movement: a capsule controller over a rapier world, driven by movement intents, with
//! fall death and movement sync towards the server.

pub mod entity;
pub mod error;
pub mod game;
pub mod networking;
pub mod physics;
pub mod settings;
pub mod util;

pub use error::CharacterError;

use glam::Vec3;

/// Messages other components send to a character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentMessage {
    MoveObject { direction: Vec3, should_jump: bool },
    /// Authoritative correction, e.g. from the server.
    SyncPosition { position: Vec3 },
    Died,
}

/// What a character tells the other components of its entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalBroadcast {
    /// Sent every frame, for animation and audio.
    CharacterInfo { direction: Vec3, is_jumping: bool },
    PositionChanged { position: Vec3, direction: Vec3 },
}

/// Whether a component stays on its entity after handling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Keep,
    /// Remove the component once the current dispatch is done.
    Detach,
}

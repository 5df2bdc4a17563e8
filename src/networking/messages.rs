use glam::Vec3;

/// Client to server: what the character wants to do this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterInformationMessage {
    pub object_id: u64,
    pub wanted_direction: Vec3,
    pub is_jumping: bool,
}

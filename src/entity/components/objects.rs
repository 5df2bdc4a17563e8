use glam::Vec3;

/// World position of an entity. Characters keep it in sync through PositionChanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPosition(pub Vec3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    current: i32,
}

impl Health {
    pub fn new(current: i32) -> Self {
        Self { current }
    }

    pub fn get(&self) -> i32 {
        self.current
    }

    pub fn set(&mut self, value: i32) {
        self.current = value;
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }
}

/// The part of the input handling that cares about movement settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerInput {
    sensitivity: f32,
}

impl PlayerInput {
    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }
}

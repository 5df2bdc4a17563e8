use crate::entity::components::objects::Health;

/// Seconds of continuous falling after which a living character dies.
pub const TIME_FALLING_TO_DEATH: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallOutcome {
    Grounded,
    Airborne,
    /// Health has just been set to zero. The caller skips the rest of the frame.
    Died,
}

#[derive(Debug, Clone)]
pub struct FallMonitor {
    airborne_time: f32,
    threshold: f32,
}

impl Default for FallMonitor {
    fn default() -> Self {
        Self::new(TIME_FALLING_TO_DEATH)
    }
}

impl FallMonitor {
    pub fn new(threshold: f32) -> Self {
        Self {
            airborne_time: 0.0,
            threshold,
        }
    }

    pub fn airborne_time(&self) -> f32 {
        self.airborne_time
    }

    /// Only living characters accumulate airborne time. Once health is down to zero, the health system owns what
    /// happens next and we don't kill twice.
    pub fn observe(&mut self, grounded: bool, health: Option<&mut Health>, delta_time: f32) -> FallOutcome {
        if grounded {
            self.airborne_time = 0.0;
            return FallOutcome::Grounded;
        }

        let Some(health) = health else {
            return FallOutcome::Airborne;
        };

        if !health.is_alive() {
            return FallOutcome::Airborne;
        }

        self.airborne_time += delta_time;
        if self.airborne_time >= self.threshold {
            self.airborne_time = 0.0;
            health.set(0);
            return FallOutcome::Died;
        }

        FallOutcome::Airborne
    }
}

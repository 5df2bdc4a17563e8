/// How often per second the character movement is sent to the server.
pub const SYNC_FRAME_RATE: f32 = 100.0;

/// A countdown that fires at most once per period, no matter how many frames are squeezed into it.
#[derive(Debug, Clone)]
pub struct SyncTimer {
    remaining: f32,
    period: f32,
}

impl Default for SyncTimer {
    fn default() -> Self {
        Self::with_rate(SYNC_FRAME_RATE)
    }
}

impl SyncTimer {
    pub fn with_rate(rate: f32) -> Self {
        let period = 1.0 / rate;
        Self {
            remaining: period,
            period,
        }
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    /// Returns true when the period has expired. Surplus time is dropped rather than carried over.
    pub fn tick(&mut self, delta_time: f32) -> bool {
        self.remaining -= delta_time;
        if self.remaining <= 0.0 {
            self.remaining = self.period;
            return true;
        }

        false
    }
}

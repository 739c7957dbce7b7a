use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Presented frames per second, recomputed once per window of at least one
/// second. Before the first window closes the rate is the running average.
#[derive(Debug, Default)]
pub struct FrameRateMeter {
    window_start: Option<Instant>,
    window_frames: u32,
    window_closed: bool,
    rate: f64,
}

impl FrameRateMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f64 {
        let start = *self.window_start.get_or_insert(now);
        self.window_frames += 1;
        let elapsed = now.saturating_duration_since(start);

        if elapsed >= WINDOW {
            self.rate = f64::from(self.window_frames) / elapsed.as_secs_f64();
            self.window_frames = 0;
            self.window_start = Some(now);
            self.window_closed = true;
        } else if !self.window_closed && !elapsed.is_zero() {
            self.rate = f64::from(self.window_frames) / elapsed.as_secs_f64();
        }
        self.rate
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

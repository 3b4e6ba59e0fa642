use crate::config::{TONE_MIN_EFFECTIVE_HZ, TONE_MIN_HALF_PERIOD_US};
use crate::hal::ToneOutput;

/// Polled square-wave generator. `tick` toggles the pin when the half-period
/// deadline passes and never tries to catch up on missed edges.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToneSynth {
    running: bool,
    level: bool,
    half_period_us: u64,
    next_toggle_us: u64,
    stop_at_us: u64,
}

impl ToneSynth {
    pub const fn new() -> Self {
        Self {
            running: false,
            level: false,
            half_period_us: 0,
            next_toggle_us: 0,
            stop_at_us: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn half_period_us(&self) -> u64 {
        self.half_period_us
    }

    pub fn start_tone<O: ToneOutput>(
        &mut self,
        output: &mut O,
        frequency_hz: u16,
        duration_ms: u32,
        volume: u8,
        now_us: u64,
    ) {
        if frequency_hz == 0 || volume == 0 {
            self.stop(output);
            return;
        }

        self.half_period_us = half_period_for(frequency_hz, volume);
        self.next_toggle_us = now_us + self.half_period_us;
        self.stop_at_us = now_us + u64::from(duration_ms) * 1_000;
        self.running = true;
        self.level = true;
        output.set_level(true);
    }

    pub fn tick<O: ToneOutput>(&mut self, output: &mut O, now_us: u64) {
        if !self.running {
            return;
        }

        if now_us >= self.next_toggle_us {
            self.level = !self.level;
            output.set_level(self.level);
            self.next_toggle_us += self.half_period_us;
            if now_us > self.next_toggle_us {
                self.next_toggle_us = now_us + self.half_period_us;
            }
        }

        if now_us >= self.stop_at_us {
            self.stop(output);
        }
    }

    pub fn stop<O: ToneOutput>(&mut self, output: &mut O) {
        self.running = false;
        self.level = false;
        output.set_level(false);
    }
}

/// Volume 0..=100 scales the pitch between 20% and 100%, floored at 120 Hz.
pub fn half_period_for(frequency_hz: u16, volume: u8) -> u64 {
    let volume = volume.min(100) as f32;
    let scale = 0.2 + (volume / 100.0) * 0.8;
    let effective_hz = ((frequency_hz as f32 * scale) as u32).max(TONE_MIN_EFFECTIVE_HZ);
    ((1_000_000 / u64::from(effective_hz)) / 2).max(TONE_MIN_HALF_PERIOD_US)
}

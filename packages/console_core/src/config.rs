use embedded_graphics::pixelcolor::Rgb565;
use u8g2_fonts::{fonts, FontRenderer};

pub const DISPLAY_WIDTH: i32 = 160;
pub const DISPLAY_HEIGHT: i32 = 128;
pub const STATUS_BAR_HEIGHT: i32 = 10;
pub const CURSOR_SIZE: i32 = 3;

pub const COLOR_BG: Rgb565 = Rgb565::new(0, 0, 0);
pub const COLOR_FG: Rgb565 = Rgb565::new(31, 63, 31);
pub const COLOR_ACCENT: Rgb565 = Rgb565::new(0, 63, 31);
pub const COLOR_WARN: Rgb565 = Rgb565::new(31, 31, 0);
pub const COLOR_ERROR: Rgb565 = Rgb565::new(31, 0, 0);
pub const COLOR_SUCCESS: Rgb565 = Rgb565::new(0, 63, 0);
pub const COLOR_PANEL: Rgb565 = Rgb565::new(4, 8, 4);
pub const COLOR_SELECTED: Rgb565 = Rgb565::new(31, 63, 0);
pub const COLOR_CURSOR: Rgb565 = Rgb565::new(31, 0, 0);

pub const SMALL_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_6x10_tf>();
pub const MEDIUM_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_helvB12_tf>();
pub const LARGE_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_10x20_tf>();

// MPU6050 at +-2g / +-250 deg/s.
pub const ACCEL_LSB_PER_G: f32 = 16_384.0;
pub const GYRO_LSB_PER_DPS: f32 = 131.0;
pub const MIN_SAMPLE_INTERVAL_S: f32 = 0.002;
pub const COMPLEMENTARY_ALPHA: f32 = 0.98;
pub const DISPLAY_FILTER_ALPHA: f32 = 0.92;

pub const CALIBRATION_SAMPLES: u32 = 500;
pub const CALIBRATION_WINDOW_MS: u64 = 5_000;
pub const CALIBRATION_GRACE_MS: u64 = 2_000;
pub const CALIBRATION_RETRY_DELAY_MS: u32 = 2;
pub const CALIBRATION_PROGRESS_EVERY: u32 = 20;
pub const CALIBRATION_SUCCESS_HOLD_MS: u32 = 1_000;
pub const CALIBRATION_FAILURE_HOLD_MS: u32 = 1_500;

pub const TONE_MIN_EFFECTIVE_HZ: u32 = 120;
pub const TONE_MIN_HALF_PERIOD_US: u64 = 10;
pub const BEEP_FREQUENCY_HZ: u16 = 1_500;
pub const BEEP_DURATION_MS: u32 = 500;

pub const LONG_PRESS_MS: u64 = 1_000;
pub const JOYSTICK_CENTER_SAMPLES: u32 = 50;
pub const JOYSTICK_CENTER_SAMPLE_DELAY_MS: u32 = 15;
pub const MAX_CURSOR_STEP: i32 = 15;

pub const WEB_MESSAGE_MAX_CHARS: usize = 40;
pub const WEB_MESSAGE_DURATION_MS: u64 = 4_000;
pub const OVERLAY_CHARS_PER_LINE: usize = 20;

pub const FPS_WINDOW_MS: u64 = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoystickRotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// User-facing tunables. The defaults match the shipped firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub joystick_rotation: JoystickRotation,
    pub joystick_speed: u8,
    /// Dead zone around the sampled joystick center, in raw ADC counts.
    pub joystick_dead_zone: u16,
    pub ui_volume: u8,
    pub beep_volume: u8,
    pub target_fps: u8,
    pub tz_offset_seconds: i32,
}

impl ConsoleSettings {
    pub const fn defaults() -> Self {
        Self {
            joystick_rotation: JoystickRotation::Deg90,
            joystick_speed: 1,
            joystick_dead_zone: 320,
            ui_volume: 0,
            beep_volume: 100,
            target_fps: 60,
            tz_offset_seconds: 19_800,
        }
    }
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self::defaults()
    }
}

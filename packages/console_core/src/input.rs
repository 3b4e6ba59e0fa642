use embedded_graphics::prelude::Point;

use crate::config::{
    JoystickRotation, CURSOR_SIZE, DISPLAY_HEIGHT, DISPLAY_WIDTH, LONG_PRESS_MS, MAX_CURSOR_STEP,
    STATUS_BAR_HEIGHT,
};
use crate::hal::{DelayOps, JoystickAxis, JoystickSource};

/// Discrete joystick direction after dead-zone and rotation, each in -1..=1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Movement {
    pub x: i32,
    pub y: i32,
}

impl Movement {
    pub const NONE: Self = Self { x: 0, y: 0 };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoystickMapper {
    center_x: i32,
    center_y: i32,
    dead_zone: i32,
    rotation: JoystickRotation,
}

impl JoystickMapper {
    pub fn new(center_x: u16, center_y: u16, dead_zone: u16, rotation: JoystickRotation) -> Self {
        Self {
            center_x: i32::from(center_x),
            center_y: i32::from(center_y),
            dead_zone: i32::from(dead_zone),
            rotation,
        }
    }

    /// Averages the resting position; the stick must not be touched.
    pub fn sample_center<J, D>(joystick: &mut J, delay: &D, samples: u32, sample_delay_ms: u32) -> (u16, u16)
    where
        J: JoystickSource,
        D: DelayOps,
    {
        let samples = samples.max(1);
        let mut sum_x = 0u32;
        let mut sum_y = 0u32;
        for _ in 0..samples {
            sum_x += u32::from(joystick.read_axis(JoystickAxis::X));
            sum_y += u32::from(joystick.read_axis(JoystickAxis::Y));
            delay.delay_ms(sample_delay_ms);
        }
        ((sum_x / samples) as u16, (sum_y / samples) as u16)
    }

    pub fn map(&self, raw_x: u16, raw_y: u16) -> Movement {
        let dx = i32::from(raw_x) - self.center_x;
        let dy = i32::from(raw_y) - self.center_y;
        let mx = if dx.abs() > self.dead_zone { dx.signum() } else { 0 };
        let my = if dy.abs() > self.dead_zone { dy.signum() } else { 0 };

        match self.rotation {
            JoystickRotation::Deg0 => Movement { x: mx, y: my },
            JoystickRotation::Deg90 => Movement { x: my, y: -mx },
            JoystickRotation::Deg180 => Movement { x: -mx, y: -my },
            JoystickRotation::Deg270 => Movement { x: -my, y: mx },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Press {
    Short,
    Long,
}

/// Classifies a press on release by how long the button was held.
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonTracker {
    was_pressed: bool,
    pressed_at_ms: u64,
}

impl ButtonTracker {
    pub const fn new() -> Self {
        Self {
            was_pressed: false,
            pressed_at_ms: 0,
        }
    }

    pub fn update(&mut self, pressed: bool, now_ms: u64) -> Option<Press> {
        let released = match (self.was_pressed, pressed) {
            (false, true) => {
                self.pressed_at_ms = now_ms;
                None
            }
            (true, false) => {
                let held = now_ms.saturating_sub(self.pressed_at_ms);
                Some(if held < LONG_PRESS_MS {
                    Press::Short
                } else {
                    Press::Long
                })
            }
            _ => None,
        };
        self.was_pressed = pressed;
        released
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorState {
    pub position: Point,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            position: Point::new(DISPLAY_WIDTH / 2, DISPLAY_HEIGHT / 2),
        }
    }
}

impl CursorState {
    /// Where the cursor would land this frame; the status bar band is
    /// excluded.
    pub fn proposed(&self, movement: Movement, speed: u8) -> Point {
        let step = i32::from(speed).clamp(1, MAX_CURSOR_STEP);
        Point::new(
            (self.position.x + movement.x * step).clamp(CURSOR_SIZE, DISPLAY_WIDTH - CURSOR_SIZE),
            (self.position.y + movement.y * step)
                .clamp(STATUS_BAR_HEIGHT + CURSOR_SIZE, DISPLAY_HEIGHT - CURSOR_SIZE),
        )
    }
}

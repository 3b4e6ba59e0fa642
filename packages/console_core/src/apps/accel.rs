use core::fmt::Write as _;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use heapless::String;

use super::{calibrate_button, PressAction, Screen, ScreenContext};
use crate::config::{
    COLOR_ACCENT, COLOR_BG, COLOR_FG, COLOR_PANEL, COLOR_SUCCESS, COLOR_WARN, DISPLAY_WIDTH,
    SMALL_FONT, STATUS_BAR_HEIGHT,
};
use crate::render::{clear_content_area, draw_text, fill_rect, line, stroke_rect};

const BAR_X: i32 = 8;
const BAR_WIDTH: i32 = DISPLAY_WIDTH - 16;
const BAR_HEIGHT: i32 = 12;
const BAR_CENTER: i32 = BAR_X + BAR_WIDTH / 2;
const VALUE_X: i32 = BAR_X + BAR_WIDTH - 30;

struct Axis {
    label: &'static str,
    top: i32,
    full_scale: f32,
    color: Rgb565,
}

const AXES: [Axis; 3] = [
    Axis {
        label: "X (Pitch):",
        top: STATUS_BAR_HEIGHT + 28,
        full_scale: 45.0,
        color: COLOR_ACCENT,
    },
    Axis {
        label: "Y (Roll):",
        top: STATUS_BAR_HEIGHT + 52,
        full_scale: 45.0,
        color: COLOR_WARN,
    },
    Axis {
        label: "Z (Yaw):",
        top: STATUS_BAR_HEIGHT + 76,
        full_scale: 90.0,
        color: COLOR_SUCCESS,
    },
];

/// Signed bar length in pixels from the center line.
pub(crate) fn bar_length(delta: f32, full_scale: f32) -> i32 {
    ((delta / full_scale).clamp(-1.0, 1.0) * (BAR_WIDTH / 2) as f32) as i32
}

/// Delta bars of the filtered attitude against the calibration reference.
pub struct AccelScreen {
    drawn: Option<[i32; 6]>,
}

impl AccelScreen {
    pub const fn new() -> Self {
        Self { drawn: None }
    }

    fn deltas(ctx: &ScreenContext<'_>) -> [f32; 3] {
        [
            ctx.orientation.pitch_filtered - ctx.reference.pitch,
            ctx.orientation.roll_filtered - ctx.reference.roll,
            ctx.orientation.yaw_filtered - ctx.reference.yaw,
        ]
    }

    fn draw_bars<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let deltas = Self::deltas(ctx);
        let mut shown = [0i32; 6];
        for (idx, (axis, delta)) in AXES.iter().zip(deltas).enumerate() {
            shown[idx * 2] = bar_length(delta, axis.full_scale);
            shown[idx * 2 + 1] = delta as i32;
        }
        if self.drawn == Some(shown) {
            return;
        }

        for (idx, axis) in AXES.iter().enumerate() {
            let length = shown[idx * 2];
            fill_rect(
                display,
                BAR_X + 1,
                axis.top + 1,
                BAR_WIDTH - 2,
                BAR_HEIGHT - 2,
                COLOR_BG,
            );
            line(
                display,
                Point::new(BAR_CENTER, axis.top),
                Point::new(BAR_CENTER, axis.top + BAR_HEIGHT),
                COLOR_PANEL,
            );
            let start = if length < 0 { BAR_CENTER + length } else { BAR_CENTER };
            fill_rect(
                display,
                start,
                axis.top + 2,
                length.abs(),
                BAR_HEIGHT - 4,
                axis.color,
            );

            let mut value = String::<8>::new();
            let _ = write!(value, "{:+4}", shown[idx * 2 + 1]);
            fill_rect(display, VALUE_X, axis.top - 10, 30, 10, COLOR_BG);
            draw_text(
                display,
                &SMALL_FONT,
                value.as_str(),
                Point::new(VALUE_X, axis.top - 10),
                axis.color,
            );
        }
        self.drawn = Some(shown);
    }
}

impl Screen for AccelScreen {
    fn full_render<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        draw_text(
            display,
            &SMALL_FONT,
            "Accelerometer (XYZ)",
            Point::new(8, STATUS_BAR_HEIGHT + 6),
            COLOR_FG,
        );
        for axis in AXES.iter() {
            draw_text(
                display,
                &SMALL_FONT,
                axis.label,
                Point::new(BAR_X, axis.top - 10),
                axis.color,
            );
            stroke_rect(display, BAR_X, axis.top, BAR_WIDTH, BAR_HEIGHT, COLOR_FG);
        }
        calibrate_button::draw(display);
        self.drawn = None;
        self.draw_bars(display, ctx);
    }

    fn incremental_update<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_bars(display, ctx);
    }

    fn on_press(&mut self, cursor: Point, _ctx: &ScreenContext<'_>) -> PressAction {
        if calibrate_button::hit(cursor) {
            PressAction::Calibrate
        } else {
            PressAction::Ignored
        }
    }
}

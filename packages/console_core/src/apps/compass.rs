use core::fmt::Write as _;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*, primitives::PrimitiveStyle};
use heapless::String;

use super::{calibrate_button, dial_point, PressAction, Screen, ScreenContext};
use crate::config::{
    COLOR_BG, COLOR_FG, COLOR_PANEL, COLOR_WARN, DISPLAY_WIDTH, SMALL_FONT, STATUS_BAR_HEIGHT,
};
use crate::orientation::heading_degrees;
use crate::render::{circle, clear_content_area, draw_text, fill_rect, line};

const CENTER: Point = Point::new(DISPLAY_WIDTH / 2, STATUS_BAR_HEIGHT + 44);
const RADIUS: i32 = 36;
/// Heading value sits under its caption, left of the ring and the labels.
const READOUT_AT: Point = Point::new(4, STATUS_BAR_HEIGHT + 14);

pub struct CompassScreen {
    drawn: Option<String<20>>,
}

impl CompassScreen {
    pub const fn new() -> Self {
        Self { drawn: None }
    }

    fn draw_ring<D>(display: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        circle(display, CENTER, RADIUS, PrimitiveStyle::with_stroke(COLOR_FG, 1));
        circle(
            display,
            CENTER,
            RADIUS - 2,
            PrimitiveStyle::with_stroke(COLOR_PANEL, 1),
        );
        for step in 0..12 {
            let degrees = step as f32 * 30.0;
            line(
                display,
                dial_point(CENTER, (RADIUS - 2) as f32, degrees),
                dial_point(CENTER, (RADIUS - 6) as f32, degrees),
                COLOR_PANEL,
            );
        }
    }

    /// Repaints the needle and readout when the displayed heading moved.
    fn draw_needle<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let heading = heading_degrees(ctx.reference.yaw, ctx.orientation.yaw_filtered);
        let mut readout = String::<20>::new();
        let _ = write!(readout, "{:5.1}", heading);
        if self.drawn.as_ref() == Some(&readout) {
            return;
        }

        circle(display, CENTER, RADIUS - 8, PrimitiveStyle::with_fill(COLOR_BG));
        Self::draw_ring(display);
        line(
            display,
            CENTER,
            dial_point(CENTER, (RADIUS - 8) as f32, heading),
            COLOR_WARN,
        );
        circle(display, CENTER, 2, PrimitiveStyle::with_fill(COLOR_FG));

        fill_rect(display, READOUT_AT.x, READOUT_AT.y, 36, 10, COLOR_BG);
        draw_text(display, &SMALL_FONT, readout.as_str(), READOUT_AT, COLOR_FG);
        self.drawn = Some(readout);
    }
}

impl Screen for CompassScreen {
    fn full_render<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        Self::draw_ring(display);
        for (label, at) in [
            ("N", Point::new(CENTER.x - 6, CENTER.y - RADIUS - 8)),
            ("S", Point::new(CENTER.x - 6, CENTER.y + RADIUS + 2)),
            ("E", Point::new(CENTER.x + RADIUS + 2, CENTER.y - 4)),
            ("W", Point::new(CENTER.x - RADIUS - 8, CENTER.y - 4)),
        ] {
            draw_text(display, &SMALL_FONT, label, at, COLOR_FG);
        }
        draw_text(
            display,
            &SMALL_FONT,
            "Heading",
            Point::new(READOUT_AT.x, STATUS_BAR_HEIGHT + 4),
            COLOR_FG,
        );
        calibrate_button::draw(display);
        self.drawn = None;
        self.draw_needle(display, ctx);
    }

    fn incremental_update<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_needle(display, ctx);
    }

    fn on_press(&mut self, cursor: Point, _ctx: &ScreenContext<'_>) -> PressAction {
        if calibrate_button::hit(cursor) {
            PressAction::Calibrate
        } else {
            PressAction::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::ContextFixture;
    use crate::render::testing::TestCanvas;

    fn label_pixels(canvas: &TestCanvas) -> usize {
        let mut lit = 0;
        for y in CENTER.y - RADIUS - 8..CENTER.y - RADIUS {
            for x in CENTER.x - 6..CENTER.x {
                if canvas.at(x, y) == COLOR_FG {
                    lit += 1;
                }
            }
        }
        lit
    }

    #[test]
    fn heading_updates_leave_north_label_intact() {
        let mut fixture = ContextFixture::default();
        let mut canvas = TestCanvas::new();
        let mut screen = CompassScreen::new();
        screen.full_render(&mut canvas, &fixture.ctx(0));
        let north = label_pixels(&canvas);
        assert!(north > 0);

        fixture.orientation.yaw_filtered = 42.0;
        let writes = canvas.writes;
        screen.incremental_update(&mut canvas, &fixture.ctx(20));
        assert!(canvas.writes > writes);
        assert_eq!(label_pixels(&canvas), north);
    }

    #[test]
    fn unchanged_heading_draws_nothing() {
        let fixture = ContextFixture::default();
        let mut canvas = TestCanvas::new();
        let mut screen = CompassScreen::new();
        screen.full_render(&mut canvas, &fixture.ctx(0));
        let writes = canvas.writes;
        screen.incremental_update(&mut canvas, &fixture.ctx(20));
        assert_eq!(canvas.writes, writes);
    }
}

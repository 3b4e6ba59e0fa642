use core::fmt::Write as _;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use heapless::String;

use super::{Screen, ScreenContext};
use crate::config::{
    COLOR_BG, COLOR_FG, DISPLAY_WIDTH, LARGE_FONT, MEDIUM_FONT, SMALL_FONT, STATUS_BAR_HEIGHT,
};
use crate::net::LocalTime;
use crate::render::{clear_content_area, draw_text, fill_rect};

const TIME_AT: Point = Point::new(8, STATUS_BAR_HEIGHT + 40);
const DATE_AT: Point = Point::new(8, STATUS_BAR_HEIGHT + 100);

pub(crate) fn time_text(time: &LocalTime) -> String<12> {
    let mut out = String::new();
    let _ = write!(out, "{:02}:{:02}:{:02}", time.hour, time.minute, time.second);
    out
}

pub(crate) fn date_text(time: &LocalTime) -> String<12> {
    let mut out = String::new();
    let _ = write!(out, "{:02}/{:02}/{:04}", time.day, time.month, time.year);
    out
}

/// Digital clock; repaints when the second changes, not every frame.
pub struct ClockScreen {
    drawn: Option<LocalTime>,
}

impl ClockScreen {
    pub const fn new() -> Self {
        Self { drawn: None }
    }

    fn draw_time<D>(&mut self, display: &mut D, time: LocalTime)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill_rect(display, 0, TIME_AT.y, DISPLAY_WIDTH, 24, COLOR_BG);
        draw_text(
            display,
            &LARGE_FONT,
            time_text(&time).as_str(),
            TIME_AT,
            COLOR_FG,
        );
        let date_changed = self
            .drawn
            .map_or(true, |old| (old.year, old.month, old.day) != (time.year, time.month, time.day));
        if date_changed {
            fill_rect(display, 0, DATE_AT.y, DISPLAY_WIDTH, 12, COLOR_BG);
            draw_text(
                display,
                &SMALL_FONT,
                date_text(&time).as_str(),
                DATE_AT,
                COLOR_FG,
            );
        }
        self.drawn = Some(time);
    }
}

impl Screen for ClockScreen {
    fn full_render<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        self.drawn = None;
        match ctx.clock {
            Some(time) => self.draw_time(display, time),
            None => draw_text(display, &MEDIUM_FONT, "Clock not synced", TIME_AT, COLOR_FG),
        }
    }

    fn incremental_update<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match (ctx.clock, self.drawn) {
            (Some(time), Some(old)) if old == time => {}
            (Some(time), Some(_)) => self.draw_time(display, time),
            // Sync arrived while the placeholder was up.
            (Some(time), None) => {
                clear_content_area(display);
                self.draw_time(display, time);
            }
            (None, _) => {}
        }
    }
}

use embedded_graphics::{pixelcolor::Rgb565, prelude::*, primitives::PrimitiveStyle};

use super::{dial_point, PressAction, Screen, ScreenContext};
use crate::config::{
    COLOR_ACCENT, COLOR_BG, COLOR_FG, COLOR_WARN, DISPLAY_HEIGHT, DISPLAY_WIDTH, SMALL_FONT,
    STATUS_BAR_HEIGHT,
};
use crate::net::LocalTime;
use crate::render::{circle, clear_content_area, draw_text, line, round_rect};

const FACE_CENTER: Point = Point::new(40, STATUS_BAR_HEIGHT + 36);
const FACE_RADIUS: i32 = 28;
const WEATHER_X: i32 = DISPLAY_WIDTH - 64;
const WEATHER_Y: i32 = STATUS_BAR_HEIGHT + 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Hands {
    hour: Point,
    minute: Point,
    second: Point,
}

impl Hands {
    fn at(time: &LocalTime) -> Self {
        let hour = f32::from(time.hour % 12) + f32::from(time.minute) / 60.0;
        Self {
            hour: dial_point(FACE_CENTER, (FACE_RADIUS / 2) as f32, hour * 30.0),
            minute: dial_point(
                FACE_CENTER,
                (FACE_RADIUS * 2 / 3) as f32,
                f32::from(time.minute) * 6.0,
            ),
            second: dial_point(
                FACE_CENTER,
                (FACE_RADIUS - 4) as f32,
                f32::from(time.second) * 6.0,
            ),
        }
    }
}

/// Analog clock face plus the weather card. The hands only move once the
/// wall clock is synced.
pub struct HomeScreen {
    drawn: Option<Hands>,
}

impl HomeScreen {
    pub const fn new() -> Self {
        Self { drawn: None }
    }

    fn draw_hands<D>(&mut self, display: &mut D, time: Option<LocalTime>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(time) = time else {
            return;
        };
        let hands = Hands::at(&time);
        if self.drawn == Some(hands) {
            return;
        }

        if let Some(old) = self.drawn {
            line(display, FACE_CENTER, old.hour, COLOR_BG);
            line(display, FACE_CENTER, old.minute, COLOR_BG);
            line(display, FACE_CENTER, old.second, COLOR_BG);
        }
        line(display, FACE_CENTER, hands.hour, COLOR_FG);
        line(display, FACE_CENTER, hands.minute, COLOR_ACCENT);
        line(display, FACE_CENTER, hands.second, COLOR_WARN);
        circle(display, FACE_CENTER, 2, PrimitiveStyle::with_fill(COLOR_FG));
        self.drawn = Some(hands);
    }
}

impl Screen for HomeScreen {
    fn full_render<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        circle(
            display,
            FACE_CENTER,
            FACE_RADIUS,
            PrimitiveStyle::with_stroke(COLOR_FG, 1),
        );
        for tick in 0..12 {
            let degrees = tick as f32 * 30.0;
            line(
                display,
                dial_point(FACE_CENTER, (FACE_RADIUS - 6) as f32, degrees),
                dial_point(FACE_CENTER, (FACE_RADIUS - 2) as f32, degrees),
                COLOR_FG,
            );
        }
        self.drawn = None;
        self.draw_hands(display, ctx.clock);

        round_rect(
            display,
            WEATHER_X,
            WEATHER_Y,
            54,
            44,
            4,
            PrimitiveStyle::with_stroke(COLOR_ACCENT, 1),
        );
        draw_text(
            display,
            &SMALL_FONT,
            ctx.city,
            Point::new(WEATHER_X + 6, WEATHER_Y + 6),
            COLOR_FG,
        );
        draw_text(
            display,
            &SMALL_FONT,
            ctx.weather.temperature.as_str(),
            Point::new(WEATHER_X + 6, WEATHER_Y + 22),
            COLOR_FG,
        );
        draw_text(
            display,
            &SMALL_FONT,
            ctx.weather.condition.as_str(),
            Point::new(WEATHER_X + 6, WEATHER_Y + 34),
            COLOR_ACCENT,
        );

        draw_text(
            display,
            &SMALL_FONT,
            "Press for Apps ->",
            Point::new(8, DISPLAY_HEIGHT - 10),
            COLOR_FG,
        );
    }

    fn incremental_update<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_hands(display, ctx.clock);
    }

    fn on_press(&mut self, _cursor: Point, _ctx: &ScreenContext<'_>) -> PressAction {
        PressAction::Open(super::AppId::Launcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_point_up_at_midnight() {
        let hands = Hands::at(&LocalTime {
            year: 2024,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        });
        assert_eq!(hands.second, Point::new(40, FACE_CENTER.y - (FACE_RADIUS - 4)));
        assert_eq!(hands.hour.x, 40);
    }

    #[test]
    fn quarter_past_points_minute_hand_right() {
        let hands = Hands::at(&LocalTime {
            year: 2024,
            month: 1,
            day: 1,
            hour: 3,
            minute: 15,
            second: 30,
        });
        assert!(hands.minute.x > FACE_CENTER.x + 15);
        assert!((hands.minute.y - FACE_CENTER.y).abs() <= 1);
        assert!(hands.second.y > FACE_CENTER.y);
    }
}

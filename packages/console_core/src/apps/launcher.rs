use embedded_graphics::{pixelcolor::Rgb565, prelude::*};

use super::{hit_rect, AppId, PressAction, Screen, ScreenContext};
use crate::config::{COLOR_FG, DISPLAY_HEIGHT, DISPLAY_WIDTH, SMALL_FONT, STATUS_BAR_HEIGHT};
use crate::render::{clear_content_area, draw_button, draw_text};

const MARGIN: i32 = 8;
const GAP: i32 = 6;
const ICON_WIDTH: i32 = (DISPLAY_WIDTH - 2 * MARGIN - GAP) / 2;
const ICON_HEIGHT: i32 = 22;
const START_Y: i32 = STATUS_BAR_HEIGHT + 10;

const ICONS: [(&str, AppId); 6] = [
    ("Calculator", AppId::Calculator),
    ("Compass", AppId::Compass),
    ("Accel", AppId::Accelerometer),
    ("Clock", AppId::Clock),
    ("Games", AppId::GamesMenu),
    ("Settings", AppId::Settings),
];

fn icon_origin(index: usize) -> Point {
    let row = (index / 2) as i32;
    let col = (index % 2) as i32;
    Point::new(
        MARGIN + col * (ICON_WIDTH + GAP),
        START_Y + row * (ICON_HEIGHT + GAP),
    )
}

pub fn icon_at(cursor: Point) -> Option<AppId> {
    ICONS.iter().enumerate().find_map(|(index, &(_, app))| {
        let origin = icon_origin(index);
        hit_rect(cursor, origin.x, origin.y, ICON_WIDTH, ICON_HEIGHT).then_some(app)
    })
}

pub struct Launcher;

impl Screen for Launcher {
    fn full_render<D>(&mut self, display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        for (index, (name, _)) in ICONS.iter().enumerate() {
            let origin = icon_origin(index);
            draw_button(display, origin.x, origin.y, ICON_WIDTH, ICON_HEIGHT, name);
        }
        draw_text(
            display,
            &SMALL_FONT,
            "Long press = Home",
            Point::new(8, DISPLAY_HEIGHT - 10),
            COLOR_FG,
        );
    }

    fn on_press(&mut self, cursor: Point, _ctx: &ScreenContext<'_>) -> PressAction {
        match icon_at(cursor) {
            Some(app) => PressAction::Open(app),
            None => PressAction::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_hit_testing() {
        assert_eq!(icon_at(Point::new(10, START_Y + 1)), Some(AppId::Calculator));
        assert_eq!(
            icon_at(Point::new(MARGIN + ICON_WIDTH + GAP + 1, START_Y + 1)),
            Some(AppId::Compass)
        );
        assert_eq!(
            icon_at(Point::new(MARGIN + ICON_WIDTH + GAP + 5, START_Y + 2 * 28 + 5)),
            Some(AppId::Settings)
        );
        // The gap between columns belongs to nobody.
        assert_eq!(icon_at(Point::new(MARGIN + ICON_WIDTH + 2, START_Y + 5)), None);
    }
}

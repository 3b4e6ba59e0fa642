use embedded_graphics::{pixelcolor::Rgb565, prelude::*};

use super::{hit_rect, AppId, PressAction, Screen, ScreenContext};
use crate::config::{
    COLOR_ACCENT, COLOR_FG, DISPLAY_HEIGHT, DISPLAY_WIDTH, SMALL_FONT, STATUS_BAR_HEIGHT,
};
use crate::render::{clear_content_area, draw_button, draw_text};

const BUTTON_X: i32 = 10;
const BUTTON_WIDTH: i32 = DISPLAY_WIDTH - 20;
const BUTTON_HEIGHT: i32 = 24;
const BUTTON_GAP: i32 = 8;
const START_Y: i32 = STATUS_BAR_HEIGHT + 28;

const GAMES: [(&str, AppId); 3] = [
    ("Tic-Tac-Toe", AppId::TicTacToe),
    ("Pong", AppId::Pong),
    ("Space Shooter", AppId::SpaceShooter),
];

fn button_y(index: usize) -> i32 {
    START_Y + index as i32 * (BUTTON_HEIGHT + BUTTON_GAP)
}

pub struct GamesMenu;

impl Screen for GamesMenu {
    fn full_render<D>(&mut self, display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        draw_text(
            display,
            &SMALL_FONT,
            "Select Game:",
            Point::new(10, STATUS_BAR_HEIGHT + 10),
            COLOR_ACCENT,
        );
        for (index, (name, _)) in GAMES.iter().enumerate() {
            draw_button(
                display,
                BUTTON_X,
                button_y(index),
                BUTTON_WIDTH,
                BUTTON_HEIGHT,
                name,
            );
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
        GAMES
            .iter()
            .enumerate()
            .find(|(index, _)| {
                hit_rect(cursor, BUTTON_X, button_y(*index), BUTTON_WIDTH, BUTTON_HEIGHT)
            })
            .map_or(PressAction::Ignored, |(_, &(_, game))| PressAction::Open(game))
    }
}

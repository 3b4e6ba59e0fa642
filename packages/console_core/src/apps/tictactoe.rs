use embedded_graphics::{pixelcolor::Rgb565, prelude::*, primitives::PrimitiveStyle};

use super::{hit_rect, PressAction, Screen, ScreenContext};
use crate::config::{
    COLOR_ACCENT, COLOR_FG, COLOR_PANEL, COLOR_WARN, DISPLAY_HEIGHT, DISPLAY_WIDTH, SMALL_FONT,
    STATUS_BAR_HEIGHT,
};
use crate::render::{circle, clear_content_area, draw_text, fill_rect, line, stroke_rect};

pub const EMPTY: u8 = 0;
pub const HUMAN: u8 = 1;
pub const AI: u8 = 2;

const CELL: i32 = 34;
const ORIGIN_X: i32 = (DISPLAY_WIDTH - CELL * 3) / 2;
const ORIGIN_Y: i32 = STATUS_BAR_HEIGHT + 14;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub fn winner(board: &[u8; 9]) -> Option<u8> {
    LINES.iter().find_map(|&[a, b, c]| {
        (board[a] != EMPTY && board[a] == board[b] && board[b] == board[c]).then_some(board[a])
    })
}

fn completing_move(board: &[u8; 9], mark: u8) -> Option<usize> {
    (0..9).filter(|&cell| board[cell] == EMPTY).find(|&cell| {
        let mut trial = *board;
        trial[cell] = mark;
        winner(&trial) == Some(mark)
    })
}

/// Fixed-priority move choice: win, block, center, corner, then any free cell.
pub fn find_best_move(board: &[u8; 9], ai: u8, human: u8) -> Option<usize> {
    completing_move(board, ai)
        .or_else(|| completing_move(board, human))
        .or_else(|| (board[4] == EMPTY).then_some(4))
        .or_else(|| [0, 2, 6, 8].into_iter().find(|&cell| board[cell] == EMPTY))
        .or_else(|| board.iter().position(|&cell| cell == EMPTY))
}

pub struct TicTacToe {
    board: [u8; 9],
    turn: u8,
    over: bool,
}

impl TicTacToe {
    pub const fn new() -> Self {
        Self {
            board: [EMPTY; 9],
            turn: HUMAN,
            over: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn board(&self) -> &[u8; 9] {
        &self.board
    }

    /// Mark expected to move next.
    pub fn turn(&self) -> u8 {
        self.turn
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Human move followed by the AI reply. Returns false when the cell is
    /// taken or the round has ended.
    pub fn play(&mut self, cell: usize) -> bool {
        if self.over || cell >= 9 || self.board[cell] != EMPTY {
            return false;
        }
        self.board[cell] = HUMAN;
        if winner(&self.board).is_some() {
            self.over = true;
            return true;
        }

        self.turn = AI;
        if let Some(reply) = find_best_move(&self.board, AI, HUMAN) {
            self.board[reply] = AI;
            if winner(&self.board).is_some() {
                self.over = true;
                return true;
            }
        }
        self.turn = HUMAN;
        if self.board.iter().all(|&mark| mark != EMPTY) {
            self.over = true;
        }
        true
    }

    fn cell_at(cursor: Point) -> Option<usize> {
        (0..9).find(|&cell| {
            let (x, y) = cell_origin(cell);
            hit_rect(cursor, x, y, CELL, CELL)
        })
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

fn cell_origin(cell: usize) -> (i32, i32) {
    (
        ORIGIN_X + (cell % 3) as i32 * CELL,
        ORIGIN_Y + (cell / 3) as i32 * CELL,
    )
}

impl Screen for TicTacToe {
    fn full_render<D>(&mut self, display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        for (cell, &mark) in self.board.iter().enumerate() {
            let (x, y) = cell_origin(cell);
            stroke_rect(display, x, y, CELL, CELL, COLOR_FG);
            match mark {
                HUMAN => {
                    line(
                        display,
                        Point::new(x + 6, y + 6),
                        Point::new(x + CELL - 6, y + CELL - 6),
                        COLOR_ACCENT,
                    );
                    line(
                        display,
                        Point::new(x + CELL - 6, y + 6),
                        Point::new(x + 6, y + CELL - 6),
                        COLOR_ACCENT,
                    );
                }
                AI => circle(
                    display,
                    Point::new(x + CELL / 2, y + CELL / 2),
                    CELL / 2 - 8,
                    PrimitiveStyle::with_stroke(COLOR_WARN, 1),
                ),
                _ => {}
            }
        }

        if self.over {
            let x = DISPLAY_WIDTH / 2 - 40;
            let y = DISPLAY_HEIGHT / 2 + 36;
            fill_rect(display, x, y, 80, 20, COLOR_PANEL);
            stroke_rect(display, x, y, 80, 20, COLOR_ACCENT);
            draw_text(
                display,
                &SMALL_FONT,
                "Press to reset",
                Point::new(DISPLAY_WIDTH / 2 - 28, DISPLAY_HEIGHT / 2 + 40),
                COLOR_FG,
            );
        }
    }

    fn on_press(&mut self, cursor: Point, _ctx: &ScreenContext<'_>) -> PressAction {
        if self.over {
            self.reset();
            return PressAction::Redraw;
        }
        match Self::cell_at(cursor) {
            Some(cell) if self.play(cell) => PressAction::Redraw,
            _ => PressAction::Ignored,
        }
    }
}

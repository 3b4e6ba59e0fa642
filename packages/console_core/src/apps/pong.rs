use core::fmt::Write as _;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*, primitives::PrimitiveStyle};
use heapless::String;

use super::{PressAction, Screen, ScreenContext, StepOutcome};
use crate::config::{
    COLOR_ACCENT, COLOR_BG, COLOR_FG, COLOR_PANEL, COLOR_WARN, DISPLAY_HEIGHT, DISPLAY_WIDTH,
    MEDIUM_FONT, SMALL_FONT, STATUS_BAR_HEIGHT,
};
use crate::input::Movement;
use crate::render::{circle, clear_content_area, draw_text, fill_rect, stroke_rect};

const PADDLE_WIDTH: i32 = 3;
const PADDLE_HEIGHT: i32 = 20;
const PADDLE_1_X: i32 = 5;
const PADDLE_2_X: i32 = DISPLAY_WIDTH - 5 - PADDLE_WIDTH;
const PADDLE_START_Y: i32 = 40;
const PADDLE_STEP: i32 = 4;
const AI_STEP: i32 = 3;
const AI_SLACK: i32 = 2;
const PADDLE_MIN_Y: i32 = STATUS_BAR_HEIGHT;
const PADDLE_MAX_Y: i32 = DISPLAY_HEIGHT - PADDLE_HEIGHT;
const HIT_ZONE: f32 = 11.0;
const SPIN: f32 = 0.15;
const BALL_START: (f32, f32) = (80.0, 64.0);
const BALL_VELOCITY: (f32, f32) = (2.2, 1.8);
pub const WINNING_SCORE: u8 = 5;

#[derive(Clone, Copy, PartialEq)]
struct Drawn {
    ball: Point,
    paddles: (i32, i32),
}

pub struct Pong {
    paddles: (i32, i32),
    ball: (f32, f32),
    velocity: (f32, f32),
    scores: (u8, u8),
    active: bool,
    drawn: Option<Drawn>,
}

impl Pong {
    pub const fn new() -> Self {
        Self {
            paddles: (PADDLE_START_Y, PADDLE_START_Y),
            ball: BALL_START,
            velocity: BALL_VELOCITY,
            scores: (0, 0),
            active: true,
            drawn: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn scores(&self) -> (u8, u8) {
        self.scores
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ball(&self) -> (f32, f32) {
        self.ball
    }

    pub fn velocity(&self) -> (f32, f32) {
        self.velocity
    }

    pub fn paddles(&self) -> (i32, i32) {
        self.paddles
    }

    pub fn steer(&mut self, movement: Movement) {
        if self.active && movement.y != 0 {
            self.paddles.0 =
                (self.paddles.0 + movement.y * PADDLE_STEP).clamp(PADDLE_MIN_Y, PADDLE_MAX_Y);
        }
    }

    /// One physics tick. Scoring changes the score line, so it asks for a
    /// full repaint.
    pub fn step(&mut self) -> StepOutcome {
        if !self.active {
            return StepOutcome::Continue;
        }

        self.ball.0 += self.velocity.0;
        self.ball.1 += self.velocity.1;
        let (x, y) = self.ball;

        if y <= (STATUS_BAR_HEIGHT + 3) as f32 {
            self.velocity.1 = self.velocity.1.abs();
        } else if y >= (DISPLAY_HEIGHT - 3) as f32 {
            self.velocity.1 = -self.velocity.1.abs();
        }

        if x <= HIT_ZONE && Self::spans(self.paddles.0, y) {
            self.velocity.0 = self.velocity.0.abs();
            self.velocity.1 += Self::spin(self.paddles.0, y);
        } else if x >= DISPLAY_WIDTH as f32 - HIT_ZONE && Self::spans(self.paddles.1, y) {
            self.velocity.0 = -self.velocity.0.abs();
            self.velocity.1 += Self::spin(self.paddles.1, y);
        }

        let mut outcome = StepOutcome::Continue;
        if x <= 0.0 {
            self.scores.1 += 1;
            self.serve(BALL_VELOCITY);
            outcome = StepOutcome::NeedsFullRedraw;
        } else if x >= DISPLAY_WIDTH as f32 {
            self.scores.0 += 1;
            self.serve((-BALL_VELOCITY.0, -BALL_VELOCITY.1));
            outcome = StepOutcome::NeedsFullRedraw;
        }
        if self.scores.0 >= WINNING_SCORE || self.scores.1 >= WINNING_SCORE {
            self.active = false;
        }

        self.track_ball();
        outcome
    }

    fn spans(paddle_y: i32, ball_y: f32) -> bool {
        ball_y >= paddle_y as f32 && ball_y <= (paddle_y + PADDLE_HEIGHT) as f32
    }

    fn spin(paddle_y: i32, ball_y: f32) -> f32 {
        (ball_y - (paddle_y + PADDLE_HEIGHT / 2) as f32) * SPIN
    }

    fn serve(&mut self, velocity: (f32, f32)) {
        self.ball = BALL_START;
        self.velocity = velocity;
    }

    fn track_ball(&mut self) {
        let target = self.ball.1 as i32;
        let center = self.paddles.1 + PADDLE_HEIGHT / 2;
        if center < target - AI_SLACK {
            self.paddles.1 += AI_STEP;
        } else if center > target + AI_SLACK {
            self.paddles.1 -= AI_STEP;
        }
        self.paddles.1 = self.paddles.1.clamp(PADDLE_MIN_Y, PADDLE_MAX_Y);
    }

    fn ball_point(&self) -> Point {
        Point::new(self.ball.0 as i32, self.ball.1 as i32)
    }

    fn draw_center_line<D>(display: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        for y in (STATUS_BAR_HEIGHT..DISPLAY_HEIGHT).step_by(6) {
            fill_rect(display, DISPLAY_WIDTH / 2, y, 1, 3, COLOR_PANEL);
        }
    }

    fn draw_paddles<D>(&self, display: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill_rect(
            display,
            PADDLE_1_X,
            self.paddles.0,
            PADDLE_WIDTH,
            PADDLE_HEIGHT,
            COLOR_ACCENT,
        );
        fill_rect(
            display,
            PADDLE_2_X,
            self.paddles.1,
            PADDLE_WIDTH,
            PADDLE_HEIGHT,
            COLOR_WARN,
        );
    }

    fn snapshot(&self) -> Drawn {
        Drawn {
            ball: self.ball_point(),
            paddles: self.paddles,
        }
    }
}

impl Default for Pong {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for Pong {
    fn full_render<D>(&mut self, display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        Self::draw_center_line(display);
        self.draw_paddles(display);
        circle(display, self.ball_point(), 2, PrimitiveStyle::with_fill(COLOR_FG));

        for (score, x) in [
            (self.scores.0, DISPLAY_WIDTH / 2 - 30),
            (self.scores.1, DISPLAY_WIDTH / 2 + 20),
        ] {
            let mut text = String::<4>::new();
            let _ = write!(text, "{}", score);
            draw_text(
                display,
                &MEDIUM_FONT,
                text.as_str(),
                Point::new(x, STATUS_BAR_HEIGHT + 5),
                COLOR_FG,
            );
        }

        if !self.active {
            let x = DISPLAY_WIDTH / 2 - 40;
            let y = DISPLAY_HEIGHT / 2;
            fill_rect(display, x, y, 80, 20, COLOR_PANEL);
            stroke_rect(display, x, y, 80, 20, COLOR_ACCENT);
            draw_text(
                display,
                &SMALL_FONT,
                "Press to play",
                Point::new(DISPLAY_WIDTH / 2 - 28, y + 6),
                COLOR_FG,
            );
        }
        self.drawn = Some(self.snapshot());
    }

    fn incremental_update<D>(&mut self, display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(drawn) = self.drawn else {
            return;
        };
        let now = self.snapshot();
        if now == drawn {
            return;
        }

        if now.ball != drawn.ball {
            circle(display, drawn.ball, 3, PrimitiveStyle::with_fill(COLOR_BG));
            if (drawn.ball.x - DISPLAY_WIDTH / 2).abs() <= 4 {
                Self::draw_center_line(display);
            }
            circle(display, now.ball, 2, PrimitiveStyle::with_fill(COLOR_FG));
        }
        if now.paddles != drawn.paddles {
            let band = DISPLAY_HEIGHT - STATUS_BAR_HEIGHT;
            fill_rect(display, PADDLE_1_X, STATUS_BAR_HEIGHT, PADDLE_WIDTH, band, COLOR_BG);
            fill_rect(display, PADDLE_2_X, STATUS_BAR_HEIGHT, PADDLE_WIDTH, band, COLOR_BG);
            self.draw_paddles(display);
        }
        self.drawn = Some(now);
    }

    fn on_press(&mut self, _cursor: Point, _ctx: &ScreenContext<'_>) -> PressAction {
        if self.active {
            return PressAction::Ignored;
        }
        self.scores = (0, 0);
        self.serve(BALL_VELOCITY);
        self.active = true;
        PressAction::Redraw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::ContextFixture;
    use crate::render::testing::TestCanvas;

    fn place(pong: &mut Pong, ball: (f32, f32), velocity: (f32, f32)) {
        pong.ball = ball;
        pong.velocity = velocity;
    }

    #[test]
    fn left_edge_scores_for_right_side() {
        let mut pong = Pong::new();
        place(&mut pong, (2.0, 100.0), (-2.0, 0.0));
        assert_eq!(pong.step(), StepOutcome::NeedsFullRedraw);
        assert_eq!(pong.scores(), (0, 1));
        assert_eq!(pong.ball(), BALL_START);
        assert_eq!(pong.velocity(), BALL_VELOCITY);
    }

    #[test]
    fn right_edge_scores_for_left_side() {
        let mut pong = Pong::new();
        place(&mut pong, (158.0, 100.0), (2.0, 0.0));
        assert_eq!(pong.step(), StepOutcome::NeedsFullRedraw);
        assert_eq!(pong.scores(), (1, 0));
        assert_eq!(pong.ball(), BALL_START);
        assert_eq!(pong.velocity(), (-2.2, -1.8));
    }

    #[test]
    fn fifth_point_ends_the_round() {
        let mut pong = Pong::new();
        pong.scores = (0, 4);
        place(&mut pong, (2.0, 100.0), (-2.0, 0.0));
        pong.step();
        assert_eq!(pong.scores(), (0, 5));
        assert!(!pong.is_active());

        let before = pong.ball();
        assert_eq!(pong.step(), StepOutcome::Continue);
        assert_eq!(pong.ball(), before);

        let fixture = ContextFixture::default();
        assert_eq!(
            pong.on_press(Point::zero(), &fixture.ctx(0)),
            PressAction::Redraw
        );
        assert!(pong.is_active());
        assert_eq!(pong.scores(), (0, 0));
    }

    #[test]
    fn paddle_returns_the_ball() {
        let mut pong = Pong::new();
        place(&mut pong, (12.0, 50.0), (-2.0, 0.0));
        pong.step();
        assert!(pong.velocity().0 > 0.0);
        assert_eq!(pong.scores(), (0, 0));
    }

    #[test]
    fn ai_paddle_tracks_and_stays_on_field() {
        let mut pong = Pong::new();
        place(&mut pong, (80.0, 120.0), (0.0, 0.0));
        for _ in 0..100 {
            pong.step();
        }
        assert_eq!(pong.paddles().1, PADDLE_MAX_Y);
    }

    #[test]
    fn steering_is_clamped() {
        let mut pong = Pong::new();
        for _ in 0..50 {
            pong.steer(Movement { x: 0, y: -1 });
        }
        assert_eq!(pong.paddles().0, PADDLE_MIN_Y);
    }

    #[test]
    fn incremental_update_moves_the_ball() {
        let fixture = ContextFixture::default();
        let mut canvas = TestCanvas::new();
        let mut pong = Pong::new();
        pong.full_render(&mut canvas, &fixture.ctx(0));
        assert_eq!(canvas.at(80, 64), COLOR_FG);

        place(&mut pong, (80.0, 64.0), (10.0, 0.0));
        pong.step();
        canvas.writes = 0;
        pong.incremental_update(&mut canvas, &fixture.ctx(0));
        assert!(canvas.writes > 0);
        assert_eq!(canvas.at(90, 64), COLOR_FG);
        assert_ne!(canvas.at(78, 64), COLOR_FG);
    }
}

use core::fmt::Write as _;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use heapless::String;

use super::{PressAction, Screen, ScreenContext, StepOutcome};
use crate::config::{
    COLOR_ACCENT, COLOR_BG, COLOR_ERROR, COLOR_FG, COLOR_PANEL, COLOR_SUCCESS, COLOR_WARN,
    DISPLAY_HEIGHT, DISPLAY_WIDTH, SMALL_FONT, STATUS_BAR_HEIGHT,
};
use crate::input::Movement;
use crate::render::{clear_content_area, draw_text, fill_rect, fill_triangle, stroke_rect};

pub const MAX_BULLETS: usize = 8;
pub const MAX_ENEMIES: usize = 10;
pub const FIRE_INTERVAL_MS: u64 = 200;
pub const SPAWN_INTERVAL_MS: u64 = 1500;
pub const HIT_RANGE: i32 = 20;
pub const HIT_SCORE: u32 = 10;

const SHIP_Y: i32 = 100;
const SHIP_START_X: i32 = DISPLAY_WIDTH / 2;
const SHIP_STEP: i32 = 4;
const SHIP_MIN_X: i32 = 10;
const SHIP_MAX_X: i32 = DISPLAY_WIDTH - 10;
const BULLET_SPEED: f32 = 4.5;
const ENEMY_SPEED: f32 = 1.5;
const SCORE_AT: Point = Point::new(8, STATUS_BAR_HEIGHT + 4);
const ENEMY_COLORS: [Rgb565; 3] = [COLOR_ERROR, COLOR_WARN, COLOR_SUCCESS];

/// Xorshift32; plenty for spawn positions.
pub struct Rng(u32);

impl Rng {
    pub const fn new(seed: u32) -> Self {
        // Zero is a fixed point of xorshift.
        Self(if seed == 0 { 0x2545_F491 } else { seed })
    }

    pub fn next(&mut self) -> u32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0
    }

    pub fn range(&mut self, max: u32) -> u32 {
        self.next() % max
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Bullet {
    x: f32,
    y: f32,
    active: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Enemy {
    x: f32,
    y: f32,
    active: bool,
    kind: u8,
}

/// Integer positions as last painted, for erase-and-redraw.
#[derive(Clone, Copy, PartialEq)]
struct Drawn {
    ship_x: i32,
    bullets: [Option<Point>; MAX_BULLETS],
    enemies: [Option<(Point, u8)>; MAX_ENEMIES],
    score: u32,
}

pub struct SpaceShooter {
    rng: Rng,
    ship_x: i32,
    bullets: [Bullet; MAX_BULLETS],
    enemies: [Enemy; MAX_ENEMIES],
    score: u32,
    active: bool,
    last_spawn_ms: u64,
    last_fire_ms: Option<u64>,
    drawn: Option<Drawn>,
}

impl SpaceShooter {
    pub const fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed),
            ship_x: SHIP_START_X,
            bullets: [Bullet {
                x: 0.0,
                y: 0.0,
                active: false,
            }; MAX_BULLETS],
            enemies: [Enemy {
                x: 0.0,
                y: 0.0,
                active: false,
                kind: 0,
            }; MAX_ENEMIES],
            score: 0,
            active: true,
            last_spawn_ms: 0,
            last_fire_ms: None,
            drawn: None,
        }
    }

    /// Fresh round; the random stream carries on.
    pub fn reset(&mut self, now_ms: u64) {
        self.ship_x = SHIP_START_X;
        self.bullets = [Bullet::default(); MAX_BULLETS];
        self.enemies = [Enemy::default(); MAX_ENEMIES];
        self.score = 0;
        self.active = true;
        self.last_spawn_ms = now_ms;
        self.last_fire_ms = None;
        self.drawn = None;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ship_x(&self) -> i32 {
        self.ship_x
    }

    pub fn active_bullets(&self) -> usize {
        self.bullets.iter().filter(|b| b.active).count()
    }

    pub fn active_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.active).count()
    }

    pub fn steer(&mut self, movement: Movement) {
        if self.active && movement.x != 0 {
            self.ship_x = (self.ship_x + movement.x * SHIP_STEP).clamp(SHIP_MIN_X, SHIP_MAX_X);
        }
    }

    /// Fires from the ship nose when the interval has passed and a slot is
    /// free.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        if !self.active {
            return false;
        }
        if self
            .last_fire_ms
            .is_some_and(|last| now_ms.saturating_sub(last) <= FIRE_INTERVAL_MS)
        {
            return false;
        }
        let Some(slot) = self.bullets.iter_mut().find(|b| !b.active) else {
            return false;
        };
        *slot = Bullet {
            x: self.ship_x as f32,
            y: (SHIP_Y - 6) as f32,
            active: true,
        };
        self.last_fire_ms = Some(now_ms);
        true
    }

    pub fn step(&mut self, now_ms: u64) -> StepOutcome {
        if !self.active {
            return StepOutcome::Continue;
        }

        for bullet in self.bullets.iter_mut().filter(|b| b.active) {
            bullet.y -= BULLET_SPEED;
            if bullet.y < STATUS_BAR_HEIGHT as f32 {
                bullet.active = false;
            }
        }

        for enemy in self.enemies.iter_mut().filter(|e| e.active) {
            enemy.y += ENEMY_SPEED;
            if enemy.y > DISPLAY_HEIGHT as f32 {
                self.active = false;
            }
        }
        if !self.active {
            log::info!("shooter: game over, score {}", self.score);
            return StepOutcome::NeedsFullRedraw;
        }

        for bullet in self.bullets.iter_mut().filter(|b| b.active) {
            let hit = self.enemies.iter_mut().find(|e| {
                e.active
                    && (bullet.x as i32 - e.x as i32).abs() < HIT_RANGE
                    && (bullet.y as i32 - e.y as i32).abs() < HIT_RANGE
            });
            if let Some(enemy) = hit {
                bullet.active = false;
                enemy.active = false;
                self.score += HIT_SCORE;
            }
        }

        if now_ms.saturating_sub(self.last_spawn_ms) > SPAWN_INTERVAL_MS {
            // A full wave keeps the timer running so a freed slot fills at once.
            if let Some(slot) = self.enemies.iter_mut().find(|e| !e.active) {
                let x = 15 + self.rng.range((DISPLAY_WIDTH - 30) as u32) as i32;
                let kind = self.rng.range(ENEMY_COLORS.len() as u32) as u8;
                *slot = Enemy {
                    x: x as f32,
                    y: (STATUS_BAR_HEIGHT + 15) as f32,
                    active: true,
                    kind,
                };
                self.last_spawn_ms = now_ms;
            }
        }
        StepOutcome::Continue
    }

    fn snapshot(&self) -> Drawn {
        let mut drawn = Drawn {
            ship_x: self.ship_x,
            bullets: [None; MAX_BULLETS],
            enemies: [None; MAX_ENEMIES],
            score: self.score,
        };
        for (slot, bullet) in drawn.bullets.iter_mut().zip(self.bullets.iter()) {
            *slot = bullet
                .active
                .then(|| Point::new(bullet.x as i32, bullet.y as i32));
        }
        for (slot, enemy) in drawn.enemies.iter_mut().zip(self.enemies.iter()) {
            *slot = enemy
                .active
                .then(|| (Point::new(enemy.x as i32, enemy.y as i32), enemy.kind));
        }
        drawn
    }

    fn draw_ship<D>(display: &mut D, x: i32, color: Rgb565)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill_triangle(
            display,
            Point::new(x, SHIP_Y - 5),
            Point::new(x - 4, SHIP_Y + 5),
            Point::new(x + 4, SHIP_Y + 5),
            color,
        );
    }

    fn draw_bullet<D>(display: &mut D, at: Point, color: Rgb565)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill_rect(display, at.x, at.y, 2, 4, color);
    }

    fn draw_enemy<D>(display: &mut D, at: Point, color: Rgb565)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill_rect(display, at.x - 3, at.y - 3, 6, 6, color);
    }

    fn draw_score<D>(display: &mut D, score: u32)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let mut text = String::<16>::new();
        let _ = write!(text, "Score: {}", score);
        draw_text(display, &SMALL_FONT, text.as_str(), SCORE_AT, COLOR_FG);
    }
}

impl Screen for SpaceShooter {
    fn full_render<D>(&mut self, display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        let now = self.snapshot();
        Self::draw_ship(display, now.ship_x, COLOR_ACCENT);
        for at in now.bullets.iter().flatten() {
            Self::draw_bullet(display, *at, COLOR_WARN);
        }
        for (at, kind) in now.enemies.iter().flatten() {
            Self::draw_enemy(display, *at, ENEMY_COLORS[*kind as usize]);
        }
        Self::draw_score(display, now.score);

        if !self.active {
            let x = DISPLAY_WIDTH / 2 - 40;
            let y = DISPLAY_HEIGHT / 2;
            fill_rect(display, x, y, 80, 20, COLOR_PANEL);
            stroke_rect(display, x, y, 80, 20, COLOR_ACCENT);
            draw_text(
                display,
                &SMALL_FONT,
                "Game Over!",
                Point::new(DISPLAY_WIDTH / 2 - 32, y + 6),
                COLOR_FG,
            );
            draw_text(
                display,
                &SMALL_FONT,
                "Press to play",
                Point::new(DISPLAY_WIDTH / 2 - 28, DISPLAY_HEIGHT - 15),
                COLOR_FG,
            );
        }
        self.drawn = Some(now);
    }

    fn incremental_update<D>(&mut self, display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(old) = self.drawn else {
            return;
        };
        let now = self.snapshot();
        if now == old {
            return;
        }

        for (before, after) in old.bullets.iter().zip(now.bullets.iter()) {
            if before != after {
                if let Some(at) = before {
                    Self::draw_bullet(display, *at, COLOR_BG);
                }
                if let Some(at) = after {
                    Self::draw_bullet(display, *at, COLOR_WARN);
                }
            }
        }
        for (before, after) in old.enemies.iter().zip(now.enemies.iter()) {
            if before != after {
                if let Some((at, _)) = before {
                    Self::draw_enemy(display, *at, COLOR_BG);
                }
                if let Some((at, kind)) = after {
                    Self::draw_enemy(display, *at, ENEMY_COLORS[*kind as usize]);
                }
            }
        }
        if old.ship_x != now.ship_x {
            Self::draw_ship(display, old.ship_x, COLOR_BG);
            Self::draw_ship(display, now.ship_x, COLOR_ACCENT);
        }
        if old.score != now.score {
            fill_rect(display, SCORE_AT.x, SCORE_AT.y, 80, 10, COLOR_BG);
        }
        // Sprites passing under the score line erase parts of it.
        Self::draw_score(display, now.score);
        self.drawn = Some(now);
    }

    fn on_press(&mut self, _cursor: Point, ctx: &ScreenContext<'_>) -> PressAction {
        if !self.active {
            self.reset(ctx.now_ms);
            return PressAction::Redraw;
        }
        if self.fire(ctx.now_ms) {
            PressAction::Handled
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

    fn enemy_at(x: f32, y: f32) -> Enemy {
        Enemy {
            x,
            y,
            active: true,
            kind: 0,
        }
    }

    #[test]
    fn rng_is_deterministic_and_bounded() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            let value = a.range(130);
            assert_eq!(value, b.range(130));
            assert!(value < 130);
        }
        assert_ne!(Rng::new(0).next(), 0);
    }

    #[test]
    fn fire_respects_interval_and_slots() {
        let mut game = SpaceShooter::new(1);
        game.reset(0);
        assert!(game.fire(0));
        assert!(!game.fire(150));
        assert!(!game.fire(200));
        assert!(game.fire(201));

        let mut now = 201;
        while game.fire(now + 201) {
            now += 201;
        }
        assert_eq!(game.active_bullets(), MAX_BULLETS);
    }

    #[test]
    fn bullet_hit_destroys_both_and_scores() {
        let mut game = SpaceShooter::new(1);
        game.reset(0);
        game.bullets[0] = Bullet {
            x: 50.0,
            y: 60.0,
            active: true,
        };
        game.enemies[0] = enemy_at(55.0, 50.0);
        game.enemies[1] = enemy_at(60.0, 52.0);

        assert_eq!(game.step(10), StepOutcome::Continue);
        assert_eq!(game.score(), HIT_SCORE);
        assert_eq!(game.active_bullets(), 0);
        // One enemy per bullet.
        assert_eq!(game.active_enemies(), 1);
    }

    #[test]
    fn far_bullet_misses() {
        let mut game = SpaceShooter::new(1);
        game.reset(0);
        game.bullets[0] = Bullet {
            x: 20.0,
            y: 90.0,
            active: true,
        };
        game.enemies[0] = enemy_at(100.0, 40.0);
        game.step(10);
        assert_eq!(game.score(), 0);
        assert_eq!(game.active_enemies(), 1);
    }

    #[test]
    fn enemy_reaching_bottom_ends_game() {
        let mut game = SpaceShooter::new(1);
        game.reset(0);
        game.enemies[3] = enemy_at(40.0, DISPLAY_HEIGHT as f32);
        assert_eq!(game.step(10), StepOutcome::NeedsFullRedraw);
        assert!(!game.is_active());
        assert!(!game.fire(1000));

        let fixture = ContextFixture::default();
        assert_eq!(
            game.on_press(Point::zero(), &fixture.ctx(5000)),
            PressAction::Redraw
        );
        assert!(game.is_active());
        assert_eq!(game.active_enemies(), 0);
    }

    #[test]
    fn spawning_waits_for_interval_and_caps() {
        let mut game = SpaceShooter::new(99);
        game.reset(0);
        game.step(1500);
        assert_eq!(game.active_enemies(), 0);
        game.step(1501);
        assert_eq!(game.active_enemies(), 1);
        let enemy = game.enemies.iter().find(|e| e.active).copied().unwrap_or_default();
        assert!(enemy.x >= 15.0 && enemy.x < (DISPLAY_WIDTH - 15) as f32);

        // Keep enemies near the top so none reaches the bottom.
        let mut now = 1501;
        for _ in 0..20 {
            now += 1501;
            for e in game.enemies.iter_mut() {
                e.y = 20.0;
            }
            game.step(now);
        }
        assert_eq!(game.active_enemies(), MAX_ENEMIES);
    }

    #[test]
    fn full_wave_does_not_restart_spawn_timer() {
        let mut game = SpaceShooter::new(5);
        game.reset(0);
        for enemy in game.enemies.iter_mut() {
            *enemy = enemy_at(40.0, 20.0);
        }
        game.step(2000);
        assert_eq!(game.active_enemies(), MAX_ENEMIES);
        assert_eq!(game.last_spawn_ms, 0);

        game.enemies[2].active = false;
        game.step(2010);
        assert_eq!(game.active_enemies(), MAX_ENEMIES);
        assert_eq!(game.last_spawn_ms, 2010);
    }

    #[test]
    fn steering_is_clamped() {
        let mut game = SpaceShooter::new(1);
        for _ in 0..60 {
            game.steer(Movement { x: 1, y: 0 });
        }
        assert_eq!(game.ship_x(), SHIP_MAX_X);
    }

    #[test]
    fn incremental_update_erases_old_sprites() {
        let fixture = ContextFixture::default();
        let mut canvas = TestCanvas::new();
        let mut game = SpaceShooter::new(1);
        game.reset(0);
        game.enemies[0] = enemy_at(100.0, 40.0);
        game.full_render(&mut canvas, &fixture.ctx(0));
        assert_eq!(canvas.at(100, 40), COLOR_ERROR);

        game.step(10);
        game.incremental_update(&mut canvas, &fixture.ctx(10));
        assert_eq!(canvas.at(100, 37), COLOR_BG);
        assert_eq!(canvas.at(100, 43), COLOR_ERROR);
    }
}

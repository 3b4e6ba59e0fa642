//! Screens and the navigation machine that decides which one is current.
//!
//! Every screen owns three behaviours: a full repaint of the content area, a
//! cheap incremental update that only touches what changed, and a press
//! handler that receives the cursor position. Dispatch is a plain match over
//! [`AppId`].

mod accel;
mod calculator;
mod clock;
mod compass;
mod engine;
mod games_menu;
mod home;
mod launcher;
mod machine;
mod pong;
mod settings;
mod shooter;
mod tictactoe;

#[cfg(test)]
mod tests;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};

use crate::calibration::ReferenceAttitude;
use crate::input::Movement;
use crate::net::{LocalTime, NetworkStatus, ScanResults, WeatherReport};
use crate::orientation::OrientationState;

pub use calculator::{format_general, Calculator};
pub use engine::{NavApplyResult, NavigatorEngine};
pub use machine::{NavCommand, NavStatus};
pub use pong::Pong;
pub use shooter::{Rng, SpaceShooter};
pub use tictactoe::{find_best_move, TicTacToe};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppId {
    Home,
    Launcher,
    Calculator,
    Compass,
    Accelerometer,
    Clock,
    GamesMenu,
    TicTacToe,
    Pong,
    SpaceShooter,
    Settings,
}

impl AppId {
    pub fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Launcher => "launcher",
            Self::Calculator => "calculator",
            Self::Compass => "compass",
            Self::Accelerometer => "accel",
            Self::Clock => "clock",
            Self::GamesMenu => "games",
            Self::TicTacToe => "tictactoe",
            Self::Pong => "pong",
            Self::SpaceShooter => "shooter",
            Self::Settings => "settings",
        }
    }

    /// Apps reachable from the launcher grid.
    pub fn is_launchable(self) -> bool {
        matches!(
            self,
            Self::Calculator
                | Self::Compass
                | Self::Accelerometer
                | Self::Clock
                | Self::GamesMenu
                | Self::Settings
        )
    }

    pub fn is_game(self) -> bool {
        matches!(self, Self::TicTacToe | Self::Pong | Self::SpaceShooter)
    }
}

/// What a short press asks the frame loop to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressAction {
    Ignored,
    /// Handled in place; the screen repaints itself incrementally.
    Handled,
    Redraw,
    Open(AppId),
    Calibrate,
    Scan,
}

/// Read-only view of everything a screen may display.
pub struct ScreenContext<'a> {
    pub now_ms: u64,
    pub orientation: &'a OrientationState,
    pub reference: &'a ReferenceAttitude,
    pub clock: Option<LocalTime>,
    pub weather: &'a WeatherReport,
    pub city: &'a str,
    pub network: &'a NetworkStatus,
    pub networks: &'a ScanResults,
    pub scan_pending: bool,
}

/// Shared shape of every screen. Drawing is generic over the target so the
/// same code paints the panel and the host test canvas.
pub trait Screen {
    fn full_render<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>;

    fn incremental_update<D>(&mut self, _display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
    }

    fn on_press(&mut self, _cursor: Point, _ctx: &ScreenContext<'_>) -> PressAction {
        PressAction::Ignored
    }
}

/// Result of advancing game simulation by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    NeedsFullRedraw,
}

/// Owns the per-screen state for the whole session.
pub struct Screens {
    pub home: home::HomeScreen,
    pub launcher: launcher::Launcher,
    pub calculator: Calculator,
    pub compass: compass::CompassScreen,
    pub accel: accel::AccelScreen,
    pub clock: clock::ClockScreen,
    pub games_menu: games_menu::GamesMenu,
    pub tictactoe: TicTacToe,
    pub pong: Pong,
    pub shooter: SpaceShooter,
    pub settings: settings::SettingsScreen,
}

impl Screens {
    pub fn new(seed: u32) -> Self {
        Self {
            home: home::HomeScreen::new(),
            launcher: launcher::Launcher,
            calculator: Calculator::new(),
            compass: compass::CompassScreen::new(),
            accel: accel::AccelScreen::new(),
            clock: clock::ClockScreen::new(),
            games_menu: games_menu::GamesMenu,
            tictactoe: TicTacToe::new(),
            pong: Pong::new(),
            shooter: SpaceShooter::new(seed),
            settings: settings::SettingsScreen,
        }
    }

    /// Resets game state when a game becomes current.
    pub fn enter(&mut self, app: AppId, now_ms: u64) {
        match app {
            AppId::TicTacToe => self.tictactoe.reset(),
            AppId::Pong => self.pong.reset(),
            AppId::SpaceShooter => self.shooter.reset(now_ms),
            _ => {}
        }
    }

    /// Joystick steering and physics for the current game.
    pub fn advance(&mut self, app: AppId, movement: Movement, now_ms: u64) -> StepOutcome {
        match app {
            AppId::Pong => {
                self.pong.steer(movement);
                self.pong.step()
            }
            AppId::SpaceShooter => {
                self.shooter.steer(movement);
                self.shooter.step(now_ms)
            }
            _ => StepOutcome::Continue,
        }
    }

    pub fn full_render<D>(&mut self, app: AppId, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match app {
            AppId::Home => self.home.full_render(display, ctx),
            AppId::Launcher => self.launcher.full_render(display, ctx),
            AppId::Calculator => self.calculator.full_render(display, ctx),
            AppId::Compass => self.compass.full_render(display, ctx),
            AppId::Accelerometer => self.accel.full_render(display, ctx),
            AppId::Clock => self.clock.full_render(display, ctx),
            AppId::GamesMenu => self.games_menu.full_render(display, ctx),
            AppId::TicTacToe => self.tictactoe.full_render(display, ctx),
            AppId::Pong => self.pong.full_render(display, ctx),
            AppId::SpaceShooter => self.shooter.full_render(display, ctx),
            AppId::Settings => self.settings.full_render(display, ctx),
        }
    }

    pub fn incremental_update<D>(&mut self, app: AppId, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match app {
            AppId::Home => self.home.incremental_update(display, ctx),
            AppId::Launcher => self.launcher.incremental_update(display, ctx),
            AppId::Calculator => self.calculator.incremental_update(display, ctx),
            AppId::Compass => self.compass.incremental_update(display, ctx),
            AppId::Accelerometer => self.accel.incremental_update(display, ctx),
            AppId::Clock => self.clock.incremental_update(display, ctx),
            AppId::GamesMenu => self.games_menu.incremental_update(display, ctx),
            AppId::TicTacToe => self.tictactoe.incremental_update(display, ctx),
            AppId::Pong => self.pong.incremental_update(display, ctx),
            AppId::SpaceShooter => self.shooter.incremental_update(display, ctx),
            AppId::Settings => self.settings.incremental_update(display, ctx),
        }
    }

    pub fn on_press(&mut self, app: AppId, cursor: Point, ctx: &ScreenContext<'_>) -> PressAction {
        match app {
            AppId::Home => self.home.on_press(cursor, ctx),
            AppId::Launcher => self.launcher.on_press(cursor, ctx),
            AppId::Calculator => self.calculator.on_press(cursor, ctx),
            AppId::Compass => self.compass.on_press(cursor, ctx),
            AppId::Accelerometer => self.accel.on_press(cursor, ctx),
            AppId::Clock => self.clock.on_press(cursor, ctx),
            AppId::GamesMenu => self.games_menu.on_press(cursor, ctx),
            AppId::TicTacToe => self.tictactoe.on_press(cursor, ctx),
            AppId::Pong => self.pong.on_press(cursor, ctx),
            AppId::SpaceShooter => self.shooter.on_press(cursor, ctx),
            AppId::Settings => self.settings.on_press(cursor, ctx),
        }
    }
}

/// Button shared by the sensor screens; a press in its band starts
/// calibration.
pub(crate) mod calibrate_button {
    use embedded_graphics::{
        pixelcolor::Rgb565,
        prelude::*,
        primitives::PrimitiveStyle,
    };

    use crate::config::{COLOR_FG, COLOR_PANEL, DISPLAY_HEIGHT, SMALL_FONT};
    use crate::render::{draw_text, round_rect};

    pub(crate) fn draw<D>(display: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        round_rect(
            display,
            8,
            DISPLAY_HEIGHT - 20,
            72,
            14,
            3,
            PrimitiveStyle::with_fill(COLOR_PANEL),
        );
        draw_text(
            display,
            &SMALL_FONT,
            "Calibrate",
            Point::new(14, DISPLAY_HEIGHT - 18),
            COLOR_FG,
        );
    }

    pub(crate) fn hit(cursor: Point) -> bool {
        cursor.x >= 8 && cursor.x < 80 && cursor.y >= DISPLAY_HEIGHT - 22
    }
}

/// Point on a dial: angle in degrees clockwise from 12 o'clock.
pub(crate) fn dial_point(center: Point, radius: f32, degrees: f32) -> Point {
    #[allow(unused_imports)]
    use micromath::F32Ext;

    let radians = degrees.to_radians();
    Point::new(
        center.x + (radius * radians.sin()) as i32,
        center.y - (radius * radians.cos()) as i32,
    )
}

pub(crate) fn hit_rect(cursor: Point, x: i32, y: i32, width: i32, height: i32) -> bool {
    cursor.x >= x && cursor.x < x + width && cursor.y >= y && cursor.y < y + height
}

/// Owned backing values for a [`ScreenContext`] in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct ContextFixture {
    pub orientation: OrientationState,
    pub reference: ReferenceAttitude,
    pub weather: WeatherReport,
    pub network: NetworkStatus,
    pub networks: ScanResults,
    pub scan_pending: bool,
}

#[cfg(test)]
impl ContextFixture {
    pub fn ctx(&self, now_ms: u64) -> ScreenContext<'_> {
        ScreenContext {
            now_ms,
            orientation: &self.orientation,
            reference: &self.reference,
            clock: None,
            weather: &self.weather,
            city: "Pune",
            network: &self.network,
            networks: &self.networks,
            scan_pending: self.scan_pending,
        }
    }
}

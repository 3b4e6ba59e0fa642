//! The cooperative frame loop.
//!
//! [`Console`] owns every piece of mutable session state. The firmware calls
//! [`Console::tick`] once per frame; the two blocking operations (calibration
//! and the WiFi scan) are reported back through [`FrameReport::request`] and
//! run by the caller outside the frame.

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use heapless::String;

use crate::apps::{
    AppId, NavCommand, NavigatorEngine, PressAction, ScreenContext, Screens, StepOutcome,
};
use crate::audio::ToneSynth;
use crate::calibration::{calibrate, CalibrationError, CalibrationRecord};
use crate::config::{
    ConsoleSettings, BEEP_DURATION_MS, BEEP_FREQUENCY_HZ, CALIBRATION_FAILURE_HOLD_MS,
    CALIBRATION_SAMPLES, CALIBRATION_SUCCESS_HOLD_MS, COLOR_ACCENT, COLOR_BG, COLOR_ERROR,
    COLOR_FG, COLOR_SUCCESS, DISPLAY_WIDTH, FPS_WINDOW_MS, MEDIUM_FONT,
    SMALL_FONT, STATUS_BAR_HEIGHT,
};
use crate::hal::{
    CalibrationStorage, ConsoleHardware, DelayOps, ImuSource, JoystickAxis, MonotonicClock,
    NetInbox, ToneOutput,
};
use crate::input::{ButtonTracker, CursorState, JoystickMapper, Movement, Press};
use crate::net::{NetEvent, NetworkStatus, ScanResults, StatusSnapshot, WallClock, WeatherReport};
use crate::orientation::{OrientationEstimator, OrientationState, PollOutcome};
use crate::render::{
    clear_content_area, draw_text, fill_rect, stroke_rect, RenderScheduler, StatusBarInfo,
};

const CITY_MAX: usize = 24;

/// Work the frame loop cannot do without stalling animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockingRequest {
    Calibrate,
    ScanNetworks,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub app: AppId,
    /// The frame repainted the whole screen.
    pub full_redraw: bool,
    pub request: Option<BlockingRequest>,
    /// Remainder of the frame budget; zero when the frame overran.
    pub sleep_ms: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    Click,
    Navigate,
    Calibrate,
}

impl SoundCue {
    pub const fn frequency_hz(self) -> u16 {
        match self {
            Self::Click => 2_000,
            Self::Navigate => 1_200,
            Self::Calibrate => 880,
        }
    }

    pub const fn duration_ms(self) -> u32 {
        match self {
            Self::Click => 20,
            Self::Navigate => 40,
            Self::Calibrate => 200,
        }
    }
}

/// Frames completed per one-second window.
#[derive(Clone, Copy, Debug, Default)]
pub struct FpsCounter {
    window_start_ms: Option<u64>,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    pub const fn new() -> Self {
        Self {
            window_start_ms: None,
            frames: 0,
            fps: 0,
        }
    }

    pub fn frame(&mut self, now_ms: u64) -> u32 {
        let start = *self.window_start_ms.get_or_insert(now_ms);
        self.frames += 1;
        if now_ms.saturating_sub(start) >= FPS_WINDOW_MS {
            self.fps = self.frames;
            self.frames = 0;
            self.window_start_ms = Some(now_ms);
        }
        self.fps
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Soft frame pacing: sleep whatever is left of the budget, never catch up.
#[derive(Clone, Copy, Debug)]
pub struct FramePacer {
    budget_ms: u32,
}

impl FramePacer {
    pub fn new(target_fps: u8) -> Self {
        Self {
            budget_ms: 1_000 / u32::from(target_fps.max(1)),
        }
    }

    pub fn budget_ms(&self) -> u32 {
        self.budget_ms
    }

    pub fn sleep_for(&self, elapsed_ms: u64) -> u32 {
        u64::from(self.budget_ms).saturating_sub(elapsed_ms) as u32
    }
}

/// State the screens read while drawing and handling presses.
struct SharedState {
    settings: ConsoleSettings,
    estimator: OrientationEstimator,
    calibration: CalibrationRecord,
    calibrated: bool,
    wall_clock: WallClock,
    weather: WeatherReport,
    city: String<CITY_MAX>,
    network: NetworkStatus,
    networks: ScanResults,
    scan_pending: bool,
}

impl SharedState {
    fn context(&self, now_ms: u64) -> ScreenContext<'_> {
        ScreenContext {
            now_ms,
            orientation: self.estimator.state(),
            reference: &self.calibration.reference,
            clock: self.wall_clock.now(now_ms),
            weather: &self.weather,
            city: self.city.as_str(),
            network: &self.network,
            networks: &self.networks,
            scan_pending: self.scan_pending,
        }
    }
}

pub struct Console {
    shared: SharedState,
    engine: NavigatorEngine,
    screens: Screens,
    render: RenderScheduler,
    button: ButtonTracker,
    cursor: CursorState,
    joystick: JoystickMapper,
    synth: ToneSynth,
    fps: FpsCounter,
    pacer: FramePacer,
}

impl Console {
    /// `calibration` is whatever was loaded from storage; `None` boots
    /// uncalibrated with zero bias.
    pub fn new(
        settings: ConsoleSettings,
        calibration: Option<CalibrationRecord>,
        joystick: JoystickMapper,
        city: &str,
        seed: u32,
    ) -> Self {
        let mut city_label = String::new();
        for ch in city.chars() {
            if city_label.push(ch).is_err() {
                break;
            }
        }
        Self {
            shared: SharedState {
                settings,
                estimator: OrientationEstimator::new(),
                calibrated: calibration.is_some(),
                calibration: calibration.unwrap_or_default(),
                wall_clock: WallClock::new(),
                weather: WeatherReport::default(),
                city: city_label,
                network: NetworkStatus::default(),
                networks: ScanResults::new(),
                scan_pending: false,
            },
            engine: NavigatorEngine::new(),
            screens: Screens::new(seed),
            render: RenderScheduler::new(),
            button: ButtonTracker::new(),
            cursor: CursorState::default(),
            joystick,
            synth: ToneSynth::new(),
            fps: FpsCounter::new(),
            pacer: FramePacer::new(settings.target_fps),
        }
    }

    pub fn current_app(&self) -> AppId {
        self.engine.current()
    }

    pub fn orientation(&self) -> &OrientationState {
        self.shared.estimator.state()
    }

    pub fn network(&self) -> &NetworkStatus {
        &self.shared.network
    }

    pub fn is_calibrated(&self) -> bool {
        self.shared.calibrated
    }

    pub fn calibration(&self) -> &CalibrationRecord {
        &self.shared.calibration
    }

    pub fn cursor(&self) -> Point {
        self.cursor.position
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    pub fn message(&self) -> Option<&str> {
        self.render.message()
    }

    pub fn scan_pending(&self) -> bool {
        self.shared.scan_pending
    }

    pub fn audio_running(&self) -> bool {
        self.synth.is_running()
    }

    pub fn audio_half_period_us(&self) -> u64 {
        self.synth.half_period_us()
    }

    /// Values published to the HTTP API.
    pub fn status_snapshot(&self) -> StatusSnapshot {
        let state = self.shared.estimator.state();
        StatusSnapshot {
            pitch: state.pitch_filtered,
            roll: state.roll_filtered,
            yaw: state.yaw_filtered,
            network: self.shared.network.clone(),
        }
    }

    /// One frame: sensors, input, game physics, press dispatch, network
    /// events, then the redraw decision and the audio tick.
    pub fn tick<D, H, N>(&mut self, display: &mut D, hw: &mut H, inbox: &mut N) -> FrameReport
    where
        D: DrawTarget<Color = Rgb565>,
        H: ConsoleHardware,
        N: NetInbox,
    {
        let frame_start_us = hw.now_us();
        let now_ms = frame_start_us / 1_000;
        self.fps.frame(now_ms);

        if self
            .shared
            .estimator
            .poll(hw, &self.shared.calibration.bias, frame_start_us)
            == PollOutcome::ReadFailed
        {
            log::debug!("frame: imu read failed, keeping previous orientation");
        }

        let raw_x = hw.read_axis(JoystickAxis::X);
        let raw_y = hw.read_axis(JoystickAxis::Y);
        let movement = self.joystick.map(raw_x, raw_y);
        let press = self.button.update(hw.button_pressed(), now_ms);
        let proposed = self
            .cursor
            .proposed(movement, self.shared.settings.joystick_speed);

        self.advance_game(movement, now_ms);
        self.cursor.position = proposed;

        let mut request = None;
        match press {
            Some(Press::Short) => {
                self.play_cue(hw, SoundCue::Click);
                request = self.dispatch_press(hw, now_ms);
            }
            Some(Press::Long) => {
                request = self.navigate(hw, NavCommand::GoHome, now_ms);
            }
            None => {}
        }

        while let Some(event) = inbox.poll() {
            self.apply_event(hw, event, now_ms);
        }
        self.render.expire_message(now_ms);

        let app = self.engine.current();
        self.render.observe_app(app);
        let full_redraw = self.render.take_full_redraw();
        let ctx = self.shared.context(now_ms);
        if full_redraw {
            self.screens.full_render(app, display, &ctx);
        } else {
            self.screens.incremental_update(app, display, &ctx);
        }
        let status = StatusBarInfo {
            connected: self.shared.network.connected,
            clock: ctx.clock,
            uptime_s: now_ms / 1_000,
            fps: self.fps.fps(),
        };
        self.render.draw_status(display, &status);
        self.render.draw_overlay(display);
        // Also repaints an unmoved cursor after a full redraw wiped it.
        self.render.draw_cursor(display, self.cursor.position);

        let now_us = hw.now_us();
        self.synth.tick(hw, now_us);

        let elapsed_ms = now_us.saturating_sub(frame_start_us) / 1_000;
        FrameReport {
            app,
            full_redraw,
            request,
            sleep_ms: self.pacer.sleep_for(elapsed_ms),
        }
    }

    /// Keeps the square wave going while the caller waits out the frame.
    pub fn service_audio<O: ToneOutput>(&mut self, output: &mut O, now_us: u64) {
        self.synth.tick(output, now_us);
    }

    /// Blocking pacing for drivers without an async timer: sleeps
    /// `sleep_ms`, ticking audio at its half period while a tone plays.
    pub fn idle<H>(&mut self, hw: &mut H, sleep_ms: u32)
    where
        H: ToneOutput + MonotonicClock + DelayOps,
    {
        let deadline_us = hw.now_us() + u64::from(sleep_ms) * 1_000;
        while self.synth.is_running() {
            let now_us = hw.now_us();
            if now_us >= deadline_us {
                return;
            }
            self.synth.tick(hw, now_us);
            let step = self.synth.half_period_us().min(deadline_us - now_us).max(1);
            hw.delay_us(step as u32);
        }
        let now_us = hw.now_us();
        if now_us < deadline_us {
            hw.delay_us((deadline_us - now_us) as u32);
        }
    }

    fn advance_game(&mut self, movement: Movement, now_ms: u64) {
        let app = self.engine.current();
        if self.screens.advance(app, movement, now_ms) == StepOutcome::NeedsFullRedraw {
            self.render.request_full_redraw();
        }
    }

    fn dispatch_press<H: ToneOutput + MonotonicClock>(
        &mut self,
        hw: &mut H,
        now_ms: u64,
    ) -> Option<BlockingRequest> {
        let app = self.engine.current();
        let ctx = self.shared.context(now_ms);
        let action = self.screens.on_press(app, self.cursor.position, &ctx);
        match action {
            PressAction::Ignored | PressAction::Handled => None,
            PressAction::Redraw => {
                self.render.request_full_redraw();
                None
            }
            PressAction::Open(target) => self.navigate(hw, NavCommand::Open(target), now_ms),
            PressAction::Calibrate => Some(BlockingRequest::Calibrate),
            PressAction::Scan => {
                self.begin_scan();
                Some(BlockingRequest::ScanNetworks)
            }
        }
    }

    fn navigate<H: ToneOutput + MonotonicClock>(
        &mut self,
        hw: &mut H,
        command: NavCommand,
        now_ms: u64,
    ) -> Option<BlockingRequest> {
        let result = self.engine.apply(command);
        if !result.changed() {
            log::debug!("frame: navigation {:?} -> {:?}", command, result.status);
            return None;
        }

        log::info!(
            "frame: {} -> {}",
            result.before.name(),
            result.after.name()
        );
        self.screens.enter(result.after, now_ms);
        self.render.request_full_redraw();
        self.play_cue(hw, SoundCue::Navigate);

        if result.after == AppId::Settings {
            self.begin_scan();
            Some(BlockingRequest::ScanNetworks)
        } else {
            None
        }
    }

    fn play_cue<H: ToneOutput + MonotonicClock>(&mut self, hw: &mut H, cue: SoundCue) {
        let now_us = hw.now_us();
        self.synth.start_tone(
            hw,
            cue.frequency_hz(),
            cue.duration_ms(),
            self.shared.settings.ui_volume,
            now_us,
        );
    }

    fn apply_event<H: ToneOutput + MonotonicClock>(&mut self, hw: &mut H, event: NetEvent, now_ms: u64) {
        match event {
            NetEvent::Beep => {
                let now_us = hw.now_us();
                self.synth.start_tone(
                    hw,
                    BEEP_FREQUENCY_HZ,
                    BEEP_DURATION_MS,
                    self.shared.settings.beep_volume,
                    now_us,
                );
            }
            NetEvent::Message(text) => {
                log::info!("frame: web message len={}", text.len());
                self.render.show_message(text, now_ms);
            }
            NetEvent::TimeSync { unix_seconds } => {
                self.shared.wall_clock.sync(
                    unix_seconds,
                    self.shared.settings.tz_offset_seconds,
                    now_ms,
                );
            }
            NetEvent::Weather(report) => {
                self.shared.weather = report;
                if self.engine.current() == AppId::Home {
                    self.render.request_full_redraw();
                }
            }
            NetEvent::ScanResults(results) => self.apply_scan_results(results),
            NetEvent::Link(status) => {
                self.shared.network = status;
                if self.engine.current() == AppId::Settings {
                    self.render.request_full_redraw();
                }
            }
        }
    }

    /// Marks a scan as pending; Settings shows "Scanning..." until results
    /// arrive.
    pub fn begin_scan(&mut self) {
        self.shared.scan_pending = true;
        self.render.request_full_redraw();
    }

    pub fn apply_scan_results(&mut self, results: ScanResults) {
        log::info!("frame: scan results count={}", results.len());
        self.shared.networks = results;
        self.shared.scan_pending = false;
        self.render.request_full_redraw();
    }

    /// Blocking calibration with its own progress screen. The previous
    /// record stays in effect when no sample could be read.
    pub fn run_calibration<D, H, S>(
        &mut self,
        display: &mut D,
        hw: &mut H,
        storage: &mut S,
    ) -> Result<(), CalibrationError>
    where
        D: DrawTarget<Color = Rgb565>,
        H: ImuSource + ToneOutput + MonotonicClock + DelayOps,
        S: CalibrationStorage,
    {
        self.synth.stop(hw);
        clear_content_area(display);
        draw_text(
            display,
            &SMALL_FONT,
            "Calibrating...",
            Point::new(10, STATUS_BAR_HEIGHT + 20),
            COLOR_FG,
        );
        draw_text(
            display,
            &SMALL_FONT,
            "Keep flat & still",
            Point::new(10, STATUS_BAR_HEIGHT + 32),
            COLOR_FG,
        );

        let bar_width = DISPLAY_WIDTH - 40;
        let current_yaw = self.shared.estimator.state().yaw;
        let outcome = calibrate(hw, current_yaw, |collected| {
            let filled = collected.min(CALIBRATION_SAMPLES) as i32 * bar_width
                / CALIBRATION_SAMPLES as i32;
            fill_rect(display, 20, STATUS_BAR_HEIGHT + 65, filled, 8, COLOR_ACCENT);
        });

        let result_at = Point::new(10, STATUS_BAR_HEIGHT + 100);
        let result = match outcome {
            Ok(record) => {
                draw_text(display, &SMALL_FONT, "Calibrated!", result_at, COLOR_SUCCESS);
                if storage.store(&record.record_bytes()).is_err() {
                    log::warn!("calibration: record not persisted");
                }
                self.shared.calibration = record;
                self.shared.calibrated = true;
                self.play_cue(hw, SoundCue::Calibrate);
                hold(hw, &mut self.synth, CALIBRATION_SUCCESS_HOLD_MS);
                Ok(())
            }
            Err(err) => {
                log::warn!("calibration: failed reason={:?}", err);
                draw_text(
                    display,
                    &SMALL_FONT,
                    "Calibration failed",
                    result_at,
                    COLOR_ERROR,
                );
                hold(hw, &mut self.synth, CALIBRATION_FAILURE_HOLD_MS);
                Err(err)
            }
        };
        self.render.request_full_redraw();
        result
    }
}

/// Blocking wait that keeps a playing cue audible.
fn hold<H>(hw: &mut H, synth: &mut ToneSynth, millis: u32)
where
    H: ToneOutput + MonotonicClock + DelayOps,
{
    let until_us = hw.now_us() + u64::from(millis) * 1_000;
    loop {
        let now_us = hw.now_us();
        if now_us >= until_us {
            break;
        }
        synth.tick(hw, now_us);
        let step = if synth.is_running() {
            synth.half_period_us()
        } else {
            until_us - now_us
        };
        hw.delay_us(step.min(until_us - now_us).max(1) as u32);
    }
}

/// Title, a filling progress bar and "Ready".
pub fn draw_boot_screen<D, T>(display: &mut D, delay: &T)
where
    D: DrawTarget<Color = Rgb565>,
    T: DelayOps,
{
    let _ = display.clear(COLOR_BG);
    draw_text(
        display,
        &MEDIUM_FONT,
        "MiniConsole",
        Point::new(8, 12),
        COLOR_ACCENT,
    );
    draw_text(display, &SMALL_FONT, "Enhanced v2", Point::new(8, 40), COLOR_FG);

    let bar_width = DISPLAY_WIDTH - 40;
    stroke_rect(display, 20, 70, bar_width, 12, COLOR_FG);
    for filled in (0..=bar_width - 2).step_by(4) {
        fill_rect(display, 21, 71, filled, 10, COLOR_ACCENT);
        delay.delay_ms(10);
    }
    draw_text(display, &SMALL_FONT, "Ready", Point::new(8, 100), COLOR_FG);
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::calibration::CALIBRATION_RECORD_LEN;
    use crate::config::{JoystickRotation, COLOR_SELECTED, DISPLAY_HEIGHT};
    use crate::hal::{JoystickSource, RawImuSample};
    use crate::net::{NetworkEntry, WebMessage};
    use crate::render::testing::TestCanvas;

    struct FakeHw {
        now_us: Cell<u64>,
        axes: (u16, u16),
        button: bool,
        imu_ok: bool,
        level: bool,
        toggles: u32,
    }

    impl FakeHw {
        fn new() -> Self {
            Self {
                now_us: Cell::new(1_000_000),
                axes: (2048, 2048),
                button: false,
                imu_ok: true,
                level: false,
                toggles: 0,
            }
        }

        fn advance_ms(&self, millis: u64) {
            self.now_us.set(self.now_us.get() + millis * 1_000);
        }
    }

    impl ImuSource for FakeHw {
        type Error = ();

        fn read_raw(&mut self) -> Result<RawImuSample, ()> {
            // Each bus transaction takes a little while.
            self.now_us.set(self.now_us.get() + 500);
            if self.imu_ok {
                Ok(RawImuSample {
                    accel: [100, -50, 16_484],
                    gyro: [20, -10, 5],
                })
            } else {
                Err(())
            }
        }
    }

    impl JoystickSource for FakeHw {
        fn read_axis(&mut self, axis: JoystickAxis) -> u16 {
            match axis {
                JoystickAxis::X => self.axes.0,
                JoystickAxis::Y => self.axes.1,
            }
        }

        fn button_pressed(&mut self) -> bool {
            self.button
        }
    }

    impl ToneOutput for FakeHw {
        fn set_level(&mut self, high: bool) {
            if high != self.level {
                self.toggles += 1;
            }
            self.level = high;
        }
    }

    impl MonotonicClock for FakeHw {
        fn now_us(&self) -> u64 {
            self.now_us.get()
        }
    }

    impl DelayOps for FakeHw {
        fn delay_us(&self, micros: u32) {
            self.now_us.set(self.now_us.get() + u64::from(micros));
        }

        fn delay_ms(&self, millis: u32) {
            self.advance_ms(u64::from(millis));
        }
    }

    #[derive(Default)]
    struct Inbox {
        events: heapless::Deque<NetEvent, 4>,
    }

    impl NetInbox for Inbox {
        fn poll(&mut self) -> Option<NetEvent> {
            self.events.pop_front()
        }
    }

    #[derive(Default)]
    struct MemoryStorage {
        stored: Option<[u8; CALIBRATION_RECORD_LEN]>,
    }

    impl CalibrationStorage for MemoryStorage {
        type Error = ();

        fn load(&mut self) -> Result<[u8; CALIBRATION_RECORD_LEN], ()> {
            Ok(self.stored.unwrap_or([0xFF; CALIBRATION_RECORD_LEN]))
        }

        fn store(&mut self, record: &[u8; CALIBRATION_RECORD_LEN]) -> Result<(), ()> {
            self.stored = Some(*record);
            Ok(())
        }
    }

    struct Rig {
        console: Console,
        canvas: TestCanvas,
        hw: FakeHw,
        inbox: Inbox,
    }

    impl Rig {
        fn new() -> Self {
            let joystick = JoystickMapper::new(2048, 2048, 320, JoystickRotation::Deg0);
            Self {
                console: Console::new(ConsoleSettings::default(), None, joystick, "Pune", 7),
                canvas: TestCanvas::new(),
                hw: FakeHw::new(),
                inbox: Inbox::default(),
            }
        }

        fn frame(&mut self) -> FrameReport {
            self.hw.advance_ms(16);
            self.console
                .tick(&mut self.canvas, &mut self.hw, &mut self.inbox)
        }

        fn click_at(&mut self, at: Point) -> FrameReport {
            self.console.cursor.position = at;
            self.hw.button = true;
            self.frame();
            self.hw.button = false;
            self.frame()
        }

        fn long_press(&mut self) -> FrameReport {
            self.hw.button = true;
            self.frame();
            self.hw.advance_ms(1_200);
            self.hw.button = false;
            self.frame()
        }
    }

    #[test]
    fn first_frame_paints_everything() {
        let mut rig = Rig::new();
        let report = rig.frame();
        assert_eq!(report.app, AppId::Home);
        assert!(report.full_redraw);
        assert!(!rig.frame().full_redraw);
    }

    #[test]
    fn every_transition_forces_a_full_redraw() {
        let mut rig = Rig::new();
        rig.frame();

        let report = rig.click_at(Point::new(80, 64));
        assert_eq!(report.app, AppId::Launcher);
        assert!(report.full_redraw);

        let report = rig.click_at(Point::new(20, 25));
        assert_eq!(report.app, AppId::Calculator);
        assert!(report.full_redraw);

        let report = rig.long_press();
        assert_eq!(report.app, AppId::Home);
        assert!(report.full_redraw);
    }

    #[test]
    fn press_that_misses_changes_nothing() {
        let mut rig = Rig::new();
        rig.frame();
        rig.click_at(Point::new(80, 64));
        let report = rig.click_at(Point::new(80, DISPLAY_HEIGHT - 4));
        assert_eq!(report.app, AppId::Launcher);
        assert!(!report.full_redraw);
        assert_eq!(report.request, None);
    }

    #[test]
    fn opening_settings_requests_a_scan() {
        let mut rig = Rig::new();
        rig.frame();
        rig.click_at(Point::new(80, 64));
        let report = rig.click_at(Point::new(90, 80));
        assert_eq!(report.app, AppId::Settings);
        assert_eq!(report.request, Some(BlockingRequest::ScanNetworks));
        assert!(rig.console.scan_pending());

        let mut results = ScanResults::new();
        let mut ssid = crate::net::Ssid::new();
        let _ = ssid.push_str("home");
        let _ = results.push(NetworkEntry {
            ssid: ssid.clone(),
            rssi: -40,
            open: false,
        });
        rig.console.apply_event(
            &mut rig.hw,
            NetEvent::Link(NetworkStatus {
                connected: true,
                ssid,
                ..NetworkStatus::default()
            }),
            0,
        );
        rig.console.apply_scan_results(results);
        assert!(!rig.console.scan_pending());
        assert!(rig.frame().full_redraw);
        assert!(rig.canvas.count(COLOR_SELECTED) > 0);
    }

    #[test]
    fn web_message_overlays_until_expiry() {
        let mut rig = Rig::new();
        rig.frame();
        let mut text = WebMessage::new();
        let _ = text.push_str("hello");
        let _ = rig.inbox.events.push_back(NetEvent::Message(text));
        rig.frame();
        assert_eq!(rig.console.message(), Some("hello"));

        rig.hw.advance_ms(4_100);
        let report = rig.frame();
        assert_eq!(rig.console.message(), None);
        assert!(report.full_redraw);
    }

    #[test]
    fn beep_event_starts_a_tone() {
        let mut rig = Rig::new();
        rig.frame();
        let _ = rig.inbox.events.push_back(NetEvent::Beep);
        rig.frame();
        assert!(rig.console.audio_running());

        let toggles = rig.hw.toggles;
        rig.console.idle(&mut rig.hw, 10);
        assert!(rig.hw.toggles > toggles);
    }

    #[test]
    fn ui_cues_are_silent_at_default_volume() {
        let mut rig = Rig::new();
        rig.frame();
        rig.click_at(Point::new(80, 64));
        assert!(!rig.console.audio_running());
    }

    #[test]
    fn imu_failure_keeps_previous_orientation() {
        let mut rig = Rig::new();
        rig.frame();
        rig.frame();
        let before = *rig.console.orientation();
        rig.hw.imu_ok = false;
        rig.frame();
        assert_eq!(*rig.console.orientation(), before);
    }

    #[test]
    fn joystick_moves_the_cursor() {
        let mut rig = Rig::new();
        rig.frame();
        let start = rig.console.cursor();
        rig.hw.axes = (4000, 2048);
        rig.frame();
        assert!(rig.console.cursor().x > start.x);
        assert_eq!(rig.console.cursor().y, start.y);
    }

    #[test]
    fn calibration_persists_record() {
        let mut rig = Rig::new();
        let mut storage = MemoryStorage::default();
        rig.frame();
        assert!(!rig.console.is_calibrated());

        let result = rig
            .console
            .run_calibration(&mut rig.canvas, &mut rig.hw, &mut storage);
        assert_eq!(result, Ok(()));
        assert!(rig.console.is_calibrated());
        assert_eq!(rig.console.calibration().bias.gyro, [20.0, -10.0, 5.0]);
        let stored = crate::calibration::load_calibration(&mut storage);
        assert_eq!(stored.as_ref(), Some(rig.console.calibration()));
        assert!(rig.frame().full_redraw);
    }

    #[test]
    fn calibration_captures_raw_yaw_reference() {
        let mut rig = Rig::new();
        let mut storage = MemoryStorage::default();
        for _ in 0..10 {
            rig.frame();
        }
        let state = *rig.console.orientation();
        assert_ne!(state.yaw, state.yaw_filtered);

        let result = rig
            .console
            .run_calibration(&mut rig.canvas, &mut rig.hw, &mut storage);
        assert_eq!(result, Ok(()));
        assert_eq!(rig.console.calibration().reference.yaw, state.yaw);
        let stored = crate::calibration::load_calibration(&mut storage);
        assert_eq!(stored.map(|record| record.reference.yaw), Some(state.yaw));
    }

    #[test]
    fn failed_calibration_leaves_previous_record() {
        let mut rig = Rig::new();
        let mut storage = MemoryStorage::default();
        rig.hw.imu_ok = false;
        let result = rig
            .console
            .run_calibration(&mut rig.canvas, &mut rig.hw, &mut storage);
        assert_eq!(result, Err(CalibrationError::NoSamples));
        assert!(!rig.console.is_calibrated());
        assert!(storage.stored.is_none());
    }

    #[test]
    fn fps_counts_frames_per_window() {
        let mut fps = FpsCounter::new();
        for frame in 0..=30 {
            fps.frame(frame * 34);
        }
        // The window closes on the frame at 1020 ms.
        assert_eq!(fps.fps(), 31);
    }

    #[test]
    fn pacer_sleeps_the_remainder() {
        let pacer = FramePacer::new(60);
        assert_eq!(pacer.budget_ms(), 16);
        assert_eq!(pacer.sleep_for(10), 6);
        assert_eq!(pacer.sleep_for(40), 0);
        assert_eq!(FramePacer::new(0).budget_ms(), 1_000);
    }
}

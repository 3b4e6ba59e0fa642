//! Drawing helpers shared by the screens and the per-frame redraw decision.

use core::fmt::Write as _;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{
        Circle, CornerRadii, Line, PrimitiveStyle, Rectangle, RoundedRectangle, Triangle,
    },
};
use heapless::String;
use u8g2_fonts::{
    types::{FontColor, HorizontalAlignment, VerticalPosition},
    FontRenderer,
};

use crate::apps::AppId;
use crate::config::{
    COLOR_ACCENT, COLOR_BG, COLOR_CURSOR, COLOR_ERROR, COLOR_FG, COLOR_PANEL, COLOR_SUCCESS,
    CURSOR_SIZE, DISPLAY_HEIGHT, DISPLAY_WIDTH, OVERLAY_CHARS_PER_LINE, SMALL_FONT,
    STATUS_BAR_HEIGHT, WEB_MESSAGE_DURATION_MS,
};
use crate::net::{LocalTime, WebMessage};

const OVERLAY_WIDTH: i32 = 140;
const OVERLAY_HEIGHT: i32 = 50;

pub fn fill_rect<D>(display: &mut D, x: i32, y: i32, width: i32, height: i32, color: Rgb565)
where
    D: DrawTarget<Color = Rgb565>,
{
    if width <= 0 || height <= 0 {
        return;
    }
    let _ = Rectangle::new(Point::new(x, y), Size::new(width as u32, height as u32))
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(display);
}

pub fn stroke_rect<D>(display: &mut D, x: i32, y: i32, width: i32, height: i32, color: Rgb565)
where
    D: DrawTarget<Color = Rgb565>,
{
    if width <= 0 || height <= 0 {
        return;
    }
    let _ = Rectangle::new(Point::new(x, y), Size::new(width as u32, height as u32))
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(display);
}

pub fn round_rect<D>(
    display: &mut D,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    radius: u32,
    style: PrimitiveStyle<Rgb565>,
) where
    D: DrawTarget<Color = Rgb565>,
{
    if width <= 0 || height <= 0 {
        return;
    }
    let _ = RoundedRectangle::new(
        Rectangle::new(Point::new(x, y), Size::new(width as u32, height as u32)),
        CornerRadii::new(Size::new(radius, radius)),
    )
    .into_styled(style)
    .draw(display);
}

pub fn line<D>(display: &mut D, from: Point, to: Point, color: Rgb565)
where
    D: DrawTarget<Color = Rgb565>,
{
    let _ = Line::new(from, to)
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(display);
}

/// Circle of `radius` around `center`, covering `2 * radius + 1` pixels.
pub fn circle<D>(display: &mut D, center: Point, radius: i32, style: PrimitiveStyle<Rgb565>)
where
    D: DrawTarget<Color = Rgb565>,
{
    let diameter = (2 * radius.max(0) + 1) as u32;
    let _ = Circle::with_center(center, diameter)
        .into_styled(style)
        .draw(display);
}

pub fn fill_triangle<D>(display: &mut D, a: Point, b: Point, c: Point, color: Rgb565)
where
    D: DrawTarget<Color = Rgb565>,
{
    let _ = Triangle::new(a, b, c)
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(display);
}

/// Text with its top-left corner at `at`.
pub fn draw_text<D>(display: &mut D, font: &FontRenderer, text: &str, at: Point, color: Rgb565)
where
    D: DrawTarget<Color = Rgb565>,
{
    let _ = font.render(
        text,
        at,
        VerticalPosition::Top,
        FontColor::Transparent(color),
        display,
    );
}

pub fn draw_text_centered<D>(
    display: &mut D,
    font: &FontRenderer,
    text: &str,
    center: Point,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let _ = font.render_aligned(
        text,
        center,
        VerticalPosition::Center,
        HorizontalAlignment::Center,
        FontColor::Transparent(color),
        display,
    );
}

pub fn clear_content_area<D>(display: &mut D)
where
    D: DrawTarget<Color = Rgb565>,
{
    fill_rect(
        display,
        0,
        STATUS_BAR_HEIGHT,
        DISPLAY_WIDTH,
        DISPLAY_HEIGHT - STATUS_BAR_HEIGHT,
        COLOR_BG,
    );
}

/// Filled panel with an accent outline, the look shared by buttons and icons.
pub fn draw_button<D>(display: &mut D, x: i32, y: i32, width: i32, height: i32, label: &str)
where
    D: DrawTarget<Color = Rgb565>,
{
    fill_rect(display, x, y, width, height, COLOR_PANEL);
    round_rect(
        display,
        x,
        y,
        width,
        height,
        4,
        PrimitiveStyle::with_stroke(COLOR_ACCENT, 1),
    );
    draw_text_centered(
        display,
        &SMALL_FONT,
        label,
        Point::new(x + width / 2, y + height / 2),
        COLOR_FG,
    );
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusBarInfo {
    pub connected: bool,
    pub clock: Option<LocalTime>,
    pub uptime_s: u64,
    pub fps: u32,
}

pub fn status_time_text(info: &StatusBarInfo) -> String<16> {
    let mut out = String::new();
    match info.clock {
        Some(t) => {
            let _ = write!(out, "{:02}/{:02} {:02}:{:02}", t.day, t.month, t.hour, t.minute);
        }
        None => {
            let _ = write!(out, "U:{}s", info.uptime_s);
        }
    }
    out
}

pub fn draw_status_bar<D>(display: &mut D, info: &StatusBarInfo)
where
    D: DrawTarget<Color = Rgb565>,
{
    fill_rect(display, 0, 0, DISPLAY_WIDTH, STATUS_BAR_HEIGHT, COLOR_PANEL);

    let dot = Point::new(5, 5);
    if info.connected {
        circle(display, dot, 2, PrimitiveStyle::with_fill(COLOR_SUCCESS));
    } else {
        circle(display, dot, 2, PrimitiveStyle::with_stroke(COLOR_ERROR, 1));
    }

    draw_text(
        display,
        &SMALL_FONT,
        status_time_text(info).as_str(),
        Point::new(30, 1),
        COLOR_FG,
    );

    let mut fps = String::<12>::new();
    let _ = write!(fps, "FPS:{:2}", info.fps.min(99));
    draw_text(
        display,
        &SMALL_FONT,
        fps.as_str(),
        Point::new(DISPLAY_WIDTH - 46, 1),
        COLOR_FG,
    );
}

/// Rounded box in the middle of the screen, wrapped at a fixed character
/// count. Lines that do not fit the box are dropped.
pub fn draw_message_overlay<D>(display: &mut D, text: &str)
where
    D: DrawTarget<Color = Rgb565>,
{
    let x = (DISPLAY_WIDTH - OVERLAY_WIDTH) / 2;
    let y = (DISPLAY_HEIGHT - OVERLAY_HEIGHT) / 2;
    round_rect(
        display,
        x,
        y,
        OVERLAY_WIDTH,
        OVERLAY_HEIGHT,
        8,
        PrimitiveStyle::with_fill(COLOR_PANEL),
    );
    round_rect(
        display,
        x,
        y,
        OVERLAY_WIDTH,
        OVERLAY_HEIGHT,
        8,
        PrimitiveStyle::with_stroke(COLOR_ACCENT, 1),
    );
    draw_text(
        display,
        &SMALL_FONT,
        "Web Message:",
        Point::new(x + 10, y + 8),
        COLOR_ACCENT,
    );

    let mut line_y = y + 22;
    let mut chars = text.chars().peekable();
    while chars.peek().is_some() {
        let mut line = String::<{ OVERLAY_CHARS_PER_LINE * 4 }>::new();
        for ch in chars.by_ref().take(OVERLAY_CHARS_PER_LINE) {
            let _ = line.push(ch);
        }
        draw_text(display, &SMALL_FONT, line.as_str(), Point::new(x + 10, line_y), COLOR_FG);
        line_y += 10;
        if line_y > y + OVERLAY_HEIGHT - 10 {
            break;
        }
    }
}

pub fn cursor_in_bounds(at: Point) -> bool {
    let half = CURSOR_SIZE / 2;
    at.x >= half
        && at.y >= STATUS_BAR_HEIGHT + half
        && at.x < DISPLAY_WIDTH - half
        && at.y < DISPLAY_HEIGHT - half
}

fn draw_crosshair<D>(display: &mut D, at: Point, color: Rgb565, center: Rgb565)
where
    D: DrawTarget<Color = Rgb565>,
{
    line(
        display,
        Point::new(at.x - CURSOR_SIZE, at.y),
        Point::new(at.x + CURSOR_SIZE, at.y),
        color,
    );
    line(
        display,
        Point::new(at.x, at.y - CURSOR_SIZE),
        Point::new(at.x, at.y + CURSOR_SIZE),
        color,
    );
    let _ = Pixel(at, center).draw(display);
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ActiveMessage {
    text: WebMessage,
    expires_at_ms: u64,
}

/// Per-frame redraw bookkeeping: the full-redraw flag, the transient message
/// and where the cursor was last painted.
#[derive(Clone, Debug)]
pub struct RenderScheduler {
    full_redraw: bool,
    last_app: Option<AppId>,
    message: Option<ActiveMessage>,
    cursor_drawn: Option<Point>,
    status_drawn: Option<StatusBarInfo>,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    pub const fn new() -> Self {
        Self {
            full_redraw: true,
            last_app: None,
            message: None,
            cursor_drawn: None,
            status_drawn: None,
        }
    }

    pub fn request_full_redraw(&mut self) {
        self.full_redraw = true;
    }

    /// Records the current app; a change since the last frame forces a full
    /// redraw.
    pub fn observe_app(&mut self, current: AppId) {
        if self.last_app != Some(current) {
            self.full_redraw = true;
            self.last_app = Some(current);
        }
    }

    pub fn show_message(&mut self, text: WebMessage, now_ms: u64) {
        self.message = Some(ActiveMessage {
            text,
            expires_at_ms: now_ms + WEB_MESSAGE_DURATION_MS,
        });
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text.as_str())
    }

    /// Drops an expired message and schedules a repaint of what it covered.
    pub fn expire_message(&mut self, now_ms: u64) -> bool {
        match &self.message {
            Some(active) if now_ms > active.expires_at_ms => {
                self.message = None;
                self.full_redraw = true;
                log::debug!("render: message expired");
                true
            }
            _ => false,
        }
    }

    /// Clears the flag and reports whether this frame must repaint fully.
    pub fn take_full_redraw(&mut self) -> bool {
        let full = self.full_redraw;
        if full {
            self.full_redraw = false;
            self.cursor_drawn = None;
            self.status_drawn = None;
        }
        full
    }

    /// Repaints the status bar when its visible content changed.
    pub fn draw_status<D>(&mut self, display: &mut D, info: &StatusBarInfo)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.status_drawn.as_ref() == Some(info) {
            return;
        }
        let visible_change = match &self.status_drawn {
            Some(previous) => {
                previous.connected != info.connected
                    || previous.fps != info.fps
                    || status_time_text(previous) != status_time_text(info)
            }
            None => true,
        };
        if visible_change {
            draw_status_bar(display, info);
        }
        self.status_drawn = Some(info.clone());
    }

    pub fn draw_overlay<D>(&self, display: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if let Some(active) = &self.message {
            draw_message_overlay(display, active.text.as_str());
        }
    }

    /// Paints the crosshair only when the position changed since it was last
    /// drawn. Whatever the old crosshair covered is lost.
    pub fn draw_cursor<D>(&mut self, display: &mut D, at: Point)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.cursor_drawn == Some(at) {
            return;
        }
        if let Some(previous) = self.cursor_drawn {
            draw_crosshair(display, previous, COLOR_BG, COLOR_BG);
        }
        if cursor_in_bounds(at) {
            draw_crosshair(display, at, COLOR_CURSOR, COLOR_FG);
        }
        self.cursor_drawn = Some(at);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::TestCanvas;
    use super::*;

    fn message(text: &str) -> WebMessage {
        let mut out = WebMessage::new();
        let _ = out.push_str(text);
        out
    }

    #[test]
    fn app_change_forces_full_redraw_once() {
        let mut scheduler = RenderScheduler::new();
        scheduler.observe_app(AppId::Home);
        assert!(scheduler.take_full_redraw());
        scheduler.observe_app(AppId::Home);
        assert!(!scheduler.take_full_redraw());
        scheduler.observe_app(AppId::Launcher);
        assert!(scheduler.take_full_redraw());
        assert!(!scheduler.take_full_redraw());
    }

    #[test]
    fn message_expiry_requests_repaint() {
        let mut scheduler = RenderScheduler::new();
        let _ = scheduler.take_full_redraw();
        scheduler.show_message(message("hello"), 1_000);
        assert!(!scheduler.expire_message(5_000));
        assert_eq!(scheduler.message(), Some("hello"));
        assert!(scheduler.expire_message(5_001));
        assert_eq!(scheduler.message(), None);
        assert!(scheduler.take_full_redraw());
    }

    #[test]
    fn cursor_erases_old_crosshair_and_overwrites_content() {
        let mut canvas = TestCanvas::new();
        canvas.fill(COLOR_PANEL);
        let mut scheduler = RenderScheduler::new();

        scheduler.draw_cursor(&mut canvas, Point::new(50, 50));
        assert_eq!(canvas.at(50, 50), COLOR_FG);
        assert_eq!(canvas.at(53, 50), COLOR_CURSOR);

        let writes = canvas.writes;
        scheduler.draw_cursor(&mut canvas, Point::new(50, 50));
        assert_eq!(canvas.writes, writes);

        scheduler.draw_cursor(&mut canvas, Point::new(60, 50));
        // The covered panel pixels are not restored.
        assert_eq!(canvas.at(53, 50), COLOR_BG);
        assert_eq!(canvas.at(60, 50), COLOR_FG);
    }

    #[test]
    fn full_redraw_repaints_unmoved_cursor() {
        let mut canvas = TestCanvas::new();
        let mut scheduler = RenderScheduler::new();
        scheduler.draw_cursor(&mut canvas, Point::new(50, 50));

        scheduler.request_full_redraw();
        assert!(scheduler.take_full_redraw());
        canvas.fill(COLOR_BG);
        scheduler.draw_cursor(&mut canvas, Point::new(50, 50));
        assert_eq!(canvas.at(50, 50), COLOR_FG);
        assert_eq!(canvas.at(53, 50), COLOR_CURSOR);

        // No further repaint until it moves again.
        let writes = canvas.writes;
        scheduler.draw_cursor(&mut canvas, Point::new(50, 50));
        assert_eq!(canvas.writes, writes);
    }

    #[test]
    fn overlay_draws_box_on_top() {
        let mut canvas = TestCanvas::new();
        draw_message_overlay(&mut canvas, "abcdefghijklmnopqrstuvwxyz0123456789ABCD");
        assert_eq!(canvas.at(80, 39), COLOR_ACCENT);
        assert_eq!(canvas.at(12, 80), COLOR_PANEL);
    }

    #[test]
    fn status_text_switches_to_wall_clock_once_synced() {
        let mut info = StatusBarInfo {
            uptime_s: 42,
            ..StatusBarInfo::default()
        };
        assert_eq!(status_time_text(&info).as_str(), "U:42s");
        info.clock = Some(LocalTime {
            year: 2024,
            month: 3,
            day: 1,
            hour: 9,
            minute: 5,
            second: 0,
        });
        assert_eq!(status_time_text(&info).as_str(), "01/03 09:05");
    }

    #[test]
    fn status_bar_repaints_only_on_visible_change() {
        let mut canvas = TestCanvas::new();
        let mut scheduler = RenderScheduler::new();
        let _ = scheduler.take_full_redraw();
        let info = StatusBarInfo {
            connected: true,
            clock: None,
            uptime_s: 1,
            fps: 60,
        };
        scheduler.draw_status(&mut canvas, &info);
        let writes = canvas.writes;
        scheduler.draw_status(&mut canvas, &info);
        assert_eq!(canvas.writes, writes);
        assert_eq!(canvas.at(5, 5), COLOR_SUCCESS);
    }
}

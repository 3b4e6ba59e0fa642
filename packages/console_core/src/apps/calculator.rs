use core::fmt::Write as _;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*, primitives::PrimitiveStyle};
use heapless::String;

use super::{hit_rect, PressAction, Screen, ScreenContext};
use crate::config::{COLOR_FG, COLOR_PANEL, DISPLAY_WIDTH, SMALL_FONT, STATUS_BAR_HEIGHT};
use crate::render::{clear_content_area, draw_text, draw_text_centered, fill_rect, round_rect};

const DISPLAY_MAX: usize = 18;
const KEY_WIDTH: i32 = 32;
const KEY_HEIGHT: i32 = 13;
const KEY_GAP: i32 = 3;
const KEYS_X: i32 = 10;
const KEYS_Y: i32 = STATUS_BAR_HEIGHT + 26;
const EDIT_ROW_Y: i32 = KEYS_Y + 4 * (KEY_HEIGHT + KEY_GAP);
const CLEAR_WIDTH: i32 = KEY_WIDTH * 2 + KEY_GAP;
const BACKSPACE_X: i32 = KEYS_X + KEY_WIDTH * 2 + KEY_GAP * 2;

const KEYPAD: [char; 16] = [
    '7', '8', '9', '/', '4', '5', '6', '*', '1', '2', '3', '-', '0', '.', '=', '+',
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Digit(char),
    Point,
    Operator(char),
    Equals,
    Clear,
    Backspace,
}

/// Accumulator plus one pending operator. Pressing a second operator applies
/// the pending one first, so `2 + 3 *` shows 5 before the multiplication.
pub struct Calculator {
    display: String<DISPLAY_MAX>,
    accumulator: f64,
    pending: Option<char>,
    display_dirty: bool,
}

impl Calculator {
    pub fn new() -> Self {
        let mut display = String::new();
        let _ = display.push('0');
        Self {
            display,
            accumulator: 0.0,
            pending: None,
            display_dirty: false,
        }
    }

    pub fn display(&self) -> &str {
        self.display.as_str()
    }

    pub fn press(&mut self, key: Key) {
        match key {
            Key::Digit(digit) => {
                if self.display == "0" {
                    self.display.clear();
                }
                if self.display.len() < DISPLAY_MAX {
                    let _ = self.display.push(digit);
                }
            }
            Key::Point => {
                if !self.display.contains('.') && self.display.len() < DISPLAY_MAX {
                    let _ = self.display.push('.');
                }
            }
            Key::Operator(op) => {
                if self.pending.is_some() {
                    self.resolve();
                }
                self.accumulator = self.value();
                self.pending = Some(op);
                self.set_display("0");
            }
            Key::Equals => {
                if self.pending.is_some() {
                    self.resolve();
                }
            }
            Key::Clear => {
                self.accumulator = 0.0;
                self.pending = None;
                self.set_display("0");
            }
            Key::Backspace => {
                self.display.pop();
                if self.display.is_empty() || self.display == "-" {
                    self.set_display("0");
                }
            }
        }
        self.display_dirty = true;
    }

    fn value(&self) -> f64 {
        self.display.parse::<f64>().unwrap_or(0.0)
    }

    fn resolve(&mut self) {
        let operand = self.value();
        let result = match self.pending.take() {
            Some('+') => self.accumulator + operand,
            Some('-') => self.accumulator - operand,
            Some('*') => self.accumulator * operand,
            Some('/') if operand != 0.0 => self.accumulator / operand,
            Some('/') => 0.0,
            _ => operand,
        };
        self.display = format_general(result);
    }

    fn set_display(&mut self, text: &str) {
        self.display.clear();
        let _ = self.display.push_str(text);
    }

    fn key_at(cursor: Point) -> Option<Key> {
        for (index, &label) in KEYPAD.iter().enumerate() {
            let (x, y) = key_origin(index);
            if hit_rect(cursor, x, y, KEY_WIDTH, KEY_HEIGHT) {
                return Some(match label {
                    '=' => Key::Equals,
                    '.' => Key::Point,
                    '+' | '-' | '*' | '/' => Key::Operator(label),
                    digit => Key::Digit(digit),
                });
            }
        }
        if hit_rect(cursor, KEYS_X, EDIT_ROW_Y, CLEAR_WIDTH, KEY_HEIGHT) {
            return Some(Key::Clear);
        }
        if hit_rect(cursor, BACKSPACE_X, EDIT_ROW_Y, KEY_WIDTH * 2, KEY_HEIGHT) {
            return Some(Key::Backspace);
        }
        None
    }

    fn draw_readout<D>(&self, display: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill_rect(
            display,
            8,
            STATUS_BAR_HEIGHT + 6,
            DISPLAY_WIDTH - 16,
            18,
            COLOR_PANEL,
        );
        draw_text(
            display,
            &SMALL_FONT,
            self.display.as_str(),
            Point::new(12, STATUS_BAR_HEIGHT + 10),
            COLOR_FG,
        );
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

fn key_origin(index: usize) -> (i32, i32) {
    let row = (index / 4) as i32;
    let col = (index % 4) as i32;
    (
        KEYS_X + col * (KEY_WIDTH + KEY_GAP),
        KEYS_Y + row * (KEY_HEIGHT + KEY_GAP),
    )
}

fn draw_key<D>(display: &mut D, x: i32, y: i32, width: i32, label: &str)
where
    D: DrawTarget<Color = Rgb565>,
{
    round_rect(
        display,
        x,
        y,
        width,
        KEY_HEIGHT,
        3,
        PrimitiveStyle::with_fill(COLOR_PANEL),
    );
    draw_text_centered(
        display,
        &SMALL_FONT,
        label,
        Point::new(x + width / 2, y + KEY_HEIGHT / 2),
        COLOR_FG,
    );
}

impl Screen for Calculator {
    fn full_render<D>(&mut self, display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        self.draw_readout(display);
        let mut label = [0u8; 4];
        for (index, key) in KEYPAD.iter().enumerate() {
            let (x, y) = key_origin(index);
            draw_key(display, x, y, KEY_WIDTH, key.encode_utf8(&mut label));
        }
        draw_key(display, KEYS_X, EDIT_ROW_Y, CLEAR_WIDTH, "C");
        draw_key(display, BACKSPACE_X, EDIT_ROW_Y, KEY_WIDTH * 2, "<");
        self.display_dirty = false;
    }

    fn incremental_update<D>(&mut self, display: &mut D, _ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.display_dirty {
            self.draw_readout(display);
            self.display_dirty = false;
        }
    }

    fn on_press(&mut self, cursor: Point, _ctx: &ScreenContext<'_>) -> PressAction {
        match Self::key_at(cursor) {
            Some(key) => {
                self.press(key);
                PressAction::Handled
            }
            None => PressAction::Ignored,
        }
    }
}

/// `%g`-style rendering: six significant digits, trailing zeros trimmed,
/// exponent form outside 1e-4..1e6.
pub fn format_general(value: f64) -> String<DISPLAY_MAX> {
    let mut out = String::new();
    if value == 0.0 || !value.is_finite() {
        let _ = out.push('0');
        return out;
    }

    let magnitude = if value < 0.0 { -value } else { value };
    let (mut mantissa, mut exponent) = split_decimal(magnitude);
    // Rounding to six digits can carry into the next decade.
    if mantissa + 5e-6 >= 10.0 {
        mantissa /= 10.0;
        exponent += 1;
    }

    let mut body = String::<32>::new();
    if (-4..6).contains(&exponent) {
        let decimals = (5 - exponent).max(0) as usize;
        let _ = write!(body, "{:.*}", decimals, magnitude);
        trim_fraction(&mut body);
    } else {
        let _ = write!(body, "{:.5}", mantissa);
        trim_fraction(&mut body);
        let sign = if exponent < 0 { '-' } else { '+' };
        let _ = write!(body, "e{}{:02}", sign, exponent.abs());
    }

    if value < 0.0 {
        let _ = out.push('-');
    }
    for ch in body.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// `value = mantissa * 10^exponent` with mantissa in [1, 10).
fn split_decimal(mut value: f64) -> (f64, i32) {
    let mut exponent = 0;
    while value >= 10.0 {
        value /= 10.0;
        exponent += 1;
    }
    while value < 1.0 {
        value *= 10.0;
        exponent -= 1;
    }
    (value, exponent)
}

fn trim_fraction<const N: usize>(text: &mut String<N>) {
    if !text.contains('.') {
        return;
    }
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(keys: &[Key]) -> Calculator {
        let mut calc = Calculator::new();
        for &key in keys {
            calc.press(key);
        }
        calc
    }

    #[test]
    fn addition() {
        let calc = run(&[
            Key::Digit('7'),
            Key::Operator('+'),
            Key::Digit('3'),
            Key::Equals,
        ]);
        assert_eq!(calc.display(), "10");
    }

    #[test]
    fn division_by_zero_is_zero() {
        let calc = run(&[
            Key::Digit('5'),
            Key::Operator('/'),
            Key::Digit('0'),
            Key::Equals,
        ]);
        assert_eq!(calc.display(), "0");
    }

    #[test]
    fn pending_operator_chains() {
        let calc = run(&[
            Key::Digit('2'),
            Key::Operator('+'),
            Key::Digit('3'),
            Key::Operator('*'),
            Key::Digit('4'),
            Key::Equals,
        ]);
        assert_eq!(calc.display(), "20");
    }

    #[test]
    fn clear_and_backspace() {
        let mut calc = run(&[Key::Digit('1'), Key::Digit('2'), Key::Digit('3')]);
        calc.press(Key::Backspace);
        assert_eq!(calc.display(), "12");
        calc.press(Key::Backspace);
        calc.press(Key::Backspace);
        assert_eq!(calc.display(), "0");
        calc.press(Key::Digit('9'));
        calc.press(Key::Operator('-'));
        calc.press(Key::Clear);
        calc.press(Key::Equals);
        assert_eq!(calc.display(), "0");
    }

    #[test]
    fn entry_is_capped() {
        let mut calc = Calculator::new();
        for _ in 0..25 {
            calc.press(Key::Digit('9'));
        }
        assert_eq!(calc.display().len(), DISPLAY_MAX);
        calc.press(Key::Point);
        calc.press(Key::Point);
        assert_eq!(calc.display().len(), DISPLAY_MAX);
    }

    #[test]
    fn general_format() {
        assert_eq!(format_general(2.5).as_str(), "2.5");
        assert_eq!(format_general(10.0 / 3.0).as_str(), "3.33333");
        assert_eq!(format_general(-42.0).as_str(), "-42");
        assert_eq!(format_general(1_234_567.0).as_str(), "1.23457e+06");
        assert_eq!(format_general(0.00001).as_str(), "1e-05");
    }

    #[test]
    fn keypad_hit_testing() {
        assert_eq!(Calculator::key_at(Point::new(12, KEYS_Y + 2)), Some(Key::Digit('7')));
        assert_eq!(
            Calculator::key_at(Point::new(KEYS_X + 3 * 35 + 1, KEYS_Y + 3 * 16 + 1)),
            Some(Key::Operator('+'))
        );
        assert_eq!(Calculator::key_at(Point::new(12, EDIT_ROW_Y + 2)), Some(Key::Clear));
        assert_eq!(
            Calculator::key_at(Point::new(BACKSPACE_X + 40, EDIT_ROW_Y + 2)),
            Some(Key::Backspace)
        );
    }
}

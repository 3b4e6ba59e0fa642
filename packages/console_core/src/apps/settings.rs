use core::fmt::Write as _;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*, primitives::PrimitiveStyle};
use heapless::String;

use super::{PressAction, Screen, ScreenContext};
use crate::config::{
    COLOR_ACCENT, COLOR_BG, COLOR_FG, COLOR_SELECTED, DISPLAY_HEIGHT, DISPLAY_WIDTH, SMALL_FONT,
    STATUS_BAR_HEIGHT,
};
use crate::render::{clear_content_area, draw_text, round_rect};

const VISIBLE_NETWORKS: usize = 4;
const LIST_Y: i32 = STATUS_BAR_HEIGHT + 44;
const ROW_HEIGHT: i32 = 18;

/// WiFi scan results; any press asks for a fresh scan.
pub struct SettingsScreen;

impl Screen for SettingsScreen {
    fn full_render<D>(&mut self, display: &mut D, ctx: &ScreenContext<'_>)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        clear_content_area(display);
        draw_text(
            display,
            &SMALL_FONT,
            "Settings",
            Point::new(10, STATUS_BAR_HEIGHT + 10),
            COLOR_ACCENT,
        );
        draw_text(
            display,
            &SMALL_FONT,
            "WiFi Networks:",
            Point::new(10, STATUS_BAR_HEIGHT + 26),
            COLOR_FG,
        );

        if ctx.scan_pending {
            draw_text(
                display,
                &SMALL_FONT,
                "Scanning...",
                Point::new(10, LIST_Y),
                COLOR_FG,
            );
        } else if ctx.networks.is_empty() {
            draw_text(
                display,
                &SMALL_FONT,
                "No networks found",
                Point::new(10, LIST_Y),
                COLOR_FG,
            );
        } else {
            for (index, network) in ctx.networks.iter().take(VISIBLE_NETWORKS).enumerate() {
                let y = LIST_Y + index as i32 * ROW_HEIGHT;
                let current = ctx.network.connected && ctx.network.ssid == network.ssid;
                let text_color = if current {
                    round_rect(
                        display,
                        8,
                        y,
                        DISPLAY_WIDTH - 16,
                        16,
                        3,
                        PrimitiveStyle::with_fill(COLOR_SELECTED),
                    );
                    COLOR_BG
                } else {
                    COLOR_FG
                };

                draw_text(
                    display,
                    &SMALL_FONT,
                    network.ssid.as_str(),
                    Point::new(12, y + 3),
                    text_color,
                );
                let mut rssi = String::<8>::new();
                let _ = write!(rssi, "{}", network.rssi);
                draw_text(
                    display,
                    &SMALL_FONT,
                    rssi.as_str(),
                    Point::new(DISPLAY_WIDTH - 34, y + 3),
                    text_color,
                );
            }
        }

        draw_text(
            display,
            &SMALL_FONT,
            "Press to rescan",
            Point::new(10, DISPLAY_HEIGHT - 10),
            COLOR_FG,
        );
    }

    fn on_press(&mut self, _cursor: Point, _ctx: &ScreenContext<'_>) -> PressAction {
        PressAction::Scan
    }
}

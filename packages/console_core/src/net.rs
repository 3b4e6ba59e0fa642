//! Request/response codecs shared by the firmware's network producers and
//! the frame loop that consumes their events.

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::config::WEB_MESSAGE_MAX_CHARS;

pub const SSID_MAX: usize = 32;
pub const SCAN_RESULTS_MAX: usize = 16;
pub const STATUS_JSON_MAX: usize = 192;
/// Room for the character limit in multi-byte UTF-8.
pub const WEB_MESSAGE_BYTES: usize = WEB_MESSAGE_MAX_CHARS * 4;

pub const SNTP_PACKET_LEN: usize = 48;
const NTP_UNIX_OFFSET_S: u64 = 2_208_988_800;
/// Anything earlier means the server handed back garbage.
const MIN_PLAUSIBLE_UNIX_S: u64 = 1_600_000_000;

pub type WebMessage = String<WEB_MESSAGE_BYTES>;
pub type Ssid = String<SSID_MAX>;
pub type IpText = String<16>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkStatus {
    pub connected: bool,
    pub ssid: Ssid,
    pub ip: IpText,
    pub rssi: i8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkEntry {
    pub ssid: Ssid,
    pub rssi: i8,
    pub open: bool,
}

pub type ScanResults = Vec<NetworkEntry, SCAN_RESULTS_MAX>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeatherReport {
    pub temperature: String<8>,
    pub condition: String<24>,
}

impl Default for WeatherReport {
    fn default() -> Self {
        let mut temperature = String::new();
        let _ = temperature.push_str("--\u{b0}C");
        let mut condition = String::new();
        let _ = condition.push_str("N/A");
        Self {
            temperature,
            condition,
        }
    }
}

/// Produced by network tasks, drained by the frame loop once per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum NetEvent {
    Beep,
    Message(WebMessage),
    TimeSync { unix_seconds: u64 },
    Weather(WeatherReport),
    ScanResults(ScanResults),
    Link(NetworkStatus),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryError {
    MissingText,
    BadEncoding,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    StatusPage,
    Api,
    Beep,
    Message(WebMessage),
    BadRequest(QueryError),
    NotFound,
}

pub fn route(method: &str, target: &str) -> Route {
    if method != "GET" {
        return Route::NotFound;
    }
    match target_path(target) {
        "/" => Route::StatusPage,
        "/api" => Route::Api,
        "/beep" => Route::Beep,
        "/message" => match parse_text_query(target) {
            Ok(message) => Route::Message(message),
            Err(err) => Route::BadRequest(err),
        },
        _ => Route::NotFound,
    }
}

pub fn target_path(target: &str) -> &str {
    target.split('?').next().unwrap_or(target)
}

/// Extracts `text=` from the query, percent-decoded and cut to the on-screen
/// limit. An empty value counts as missing.
pub fn parse_text_query(target: &str) -> Result<WebMessage, QueryError> {
    let (_, query) = target.split_once('?').ok_or(QueryError::MissingText)?;
    let encoded = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("text="))
        .ok_or(QueryError::MissingText)?;

    let mut raw: Vec<u8, WEB_MESSAGE_BYTES> = Vec::new();
    let bytes = encoded.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let decoded = match bytes[i] {
            b'%' => {
                if i + 2 >= bytes.len() {
                    return Err(QueryError::BadEncoding);
                }
                let hi = decode_hex(bytes[i + 1]).ok_or(QueryError::BadEncoding)?;
                let lo = decode_hex(bytes[i + 2]).ok_or(QueryError::BadEncoding)?;
                i += 3;
                (hi << 4) | lo
            }
            b'+' => {
                i += 1;
                b' '
            }
            other => {
                i += 1;
                other
            }
        };
        if raw.push(decoded).is_err() {
            break;
        }
    }

    let text = utf8_prefix(&raw);
    if text.is_empty() {
        return Err(QueryError::MissingText);
    }

    let mut message = WebMessage::new();
    for ch in text.chars().take(WEB_MESSAGE_MAX_CHARS) {
        if message.push(ch).is_err() {
            break;
        }
    }
    Ok(message)
}

fn utf8_prefix(raw: &[u8]) -> &str {
    match core::str::from_utf8(raw) {
        Ok(text) => text,
        Err(err) => core::str::from_utf8(&raw[..err.valid_up_to()]).unwrap_or(""),
    }
}

fn decode_hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(10 + (b - b'a')),
        b'A'..=b'F' => Some(10 + (b - b'A')),
        _ => None,
    }
}

/// Pulls `"temp":<n>` and `"main":"<s>"` out of an OpenWeather payload
/// without a JSON parser. The temperature is truncated to whole degrees.
pub fn parse_weather(payload: &str) -> Option<WeatherReport> {
    let temp_start = payload.find("\"temp\":")? + "\"temp\":".len();
    let temp_tail = &payload[temp_start..];
    let temp_end = temp_tail.find([',', '}']).unwrap_or(temp_tail.len());
    let degrees = temp_tail[..temp_end].trim().parse::<f32>().ok()? as i32;

    let main_start = payload.find("\"main\":\"")? + "\"main\":\"".len();
    let main_tail = &payload[main_start..];
    let main_end = main_tail.find('"')?;

    let mut report = WeatherReport {
        temperature: String::new(),
        condition: String::new(),
    };
    write!(report.temperature, "{} C", degrees).ok()?;
    for ch in main_tail[..main_end].chars() {
        if report.condition.push(ch).is_err() {
            break;
        }
    }
    Some(report)
}

/// Client-mode SNTP request.
pub fn sntp_request() -> [u8; SNTP_PACKET_LEN] {
    let mut packet = [0u8; SNTP_PACKET_LEN];
    // LI 0, version 4, mode 3 (client).
    packet[0] = 0x23;
    packet
}

/// Transmit timestamp seconds as Unix time.
pub fn parse_sntp_response(packet: &[u8]) -> Option<u64> {
    if packet.len() < SNTP_PACKET_LEN {
        return None;
    }
    let mode = packet[0] & 0x07;
    if mode != 4 && mode != 5 {
        return None;
    }
    let ntp_seconds = u64::from(u32::from_be_bytes([
        packet[40], packet[41], packet[42], packet[43],
    ]));
    let unix = ntp_seconds.checked_sub(NTP_UNIX_OFFSET_S)?;
    (unix >= MIN_PLAUSIBLE_UNIX_S).then_some(unix)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Local wall clock anchored to the monotonic millisecond clock at sync.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WallClock {
    anchor: Option<(u64, u64)>,
}

impl WallClock {
    pub const fn new() -> Self {
        Self { anchor: None }
    }

    pub fn sync(&mut self, unix_seconds: u64, tz_offset_seconds: i32, now_ms: u64) {
        let local = (unix_seconds as i64 + i64::from(tz_offset_seconds)).max(0) as u64;
        self.anchor = Some((local, now_ms));
    }

    pub fn local_seconds(&self, now_ms: u64) -> Option<u64> {
        let (local, at_ms) = self.anchor?;
        Some(local + now_ms.saturating_sub(at_ms) / 1_000)
    }

    pub fn now(&self, now_ms: u64) -> Option<LocalTime> {
        self.local_seconds(now_ms).map(local_time_from_seconds)
    }
}

pub fn local_time_from_seconds(seconds: u64) -> LocalTime {
    let days = (seconds / 86_400) as i64;
    let rem = seconds % 86_400;
    let (year, month, day) = civil_from_days(days);
    LocalTime {
        year,
        month,
        day,
        hour: (rem / 3_600) as u8,
        minute: ((rem / 60) % 60) as u8,
        second: (rem % 60) as u8,
    }
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year as i32, month, day)
}

/// What `/api` reports; filtered angles only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusSnapshot {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
    pub network: NetworkStatus,
}

pub fn format_status_json(snapshot: &StatusSnapshot) -> String<STATUS_JSON_MAX> {
    let mut out = String::new();
    let _ = write!(
        out,
        "{{\"pitch\":{:.1},\"roll\":{:.1},\"yaw\":{:.1},\"ssid\":\"",
        snapshot.pitch, snapshot.roll, snapshot.yaw
    );
    for ch in snapshot.network.ssid.chars() {
        let _ = match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => Ok(()),
            c => out.push(c).map_err(|_| ()),
        };
    }
    let _ = write!(
        out,
        "\",\"ip\":\"{}\",\"rssi\":{}}}",
        snapshot.network.ip, snapshot.network.rssi
    );
    out
}

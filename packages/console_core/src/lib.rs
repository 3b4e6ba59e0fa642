#![cfg_attr(not(test), no_std)]

pub mod apps;
pub mod audio;
pub mod calibration;
pub mod config;
pub mod frame;
pub mod hal;
pub mod input;
pub mod net;
pub mod orientation;
pub mod render;

pub use apps::AppId;
pub use config::ConsoleSettings;
pub use frame::{BlockingRequest, Console, FrameReport};

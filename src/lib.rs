#![cfg_attr(not(test), no_std)]

pub mod blacklist;
pub mod catalog;
pub mod config;
pub mod disallow;
pub mod dispatcher;
pub mod link;
pub mod matcher;
pub mod profiles;
pub mod radio;
pub mod selector;
pub mod telemetry;
pub mod types;

pub use config::ConnPolicy;
pub use dispatcher::{DispatchReport, EventDispatcher};
pub use link::{LinkSnapshot, LinkState, Notification};
pub use profiles::{ProfileStore, ProfileTable};
pub use radio::{RadioInterface, RecordingRadio};
pub use types::{Bssid, DriverEvent, RadioCommand, Ssid};

#![forbid(unsafe_code)]

pub mod enums;
pub mod model;
pub mod time;

pub use enums::{PersistedEnum, StoredCase, UnknownEnumValue, decode, encode};
pub use time::Clock;

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                    |
//! |------------|--------------------|--------------------------------|
//! | `hardware` | GasSensorPort      | SCD4x over I2C                 |
//! |            | HardwareClockPort  | DS3231 over I2C                |
//! | `time`     | SystemClockPort    | libc wall clock / esp_timer    |
//! | `log_sink` | EventSink          | Serial log output              |
//! | `wifi`     |                    | ESP-IDF soft AP                |
//! | `http`     |                    | ESP-IDF HTTP server → `api`    |

pub mod hardware;
#[cfg(feature = "espidf")]
pub mod http;
pub mod log_sink;
pub mod time;
pub mod wifi;

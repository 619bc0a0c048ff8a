pub mod clock;
pub mod config;
pub mod error;
pub mod observability;
pub mod window;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{
    ConfigError, LoggingConfig, PaginationConfig, RecordStoreConfig, TimeWindowConfig,
};
pub use error::{CoreError, Result};
pub use window::{DayEnd, Period, TimeWindow, format_timestamp, parse_timestamp, to_utc};

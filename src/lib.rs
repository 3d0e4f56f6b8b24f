pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{
    calendar_builder::{build, CalendarBuilder, TimetableInput},
    etl::EtlEngine,
    fetcher::TimetableFetcher,
    pipeline::{TimetablePipeline, TimetableSource},
};
pub use domain::model::{Calendar, CalendarEvent, ClassSession, DateRange, Timetable};
pub use utils::error::{EtlError, Result};

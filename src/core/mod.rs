pub mod calendar_builder;
pub mod etl;
pub mod fetcher;
pub mod ics;
pub mod pipeline;
pub mod weekday;

pub use crate::domain::model::{Calendar, Timetable};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

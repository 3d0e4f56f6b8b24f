use crate::core::calendar_builder::{CalendarBuilder, TimetableInput};
use crate::core::fetcher::TimetableFetcher;
use crate::core::ics;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{Calendar, DateRange, Timetable};
use crate::utils::error::{EtlError, Result};

/// Where the timetable comes from.
#[derive(Clone)]
pub enum TimetableSource {
    Remote { student_id: String, password: String },
    SavedJson { path: String },
}

pub struct TimetablePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    source: TimetableSource,
    range: DateRange,
    fetcher: TimetableFetcher,
    builder: CalendarBuilder,
    dump_path: Option<String>,
}

impl<S: Storage, C: ConfigProvider> TimetablePipeline<S, C> {
    pub fn new(storage: S, config: C, source: TimetableSource, range: DateRange) -> Result<Self> {
        let fetcher = TimetableFetcher::from_config(&config)?;
        let builder = CalendarBuilder::new(config.product_id(), config.tzid());
        Ok(Self {
            storage,
            config,
            source,
            range,
            fetcher,
            builder,
            dump_path: None,
        })
    }

    /// Saves the raw timetable JSON after a remote fetch.
    pub fn with_dump_path(mut self, dump_path: Option<String>) -> Self {
        self.dump_path = dump_path;
        self
    }

    pub fn with_builder(mut self, builder: CalendarBuilder) -> Self {
        self.builder = builder;
        self
    }

    async fn dump_timetable(&self, timetable: &Timetable) -> Result<()> {
        if let Some(path) = &self.dump_path {
            let json = serde_json::to_vec_pretty(timetable)?;
            self.storage.write_file(path, &json).await?;
            tracing::info!("Saved raw timetable to {}", path);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for TimetablePipeline<S, C> {
    async fn extract(&self) -> Result<Timetable> {
        match &self.source {
            TimetableSource::Remote {
                student_id,
                password,
            } => {
                tracing::debug!("Fetching timetable for student {}", student_id);
                let timetable = self.fetcher.fetch(student_id, password).await?;
                if timetable.is_empty() {
                    return Err(EtlError::EmptyTimetableError);
                }
                self.dump_timetable(&timetable).await?;
                Ok(timetable)
            }
            TimetableSource::SavedJson { path } => {
                tracing::debug!("Reading saved timetable from {}", path);
                let data = self.storage.read_file(path).await?;
                TimetableInput::from_reader(std::io::Cursor::new(data)).into_timetable()
            }
        }
    }

    async fn transform(&self, timetable: Timetable) -> Result<Calendar> {
        self.builder.build_calendar(timetable, self.range)
    }

    async fn load(&self, calendar: Calendar) -> Result<String> {
        let filename = self.config.output_filename();
        let data = ics::to_ics_bytes(&calendar);

        tracing::debug!("Writing {} bytes to {}", data.len(), filename);
        self.storage.write_file(filename, &data).await?;

        Ok(format!("{}/{}", self.config.output_path(), filename))
    }
}

pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::TomlConfig;
#[cfg(feature = "cli")]
use crate::core::pipeline::TimetableSource;
#[cfg(feature = "cli")]
use crate::domain::model::DateRange;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use chrono::NaiveDate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::Path;

#[cfg(feature = "cli")]
#[derive(Clone, Parser)]
#[command(name = "mmu-ics")]
#[command(about = "Export an MMU class timetable as an iCalendar file")]
pub struct CliConfig {
    #[arg(long, env = "MMU_STUDENT_ID", help = "Student ID used to log in")]
    pub student_id: Option<String>,

    #[arg(long, env = "MMU_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, help = "First date of the calendar (YYYY-MM-DD)")]
    pub start: NaiveDate,

    #[arg(long, help = "Last date of the calendar (YYYY-MM-DD)")]
    pub stop: NaiveDate,

    #[arg(long, help = "Build from a saved timetable JSON file instead of logging in")]
    pub timetable_json: Option<String>,

    #[arg(long, help = "Also save the fetched timetable JSON to this file")]
    pub dump_json: Option<String>,

    #[arg(short, long, help = "Path to a TOML settings file")]
    pub config: Option<String>,

    #[arg(long, help = "Directory the calendar is written to")]
    pub output_path: Option<String>,

    #[arg(long, help = "Calendar file name")]
    pub output_filename: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("student_id", &self.student_id)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("start", &self.start)
            .field("stop", &self.stop)
            .field("timetable_json", &self.timetable_json)
            .field("dump_json", &self.dump_json)
            .field("config", &self.config)
            .field("output_path", &self.output_path)
            .field("output_filename", &self.output_filename)
            .finish()
    }
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the settings file (or defaults) and applies command line overrides.
    pub fn settings(&self) -> Result<TomlConfig> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(output_path) = &self.output_path {
            settings.output.path = output_path.clone();
        }
        if let Some(output_filename) = &self.output_filename {
            settings.output.filename = output_filename.clone();
        }

        Ok(settings)
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start, self.stop)
    }

    pub fn source(&self) -> Result<TimetableSource> {
        if let Some(path) = &self.timetable_json {
            return Ok(TimetableSource::SavedJson {
                path: absolute_path(path),
            });
        }

        let student_id = validation::validate_required_field("student_id", &self.student_id)?;
        let password = validation::validate_required_field("password", &self.password)?;
        Ok(TimetableSource::Remote {
            student_id: student_id.clone(),
            password: password.clone(),
        })
    }

    pub fn dump_path(&self) -> Option<String> {
        self.dump_json.as_deref().map(absolute_path)
    }
}

/// Relative paths are taken from the working directory, not the output directory.
#[cfg(feature = "cli")]
fn absolute_path(path: &str) -> String {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_string_lossy().into_owned();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_date_range(self.start, self.stop)?;

        match &self.timetable_json {
            Some(path) => validation::validate_path("timetable_json", path)?,
            None => {
                let student_id =
                    validation::validate_required_field("student_id", &self.student_id)?;
                validation::validate_non_empty_string("student_id", student_id)?;
                validation::validate_required_field("password", &self.password)?;
            }
        }

        if let Some(path) = &self.dump_json {
            validation::validate_path("dump_json", path)?;
        }
        if let Some(filename) = &self.output_filename {
            validation::validate_file_name("output_filename", filename)?;
        }

        Ok(())
    }
}

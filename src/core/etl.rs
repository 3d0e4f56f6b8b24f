use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting timetable export...");

        tracing::info!("Retrieving timetable...");
        let timetable = self.pipeline.extract().await?;
        tracing::info!(
            "Retrieved {} class sessions in {} day groups",
            timetable.session_count(),
            timetable.days.len()
        );

        tracing::info!("Building calendar...");
        let calendar = self.pipeline.transform(timetable).await?;
        tracing::info!("Built {} weekly events", calendar.events.len());

        tracing::info!("Writing calendar...");
        let output_path = self.pipeline.load(calendar).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}

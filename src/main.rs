use clap::Parser;
use mmu_ics::utils::error::ErrorSeverity;
use mmu_ics::utils::{logger, validation::Validate};
use mmu_ics::{CliConfig, EtlEngine, EtlError, LocalStorage, TimetablePipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose, config.log_json);

    tracing::info!("Starting mmu-ics");
    tracing::debug!("CLI config: {:?}", config);

    let settings = match config.validate().and_then(|_| config.settings()) {
        Ok(settings) => settings,
        Err(e) => exit_with(e),
    };
    if let Err(e) = settings.validate() {
        exit_with(e);
    }

    let source = match config.source() {
        Ok(source) => source,
        Err(e) => exit_with(e),
    };

    let storage = LocalStorage::new(settings.output.path.clone());
    let pipeline = match TimetablePipeline::new(storage, settings, source, config.date_range()) {
        Ok(pipeline) => pipeline.with_dump_path(config.dump_path()),
        Err(e) => exit_with(e),
    };

    let engine = EtlEngine::new(pipeline);
    match engine.run().await {
        Ok(output_path) => {
            println!("Exported as {}", output_path);
            Ok(())
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: EtlError) -> ! {
    tracing::error!(
        "Export failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

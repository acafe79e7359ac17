//! Text and JSON output formatting for CLI commands.

use serde::Serialize;

use questhub_worker::RunReport;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable key/value lines
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Print a single item as pretty JSON
pub fn print_json<T: Serialize>(item: &T) {
    let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
    println!("{}", json);
}

/// Print a run report in the selected format
pub fn print_report(report: &RunReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(report);
        return;
    }

    if report.is_completed() {
        print_success(&format!("Pipeline '{}' completed", report.pipeline));
    } else {
        print_error(&format!("Pipeline '{}' {}", report.pipeline, report.status));
    }
    print_kv("Run", &report.run_id.to_string());
    print_kv("Duration", &format!("{} ms", report.duration.as_millis()));
    print_kv("Users notified", &report.fanned_out.to_string());
    if let Some(error) = &report.error {
        print_kv("Error", error);
    }

    for stage in &report.stages {
        println!();
        println!("  Stage {} ({:?})", stage.stage, stage.status);
        print_kv("Chunks", &stage.chunks.to_string());
        print_kv("Read", &stage.read_count.to_string());
        print_kv("Written", &stage.write_count.to_string());
        print_kv("Filtered", &stage.filter_count.to_string());
        print_kv(
            "Retries",
            &format!(
                "{} transform, {} persist",
                stage.transform_retries, stage.persist_retries
            ),
        );
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}

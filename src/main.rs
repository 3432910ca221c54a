//! Curriculum Enricher
//!
//! Audits the 30-day curriculum and enriches its day records in place.

// Use the library crate for all modules
use curriculum_enricher::cli;

fn main() -> anyhow::Result<()> {
    // Initialize logging (WARN level by default, use RUST_LOG=info for phase logs)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into())
        )
        .init();

    // Run CLI
    cli::run()
}

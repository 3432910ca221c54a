//! CLI interface for curriculum-enricher

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::audit::{AuditResults, Auditor, DrillGenerator};
use crate::config::{self, EngineConfig};
use crate::curriculum::{StageModel, UnitRegistry};
use crate::enrich::{DayStore, EnrichmentPipeline, PipelineOptions};
use crate::report::{AuditReport, Manifest};
use crate::taxonomy::TechniqueTaxonomy;

#[derive(Parser)]
#[command(name = "curriculum-enricher")]
#[command(about = "Stage alignment, technique coverage and drill enrichment for the 30-day curriculum", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML or YAML)
    #[arg(long, global = true, env = "CURRICULUM_ENRICHER_CONFIG")]
    config: Option<PathBuf>,

    /// Curriculum file replacing the built-in 30 units (TOML or YAML)
    #[arg(long, global = true)]
    curriculum: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the alignment, coverage and drill audits
    Audit {
        /// Write the Markdown audit report here
        #[arg(long)]
        report: Option<PathBuf>,
        /// Write the consolidated JSON manifest here
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Print the full audit results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enrich the day records in a directory
    Enrich {
        /// Directory holding dayNN.json records
        #[arg(short, long, env = "CURRICULUM_DAYS_DIR")]
        days_dir: PathBuf,
        /// Backup location (default: <days-dir>_backup)
        #[arg(long)]
        backup_dir: Option<PathBuf>,
        /// Skip the backup copy
        #[arg(long)]
        no_backup: bool,
        /// Compute and report without writing records
        #[arg(long)]
        dry_run: bool,
        /// Write the Markdown audit report here
        #[arg(long)]
        report: Option<PathBuf>,
        /// Write the consolidated JSON manifest here
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Print the drill outcome for one day as JSON
    Drills {
        /// Curriculum day
        #[arg(short, long)]
        day: u32,
        /// Theme used in phrase placeholders (default: the unit's theme)
        #[arg(short, long)]
        theme: Option<String>,
    },
    /// List the competency stages
    Stages,
    /// Inspect or create the configuration file
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
        /// Print the default configuration path
        #[arg(long)]
        path: bool,
    },
}

/// Static tables for one invocation
struct Tables {
    config: EngineConfig,
    units: UnitRegistry,
    stages: StageModel,
    taxonomy: TechniqueTaxonomy,
}

impl Tables {
    fn load(config_path: Option<&Path>, curriculum_path: Option<&Path>) -> Result<Self> {
        let config = EngineConfig::load_or_default(config_path)?;
        let units = match curriculum_path {
            Some(path) => UnitRegistry::load(path)?,
            None => UnitRegistry::builtin(),
        };
        let taxonomy = TechniqueTaxonomy::new(&config.techniques);

        Ok(Self {
            config,
            units,
            stages: StageModel::builtin(),
            taxonomy,
        })
    }

    fn pipeline(&self) -> EnrichmentPipeline<'_> {
        EnrichmentPipeline::new(&self.units, &self.stages, &self.taxonomy, &self.config)
    }

    fn report(&self, audit: &AuditResults, path: &Path) -> Result<()> {
        AuditReport::new(audit, &self.units, &self.stages, &self.taxonomy, &self.config.shadowing)
            .write(path)?;
        println!("📄 Report written to {}", path.display());
        Ok(())
    }

    fn manifest(
        &self,
        audit: &AuditResults,
        records: &std::collections::BTreeMap<u32, serde_json::Value>,
        path: &Path,
    ) -> Result<()> {
        Manifest::build(audit, records, &self.stages, &self.taxonomy, &self.config).write(path)?;
        println!("📦 Manifest written to {}", path.display());
        Ok(())
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let curriculum_path = cli.curriculum.as_deref();

    match cli.command {
        Commands::Audit { report, manifest, json } => {
            let tables = Tables::load(config_path, curriculum_path)?;
            let audit = Auditor::new(&tables.units, &tables.stages, &tables.taxonomy, &tables.config)
                .run()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&audit)?);
            } else {
                print_audit(&audit);
            }

            if let Some(path) = report {
                tables.report(&audit, &path)?;
            }
            if let Some(path) = manifest {
                let records = tables
                    .pipeline()
                    .preview(&audit, audit.summary.generated_at)?;
                tables.manifest(&audit, &records, &path)?;
            }
        }
        Commands::Enrich { days_dir, backup_dir, no_backup, dry_run, report, manifest } => {
            let tables = Tables::load(config_path, curriculum_path)?;
            let store = DayStore::with_dir(days_dir.clone())?;

            // Catch configuration errors before touching the directory
            tables.pipeline().audit(chrono::Utc::now())?;

            if !no_backup && !dry_run {
                let backup_dir = match backup_dir {
                    Some(dir) => dir,
                    None => default_backup_dir(&days_dir)?,
                };
                let outcome = store
                    .backup(&backup_dir)
                    .context("Backup failed, no records were modified")?;
                println!(
                    "✅ Backed up {} files to {}",
                    outcome.files_copied,
                    outcome.backup_dir.display()
                );
            }

            let run = tables.pipeline().run(&store, PipelineOptions { dry_run })?;

            print_audit(&run.audit);
            println!();
            print!("{}", run.summary);

            if let Some(path) = report {
                tables.report(&run.audit, &path)?;
            }
            if let Some(path) = manifest {
                tables.manifest(&run.audit, &run.records, &path)?;
            }

            if !run.summary.is_clean() {
                eprintln!("{} unit(s) failed.", run.summary.failed);
                std::process::exit(1);
            }
        }
        Commands::Drills { day, theme } => {
            let tables = Tables::load(config_path, curriculum_path)?;
            let theme = match theme {
                Some(theme) => theme,
                None => tables
                    .units
                    .get(day)
                    .map(|u| u.theme.clone())
                    .with_context(|| format!("Day {} is not in the curriculum; pass --theme", day))?,
            };

            let outcome = DrillGenerator::new(&tables.config.shadowing).generate(day, &theme)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Stages => {
            let stages = StageModel::builtin();
            for stage in stages.iter() {
                let prerequisite = stage
                    .prerequisite
                    .map(|p| format!("after stage {}", p))
                    .unwrap_or_else(|| "entry stage".to_string());
                println!("Stage {}: {} ({})", stage.id, stage.name, prerequisite);
                println!("  {}", stage.description);
                println!("  e.g. {}", stage.example_forms.join(", "));
            }
        }
        Commands::Config { show, init, path } => {
            if path {
                println!("{}", config::config_path()?.display());
            } else if init {
                let target = match config_path {
                    Some(p) => p.to_path_buf(),
                    None => config::config_path()?,
                };
                if target.exists() {
                    eprintln!("Config file already exists: {}", target.display());
                    std::process::exit(1);
                }
                EngineConfig::default().save(&target)?;
                println!("Wrote default configuration to {}", target.display());
            } else if show {
                let config = EngineConfig::load_or_default(config_path)?;
                config::show_config(&config);
            } else {
                println!("Configuration options:");
                println!("  --show   Show the effective configuration");
                println!("  --init   Write a default configuration file");
                println!("  --path   Print the default configuration path");
                println!("\nDefault configuration:\n");
                print!("{}", config::default_config_toml());
            }
        }
    }

    Ok(())
}

/// `<days-dir>_backup`, next to the resolved record directory
fn default_backup_dir(days_dir: &Path) -> Result<PathBuf> {
    let resolved = days_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", days_dir.display()))?;
    let name = resolved
        .file_name()
        .with_context(|| format!("No default backup location for {}; pass --backup-dir", resolved.display()))?
        .to_string_lossy()
        .into_owned();
    Ok(resolved.with_file_name(format!("{}_backup", name)))
}

fn print_audit(audit: &AuditResults) {
    let summary = &audit.summary;
    println!("Curriculum audit");
    println!("  Stage alignment:    {:.1}% ({} violations)", summary.alignment_score, summary.violation_count);
    println!("  Technique coverage: {:.1}% ({} gaps)", summary.coverage_score, summary.gap_count);
    println!("  Drill readiness:    {:.1}% ({} phrases to record)", summary.drill_readiness, summary.phrases_to_create);

    for violation in &audit.alignment.violations {
        println!("  ⚠️  Day {}: {}", violation.day, violation.issue);
    }
}

//! Plancheck - radiotherapy plan audit CLI
//!
//! The `plancheck` command audits treatment-plan records against a
//! case-indexed truth table.
//!
//! ## Commands
//!
//! - `check`: Audit one or more plans against a truth-table case
//! - `extract`: Print the canonical parameter values of a plan
//! - `verify-table`: Check that every truth-table row passes against itself

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, Level};

use plancheck_core::{
    render_csv, render_text, write_report_json, AuditConfig, AuditReport, AuditSpan, Evaluator,
    Extractor, PlanRecord, TruthTable,
};

#[derive(Parser)]
#[command(name = "plancheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audit radiotherapy plans against a truth table", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit plans against one truth-table case
    Check {
        /// Plan record(s) (JSON)
        #[arg(short, long = "plan", required = true, num_args = 1..)]
        plans: Vec<PathBuf>,

        /// Truth table (CSV)
        #[arg(short, long, env = "PLANCHECK_TRUTH_TABLE")]
        truth_table: PathBuf,

        /// 1-based case number
        #[arg(short, long)]
        case: usize,

        /// Report format
        #[arg(short, long, value_enum, default_value = "stdout")]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        audit: AuditArgs,
    },

    /// Print the extracted parameter values of a plan as JSON
    Extract {
        /// Plan record (JSON)
        #[arg(short, long)]
        plan: PathBuf,

        #[command(flatten)]
        audit: AuditArgs,
    },

    /// Evaluate every truth-table row against itself
    VerifyTable {
        /// Truth table (CSV)
        #[arg(short, long, env = "PLANCHECK_TRUTH_TABLE")]
        truth_table: PathBuf,

        #[command(flatten)]
        audit: AuditArgs,
    },
}

/// Overrides for [`AuditConfig`].
#[derive(Args, Debug, Default)]
struct AuditArgs {
    /// Beam description that marks setup beams
    #[arg(long, env = "PLANCHECK_SETUP_BEAM")]
    setup_beam: Option<String>,

    /// SSD tolerance in cm
    #[arg(long)]
    ssd_tolerance: Option<f64>,

    /// Arc gantry matching window in degrees
    #[arg(long)]
    gantry_window: Option<f64>,
}

impl AuditArgs {
    fn config(&self) -> AuditConfig {
        let mut config = AuditConfig::default();
        if let Some(description) = &self.setup_beam {
            config = config.with_setup_beam_description(description.as_str());
        }
        if let Some(tolerance) = self.ssd_tolerance {
            config = config.with_ssd_tolerance_cm(tolerance);
        }
        if let Some(window) = self.gantry_window {
            config = config.with_vmat_gantry_window_deg(window);
        }
        config
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// `parameter: VERDICT` lines
    Stdout,
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    plancheck_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Check {
            plans,
            truth_table,
            case,
            format,
            output,
            audit,
        } => {
            let failed = cmd_check(
                &plans,
                &truth_table,
                case,
                format,
                output.as_deref(),
                audit.config(),
            )
            .await?;
            if failed > 0 {
                anyhow::bail!("{} of {} plan(s) failed the audit", failed, plans.len());
            }
            Ok(())
        }
        Commands::Extract { plan, audit } => cmd_extract(&plan, audit.config()),
        Commands::VerifyTable { truth_table, audit } => {
            let unclean = cmd_verify_table(&truth_table, audit.config())?;
            if !unclean.is_empty() {
                anyhow::bail!("{} truth table case(s) are not self-consistent", unclean.len());
            }
            Ok(())
        }
    }
}

/// Audit every plan and emit the reports. Returns the number of failing plans.
async fn cmd_check(
    plans: &[PathBuf],
    truth_table: &Path,
    case: usize,
    format: OutputFormat,
    output: Option<&Path>,
    config: AuditConfig,
) -> Result<usize> {
    let table = TruthTable::from_csv_path(truth_table)
        .with_context(|| format!("Failed to load truth table: {:?}", truth_table))?;
    table.check_case(case)?;

    let reports = audit_plans(plans, Arc::new(table), case, config).await?;
    emit_reports(&reports, format, output)?;

    let failed = reports.iter().filter(|r| !r.summary.overall_pass).count();
    info!(plans = reports.len(), failed = failed, "audit complete");
    Ok(failed)
}

/// Audit plans concurrently. Reports come back in input order.
async fn audit_plans(
    plans: &[PathBuf],
    table: Arc<TruthTable>,
    case: usize,
    config: AuditConfig,
) -> Result<Vec<AuditReport>> {
    let mut join_set = JoinSet::new();
    for (idx, path) in plans.iter().cloned().enumerate() {
        let table = Arc::clone(&table);
        let config = config.clone();
        join_set.spawn_blocking(move || {
            let report = audit_plan(&path, &table, case, config)?;
            Ok::<(usize, AuditReport), anyhow::Error>((idx, report))
        });
    }

    let mut ordered: Vec<Option<AuditReport>> = vec![None; plans.len()];
    while let Some(joined) = join_set.join_next().await {
        let (idx, report) = joined.context("audit task panicked")??;
        ordered[idx] = Some(report);
    }

    plans
        .iter()
        .zip(ordered)
        .map(|(path, slot)| slot.with_context(|| format!("No report produced for {:?}", path)))
        .collect()
}

fn audit_plan(
    path: &Path,
    table: &TruthTable,
    case: usize,
    config: AuditConfig,
) -> Result<AuditReport> {
    let plan = load_plan(path)?;
    let label = plan.label.clone().unwrap_or_else(|| plan_stem(path));
    let _span = AuditSpan::enter(&label, case);

    let (values, _) = Extractor::new(config.clone()).extract(&plan);
    let result = Evaluator::new(config).evaluate(&values, table, case)?;
    Ok(AuditReport::build(label, &values, table, &result)?)
}

fn emit_reports(reports: &[AuditReport], format: OutputFormat, output: Option<&Path>) -> Result<()> {
    if format == OutputFormat::Stdout {
        let text: String = reports.iter().map(render_text).collect::<Vec<_>>().join("\n");
        return match output {
            Some(path) => std::fs::write(path, text)
                .with_context(|| format!("Failed to write report to {:?}", path)),
            None => {
                print!("{}", text);
                Ok(())
            }
        };
    }

    for report in reports {
        let target = output.map(|path| {
            if reports.len() == 1 {
                path.to_path_buf()
            } else {
                report_path(path, &report.plan)
            }
        });

        match (format, target) {
            (OutputFormat::Json, Some(path)) => {
                write_report_json(&path, report)
                    .with_context(|| format!("Failed to write report to {:?}", path))?;
                println!("Wrote {}", path.display());
            }
            (OutputFormat::Json, None) => println!("{}", serde_json::to_string_pretty(report)?),
            (_, Some(path)) => {
                std::fs::write(&path, render_csv(report)?)
                    .with_context(|| format!("Failed to write report to {:?}", path))?;
                println!("Wrote {}", path.display());
            }
            (_, None) => print!("{}", render_csv(report)?),
        }
    }
    Ok(())
}

fn cmd_extract(path: &Path, config: AuditConfig) -> Result<()> {
    let plan = load_plan(path)?;
    let (values, mode) = Extractor::new(config).extract(&plan);
    info!(mode = %mode, implemented = values.implemented_count(), "plan extracted");
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

/// Returns the cases whose own row does not come out clean.
fn cmd_verify_table(path: &Path, config: AuditConfig) -> Result<Vec<usize>> {
    let table = TruthTable::from_csv_path(path)
        .with_context(|| format!("Failed to load truth table: {:?}", path))?;
    let evaluator = Evaluator::new(config);

    let mut unclean = Vec::new();
    for case in 1..=table.case_count() {
        let row = table.row_as_values(case)?;
        let result = evaluator.evaluate(&row, &table, case)?;
        let blocking = result.blocking();
        if blocking.is_empty() {
            println!("case {}: ok", case);
        } else {
            let names: Vec<String> = blocking.iter().map(|p| p.to_string()).collect();
            println!("case {}: {}", case, names.join(", "));
            unclean.push(case);
        }
    }

    println!("Digest: {}", table.digest());
    Ok(unclean)
}

fn load_plan(path: &Path) -> Result<PlanRecord> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid plan record: {:?}", path))
}

fn plan_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `reports/out.csv` + `plan-a` -> `reports/out_plan-a.csv`.
fn report_path(output: &Path, plan: &str) -> PathBuf {
    let stem = plan_stem(output);
    let name = match output.extension() {
        Some(ext) => format!("{}_{}.{}", stem, plan, ext.to_string_lossy()),
        None => format!("{}_{}", stem, plan),
    };
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plancheck_core::{Beam, ControlPoint, Parameter};

    fn plan_json(gantry: f64, ssd_mm: f64) -> String {
        let cp = ControlPoint {
            gantry_angle: Some(gantry),
            source_to_surface_distance: Some(ssd_mm),
            ..Default::default()
        };
        let plan = PlanRecord {
            beams: vec![Beam {
                description: "AP".to_string(),
                control_points: vec![cp.clone(), cp],
                ..Default::default()
            }],
            ..Default::default()
        };
        serde_json::to_string(&plan).unwrap()
    }

    fn table_csv(gantry: &str, ssd: &str) -> String {
        let header: Vec<&str> = std::iter::once("case")
            .chain(Parameter::ALL.iter().map(|p| p.column_name()))
            .collect();
        let row: Vec<&str> = std::iter::once("1")
            .chain(Parameter::ALL.iter().map(|p| match p {
                Parameter::Gantry => gantry,
                Parameter::Ssd => ssd,
                _ => "-",
            }))
            .collect();
        format!("{}\n{}\n", header.join(","), row.join(","))
    }

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from([
            "plancheck",
            "check",
            "--plan",
            "a.json",
            "b.json",
            "--truth-table",
            "table.csv",
            "--case",
            "7",
            "--format",
            "json",
            "--ssd-tolerance",
            "0.5",
        ])
        .unwrap();

        match cli.command {
            Commands::Check {
                plans,
                case,
                format,
                audit,
                ..
            } => {
                assert_eq!(plans, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
                assert_eq!(case, 7);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(audit.config().ssd_tolerance_cm, 0.5);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_cli_check_requires_case() {
        let result = Cli::try_parse_from([
            "plancheck",
            "check",
            "--plan",
            "a.json",
            "--truth-table",
            "table.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_audit_args_default_config() {
        let config = AuditArgs {
            setup_beam: Some("Setup".to_string()),
            ..Default::default()
        }
        .config();
        assert_eq!(config.setup_beam_description, "Setup");
        assert_eq!(config.ssd_tolerance_cm, 1.0);
    }

    #[test]
    fn test_report_path_appends_plan() {
        assert_eq!(
            report_path(Path::new("reports/out.csv"), "plan-a"),
            PathBuf::from("reports/out_plan-a.csv")
        );
        assert_eq!(
            report_path(Path::new("out"), "plan-b"),
            PathBuf::from("out_plan-b")
        );
    }

    #[tokio::test]
    async fn test_check_batch_preserves_order_and_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("table.csv");
        std::fs::write(&table_path, table_csv("0", "100")).unwrap();

        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        std::fs::write(&good, plan_json(0.0, 1000.0)).unwrap();
        std::fs::write(&bad, plan_json(90.0, 1000.0)).unwrap();

        let table = TruthTable::from_csv_path(&table_path).unwrap();
        let reports = audit_plans(
            &[good.clone(), bad.clone(), good.clone()],
            Arc::new(table),
            1,
            AuditConfig::default(),
        )
        .await
        .unwrap();

        let labels: Vec<&str> = reports.iter().map(|r| r.plan.as_str()).collect();
        assert_eq!(labels, vec!["good", "bad", "good"]);
        assert!(reports[0].summary.overall_pass);
        assert!(!reports[1].summary.overall_pass);

        let output = dir.path().join("out.json");
        let failed = cmd_check(
            &[good, bad],
            &table_path,
            1,
            OutputFormat::Json,
            Some(&output),
            AuditConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(failed, 1);
        assert!(dir.path().join("out_good.json").exists());
        assert!(dir.path().join("out_bad.json").exists());
    }

    #[tokio::test]
    async fn test_check_rejects_out_of_range_case() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("table.csv");
        std::fs::write(&table_path, table_csv("0", "100")).unwrap();
        let plan = dir.path().join("plan.json");
        std::fs::write(&plan, plan_json(0.0, 1000.0)).unwrap();

        let result = cmd_check(
            &[plan],
            &table_path,
            2,
            OutputFormat::Stdout,
            None,
            AuditConfig::default(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_check_missing_plan_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("table.csv");
        std::fs::write(&table_path, table_csv("0", "100")).unwrap();

        let table = TruthTable::from_csv_path(&table_path).unwrap();
        let result = audit_plans(
            &[dir.path().join("absent.json")],
            Arc::new(table),
            1,
            AuditConfig::default(),
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_table_flags_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.csv");
        std::fs::write(&good, table_csv("270", "86")).unwrap();
        assert!(cmd_verify_table(&good, AuditConfig::default())
            .unwrap()
            .is_empty());

        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, table_csv("abc", "86")).unwrap();
        assert_eq!(
            cmd_verify_table(&bad, AuditConfig::default()).unwrap(),
            vec![1]
        );
    }
}

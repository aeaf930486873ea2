mod aggregate;
mod analyzers;
mod config;
mod error;
mod git;
mod reporters;
mod rules;
mod scanner;
mod types;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use aggregate::StageOutputs;
use analyzers::{commit_classifier, developers, features, risk, tech_stack};
use config::{AnalysisConfig, BriefConfig};
use error::{BriefError, Result};
use git::log_parser::{GitCli, HistoryProvider};
use types::{ReportMeta, ReportPayload};

const DEFAULT_REPORT_FILE: &str = "PROJECT_ANALYSIS_REPORT.md";
const DEFAULT_PROJECT_NAME: &str = "Project Analysis";

#[derive(Parser, Debug)]
#[command(
    name = "git-brief",
    about = "📋 Generate a stakeholder report from a git repository",
    version,
    long_about = "Reads a repository's git history and file tree and writes a heuristic\n\
                  stakeholder report: technology stack, feature inventory with effort\n\
                  estimates, developer profiles, team dynamics and a risk assessment.\n\n\
                  All figures are best-effort estimates."
)]
struct Args {
    /// Path to the git repository (defaults to the current directory).
    #[arg(value_name = "PATH")]
    repo_path: Option<PathBuf>,

    /// Report file. Markdown defaults to PROJECT_ANALYSIS_REPORT.md; JSON defaults to stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output format [default: markdown]
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Markdown template with [PLACEHOLDER] markers. Uses the built-in layout when omitted.
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Config file. Defaults to <PATH>/.git-brief.yml, then the user config directory.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the raw analysis payload to <report stem>_data.json.
    #[arg(long)]
    save_data: bool,

    /// Maximum number of commits to read from history.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_commits: Option<u64>,

    /// Include merge commits in the analysis.
    #[arg(long)]
    include_merges: bool,

    /// Project name shown in the report (defaults to the repository folder name).
    #[arg(long)]
    project_name: Option<String>,

    /// Print an annotated config template (or write it to FILE) and exit.
    #[arg(long, value_name = "FILE")]
    generate_config: Option<Option<PathBuf>>,

    /// Log stage summaries (RUST_LOG overrides).
    #[arg(long, short)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Markdown,
    Json,
    Terminal,
}

/// Run settings after layering CLI flags over the config file.
#[derive(Debug, PartialEq)]
struct RunSettings {
    format: OutputFormat,
    output: Option<PathBuf>,
    template: Option<PathBuf>,
    project_name: String,
    save_data: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<()> {
    if let Some(dest) = &args.generate_config {
        return config::print_template(dest.as_deref());
    }

    let repo = match &args.repo_path {
        Some(p) => p.clone(),
        None => std::env::current_dir()
            .map_err(|e| BriefError::io("Cannot determine the current directory", e))?,
    };
    check_repository(&repo)?;

    let file_cfg = match config::find_config(args.config.as_deref(), &repo) {
        Some(path) => {
            info!("using config {}", path.display());
            config::load_config(&path)?
        }
        None => BriefConfig::default(),
    };
    let analysis = apply_cli_overrides(file_cfg.resolve(), &args);
    let settings = resolve_settings(&args, &file_cfg, &repo);

    // Fail before the pipeline runs rather than after
    if settings.format == OutputFormat::Markdown {
        if let Some(t) = settings.template.as_deref().filter(|t| !t.is_file()) {
            return Err(BriefError::MissingTemplate(t.to_path_buf()));
        }
    }

    let payload = run_pipeline(&repo, &settings.project_name, &analysis, &GitCli)?;
    write_outputs(&payload, &settings)
}

fn check_repository(repo: &Path) -> Result<()> {
    if !repo.exists() {
        return Err(BriefError::MissingRepo(repo.to_path_buf()));
    }
    if !repo.join(".git").exists() {
        return Err(BriefError::NotAGitRepo(repo.to_path_buf()));
    }
    Ok(())
}

fn apply_cli_overrides(mut cfg: AnalysisConfig, args: &Args) -> AnalysisConfig {
    if let Some(n) = args.max_commits {
        cfg.history.max_commits = usize::try_from(n).unwrap_or(usize::MAX);
    }
    if args.include_merges {
        cfg.history.include_merges = true;
    }
    cfg
}

fn resolve_settings(args: &Args, file_cfg: &BriefConfig, repo: &Path) -> RunSettings {
    let format = args.format
        .or_else(|| file_cfg.format.as_deref().and_then(|f| OutputFormat::from_str(f, true).ok()))
        .unwrap_or(OutputFormat::Markdown);
    RunSettings {
        format,
        output: args.output.clone().or_else(|| file_cfg.output.as_ref().map(PathBuf::from)),
        template: args.template.clone().or_else(|| file_cfg.template.as_ref().map(PathBuf::from)),
        project_name: args.project_name.clone()
            .or_else(|| file_cfg.project_name.clone())
            .unwrap_or_else(|| default_project_name(repo)),
        save_data: args.save_data || file_cfg.save_data.unwrap_or(false),
    }
}

fn default_project_name(repo: &Path) -> String {
    repo.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string())
}

// ── Analysis pipeline ──────────────────────────────────────────────────────────

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .map(|s| s.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn run_pipeline(
    repo: &Path,
    project_name: &str,
    cfg: &AnalysisConfig,
    provider: &dyn HistoryProvider,
) -> Result<ReportPayload> {
    let now = Utc::now();
    let pb = spinner();
    let total_start = Instant::now();
    let mut step_start = Instant::now();

    pb.set_message("[1/6] Reading git history...");
    let commits = git::log_parser::load_history(provider, repo, &cfg.history);
    let t1 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [1/6] Reading git history            {t1}"));
    info!("{} commits loaded", commits.len());

    pb.set_message("[2/6] Scanning repository files...");
    let scan = match scanner::scan_repository(repo, &cfg.extra_exclude_dirs) {
        Ok(s) => s,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    let structure = tech_stack::analyze_structure(&scan, repo);
    let t2 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [2/6] Scanning repository files      {t2}"));
    info!(
        "{} files, {} technologies, {} architecture patterns",
        structure.total_files,
        structure.technology_stack.len(),
        structure.architecture_patterns.len()
    );

    pb.set_message("[3/6] Classifying commits...");
    let commit_patterns = commit_classifier::analyze_commit_patterns(&commits, &cfg.rules);
    let t3 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [3/6] Classifying commits            {t3}"));

    pb.set_message("[4/6] Mapping features...");
    let feature_list = features::identify_features(&commits, &structure.directories, cfg);
    let feature_groups = features::group_features(&feature_list, &cfg.rules);
    let t4 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [4/6] Mapping features               {t4}"));
    info!("{} features in {} groups", feature_list.len(), feature_groups.len());

    pb.set_message("[5/6] Profiling developers...");
    let author_stats = developers::compute_author_stats(&commits);
    let profiles = developers::build_developer_profiles(&author_stats, &commits, &cfg.rules);
    let team_dynamics = developers::analyze_team_dynamics(&profiles, &commits, now, &cfg.rules);
    let t5 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [5/6] Profiling developers           {t5}"));

    pb.set_message("[6/6] Assessing risks...");
    let risk_assessment = risk::assess_project_risks(&risk::RiskContext {
        commits: &commits,
        features: &feature_list,
        profiles: &profiles,
        structure: &structure,
        rules: &cfg.rules,
        now,
    });
    let t6 = fmt_dur(step_start.elapsed());
    pb.println(format!("  ✓ [6/6] Assessing risks               {t6}"));
    let total_time = fmt_dur(total_start.elapsed());

    pb.finish_and_clear();
    eprintln!("✔ [{}] {} commits, {} files, {} features, {} developers — ⏱ {}{}",
        project_name,
        commits.len(),
        structure.total_files,
        feature_list.len(),
        profiles.len(),
        total_time,
        if risk_assessment.high_risks == 0 { String::new() } else {
            format!(" — ⚠ {} high risk(s)", risk_assessment.high_risks)
        }
    );

    Ok(aggregate::build_report(StageOutputs {
        meta: ReportMeta {
            project_name: project_name.to_string(),
            repo_path: repo.display().to_string(),
            analyzed_at: now,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        repo_structure: structure,
        commits,
        commit_patterns,
        author_stats,
        developer_profiles: profiles,
        team_dynamics,
        features: feature_list,
        feature_groups,
        risk_assessment,
    }))
}

// ── Output ─────────────────────────────────────────────────────────────────────

fn write_outputs(payload: &ReportPayload, settings: &RunSettings) -> Result<()> {
    let report_path = settings.output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_FILE));

    match settings.format {
        OutputFormat::Markdown => {
            reporters::markdown::report_markdown(payload, settings.template.as_deref(), &report_path)?;
        }
        OutputFormat::Json => {
            return reporters::json::report_json(payload, settings.output.as_deref());
        }
        OutputFormat::Terminal => reporters::terminal::report_terminal(payload),
    }

    if settings.save_data {
        reporters::json::report_json(payload, Some(&reporters::json::data_path_for(&report_path)))?;
    }
    Ok(())
}

// ── Duration formatting ────────────────────────────────────────────────────────

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 { format!("{:.1}s", d.as_secs_f64()) } else { format!("{ms}ms") }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

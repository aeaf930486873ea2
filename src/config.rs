use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{BriefError, Result};
use crate::rules::RuleBook;
use crate::types::WorkKind;

pub const CONFIG_FILE_NAME: &str = ".git-brief.yml";

/// All settings that can be placed in a .git-brief.yml config file.
/// Every field is optional — omitted fields fall back to built-in defaults.
/// CLI flags always take precedence over values set here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BriefConfig {
    // Run defaults (overridden by the corresponding CLI flag)
    pub format: Option<String>,
    pub output: Option<String>,
    pub template: Option<String>,
    pub project_name: Option<String>,
    pub save_data: Option<bool>,

    // History provider
    pub max_commits: Option<usize>,
    pub include_merges: Option<bool>,
    pub git_timeout_secs: Option<u64>,

    // File scanner
    pub exclude_dirs: Option<Vec<String>>,

    // Heuristics
    pub complexity: Option<ConfigComplexity>,
    pub estimation: Option<ConfigEstimation>,
    pub patterns: Option<ConfigPatterns>,
}

/// Lines-of-code and commit-count cutoffs for feature complexity.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigComplexity {
    pub low_loc: Option<usize>,
    pub medium_loc: Option<usize>,
    pub low_commits: Option<usize>,
    pub medium_commits: Option<usize>,
}

/// Hours per commit by complexity, plus the testing/documentation buffers.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigEstimation {
    pub low_multiplier: Option<f64>,
    pub medium_multiplier: Option<f64>,
    pub high_multiplier: Option<f64>,
    pub testing_buffer: Option<f64>,
    pub documentation_buffer: Option<f64>,
}

/// Commit-message substrings per category. A list replaces the built-in one.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigPatterns {
    pub feature: Option<Vec<String>>,
    pub bugfix: Option<Vec<String>>,
    pub refactor: Option<Vec<String>>,
    pub documentation: Option<Vec<String>>,
}

// ─── Resolved configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexityThresholds {
    pub low_loc: usize,
    pub medium_loc: usize,
    pub low_commits: usize,
    pub medium_commits: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimationFactors {
    pub low_multiplier: f64,
    pub medium_multiplier: f64,
    pub high_multiplier: f64,
    pub testing_buffer: f64,
    pub documentation_buffer: f64,
}

impl EstimationFactors {
    pub fn total_buffer(&self) -> f64 {
        self.testing_buffer + self.documentation_buffer
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryOptions {
    pub max_commits: usize,
    pub include_merges: bool,
    pub timeout: Duration,
}

/// The single configuration value handed to every pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub thresholds: ComplexityThresholds,
    pub estimation: EstimationFactors,
    pub history: HistoryOptions,
    pub extra_exclude_dirs: Vec<String>,
    pub rules: RuleBook,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            thresholds: ComplexityThresholds {
                low_loc: 100,
                medium_loc: 500,
                low_commits: 3,
                medium_commits: 8,
            },
            estimation: EstimationFactors {
                low_multiplier: 1.5,
                medium_multiplier: 3.0,
                high_multiplier: 6.0,
                testing_buffer: 0.15,
                documentation_buffer: 0.05,
            },
            history: HistoryOptions {
                max_commits: 10_000,
                include_merges: false,
                timeout: Duration::from_secs(300),
            },
            extra_exclude_dirs: Vec::new(),
            rules: RuleBook::default(),
        }
    }
}

impl BriefConfig {
    /// Layers the values present in this file over [`AnalysisConfig::default`].
    pub fn resolve(&self) -> AnalysisConfig {
        let mut cfg = AnalysisConfig::default();

        if let Some(n) = self.max_commits { cfg.history.max_commits = n; }
        if let Some(m) = self.include_merges { cfg.history.include_merges = m; }
        if let Some(s) = self.git_timeout_secs { cfg.history.timeout = Duration::from_secs(s); }
        if let Some(dirs) = &self.exclude_dirs { cfg.extra_exclude_dirs = dirs.clone(); }

        if let Some(c) = &self.complexity {
            let t = &mut cfg.thresholds;
            if let Some(v) = c.low_loc { t.low_loc = v; }
            if let Some(v) = c.medium_loc { t.medium_loc = v; }
            if let Some(v) = c.low_commits { t.low_commits = v; }
            if let Some(v) = c.medium_commits { t.medium_commits = v; }
        }

        if let Some(e) = &self.estimation {
            let f = &mut cfg.estimation;
            if let Some(v) = e.low_multiplier { f.low_multiplier = v; }
            if let Some(v) = e.medium_multiplier { f.medium_multiplier = v; }
            if let Some(v) = e.high_multiplier { f.high_multiplier = v; }
            if let Some(v) = e.testing_buffer { f.testing_buffer = v; }
            if let Some(v) = e.documentation_buffer { f.documentation_buffer = v; }
        }

        if let Some(p) = &self.patterns {
            let table = &mut cfg.rules.commit_kinds;
            if let Some(k) = &p.feature { table.set_keywords(WorkKind::Feature, k); }
            if let Some(k) = &p.bugfix { table.set_keywords(WorkKind::Bugfix, k); }
            if let Some(k) = &p.refactor { table.set_keywords(WorkKind::Refactor, k); }
            if let Some(k) = &p.documentation { table.set_keywords(WorkKind::Documentation, k); }
        }

        cfg
    }

    /// Validates semantic constraints that serde cannot enforce.
    ///
    /// Returns a human-readable error describing exactly what is wrong and what
    /// values are accepted. Called automatically by [`load_config`].
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(fmt) = &self.format {
            match fmt.as_str() {
                "markdown" | "json" | "terminal" => {}
                other => {
                    return Err(format!(
                        "Invalid 'format' value: \"{other}\". \
                         Expected one of: \"markdown\", \"json\", \"terminal\""
                    ))
                }
            }
        }

        if let Some(0) = self.max_commits {
            return Err("Invalid 'max_commits' value: 0. Must be 1 or greater".to_string());
        }

        if let Some(0) = self.git_timeout_secs {
            return Err("Invalid 'git_timeout_secs' value: 0. Must be 1 or greater".to_string());
        }

        // Threshold ordering is checked on the merged values so a file may set
        // just one side of a pair.
        let resolved = self.resolve();
        let t = &resolved.thresholds;
        if t.low_loc > t.medium_loc {
            return Err(format!(
                "Invalid complexity thresholds: low_loc ({}) must not exceed medium_loc ({})",
                t.low_loc, t.medium_loc
            ));
        }
        if t.low_commits > t.medium_commits {
            return Err(format!(
                "Invalid complexity thresholds: low_commits ({}) must not exceed medium_commits ({})",
                t.low_commits, t.medium_commits
            ));
        }

        if let Some(e) = &self.estimation {
            let multipliers: &[(&str, Option<f64>)] = &[
                ("low_multiplier", e.low_multiplier),
                ("medium_multiplier", e.medium_multiplier),
                ("high_multiplier", e.high_multiplier),
            ];
            for (name, val) in multipliers {
                if let Some(v) = val {
                    if !v.is_finite() || *v <= 0.0 {
                        return Err(format!(
                            "Invalid 'estimation.{name}': {v}. Multipliers must be greater than 0"
                        ));
                    }
                }
            }
            let buffers: &[(&str, Option<f64>)] = &[
                ("testing_buffer", e.testing_buffer),
                ("documentation_buffer", e.documentation_buffer),
            ];
            for (name, val) in buffers {
                if let Some(v) = val {
                    if !v.is_finite() || *v < 0.0 || *v >= 1.0 {
                        return Err(format!(
                            "Invalid 'estimation.{name}': {v}. Buffers are fractions in [0, 1)"
                        ));
                    }
                }
            }
        }

        if let Some(p) = &self.patterns {
            let lists: &[(&str, &Option<Vec<String>>)] = &[
                ("feature", &p.feature),
                ("bugfix", &p.bugfix),
                ("refactor", &p.refactor),
                ("documentation", &p.documentation),
            ];
            for (name, list) in lists {
                if let Some(list) = list {
                    if list.is_empty() || list.iter().any(|k| k.trim().is_empty()) {
                        return Err(format!(
                            "Invalid 'patterns.{name}': lists must be non-empty and contain no blank entries"
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Reads, parses, and validates a YAML config file from `path`.
pub fn load_config(path: &Path) -> Result<BriefConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BriefError::Config(format!("Cannot read config file '{}': {e}", path.display())))?;
    let cfg: BriefConfig = serde_yaml::from_str(&content)
        .map_err(|e| BriefError::Config(format!("Invalid config file '{}': {e}", path.display())))?;
    cfg.validate()
        .map_err(|e| BriefError::Config(format!("Config file '{}': {e}", path.display())))?;
    Ok(cfg)
}

/// Picks the config file to load: the explicit path, then the repository's
/// `.git-brief.yml`, then `<user config dir>/git-brief/config.yml`.
pub fn find_config(explicit: Option<&Path>, repo_path: &Path) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    let in_repo = repo_path.join(CONFIG_FILE_NAME);
    if in_repo.is_file() {
        return Some(in_repo);
    }
    dirs::config_dir()
        .map(|d| d.join("git-brief").join("config.yml"))
        .filter(|p| p.is_file())
}

/// Annotated YAML template — printed by `--generate-config`.
pub static TEMPLATE: &str = r#"# git-brief configuration file
# Generated by: git-brief --generate-config
#
# All settings are optional. Omit any field to use the built-in default.
# CLI flags always take precedence over values in this file.
# Save this file as .git-brief.yml in your repository root, or pass it with:
#
#   git-brief --config .git-brief.yml [path]

# ── Output ─────────────────────────────────────────────────────────────────────

# Output format: markdown, json, terminal
# format: "markdown"

# Report path. Defaults to PROJECT_ANALYSIS_REPORT.md (markdown) or stdout (json).
# output: "PROJECT_ANALYSIS_REPORT.md"

# Custom Markdown template with [PLACEHOLDER] tokens. Built-in template if omitted.
# template: "docs/report-template.md"

# Name shown in the report. Defaults to the repository directory name.
# project_name: "My Project"

# Also write <report>_data.json with the full analysis payload.
# save_data: false

# ── History ────────────────────────────────────────────────────────────────────

# Maximum number of commits read from git log.
# max_commits: 10000

# Include merge commits in the analysis.
# include_merges: false

# Seconds before the git log call is abandoned.
# git_timeout_secs: 300

# ── File scanning ──────────────────────────────────────────────────────────────

# Additional directory names to skip (merged with the built-in list).
# exclude_dirs:
#   - "generated"
#   - "fixtures"

# ── Feature complexity ─────────────────────────────────────────────────────────

# complexity:
#   low_loc:        100   # at or below: low (with low_commits)
#   medium_loc:     500   # at or below: medium (with medium_commits)
#   low_commits:    3
#   medium_commits: 8

# ── Effort estimation ──────────────────────────────────────────────────────────
# Hours per commit by complexity, then padded by the two buffers.

# estimation:
#   low_multiplier:       1.5
#   medium_multiplier:    3.0
#   high_multiplier:      6.0
#   testing_buffer:       0.15
#   documentation_buffer: 0.05

# ── Commit categories ──────────────────────────────────────────────────────────
# Message substrings per category, matched case-insensitively. First match wins,
# in the order feature, bugfix, refactor, documentation.

# patterns:
#   feature:       ["feat:", "feature:", "add:", "implement:", "new:", "create:", "build:"]
#   bugfix:        ["fix:", "bugfix:", "bug:", "resolve:", "patch:", "correct:"]
#   refactor:      ["refactor:", "cleanup:", "restructure:", "optimize:"]
#   documentation: ["docs:", "documentation:", "readme:", "comment:", "update docs:"]
"#;

/// Prints the config template to stdout, or writes it to `output_path` if given.
pub fn print_template(output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => std::fs::write(path, TEMPLATE)
            .map_err(|e| BriefError::io(format!("Cannot write config template to '{}'", path.display()), e)),
        None => {
            print!("{TEMPLATE}");
            Ok(())
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

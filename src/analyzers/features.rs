use chrono::{DateTime, FixedOffset};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use crate::config::{AnalysisConfig, ComplexityThresholds, EstimationFactors};
use crate::rules::RuleBook;
use crate::types::{
    BusinessValue, CommitRecord, Complexity, Feature, FeatureGroup, FeatureStatus, Priority, RiskLevel,
};

static SCOPED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"feat\(([^)]+)\):", r"feature\(([^)]+)\):", r"add\(([^)]+)\):", r"new\(([^)]+)\):"]
        .iter()
        .map(|p| Regex::new(p).expect("feature scope regex"))
        .collect()
});

const FEATURE_KEYWORDS: &[&str] = &["add", "implement", "new", "create", "build"];

const DIRECTORY_INDICATORS: &[&str] = &[
    "feature", "component", "module", "service", "api",
    "controller", "model", "view", "page", "screen",
];
const DIRECTORY_PREFIXES: &[&str] = &["src/", "app/", "components/", "features/", "modules/"];
const DIRECTORY_SUFFIXES: &[&str] = &["/", "-component", "-module", "-feature"];
const STRUCTURE_TAG: &str = "structure-based";

const DEFAULT_GROUP: &str = "Core Features";

// ─── Candidates ───────────────────────────────────────────────────────────────

/// Raw evidence gathered for one feature before any labels are derived.
#[derive(Debug, Clone, Default)]
struct Candidate {
    name: String,
    commit_count: usize,
    lines_changed: usize,
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
    tags: Vec<String>,
}

impl Candidate {
    fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }
}

/// First-seen ordered candidate set keyed by normalized name.
#[derive(Default)]
struct CandidateSet {
    order: Vec<Candidate>,
    index: HashMap<String, usize>,
}

impl CandidateSet {
    fn entry(&mut self, name: &str) -> &mut Candidate {
        let key = normalize_feature_key(name);
        if let Some(&i) = self.index.get(&key) {
            return &mut self.order[i];
        }
        self.index.insert(key, self.order.len());
        self.order.push(Candidate { name: name.to_string(), ..Default::default() });
        let last = self.order.len() - 1;
        &mut self.order[last]
    }
}

/// Lower-cases, turns `-`/`_` into spaces and collapses whitespace.
pub fn normalize_feature_key(name: &str) -> String {
    name.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pulls a feature name out of a commit message:
///   "feat(auth): ..."      → "auth"
///   "feat: user search"    → "user search"
///   "Add caching layer"    → "caching"
pub fn extract_feature_name(message: &str) -> Option<String> {
    let message = message.to_lowercase();

    for re in SCOPED_PATTERNS.iter() {
        if let Some(scope) = re.captures(&message).and_then(|c| c.get(1)) {
            let scope = scope.as_str().trim();
            if !scope.is_empty() {
                return Some(scope.to_string());
            }
        }
    }

    if let Some(idx) = message.find("feat:") {
        let rest = &message[idx + "feat:".len()..];
        let name = rest.split('\n').next().unwrap_or("").trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    let words: Vec<&str> = message.split_whitespace().collect();
    for keyword in FEATURE_KEYWORDS {
        if let Some(pos) = words.iter().position(|w| w == keyword) {
            if let Some(next) = words.get(pos + 1) {
                let name = next.trim_matches(|c| matches!(c, '.' | ',' | ':'));
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
    }

    None
}

pub fn is_feature_directory(directory: &str) -> bool {
    let lower = directory.to_lowercase();
    DIRECTORY_INDICATORS.iter().any(|i| lower.contains(i))
}

/// "src/user-profile-component" → "User Profile"
pub fn directory_feature_name(directory: &str) -> String {
    let mut name = directory;
    if let Some(p) = DIRECTORY_PREFIXES.iter().find(|p| name.starts_with(*p)) {
        name = &name[p.len()..];
    }
    if let Some(s) = DIRECTORY_SUFFIXES.iter().find(|s| name.ends_with(*s)) {
        name = &name[..name.len() - s.len()];
    }
    title_case(&name.replace(['-', '_'], " "))
}

/// Upper-cases the first letter of every alphabetic run.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

// ─── Drafts ───────────────────────────────────────────────────────────────────

/// A feature with every label derived except complexity and effort.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDraft {
    pub name: String,
    pub description: String,
    pub status: FeatureStatus,
    pub commit_count: usize,
    pub lines_of_code: usize,
    pub business_value: BusinessValue,
    pub priority: Priority,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub end_date: Option<DateTime<FixedOffset>>,
    pub dependencies: Vec<String>,
    pub tags: Vec<String>,
}

impl FeatureDraft {
    /// Derives complexity and effort and produces the finished feature.
    pub fn finalize(self, config: &AnalysisConfig) -> Feature {
        let complexity = assess_complexity(&self, &config.thresholds);
        let estimated_hours = effort_hours(
            complexity,
            self.commit_count,
            self.business_value,
            self.risk_level,
            self.dependencies.len(),
            &config.estimation,
        );
        Feature {
            name: self.name,
            description: self.description,
            complexity,
            status: self.status,
            estimated_hours,
            actual_hours: None,
            commit_count: self.commit_count,
            lines_of_code: self.lines_of_code,
            business_value: self.business_value,
            priority: self.priority,
            risk_level: self.risk_level,
            confidence: self.confidence,
            start_date: self.start_date,
            end_date: self.end_date,
            dependencies: self.dependencies,
            tags: self.tags,
        }
    }
}

fn build_draft(candidate: Candidate, rules: &RuleBook) -> Result<FeatureDraft, String> {
    let name = candidate.name.trim().to_string();
    if name.is_empty() {
        return Err("feature candidate has an empty name".to_string());
    }

    let status = if candidate.end.is_some() {
        FeatureStatus::Completed
    } else if candidate.start.is_some() {
        FeatureStatus::InProgress
    } else {
        FeatureStatus::Planned
    };

    let business_value = rules.business_value.first_match(&name).copied().unwrap_or(BusinessValue::Medium);
    let priority = match business_value {
        BusinessValue::High => Priority::High,
        BusinessValue::Medium => Priority::Medium,
        _ => Priority::Low,
    };

    let dependencies = dependencies_from_tags(&candidate.tags);
    let risk_level = feature_risk(candidate.lines_changed, dependencies.len());

    let mut confidence: f64 = 0.5;
    if candidate.commit_count > 0 { confidence += 0.2; }
    if candidate.start.is_some() && candidate.end.is_some() { confidence += 0.1; }
    if candidate.lines_changed > 0 { confidence += 0.1; }
    if !candidate.tags.is_empty() { confidence += 0.1; }

    Ok(FeatureDraft {
        description: describe(&candidate),
        name,
        status,
        commit_count: candidate.commit_count,
        lines_of_code: candidate.lines_changed,
        business_value,
        priority,
        risk_level,
        confidence: confidence.min(1.0),
        start_date: candidate.start,
        end_date: candidate.end,
        dependencies,
        tags: candidate.tags,
    })
}

fn dependencies_from_tags(tags: &[String]) -> Vec<String> {
    let has = |t: &str| tags.iter().any(|x| x == t);
    let mut deps = Vec::new();
    if has("api") { deps.push("Backend API".to_string()); }
    if has("database") { deps.push("Database".to_string()); }
    if has("ui") { deps.push("UI Components".to_string()); }
    deps
}

/// The higher of the line-count tier and the dependency-count tier.
fn feature_risk(lines_changed: usize, dependency_count: usize) -> RiskLevel {
    let by_lines = match lines_changed {
        n if n > 1000 => RiskLevel::High,
        n if n > 500 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    };
    let by_deps = match dependency_count {
        n if n > 5 => RiskLevel::High,
        n if n > 2 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    };
    by_lines.max(by_deps)
}

fn describe(candidate: &Candidate) -> String {
    let has = |t: &str| candidate.tags.iter().any(|x| x == t);
    let kind = if has("feature") {
        "Feature implementation"
    } else if has("bugfix") {
        "Bug fix"
    } else if has("refactor") {
        "Code refactoring"
    } else {
        "Development work"
    };

    let mut parts = vec![kind.to_string()];
    if candidate.lines_changed > 0 {
        parts.push(format!("affecting {} lines of code", candidate.lines_changed));
    }
    if candidate.commit_count > 0 {
        parts.push(format!("with {} commits", candidate.commit_count));
    }
    parts.join(" ")
}

// ─── Complexity and effort ────────────────────────────────────────────────────

pub fn base_complexity(lines_of_code: usize, commit_count: usize, t: &ComplexityThresholds) -> Complexity {
    if lines_of_code <= t.low_loc && commit_count <= t.low_commits {
        Complexity::Low
    } else if lines_of_code <= t.medium_loc && commit_count <= t.medium_commits {
        Complexity::Medium
    } else {
        Complexity::High
    }
}

/// Threshold complexity, escalated one step for more than three
/// dependencies or a high risk level.
pub fn assess_complexity(draft: &FeatureDraft, t: &ComplexityThresholds) -> Complexity {
    let base = base_complexity(draft.lines_of_code, draft.commit_count, t);
    if draft.dependencies.len() > 3 || draft.risk_level == RiskLevel::High {
        base.escalate()
    } else {
        base
    }
}

/// Hours for a finished feature; same inputs always give the same value.
pub fn estimate_development_time(feature: &Feature, factors: &EstimationFactors) -> f64 {
    effort_hours(
        feature.complexity,
        feature.commit_count,
        feature.business_value,
        feature.risk_level,
        feature.dependencies.len(),
        factors,
    )
}

fn effort_hours(
    complexity: Complexity,
    commit_count: usize,
    business_value: BusinessValue,
    risk_level: RiskLevel,
    dependency_count: usize,
    f: &EstimationFactors,
) -> f64 {
    let multiplier = match complexity {
        Complexity::Low    => f.low_multiplier,
        Complexity::Medium => f.medium_multiplier,
        Complexity::High   => f.high_multiplier,
    };
    let base = multiplier * commit_count as f64 * (1.0 + f.total_buffer());

    let mut adjust: f64 = 1.0;
    match business_value {
        BusinessValue::Critical => adjust *= 1.2,
        BusinessValue::Minimal  => adjust *= 0.8,
        _ => {}
    }
    match risk_level {
        RiskLevel::High => adjust *= 1.3,
        RiskLevel::Low  => adjust *= 0.9,
        RiskLevel::Medium => {}
    }
    if dependency_count > 0 {
        adjust *= 1.0 + 0.1 * dependency_count as f64;
    }

    round1((base * adjust).max(0.0))
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ─── Extraction ───────────────────────────────────────────────────────────────

/// Mines commit messages and directory names for features, derives their
/// labels and effort, and returns them busiest-estimate first.
pub fn identify_features(
    commits: &[CommitRecord],
    directories: &[String],
    config: &AnalysisConfig,
) -> Vec<Feature> {
    let rules = &config.rules;
    let mut set = CandidateSet::default();

    for commit in commits {
        let Some(name) = extract_feature_name(&commit.message) else { continue };
        let c = set.entry(&name);
        c.commit_count += 1;
        c.lines_changed += commit.lines_changed();
        c.start = Some(c.start.map_or(commit.timestamp, |s| s.min(commit.timestamp)));
        c.end = Some(c.end.map_or(commit.timestamp, |e| e.max(commit.timestamp)));
        for tag in rules.feature_tags.all_matches(&commit.message) {
            c.add_tag(tag);
        }
    }

    for dir in directories.iter().filter(|d| is_feature_directory(d)) {
        let name = directory_feature_name(dir);
        if name.trim().is_empty() {
            continue;
        }
        let c = set.entry(&name);
        c.name = name;
        c.add_tag(STRUCTURE_TAG);
    }

    let mut features: Vec<Feature> = set.order
        .into_iter()
        .filter_map(|candidate| match build_draft(candidate, rules) {
            Ok(draft) => Some(draft.finalize(config)),
            Err(e) => {
                warn!("omitting feature: {e}");
                None
            }
        })
        .collect();

    features.sort_by(|a, b| b.estimated_hours.total_cmp(&a.estimated_hours));
    features
}

// ─── Grouping ─────────────────────────────────────────────────────────────────

/// Buckets features by name keywords; groups come back largest effort first.
pub fn group_features(features: &[Feature], rules: &RuleBook) -> Vec<FeatureGroup> {
    let mut buckets: Vec<(&str, Vec<&Feature>)> = Vec::new();
    for feature in features {
        let group = rules.feature_groups.first_match(&feature.name).copied().unwrap_or(DEFAULT_GROUP);
        match buckets.iter_mut().find(|(g, _)| *g == group) {
            Some((_, members)) => members.push(feature),
            None => buckets.push((group, vec![feature])),
        }
    }

    let mut groups: Vec<FeatureGroup> = buckets
        .into_iter()
        .map(|(name, members)| {
            let n = members.len() as f64;
            let complexity_avg = members.iter().map(|f| f.complexity.weight()).sum::<f64>() / n;
            let impact_avg = members.iter().map(|f| f64::from(f.business_value.weight())).sum::<f64>() / n;
            FeatureGroup {
                name: name.to_string(),
                features: members.iter().map(|f| f.name.clone()).collect(),
                total_hours: round1(members.iter().map(|f| f.estimated_hours).sum()),
                average_complexity: complexity_from_average(complexity_avg),
                business_impact: impact_from_average(impact_avg),
            }
        })
        .collect();

    groups.sort_by(|a, b| b.total_hours.total_cmp(&a.total_hours));
    groups
}

fn complexity_from_average(avg: f64) -> Complexity {
    if avg <= 1.5 {
        Complexity::Low
    } else if avg <= 2.5 {
        Complexity::Medium
    } else {
        Complexity::High
    }
}

fn impact_from_average(avg: f64) -> BusinessValue {
    if avg >= 4.5 {
        BusinessValue::Critical
    } else if avg >= 3.5 {
        BusinessValue::High
    } else if avg >= 2.5 {
        BusinessValue::Medium
    } else if avg >= 1.5 {
        BusinessValue::Low
    } else {
        BusinessValue::Minimal
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_commit(message: &str, at: &str, lines: usize) -> CommitRecord {
        CommitRecord {
            hash: "abc".to_string(),
            author: "Dev".to_string(),
            email: "dev@example.com".to_string(),
            timestamp: DateTime::parse_from_rfc3339(at).expect("valid timestamp"),
            message: message.to_string(),
            files_changed: 1,
            lines_added: lines,
            lines_deleted: 0,
            is_merge: false,
            branch: "main".to_string(),
        }
    }

    fn make_draft(lines: usize, commits: usize, deps: usize, risk: RiskLevel) -> FeatureDraft {
        FeatureDraft {
            name: "search".to_string(),
            description: String::new(),
            status: FeatureStatus::Completed,
            commit_count: commits,
            lines_of_code: lines,
            business_value: BusinessValue::Medium,
            priority: Priority::Medium,
            risk_level: risk,
            confidence: 0.5,
            start_date: None,
            end_date: None,
            dependencies: (0..deps).map(|i| format!("dep{i}")).collect(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_extract_scoped_name() {
        assert_eq!(extract_feature_name("feat(Auth): add oauth"), Some("auth".to_string()));
        assert_eq!(extract_feature_name("new(billing): invoices"), Some("billing".to_string()));
    }

    #[test]
    fn test_extract_text_after_feat() {
        assert_eq!(
            extract_feature_name("feat: user search\n\nbody text"),
            Some("user search".to_string()),
            "Name should stop at the end of the first line"
        );
    }

    #[test]
    fn test_extract_word_after_keyword() {
        assert_eq!(extract_feature_name("Implement caching, finally"), Some("caching".to_string()));
        assert_eq!(extract_feature_name("create: exporter"), None, "'create:' is not the bare keyword");
        assert_eq!(extract_feature_name("fix typo"), None);
    }

    #[test]
    fn test_directory_feature_name() {
        assert_eq!(directory_feature_name("src/user-profile-component"), "User Profile");
        assert_eq!(directory_feature_name("features/payment_service"), "Payment Service");
        assert!(is_feature_directory("src/Components"));
        assert!(!is_feature_directory("docs"));
    }

    #[test]
    fn test_base_complexity_from_loc() {
        let t = AnalysisConfig::default().thresholds;
        assert_eq!(base_complexity(1200, 2, &t), Complexity::High, "LOC alone can force high");
        assert_eq!(base_complexity(50, 2, &t), Complexity::Low);
        assert_eq!(base_complexity(300, 5, &t), Complexity::Medium);
        assert_eq!(base_complexity(50, 9, &t), Complexity::High, "Commit count alone can force high");
    }

    #[test]
    fn test_escalation_is_single_step() {
        let t = AnalysisConfig::default().thresholds;
        let draft = make_draft(50, 2, 4, RiskLevel::High);
        assert_eq!(assess_complexity(&draft, &t), Complexity::Medium, "Both triggers still escalate once");
    }

    #[test]
    fn test_estimate_worked_example() {
        let cfg = AnalysisConfig::default();
        // medium: 3.0 h/commit × 4 commits × 1.2 buffer = 14.4; low risk × 0.9 = 12.96
        let feature = make_draft(300, 4, 0, RiskLevel::Low).finalize(&cfg);
        assert_eq!(feature.complexity, Complexity::Medium);
        assert_eq!(feature.estimated_hours, 13.0);
        assert_eq!(estimate_development_time(&feature, &cfg.estimation), 13.0, "Recomputing is stable");
    }

    #[test]
    fn test_identify_merges_commit_and_directory_features() {
        let cfg = AnalysisConfig::default();
        let commits = vec![
            make_commit("feat(user-profile): avatar upload api", "2024-01-01T10:00:00Z", 120),
            make_commit("feat(user_profile): fix crop", "2024-01-05T10:00:00Z", 30),
        ];
        let dirs = vec!["src/user-profile-component".to_string(), "docs".to_string()];
        let features = identify_features(&commits, &dirs, &cfg);

        assert_eq!(features.len(), 1, "Both sources should collapse into one feature");
        let f = &features[0];
        assert_eq!(f.name, "User Profile", "Directory name wins on collision");
        assert_eq!(f.commit_count, 2, "Commit statistics are kept");
        assert_eq!(f.lines_of_code, 150);
        assert_eq!(f.status, FeatureStatus::Completed);
        assert_eq!(f.business_value, BusinessValue::High, "'user' marks a high-value feature");
        assert_eq!(f.priority, Priority::High);
        assert!(f.tags.contains(&"structure-based".to_string()));
        assert!(f.tags.contains(&"api".to_string()));
        assert_eq!(f.dependencies, vec!["Backend API".to_string()]);
        assert!((f.confidence - 1.0).abs() < 1e-9);
        assert_eq!(f.description, "Feature implementation affecting 150 lines of code with 2 commits");
    }

    #[test]
    fn test_directory_only_feature_is_planned() {
        let cfg = AnalysisConfig::default();
        let features = identify_features(&[], &["app/reporting-module".to_string()], &cfg);
        assert_eq!(features.len(), 1);
        let f = &features[0];
        assert_eq!(f.name, "Reporting");
        assert_eq!(f.status, FeatureStatus::Planned);
        assert_eq!(f.estimated_hours, 0.0, "No commits means no estimated effort");
        assert_eq!(f.description, "Development work");
        assert!((f.confidence - 0.6).abs() < 1e-9, "Only the tag bonus applies");
    }

    #[test]
    fn test_features_sorted_by_hours() {
        let cfg = AnalysisConfig::default();
        let mut commits = vec![make_commit("feat(small): a", "2024-01-01T10:00:00Z", 5)];
        for day in 1..=6 {
            commits.push(make_commit("feat(big): b", &format!("2024-02-0{day}T10:00:00Z"), 50));
        }
        let features = identify_features(&commits, &[], &cfg);
        assert_eq!(features[0].name, "big");
        assert!(features[0].estimated_hours >= features[1].estimated_hours);
    }

    #[test]
    fn test_feature_risk_takes_higher_tier() {
        assert_eq!(feature_risk(100, 3), RiskLevel::Medium);
        assert_eq!(feature_risk(1500, 0), RiskLevel::High);
        assert_eq!(feature_risk(600, 6), RiskLevel::High);
        assert_eq!(feature_risk(0, 0), RiskLevel::Low);
    }

    #[test]
    fn test_group_features() {
        let cfg = AnalysisConfig::default();
        let mut ui = make_draft(50, 2, 0, RiskLevel::Low).finalize(&cfg);
        ui.name = "Login Page".to_string();
        let mut api = make_draft(900, 10, 0, RiskLevel::High).finalize(&cfg);
        api.name = "Orders Api".to_string();
        let mut misc = make_draft(50, 1, 0, RiskLevel::Low).finalize(&cfg);
        misc.name = "search".to_string();

        let groups = group_features(&[ui, api, misc], &cfg.rules);
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Backend Services", "User Interface", "Core Features"]);
        assert_eq!(groups[0].average_complexity, Complexity::High);
        assert_eq!(groups[0].business_impact, BusinessValue::Medium);
    }

    #[test]
    fn test_impact_thresholds() {
        assert_eq!(impact_from_average(4.5), BusinessValue::Critical);
        assert_eq!(impact_from_average(3.5), BusinessValue::High);
        assert_eq!(impact_from_average(2.5), BusinessValue::Medium);
        assert_eq!(impact_from_average(1.5), BusinessValue::Low);
        assert_eq!(impact_from_average(1.0), BusinessValue::Minimal);
    }

    fn any_risk() -> impl Strategy<Value = RiskLevel> {
        prop_oneof![Just(RiskLevel::Low), Just(RiskLevel::Medium), Just(RiskLevel::High)]
    }

    proptest! {
        #[test]
        fn prop_complexity_monotonic(
            lines in 0usize..3000,
            commits in 0usize..20,
            deps in 0usize..8,
            extra in 0usize..4,
            risk in any_risk(),
        ) {
            let t = AnalysisConfig::default().thresholds;
            let before = assess_complexity(&make_draft(lines, commits, deps, risk), &t);
            let more_deps = assess_complexity(&make_draft(lines, commits, deps + extra, risk), &t);
            let high_risk = assess_complexity(&make_draft(lines, commits, deps, RiskLevel::High), &t);
            prop_assert!(more_deps >= before);
            prop_assert!(high_risk >= before);
        }

        #[test]
        fn prop_estimate_idempotent_and_non_negative(
            lines in 0usize..3000,
            commits in 0usize..50,
            deps in 0usize..6,
            risk in any_risk(),
        ) {
            let cfg = AnalysisConfig::default();
            let feature = make_draft(lines, commits, deps, risk).finalize(&cfg);
            let first = estimate_development_time(&feature, &cfg.estimation);
            let second = estimate_development_time(&feature, &cfg.estimation);
            prop_assert_eq!(first, second);
            prop_assert!(first >= 0.0);
            prop_assert!(((first * 10.0).round() - first * 10.0).abs() < 1e-6);
            prop_assert_eq!(first, feature.estimated_hours);
        }
    }
}

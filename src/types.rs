use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Core Git Data ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author: String,
    pub email: String,
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
    pub files_changed: usize,
    pub lines_added: usize,
    pub lines_deleted: usize,
    pub is_merge: bool,
    pub branch: String,
}

impl CommitRecord {
    pub fn lines_changed(&self) -> usize {
        self.lines_added + self.lines_deleted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub size: u64,
    pub line_count: usize,
    /// Lower-cased, dot included, empty when the file has none.
    pub extension: String,
    pub is_config: bool,
    pub is_documentation: bool,
    pub is_source: bool,
}

impl FileRecord {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

// ─── Commit Patterns ──────────────────────────────────────────────────────────

/// Exclusive commit category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkKind {
    Feature,
    Bugfix,
    Refactor,
    Documentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyTrend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitPattern {
    pub total_commits: usize,
    pub feature_commits: usize,
    pub bug_fix_commits: usize,
    pub refactor_commits: usize,
    pub documentation_commits: usize,
    pub unclassified_commits: usize,
    pub merge_commits: usize,
    pub average_commits_per_day: f64,
    pub commit_frequency_trend: FrequencyTrend,
    pub most_active_days: Vec<String>,
    pub commit_message_quality: f64,
}

// ─── Repository Structure ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechCategory {
    Frontend,
    Backend,
    #[serde(rename = "Build Tools")]
    BuildTools,
    Infrastructure,
    #[serde(rename = "CI/CD")]
    CiCd,
    Testing,
}

impl std::fmt::Display for TechCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TechCategory::Frontend       => write!(f, "Frontend"),
            TechCategory::Backend        => write!(f, "Backend"),
            TechCategory::BuildTools     => write!(f, "Build Tools"),
            TechCategory::Infrastructure => write!(f, "Infrastructure"),
            TechCategory::CiCd           => write!(f, "CI/CD"),
            TechCategory::Testing        => write!(f, "Testing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyEntry {
    pub name: String,
    pub category: TechCategory,
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoStructure {
    pub total_files: usize,
    pub total_lines: usize,
    pub directories: Vec<String>,
    pub file_types: BTreeMap<String, usize>,
    pub technology_stack: Vec<TechnologyEntry>,
    pub architecture_patterns: Vec<String>,
    pub config_files: Vec<String>,
    pub documentation_files: Vec<String>,
}

// ─── Features ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// One step up; `High` stays `High`.
    pub fn escalate(self) -> Self {
        match self {
            Complexity::Low => Complexity::Medium,
            Complexity::Medium | Complexity::High => Complexity::High,
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            Complexity::Low    => 1.0,
            Complexity::Medium => 2.0,
            Complexity::High   => 3.0,
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Low    => write!(f, "low"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::High   => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Completed,
    InProgress,
    Planned,
}

impl std::fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureStatus::Completed  => write!(f, "completed"),
            FeatureStatus::InProgress => write!(f, "in_progress"),
            FeatureStatus::Planned    => write!(f, "planned"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessValue {
    Critical,
    High,
    Medium,
    Low,
    Minimal,
}

impl BusinessValue {
    pub fn weight(self) -> u8 {
        match self {
            BusinessValue::Critical => 5,
            BusinessValue::High     => 4,
            BusinessValue::Medium   => 3,
            BusinessValue::Low      => 2,
            BusinessValue::Minimal  => 1,
        }
    }

    pub fn is_primary(self) -> bool {
        matches!(self, BusinessValue::Critical | BusinessValue::High)
    }
}

impl std::fmt::Display for BusinessValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusinessValue::Critical => write!(f, "Critical"),
            BusinessValue::High     => write!(f, "High"),
            BusinessValue::Medium   => write!(f, "Medium"),
            BusinessValue::Low      => write!(f, "Low"),
            BusinessValue::Minimal  => write!(f, "Minimal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High   => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low    => write!(f, "Low"),
        }
    }
}

/// Used both for per-feature risk and for the overall assessment level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low    => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High   => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub complexity: Complexity,
    pub status: FeatureStatus,
    pub estimated_hours: f64,
    pub actual_hours: Option<f64>,
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGroup {
    pub name: String,
    pub features: Vec<String>,
    pub total_hours: f64,
    pub average_complexity: Complexity,
    pub business_impact: BusinessValue,
}

// ─── Developers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorStats {
    pub name: String,
    pub email: String,
    pub commit_count: usize,
    pub total_lines_added: usize,
    pub total_lines_deleted: usize,
    pub first_commit: DateTime<FixedOffset>,
    pub last_commit: DateTime<FixedOffset>,
    pub commit_frequency: f64,
    pub average_commit_size: f64,
    pub contribution_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Junior,
    #[serde(rename = "Mid-level")]
    MidLevel,
    Senior,
    Expert,
}

impl SkillLevel {
    pub fn description(self) -> &'static str {
        match self {
            SkillLevel::Expert =>
                "Highly experienced developer with deep technical knowledge and excellent practices",
            SkillLevel::Senior =>
                "Experienced developer with strong technical skills and good development practices",
            SkillLevel::MidLevel =>
                "Developer with solid technical foundation and growing expertise",
            SkillLevel::Junior =>
                "Early-career developer learning and building technical skills",
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkillLevel::Junior   => write!(f, "Junior"),
            SkillLevel::MidLevel => write!(f, "Mid-level"),
            SkillLevel::Senior   => write!(f, "Senior"),
            SkillLevel::Expert   => write!(f, "Expert"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeveloperProfile {
    pub name: String,
    pub email: String,
    pub role: String,
    pub company: String,
    pub expertise_areas: Vec<String>,
    pub skill_level: SkillLevel,
    pub skill_description: String,
    pub contribution_pattern: String,
    pub commit_frequency: f64,
    pub last_contribution: DateTime<FixedOffset>,
    pub business_value: BusinessValue,
    pub knowledge_areas: Vec<String>,
    pub collaboration_score: f64,
    pub code_quality_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDynamics {
    pub team_size: usize,
    pub collaboration_model: String,
    pub knowledge_distribution: String,
    pub bus_factor: usize,
    pub primary_contributors: Vec<String>,
    pub secondary_contributors: Vec<String>,
    pub knowledge_concentration: f64,
    pub team_stability: String,
    pub communication_patterns: Vec<String>,
}

// ─── Risks ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Technical,
    Team,
    Business,
}

/// Probability and impact labels on a risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low    => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High   => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    Identified,
    Mitigated,
    Monitoring,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub name: String,
    pub category: RiskCategory,
    pub probability: Severity,
    pub impact: Severity,
    pub business_impact: String,
    pub description: String,
    pub mitigation_strategy: String,
    pub risk_score: f64,
    pub detected_at: DateTime<Utc>,
    pub status: RiskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub total_risks: usize,
    pub high_risks: usize,
    pub medium_risks: usize,
    pub low_risks: usize,
    pub overall_risk_level: RiskLevel,
    pub technical_risks: Vec<Risk>,
    pub team_risks: Vec<Risk>,
    pub business_risks: Vec<Risk>,
    pub risk_trend: String,
    pub mitigation_coverage: f64,
    /// Ids of checks that exist but are not evaluated yet.
    pub unevaluated_checks: Vec<String>,
}

impl RiskAssessment {
    pub fn all_risks(&self) -> impl Iterator<Item = &Risk> {
        self.technical_risks.iter()
            .chain(self.team_risks.iter())
            .chain(self.business_risks.iter())
    }
}

// ─── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub project_name: String,
    pub repo_path: String,
    pub analyzed_at: DateTime<Utc>,
    pub tool_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTimeline {
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub duration_days: i64,
    pub duration_weeks: i64,
    pub duration_months: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureComplexitySummary {
    pub low_complexity: usize,
    pub medium_complexity: usize,
    pub high_complexity: usize,
    pub total_estimated_hours: f64,
    pub average_hours_per_feature: f64,
    pub feature_groups: Vec<FeatureGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAnalysis {
    pub total_contributors: usize,
    pub primary_contributors: usize,
    pub knowledge_concentration: f64,
    pub dynamics: TeamDynamics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectHealth {
    pub overall_score: f64,
    pub rating: String,
}

/// Everything one run produces; the JSON dump and the Markdown template both
/// read from this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub meta: ReportMeta,
    pub repo_structure: RepoStructure,
    pub commits: Vec<CommitRecord>,
    pub commit_patterns: CommitPattern,
    pub author_stats: Vec<AuthorStats>,
    pub developer_profiles: Vec<DeveloperProfile>,
    pub features: Vec<Feature>,
    pub risk_assessment: RiskAssessment,
    pub project_timeline: Option<ProjectTimeline>,
    pub feature_complexity: Option<FeatureComplexitySummary>,
    pub team_analysis: Option<TeamAnalysis>,
    pub project_health: ProjectHealth,
}

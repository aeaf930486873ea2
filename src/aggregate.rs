use crate::types::{
    AuthorStats, CommitPattern, CommitRecord, Complexity, DeveloperProfile, Feature,
    FeatureComplexitySummary, FeatureGroup, FeatureStatus, ProjectHealth, ProjectTimeline,
    RepoStructure, ReportMeta, ReportPayload, RiskAssessment, RiskLevel, TeamAnalysis, TeamDynamics,
};

/// Outputs of every pipeline stage, ready to be merged into one payload.
pub struct StageOutputs {
    pub meta: ReportMeta,
    pub repo_structure: RepoStructure,
    pub commits: Vec<CommitRecord>,
    pub commit_patterns: CommitPattern,
    pub author_stats: Vec<AuthorStats>,
    pub developer_profiles: Vec<DeveloperProfile>,
    pub team_dynamics: TeamDynamics,
    pub features: Vec<Feature>,
    pub feature_groups: Vec<FeatureGroup>,
    pub risk_assessment: RiskAssessment,
}

/// Merges stage outputs and derives the timeline, complexity summary, team
/// analysis and health score.
pub fn build_report(stages: StageOutputs) -> ReportPayload {
    let project_timeline = project_timeline(&stages.commits);
    let feature_complexity = feature_complexity(&stages.features, stages.feature_groups);
    let team_analysis = team_analysis(&stages.developer_profiles, stages.team_dynamics);
    let project_health = project_health(
        &stages.commits,
        &stages.commit_patterns,
        &stages.features,
        &stages.risk_assessment,
        team_analysis.as_ref(),
    );

    ReportPayload {
        meta: stages.meta,
        repo_structure: stages.repo_structure,
        commits: stages.commits,
        commit_patterns: stages.commit_patterns,
        author_stats: stages.author_stats,
        developer_profiles: stages.developer_profiles,
        features: stages.features,
        risk_assessment: stages.risk_assessment,
        project_timeline,
        feature_complexity,
        team_analysis,
        project_health,
    }
}

pub fn project_timeline(commits: &[CommitRecord]) -> Option<ProjectTimeline> {
    let start = commits.iter().map(|c| c.timestamp).min()?;
    let end = commits.iter().map(|c| c.timestamp).max()?;
    let days = (end - start).num_days();
    Some(ProjectTimeline {
        start_date: start,
        end_date: end,
        duration_days: days,
        duration_weeks: days / 7,
        duration_months: days / 30,
    })
}

fn feature_complexity(features: &[Feature], groups: Vec<FeatureGroup>) -> Option<FeatureComplexitySummary> {
    if features.is_empty() {
        return None;
    }
    let count = |c: Complexity| features.iter().filter(|f| f.complexity == c).count();
    let total: f64 = features.iter().map(|f| f.estimated_hours).sum();
    Some(FeatureComplexitySummary {
        low_complexity: count(Complexity::Low),
        medium_complexity: count(Complexity::Medium),
        high_complexity: count(Complexity::High),
        total_estimated_hours: round1(total),
        average_hours_per_feature: round1(total / features.len() as f64),
        feature_groups: groups,
    })
}

fn team_analysis(profiles: &[DeveloperProfile], dynamics: TeamDynamics) -> Option<TeamAnalysis> {
    if profiles.is_empty() {
        return None;
    }
    Some(TeamAnalysis {
        total_contributors: profiles.len(),
        primary_contributors: profiles.iter().filter(|p| p.business_value.is_primary()).count(),
        knowledge_concentration: dynamics.knowledge_concentration,
        dynamics,
    })
}

/// Mean of the factors that have data; 0.5 when none do.
pub fn project_health(
    commits: &[CommitRecord],
    patterns: &CommitPattern,
    features: &[Feature],
    risks: &RiskAssessment,
    team: Option<&TeamAnalysis>,
) -> ProjectHealth {
    let mut factors = Vec::new();
    if !commits.is_empty() {
        factors.push(patterns.commit_message_quality);
    }
    if !features.is_empty() {
        let done = features.iter().filter(|f| f.status == FeatureStatus::Completed).count();
        factors.push(done as f64 / features.len() as f64);
    }
    factors.push(match risks.overall_risk_level {
        RiskLevel::Low => 1.0,
        RiskLevel::Medium => 0.6,
        RiskLevel::High => 0.2,
    });
    if let Some(team) = team {
        factors.push(1.0 - team.knowledge_concentration);
    }

    let score = if factors.is_empty() { 0.5 } else { factors.iter().sum::<f64>() / factors.len() as f64 };
    let rating = match score {
        s if s >= 0.8 => "Excellent",
        s if s >= 0.6 => "Good",
        s if s >= 0.4 => "Fair",
        _ => "Poor",
    };
    ProjectHealth { overall_score: score, rating: rating.to_string() }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ─── Tests ────────────────────────────────────────────────────────────────────

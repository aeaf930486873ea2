use chrono::{DateTime, Utc};
use crate::analyzers::developers::recent_active_ratio;
use crate::rules::RuleBook;
use crate::types::{
    CommitRecord, Complexity, DeveloperProfile, Feature, RepoStructure, Risk, RiskAssessment,
    RiskCategory, RiskLevel, RiskStatus, Severity,
};

const HIGH_SCORE: f64 = 0.7;
const MEDIUM_SCORE: f64 = 0.4;
const LARGE_COMMIT_LINES: usize = 500;

/// Outcome of one risk check's measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    Evaluated(f64),
    /// The check exists but has no measurement yet.
    Unevaluated,
}

/// Everything a risk check may look at.
pub struct RiskContext<'a> {
    pub commits: &'a [CommitRecord],
    pub features: &'a [Feature],
    pub profiles: &'a [DeveloperProfile],
    pub structure: &'a RepoStructure,
    pub rules: &'a RuleBook,
    pub now: DateTime<Utc>,
}

struct RiskCheck {
    id: &'static str,
    name: &'static str,
    category: RiskCategory,
    probability: Severity,
    impact: Severity,
    business_impact: &'static str,
    mitigation: &'static str,
    measure: fn(&RiskContext) -> Evaluation,
    /// Risk score when the measurement triggers the check.
    fires: fn(f64) -> Option<f64>,
    describe: fn(f64, &RiskContext) -> String,
}

static CHECKS: &[RiskCheck] = &[
    RiskCheck {
        id: "TECH_001",
        name: "High Complexity Features",
        category: RiskCategory::Technical,
        probability: Severity::Medium,
        impact: Severity::High,
        business_impact: "Delayed delivery and increased maintenance costs",
        mitigation: "Break down complex features, increase testing coverage, allocate senior developers",
        measure: |ctx| Evaluation::Evaluated(high_complexity_count(ctx.features) as f64),
        fires: |count| (count > 0.0).then(|| (count * 0.2).min(0.8)),
        describe: |_, ctx| format!(
            "Project contains {} high-complexity features that may cause delays and quality issues",
            high_complexity_count(ctx.features)
        ),
    },
    RiskCheck {
        id: "TECH_002",
        name: "High Technical Debt",
        category: RiskCategory::Technical,
        probability: Severity::High,
        impact: Severity::Medium,
        business_impact: "Reduced development velocity and increased bug frequency",
        mitigation: "Implement refactoring sprints, improve code review process, establish coding standards",
        measure: |ctx| Evaluation::Evaluated(technical_debt_score(ctx.commits, ctx.rules)),
        fires: |debt| (debt > 0.6).then_some(debt),
        describe: |debt, _| format!("Technical debt score of {debt:.2} indicates accumulated technical issues"),
    },
    RiskCheck {
        id: "TECH_003",
        name: "Complex Architecture",
        category: RiskCategory::Technical,
        probability: Severity::Medium,
        impact: Severity::High,
        business_impact: "Difficult maintenance and onboarding challenges",
        mitigation: "Document architecture decisions, create onboarding guides, simplify complex components",
        measure: |ctx| Evaluation::Evaluated(architecture_complexity(ctx.structure)),
        fires: |score| (score > 0.7).then_some(score),
        describe: |_, _| "Project architecture shows high complexity that may impact maintainability".to_string(),
    },
    RiskCheck {
        id: "TECH_004",
        name: "Low Testing Coverage",
        category: RiskCategory::Technical,
        probability: Severity::High,
        impact: Severity::Medium,
        business_impact: "Increased bug frequency and deployment risks",
        mitigation: "Implement automated testing, establish testing requirements, increase test coverage",
        measure: |ctx| Evaluation::Evaluated(testing_coverage(ctx.commits, ctx.rules)),
        fires: |coverage| (coverage < 0.5).then(|| 1.0 - coverage),
        describe: |coverage, _| format!("Testing coverage of {coverage:.2} indicates insufficient testing"),
    },
    RiskCheck {
        id: "TECH_005",
        name: "Dependency Vulnerabilities",
        category: RiskCategory::Technical,
        probability: Severity::Medium,
        impact: Severity::Medium,
        business_impact: "Security vulnerabilities and maintenance overhead",
        mitigation: "Regular dependency updates, security scanning, vulnerability monitoring",
        measure: |_| Evaluation::Unevaluated,
        fires: |_| Some(0.6),
        describe: |_, _| "Project has potential dependency and security risks".to_string(),
    },
    RiskCheck {
        id: "TEAM_001",
        name: "High Knowledge Concentration",
        category: RiskCategory::Team,
        probability: Severity::Medium,
        impact: Severity::High,
        business_impact: "Project becomes unmaintainable if key developers leave",
        mitigation: "Cross-training, documentation, knowledge sharing sessions, pair programming",
        measure: |ctx| Evaluation::Evaluated(knowledge_concentration(ctx.profiles)),
        fires: |ratio| (ratio > 0.7).then_some(ratio),
        describe: |ratio, _| format!(
            "Knowledge concentration score of {ratio:.2} indicates over-reliance on few developers"
        ),
    },
    RiskCheck {
        id: "TEAM_002",
        name: "Team Instability",
        category: RiskCategory::Team,
        probability: Severity::High,
        impact: Severity::Medium,
        business_impact: "Reduced productivity and knowledge loss",
        mitigation: "Improve retention, establish clear roles, provide growth opportunities",
        measure: |ctx| {
            let ratio = if ctx.commits.is_empty() {
                0.0
            } else {
                recent_active_ratio(ctx.profiles.len(), ctx.commits, ctx.now)
            };
            Evaluation::Evaluated(ratio)
        },
        fires: |ratio| (ratio < 0.5).then(|| 1.0 - ratio),
        describe: |_, _| "Team shows signs of instability with frequent changes".to_string(),
    },
    RiskCheck {
        id: "TEAM_003",
        name: "Skill Gaps",
        category: RiskCategory::Team,
        probability: Severity::Medium,
        impact: Severity::Medium,
        business_impact: "Reduced development velocity and quality issues",
        mitigation: "Training programs, hiring, knowledge transfer, external consultants",
        measure: |_| Evaluation::Unevaluated,
        fires: |_| Some(0.6),
        describe: |_, _| "Team has skill gaps".to_string(),
    },
    RiskCheck {
        id: "TEAM_004",
        name: "Communication Issues",
        category: RiskCategory::Team,
        probability: Severity::Medium,
        impact: Severity::Medium,
        business_impact: "Misunderstandings and coordination problems",
        mitigation: "Improve documentation, establish communication protocols, regular team meetings",
        measure: |ctx| Evaluation::Evaluated(communication_quality(ctx.commits, ctx.rules)),
        fires: |score| (score < 0.6).then(|| 1.0 - score),
        describe: |_, _| {
            "Commit messages and communication patterns indicate potential communication issues".to_string()
        },
    },
    RiskCheck {
        id: "BUS_001",
        name: "Scope Creep",
        category: RiskCategory::Business,
        probability: Severity::Medium,
        impact: Severity::High,
        business_impact: "Delayed delivery and increased costs",
        mitigation: "Strict change control, regular scope reviews, stakeholder alignment",
        measure: |_| Evaluation::Unevaluated,
        fires: |score| (score > 0.6).then_some(score),
        describe: |_, _| "Project shows signs of scope creep with expanding feature set".to_string(),
    },
    RiskCheck {
        id: "BUS_002",
        name: "Timeline Risks",
        category: RiskCategory::Business,
        probability: Severity::High,
        impact: Severity::High,
        business_impact: "Missed deadlines and stakeholder dissatisfaction",
        mitigation: "Resource reallocation, scope reduction, stakeholder communication",
        measure: |ctx| Evaluation::Evaluated(timeline_risk(ctx.features)),
        fires: |score| (score > 0.7).then_some(score),
        describe: |_, _| "Project timeline shows significant risks of delays".to_string(),
    },
    RiskCheck {
        id: "BUS_003",
        name: "Resource Constraints",
        category: RiskCategory::Business,
        probability: Severity::Medium,
        impact: Severity::Medium,
        business_impact: "Reduced development velocity and quality",
        mitigation: "Resource planning, prioritization, external support",
        measure: |_| Evaluation::Unevaluated,
        fires: |score| (score > 0.6).then_some(score),
        describe: |_, _| "Project may face resource constraints affecting delivery".to_string(),
    },
];

// ─── Measurements ─────────────────────────────────────────────────────────────

fn high_complexity_count(features: &[Feature]) -> usize {
    features.iter().filter(|f| f.complexity == Complexity::High).count()
}

/// Weighted debt signals per commit, normalized against 30% of the history.
pub fn technical_debt_score(commits: &[CommitRecord], rules: &RuleBook) -> f64 {
    if commits.is_empty() {
        return 0.0;
    }
    let indicators: f64 = commits
        .iter()
        .map(|c| {
            let mut w: f64 = rules.debt_signals.all_matches(&c.message).into_iter().sum();
            if c.lines_changed() > LARGE_COMMIT_LINES {
                w += 0.5;
            }
            w
        })
        .sum();
    (indicators / (commits.len() as f64 * 0.3).max(1.0)).min(1.0)
}

pub fn architecture_complexity(structure: &RepoStructure) -> f64 {
    let depth = structure.directories.iter().map(|d| d.split('/').count()).max().unwrap_or(1);
    let mut score: f64 = match depth {
        d if d > 5 => 0.4,
        d if d > 3 => 0.2,
        _ => 0.0,
    };
    score += match structure.technology_stack.len() {
        n if n > 5 => 0.3,
        n if n > 3 => 0.2,
        _ => 0.0,
    };
    score += match structure.file_types.len() {
        n if n > 10 => 0.3,
        n if n > 5 => 0.2,
        _ => 0.0,
    };
    score.min(1.0)
}

/// Share of commits mentioning tests, where one in three counts as full coverage.
pub fn testing_coverage(commits: &[CommitRecord], rules: &RuleBook) -> f64 {
    if commits.is_empty() {
        return 0.0;
    }
    let tests = commits.iter().filter(|c| rules.test_signals.matches_any(&c.message)).count();
    (tests as f64 / commits.len() as f64 * 3.0).min(1.0)
}

fn knowledge_concentration(profiles: &[DeveloperProfile]) -> f64 {
    if profiles.is_empty() {
        return 0.0;
    }
    profiles.iter().filter(|p| p.business_value.is_primary()).count() as f64 / profiles.len() as f64
}

fn communication_quality(commits: &[CommitRecord], rules: &RuleBook) -> f64 {
    if commits.is_empty() {
        return 0.0;
    }
    commits
        .iter()
        .map(|c| {
            let message = c.message.trim();
            let mut s = 0.5;
            if message.chars().count() >= 15 { s += 0.2; }
            if rules.conventional_prefixes.matches_any(message) { s += 0.3; }
            s
        })
        .sum::<f64>()
        / commits.len() as f64
}

fn timeline_risk(features: &[Feature]) -> f64 {
    if features.is_empty() {
        return 0.0;
    }
    let mut score = high_complexity_count(features) as f64 / features.len() as f64;
    if features.iter().any(|f| f.risk_level == RiskLevel::High) {
        score += 0.2;
    }
    if features.iter().any(|f| !f.dependencies.is_empty()) {
        score += 0.1;
    }
    score.min(1.0)
}

// ─── Assessment ───────────────────────────────────────────────────────────────

/// Runs every check. Team checks are skipped when there are no profiles.
pub fn assess_project_risks(ctx: &RiskContext) -> RiskAssessment {
    let mut technical = Vec::new();
    let mut team = Vec::new();
    let mut business = Vec::new();
    let mut unevaluated = Vec::new();

    for check in CHECKS {
        if check.category == RiskCategory::Team && ctx.profiles.is_empty() {
            continue;
        }
        let metric = match (check.measure)(ctx) {
            Evaluation::Evaluated(m) => m,
            Evaluation::Unevaluated => {
                unevaluated.push(check.id.to_string());
                continue;
            }
        };
        let Some(score) = (check.fires)(metric) else { continue };

        let risk = Risk {
            id: check.id.to_string(),
            name: check.name.to_string(),
            category: check.category,
            probability: check.probability,
            impact: check.impact,
            business_impact: check.business_impact.to_string(),
            description: (check.describe)(metric, ctx),
            mitigation_strategy: check.mitigation.to_string(),
            risk_score: score.clamp(0.0, 1.0),
            detected_at: ctx.now,
            status: RiskStatus::Identified,
        };
        match check.category {
            RiskCategory::Technical => technical.push(risk),
            RiskCategory::Team => team.push(risk),
            RiskCategory::Business => business.push(risk),
        }
    }

    let scores: Vec<f64> = technical.iter().chain(&team).chain(&business).map(|r| r.risk_score).collect();
    let with_mitigation = technical.iter().chain(&team).chain(&business)
        .filter(|r| !r.mitigation_strategy.is_empty())
        .count();

    RiskAssessment {
        total_risks: scores.len(),
        high_risks: scores.iter().filter(|&&s| s >= HIGH_SCORE).count(),
        medium_risks: scores.iter().filter(|&&s| (MEDIUM_SCORE..HIGH_SCORE).contains(&s)).count(),
        low_risks: scores.iter().filter(|&&s| s < MEDIUM_SCORE).count(),
        overall_risk_level: overall_level(&scores),
        technical_risks: technical,
        team_risks: team,
        business_risks: business,
        risk_trend: if !ctx.commits.is_empty() && !scores.is_empty() { "Stable" } else { "Unknown" }.to_string(),
        mitigation_coverage: if scores.is_empty() { 1.0 } else { with_mitigation as f64 / scores.len() as f64 },
        unevaluated_checks: unevaluated,
    }
}

fn overall_level(scores: &[f64]) -> RiskLevel {
    if scores.is_empty() {
        return RiskLevel::Low;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    if mean >= HIGH_SCORE {
        RiskLevel::High
    } else if mean >= MEDIUM_SCORE {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

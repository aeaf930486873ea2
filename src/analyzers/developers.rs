use chrono::{DateTime, Duration, FixedOffset, Utc};
use log::warn;
use std::collections::{HashMap, HashSet};
use crate::rules::RuleBook;
use crate::types::{
    AuthorStats, BusinessValue, CommitRecord, DeveloperProfile, SkillLevel, TeamDynamics,
};

const PERSONAL_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "outlook.com", "hotmail.com"];
const DEFAULT_ROLE: &str = "Developer";
const GENERAL_EXPERTISE: &str = "General Development";
const GENERAL_KNOWLEDGE: &str = "General Software Development";

/// Window for "recently active" authors.
pub const RECENT_WINDOW_DAYS: i64 = 30;
const BUS_FACTOR_SHARE: f64 = 0.7;

// ─── Author statistics ────────────────────────────────────────────────────────

/// One entry per distinct author name, largest contribution first.
pub fn compute_author_stats(commits: &[CommitRecord]) -> Vec<AuthorStats> {
    let mut order: Vec<AuthorStats> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for c in commits {
        let i = *index.entry(c.author.as_str()).or_insert_with(|| {
            order.push(AuthorStats {
                name: c.author.clone(),
                email: c.email.clone(),
                commit_count: 0,
                total_lines_added: 0,
                total_lines_deleted: 0,
                first_commit: c.timestamp,
                last_commit: c.timestamp,
                commit_frequency: 0.0,
                average_commit_size: 0.0,
                contribution_percentage: 0.0,
            });
            order.len() - 1
        });
        let s = &mut order[i];
        s.commit_count += 1;
        s.total_lines_added += c.lines_added;
        s.total_lines_deleted += c.lines_deleted;
        s.first_commit = s.first_commit.min(c.timestamp);
        s.last_commit = s.last_commit.max(c.timestamp);
    }

    let total = commits.len() as f64;
    for s in &mut order {
        let n = s.commit_count as f64;
        let days = (s.last_commit - s.first_commit).num_days().max(1);
        s.commit_frequency = n / days as f64;
        s.average_commit_size = (s.total_lines_added + s.total_lines_deleted) as f64 / n;
        s.contribution_percentage = n / total * 100.0;
    }

    order.sort_by(|a, b| b.contribution_percentage.total_cmp(&a.contribution_percentage));
    order
}

// ─── Profiles ─────────────────────────────────────────────────────────────────

/// Builds one profile per author. Profiles come back ordered by their
/// contribution-pattern text, descending.
pub fn build_developer_profiles(
    stats: &[AuthorStats],
    commits: &[CommitRecord],
    rules: &RuleBook,
) -> Vec<DeveloperProfile> {
    let mut profiles: Vec<DeveloperProfile> = stats
        .iter()
        .filter_map(|s| match build_profile(s, commits, rules) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("omitting developer profile: {e}");
                None
            }
        })
        .collect();
    profiles.sort_by(|a, b| b.contribution_pattern.cmp(&a.contribution_pattern));
    profiles
}

fn build_profile(stat: &AuthorStats, all: &[CommitRecord], rules: &RuleBook) -> Result<DeveloperProfile, String> {
    if stat.name.trim().is_empty() {
        return Err(format!("author <{}> has an empty name", stat.email));
    }
    let own: Vec<&CommitRecord> = all.iter().filter(|c| c.author == stat.name).collect();
    let skill_level = assess_skill_level(stat);

    Ok(DeveloperProfile {
        name: stat.name.clone(),
        email: stat.email.clone(),
        role: infer_role(&stat.email, rules),
        company: infer_company(&stat.email),
        expertise_areas: expertise_areas(&own, rules),
        skill_level,
        skill_description: skill_level.description().to_string(),
        contribution_pattern: contribution_pattern(stat.commit_frequency, &own),
        commit_frequency: stat.commit_frequency,
        last_contribution: stat.last_commit,
        business_value: contributor_value(stat.contribution_percentage),
        knowledge_areas: knowledge_areas(&own, rules),
        collaboration_score: collaboration_score(&own, all.len()),
        code_quality_score: code_quality_score(&own, rules),
    })
}

/// "jane@acme.io" → "Acme"; free-mail domains → "Individual".
pub fn infer_company(email: &str) -> String {
    let Some((_, domain)) = email.split_once('@') else {
        return "Unknown".to_string();
    };
    let domain = domain.to_lowercase();
    if PERSONAL_DOMAINS.contains(&domain.as_str()) {
        return "Individual".to_string();
    }
    let label = domain.split('.').next().unwrap_or("");
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unknown".to_string(),
    }
}

/// Only dotted local parts ("jane.lead") carry a role hint.
pub fn infer_role(email: &str, rules: &RuleBook) -> String {
    let local = email.split('@').next().unwrap_or("");
    if !local.contains('.') {
        return DEFAULT_ROLE.to_string();
    }
    rules.roles.first_match(local).copied().unwrap_or(DEFAULT_ROLE).to_string()
}

fn expertise_areas(commits: &[&CommitRecord], rules: &RuleBook) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for c in commits {
        if let Some(area) = rules.expertise.first_match(&c.message) {
            *counts.entry(area.label).or_insert(0) += 1;
        }
    }

    let n = commits.len() as f64;
    let mut areas: Vec<String> = rules.expertise
        .rules()
        .iter()
        .filter(|r| counts.get(r.label.label).copied().unwrap_or(0) as f64 > r.label.min_share * n)
        .map(|r| r.label.label.to_string())
        .collect();
    if areas.is_empty() {
        areas.push(GENERAL_EXPERTISE.to_string());
    }
    areas
}

/// Points for volume, share and small average commits.
pub fn assess_skill_level(stat: &AuthorStats) -> SkillLevel {
    let mut score = 0;
    score += match stat.commit_count {
        n if n >= 100 => 3,
        n if n >= 50 => 2,
        n if n >= 20 => 1,
        _ => 0,
    };
    if stat.contribution_percentage >= 50.0 {
        score += 2;
    } else if stat.contribution_percentage >= 20.0 {
        score += 1;
    }
    if stat.average_commit_size <= 50.0 {
        score += 2;
    } else if stat.average_commit_size <= 100.0 {
        score += 1;
    }

    match score {
        s if s >= 6 => SkillLevel::Expert,
        s if s >= 4 => SkillLevel::Senior,
        s if s >= 2 => SkillLevel::MidLevel,
        _ => SkillLevel::Junior,
    }
}

/// Mean whole-day gap between consecutive commits; `None` below two commits.
fn mean_gap_days(commits: &[&CommitRecord]) -> Option<f64> {
    if commits.len() < 2 {
        return None;
    }
    let mut dates: Vec<DateTime<FixedOffset>> = commits.iter().map(|c| c.timestamp).collect();
    dates.sort();
    let gaps: i64 = dates.windows(2).map(|w| (w[1] - w[0]).num_days()).sum();
    Some(gaps as f64 / (dates.len() - 1) as f64)
}

fn contribution_pattern(frequency: f64, commits: &[&CommitRecord]) -> String {
    match commits.len() {
        0 => return "No contributions".to_string(),
        1 => return "Single contribution".to_string(),
        _ => {}
    }
    let gap = mean_gap_days(commits).unwrap_or(0.0);

    let pace = if frequency >= 1.0 {
        "High frequency"
    } else if frequency >= 0.5 {
        "Regular"
    } else if frequency >= 0.2 {
        "Occasional"
    } else {
        "Infrequent"
    };
    let consistency = if gap <= 3.0 {
        "consistent"
    } else if gap <= 7.0 {
        "moderately consistent"
    } else {
        "sporadic"
    };
    format!("{pace}, {consistency} contributor")
}

pub fn contributor_value(contribution_percentage: f64) -> BusinessValue {
    match contribution_percentage {
        p if p >= 40.0 => BusinessValue::Critical,
        p if p >= 20.0 => BusinessValue::High,
        p if p >= 10.0 => BusinessValue::Medium,
        p if p >= 5.0 => BusinessValue::Low,
        _ => BusinessValue::Minimal,
    }
}

fn knowledge_areas(commits: &[&CommitRecord], rules: &RuleBook) -> Vec<String> {
    let mut areas: Vec<String> = rules.knowledge_areas
        .rules()
        .iter()
        .filter(|r| commits.iter().any(|c| r.matches(&c.message)))
        .map(|r| r.label.to_string())
        .collect();
    if areas.is_empty() {
        areas.push(GENERAL_KNOWLEDGE.to_string());
    }
    areas
}

fn collaboration_score(commits: &[&CommitRecord], total_commits: usize) -> f64 {
    if commits.is_empty() {
        return 0.0;
    }

    let cadence = match mean_gap_days(commits) {
        None => 0.5,
        Some(g) if g <= 3.0 => 1.0,
        Some(g) if g <= 7.0 => 0.8,
        Some(g) if g <= 14.0 => 0.6,
        Some(_) => 0.4,
    };

    let ratio = if total_commits > 0 { commits.len() as f64 / total_commits as f64 } else { 0.0 };
    let share = match ratio {
        r if r >= 0.3 => 1.0,
        r if r >= 0.2 => 0.8,
        r if r >= 0.1 => 0.6,
        _ => 0.4,
    };

    let practice = commits
        .iter()
        .map(|c| {
            let mut s = 0.5;
            if c.message.chars().count() >= 20 { s += 0.2; }
            match c.lines_changed() {
                n if n <= 100 => s += 0.3,
                n if n <= 500 => s += 0.1,
                _ => {}
            }
            s
        })
        .sum::<f64>()
        / commits.len() as f64;

    (cadence + share + practice) / 3.0
}

fn code_quality_score(commits: &[&CommitRecord], rules: &RuleBook) -> f64 {
    if commits.is_empty() {
        return 0.0;
    }
    commits
        .iter()
        .map(|c| {
            let message = c.message.trim();
            let mut s: f64 = 0.5;
            if message.chars().count() >= 15 { s += 0.2; }
            if rules.conventional_prefixes.matches_any(message) { s += 0.2; }
            s += match c.lines_changed() {
                n if n <= 50 => 0.3,
                n if n <= 200 => 0.2,
                n if n <= 500 => 0.1,
                _ => 0.0,
            };
            s += match c.files_changed {
                n if n <= 3 => 0.2,
                n if n <= 10 => 0.1,
                _ => 0.0,
            };
            s.min(1.0)
        })
        .sum::<f64>()
        / commits.len() as f64
}

// ─── Team dynamics ────────────────────────────────────────────────────────────

fn primary_ratio(profiles: &[DeveloperProfile]) -> f64 {
    if profiles.is_empty() {
        return 0.0;
    }
    profiles.iter().filter(|p| p.business_value.is_primary()).count() as f64 / profiles.len() as f64
}

/// Share of profiled authors with a commit inside the recent window.
pub fn recent_active_ratio(team_size: usize, commits: &[CommitRecord], now: DateTime<Utc>) -> f64 {
    if team_size == 0 {
        return 0.0;
    }
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent: HashSet<&str> = commits
        .iter()
        .filter(|c| c.timestamp.with_timezone(&Utc) > cutoff)
        .map(|c| c.author.as_str())
        .collect();
    recent.len() as f64 / team_size as f64
}

/// Smallest number of top contributors (by value tier) covering 70% of the team.
pub fn bus_factor(profiles: &[DeveloperProfile]) -> usize {
    if profiles.is_empty() {
        return 0;
    }
    let mut weights: Vec<u8> = profiles.iter().map(|p| p.business_value.weight()).collect();
    weights.sort_by(|a, b| b.cmp(a));

    let target = profiles.len() as f64 * BUS_FACTOR_SHARE;
    let mut count = 0;
    for _ in weights {
        count += 1;
        if count as f64 >= target {
            break;
        }
    }
    count
}

pub fn analyze_team_dynamics(
    profiles: &[DeveloperProfile],
    commits: &[CommitRecord],
    now: DateTime<Utc>,
    rules: &RuleBook,
) -> TeamDynamics {
    let primary: Vec<String> = profiles.iter()
        .filter(|p| p.business_value.is_primary())
        .map(|p| p.name.clone())
        .collect();
    let secondary: Vec<String> = profiles.iter()
        .filter(|p| !p.business_value.is_primary())
        .map(|p| p.name.clone())
        .collect();

    TeamDynamics {
        team_size: profiles.len(),
        collaboration_model: collaboration_model(profiles),
        knowledge_distribution: knowledge_distribution(profiles),
        bus_factor: bus_factor(profiles),
        primary_contributors: primary,
        secondary_contributors: secondary,
        knowledge_concentration: primary_ratio(profiles),
        team_stability: team_stability(profiles, commits, now),
        communication_patterns: communication_patterns(commits, rules),
    }
}

fn collaboration_model(profiles: &[DeveloperProfile]) -> String {
    if profiles.is_empty() {
        return "Unknown".to_string();
    }
    let primary = profiles.iter().filter(|p| p.business_value.is_primary()).count();
    let secondary = profiles.iter()
        .filter(|p| matches!(p.business_value, BusinessValue::Medium | BusinessValue::Low))
        .count();

    let model = if primary == 1 && secondary <= 2 {
        "Single Lead with Support"
    } else if primary <= 2 && secondary >= 3 {
        "Small Core Team with Extended Support"
    } else if primary >= 3 {
        "Collaborative Team"
    } else {
        "Distributed Team"
    };
    model.to_string()
}

fn knowledge_distribution(profiles: &[DeveloperProfile]) -> String {
    if profiles.is_empty() {
        return "Unknown".to_string();
    }
    let label = match primary_ratio(profiles) {
        r if r <= 0.3 => "Well Distributed",
        r if r <= 0.5 => "Moderately Distributed",
        _ => "Highly Concentrated",
    };
    label.to_string()
}

fn team_stability(profiles: &[DeveloperProfile], commits: &[CommitRecord], now: DateTime<Utc>) -> String {
    if profiles.is_empty() || commits.is_empty() {
        return "Unknown".to_string();
    }
    let label = match recent_active_ratio(profiles.len(), commits, now) {
        r if r == 0.0 => "Inactive",
        r if r >= 0.8 => "Very Stable",
        r if r >= 0.6 => "Stable",
        r if r >= 0.4 => "Moderately Stable",
        _ => "Unstable",
    };
    label.to_string()
}

fn communication_patterns(commits: &[CommitRecord], rules: &RuleBook) -> Vec<String> {
    if commits.is_empty() {
        return Vec::new();
    }
    let n = commits.len() as f64;
    let mean_len = commits.iter().map(|c| c.message.chars().count()).sum::<usize>() as f64 / n;
    let conventional = commits.iter().filter(|c| rules.conventional_prefixes.matches_any(&c.message)).count() as f64 / n;

    let detail = match mean_len {
        l if l >= 50.0 => "Detailed Communication",
        l if l >= 20.0 => "Standard Communication",
        _ => "Minimal Communication",
    };
    let style = match conventional {
        r if r >= 0.7 => "Structured Commit Messages",
        r if r >= 0.4 => "Mixed Commit Styles",
        _ => "Informal Commit Messages",
    };
    vec![detail.to_string(), style.to_string()]
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_commit(author: &str, message: &str, at: &str, lines: usize) -> CommitRecord {
        CommitRecord {
            hash: "abc".to_string(),
            author: author.to_string(),
            email: format!("{}@acme.io", author.to_lowercase()),
            timestamp: DateTime::parse_from_rfc3339(at).expect("valid timestamp"),
            message: message.to_string(),
            files_changed: 2,
            lines_added: lines,
            lines_deleted: 0,
            is_merge: false,
            branch: "main".to_string(),
        }
    }

    fn make_stat(commits: usize, share: f64, avg: f64) -> AuthorStats {
        let at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").expect("valid");
        AuthorStats {
            name: "Dev".to_string(),
            email: "dev@acme.io".to_string(),
            commit_count: commits,
            total_lines_added: 0,
            total_lines_deleted: 0,
            first_commit: at,
            last_commit: at,
            commit_frequency: 1.0,
            average_commit_size: avg,
            contribution_percentage: share,
        }
    }

    fn make_profile(name: &str, value: BusinessValue) -> DeveloperProfile {
        DeveloperProfile {
            name: name.to_string(),
            email: format!("{name}@acme.io"),
            role: "Developer".to_string(),
            company: "Acme".to_string(),
            expertise_areas: Vec::new(),
            skill_level: SkillLevel::MidLevel,
            skill_description: String::new(),
            contribution_pattern: String::new(),
            commit_frequency: 0.5,
            last_contribution: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").expect("valid"),
            business_value: value,
            knowledge_areas: Vec::new(),
            collaboration_score: 0.5,
            code_quality_score: 0.5,
        }
    }

    #[test]
    fn test_author_stats() {
        let commits = vec![
            make_commit("Ana", "feat: a", "2024-01-01T10:00:00Z", 10),
            make_commit("Ana", "fix: b", "2024-01-05T10:00:00Z", 30),
            make_commit("Ana", "docs: c", "2024-01-11T10:00:00Z", 20),
            make_commit("Bo", "chore", "2024-01-02T10:00:00Z", 5),
        ];
        let stats = compute_author_stats(&commits);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "Ana", "Largest contributor first");
        assert_eq!(stats[0].commit_count, 3);
        assert!((stats[0].commit_frequency - 0.3).abs() < 1e-9, "3 commits over 10 days");
        assert!((stats[0].average_commit_size - 20.0).abs() < 1e-9);
        assert!((stats[0].contribution_percentage - 75.0).abs() < 1e-9);
        assert!((stats[1].commit_frequency - 1.0).abs() < 1e-9, "Zero span counts as one day");
    }

    #[test]
    fn test_skill_expert() {
        assert_eq!(assess_skill_level(&make_stat(120, 55.0, 30.0)), SkillLevel::Expert);
        assert_eq!(assess_skill_level(&make_stat(60, 25.0, 80.0)), SkillLevel::Senior);
        assert_eq!(assess_skill_level(&make_stat(5, 2.0, 90.0)), SkillLevel::Junior);
        assert_eq!(assess_skill_level(&make_stat(5, 2.0, 40.0)), SkillLevel::MidLevel);
    }

    #[test]
    fn test_company_and_role() {
        let rules = RuleBook::default();
        assert_eq!(infer_company("jane@gmail.com"), "Individual");
        assert_eq!(infer_company("jane@acme.io"), "Acme");
        assert_eq!(infer_company("nobody"), "Unknown");
        assert_eq!(infer_role("jane.lead@acme.io", &rules), "Tech Lead");
        assert_eq!(infer_role("jane.dev@acme.io", &rules), "Developer");
        assert_eq!(infer_role("jane@acme.io", &rules), "Developer", "Default role");
        assert_eq!(infer_role("lead@acme.io", &rules), "Developer", "Undotted local part has no role hint");
        assert_eq!(infer_role("pmartin@acme.io", &rules), "Developer");
        assert_eq!(infer_role("jane.pm@acme.io", &rules), "Product Manager");
    }

    #[test]
    fn test_contributor_value_tiers() {
        assert_eq!(contributor_value(40.0), BusinessValue::Critical);
        assert_eq!(contributor_value(20.0), BusinessValue::High);
        assert_eq!(contributor_value(10.0), BusinessValue::Medium);
        assert_eq!(contributor_value(5.0), BusinessValue::Low);
        assert_eq!(contributor_value(4.9), BusinessValue::Minimal);
    }

    #[test]
    fn test_profile_contents() {
        let commits = vec![
            make_commit("Ana", "feat: react dashboard", "2024-01-01T10:00:00Z", 10),
            make_commit("Ana", "feat: api pagination", "2024-01-02T10:00:00Z", 30),
            make_commit("Ana", "fix: login bug", "2024-01-03T10:00:00Z", 20),
        ];
        let rules = RuleBook::default();
        let stats = compute_author_stats(&commits);
        let profiles = build_developer_profiles(&stats, &commits, &rules);
        let p = &profiles[0];

        assert_eq!(p.company, "Acme");
        assert_eq!(p.expertise_areas, vec!["Feature Development".to_string(), "Bug Fixing".to_string()]);
        assert_eq!(p.knowledge_areas, vec!["frontend".to_string(), "backend".to_string()]);
        assert_eq!(p.business_value, BusinessValue::Critical);
        assert_eq!(p.contribution_pattern, "High frequency, consistent contributor");
        assert!(p.collaboration_score > 0.0 && p.collaboration_score <= 1.0);
        assert!(p.code_quality_score > 0.0 && p.code_quality_score <= 1.0);
    }

    #[test]
    fn test_single_commit_pattern_and_fallbacks() {
        let commits = vec![make_commit("Bo", "wip", "2024-01-01T10:00:00Z", 10)];
        let rules = RuleBook::default();
        let profiles = build_developer_profiles(&compute_author_stats(&commits), &commits, &rules);
        assert_eq!(profiles[0].contribution_pattern, "Single contribution");
        assert_eq!(profiles[0].expertise_areas, vec!["General Development".to_string()]);
        assert_eq!(profiles[0].knowledge_areas, vec!["General Software Development".to_string()]);
    }

    #[test]
    fn test_empty_author_name_is_omitted() {
        let commits = vec![
            make_commit("", "feat: x", "2024-01-01T10:00:00Z", 1),
            make_commit("Ana", "feat: y", "2024-01-01T10:00:00Z", 1),
        ];
        let rules = RuleBook::default();
        let profiles = build_developer_profiles(&compute_author_stats(&commits), &commits, &rules);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "Ana");
    }

    #[test]
    fn test_team_dynamics_labels() {
        let profiles = vec![
            make_profile("a", BusinessValue::Critical),
            make_profile("b", BusinessValue::Low),
            make_profile("c", BusinessValue::Minimal),
        ];
        let now = DateTime::parse_from_rfc3339("2024-01-20T00:00:00Z").expect("valid").with_timezone(&Utc);
        let commits = vec![
            make_commit("a", "feat: something detailed enough to count", "2024-01-15T10:00:00Z", 5),
            make_commit("b", "wip", "2023-11-01T10:00:00Z", 5),
        ];
        let team = analyze_team_dynamics(&profiles, &commits, now, &RuleBook::default());

        assert_eq!(team.collaboration_model, "Single Lead with Support");
        assert_eq!(team.knowledge_distribution, "Moderately Distributed");
        assert_eq!(team.primary_contributors, vec!["a".to_string()]);
        assert_eq!(team.secondary_contributors, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(team.bus_factor, 3, "ceil(0.7 × 3)");
        assert_eq!(team.team_stability, "Unstable", "1 of 3 authors active recently");
        assert_eq!(team.communication_patterns, vec![
            "Standard Communication".to_string(),
            "Mixed Commit Styles".to_string(),
        ]);
    }

    #[test]
    fn test_team_dynamics_empty() {
        let now = Utc::now();
        let team = analyze_team_dynamics(&[], &[], now, &RuleBook::default());
        assert_eq!(team.collaboration_model, "Unknown");
        assert_eq!(team.knowledge_distribution, "Unknown");
        assert_eq!(team.team_stability, "Unknown");
        assert_eq!(team.bus_factor, 0);
        assert!(team.communication_patterns.is_empty());
    }

    #[test]
    fn test_inactive_team() {
        let profiles = vec![make_profile("a", BusinessValue::High)];
        let commits = vec![make_commit("a", "x", "2020-01-01T00:00:00Z", 1)];
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").expect("valid").with_timezone(&Utc);
        let team = analyze_team_dynamics(&profiles, &commits, now, &RuleBook::default());
        assert_eq!(team.team_stability, "Inactive");
    }

    fn any_value() -> impl Strategy<Value = BusinessValue> {
        prop_oneof![
            Just(BusinessValue::Critical),
            Just(BusinessValue::High),
            Just(BusinessValue::Medium),
            Just(BusinessValue::Low),
            Just(BusinessValue::Minimal),
        ]
    }

    proptest! {
        #[test]
        fn prop_bus_factor_bounds(values in proptest::collection::vec(any_value(), 1..25)) {
            let profiles: Vec<DeveloperProfile> = values
                .iter()
                .enumerate()
                .map(|(i, v)| make_profile(&format!("dev{i}"), *v))
                .collect();
            let bf = bus_factor(&profiles);
            prop_assert!(bf >= 1);
            prop_assert!(bf <= profiles.len());
        }
    }
}

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use crate::rules::RuleBook;
use crate::types::{CommitPattern, CommitRecord, FrequencyTrend, WorkKind};

static CONVENTIONAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(feat|fix|docs|style|refactor|test|chore)(\(.+\))?:")
        .expect("conventional commit regex")
});

const MIN_COMMITS_FOR_TREND: usize = 10;
const MIN_WEEKS_FOR_TREND:   usize = 3;
const TREND_UP:   f64 = 1.2;
const TREND_DOWN: f64 = 0.8;
const TOP_DAYS:   usize = 3;

/// Exclusive category for one commit: feature, then bugfix, then refactor,
/// then documentation. `None` means unclassified.
pub fn classify_commit(commit: &CommitRecord, rules: &RuleBook) -> Option<WorkKind> {
    rules.commit_kinds.first_match(&commit.message).copied()
}

/// Aggregates category counts, cadence and message quality over a history.
pub fn analyze_commit_patterns(commits: &[CommitRecord], rules: &RuleBook) -> CommitPattern {
    let mut pattern = CommitPattern {
        total_commits: commits.len(),
        feature_commits: 0,
        bug_fix_commits: 0,
        refactor_commits: 0,
        documentation_commits: 0,
        unclassified_commits: 0,
        merge_commits: 0,
        average_commits_per_day: 0.0,
        commit_frequency_trend: FrequencyTrend::Unknown,
        most_active_days: Vec::new(),
        commit_message_quality: 0.0,
    };
    if commits.is_empty() {
        return pattern;
    }

    for commit in commits {
        match classify_commit(commit, rules) {
            Some(WorkKind::Feature)       => pattern.feature_commits += 1,
            Some(WorkKind::Bugfix)        => pattern.bug_fix_commits += 1,
            Some(WorkKind::Refactor)      => pattern.refactor_commits += 1,
            Some(WorkKind::Documentation) => pattern.documentation_commits += 1,
            None                          => pattern.unclassified_commits += 1,
        }
        if commit.is_merge {
            pattern.merge_commits += 1;
        }
    }

    pattern.average_commits_per_day = average_per_day(commits);
    pattern.commit_frequency_trend = frequency_trend(commits);
    pattern.most_active_days = most_active_days(commits);
    pattern.commit_message_quality = average_message_quality(commits);
    pattern
}

/// Commits divided by the inclusive calendar span of the history.
fn average_per_day(commits: &[CommitRecord]) -> f64 {
    let first = commits.iter().map(|c| c.timestamp).min();
    let last = commits.iter().map(|c| c.timestamp).max();
    match (first, last) {
        (Some(first), Some(last)) => {
            let days = (last - first).num_days() + 1;
            commits.len() as f64 / days.max(1) as f64
        }
        _ => 0.0,
    }
}

/// Compares commit volume in the first ⌊n/3⌋ active ISO weeks against the
/// last ⌈n/3⌉.
pub fn frequency_trend(commits: &[CommitRecord]) -> FrequencyTrend {
    if commits.is_empty() {
        return FrequencyTrend::Unknown;
    }
    if commits.len() < MIN_COMMITS_FOR_TREND {
        return FrequencyTrend::InsufficientData;
    }

    let mut weekly: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for c in commits {
        let week = c.timestamp.iso_week();
        *weekly.entry((week.year(), week.week())).or_default() += 1;
    }
    if weekly.len() < MIN_WEEKS_FOR_TREND {
        return FrequencyTrend::InsufficientData;
    }

    let counts: Vec<usize> = weekly.into_values().collect();
    // Early window rounds down, late window rounds up.
    let early: usize = counts[..counts.len() / 3].iter().sum();
    let late_len = counts.len().div_ceil(3);
    let late: usize = counts[counts.len() - late_len..].iter().sum();

    let (early, late) = (early as f64, late as f64);
    if late > early * TREND_UP {
        FrequencyTrend::Increasing
    } else if late < early * TREND_DOWN {
        FrequencyTrend::Decreasing
    } else {
        FrequencyTrend::Stable
    }
}

/// Up to three weekday names, busiest first; ties keep first-seen order.
pub fn most_active_days(commits: &[CommitRecord]) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for c in commits {
        let day = c.timestamp.format("%A").to_string();
        match counts.iter_mut().find(|(d, _)| *d == day) {
            Some((_, n)) => *n += 1,
            None => counts.push((day, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(TOP_DAYS).map(|(d, _)| d).collect()
}

/// 0.3 for a message of at least ten characters, 0.4 for a conventional
/// prefix, 0.3 for a body beyond the subject line.
pub fn message_quality(message: &str) -> f64 {
    let message = message.trim();
    let mut score = 0.0;
    if message.chars().count() >= 10 {
        score += 0.3;
    }
    if CONVENTIONAL_PATTERN.is_match(message) {
        score += 0.4;
    }
    if message.lines().count() > 1 {
        score += 0.3;
    }
    score
}

pub fn average_message_quality(commits: &[CommitRecord]) -> f64 {
    if commits.is_empty() {
        return 0.0;
    }
    commits.iter().map(|c| message_quality(&c.message)).sum::<f64>() / commits.len() as f64
}

// ─── Tests ────────────────────────────────────────────────────────────────────

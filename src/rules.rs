use crate::types::{BusinessValue, WorkKind};

/// One keyword rule: matches when the lower-cased text contains any keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule<L> {
    pub keywords: Vec<String>,
    pub label: L,
}

impl<L> Rule<L> {
    pub fn matches(&self, text: &str) -> bool {
        rule_hits(self, &text.to_lowercase())
    }
}

/// Ordered keyword rules shared by every heuristic classifier.
///
/// Order matters for [`RuleTable::first_match`]; [`RuleTable::all_matches`]
/// reports labels in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable<L> {
    rules: Vec<Rule<L>>,
}

impl<L> RuleTable<L> {
    pub fn new(rules: Vec<Rule<L>>) -> Self {
        RuleTable { rules }
    }

    pub fn rules(&self) -> &[Rule<L>] {
        &self.rules
    }

    pub fn first_match(&self, text: &str) -> Option<&L> {
        let lower = text.to_lowercase();
        self.rules.iter()
            .find(|r| rule_hits(r, &lower))
            .map(|r| &r.label)
    }

    pub fn all_matches(&self, text: &str) -> Vec<&L> {
        let lower = text.to_lowercase();
        self.rules.iter()
            .filter(|r| rule_hits(r, &lower))
            .map(|r| &r.label)
            .collect()
    }

    pub fn matches_any(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }
}

impl<L: PartialEq> RuleTable<L> {
    /// Replaces the keywords of the rule carrying `label`, appending a new
    /// rule when the label is not present yet.
    pub fn set_keywords(&mut self, label: L, keywords: &[String]) {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        match self.rules.iter_mut().find(|r| r.label == label) {
            Some(rule) => rule.keywords = keywords,
            None => self.rules.push(Rule { keywords, label }),
        }
    }
}

/// Builds a rule from static keywords, lower-casing them.
pub fn rule<L>(keywords: &[&str], label: L) -> Rule<L> {
    Rule {
        keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        label,
    }
}

fn rule_hits<L>(rule: &Rule<L>, lower: &str) -> bool {
    rule.keywords.iter().any(|k| !k.is_empty() && lower.contains(k.as_str()))
}

/// Expertise label plus the minimum share of an author's commits it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpertiseArea {
    pub label: &'static str,
    pub min_share: f64,
}

/// Every keyword table the pipeline consults.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBook {
    pub commit_kinds: RuleTable<WorkKind>,
    pub feature_tags: RuleTable<&'static str>,
    pub feature_groups: RuleTable<&'static str>,
    pub business_value: RuleTable<BusinessValue>,
    pub expertise: RuleTable<ExpertiseArea>,
    pub knowledge_areas: RuleTable<&'static str>,
    pub roles: RuleTable<&'static str>,
    /// Per-commit debt weights; every matching rule adds its weight.
    pub debt_signals: RuleTable<f64>,
    pub test_signals: RuleTable<&'static str>,
    pub conventional_prefixes: RuleTable<&'static str>,
}

impl Default for RuleBook {
    fn default() -> Self {
        RuleBook {
            commit_kinds: RuleTable::new(vec![
                rule(&["feat:", "feature:", "add:", "implement:", "new:", "create:", "build:"], WorkKind::Feature),
                rule(&["fix:", "bugfix:", "bug:", "resolve:", "patch:", "correct:"], WorkKind::Bugfix),
                rule(&["refactor:", "cleanup:", "restructure:", "optimize:"], WorkKind::Refactor),
                rule(&["docs:", "documentation:", "readme:", "comment:", "update docs:"], WorkKind::Documentation),
            ]),
            feature_tags: RuleTable::new(vec![
                rule(&["bug", "fix", "patch"], "bugfix"),
                rule(&["feat", "feature", "add", "new"], "feature"),
                rule(&["refactor", "cleanup"], "refactor"),
                rule(&["docs", "documentation", "readme"], "documentation"),
                rule(&["test", "testing", "spec"], "testing"),
                rule(&["perf", "performance", "optimize"], "performance"),
                rule(&["security", "secure", "vulnerability"], "security"),
                rule(&["api", "endpoint"], "api"),
                rule(&["database", "sql", "migration", "schema"], "database"),
                rule(&["ui:", "(ui)", "frontend", "css", "layout"], "ui"),
            ]),
            feature_groups: RuleTable::new(vec![
                rule(&["ui", "component", "page", "screen", "view"], "User Interface"),
                rule(&["api", "service", "controller", "model"], "Backend Services"),
                rule(&["config", "setup", "deploy", "docker"], "Infrastructure"),
                rule(&["database", "data", "storage", "cache"], "Data Management"),
            ]),
            business_value: RuleTable::new(vec![
                rule(&["auth", "payment", "user", "core", "main", "critical"], BusinessValue::High),
                rule(&["api", "service", "component", "feature"], BusinessValue::Medium),
            ]),
            expertise: RuleTable::new(vec![
                rule(&["feat:", "feature:", "add:"], ExpertiseArea { label: "Feature Development", min_share: 0.3 }),
                rule(&["fix:", "bug:", "patch:"], ExpertiseArea { label: "Bug Fixing", min_share: 0.2 }),
                rule(&["refactor:", "cleanup:"], ExpertiseArea { label: "Code Refactoring", min_share: 0.2 }),
                rule(&["docs:", "readme:"], ExpertiseArea { label: "Documentation", min_share: 0.1 }),
                rule(&["test:", "spec:"], ExpertiseArea { label: "Testing", min_share: 0.1 }),
            ]),
            knowledge_areas: RuleTable::new(vec![
                rule(&["react", "vue", "angular", "javascript", "typescript", "css", "html"], "frontend"),
                rule(&["api", "server", "database", "sql", "nosql", "rest", "graphql"], "backend"),
                rule(&["docker", "kubernetes", "ci/cd", "deployment", "infrastructure"], "devops"),
                rule(&["test", "testing", "spec", "unit", "integration", "e2e"], "testing"),
                rule(&["security", "auth", "authentication", "encryption", "vulnerability"], "security"),
                rule(&["performance", "optimization", "caching", "scalability"], "performance"),
            ]),
            roles: RuleTable::new(vec![
                rule(&["dev"], "Developer"),
                rule(&["eng"], "Engineer"),
                rule(&["swe"], "Software Engineer"),
                rule(&["lead"], "Tech Lead"),
                rule(&["arch"], "Architect"),
                rule(&["mgr"], "Manager"),
                rule(&["pm"], "Product Manager"),
            ]),
            debt_signals: RuleTable::new(vec![
                rule(&["refactor", "cleanup", "technical debt", "legacy"], 1.0),
                rule(&["fix", "bug", "patch", "hotfix"], 0.3),
            ]),
            test_signals: RuleTable::new(vec![
                rule(&["test", "testing", "spec", "unit", "integration"], "testing"),
            ]),
            conventional_prefixes: RuleTable::new(vec![
                rule(&["feat:", "fix:", "docs:", "refactor:"], "conventional"),
            ]),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_respects_order() {
        let book = RuleBook::default();
        // "fix:" appears, but feature is checked first
        let kind = book.commit_kinds.first_match("feat: fix: both prefixes");
        assert_eq!(kind, Some(&WorkKind::Feature), "Earlier rule should win");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let book = RuleBook::default();
        assert_eq!(book.commit_kinds.first_match("FIX: crash"), Some(&WorkKind::Bugfix));
    }

    #[test]
    fn test_all_matches_collects_every_label() {
        let book = RuleBook::default();
        let tags = book.feature_tags.all_matches("add api endpoint and fix tests");
        assert_eq!(
            tags.into_iter().copied().collect::<Vec<_>>(),
            vec!["bugfix", "feature", "testing", "api"],
            "Tags should come back in table order"
        );
    }

    #[test]
    fn test_no_match_returns_none() {
        let book = RuleBook::default();
        assert!(book.commit_kinds.first_match("wip").is_none());
        assert!(!book.commit_kinds.matches_any("random words"));
    }

    #[test]
    fn test_set_keywords_replaces_existing_rule() {
        let mut book = RuleBook::default();
        book.commit_kinds.set_keywords(WorkKind::Feature, &["FEATURE/".to_string()]);
        assert_eq!(book.commit_kinds.first_match("feature/login"), Some(&WorkKind::Feature));
        assert!(
            book.commit_kinds.first_match("feat: login").is_none(),
            "Old keywords should be gone after replacement"
        );
        assert_eq!(book.commit_kinds.rules().len(), 4, "Rule count should not change");
    }

    #[test]
    fn test_empty_keyword_never_matches() {
        let table = RuleTable::new(vec![rule(&[""], "empty")]);
        assert!(table.first_match("anything").is_none(), "Empty keyword must not match everything");
    }
}

use chrono::DateTime;
use log::{debug, warn};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use crate::config::HistoryOptions;
use crate::error::{BriefError, Result};
use crate::types::CommitRecord;

// Record and field separators; neither appears in commit metadata.
const RS: char = '\x1e';
const US: char = '\x1f';

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Source of normalized commit records for one repository.
pub trait HistoryProvider {
    fn commits(&self, repo_path: &Path, options: &HistoryOptions) -> Result<Vec<CommitRecord>>;
}

/// Reads history by running `git log` in the repository.
pub struct GitCli;

impl HistoryProvider for GitCli {
    fn commits(&self, repo_path: &Path, options: &HistoryOptions) -> Result<Vec<CommitRecord>> {
        parse_log(repo_path, options)
    }
}

/// Asks `provider` for history and falls back to an empty list on failure.
pub fn load_history(
    provider: &dyn HistoryProvider,
    repo_path: &Path,
    options: &HistoryOptions,
) -> Vec<CommitRecord> {
    match provider.commits(repo_path, options) {
        Ok(commits) => commits,
        Err(e) => {
            warn!("{e}; continuing with an empty commit history");
            Vec::new()
        }
    }
}

/// Runs a single `git log --numstat` over all refs and returns one
/// [`CommitRecord`] per commit, with per-commit line and file totals.
pub fn parse_log(cwd: &Path, options: &HistoryOptions) -> Result<Vec<CommitRecord>> {
    let mut args: Vec<String> = vec![
        "log".into(),
        "--all".into(),
        "--source".into(),
        format!("--format={RS}%H{US}%an{US}%ae{US}%aI{US}%P{US}%S{US}%B{US}"),
        "--numstat".into(),
        format!("--max-count={}", options.max_commits),
    ];
    if !options.include_merges {
        args.push("--no-merges".into());
    }

    let mut child = Command::new("git")
        .args(&args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BriefError::History(format!("failed to run git: {e}")))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| BriefError::History("failed to capture git stdout".to_string()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| BriefError::History("failed to capture git stderr".to_string()))?;

    // Both pipes are drained on their own threads so a full pipe never
    // stalls the child while we poll for the deadline.
    let stdout_reader = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
        buf
    });
    let stderr_reader = thread::spawn(move || {
        let mut text = String::new();
        let _ = stderr.read_to_string(&mut text);
        text
    });

    let status = wait_with_deadline(&mut child, options.timeout)?;

    let raw = stdout_reader
        .join()
        .map_err(|_| BriefError::History("git stdout reader panicked".to_string()))?;
    let stderr_text = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        return Err(BriefError::History(format!("git log failed: {}", stderr_text.trim())));
    }

    let commits = parse_records(&String::from_utf8_lossy(&raw));
    debug!("parsed {} commits from git log", commits.len());
    Ok(commits)
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<std::process::ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(BriefError::Timeout(timeout.as_secs()));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(BriefError::History(format!("failed to wait for git process: {e}")))
            }
        }
    }
}

/// Splits raw `git log` output into commit records, skipping malformed ones.
pub fn parse_records(raw: &str) -> Vec<CommitRecord> {
    raw.split(RS)
        .filter(|r| !r.trim().is_empty())
        .filter_map(parse_record)
        .collect()
}

fn parse_record(record: &str) -> Option<CommitRecord> {
    let fields: Vec<&str> = record.splitn(8, US).collect();
    let [hash, author, email, date, parents, source, body, stats] = fields.as_slice() else {
        warn!("skipping malformed git log record ({} fields)", fields.len());
        return None;
    };

    let timestamp = match DateTime::parse_from_rfc3339(date.trim()) {
        Ok(ts) => ts,
        Err(e) => {
            warn!("skipping commit {}: unparseable date '{}': {e}", hash.trim(), date.trim());
            return None;
        }
    };

    let (files_changed, lines_added, lines_deleted) = parse_numstat(stats);

    Some(CommitRecord {
        hash: hash.trim().to_string(),
        author: author.trim().to_string(),
        email: email.trim().to_string(),
        timestamp,
        message: body.trim().to_string(),
        files_changed,
        lines_added,
        lines_deleted,
        is_merge: parents.split_whitespace().count() > 1,
        branch: branch_name(source.trim()),
    })
}

/// Sums `--numstat` lines. Binary files (`-\t-`) count as changed files with
/// no line delta; anything else that does not parse is ignored.
fn parse_numstat(block: &str) -> (usize, usize, usize) {
    let mut files = 0;
    let mut added = 0;
    let mut deleted = 0;

    for line in block.lines() {
        let mut parts = line.trim().splitn(3, '\t');
        let (Some(added_raw), Some(deleted_raw), Some(path)) =
            (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        if path.trim().is_empty() {
            continue;
        }
        match (added_raw, deleted_raw) {
            ("-", "-") => files += 1,
            (a, d) => {
                let (Ok(a), Ok(d)) = (a.parse::<usize>(), d.parse::<usize>()) else {
                    continue;
                };
                files += 1;
                added += a;
                deleted += d;
            }
        }
    }

    (files, added, deleted)
}

/// Reduces a `%S` source ref to a branch or tag name:
///   "refs/heads/main"           → "main"
///   "refs/remotes/origin/dev"   → "dev"
///   "refs/tags/v1.0"            → "v1.0"
fn branch_name(source: &str) -> String {
    if let Some(rest) = source.strip_prefix("refs/heads/") {
        return rest.to_string();
    }
    if let Some(rest) = source.strip_prefix("refs/remotes/") {
        return rest.split_once('/').map_or(rest, |(_, b)| b).to_string();
    }
    if let Some(rest) = source.strip_prefix("refs/tags/") {
        return rest.to_string();
    }
    source.to_string()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, date: &str, parents: &str, body: &str, stats: &str) -> String {
        format!("{RS}{hash}{US}Ada Lovelace{US}ada@example.com{US}{date}{US}{parents}{US}refs/heads/main{US}{body}\n{US}\n{stats}\n")
    }

    #[test]
    fn test_parses_fields_and_numstat() {
        let raw = record(
            "abc123",
            "2024-03-01T10:00:00+01:00",
            "p1",
            "feat: add login\n\nLonger body",
            "10\t2\tsrc/login.rs\n3\t0\tsrc/lib.rs",
        );
        let commits = parse_records(&raw);
        assert_eq!(commits.len(), 1);
        let c = &commits[0];
        assert_eq!(c.hash, "abc123");
        assert_eq!(c.author, "Ada Lovelace");
        assert_eq!(c.email, "ada@example.com");
        assert_eq!(c.message, "feat: add login\n\nLonger body", "Full message should be kept");
        assert_eq!(c.files_changed, 2);
        assert_eq!(c.lines_added, 13);
        assert_eq!(c.lines_deleted, 2);
        assert_eq!(c.branch, "main");
        assert!(!c.is_merge);
        assert_eq!(c.timestamp.offset().local_minus_utc(), 3600, "Author offset should be preserved");
    }

    #[test]
    fn test_binary_files_count_without_lines() {
        let raw = record("b1", "2024-03-01T10:00:00Z", "p1", "add logo", "-\t-\tassets/logo.png\n4\t1\tREADME.md");
        let c = &parse_records(&raw)[0];
        assert_eq!(c.files_changed, 2, "Binary file should still count as changed");
        assert_eq!(c.lines_added, 4);
        assert_eq!(c.lines_deleted, 1);
    }

    #[test]
    fn test_malformed_numstat_lines_ignored() {
        let raw = record("m1", "2024-03-01T10:00:00Z", "p1", "misc", "garbage line\nx\ty\tfile.rs\n2\t2\tok.rs");
        let c = &parse_records(&raw)[0];
        assert_eq!(c.files_changed, 1, "Only the well-formed line should count");
        assert_eq!(c.lines_changed(), 4);
    }

    #[test]
    fn test_two_parents_marks_merge() {
        let raw = record("m2", "2024-03-01T10:00:00Z", "p1 p2", "Merge branch 'dev'", "");
        assert!(parse_records(&raw)[0].is_merge, "Two parents should mean a merge commit");
    }

    #[test]
    fn test_bad_date_skips_only_that_record() {
        let raw = format!(
            "{}{}",
            record("bad", "not-a-date", "p1", "fix: thing", ""),
            record("good", "2024-03-02T10:00:00Z", "p1", "fix: other", ""),
        );
        let commits = parse_records(&raw);
        assert_eq!(commits.len(), 1, "Bad record should be skipped, not abort the parse");
        assert_eq!(commits[0].hash, "good");
    }

    #[test]
    fn test_truncated_record_skipped() {
        let raw = format!("{RS}deadbeef{US}only two fields");
        assert!(parse_records(&raw).is_empty());
    }

    #[test]
    fn test_branch_name_normalization() {
        assert_eq!(branch_name("refs/heads/feature/login"), "feature/login");
        assert_eq!(branch_name("refs/remotes/origin/dev"), "dev");
        assert_eq!(branch_name("refs/tags/v1.0"), "v1.0");
        assert_eq!(branch_name("HEAD"), "HEAD");
    }

    struct FailingProvider;

    impl HistoryProvider for FailingProvider {
        fn commits(&self, _: &Path, _: &HistoryOptions) -> Result<Vec<CommitRecord>> {
            Err(BriefError::Timeout(1))
        }
    }

    #[test]
    fn test_provider_failure_yields_empty_history() {
        let options = crate::config::AnalysisConfig::default().history;
        let commits = load_history(&FailingProvider, Path::new("."), &options);
        assert!(commits.is_empty(), "A failing provider should degrade to no commits");
    }

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().map(|o| o.status.success()).unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "user.name=Test Dev", "-c", "user.email=dev@example.com"])
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_DATE", "2024-01-10T12:00:00+00:00")
            .env("GIT_COMMITTER_DATE", "2024-01-10T12:00:00+00:00")
            .output()
            .expect("git should run");
        assert!(status.status.success(), "git {args:?} failed");
    }

    #[test]
    fn test_parse_log_real_repo() {
        if !git_available() {
            eprintln!("Skipping: git not available");
            return;
        }
        let dir = tempfile::tempdir().expect("tempdir");
        git(dir.path(), &["init", "-q"]);
        std::fs::write(dir.path().join("app.txt"), "one\ntwo\n").expect("write");
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", "feat: initial app"]);

        let options = crate::config::AnalysisConfig::default().history;
        let commits = parse_log(dir.path(), &options).expect("parse_log should succeed");
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].author, "Test Dev");
        assert_eq!(commits[0].message, "feat: initial app");
        assert_eq!(commits[0].lines_added, 2);
        assert_eq!(commits[0].files_changed, 1);
    }
}

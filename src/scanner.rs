use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};
use crate::error::{BriefError, Result};
use crate::types::FileRecord;

static SKIPPED_DIRS: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from([
    ".git", "node_modules", "__pycache__", ".pytest_cache", "build", "dist",
    "target", "bin", "obj", "vendor", ".venv", "venv",
]));

static CONFIG_FILENAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from([
    "package.json", "requirements.txt", "pom.xml", "build.gradle", "go.mod",
    "Cargo.toml", "docker-compose.yml", "docker-compose.yaml", "Dockerfile",
    ".gitignore", ".env", "config.yml", "config.yaml", "tsconfig.json",
    "webpack.config.js", "vite.config.js", "jest.config.js",
]));

static DOC_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from([
    ".md", ".txt", ".rst", ".adoc",
]));

static DOC_STEMS: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from([
    "README", "CHANGELOG", "LICENSE", "CONTRIBUTING",
]));

static SOURCE_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from([
    ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".go", ".rs",
    ".cpp", ".c", ".h", ".hpp", ".cs", ".php", ".rb", ".swift",
]));

/// Files and directories found under a repository root.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub files: Vec<FileRecord>,
    /// Relative directory paths, sorted.
    pub directories: Vec<String>,
}

/// Walks `root`, skipping dotfiles and well-known dependency/build
/// directories plus any names in `extra_skip_dirs`.
pub fn scan_repository(root: &Path, extra_skip_dirs: &[String]) -> Result<ScanResult> {
    if !root.is_dir() {
        return Err(BriefError::MissingRepo(root.to_path_buf()));
    }

    let mut result = ScanResult::default();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e, extra_skip_dirs));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable path: {e}");
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let Some(rel) = relative_path(root, entry.path()) else { continue };

        if entry.file_type().is_dir() {
            result.directories.push(rel);
        } else if entry.file_type().is_file() {
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            match file_record(entry.path(), rel) {
                Ok(record) => result.files.push(record),
                Err(e) => warn!("skipping file: {e}"),
            }
        }
    }

    result.directories.sort();
    debug!("scanned {} files in {} directories", result.files.len(), result.directories.len());
    Ok(result)
}

fn is_skipped_dir(entry: &DirEntry, extra: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    SKIPPED_DIRS.contains(name.as_ref()) || extra.iter().any(|d| d == name.as_ref())
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() { None } else { Some(parts.join("/")) }
}

fn file_record(path: &Path, rel: String) -> Result<FileRecord> {
    let meta = std::fs::metadata(path)
        .map_err(|e| BriefError::io(format!("Cannot stat {}", path.display()), e))?;
    let bytes = std::fs::read(path)
        .map_err(|e| BriefError::io(format!("Cannot read {}", path.display()), e))?;

    let name = rel.rsplit('/').next().unwrap_or(&rel).to_string();
    let extension = extension_of(&name);
    let stem = name.strip_suffix(&extension).unwrap_or(&name).to_uppercase();

    Ok(FileRecord {
        is_config: is_config_file(&rel, &name),
        is_documentation: DOC_EXTENSIONS.contains(extension.as_str()) || DOC_STEMS.contains(stem.as_str()),
        is_source: SOURCE_EXTENSIONS.contains(extension.as_str()),
        line_count: count_lines(&bytes),
        size: meta.len(),
        extension,
        path: rel,
    })
}

/// Lower-cased final extension with its dot, or empty.
fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(i) if i > 0 => name[i..].to_lowercase(),
        _ => String::new(),
    }
}

fn is_config_file(rel: &str, name: &str) -> bool {
    CONFIG_FILENAMES.contains(name)
        || (rel.starts_with(".github/workflows/") && (name.ends_with(".yml") || name.ends_with(".yaml")))
}

/// Text files count lines like an editor does; binary content counts as zero.
fn count_lines(bytes: &[u8]) -> usize {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.contains('\0') => text.lines().count(),
        _ => 0,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    fn find<'a>(scan: &'a ScanResult, rel: &str) -> Option<&'a FileRecord> {
        scan.files.iter().find(|f| f.path == rel)
    }

    #[test]
    fn test_scan_classifies_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "package.json", "{}\n");
        write(dir.path(), "README.md", "# hi\nthere\n");
        write(dir.path(), "src/app.ts", "a\nb\nc");
        write(dir.path(), "LICENSE", "MIT\n");

        let scan = scan_repository(dir.path(), &[]).expect("scan should succeed");

        let pkg = find(&scan, "package.json").expect("package.json should be scanned");
        assert!(pkg.is_config, "package.json is a config file");
        assert_eq!(pkg.extension, ".json");

        let readme = find(&scan, "README.md").expect("README.md should be scanned");
        assert!(readme.is_documentation);
        assert_eq!(readme.line_count, 2);

        let app = find(&scan, "src/app.ts").expect("nested file should use / separators");
        assert!(app.is_source);
        assert_eq!(app.line_count, 3, "Last line without newline still counts");

        let license = find(&scan, "LICENSE").expect("LICENSE should be scanned");
        assert!(license.is_documentation, "LICENSE is documentation by stem");
        assert_eq!(license.extension, "");

        assert_eq!(scan.directories, vec!["src".to_string()]);
    }

    #[test]
    fn test_scan_skips_ignored_dirs_and_dotfiles() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "node_modules/lib/index.js", "x");
        write(dir.path(), "target/debug/out.rs", "x");
        write(dir.path(), ".env", "SECRET=1");
        write(dir.path(), "generated/api.rs", "x");
        write(dir.path(), "src/main.rs", "fn main() {}");

        let scan = scan_repository(dir.path(), &["generated".to_string()]).expect("scan");
        let paths: Vec<&str> = scan.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.rs"], "Only the real source file should remain");
        assert!(!scan.directories.iter().any(|d| d.starts_with("node_modules")));
        assert!(!scan.directories.iter().any(|d| d == "generated"), "Extra skip dirs apply");
    }

    #[test]
    fn test_workflow_yaml_is_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), ".github/workflows/ci.yml", "on: push\n");
        let scan = scan_repository(dir.path(), &[]).expect("scan");
        let wf = find(&scan, ".github/workflows/ci.yml").expect("workflow should be scanned");
        assert!(wf.is_config);
    }

    #[test]
    fn test_binary_content_has_zero_lines() {
        assert_eq!(count_lines(&[0u8, 159, 146, 150]), 0);
        assert_eq!(count_lines(b"one\ntwo\n"), 2);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let err = scan_repository(Path::new("/definitely/not/here"), &[]).expect_err("missing root");
        assert!(matches!(err, BriefError::MissingRepo(_)));
    }
}

use log::warn;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use crate::scanner::ScanResult;
use crate::types::{FileRecord, RepoStructure, TechCategory, TechnologyEntry};

const SOURCE_CONFIDENCE: f64 = 0.7;
const BUILD_CONFIDENCE: f64 = 0.9;

/// Source-extension groups, reported in this order.
const LANGUAGE_GROUPS: &[(&str, TechCategory, &[&str])] = &[
    ("Python",         TechCategory::Backend,  &[".py"]),
    ("JavaScript/JSX", TechCategory::Frontend, &[".js", ".jsx"]),
    ("TypeScript",     TechCategory::Frontend, &[".ts", ".tsx"]),
    ("Java",           TechCategory::Backend,  &[".java"]),
    ("Go",             TechCategory::Backend,  &[".go"]),
    ("Rust",           TechCategory::Backend,  &[".rs"]),
    ("Ruby",           TechCategory::Backend,  &[".rb"]),
    ("PHP",            TechCategory::Backend,  &[".php"]),
    ("C#",             TechCategory::Backend,  &[".cs"]),
    ("Swift",          TechCategory::Frontend, &[".swift"]),
    ("C/C++",          TechCategory::Backend,  &[".c", ".h", ".cpp", ".hpp"]),
];

const BUILD_FILES: &[(&str, &str, TechCategory)] = &[
    ("Makefile",          "Make",    TechCategory::BuildTools),
    ("webpack.config.js", "Webpack", TechCategory::BuildTools),
    ("vite.config.js",    "Vite",    TechCategory::BuildTools),
    ("rollup.config.js",  "Rollup",  TechCategory::BuildTools),
    ("jest.config.js",    "Jest",    TechCategory::Testing),
    ("pytest.ini",        "Pytest",  TechCategory::Testing),
    ("conftest.py",       "Pytest",  TechCategory::Testing),
];

const LAYER_DIRS: &[&str] = &["controllers", "services", "repositories", "models", "views"];
const MVC_DIRS: &[&str] = &["models", "views", "controllers"];

fn entry(name: &str, category: TechCategory, confidence: f64, evidence: String, version: Option<String>) -> TechnologyEntry {
    TechnologyEntry { name: name.to_string(), category, confidence, evidence: vec![evidence], version }
}

// ─── Config-file pass ─────────────────────────────────────────────────────────

fn analyze_config_files(files: &[FileRecord], root: &Path) -> Vec<TechnologyEntry> {
    files
        .iter()
        .filter(|f| f.is_config)
        .filter_map(|f| {
            let name = f.file_name();
            let is_yaml = f.extension == ".yml" || f.extension == ".yaml";
            let handled = matches!(name, "package.json" | "requirements.txt" | "pom.xml" | "go.mod" | "Cargo.toml" | "Dockerfile");
            if !handled && !is_yaml {
                return None;
            }

            let content = match std::fs::read_to_string(root.join(&f.path)) {
                Ok(c) => c,
                Err(e) => {
                    warn!("cannot read {}: {e}", f.path);
                    return None;
                }
            };

            match name {
                "package.json"     => from_package_json(name, &content),
                "requirements.txt" => Some(from_requirements(name, &content)),
                "pom.xml"          => Some(from_pom(name, &content)),
                "go.mod"           => Some(from_go_mod(name, &content)),
                "Cargo.toml"       => Some(from_cargo_toml(name, &content)),
                "Dockerfile"       => Some(entry("Docker", TechCategory::Infrastructure, 0.8, format!("Found {name}"), None)),
                _                  => from_yaml(f, &content),
            }
        })
        .collect()
}

fn from_package_json(name: &str, content: &str) -> Option<TechnologyEntry> {
    let data: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            warn!("cannot parse {name}: {e}");
            return None;
        }
    };

    let mut deps: HashMap<&str, &serde_json::Value> = HashMap::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(map) = data.get(section).and_then(|v| v.as_object()) {
            deps.extend(map.iter().map(|(k, v)| (k.as_str(), v)));
        }
    }
    let version_of = |key: &str| deps.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let found_in = format!("Found in {name}");

    let frameworks: &[(&[&str], &str, TechCategory, f64)] = &[
        (&["react"],                    "React",      TechCategory::Frontend, 0.9),
        (&["vue"],                      "Vue.js",     TechCategory::Frontend, 0.9),
        (&["angular", "@angular/core"], "Angular",    TechCategory::Frontend, 0.9),
        (&["express"],                  "Express.js", TechCategory::Backend,  0.8),
    ];
    for (keys, tech, category, confidence) in frameworks {
        if let Some(key) = keys.iter().find(|k| deps.contains_key(*k)) {
            return Some(entry(tech, *category, *confidence, found_in, version_of(key)));
        }
    }

    let node = data.pointer("/engines/node").and_then(|v| v.as_str()).map(str::to_string);
    Some(entry("Node.js", TechCategory::Backend, 0.7, format!("Found {name}"), node))
}

fn from_requirements(name: &str, content: &str) -> TechnologyEntry {
    for line in content.lines() {
        let line = line.trim().to_lowercase();
        for (needle, tech) in [("django", "Django"), ("flask", "Flask")] {
            if line.contains(needle) {
                let version = line.split_once("==").map(|(_, v)| v.trim().to_string());
                return entry(tech, TechCategory::Backend, 0.9, format!("Found in {name}"), version);
            }
        }
    }
    entry("Python", TechCategory::Backend, 0.8, format!("Found {name}"), None)
}

fn from_pom(name: &str, content: &str) -> TechnologyEntry {
    if content.contains("spring-boot") {
        entry("Spring Boot", TechCategory::Backend, 0.9, format!("Found in {name}"), None)
    } else {
        entry("Java", TechCategory::Backend, 0.8, format!("Found {name}"), None)
    }
}

fn from_go_mod(name: &str, content: &str) -> TechnologyEntry {
    if content.contains("gin") {
        entry("Gin", TechCategory::Backend, 0.9, format!("Found in {name}"), None)
    } else {
        entry("Go", TechCategory::Backend, 0.8, format!("Found {name}"), None)
    }
}

fn from_cargo_toml(name: &str, content: &str) -> TechnologyEntry {
    if content.contains("axum") {
        entry("Axum", TechCategory::Backend, 0.9, format!("Found in {name}"), None)
    } else if content.contains("actix-web") {
        entry("Actix Web", TechCategory::Backend, 0.9, format!("Found in {name}"), None)
    } else {
        entry("Rust", TechCategory::Backend, 0.8, format!("Found {name}"), None)
    }
}

fn from_yaml(file: &FileRecord, content: &str) -> Option<TechnologyEntry> {
    let data: serde_yaml::Value = match serde_yaml::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            warn!("cannot parse {}: {e}", file.path);
            return None;
        }
    };
    let name = file.file_name();

    if data.as_mapping().is_some_and(|m| m.contains_key("services")) {
        return Some(entry("Docker Compose", TechCategory::Infrastructure, 0.9, format!("Found in {name}"), None));
    }
    if file.path.starts_with(".github/workflows/") {
        return Some(entry("GitHub Actions", TechCategory::CiCd, 0.9, format!("Found in {name}"), None));
    }
    None
}

// ─── Source and build passes ──────────────────────────────────────────────────

fn analyze_source_files(files: &[FileRecord]) -> Vec<TechnologyEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for f in files.iter().filter(|f| f.is_source) {
        *counts.entry(f.extension.as_str()).or_insert(0) += 1;
    }

    LANGUAGE_GROUPS
        .iter()
        .filter_map(|(name, category, exts)| {
            let count: usize = exts.iter().filter_map(|e| counts.get(e)).sum();
            (count > 0).then(|| {
                entry(name, *category, SOURCE_CONFIDENCE, format!("Found {count} {name} files"), None)
            })
        })
        .collect()
}

fn analyze_build_files(files: &[FileRecord]) -> Vec<TechnologyEntry> {
    files
        .iter()
        .filter_map(|f| {
            let name = f.file_name();
            BUILD_FILES
                .iter()
                .find(|(file, _, _)| *file == name)
                .map(|(_, tech, category)| entry(tech, *category, BUILD_CONFIDENCE, format!("Found {}", f.path), None))
        })
        .collect()
}

/// Merges entries sharing (name, category): evidence concatenated, highest
/// confidence kept, first non-empty version kept. First-seen order.
pub fn deduplicate(entries: Vec<TechnologyEntry>) -> Vec<TechnologyEntry> {
    let mut merged: Vec<TechnologyEntry> = Vec::new();
    for e in entries {
        match merged.iter_mut().find(|m| m.name == e.name && m.category == e.category) {
            Some(existing) => {
                existing.evidence.extend(e.evidence);
                existing.confidence = existing.confidence.max(e.confidence);
                if existing.version.as_deref().map_or(true, str::is_empty) {
                    existing.version = e.version.filter(|v| !v.is_empty()).or(existing.version.take());
                }
            }
            None => merged.push(e),
        }
    }
    merged
}

/// Scored, deduplicated technology inventory, most confident first.
pub fn identify_technology_stack(files: &[FileRecord], root: &Path) -> Vec<TechnologyEntry> {
    let mut all = analyze_config_files(files, root);
    all.extend(analyze_source_files(files));
    all.extend(analyze_build_files(files));

    let mut stack = deduplicate(all);
    stack.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    stack
}

// ─── Architecture ─────────────────────────────────────────────────────────────

pub fn detect_architecture_patterns(files: &[FileRecord]) -> Vec<String> {
    let lowered: Vec<String> = files.iter().map(|f| f.path.to_lowercase()).collect();
    let distinct = |names: &[&str]| -> usize {
        names.iter().filter(|n| lowered.iter().any(|p| p.contains(*n))).count()
    };
    let mut patterns = Vec::new();

    let service_paths = lowered.iter().filter(|p| p.contains("service") || p.contains("api")).count();
    let docker_files = files
        .iter()
        .filter(|f| f.path.ends_with("Dockerfile") || f.path.contains("docker-compose"))
        .count();
    if service_paths > 1 || docker_files > 1 {
        patterns.push("Microservices".to_string());
    }

    let package_files = files.iter().filter(|f| f.file_name() == "package.json").count();
    let has_ext = |ext: &str| files.iter().any(|f| f.extension == ext);
    if package_files > 1 || (has_ext(".py") && has_ext(".java")) {
        patterns.push("Monorepo".to_string());
    }

    if distinct(LAYER_DIRS) >= 3 {
        patterns.push("Layered Architecture".to_string());
    }
    if distinct(MVC_DIRS) >= 2 {
        patterns.push("Model-View-Controller (MVC)".to_string());
    }
    if lowered.iter().any(|p| p.contains("event") || p.contains("listener")) {
        patterns.push("Event-Driven Architecture".to_string());
    }

    patterns
}

/// Summarizes a scan: totals, extension histogram, stack and patterns.
pub fn analyze_structure(scan: &ScanResult, root: &Path) -> RepoStructure {
    let files = &scan.files;
    let mut file_types: BTreeMap<String, usize> = BTreeMap::new();
    for f in files {
        *file_types.entry(f.extension.clone()).or_insert(0) += 1;
    }

    RepoStructure {
        total_files: files.len(),
        total_lines: files.iter().map(|f| f.line_count).sum(),
        directories: scan.directories.clone(),
        file_types,
        technology_stack: identify_technology_stack(files, root),
        architecture_patterns: detect_architecture_patterns(files),
        config_files: files.iter().filter(|f| f.is_config).map(|f| f.path.clone()).collect(),
        documentation_files: files.iter().filter(|f| f.is_documentation).map(|f| f.path.clone()).collect(),
    }
}

/// Number of distinct technology names, regardless of category.
pub fn distinct_technologies(stack: &[TechnologyEntry]) -> usize {
    stack.iter().map(|t| t.name.as_str()).collect::<HashSet<_>>().len()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

//! Project snapshot: layout, git state and key files

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::process::Command;

/// Files larger than this are not inlined into the snapshot.
pub const MAX_IMPORTANT_FILE_BYTES: u64 = 50_000;

const IMPORTANT_FILES: &[&str] = &[
    "README.md",
    "README.txt",
    "README",
    "requirements.txt",
    "package.json",
    "Cargo.toml",
    "go.mod",
    "setup.py",
    "pyproject.toml",
    "pom.xml",
    "build.gradle",
    "Dockerfile",
    "docker-compose.yml",
    ".gitignore",
    "LICENSE",
    "Makefile",
];

/// Marker files per project type, checked in the project root.
const PROJECT_MARKERS: &[(&str, &[&str])] = &[
    ("python", &["requirements.txt", "setup.py", "pyproject.toml", "Pipfile"]),
    ("nodejs", &["package.json"]),
    ("java", &["pom.xml", "build.gradle"]),
    ("rust", &["Cargo.toml"]),
    ("go", &["go.mod"]),
    ("web", &["index.html", "package.json"]),
    ("docker", &["Dockerfile", "docker-compose.yml"]),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitInfo {
    #[serde(default)]
    pub current_branch: Option<String>,
    #[serde(default)]
    pub has_changes: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_commit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStructure {
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub total_files: usize,
    /// Lowercased extension with its dot ("" for none) to file count
    #[serde(default)]
    pub file_types: BTreeMap<String, usize>,
}

impl ProjectStructure {
    /// The `n` most common extensions, ties broken alphabetically.
    pub fn top_extensions(&self, n: usize) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .file_types
            .iter()
            .map(|(ext, count)| (ext.as_str(), *count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts.truncate(n);
        counts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub path: String,
    pub loaded_at: String,
    #[serde(default)]
    pub is_git_repo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_info: Option<GitInfo>,
    #[serde(default)]
    pub structure: ProjectStructure,
    #[serde(default)]
    pub project_type: Vec<String>,
    #[serde(default)]
    pub important_files: IndexMap<String, String>,
}

impl ProjectSnapshot {
    pub async fn load(path: &Path) -> Result<Self> {
        let root = tokio::fs::canonicalize(path)
            .await
            .with_context(|| format!("Project path not found: {}", path.display()))?;
        anyhow::ensure!(root.is_dir(), "Not a directory: {}", root.display());

        let is_git_repo = root.join(".git").exists();
        let git_info = if is_git_repo {
            Some(git_info(&root).await)
        } else {
            None
        };

        let walk_root = root.clone();
        let structure = tokio::task::spawn_blocking(move || scan_structure(&walk_root))
            .await
            .context("Project scan task panicked")?;

        Ok(Self {
            path: root.to_string_lossy().into_owned(),
            loaded_at: chrono::Local::now().to_rfc3339(),
            is_git_repo,
            git_info,
            structure,
            project_type: detect_project_types(&root),
            important_files: load_important_files(&root).await,
        })
    }
}

async fn git_output(dir: &Path, args: &[&str]) -> Option<String> {
    match Command::new("git").args(args).current_dir(dir).output().await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(error = %err, "git unavailable for context snapshot");
            None
        }
    }
}

/// Missing fields mean the corresponding git command failed.
async fn git_info(dir: &Path) -> GitInfo {
    let current_branch = git_output(dir, &["branch", "--show-current"]).await;
    let status = git_output(dir, &["status", "--porcelain"]).await;
    let last_commit = git_output(dir, &["log", "-1", "--oneline"]).await;
    GitInfo {
        current_branch,
        has_changes: status.as_deref().is_some_and(|s| !s.is_empty()),
        status,
        last_commit,
    }
}

/// Walks the tree honouring `.gitignore`, even outside a git checkout.
/// Hidden entries are included; the `.git` directory is not.
pub fn scan_structure(root: &Path) -> ProjectStructure {
    let mut structure = ProjectStructure::default();
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .require_git(false)
        .git_ignore(true)
        .git_exclude(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    for entry in walker.filter_map(|e| e.ok()) {
        if entry.depth() == 0 {
            continue;
        }
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();

        if file_type.is_dir() {
            structure.directories.push(relative);
        } else if file_type.is_file() {
            let extension = entry
                .path()
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
                .unwrap_or_default();
            *structure.file_types.entry(extension).or_insert(0) += 1;
            structure.files.push(relative);
            structure.total_files += 1;
        }
    }
    structure
}

pub fn detect_project_types(root: &Path) -> Vec<String> {
    PROJECT_MARKERS
        .iter()
        .filter(|(_, markers)| markers.iter().any(|marker| root.join(marker).exists()))
        .map(|(kind, _)| kind.to_string())
        .collect()
}

/// Small well-known files, read as text. Unreadable files are skipped.
async fn load_important_files(root: &Path) -> IndexMap<String, String> {
    let mut files = IndexMap::new();
    for name in IMPORTANT_FILES {
        let path = root.join(name);
        let Ok(metadata) = tokio::fs::metadata(&path).await else {
            continue;
        };
        if !metadata.is_file() || metadata.len() >= MAX_IMPORTANT_FILE_BYTES {
            continue;
        }
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                files.insert(name.to_string(), content);
            }
            Err(err) => tracing::debug!(file = name, error = %err, "skipping unreadable file"),
        }
    }
    files
}

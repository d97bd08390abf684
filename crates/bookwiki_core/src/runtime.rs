use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{self, CONFIG_FILENAME, WikiConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Env,
    Config,
    Heuristic,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Config => "config",
            Self::Heuristic => "heuristic",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub project_root: Option<PathBuf>,
    pub book_src: Option<PathBuf>,
    pub wiki_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
}

impl ResolutionContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        Ok(Self { cwd })
    }
}

/// Every path the pipeline touches, resolved up front so the whole run can
/// be pointed at a temporary directory.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub project_root: PathBuf,
    pub book_src_dir: PathBuf,
    pub summary_path: PathBuf,
    pub wiki_dir: PathBuf,
    pub config_path: PathBuf,
    pub root_source: ValueSource,
    pub book_source: ValueSource,
    pub wiki_source: ValueSource,
}

impl ResolvedPaths {
    pub fn diagnostics(&self) -> String {
        format!(
            "project_root={} ({})\nbook_src_dir={} ({})\nsummary_path={}\nwiki_dir={} ({})\nconfig_path={}",
            normalize_for_display(&self.project_root),
            self.root_source.as_str(),
            normalize_for_display(&self.book_src_dir),
            self.book_source.as_str(),
            normalize_for_display(&self.summary_path),
            normalize_for_display(&self.wiki_dir),
            self.wiki_source.as_str(),
            normalize_for_display(&self.config_path),
        )
    }
}

/// Resolve runtime paths and load the project config in one pass.
/// Precedence for each value: flag > env > config file > default.
pub fn resolve_paths(
    context: &ResolutionContext,
    overrides: &PathOverrides,
) -> Result<(ResolvedPaths, WikiConfig)> {
    resolve_paths_with_lookup(context, overrides, |key| env::var(key).ok())
}

fn resolve_paths_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: F,
) -> Result<(ResolvedPaths, WikiConfig)>
where
    F: Fn(&str) -> Option<String>,
{
    let (project_root, root_source) = resolve_project_root(context, overrides, &lookup_env);

    let config_path = if let Some(path) = overrides.config.as_deref() {
        absolutize(path, &project_root)
    } else if let Some(value) = lookup_env("BOOKWIKI_CONFIG") {
        absolutize(Path::new(value.trim()), &project_root)
    } else {
        project_root.join(CONFIG_FILENAME)
    };
    let config = config::load_config(&config_path)?;

    let (book_src_dir, book_source) = if let Some(path) = overrides.book_src.as_deref() {
        (absolutize(path, &project_root), ValueSource::Flag)
    } else if let Some(value) = lookup_env("BOOKWIKI_BOOK_SRC") {
        (
            absolutize(Path::new(value.trim()), &project_root),
            ValueSource::Env,
        )
    } else if config.book.src.is_some() {
        (
            absolutize(Path::new(config.book_src()), &project_root),
            ValueSource::Config,
        )
    } else {
        (
            project_root.join(config::DEFAULT_BOOK_SRC),
            ValueSource::Default,
        )
    };

    let (wiki_dir, wiki_source) = if let Some(path) = overrides.wiki_dir.as_deref() {
        (absolutize(path, &project_root), ValueSource::Flag)
    } else if let Some(value) = lookup_env("BOOKWIKI_WIKI_DIR") {
        (
            absolutize(Path::new(value.trim()), &project_root),
            ValueSource::Env,
        )
    } else if config.wiki.dir.is_some() {
        (
            absolutize(Path::new(config.wiki_dir()), &project_root),
            ValueSource::Config,
        )
    } else {
        (
            project_root.join(config::DEFAULT_WIKI_DIR),
            ValueSource::Default,
        )
    };

    let summary_path = book_src_dir.join(config.summary_filename());

    Ok((
        ResolvedPaths {
            project_root,
            book_src_dir,
            summary_path,
            wiki_dir,
            config_path,
            root_source,
            book_source,
            wiki_source,
        },
        config,
    ))
}

fn resolve_project_root<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: &F,
) -> (PathBuf, ValueSource)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = overrides.project_root.as_deref() {
        return (absolutize(path, &context.cwd), ValueSource::Flag);
    }

    if let Some(value) = lookup_env("BOOKWIKI_PROJECT_ROOT") {
        return (
            absolutize(Path::new(value.trim()), &context.cwd),
            ValueSource::Env,
        );
    }

    (
        detect_project_root_heuristic(&context.cwd),
        ValueSource::Heuristic,
    )
}

/// Walk up from the cwd looking for a directory that carries either a
/// config file or the default book layout. Falls back to the cwd itself.
fn detect_project_root_heuristic(cwd: &Path) -> PathBuf {
    let mut cursor = Some(cwd);
    while let Some(candidate) = cursor {
        if candidate.join(CONFIG_FILENAME).exists()
            || candidate
                .join(config::DEFAULT_BOOK_SRC)
                .join(config::DEFAULT_SUMMARY_FILENAME)
                .exists()
        {
            return candidate.to_path_buf();
        }
        cursor = candidate.parent();
    }
    cwd.to_path_buf()
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

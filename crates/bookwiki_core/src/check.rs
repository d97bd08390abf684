use std::collections::BTreeSet;
use std::fs;

use anyhow::{Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::links::{self, LinkOutcome};
use crate::runtime::ResolvedPaths;
use crate::summary::{self, PageMap, strip_leading_dot_slash};

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub chapter_count: usize,
    /// Chapters declared in the summary whose source file does not exist.
    pub missing_sources: Vec<String>,
    /// Markdown files under the book source that no summary entry references.
    pub orphan_sources: Vec<String>,
    pub links_rewritten: usize,
    pub links_external: usize,
    pub links_anchor: usize,
    pub links_unresolved: usize,
    pub unresolved_links: Vec<UnresolvedLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedLink {
    /// Chapter path as declared in the summary.
    pub chapter: String,
    pub target: String,
}

/// Audit the book without writing anything: missing sources, orphan
/// sources, and the outcome every link would get during a sync.
/// Findings are data; only I/O failures are errors.
pub fn run_check(paths: &ResolvedPaths) -> Result<CheckReport> {
    let summary_content = fs::read_to_string(&paths.summary_path)
        .with_context(|| format!("failed to read {}", paths.summary_path.display()))?;
    let chapters = summary::parse_summary(&summary_content);
    let page_map = PageMap::build(&chapters);

    let mut missing_sources = Vec::new();
    let mut links_rewritten = 0usize;
    let mut links_external = 0usize;
    let mut links_anchor = 0usize;
    let mut links_unresolved = 0usize;
    let mut unresolved_links = Vec::new();

    for chapter in &chapters {
        let source = paths.book_src_dir.join(&chapter.path);
        if !source.exists() {
            missing_sources.push(chapter.path.clone());
            continue;
        }
        let content = fs::read_to_string(&source)
            .with_context(|| format!("failed to read {}", source.display()))?;
        let page = links::rewrite_page(&content, &source, &paths.book_src_dir, &page_map);
        for record in page.links {
            match record.outcome {
                LinkOutcome::Rewritten { .. } => links_rewritten += 1,
                LinkOutcome::External => links_external += 1,
                LinkOutcome::Anchor => links_anchor += 1,
                LinkOutcome::Unresolved => {
                    links_unresolved += 1;
                    unresolved_links.push(UnresolvedLink {
                        chapter: chapter.path.clone(),
                        target: record.target,
                    });
                }
            }
        }
    }

    let orphan_sources = find_orphan_sources(paths, &chapters)?;

    Ok(CheckReport {
        chapter_count: chapters.len(),
        missing_sources,
        orphan_sources,
        links_rewritten,
        links_external,
        links_anchor,
        links_unresolved,
        unresolved_links,
    })
}

fn find_orphan_sources(
    paths: &ResolvedPaths,
    chapters: &[summary::Chapter],
) -> Result<Vec<String>> {
    let referenced: BTreeSet<String> = chapters
        .iter()
        .map(|chapter| strip_leading_dot_slash(&chapter.path).to_string())
        .collect();
    let summary_name = paths
        .summary_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut orphans = Vec::new();
    for entry in WalkDir::new(&paths.book_src_dir).follow_links(false) {
        let entry = entry
            .with_context(|| format!("failed to walk {}", paths.book_src_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&paths.book_src_dir)
            .with_context(|| {
                format!(
                    "failed to derive relative path from {} for {}",
                    paths.book_src_dir.display(),
                    entry.path().display()
                )
            })?;
        let relative = relative.to_string_lossy().replace('\\', "/");
        if relative == summary_name {
            continue;
        }
        if !referenced.contains(&relative) {
            orphans.push(relative);
        }
    }
    orphans.sort();
    Ok(orphans)
}

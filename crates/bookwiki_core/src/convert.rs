use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::WikiConfig;
use crate::links::{self, LinkOutcome};
use crate::navigation;
use crate::runtime::ResolvedPaths;
use crate::summary::{self, PageMap};

pub const HOME_PAGE: &str = "Home.md";
pub const SIDEBAR_PAGE: &str = "_Sidebar.md";

/// The one wiki-dir entry that survives a clear: the wiki's own checkout.
pub const PRESERVED_DIR: &str = ".git";

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub chapter_count: usize,
    pub pages: Vec<PageResult>,
    pub home_path: String,
    pub sidebar_path: String,
    pub links_rewritten: usize,
    pub links_unresolved: usize,
}

impl SyncReport {
    pub fn pages_written(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| page.status == PageStatus::Created)
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub title: String,
    pub slug: String,
    /// Source file the chapter was read from (or found missing).
    pub source_path: String,
    /// Emitted wiki page, present when status is `created`.
    pub output_path: Option<String>,
    pub status: PageStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Created,
    MissingSource,
}

/// Run the whole conversion: parse the summary, clear the wiki directory,
/// emit one page per chapter, then the navigation pages.
///
/// The summary is read before anything is deleted, so a missing summary
/// aborts with the wiki directory intact. A missing chapter source is a
/// per-item result, not an error; the run continues.
pub fn run_sync(paths: &ResolvedPaths, config: &WikiConfig) -> Result<SyncReport> {
    let summary_content = fs::read_to_string(&paths.summary_path)
        .with_context(|| format!("failed to read {}", paths.summary_path.display()))?;
    let chapters = summary::parse_summary(&summary_content);
    let page_map = PageMap::build(&chapters);

    fs::create_dir_all(&paths.wiki_dir)
        .with_context(|| format!("failed to create {}", paths.wiki_dir.display()))?;
    clear_wiki_dir(&paths.wiki_dir)?;

    let mut pages = Vec::with_capacity(chapters.len());
    let mut links_rewritten = 0usize;
    let mut links_unresolved = 0usize;

    for chapter in &chapters {
        let source = paths.book_src_dir.join(&chapter.path);
        if !source.exists() {
            pages.push(PageResult {
                title: chapter.title.clone(),
                slug: chapter.slug.clone(),
                source_path: display_path(&source),
                output_path: None,
                status: PageStatus::MissingSource,
            });
            continue;
        }

        let content = fs::read_to_string(&source)
            .with_context(|| format!("failed to read {}", source.display()))?;
        let page = links::rewrite_page(&content, &source, &paths.book_src_dir, &page_map);
        for record in &page.links {
            match record.outcome {
                LinkOutcome::Rewritten { .. } => links_rewritten += 1,
                LinkOutcome::Unresolved => links_unresolved += 1,
                LinkOutcome::External | LinkOutcome::Anchor => {}
            }
        }

        let output = paths.wiki_dir.join(format!("{}.md", chapter.slug));
        fs::write(&output, &page.content)
            .with_context(|| format!("failed to write {}", output.display()))?;
        pages.push(PageResult {
            title: chapter.title.clone(),
            slug: chapter.slug.clone(),
            source_path: display_path(&source),
            output_path: Some(display_path(&output)),
            status: PageStatus::Created,
        });
    }

    let sections = navigation::parse_sections(&summary_content, &page_map);

    let home_path = paths.wiki_dir.join(HOME_PAGE);
    fs::write(&home_path, navigation::render_home(&sections, config))
        .with_context(|| format!("failed to write {}", home_path.display()))?;

    let sidebar_path = paths.wiki_dir.join(SIDEBAR_PAGE);
    fs::write(&sidebar_path, navigation::render_sidebar(&sections))
        .with_context(|| format!("failed to write {}", sidebar_path.display()))?;

    Ok(SyncReport {
        chapter_count: chapters.len(),
        pages,
        home_path: display_path(&home_path),
        sidebar_path: display_path(&sidebar_path),
        links_rewritten,
        links_unresolved,
    })
}

/// Remove every entry in the wiki directory except the preserved
/// version-control subdirectory. Pages from a prior run never survive.
fn clear_wiki_dir(wiki_dir: &Path) -> Result<()> {
    let entries = fs::read_dir(wiki_dir)
        .with_context(|| format!("failed to list {}", wiki_dir.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to list {}", wiki_dir.display()))?;
        if entry.file_name() == PRESERVED_DIR {
            continue;
        }
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to inspect {}", path.display()))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        } else {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
    }
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::{PageStatus, run_sync};
    use crate::config::WikiConfig;
    use crate::runtime::{ResolvedPaths, ValueSource};

    fn fixture_paths(root: &Path) -> ResolvedPaths {
        let book_src_dir = root.join("docs/book/src");
        ResolvedPaths {
            summary_path: book_src_dir.join("SUMMARY.md"),
            book_src_dir,
            wiki_dir: root.join("wiki"),
            config_path: root.join("bookwiki.toml"),
            project_root: root.to_path_buf(),
            root_source: ValueSource::Flag,
            book_source: ValueSource::Default,
            wiki_source: ValueSource::Default,
        }
    }

    fn write_book(root: &Path) {
        let src = root.join("docs/book/src");
        fs::create_dir_all(src.join("guide")).expect("create src");
        fs::write(
            src.join("SUMMARY.md"),
            "\
# Summary

# Getting Started
- [Intro](intro.md)
- [Setup](setup.md)

# Reference
- [Install](guide/install.md)
",
        )
        .expect("write summary");
        fs::write(
            src.join("intro.md"),
            "# Intro\n\n<!-- toc -->\n\nSee [setup](./setup.md).\n",
        )
        .expect("write intro");
        fs::write(src.join("setup.md"), "# Setup\n\n[docs](https://example.com)\n")
            .expect("write setup");
        fs::write(
            src.join("guide/install.md"),
            "# Install\n\nBack to [intro](../intro.md).\n",
        )
        .expect("write install");
    }

    fn snapshot(dir: &Path) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for entry in fs::read_dir(dir).expect("read wiki dir") {
            let entry = entry.expect("dir entry");
            if entry.file_type().expect("file type").is_file() {
                out.insert(
                    entry.file_name().to_string_lossy().to_string(),
                    fs::read_to_string(entry.path()).expect("read page"),
                );
            }
        }
        out
    }

    #[test]
    fn sync_emits_pages_and_navigation() {
        let temp = tempdir().expect("tempdir");
        write_book(temp.path());
        let paths = fixture_paths(temp.path());

        let report = run_sync(&paths, &WikiConfig::default()).expect("sync");
        assert_eq!(report.chapter_count, 3);
        assert_eq!(report.pages_written(), 3);
        assert_eq!(report.links_rewritten, 2);

        let intro = fs::read_to_string(paths.wiki_dir.join("Intro.md")).expect("intro page");
        assert!(intro.contains("[setup](Setup)"));
        assert!(!intro.to_lowercase().contains("<!-- toc -->"));

        let install = fs::read_to_string(paths.wiki_dir.join("Install.md")).expect("install page");
        assert!(install.contains("[intro](Intro)"));

        let setup = fs::read_to_string(paths.wiki_dir.join("Setup.md")).expect("setup page");
        assert!(setup.contains("[docs](https://example.com)"));

        assert!(paths.wiki_dir.join("Home.md").exists());
        assert!(paths.wiki_dir.join("_Sidebar.md").exists());
    }

    #[test]
    fn sync_clears_stale_pages_but_preserves_git_dir() {
        let temp = tempdir().expect("tempdir");
        write_book(temp.path());
        let paths = fixture_paths(temp.path());

        fs::create_dir_all(paths.wiki_dir.join(".git")).expect("create .git");
        fs::write(paths.wiki_dir.join(".git/HEAD"), "ref: refs/heads/master\n")
            .expect("write HEAD");
        fs::write(paths.wiki_dir.join("Stale.md"), "old page\n").expect("write stale");
        fs::create_dir_all(paths.wiki_dir.join("stale-dir")).expect("create stale dir");

        run_sync(&paths, &WikiConfig::default()).expect("sync");

        assert!(!paths.wiki_dir.join("Stale.md").exists());
        assert!(!paths.wiki_dir.join("stale-dir").exists());
        let head = fs::read_to_string(paths.wiki_dir.join(".git/HEAD")).expect("read HEAD");
        assert_eq!(head, "ref: refs/heads/master\n");
    }

    #[test]
    fn sync_twice_is_byte_identical() {
        let temp = tempdir().expect("tempdir");
        write_book(temp.path());
        let paths = fixture_paths(temp.path());

        run_sync(&paths, &WikiConfig::default()).expect("first sync");
        let first = snapshot(&paths.wiki_dir);
        run_sync(&paths, &WikiConfig::default()).expect("second sync");
        let second = snapshot(&paths.wiki_dir);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_chapter_source_is_skipped_not_fatal() {
        let temp = tempdir().expect("tempdir");
        write_book(temp.path());
        fs::remove_file(temp.path().join("docs/book/src/setup.md")).expect("remove setup");
        let paths = fixture_paths(temp.path());

        let report = run_sync(&paths, &WikiConfig::default()).expect("sync");
        assert_eq!(report.chapter_count, 3);
        assert_eq!(report.pages_written(), 2);
        let skipped = report
            .pages
            .iter()
            .find(|page| page.status == PageStatus::MissingSource)
            .expect("skipped page");
        assert_eq!(skipped.slug, "Setup");
        assert!(skipped.output_path.is_none());
        // Navigation still references the skipped chapter's slug.
        let home = fs::read_to_string(paths.wiki_dir.join("Home.md")).expect("home");
        assert!(home.contains("(Setup)"));
    }

    #[test]
    fn missing_summary_is_fatal_and_leaves_wiki_dir_untouched() {
        let temp = tempdir().expect("tempdir");
        let paths = fixture_paths(temp.path());
        fs::create_dir_all(&paths.wiki_dir).expect("create wiki dir");
        fs::write(paths.wiki_dir.join("Keep.md"), "still here\n").expect("write page");

        let error = run_sync(&paths, &WikiConfig::default()).expect_err("must fail");
        assert!(error.to_string().contains("failed to read"));
        assert!(paths.wiki_dir.join("Keep.md").exists());
    }

    #[test]
    fn emitted_page_overwrites_previous_content() {
        let temp = tempdir().expect("tempdir");
        write_book(temp.path());
        let paths = fixture_paths(temp.path());

        fs::create_dir_all(&paths.wiki_dir).expect("create wiki dir");
        fs::write(paths.wiki_dir.join("Intro.md"), "stale\n").expect("write stale intro");

        run_sync(&paths, &WikiConfig::default()).expect("sync");
        let intro = fs::read_to_string(paths.wiki_dir.join("Intro.md")).expect("intro page");
        assert!(intro.starts_with("# Intro"));
    }
}

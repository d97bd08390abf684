use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Matches `[Title](path.md)` anywhere in the summary, at any nesting depth.
static CHAPTER_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+\.md)\)").expect("chapter link regex"));

/// A chapter entry from the summary document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    /// Source path exactly as declared in the summary.
    pub path: String,
    pub slug: String,
}

/// Derive a filename/link-safe page name from a chapter title.
///
/// Drops characters outside the word/whitespace/hyphen class, collapses
/// whitespace and underscore runs into single hyphens, then trims
/// leading/trailing hyphens. Distinct titles can collide on the same slug;
/// the last chapter registered wins.
pub fn slugify(title: &str) -> String {
    static DROP_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("slug drop regex"));
    static RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\s_]+").expect("slug run regex"));

    let slug = DROP_RE.replace_all(title, "");
    let slug = RUN_RE.replace_all(&slug, "-");
    slug.trim_matches('-').to_string()
}

/// Extract the ordered chapter list from the summary document text.
/// External (`http`-prefixed) targets are skipped; nesting is flattened.
pub fn parse_summary(content: &str) -> Vec<Chapter> {
    let mut chapters = Vec::new();
    for caps in CHAPTER_LINK_RE.captures_iter(content) {
        let title = &caps[1];
        let path = &caps[2];
        if path.starts_with("http") {
            continue;
        }
        chapters.push(Chapter {
            title: title.to_string(),
            path: path.to_string(),
            slug: slugify(title),
        });
    }
    chapters
}

/// Lookup from source-relative path variants to page slug.
///
/// Each chapter is reachable under three keys: the path as declared
/// (leading `./` stripped), the path without its extension, and the path
/// with the extension re-appended. Incoming links use any of these forms.
#[derive(Debug, Clone, Default)]
pub struct PageMap {
    entries: HashMap<String, String>,
}

impl PageMap {
    pub fn build(chapters: &[Chapter]) -> Self {
        let mut entries = HashMap::new();
        for chapter in chapters {
            let path = strip_leading_dot_slash(&chapter.path);
            let stem = md_stem(path);
            entries.insert(path.to_string(), chapter.slug.clone());
            entries.insert(stem.to_string(), chapter.slug.clone());
            entries.insert(format!("{stem}.md"), chapter.slug.clone());
        }
        Self { entries }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strip any run of leading `.` and `/` characters, so `./intro.md` and
/// `intro.md` address the same chapter.
pub fn strip_leading_dot_slash(path: &str) -> &str {
    path.trim_start_matches(['.', '/'])
}

/// Text up to the last `.md` occurrence, or the whole string if none.
pub(crate) fn md_stem(path: &str) -> &str {
    match path.rfind(".md") {
        Some(index) => &path[..index],
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_drops_punctuation_and_hyphenates_spaces() {
        assert_eq!(slugify("Getting Started!"), "Getting-Started");
    }

    #[test]
    fn slugify_strips_symbols_and_outer_hyphens() {
        assert_eq!(slugify("  Leading/Trailing  "), "LeadingTrailing");
    }

    #[test]
    fn slugify_collapses_underscore_and_space_runs() {
        assert_eq!(slugify("a_b  c__d"), "a-b-c-d");
        assert_eq!(slugify("Core   Concepts"), "Core-Concepts");
    }

    #[test]
    fn slugify_is_deterministic() {
        assert_eq!(slugify("State & Reactivity"), slugify("State & Reactivity"));
    }

    #[test]
    fn parse_summary_preserves_document_order() {
        let summary = "\
# Summary

- [Introduction](intro.md)
  - [Installation](getting-started/install.md)
- [Core Concepts](concepts.md)
";
        let chapters = parse_summary(summary);
        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].title, "Introduction");
        assert_eq!(chapters[0].path, "intro.md");
        assert_eq!(chapters[0].slug, "Introduction");
        assert_eq!(chapters[1].path, "getting-started/install.md");
        assert_eq!(chapters[2].slug, "Core-Concepts");
    }

    #[test]
    fn parse_summary_skips_external_links() {
        let summary = "- [Local](local.md)\n- [Remote](https://example.com/page.md)\n";
        let chapters = parse_summary(summary);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].path, "local.md");
    }

    #[test]
    fn parse_summary_ignores_non_md_links() {
        let summary = "- [Chapter](chapter.md)\n- [Logo](images/logo.png)\n";
        let chapters = parse_summary(summary);
        assert_eq!(chapters.len(), 1);
    }

    #[test]
    fn page_map_registers_three_variants_per_chapter() {
        let chapters = parse_summary("- [Intro](./intro.md)\n");
        let map = PageMap::build(&chapters);
        assert_eq!(map.get("intro.md"), Some("Intro"));
        assert_eq!(map.get("intro"), Some("Intro"));
        assert_eq!(map.get("./intro.md"), None);
    }

    #[test]
    fn page_map_collision_is_last_writer_wins() {
        let chapters = vec![
            Chapter {
                title: "Setup!".to_string(),
                path: "a.md".to_string(),
                slug: slugify("Setup!"),
            },
            Chapter {
                title: "Setup?".to_string(),
                path: "b.md".to_string(),
                slug: slugify("Setup?"),
            },
        ];
        let map = PageMap::build(&chapters);
        // Both titles slug to "Setup"; each path still resolves.
        assert_eq!(map.get("a.md"), Some("Setup"));
        assert_eq!(map.get("b.md"), Some("Setup"));
    }

    #[test]
    fn md_stem_splits_at_last_occurrence() {
        assert_eq!(md_stem("intro.md"), "intro");
        assert_eq!(md_stem("setup.md#install"), "setup");
        assert_eq!(md_stem("no-extension"), "no-extension");
    }
}

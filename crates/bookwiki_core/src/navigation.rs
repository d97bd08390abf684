use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::WikiConfig;
use crate::summary::{PageMap, strip_leading_dot_slash};

/// Top-level `# Header` line opening a navigation section.
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s+(.+)$").expect("section header regex"));

/// Chapter link line, with or without a list marker.
static NAV_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s*-\s*)?\[([^\]]+)\]\(([^)]+\.md)\)").expect("nav entry regex")
});

/// The summary's own document title; never rendered as a section.
const SUPPRESSED_SECTION: &str = "Summary";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavSection {
    /// None for entries appearing before any section header.
    pub title: Option<String>,
    pub entries: Vec<NavEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub title: String,
    pub slug: String,
}

/// Second pass over the raw summary lines: group chapter links under the
/// top-level headers around them. Entries whose path the page map cannot
/// resolve are dropped silently.
pub fn parse_sections(summary: &str, page_map: &PageMap) -> Vec<NavSection> {
    let mut sections: Vec<NavSection> = Vec::new();
    for line in summary.lines() {
        if let Some(caps) = SECTION_RE.captures(line) {
            let title = &caps[1];
            if title != SUPPRESSED_SECTION {
                sections.push(NavSection {
                    title: Some(title.to_string()),
                    entries: Vec::new(),
                });
            }
            continue;
        }

        if let Some(caps) = NAV_ENTRY_RE.captures(line) {
            let title = &caps[1];
            let path = strip_leading_dot_slash(&caps[2]);
            let Some(slug) = page_map.get(path) else {
                continue;
            };
            if sections.is_empty() {
                sections.push(NavSection {
                    title: None,
                    entries: Vec::new(),
                });
            }
            if let Some(section) = sections.last_mut() {
                section.entries.push(NavEntry {
                    title: title.to_string(),
                    slug: slug.to_string(),
                });
            }
        }
    }
    sections
}

/// Landing page: front-matter title, optional intro, heading-level
/// section markers.
pub fn render_home(sections: &[NavSection], config: &WikiConfig) -> String {
    let mut content = format!("# {}\n\n", config.home_title());
    if let Some(intro) = config.home_intro() {
        content.push_str(intro);
        content.push_str("\n\n");
    }
    content.push_str("## Documentation\n\n");
    for section in sections {
        if let Some(title) = &section.title {
            content.push_str(&format!("\n### {title}\n\n"));
        }
        push_entries(&mut content, section);
    }
    content
}

/// Sidebar: compact listing with emphasis-style section markers.
pub fn render_sidebar(sections: &[NavSection]) -> String {
    let mut content = String::from("## Navigation\n\n");
    for section in sections {
        if let Some(title) = &section.title {
            content.push_str(&format!("\n**{title}**\n\n"));
        }
        push_entries(&mut content, section);
    }
    content
}

fn push_entries(content: &mut String, section: &NavSection) {
    for entry in &section.entries {
        content.push_str(&format!("- [{}]({})\n", entry.title, entry.slug));
    }
}

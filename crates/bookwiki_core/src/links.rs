use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::summary::{PageMap, md_stem, strip_leading_dot_slash};

/// Matches `[text](target)`. Character classes keep the captures from
/// crossing bracket/paren boundaries; only link syntax is ever touched.
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link regex"));

/// mdBook's inline table-of-contents placeholder.
static TOC_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!--\s*toc\s*-->").expect("toc marker regex"));

/// What happened to a single markdown link during rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Target resolved through the page map; rewritten to the slug.
    Rewritten { slug: String },
    /// External scheme; left byte-identical.
    External,
    /// Same-document anchor; left byte-identical.
    Anchor,
    /// Not a known chapter path; left byte-identical.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub target: String,
    pub outcome: LinkOutcome,
}

#[derive(Debug, Clone)]
pub struct RewrittenPage {
    pub content: String,
    pub links: Vec<LinkRecord>,
}

/// Rewrite every resolvable chapter link in `content` to its flat slug and
/// strip the toc placeholder. `source_path` is the chapter's own source
/// file, needed to resolve `./`- and `../`-relative targets.
pub fn rewrite_page(
    content: &str,
    source_path: &Path,
    book_src: &Path,
    page_map: &PageMap,
) -> RewrittenPage {
    let mut links = Vec::new();
    let rewritten = LINK_RE.replace_all(content, |caps: &Captures| {
        let text = &caps[1];
        let target = &caps[2];
        let outcome = resolve_target(target, source_path, book_src, page_map);
        let replacement = match &outcome {
            LinkOutcome::Rewritten { slug } => format!("[{text}]({slug})"),
            _ => caps[0].to_string(),
        };
        links.push(LinkRecord {
            target: target.to_string(),
            outcome,
        });
        replacement
    });
    let content = TOC_MARKER_RE.replace_all(&rewritten, "").into_owned();
    RewrittenPage { content, links }
}

fn resolve_target(
    target: &str,
    source_path: &Path,
    book_src: &Path,
    page_map: &PageMap,
) -> LinkOutcome {
    if target.starts_with("http") {
        return LinkOutcome::External;
    }
    if target.starts_with('#') {
        return LinkOutcome::Anchor;
    }

    // Relative targets are resolved against the source file's directory
    // and re-rooted at the book source; on failure the original target
    // string is used for lookup as-is.
    let mut lookup_target = target.to_string();
    if (target.starts_with("./") || target.starts_with("../"))
        && let Some(resolved) = resolve_relative(target, source_path, book_src)
    {
        lookup_target = resolved;
    }

    let extensioned = format!("{}.md", md_stem(&lookup_target));
    if let Some(slug) = page_map.get(strip_leading_dot_slash(&extensioned)) {
        return LinkOutcome::Rewritten {
            slug: slug.to_string(),
        };
    }

    let bare = strip_leading_dot_slash(md_stem(&lookup_target));
    if let Some(slug) = page_map.get(bare) {
        return LinkOutcome::Rewritten {
            slug: slug.to_string(),
        };
    }

    LinkOutcome::Unresolved
}

fn resolve_relative(target: &str, source_path: &Path, book_src: &Path) -> Option<String> {
    let current_dir = source_path.parent()?;
    let normalized = normalize_components(&current_dir.join(target));
    let relative = normalized
        .strip_prefix(normalize_components(book_src))
        .ok()?;
    Some(relative.to_string_lossy().replace('\\', "/"))
}

/// Lexical normalization: `.` segments dropped, `..` pops. No filesystem
/// access, so dangling targets still resolve.
fn normalize_components(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Path::new(std::path::MAIN_SEPARATOR_STR)),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

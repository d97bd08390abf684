use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BOOK_SRC: &str = "docs/book/src";
pub const DEFAULT_SUMMARY_FILENAME: &str = "SUMMARY.md";
pub const DEFAULT_WIKI_DIR: &str = "wiki";
pub const DEFAULT_HOME_TITLE: &str = "Home";

pub const CONFIG_FILENAME: &str = "bookwiki.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiConfig {
    #[serde(default)]
    pub book: BookSection,
    #[serde(default)]
    pub wiki: WikiSection,
    #[serde(default)]
    pub home: HomeSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct BookSection {
    pub src: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiSection {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct HomeSection {
    pub title: Option<String>,
    pub intro: Option<String>,
}

impl WikiConfig {
    /// Book source directory relative to the project root.
    pub fn book_src(&self) -> &str {
        self.book.src.as_deref().unwrap_or(DEFAULT_BOOK_SRC)
    }

    /// Summary filename inside the book source directory.
    pub fn summary_filename(&self) -> &str {
        self.book.summary.as_deref().unwrap_or(DEFAULT_SUMMARY_FILENAME)
    }

    /// Wiki output directory relative to the project root.
    pub fn wiki_dir(&self) -> &str {
        self.wiki.dir.as_deref().unwrap_or(DEFAULT_WIKI_DIR)
    }

    pub fn home_title(&self) -> &str {
        self.home.title.as_deref().unwrap_or(DEFAULT_HOME_TITLE)
    }

    pub fn home_intro(&self) -> Option<&str> {
        self.home
            .intro
            .as_deref()
            .filter(|intro| !intro.trim().is_empty())
    }
}

/// Load and parse a WikiConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<WikiConfig> {
    if !config_path.exists() {
        return Ok(WikiConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: WikiConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

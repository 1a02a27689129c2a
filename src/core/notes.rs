//! Commit-log categorization for generated release notes
//!
//! Input is the raw body returned by the notes-generation capability, one
//! commit per line:
//!
//! ```text
//! * feat: add X by @alice in https://github.com/o/r/pull/1
//! ```
//!
//! Lines that do not have this exact shape are dropped. Matched lines are
//! grouped by message prefix and rendered under fixed, emoji-marked headings.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static COMMIT_LINE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\* (.*) by (@\S+) in (https://github\.com/[^)]+)").expect("valid commit line pattern"));

/// Message prefix of the compare-link line
const CHANGELOG_LINK_PREFIX: &str = "**Full Changelog";

/// Topic sections, in render order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReleaseSection {
  Features,
  Fixes,
  Docs,
  Other,
}

impl ReleaseSection {
  /// Every section in render order
  pub const ALL: [ReleaseSection; 4] = [Self::Features, Self::Fixes, Self::Docs, Self::Other];

  pub fn heading(&self) -> &'static str {
    match self {
      Self::Features => "### ✨ Features",
      Self::Fixes => "### 🐛 Bug Fixes",
      Self::Docs => "### 📚 Documentation",
      Self::Other => "### 🔧 Other Changes",
    }
  }
}

impl fmt::Display for ReleaseSection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.heading())
  }
}

/// A parsed `* <message> by @<author> in <url>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLine {
  pub message: String,
  pub author: String,
  pub url: String,
}

/// Where a commit line belongs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
  Section(ReleaseSection),
  ChangelogLink,
}

impl CommitLine {
  /// Parse one already-trimmed line; `None` when it does not match
  pub fn parse(line: &str) -> Option<Self> {
    let caps = COMMIT_LINE.captures(line)?;
    Some(Self {
      message: caps[1].to_string(),
      author: caps[2].to_string(),
      url: caps[3].to_string(),
    })
  }

  /// Case-sensitive prefix classification, first match wins
  pub fn classify(&self) -> Classification {
    let m = self.message.as_str();
    if m.starts_with("feat") {
      Classification::Section(ReleaseSection::Features)
    } else if m.starts_with("fix") {
      Classification::Section(ReleaseSection::Fixes)
    } else if m.starts_with("docs") {
      Classification::Section(ReleaseSection::Docs)
    } else if m.starts_with(CHANGELOG_LINK_PREFIX) {
      Classification::ChangelogLink
    } else {
      Classification::Section(ReleaseSection::Other)
    }
  }

  pub fn to_bullet(&self) -> String {
    format!("- {} ([link]({})) by {}", self.message, self.url, self.author)
  }
}

/// Commit lines grouped by section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedNotes {
  sections: BTreeMap<ReleaseSection, Vec<String>>,
  changelog_link: Option<String>,
}

impl CategorizedNotes {
  /// Rendered bullets of one section (empty slice if none)
  pub fn lines(&self, section: ReleaseSection) -> &[String] {
    self.sections.get(&section).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn changelog_link(&self) -> Option<&str> {
    self.changelog_link.as_deref()
  }

  /// Total bullets across all sections
  pub fn len(&self) -> usize {
    self.sections.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0 && self.changelog_link.is_none()
  }

  /// Render sections in fixed order; empty sections are omitted and the
  /// changelog link line (possibly empty) closes the block.
  pub fn to_markdown(&self) -> String {
    let mut out = String::new();
    for section in ReleaseSection::ALL {
      let lines = self.lines(section);
      if lines.is_empty() {
        continue;
      }
      out.push('\n');
      out.push_str(section.heading());
      out.push('\n');
      out.push_str(&lines.join("\n"));
      out.push('\n');
    }
    if let Some(ref link) = self.changelog_link {
      out.push_str(link);
    }
    out.push('\n');
    out
  }
}

/// Categorize a raw notes body
pub fn categorize(raw: &str) -> CategorizedNotes {
  let mut notes = CategorizedNotes::default();
  for line in raw.lines().map(str::trim) {
    let Some(commit) = CommitLine::parse(line) else {
      continue;
    };
    match commit.classify() {
      Classification::Section(section) => notes.sections.entry(section).or_default().push(commit.to_bullet()),
      Classification::ChangelogLink => notes.changelog_link = Some(commit.message),
    }
  }
  notes
}

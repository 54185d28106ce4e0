//! `.gitmodules` reader.
//!
//! Parses the git-config formatted submodule declarations at the repository
//! root. Records are returned in declaration order, which is the processing
//! order for every operation.
//!
//! ```text
//! [submodule "cv"]
//!     path = cv
//!     url = https://github.com/someone/cv.git
//!     branch = main
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{io_err, CoreError};
use crate::types::{SubmodulePath, SubmoduleRecord};

pub const GITMODULES_FILE: &str = ".gitmodules";

/// Location of `.gitmodules` under `root`.
pub fn gitmodules_path(root: &Path) -> PathBuf {
    root.join(GITMODULES_FILE)
}

/// Load every submodule declared under `root`.
///
/// A missing `.gitmodules` means the repository has no submodules and yields
/// an empty list.
pub fn load_at(root: &Path) -> Result<Vec<SubmoduleRecord>, CoreError> {
    let path = gitmodules_path(root);
    if !path.exists() {
        return Ok(vec![]);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    parse(&contents, &path)
}

/// Narrow `records` to the requested `targets`, keeping declaration order.
///
/// An empty `targets` slice selects everything. Any target that is not
/// declared fails the whole selection.
pub fn select(
    records: &[SubmoduleRecord],
    targets: &[String],
) -> Result<Vec<SubmoduleRecord>, CoreError> {
    if targets.is_empty() {
        return Ok(records.to_vec());
    }

    let mut wanted = BTreeSet::new();
    for raw in targets {
        let path = SubmodulePath::normalized(raw);
        if !records.iter().any(|r| r.path == path) {
            return Err(CoreError::SubmoduleNotFound { path: raw.clone() });
        }
        wanted.insert(path);
    }

    Ok(records
        .iter()
        .filter(|r| wanted.contains(&r.path))
        .cloned()
        .collect())
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PendingSection {
    name: String,
    header_line: usize,
    path: Option<String>,
    url: Option<String>,
    branch: Option<String>,
}

/// Parse `.gitmodules` text. `source` is only used for error messages.
pub fn parse(contents: &str, source: &Path) -> Result<Vec<SubmoduleRecord>, CoreError> {
    let invalid = |line: usize, message: String| CoreError::InvalidGitmodules {
        path: source.to_path_buf(),
        line,
        message,
    };

    let mut records: Vec<SubmoduleRecord> = Vec::new();
    let mut current: Option<PendingSection> = None;

    for (idx, raw_line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            if let Some(section) = current.take() {
                finish_section(section, &mut records, &invalid)?;
            }
            current = parse_header(line)
                .map_err(|message| invalid(line_no, message))?
                .map(|name| PendingSection {
                    name,
                    header_line: line_no,
                    ..Default::default()
                });
            continue;
        }

        // Keys outside a submodule section (or in foreign sections) are ignored.
        let Some(section) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = parse_value(value).map_err(|message| invalid(line_no, message))?;
        match key.trim().to_ascii_lowercase().as_str() {
            "path" => section.path = Some(value),
            "url" => section.url = Some(value),
            "branch" => section.branch = Some(value),
            _ => {}
        }
    }

    if let Some(section) = current.take() {
        finish_section(section, &mut records, &invalid)?;
    }
    Ok(records)
}

/// Returns `Some(name)` for a submodule section, `None` for any other section.
fn parse_header(line: &str) -> Result<Option<String>, String> {
    let inner = line
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| format!("malformed section header '{line}'"))?
        .trim();

    let Some(rest) = inner.strip_prefix("submodule") else {
        return Ok(None);
    };
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(None);
    }
    let name = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .ok_or_else(|| format!("submodule name must be quoted in '{line}'"))?;
    if name.is_empty() {
        return Err("submodule name is empty".to_string());
    }
    Ok(Some(name.to_string()))
}

/// git-config value syntax: optional double quotes, backslash escapes, and
/// `#`/`;` comments outside quotes.
fn parse_value(raw: &str) -> Result<String, String> {
    let mut out = String::new();
    let mut in_quotes = false;
    let mut chars = raw.trim().chars();
    // Length of `out` up to the last character that must survive trimming.
    let mut keep = 0;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                keep = out.len();
            }
            '\\' => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    Some(other) => return Err(format!("unknown escape '\\{other}'")),
                    None => return Err("dangling backslash".to_string()),
                };
                out.push(escaped);
                keep = out.len();
            }
            '#' | ';' if !in_quotes => break,
            _ => {
                out.push(c);
                if in_quotes || !c.is_whitespace() {
                    keep = out.len();
                }
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted value".to_string());
    }
    out.truncate(keep);
    Ok(out)
}

fn finish_section(
    section: PendingSection,
    records: &mut Vec<SubmoduleRecord>,
    invalid: &dyn Fn(usize, String) -> CoreError,
) -> Result<(), CoreError> {
    let line = section.header_line;
    let name = section.name;

    let path = section
        .path
        .filter(|p| !p.is_empty())
        .ok_or_else(|| invalid(line, format!("submodule '{name}' has no path")))?;
    let url = section
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| invalid(line, format!("submodule '{name}' has no url")))?;

    let path = SubmodulePath::normalized(&path);
    if records.iter().any(|r| r.path == path) {
        return Err(invalid(
            line,
            format!("path '{path}' is declared by more than one submodule"),
        ));
    }

    // `branch = .` follows the superproject's branch; it is treated as the
    // remote default branch.
    let branch = section.branch.filter(|b| !b.is_empty() && b != ".");

    records.push(SubmoduleRecord {
        name,
        path,
        url,
        branch,
    });
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

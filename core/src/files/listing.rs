//! Parser for Unix `ls -l` style `LIST` output.
//!
//! Only the Unix format is understood. Lines that do not split into nine
//! fields (the `total N` header, DOS-style listings, blank lines) are
//! skipped.

use chrono::Datelike;
use tracing::debug;

use super::sanitize::join_remote;
use super::{DirectoryEntry, EntryType};

const FIELD_COUNT: usize = 9;

const SYMLINK_ARROW: &str = " -> ";

/// Turns raw listing lines into [`DirectoryEntry`] values.
///
/// `current_year` fills in the year for entries whose date column carries a
/// time (`Jan 15 12:30`), which is how `ls` prints recent files.
#[derive(Debug, Clone, Copy)]
pub struct ListingParser {
    current_year: i32,
}

impl Default for ListingParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingParser {
    pub fn new() -> Self {
        Self {
            current_year: chrono::Local::now().year(),
        }
    }

    pub fn with_current_year(current_year: i32) -> Self {
        Self { current_year }
    }

    /// Parse every line of a listing taken inside `parent`.
    pub fn parse_listing<S: AsRef<str>>(&self, lines: &[S], parent: &str) -> Vec<DirectoryEntry> {
        lines
            .iter()
            .filter_map(|line| self.parse_line(line.as_ref(), parent))
            .collect()
    }

    /// Parse one line; `None` means the line is skipped.
    pub fn parse_line(&self, raw: &str, parent: &str) -> Option<DirectoryEntry> {
        let fields = split_fields(raw.trim_end_matches(['\r', '\n']), FIELD_COUNT);
        if fields.len() < FIELD_COUNT {
            return None;
        }

        let permissions = fields[0];
        let entry_type = if permissions.starts_with('d') {
            EntryType::Directory
        } else {
            EntryType::File
        };

        // Servers disagree on how they flag symlinks: some set the `l` bit,
        // some only print `name -> target`. Either signal is enough.
        let (name, symlink_target) = match fields[8].split_once(SYMLINK_ARROW) {
            Some((name, target)) => (name, Some(target.to_string())),
            None => (fields[8], None),
        };
        let is_symlink = permissions.starts_with('l') || symlink_target.is_some();

        if name == "." || name == ".." {
            return None;
        }

        let size = match entry_type {
            EntryType::File => fields[4].parse().unwrap_or(0),
            EntryType::Directory => 0,
        };
        let modified = self.format_modified(fields[5], fields[6], fields[7]);

        let path = join_remote(parent, name);
        let real_path = symlink_target.clone().unwrap_or_else(|| path.clone());

        Some(DirectoryEntry {
            name: name.to_string(),
            path,
            real_path,
            entry_type,
            size,
            permissions: permissions.to_string(),
            modified,
            is_symlink,
            symlink_target,
            children: None,
        })
    }

    /// `DD/MM/YYYY HH:MM` when the listing shows a time, else `DD/MM/YYYY`.
    fn format_modified(&self, month: &str, day: &str, time_or_year: &str) -> String {
        let month = month_number(month).unwrap_or_else(|| {
            debug!("Unrecognized month {:?} in listing, using 01", month);
            1
        });
        let day: u32 = day.parse().unwrap_or(1);

        match time_or_year.split_once(':') {
            Some((hour, minute)) => {
                let hour: u32 = hour.parse().unwrap_or(0);
                format!(
                    "{day:02}/{month:02}/{} {hour:02}:{minute}",
                    self.current_year
                )
            }
            None => format!("{day:02}/{month:02}/{time_or_year}"),
        }
    }
}

/// Split on whitespace runs into at most `max` fields; the last field keeps
/// the remainder verbatim so names with spaces survive.
fn split_fields(line: &str, max: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(max);
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        if fields.len() + 1 == max {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }

    fields
}

/// English three-letter month abbreviation to month number.
fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

//! Writing descriptors back to disk.
//!
//! [`DescriptorWriter::write_updates`] edits an existing file through its
//! [`LineTable`]: only option lines whose value changed are rewritten, missing
//! required options are spliced into the `Options:` section and everything
//! else is carried over as it was. [`DescriptorWriter::write_new`] lays out a
//! complete file for a model that has no text yet.

use std::fmt;
use std::path::Path;

use similar::{ChangeTag, TextDiff};
use tracing::{debug, info, warn};

use crate::descriptor::{Descriptor, FileCategory, FileEntry};
use crate::error::{Error, Result};
use crate::lines::{LineId, LineKind, LineRecord, LineTable, OptionKey, Section};
use crate::options::{self, OptionId, OptionSpec};

/// Option names are padded to this column.
const NAME_WIDTH: usize = 15;
/// Values are padded to this width before a trailing comment...
const VALUE_WIDTH: usize = 15;
/// ...or to this one once they no longer fit.
const WIDE_VALUE_WIDTH: usize = 39;

/// Opening and closing quotes the option line grammar accepts, in the order
/// the writer tries them. A quoted value ends at the first closing quote.
const QUOTES: [(char, char); 4] = [
    ('"', '"'),
    ('\'', '\''),
    ('\u{201C}', '\u{201D}'),
    ('\u{2018}', '\u{2019}'),
];

/// Whether a write touches the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Write,
    /// Compute the changes and report them without writing.
    DryRun,
}

/// What a write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file already had the content that would have been written.
    Unchanged,
    Written,
    /// The lines a write would remove and add, in file order.
    DryRun(Vec<DiffLine>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Removed,
    Added,
}

/// One changed line in a dry-run diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub text: String,
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiffKind::Removed => write!(f, "- {}", self.text),
            DiffKind::Added => write!(f, "+ {}", self.text),
        }
    }
}

/// Serializes a [`Descriptor`].
#[derive(Debug, Clone, Copy)]
pub struct DescriptorWriter<'a> {
    desc: &'a Descriptor,
}

/// Where new option lines go: before a given line, or at the end of the file.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    Before(LineId),
    End,
}

impl<'a> DescriptorWriter<'a> {
    pub fn new(desc: &'a Descriptor) -> Self {
        Self { desc }
    }

    /// Bring the option lines of the descriptor at `path` in line with the
    /// model, leaving every other line as it is.
    ///
    /// # Errors
    /// [`Error::InvalidValue`] if an option value cannot be written so that
    /// it reads back the same, [`Error::Read`] if `path` cannot be read,
    /// [`Error::Write`] if the updated text cannot be written back.
    pub fn write_updates(&self, path: impl AsRef<Path>, mode: WriteMode) -> Result<WriteOutcome> {
        let path = path.as_ref();
        self.check_values()?;
        let original = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        let updated = self.render_updates(&original);
        finish_write(path, &original, &updated, mode)
    }

    /// The text [`write_updates`](Self::write_updates) would produce for
    /// `original`. Options whose value cannot be written are left as they
    /// are in the text.
    pub fn render_updates(&self, original: &str) -> String {
        let newline = if original.contains("\r\n") {
            "\r\n"
        } else {
            "\n"
        };
        let trailing_newline = original.is_empty() || original.ends_with('\n');

        let mut table = LineTable::from_text(original);
        drop_obsolete(&mut table);

        let mut anchor = None;
        for spec in options::all() {
            match last_line_for(&table, spec.id) {
                Some((line, raw, comment)) => {
                    self.update_line(&mut table, spec, line, &raw, comment.as_deref());
                }
                None => {
                    let Some(value) = self.value_to_insert(spec) else {
                        continue;
                    };
                    let comment = self
                        .desc
                        .option_value(spec.id)
                        .and_then(|v| v.comment.as_deref())
                        .unwrap_or(spec.help);
                    let Some(text) = format_option_line(spec.name, &value, Some(comment)) else {
                        warn!(option = spec.name, %value, "value cannot be written, skipped");
                        continue;
                    };
                    let at = *anchor.get_or_insert_with(|| insertion_anchor(&mut table));
                    let record =
                        LineRecord::synthetic(text, LineKind::Content, Some(Section::Options));
                    match at {
                        Anchor::Before(id) => table.insert_before(id, record),
                        Anchor::End => table.push(record),
                    };
                    debug!(option = spec.name, %value, "inserted option line");
                }
            }
        }

        table.tidy();
        table.render(newline, trailing_newline)
    }

    /// Write a complete descriptor to `path`, replacing whatever is there.
    /// `header_comment` becomes a `#` line at the top of the file.
    ///
    /// # Errors
    /// [`Error::InvalidValue`] for an option value that cannot be written,
    /// [`Error::Read`] if an existing file at `path` cannot be read,
    /// [`Error::Write`] if the new text cannot be written.
    pub fn write_new(
        &self,
        path: impl AsRef<Path>,
        header_comment: Option<&str>,
        mode: WriteMode,
    ) -> Result<WriteOutcome> {
        let path = path.as_ref();
        self.check_values()?;
        let original = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::read(path, e)),
        };
        let text = self.render_new(header_comment);
        finish_write(path, &original, &text, mode)
    }

    /// The text [`write_new`](Self::write_new) would produce. Options whose
    /// value cannot be written are left out.
    pub fn render_new(&self, header_comment: Option<&str>) -> String {
        let mut lines = Vec::new();
        if let Some(header) = header_comment {
            let header = header.trim();
            if header.starts_with('#') {
                lines.push(header.to_string());
            } else {
                lines.push(format!("# {header}"));
            }
            lines.push(String::new());
        }

        lines.push("Options:".to_string());
        for spec in options::all() {
            let (value, comment) = match self.desc.option_value(spec.id) {
                Some(v) => (v.value.as_str().to_string(), v.comment.as_deref()),
                None if spec.required => (self.fallback_value(spec), None),
                None => continue,
            };
            match format_option_line(spec.name, &value, Some(comment.unwrap_or(spec.help))) {
                Some(text) => lines.push(text),
                None => warn!(option = spec.name, %value, "value cannot be written, skipped"),
            }
        }

        lines.push(String::new());
        lines.push("Files:".to_string());
        if !self.desc.uses_default_files() {
            // Resources and interface definitions are listed ahead of code.
            let (first, rest): (Vec<&FileEntry>, Vec<&FileEntry>) = self
                .desc
                .src_files()
                .iter()
                .partition(|f| f.category() != FileCategory::Source);
            lines.extend(first.into_iter().chain(rest).map(|f| format!("    {}", f.path())));
        }

        if !self.desc.lib_files().is_empty() {
            lines.push(String::new());
            lines.push("Lib:".to_string());
            lines.extend(self.desc.lib_files().iter().map(|f| format!("    {}", f.path())));
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Fails on the first option value that no quoting style can carry.
    fn check_values(&self) -> Result<()> {
        for spec in options::all() {
            let Some(v) = self.desc.option_value(spec.id) else {
                continue;
            };
            if quote_value(v.value.as_str()).is_none() {
                return Err(Error::InvalidValue {
                    option: spec.name.to_string(),
                    value: v.value.as_str().to_string(),
                });
            }
        }
        Ok(())
    }

    fn update_line(
        &self,
        table: &mut LineTable,
        spec: &OptionSpec,
        line: LineId,
        raw: &str,
        comment: Option<&str>,
    ) {
        let Some(wanted) = self.desc.option_value(spec.id) else {
            return;
        };
        let same_value = spec.parse_value(raw).as_ref() == Some(&wanted.value);
        let same_comment = !wanted.explicit_comment || wanted.comment.as_deref() == comment;
        if same_value && same_comment {
            return;
        }

        let comment = if wanted.explicit_comment {
            wanted.comment.as_deref()
        } else {
            Some(comment.unwrap_or(spec.help))
        };
        let Some(text) = format_option_line(spec.name, wanted.value.as_str(), comment) else {
            warn!(option = spec.name, value = %wanted.value, "value cannot be written, line kept");
            return;
        };
        debug!(option = spec.name, old = raw, new = %wanted.value, "rewrote option line");
        table.replace(line, text);
    }

    /// The value for an option that has no line yet, or `None` when it
    /// should stay absent.
    fn value_to_insert(&self, spec: &OptionSpec) -> Option<String> {
        match self.desc.option_value(spec.id) {
            Some(v) if spec.required || v.value != spec.default_value() => {
                Some(v.value.as_str().to_string())
            }
            Some(_) => None,
            None if spec.required => Some(self.fallback_value(spec)),
            None => None,
        }
    }

    fn fallback_value(&self, spec: &OptionSpec) -> String {
        if spec.id == OptionId::Project {
            if let Some(name) = self.desc.project_name() {
                return name.to_string();
            }
        }
        spec.default_value().as_str().to_string()
    }
}

/// Format an option line: the name padded to a fixed column, then the value,
/// then the comment aligned on one of two tab stops depending on how long the
/// value is.
///
/// Values the line grammar would misread are quoted. `None` when the value
/// holds the closing character of every quote style.
///
/// ```
/// use srcfiles_rs::writer::format_option_line;
///
/// let line = format_option_line("Project", "demo", None);
/// assert_eq!(line.as_deref(), Some("    Project:       demo"));
/// ```
pub fn format_option_line(name: &str, value: &str, comment: Option<&str>) -> Option<String> {
    let key = format!("{name}:");
    let value = quote_value(value)?;
    let line = match comment.filter(|c| !c.is_empty()) {
        Some(comment) => {
            let width = if value.chars().count() > VALUE_WIDTH {
                WIDE_VALUE_WIDTH
            } else {
                VALUE_WIDTH
            };
            format!("    {key:<NAME_WIDTH$}{value:<width$} # {comment}")
        }
        None => format!("    {key:<NAME_WIDTH$}{value}").trim_end().to_string(),
    };
    Some(line)
}

fn quote_value(value: &str) -> Option<String> {
    let needs_quotes = value.contains('#')
        || value.starts_with(QUOTES.map(|(open, _)| open))
        || value.trim() != value;
    if !needs_quotes {
        return Some(value.to_string());
    }
    QUOTES
        .iter()
        .find(|(_, close)| !value.contains(*close))
        .map(|(open, close)| format!("{open}{value}{close}"))
}

/// The last line setting `id`, with its raw value and comment.
fn last_line_for(table: &LineTable, id: OptionId) -> Option<(LineId, String, Option<String>)> {
    table
        .iter()
        .filter_map(|(line, record)| match &record.option {
            Some(OptionKey::Known {
                id: key,
                value,
                comment,
            }) if *key == id => Some((line, value.clone(), comment.clone())),
            _ => None,
        })
        .last()
}

fn drop_obsolete(table: &mut LineTable) {
    let obsolete: Vec<LineId> = table
        .iter()
        .filter(|(_, record)| record.option == Some(OptionKey::Obsolete))
        .map(|(id, _)| id)
        .collect();
    for id in obsolete {
        debug!(line = %table.get(id).text.trim(), "dropping obsolete option");
        table.remove(id);
    }
}

/// Find (creating the `Options:` header if needed) the place new option
/// lines go: the first blank line of the section, or a blank line inserted
/// ahead of the next header, or the end of the file.
fn insertion_anchor(table: &mut LineTable) -> Anchor {
    let header = table
        .iter()
        .find(|(_, r)| r.kind == LineKind::Header(Section::Options))
        .map(|(id, _)| id);
    let header = match header {
        Some(id) => id,
        None => {
            let at = table
                .iter()
                .position(|(_, r)| matches!(r.kind, LineKind::Header(_)))
                .unwrap_or(table.len());
            let record = LineRecord::synthetic(
                "Options:",
                LineKind::Header(Section::Options),
                Some(Section::Options),
            );
            table.insert_at(at, record)
        }
    };

    let start = table.position(header).map_or(table.len(), |p| p + 1);
    for index in start..table.len() {
        let Some(id) = table.id_at(index) else { break };
        match table.get(id).kind {
            LineKind::Blank => return Anchor::Before(id),
            LineKind::Header(_) | LineKind::Divider => {
                let record = LineRecord::synthetic("", LineKind::Blank, Some(Section::Options));
                return Anchor::Before(table.insert_before(id, record));
            }
            _ => {}
        }
    }
    Anchor::End
}

fn finish_write(
    path: &Path,
    original: &str,
    updated: &str,
    mode: WriteMode,
) -> Result<WriteOutcome> {
    if updated == original {
        debug!(path = %path.display(), "descriptor already up to date");
        return Ok(WriteOutcome::Unchanged);
    }
    match mode {
        WriteMode::DryRun => Ok(WriteOutcome::DryRun(diff_lines(original, updated))),
        WriteMode::Write => {
            std::fs::write(path, updated).map_err(|e| Error::write(path, e))?;
            info!(path = %path.display(), "wrote descriptor");
            Ok(WriteOutcome::Written)
        }
    }
}

fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .filter_map(|change| {
            let kind = match change.tag() {
                ChangeTag::Equal => return None,
                ChangeTag::Delete => DiffKind::Removed,
                ChangeTag::Insert => DiffKind::Added,
            };
            let text = change.value().trim_end_matches(['\r', '\n']).to_string();
            Some(DiffLine { kind, text })
        })
        .collect()
}

//! Line classification and the raw line table.
//!
//! A descriptor is never regenerated from the model when it is updated.
//! Instead its lines are loaded into a [`LineTable`], tagged with their
//! section and (for option lines) the option they set, edited in place and
//! joined back together. Lines the engine does not understand are carried
//! through untouched.

use crate::option_line::parse_option_line;
use crate::options::{self, Lookup, OptionId};

// ═══════════════════════════════════════════════════════════════════════════════
//  Classification
// ═══════════════════════════════════════════════════════════════════════════════

/// Top-level sections of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Options,
    Files,
    Lib,
    /// Any other top-level key. Its lines are passed through verbatim.
    Unknown,
}

/// What a single line is, judged without context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// `# ...` or a YAML `%` pragma.
    Comment,
    /// `---`
    Divider,
    Header(Section),
    Content,
}

/// Classify one line.
///
/// A header must start in column 1 with a letter (or `[` for the legacy
/// `[FILES]` / `[OPTIONS]` forms). Column-1 lines that are not one of the
/// known headers open an [`Section::Unknown`] section.
pub fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('#') || trimmed.starts_with('%') {
        return LineKind::Comment;
    }
    if trimmed.starts_with("---") {
        return LineKind::Divider;
    }

    let Some(first) = line.chars().next() else {
        return LineKind::Blank;
    };
    if first == '[' {
        let tag = trimmed.split(']').next().unwrap_or(trimmed).trim_start_matches('[');
        return LineKind::Header(match tag.to_ascii_lowercase().as_str() {
            "files" => Section::Files,
            "options" => Section::Options,
            _ => Section::Unknown,
        });
    }
    if first.is_alphabetic() {
        return LineKind::Header(match header_keyword(trimmed) {
            Some(k) if k.eq_ignore_ascii_case("files") => Section::Files,
            Some(k) if k.eq_ignore_ascii_case("options") => Section::Options,
            Some(k) if k.eq_ignore_ascii_case("lib") => Section::Lib,
            _ => Section::Unknown,
        });
    }

    LineKind::Content
}

/// `Files:   # comment` → `Some("Files")`. Lines with anything after the
/// colon other than a comment are not headers.
fn header_keyword(trimmed: &str) -> Option<&str> {
    let (key, rest) = trimmed.split_once(':')?;
    let rest = rest.trim();
    (rest.is_empty() || rest.starts_with('#')).then(|| key.trim_end())
}

/// Tracks the current section while walking a file top to bottom.
///
/// Sections opened by a legacy `[FILES]` style header list their entries in
/// column 1, so inside them an alphabetic line is content rather than the
/// start of an unknown section.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionTracker {
    current: Option<Section>,
    legacy: bool,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `line` in context and update the current section. Returns the
    /// effective kind and the section the line belongs to.
    pub fn advance(&mut self, line: &str) -> (LineKind, Option<Section>) {
        let mut kind = classify(line);
        if let LineKind::Header(section) = kind {
            let bracketed = line.starts_with('[');
            if self.legacy && section == Section::Unknown && !bracketed {
                kind = LineKind::Content;
            } else {
                self.current = Some(section);
                self.legacy = bracketed;
            }
        }
        (kind, self.current)
    }

    pub fn current(&self) -> Option<Section> {
        self.current
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Raw line table
// ═══════════════════════════════════════════════════════════════════════════════

/// Stable handle to a line in a [`LineTable`]. Handles stay valid across
/// inserts and removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId(usize);

/// The option an `Options:` content line sets, as far as it could be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKey {
    Known {
        id: OptionId,
        /// The raw (unquoted) value text.
        value: String,
        comment: Option<String>,
    },
    Obsolete,
    /// A key not in the registry, or a line that does not parse.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub text: String,
    pub kind: LineKind,
    pub section: Option<Section>,
    /// Only set for content lines in an `Options:` section.
    pub option: Option<OptionKey>,
}

impl LineRecord {
    /// A record for a line the writer is adding.
    pub fn synthetic(text: impl Into<String>, kind: LineKind, section: Option<Section>) -> Self {
        Self {
            text: text.into(),
            kind,
            section,
            option: None,
        }
    }
}

/// A file's lines as an arena of records plus an ordering over handles.
///
/// Edits never shift existing handles: inserts append a record to the arena
/// and splice its handle into the order, removals drop the handle from the
/// order only.
#[derive(Debug, Clone, Default)]
pub struct LineTable {
    arena: Vec<LineRecord>,
    order: Vec<LineId>,
}

impl LineTable {
    pub fn from_text(text: &str) -> Self {
        let mut table = Self::default();
        let mut tracker = SectionTracker::new();
        for line in text.lines() {
            let (kind, section) = tracker.advance(line);
            let option = (kind == LineKind::Content && section == Some(Section::Options))
                .then(|| option_key(line));
            table.push(LineRecord {
                text: line.to_string(),
                kind,
                section,
                option,
            });
        }
        table
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: LineId) -> &LineRecord {
        &self.arena[id.0]
    }

    /// Handle of the line currently at `index`.
    pub fn id_at(&self, index: usize) -> Option<LineId> {
        self.order.get(index).copied()
    }

    pub fn position(&self, id: LineId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Lines in file order.
    pub fn iter(&self) -> impl Iterator<Item = (LineId, &LineRecord)> {
        self.order.iter().map(|&id| (id, &self.arena[id.0]))
    }

    pub fn push(&mut self, record: LineRecord) -> LineId {
        let id = self.alloc(record);
        self.order.push(id);
        id
    }

    pub fn insert_at(&mut self, index: usize, record: LineRecord) -> LineId {
        let id = self.alloc(record);
        self.order.insert(index.min(self.order.len()), id);
        id
    }

    /// Insert `record` immediately before `anchor`.
    pub fn insert_before(&mut self, anchor: LineId, record: LineRecord) -> LineId {
        let index = self.position(anchor).unwrap_or(self.order.len());
        self.insert_at(index, record)
    }

    /// Replace the text of a line, keeping its classification.
    pub fn replace(&mut self, id: LineId, text: impl Into<String>) {
        let record = &mut self.arena[id.0];
        record.text = text.into();
        record.option = None;
    }

    pub fn remove(&mut self, id: LineId) {
        self.order.retain(|&other| other != id);
    }

    /// Strip trailing whitespace from every line and collapse runs of blank
    /// lines to a single one.
    pub fn tidy(&mut self) {
        for &id in &self.order {
            let record = &mut self.arena[id.0];
            let trimmed_len = record.text.trim_end().len();
            record.text.truncate(trimmed_len);
        }
        let arena = &self.arena;
        let mut previous_blank = false;
        self.order.retain(|&id| {
            let blank = arena[id.0].text.is_empty();
            let keep = !(blank && previous_blank);
            previous_blank = blank;
            keep
        });
    }

    /// Join the lines with `newline`, adding a final terminator when
    /// `trailing_newline` is set.
    pub fn render(&self, newline: &str, trailing_newline: bool) -> String {
        let mut out = String::new();
        for (index, (_, record)) in self.iter().enumerate() {
            if index > 0 {
                out.push_str(newline);
            }
            out.push_str(&record.text);
        }
        if trailing_newline && !self.order.is_empty() {
            out.push_str(newline);
        }
        out
    }

    fn alloc(&mut self, record: LineRecord) -> LineId {
        self.arena.push(record);
        LineId(self.arena.len() - 1)
    }
}

fn option_key(line: &str) -> OptionKey {
    let Ok(parsed) = parse_option_line(line) else {
        return OptionKey::Unrecognized;
    };
    match options::classify_key(parsed.name) {
        Lookup::Known(spec) => OptionKey::Known {
            id: spec.id,
            value: parsed.value.to_string(),
            comment: parsed.comment.filter(|c| !c.is_empty()).map(String::from),
        },
        Lookup::Obsolete => OptionKey::Obsolete,
        Lookup::Unknown => OptionKey::Unrecognized,
    }
}

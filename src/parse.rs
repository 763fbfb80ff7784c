//! Descriptor parser: a walk over classified lines with the current section
//! as its only state.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::descriptor::{DEFAULT_FILE_PATTERNS, Descriptor, DiagnosticKind, FileEntry, FileList};
use crate::error::{Error, Result};
use crate::lines::{LineKind, Section, SectionTracker};
use crate::option_line::parse_option_line;
use crate::options::{self, Lookup, OptionId, OptionValue};
use crate::paths;

/// Parses one descriptor and, through `.include`, the descriptors it pulls
/// in.
pub(crate) struct DescriptorParser {
    pub(crate) check_files: bool,
    /// Descriptors being parsed right now, outermost first. An include of
    /// anything on this stack is a cycle.
    pub(crate) stack: Vec<PathBuf>,
}

impl DescriptorParser {
    pub(crate) fn new(check_files: bool) -> Self {
        Self {
            check_files,
            stack: Vec::new(),
        }
    }

    /// Read and parse a top-level descriptor.
    pub(crate) fn parse_file(&mut self, path: &Path) -> Result<Descriptor> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        Ok(self.parse_text(&text, path))
    }

    /// Parse top-level descriptor text. `path` locates the descriptor for
    /// relative file entries and includes; it is not read.
    pub(crate) fn parse_text(&mut self, text: &str, path: &Path) -> Descriptor {
        let mut desc = Descriptor::new(path);
        debug!(path = %desc.path.display(), "parsing descriptor");
        self.stack.push(desc.path.clone());
        self.parse_lines(text, &mut desc);
        self.stack.pop();
        finish(&mut desc);
        desc
    }

    /// Parse a descriptor reached through `.include`. Unlike a top-level
    /// parse, an empty file list stays empty and no project name is derived.
    pub(crate) fn parse_nested(&mut self, path: &Path) -> std::io::Result<Descriptor> {
        let text = std::fs::read_to_string(path)?;
        let mut desc = Descriptor::new(path);
        debug!(
            path = %desc.path.display(),
            depth = self.stack.len(),
            "parsing included descriptor"
        );
        self.stack.push(desc.path.clone());
        self.parse_lines(&text, &mut desc);
        self.stack.pop();
        Ok(desc)
    }

    fn parse_lines(&mut self, text: &str, desc: &mut Descriptor) {
        let mut tracker = SectionTracker::new();
        for (index, line) in text.lines().enumerate() {
            let (kind, section) = tracker.advance(line);
            if kind != LineKind::Content {
                continue;
            }
            let line_no = index + 1;
            match section {
                Some(Section::Options) => parse_option(desc, line, line_no),
                Some(Section::Files) => self.parse_entry(desc, line, line_no, FileList::Src),
                Some(Section::Lib) => self.parse_entry(desc, line, line_no, FileList::Lib),
                Some(Section::Unknown) | None => {}
            }
        }
    }

    fn parse_entry(&mut self, desc: &mut Descriptor, line: &str, line_no: usize, list: FileList) {
        let entry = strip_comment(line);
        if entry.is_empty() {
            return;
        }
        if let Some(target) = include_target(entry) {
            self.resolve_include(desc, target, list, line_no);
            return;
        }
        // Library names from the old format; the Lib: section lists sources now.
        if list == FileList::Lib && entry.to_ascii_lowercase().ends_with(".lib") {
            return;
        }
        if self.check_files
            && !paths::is_wildcard(entry)
            && !desc.directory.join(paths::from_text(entry)).exists()
        {
            desc.diagnose(
                DiagnosticKind::MissingFile,
                Some(line_no),
                format!("cannot locate {entry}"),
            );
        }
        desc.list_mut(list).push(FileEntry::new(entry));
    }
}

fn parse_option(desc: &mut Descriptor, line: &str, line_no: usize) {
    let parsed = match parse_option_line(line) {
        Ok(parsed) => parsed,
        Err(message) => {
            desc.diagnose(DiagnosticKind::MalformedLine, Some(line_no), message);
            return;
        }
    };

    match options::classify_key(parsed.name) {
        Lookup::Known(spec) => match spec.parse_value(parsed.value) {
            Some(value) => {
                desc.options.insert(spec.id, OptionValue::parsed(value, parsed.comment));
            }
            None => desc.diagnose(
                DiagnosticKind::InvalidValue,
                Some(line_no),
                format!("{}: expected true or false, found '{}'", spec.name, parsed.value),
            ),
        },
        Lookup::Obsolete => {
            debug!(
                key = parsed.name,
                line = line_no,
                "ignoring obsolete option"
            );
        }
        Lookup::Unknown => desc.diagnose(
            DiagnosticKind::UnknownOption,
            Some(line_no),
            format!("unknown option '{}'", parsed.name),
        ),
    }
}

/// Fill in what an incomplete top-level descriptor implies.
fn finish(desc: &mut Descriptor) {
    let has_project = desc
        .option(OptionId::Project)
        .is_some_and(|name| !name.is_empty());
    if !has_project {
        desc.derived_project = derive_project_name(&desc.directory);
    }
    if desc.src_files.is_empty() {
        desc.src_files = DEFAULT_FILE_PATTERNS.iter().map(|p| FileEntry::new(*p)).collect();
        desc.files_defaulted = true;
    }
}

/// Name a project after its directory, skipping a trailing `src`.
fn derive_project_name(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_str()?;
    if name.eq_ignore_ascii_case("src") {
        dir.parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .map(String::from)
    } else {
        Some(name.to_string())
    }
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default().trim()
}

/// `.include ../lib/.srcfiles.yaml` → `Some("../lib/.srcfiles.yaml")`.
fn include_target(entry: &str) -> Option<&str> {
    let keyword = entry.get(..8)?;
    if !keyword.eq_ignore_ascii_case(".include") {
        return None;
    }
    let rest = &entry[8..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let target = rest.trim().trim_matches(|c| c == '"' || c == '\'');
    (!target.is_empty()).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FileCategory;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Descriptor {
        DescriptorParser::new(false).parse_text(text, Path::new("/work/demo/.srcfiles.yaml"))
    }

    fn paths_of(files: &[FileEntry]) -> Vec<&str> {
        files.iter().map(FileEntry::path).collect()
    }

    #[test]
    fn parses_options_and_files() {
        let desc = parse(
            "\
# demo project
Options:
    Project: demo    # project name
    Exe_type=window
    Permissive: true

Files:
    main.cpp   # entry point
    app.rc
    iface.idl
",
        );
        assert_eq!(desc.option(OptionId::Project), Some("demo"));
        assert_eq!(
            desc.option_value(OptionId::Project).unwrap().comment.as_deref(),
            Some("project name")
        );
        assert_eq!(desc.option(OptionId::ExeType), Some("window"));
        assert!(desc.bool_option(OptionId::Permissive));
        assert_eq!(
            paths_of(desc.src_files()),
            ["main.cpp", "app.rc", "iface.idl"]
        );
        assert_eq!(desc.src_files()[1].category(), FileCategory::Resource);
        assert_eq!(desc.idl_files().count(), 1);
        assert!(desc.diagnostics().is_empty());
    }

    #[test]
    fn quoted_value_keeps_hash() {
        let desc = parse("Options:\n    CFlags_cmn: \"a # b\"  # real comment\n");
        let value = desc.option_value(OptionId::CFlagsCmn).unwrap();
        assert_eq!(value.value.as_str(), "a # b");
        assert_eq!(value.comment.as_deref(), Some("real comment"));
    }

    #[test]
    fn bad_option_lines_become_diagnostics() {
        let desc = parse(
            "Options:\n    Bogus: 1\n    Warn 3\n    Stdcall: sometimes\n    TargetDirs: ../bin\n",
        );
        let kinds: Vec<DiagnosticKind> = desc.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                DiagnosticKind::UnknownOption,
                DiagnosticKind::MalformedLine,
                DiagnosticKind::InvalidValue
            ]
        );
        assert_eq!(desc.diagnostics()[0].line, Some(2));
        assert!(desc.option(OptionId::Warn).is_none());
        assert!(desc.option(OptionId::Stdcall).is_none());
    }

    #[test]
    fn empty_files_fall_back_to_default_patterns() {
        let desc = parse("Options:\n    Project: demo\nFiles:\n");
        assert_eq!(paths_of(desc.src_files()), DEFAULT_FILE_PATTERNS);
        assert!(desc.uses_default_files());

        let desc = parse("");
        assert_eq!(paths_of(desc.src_files()), DEFAULT_FILE_PATTERNS);
    }

    #[test]
    fn project_name_derived_from_directory() {
        let desc = parse("Files:\n    a.cpp\n");
        assert_eq!(desc.option(OptionId::Project), None);
        assert_eq!(desc.project_name(), Some("demo"));

        let path = Path::new("/work/tool/src/.srcfiles.yaml");
        let desc = DescriptorParser::new(false).parse_text("Files:\n    a.cpp\n", path);
        assert_eq!(desc.project_name(), Some("tool"));
    }

    #[test]
    fn lib_section_drops_legacy_library_names() {
        let desc = parse("Files:\n    a.cpp\nLib:\n    util.cpp\n    oldstuff.lib\n");
        assert_eq!(paths_of(desc.lib_files()), ["util.cpp"]);
    }

    #[test]
    fn unknown_sections_are_ignored() {
        let desc = parse("Files:\n    a.cpp\nTasks:\n    Warn: 2\n    b.cpp\n---\n");
        assert_eq!(paths_of(desc.src_files()), ["a.cpp"]);
        assert!(desc.option(OptionId::Warn).is_none());
        assert!(desc.diagnostics().is_empty());
    }

    #[test]
    fn legacy_bracket_format() {
        let desc = parse(
            "%YAML 1.1\n[OPTIONS]\n    Project: old\n[FILES]\nmain.cpp\nutil.cpp\n",
        );
        assert_eq!(desc.project_name(), Some("old"));
        assert_eq!(paths_of(desc.src_files()), ["main.cpp", "util.cpp"]);
    }

    #[test]
    fn missing_files_are_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.cpp"), "").unwrap();
        let text = "Files:\n    a.cpp\n    gone.cpp\n    *.c\n";
        let path = dir.path().join(".srcfiles.yaml");
        let desc = DescriptorParser::new(true).parse_text(text, &path);
        assert_eq!(paths_of(desc.src_files()), ["a.cpp", "gone.cpp", "*.c"]);
        assert_eq!(desc.diagnostics().len(), 1);
        assert_eq!(desc.diagnostics()[0].kind, DiagnosticKind::MissingFile);
        assert_eq!(desc.diagnostics()[0].line, Some(3));
    }

    #[test]
    fn unreadable_master_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = DescriptorParser::new(true).parse_file(&dir.path().join(".srcfiles.yaml"));
        assert!(matches!(result, Err(Error::Read { .. })));
    }

    #[test]
    fn include_directive_syntax() {
        assert_eq!(
            include_target(".include ../lib/.srcfiles.yaml"),
            Some("../lib/.srcfiles.yaml")
        );
        assert_eq!(include_target(".INCLUDE \"sub dir\""), Some("sub dir"));
        assert_eq!(include_target(".includes x"), None);
        assert_eq!(include_target(".include"), None);
        assert_eq!(include_target("main.cpp"), None);
    }
}

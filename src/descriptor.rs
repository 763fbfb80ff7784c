//! The canonical descriptor model and its read interface.
//!
//! A [`Descriptor`] is what the parser produces from one `.srcfiles.yaml`
//! (after `.include` flattening and, optionally, overlay merging), what the
//! foreign-project adapters populate directly, and what the writer serializes.
//! Generators consume it through the accessors in this module only.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::options::{self, ExeType, OptionId, OptionValue, Value};

/// File name of a descriptor.
pub const DESCRIPTOR_NAME: &str = ".srcfiles.yaml";
/// File name used by older versions.
pub const LEGACY_DESCRIPTOR_NAME: &str = ".srcfiles";
/// What an empty `Files:` section means.
pub const DEFAULT_FILE_PATTERNS: &[&str] = &["*.cpp", "*.cc", "*.cxx", "*.c", "*.rc"];

/// Find the descriptor for a project directory.
///
/// Looks for `.srcfiles.yaml`, then `src/.srcfiles.yaml`, then the legacy
/// names in the same two places.
pub fn locate_descriptor(dir: impl AsRef<Path>) -> Option<PathBuf> {
    let dir = dir.as_ref();
    [DESCRIPTOR_NAME, LEGACY_DESCRIPTOR_NAME]
        .iter()
        .flat_map(|name| [dir.join(name), dir.join("src").join(name)])
        .find(|candidate| candidate.is_file())
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Files
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Source,
    /// `.rc` resource script.
    Resource,
    /// `.idl` interface definition.
    Idl,
    /// `.hhp` HTML help project.
    HelpProject,
}

impl FileCategory {
    pub fn from_path(path: &str) -> Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("rc") => FileCategory::Resource,
            Some("idl") => FileCategory::Idl,
            Some("hhp") => FileCategory::HelpProject,
            _ => FileCategory::Source,
        }
    }
}

/// A file listed in a descriptor, relative to the descriptor's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: String,
    category: FileCategory,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let category = FileCategory::from_path(&path);
        Self { path, category }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn category(&self) -> FileCategory {
        self.category
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Diagnostics
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnknownOption,
    /// An option line without a `:`/`=` separator.
    MalformedLine,
    /// A boolean option with an unrecognizable value.
    InvalidValue,
    /// A listed source, resource or library file does not exist.
    MissingFile,
    IncludeUnreadable,
    IncludeCycle,
}

/// A non-fatal problem found while reading a descriptor or foreign project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The file the problem was found in.
    pub file: PathBuf,
    /// 1-based line number, when the problem is tied to a line.
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}: {}", self.file.display(), self.message),
            None => write!(f, "{}: {}", self.file.display(), self.message),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Descriptor
// ═══════════════════════════════════════════════════════════════════════════════

/// Which file list an entry or `.include` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileList {
    Src,
    Lib,
}

#[derive(Debug, Clone)]
pub struct Descriptor {
    /// Absolute path of the descriptor file (it need not exist yet).
    pub(crate) path: PathBuf,
    /// Absolute directory all file entries are relative to.
    pub(crate) directory: PathBuf,
    pub(crate) options: BTreeMap<OptionId, OptionValue>,
    pub(crate) src_files: Vec<FileEntry>,
    pub(crate) lib_files: Vec<FileEntry>,
    /// Paths already folded in through `.include` in `Files:`.
    pub(crate) included_src: HashSet<String>,
    /// Same for `Lib:`, kept apart so the two sections never suppress
    /// each other's entries.
    pub(crate) included_lib: HashSet<String>,
    /// Project name derived from the directory when no `Project:` is set.
    pub(crate) derived_project: Option<String>,
    /// `src_files` holds [`DEFAULT_FILE_PATTERNS`] because nothing was listed.
    pub(crate) files_defaulted: bool,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Descriptor {
    /// An empty model for a descriptor at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = crate::paths::absolute(path.as_ref());
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            directory,
            options: BTreeMap::new(),
            src_files: Vec::new(),
            lib_files: Vec::new(),
            included_src: HashSet::new(),
            included_lib: HashSet::new(),
            derived_project: None,
            files_defaulted: false,
            diagnostics: Vec::new(),
        }
    }

    /// Read a descriptor with the default reader configuration (file checks
    /// on, no overlay).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        crate::reader::DescriptorReader::new().read(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    // ─── Options ─────────────────────────────────────────────────────────

    /// The project name: the `Project` option, else a name derived from the
    /// descriptor's directory.
    pub fn project_name(&self) -> Option<&str> {
        self.option(OptionId::Project)
            .filter(|name| !name.is_empty())
            .or(self.derived_project.as_deref())
    }

    /// The precompiled header, or `None` when precompiled headers are off.
    pub fn pch_header(&self) -> Option<&str> {
        self.option(OptionId::Pch)
            .filter(|pch| !pch.is_empty() && !pch.eq_ignore_ascii_case("none"))
    }

    /// The source file that builds the precompiled header: `Pch_cpp` when
    /// set, otherwise the header name with a `.cpp` extension.
    pub fn pch_source(&self) -> Option<String> {
        let header = self.pch_header()?;
        match self.option(OptionId::PchCpp) {
            Some(cpp) if !cpp.is_empty() && !cpp.eq_ignore_ascii_case("none") => {
                Some(cpp.to_string())
            }
            _ => Some(
                Path::new(header)
                    .with_extension("cpp")
                    .to_string_lossy()
                    .into_owned(),
            ),
        }
    }

    pub fn exe_type(&self) -> ExeType {
        self.option(OptionId::ExeType)
            .and_then(ExeType::parse)
            .unwrap_or(ExeType::Console)
    }

    /// The value of an option as text, if the descriptor sets it.
    pub fn option(&self, id: OptionId) -> Option<&str> {
        self.options.get(&id).map(|v| v.value.as_str())
    }

    /// Like [`option`](Self::option), looked up by key name.
    pub fn option_by_name(&self, name: &str) -> Option<&str> {
        options::lookup(name).and_then(|spec| self.option(spec.id))
    }

    /// A boolean option, falling back to the registry default.
    pub fn bool_option(&self, id: OptionId) -> bool {
        match self.options.get(&id) {
            Some(v) => v.value.as_bool(),
            None => id.spec().default_value().as_bool(),
        }
    }

    pub fn option_value(&self, id: OptionId) -> Option<&OptionValue> {
        self.options.get(&id)
    }

    /// Every option the descriptor sets, in registry order.
    pub fn options(&self) -> impl Iterator<Item = (OptionId, &OptionValue)> {
        self.options.iter().map(|(id, v)| (*id, v))
    }

    /// Set an option, keeping any comment it already had.
    pub fn set_option(&mut self, id: OptionId, value: impl Into<Value>) {
        let value = id.spec().coerce(value.into());
        match self.options.get_mut(&id) {
            Some(existing) => existing.value = value,
            None => {
                self.options.insert(id, OptionValue::new(value));
            }
        }
    }

    /// Set an option and replace its comment. `None` removes the comment.
    pub fn set_option_with_comment(
        &mut self,
        id: OptionId,
        value: impl Into<Value>,
        comment: Option<String>,
    ) {
        let value = id.spec().coerce(value.into());
        self.options.insert(id, OptionValue::with_comment(value, comment));
    }

    /// Set an option from its key name and textual value.
    pub fn set_option_by_name(&mut self, name: &str, value: &str) -> Result<()> {
        let spec =
            options::lookup(name).ok_or_else(|| Error::UnknownOption(name.to_string()))?;
        let value = spec.parse_value(value).ok_or_else(|| Error::InvalidValue {
            option: spec.name.to_string(),
            value: value.to_string(),
        })?;
        self.set_option(spec.id, value);
        Ok(())
    }

    pub fn remove_option(&mut self, id: OptionId) -> Option<OptionValue> {
        self.options.remove(&id)
    }

    // ─── Files ───────────────────────────────────────────────────────────

    pub fn src_files(&self) -> &[FileEntry] {
        &self.src_files
    }

    pub fn lib_files(&self) -> &[FileEntry] {
        &self.lib_files
    }

    /// The `.idl` files among the sources.
    pub fn idl_files(&self) -> impl Iterator<Item = &FileEntry> {
        self.src_files.iter().filter(|f| f.category() == FileCategory::Idl)
    }

    /// True when no files were listed and the default patterns stand in.
    pub fn uses_default_files(&self) -> bool {
        self.files_defaulted
    }

    pub fn add_src_file(&mut self, path: impl Into<String>) {
        if self.files_defaulted {
            self.src_files.clear();
            self.files_defaulted = false;
        }
        self.src_files.push(FileEntry::new(path));
    }

    pub fn add_lib_file(&mut self, path: impl Into<String>) {
        self.lib_files.push(FileEntry::new(path));
    }

    // ─── Diagnostics ─────────────────────────────────────────────────────

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn diagnose(
        &mut self,
        kind: DiagnosticKind,
        line: Option<usize>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            file: self.path.clone(),
            line,
            message: message.into(),
        };
        tracing::warn!(target: "srcfiles", "{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn list_mut(&mut self, list: FileList) -> &mut Vec<FileEntry> {
        match list {
            FileList::Src => &mut self.src_files,
            FileList::Lib => &mut self.lib_files,
        }
    }

    pub(crate) fn included_mut(&mut self, list: FileList) -> &mut HashSet<String> {
        match list {
            FileList::Src => &mut self.included_src,
            FileList::Lib => &mut self.included_lib,
        }
    }
}

//! Importing foreign project files.
//!
//! Each adapter walks its format's XML and fills a [`Descriptor`] directly.
//! The result is written out with [`DescriptorWriter::write_new`]; foreign
//! files are never modified.
//!
//! ```no_run
//! use srcfiles_rs::convert;
//! use srcfiles_rs::WriteMode;
//!
//! let conversion = convert::import_project("build/app.vcxproj", "src").unwrap();
//! conversion.write(WriteMode::Write).unwrap();
//! ```

pub mod codeblocks;
pub mod codelite;
pub mod condition;
pub mod vcproj;
pub mod vcxproj;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::descriptor::{DESCRIPTOR_NAME, Descriptor, DiagnosticKind};
use crate::error::{Error, Result};
use crate::options::{ExeType, OptionId};
use crate::paths;
use crate::writer::{DescriptorWriter, WriteMode, WriteOutcome};

/// Extensions of files carried over into `Files:`.
const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "cc", "cxx", "rc", "idl", "hhp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignFormat {
    /// MSBuild `.vcxproj` (plus `.vcxproj.filters` when present).
    Vcxproj,
    /// Visual Studio 2008 and earlier `.vcproj`.
    Vcproj,
    /// CodeBlocks `.cbp`.
    CodeBlocks,
    /// CodeLite `.project`.
    CodeLite,
}

impl ForeignFormat {
    /// Pick the adapter from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "vcxproj" => Some(ForeignFormat::Vcxproj),
            "vcproj" => Some(ForeignFormat::Vcproj),
            "cbp" => Some(ForeignFormat::CodeBlocks),
            "project" => Some(ForeignFormat::CodeLite),
            _ => None,
        }
    }
}

impl fmt::Display for ForeignFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ForeignFormat::Vcxproj => "MSBuild project",
            ForeignFormat::Vcproj => "Visual Studio project",
            ForeignFormat::CodeBlocks => "CodeBlocks project",
            ForeignFormat::CodeLite => "CodeLite project",
        })
    }
}

/// A foreign project converted into a descriptor that has not been written
/// yet.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub descriptor: Descriptor,
    pub format: ForeignFormat,
    /// The project file the descriptor was built from.
    pub source: PathBuf,
}

impl Conversion {
    /// `Converted from app.vcxproj`
    pub fn header_comment(&self) -> String {
        let name = self
            .source
            .file_name()
            .map_or_else(
                || self.source.display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            );
        format!("Converted from {name}")
    }

    /// Write the descriptor to its own path.
    pub fn write(&self, mode: WriteMode) -> Result<WriteOutcome> {
        let outcome = DescriptorWriter::new(&self.descriptor).write_new(
            self.descriptor.path(),
            Some(&self.header_comment()),
            mode,
        )?;
        if outcome == WriteOutcome::Written {
            info!(
                from = %self.source.display(),
                to = %self.descriptor.path().display(),
                "converted {}",
                self.format
            );
        }
        Ok(outcome)
    }
}

/// Convert the project file `script` into a descriptor that will live in
/// `dest_dir`.
///
/// # Errors
/// [`Error::UnsupportedFormat`] for an unknown extension, [`Error::Read`] or
/// [`Error::Xml`] when the project (or its `.filters` companion) cannot be
/// read or parsed. Listed files that do not exist are diagnostics on the
/// returned descriptor.
pub fn import_project(script: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<Conversion> {
    let script = paths::absolute(script.as_ref());
    let format = ForeignFormat::from_path(&script)
        .ok_or_else(|| Error::UnsupportedFormat(script.clone()))?;
    let text = read_project(&script)?;
    let doc = parse_xml(&script, &text)?;

    let mut ctx = ImportContext::new(&script, dest_dir.as_ref());
    match format {
        ForeignFormat::Vcxproj => {
            vcxproj::import(&doc, &mut ctx);
            let mut filters = script.clone().into_os_string();
            filters.push(".filters");
            let filters = PathBuf::from(filters);
            if filters.is_file() {
                let text = read_project(&filters)?;
                vcxproj::import_filters(&parse_xml(&filters, &text)?, &mut ctx);
            }
        }
        ForeignFormat::Vcproj => vcproj::import(&doc, &mut ctx),
        ForeignFormat::CodeBlocks => codeblocks::import(&doc, &mut ctx),
        ForeignFormat::CodeLite => codelite::import(&doc, &mut ctx),
    }

    let mut descriptor = ctx.desc;
    if descriptor.option(OptionId::Project).is_none_or(str::is_empty) {
        if let Some(stem) = script.file_stem().and_then(|s| s.to_str()) {
            descriptor.set_option(OptionId::Project, stem);
        }
    }
    debug!(
        script = %script.display(),
        files = descriptor.src_files().len(),
        diagnostics = descriptor.diagnostics().len(),
        "imported {format}"
    );
    Ok(Conversion {
        descriptor,
        format,
        source: script,
    })
}

fn read_project(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::read(path, e))
}

fn parse_xml<'a>(path: &Path, text: &'a str) -> Result<roxmltree::Document<'a>> {
    roxmltree::Document::parse(text).map_err(|source| Error::Xml {
        path: path.to_path_buf(),
        source,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Shared adapter state
// ═══════════════════════════════════════════════════════════════════════════════

/// The descriptor being filled plus the two directories every path in the
/// foreign file has to be translated between.
#[derive(Debug)]
pub(crate) struct ImportContext {
    pub(crate) desc: Descriptor,
    script_dir: PathBuf,
    seen: HashSet<String>,
}

impl ImportContext {
    pub(crate) fn new(script: &Path, dest_dir: &Path) -> Self {
        let script_dir = script.parent().map(Path::to_path_buf).unwrap_or_default();
        let desc = Descriptor::new(paths::absolute(dest_dir).join(DESCRIPTOR_NAME));
        Self {
            desc,
            script_dir,
            seen: HashSet::new(),
        }
    }

    /// A path written relative to the project file, re-expressed relative to
    /// the descriptor.
    pub(crate) fn rebase(&self, raw: &str) -> String {
        paths::rebase(raw, &self.script_dir, &self.desc.directory)
    }

    /// Add a file listed in the project, if its extension is one a
    /// descriptor lists. Repeats are ignored.
    pub(crate) fn add_source(&mut self, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() || is_macro(raw) {
            return;
        }
        let wanted = Path::new(&raw.replace('\\', "/"))
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)));
        if !wanted {
            return;
        }

        let rebased = self.rebase(raw);
        if !self.seen.insert(rebased.clone()) {
            return;
        }
        if !self.desc.directory.join(&rebased).exists() {
            self.desc
                .diagnose(DiagnosticKind::MissingFile, None, format!("cannot locate {rebased}"));
        }
        self.desc.add_src_file(rebased);
    }

    pub(crate) fn set_project(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.desc.set_option(OptionId::Project, name);
        }
    }
}

/// MSBuild and IDE macros (`$(IntDir)`, `%(AdditionalOptions)`) cannot be
/// resolved outside the IDE.
fn is_macro(value: &str) -> bool {
    value.contains("$(") || value.contains("%(")
}

/// Which build configuration a foreign configuration name stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuildKind {
    Release,
    Debug,
}

impl BuildKind {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.contains("release") {
            Some(BuildKind::Release)
        } else if name.contains("debug") {
            Some(BuildKind::Debug)
        } else {
            None
        }
    }

    pub(crate) fn configuration(self) -> &'static str {
        match self {
            BuildKind::Release => "Release",
            BuildKind::Debug => "Debug",
        }
    }
}

/// Settings read from one configuration of a foreign project.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ConfigSettings {
    /// Warning level `"1"`..`"4"`.
    pub(crate) warn: Option<String>,
    /// `Some(true)` to optimize for speed, `Some(false)` for size.
    pub(crate) optimize_speed: Option<bool>,
    pub(crate) exe_type: Option<ExeType>,
    pub(crate) inc_dirs: Vec<String>,
    /// Preprocessor definitions, as written (`NAME` or `NAME=value`).
    pub(crate) defines: Vec<String>,
}

impl ConfigSettings {
    /// Settings of `other` fill in or extend this configuration.
    pub(crate) fn merge(&mut self, other: &ConfigSettings) {
        if other.warn.is_some() {
            self.warn.clone_from(&other.warn);
        }
        if other.optimize_speed.is_some() {
            self.optimize_speed = other.optimize_speed;
        }
        if other.exe_type.is_some() {
            self.exe_type = other.exe_type;
        }
        extend_unique(&mut self.inc_dirs, &other.inc_dirs);
        extend_unique(&mut self.defines, &other.defines);
    }

    pub(crate) fn add_inc_dirs<'s>(&mut self, dirs: impl IntoIterator<Item = &'s str>) {
        for dir in dirs {
            let dir = dir.trim().trim_matches('"');
            if !dir.is_empty() && !is_macro(dir) && !self.inc_dirs.iter().any(|d| d == dir) {
                self.inc_dirs.push(dir.to_string());
            }
        }
    }

    pub(crate) fn add_defines<'s>(&mut self, defines: impl IntoIterator<Item = &'s str>) {
        for define in defines {
            let define = define.trim();
            if !define.is_empty() && !self.defines.iter().any(|d| d == define) {
                self.defines.push(define.to_string());
            }
        }
    }

    /// Apply one GCC-style compiler switch as written in CodeBlocks and
    /// CodeLite projects. Switches without a descriptor equivalent are
    /// dropped.
    pub(crate) fn add_gcc_option(&mut self, option: &str) {
        let option = option.trim();
        if let Some(define) = option.strip_prefix("-D") {
            self.add_defines([define]);
        } else if let Some(dir) = option.strip_prefix("-I") {
            self.add_inc_dirs([dir]);
        } else {
            match option {
                "-O1" | "-O2" | "-O3" | "-Ofast" => self.optimize_speed = Some(true),
                "-Os" | "-Oz" => self.optimize_speed = Some(false),
                "-Wall" | "-Wextra" => self.warn = Some("4".into()),
                "" => {}
                other => debug!(option = other, "dropping compiler option"),
            }
        }
    }

    /// Compiler flags for the definitions that are not absorbed into other
    /// options.
    fn define_flags(&self) -> Vec<String> {
        self.defines.iter().filter_map(|d| translate_define(d)).collect()
    }

    fn exe_type_from_defines(&self) -> Option<ExeType> {
        self.defines.iter().find_map(|d| match d.as_str() {
            "_USRDLL" => Some(ExeType::Dll),
            "_CONSOLE" => Some(ExeType::Console),
            _ => None,
        })
    }
}

fn extend_unique(into: &mut Vec<String>, from: &[String]) {
    for item in from {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

/// A preprocessor definition as a compiler flag, or `None` for definitions
/// the descriptor expresses another way (`NDEBUG`, `_DEBUG`, `_CONSOLE`,
/// `_USRDLL`) or that reference macros.
pub(crate) fn translate_define(define: &str) -> Option<String> {
    let define = define.trim();
    match define {
        "" | "NDEBUG" | "_DEBUG" | "_CONSOLE" | "_USRDLL" => None,
        d if is_macro(d) => None,
        d => Some(format!("-D{d}")),
    }
}

/// Release and Debug settings of a project, applied to the descriptor
/// together so shared settings land in the `_cmn` options.
#[derive(Debug, Clone, Default)]
pub(crate) struct BuildSettings {
    pub(crate) release: Option<ConfigSettings>,
    pub(crate) debug: Option<ConfigSettings>,
}

impl BuildSettings {
    pub(crate) fn slot(&mut self, kind: BuildKind) -> &mut Option<ConfigSettings> {
        match kind {
            BuildKind::Release => &mut self.release,
            BuildKind::Debug => &mut self.debug,
        }
    }

    /// Merge settings shared by every configuration into each of them. With
    /// no configurations the shared settings stand in for Release.
    pub(crate) fn with_common(mut self, common: &ConfigSettings) -> Self {
        if self.release.is_none() && self.debug.is_none() {
            self.release = Some(common.clone());
            return self;
        }
        for config in [&mut self.release, &mut self.debug].into_iter().flatten() {
            let mut merged = common.clone();
            merged.merge(config);
            *config = merged;
        }
        self
    }

    pub(crate) fn apply(self, ctx: &mut ImportContext) {
        let configs: Vec<&ConfigSettings> = [self.release.as_ref(), self.debug.as_ref()]
            .into_iter()
            .flatten()
            .collect();
        if configs.is_empty() {
            return;
        }

        if let Some(warn) = configs.iter().find_map(|c| c.warn.as_deref()) {
            ctx.desc.set_option(OptionId::Warn, warn);
        }
        if let Some(speed) = configs.iter().find_map(|c| c.optimize_speed) {
            let optimize = if speed { "speed" } else { "space" };
            ctx.desc.set_option(OptionId::Optimize, optimize);
        }
        let exe_type = configs
            .iter()
            .find_map(|c| c.exe_type)
            .or_else(|| configs.iter().find_map(|c| c.exe_type_from_defines()));
        if let Some(exe_type) = exe_type {
            ctx.desc.set_option(OptionId::ExeType, exe_type.as_str());
        }

        let mut inc_dirs = Vec::new();
        for config in &configs {
            extend_unique(&mut inc_dirs, &config.inc_dirs);
        }
        if !inc_dirs.is_empty() {
            let rebased: Vec<String> = inc_dirs.iter().map(|d| ctx.rebase(d)).collect();
            ctx.desc.set_option(OptionId::IncDirs, rebased.join(";"));
        }

        let (common, release, debug) = match (&self.release, &self.debug) {
            (Some(rel), Some(dbg)) => {
                let rel_flags = rel.define_flags();
                let dbg_flags = dbg.define_flags();
                let common: Vec<String> = rel_flags
                    .iter()
                    .filter(|f| dbg_flags.contains(f))
                    .cloned()
                    .collect();
                let release = rel_flags
                    .iter()
                    .filter(|f| !common.contains(f))
                    .cloned()
                    .collect();
                let debug = dbg_flags
                    .iter()
                    .filter(|f| !common.contains(f))
                    .cloned()
                    .collect();
                (common, release, debug)
            }
            (Some(only), None) | (None, Some(only)) => {
                (only.define_flags(), Vec::new(), Vec::new())
            }
            (None, None) => (Vec::new(), Vec::new(), Vec::new()),
        };
        for (id, flags) in [
            (OptionId::CFlagsCmn, common),
            (OptionId::CFlagsRel, release),
            (OptionId::CFlagsDbg, debug),
        ] {
            if !flags.is_empty() {
                ctx.desc.set_option(id, flags.join(" "));
            }
        }
    }
}

//! Reading descriptors, optionally with a private overlay.
//!
//! The overlay is a second, complete descriptor (typically kept out of
//! version control) whose option values win over the master's.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::parse::DescriptorParser;

/// Builder for reading a [`Descriptor`].
///
/// # Example
/// ```no_run
/// use srcfiles_rs::DescriptorReader;
///
/// let desc = DescriptorReader::new()
///     .private(".private/.srcfiles.yaml")
///     .read(".srcfiles.yaml")
///     .unwrap();
/// println!("{:?}", desc.project_name());
/// ```
#[derive(Debug, Clone)]
pub struct DescriptorReader {
    private: Option<PathBuf>,
    check_files: bool,
}

impl Default for DescriptorReader {
    fn default() -> Self {
        Self {
            private: None,
            check_files: true,
        }
    }
}

impl DescriptorReader {
    /// A reader that checks listed files exist and applies no overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer the descriptor at `path` over the master. A private descriptor
    /// that is missing or unreadable is skipped without error.
    pub fn private(mut self, path: impl Into<PathBuf>) -> Self {
        self.private = Some(path.into());
        self
    }

    /// Whether to report listed files that do not exist.
    pub fn check_files(mut self, check: bool) -> Self {
        self.check_files = check;
        self
    }

    /// Read the master descriptor and apply the overlay, if any.
    ///
    /// # Errors
    /// Returns [`Error::Read`](crate::Error::Read) when the master cannot be
    /// read.
    pub fn read(&self, master: impl AsRef<Path>) -> Result<Descriptor> {
        let master = DescriptorParser::new(self.check_files).parse_file(master.as_ref())?;

        let Some(private_path) = &self.private else {
            return Ok(master);
        };
        match DescriptorParser::new(self.check_files).parse_file(private_path) {
            Ok(private) => Ok(overlay(&master, &private)),
            Err(err) => {
                debug!(private = %private_path.display(), %err, "no private descriptor applied");
                Ok(master)
            }
        }
    }

    /// Parse descriptor text that is already in memory. `path` places the
    /// descriptor for relative paths and includes; no overlay is applied.
    pub fn parse_str(&self, text: &str, path: impl AsRef<Path>) -> Descriptor {
        DescriptorParser::new(self.check_files).parse_text(text, path.as_ref())
    }
}

/// Merge a private descriptor over a master one, producing a new model.
///
/// Every option the private descriptor sets replaces the master's. The
/// private comment wins when both lines carry one; when only the master has
/// a comment it is kept. Files the private descriptor lists are appended;
/// duplicates are left for consumers to drop.
pub fn overlay(master: &Descriptor, private: &Descriptor) -> Descriptor {
    let mut merged = master.clone();

    for (id, value) in &private.options {
        let mut value = value.clone();
        if value.comment.is_none() {
            value.comment = master.options.get(id).and_then(|m| m.comment.clone());
        }
        merged.options.insert(*id, value);
    }

    // An empty private file list means "nothing listed", not the default
    // patterns.
    if !private.files_defaulted {
        if merged.files_defaulted {
            merged.src_files.clear();
            merged.files_defaulted = false;
        }
        merged.src_files.extend(private.src_files.iter().cloned());
        merged.included_src.extend(private.included_src.iter().cloned());
    }
    merged.lib_files.extend(private.lib_files.iter().cloned());
    merged.included_lib.extend(private.included_lib.iter().cloned());
    merged.diagnostics.extend(private.diagnostics.iter().cloned());

    debug!(
        master = %master.path.display(),
        private = %private.path.display(),
        options = private.options.len(),
        files = private.src_files.len(),
        "applied private descriptor"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FileEntry;
    use crate::options::OptionId;
    use pretty_assertions::assert_eq;

    fn paths_of(files: &[FileEntry]) -> Vec<&str> {
        files.iter().map(FileEntry::path).collect()
    }

    fn setup(master: &str, private: Option<&str>) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let master_path = dir.path().join(".srcfiles.yaml");
        let private_path = dir.path().join(".private").join(".srcfiles.yaml");
        std::fs::write(&master_path, master).unwrap();
        if let Some(text) = private {
            std::fs::create_dir_all(private_path.parent().unwrap()).unwrap();
            std::fs::write(&private_path, text).unwrap();
        }
        (dir, master_path, private_path)
    }

    #[test]
    fn private_value_wins_master_comment_kept() {
        let (_dir, master, private) = setup(
            "Options:\n    Warn: 4 # default\n    Optimize: space # size\nFiles:\n    a.cpp\n",
            Some("Options:\n    Warn: 2\n    Optimize: speed # faster\n"),
        );
        let desc = DescriptorReader::new()
            .check_files(false)
            .private(&private)
            .read(&master)
            .unwrap();

        let warn = desc.option_value(OptionId::Warn).unwrap();
        assert_eq!(warn.value.as_str(), "2");
        assert_eq!(warn.comment.as_deref(), Some("default"));

        let optimize = desc.option_value(OptionId::Optimize).unwrap();
        assert_eq!(optimize.value.as_str(), "speed");
        assert_eq!(optimize.comment.as_deref(), Some("faster"));
    }

    #[test]
    fn private_files_are_appended() {
        let (_dir, master, private) = setup(
            "Files:\n    a.cpp\n    b.cpp\n",
            Some("Files:\n    b.cpp\n    debug_only.cpp\n"),
        );
        let desc = DescriptorReader::new()
            .check_files(false)
            .private(&private)
            .read(&master)
            .unwrap();
        assert_eq!(
            paths_of(desc.src_files()),
            ["a.cpp", "b.cpp", "b.cpp", "debug_only.cpp"]
        );
    }

    #[test]
    fn private_without_files_adds_nothing() {
        let (_dir, master, private) =
            setup("Files:\n    a.cpp\n", Some("Options:\n    Project: mine\n"));
        let desc = DescriptorReader::new()
            .check_files(false)
            .private(&private)
            .read(&master)
            .unwrap();
        assert_eq!(paths_of(desc.src_files()), ["a.cpp"]);
        assert_eq!(desc.project_name(), Some("mine"));
    }

    #[test]
    fn missing_private_is_not_an_error() {
        let (_dir, master, private) =
            setup("Options:\n    Project: demo\nFiles:\n    a.cpp\n", None);
        let desc = DescriptorReader::new()
            .check_files(false)
            .private(&private)
            .read(&master)
            .unwrap();
        assert_eq!(desc.project_name(), Some("demo"));
    }

    #[test]
    fn missing_master_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DescriptorReader::new().read(dir.path().join(".srcfiles.yaml"));
        assert!(matches!(result, Err(crate::Error::Read { .. })));
    }

    #[test]
    fn overlay_leaves_inputs_untouched() {
        let reader = DescriptorReader::new().check_files(false);
        let master = reader.parse_str("Options:\n    Warn: 4\n", "/p/.srcfiles.yaml");
        let private = reader.parse_str("Options:\n    Warn: 1\n", "/p/.private/.srcfiles.yaml");
        let merged = overlay(&master, &private);
        assert_eq!(merged.option(OptionId::Warn), Some("1"));
        assert_eq!(master.option(OptionId::Warn), Some("4"));
        assert_eq!(private.option(OptionId::Warn), Some("1"));
    }
}

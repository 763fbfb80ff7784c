//! `.include` resolution.
//!
//! An include parses another descriptor and folds its source files into the
//! current list, re-expressed relative to the including descriptor's
//! directory. Entries already folded in by an earlier include are skipped.

use tracing::debug;

use crate::descriptor::{Descriptor, DiagnosticKind, FileEntry, FileList, locate_descriptor};
use crate::parse::DescriptorParser;
use crate::paths;

impl DescriptorParser {
    pub(crate) fn resolve_include(
        &mut self,
        desc: &mut Descriptor,
        target: &str,
        list: FileList,
        line_no: usize,
    ) {
        let mut path = paths::normalize(&desc.directory.join(paths::from_text(target)));
        if path.is_dir() {
            match locate_descriptor(&path) {
                Some(found) => path = found,
                None => {
                    desc.diagnose(
                        DiagnosticKind::IncludeUnreadable,
                        Some(line_no),
                        format!("no descriptor found in {target}"),
                    );
                    return;
                }
            }
        }

        if self.stack.contains(&path) {
            desc.diagnose(
                DiagnosticKind::IncludeCycle,
                Some(line_no),
                format!("{target} is already being included"),
            );
            return;
        }

        let nested = match self.parse_nested(&path) {
            Ok(nested) => nested,
            Err(err) => {
                desc.diagnose(
                    DiagnosticKind::IncludeUnreadable,
                    Some(line_no),
                    format!("cannot read {target}: {err}"),
                );
                return;
            }
        };

        let mut added = 0usize;
        for entry in &nested.src_files {
            let rebased = paths::rebase(entry.path(), &nested.directory, &desc.directory);
            if desc.included_mut(list).insert(rebased.clone()) {
                desc.list_mut(list).push(FileEntry::new(rebased));
                added += 1;
            }
        }
        debug!(
            include = %path.display(),
            files = nested.src_files.len(),
            added,
            "folded in included descriptor"
        );
        desc.diagnostics.extend(nested.diagnostics);
    }
}

pub mod convert;
pub mod descriptor;
pub mod error;
mod include;
pub mod lines;
pub mod option_line;
pub mod options;
mod parse;
mod paths;
pub mod reader;
pub mod writer;

pub use descriptor::{
    Descriptor, Diagnostic, DiagnosticKind, FileCategory, FileEntry, locate_descriptor,
};
pub use error::{Error, Result};
pub use options::{ExeType, OptionId, OptionValue, Value};
pub use reader::{DescriptorReader, overlay};
pub use writer::{DescriptorWriter, DiffLine, WriteMode, WriteOutcome};

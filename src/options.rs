//! The option registry: every option a descriptor's `Options:` section may
//! contain, with its value kind, default, help comment and whether the writer
//! must always emit it.
//!
//! The registry is a static table built at compile time. Registry order is
//! also the order in which the writer emits options.

use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
//  Registry table
// ═══════════════════════════════════════════════════════════════════════════════

/// Declare the option enum and its parallel [`OptionSpec`] table in one go so
/// the two can never drift apart.
macro_rules! option_registry {
    ($($id:ident => $name:literal, $kind:ident, $default:literal, $required:literal, $help:literal;)*) => {
        /// Key of a recognized option.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum OptionId {
            $($id,)*
        }

        static REGISTRY: &[OptionSpec] = &[
            $(
                OptionSpec {
                    id: OptionId::$id,
                    name: $name,
                    kind: ValueKind::$kind,
                    default: $default,
                    required: $required,
                    help: $help,
                },
            )*
        ];
    };
}

option_registry! {
    Project      => "Project",       Text, "",        true,  "project name";
    ExeType      => "Exe_type",      Text, "console", true,  "[window | console | lib | dll | ocx]";
    Pch          => "Pch",           Text, "none",    true,  "name of precompiled header file, or \"none\" if not using precompiled headers";
    PchCpp       => "Pch_cpp",       Text, "none",    false, "source file used to build precompiled header (default uses same name as Pch option)";
    Optimize     => "Optimize",      Text, "space",   true,  "[space | speed] optimization";
    Warn         => "Warn",          Text, "4",       true,  "[1-4] warning level";
    Permissive   => "Permissive",    Bool, "false",   false, "true means add -permissive- compiler flag";
    Stdcall      => "Stdcall",       Bool, "false",   false, "true to use stdcall calling convention, false for cdecl";
    CrtRel       => "Crt_rel",       Text, "static",  false, "[static | dll] type of CRT to link to in release builds";
    CrtDbg       => "Crt_dbg",       Text, "static",  false, "[static | dll] type of CRT to link to in debug builds";
    MsLinker     => "Ms_linker",     Bool, "true",    false, "true means use link.exe even when compiling with clang";
    Xgettext     => "Xgettext",      Bool, "false",   false, "true means generate a .pot file using xgettext";
    TargetDir    => "TargetDir",     Text, "",        false, "directory to place the target (.exe, .lib, .dll) in";
    IncDirs      => "IncDirs",       Text, "",        false, "additional directories for header files";
    LibDirs      => "LibDirs",       Text, "",        false, "additional directories for library files";
    CFlagsCmn    => "CFlags_cmn",    Text, "",        false, "flags to pass to the compiler in all builds";
    CFlagsRel    => "CFlags_rel",    Text, "",        false, "flags to pass to the compiler in release builds";
    CFlagsDbg    => "CFlags_dbg",    Text, "",        false, "flags to pass to the compiler in debug builds";
    ClangCmn     => "Clang_cmn",     Text, "",        false, "flags to pass only to the clang compiler in all builds";
    ClangRel     => "Clang_rel",     Text, "",        false, "flags to pass only to the clang compiler in release builds";
    ClangDbg     => "Clang_dbg",     Text, "",        false, "flags to pass only to the clang compiler in debug builds";
    LinkFlagsCmn => "LinkFlags_cmn", Text, "",        false, "flags to pass to the linker in all builds";
    LinkFlagsRel => "LinkFlags_rel", Text, "",        false, "flags to pass to the linker in release builds";
    LinkFlagsDbg => "LinkFlags_dbg", Text, "",        false, "flags to pass to the linker in debug builds";
    LibsCmn      => "Libs_cmn",      Text, "",        false, "additional libraries to link to in all builds";
    LibsRel      => "Libs_rel",      Text, "",        false, "additional libraries to link to in release builds";
    LibsDbg      => "Libs_dbg",      Text, "",        false, "additional libraries to link to in debug builds";
    MidlFlags    => "MidlFlags",     Text, "",        false, "flags to pass to the midl compiler";
    Natvis       => "Natvis",        Text, "",        false, "MSVC Debug visualizer";
    BuildLibs    => "Build_libs",    Text, "",        false, "libraries that need to be built before this project";
}

/// Keys older versions of the format wrote. They are accepted without a
/// diagnostic when reading and never written back.
const OBSOLETE_KEYS: &[&str] = &["TargetDirs", "64Bit", "Bit_suffix", "Ms_rc"];

// ═══════════════════════════════════════════════════════════════════════════════
//  Specs
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Text,
}

/// Immutable description of one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub id: OptionId,
    /// Key as written in the descriptor.
    pub name: &'static str,
    pub kind: ValueKind,
    /// Default value in its textual form.
    pub default: &'static str,
    /// Required options are written even when the model has no value.
    pub required: bool,
    /// Comment written after the value when the line carries none of its own.
    pub help: &'static str,
}

impl OptionSpec {
    /// The default as a typed [`Value`].
    pub fn default_value(&self) -> Value {
        match self.kind {
            ValueKind::Bool => Value::Bool(self.default == "true"),
            ValueKind::Text => Value::Text(self.default.to_string()),
        }
    }

    /// Convert raw descriptor text into a typed value for this option.
    /// Returns `None` when a boolean option holds something unrecognizable.
    pub fn parse_value(&self, raw: &str) -> Option<Value> {
        match self.kind {
            ValueKind::Bool => parse_bool(raw).map(Value::Bool),
            ValueKind::Text => Some(Value::Text(raw.to_string())),
        }
    }

    /// Give a value the kind this option holds, so `"yes"` set on a boolean
    /// option compares equal to `true`.
    pub fn coerce(&self, value: Value) -> Value {
        match (self.kind, value) {
            (ValueKind::Bool, Value::Text(raw)) => match parse_bool(&raw) {
                Some(b) => Value::Bool(b),
                None => Value::Text(raw),
            },
            (ValueKind::Text, Value::Bool(b)) => Value::Text(b.to_string()),
            (_, value) => value,
        }
    }
}

impl OptionId {
    /// The registry entry for this option.
    pub fn spec(self) -> &'static OptionSpec {
        &REGISTRY[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Lookup
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of looking up a key found in a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Known(&'static OptionSpec),
    Obsolete,
    Unknown,
}

/// Find the spec for an option key. Keys are matched case-insensitively.
pub fn lookup(name: &str) -> Option<&'static OptionSpec> {
    REGISTRY.iter().find(|spec| spec.name.eq_ignore_ascii_case(name))
}

/// Like [`lookup`] but also recognizes obsolete keys.
pub fn classify_key(name: &str) -> Lookup {
    if let Some(spec) = lookup(name) {
        Lookup::Known(spec)
    } else if OBSOLETE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(name)) {
        Lookup::Obsolete
    } else {
        Lookup::Unknown
    }
}

/// Every option, in registry (= write) order.
pub fn all() -> &'static [OptionSpec] {
    REGISTRY
}

/// The options the writer must always emit, in registry order.
pub fn required_options() -> impl Iterator<Item = &'static OptionSpec> {
    REGISTRY.iter().filter(|spec| spec.required)
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Values
// ═══════════════════════════════════════════════════════════════════════════════

/// A typed option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn as_str(&self) -> &str {
        match self {
            Value::Bool(true) => "true",
            Value::Bool(false) => "false",
            Value::Text(s) => s,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Text(s) => parse_bool(s).unwrap_or(false),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// An option's value together with the trailing comment of the line it came
/// from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionValue {
    pub value: Value,
    pub comment: Option<String>,
    /// Set when a caller replaced the comment. Only then does the writer
    /// overwrite the comment already on the line.
    pub(crate) explicit_comment: bool,
}

impl OptionValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            comment: None,
            explicit_comment: false,
        }
    }

    pub(crate) fn parsed(value: Value, comment: Option<&str>) -> Self {
        Self {
            value,
            comment: comment.filter(|c| !c.is_empty()).map(String::from),
            explicit_comment: false,
        }
    }

    pub fn with_comment(value: impl Into<Value>, comment: Option<String>) -> Self {
        Self {
            value: value.into(),
            comment,
            explicit_comment: true,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Executable type
// ═══════════════════════════════════════════════════════════════════════════════

/// Interpretation of the `Exe_type` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExeType {
    Console,
    Window,
    Lib,
    Dll,
    Ocx,
}

impl ExeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExeType::Console => "console",
            ExeType::Window => "window",
            ExeType::Lib => "lib",
            ExeType::Dll => "dll",
            ExeType::Ocx => "ocx",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "console" => Some(ExeType::Console),
            "window" | "windows" | "gui" => Some(ExeType::Window),
            "lib" => Some(ExeType::Lib),
            "dll" => Some(ExeType::Dll),
            "ocx" => Some(ExeType::Ocx),
            _ => None,
        }
    }
}

//! Path helpers. Every relative path is resolved against an explicit base
//! directory; the process working directory is never changed.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment where there is one. The filesystem is not consulted.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Absolute, normalized form of `path`. Relative paths are taken relative to
/// the current directory.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path)
        .map(|p| normalize(&p))
        .unwrap_or_else(|_| normalize(path))
}

/// Convert a path written in a descriptor or foreign project (which may use
/// either separator) into a native path.
pub(crate) fn from_text(text: &str) -> PathBuf {
    PathBuf::from(text.replace('\\', "/"))
}

/// Render a path with forward slashes, the way descriptors store them.
pub(crate) fn to_slash(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::RootDir => Some(String::new()),
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect();
    match parts.as_slice() {
        [root] if root.is_empty() => "/".to_string(),
        _ => parts.join("/"),
    }
}

/// Resolve `text` (relative to `from_dir`) and express it relative to
/// `to_dir`. Both directories should be absolute.
pub(crate) fn rebase(text: &str, from_dir: &Path, to_dir: &Path) -> String {
    let resolved = normalize(&from_dir.join(from_text(text)));
    let relative = pathdiff::diff_paths(&resolved, normalize(to_dir)).unwrap_or(resolved);
    let rendered = to_slash(&relative);
    if rendered.is_empty() {
        ".".to_string()
    } else {
        rendered
    }
}

/// True for entries such as `*.cpp` that name a pattern rather than a file.
pub(crate) fn is_wildcard(text: &str) -> bool {
    text.contains(['*', '?'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_parent_segments() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../x/../y")), PathBuf::from("../y"));
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
    }

    #[test]
    fn rebase_between_sibling_directories() {
        let from = Path::new("/proj/lib");
        let to = Path::new("/proj/app");
        assert_eq!(rebase("x.cpp", from, to), "../lib/x.cpp");
        assert_eq!(rebase("sub\\y.cpp", from, to), "../lib/sub/y.cpp");
        assert_eq!(rebase("../app/z.cpp", from, to), "z.cpp");
    }

    #[test]
    fn rebase_into_subdirectory() {
        assert_eq!(
            rebase("src/a.cpp", Path::new("/p"), Path::new("/p/src")),
            "a.cpp"
        );
        assert_eq!(rebase("src", Path::new("/p"), Path::new("/p/src")), ".");
    }

    #[test]
    fn wildcard_detection() {
        assert!(is_wildcard("*.cpp"));
        assert!(!is_wildcard("main.cpp"));
    }
}

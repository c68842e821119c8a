//! Path guard shared by the file tools.
//!
//! Resolves a tool-supplied path against the workspace root and refuses
//! anything under a forbidden prefix (e.g., ~/.ssh, /etc).

use std::path::{Component, Path, PathBuf};

use skillloop_config::expand_tilde;

/// Error returned when a path is refused.
#[derive(Debug, thiserror::Error)]
pub enum PathGuardError {
    #[error("Path '{path}' matches forbidden pattern '{pattern}'")]
    Forbidden { path: String, pattern: String },

    #[error("Path is empty")]
    Empty,
}

/// Resolve `path` (relative paths are taken from `base_dir`) and check it
/// against `forbidden_paths`.
///
/// Both the lexical path and, when it exists, its canonical form are
/// checked, so symlinks into a forbidden tree are refused too.
pub fn resolve_path(
    path: &str,
    base_dir: &Path,
    forbidden_paths: &[String],
) -> Result<PathBuf, PathGuardError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(PathGuardError::Empty);
    }

    let expanded = expand_tilde(trimmed);
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    };
    let lexical = normalize(&joined);

    let canonical = canonical_form(&lexical);

    for pattern in forbidden_paths {
        let forbidden = normalize(&expand_tilde(pattern));
        let forbidden_canonical = canonical_form(&forbidden);
        let hit = lexical.starts_with(&forbidden)
            || canonical.starts_with(&forbidden)
            || canonical.starts_with(&forbidden_canonical);
        if hit {
            return Err(PathGuardError::Forbidden {
                path: path.into(),
                pattern: pattern.clone(),
            });
        }
    }

    Ok(lexical)
}

/// Canonicalize the path, or its nearest existing ancestor for paths that
/// don't exist yet (writes).
fn canonical_form(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let mut missing = Vec::new();
    let mut current = path;
    while let Some(parent) = current.parent() {
        if let Some(name) = current.file_name() {
            missing.push(name.to_os_string());
        }
        if let Ok(canonical) = parent.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }
        current = parent;
    }
    path.to_path_buf()
}

/// Lexically fold `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_base() {
        let base = Path::new("/work");
        let resolved = resolve_path("notes/a.txt", base, &[]).unwrap();
        assert_eq!(resolved, PathBuf::from("/work/notes/a.txt"));
    }

    #[test]
    fn dot_dot_is_folded() {
        let base = Path::new("/work/project");
        let resolved = resolve_path("../other/b.txt", base, &[]).unwrap();
        assert_eq!(resolved, PathBuf::from("/work/other/b.txt"));
    }

    #[test]
    fn forbidden_prefix_refused() {
        let result = resolve_path("/etc/shadow", Path::new("/"), &["/etc".into()]);
        assert!(matches!(result, Err(PathGuardError::Forbidden { .. })));
    }

    #[test]
    fn traversal_into_forbidden_refused() {
        let result = resolve_path(
            "../../etc/passwd",
            Path::new("/home/user"),
            &["/etc".into()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn sibling_with_shared_prefix_allowed() {
        let result = resolve_path("/etcetera/file", Path::new("/"), &["/etc".into()]);
        assert!(result.is_ok());
    }

    #[test]
    fn empty_path_refused() {
        assert!(matches!(
            resolve_path("  ", Path::new("/"), &[]),
            Err(PathGuardError::Empty)
        ));
    }
}

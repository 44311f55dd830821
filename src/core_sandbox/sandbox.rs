//! Path resolution confined to the server root.
//!
//! Every path a session works with goes through [`Sandbox::resolve`]. The
//! candidate is normalized lexically first (no filesystem access) and then
//! compared to the root component by component, so a sibling directory whose
//! name merely starts with the root's name is never accepted. Existing paths
//! are also canonicalized and checked again so a symlink cannot lead out.

use crate::core_sandbox::error::SandboxError;
use log::warn;
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Builds a sandbox around `root`, which must exist.
    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the space-joined `args` against `working_dir`.
    ///
    /// A lone `..` is the parent of `working_dir`. Arguments starting with
    /// `/` are taken relative to the root.
    pub fn resolve(&self, working_dir: &Path, args: &[String]) -> Result<PathBuf, SandboxError> {
        let raw = args.join(" ");
        let raw = raw.trim();

        let candidate = if raw == ".." {
            match working_dir.parent() {
                Some(parent) => parent.to_path_buf(),
                None => return Err(SandboxError::OutOfScope(working_dir.to_path_buf())),
            }
        } else if let Some(from_root) = raw.strip_prefix('/') {
            self.root.join(from_root.trim_start_matches('/'))
        } else {
            working_dir.join(raw)
        };

        let normalized = match normalize(&candidate) {
            Some(path) => path,
            None => {
                warn!("Path escapes the filesystem root: {:?}", candidate);
                return Err(SandboxError::OutOfScope(candidate));
            }
        };

        if !self.contains(&normalized) {
            warn!("Path is outside of the allowed area: {:?}", normalized);
            return Err(SandboxError::OutOfScope(normalized));
        }

        match canonicalize_existing(&normalized) {
            Some(canonical) if self.contains(&canonical) => {}
            Some(canonical) => {
                warn!(
                    "Path {:?} points outside of the allowed area: {:?}",
                    normalized, canonical
                );
                return Err(SandboxError::OutOfScope(normalized));
            }
            None => {
                warn!("Path {:?} goes through a dangling link", normalized);
                return Err(SandboxError::OutOfScope(normalized));
            }
        }

        Ok(normalized)
    }

    /// Like [`Sandbox::resolve`], but resolving to `working_dir` itself is an error.
    pub fn resolve_change(
        &self,
        working_dir: &Path,
        args: &[String],
    ) -> Result<PathBuf, SandboxError> {
        let resolved = self.resolve(working_dir, args)?;
        if resolved == working_dir {
            return Err(SandboxError::Unchanged(resolved));
        }
        Ok(resolved)
    }

    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    /// Root-relative form of `path` shown to clients, `/` for the root itself.
    pub fn display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) => {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                format!("/{}", parts.join("/"))
            }
            Err(_) => path.display().to_string(),
        }
    }
}

/// True when `path` lies strictly below `dir`.
pub fn is_inside(dir: &Path, path: &Path) -> bool {
    path != dir && path.starts_with(dir)
}

/// Canonical form of `path` where the path may not exist yet.
///
/// The nearest existing ancestor is canonicalized and the missing components
/// are appended to it, so a link anywhere along the path is followed. `None`
/// when a component is a link whose target doesn't exist.
fn canonicalize_existing(path: &Path) -> Option<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut canonical) => {
                for component in missing.iter().rev() {
                    canonical.push(component);
                }
                return Some(canonical);
            }
            Err(_) if existing.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink()) => {
                return None;
            }
            Err(_) => {
                missing.push(existing.file_name()?);
                existing = existing.parent()?;
            }
        }
    }
}

/// Lexical `.`/`..` normalization. `None` when `..` climbs above the filesystem root.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() || normalized.as_os_str().is_empty() {
                    return None;
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    Some(normalized)
}

//! Source descriptor: where the data lives.
//!
//! A [`SourceRef`] is either one normalized path or a non-empty ordered list of
//! them, never both. Shape validation happens here, once; nothing downstream
//! re-inspects the caller's original value. Normalization is purely lexical:
//! no file-system access is performed.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRef {
    Single(PathBuf),
    List(Vec<PathBuf>),
}

impl SourceRef {
    /// Validate and normalize a single path-like value.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(SourceRef::Single(normalize_path(path.as_ref())?))
    }

    /// Validate and normalize an ordered sequence of path-like values.
    ///
    /// An empty sequence is rejected: a list source must name at least one path.
    pub fn from_paths<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths = paths
            .into_iter()
            .map(|p| normalize_path(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if paths.is_empty() {
            return Err(Error::InvalidSourceKind(
                "a source list must contain at least one path".into(),
            ));
        }
        Ok(SourceRef::List(paths))
    }

    /// All paths, in order. A single source yields a one-element slice.
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            SourceRef::Single(p) => std::slice::from_ref(p),
            SourceRef::List(ps) => ps,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, SourceRef::List(_))
    }

    /// The single path, if this is not a list.
    pub fn as_single(&self) -> Option<&Path> {
        match self {
            SourceRef::Single(p) => Some(p),
            SourceRef::List(_) => None,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Single(p) => write!(f, "{}", p.display()),
            SourceRef::List(ps) => {
                f.write_str("[")?;
                for (i, p) in ps.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", p.display())?;
                }
                f.write_str("]")
            }
        }
    }
}

impl TryFrom<&Value> for SourceRef {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => SourceRef::from_path(s),
            Value::Array(items) => {
                let mut paths = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::String(s) => paths.push(s.as_str()),
                        other => {
                            return Err(Error::InvalidSourceKind(format!(
                                "source list element {i} is {}, expected a path string",
                                value_kind(other)
                            )))
                        }
                    }
                }
                SourceRef::from_paths(paths)
            }
            other => Err(Error::InvalidSourceKind(format!(
                "expected a path or a list of paths, got {}",
                value_kind(other)
            ))),
        }
    }
}

impl TryFrom<Value> for SourceRef {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        SourceRef::try_from(&value)
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Normalize a path-like value: `file://` stripping, `~` expansion,
/// relative-to-absolute resolution, and lexical `.`/`..` folding.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let mut path = path.to_path_buf();

    if let Some(s) = path.to_str() {
        if s.trim().is_empty() {
            return Err(Error::InvalidSourceKind("empty path".into()));
        }
        if let Some(rest) = s.strip_prefix("file://") {
            path = PathBuf::from(rest);
        } else if let Some(scheme) = uri_scheme(s) {
            return Err(Error::InvalidSourceKind(format!(
                "'{s}' is a {scheme}:// URI, not a file-system path"
            )));
        }
    } else if path.as_os_str().is_empty() {
        return Err(Error::InvalidSourceKind("empty path".into()));
    }

    let path = expand_tilde(path)?;
    let path = if path.is_absolute() {
        path
    } else {
        let cwd = std::env::current_dir().map_err(|e| {
            Error::Config(format!(
                "cannot resolve relative path '{}': {e}",
                path.display()
            ))
        })?;
        cwd.join(path)
    };
    Ok(fold_dots(&path))
}

fn uri_scheme(s: &str) -> Option<&str> {
    let (scheme, _) = s.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

fn expand_tilde(path: PathBuf) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = dirs::home_dir().ok_or_else(|| {
                Error::Config(format!(
                    "cannot expand '~' in '{}': home directory is unknown",
                    path.display()
                ))
            })?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(path),
    }
}

fn fold_dots(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(comp.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

//! Lazily loaded file handles.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::errors::{io_error, EvalError, EvalResult};

struct FileInner {
    path: String,
    lines: OnceLock<Vec<Arc<str>>>,
}

/// Handle to a local file or directory.
///
/// Contents are read on first use. A file yields its lines; a directory
/// yields the sorted paths of its entries.
#[derive(Clone)]
pub struct FileValue(Arc<FileInner>);

impl FileValue {
    pub fn new(path: impl Into<String>) -> EvalResult<Self> {
        let path = path.into();
        if path.contains("://") {
            return Err(EvalError::new(format!(
                "Remote paths are not supported: {path}"
            )));
        }
        Ok(FileValue(Arc::new(FileInner {
            path,
            lines: OnceLock::new(),
        })))
    }

    pub fn path(&self) -> &str {
        &self.0.path
    }

    /// Lines of the file, or entries of the directory.
    pub fn lines(&self) -> EvalResult<&[Arc<str>]> {
        if let Some(lines) = self.0.lines.get() {
            return Ok(lines.as_slice());
        }
        let loaded = load(&self.0.path)?;
        Ok(self.0.lines.get_or_init(|| loaded).as_slice())
    }

    /// Whole contents with lines joined by newlines.
    pub fn contents(&self) -> EvalResult<String> {
        Ok(self.lines()?.join("\n"))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &FileValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

fn load(path: &str) -> EvalResult<Vec<Arc<str>>> {
    let target = Path::new(path);
    if target.is_dir() {
        let mut entries = std::fs::read_dir(target)
            .map_err(|e| io_error(path, &e))?
            .map(|entry| {
                entry
                    .map(|e| Arc::from(e.path().to_string_lossy().as_ref()))
                    .map_err(|e| io_error(path, &e))
            })
            .collect::<EvalResult<Vec<Arc<str>>>>()?;
        entries.sort();
        return Ok(entries);
    }
    let text = std::fs::read_to_string(target).map_err(|e| io_error(path, &e))?;
    Ok(text.lines().map(Arc::from).collect())
}

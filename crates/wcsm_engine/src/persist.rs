use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{path:?} exists and is not a directory")]
    NotADirectory { path: PathBuf },
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PersistError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Ensure `dir` exists as a directory. Creating an existing one is not an error.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| PersistError::io(dir, e))
        }
        Err(err) => Err(PersistError::io(dir, err)),
    }
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
///
/// An existing file of the same name is replaced.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = Builder::new()
            .prefix(".wcsm-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| PersistError::io(&self.dir, e))?;
        tmp.write_all(content)
            .and_then(|_| tmp.flush())
            .and_then(|_| tmp.as_file_mut().sync_all())
            .map_err(|e| PersistError::io(tmp.path(), e))?;

        tmp.persist(&target)
            .map_err(|e| PersistError::io(&target, e.error))?;
        Ok(target)
    }
}

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use walkdir::WalkDir;

const TEMP_PREFIX: &str = ".tmp_";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Files directly inside `dir_path` with the given extension, sorted by path.
/// Temporary files left behind by an interrupted write are skipped.
pub fn list_files<P: AsRef<Path>>(dir_path: P, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    let dir_path = dir_path.as_ref();
    if !dir_path.exists() {
        return Ok(files);
    }

    for entry in WalkDir::new(dir_path).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let is_temp = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(TEMP_PREFIX));
        let matches_extension = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == extension);
        if !is_temp && matches_extension {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Write atomically: the file is either fully replaced or left untouched.
pub fn write<P: AsRef<Path>>(file_path: P, contents: impl AsRef<[u8]>) -> Result<()> {
    let file_path = file_path.as_ref();
    let parent_dir = file_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("File path has no parent directory"))?;

    let temp_path = create_temp_file_path(parent_dir);

    fs::write(&temp_path, contents.as_ref())
        .with_context(|| format!("Failed to write to temporary file: {}", temp_path.display()))?;

    fs::rename(&temp_path, file_path).with_context(|| {
        format!(
            "Failed to move temporary file to final location: {}",
            file_path.display()
        )
    })?;

    Ok(())
}

/// Write a file that must not exist yet.
///
/// The content is written to a temporary file and linked into place, so a
/// reader never observes a partially written file. Fails with
/// [`io::ErrorKind::AlreadyExists`] when `file_path` is already present.
pub fn write_new<P: AsRef<Path>>(file_path: P, contents: impl AsRef<[u8]>) -> io::Result<()> {
    let file_path = file_path.as_ref();
    let parent_dir = file_path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "File path has no parent directory",
        )
    })?;

    let temp_path = create_temp_file_path(parent_dir);
    fs::write(&temp_path, contents.as_ref())?;

    let linked = fs::hard_link(&temp_path, file_path);
    let _ = fs::remove_file(&temp_path);

    match linked {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(err),
        // Some filesystems have no hard links; exclusive create is the fallback.
        Err(_) => {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(file_path)?;
            file.write_all(contents.as_ref())?;
            file.sync_all()
        }
    }
}

/// Write atomically, creating all leading directories.
pub fn create_dirs_then_write<P: AsRef<Path>>(
    file_path: P,
    contents: impl AsRef<[u8]>,
) -> io::Result<()> {
    let file_path = file_path.as_ref();

    let parent_dir = file_path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "File path has no parent directory",
        )
    })?;
    fs::create_dir_all(parent_dir)?;

    let temp_path = create_temp_file_path(parent_dir);

    fs::write(&temp_path, contents.as_ref())?;

    fs::rename(&temp_path, file_path)?;

    Ok(())
}

fn create_temp_file_path(dir: &Path) -> PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

    let process_id = std::process::id();
    let temp_name = format!("{TEMP_PREFIX}{process_id}__{timestamp}__{sequence}");

    dir.join(temp_name)
}

/// Read and parse a JSON file, `None` when it does not exist.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to open {}", path.display()));
        }
    };
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest-stable.json");

        write(&path, "one").unwrap();
        write(&path, "two").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn write_new_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.0.0.json");

        write_new(&path, "first").unwrap();
        let err = write_new(&path, "second").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
        assert_eq!(list_files(dir.path(), "json").unwrap(), vec![path]);
    }

    #[test]
    fn list_files_filters_extension_and_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join(".tmp_1__2__3"), "").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let files = list_files(dir.path(), "json").unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("a.json"), dir.path().join("b.json")]
        );
    }

    #[test]
    fn list_files_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(dir.path().join("missing"), "json").unwrap().is_empty());
    }

    #[test]
    fn read_json_file_handles_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        assert_eq!(read_json_file::<serde_json::Value>(&path).unwrap(), None);

        create_dirs_then_write(&path, "{\"channel\":\"beta\"}").unwrap();
        let value: serde_json::Value = read_json_file(&path).unwrap().unwrap();
        assert_eq!(value["channel"], "beta");

        fs::write(&path, "not json").unwrap();
        assert!(read_json_file::<serde_json::Value>(&path).is_err());
    }
}

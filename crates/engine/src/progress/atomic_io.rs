use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `text` next to `path` and renames it into place.
///
/// Readers see either the old file or the new one, never a torn write.
pub(crate) fn replace_file_contents(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(path);
    if let Err(error) = fs::write(&staging, text) {
        let _ = fs::remove_file(&staging);
        return Err(error);
    }

    // Windows refuses to rename over an existing file.
    if cfg!(windows) {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                let _ = fs::remove_file(&staging);
                return Err(error);
            }
        }
    }

    fs::rename(&staging, path).inspect_err(|_| {
        let _ = fs::remove_file(&staging);
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("progress.json");
    path.with_file_name(format!(".{file_name}.staging"))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn creates_parents_and_replaces_existing_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("nested").join("progress.json");

        replace_file_contents(&path, "first").expect("first write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "first");

        replace_file_contents(&path, "second").expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
        assert!(!staging_path(&path).exists());
    }
}

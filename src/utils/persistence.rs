use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::Result;

const TMP_SUFFIX: &str = "tmp";

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Writes `data` to `path` by staging it next to the target and renaming.
/// A failed write leaves the previous file untouched.
pub fn write_atomic(path: &Path, data: &str) -> Result<()> {
    write_atomic_bytes(path, data.as_bytes())
}

pub fn write_atomic_bytes(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn failed_write_preserves_original_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        write_atomic(&path, "{\"a\":1}").unwrap();

        // A directory squatting on the staging path makes File::create fail.
        fs::create_dir_all(tmp_path(&path)).unwrap();
        assert!(write_atomic(&path, "{\"a\":2}").is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn tmp_path_keeps_existing_extension() {
        let path = Path::new("/data/config.json");
        assert_eq!(tmp_path(path), PathBuf::from("/data/config.json.tmp"));
    }
}

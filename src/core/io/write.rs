use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Path of an output artifact inside `dir`, creating `dir` if it is missing.
pub fn output_path<P: AsRef<Path>>(dir: P, name: &str) -> io::Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    Ok(dir.join(name))
}

/// Write `contents` to `dir/name` and return the full path.
pub fn write_output<P: AsRef<Path>, C: AsRef<[u8]>>(dir: P, name: &str, contents: C) -> io::Result<PathBuf> {
    let path = output_path(dir, name)?;
    fs::write(&path, contents)?;
    Ok(path)
}

/// Method names as file stems: lowercase, spaces replaced by underscores
pub fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_output_creates_directory() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("results/run1");

        let path = write_output(&out, "BASELINES.LOG", "table").unwrap();
        assert_eq!(path, out.join("BASELINES.LOG"));
        assert_eq!(fs::read_to_string(path).unwrap(), "table");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Weighted Moving Average"), "weighted_moving_average");
        assert_eq!(file_stem("Lasso (L1)"), "lasso__l1_");
    }
}

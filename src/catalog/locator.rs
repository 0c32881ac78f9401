use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DashError, Result};

/// File name prefix that marks a benchmark config
pub const CONFIG_PREFIX: &str = "config";

/// Enumerates benchmark configs under a root directory
///
/// Layout: `root/<folder>/[<subfolder>/]config*`
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    root: PathBuf,
}

impl ConfigLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Category folders directly under the root, sorted by name
    pub fn list_folders(&self) -> Result<Vec<String>> {
        dir_names(&self.root)
    }

    /// Parameter sub-folders of a category folder, sorted by name
    pub fn list_subfolders(&self, folder: &str) -> Result<Vec<String>> {
        dir_names(&self.root.join(folder))
    }

    /// Config files directly inside `folder` or `folder/subfolder`.
    ///
    /// Paths are relative to the root. Only regular files whose name starts
    /// with [`CONFIG_PREFIX`] are returned; nested directories are not
    /// descended into.
    pub fn list_config_files(&self, folder: &str, subfolder: Option<&str>) -> Result<Vec<PathBuf>> {
        let mut relative = PathBuf::from(folder);
        if let Some(sub) = subfolder {
            relative.push(sub);
        }
        let dir = self.root.join(&relative);
        ensure_dir(&dir)?;

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(CONFIG_PREFIX) {
                files.push(relative.join(name));
            }
        }
        files.sort();
        Ok(files)
    }

    /// Path handed to the benchmarking tool for a config returned by
    /// [`list_config_files`](Self::list_config_files)
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(DashError::NotFound(dir.to_path_buf()))
    }
}

fn dir_names(dir: &Path) -> Result<Vec<String>> {
    ensure_dir(dir)?;

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "llama/config-a.yml");
        touch(dir.path(), "llama/README.md");
        touch(dir.path(), "llama/8b/config-b.yml");
        touch(dir.path(), "llama/70b/config-c.yml");
        touch(dir.path(), "llama/70b/config-d.yml");
        touch(dir.path(), "mistral/config-m.yml");
        touch(dir.path(), "mistral/notes.txt");
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        dir
    }

    #[test]
    fn list_folders_returns_sorted_directories_only() {
        let dir = fixture();
        touch(dir.path(), "config-root.yml");
        let locator = ConfigLocator::new(dir.path());

        assert_eq!(
            locator.list_folders().unwrap(),
            vec!["empty", "llama", "mistral"]
        );
    }

    #[test]
    fn list_subfolders_returns_parameter_folders() {
        let dir = fixture();
        let locator = ConfigLocator::new(dir.path());

        assert_eq!(locator.list_subfolders("llama").unwrap(), vec!["70b", "8b"]);
        assert!(locator.list_subfolders("mistral").unwrap().is_empty());
    }

    #[rstest]
    #[case("llama", None, vec!["llama/config-a.yml"])]
    #[case("llama", Some("8b"), vec!["llama/8b/config-b.yml"])]
    #[case("llama", Some("70b"), vec!["llama/70b/config-c.yml", "llama/70b/config-d.yml"])]
    #[case("mistral", None, vec!["mistral/config-m.yml"])]
    fn list_config_files_matches_prefix_at_either_depth(
        #[case] folder: &str,
        #[case] subfolder: Option<&str>,
        #[case] expected: Vec<&str>,
    ) {
        let dir = fixture();
        let locator = ConfigLocator::new(dir.path());

        let files = locator.list_config_files(folder, subfolder).unwrap();
        let expected: Vec<PathBuf> = expected.into_iter().map(PathBuf::from).collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn list_config_files_empty_folder_is_not_an_error() {
        let dir = fixture();
        let locator = ConfigLocator::new(dir.path());

        assert!(locator.list_config_files("empty", None).unwrap().is_empty());
    }

    #[test]
    fn list_config_files_skips_directories_named_like_configs() {
        let dir = fixture();
        fs::create_dir_all(dir.path().join("mistral/configs-old")).unwrap();
        let locator = ConfigLocator::new(dir.path());

        assert_eq!(
            locator.list_config_files("mistral", None).unwrap(),
            vec![PathBuf::from("mistral/config-m.yml")]
        );
    }

    #[test]
    fn missing_root_is_not_found() {
        let locator = ConfigLocator::new("/nonexistent/benchdash/configs");
        assert!(matches!(locator.list_folders(), Err(DashError::NotFound(_))));
    }

    #[test]
    fn root_that_is_a_file_is_not_found() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let locator = ConfigLocator::new(file.path());
        assert!(matches!(locator.list_folders(), Err(DashError::NotFound(_))));
    }

    #[test]
    fn missing_subfolder_is_not_found() {
        let dir = fixture();
        let locator = ConfigLocator::new(dir.path());
        assert!(matches!(
            locator.list_config_files("llama", Some("13b")),
            Err(DashError::NotFound(_))
        ));
    }

    #[test]
    fn resolve_joins_root() {
        let locator = ConfigLocator::new("/srv/configs");
        assert_eq!(
            locator.resolve(Path::new("llama/8b/config-b.yml")),
            PathBuf::from("/srv/configs/llama/8b/config-b.yml")
        );
    }
}

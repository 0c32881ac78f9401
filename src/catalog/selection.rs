use std::path::{Path, PathBuf};

use crate::catalog::ConfigLocator;
use crate::error::Result;

/// The three cascading pickers on the run page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Picker {
    Folder,
    Parameter,
    Config,
}

impl Picker {
    pub fn title(self) -> &'static str {
        match self {
            Picker::Folder => "Folder",
            Picker::Parameter => "Parameter Subfolder",
            Picker::Config => "Config File",
        }
    }

    /// Focus order, left to right (wrapping)
    pub fn next(self) -> Self {
        match self {
            Picker::Folder => Picker::Parameter,
            Picker::Parameter => Picker::Config,
            Picker::Config => Picker::Folder,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Picker::Folder => Picker::Config,
            Picker::Parameter => Picker::Folder,
            Picker::Config => Picker::Parameter,
        }
    }
}

/// Folder → parameter sub-folder → config file selection state.
///
/// Changing an upstream picker rescans everything downstream of it. When a
/// folder has sub-folders one of them is always selected; otherwise configs
/// come from the folder itself.
#[derive(Debug)]
pub struct ConfigSelection {
    locator: ConfigLocator,
    folders: Vec<String>,
    folder: usize,
    subfolders: Vec<String>,
    subfolder: usize,
    files: Vec<PathBuf>,
    file: usize,
}

impl ConfigSelection {
    /// Create an unscanned selection; call [`refresh`](Self::refresh) to populate
    pub fn new(locator: ConfigLocator) -> Self {
        Self {
            locator,
            folders: Vec::new(),
            folder: 0,
            subfolders: Vec::new(),
            subfolder: 0,
            files: Vec::new(),
            file: 0,
        }
    }

    pub fn locator(&self) -> &ConfigLocator {
        &self.locator
    }

    /// Rescan from disk, keeping selected positions where still valid
    pub fn refresh(&mut self) -> Result<()> {
        self.folders = self.locator.list_folders()?;
        self.folder = clamp(self.folder, self.folders.len());
        self.reload_folder()
    }

    /// Empty every list, used when the root itself is unusable
    pub fn clear(&mut self) {
        self.folders.clear();
        self.subfolders.clear();
        self.files.clear();
        self.folder = 0;
        self.subfolder = 0;
        self.file = 0;
    }

    fn reload_folder(&mut self) -> Result<()> {
        self.subfolders = match self.selected_folder() {
            Some(folder) => self.locator.list_subfolders(folder)?,
            None => Vec::new(),
        };
        self.subfolder = clamp(self.subfolder, self.subfolders.len());
        self.reload_files()
    }

    fn reload_files(&mut self) -> Result<()> {
        self.files = match self.selected_folder() {
            Some(folder) => self
                .locator
                .list_config_files(folder, self.selected_subfolder())?,
            None => Vec::new(),
        };
        self.file = clamp(self.file, self.files.len());
        Ok(())
    }

    /// Move the given picker forward (wrapping)
    pub fn select_next(&mut self, picker: Picker) -> Result<()> {
        self.step(picker, true)
    }

    /// Move the given picker backward (wrapping)
    pub fn select_prev(&mut self, picker: Picker) -> Result<()> {
        self.step(picker, false)
    }

    fn step(&mut self, picker: Picker, forward: bool) -> Result<()> {
        match picker {
            Picker::Folder => {
                self.folder = wrap(self.folder, self.folders.len(), forward);
                self.subfolder = 0;
                self.file = 0;
                self.reload_folder()
            }
            Picker::Parameter => {
                self.subfolder = wrap(self.subfolder, self.subfolders.len(), forward);
                self.file = 0;
                self.reload_files()
            }
            Picker::Config => {
                self.file = wrap(self.file, self.files.len(), forward);
                Ok(())
            }
        }
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    pub fn subfolders(&self) -> &[String] {
        &self.subfolders
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn selected_folder(&self) -> Option<&str> {
        self.folders.get(self.folder).map(String::as_str)
    }

    pub fn selected_subfolder(&self) -> Option<&str> {
        self.subfolders.get(self.subfolder).map(String::as_str)
    }

    /// Selected config relative to the root; `None` disables running
    pub fn selected_config(&self) -> Option<&Path> {
        self.files.get(self.file).map(PathBuf::as_path)
    }

    /// Selected config joined onto the root
    pub fn resolved_config(&self) -> Option<PathBuf> {
        self.selected_config().map(|p| self.locator.resolve(p))
    }

    /// Display entries and selected index for a picker
    pub fn entries(&self, picker: Picker) -> (Vec<String>, Option<usize>) {
        match picker {
            Picker::Folder => (self.folders.clone(), index_of(self.folder, self.folders.len())),
            Picker::Parameter => (
                self.subfolders.clone(),
                index_of(self.subfolder, self.subfolders.len()),
            ),
            Picker::Config => (
                self.files.iter().map(|p| p.display().to_string()).collect(),
                index_of(self.file, self.files.len()),
            ),
        }
    }
}

fn clamp(index: usize, len: usize) -> usize {
    if index < len { index } else { 0 }
}

fn index_of(index: usize, len: usize) -> Option<usize> {
    (index < len).then_some(index)
}

fn wrap(index: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        0
    } else if forward {
        (index + 1) % len
    } else if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for relative in [
            "llama/config-a.yml",
            "llama/8b/config-b.yml",
            "llama/70b/config-c.yml",
            "mistral/config-m1.yml",
            "mistral/config-m2.yml",
        ] {
            let path = dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        dir
    }

    fn selection(dir: &TempDir) -> ConfigSelection {
        let mut selection = ConfigSelection::new(ConfigLocator::new(dir.path()));
        selection.refresh().unwrap();
        selection
    }

    #[test]
    fn refresh_selects_first_folder_and_subfolder() {
        let dir = fixture();
        let selection = selection(&dir);

        assert_eq!(selection.selected_folder(), Some("llama"));
        assert_eq!(selection.subfolders(), ["70b", "8b"]);
        assert_eq!(selection.selected_subfolder(), Some("70b"));
        assert_eq!(
            selection.selected_config(),
            Some(Path::new("llama/70b/config-c.yml"))
        );
    }

    #[test]
    fn changing_subfolder_rescans_files() {
        let dir = fixture();
        let mut selection = selection(&dir);

        selection.select_next(Picker::Parameter).unwrap();
        assert_eq!(selection.selected_subfolder(), Some("8b"));
        assert_eq!(selection.files(), [PathBuf::from("llama/8b/config-b.yml")]);
    }

    #[test]
    fn folder_without_subfolders_lists_its_own_configs() {
        let dir = fixture();
        let mut selection = selection(&dir);

        selection.select_next(Picker::Folder).unwrap();
        assert_eq!(selection.selected_folder(), Some("mistral"));
        assert_eq!(selection.selected_subfolder(), None);
        assert_eq!(selection.files().len(), 2);
    }

    #[test]
    fn selection_wraps_in_both_directions() {
        let dir = fixture();
        let mut selection = selection(&dir);
        selection.select_next(Picker::Folder).unwrap();

        selection.select_next(Picker::Config).unwrap();
        assert_eq!(
            selection.selected_config(),
            Some(Path::new("mistral/config-m2.yml"))
        );
        selection.select_next(Picker::Config).unwrap();
        assert_eq!(
            selection.selected_config(),
            Some(Path::new("mistral/config-m1.yml"))
        );
        selection.select_prev(Picker::Config).unwrap();
        assert_eq!(
            selection.selected_config(),
            Some(Path::new("mistral/config-m2.yml"))
        );

        selection.select_prev(Picker::Folder).unwrap();
        assert_eq!(selection.selected_folder(), Some("llama"));
    }

    #[test]
    fn empty_folder_has_no_selected_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        let selection = selection(&dir);

        assert_eq!(selection.selected_folder(), Some("empty"));
        assert!(selection.selected_config().is_none());
        assert!(selection.resolved_config().is_none());
    }

    #[test]
    fn resolved_config_is_under_root() {
        let dir = fixture();
        let selection = selection(&dir);

        assert_eq!(
            selection.resolved_config(),
            Some(dir.path().join("llama/70b/config-c.yml"))
        );
    }

    #[test]
    fn entries_report_selected_index() {
        let dir = fixture();
        let mut selection = selection(&dir);
        selection.select_next(Picker::Parameter).unwrap();

        let (items, selected) = selection.entries(Picker::Parameter);
        assert_eq!(items, vec!["70b", "8b"]);
        assert_eq!(selected, Some(1));

        let (items, selected) = selection.entries(Picker::Config);
        assert_eq!(items, vec!["llama/8b/config-b.yml"]);
        assert_eq!(selected, Some(0));
    }

    #[test]
    fn picker_focus_cycles() {
        assert_eq!(Picker::Folder.next(), Picker::Parameter);
        assert_eq!(Picker::Config.next(), Picker::Folder);
        assert_eq!(Picker::Folder.prev(), Picker::Config);
    }
}

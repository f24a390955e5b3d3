//! Output file naming: `<stem>_blitz.<ext>` or a rename pattern.

use blitz_core::config::RenameConfig;
use blitz_core::{DiscoveredFile, OutputFormat};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Suffix appended to the stem when renaming is off.
const DEFAULT_SUFFIX: &str = "_blitz";

/// Maps each input file to its output path under the output directory.
///
/// Sub-directories relative to the input root are mirrored. Names that
/// collide within a batch get a `_2`, `_3`, ... suffix in input order.
pub struct OutputNamer {
    root: PathBuf,
    pattern: Option<String>,
    start_sequence: u64,
    extension: &'static str,
    date: String,
}

impl OutputNamer {
    pub fn new(root: PathBuf, rename: &RenameConfig, format: OutputFormat) -> Self {
        let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        Self::with_date(root, rename, format, date)
    }

    fn with_date(root: PathBuf, rename: &RenameConfig, format: OutputFormat, date: String) -> Self {
        Self {
            root,
            pattern: rename.enabled.then(|| rename.pattern.clone()),
            start_sequence: rename.start_sequence,
            extension: format.extension(),
            date,
        }
    }

    /// Output paths for a whole batch, one per file, all distinct.
    pub fn assign(&self, files: &[DiscoveredFile]) -> Vec<PathBuf> {
        let mut taken = HashSet::with_capacity(files.len());
        files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let wanted = self.path_for(file, index);
                let mut path = wanted.clone();
                let mut k = 2;
                while !taken.insert(path.clone()) {
                    path = with_suffix(&wanted, k);
                    k += 1;
                }
                path
            })
            .collect()
    }

    /// Output path for the `index`-th file of the batch.
    pub fn path_for(&self, file: &DiscoveredFile, index: usize) -> PathBuf {
        let stem = file
            .relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let name = match &self.pattern {
            Some(pattern) => self.render(pattern, &stem, index),
            None => format!("{stem}{DEFAULT_SUFFIX}"),
        };

        let parent = file.relative.parent().unwrap_or_else(|| Path::new(""));
        self.root
            .join(parent)
            .join(format!("{name}.{}", self.extension))
    }

    fn render(&self, pattern: &str, stem: &str, index: usize) -> String {
        let sequence = self.start_sequence + index as u64;
        pattern
            .replace("{original}", stem)
            .replace("{n}", &sequence.to_string())
            .replace("{date}", &self.date)
    }
}

/// `dir/name.ext` -> `dir/name_<k>.ext`
fn with_suffix(path: &Path, k: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}_{k}");
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

use std::{fs, fs::File, path::Path};

use anyhow::{Context, Result};

use crate::cli::bufwrite;

/// File operations the feed pipeline performs on the destination folder.
pub(crate) trait FeedStore {
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn write(&self, path: &Path, content: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LocalFs;

impl FeedStore for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("failed to delete {:?}", path))
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
        bufwrite(file, content).with_context(|| format!("failed to write {:?}", path))
    }
}

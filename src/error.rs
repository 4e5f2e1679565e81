use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ManifestError {
    #[error("{path:?} has no {entry} entry")]
    EntryMissing { path: PathBuf, entry: &'static str },

    #[error("manifest is missing {0}")]
    MissingNode(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum FeedError {
    #[error("root element is <{0}>, expected <feed>")]
    NotAFeed(String),

    #[error("entry #{0} has no <id>")]
    MissingEntryId(usize),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("destination {0:?} is a network share; username and password are required")]
    MissingCredentials(String),

    #[error("{0:?} is not a valid network share path")]
    InvalidShare(String),
}

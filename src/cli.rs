use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::info;

use crate::{
    credentials::{is_unc, share_uri, CredentialCache, NetworkCredential, BASIC},
    deploy::{copy_to_destination, ExecutableDirectory, InstallDirectory},
    error::CliError,
    feed::{update_feed, Feed},
    store::{FeedStore, LocalFs},
};

/// Copy a VSIX package into a private gallery folder and regenerate its Atom feed
#[derive(Debug, Parser)]
#[command(name = "vsix-gallery-feed")]
#[command(version)]
#[command(styles = clap_cargo::style::CLAP_STYLING)]
pub struct FeedOption {
    /// Path to the .vsix package
    #[arg(value_name = "PACKAGE")]
    package_path: PathBuf,

    /// Gallery folder receiving the package and the feed, local or UNC
    #[arg(value_name = "DESTINATION")]
    destination: String,

    /// User for a UNC destination
    #[arg(value_name = "USERNAME")]
    username: Option<String>,

    /// Password for a UNC destination
    #[arg(value_name = "PASSWORD")]
    password: Option<String>,
}

pub(crate) trait FeedOptionPaths {
    fn package_path(&self) -> &Path;
    fn destination(&self) -> &str;
}

pub(crate) trait FeedOptionCredentials {
    /// Credentials for the destination share, required when it is a UNC path.
    fn credentials(&self) -> Result<Option<NetworkCredential>>;
}

impl FeedOptionPaths for FeedOption {
    fn package_path(&self) -> &Path {
        &self.package_path
    }

    fn destination(&self) -> &str {
        &self.destination
    }
}

impl FeedOptionCredentials for FeedOption {
    fn credentials(&self) -> Result<Option<NetworkCredential>> {
        if !is_unc(&self.destination) {
            return Ok(None);
        }

        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return Err(CliError::MissingCredentials(self.destination.clone()).into());
        };

        Ok(Some(NetworkCredential {
            username: username.clone(),
            password: password.clone(),
        }))
    }
}

pub(crate) fn execute() -> Result<()> {
    let option = FeedOption::parse();

    run(&option, &ExecutableDirectory, &LocalFs, Utc::now())?;
    Ok(())
}

pub(crate) fn run<Option>(
    option: &Option,
    install: &impl InstallDirectory,
    store: &impl FeedStore,
    now: DateTime<Utc>,
) -> Result<Feed>
where
    Option: FeedOptionPaths + FeedOptionCredentials,
{
    info!(package = ?option.package_path(), destination = option.destination(), "updating gallery");

    let mut credentials = CredentialCache::new();
    let share = match option.credentials()? {
        Some(credential) => {
            let uri = share_uri(option.destination())?;
            info!(share = %uri, username = %credential.username, "registered share credentials");
            credentials.add(uri.clone(), BASIC, credential);
            Some(uri)
        },
        None => None,
    };
    let credential = share.as_deref().and_then(|uri| credentials.get(uri, BASIC));

    let destination = Path::new(option.destination());
    copy_to_destination(option.package_path(), destination, install, credential)?;

    update_feed(store, option.package_path(), destination, now)
}

pub(crate) fn bufwrite(inner: impl Write, content: impl Into<String>) -> Result<()> {
    let mut buffer = BufWriter::new(inner);
    write!(buffer, "{}", content.into())?;
    buffer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::{
        feed::{atom::parse_entries, tests::at, FEED_FILE_NAME},
        store::memory::MemoryStore,
        testing::{manifest_xml, write_package, write_zip},
    };

    struct FixedDirectory(PathBuf);

    impl InstallDirectory for FixedDirectory {
        fn install_dir(&self) -> Option<PathBuf> {
            Some(self.0.clone())
        }
    }

    fn option(args: &[&str]) -> FeedOption {
        FeedOption::try_parse_from(std::iter::once("vsix-gallery-feed").chain(args.iter().copied())).unwrap()
    }

    fn gallery() -> (TempDir, TempDir, String) {
        let source = tempdir().unwrap();
        let destination = tempdir().unwrap();
        let destination_path = destination.path().to_str().unwrap().to_string();
        (source, destination, destination_path)
    }

    fn feed_ids(destination: &Path) -> Vec<String> {
        let text = fs::read_to_string(destination.join(FEED_FILE_NAME)).unwrap();
        parse_entries(&text).unwrap().into_iter().map(|entry| entry.id).collect()
    }

    #[test]
    fn parses_positional_arguments() {
        let option = option(&["A.vsix", "/srv/gallery", "user", "pass"]);

        assert_eq!(option.package_path(), Path::new("A.vsix"));
        assert_eq!(option.destination(), "/srv/gallery");
        assert!(option.credentials().unwrap().is_none());
    }

    #[test]
    fn missing_destination_is_rejected() {
        assert!(FeedOption::try_parse_from(["vsix-gallery-feed", "A.vsix"]).is_err());
    }

    #[test]
    fn unc_destination_requires_credentials() {
        let error = option(&["A.vsix", r"\\server\share"]).credentials().unwrap_err();

        assert!(matches!(
            error.downcast_ref::<CliError>(),
            Some(CliError::MissingCredentials(_))
        ));
        assert!(option(&["A.vsix", r"\\server\share", "user"]).credentials().is_err());

        let credential = option(&["A.vsix", r"\\server\share", "user", "pass"])
            .credentials()
            .unwrap()
            .unwrap();
        assert_eq!(credential.username, "user");
        assert_eq!(credential.password, "pass");
    }

    #[test]
    fn unc_run_without_credentials_touches_nothing() {
        let source = tempdir().unwrap();
        let package = source.path().join("A.vsix");
        write_package(&package, &manifest_xml("A", "Contoso", "1.0", "A", "first"));
        let store = MemoryStore::default();

        let error = run(
            &option(&[package.to_str().unwrap(), r"\\server\share"]),
            &FixedDirectory(source.path().to_path_buf()),
            &store,
            at(1),
        )
        .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<CliError>(),
            Some(CliError::MissingCredentials(destination)) if destination == r"\\server\share"
        ));
        assert!(store.mutations.borrow().is_empty());
        assert!(store.files.borrow().is_empty());
    }

    #[test]
    fn deploys_package_and_writes_feed() {
        let (source, destination, destination_path) = gallery();
        let package = source.path().join("A.vsix");
        write_package(&package, &manifest_xml("A", "Contoso", "1.0", "A", "first"));

        let feed = run(
            &option(&[package.to_str().unwrap(), &destination_path]),
            &FixedDirectory(source.path().to_path_buf()),
            &LocalFs,
            at(1),
        )
        .unwrap();

        assert!(destination.path().join("A.vsix").is_file());
        assert_eq!(feed.entries.len(), 1);
        assert_eq!(feed_ids(destination.path()), vec!["A"]);
    }

    #[test]
    fn repeated_runs_keep_one_entry_per_package() {
        let (source, destination, destination_path) = gallery();
        let first = source.path().join("A.vsix");
        let second = source.path().join("B.vsix");
        write_package(&first, &manifest_xml("A", "Contoso", "1.0", "A", "a"));
        write_package(&second, &manifest_xml("B", "Contoso", "1.0", "B", "b"));
        let install = FixedDirectory(source.path().to_path_buf());

        for (package, hour) in [(&first, 1), (&second, 2), (&first, 3), (&first, 4)] {
            run(&option(&[package.to_str().unwrap(), &destination_path]), &install, &LocalFs, at(hour)).unwrap();
        }

        assert_eq!(feed_ids(destination.path()), vec!["A", "B"]);
    }

    #[test]
    fn new_version_replaces_stale_entry() {
        let (source, destination, destination_path) = gallery();
        let package = source.path().join("A.vsix");
        let other = source.path().join("B.vsix");
        let install = FixedDirectory(source.path().to_path_buf());
        write_package(&package, &manifest_xml("A", "Contoso", "1.0", "A", "a"));
        write_package(&other, &manifest_xml("B", "Contoso", "1.0", "B", "b"));
        run(&option(&[package.to_str().unwrap(), &destination_path]), &install, &LocalFs, at(1)).unwrap();
        run(&option(&[other.to_str().unwrap(), &destination_path]), &install, &LocalFs, at(2)).unwrap();

        write_package(&package, &manifest_xml("A", "Contoso", "2.0", "A", "a"));
        let feed = run(&option(&[package.to_str().unwrap(), &destination_path]), &install, &LocalFs, at(3)).unwrap();

        let versions = feed
            .entries
            .iter()
            .map(|entry| (entry.id.as_str(), entry.version.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(versions, vec![("A", "2.0"), ("B", "1.0")]);
        assert_eq!(feed_ids(destination.path()), vec!["A", "B"]);
    }

    #[test]
    fn package_beside_executable_is_used_when_path_is_missing() {
        let (install, destination, destination_path) = gallery();
        write_package(&install.path().join("A.vsix"), &manifest_xml("A", "Contoso", "1.0", "A", "a"));

        run(
            &option(&["missing/dir/A.vsix", &destination_path]),
            &FixedDirectory(install.path().to_path_buf()),
            &LocalFs,
            at(1),
        )
        .unwrap();

        assert!(destination.path().join("A.vsix").is_file());
        assert_eq!(feed_ids(destination.path()), vec!["A"]);
    }

    #[test]
    fn package_without_manifest_fails_before_feed_is_touched() {
        let (source, destination, destination_path) = gallery();
        let package = source.path().join("A.vsix");
        write_zip(&package, &[("readme.txt", "no manifest")]);
        let feed_path = destination.path().join(FEED_FILE_NAME);
        fs::write(&feed_path, "previous").unwrap();

        let result = run(
            &option(&[package.to_str().unwrap(), &destination_path]),
            &FixedDirectory(source.path().to_path_buf()),
            &LocalFs,
            at(1),
        );

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(feed_path).unwrap(), "previous");
    }

    #[test]
    fn bufwrite_writes_everything() {
        let mut buffer = Vec::new();

        bufwrite(&mut buffer, "feed").unwrap();

        assert_eq!(buffer, b"feed");
    }
}

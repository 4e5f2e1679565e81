use std::fmt;

use anyhow::Result;

use crate::error::CliError;

pub(crate) const UNC_PREFIX: &str = r"\\";
pub(crate) const BASIC: &str = "Basic";

pub(crate) fn is_unc(path: &str) -> bool {
    path.starts_with(UNC_PREFIX)
}

/// Turns `\\server\share\dir` into `file://server/share/dir`.
pub(crate) fn share_uri(path: &str) -> Result<String> {
    let rest = path
        .strip_prefix(UNC_PREFIX)
        .ok_or_else(|| CliError::InvalidShare(path.to_string()))?;
    let segments = rest
        .split(['\\', '/'])
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();

    if segments.is_empty() {
        return Err(CliError::InvalidShare(path.to_string()).into());
    }

    Ok(format!("file://{}", segments.join("/")))
}

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct NetworkCredential {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl fmt::Debug for NetworkCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredential")
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// Credentials registered for this process, keyed by share URI prefix.
#[derive(Debug, Default)]
pub(crate) struct CredentialCache {
    entries: Vec<(String, &'static str, NetworkCredential)>,
}

impl CredentialCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, uri: impl Into<String>, scheme: &'static str, credential: NetworkCredential) {
        let uri = uri.into();
        self.entries
            .retain(|(prefix, registered, _)| !(prefix.eq_ignore_ascii_case(&uri) && *registered == scheme));
        self.entries.push((uri, scheme, credential));
    }

    /// Looks up the credential with the longest prefix covering `uri`.
    pub(crate) fn get(&self, uri: &str, scheme: &str) -> Option<&NetworkCredential> {
        self.entries
            .iter()
            .filter(|(prefix, registered, _)| *registered == scheme && covers(prefix, uri))
            .max_by_key(|(prefix, _, _)| prefix.len())
            .map(|(_, _, credential)| credential)
    }
}

fn covers(prefix: &str, uri: &str) -> bool {
    let (Some(head), Some(tail)) = (uri.get(..prefix.len()), uri.get(prefix.len()..)) else {
        return false;
    };

    head.eq_ignore_ascii_case(prefix) && (tail.is_empty() || tail.starts_with('/') || prefix.ends_with('/'))
}

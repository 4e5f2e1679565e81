use std::{fs::File, io::Read, path::Path};

use anyhow::{Context, Result};
use zip::{result::ZipError, ZipArchive};

use self::document::Element;
use crate::error::ManifestError;

pub(crate) mod document;

pub(crate) const MANIFEST_ENTRY: &str = "extension.vsixmanifest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PackageMetadata {
    pub(crate) id: String,
    pub(crate) publisher: String,
    pub(crate) display_name: String,
    pub(crate) description: String,
    pub(crate) version: String,
}

impl PackageMetadata {
    pub(crate) fn read(package: &Path) -> Result<Self> {
        let text = read_manifest(package)?;

        Self::parse(&text).with_context(|| format!("failed to read {} in {:?}", MANIFEST_ENTRY, package))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let document = roxmltree::Document::parse(text)?;

        let metadata = document
            .root_element()
            .child("Metadata")
            .ok_or(ManifestError::MissingNode("Metadata"))?;
        let identity = metadata
            .child("Identity")
            .ok_or(ManifestError::MissingNode("Metadata/Identity"))?;

        let attribute = |name: &str, node: &'static str| {
            identity
                .attribute_value(name)
                .map(str::to_string)
                .ok_or(ManifestError::MissingNode(node))
        };

        Ok(Self {
            id: attribute("Id", "Identity@Id")?,
            publisher: attribute("Publisher", "Identity@Publisher")?,
            version: attribute("Version", "Identity@Version")?,
            display_name: metadata
                .child_text("DisplayName")
                .ok_or(ManifestError::MissingNode("Metadata/DisplayName"))?,
            description: metadata
                .child_text("Description")
                .ok_or(ManifestError::MissingNode("Metadata/Description"))?,
        })
    }
}

fn read_manifest(package: &Path) -> Result<String> {
    let file = File::open(package).with_context(|| format!("failed to open package {:?}", package))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("failed to open {:?} as a zip archive", package))?;

    let mut entry = match archive.by_name(MANIFEST_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(ManifestError::EntryMissing {
                path: package.to_path_buf(),
                entry: MANIFEST_ENTRY,
            }
            .into())
        },
        Err(error) => return Err(error).with_context(|| format!("failed to read {:?}", package)),
    };

    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .with_context(|| format!("failed to decompress {} in {:?}", MANIFEST_ENTRY, package))?;

    decode(bytes).with_context(|| format!("failed to decode {} in {:?}", MANIFEST_ENTRY, package))
}

/// Decodes UTF-16 when a byte-order mark says so, UTF-8 otherwise.
fn decode(bytes: Vec<u8>) -> Result<String> {
    let utf16 = |rest: &[u8], unit: fn([u8; 2]) -> u16| {
        let units = rest.chunks_exact(2).map(|pair| unit([pair[0], pair[1]])).collect::<Vec<_>>();
        String::from_utf16(&units)
    };

    if let Some(rest) = bytes.strip_prefix(&[0xFF_u8, 0xFE]) {
        return Ok(utf16(rest, u16::from_le_bytes)?);
    }

    if let Some(rest) = bytes.strip_prefix(&[0xFE_u8, 0xFF]) {
        return Ok(utf16(rest, u16::from_be_bytes)?);
    }

    Ok(String::from_utf8(bytes)?)
}

use std::{fs::File, io::Write, path::Path};

use zip::{write::SimpleFileOptions, ZipWriter};

use crate::manifest::MANIFEST_ENTRY;

pub(crate) fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let entries = entries
        .iter()
        .map(|(name, content)| (*name, content.as_bytes()))
        .collect::<Vec<_>>();
    write_zip_bytes(path, &entries);
}

pub(crate) fn write_zip_bytes(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());

    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }

    writer.finish().unwrap();
}

pub(crate) fn write_package(path: &Path, manifest: &str) {
    write_zip(path, &[("[Content_Types].xml", "<Types />"), (MANIFEST_ENTRY, manifest)]);
}

pub(crate) fn manifest_xml(id: &str, publisher: &str, version: &str, display_name: &str, description: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<PackageManifest Version="2.0.0" xmlns="http://schemas.microsoft.com/developer/vsx-schema/2011">
  <Metadata>
    <Identity Id="{id}" Version="{version}" Language="en-US" Publisher="{publisher}" />
    <DisplayName>{display_name}</DisplayName>
    <Description xml:space="preserve">{description}</Description>
  </Metadata>
</PackageManifest>"#
    )
}

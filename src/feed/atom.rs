use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use super::{raw::RawElement, Content, Feed, FeedEntry, CONTENT_TYPE};
use crate::{error::FeedError, manifest::document::Element};

pub(crate) const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
pub(crate) const VSIX_NAMESPACE: &str = "http://schemas.microsoft.com/developer/vsx-syndication-schema/2010";

impl Feed {
    pub(crate) fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        start(&mut writer, "feed", &[("xmlns", ATOM_NAMESPACE)])?;
        text_element(&mut writer, "title", &[("type", "text")], &self.title)?;
        text_element(&mut writer, "id", &[], &self.id)?;
        text_element(&mut writer, "updated", &[], &timestamp(self.updated))?;

        for entry in &self.entries {
            write_entry(&mut writer, entry, self.updated)?;
        }

        end(&mut writer, "feed")?;

        Ok(String::from_utf8(writer.into_inner())?)
    }
}

fn write_entry<W: Write>(writer: &mut Writer<W>, entry: &FeedEntry, fallback: DateTime<Utc>) -> Result<()> {
    if let Some(source) = &entry.source {
        return source.write(writer, Some(ATOM_NAMESPACE));
    }

    start(writer, "entry", &[])?;
    text_element(writer, "id", &[], &entry.id)?;
    text_element(writer, "title", &[("type", "text")], &entry.title)?;
    text_element(writer, "summary", &[("type", "text")], &entry.summary)?;
    text_element(writer, "updated", &[], &timestamp(entry.updated.unwrap_or(fallback)))?;

    start(writer, "author", &[])?;
    text_element(writer, "name", &[], &entry.author)?;
    end(writer, "author")?;

    if let Some(content) = &entry.content {
        let element = BytesStart::new("content")
            .with_attributes([("type", content.media_type.as_str()), ("src", content.src.as_str())]);
        writer.write_event(Event::Empty(element))?;
    }

    start(writer, "Vsix", &[("xmlns", VSIX_NAMESPACE)])?;
    text_element(writer, "Id", &[], &entry.id)?;
    text_element(writer, "Version", &[], &entry.version)?;
    end(writer, "Vsix")?;

    end(writer, "entry")
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
    let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
    writer.write_event(Event::Start(element))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<()> {
    start(writer, name, attributes)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Reads the entries of an Atom feed in document order.
pub(crate) fn parse_entries(text: &str) -> Result<Vec<FeedEntry>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let document = roxmltree::Document::parse(text)?;
    let root = document.root_element();

    if root.local_name() != "feed" {
        return Err(FeedError::NotAFeed(root.local_name().to_string()).into());
    }

    root.children_named("entry")
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry))
        .collect()
}

fn parse_entry(index: usize, entry: roxmltree::Node) -> Result<FeedEntry> {
    let id = entry.child_text("id").ok_or(FeedError::MissingEntryId(index))?;

    let updated = entry
        .child_text("updated")
        .map(|text| {
            DateTime::parse_from_rfc3339(text.trim())
                .map(|time| time.with_timezone(&Utc))
                .with_context(|| format!("entry {:?} has an invalid <updated> {:?}", id, text))
        })
        .transpose()?;

    let content = entry.child("content").and_then(|content| {
        content.attribute_value("src").map(|src| Content {
            src: src.to_string(),
            media_type: content.attribute_value("type").unwrap_or(CONTENT_TYPE).to_string(),
        })
    });

    Ok(FeedEntry {
        author: entry
            .child("author")
            .and_then(|author| author.child_text("name"))
            .unwrap_or_default(),
        title: entry.child_text("title").unwrap_or_default(),
        summary: entry.child_text("summary").unwrap_or_default(),
        version: entry
            .child("Vsix")
            .and_then(|vsix| vsix.child_text("Version"))
            .unwrap_or_default(),
        content,
        updated,
        id,
        source: Some(RawElement::capture(entry)),
    })
}

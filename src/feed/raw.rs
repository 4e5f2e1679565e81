use std::io::Write;

use anyhow::Result;
use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// An element kept exactly as it was read, so it can be written back without
/// knowing its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawElement {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) attributes: Vec<RawAttribute>,
    pub(crate) children: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawAttribute {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawNode {
    Element(RawElement),
    Text(String),
}

impl RawElement {
    /// Comments and processing instructions are dropped, as is indentation
    /// between child elements.
    pub(crate) fn capture(node: roxmltree::Node) -> Self {
        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(RawNode::Element(Self::capture(child)))
                } else if child.is_text() {
                    child.text().map(|text| RawNode::Text(text.to_string()))
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        let has_elements = children.iter().any(|child| matches!(child, RawNode::Element(_)));
        let has_text = children
            .iter()
            .any(|child| matches!(child, RawNode::Text(text) if !text.trim().is_empty()));
        let children = if has_elements && !has_text {
            children
                .into_iter()
                .filter(|child| matches!(child, RawNode::Element(_)))
                .collect()
        } else {
            children
        };

        Self {
            name: node.tag_name().name().to_string(),
            namespace: node.tag_name().namespace().map(str::to_string),
            attributes: node
                .attributes()
                .map(|attribute| RawAttribute {
                    name: attribute.name().to_string(),
                    namespace: attribute.namespace().map(str::to_string),
                    value: attribute.value().to_string(),
                })
                .collect(),
            children,
        }
    }

    pub(crate) fn child(&self, name: &str) -> Option<&RawElement> {
        self.children.iter().find_map(|child| match child {
            RawNode::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    /// Writes the element under a parent whose default namespace is `inherited`.
    pub(crate) fn write<W: Write>(&self, writer: &mut Writer<W>, inherited: Option<&str>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());

        if self.namespace.as_deref() != inherited {
            start.push_attribute(("xmlns", self.namespace.as_deref().unwrap_or("")));
        }

        let mut prefixes = 0;
        for attribute in &self.attributes {
            match attribute.namespace.as_deref() {
                None => start.push_attribute((attribute.name.as_str(), attribute.value.as_str())),
                Some(XML_NAMESPACE) => {
                    start.push_attribute((format!("xml:{}", attribute.name).as_str(), attribute.value.as_str()))
                },
                Some(namespace) => {
                    let prefix = format!("ns{prefixes}");
                    prefixes += 1;
                    start.push_attribute((format!("xmlns:{prefix}").as_str(), namespace));
                    start.push_attribute((format!("{prefix}:{}", attribute.name).as_str(), attribute.value.as_str()));
                },
            }
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;

        for child in &self.children {
            match child {
                RawNode::Element(element) => element.write(writer, self.namespace.as_deref())?,
                RawNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            }
        }

        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

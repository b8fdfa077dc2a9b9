//! Batch root: an `rdf:RDF` container and its serialization.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;

use super::builder::DocumentFragment;
use super::element::Element;
use super::namespaces::Prefix;

/// Indentation of the pretty-printed output.
const INDENT_SIZE: usize = 2;

/// Namespace-declaring root owning the fragments of one output document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdfDocument {
    fragments: Vec<DocumentFragment>,
}

impl RdfDocument {
    /// Create an empty root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Appended fragments are never reordered.
    pub fn append(&mut self, fragment: DocumentFragment) {
        self.fragments.push(fragment);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Ids of the appended fragments, in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(|f| f.id.as_str())
    }

    /// Serialize as a UTF-8, pretty-printed XML document.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let root_name = format!("{}:RDF", Prefix::Rdf);
        let mut root = BytesStart::new(root_name.as_str());
        for prefix in Prefix::ALL {
            let key = format!("xmlns:{prefix}");
            root.push_attribute((key.as_str(), prefix.uri()));
        }

        if self.fragments.is_empty() {
            writer.write_event(Event::Empty(root))?;
        } else {
            writer.write_event(Event::Start(root))?;
            for fragment in &self.fragments {
                write_element(&mut writer, &fragment.root)?;
            }
            writer.write_event(Event::End(BytesEnd::new(root_name.as_str())))?;
        }

        let mut xml = String::from_utf8(writer.into_inner())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        xml.push('\n');
        Ok(xml)
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let name = element.name.to_string();
    let mut start = BytesStart::new(name.as_str());
    for (attr, value) in &element.attributes {
        let key = attr.to_string();
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.text.is_none() && element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

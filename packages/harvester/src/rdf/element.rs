//! Namespace-qualified element tree.
//!
//! Elements are plain values: building one has no side effects until it is
//! appended to an [`RdfDocument`](super::RdfDocument).

use std::fmt;

use super::namespaces::Prefix;

/// Prefixed element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Prefix,
    pub local: String,
}

impl QName {
    pub fn new(prefix: Prefix, local: impl Into<String>) -> Self {
        Self {
            prefix,
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.local)
    }
}

/// An element with optional text, attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<(QName, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new(prefix: Prefix, local: impl Into<String>) -> Self {
        Self {
            name: QName::new(prefix, local),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Create an element holding text.
    pub fn text(prefix: Prefix, local: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(prefix, local).with_text(text)
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(xml_safe(text.into()));
        self
    }

    #[must_use]
    pub fn with_attribute(
        mut self,
        prefix: Prefix,
        local: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes
            .push((QName::new(prefix, local), xml_safe(value.into())));
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child, keeping insertion order.
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn attribute(&self, prefix: Prefix, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.prefix == prefix && name.local == local)
            .map(|(_, value)| value.as_str())
    }

    /// Children with the given name, in order.
    pub fn children_named<'a>(
        &'a self,
        prefix: Prefix,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter(move |c| c.name.prefix == prefix && c.name.local == local)
    }
}

/// Replace characters XML 1.0 does not allow with a space.
///
/// Tab, line feed and carriage return are kept; other C0 controls and
/// U+FFFE/U+FFFF are not.
///
/// # Examples
/// ```
/// use siro_harvester::rdf::element::xml_safe;
///
/// assert_eq!(xml_safe("Minutes\u{0B}of meeting".to_string()), "Minutes of meeting");
/// assert_eq!(xml_safe("a\tb".to_string()), "a\tb");
/// ```
#[must_use]
pub fn xml_safe(value: String) -> String {
    if value.chars().all(is_xml_char) {
        return value;
    }
    value
        .chars()
        .map(|c| if is_xml_char(c) { c } else { ' ' })
        .collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

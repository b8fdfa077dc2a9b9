//! XML utility functions for navigating and extracting data from DOM trees.

use roxmltree::Node;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use siro_harvester::xml::get_tag_name;
///
/// let xml = r#"<marc:record xmlns:marc="http://www.loc.gov/MARC21/slim"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "record");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find the first child element with the given tag name.
///
/// # Arguments
/// * `node` - Parent node to search in
/// * `tag` - Local tag name to search for
///
/// # Returns
/// First matching child element, or `None` if not found
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find all child elements with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use siro_harvester::xml::find_children;
///
/// let xml = r#"<record><controlfield tag="001"/><datafield/><controlfield tag="008"/></record>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let fields: Vec<_> = find_children(doc.root_element(), "controlfield").collect();
/// assert_eq!(fields.len(), 2);
/// ```
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find the first child element with the given tag name whose attribute
/// `name` equals `value`.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use siro_harvester::xml::{find_child_with_attribute, get_text};
///
/// let xml = r#"<record><controlfield tag="001">x</controlfield><controlfield tag="008">y</controlfield></record>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let field = find_child_with_attribute(doc.root_element(), "controlfield", "tag", "008");
/// assert_eq!(get_text(field.unwrap()), "y");
/// ```
pub fn find_child_with_attribute<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
    name: &str,
    value: &str,
) -> Option<Node<'a, 'input>> {
    find_children(node, tag).find(|child| child.attribute(name) == Some(value))
}

/// Get the text content of a node without trimming.
///
/// MARC fixed fields are positional, so leading spaces are significant.
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text().map(str::to_string).unwrap_or_default()
}

/// Check if a node has a specific tag name.
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

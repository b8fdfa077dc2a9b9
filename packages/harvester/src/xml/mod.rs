//! Helpers for reading XML trees, used by the MARC-XML lookups.

mod utils;

pub use utils::{
    find_child, find_child_with_attribute, find_children, get_tag_name, get_text, has_tag,
};

//! Record ingestion: produce [`FieldTable`](crate::types::FieldTable)s from
//! tab-separated spreadsheets or from search result items.

mod item;
mod tsv;

pub use item::{item_to_field_table, ItemContext};
pub use tsv::{parse_tsv, read_tsv, write_tsv};

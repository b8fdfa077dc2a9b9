//! Canonical record to document fragment.

use crate::config::{BuilderConfig, FEDERATION, FULLTEXT};
use crate::types::{CanonicalRecord, RecordDate};

use super::element::Element;
use super::namespaces::Prefix;

/// One record's element tree, not yet part of a written document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFragment {
    /// Record id, also the `rdf:about` of [`root`](Self::root).
    pub id: String,
    pub root: Element,
}

/// Build the fragment for a record.
///
/// Children follow the order the ARC/SiRO schema expects: federation,
/// archives, title, creators, source, description, subjects, disciplines,
/// genres, freeculture, type, date, fulltext, language, seeAlso, thumbnail.
pub fn build_fragment(record: &CanonicalRecord, config: &BuilderConfig) -> DocumentFragment {
    let mut root = Element::new(Prefix::Sro, config.record_element.as_str()).with_attribute(
        Prefix::Rdf,
        "about",
        record.id.as_str(),
    );

    root.push(Element::text(Prefix::Collex, "federation", FEDERATION));
    for archive in &record.archives {
        root.push(Element::text(Prefix::Collex, "archive", archive.as_str()));
    }
    root.push(Element::text(Prefix::Dc, "title", record.title.as_str()));
    for creator in &record.creators {
        root.push(Element::text(
            Prefix::Role,
            creator.role.as_str(),
            creator.name.as_str(),
        ));
    }
    root.push(Element::text(Prefix::Dc, "source", record.source.as_str()));
    if let Some(description) = &record.description {
        root.push(Element::text(Prefix::Dc, "description", description.as_str()));
    }
    for subject in &record.subjects {
        root.push(Element::text(Prefix::Dc, "subject", subject.as_str()));
    }
    for discipline in &record.disciplines {
        root.push(Element::text(Prefix::Collex, "discipline", discipline.as_str()));
    }
    for genre in &record.genres {
        root.push(Element::text(Prefix::Collex, "genre", genre.as_str()));
    }
    root.push(Element::text(
        Prefix::Collex,
        "freeculture",
        record.freeculture.as_str(),
    ));
    root.push(Element::text(Prefix::Dc, "type", record.record_type.as_str()));
    root.push(date_element(&record.date));
    root.push(Element::text(Prefix::Collex, "fulltext", FULLTEXT));
    if let Some(language) = &record.language {
        root.push(Element::text(Prefix::Dc, "language", language.as_str()));
    }
    root.push(Element::new(Prefix::Rdfs, "seeAlso").with_attribute(
        Prefix::Rdf,
        "resource",
        record.see_also.as_str(),
    ));
    if let Some(thumbnail) = &record.thumbnail {
        root.push(Element::new(Prefix::Collex, "thumbnail").with_attribute(
            Prefix::Rdf,
            "resource",
            thumbnail.as_str(),
        ));
    }

    DocumentFragment {
        id: record.id.clone(),
        root,
    }
}

/// `dc:date` as bare text, or wrapping a labeled `collex:date`.
fn date_element(date: &RecordDate) -> Element {
    match date {
        RecordDate::Year(year) => Element::text(Prefix::Dc, "date", year.as_str()),
        RecordDate::Uncertain => {
            Element::text(Prefix::Dc, "date", crate::types::UNCERTAIN_DATE)
        }
        RecordDate::Labeled { label, value } => Element::new(Prefix::Dc, "date").with_child(
            Element::new(Prefix::Collex, "date")
                .with_child(Element::text(Prefix::Rdfs, "label", label.as_str()))
                .with_child(Element::text(Prefix::Rdf, "value", value.to_string())),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreatorRole, DateValue, RecordType};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn record() -> CanonicalRecord {
        CanonicalRecord {
            id: "http://dp.la/api/items/abc".to_string(),
            title: "Strike bulletin".to_string(),
            archives: vec!["dpla".to_string()],
            creators: vec![
                CreatorRole::new("AUT", "Debs, Eugene V."),
                CreatorRole::new("EDT", "Haywood, Bill"),
            ],
            source: "Michigan State University".to_string(),
            description: None,
            subjects: vec!["Labor".to_string(), "Strikes".to_string()],
            disciplines: vec!["History".to_string()],
            genres: BTreeSet::from(["Nonfiction".to_string()]),
            freeculture: "TRUE".to_string(),
            record_type: RecordType::Codex,
            date: RecordDate::Year("1894".to_string()),
            language: Some("English".to_string()),
            see_also: "http://dp.la/item/abc".to_string(),
            thumbnail: None,
        }
    }

    fn child_names(el: &Element) -> Vec<String> {
        el.children.iter().map(|c| c.name.to_string()).collect()
    }

    #[test]
    fn test_root_carries_id() {
        let fragment = build_fragment(&record(), &BuilderConfig::default());
        assert_eq!(fragment.id, "http://dp.la/api/items/abc");
        assert_eq!(fragment.root.name.to_string(), "sro:dpla");
        assert_eq!(
            fragment.root.attribute(Prefix::Rdf, "about"),
            Some("http://dp.la/api/items/abc")
        );
    }

    #[test]
    fn test_child_order() {
        let fragment = build_fragment(&record(), &BuilderConfig::default());
        assert_eq!(
            child_names(&fragment.root),
            vec![
                "collex:federation",
                "collex:archive",
                "dc:title",
                "role:AUT",
                "role:EDT",
                "dc:source",
                "dc:subject",
                "dc:subject",
                "collex:discipline",
                "collex:genre",
                "collex:freeculture",
                "dc:type",
                "dc:date",
                "collex:fulltext",
                "dc:language",
                "rdfs:seeAlso",
            ]
        );
    }

    #[test]
    fn test_optional_elements() {
        let mut rec = record();
        rec.description = Some("Two folders".to_string());
        rec.language = None;
        rec.thumbnail = Some("http://example.org/thumb.jpg".to_string());
        let fragment = build_fragment(&rec, &BuilderConfig::default());
        let names = child_names(&fragment.root);

        assert!(names.contains(&"dc:description".to_string()));
        assert!(!names.contains(&"dc:language".to_string()));
        assert_eq!(names.last().map(String::as_str), Some("collex:thumbnail"));

        let thumb = fragment
            .root
            .children_named(Prefix::Collex, "thumbnail")
            .next()
            .unwrap();
        assert_eq!(
            thumb.attribute(Prefix::Rdf, "resource"),
            Some("http://example.org/thumb.jpg")
        );
        assert_eq!(thumb.text, None);
    }

    #[test]
    fn test_see_also_is_link_attribute() {
        let fragment = build_fragment(&record(), &BuilderConfig::default());
        let see_also = fragment
            .root
            .children_named(Prefix::Rdfs, "seeAlso")
            .next()
            .unwrap();
        assert_eq!(
            see_also.attribute(Prefix::Rdf, "resource"),
            Some("http://dp.la/item/abc")
        );
        assert_eq!(see_also.text, None);
    }

    #[test]
    fn test_labeled_date_nesting() {
        let mut rec = record();
        rec.date = RecordDate::Labeled {
            label: "circa 1850-1855".to_string(),
            value: DateValue::Range {
                min: "1850".to_string(),
                max: "1855".to_string(),
            },
        };
        let fragment = build_fragment(&rec, &BuilderConfig::default());
        let date = fragment
            .root
            .children_named(Prefix::Dc, "date")
            .next()
            .unwrap();
        assert_eq!(date.text, None);

        let inner = date.children_named(Prefix::Collex, "date").next().unwrap();
        let label = inner.children_named(Prefix::Rdfs, "label").next().unwrap();
        let value = inner.children_named(Prefix::Rdf, "value").next().unwrap();
        assert_eq!(label.text.as_deref(), Some("circa 1850-1855"));
        assert_eq!(value.text.as_deref(), Some("1850,1855"));
    }

    #[test]
    fn test_uncertain_date_flat() {
        let mut rec = record();
        rec.date = RecordDate::Uncertain;
        let fragment = build_fragment(&rec, &BuilderConfig::default());
        let date = fragment
            .root
            .children_named(Prefix::Dc, "date")
            .next()
            .unwrap();
        assert_eq!(date.text.as_deref(), Some("Uncertain"));
        assert!(date.children.is_empty());
    }

    #[test]
    fn test_custom_record_element() {
        let config = BuilderConfig {
            record_element: "densho".to_string(),
        };
        let fragment = build_fragment(&record(), &config);
        assert_eq!(fragment.root.name.to_string(), "sro:densho");
    }
}

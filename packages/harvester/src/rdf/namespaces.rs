//! Namespace prefixes used in ARC/SiRO RDF.

use std::fmt;

/// RDF syntax namespace URI.
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Library of Congress relator terms; creator roles are elements here.
pub const ROLE: &str = "http://www.loc.gov/loc.terms/relators/";

/// RDF Schema namespace URI.
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// Collex (ARC) schema namespace URI.
pub const COLLEX: &str = "http://www.collex.org/schema#";

/// Dublin Core terms namespace URI.
pub const DCTERMS: &str = "http://purl.org/dc/terms/";

/// Dublin Core elements namespace URI.
pub const DC: &str = "http://purl.org/dc/elements/1.1/";

/// SiRO schema namespace URI.
pub const SRO: &str = "http://www.lib.msu.edu/sro/schema#";

/// A namespace prefix from the fixed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    Rdf,
    Role,
    Rdfs,
    Collex,
    Dcterms,
    Dc,
    Sro,
}

impl Prefix {
    /// All prefixes, in declaration order on the document root.
    pub const ALL: [Prefix; 7] = [
        Self::Rdf,
        Self::Role,
        Self::Rdfs,
        Self::Collex,
        Self::Dcterms,
        Self::Dc,
        Self::Sro,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rdf => "rdf",
            Self::Role => "role",
            Self::Rdfs => "rdfs",
            Self::Collex => "collex",
            Self::Dcterms => "dcterms",
            Self::Dc => "dc",
            Self::Sro => "sro",
        }
    }

    #[must_use]
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Rdf => RDF,
            Self::Role => ROLE,
            Self::Rdfs => RDFS,
            Self::Collex => COLLEX,
            Self::Dcterms => DCTERMS,
            Self::Dc => DC,
            Self::Sro => SRO,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

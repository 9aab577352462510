//! RDF and RDFS axiomatic statements
//!
//! The basic set from which the complete axiomatic closure can be inferred:
//! RDF Semantics Recommendation sections 3.1 and 4.1. These are
//! store-independent constants, seeded through the inferred-statement path
//! when an engine starts and again after any retraction reset.

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::NamedNodeRef;

type Axiom = (
    NamedNodeRef<'static>,
    NamedNodeRef<'static>,
    NamedNodeRef<'static>,
);

/// The basic axiomatic statements, in seeding order.
pub(crate) const AXIOMS: [Axiom; 48] = [
    // RDF axiomatic triples (RDF Semantics, section 3.1)
    (rdf::TYPE, rdf::TYPE, rdf::PROPERTY),
    (rdf::SUBJECT, rdf::TYPE, rdf::PROPERTY),
    (rdf::PREDICATE, rdf::TYPE, rdf::PROPERTY),
    (rdf::OBJECT, rdf::TYPE, rdf::PROPERTY),
    (rdf::FIRST, rdf::TYPE, rdf::PROPERTY),
    (rdf::REST, rdf::TYPE, rdf::PROPERTY),
    (rdf::VALUE, rdf::TYPE, rdf::PROPERTY),
    (rdf::NIL, rdf::TYPE, rdf::LIST),
    // RDFS axiomatic triples (RDF Semantics, section 4.1): domains
    (rdf::TYPE, rdfs::DOMAIN, rdfs::RESOURCE),
    (rdfs::DOMAIN, rdfs::DOMAIN, rdf::PROPERTY),
    (rdfs::RANGE, rdfs::DOMAIN, rdf::PROPERTY),
    (rdfs::SUB_PROPERTY_OF, rdfs::DOMAIN, rdf::PROPERTY),
    (rdfs::SUB_CLASS_OF, rdfs::DOMAIN, rdfs::CLASS),
    (rdf::SUBJECT, rdfs::DOMAIN, rdf::STATEMENT),
    (rdf::PREDICATE, rdfs::DOMAIN, rdf::STATEMENT),
    (rdf::OBJECT, rdfs::DOMAIN, rdf::STATEMENT),
    (rdfs::MEMBER, rdfs::DOMAIN, rdfs::RESOURCE),
    (rdf::FIRST, rdfs::DOMAIN, rdf::LIST),
    (rdf::REST, rdfs::DOMAIN, rdf::LIST),
    (rdfs::SEE_ALSO, rdfs::DOMAIN, rdfs::RESOURCE),
    (rdfs::IS_DEFINED_BY, rdfs::DOMAIN, rdfs::RESOURCE),
    (rdfs::COMMENT, rdfs::DOMAIN, rdfs::RESOURCE),
    (rdfs::LABEL, rdfs::DOMAIN, rdfs::RESOURCE),
    (rdf::VALUE, rdfs::DOMAIN, rdfs::RESOURCE),
    // Ranges
    (rdf::TYPE, rdfs::RANGE, rdfs::CLASS),
    (rdfs::DOMAIN, rdfs::RANGE, rdfs::CLASS),
    (rdfs::RANGE, rdfs::RANGE, rdfs::CLASS),
    (rdfs::SUB_PROPERTY_OF, rdfs::RANGE, rdf::PROPERTY),
    (rdfs::SUB_CLASS_OF, rdfs::RANGE, rdfs::CLASS),
    (rdf::SUBJECT, rdfs::RANGE, rdfs::RESOURCE),
    (rdf::PREDICATE, rdfs::RANGE, rdfs::RESOURCE),
    (rdf::OBJECT, rdfs::RANGE, rdfs::RESOURCE),
    (rdfs::MEMBER, rdfs::RANGE, rdfs::RESOURCE),
    (rdf::FIRST, rdfs::RANGE, rdfs::RESOURCE),
    (rdf::REST, rdfs::RANGE, rdf::LIST),
    (rdfs::SEE_ALSO, rdfs::RANGE, rdfs::RESOURCE),
    (rdfs::IS_DEFINED_BY, rdfs::RANGE, rdfs::RESOURCE),
    (rdfs::COMMENT, rdfs::RANGE, rdfs::LITERAL),
    (rdfs::LABEL, rdfs::RANGE, rdfs::LITERAL),
    (rdf::VALUE, rdfs::RANGE, rdfs::RESOURCE),
    // Container classes and membership properties
    (rdf::ALT, rdfs::SUB_CLASS_OF, rdfs::CONTAINER),
    (rdf::BAG, rdfs::SUB_CLASS_OF, rdfs::CONTAINER),
    (rdf::SEQ, rdfs::SUB_CLASS_OF, rdfs::CONTAINER),
    (
        rdfs::CONTAINER_MEMBERSHIP_PROPERTY,
        rdfs::SUB_CLASS_OF,
        rdf::PROPERTY,
    ),
    (rdfs::IS_DEFINED_BY, rdfs::SUB_PROPERTY_OF, rdfs::SEE_ALSO),
    // Datatypes
    (rdf::XML_LITERAL, rdf::TYPE, rdfs::DATATYPE),
    (rdf::XML_LITERAL, rdfs::SUB_CLASS_OF, rdfs::LITERAL),
    (rdfs::DATATYPE, rdfs::SUB_CLASS_OF, rdfs::CLASS),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_axioms_are_distinct() {
        let unique: FxHashSet<_> = AXIOMS
            .iter()
            .map(|(s, p, o)| (s.as_str(), p.as_str(), o.as_str()))
            .collect();
        assert_eq!(unique.len(), AXIOMS.len());
    }
}

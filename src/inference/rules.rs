//! The RDFS entailment rule table and its trigger graph
//!
//! 21 statically enumerated rules: the RDF/RDFS entailment rules of the RDF
//! Semantics Recommendation plus one extension rule for container-membership
//! properties. Two-pattern rules appear twice, once per matching direction:
//! `Fwd` variants are driven by new data statements, `Bwd` variants by new
//! schema statements.
//!
//! The trigger graph is a fixed directed relation over rule ids: rule `i`
//! triggers rule `j` iff a statement produced by `i`'s consequent can match
//! `j`'s delta-side antecedent pattern. It is computed once, process-wide,
//! and shared read-only.

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::NamedNodeRef;
use std::sync::OnceLock;

/// Number of entailment rules
pub const RULE_COUNT: usize = 21;

/// Identifier of one entailment rule, in declared evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleId {
    /// xxx aaa yyy => aaa rdf:type rdf:Property
    Rdf1,
    /// xxx aaa yyy (new) + aaa rdfs:domain zzz => xxx rdf:type zzz
    Rdfs2Fwd,
    /// aaa rdfs:domain zzz (new) + xxx aaa yyy => xxx rdf:type zzz
    Rdfs2Bwd,
    /// xxx aaa uuu (new) + aaa rdfs:range zzz => uuu rdf:type zzz
    Rdfs3Fwd,
    /// aaa rdfs:range zzz (new) + xxx aaa uuu => uuu rdf:type zzz
    Rdfs3Bwd,
    /// xxx aaa yyy => xxx rdf:type rdfs:Resource
    Rdfs4a,
    /// xxx aaa uuu => uuu rdf:type rdfs:Resource
    Rdfs4b,
    /// aaa subPropertyOf bbb (new) + bbb subPropertyOf ccc => aaa subPropertyOf ccc
    Rdfs5Fwd,
    /// bbb subPropertyOf ccc (new) + aaa subPropertyOf bbb => aaa subPropertyOf ccc
    Rdfs5Bwd,
    /// xxx rdf:type rdf:Property => xxx subPropertyOf xxx
    Rdfs6,
    /// xxx aaa yyy (new) + aaa subPropertyOf bbb => xxx bbb yyy
    Rdfs7Fwd,
    /// aaa subPropertyOf bbb (new) + xxx aaa yyy => xxx bbb yyy
    Rdfs7Bwd,
    /// xxx rdf:type rdfs:Class => xxx subClassOf rdfs:Resource
    Rdfs8,
    /// xxx subClassOf yyy (new) + aaa rdf:type xxx => aaa rdf:type yyy
    Rdfs9Fwd,
    /// aaa rdf:type xxx (new) + xxx subClassOf yyy => aaa rdf:type yyy
    Rdfs9Bwd,
    /// xxx rdf:type rdfs:Class => xxx subClassOf xxx
    Rdfs10,
    /// xxx subClassOf yyy (new) + yyy subClassOf zzz => xxx subClassOf zzz
    Rdfs11Fwd,
    /// yyy subClassOf zzz (new) + xxx subClassOf yyy => xxx subClassOf zzz
    Rdfs11Bwd,
    /// xxx rdf:type ContainerMembershipProperty => xxx subPropertyOf rdfs:member
    Rdfs12,
    /// xxx rdf:type rdfs:Datatype => xxx subClassOf rdfs:Literal
    Rdfs13,
    /// xxx rdf:_N yyy => rdf:_N rdf:type ContainerMembershipProperty
    X1,
}

impl RuleId {
    /// All rules in declared evaluation order
    pub const ALL: [RuleId; RULE_COUNT] = [
        RuleId::Rdf1,
        RuleId::Rdfs2Fwd,
        RuleId::Rdfs2Bwd,
        RuleId::Rdfs3Fwd,
        RuleId::Rdfs3Bwd,
        RuleId::Rdfs4a,
        RuleId::Rdfs4b,
        RuleId::Rdfs5Fwd,
        RuleId::Rdfs5Bwd,
        RuleId::Rdfs6,
        RuleId::Rdfs7Fwd,
        RuleId::Rdfs7Bwd,
        RuleId::Rdfs8,
        RuleId::Rdfs9Fwd,
        RuleId::Rdfs9Bwd,
        RuleId::Rdfs10,
        RuleId::Rdfs11Fwd,
        RuleId::Rdfs11Bwd,
        RuleId::Rdfs12,
        RuleId::Rdfs13,
        RuleId::X1,
    ];

    /// Index into per-rule flag and counter arrays
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name of the rule
    pub fn name(self) -> &'static str {
        RULES[self.index()].name
    }

    /// The rules whose antecedent could newly match because of this rule's
    /// output.
    pub fn triggers(self) -> &'static [RuleId] {
        &trigger_table()[self.index()]
    }
}

/// Predicate/object constraints of a triple pattern; `None` is a variable.
struct PatternShape {
    predicate: Option<NamedNodeRef<'static>>,
    object: Option<NamedNodeRef<'static>>,
}

struct Rule {
    name: &'static str,
    /// Pattern the rule matches against the new-this-iteration delta
    antecedent: PatternShape,
    /// Shape of the statements the rule produces
    consequent: PatternShape,
}

const ANY: PatternShape = PatternShape {
    predicate: None,
    object: None,
};

const fn pred(predicate: NamedNodeRef<'static>) -> PatternShape {
    PatternShape {
        predicate: Some(predicate),
        object: None,
    }
}

const fn pred_obj(
    predicate: NamedNodeRef<'static>,
    object: NamedNodeRef<'static>,
) -> PatternShape {
    PatternShape {
        predicate: Some(predicate),
        object: Some(object),
    }
}

static RULES: [Rule; RULE_COUNT] = [
    Rule {
        name: "rdf1",
        antecedent: ANY,
        consequent: pred_obj(rdf::TYPE, rdf::PROPERTY),
    },
    Rule {
        name: "rdfs2_1",
        antecedent: ANY,
        consequent: pred(rdf::TYPE),
    },
    Rule {
        name: "rdfs2_2",
        antecedent: pred(rdfs::DOMAIN),
        consequent: pred(rdf::TYPE),
    },
    Rule {
        name: "rdfs3_1",
        antecedent: ANY,
        consequent: pred(rdf::TYPE),
    },
    Rule {
        name: "rdfs3_2",
        antecedent: pred(rdfs::RANGE),
        consequent: pred(rdf::TYPE),
    },
    Rule {
        name: "rdfs4a",
        antecedent: ANY,
        consequent: pred_obj(rdf::TYPE, rdfs::RESOURCE),
    },
    Rule {
        name: "rdfs4b",
        antecedent: ANY,
        consequent: pred_obj(rdf::TYPE, rdfs::RESOURCE),
    },
    Rule {
        name: "rdfs5_1",
        antecedent: pred(rdfs::SUB_PROPERTY_OF),
        consequent: pred(rdfs::SUB_PROPERTY_OF),
    },
    Rule {
        name: "rdfs5_2",
        antecedent: pred(rdfs::SUB_PROPERTY_OF),
        consequent: pred(rdfs::SUB_PROPERTY_OF),
    },
    Rule {
        name: "rdfs6",
        antecedent: pred_obj(rdf::TYPE, rdf::PROPERTY),
        consequent: pred(rdfs::SUB_PROPERTY_OF),
    },
    Rule {
        name: "rdfs7_1",
        antecedent: ANY,
        consequent: ANY,
    },
    Rule {
        name: "rdfs7_2",
        antecedent: pred(rdfs::SUB_PROPERTY_OF),
        consequent: ANY,
    },
    Rule {
        name: "rdfs8",
        antecedent: pred_obj(rdf::TYPE, rdfs::CLASS),
        consequent: pred_obj(rdfs::SUB_CLASS_OF, rdfs::RESOURCE),
    },
    Rule {
        name: "rdfs9_1",
        antecedent: pred(rdfs::SUB_CLASS_OF),
        consequent: pred(rdf::TYPE),
    },
    Rule {
        name: "rdfs9_2",
        antecedent: pred(rdf::TYPE),
        consequent: pred(rdf::TYPE),
    },
    Rule {
        name: "rdfs10",
        antecedent: pred_obj(rdf::TYPE, rdfs::CLASS),
        consequent: pred(rdfs::SUB_CLASS_OF),
    },
    Rule {
        name: "rdfs11_1",
        antecedent: pred(rdfs::SUB_CLASS_OF),
        consequent: pred(rdfs::SUB_CLASS_OF),
    },
    Rule {
        name: "rdfs11_2",
        antecedent: pred(rdfs::SUB_CLASS_OF),
        consequent: pred(rdfs::SUB_CLASS_OF),
    },
    Rule {
        name: "rdfs12",
        antecedent: pred_obj(rdf::TYPE, rdfs::CONTAINER_MEMBERSHIP_PROPERTY),
        consequent: pred_obj(rdfs::SUB_PROPERTY_OF, rdfs::MEMBER),
    },
    Rule {
        name: "rdfs13",
        antecedent: pred_obj(rdf::TYPE, rdfs::DATATYPE),
        consequent: pred_obj(rdfs::SUB_CLASS_OF, rdfs::LITERAL),
    },
    Rule {
        name: "X1",
        antecedent: ANY,
        consequent: pred_obj(rdf::TYPE, rdfs::CONTAINER_MEMBERSHIP_PROPERTY),
    },
];

/// A consequent position can feed an antecedent position unless both fix a
/// term and the terms differ. A variable on either side matches anything.
fn position_compatible(
    produced: Option<NamedNodeRef<'static>>,
    required: Option<NamedNodeRef<'static>>,
) -> bool {
    match (produced, required) {
        (Some(out), Some(pattern)) => out == pattern,
        _ => true,
    }
}

fn can_trigger(producer: &Rule, candidate: &Rule) -> bool {
    position_compatible(producer.consequent.predicate, candidate.antecedent.predicate)
        && position_compatible(producer.consequent.object, candidate.antecedent.object)
}

fn trigger_table() -> &'static [Vec<RuleId>; RULE_COUNT] {
    static TRIGGERS: OnceLock<[Vec<RuleId>; RULE_COUNT]> = OnceLock::new();
    TRIGGERS.get_or_init(|| {
        std::array::from_fn(|i| {
            RuleId::ALL
                .iter()
                .copied()
                .filter(|candidate| can_trigger(&RULES[i], &RULES[candidate.index()]))
                .collect()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_order_matches_indices() {
        for (i, rule) in RuleId::ALL.iter().enumerate() {
            assert_eq!(rule.index(), i);
        }
        assert_eq!(RuleId::ALL.len(), RULE_COUNT);
    }

    #[test]
    fn test_type_property_triggers() {
        // rdf1 produces (aaa rdf:type rdf:Property): enables the property
        // reflexivity rule and type propagation, but not the class rules.
        let triggers = RuleId::Rdf1.triggers();
        assert!(triggers.contains(&RuleId::Rdfs6));
        assert!(triggers.contains(&RuleId::Rdfs9Bwd));
        assert!(!triggers.contains(&RuleId::Rdfs8));
        assert!(!triggers.contains(&RuleId::Rdfs10));
        assert!(!triggers.contains(&RuleId::Rdfs12));
        assert!(!triggers.contains(&RuleId::Rdfs13));
    }

    #[test]
    fn test_container_membership_chain() {
        // X1 produces (p rdf:type ContainerMembershipProperty), which feeds
        // rdfs12; rdfs12 produces a subPropertyOf statement, which feeds the
        // subPropertyOf transitivity and propagation rules.
        assert!(RuleId::X1.triggers().contains(&RuleId::Rdfs12));
        let rdfs12 = RuleId::Rdfs12.triggers();
        assert!(rdfs12.contains(&RuleId::Rdfs5Fwd));
        assert!(rdfs12.contains(&RuleId::Rdfs5Bwd));
        assert!(rdfs12.contains(&RuleId::Rdfs7Bwd));
        assert!(!rdfs12.contains(&RuleId::Rdfs9Bwd));
    }

    #[test]
    fn test_subclass_rules_feed_each_other() {
        let triggers = RuleId::Rdfs11Fwd.triggers();
        assert!(triggers.contains(&RuleId::Rdfs11Fwd));
        assert!(triggers.contains(&RuleId::Rdfs11Bwd));
        assert!(triggers.contains(&RuleId::Rdfs9Fwd));
    }

    #[test]
    fn test_any_consequent_triggers_everything() {
        // rdfs7 rewrites arbitrary statements, so it can feed any rule.
        assert_eq!(RuleId::Rdfs7Fwd.triggers().len(), RULE_COUNT);
    }
}

//! Forward-chaining RDFS entailment engine
//!
//! Keyed to one underlying connection. Rules read from a stable snapshot of
//! the statements that arrived since the last pass (`new_this_iteration`)
//! joined against the live store, derive consequents through the deduping
//! `add_inferred_statement` primitive, and loop until an iteration derives
//! zero new facts. The trigger graph bounds each iteration to the rules
//! whose antecedent could newly match.
//!
//! Retractions invalidate derivations in ways no incremental delta can
//! repair, so any removal causes the next flush to discard all inferred
//! statements, re-seed the axioms, and rescan the whole store.

use std::sync::{Arc, Mutex, MutexGuard};

use oxrdf::vocab::{rdf, rdfs};
use tracing::debug;

use super::axioms::AXIOMS;
use super::rules::{RuleId, RULE_COUNT};
use super::tracker::ChangeTracker;
use crate::model::{NamedNode, Resource, Statement, StatementSet, Value};
use crate::store::{
    BindingSet, Connection, ConnectionListener, InferenceSupport, PatternQuery, StoreError,
    StoreResult, TrackedIteration,
};

/// IRI prefix of the container-membership properties `rdf:_1`, `rdf:_2`, ...
const CONTAINER_MEMBERSHIP_PREFIX: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#_";

/// The forward-chaining rule engine state for one connection.
pub struct RdfsInferencer {
    tracker: Arc<ChangeTracker>,
    /// Snapshot of the delta for the current fixpoint iteration
    new_this_iteration: StatementSet,
    /// Rules to evaluate this iteration
    check_rule: [bool; RULE_COUNT],
    /// Rules to evaluate next iteration, driven by the trigger graph
    check_rule_next_iter: [bool; RULE_COUNT],
    /// Statements inferred per rule during the current pass
    rule_counts: [u64; RULE_COUNT],
    total_inferred: u64,
}

impl RdfsInferencer {
    /// Create an engine consuming the given tracker's deltas
    pub fn new(tracker: Arc<ChangeTracker>) -> Self {
        Self {
            tracker,
            new_this_iteration: StatementSet::new(),
            check_rule: [false; RULE_COUNT],
            check_rule_next_iter: [false; RULE_COUNT],
            rule_counts: [0; RULE_COUNT],
            total_inferred: 0,
        }
    }

    /// Seed the fixed RDF/RDFS axiomatic statements.
    pub(crate) fn add_axiom_statements<S: InferenceSupport>(
        &self,
        con: &Connection<S>,
    ) -> StoreResult<()> {
        debug!("inserting axiom statements");
        for (subject, predicate, object) in AXIOMS {
            con.add_inferred_statement(subject.into(), predicate.into(), object.into())?;
        }
        Ok(())
    }

    /// Bring the inferred statements up to date with the asserted ones.
    ///
    /// Invoked once per commit/flush. Errors abort the whole pass; the
    /// caller is expected to roll back the transaction.
    pub fn flush_updates<S: InferenceSupport>(&mut self, con: &Connection<S>) -> StoreResult<()> {
        if self.tracker.statements_removed() {
            debug!("statements removed, starting inferencing from scratch");
            con.clear_inferred()?;
            // The tracker still has its removed flag set here, so these
            // additions are not recorded; the full rescan below picks the
            // axioms up along with everything else.
            self.add_axiom_statements(con)?;

            let mut everything = StatementSet::new();
            for statement in con.get_statements(None, None, None, true, &[])? {
                everything.insert(statement);
            }
            self.tracker.replace_new_statements(everything);
            self.tracker.clear_removed_flag();
        }

        self.do_inferencing(con)
    }

    fn do_inferencing<S: InferenceSupport>(&mut self, con: &Connection<S>) -> StoreResult<()> {
        if !self.tracker.has_new_statements() {
            return Ok(());
        }

        self.total_inferred = 0;
        self.rule_counts = [0; RULE_COUNT];
        self.check_rule_next_iter = [true; RULE_COUNT];

        let mut iteration = 0u32;
        while self.tracker.has_new_statements() {
            iteration += 1;
            debug!(iteration, "starting inference iteration");
            self.prepare_iteration();

            let mut inferred = 0u64;
            for rule in RuleId::ALL {
                inferred += self.apply_rule(con, rule)?;
            }

            debug!(iteration, inferred, "inference iteration done");
            self.total_inferred += inferred;
        }
        self.new_this_iteration.clear();

        debug!(total = self.total_inferred, "inferencing complete");
        for rule in RuleId::ALL {
            debug!(
                rule = rule.name(),
                inferred = self.rule_counts[rule.index()],
                "rule statistics"
            );
        }
        Ok(())
    }

    fn prepare_iteration(&mut self) {
        for i in 0..RULE_COUNT {
            self.check_rule[i] = self.check_rule_next_iter[i];
            self.check_rule_next_iter[i] = false;
        }
        self.new_this_iteration = self.tracker.take_new_statements();
    }

    fn apply_rule<S: InferenceSupport>(
        &mut self,
        con: &Connection<S>,
        rule: RuleId,
    ) -> StoreResult<u64> {
        if !self.check_rule[rule.index()] {
            return Ok(0);
        }

        let inferred = self.apply_rule_internal(con, rule)?;
        if inferred > 0 {
            self.rule_counts[rule.index()] += inferred;
            for triggered in rule.triggers() {
                self.check_rule_next_iter[triggered.index()] = true;
            }
        }
        Ok(inferred)
    }

    fn apply_rule_internal<S: InferenceSupport>(
        &self,
        con: &Connection<S>,
        rule: RuleId,
    ) -> StoreResult<u64> {
        match rule {
            RuleId::Rdf1 => self.apply_rdf1(con),
            RuleId::Rdfs2Fwd => self.apply_rdfs2_fwd(con),
            RuleId::Rdfs2Bwd => self.apply_rdfs2_bwd(con),
            RuleId::Rdfs3Fwd => self.apply_rdfs3_fwd(con),
            RuleId::Rdfs3Bwd => self.apply_rdfs3_bwd(con),
            RuleId::Rdfs4a => self.apply_rdfs4a(con),
            RuleId::Rdfs4b => self.apply_rdfs4b(con),
            RuleId::Rdfs5Fwd => self.apply_rdfs5_fwd(con),
            RuleId::Rdfs5Bwd => self.apply_rdfs5_bwd(con),
            RuleId::Rdfs6 => self.apply_rdfs6(con),
            RuleId::Rdfs7Fwd => self.apply_rdfs7_fwd(con),
            RuleId::Rdfs7Bwd => self.apply_rdfs7_bwd(con),
            RuleId::Rdfs8 => self.apply_rdfs8(con),
            RuleId::Rdfs9Fwd => self.apply_rdfs9_fwd(con),
            RuleId::Rdfs9Bwd => self.apply_rdfs9_bwd(con),
            RuleId::Rdfs10 => self.apply_rdfs10(con),
            RuleId::Rdfs11Fwd => self.apply_rdfs11_fwd(con),
            RuleId::Rdfs11Bwd => self.apply_rdfs11_bwd(con),
            RuleId::Rdfs12 => self.apply_rdfs12(con),
            RuleId::Rdfs13 => self.apply_rdfs13(con),
            RuleId::X1 => self.apply_x1(con),
        }
    }

    // xxx aaa yyy --> aaa rdf:type rdf:Property
    fn apply_rdf1<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, None, None) {
            let aaa: Resource = nt.predicate.clone().into();
            if con.add_inferred_statement(aaa, rdf::TYPE.into(), rdf::PROPERTY.into())? {
                inferred += 1;
            }
        }
        Ok(inferred)
    }

    // xxx aaa yyy (nt) && aaa rdfs:domain zzz (t1) --> xxx rdf:type zzz
    fn apply_rdfs2_fwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let domain: NamedNode = rdfs::DOMAIN.into();
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, None, None) {
            let xxx = nt.subject.clone();
            let aaa: Resource = nt.predicate.clone().into();
            for t1 in con.get_statements(Some(&aaa), Some(&domain), None, true, &[])? {
                if let Some(zzz) = t1.object.as_resource() {
                    if con.add_inferred_statement(xxx.clone(), rdf::TYPE.into(), zzz.into())? {
                        inferred += 1;
                    }
                }
            }
        }
        Ok(inferred)
    }

    // aaa rdfs:domain zzz (nt) && xxx aaa yyy (t1) --> xxx rdf:type zzz
    fn apply_rdfs2_bwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let domain: NamedNode = rdfs::DOMAIN.into();
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, Some(&domain), None) {
            let Some(aaa) = nt.subject.as_named_node().cloned() else {
                continue;
            };
            let Some(zzz) = nt.object.as_resource() else {
                continue;
            };
            for t1 in con.get_statements(None, Some(&aaa), None, true, &[])? {
                if con.add_inferred_statement(
                    t1.subject.clone(),
                    rdf::TYPE.into(),
                    zzz.clone().into(),
                )? {
                    inferred += 1;
                }
            }
        }
        Ok(inferred)
    }

    // xxx aaa uuu (nt) && aaa rdfs:range zzz (t1) --> uuu rdf:type zzz
    fn apply_rdfs3_fwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let range: NamedNode = rdfs::RANGE.into();
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, None, None) {
            let Some(uuu) = nt.object.as_resource() else {
                continue;
            };
            let aaa: Resource = nt.predicate.clone().into();
            for t1 in con.get_statements(Some(&aaa), Some(&range), None, true, &[])? {
                if let Some(zzz) = t1.object.as_resource() {
                    if con.add_inferred_statement(uuu.clone(), rdf::TYPE.into(), zzz.into())? {
                        inferred += 1;
                    }
                }
            }
        }
        Ok(inferred)
    }

    // aaa rdfs:range zzz (nt) && xxx aaa uuu (t1) --> uuu rdf:type zzz
    fn apply_rdfs3_bwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let range: NamedNode = rdfs::RANGE.into();
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, Some(&range), None) {
            let Some(aaa) = nt.subject.as_named_node().cloned() else {
                continue;
            };
            let Some(zzz) = nt.object.as_resource() else {
                continue;
            };
            for t1 in con.get_statements(None, Some(&aaa), None, true, &[])? {
                if let Some(uuu) = t1.object.as_resource() {
                    if con.add_inferred_statement(uuu, rdf::TYPE.into(), zzz.clone().into())? {
                        inferred += 1;
                    }
                }
            }
        }
        Ok(inferred)
    }

    // xxx aaa yyy --> xxx rdf:type rdfs:Resource
    fn apply_rdfs4a<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, None, None) {
            if con.add_inferred_statement(
                nt.subject.clone(),
                rdf::TYPE.into(),
                rdfs::RESOURCE.into(),
            )? {
                inferred += 1;
            }
        }
        Ok(inferred)
    }

    // xxx aaa uuu --> uuu rdf:type rdfs:Resource
    fn apply_rdfs4b<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, None, None) {
            if let Some(uuu) = nt.object.as_resource() {
                if con.add_inferred_statement(uuu, rdf::TYPE.into(), rdfs::RESOURCE.into())? {
                    inferred += 1;
                }
            }
        }
        Ok(inferred)
    }

    // aaa rdfs:subPropertyOf bbb (nt) && bbb rdfs:subPropertyOf ccc (t1)
    // --> aaa rdfs:subPropertyOf ccc
    fn apply_rdfs5_fwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let sub_property_of: NamedNode = rdfs::SUB_PROPERTY_OF.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&sub_property_of), None)
        {
            let aaa = nt.subject.clone();
            let Some(bbb) = nt.object.as_resource() else {
                continue;
            };
            for t1 in con.get_statements(Some(&bbb), Some(&sub_property_of), None, true, &[])? {
                if let Some(ccc) = t1.object.as_resource() {
                    if con.add_inferred_statement(
                        aaa.clone(),
                        sub_property_of.clone(),
                        ccc.into(),
                    )? {
                        inferred += 1;
                    }
                }
            }
        }
        Ok(inferred)
    }

    // bbb rdfs:subPropertyOf ccc (nt) && aaa rdfs:subPropertyOf bbb (t1)
    // --> aaa rdfs:subPropertyOf ccc
    fn apply_rdfs5_bwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let sub_property_of: NamedNode = rdfs::SUB_PROPERTY_OF.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&sub_property_of), None)
        {
            let bbb: Value = nt.subject.clone().into();
            let Some(ccc) = nt.object.as_resource() else {
                continue;
            };
            for t1 in con.get_statements(None, Some(&sub_property_of), Some(&bbb), true, &[])? {
                if con.add_inferred_statement(
                    t1.subject.clone(),
                    sub_property_of.clone(),
                    ccc.clone().into(),
                )? {
                    inferred += 1;
                }
            }
        }
        Ok(inferred)
    }

    // xxx rdf:type rdf:Property --> xxx rdfs:subPropertyOf xxx
    fn apply_rdfs6<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let rdf_type: NamedNode = rdf::TYPE.into();
        let property: Value = rdf::PROPERTY.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&rdf_type), Some(&property))
        {
            let xxx = nt.subject.clone();
            let reflexive: Value = xxx.clone().into();
            if con.add_inferred_statement(xxx, rdfs::SUB_PROPERTY_OF.into(), reflexive)? {
                inferred += 1;
            }
        }
        Ok(inferred)
    }

    // xxx aaa yyy (nt) && aaa rdfs:subPropertyOf bbb (t1) --> xxx bbb yyy
    fn apply_rdfs7_fwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let sub_property_of: NamedNode = rdfs::SUB_PROPERTY_OF.into();
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, None, None) {
            let aaa: Resource = nt.predicate.clone().into();
            for t1 in con.get_statements(Some(&aaa), Some(&sub_property_of), None, true, &[])? {
                // The superproperty must be an IRI to serve as a predicate
                if let Value::NamedNode(bbb) = t1.object {
                    if con.add_inferred_statement(
                        nt.subject.clone(),
                        bbb,
                        nt.object.clone(),
                    )? {
                        inferred += 1;
                    }
                }
            }
        }
        Ok(inferred)
    }

    // aaa rdfs:subPropertyOf bbb (nt) && xxx aaa yyy (t1) --> xxx bbb yyy
    fn apply_rdfs7_bwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let sub_property_of: NamedNode = rdfs::SUB_PROPERTY_OF.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&sub_property_of), None)
        {
            let Some(aaa) = nt.subject.as_named_node().cloned() else {
                continue;
            };
            let Value::NamedNode(bbb) = nt.object.clone() else {
                continue;
            };
            for t1 in con.get_statements(None, Some(&aaa), None, true, &[])? {
                if con.add_inferred_statement(t1.subject.clone(), bbb.clone(), t1.object.clone())? {
                    inferred += 1;
                }
            }
        }
        Ok(inferred)
    }

    // xxx rdf:type rdfs:Class --> xxx rdfs:subClassOf rdfs:Resource
    fn apply_rdfs8<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let rdf_type: NamedNode = rdf::TYPE.into();
        let class: Value = rdfs::CLASS.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&rdf_type), Some(&class))
        {
            if con.add_inferred_statement(
                nt.subject.clone(),
                rdfs::SUB_CLASS_OF.into(),
                rdfs::RESOURCE.into(),
            )? {
                inferred += 1;
            }
        }
        Ok(inferred)
    }

    // xxx rdfs:subClassOf yyy (nt) && aaa rdf:type xxx (t1) --> aaa rdf:type yyy
    fn apply_rdfs9_fwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let sub_class_of: NamedNode = rdfs::SUB_CLASS_OF.into();
        let rdf_type: NamedNode = rdf::TYPE.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&sub_class_of), None)
        {
            let xxx: Value = nt.subject.clone().into();
            let Some(yyy) = nt.object.as_resource() else {
                continue;
            };
            for t1 in con.get_statements(None, Some(&rdf_type), Some(&xxx), true, &[])? {
                if con.add_inferred_statement(
                    t1.subject.clone(),
                    rdf::TYPE.into(),
                    yyy.clone().into(),
                )? {
                    inferred += 1;
                }
            }
        }
        Ok(inferred)
    }

    // aaa rdf:type xxx (nt) && xxx rdfs:subClassOf yyy (t1) --> aaa rdf:type yyy
    fn apply_rdfs9_bwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let sub_class_of: NamedNode = rdfs::SUB_CLASS_OF.into();
        let rdf_type: NamedNode = rdf::TYPE.into();
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, Some(&rdf_type), None) {
            let aaa = nt.subject.clone();
            let Some(xxx) = nt.object.as_resource() else {
                continue;
            };
            for t1 in con.get_statements(Some(&xxx), Some(&sub_class_of), None, true, &[])? {
                if let Some(yyy) = t1.object.as_resource() {
                    if con.add_inferred_statement(aaa.clone(), rdf::TYPE.into(), yyy.into())? {
                        inferred += 1;
                    }
                }
            }
        }
        Ok(inferred)
    }

    // xxx rdf:type rdfs:Class --> xxx rdfs:subClassOf xxx
    fn apply_rdfs10<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let rdf_type: NamedNode = rdf::TYPE.into();
        let class: Value = rdfs::CLASS.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&rdf_type), Some(&class))
        {
            let xxx = nt.subject.clone();
            let reflexive: Value = xxx.clone().into();
            if con.add_inferred_statement(xxx, rdfs::SUB_CLASS_OF.into(), reflexive)? {
                inferred += 1;
            }
        }
        Ok(inferred)
    }

    // xxx rdfs:subClassOf yyy (nt) && yyy rdfs:subClassOf zzz (t1)
    // --> xxx rdfs:subClassOf zzz
    fn apply_rdfs11_fwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let sub_class_of: NamedNode = rdfs::SUB_CLASS_OF.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&sub_class_of), None)
        {
            let xxx = nt.subject.clone();
            let Some(yyy) = nt.object.as_resource() else {
                continue;
            };
            for t1 in con.get_statements(Some(&yyy), Some(&sub_class_of), None, true, &[])? {
                if let Some(zzz) = t1.object.as_resource() {
                    if con.add_inferred_statement(xxx.clone(), sub_class_of.clone(), zzz.into())? {
                        inferred += 1;
                    }
                }
            }
        }
        Ok(inferred)
    }

    // yyy rdfs:subClassOf zzz (nt) && xxx rdfs:subClassOf yyy (t1)
    // --> xxx rdfs:subClassOf zzz
    fn apply_rdfs11_bwd<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let sub_class_of: NamedNode = rdfs::SUB_CLASS_OF.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&sub_class_of), None)
        {
            let yyy: Value = nt.subject.clone().into();
            let Some(zzz) = nt.object.as_resource() else {
                continue;
            };
            for t1 in con.get_statements(None, Some(&sub_class_of), Some(&yyy), true, &[])? {
                if con.add_inferred_statement(
                    t1.subject.clone(),
                    sub_class_of.clone(),
                    zzz.clone().into(),
                )? {
                    inferred += 1;
                }
            }
        }
        Ok(inferred)
    }

    // xxx rdf:type rdfs:ContainerMembershipProperty
    // --> xxx rdfs:subPropertyOf rdfs:member
    fn apply_rdfs12<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let rdf_type: NamedNode = rdf::TYPE.into();
        let cmp: Value = rdfs::CONTAINER_MEMBERSHIP_PROPERTY.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&rdf_type), Some(&cmp))
        {
            if con.add_inferred_statement(
                nt.subject.clone(),
                rdfs::SUB_PROPERTY_OF.into(),
                rdfs::MEMBER.into(),
            )? {
                inferred += 1;
            }
        }
        Ok(inferred)
    }

    // xxx rdf:type rdfs:Datatype --> xxx rdfs:subClassOf rdfs:Literal
    fn apply_rdfs13<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let rdf_type: NamedNode = rdf::TYPE.into();
        let datatype: Value = rdfs::DATATYPE.into();
        let mut inferred = 0;
        for nt in self
            .new_this_iteration
            .matching(None, Some(&rdf_type), Some(&datatype))
        {
            if con.add_inferred_statement(
                nt.subject.clone(),
                rdfs::SUB_CLASS_OF.into(),
                rdfs::LITERAL.into(),
            )? {
                inferred += 1;
            }
        }
        Ok(inferred)
    }

    // xxx rdf:_N yyy --> rdf:_N rdf:type rdfs:ContainerMembershipProperty
    //
    // Extension rule for container membership properties; the RDF model
    // theory does not specify a production for these.
    fn apply_x1<S: InferenceSupport>(&self, con: &Connection<S>) -> StoreResult<u64> {
        let mut inferred = 0;
        for nt in self.new_this_iteration.matching(None, None, None) {
            if !is_container_membership_property(&nt.predicate) {
                continue;
            }
            let predicate: Resource = nt.predicate.clone().into();
            if con.add_inferred_statement(
                predicate,
                rdf::TYPE.into(),
                rdfs::CONTAINER_MEMBERSHIP_PROPERTY.into(),
            )? {
                inferred += 1;
            }
        }
        Ok(inferred)
    }
}

/// True for `rdf:_1`, `rdf:_2`, ...: the suffix must be a non-empty digit
/// string without a leading zero.
fn is_container_membership_property(predicate: &NamedNode) -> bool {
    match predicate.as_str().strip_prefix(CONTAINER_MEMBERSHIP_PREFIX) {
        Some(suffix) => {
            !suffix.is_empty()
                && !suffix.starts_with('0')
                && suffix.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// A connection whose committed state is always closed under the RDFS rules.
///
/// Wraps a [`Connection`] together with its engine; mutations are recorded
/// by the change tracker, and `commit`/`flush` run the fixpoint before the
/// underlying transaction completes. Read operations flush first so derived
/// statements are visible to the reader that caused them.
pub struct InferencingConnection<S: InferenceSupport> {
    connection: Connection<S>,
    tracker: Arc<ChangeTracker>,
    engine: Mutex<RdfsInferencer>,
}

impl<S: InferenceSupport> InferencingConnection<S> {
    /// Open an inferencing connection owning the given store handle.
    ///
    /// Seeds the axiomatic statements; the first flush closes them under
    /// the rule set.
    pub fn new(store: S) -> StoreResult<Self> {
        let connection = Connection::new(store);
        let tracker = Arc::new(ChangeTracker::new());
        connection.add_listener(Arc::clone(&tracker) as Arc<dyn ConnectionListener>)?;

        let engine = RdfsInferencer::new(Arc::clone(&tracker));
        engine.add_axiom_statements(&connection)?;

        Ok(Self {
            connection,
            tracker,
            engine: Mutex::new(engine),
        })
    }

    /// The wrapped connection
    pub fn connection(&self) -> &Connection<S> {
        &self.connection
    }

    /// True until `close` completes
    pub fn is_open(&self) -> StoreResult<bool> {
        self.connection.is_open()
    }

    /// Close the wrapped connection
    pub fn close(&self) -> StoreResult<()> {
        self.connection.close()
    }

    /// Run the entailment fixpoint over the accumulated delta
    pub fn flush(&self) -> StoreResult<()> {
        self.engine()?.flush_updates(&self.connection)
    }

    /// Flush updates, then commit the underlying transaction
    pub fn commit(&self) -> StoreResult<()> {
        self.engine()?.flush_updates(&self.connection)?;
        self.connection.commit()
    }

    /// Discard the tracked delta and roll back the underlying transaction
    pub fn rollback(&self) -> StoreResult<()> {
        self.tracker.reset();
        self.connection.rollback()
    }

    /// Add an explicitly asserted statement
    pub fn add_statement(
        &self,
        subject: Resource,
        predicate: NamedNode,
        object: Value,
        contexts: &[Option<Resource>],
    ) -> StoreResult<()> {
        self.connection
            .add_statement(subject, predicate, object, contexts)
    }

    /// Remove matching explicitly asserted statements
    pub fn remove_statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&NamedNode>,
        object: Option<&Value>,
        contexts: &[Option<Resource>],
    ) -> StoreResult<usize> {
        self.connection
            .remove_statements(subject, predicate, object, contexts)
    }

    /// Remove all explicitly asserted statements in the given contexts
    pub fn clear(&self, contexts: &[Option<Resource>]) -> StoreResult<usize> {
        self.connection.clear(contexts)
    }

    /// Get matching statements, flushing pending inference first
    pub fn get_statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&NamedNode>,
        object: Option<&Value>,
        include_inferred: bool,
        contexts: &[Option<Resource>],
    ) -> StoreResult<TrackedIteration<Statement>> {
        self.flush()?;
        self.connection
            .get_statements(subject, predicate, object, include_inferred, contexts)
    }

    /// Evaluate a query, flushing pending inference first
    pub fn evaluate(
        &self,
        query: &PatternQuery,
        bindings: &BindingSet,
        include_inferred: bool,
    ) -> StoreResult<TrackedIteration<BindingSet>> {
        self.flush()?;
        self.connection.evaluate(query, bindings, include_inferred)
    }

    /// Number of explicitly asserted statements, flushing first
    pub fn size(&self, contexts: &[Option<Resource>]) -> StoreResult<u64> {
        self.flush()?;
        self.connection.size(contexts)
    }

    /// Identifiers of all named contexts, flushing pending inference first
    pub fn get_context_ids(&self) -> StoreResult<TrackedIteration<Resource>> {
        self.flush()?;
        self.connection.get_context_ids()
    }

    /// Get the namespace IRI bound to a prefix
    pub fn get_namespace(&self, prefix: &str) -> StoreResult<Option<String>> {
        self.connection.get_namespace(prefix)
    }

    /// All (prefix, namespace IRI) bindings
    pub fn get_namespaces(&self) -> StoreResult<TrackedIteration<(String, String)>> {
        self.connection.get_namespaces()
    }

    /// Bind a prefix to a namespace IRI
    pub fn set_namespace(&self, prefix: &str, name: &str) -> StoreResult<()> {
        self.connection.set_namespace(prefix, name)
    }

    /// Remove a prefix binding
    pub fn remove_namespace(&self, prefix: &str) -> StoreResult<()> {
        self.connection.remove_namespace(prefix)
    }

    /// Remove all prefix bindings
    pub fn clear_namespaces(&self) -> StoreResult<()> {
        self.connection.clear_namespaces()
    }

    fn engine(&self) -> StoreResult<MutexGuard<'_, RdfsInferencer>> {
        self.engine
            .lock()
            .map_err(|_| StoreError::Lock("inference engine lock poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rdf_predicate(suffix: &str) -> NamedNode {
        NamedNode::new(&format!("{}{}", CONTAINER_MEMBERSHIP_PREFIX, suffix)).unwrap()
    }

    #[test]
    fn test_container_membership_property_detection() {
        assert!(is_container_membership_property(&rdf_predicate("1")));
        assert!(is_container_membership_property(&rdf_predicate("42")));

        // No leading zeros, no empty suffix, digits only
        assert!(!is_container_membership_property(&rdf_predicate("01")));
        assert!(!is_container_membership_property(&rdf_predicate("1a")));
        assert!(!is_container_membership_property(
            &NamedNode::new("http://www.w3.org/1999/02/22-rdf-syntax-ns#type").unwrap()
        ));
        assert!(!is_container_membership_property(
            &NamedNode::new("http://example.org/_1").unwrap()
        ));
    }
}

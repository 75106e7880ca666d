use crate::serialization::Snapshot;
use crate::{Connection, ConnectionId, Element, ElementId, GraphStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Validation severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationSeverity {
    Info,    // informational, the board is usable as is
    Warning, // suspicious but loadable
    Error,   // breaks a store invariant
}

/// Validation issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
    pub affected_elements: Vec<ElementId>,
    pub affected_connections: Vec<ConnectionId>,
    pub issue_type: ValidationIssueType,
}

/// Types of validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssueType {
    /// An element's connection sets disagree with the connection table
    IndexMismatch,
    DanglingConnection,
    SelfLoop,
    DuplicatePair,
    IsolatedElement,
    Cycle,
}

/// Complete validation result
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a new empty validation result
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == ValidationSeverity::Error)
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == ValidationSeverity::Warning)
    }

    /// Get all errors
    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.with_severity(ValidationSeverity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.with_severity(ValidationSeverity::Warning)
    }

    /// Get all info messages
    pub fn info(&self) -> Vec<&ValidationIssue> {
        self.with_severity(ValidationSeverity::Info)
    }

    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    fn with_severity(&self, severity: ValidationSeverity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .collect()
    }
}

/// Where the graph under validation came from. A live store must never hold
/// a broken connection or a stale index, while an import drops the former
/// and rebuilds the latter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Store,
    Snapshot,
}

impl Source {
    fn broken_connection(self) -> ValidationSeverity {
        match self {
            Source::Store => ValidationSeverity::Error,
            Source::Snapshot => ValidationSeverity::Warning,
        }
    }

    fn stale_index(self) -> ValidationSeverity {
        match self {
            Source::Store => ValidationSeverity::Error,
            Source::Snapshot => ValidationSeverity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Active,
    Done,
}

/// Borrowed element and connection tables with the lookups every check
/// needs, built in one pass over the connections
struct GraphView<'a> {
    source: Source,
    elements: BTreeMap<ElementId, &'a Element>,
    connections: BTreeMap<ConnectionId, &'a Connection>,
    incoming: HashMap<ElementId, BTreeSet<ConnectionId>>,
    outgoing: HashMap<ElementId, BTreeSet<ConnectionId>>,
    /// Targets reachable in one step, without self-loops or dangling ends
    successors: HashMap<ElementId, Vec<ElementId>>,
    /// Every id named as an endpoint, present or not
    endpoints: HashSet<ElementId>,
}

impl<'a> GraphView<'a> {
    fn new<E, C>(source: Source, elements: E, connections: C) -> Self
    where
        E: Iterator<Item = &'a Element>,
        C: Iterator<Item = &'a Connection>,
    {
        let elements: BTreeMap<ElementId, &Element> = elements.map(|e| (e.id, e)).collect();
        let connections: BTreeMap<ConnectionId, &Connection> =
            connections.map(|c| (c.id, c)).collect();

        let mut incoming: HashMap<ElementId, BTreeSet<ConnectionId>> = HashMap::new();
        let mut outgoing: HashMap<ElementId, BTreeSet<ConnectionId>> = HashMap::new();
        let mut successors: HashMap<ElementId, Vec<ElementId>> = HashMap::new();
        let mut endpoints = HashSet::new();

        for connection in connections.values() {
            outgoing.entry(connection.from).or_default().insert(connection.id);
            incoming.entry(connection.to).or_default().insert(connection.id);
            endpoints.insert(connection.from);
            endpoints.insert(connection.to);

            if !connection.is_self_loop()
                && elements.contains_key(&connection.from)
                && elements.contains_key(&connection.to)
            {
                successors.entry(connection.from).or_default().push(connection.to);
            }
        }

        Self {
            source,
            elements,
            connections,
            incoming,
            outgoing,
            successors,
            endpoints,
        }
    }
}

/// Validator for board graphs
pub struct Validator;

impl Validator {
    /// Run all validations on a store. Broken connections and stale indexes
    /// are errors here.
    pub fn validate(store: &GraphStore) -> ValidationResult {
        Self::run(&GraphView::new(
            Source::Store,
            store.elements(),
            store.connections(),
        ))
    }

    /// Run all validations on a snapshot before it is loaded. Connections the
    /// import will drop are warnings and stale indexes, which the import
    /// rebuilds, are informational.
    pub fn validate_snapshot(snapshot: &Snapshot) -> ValidationResult {
        Self::run(&GraphView::new(
            Source::Snapshot,
            snapshot.elements.values(),
            snapshot.connections.values(),
        ))
    }

    fn run(view: &GraphView<'_>) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::check_connections(view, &mut result);
        Self::check_indexes(view, &mut result);

        // Isolated elements are fine on a board, but worth pointing out
        if view.elements.len() > 1 {
            let isolated: Vec<ElementId> = view
                .elements
                .keys()
                .filter(|id| !view.endpoints.contains(id))
                .copied()
                .collect();
            if !isolated.is_empty() {
                result.add_issue(ValidationIssue {
                    severity: ValidationSeverity::Info,
                    message: format!("{} element(s) have no connections.", isolated.len()),
                    affected_elements: isolated,
                    affected_connections: vec![],
                    issue_type: ValidationIssueType::IsolatedElement,
                });
            }
        }

        if let Some(cycle_elements) = Self::detect_cycle(view) {
            result.add_issue(ValidationIssue {
                severity: ValidationSeverity::Info,
                message: format!(
                    "Connections form a cycle through {} element(s).",
                    cycle_elements.len()
                ),
                affected_elements: cycle_elements,
                affected_connections: vec![],
                issue_type: ValidationIssueType::Cycle,
            });
        }

        result
    }

    /// Endpoint existence, self-loops and repeated ordered pairs
    fn check_connections(view: &GraphView<'_>, result: &mut ValidationResult) {
        let severity = view.source.broken_connection();
        let mut pairs: HashMap<(ElementId, ElementId), ConnectionId> = HashMap::new();

        for connection in view.connections.values() {
            let missing: Vec<ElementId> = [connection.from, connection.to]
                .into_iter()
                .filter(|id| !view.elements.contains_key(id))
                .collect();
            if !missing.is_empty() {
                result.add_issue(ValidationIssue {
                    severity,
                    message: format!(
                        "{} points at missing element(s): {}",
                        connection.id,
                        join_ids(&missing)
                    ),
                    affected_elements: missing,
                    affected_connections: vec![connection.id],
                    issue_type: ValidationIssueType::DanglingConnection,
                });
            }

            if connection.is_self_loop() {
                result.add_issue(ValidationIssue {
                    severity,
                    message: format!("{} connects {} to itself", connection.id, connection.from),
                    affected_elements: vec![connection.from],
                    affected_connections: vec![connection.id],
                    issue_type: ValidationIssueType::SelfLoop,
                });
            }

            if let Some(first) = pairs.insert(connection.endpoints(), connection.id) {
                result.add_issue(ValidationIssue {
                    severity,
                    message: format!(
                        "{} repeats {} ({} -> {})",
                        connection.id, first, connection.from, connection.to
                    ),
                    affected_elements: vec![connection.from, connection.to],
                    affected_connections: vec![first, connection.id],
                    issue_type: ValidationIssueType::DuplicatePair,
                });
            }
        }
    }

    /// Each element's incoming/outgoing sets must equal what the connection
    /// table says about it
    fn check_indexes(view: &GraphView<'_>, result: &mut ValidationResult) {
        let none = BTreeSet::new();

        for element in view.elements.values() {
            let expected_out = view.outgoing.get(&element.id).unwrap_or(&none);
            let expected_in = view.incoming.get(&element.id).unwrap_or(&none);

            let mut mismatched: Vec<ConnectionId> = element
                .outgoing_connections
                .symmetric_difference(expected_out)
                .chain(element.incoming_connections.symmetric_difference(expected_in))
                .copied()
                .collect();
            mismatched.sort();
            mismatched.dedup();

            if !mismatched.is_empty() {
                result.add_issue(ValidationIssue {
                    severity: view.source.stale_index(),
                    message: format!(
                        "{} has stale connection entries: {}",
                        element.id,
                        join_ids(&mismatched)
                    ),
                    affected_elements: vec![element.id],
                    affected_connections: mismatched,
                    issue_type: ValidationIssueType::IndexMismatch,
                });
            }
        }
    }

    /// Find one cycle with a depth-first walk. The walk keeps its own stack
    /// of (element, next successor index) frames, so chain length is bounded
    /// by memory rather than by the thread stack.
    fn detect_cycle(view: &GraphView<'_>) -> Option<Vec<ElementId>> {
        let no_successors = Vec::new();
        let mut visits: HashMap<ElementId, Visit> = HashMap::new();

        for &root in view.elements.keys() {
            if visits.contains_key(&root) {
                continue;
            }

            visits.insert(root, Visit::Active);
            let mut path: Vec<(ElementId, usize)> = vec![(root, 0)];

            while let Some(frame) = path.last_mut() {
                let (node, next) = *frame;
                let successors = view.successors.get(&node).unwrap_or(&no_successors);

                let Some(&target) = successors.get(next) else {
                    visits.insert(node, Visit::Done);
                    path.pop();
                    continue;
                };
                frame.1 += 1;

                match visits.get(&target) {
                    None => {
                        visits.insert(target, Visit::Active);
                        path.push((target, 0));
                    }
                    Some(Visit::Active) => {
                        let start = path.iter().position(|(id, _)| *id == target).unwrap_or(0);
                        return Some(path[start..].iter().map(|(id, _)| *id).collect());
                    }
                    Some(Visit::Done) => {}
                }
            }
        }

        None
    }
}

fn join_ids<T: ToString>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extension trait for GraphStore to add validation
pub trait ValidatedStore {
    /// Validate the store
    fn validate(&self) -> ValidationResult;

    /// Get elements with validation issues
    fn elements_with_issues(&self, result: &ValidationResult) -> HashMap<ElementId, ValidationSeverity>;
}

impl ValidatedStore for GraphStore {
    fn validate(&self) -> ValidationResult {
        Validator::validate(self)
    }

    fn elements_with_issues(&self, result: &ValidationResult) -> HashMap<ElementId, ValidationSeverity> {
        let mut elements = HashMap::new();

        for issue in &result.issues {
            for element_id in &issue.affected_elements {
                elements
                    .entry(*element_id)
                    .and_modify(|severity| {
                        // Keep the highest severity
                        if issue.severity as u8 > *severity as u8 {
                            *severity = issue.severity;
                        }
                    })
                    .or_insert(issue.severity);
            }
        }

        elements
    }
}

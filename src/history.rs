use crate::{Connection, ElementId, Element, GraphStore, Point, Size};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::VecDeque;

/// Default number of retained entries
pub const DEFAULT_CAPACITY: usize = 50;

/// One element's position change within a move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    pub id: ElementId,
    pub from: Point,
    pub to: Point,
}

impl Move {
    fn reversed(self) -> Self {
        Self {
            id: self.id,
            from: self.to,
            to: self.from,
        }
    }
}

/// A store mutation carrying enough before/after state to invert it exactly
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Element brought into existence, together with the connections that
    /// come back with it (non-empty only when reversing a deletion)
    Created {
        element: Element,
        connections: Vec<Connection>,
    },

    /// Element removed with every connection that was cascaded away
    Deleted {
        element: Element,
        connections: Vec<Connection>,
    },

    ContentChanged {
        id: ElementId,
        old: String,
        new: String,
    },

    /// Final positions of one completed move or drag gesture
    Moved { moves: Vec<Move> },

    Resized {
        id: ElementId,
        old: Size,
        new: Size,
    },

    ConnectionCreated { connection: Connection },

    ConnectionDeleted { connection: Connection },
}

impl Operation {
    /// The operation that undoes this one
    pub fn invert(&self) -> Operation {
        match self {
            Operation::Created {
                element,
                connections,
            } => Operation::Deleted {
                element: element.clone(),
                connections: connections.clone(),
            },
            Operation::Deleted {
                element,
                connections,
            } => Operation::Created {
                element: element.clone(),
                connections: connections.clone(),
            },
            Operation::ContentChanged { id, old, new } => Operation::ContentChanged {
                id: *id,
                old: new.clone(),
                new: old.clone(),
            },
            Operation::Moved { moves } => Operation::Moved {
                moves: moves.iter().rev().map(|m| m.reversed()).collect(),
            },
            Operation::Resized { id, old, new } => Operation::Resized {
                id: *id,
                old: *new,
                new: *old,
            },
            Operation::ConnectionCreated { connection } => Operation::ConnectionDeleted {
                connection: connection.clone(),
            },
            Operation::ConnectionDeleted { connection } => Operation::ConnectionCreated {
                connection: connection.clone(),
            },
        }
    }

    /// Apply the forward effect to the store. Stale ids are skipped.
    pub fn apply(&self, store: &mut GraphStore) {
        match self {
            Operation::Created {
                element,
                connections,
            } => {
                if !store.insert_element(element.clone()) {
                    warn!("cannot restore {}: id already present", element.id);
                    return;
                }
                for connection in connections {
                    if !store.insert_connection(connection.clone()) {
                        warn!(
                            "skipped restoring {} ({} -> {})",
                            connection.id, connection.from, connection.to
                        );
                    }
                }
            }
            Operation::Deleted { element, .. } => {
                store.remove_element(element.id);
            }
            Operation::ContentChanged { id, new, .. } => {
                store.set_content(*id, new.clone());
            }
            Operation::Moved { moves } => {
                for m in moves {
                    store.set_position(m.id, m.to);
                }
            }
            Operation::Resized { id, new, .. } => {
                store.set_size(*id, *new);
            }
            Operation::ConnectionCreated { connection } => {
                if !store.insert_connection(connection.clone()) {
                    warn!("skipped re-creating {}", connection.id);
                }
            }
            Operation::ConnectionDeleted { connection } => {
                store.remove_connection(connection.id);
            }
        }
    }

    /// Short name for logs and menus
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Created { .. } => "create",
            Operation::Deleted { .. } => "delete",
            Operation::ContentChanged { .. } => "edit",
            Operation::Moved { .. } => "move",
            Operation::Resized { .. } => "resize",
            Operation::ConnectionCreated { .. } => "connect",
            Operation::ConnectionDeleted { .. } => "disconnect",
        }
    }
}

/// A recorded operation with the time it happened
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
}

impl HistoryEntry {
    pub fn new(operation: Operation) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
        }
    }
}

/// Bounded linear undo/redo log: invertible records with a cursor.
/// Recording after an undo discards the abandoned redo branch; going past
/// capacity drops the oldest entry.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,

    /// Number of entries currently applied; the cursor is `applied - 1`
    applied: usize,

    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A log keeping at most `capacity` entries (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            applied: 0,
            capacity,
        }
    }

    /// Append an already-applied operation, discarding any redo branch
    pub fn record(&mut self, operation: Operation) {
        let dropped = self.entries.len() - self.applied;
        if dropped > 0 {
            debug!("discarding {} redo entries", dropped);
        }
        self.entries.truncate(self.applied);
        self.entries.push_back(HistoryEntry::new(operation));

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.applied = self.entries.len();
    }

    /// Revert the entry at the cursor and step back
    pub fn undo(&mut self, store: &mut GraphStore) -> Option<&HistoryEntry> {
        if self.applied == 0 {
            return None;
        }
        self.applied -= 1;

        let entry = &self.entries[self.applied];
        debug!("undo {}", entry.operation.label());
        entry.operation.invert().apply(store);
        Some(entry)
    }

    /// Step forward and re-apply the entry at the new cursor
    pub fn redo(&mut self, store: &mut GraphStore) -> Option<&HistoryEntry> {
        let entry = self.entries.get(self.applied)?;
        debug!("redo {}", entry.operation.label());
        entry.operation.apply(store);
        self.applied += 1;
        self.entries.get(self.applied - 1)
    }

    /// Index of the last applied entry, `None` when nothing can be undone
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    /// Entry the next undo would revert
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.cursor().and_then(|i| self.entries.get(i))
    }

    /// Entry the next redo would re-apply
    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.applied)
    }

    /// Number of retained entries, applied or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.entries.clear();
        self.applied = 0;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

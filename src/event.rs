use crate::{ConnectionId, ElementId, ElementKind, Point, Size};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A change record emitted by the store, with timestamp.
/// The render layer drains these and re-reads the touched entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEvent {
    pub timestamp: DateTime<Utc>,
    pub event: EventType,
}

impl GraphEvent {
    /// Create a new event with the current timestamp
    pub fn new(event: EventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// What changed in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventType {
    ElementCreated {
        id: ElementId,
        kind: ElementKind,
        position: Point,
    },

    ElementDeleted {
        id: ElementId,
    },

    ElementMoved {
        id: ElementId,
        position: Point,
    },

    ElementResized {
        id: ElementId,
        size: Size,
    },

    ContentChanged {
        id: ElementId,
    },

    ConnectionCreated {
        id: ConnectionId,
        from: ElementId,
        to: ElementId,
    },

    ConnectionDeleted {
        id: ConnectionId,
        from: ElementId,
        to: ElementId,
    },

    /// Everything was removed at once
    Cleared,

    /// Store replaced by a bulk load; redraw from scratch
    Loaded {
        elements: usize,
        connections: usize,
    },
}

impl EventType {
    /// Element touched by this change, if any
    pub fn element(&self) -> Option<ElementId> {
        match self {
            EventType::ElementCreated { id, .. }
            | EventType::ElementDeleted { id }
            | EventType::ElementMoved { id, .. }
            | EventType::ElementResized { id, .. }
            | EventType::ContentChanged { id } => Some(*id),
            EventType::ConnectionCreated { .. }
            | EventType::ConnectionDeleted { .. }
            | EventType::Cleared
            | EventType::Loaded { .. } => None,
        }
    }

    /// Whether the render layer must redraw everything
    pub fn requires_full_redraw(&self) -> bool {
        matches!(self, EventType::Cleared | EventType::Loaded { .. })
    }
}

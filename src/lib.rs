// Idea Canvas - Core Library

pub mod autosave;
pub mod board;
pub mod config;
pub mod connection;
pub mod element;
pub mod event;
pub mod history;
pub mod id_generator;
pub mod selection;
pub mod serialization;
pub mod store;
pub mod templates;
pub mod validation;
pub mod viewport;

// Re-export main types for convenience
pub use autosave::Autosave;
pub use board::{Board, BoardSummary};
pub use config::{EditorConfig, ZoomLimits};
pub use connection::{Connection, ConnectionStyle};
pub use element::{Element, ElementKind, ElementSeed, Point, Rectangle, Size};
pub use event::{EventType, GraphEvent};
pub use history::{History, HistoryEntry, Move, Operation};
pub use id_generator::{ConnectionId, ElementId, IdAllocator};
pub use selection::Selection;
pub use serialization::{ImportReport, Manifest, Project, Snapshot};
pub use store::{BulkLoadReport, GraphStore, RemovedElement};
pub use templates::Template;
pub use validation::{
    ValidatedStore, ValidationIssue, ValidationIssueType, ValidationResult, ValidationSeverity,
    Validator,
};
pub use viewport::Viewport;

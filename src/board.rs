use crate::config::EditorConfig;
use crate::history::{History, Move, Operation};
use crate::serialization::{ImportReport, Snapshot};
use crate::validation::{ValidationSeverity, Validator};
use crate::templates::Template;
use crate::{
    Connection, ConnectionId, Element, ElementId, ElementKind, ElementSeed, GraphEvent, GraphStore,
    Point, Selection, Size, Viewport,
};
use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt;

/// Positions captured when a drag gesture starts
#[derive(Debug, Clone)]
struct DragGesture {
    origins: Vec<(ElementId, Point)>,
}

/// An idea board: graph store, undo log and the view state acting on them.
///
/// Every mutating call goes through the graph store and, when it changed
/// something, appends one history entry. Unknown ids and invariant-breaking
/// requests are silent no-ops reported through `bool`/`Option` results.
#[derive(Debug, Clone)]
pub struct Board {
    title: String,
    store: GraphStore,
    history: History,
    selection: Selection,
    viewport: Viewport,
    config: EditorConfig,

    /// Element whose content is being edited
    editing: Option<ElementId>,

    drag: Option<DragGesture>,
}

impl Board {
    /// Create an empty board with default settings
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    /// Create an empty board. Invalid settings are reported and used as
    /// far as they go: zoom limits never panic, capacity is at least one.
    pub fn with_config(config: EditorConfig) -> Self {
        if let Err(err) = config.validate() {
            warn!("editor config is invalid: {:#}", err);
        }
        Self {
            title: config.default_title.clone(),
            store: GraphStore::new(),
            history: History::with_capacity(config.history_capacity),
            selection: Selection::new(),
            viewport: Viewport::default(),
            config,
            editing: None,
            drag: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Read access to the underlying store
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // ========== Element Operations ==========

    /// Create an element at a canvas position. Only fails once the element
    /// id counter is exhausted.
    pub fn create_element(
        &mut self,
        kind: ElementKind,
        position: Point,
        seed: ElementSeed,
    ) -> Option<Element> {
        let Some(id) = self.store.allocate_element_id() else {
            warn!("element ids exhausted, nothing created");
            return None;
        };
        let element = Element::new(id, kind, position, seed);

        self.store.insert_element(element.clone());
        debug!("created {} ({})", id, kind);
        self.record(Operation::Created {
            element: element.clone(),
            connections: Vec::new(),
        });

        Some(element)
    }

    /// Delete an element and its connections as a single undo step
    pub fn delete_element(&mut self, id: ElementId) -> bool {
        let Some(removed) = self.store.remove_element(id) else {
            return false;
        };

        debug!(
            "deleted {} with {} connection(s)",
            id,
            removed.connections.len()
        );
        self.record(Operation::Deleted {
            element: removed.element,
            connections: removed.connections,
        });
        self.prune_view_state();
        true
    }

    /// Delete every selected element, one undo step each
    pub fn delete_selected(&mut self) -> usize {
        let ids: Vec<ElementId> = self.selection.ids().collect();
        let deleted = ids.into_iter().filter(|id| self.delete_element(*id)).count();
        self.selection.clear();
        deleted
    }

    /// Replace an element's content. Unchanged content records nothing.
    pub fn update_element_content(&mut self, id: ElementId, content: impl Into<String>) -> bool {
        let content = content.into();
        let Some(element) = self.store.element(id) else {
            return false;
        };
        if element.content == content {
            return false;
        }

        let old = self.store.set_content(id, content.clone()).unwrap_or_default();
        debug!("edited {}", id);
        self.record(Operation::ContentChanged {
            id,
            old,
            new: content,
        });
        true
    }

    /// Move one element to its final position as a single undo step
    pub fn move_element(&mut self, id: ElementId, position: Point) -> bool {
        let Some(from) = self.store.element(id).map(|e| e.position) else {
            return false;
        };
        if from == position {
            return false;
        }

        self.store.set_position(id, position);
        self.record(Operation::Moved {
            moves: vec![Move {
                id,
                from,
                to: position,
            }],
        });
        true
    }

    pub fn resize_element(&mut self, id: ElementId, size: Size) -> bool {
        let Some(old) = self.store.element(id).map(|e| e.size) else {
            return false;
        };
        if old == size {
            return false;
        }

        self.store.set_size(id, size);
        self.record(Operation::Resized { id, old, new: size });
        true
    }

    // ========== Connection Operations ==========

    /// Connect two elements. Returns the existing connection for a repeated
    /// ordered pair, and `None` for a self-loop or an unknown endpoint.
    pub fn create_connection(&mut self, from: ElementId, to: ElementId) -> Option<Connection> {
        if from == to {
            return None;
        }
        if let Some(existing) = self.store.find_connection(from, to) {
            return Some(existing.clone());
        }
        if !self.store.contains_element(from) || !self.store.contains_element(to) {
            return None;
        }

        let Some(id) = self.store.allocate_connection_id() else {
            warn!("connection ids exhausted, {} -> {} not connected", from, to);
            return None;
        };
        let connection = Connection::new(id, from, to);
        if !self.store.insert_connection(connection.clone()) {
            return None;
        }

        debug!("connected {} -> {} as {}", from, to, connection.id);
        self.record(Operation::ConnectionCreated {
            connection: connection.clone(),
        });
        Some(connection)
    }

    /// Remove a single connection as one undo step
    pub fn delete_connection(&mut self, id: ConnectionId) -> bool {
        let Some(connection) = self.store.remove_connection(id) else {
            return false;
        };

        debug!("disconnected {}", id);
        self.record(Operation::ConnectionDeleted { connection });
        true
    }

    // ========== Edit Session ==========

    /// Start editing an element's content
    pub fn begin_edit(&mut self, id: ElementId) -> bool {
        if !self.store.contains_element(id) {
            return false;
        }
        self.editing = Some(id);
        true
    }

    /// Finish the edit session with the text the user left behind
    pub fn end_edit(&mut self, content: impl Into<String>) -> bool {
        match self.editing.take() {
            Some(id) => self.update_element_content(id, content),
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<ElementId> {
        self.editing
    }

    // ========== Drag Gesture ==========

    /// Start dragging the current selection
    pub fn begin_drag(&mut self) -> bool {
        if self.drag.is_some() {
            self.end_drag();
        }

        let origins: Vec<(ElementId, Point)> = self
            .selection
            .ids()
            .filter_map(|id| self.store.element(id).map(|e| (id, e.position)))
            .collect();
        if origins.is_empty() {
            return false;
        }

        self.drag = Some(DragGesture { origins });
        true
    }

    /// Move dragged elements to their start positions plus `offset`.
    /// Applied live; nothing is recorded until `end_drag`.
    pub fn update_drag(&mut self, offset: Point) {
        let Some(drag) = &self.drag else {
            return;
        };
        for (id, origin) in &drag.origins {
            self.store.set_position(*id, origin.offset(offset));
        }
    }

    /// Commit the gesture as one undo step holding the final positions
    pub fn end_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };

        let moves: Vec<Move> = drag
            .origins
            .into_iter()
            .filter_map(|(id, from)| {
                let to = self.store.element(id)?.position;
                (to != from).then_some(Move { id, from, to })
            })
            .collect();
        if moves.is_empty() {
            return false;
        }

        debug!("dragged {} element(s)", moves.len());
        self.record(Operation::Moved { moves });
        true
    }

    /// Put dragged elements back where the gesture started
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            for (id, origin) in drag.origins {
                self.store.set_position(id, origin);
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // ========== Undo / Redo ==========

    pub fn undo(&mut self) -> bool {
        self.finish_gestures();
        let undone = self.history.undo(&mut self.store).is_some();
        if undone {
            self.prune_view_state();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.finish_gestures();
        let redone = self.history.redo(&mut self.store).is_some();
        if redone {
            self.prune_view_state();
        }
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========== Queries ==========

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.store.element(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.store.connection(id)
    }

    /// Element under a canvas-space point
    pub fn hit_test(&self, point: Point) -> Option<&Element> {
        self.store.hit_test(point)
    }

    /// Element under a screen-space point
    pub fn hit_test_screen(&self, point: Point) -> Option<&Element> {
        self.store.hit_test(self.viewport.screen_to_canvas(point))
    }

    /// Counts handed to the chat helper as board context
    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            title: self.title.clone(),
            elements: self.store.element_count(),
            connections: self.store.connection_count(),
            kinds: self.store.kind_counts(),
        }
    }

    /// Change records for the render layer
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        self.store.drain_events()
    }

    // ========== Selection ==========

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select an existing element
    pub fn select(&mut self, id: ElementId) -> bool {
        self.store.contains_element(id) && self.selection.select(id)
    }

    pub fn deselect(&mut self, id: ElementId) -> bool {
        self.selection.deselect(id)
    }

    pub fn toggle_selection(&mut self, id: ElementId) -> bool {
        if !self.store.contains_element(id) {
            return false;
        }
        self.selection.toggle(id)
    }

    pub fn select_only(&mut self, id: ElementId) {
        if self.store.contains_element(id) {
            self.selection.select_only(id);
        }
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.store);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ========== Viewport ==========

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.viewport.set_zoom(zoom, &self.config.zoom);
    }

    pub fn zoom_at(&mut self, zoom: f32, anchor: Point) {
        self.viewport.zoom_at(zoom, anchor, &self.config.zoom);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in(&self.config.zoom);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out(&self.config.zoom);
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.viewport.pan_by(dx, dy);
    }

    /// Frame every element inside a container of the given screen size
    pub fn fit_to_screen(&mut self, container: Size) -> bool {
        let Some(bounds) = self.store.bounds() else {
            return false;
        };
        self.viewport
            .fit_to(bounds, container, self.config.fit_padding, &self.config.zoom);
        true
    }

    // ========== Whole-Board Operations ==========

    /// Empty the board. History goes too, since it describes the old contents.
    pub fn clear(&mut self) {
        self.store.clear();
        self.history.clear();
        self.selection.clear();
        self.editing = None;
        self.drag = None;
    }

    /// Replace the board contents with a starter layout
    pub fn load_template(&mut self, template: Template) {
        self.clear();
        template.build(self);
        info!(
            "loaded {} template: {} elements, {} connections",
            template,
            self.store.element_count(),
            self.store.connection_count()
        );
    }

    /// Capture the board for persistence
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            title: self.title.clone(),
            elements: self.store.elements().map(|e| (e.id, e.clone())).collect(),
            connections: self.store.connections().map(|c| (c.id, c.clone())).collect(),
            viewport: self.viewport,
            saved_at: Utc::now(),
        }
    }

    /// Replace the board with a parsed snapshot. Connection indexes are
    /// rebuilt and connections breaking an invariant are dropped.
    pub fn restore(&mut self, snapshot: Snapshot) -> ImportReport {
        let issues = Validator::validate_snapshot(&snapshot).issues;
        for issue in &issues {
            match issue.severity {
                ValidationSeverity::Warning | ValidationSeverity::Error => {
                    warn!("{}", issue.message)
                }
                ValidationSeverity::Info => debug!("{}", issue.message),
            }
        }

        let Snapshot {
            title,
            elements,
            connections,
            viewport,
            ..
        } = snapshot;
        let (store, load) = GraphStore::bulk_load(elements.into_values(), connections.into_values());

        for connection in &load.dropped_connections {
            debug!(
                "dropped {} ({} -> {}) while loading",
                connection.id, connection.from, connection.to
            );
        }
        for id in &load.skipped_elements {
            warn!("skipped {} while loading", id);
        }

        self.store = store;
        self.history.clear();
        self.selection.clear();
        self.editing = None;
        self.drag = None;
        self.title = if title.trim().is_empty() {
            self.config.default_title.clone()
        } else {
            title
        };
        let zoom = if viewport.zoom.is_finite() { viewport.zoom } else { 1.0 };
        self.viewport = Viewport::new(viewport.offset, self.config.zoom.clamp(zoom));

        info!(
            "loaded board {:?}: {} elements, {} connections",
            self.title,
            self.store.element_count(),
            self.store.connection_count()
        );
        let mut report = ImportReport::new(&self.store, load);
        report.issues = issues;
        report
    }

    /// Parse a JSON snapshot and load it. On a parse error the board is
    /// left exactly as it was.
    pub fn import_snapshot(&mut self, json: &str) -> Result<ImportReport> {
        let decoded = Snapshot::decode(json)?;
        for id in &decoded.duplicate_elements {
            warn!("{} appears more than once, keeping the first", id);
        }

        let mut report = self.restore(decoded.snapshot);
        report.malformed_connections = decoded.malformed_connections;
        report.skipped_elements.extend(decoded.duplicate_elements);
        report.dropped_connections.extend(decoded.duplicate_connections);
        Ok(report)
    }

    // ========== Internal ==========

    fn record(&mut self, operation: Operation) {
        self.history.record(operation);
    }

    /// Commit a running drag and drop an open edit session
    fn finish_gestures(&mut self) {
        self.end_drag();
        self.editing = None;
    }

    /// Forget view state pointing at elements that no longer exist
    fn prune_view_state(&mut self) {
        self.selection.retain_existing(&self.store);
        if let Some(id) = self.editing {
            if !self.store.contains_element(id) {
                self.editing = None;
            }
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Element and connection counts for a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSummary {
    pub title: String,
    pub elements: usize,
    pub connections: usize,
    pub kinds: BTreeMap<ElementKind, usize>,
}

impl fmt::Display for BoardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Board {:?} has {} element(s) and {} connection(s)",
            self.title, self.elements, self.connections
        )?;
        if !self.kinds.is_empty() {
            let kinds: Vec<String> = self
                .kinds
                .iter()
                .map(|(kind, count)| format!("{}: {}", kind, count))
                .collect();
            write!(f, " ({})", kinds.join(", "))?;
        }
        Ok(())
    }
}

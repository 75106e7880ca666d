use crate::{
    Connection, ConnectionId, Element, ElementId, ElementKind, EventType, GraphEvent, IdAllocator,
    Point, Rectangle, Size,
};
use log::trace;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Canvas graph containing all elements and connections.
/// Primitives keep the per-element connection indexes in step with the
/// connection table and record no undo history.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// Elements keyed by id; id order is creation order
    elements: BTreeMap<ElementId, Element>,

    connections: BTreeMap<ConnectionId, Connection>,

    /// Ordered (from, to) pair to connection, at most one per pair
    pairs: HashMap<(ElementId, ElementId), ConnectionId>,

    ids: IdAllocator,

    /// Change records not yet drained by the render layer
    events: Vec<GraphEvent>,
}

/// What `remove_element` took out of the store
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedElement {
    /// The element as it was, indexes included
    pub element: Element,

    /// Cascaded connections in id order
    pub connections: Vec<Connection>,
}

/// Entities a bulk load refused to take
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkLoadReport {
    /// Elements whose id was already taken by an earlier entry
    pub skipped_elements: Vec<ElementId>,

    /// Dangling, self-looping, duplicate-pair or duplicate-id connections
    pub dropped_connections: Vec<Connection>,
}

impl BulkLoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_elements.is_empty() && self.dropped_connections.is_empty()
    }
}

impl GraphStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that allocates ids from the given allocator
    pub fn with_allocator(ids: IdAllocator) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    /// Build a store from untrusted parts. Connection indexes are rebuilt
    /// from the connections themselves; whatever breaks an invariant is left
    /// out and reported.
    pub fn bulk_load<E, C>(elements: E, connections: C) -> (Self, BulkLoadReport)
    where
        E: IntoIterator<Item = Element>,
        C: IntoIterator<Item = Connection>,
    {
        let mut store = Self::new();
        let mut report = BulkLoadReport::default();

        let mut elements: Vec<Element> = elements.into_iter().collect();
        elements.sort_by_key(|e| e.id);
        let mut connections: Vec<Connection> = connections.into_iter().collect();
        connections.sort_by_key(|c| c.id);

        // Dropped ids stay burned too
        store.ids.observe(
            elements.iter().map(|e| e.id),
            connections.iter().map(|c| c.id),
        );

        for element in elements {
            let id = element.id;
            if !store.insert_element(element) {
                report.skipped_elements.push(id);
            }
        }

        for connection in connections {
            if !store.insert_connection(connection.clone()) {
                report.dropped_connections.push(connection);
            }
        }

        store.events.clear();
        store.log_event(EventType::Loaded {
            elements: store.elements.len(),
            connections: store.connections.len(),
        });

        (store, report)
    }

    // ========== Id Allocation ==========

    pub fn allocate_element_id(&mut self) -> Option<ElementId> {
        self.ids.next_element()
    }

    pub fn allocate_connection_id(&mut self) -> Option<ConnectionId> {
        self.ids.next_connection()
    }

    // ========== Element Primitives ==========

    /// Insert an element under its own id. Its connection indexes are
    /// cleared; only `insert_connection` fills them. Refused for a taken id
    /// or one past the id limit.
    pub fn insert_element(&mut self, mut element: Element) -> bool {
        if self.elements.contains_key(&element.id) || !element.id.within_limit() {
            return false;
        }

        element.clear_connections();
        self.ids
            .observe([element.id], std::iter::empty::<ConnectionId>());

        trace!("insert {} ({}) at {:?}", element.id, element.kind, element.position);
        self.log_event(EventType::ElementCreated {
            id: element.id,
            kind: element.kind,
            position: element.position,
        });
        self.elements.insert(element.id, element);
        true
    }

    /// Remove an element and every connection touching it
    pub fn remove_element(&mut self, id: ElementId) -> Option<RemovedElement> {
        let snapshot = self.elements.get(&id)?.clone();

        let touching: BTreeSet<ConnectionId> = snapshot.connection_ids().collect();
        let connections = touching
            .into_iter()
            .filter_map(|conn_id| self.remove_connection(conn_id))
            .collect();

        self.elements.remove(&id);
        trace!("remove {}", id);
        self.log_event(EventType::ElementDeleted { id });

        Some(RemovedElement {
            element: snapshot,
            connections,
        })
    }

    /// Replace content, returning the previous value
    pub fn set_content(&mut self, id: ElementId, content: String) -> Option<String> {
        let element = self.elements.get_mut(&id)?;
        let old = std::mem::replace(&mut element.content, content);
        self.log_event(EventType::ContentChanged { id });
        Some(old)
    }

    /// Move an element, returning its previous position
    pub fn set_position(&mut self, id: ElementId, position: Point) -> Option<Point> {
        let element = self.elements.get_mut(&id)?;
        let old = std::mem::replace(&mut element.position, position);
        self.log_event(EventType::ElementMoved { id, position });
        Some(old)
    }

    /// Resize an element, returning its previous size
    pub fn set_size(&mut self, id: ElementId, size: Size) -> Option<Size> {
        let element = self.elements.get_mut(&id)?;
        let old = std::mem::replace(&mut element.size, size);
        self.log_event(EventType::ElementResized { id, size });
        Some(old)
    }

    // ========== Connection Primitives ==========

    /// Insert a connection and register it on both endpoints.
    /// Refused for a taken or out-of-range id, a self-loop, a missing
    /// endpoint or a taken ordered pair.
    pub fn insert_connection(&mut self, connection: Connection) -> bool {
        if self.connections.contains_key(&connection.id)
            || !connection.id.within_limit()
            || connection.is_self_loop()
            || !self.elements.contains_key(&connection.from)
            || !self.elements.contains_key(&connection.to)
            || self.pairs.contains_key(&connection.endpoints())
        {
            return false;
        }

        let Connection { id, from, to, .. } = connection;
        if let Some(source) = self.elements.get_mut(&from) {
            source.outgoing_connections.insert(id);
        }
        if let Some(target) = self.elements.get_mut(&to) {
            target.incoming_connections.insert(id);
        }
        self.ids.observe(std::iter::empty::<ElementId>(), [id]);
        self.pairs.insert((from, to), id);
        self.connections.insert(id, connection);

        trace!("connect {}: {} -> {}", id, from, to);
        self.log_event(EventType::ConnectionCreated { id, from, to });
        true
    }

    /// Remove a connection from the table and from both endpoint indexes
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.remove(&id)?;

        self.pairs.remove(&connection.endpoints());
        if let Some(source) = self.elements.get_mut(&connection.from) {
            source.outgoing_connections.remove(&id);
        }
        if let Some(target) = self.elements.get_mut(&connection.to) {
            target.incoming_connections.remove(&id);
        }

        trace!("disconnect {}", id);
        self.log_event(EventType::ConnectionDeleted {
            id,
            from: connection.from,
            to: connection.to,
        });
        Some(connection)
    }

    /// Remove everything. Id counters keep running.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.connections.clear();
        self.pairs.clear();
        self.log_event(EventType::Cleared);
    }

    // ========== Queries ==========

    /// Get an element by ID
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains_element(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// All elements in creation order
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Element> + '_ {
        self.elements.values()
    }

    pub fn element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.keys().copied()
    }

    /// Get a connection by ID
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// All connections in creation order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.values()
    }

    /// Connection for an ordered pair, if one exists
    pub fn find_connection(&self, from: ElementId, to: ElementId) -> Option<&Connection> {
        self.pairs
            .get(&(from, to))
            .and_then(|id| self.connections.get(id))
    }

    /// Connections starting at an element
    pub fn outgoing(&self, id: ElementId) -> Vec<&Connection> {
        self.elements
            .get(&id)
            .map(|e| {
                e.outgoing_connections
                    .iter()
                    .filter_map(|c| self.connections.get(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Connections ending at an element
    pub fn incoming(&self, id: ElementId) -> Vec<&Connection> {
        self.elements
            .get(&id)
            .map(|e| {
                e.incoming_connections
                    .iter()
                    .filter_map(|c| self.connections.get(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Last element in creation order whose bounds contain the point.
    /// This is only the topmost one when render order follows creation order.
    pub fn hit_test(&self, point: Point) -> Option<&Element> {
        self.elements.values().rev().find(|e| e.contains_point(point))
    }

    /// Bounding box around every element
    pub fn bounds(&self) -> Option<Rectangle> {
        self.elements
            .values()
            .map(Element::bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Number of elements per kind
    pub fn kind_counts(&self) -> BTreeMap<ElementKind, usize> {
        let mut counts = BTreeMap::new();
        for element in self.elements.values() {
            *counts.entry(element.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Count elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Count connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    // ========== Change Records ==========

    fn log_event(&mut self, event: EventType) {
        self.events.push(GraphEvent::new(event));
    }

    /// Pending change records
    pub fn events(&self) -> &[GraphEvent] {
        &self.events
    }

    /// Hand pending change records to the caller
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementSeed;

    fn add(store: &mut GraphStore, kind: ElementKind, x: f32, y: f32) -> ElementId {
        let id = store.allocate_element_id().unwrap();
        store.insert_element(Element::new(id, kind, Point::new(x, y), ElementSeed::new()));
        id
    }

    fn connect(store: &mut GraphStore, from: ElementId, to: ElementId) -> Option<ConnectionId> {
        let id = store.allocate_connection_id()?;
        store
            .insert_connection(Connection::new(id, from, to))
            .then_some(id)
    }

    #[test]
    fn test_store_creation() {
        let store = GraphStore::new();
        assert_eq!(store.element_count(), 0);
        assert_eq!(store.connection_count(), 0);
        assert!(store.bounds().is_none());
    }

    #[test]
    fn test_element_crud() {
        let mut store = GraphStore::new();
        let id = add(&mut store, ElementKind::Note, 0.0, 0.0);

        assert_eq!(store.element(id).unwrap().kind, ElementKind::Note);

        assert_eq!(store.set_content(id, "Updated".into()), Some("New note...".into()));
        assert_eq!(store.element(id).unwrap().content, "Updated");

        assert_eq!(store.set_position(id, Point::new(5.0, 6.0)), Some(Point::new(0.0, 0.0)));
        assert_eq!(store.set_size(id, Size::new(1.0, 2.0)), Some(Size::new(200.0, 120.0)));

        let removed = store.remove_element(id).unwrap();
        assert_eq!(removed.element.content, "Updated");
        assert!(removed.connections.is_empty());
        assert_eq!(store.element_count(), 0);
    }

    #[test]
    fn test_unknown_ids_are_no_ops() {
        let mut store = GraphStore::new();
        let ghost = ElementId::new(99);

        assert!(store.remove_element(ghost).is_none());
        assert!(store.set_content(ghost, "x".into()).is_none());
        assert!(store.set_position(ghost, Point::default()).is_none());
        assert!(store.remove_connection(ConnectionId::new(99)).is_none());
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_connection_indexes() {
        let mut store = GraphStore::new();
        let a = add(&mut store, ElementKind::Note, 0.0, 0.0);
        let b = add(&mut store, ElementKind::Idea, 100.0, 100.0);
        let conn = connect(&mut store, a, b).unwrap();

        assert!(store.element(a).unwrap().outgoing_connections.contains(&conn));
        assert!(store.element(b).unwrap().incoming_connections.contains(&conn));
        assert_eq!(store.find_connection(a, b).unwrap().id, conn);
        assert!(store.find_connection(b, a).is_none());
        assert_eq!(store.outgoing(a).len(), 1);
        assert_eq!(store.incoming(b).len(), 1);

        store.remove_connection(conn).unwrap();
        assert!(store.element(a).unwrap().outgoing_connections.is_empty());
        assert!(store.element(b).unwrap().incoming_connections.is_empty());
        assert!(store.find_connection(a, b).is_none());
    }

    #[test]
    fn test_rejected_connections() {
        let mut store = GraphStore::new();
        let a = add(&mut store, ElementKind::Note, 0.0, 0.0);
        let b = add(&mut store, ElementKind::Note, 300.0, 0.0);

        assert!(connect(&mut store, a, a).is_none());
        assert!(connect(&mut store, a, ElementId::new(42)).is_none());
        assert!(connect(&mut store, a, b).is_some());
        assert!(connect(&mut store, a, b).is_none());
        assert!(connect(&mut store, b, a).is_some());
        assert_eq!(store.connection_count(), 2);
    }

    #[test]
    fn test_remove_element_cascades() {
        let mut store = GraphStore::new();
        let a = add(&mut store, ElementKind::Note, 0.0, 0.0);
        let b = add(&mut store, ElementKind::Note, 300.0, 0.0);
        let c = add(&mut store, ElementKind::Note, 600.0, 0.0);
        let ab = connect(&mut store, a, b).unwrap();
        let cb = connect(&mut store, c, b).unwrap();
        let ba = connect(&mut store, b, a).unwrap();

        let removed = store.remove_element(b).unwrap();
        let cascaded: Vec<ConnectionId> = removed.connections.iter().map(|c| c.id).collect();

        assert_eq!(cascaded, vec![ab, cb, ba]);
        assert_eq!(removed.element.incoming_connections.len(), 2);
        assert_eq!(store.connection_count(), 0);
        assert!(!store.element(a).unwrap().is_connected());
        assert!(!store.element(c).unwrap().is_connected());
    }

    #[test]
    fn test_insert_element_clears_indexes() {
        let mut store = GraphStore::new();
        let mut element = Element::new(
            ElementId::new(5),
            ElementKind::Shape,
            Point::default(),
            ElementSeed::new(),
        );
        element.incoming_connections.insert(ConnectionId::new(1));

        assert!(store.insert_element(element.clone()));
        assert!(!store.insert_element(element));
        assert!(!store.element(ElementId::new(5)).unwrap().is_connected());
        assert_eq!(store.allocate_element_id(), Some(ElementId::new(6)));
    }

    #[test]
    fn test_ids_never_reused() {
        let mut store = GraphStore::new();
        let a = add(&mut store, ElementKind::Note, 0.0, 0.0);
        store.remove_element(a);
        let b = add(&mut store, ElementKind::Note, 0.0, 0.0);
        assert_ne!(a, b);

        store.clear();
        let c = add(&mut store, ElementKind::Note, 0.0, 0.0);
        assert!(c > b);
    }

    #[test]
    fn test_hit_test_prefers_last_created() {
        let mut store = GraphStore::new();
        let below = add(&mut store, ElementKind::Note, 0.0, 0.0);
        let above = add(&mut store, ElementKind::Note, 100.0, 50.0);

        assert_eq!(store.hit_test(Point::new(150.0, 100.0)).unwrap().id, above);
        assert_eq!(store.hit_test(Point::new(10.0, 10.0)).unwrap().id, below);
        assert!(store.hit_test(Point::new(1000.0, 1000.0)).is_none());
    }

    #[test]
    fn test_bounds_and_kind_counts() {
        let mut store = GraphStore::new();
        add(&mut store, ElementKind::Note, 0.0, 0.0);
        add(&mut store, ElementKind::Idea, 300.0, 200.0);
        add(&mut store, ElementKind::Idea, -100.0, 0.0);

        assert_eq!(store.bounds(), Some(Rectangle::new(-100.0, 0.0, 600.0, 320.0)));
        let counts = store.kind_counts();
        assert_eq!(counts[&ElementKind::Idea], 2);
        assert_eq!(counts[&ElementKind::Note], 1);
    }

    #[test]
    fn test_bulk_load_drops_bad_connections() {
        let a = Element::new(ElementId::new(1), ElementKind::Note, Point::default(), ElementSeed::new());
        let b = Element::new(ElementId::new(2), ElementKind::Note, Point::default(), ElementSeed::new());
        let connections = vec![
            Connection::new(ConnectionId::new(1), a.id, b.id),
            Connection::new(ConnectionId::new(2), a.id, ElementId::new(7)),
            Connection::new(ConnectionId::new(3), a.id, a.id),
            Connection::new(ConnectionId::new(4), a.id, b.id),
        ];

        let (mut store, report) = GraphStore::bulk_load(vec![a, b], connections);

        assert_eq!(store.connection_count(), 1);
        let dropped: Vec<u64> = report.dropped_connections.iter().map(|c| c.id.value()).collect();
        assert_eq!(dropped, vec![2, 3, 4]);
        assert!(!report.is_clean());
        assert_eq!(store.allocate_connection_id(), Some(ConnectionId::new(5)));
        assert_eq!(store.allocate_element_id(), Some(ElementId::new(3)));

        let events = store.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].event,
            EventType::Loaded {
                elements: 2,
                connections: 1
            }
        );
    }

    #[test]
    fn test_bulk_load_refuses_ids_past_the_limit() {
        let huge = ElementId::new(u64::MAX);
        let elements = vec![
            Element::new(ElementId::new(1), ElementKind::Note, Point::default(), ElementSeed::new()),
            Element::new(huge, ElementKind::Note, Point::default(), ElementSeed::new()),
        ];
        let connections = vec![Connection::new(ConnectionId::new(u64::MAX), ElementId::new(1), huge)];

        let (mut store, report) = GraphStore::bulk_load(elements, connections);

        assert_eq!(report.skipped_elements, vec![huge]);
        assert_eq!(report.dropped_connections.len(), 1);
        assert_eq!(store.element_count(), 1);
        assert_eq!(store.allocate_element_id(), Some(ElementId::new(2)));
        assert_eq!(store.allocate_connection_id(), Some(ConnectionId::new(1)));
    }

    #[test]
    fn test_change_records() {
        let mut store = GraphStore::new();
        let a = add(&mut store, ElementKind::Note, 0.0, 0.0);
        let b = add(&mut store, ElementKind::Note, 0.0, 0.0);
        connect(&mut store, a, b);
        store.remove_element(a);

        let kinds: Vec<&'static str> = store
            .drain_events()
            .iter()
            .map(|e| match e.event {
                EventType::ElementCreated { .. } => "created",
                EventType::ElementDeleted { .. } => "deleted",
                EventType::ConnectionCreated { .. } => "connected",
                EventType::ConnectionDeleted { .. } => "disconnected",
                _ => "other",
            })
            .collect();

        assert_eq!(kinds, vec!["created", "created", "connected", "disconnected", "deleted"]);
        assert!(store.events().is_empty());
    }
}

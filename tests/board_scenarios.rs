#[path = "fixtures/sample_boards.rs"]
mod sample_boards;

use assert_matches::assert_matches;
use idea_canvas::{ConnectionId, ElementKind, ElementSeed, Operation, Point, Template};
use pretty_assertions::assert_eq;
use sample_boards::{create_bounded_board, create_hub_board, create_two_element_board};
use std::collections::BTreeSet;

fn ids(values: &[ConnectionId]) -> BTreeSet<ConnectionId> {
    values.iter().copied().collect()
}

#[test]
fn test_delete_and_undo_restores_connections() {
    let (mut board, a, b) = create_two_element_board();

    let conn = board.create_connection(a, b).unwrap();
    assert_eq!(board.store().connection_count(), 1);
    assert_eq!(board.element(a).unwrap().outgoing_connections, ids(&[conn.id]));
    assert_eq!(board.element(b).unwrap().incoming_connections, ids(&[conn.id]));

    assert!(board.delete_element(a));
    assert_eq!(board.store().connection_count(), 0);
    assert!(board.element(b).unwrap().incoming_connections.is_empty());

    assert!(board.undo());
    let restored = board.element(a).unwrap();
    assert_eq!(restored.kind, ElementKind::Note);
    assert_eq!(restored.position, Point::new(0.0, 0.0));
    assert_eq!(board.store().connection_count(), 1);
    assert_eq!(board.connection(conn.id), Some(&conn));
    assert_eq!(board.element(b).unwrap().incoming_connections, ids(&[conn.id]));
}

#[test]
fn test_hub_delete_restores_every_spoke() {
    let (mut board, hub, spokes) = create_hub_board(4);
    let before: Vec<_> = board.store().connections().cloned().collect();

    board.delete_element(hub);
    assert_eq!(board.store().connection_count(), 0);
    assert_matches!(
        &board.history().peek_undo().unwrap().operation,
        Operation::Deleted { connections, .. } if connections.len() == 4
    );

    board.undo();
    let after: Vec<_> = board.store().connections().cloned().collect();
    assert_eq!(after, before);
    for spoke in spokes {
        assert_eq!(board.element(spoke).unwrap().incoming_connections.len(), 1);
    }
}

#[test]
fn test_disconnect_undo_redo() {
    let (mut board, a, b) = create_two_element_board();
    let conn = board.create_connection(a, b).unwrap();

    assert!(board.delete_connection(conn.id));
    assert_matches!(
        &board.history().peek_undo().unwrap().operation,
        Operation::ConnectionDeleted { connection } if connection.id == conn.id
    );

    // Undo brings the connection back with its id and both index entries
    assert!(board.undo());
    assert_eq!(board.connection(conn.id), Some(&conn));
    assert_eq!(board.element(a).unwrap().outgoing_connections, ids(&[conn.id]));
    assert_eq!(board.element(b).unwrap().incoming_connections, ids(&[conn.id]));

    assert!(board.redo());
    assert!(board.connection(conn.id).is_none());
    assert!(board.element(a).unwrap().outgoing_connections.is_empty());
    assert!(!board.can_redo());

    // Walking back past the deletion and the creation leaves two bare elements
    assert!(board.undo());
    assert!(board.undo());
    assert_eq!(board.store().connection_count(), 0);
    assert_eq!(board.store().element_count(), 2);
    assert!(board.redo());
    assert!(board.redo());
    assert_eq!(board.store().connection_count(), 0);
}

#[test]
fn test_duplicate_connection_returns_existing() {
    let (mut board, a, b) = create_two_element_board();

    let first = board.create_connection(a, b).unwrap();
    let second = board.create_connection(a, b).unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(board.store().connection_count(), 1);

    // The reverse direction is a different ordered pair
    let reverse = board.create_connection(b, a).unwrap();
    assert_ne!(reverse.id, first.id);
    assert_eq!(board.store().connection_count(), 2);
}

#[test]
fn test_self_loop_is_ignored() {
    let (mut board, a, _) = create_two_element_board();
    let history_len = board.history().len();

    assert!(board.create_connection(a, a).is_none());
    assert_eq!(board.store().connection_count(), 0);
    assert_eq!(board.history().len(), history_len);
}

#[test]
fn test_same_content_appends_nothing() {
    let (mut board, a, _) = create_two_element_board();
    board.update_element_content(a, "same text");
    let history_len = board.history().len();

    assert!(!board.update_element_content(a, "same text"));
    assert_eq!(board.history().len(), history_len);
}

#[test]
fn test_new_operation_discards_redo() {
    let (mut board, a, _) = create_two_element_board();
    board.update_element_content(a, "draft");

    board.undo();
    assert!(board.can_redo());

    board.create_element(ElementKind::Shape, Point::new(500.0, 0.0), ElementSeed::new());
    assert!(!board.can_redo());
    assert!(!board.redo());
    assert_eq!(board.element(a).unwrap().content, "New note...");
}

#[test]
fn test_unknown_ids_are_no_ops() {
    let (mut board, a, _) = create_two_element_board();
    let ghost = idea_canvas::ElementId::new(404);
    let history_len = board.history().len();

    assert!(!board.delete_element(ghost));
    assert!(!board.update_element_content(ghost, "x"));
    assert!(!board.move_element(ghost, Point::new(1.0, 1.0)));
    assert!(board.create_connection(a, ghost).is_none());
    assert!(!board.delete_connection(ConnectionId::new(404)));
    assert_eq!(board.history().len(), history_len);
}

#[test]
fn test_history_bound() {
    let mut board = create_bounded_board(5);
    for i in 0..8 {
        board.create_element(ElementKind::Note, Point::new(i as f32 * 10.0, 0.0), ElementSeed::new());
    }
    assert_eq!(board.history().len(), 5);

    let mut undone = 0;
    while board.undo() {
        undone += 1;
    }
    assert_eq!(undone, 5);
    // The three evicted creations stay on the board
    assert_eq!(board.store().element_count(), 3);
}

#[test]
fn test_ids_are_never_reused() {
    let (mut board, a, b) = create_two_element_board();
    board.delete_element(b);

    let c = board
        .create_element(ElementKind::Idea, Point::new(0.0, 300.0), ElementSeed::new())
        .unwrap();
    assert_ne!(c.id, b);
    assert_eq!(c.id.to_string(), "element_3");

    let conn = board.create_connection(a, c.id).unwrap();
    board.delete_connection(conn.id);
    let again = board.create_connection(a, c.id).unwrap();
    assert_ne!(again.id, conn.id);
}

#[test]
fn test_each_board_counts_ids_from_one() {
    let (first, _, _) = create_two_element_board();
    let (second, _, _) = create_two_element_board();

    let first_ids: Vec<_> = first.store().element_ids().collect();
    let second_ids: Vec<_> = second.store().element_ids().collect();
    assert_eq!(first_ids, second_ids);
}

#[test]
fn test_template_then_edit() {
    let mut board = create_bounded_board(50);
    board.load_template(Template::Research);

    let hub = board.store().elements().next().unwrap().id;
    board.begin_edit(hub);
    board.end_edit("Climate adaptation");

    assert_eq!(board.element(hub).unwrap().content, "Climate adaptation");
    board.undo();
    assert_eq!(board.element(hub).unwrap().content, "Main research topic");
}

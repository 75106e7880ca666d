#[path = "fixtures/sample_boards.rs"]
mod sample_boards;

use idea_canvas::{
    Board, ConnectionId, ElementId, ElementKind, ElementSeed, EventType, Point, Project, Size,
    Snapshot, ValidationIssueType, ValidationSeverity, Validator,
};
use pretty_assertions::assert_eq;
use sample_boards::{create_hub_board, legacy_snapshot_json};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_legacy_snapshot_import() {
    let mut board = Board::new();
    let report = board.import_snapshot(legacy_snapshot_json()).unwrap();

    assert_eq!(report.elements, 2);
    assert_eq!(report.connections, 1);
    assert_eq!(report.dropped_connections, vec![ConnectionId::new(3)]);
    assert!(!report.is_clean());

    assert_eq!(board.title(), "Legacy board");
    assert_eq!(board.viewport().offset, Point::new(-50.0, 25.0));
    assert_eq!(board.viewport().zoom, 1.2);

    let first = board.element(ElementId::new(1)).unwrap();
    assert_eq!(first.kind, ElementKind::Note);
    assert_eq!(first.content, "First");
    assert_eq!(first.size, Size::new(220.0, 140.0));
    assert_eq!(first.outgoing_connections.len(), 1);
    assert_eq!(
        board.element(ElementId::new(4)).unwrap().content,
        "https://example.com"
    );

    // The dangling connection was reported before the load dropped it
    assert!(report.issues.iter().any(|i| {
        i.issue_type == ValidationIssueType::DanglingConnection
            && i.severity == ValidationSeverity::Warning
            && i.affected_connections == vec![ConnectionId::new(3)]
    }));
    assert!(Validator::validate(board.store()).is_valid());

    // Counters resume past every id seen, dropped ones included
    let next = board
        .create_element(ElementKind::Idea, Point::new(0.0, 0.0), ElementSeed::new())
        .unwrap();
    assert_eq!(next.id, ElementId::new(5));
    let conn = board.create_connection(next.id, ElementId::new(1)).unwrap();
    assert_eq!(conn.id, ConnectionId::new(4));
}

#[test]
fn test_import_clears_history_and_clamps_zoom() {
    let (mut source, _, _) = create_hub_board(2);
    let mut snapshot = source.export_snapshot();
    snapshot.viewport.zoom = 40.0;

    let mut board = Board::new();
    board.create_element(ElementKind::Shape, Point::new(0.0, 0.0), ElementSeed::new());
    let report = board.restore(snapshot);

    assert!(report.is_clean());
    assert!(!board.can_undo());
    assert_eq!(board.viewport().zoom, 5.0);
    assert_eq!(board.store().element_count(), 3);

    let events = board.drain_events();
    assert_eq!(
        events.last().unwrap().event,
        EventType::Loaded {
            elements: 3,
            connections: 2
        }
    );
    assert!(source.drain_events().len() > 1);
}

#[test]
fn test_unparsable_snapshot_leaves_board_alone() {
    let (mut board, hub, _) = create_hub_board(3);
    board.set_title("Keep me");

    assert!(board.import_snapshot("not json at all").is_err());
    assert!(board.import_snapshot(r#"{ "elements": 12 }"#).is_err());

    assert_eq!(board.title(), "Keep me");
    assert_eq!(board.store().element_count(), 4);
    assert!(board.element(hub).is_some());
    assert!(board.can_undo());
}

#[test]
fn test_project_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let project = Project::create(&temp_dir.path().join("board")).unwrap();

    let (mut board, _, _) = create_hub_board(3);
    board.set_title("Roadmap");
    board.pan_by(30.0, 40.0);
    project.save(&board).unwrap();
    project.append_events(&board.drain_events()).unwrap();

    let reopened = Project::open(project.root_dir()).unwrap();
    let mut loaded = Board::new();
    let report = reopened.load_into(&mut loaded).unwrap();

    assert!(report.is_clean());
    assert_eq!(loaded.title(), "Roadmap");
    assert_eq!(loaded.viewport(), board.viewport());
    assert_eq!(
        loaded.store().elements().cloned().collect::<Vec<_>>(),
        board.store().elements().cloned().collect::<Vec<_>>()
    );
    assert_eq!(
        loaded.store().connections().cloned().collect::<Vec<_>>(),
        board.store().connections().cloned().collect::<Vec<_>>()
    );

    let events = reopened.load_events().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e.event, EventType::ConnectionCreated { .. })));
}

#[test]
fn test_saved_file_is_readable_json() {
    let temp_dir = TempDir::new().unwrap();
    let project = Project::create(&temp_dir.path().join("board")).unwrap();
    let (board, _, _) = create_hub_board(1);
    project.save(&board).unwrap();

    let text = fs::read_to_string(project.board_path()).unwrap();
    let snapshot = Snapshot::from_json(&text).unwrap();
    assert_eq!(snapshot.elements.len(), 2);
    assert_eq!(snapshot.connections.len(), 1);

    let manifest = project.load_manifest().unwrap();
    assert!(manifest.modified >= manifest.created);
}

#[test]
fn test_corrupted_events_file() {
    let temp_dir = TempDir::new().unwrap();
    let project = Project::create(&temp_dir.path().join("board")).unwrap();

    let (mut board, _, _) = create_hub_board(1);
    let events = board.drain_events();
    project.append_events(&events).unwrap();

    let mut text = fs::read_to_string(project.events_path()).unwrap();
    text.push_str("{\"broken\": \n");
    fs::write(project.events_path(), text).unwrap();

    // The readable records survive and the torn line is skipped
    let loaded = project.load_events().unwrap();
    assert_eq!(loaded.len(), events.len());

    // Appending after a torn line still yields readable records
    project.append_events(&events).unwrap();
    assert_eq!(project.load_events().unwrap().len(), events.len() * 2);
}

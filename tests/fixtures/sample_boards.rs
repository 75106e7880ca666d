// Helper functions to build test boards with various configurations
#![allow(dead_code)]

use idea_canvas::{Board, EditorConfig, ElementId, ElementKind, ElementSeed, Point};

/// Note A at (0,0) and idea B at (100,100)
pub fn create_two_element_board() -> (Board, ElementId, ElementId) {
    let mut board = Board::new();

    let a = board
        .create_element(ElementKind::Note, Point::new(0.0, 0.0), ElementSeed::new())
        .unwrap();
    let b = board
        .create_element(ElementKind::Idea, Point::new(100.0, 100.0), ElementSeed::new())
        .unwrap();

    (board, a.id, b.id)
}

/// A hub with `spokes` notes connected from it
pub fn create_hub_board(spokes: usize) -> (Board, ElementId, Vec<ElementId>) {
    let mut board = Board::new();

    let hub = board
        .create_element(ElementKind::Idea, Point::new(400.0, 300.0), ElementSeed::content("Hub"))
        .unwrap()
        .id;

    let ids = (0..spokes)
        .map(|i| {
            let spoke = board
                .create_element(
                    ElementKind::Note,
                    Point::new(i as f32 * 250.0, 0.0),
                    ElementSeed::content(format!("Spoke {}", i + 1)),
                )
                .unwrap()
                .id;
            board.create_connection(hub, spoke);
            spoke
        })
        .collect();

    (board, hub, ids)
}

/// An empty board whose history keeps only `capacity` entries
pub fn create_bounded_board(capacity: usize) -> Board {
    Board::with_config(EditorConfig {
        history_capacity: capacity,
        ..EditorConfig::default()
    })
}

/// A board as the older web canvas saved it: `type` instead of `kind`,
/// content and size under `data`, a `connections` block per element,
/// canvasOffset/zoomLevel/lastSaved, and one dangling connection
pub fn legacy_snapshot_json() -> &'static str {
    r#"{
        "title": "Legacy board",
        "elements": {
            "element_1": {
                "id": "element_1",
                "type": "note",
                "position": { "x": 10, "y": 20 },
                "data": { "content": "First", "width": 220, "height": 140 },
                "connections": { "incoming": {}, "outgoing": {} }
            },
            "element_4": {
                "id": "element_4",
                "type": "link",
                "position": { "x": 300, "y": 20 },
                "data": { "content": "https://example.com", "width": 200, "height": 120 },
                "connections": { "incoming": {}, "outgoing": {} },
                "someUiFlag": true
            }
        },
        "connections": {
            "connection_2": { "id": "connection_2", "from": "element_1", "to": "element_4", "type": "arrow" },
            "connection_3": { "id": "connection_3", "from": "element_1", "to": "element_9", "type": "arrow" }
        },
        "canvasOffset": { "x": -50, "y": 25 },
        "zoomLevel": 1.2,
        "lastSaved": "2024-05-04T12:30:00Z"
    }"#
}

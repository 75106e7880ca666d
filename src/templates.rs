use crate::{Board, ElementKind, ElementSeed, Point};
use std::fmt;
use std::str::FromStr;

/// Starter layouts offered for an empty board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Research,
    Brainstorm,
    Project,
    MindMap,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Research,
        Template::Brainstorm,
        Template::Project,
        Template::MindMap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Template::Research => "research",
            Template::Brainstorm => "brainstorm",
            Template::Project => "project",
            Template::MindMap => "mind-map",
        }
    }

    /// Add the layout to the board through regular recorded operations
    pub(crate) fn build(self, board: &mut Board) {
        match self {
            Template::Research => build_research(board),
            Template::Brainstorm | Template::MindMap => build_brainstorm(board),
            Template::Project => build_project(board),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown template: {}", s))
    }
}

/// A central topic fanned out to four corners
fn build_research(board: &mut Board) {
    let center = Point::new(400.0, 300.0);
    let at = |dx: f32, dy: f32| Point::new(center.x + dx, center.y + dy);

    let Some(topic) = board.create_element(
        ElementKind::Idea,
        at(-100.0, -60.0),
        ElementSeed::content("Main research topic"),
    ) else {
        return;
    };
    let branches = [
        (ElementKind::Document, at(-250.0, -150.0), "Literature review"),
        (ElementKind::Note, at(100.0, -150.0), "Methodology"),
        (ElementKind::Document, at(-250.0, 50.0), "Results"),
        (ElementKind::Idea, at(100.0, 50.0), "Conclusion"),
    ];

    for (kind, position, text) in branches {
        if let Some(branch) = board.create_element(kind, position, ElementSeed::content(text)) {
            board.create_connection(topic.id, branch.id);
        }
    }
}

/// Six notes on a circle around a central idea
fn build_brainstorm(board: &mut Board) {
    let center = Point::new(400.0, 250.0);
    let radius = 200.0_f32;

    let Some(central) = board.create_element(
        ElementKind::Idea,
        Point::new(center.x - 100.0, center.y),
        ElementSeed::content("Central idea"),
    ) else {
        return;
    };

    for index in 0..6 {
        let angle = (index as f32 * 60.0).to_radians();
        let position = Point::new(
            center.x + angle.cos() * radius - 100.0,
            center.y + angle.sin() * radius,
        );
        let seed = ElementSeed::content(format!("Sub-idea {}", index + 1));
        if let Some(idea) = board.create_element(ElementKind::Note, position, seed) {
            board.create_connection(central.id, idea.id);
        }
    }
}

/// Four phases chained left to right
fn build_project(board: &mut Board) {
    let phases = [
        ("Planning", 100.0),
        ("Execution", 300.0),
        ("Monitoring", 500.0),
        ("Delivery", 700.0),
    ];

    let mut previous = None;
    for (name, x) in phases {
        let Some(phase) = board.create_element(
            ElementKind::Document,
            Point::new(x, 150.0),
            ElementSeed::content(name),
        ) else {
            return;
        };
        if let Some(prev) = previous {
            board.create_connection(prev, phase.id);
        }
        previous = Some(phase.id);
    }
}

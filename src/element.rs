use crate::{ConnectionId, ElementId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A freeform node placed on the canvas
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Store-assigned identifier, never reused
    pub id: ElementId,

    /// Kind only picks defaults and display affordances
    pub kind: ElementKind,

    /// Top-left corner in canvas space
    pub position: Point,

    pub size: Size,

    /// Free-form text payload
    #[serde(default)]
    pub content: String,

    /// Connections ending at this element (back-references, not ownership)
    #[serde(default)]
    pub incoming_connections: BTreeSet<ConnectionId>,

    /// Connections starting at this element
    #[serde(default)]
    pub outgoing_connections: BTreeSet<ConnectionId>,
}

impl Element {
    /// Create an element from kind defaults with the seed merged on top
    pub fn new(id: ElementId, kind: ElementKind, position: Point, seed: ElementSeed) -> Self {
        Self {
            id,
            kind,
            position,
            size: seed.size.unwrap_or_else(|| kind.default_size()),
            content: seed
                .content
                .unwrap_or_else(|| kind.default_content().to_string()),
            incoming_connections: BTreeSet::new(),
            outgoing_connections: BTreeSet::new(),
        }
    }

    /// Bounding box in canvas space
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
        )
    }

    /// Check whether a canvas point lies inside the element (edges included)
    pub fn contains_point(&self, point: Point) -> bool {
        self.bounds().contains_point(point.x, point.y)
    }

    /// Every connection touching this element, outgoing first
    pub fn connection_ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.outgoing_connections
            .iter()
            .chain(self.incoming_connections.iter())
            .copied()
    }

    /// Whether any connection touches this element
    pub fn is_connected(&self) -> bool {
        !self.incoming_connections.is_empty() || !self.outgoing_connections.is_empty()
    }

    /// Drop both connection indexes (the store rebuilds them)
    pub(crate) fn clear_connections(&mut self) {
        self.incoming_connections.clear();
        self.outgoing_connections.clear();
    }
}

/// Optional data overriding kind defaults at creation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSeed {
    pub content: Option<String>,
    pub size: Option<Size>,
}

impl ElementSeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with explicit content
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            size: None,
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }
}

/// Closed set of element kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Note,
    Idea,
    Image,
    Document,
    Link,
    Shape,
}

/// Default width and height shared by every kind on the board
const DEFAULT_WIDTH: f32 = 200.0;
const DEFAULT_HEIGHT: f32 = 120.0;

impl ElementKind {
    pub const ALL: [ElementKind; 6] = [
        ElementKind::Note,
        ElementKind::Idea,
        ElementKind::Image,
        ElementKind::Document,
        ElementKind::Link,
        ElementKind::Shape,
    ];

    /// Placeholder content for a fresh element
    pub fn default_content(self) -> &'static str {
        match self {
            ElementKind::Note => "New note...",
            ElementKind::Idea => "New idea...",
            ElementKind::Image => "Click to add an image",
            ElementKind::Document => "New document...",
            ElementKind::Link => "https://example.com",
            ElementKind::Shape => "Shape",
        }
    }

    pub fn default_size(self) -> Size {
        match self {
            ElementKind::Note
            | ElementKind::Idea
            | ElementKind::Image
            | ElementKind::Document
            | ElementKind::Link
            | ElementKind::Shape => Size::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
        }
    }

    /// Lowercase name used in snapshots
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Note => "note",
            ElementKind::Idea => "idea",
            ElementKind::Image => "image",
            ElementKind::Document => "document",
            ElementKind::Link => "link",
            ElementKind::Shape => "shape",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown element kind: {}", s))
    }
}

/// A point in canvas or screen space
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate by a delta
    pub fn offset(self, delta: Point) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Rectangle representing position and size on canvas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the right edge of the rectangle
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the bottom edge of the rectangle
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if this rectangle contains a point
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rectangle::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

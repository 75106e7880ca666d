use crate::store::BulkLoadReport;
use crate::validation::ValidationIssue;
use crate::{
    Board, Connection, ConnectionId, Element, ElementId, ElementKind, GraphEvent, GraphStore,
    Point, Size, Viewport,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Serialized board: store contents plus viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub title: String,
    pub elements: BTreeMap<ElementId, Element>,
    pub connections: BTreeMap<ConnectionId, Connection>,
    pub viewport: Viewport,
    pub saved_at: DateTime<Utc>,
}

/// Lenient reading form. Connections are decoded one by one so a malformed
/// entry costs only itself; the older `canvasOffset`/`zoomLevel` layout is
/// accepted when `viewport` is missing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    elements: BTreeMap<String, ElementDocument>,
    #[serde(default)]
    connections: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    viewport: Option<Viewport>,
    #[serde(default)]
    canvas_offset: Option<Point>,
    #[serde(default)]
    zoom_level: Option<f32>,
    #[serde(default, alias = "lastSaved")]
    saved_at: Option<DateTime<Utc>>,
}

/// Element as found on disk. Boards saved by the older web canvas use
/// `type` for the kind and keep content and size under `data`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementDocument {
    id: ElementId,
    #[serde(alias = "type")]
    kind: ElementKind,
    position: Point,
    #[serde(default)]
    size: Option<Size>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    data: Option<LegacyElementData>,
    #[serde(default)]
    incoming_connections: BTreeSet<ConnectionId>,
    #[serde(default)]
    outgoing_connections: BTreeSet<ConnectionId>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyElementData {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    height: Option<f32>,
}

impl ElementDocument {
    fn into_element(self) -> Element {
        let data = self.data.unwrap_or_default();
        let fallback = self.kind.default_size();
        let size = self.size.unwrap_or_else(|| {
            Size::new(
                data.width.unwrap_or(fallback.width),
                data.height.unwrap_or(fallback.height),
            )
        });

        Element {
            id: self.id,
            kind: self.kind,
            position: self.position,
            size,
            content: self.content.or(data.content).unwrap_or_default(),
            incoming_connections: self.incoming_connections,
            outgoing_connections: self.outgoing_connections,
        }
    }
}

/// A parsed snapshot plus what the parse had to leave out
#[derive(Debug)]
pub(crate) struct Decoded {
    pub snapshot: Snapshot,
    pub malformed_connections: usize,

    /// Later entries whose element id was already taken
    pub duplicate_elements: Vec<ElementId>,

    /// Later entries whose connection id was already taken
    pub duplicate_connections: Vec<ConnectionId>,
}

impl Snapshot {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize snapshot")
    }

    /// Parse a snapshot, skipping connection entries that do not decode and
    /// entries repeating an id
    pub fn from_json(json: &str) -> Result<Self> {
        Self::decode(json).map(|decoded| decoded.snapshot)
    }

    /// Parse a snapshot and account for every entry that was skipped
    pub(crate) fn decode(json: &str) -> Result<Decoded> {
        let document: SnapshotDocument =
            serde_json::from_str(json).context("Failed to parse board snapshot")?;

        let mut malformed_connections = 0;
        let mut duplicate_connections = Vec::new();
        let mut connections = BTreeMap::new();
        for (key, value) in document.connections {
            match serde_json::from_value::<Connection>(value) {
                Ok(connection) if connections.contains_key(&connection.id) => {
                    warn!("skipping {:?}: {} is already taken", key, connection.id);
                    duplicate_connections.push(connection.id);
                }
                Ok(connection) => {
                    connections.insert(connection.id, connection);
                }
                Err(err) => {
                    warn!("skipping malformed connection {:?}: {}", key, err);
                    malformed_connections += 1;
                }
            }
        }

        let mut duplicate_elements = Vec::new();
        let mut elements = BTreeMap::new();
        for entry in document.elements.into_values() {
            let element = entry.into_element();
            if elements.contains_key(&element.id) {
                duplicate_elements.push(element.id);
            } else {
                elements.insert(element.id, element);
            }
        }

        let viewport = document.viewport.unwrap_or_else(|| {
            Viewport::new(
                document.canvas_offset.unwrap_or_default(),
                document.zoom_level.unwrap_or(1.0),
            )
        });

        let snapshot = Snapshot {
            title: document.title,
            elements,
            connections,
            viewport,
            saved_at: document.saved_at.unwrap_or_else(Utc::now),
        };
        Ok(Decoded {
            snapshot,
            malformed_connections,
            duplicate_elements,
            duplicate_connections,
        })
    }
}

/// Outcome of loading a snapshot into a board
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub elements: usize,
    pub connections: usize,

    /// Elements left out because their id appeared twice or is past the
    /// id limit
    pub skipped_elements: Vec<ElementId>,

    /// Connections left out for a missing endpoint, a self-loop, a repeated
    /// ordered pair or a repeated or out-of-range id
    pub dropped_connections: Vec<ConnectionId>,

    /// Connection entries that did not decode at all
    pub malformed_connections: usize,

    /// What validation found in the snapshot before it was loaded
    pub issues: Vec<ValidationIssue>,
}

impl ImportReport {
    pub(crate) fn new(store: &GraphStore, load: BulkLoadReport) -> Self {
        Self {
            elements: store.element_count(),
            connections: store.connection_count(),
            skipped_elements: load.skipped_elements,
            dropped_connections: load.dropped_connections.iter().map(|c| c.id).collect(),
            malformed_connections: 0,
            issues: Vec::new(),
        }
    }

    /// Whether everything in the snapshot made it into the board
    pub fn is_clean(&self) -> bool {
        self.skipped_elements.is_empty()
            && self.dropped_connections.is_empty()
            && self.malformed_connections == 0
    }
}

/// Project manifest containing metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub board_id: Ulid,
    pub version: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Manifest {
    /// Create a new manifest
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            board_id: Ulid::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created: now,
            modified: now,
        }
    }

    /// Update the modified timestamp
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    /// Save manifest to file
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open manifest file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse manifest from: {}", path.display()))
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush: {}", path.display()))?;
    Ok(())
}

/// A board persisted in a directory:
/// `manifest.json`, `board.json` (snapshot) and `events.jsonl` (change records)
pub struct Project {
    root_dir: PathBuf,
}

impl Project {
    /// Create a new project at the given path
    pub fn create(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create project directory: {}", path.display()))?;

        let project = Self {
            root_dir: path.to_path_buf(),
        };
        Manifest::new().save(&project.manifest_path())?;
        project.save_snapshot(&Board::new().export_snapshot())?;

        File::create(project.events_path()).with_context(|| {
            format!(
                "Failed to create events.jsonl: {}",
                project.events_path().display()
            )
        })?;

        info!("created project at {}", path.display());
        Ok(project)
    }

    /// Open an existing project
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Project directory does not exist: {}", path.display()));
        }

        let project = Self {
            root_dir: path.to_path_buf(),
        };
        if !project.manifest_path().exists() {
            return Err(anyhow!("manifest.json not found in project directory"));
        }
        if !project.board_path().exists() {
            return Err(anyhow!("board.json not found in project directory"));
        }

        Ok(project)
    }

    /// Open the project if it exists, otherwise create it
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if path.join("manifest.json").exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Get the root directory
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get path to manifest.json
    pub fn manifest_path(&self) -> PathBuf {
        self.root_dir.join("manifest.json")
    }

    /// Get path to board.json
    pub fn board_path(&self) -> PathBuf {
        self.root_dir.join("board.json")
    }

    /// Get path to events.jsonl
    pub fn events_path(&self) -> PathBuf {
        self.root_dir.join("events.jsonl")
    }

    /// Get path to the optional config.json
    pub fn config_path(&self) -> PathBuf {
        self.root_dir.join("config.json")
    }

    /// Load manifest
    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path())
    }

    /// Write a snapshot to board.json
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        write_json(&self.board_path(), snapshot)
    }

    /// Read board.json as text
    pub fn read_snapshot(&self) -> Result<String> {
        let path = self.board_path();
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read board.json: {}", path.display()))
    }

    /// Save the board and bump the manifest. Reads the board only.
    pub fn save(&self, board: &Board) -> Result<()> {
        let mut manifest = self.load_manifest().unwrap_or_default();
        manifest.touch();
        manifest.save(&self.manifest_path())?;

        self.save_snapshot(&board.export_snapshot())?;
        info!(
            "saved {:?} to {}",
            board.title(),
            self.board_path().display()
        );
        Ok(())
    }

    /// Load board.json into the board. On failure the board is unchanged.
    pub fn load_into(&self, board: &mut Board) -> Result<ImportReport> {
        let json = self.read_snapshot()?;
        board
            .import_snapshot(&json)
            .with_context(|| format!("Failed to load: {}", self.board_path().display()))
    }

    /// Append change records to events.jsonl, one JSON object per line
    pub fn append_events(&self, events: &[GraphEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let events_path = self.events_path();

        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&events_path)
            .with_context(|| format!("Failed to open events.jsonl: {}", events_path.display()))?;
        let mut writer = BufWriter::new(file);

        for event in events {
            serde_json::to_writer(&mut writer, event)
                .with_context(|| format!("Failed to write event to: {}", events_path.display()))?;
            writer
                .write_all(b"\n")
                .with_context(|| format!("Failed to write event to: {}", events_path.display()))?;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to flush events.jsonl: {}", events_path.display()))?;
        debug!("logged {} change record(s)", events.len());
        Ok(())
    }

    /// Load change records from events.jsonl. The log is advisory, so lines
    /// that do not parse (a torn final write, say) are skipped with a warning;
    /// only I/O failures are errors.
    pub fn load_events(&self) -> Result<Vec<GraphEvent>> {
        let events_path = self.events_path();
        if !events_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&events_path)
            .with_context(|| format!("Failed to open events.jsonl: {}", events_path.display()))?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.with_context(|| {
                format!("Failed to read line {} from: {}", index + 1, events_path.display())
            })?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<GraphEvent>(&line) {
                Ok(event) => events.push(event),
                Err(err) => warn!(
                    "skipping change record on line {} of {}: {}",
                    index + 1,
                    events_path.display(),
                    err
                ),
            }
        }

        Ok(events)
    }
}

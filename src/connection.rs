use crate::{ConnectionId, ElementId};
use serde::{Deserialize, Serialize};

/// Directed arrow between two elements
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Connection {
    pub id: ConnectionId,

    /// Source element (the arrow starts here)
    pub from: ElementId,

    /// Destination element (the arrow points here)
    pub to: ElementId,

    #[serde(default, alias = "type")]
    pub style: ConnectionStyle,
}

impl Connection {
    /// Create a new arrow connection
    pub fn new(id: ConnectionId, from: ElementId, to: ElementId) -> Self {
        Self {
            id,
            from,
            to,
            style: ConnectionStyle::Arrow,
        }
    }

    /// Ordered endpoint pair, the uniqueness key
    pub fn endpoints(&self) -> (ElementId, ElementId) {
        (self.from, self.to)
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// How a connection is drawn
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStyle {
    #[default]
    Arrow,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (ElementId, ElementId, ElementId) {
        (ElementId::new(1), ElementId::new(2), ElementId::new(3))
    }

    #[test]
    fn test_connection_creation() {
        let (from_id, to_id, _) = ids();
        let conn = Connection::new(ConnectionId::new(1), from_id, to_id);

        assert_eq!(conn.from, from_id);
        assert_eq!(conn.to, to_id);
        assert_eq!(conn.style, ConnectionStyle::Arrow);
        assert_eq!(conn.endpoints(), (from_id, to_id));
    }

    #[test]
    fn test_self_loop() {
        let (from_id, to_id, _) = ids();

        assert!(!Connection::new(ConnectionId::new(1), from_id, to_id).is_self_loop());
        assert!(Connection::new(ConnectionId::new(2), from_id, from_id).is_self_loop());
    }

    #[test]
    fn test_style_defaults_when_missing() {
        let conn: Connection =
            serde_json::from_str(r#"{"id":"connection_4","from":"element_1","to":"element_2"}"#)
                .unwrap();

        assert_eq!(conn.id, ConnectionId::new(4));
        assert_eq!(conn.style, ConnectionStyle::Arrow);
    }
}

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Ids stay within the integers a JSON number holds exactly (2^53 - 1)
const MAX_COUNTER: u64 = (1 << 53) - 1;

macro_rules! counter_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Largest counter a store accepts or hands out
            pub const MAX: u64 = MAX_COUNTER;

            /// Wrap a raw counter value
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Raw counter value
            pub fn value(self) -> u64 {
                self.0
            }

            /// Whether a store can hold this id and still allocate past it
            pub fn within_limit(self) -> bool {
                self.0 <= MAX_COUNTER
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.strip_prefix(Self::PREFIX)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .and_then(|digits| digits.parse::<u64>().ok())
                    .map(Self)
                    .ok_or_else(|| format!("invalid {} id: {:?}", Self::PREFIX, s))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

counter_id!(
    /// Identifier of an element on the canvas
    ElementId,
    "element"
);

counter_id!(
    /// Identifier of a connection between two elements
    ConnectionId,
    "connection"
);

/// Monotonic allocator owned by a single store instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    /// Last element counter handed out (0 = none yet)
    last_element: u64,
    /// Last connection counter handed out
    last_connection: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next element id, `None` once the counter is exhausted
    pub fn next_element(&mut self) -> Option<ElementId> {
        self.last_element = bump(self.last_element)?;
        Some(ElementId(self.last_element))
    }

    /// Generate the next connection id, `None` once the counter is exhausted
    pub fn next_connection(&mut self) -> Option<ConnectionId> {
        self.last_connection = bump(self.last_connection)?;
        Some(ConnectionId(self.last_connection))
    }

    /// Build an allocator that continues past every id already in use
    pub fn resume_after<E, C>(elements: E, connections: C) -> Self
    where
        E: IntoIterator<Item = ElementId>,
        C: IntoIterator<Item = ConnectionId>,
    {
        let mut allocator = Self::new();
        allocator.observe(elements, connections);
        allocator
    }

    /// Make sure future ids are above every id in the given sets.
    /// Never moves a counter backwards. Ids past the limit are ignored;
    /// stores refuse them anyway.
    pub fn observe<E, C>(&mut self, elements: E, connections: C)
    where
        E: IntoIterator<Item = ElementId>,
        C: IntoIterator<Item = ConnectionId>,
    {
        if let Some(max) = elements
            .into_iter()
            .filter(|id| id.within_limit())
            .map(ElementId::value)
            .max()
        {
            self.last_element = self.last_element.max(max);
        }
        if let Some(max) = connections
            .into_iter()
            .filter(|id| id.within_limit())
            .map(ConnectionId::value)
            .max()
        {
            self.last_connection = self.last_connection.max(max);
        }
    }
}

fn bump(counter: u64) -> Option<u64> {
    counter.checked_add(1).filter(|next| *next <= MAX_COUNTER)
}

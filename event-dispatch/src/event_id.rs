use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Random identifier stamped on every [`Event`](crate::Event).
///
/// Used to correlate log lines for one event across dispatchers. It plays no
/// part in re-entrancy detection, which compares the shared event allocation.
///
/// `Display` prints the full hyphenated UUID; the alternate form (`{:#}`)
/// prints only the first eight hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        EventId::new()
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        EventId(uuid)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(EventId)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            let mut buf = Uuid::encode_buffer();
            let simple = self.0.simple().encode_lower(&mut buf);
            f.write_str(&simple[..8])
        } else {
            write!(f, "{}", self.0.hyphenated())
        }
    }
}

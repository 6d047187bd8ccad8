use serde_json::Value;

use crate::endpoints::ResourceKind;

/// A response document tagged with the kind of resource it holds.
/// Tags outside [`ResourceKind`] land in [`Resource::Untyped`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Game(Value),
    League(Value),
    Team(Value),
    Roster(Value),
    Standings(Value),
    Scoreboard(Value),
    Matchups(Value),
    Transactions(Value),
    Untyped { tag: String, document: Value },
}

impl Resource {
    pub fn new(kind: ResourceKind, document: Value) -> Self {
        match kind {
            ResourceKind::Game => Self::Game(document),
            ResourceKind::League => Self::League(document),
            ResourceKind::Team => Self::Team(document),
            ResourceKind::Roster => Self::Roster(document),
            ResourceKind::Standings => Self::Standings(document),
            ResourceKind::Scoreboard => Self::Scoreboard(document),
            ResourceKind::Matchups => Self::Matchups(document),
            ResourceKind::Transactions => Self::Transactions(document),
        }
    }

    pub fn from_tag(tag: &str, document: Value) -> Self {
        match ResourceKind::from_tag(tag) {
            Some(kind) => Self::new(kind, document),
            None => Self::Untyped {
                tag: tag.to_string(),
                document,
            },
        }
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Self::Game(_) => Some(ResourceKind::Game),
            Self::League(_) => Some(ResourceKind::League),
            Self::Team(_) => Some(ResourceKind::Team),
            Self::Roster(_) => Some(ResourceKind::Roster),
            Self::Standings(_) => Some(ResourceKind::Standings),
            Self::Scoreboard(_) => Some(ResourceKind::Scoreboard),
            Self::Matchups(_) => Some(ResourceKind::Matchups),
            Self::Transactions(_) => Some(ResourceKind::Transactions),
            Self::Untyped { .. } => None,
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Untyped { tag, .. } => tag,
            other => other.kind().map(|k| k.tag()).unwrap_or_default(),
        }
    }

    pub fn document(&self) -> &Value {
        match self {
            Self::Game(doc)
            | Self::League(doc)
            | Self::Team(doc)
            | Self::Roster(doc)
            | Self::Standings(doc)
            | Self::Scoreboard(doc)
            | Self::Matchups(doc)
            | Self::Transactions(doc) => doc,
            Self::Untyped { document, .. } => document,
        }
    }

    pub fn into_document(self) -> Value {
        match self {
            Self::Game(doc)
            | Self::League(doc)
            | Self::Team(doc)
            | Self::Roster(doc)
            | Self::Standings(doc)
            | Self::Scoreboard(doc)
            | Self::Matchups(doc)
            | Self::Transactions(doc) => doc,
            Self::Untyped { document, .. } => document,
        }
    }

    /// Top-level field of the document, `None` when absent
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.document().get(name)
    }

    /// Top-level scalar field as a string; numbers are stringified since XML
    /// carries every scalar as text
    pub fn str_field(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

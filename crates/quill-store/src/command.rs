use std::time::Duration;

/// A single write command that can be queued in a [`Batch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `SET key value [EX ttl]`. Without a TTL any previous expiry is cleared.
    Set {
        key: String,
        value: String,
        ttl: Option<Duration>,
    },
    /// `EXPIRE key ttl`.
    Expire { key: String, ttl: Duration },
    /// `DEL key`.
    Delete { key: String },
    /// `HSET key field value [field value ...]`.
    HashSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// `HDEL key field [field ...]`.
    HashDelete { key: String, fields: Vec<String> },
    /// `SADD key member`.
    SetAdd { key: String, member: String },
    /// `SREM key member`.
    SetRemove { key: String, member: String },
}

impl Command {
    /// The key this command writes.
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. }
            | Self::Expire { key, .. }
            | Self::Delete { key }
            | Self::HashSet { key, .. }
            | Self::HashDelete { key, .. }
            | Self::SetAdd { key, .. }
            | Self::SetRemove { key, .. } => key,
        }
    }

    /// Redis command name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "SET",
            Self::Expire { .. } => "EXPIRE",
            Self::Delete { .. } => "DEL",
            Self::HashSet { .. } => "HSET",
            Self::HashDelete { .. } => "HDEL",
            Self::SetAdd { .. } => "SADD",
            Self::SetRemove { .. } => "SREM",
        }
    }
}

/// An ordered group of commands committed as one unit.
///
/// Built with chained calls:
///
/// ```
/// use std::time::Duration;
/// use quill_store::Batch;
///
/// let batch = Batch::new()
///     .set_with_ttl("token_abc", "alice", Duration::from_secs(86_400))
///     .set_add("user_tokens_alice", "abc");
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Command::Set {
            key: key.into(),
            value: value.into(),
            ttl: None,
        });
        self
    }

    pub fn set_with_ttl(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        self.push(Command::Set {
            key: key.into(),
            value: value.into(),
            ttl: Some(ttl),
        });
        self
    }

    pub fn expire(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.push(Command::Expire { key: key.into(), ttl });
        self
    }

    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.push(Command::Delete { key: key.into() });
        self
    }

    pub fn hash_set(mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        self.push(Command::HashSet {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn hash_delete<I, S>(mut self, key: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Command::HashDelete {
            key: key.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn set_add(mut self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.push(Command::SetAdd {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn set_remove(mut self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.push(Command::SetRemove {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl IntoIterator for Batch {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

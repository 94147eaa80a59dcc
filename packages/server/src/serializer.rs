use std::fmt;
use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Resource kinds whose mutations are serialized independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Files,
    Entities,
    JsonData,
    TypedJsonData,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Files,
        ResourceKind::Entities,
        ResourceKind::JsonData,
        ResourceKind::TypedJsonData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Files => "files",
            ResourceKind::Entities => "entities",
            ResourceKind::JsonData => "json_data",
            ResourceKind::TypedJsonData => "typed_json_data",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exclusive lock per resource kind.
///
/// Every create, update and delete of a kind runs while holding that kind's
/// guard, so at most one mutation per kind is in flight. Reads never lock.
/// Waiters are served in FIFO order.
#[derive(Debug, Default)]
pub struct WriteSerializer {
    files: Mutex<()>,
    entities: Mutex<()>,
    json_data: Mutex<()>,
    typed_json_data: Mutex<()>,
}

/// Held for the duration of one mutation. Releasing happens on drop, so an
/// early return or a panic never leaves the kind locked.
pub struct WriteGuard<'a> {
    kind: ResourceKind,
    acquired_at: Instant,
    _guard: MutexGuard<'a, ()>,
}

impl WriteSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: ResourceKind) -> &Mutex<()> {
        match kind {
            ResourceKind::Files => &self.files,
            ResourceKind::Entities => &self.entities,
            ResourceKind::JsonData => &self.json_data,
            ResourceKind::TypedJsonData => &self.typed_json_data,
        }
    }

    /// Wait until no other mutation of `kind` is running.
    pub async fn lock(&self, kind: ResourceKind) -> WriteGuard<'_> {
        let started = Instant::now();
        let guard = self.slot(kind).lock().await;
        debug!(
            kind = %kind,
            waited_ms = started.elapsed().as_millis() as u64,
            "Acquired write lock"
        );
        WriteGuard {
            kind,
            acquired_at: Instant::now(),
            _guard: guard,
        }
    }

    /// Acquire the lock for `kind` only if it is free right now.
    pub fn try_lock(&self, kind: ResourceKind) -> Option<WriteGuard<'_>> {
        let guard = self.slot(kind).try_lock().ok()?;
        Some(WriteGuard {
            kind,
            acquired_at: Instant::now(),
            _guard: guard,
        })
    }
}

impl WriteGuard<'_> {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        debug!(
            kind = %self.kind,
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "Released write lock"
        );
    }
}

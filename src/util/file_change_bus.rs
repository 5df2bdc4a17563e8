use std::path::{Path, PathBuf};

/// Somebody (an editor, a file watcher) changed a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChanged {
    pub path: PathBuf,
}

impl FileChanged {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn is_about(&self, path: &Path) -> bool {
        self.path == path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyResponse {
    Continue,
    /// The event has been consumed, subscribers after this one won't see it.
    Stop,
}

/// Ordered subscriber list for [`FileChanged`]. Subscribers are keys (e.g. entities), the caller resolves them to
/// whatever handles the event, so the bus never borrows the subscribers themselves.
#[derive(Debug, Clone)]
pub struct FileChangeBus<K> {
    subscribers: Vec<K>,
}

impl<K> Default for FileChangeBus<K> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<K: PartialEq + Clone> FileChangeBus<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, key: K) {
        if !self.subscribers.contains(&key) {
            self.subscribers.push(key);
        }
    }

    pub fn unsubscribe(&mut self, key: &K) {
        self.subscribers.retain(|subscriber| subscriber != key);
    }

    /// Drops every subscriber the predicate rejects, keeping the order of the rest.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.subscribers.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Visits subscribers in subscription order until one answers [`NotifyResponse::Stop`].
    pub fn dispatch<F>(&self, event: &FileChanged, mut handler: F) -> NotifyResponse
    where
        F: FnMut(&K, &FileChanged) -> NotifyResponse,
    {
        for subscriber in &self.subscribers {
            if handler(subscriber, event) == NotifyResponse::Stop {
                return NotifyResponse::Stop;
            }
        }

        NotifyResponse::Continue
    }
}

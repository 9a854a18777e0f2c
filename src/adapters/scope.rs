//! Per-attempt resource release.
//!
//! Remote attempts acquire a socket, maybe a tunnel, an SSH session and an
//! SFTP channel. Each acquisition registers a release action here; dropping
//! the scope runs them newest first, whatever point the attempt reached.

/// Release actions for one attempt, run in reverse registration order.
#[derive(Default)]
pub struct AttemptScope {
    releases: Vec<(&'static str, Box<dyn FnOnce() + Send>)>,
}

impl AttemptScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `release` to run when the scope ends.
    pub fn defer(&mut self, name: &'static str, release: impl FnOnce() + Send + 'static) {
        self.releases.push((name, Box::new(release)));
    }

    /// Number of pending release actions.
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

impl Drop for AttemptScope {
    fn drop(&mut self) {
        while let Some((name, release)) = self.releases.pop() {
            tracing::debug!(resource = name, "Releasing");
            release();
        }
    }
}

impl std::fmt::Debug for AttemptScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.releases.iter().map(|(name, _)| *name).collect();
        f.debug_struct("AttemptScope").field("pending", &names).finish()
    }
}

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use notify::{RecommendedWatcher, RecursiveMode};

use crate::error::{Error, Result};
use crate::event::{ChangeClass, Event};

/// Thin wrapper over the notify crate
///
/// Registers every path up front and forwards the change classes the
/// supervisor cares about into its event channel. Watching stops when this is
/// dropped.
pub struct Watcher {
    _watcher: RecommendedWatcher,
}

impl Watcher {
    /// Fails with [`Error::PathNotWatchable`] on the first path that cannot
    /// be registered; a partial watch set is never returned.
    pub fn new(tx: Sender<Event>, paths: &[PathBuf]) -> Result<Self> {
        use notify::Watcher;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(ev) => match ChangeClass::classify(&ev.kind) {
                    Some(class) => {
                        trace!("{:?} on {:?}", class, ev.paths);
                        Event::Change(class)
                    }
                    None => return,
                },
                Err(err) => Event::WatchError(err),
            };

            let _ = tx.send(event);
        })?;

        for path in paths {
            watcher
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(|err| Error::PathNotWatchable(path.clone(), err))?;
            debug!("Watching {:?}", path);
        }

        Ok(Self { _watcher: watcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn missing_path_is_not_watchable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().to_path_buf();
        let bad = dir.path().join("does-not-exist");
        let (tx, _rx) = channel();

        match Watcher::new(tx, &[good, bad.clone()]) {
            Err(Error::PathNotWatchable(path, _)) => assert_eq!(path, bad),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("watcher accepted a missing path"),
        }
    }

    #[test]
    fn reports_writes_to_watched_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("watched");
        std::fs::write(&file, "before").expect("write");

        let (tx, rx) = channel();
        let _watcher = Watcher::new(tx, &[file.clone()]).expect("watcher");
        std::fs::write(&file, "after").expect("write");

        let event = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("change event");
        assert!(matches!(event, Event::Change(_)), "{:?}", event);
    }
}

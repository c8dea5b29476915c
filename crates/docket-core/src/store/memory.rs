use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;

use super::{ContentStore, Revision, StoreError, archived_copy, check_relative};
use crate::dates::ARCHIVE_STAMP_FORMAT;

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, String>,
    log: Vec<String>,
}

/// In-process [`ContentStore`]. Revisions are a running write counter and
/// commit messages are kept for inspection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commit messages recorded so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.state().log.clone()
    }

    fn record(state: &mut State, message: &str) -> Revision {
        state.log.push(message.to_string());
        Revision::new(state.log.len().to_string())
    }

    fn missing(path: &str) -> StoreError {
        StoreError::NotFound {
            path: path.to_string(),
        }
    }
}

impl ContentStore for MemoryStore {
    fn create(&self, path: &str, text: &str, message: &str) -> Result<Revision, StoreError> {
        check_relative(path)?;
        let mut state = self.state();
        state.files.insert(path.to_string(), text.to_string());
        Ok(Self::record(&mut state, message))
    }

    fn update(&self, path: &str, text: &str, message: &str) -> Result<Revision, StoreError> {
        let mut state = self.state();
        let slot = state.files.get_mut(path).ok_or_else(|| Self::missing(path))?;
        *slot = text.to_string();
        Ok(Self::record(&mut state, message))
    }

    fn read(&self, path: &str) -> Result<String, StoreError> {
        self.state()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| Self::missing(path))
    }

    fn delete(&self, path: &str, message: &str) -> Result<Revision, StoreError> {
        let mut state = self.state();
        state.files.remove(path).ok_or_else(|| Self::missing(path))?;
        Ok(Self::record(&mut state, message))
    }

    fn list(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        Ok(self
            .state()
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/') && rest.ends_with(".md"))
            .map(str::to_string)
            .collect())
    }

    fn archive(&self, path: &str, reason: &str) -> Result<Revision, StoreError> {
        let mut state = self.state();
        let content = state.files.remove(path).ok_or_else(|| Self::missing(path))?;
        let stamp = Local::now().format(ARCHIVE_STAMP_FORMAT).to_string();
        let (target, archived) = archived_copy(path, &content, reason, &stamp);
        state.files.insert(target, archived);
        Ok(Self::record(&mut state, &format!("Archive {path}: {reason}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_paths_are_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.read("backlogs/x.md"), Err(StoreError::NotFound { .. })));
        assert!(matches!(
            store.update("backlogs/x.md", "", "m"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete("backlogs/x.md", "m"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.archive("backlogs/x.md", "m"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn list_is_sorted_shallow_and_markdown_only() {
        let store = MemoryStore::new();
        for path in [
            "backlogs/b.md",
            "backlogs/a.md",
            "backlogs/.gitkeep",
            "backlogs/nested/c.md",
            "meetings/m.md",
        ] {
            store.create(path, "", "seed").unwrap();
        }
        assert_eq!(store.list("backlogs").unwrap(), ["a.md", "b.md"]);
        assert!(store.list("archives").unwrap().is_empty());
    }

    #[test]
    fn revisions_count_writes() {
        let store = MemoryStore::new();
        assert_eq!(store.create("backlogs/a.md", "x", "one").unwrap().as_str(), "1");
        assert_eq!(store.update("backlogs/a.md", "y", "two").unwrap().as_str(), "2");
        assert_eq!(store.read("backlogs/a.md").unwrap(), "y");
        assert_eq!(store.messages(), ["one", "two"]);
    }

    #[test]
    fn archive_moves_with_reason_header() {
        let store = MemoryStore::new();
        store.create("backlogs/a.md", "# A\n", "seed").unwrap();
        store.archive("backlogs/a.md", "done with it").unwrap();

        assert!(store.list("backlogs").unwrap().is_empty());
        let archived = store.list("archives").unwrap();
        assert_eq!(archived.len(), 1);
        assert!(archived[0].ends_with("_a.md"));
        let text = store.read(&format!("archives/{}", archived[0])).unwrap();
        assert_eq!(text, "<!-- Archived: done with it -->\n# A\n");
    }
}

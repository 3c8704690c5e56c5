use std::path::PathBuf;

use tracing::{debug, warn};

use nestbot_core::{ChildRecord, EventRecord};

use crate::list_file::{JsonListFile, ListRecord};

/// Children and events, held in memory and written through to disk after
/// every mutation.
///
/// Write failures are logged and otherwise ignored: the in-memory lists stay
/// authoritative for the rest of the process lifetime.
#[derive(Debug)]
pub struct Roster {
    children: Vec<ChildRecord>,
    events: Vec<EventRecord>,
    children_file: JsonListFile<ChildRecord>,
    events_file: JsonListFile<EventRecord>,
}

impl Roster {
    /// Load both collections, starting empty for missing or corrupt files.
    pub fn open(children_path: impl Into<PathBuf>, events_path: impl Into<PathBuf>) -> Self {
        let children_file = JsonListFile::new(children_path);
        let events_file = JsonListFile::new(events_path);
        Self {
            children: children_file.load(),
            events: events_file.load(),
            children_file,
            events_file,
        }
    }

    pub fn children(&self) -> &[ChildRecord] {
        &self.children
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn add_child(&mut self, child: ChildRecord) {
        debug!(name = %child.name, birth = %child.birth, "adding child");
        self.children.push(child);
        persist(&self.children_file, &self.children);
    }

    /// Remove the first child whose name matches exactly.
    pub fn remove_child(&mut self, name: &str) -> Option<ChildRecord> {
        let index = self.children.iter().position(|child| child.name == name)?;
        let removed = self.children.remove(index);
        debug!(name = %removed.name, "removed child");
        persist(&self.children_file, &self.children);
        Some(removed)
    }

    pub fn add_event(&mut self, event: EventRecord) {
        debug!(title = %event.title, date = %event.date, "adding event");
        self.events.push(event);
        persist(&self.events_file, &self.events);
    }
}

fn persist<T: ListRecord>(file: &JsonListFile<T>, records: &[T]) {
    if let Err(err) = file.save(records) {
        warn!(path = %file.path().display(), ?err, "failed to save records; keeping in-memory copy");
    }
}

use std::path::{Path, PathBuf};

/// What a recent entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentItemType {
    /// A video file.
    Video,
    /// An audio file.
    Audio,
    /// A screenshot.
    Image,
}

/// Save progress of a recent entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentStatus {
    /// The recorder is still being disposed.
    Saving,
    /// The file was flushed and closed.
    Saved,
    /// Disposal failed; the file may be incomplete.
    Failed,
}

/// One output of a past session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentItem {
    /// Id assigned by the list.
    pub id: u64,
    /// Output file.
    pub path: PathBuf,
    /// Kind of output.
    pub item_type: RecentItemType,
    /// Save progress.
    pub status: RecentStatus,
}

/// Outputs of past sessions, newest first.
#[derive(Debug, Default)]
pub struct RecentList {
    next_id: u64,
    items: Vec<RecentItem>,
}

impl RecentList {
    /// Add an entry in `Saving` status and return its id.
    pub fn add(&mut self, path: &Path, item_type: RecentItemType) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.insert(
            0,
            RecentItem {
                id,
                path: path.to_path_buf(),
                item_type,
                status: RecentStatus::Saving,
            },
        );
        id
    }

    /// Update the status of entry `id`; false when it no longer exists.
    pub fn set_status(&mut self, id: u64, status: RecentStatus) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.status = status;
                true
            }
            None => false,
        }
    }

    /// Entry `id`, if present.
    pub fn get(&self, id: u64) -> Option<&RecentItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// All entries, newest first.
    pub fn items(&self) -> &[RecentItem] {
        &self.items
    }
}

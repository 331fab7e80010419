// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! On-disk update store.
//!
//! Layout under the root directory:
//! ```text
//! update-store/<id>/info.json     update record
//! update-store/<id>/<id>.zip      downloaded archive, removed once applied
//! update-store/apply-pending      id of an update whose apply started a reset
//! update/{app,os}/...             extracted payload
//! ```
//! The store assumes it is the only writer.

use crate::{UpdateError, UpdateMessage, UpdateResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const STORE_DIRECTORY: &str = "update-store";
pub const UPDATE_DIRECTORY: &str = "update";
pub const INFO_FILE_NAME: &str = "info.json";
pub const APPLY_PENDING_FILE_NAME: &str = "apply-pending";

pub struct UpdateStore {
    root: PathBuf,
    store_dir: PathBuf,
    messages: Mutex<BTreeMap<String, UpdateMessage>>,
}

impl UpdateStore {
    /// Open (creating if needed) the store under `root` and reload every
    /// record.
    ///
    /// Records that claim to be retrieved but whose archive is gone are reset
    /// to not retrieved. Archives left behind by applied updates are removed.
    /// Unreadable records are skipped with a warning.
    pub fn open(root: impl Into<PathBuf>) -> UpdateResult<Self> {
        let root = root.into();
        let store_dir = root.join(STORE_DIRECTORY);
        fs::create_dir_all(&store_dir)?;

        let store = Self {
            root,
            store_dir,
            messages: Mutex::new(BTreeMap::new()),
        };
        let mut messages = BTreeMap::new();
        for entry in fs::read_dir(&store.store_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let info_path = entry.path().join(INFO_FILE_NAME);
            let mut message = match read_info(&info_path) {
                Ok(message) => message,
                Err(e) => {
                    warn!("[UPDATE] Skipping unreadable record {}: {}", info_path.display(), e);
                    continue;
                }
            };
            let archive = store.archive_path(&message.id);
            if message.retrieved && !message.applied && !archive.exists() {
                warn!(update_id = %message.id, "[UPDATE] Archive missing, marking update as not retrieved");
                message.retrieved = false;
                store.write_info(&message)?;
            }
            if message.applied && archive.exists() {
                debug!(update_id = %message.id, "[UPDATE] Removing archive of applied update");
                fs::remove_file(&archive)?;
            }
            messages.insert(message.id.clone(), message);
        }
        info!("[UPDATE] Store at {} holds {} update(s)", store.store_dir.display(), messages.len());
        *store.messages.lock() = messages;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory the archive of an update is extracted into.
    pub fn update_dir(&self) -> PathBuf {
        self.root.join(UPDATE_DIRECTORY)
    }

    pub fn archive_path(&self, id: &str) -> PathBuf {
        self.store_dir.join(id).join(format!("{}.zip", id))
    }

    /// Record a newly announced update.
    ///
    /// # Returns
    /// `true` if the update was new; a known id keeps its existing record and
    /// progress flags.
    pub fn add(&self, message: &UpdateMessage) -> UpdateResult<bool> {
        validate_id(&message.id)?;
        if self.messages.lock().contains_key(&message.id) {
            return Ok(false);
        }
        let record = UpdateMessage {
            retrieved: false,
            applied: false,
            ..message.clone()
        };
        fs::create_dir_all(self.store_dir.join(&record.id))?;
        self.write_info(&record)?;
        self.messages.lock().insert(record.id.clone(), record);
        Ok(true)
    }

    pub fn try_get_message(&self, id: &str) -> Option<UpdateMessage> {
        self.messages.lock().get(id).cloned()
    }

    /// All records, ordered by id.
    pub fn messages(&self) -> Vec<UpdateMessage> {
        self.messages.lock().values().cloned().collect()
    }

    pub fn set_retrieved(&self, id: &str) -> UpdateResult<()> {
        self.update(id, |message| message.retrieved = true)
    }

    /// Mark an update applied and delete its archive.
    pub fn set_applied(&self, id: &str) -> UpdateResult<()> {
        self.update(id, |message| message.applied = true)?;
        match fs::remove_file(self.archive_path(id)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Remove every record, archive and the apply marker.
    pub fn clear(&self) -> UpdateResult<()> {
        let mut messages = self.messages.lock();
        for entry in fs::read_dir(&self.store_dir)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        messages.clear();
        info!("[UPDATE] Store cleared");
        Ok(())
    }

    /// Persist that `id` is being applied, so the next boot can finish the
    /// bookkeeping.
    pub fn mark_apply_pending(&self, id: &str) -> UpdateResult<()> {
        validate_id(id)?;
        fs::write(self.apply_pending_path(), id)?;
        Ok(())
    }

    /// Id recorded by [`UpdateStore::mark_apply_pending`], if any. The marker
    /// stays until [`UpdateStore::clear_apply_pending`].
    pub fn peek_apply_pending(&self) -> UpdateResult<Option<String>> {
        match fs::read_to_string(self.apply_pending_path()) {
            Ok(id) => Ok(Some(id.trim().to_string()).filter(|id| !id.is_empty())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn clear_apply_pending(&self) -> UpdateResult<()> {
        match fs::remove_file(self.apply_pending_path()) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn apply_pending_path(&self) -> PathBuf {
        self.store_dir.join(APPLY_PENDING_FILE_NAME)
    }

    fn update(&self, id: &str, change: impl FnOnce(&mut UpdateMessage)) -> UpdateResult<()> {
        let mut messages = self.messages.lock();
        let message = messages
            .get_mut(id)
            .ok_or_else(|| UpdateError::UnknownUpdate(id.to_string()))?;
        let mut updated = message.clone();
        change(&mut updated);
        self.write_info(&updated)?;
        *message = updated;
        Ok(())
    }

    fn write_info(&self, message: &UpdateMessage) -> UpdateResult<()> {
        let directory = self.store_dir.join(&message.id);
        let temporary = directory.join(format!("{}.tmp", INFO_FILE_NAME));
        fs::write(&temporary, serde_json::to_vec_pretty(message)?)?;
        fs::rename(&temporary, directory.join(INFO_FILE_NAME))?;
        Ok(())
    }
}

fn read_info(path: &Path) -> UpdateResult<UpdateMessage> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Ids become directory names.
fn validate_id(id: &str) -> UpdateResult<()> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id != APPLY_PENDING_FILE_NAME
        && !id.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(UpdateError::InvalidId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn message(id: &str) -> UpdateMessage {
        UpdateMessage::new(id, format!("updates.local/{}.mpak", id), "00")
    }

    #[test]
    fn test_record_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = UpdateStore::open(dir.path()).unwrap();

        assert!(store.add(&message("u1")).unwrap());
        let record = store.try_get_message("u1").unwrap();
        assert_eq!(record.id, "u1");
        assert!(!record.retrieved && !record.applied);

        fs::write(store.archive_path("u1"), b"zip").unwrap();
        store.set_retrieved("u1").unwrap();
        assert!(store.try_get_message("u1").unwrap().retrieved);

        store.set_applied("u1").unwrap();
        assert!(store.try_get_message("u1").unwrap().applied);
        assert!(!store.archive_path("u1").exists());

        store.clear().unwrap();
        assert!(store.messages().is_empty());
        assert_eq!(fs::read_dir(dir.path().join(STORE_DIRECTORY)).unwrap().count(), 0);
    }

    #[test]
    fn test_duplicate_add_keeps_progress() {
        let dir = TempDir::new().unwrap();
        let store = UpdateStore::open(dir.path()).unwrap();
        store.add(&message("u1")).unwrap();
        fs::write(store.archive_path("u1"), b"zip").unwrap();
        store.set_retrieved("u1").unwrap();

        assert!(!store.add(&message("u1")).unwrap());
        assert!(store.try_get_message("u1").unwrap().retrieved);
    }

    #[test]
    fn test_reload_repairs_missing_archive() {
        let dir = TempDir::new().unwrap();
        {
            let store = UpdateStore::open(dir.path()).unwrap();
            store.add(&message("u1")).unwrap();
            store.add(&message("u2")).unwrap();
            fs::write(store.archive_path("u1"), b"zip").unwrap();
            fs::write(store.archive_path("u2"), b"zip").unwrap();
            store.set_retrieved("u1").unwrap();
            store.set_retrieved("u2").unwrap();
            fs::remove_file(store.archive_path("u1")).unwrap();
        }

        let store = UpdateStore::open(dir.path()).unwrap();
        assert!(!store.try_get_message("u1").unwrap().retrieved);
        assert!(store.try_get_message("u2").unwrap().retrieved);

        let reopened = UpdateStore::open(dir.path()).unwrap();
        assert!(!reopened.try_get_message("u1").unwrap().retrieved);
    }

    #[test]
    fn test_reload_skips_corrupt_record() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join(STORE_DIRECTORY).join("broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join(INFO_FILE_NAME), b"{not json").unwrap();

        let store = UpdateStore::open(dir.path()).unwrap();
        assert!(store.messages().is_empty());
    }

    #[test]
    fn test_apply_marker() {
        let dir = TempDir::new().unwrap();
        let store = UpdateStore::open(dir.path()).unwrap();
        assert_eq!(store.peek_apply_pending().unwrap(), None);
        store.clear_apply_pending().unwrap();

        store.mark_apply_pending("u9").unwrap();
        let reopened = UpdateStore::open(dir.path()).unwrap();
        assert_eq!(reopened.peek_apply_pending().unwrap().as_deref(), Some("u9"));
        assert_eq!(reopened.peek_apply_pending().unwrap().as_deref(), Some("u9"));

        reopened.clear_apply_pending().unwrap();
        assert_eq!(reopened.peek_apply_pending().unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let store = UpdateStore::open(dir.path()).unwrap();
        for id in ["", "..", "a/b", APPLY_PENDING_FILE_NAME] {
            assert!(matches!(store.add(&message(id)), Err(UpdateError::InvalidId(_))));
        }
        assert!(matches!(store.set_retrieved("nope"), Err(UpdateError::UnknownUpdate(_))));
    }
}

//! # Tag Editor
//!
//! Backs the full-screen photo view: shows the tags of one photo and edits
//! them. The tag record is created the first time a photo is opened.
//!
//! ## Concurrency
//!
//! Each edit writes the whole record. Two editors open on the same photo
//! overwrite each other; the last write wins. This is accepted.

use crate::error::Result;
use core_library::{PhotoTag, PhotoTagRepository};
use core_runtime::events::{CoreEvent, EventBus, Notice, TagEvent};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct TagEditor {
    repo: Arc<dyn PhotoTagRepository>,
    events: EventBus,
    record: PhotoTag,
}

impl TagEditor {
    /// Load the record for `uri`, creating an empty one if there is none.
    #[instrument(skip(repo, events))]
    pub async fn open(
        repo: Arc<dyn PhotoTagRepository>,
        events: EventBus,
        uri: &str,
    ) -> Result<Self> {
        let record = match repo.find_by_uri(uri).await? {
            Some(record) => record,
            None => {
                let record = repo.insert(uri, 0, "").await?;
                debug!(record_id = record.id, "Created tag record");
                let _ = events.emit(CoreEvent::Tag(TagEvent::RecordCreated {
                    uri: record.uri.clone(),
                    record_id: record.id,
                }));
                record
            }
        };

        Ok(Self {
            repo,
            events,
            record,
        })
    }

    pub fn uri(&self) -> &str {
        &self.record.uri
    }

    pub fn record(&self) -> &PhotoTag {
        &self.record
    }

    pub fn tags(&self) -> Vec<String> {
        self.record.tags().into_iter().map(str::to_string).collect()
    }

    /// Text for the tag area when there is nothing to list.
    pub fn empty_label(&self) -> Option<&'static str> {
        (!self.record.has_tags()).then_some("No tags added")
    }

    /// Add a tag and persist. Returns the stored (trimmed) tag.
    ///
    /// Blank and case-insensitive duplicate tags are rejected without a write.
    pub async fn add_tag(&mut self, tag: &str) -> Result<String> {
        let mut updated = self.record.clone();
        let added = match updated.add_tag(tag) {
            Ok(added) => added,
            Err(e) => {
                self.events.notify(Notice::warning(e.user_message()));
                return Err(e.into());
            }
        };

        self.save(updated).await?;
        info!(tag = %added, "Tag added");
        self.events
            .notify(Notice::info(format!("Tag added: {}", added)));
        let _ = self.events.emit(CoreEvent::Tag(TagEvent::TagAdded {
            uri: self.record.uri.clone(),
            tag: added.clone(),
        }));
        Ok(added)
    }

    /// Remove a tag and persist. Returns false, without writing, when the
    /// photo does not carry it.
    pub async fn remove_tag(&mut self, tag: &str) -> Result<bool> {
        let mut updated = self.record.clone();
        if !updated.remove_tag(tag) {
            debug!(tag, "Tag not present; nothing to remove");
            return Ok(false);
        }

        self.save(updated).await?;
        let _ = self.events.emit(CoreEvent::Tag(TagEvent::TagRemoved {
            uri: self.record.uri.clone(),
            tag: tag.trim().to_string(),
        }));
        Ok(true)
    }

    /// Write `updated` and adopt it; on failure the editor keeps the old record.
    async fn save(&mut self, updated: PhotoTag) -> Result<()> {
        if let Err(e) = self.repo.update(&updated).await {
            warn!(error = %e, "Could not save tags");
            self.events.notify(Notice::error(e.user_message()));
            return Err(e.into());
        }
        self.record = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use async_trait::async_trait;
    use core_library::error::Result as LibraryResult;
    use core_library::LibraryError;
    use core_runtime::events::EventStream;
    use mockall::mock;

    mock! {
        Repo {}

        #[async_trait]
        impl PhotoTagRepository for Repo {
            async fn insert(&self, uri: &str, album_id: i64, tag: &str) -> LibraryResult<PhotoTag>;
            async fn find_by_uri(&self, uri: &str) -> LibraryResult<Option<PhotoTag>>;
            async fn find_in_album(&self, album_id: i64) -> LibraryResult<Vec<PhotoTag>>;
            async fn search_by_tag(&self, keyword: &str) -> LibraryResult<Vec<PhotoTag>>;
            async fn update(&self, record: &PhotoTag) -> LibraryResult<()>;
            async fn find_all(&self) -> LibraryResult<Vec<PhotoTag>>;
        }
    }

    fn record(tag: &str) -> PhotoTag {
        PhotoTag {
            id: 7,
            uri: "content://media/7".to_string(),
            album_id: 0,
            tag: tag.to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_creates_missing_record() {
        let mut repo = MockRepo::new();
        repo.expect_find_by_uri().returning(|_| Ok(None));
        repo.expect_insert()
            .withf(|uri, album_id, tag| uri == "content://media/7" && *album_id == 0 && tag.is_empty())
            .times(1)
            .returning(|_, _, _| Ok(record("")));

        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let editor = TagEditor::open(Arc::new(repo), bus, "content://media/7")
            .await
            .unwrap();

        assert!(editor.tags().is_empty());
        assert_eq!(editor.empty_label(), Some("No tags added"));
        assert!(matches!(
            events.try_recv(),
            Ok(CoreEvent::Tag(TagEvent::RecordCreated { record_id: 7, .. }))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_tag_is_rejected_without_write() {
        let mut repo = MockRepo::new();
        repo.expect_find_by_uri()
            .returning(|_| Ok(Some(record("Beach"))));
        repo.expect_update().never();

        let bus = EventBus::new(8);
        let mut notices = EventStream::notices(bus.subscribe());
        let mut editor = TagEditor::open(Arc::new(repo), bus, "content://media/7")
            .await
            .unwrap();

        let result = editor.add_tag("  beach ").await;
        assert!(matches!(
            result,
            Err(CoreError::Library(LibraryError::AlreadyExists { .. }))
        ));
        assert_eq!(editor.tags(), vec!["Beach"]);

        match notices.try_recv() {
            Some(Ok(CoreEvent::Notice(notice))) => assert_eq!(notice.message, "Tag already exists"),
            other => panic!("expected notice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_save_keeps_old_record() {
        let mut repo = MockRepo::new();
        repo.expect_find_by_uri()
            .returning(|_| Ok(Some(record("cat"))));
        repo.expect_update().returning(|_| {
            Err(LibraryError::NotFound {
                entity_type: "PhotoTag".to_string(),
                id: "7".to_string(),
            })
        });

        let mut editor = TagEditor::open(Arc::new(repo), EventBus::default(), "content://media/7")
            .await
            .unwrap();

        assert!(editor.add_tag("dog").await.is_err());
        assert!(editor.remove_tag("cat").await.is_err());
        assert_eq!(editor.tags(), vec!["cat"]);
    }

    #[tokio::test]
    async fn test_remove_missing_tag_skips_write() {
        let mut repo = MockRepo::new();
        repo.expect_find_by_uri()
            .returning(|_| Ok(Some(record("cat,dog"))));
        repo.expect_update().never();

        let mut editor = TagEditor::open(Arc::new(repo), EventBus::default(), "content://media/7")
            .await
            .unwrap();

        // Removal is exact-match, unlike the duplicate check
        assert!(!editor.remove_tag("Cat").await.unwrap());
        assert_eq!(editor.tags(), vec!["cat", "dog"]);
    }
}

//! End-to-end behaviour of the collection screen, tag editing and slideshow
//! launch, on in-memory SQLite and an in-memory settings store.

use async_trait::async_trait;
use bridge_desktop::SqliteSettingsStore;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{MediaEntry, MediaIndex, PermissionStatus};
use core_library::db::create_test_pool;
use core_library::{PhotoTagRepository, SqlitePhotoTagRepository, ALL_PHOTOS};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventStream};
use core_service::{CoreError, CoreService, DisplayItem, ViewMode, ViewSource};
use mockall::mock;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

mock! {
    Index {}

    #[async_trait]
    impl MediaIndex for Index {
        async fn permission_status(&self) -> BridgeResult<PermissionStatus>;
        async fn request_permission(&self) -> BridgeResult<PermissionStatus>;
        async fn query_images(&self) -> BridgeResult<Vec<MediaEntry>>;
    }
}

const A: &str = "content://media/external/images/media/1";
const B: &str = "content://media/external/images/media/2";
const C: &str = "content://media/external/images/media/3";

fn granted_index() -> MockIndex {
    let mut index = MockIndex::new();
    index
        .expect_permission_status()
        .returning(|| Ok(PermissionStatus::Granted));
    index.expect_query_images().returning(|| {
        Ok(vec![
            MediaEntry::new(A, 10),
            MediaEntry::new(B, 30),
            MediaEntry::new(C, 20),
        ])
    });
    index
}

async fn service_with(index: MockIndex, prefetch: bool) -> CoreService {
    let pool = create_test_pool().await.unwrap();
    service_on(pool, index, prefetch).await
}

async fn service_on(pool: SqlitePool, index: MockIndex, prefetch: bool) -> CoreService {
    let store = SqliteSettingsStore::in_memory().await.unwrap();
    let config = CoreConfig::builder()
        .database_path(":memory:")
        .album_store(Arc::new(store))
        .media_index(Arc::new(index))
        .enable_tag_prefetch(prefetch)
        .build()
        .unwrap();
    CoreService::with_pool(config, pool).await.unwrap()
}

fn next_notice(notices: &mut EventStream) -> String {
    match notices.try_recv() {
        Some(Ok(CoreEvent::Notice(notice))) => notice.message,
        other => panic!("expected a notice, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gallery_lists_newest_first() {
    let core = service_with(granted_index(), false).await;
    core.collection().refresh().await.unwrap();

    let snapshot = core.collection().snapshot();
    assert_eq!(snapshot.source, ViewSource::Gallery);
    assert_eq!(snapshot.uris, vec![B, C, A]);
    assert!(snapshot.header.is_none());
}

#[tokio::test]
async fn test_denied_permission_shows_empty_gallery_with_notice() {
    let mut index = MockIndex::new();
    index
        .expect_permission_status()
        .returning(|| Ok(PermissionStatus::Denied));
    index.expect_query_images().never();

    let core = service_with(index, false).await;
    let mut notices = EventStream::notices(core.subscribe_events());

    core.collection().refresh().await.unwrap();
    assert!(core.collection().snapshot().uris.is_empty());
    assert_eq!(
        next_notice(&mut notices),
        "Permission denied. Cannot load images."
    );
}

#[tokio::test]
async fn test_album_menu_follows_current_album() {
    let core = service_with(granted_index(), false).await;
    let collection = core.collection();
    let mut notices = EventStream::notices(core.subscribe_events());

    // Nothing to act on while the gallery is shown
    assert!(matches!(
        collection.add_photo_to_current(A).await,
        Err(CoreError::NoCurrentAlbum)
    ));
    assert_eq!(next_notice(&mut notices), "Select an album to add photos");
    assert!(collection.rename_current_album("Other").await.is_err());
    assert_eq!(next_notice(&mut notices), "Cannot rename 'All Photos'");

    collection.create_album("  Trip ").await.unwrap();
    assert_eq!(next_notice(&mut notices), "Album created: Trip");
    assert!(collection.create_album("Trip").await.is_err());
    assert_eq!(next_notice(&mut notices), "Invalid or duplicate name");
    assert!(collection.create_album(ALL_PHOTOS).await.is_err());
    assert_eq!(next_notice(&mut notices), "Invalid or duplicate name");

    collection.select_album("Trip").await.unwrap();
    assert_eq!(collection.current_album().await.as_deref(), Some("Trip"));
    collection.add_photo_to_current(A).await.unwrap();
    assert_eq!(next_notice(&mut notices), "Photo added to Trip");
    collection.add_photo_to_current(C).await.unwrap();
    assert_eq!(next_notice(&mut notices), "Photo added to Trip");
    assert!(collection.add_photo_to_current(A).await.is_err());
    assert_eq!(next_notice(&mut notices), "Photo already in album");

    assert_eq!(collection.snapshot().uris, vec![A, C]);

    collection.rename_current_album("Trip 2024").await.unwrap();
    assert_eq!(next_notice(&mut notices), "Album renamed to: Trip 2024");
    let snapshot = collection.snapshot();
    assert_eq!(snapshot.source, ViewSource::Album("Trip 2024".to_string()));
    assert_eq!(snapshot.uris, vec![A, C]);
    assert_eq!(collection.album_names().await, vec![ALL_PHOTOS, "Trip 2024"]);

    collection.select_album(ALL_PHOTOS).await.unwrap();
    assert_eq!(collection.snapshot().source, ViewSource::Gallery);
    assert_eq!(collection.current_album().await, None);
}

#[tokio::test]
async fn test_tag_search_and_cancel() {
    let pool = create_test_pool().await.unwrap();
    let core = service_on(pool.clone(), granted_index(), false).await;
    let collection = core.collection();

    let mut editor = core.open_tag_editor(A).await.unwrap();
    editor.add_tag("cat").await.unwrap();
    editor.add_tag("beach").await.unwrap();
    let mut editor = core.open_tag_editor(B).await.unwrap();
    editor.add_tag("cats").await.unwrap();
    // A second record for A must not count twice in the header
    SqlitePhotoTagRepository::new(pool)
        .insert(A, 0, "cat")
        .await
        .unwrap();

    collection.create_album("Pets").await.unwrap();
    collection.select_album("Pets").await.unwrap();

    let hits = collection.search("  cat ").await.unwrap();
    assert_eq!(hits, 2);
    let snapshot = collection.snapshot();
    assert_eq!(snapshot.uris, vec![A, B]);
    assert_eq!(snapshot.header.as_deref(), Some("2 results for: \"cat\""));

    // A second search keeps the album underneath
    assert_eq!(collection.search("dog").await.unwrap(), 0);
    let snapshot = collection.snapshot();
    assert_eq!(snapshot.header.as_deref(), Some("No results for: \"dog\""));
    assert_eq!(
        snapshot.source,
        ViewSource::SearchResults {
            query: "dog".to_string(),
            previous: Box::new(ViewSource::Album("Pets".to_string())),
        }
    );

    assert!(collection.handle_back().await.unwrap());
    assert_eq!(
        collection.snapshot().source,
        ViewSource::Album("Pets".to_string())
    );
    assert!(!collection.handle_back().await.unwrap());
    assert!(!collection.cancel_search().await.unwrap());
}

#[tokio::test]
async fn test_empty_search_is_rejected() {
    let core = service_with(granted_index(), false).await;
    core.collection().refresh().await.unwrap();
    let before = core.collection().snapshot();
    let mut notices = EventStream::notices(core.subscribe_events());

    assert!(matches!(
        core.collection().search("   ").await,
        Err(CoreError::EmptySearch)
    ));
    assert_eq!(next_notice(&mut notices), "Please enter a search term");
    assert_eq!(core.collection().snapshot(), before);
}

#[tokio::test]
async fn test_view_mode_rebuilds_items_without_reload() {
    let core = service_with(granted_index(), false).await;
    let collection = core.collection();
    collection.refresh().await.unwrap();
    let generation = collection.snapshot().generation;

    assert_eq!(collection.toggle_view_mode().await, ViewMode::List);
    let snapshot = collection.snapshot();
    assert_eq!(snapshot.generation, generation);
    match &snapshot.items[0] {
        DisplayItem::List(item) => {
            assert_eq!(item.file_name, "2");
            assert_eq!(item.tags_label, "No tags");
        }
        other => panic!("expected a list item, got {:?}", other),
    }

    assert_eq!(collection.toggle_view_mode().await, ViewMode::Grid);
    assert!(matches!(
        collection.snapshot().items[0],
        DisplayItem::Grid(_)
    ));
}

#[tokio::test]
async fn test_prefetch_fills_grid_captions() {
    let core = service_with(granted_index(), true).await;

    let mut editor = core.open_tag_editor(C).await.unwrap();
    editor.add_tag("sunset").await.unwrap();
    editor.add_tag("beach").await.unwrap();
    editor.add_tag("family").await.unwrap();

    let mut snapshots = core.collection().subscribe();
    core.collection().refresh().await.unwrap();

    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| {
            s.items.iter().any(|item| {
                matches!(item, DisplayItem::Grid(grid) if grid.caption.is_some())
            })
        }),
    )
    .await
    .expect("prefetch did not finish")
    .unwrap()
    .clone();

    let captions: Vec<Option<String>> = snapshot
        .items
        .iter()
        .map(|item| match item {
            DisplayItem::Grid(grid) => grid.caption.clone(),
            DisplayItem::List(_) => None,
        })
        .collect();
    assert_eq!(captions, vec![None, Some("sunset (+2)".to_string()), None]);
}

#[tokio::test]
async fn test_slideshow_launch_from_current_view() {
    let core = service_with(granted_index(), false).await;
    let mut notices = EventStream::notices(core.subscribe_events());

    assert!(core.prepare_slideshow().is_err());
    assert_eq!(next_notice(&mut notices), "No images available for slideshow");

    core.collection().refresh().await.unwrap();
    let launch = core.prepare_slideshow().unwrap();
    let token = launch.token.clone().unwrap();
    assert!(launch.uris.is_empty());

    let session = core.start_slideshow(&launch).await.unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.uri, B);
    assert_eq!(snapshot.counter_label, "1 / 3");

    session.close(false).await.unwrap();
    assert!(core.handoff_cache().get(&token).is_none());

    // The token is gone and there is no literal fallback
    assert!(core.start_slideshow(&launch).await.is_err());
}

#[tokio::test]
async fn test_bootstrap_reopens_file_backed_tags() {
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join("gallery.db");
    let albums: Arc<dyn bridge_traits::SettingsStore> =
        Arc::new(SqliteSettingsStore::in_memory().await.unwrap());

    let config = || {
        CoreConfig::builder()
            .database_path(database.clone())
            .album_store(albums.clone())
            .media_index(Arc::new(granted_index()))
            .build()
            .unwrap()
    };

    let core = CoreService::bootstrap(config()).await.unwrap();
    let mut editor = core.open_tag_editor(A).await.unwrap();
    editor.add_tag("cat").await.unwrap();
    core.shutdown().await;

    let core = CoreService::bootstrap(config()).await.unwrap();
    let editor = core.open_tag_editor(A).await.unwrap();
    assert_eq!(editor.tags(), vec!["cat"]);
    core.shutdown().await;
}

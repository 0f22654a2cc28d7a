//! Dataset navigator implementation

use std::ops::Range;
use std::sync::{Arc, Weak};
use parking_lot::RwLock;
use tracing::{debug, info};

use super::state::{Channel, Cursor, Loaded, LoadedCategory, LoadedScene};
use super::{NavigatorCommand, NavigatorSnapshot, NavigatorSubscriber};
use crate::dataset::{Category, Kind, Locator};
use crate::error::{DatasetError, Result};
use crate::source::DatasetSource;

/// Browses one dataset source by category, scene and timestamp.
///
/// Every checkout/seek returns `true` only when it changed the current
/// state, so callers can skip redundant refreshes. The navigator is not
/// meant to be mutated from several threads; `lookup` and the prefetch
/// helpers only read and may run concurrently.
pub struct DatasetNavigator {
    source: Box<dyn DatasetSource>,
    /// Category to load while unloaded, mirrors the loaded one afterwards
    category: Category,
    loaded: Option<Loaded>,
    subscribers: RwLock<Vec<Weak<dyn NavigatorSubscriber>>>,
}

impl DatasetNavigator {
    /// Create an unloaded navigator that will open `category` first
    pub fn new(source: Box<dyn DatasetSource>, category: Category) -> Self {
        Self {
            source,
            category,
            loaded: None,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Load the dataset. No-op if it is already loaded.
    pub fn checkout_dataset(&mut self) -> Result<bool> {
        if self.loaded.is_some() {
            return Ok(false);
        }

        info!("Reloading nuScenes dataset: {}", self.source.name());
        self.source.open()?;
        let loaded = self.resolve_category(self.category)?;
        self.loaded = Some(loaded);
        info!("Reloaded nuScenes dataset: {}", self.source.name());

        self.notify_subscribers();
        Ok(true)
    }

    /// Switch category and open its first scene
    pub fn checkout_category(&mut self, category: Category) -> Result<bool> {
        let current = match &self.loaded {
            Some(loaded) => loaded.category.category,
            None => {
                let previous = std::mem::replace(&mut self.category, category);
                let result = self.checkout_dataset();
                if result.is_err() {
                    self.category = previous;
                }
                return result;
            }
        };
        if current == category {
            return Ok(false);
        }

        info!("Reloading nuScenes category: {}", category);
        let loaded = self.resolve_category(category)?;
        self.category = category;
        self.loaded = Some(loaded);

        self.notify_subscribers();
        Ok(true)
    }

    /// Switch to the scene at `index` and seek to its first timestamp
    pub fn checkout_scene(&mut self, index: usize) -> Result<bool> {
        let loaded = self.loaded.as_ref().ok_or_else(not_loaded)?;
        if loaded.scene.index == index {
            return Ok(false);
        }

        let scene = self.resolve_scene(&loaded.category, index)?;
        let cursor = self.resolve_cursor(&scene, scene.range.start)?;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.scene = scene;
            loaded.cursor = cursor;
        }

        self.notify_subscribers();
        Ok(true)
    }

    /// Browse to a timestamp, clamped into the scene's timestamp range
    pub fn seek(&mut self, timestamp: i64) -> Result<bool> {
        let loaded = self.loaded.as_ref().ok_or_else(not_loaded)?;
        let timestamp = loaded.scene.clamp(timestamp);
        if loaded.cursor.timestamp == timestamp {
            return Ok(false);
        }

        debug!("Seeking to the timestamp: {}", timestamp);
        let cursor = self.resolve_cursor(&loaded.scene, timestamp)?;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.cursor = cursor;
        }

        self.notify_subscribers();
        Ok(true)
    }

    /// Browse one millisecond forward
    pub fn seek_next(&mut self) -> Result<bool> {
        let timestamp = self.timestamp().ok_or_else(not_loaded)?;
        self.seek(timestamp.saturating_add(1))
    }

    /// Browse to the first timestamp
    pub fn seek_to_start(&mut self) -> Result<bool> {
        let range = self.timestamps().ok_or_else(not_loaded)?;
        self.seek(range.start)
    }

    /// Browse to the (exclusive) end of the timestamp range
    pub fn seek_to_end(&mut self) -> Result<bool> {
        let range = self.timestamps().ok_or_else(not_loaded)?;
        self.seek(range.end)
    }

    /// Execute a viewer command
    pub fn apply(&mut self, command: NavigatorCommand) -> Result<bool> {
        match command {
            NavigatorCommand::Load => self.checkout_dataset(),
            NavigatorCommand::SelectCategory(category) => self.checkout_category(category),
            NavigatorCommand::SelectScene(index) => self.checkout_scene(index),
            NavigatorCommand::SelectTimestamp(timestamp) => self.seek(timestamp),
            NavigatorCommand::SeekNext => self.seek_next(),
            NavigatorCommand::SeekToStart => self.seek_to_start(),
            NavigatorCommand::SeekToEnd => self.seek_to_end(),
        }
    }

    /// Resolve the file of `kind` at an arbitrary timestamp without
    /// touching the current state
    pub fn lookup(&self, kind: Kind, timestamp: i64) -> Result<String> {
        let loaded = self.loaded.as_ref().ok_or_else(not_loaded)?;
        self.resolve(loaded.scene.channel(kind), timestamp)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Root locator of the current category
    pub fn category_root(&self) -> Option<&Locator> {
        self.loaded.as_ref().map(|loaded| &loaded.category.root)
    }

    /// All scenes of the current category
    pub fn scenes(&self) -> &[String] {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.category.catalog.scenes())
            .unwrap_or(&[])
    }

    pub fn scene(&self) -> Option<&str> {
        self.loaded.as_ref().map(|loaded| loaded.scene.name.as_str())
    }

    pub fn scene_index(&self) -> Option<usize> {
        self.loaded.as_ref().map(|loaded| loaded.scene.index)
    }

    /// Current timestamp in milliseconds
    pub fn timestamp(&self) -> Option<i64> {
        self.loaded.as_ref().map(|loaded| loaded.cursor.timestamp)
    }

    /// Half-open range of browsable timestamps over the lidar channel
    pub fn timestamps(&self) -> Option<Range<i64>> {
        self.loaded.as_ref().map(|loaded| loaded.scene.range.clone())
    }

    /// URI of the current file of `kind`
    pub fn current(&self, kind: Kind) -> Option<&str> {
        self.loaded.as_ref().map(|loaded| loaded.cursor.uri(kind))
    }

    pub fn cam_front(&self) -> Option<&str> {
        self.current(Kind::CamFront)
    }

    pub fn lidar_top(&self) -> Option<&str> {
        self.current(Kind::LidarTop)
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Capture the current state
    pub fn snapshot(&self) -> NavigatorSnapshot {
        NavigatorSnapshot {
            source: self.source.name().to_string(),
            loaded: self.is_loaded(),
            category: self.category,
            scene: self.scene().map(str::to_string),
            scene_index: self.scene_index(),
            scene_count: self.scenes().len(),
            timestamp: self.timestamp(),
            timestamps: self.timestamps(),
            cam_front: self.cam_front().map(str::to_string),
            lidar_top: self.lidar_top().map(str::to_string),
        }
    }

    /// Add a subscriber; it is dropped automatically once its owner goes away
    pub fn add_subscriber(&self, subscriber: Arc<dyn NavigatorSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    fn notify_subscribers(&self) {
        let snapshot = self.snapshot();
        let mut subscribers = self.subscribers.write();

        // Remove any dead weak references
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_state_changed(&snapshot);
            }
        }
    }

    fn resolve_category(&self, category: Category) -> Result<Loaded> {
        let root = self.source.category_root(category);
        let catalog = self.source.list_scenes(category)?;
        info!("Found {} scenes in {}", catalog.len(), root);

        let category = LoadedCategory {
            category,
            root,
            catalog,
        };
        let scene = self.resolve_scene(&category, 0)?;
        let cursor = self.resolve_cursor(&scene, scene.range.start)?;

        Ok(Loaded {
            category,
            scene,
            cursor,
        })
    }

    fn resolve_scene(&self, category: &LoadedCategory, index: usize) -> Result<LoadedScene> {
        let name = category.catalog.get(index)?.to_string();
        info!("Reloading nuScenes scene: {}", name);

        let camera = self.load_channel(category.category, Kind::CamFront, &name)?;
        let lidar = self.load_channel(category.category, Kind::LidarTop, &name)?;
        let range = lidar.index.range().ok_or_else(|| {
            DatasetError::InvalidState(format!("Scene {} has no {} files", name, Kind::LidarTop))
        })?;

        Ok(LoadedScene {
            index,
            name,
            camera,
            lidar,
            range,
        })
    }

    fn load_channel(&self, category: Category, kind: Kind, scene: &str) -> Result<Channel> {
        let ext = self.source.extension(kind);
        let (base, index) = self.source.list_timestamps(category, kind, scene, ext)?;
        debug!("Indexed {} {} files of scene {}", index.len(), kind, scene);
        Ok(Channel { base, index })
    }

    fn resolve_cursor(&self, scene: &LoadedScene, timestamp: i64) -> Result<Cursor> {
        Ok(Cursor {
            timestamp,
            cam_front: self.resolve(&scene.camera, timestamp)?,
            lidar_top: self.resolve(&scene.lidar, timestamp)?,
        })
    }

    fn resolve(&self, channel: &Channel, timestamp: i64) -> Result<String> {
        let filename = channel.index.seek_by(timestamp)?;
        self.source.materialize(&channel.base, filename)
    }
}

impl Drop for DatasetNavigator {
    fn drop(&mut self) {
        info!("Finalizing nuScenes dataset: {}", self.source.name());
    }
}

fn not_loaded() -> DatasetError {
    DatasetError::InvalidState("Dataset is not loaded".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySource;
    use parking_lot::Mutex;

    fn two_file_scene() -> MemorySource {
        MemorySource::new()
            .with_files(
                Category::Samples,
                Kind::CamFront,
                &["n001__CAM_FRONT__100.jpg", "n001__CAM_FRONT__200.jpg"],
            )
            .with_files(
                Category::Samples,
                Kind::LidarTop,
                &["n001__LIDAR_TOP__100.usd", "n001__LIDAR_TOP__300.usd"],
            )
    }

    fn two_scenes_two_categories() -> MemorySource {
        two_file_scene()
            .with_files(
                Category::Samples,
                Kind::CamFront,
                &["n002__CAM_FRONT__1000.jpg", "n002__CAM_FRONT__1100.jpg"],
            )
            .with_files(
                Category::Samples,
                Kind::LidarTop,
                &["n002__LIDAR_TOP__1000.usd", "n002__LIDAR_TOP__1050.usd", "n002__LIDAR_TOP__1100.usd"],
            )
            .with_files(Category::Sweeps, Kind::CamFront, &["n007__CAM_FRONT__5.jpg"])
            .with_files(
                Category::Sweeps,
                Kind::LidarTop,
                &["n007__LIDAR_TOP__5.usd", "n007__LIDAR_TOP__9.usd"],
            )
    }

    fn loaded(source: MemorySource) -> DatasetNavigator {
        let mut navigator = DatasetNavigator::new(Box::new(source), Category::Samples);
        assert!(navigator.checkout_dataset().unwrap());
        navigator
    }

    #[test]
    fn test_two_file_scene() {
        let mut navigator = loaded(two_file_scene());

        assert_eq!(navigator.scenes(), &["n001".to_string()]);
        assert_eq!(navigator.timestamps(), Some(100..300));
        assert_eq!(navigator.timestamp(), Some(100));

        assert!(navigator.seek(250).unwrap());
        assert_eq!(navigator.cam_front(), Some("mem://samples/CAM_FRONT/n001__CAM_FRONT__200.jpg"));
        assert_eq!(navigator.lidar_top(), Some("mem://samples/LIDAR_TOP/n001__LIDAR_TOP__100.usd"));
    }

    #[test]
    fn test_checkout_dataset_is_idempotent() {
        let mut navigator = loaded(two_file_scene());
        assert!(!navigator.checkout_dataset().unwrap());
        assert!(!navigator.apply(NavigatorCommand::Load).unwrap());
    }

    #[test]
    fn test_idempotent_transitions() {
        let mut navigator = loaded(two_scenes_two_categories());

        assert!(navigator.checkout_category(Category::Sweeps).unwrap());
        assert!(!navigator.checkout_category(Category::Sweeps).unwrap());
        assert_eq!(navigator.scenes(), &["n007".to_string()]);

        assert!(navigator.checkout_category(Category::Samples).unwrap());
        assert!(navigator.checkout_scene(1).unwrap());
        assert!(!navigator.checkout_scene(1).unwrap());

        assert!(navigator.seek(1060).unwrap());
        assert!(!navigator.seek(1060).unwrap());
    }

    #[test]
    fn test_checkout_scene_round_trip() {
        let mut navigator = loaded(two_scenes_two_categories());
        for index in [1, 0, 1] {
            navigator.checkout_scene(index).unwrap();
            assert_eq!(navigator.scene(), Some(navigator.scenes()[index].as_str()));
            assert_eq!(navigator.scene_index(), Some(index));
            assert_eq!(navigator.timestamp(), navigator.timestamps().map(|r| r.start));
        }
    }

    #[test]
    fn test_seek_stays_in_range() {
        let mut navigator = loaded(two_scenes_two_categories());
        navigator.checkout_scene(1).unwrap();
        let range = navigator.timestamps().unwrap();

        for target in [i64::MIN, 0, 999, 1000, 1075, 1100, 1101, i64::MAX] {
            navigator.seek(target).unwrap();
            let timestamp = navigator.timestamp().unwrap();
            assert!(range.start <= timestamp && timestamp <= range.end);
        }

        assert!(navigator.seek_to_start().unwrap());
        assert_eq!(navigator.timestamp(), Some(1000));
        assert!(navigator.seek_next().unwrap());
        assert_eq!(navigator.timestamp(), Some(1001));
        assert!(navigator.seek_to_end().unwrap());
        assert_eq!(navigator.timestamp(), Some(1100));
        assert!(!navigator.seek_next().unwrap());
    }

    #[test]
    fn test_lookup_does_not_move_cursor() {
        let source = two_file_scene();
        let navigator = loaded(source);
        let before = navigator.snapshot();

        let uri = navigator.lookup(Kind::CamFront, 180).unwrap();
        assert_eq!(uri, "mem://samples/CAM_FRONT/n001__CAM_FRONT__100.jpg");
        assert_eq!(navigator.snapshot(), before);
    }

    #[test]
    fn test_missing_root_stays_unloaded() {
        let mut navigator = DatasetNavigator::new(Box::new(MemorySource::missing()), Category::Samples);
        let err = navigator.checkout_dataset().unwrap_err();
        assert!(err.is_not_found());
        assert!(!navigator.is_loaded());
        assert!(navigator.scenes().is_empty());
        assert!(matches!(navigator.seek(5), Err(DatasetError::InvalidState(_))));
    }

    #[test]
    fn test_failed_category_keeps_previous_state() {
        let mut navigator = loaded(two_file_scene());
        let before = navigator.snapshot();

        // Sweeps has no scenes in this fixture
        let err = navigator.checkout_category(Category::Sweeps).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidState(_)));
        assert_eq!(navigator.snapshot(), before);
        assert_eq!(navigator.category(), Category::Samples);
    }

    #[test]
    fn test_scene_out_of_bounds() {
        let mut navigator = loaded(two_file_scene());
        assert!(matches!(navigator.checkout_scene(4), Err(DatasetError::InvalidState(_))));
        assert_eq!(navigator.scene_index(), Some(0));
    }

    #[test]
    fn test_category_before_load_opens_dataset() {
        let mut navigator = DatasetNavigator::new(Box::new(two_scenes_two_categories()), Category::Samples);
        assert!(navigator.checkout_category(Category::Sweeps).unwrap());
        assert!(navigator.is_loaded());
        assert_eq!(navigator.scene(), Some("n007"));
    }

    struct Recorder {
        seen: Mutex<Vec<NavigatorSnapshot>>,
    }

    impl NavigatorSubscriber for Recorder {
        fn on_state_changed(&self, snapshot: &NavigatorSnapshot) {
            self.seen.lock().push(snapshot.clone());
        }
    }

    #[test]
    fn test_subscribers_see_only_transitions() {
        let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        let mut navigator = DatasetNavigator::new(Box::new(two_file_scene()), Category::Samples);
        navigator.add_subscriber(recorder.clone());

        navigator.apply(NavigatorCommand::Load).unwrap();
        navigator.apply(NavigatorCommand::SelectTimestamp(200)).unwrap();
        navigator.apply(NavigatorCommand::SelectTimestamp(200)).unwrap();
        navigator.apply(NavigatorCommand::SelectScene(0)).unwrap();

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].timestamp, Some(200));
        assert_eq!(seen[1].scene.as_deref(), Some("n001"));
    }
}

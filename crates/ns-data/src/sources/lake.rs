//! Data lake dataset source with a local on-disk cache

use std::sync::Arc;
use tracing::{debug, info};

use ns_core::{
    file_uri, Category, DatasetError, DatasetSource, Kind, Locator, Result, SceneCatalog,
    TimestampIndex,
};
use crate::cache::{first_binary, string_column, SourceCache};
use crate::config::ChannelExtensions;
use crate::lake::{quote, LakeClient};

/// Dataset stored in a lake's `rootfs` relation, parents `/<category>/<KIND>`
pub struct LakeSource {
    url: String,
    client: Arc<dyn LakeClient>,
    cache: SourceCache,
    extensions: ChannelExtensions,
}

impl LakeSource {
    /// Create a source for `url` caching under `cache_dir`
    pub fn new(url: impl Into<String>, client: Arc<dyn LakeClient>, cache_dir: impl AsRef<std::path::Path>) -> Self {
        let url = url.into();
        let cache = SourceCache::new(cache_dir, &url);
        Self {
            url,
            client,
            cache,
            extensions: ChannelExtensions::default(),
        }
    }

    /// Use custom channel extensions
    pub fn with_extensions(mut self, extensions: ChannelExtensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Values of `column` from a listing query, served from the snapshot
    /// cache when present
    fn list(&self, key: &str, column: &str, sql: &str) -> Result<Vec<String>> {
        if let Some(batches) = self.cache.read_listing(column, key)? {
            return string_column(&batches, column);
        }

        let batch = self.client.sql(sql)?;
        self.cache.write_listing(column, key, &batch)?;
        debug!("Cached {} {} rows for {}", batch.num_rows(), column, key);
        string_column(&[batch], column)
    }
}

impl DatasetSource for LakeSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn open(&mut self) -> Result<()> {
        let probe = self.client.sql("SELECT name FROM rootfs LIMIT 1")?;
        if probe.num_rows() == 0 {
            return Err(DatasetError::DatasetNotFound(self.url.clone()));
        }
        info!("Connected to nuScenes lake {} (cache: {})", self.url, self.cache.root().display());
        Ok(())
    }

    fn category_root(&self, category: Category) -> Locator {
        Locator::new(format!("/{}", category))
    }

    fn list_scenes(&self, category: Category) -> Result<SceneCatalog> {
        let kind = Kind::LidarTop;
        let parent = channel_parent(category, kind);
        let scenes = self.list(
            &format!("{}__{}", category, kind),
            "scene",
            &scenes_query(&parent, kind, self.extensions.get(kind)),
        )?;
        Ok(SceneCatalog::new(scenes))
    }

    fn list_timestamps(
        &self,
        category: Category,
        kind: Kind,
        scene: &str,
        ext: &str,
    ) -> Result<(Locator, TimestampIndex)> {
        let parent = channel_parent(category, kind);
        let names = self.list(
            &format!("{}__{}{}", category, scene, kind.marker()),
            "name",
            &names_query(&parent, scene, kind, ext),
        )?;
        let index = TimestampIndex::from_filenames(names, scene, kind, ext)?;
        Ok((Locator::new(parent), index))
    }

    fn materialize(&self, base: &Locator, filename: &str) -> Result<String> {
        let path = self.cache.file_path(base.as_str(), filename);
        if path.exists() {
            debug!("File cache hit: {}", path.display());
            return Ok(file_uri(&path));
        }

        debug!("Fetching {}/{}", base, filename);
        let batch = self.client.sql(&body_query(base.as_str(), filename))?;
        let data = first_binary(&batch, "data").ok_or_else(|| {
            DatasetError::transport(format!("No data for {}/{} in {}", base, filename, self.url))
        })?;
        self.cache.write_file(&path, &data)?;

        Ok(file_uri(&path))
    }

    fn extension(&self, kind: Kind) -> &str {
        self.extensions.get(kind)
    }
}

fn channel_parent(category: Category, kind: Kind) -> String {
    format!("/{}/{}", category, kind)
}

fn scenes_query(parent: &str, kind: Kind, ext: &str) -> String {
    let marker = quote(&kind.marker());
    format!(
        "SELECT DISTINCT
            SUBSTR(name, 1, INSTR(name, {marker}) - 1) AS scene
        FROM
            rootfs
        WHERE
            name LIKE {pattern}
                AND INSTR(name, {marker}) > 1
                AND parent == {parent}
        ORDER BY
            scene ASC",
        marker = marker,
        pattern = quote(&format!("n%{ext}")),
        parent = quote(parent),
    )
}

fn names_query(parent: &str, scene: &str, kind: Kind, ext: &str) -> String {
    format!(
        "SELECT DISTINCT
            name
        FROM
            rootfs
        WHERE
            name LIKE {pattern}
                AND parent == {parent}
        ORDER BY
            name ASC",
        pattern = quote(&format!("{}{}%{}", scene, kind.marker(), ext)),
        parent = quote(parent),
    )
}

fn body_query(parent: &str, filename: &str) -> String {
    format!(
        "SELECT
            data
        FROM
            rootfs
        WHERE
            name == {name} AND parent == {parent}
        LIMIT 1",
        name = quote(filename),
        parent = quote(parent),
    )
}

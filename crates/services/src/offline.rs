//! Versioned offline asset cache.
//!
//! Install pre-fetches every path in the manifest into a cache named after the
//! manifest version. Lookups hit that cache first and fall back to the fetcher,
//! storing what they fetch. Activation purges caches left by other versions.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use quiz_core::model::Word;

use crate::error::OfflineError;

/// Paths every install carries regardless of the word list.
pub const SHELL_ASSETS: [&str; 3] = ["index.html", "manifest.json", "sounds/cues.ogg"];

const CACHE_PREFIX: &str = "quiz-assets";

/// A fixed list of asset paths tagged with a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    version: String,
    paths: Vec<String>,
}

impl AssetManifest {
    /// Build a manifest, dropping duplicate paths while keeping first-seen order.
    #[must_use]
    pub fn new(version: impl Into<String>, paths: impl IntoIterator<Item = String>) -> Self {
        let mut seen = BTreeSet::new();
        let paths = paths
            .into_iter()
            .filter(|path| seen.insert(path.clone()))
            .collect();
        Self {
            version: version.into(),
            paths,
        }
    }

    /// Shell assets plus one audio clip per word with an audio key.
    #[must_use]
    pub fn for_words(version: impl Into<String>, words: &[Word]) -> Self {
        let shell = SHELL_ASSETS.iter().map(|p| (*p).to_owned());
        let audio = words
            .iter()
            .filter_map(Word::audio_key)
            .map(|key| format!("audio/{key}.mp3"));
        Self::new(version, shell.chain(audio))
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Name of the cache holding this version's assets.
    #[must_use]
    pub fn cache_name(&self) -> String {
        format!("{CACHE_PREFIX}-{}", self.version)
    }
}

/// Source of asset bytes when the cache misses.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns `OfflineError::Fetch` when the asset cannot be retrieved.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, OfflineError>;
}

/// Where a lookup was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Arc<[u8]>,
    pub source: AssetSource,
}

type CacheEntries = HashMap<String, Arc<[u8]>>;

/// Named caches that outlive any one manifest version.
///
/// Clones share the same caches, so an install for a new version sees what an
/// older install left behind.
#[derive(Clone, Default)]
pub struct CacheStorage {
    caches: Arc<Mutex<BTreeMap<String, CacheEntries>>>,
}

impl CacheStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, CacheEntries>> {
        self.caches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Names of every cache currently held.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

/// Cache-first asset store for one manifest version.
#[derive(Clone)]
pub struct AssetCache {
    manifest: AssetManifest,
    fetcher: Arc<dyn AssetFetcher>,
    storage: CacheStorage,
}

impl AssetCache {
    #[must_use]
    pub fn new(
        manifest: AssetManifest,
        fetcher: Arc<dyn AssetFetcher>,
        storage: CacheStorage,
    ) -> Self {
        Self {
            manifest,
            fetcher,
            storage,
        }
    }

    #[must_use]
    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    /// Fetch every manifest path into the current version's cache.
    ///
    /// All or nothing: if any fetch fails the cache is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the first `OfflineError::Fetch` encountered.
    pub async fn install(&self) -> Result<usize, OfflineError> {
        let mut fetched = CacheEntries::with_capacity(self.manifest.paths.len());
        for path in &self.manifest.paths {
            let bytes = self.fetcher.fetch(path).await?;
            fetched.insert(path.clone(), Arc::from(bytes));
        }

        let count = fetched.len();
        let name = self.manifest.cache_name();
        self.storage
            .lock()
            .entry(name.clone())
            .or_default()
            .extend(fetched);
        tracing::info!(cache = %name, count, "installed offline assets");
        Ok(count)
    }

    /// Delete every cache whose name differs from the current version's.
    ///
    /// Returns the purged cache names.
    pub fn activate(&self) -> Vec<String> {
        let current = self.manifest.cache_name();
        let stale: Vec<String> = self
            .storage
            .names()
            .into_iter()
            .filter(|name| *name != current)
            .collect();

        let mut caches = self.storage.lock();
        for name in &stale {
            caches.remove(name);
            tracing::info!(cache = %name, "deleted stale offline cache");
        }
        stale
    }

    /// Serve `path` from the current cache, else fetch and store it.
    ///
    /// # Errors
    ///
    /// Returns `OfflineError::Fetch` if the asset is not cached and the fetcher fails.
    pub async fn get(&self, path: &str) -> Result<Asset, OfflineError> {
        let name = self.manifest.cache_name();
        let cached = self
            .storage
            .lock()
            .get(&name)
            .and_then(|entries| entries.get(path).cloned());
        if let Some(bytes) = cached {
            tracing::debug!(path, "offline cache hit");
            return Ok(Asset {
                bytes,
                source: AssetSource::Cache,
            });
        }

        tracing::debug!(path, "offline cache miss, fetching");
        let bytes: Arc<[u8]> = Arc::from(self.fetcher.fetch(path).await?);
        self.storage
            .lock()
            .entry(name)
            .or_default()
            .insert(path.to_owned(), Arc::clone(&bytes));
        Ok(Asset {
            bytes,
            source: AssetSource::Network,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::WordId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        offline: bool,
    }

    #[async_trait]
    impl AssetFetcher for CountingFetcher {
        async fn fetch(&self, path: &str) -> Result<Vec<u8>, OfflineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline || path.contains("missing") {
                return Err(OfflineError::Fetch {
                    path: path.to_owned(),
                    reason: "offline".into(),
                });
            }
            Ok(path.as_bytes().to_vec())
        }
    }

    fn manifest() -> AssetManifest {
        let words = vec![
            Word::new(WordId::new(1), "abandon", "to give up")
                .unwrap()
                .with_audio_key("abandon"),
            Word::new(WordId::new(2), "ability", "power").unwrap(),
        ];
        AssetManifest::for_words("v2", &words)
    }

    fn cache_for(manifest: AssetManifest, fetcher: Arc<CountingFetcher>) -> AssetCache {
        AssetCache::new(manifest, fetcher, CacheStorage::new())
    }

    #[test]
    fn manifest_lists_shell_and_audio_once() {
        let manifest = AssetManifest::new(
            "v1",
            ["a.html".to_owned(), "b.html".to_owned(), "a.html".to_owned()],
        );
        assert_eq!(manifest.paths(), ["a.html", "b.html"]);

        let manifest = self::manifest();
        assert_eq!(manifest.paths().len(), SHELL_ASSETS.len() + 1);
        assert!(manifest.paths().contains(&"audio/abandon.mp3".to_owned()));
        assert_eq!(manifest.cache_name(), "quiz-assets-v2");
    }

    #[tokio::test]
    async fn installed_assets_are_served_from_cache() {
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = cache_for(manifest(), fetcher.clone());

        assert_eq!(cache.install().await.unwrap(), 4);
        let calls = fetcher.calls.load(Ordering::SeqCst);

        let asset = cache.get("audio/abandon.mp3").await.unwrap();
        assert_eq!(asset.source, AssetSource::Cache);
        assert_eq!(&*asset.bytes, b"audio/abandon.mp3");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn misses_fall_back_to_fetcher_and_are_stored() {
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = cache_for(manifest(), fetcher.clone());

        let first = cache.get("extra.css").await.unwrap();
        assert_eq!(first.source, AssetSource::Network);
        let second = cache.get("extra.css").await.unwrap();
        assert_eq!(second.source, AssetSource::Cache);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_install_leaves_no_partial_cache() {
        let manifest = AssetManifest::new("v3", ["ok.html".to_owned(), "missing.html".to_owned()]);
        let cache = cache_for(manifest, Arc::new(CountingFetcher::default()));

        let err = cache.install().await.unwrap_err();
        assert!(matches!(err, OfflineError::Fetch { ref path, .. } if path == "missing.html"));
        assert!(cache.storage.names().is_empty());
    }

    #[tokio::test]
    async fn offline_miss_is_an_error() {
        let fetcher = Arc::new(CountingFetcher {
            offline: true,
            ..CountingFetcher::default()
        });
        let cache = cache_for(manifest(), fetcher);
        assert!(cache.get("index.html").await.is_err());
    }

    #[tokio::test]
    async fn activate_purges_other_versions() {
        let storage = CacheStorage::new();
        let fetcher = Arc::new(CountingFetcher::default());

        let old_manifest = AssetManifest::new("v1", ["index.html".to_owned()]);
        let old = AssetCache::new(old_manifest, fetcher.clone(), storage.clone());
        old.install().await.unwrap();
        assert!(old.activate().is_empty());

        let cache = AssetCache::new(manifest(), fetcher, storage.clone());
        cache.install().await.unwrap();
        assert_eq!(
            storage.names(),
            vec!["quiz-assets-v1".to_owned(), "quiz-assets-v2".to_owned()]
        );

        let purged = cache.activate();
        assert_eq!(purged, vec!["quiz-assets-v1".to_owned()]);
        assert_eq!(storage.names(), vec!["quiz-assets-v2".to_owned()]);

        let asset = cache.get("index.html").await.unwrap();
        assert_eq!(asset.source, AssetSource::Cache);
        assert_eq!(&*asset.bytes, b"index.html");
    }
}

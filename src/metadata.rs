use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::RwLock;

/// Default per-fetch deadline.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(60);

/// Decoded RGBA8 preview image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedRgbaImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 pixels, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

/// Sidecar metadata for a focused entry.
#[derive(Clone, Debug, Default)]
pub struct MetadataRecord {
    /// Display name of the described entry.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Raw encoded preview image bytes, for the UI's own texture loader.
    pub image_data: Option<Vec<u8>>,
    /// Decoded preview, filled when the `preview-image` feature is enabled.
    pub image: Option<DecodedRgbaImage>,
    /// Ordered key/value properties for panel display.
    pub properties: IndexMap<String, String>,
}

impl MetadataRecord {
    /// New record for an entry name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach encoded preview image bytes.
    pub fn with_image_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.image_data = Some(bytes);
        self
    }

    /// Append one property.
    pub fn add_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Whether the record carries nothing worth showing. Distinguishes
    /// "loaded, empty" from "not yet loaded" (the latter is `None` upstream).
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.image_data.is_none() && self.properties.is_empty()
    }
}

type ProviderFn = dyn Fn(&Path) -> Option<MetadataRecord> + Send + Sync;

/// Registry of per-extension metadata providers, shared with fetch threads.
#[derive(Default)]
pub struct MetadataProviders {
    handlers: RwLock<HashMap<String, Box<ProviderFn>>>,
}

impl MetadataProviders {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for an extension (case-insensitive, dot optional).
    /// Replaces any previous provider for the same extension.
    pub fn register<F>(&self, extension: &str, provider: F)
    where
        F: Fn(&Path) -> Option<MetadataRecord> + Send + Sync + 'static,
    {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();
        self.handlers.write().insert(key, Box::new(provider));
    }

    fn lookup(&self, path: &Path) -> Option<MetadataRecord> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        let handlers = self.handlers.read();
        let provider = handlers.get(&ext)?;
        provider(path)
    }
}

struct FetchOutcome {
    generation: u64,
    record: Option<MetadataRecord>,
}

struct ActiveFetch {
    generation: u64,
    cancelled: Arc<AtomicBool>,
    deadline: Instant,
}

/// Loads sidecar metadata for the focused entry, one fetch in flight at a
/// time, committed last-writer-wins like directory scans. Any failure mode
/// (no provider, provider returned nothing, panic, timeout) commits "no
/// metadata" and is never surfaced as a user error.
pub struct MetadataCoordinator {
    providers: Arc<MetadataProviders>,
    timeout: Duration,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
    generation: u64,
    active: Option<ActiveFetch>,
    focused: Option<PathBuf>,
    current: Option<MetadataRecord>,
}

impl MetadataCoordinator {
    /// New coordinator over a provider registry.
    pub fn new(providers: Arc<MetadataProviders>, timeout: Duration) -> Self {
        let (tx, rx) = channel();
        Self {
            providers,
            timeout,
            tx,
            rx,
            generation: 0,
            active: None,
            focused: None,
            current: None,
        }
    }

    /// Move focus. A path equal to the current focus is a no-op; anything
    /// else cancels the in-flight fetch, clears the shown record, and starts
    /// a new fetch (when `path` is `Some`).
    pub fn focus(&mut self, path: Option<&Path>) {
        if self.focused.as_deref() == path {
            return;
        }
        self.cancel_active();
        self.current = None;
        self.focused = path.map(Path::to_path_buf);
        if let Some(path) = path {
            self.spawn(path.to_path_buf());
        }
    }

    /// The committed record for the focused entry, if any.
    pub fn current(&self) -> Option<&MetadataRecord> {
        self.current.as_ref()
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.active.is_some()
    }

    /// Cancel everything and clear the record.
    pub fn close(&mut self) {
        self.cancel_active();
        self.focused = None;
        self.current = None;
    }

    /// Drain fetch outcomes; only the live token's outcome commits.
    pub fn poll(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            let current = self
                .active
                .as_ref()
                .map(|a| a.generation == outcome.generation && !a.cancelled.load(Ordering::Relaxed))
                .unwrap_or(false);
            if !current {
                continue;
            }
            self.active = None;
            // Empty records are suppressed along with failures.
            self.current = outcome.record.filter(|r| !r.is_empty());
            trace_metadata_committed(outcome.generation, self.current.is_some());
        }
        if let Some(a) = &self.active {
            if Instant::now() >= a.deadline {
                a.cancelled.store(true, Ordering::Relaxed);
                self.active = None;
            }
        }
    }

    fn cancel_active(&mut self) {
        if let Some(a) = self.active.take() {
            a.cancelled.store(true, Ordering::Relaxed);
        }
    }

    fn spawn(&mut self, path: PathBuf) {
        self.generation += 1;
        let generation = self.generation;
        let cancelled = Arc::new(AtomicBool::new(false));
        self.active = Some(ActiveFetch {
            generation,
            cancelled,
            deadline: Instant::now() + self.timeout,
        });

        let providers = self.providers.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let record = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let mut record = providers.lookup(&path);
                if let Some(r) = record.as_mut() {
                    decode_preview(r);
                }
                record
            }))
            .unwrap_or(None);
            let _ = tx.send(FetchOutcome { generation, record });
        });
    }
}

#[cfg(feature = "preview-image")]
fn decode_preview(record: &mut MetadataRecord) {
    crate::metadata_image::decode_preview_image(record);
}
#[cfg(not(feature = "preview-image"))]
fn decode_preview(_record: &mut MetadataRecord) {}

#[cfg(feature = "tracing")]
fn trace_metadata_committed(generation: u64, has_record: bool) {
    tracing::trace!(generation, has_record, "metadata committed");
}
#[cfg(not(feature = "tracing"))]
fn trace_metadata_committed(_generation: u64, _has_record: bool) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_until_idle(c: &mut MetadataCoordinator) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while c.is_loading() {
            c.poll();
            assert!(Instant::now() < deadline, "fetch did not complete");
            std::thread::sleep(Duration::from_millis(5));
        }
        c.poll();
    }

    #[test]
    fn commits_record_for_registered_extension() {
        let providers = Arc::new(MetadataProviders::new());
        providers.register("txt", |p: &Path| {
            Some(
                MetadataRecord::new(p.file_name()?.to_string_lossy())
                    .with_description("a text file")
                    .add_property("Lines", "3"),
            )
        });
        let mut c = MetadataCoordinator::new(providers, DEFAULT_METADATA_TIMEOUT);
        c.focus(Some(Path::new("/tmp/a.txt")));
        poll_until_idle(&mut c);
        let record = c.current().unwrap();
        assert_eq!(record.name, "a.txt");
        assert_eq!(record.description.as_deref(), Some("a text file"));
        assert_eq!(record.properties.get("Lines").map(String::as_str), Some("3"));
    }

    #[test]
    fn unregistered_extension_commits_nothing() {
        let providers = Arc::new(MetadataProviders::new());
        let mut c = MetadataCoordinator::new(providers, DEFAULT_METADATA_TIMEOUT);
        c.focus(Some(Path::new("/tmp/a.bin")));
        poll_until_idle(&mut c);
        assert!(c.current().is_none());
    }

    #[test]
    fn empty_record_is_suppressed() {
        let providers = Arc::new(MetadataProviders::new());
        providers.register("txt", |p: &Path| {
            Some(MetadataRecord::new(p.file_name()?.to_string_lossy()))
        });
        let mut c = MetadataCoordinator::new(providers, DEFAULT_METADATA_TIMEOUT);
        c.focus(Some(Path::new("/tmp/a.txt")));
        poll_until_idle(&mut c);
        assert!(c.current().is_none());
    }

    #[test]
    fn panicking_provider_is_contained() {
        let providers = Arc::new(MetadataProviders::new());
        providers.register("txt", |_: &Path| -> Option<MetadataRecord> {
            panic!("provider bug")
        });
        let mut c = MetadataCoordinator::new(providers, DEFAULT_METADATA_TIMEOUT);
        c.focus(Some(Path::new("/tmp/a.txt")));
        poll_until_idle(&mut c);
        assert!(c.current().is_none());
    }

    #[test]
    fn stale_fetch_is_discarded_after_refocus() {
        let providers = Arc::new(MetadataProviders::new());
        providers.register("txt", |p: &Path| {
            let name = p.file_name()?.to_string_lossy().to_string();
            if name.starts_with("slow") {
                std::thread::sleep(Duration::from_millis(150));
            }
            Some(MetadataRecord::new(name).with_description("d"))
        });
        let mut c = MetadataCoordinator::new(providers, DEFAULT_METADATA_TIMEOUT);
        c.focus(Some(Path::new("/tmp/slow.txt")));
        // refocus while the first fetch is still sleeping
        c.focus(Some(Path::new("/tmp/fast.txt")));
        poll_until_idle(&mut c);
        assert_eq!(c.current().unwrap().name, "fast.txt");
        // the slow fetch finishes later; its record must never commit
        std::thread::sleep(Duration::from_millis(200));
        c.poll();
        assert_eq!(c.current().unwrap().name, "fast.txt");
    }

    #[test]
    fn refocus_same_path_is_noop_and_none_clears() {
        let providers = Arc::new(MetadataProviders::new());
        providers.register("txt", |p: &Path| {
            Some(MetadataRecord::new(p.file_name()?.to_string_lossy()).with_description("d"))
        });
        let mut c = MetadataCoordinator::new(providers, DEFAULT_METADATA_TIMEOUT);
        c.focus(Some(Path::new("/tmp/a.txt")));
        poll_until_idle(&mut c);
        assert!(c.current().is_some());
        // same path keeps the record and spawns nothing
        c.focus(Some(Path::new("/tmp/a.txt")));
        assert!(!c.is_loading());
        assert!(c.current().is_some());
        // clearing focus drops it
        c.focus(None);
        assert!(c.current().is_none());
    }
}

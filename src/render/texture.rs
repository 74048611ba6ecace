//! Texture cache and asynchronous loading.
//!
//! Decoded pixels live in a [`TextureSource`] shared by every [`Texture`]
//! cut from the same URL. Each part gets its own `Texture` so it can carry
//! its own repeat factors without reloading the image.
//!
//! Loads are fire-and-forget. A texture is usable immediately and reports
//! [`SourceState::Pending`] until [`TextureCache::poll_loads`] installs the
//! decoded image. Completions for sources nobody holds anymore are dropped.
//!
//! Everything here is single-threaded (`Rc`). Only the loader's decode
//! work runs elsewhere, and it hands back owned pixels through a channel.
//! A multi-threaded host would need to guard cache insertion so two
//! callers cannot start the same load twice.

use image::RgbaImage;
use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureColorSpace {
    #[default]
    Srgb,
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampler {
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub repeat: [f32; 2],
    pub color_space: TextureColorSpace,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
            repeat: [1.0, 1.0],
            color_space: TextureColorSpace::Srgb,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("unsupported texture URL '{0}'")]
    UnsupportedUrl(String),
}

#[derive(Debug)]
pub enum SourceState {
    Pending,
    Ready(RgbaImage),
    Failed(String),
}

/// Decoded image data for one URL.
#[derive(Debug)]
pub struct TextureSource {
    url: String,
    state: RefCell<SourceState>,
    version: Cell<u32>,
}

impl TextureSource {
    fn pending(url: &str) -> Self {
        Self {
            url: url.to_string(),
            state: RefCell::new(SourceState::Pending),
            version: Cell::new(0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> Ref<'_, SourceState> {
        self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), SourceState::Ready(_))
    }

    /// Bumped whenever the pixels change; renderers compare it to decide on re-upload.
    pub fn version(&self) -> u32 {
        self.version.get()
    }

    fn finish(&self, result: Result<RgbaImage, TextureError>) {
        let next = match result {
            Ok(image) => SourceState::Ready(image),
            Err(err) => SourceState::Failed(err.to_string()),
        };
        *self.state.borrow_mut() = next;
        self.version.set(self.version.get().wrapping_add(1));
    }
}

/// A sampled view of a [`TextureSource`].
#[derive(Debug)]
pub struct Texture {
    source: Rc<TextureSource>,
    sampler: Cell<Sampler>,
    needs_upload: Cell<bool>,
}

impl Texture {
    fn new(source: Rc<TextureSource>, sampler: Sampler) -> Self {
        Self {
            source,
            sampler: Cell::new(sampler),
            needs_upload: Cell::new(true),
        }
    }

    /// Shares the pixels, copies the sampler, and flags the copy for upload.
    fn clone_for_part(&self) -> Self {
        Self::new(Rc::clone(&self.source), self.sampler.get())
    }

    pub fn source(&self) -> &TextureSource {
        &self.source
    }

    pub fn url(&self) -> &str {
        self.source.url()
    }

    pub fn sampler(&self) -> Sampler {
        self.sampler.get()
    }

    pub fn repeat(&self) -> [f32; 2] {
        self.sampler.get().repeat
    }

    fn set_repeat(&self, repeat: [f32; 2]) {
        let mut sampler = self.sampler.get();
        if sampler.repeat != repeat {
            sampler.repeat = repeat;
            self.sampler.set(sampler);
            self.needs_upload.set(true);
        }
    }

    pub fn needs_upload(&self) -> bool {
        self.needs_upload.get()
    }

    /// Called by the renderer once it has pushed this texture to the GPU.
    pub fn mark_uploaded(&self) {
        self.needs_upload.set(false);
    }
}

/// Result of one asynchronous load.
#[derive(Debug)]
pub struct LoadOutcome {
    pub url: String,
    pub result: Result<RgbaImage, TextureError>,
}

/// Starts texture decodes and reports them later.
pub trait TextureLoader {
    /// Begins loading `url`. Must not block on the decode.
    fn request(&mut self, url: &str);
    /// Drains loads finished since the last call.
    fn poll(&mut self) -> Vec<LoadOutcome>;
}

/// Decodes image files with the `image` crate on worker threads.
pub struct ImageFileLoader {
    root: PathBuf,
    sender: Sender<LoadOutcome>,
    receiver: Receiver<LoadOutcome>,
}

impl ImageFileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            root: root.into(),
            sender,
            receiver,
        }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, TextureError> {
        if url.contains("://") {
            return Err(TextureError::UnsupportedUrl(url.to_string()));
        }
        Ok(self.root.join(url.trim_start_matches('/')))
    }
}

impl TextureLoader for ImageFileLoader {
    fn request(&mut self, url: &str) {
        let url = url.to_string();
        let path = match self.resolve(&url) {
            Ok(path) => path,
            Err(err) => {
                let _ = self.sender.send(LoadOutcome {
                    url,
                    result: Err(err),
                });
                return;
            }
        };
        let sender = self.sender.clone();
        std::thread::spawn(move || {
            let result = decode_file(&path);
            // The cache may be gone by now; nothing to report to.
            let _ = sender.send(LoadOutcome { url, result });
        });
    }

    fn poll(&mut self) -> Vec<LoadOutcome> {
        self.receiver.try_iter().collect()
    }
}

fn decode_file(path: &Path) -> Result<RgbaImage, TextureError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|source| TextureError::Decode {
            path: path.display().to_string(),
            source,
        })
}

/// Process-lifetime texture cache. Entries are never evicted.
pub struct TextureCache {
    loader: Box<dyn TextureLoader>,
    base: HashMap<String, Rc<Texture>>,
    per_part: HashMap<(String, String), Rc<Texture>>,
    pending: HashMap<String, Weak<TextureSource>>,
}

impl TextureCache {
    pub fn new(loader: Box<dyn TextureLoader>) -> Self {
        Self {
            loader,
            base: HashMap::new(),
            per_part: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Texture for `url` tiled for `part_id`. The first request for a URL
    /// starts its load; later parts clone the base texture instead.
    pub fn texture_for_part(&mut self, url: &str, part_id: &str, repeat: [f32; 2]) -> Rc<Texture> {
        let key = (url.to_string(), part_id.to_string());
        if let Some(texture) = self.per_part.get(&key) {
            texture.set_repeat(repeat);
            return Rc::clone(texture);
        }

        let base = self.base_texture(url);
        let texture = base.clone_for_part();
        texture.set_repeat(repeat);
        let texture = Rc::new(texture);
        self.per_part.insert(key, Rc::clone(&texture));
        texture
    }

    fn base_texture(&mut self, url: &str) -> Rc<Texture> {
        if let Some(base) = self.base.get(url) {
            return Rc::clone(base);
        }
        let source = Rc::new(TextureSource::pending(url));
        // Sampler is configured up front so the handle is valid before decode.
        let base = Rc::new(Texture::new(Rc::clone(&source), Sampler::default()));
        self.pending.insert(url.to_string(), Rc::downgrade(&source));
        self.loader.request(url);
        log::debug!("Texture load started: {}", url);
        self.base.insert(url.to_string(), Rc::clone(&base));
        base
    }

    /// Installs finished loads. Returns how many sources changed.
    pub fn poll_loads(&mut self) -> usize {
        let mut updated = 0;
        for outcome in self.loader.poll() {
            let Some(source) = self.pending.remove(&outcome.url).and_then(|weak| weak.upgrade())
            else {
                log::debug!("Ignoring stale texture load: {}", outcome.url);
                continue;
            };
            match &outcome.result {
                Ok(image) => log::info!(
                    "Texture ready: {} ({}x{})",
                    outcome.url,
                    image.width(),
                    image.height()
                ),
                Err(err) => log::warn!("Texture load failed: {}", err),
            }
            source.finish(outcome.result);
            updated += 1;
        }
        updated
    }

    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Distinct URLs seen.
    pub fn base_len(&self) -> usize {
        self.base.len()
    }

    /// Distinct (URL, part) textures handed out.
    pub fn len(&self) -> usize {
        self.per_part.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_part.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Loader double: records requests, completes only when told to.
    #[derive(Clone, Default)]
    pub(crate) struct ManualLoader {
        pub requests: Rc<RefCell<Vec<String>>>,
        pub completed: Rc<RefCell<Vec<LoadOutcome>>>,
    }

    impl ManualLoader {
        pub fn complete(&self, url: &str, width: u32, height: u32) {
            self.completed.borrow_mut().push(LoadOutcome {
                url: url.to_string(),
                result: Ok(RgbaImage::new(width, height)),
            });
        }

        pub fn fail(&self, url: &str) {
            self.completed.borrow_mut().push(LoadOutcome {
                url: url.to_string(),
                result: Err(TextureError::UnsupportedUrl(url.to_string())),
            });
        }
    }

    impl TextureLoader for ManualLoader {
        fn request(&mut self, url: &str) {
            self.requests.borrow_mut().push(url.to_string());
        }

        fn poll(&mut self) -> Vec<LoadOutcome> {
            self.completed.borrow_mut().drain(..).collect()
        }
    }

    #[test]
    fn one_load_per_url_with_per_part_clones() {
        let loader = ManualLoader::default();
        let mut cache = TextureCache::new(Box::new(loader.clone()));

        let barrel = cache.texture_for_part("/t/kryptek.jpg", "barrel", [6.0, 1.0]);
        let stock = cache.texture_for_part("/t/kryptek.jpg", "stock", [3.0, 3.0]);
        let barrel_again = cache.texture_for_part("/t/kryptek.jpg", "barrel", [6.0, 1.0]);

        assert_eq!(*loader.requests.borrow(), vec!["/t/kryptek.jpg".to_string()]);
        assert!(Rc::ptr_eq(&barrel, &barrel_again));
        assert!(!Rc::ptr_eq(&barrel, &stock));
        assert_eq!(barrel.repeat(), [6.0, 1.0]);
        assert_eq!(stock.repeat(), [3.0, 3.0]);
        assert_eq!(cache.base_len(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn handles_are_usable_before_decode_and_fill_in_later() {
        let loader = ManualLoader::default();
        let mut cache = TextureCache::new(Box::new(loader.clone()));

        let barrel = cache.texture_for_part("/t/multicam.jpg", "barrel", [2.0, 2.0]);
        let stock = cache.texture_for_part("/t/multicam.jpg", "stock", [2.0, 2.0]);
        assert!(!barrel.source().is_ready());
        assert_eq!(barrel.sampler().wrap_u, WrapMode::Repeat);
        assert_eq!(barrel.sampler().color_space, TextureColorSpace::Srgb);
        assert!(barrel.needs_upload());

        loader.complete("/t/multicam.jpg", 4, 2);
        assert_eq!(cache.poll_loads(), 1);
        assert!(barrel.source().is_ready());
        assert!(stock.source().is_ready());
        assert_eq!(barrel.source().version(), 1);
        assert_eq!(cache.pending_loads(), 0);
    }

    #[test]
    fn failed_and_stale_loads_do_not_panic() {
        let loader = ManualLoader::default();
        let mut cache = TextureCache::new(Box::new(loader.clone()));

        let texture = cache.texture_for_part("/t/missing.jpg", "barrel", [1.0, 1.0]);
        loader.fail("/t/missing.jpg");
        // Completion for a URL the cache never asked for.
        loader.complete("/t/unknown.jpg", 1, 1);
        assert_eq!(cache.poll_loads(), 1);
        assert!(matches!(*texture.source().state(), SourceState::Failed(_)));
    }

    #[test]
    fn repeat_change_on_cached_texture_flags_upload() {
        let loader = ManualLoader::default();
        let mut cache = TextureCache::new(Box::new(loader));
        let texture = cache.texture_for_part("/t/a.jpg", "barrel", [1.0, 1.0]);
        texture.mark_uploaded();

        let same = cache.texture_for_part("/t/a.jpg", "barrel", [1.0, 1.0]);
        assert!(!same.needs_upload());

        let retiled = cache.texture_for_part("/t/a.jpg", "barrel", [4.0, 1.0]);
        assert!(retiled.needs_upload());
        assert_eq!(texture.repeat(), [4.0, 1.0]);
    }

    fn temp_file(stem: &str, extension: &str) -> PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "loadout_{}_{}_{}.{}",
            stem,
            std::process::id(),
            nonce,
            extension
        ))
    }

    /// Polls until the source leaves `Pending` or two seconds pass.
    fn wait_for(cache: &mut TextureCache, texture: &Texture) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while matches!(*texture.source().state(), SourceState::Pending)
            && std::time::Instant::now() < deadline
        {
            cache.poll_loads();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    #[test]
    fn file_loader_decodes_on_worker_thread() {
        let path = temp_file("camo", "png");
        RgbaImage::from_pixel(2, 2, image::Rgba([200, 180, 120, 255]))
            .save(&path)
            .unwrap();
        let url = path.file_name().unwrap().to_string_lossy().into_owned();

        let mut cache = TextureCache::new(Box::new(ImageFileLoader::new(std::env::temp_dir())));
        let texture = cache.texture_for_part(&format!("/{}", url), "stock", [3.0, 3.0]);
        wait_for(&mut cache, &texture);
        let _ = std::fs::remove_file(&path);

        match &*texture.source().state() {
            SourceState::Ready(image) => {
                assert_eq!(image.dimensions(), (2, 2));
                assert_eq!(image.get_pixel(1, 1).0, [200, 180, 120, 255]);
            }
            other => panic!("expected decoded image, got {:?}", other),
        }
        assert_eq!(texture.source().version(), 1);
        assert_eq!(cache.pending_loads(), 0);
    }

    #[test]
    fn file_loader_reports_decode_failures() {
        let path = temp_file("broken", "png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let url = path.file_name().unwrap().to_string_lossy().into_owned();

        let mut cache = TextureCache::new(Box::new(ImageFileLoader::new(std::env::temp_dir())));
        let texture = cache.texture_for_part(&url, "barrel", [1.0, 1.0]);
        wait_for(&mut cache, &texture);
        let _ = std::fs::remove_file(&path);

        match &*texture.source().state() {
            SourceState::Failed(message) => assert!(message.contains("failed to decode texture")),
            other => panic!("expected decode failure, got {:?}", other),
        };
    }

    #[test]
    fn file_loader_rejects_remote_urls() {
        let mut loader = ImageFileLoader::new("public");
        loader.request("https://cdn.example.com/camo.jpg");
        let outcomes = loader.poll();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0].result,
            Err(TextureError::UnsupportedUrl(_))
        ));
    }
}

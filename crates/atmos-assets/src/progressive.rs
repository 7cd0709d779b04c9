//! Preview-then-full texture streaming with timeout, bounded retry, and
//! cancel-on-unmount.
//!
//! The loader thread runs the network and decode work strictly in sequence:
//! preview first, full resolution second, each with its own retry budget. It
//! never touches the GPU. The owner calls [`ProgressiveTexture::poll`] once per
//! frame on the render thread, which uploads finished images through a
//! [`TextureAllocator`] and releases whatever they replace.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, info, warn};

use crate::decode::{DecodedImage, DeviceCapabilities, decode_image};
use crate::error::LoadError;
use crate::fetch::Fetcher;

/// Creates and destroys GPU textures for the loader. Only ever called from
/// the thread that owns the [`ProgressiveTexture`].
pub trait TextureAllocator {
    /// Opaque GPU texture handle.
    type Texture;

    /// Device limits used to size decoded images.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Upload `image` and return the live texture.
    fn create(&mut self, image: &DecodedImage) -> Result<Self::Texture, LoadError>;

    /// Free the GPU memory behind `texture` now.
    fn release(&mut self, texture: Self::Texture);
}

/// Which of the two assets a texture or event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Preview,
    Full,
}

/// Observable loader state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    LoadingPreview,
    LoadingFull,
    Ready,
    Error,
}

impl LoadStatus {
    /// `Ready` and `Error` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadStatus::Ready | LoadStatus::Error)
    }

    /// Kebab-case name, as shown in status affordances.
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStatus::LoadingPreview => "loading-preview",
            LoadStatus::LoadingFull => "loading-full",
            LoadStatus::Ready => "ready",
            LoadStatus::Error => "error",
        }
    }
}

/// What to load and how hard to try.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub preview_url: String,
    pub full_url: String,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retries after the first failure, counted separately per resolution.
    pub max_retries: u32,
    /// Retry `n` waits `n * retry_backoff`.
    pub retry_backoff: Duration,
}

impl LoadRequest {
    pub fn new(preview_url: impl Into<String>, full_url: impl Into<String>) -> Self {
        Self {
            preview_url: preview_url.into(),
            full_url: full_url.into(),
            timeout: Duration::from_millis(10_000),
            max_retries: 2,
            retry_backoff: Duration::from_millis(1000),
        }
    }

    fn url(&self, resolution: Resolution) -> &str {
        match resolution {
            Resolution::Preview => &self.preview_url,
            Resolution::Full => &self.full_url,
        }
    }
}

/// A texture currently owned by the loader.
#[derive(Debug)]
pub struct LoadedTexture<T> {
    pub handle: T,
    pub resolution: Resolution,
    pub width: u32,
    pub height: u32,
}

enum LoaderEvent {
    Decoded {
        resolution: Resolution,
        image: DecodedImage,
    },
    Failed {
        resolution: Resolution,
        error: LoadError,
    },
}

/// A progressively streamed texture. Owns at most one live GPU texture.
pub struct ProgressiveTexture<T> {
    status: LoadStatus,
    error: Option<LoadError>,
    current: Option<LoadedTexture<T>>,
    events: Receiver<LoaderEvent>,
    /// Dropping this sender is the cancellation signal.
    cancel: Option<Sender<()>>,
}

impl<T> ProgressiveTexture<T> {
    /// Begin loading. Device capabilities are read from `allocator` once here.
    pub fn start<A>(request: LoadRequest, fetcher: Arc<dyn Fetcher>, allocator: &A) -> Self
    where
        A: TextureAllocator<Texture = T>,
    {
        let caps = allocator.capabilities();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(0);

        info!(
            preview = %request.preview_url,
            full = %request.full_url,
            max_texture_size = caps.max_texture_size,
            "starting progressive texture load"
        );

        let spawned = thread::Builder::new()
            .name("atmos-texture-loader".to_string())
            .spawn(move || run_loader(request, fetcher, caps, event_tx, cancel_rx));

        match spawned {
            Ok(_) => Self {
                status: LoadStatus::LoadingPreview,
                error: None,
                current: None,
                events: event_rx,
                cancel: Some(cancel_tx),
            },
            Err(e) => {
                warn!(error = %e, "could not spawn texture loader thread");
                Self {
                    status: LoadStatus::Error,
                    error: Some(LoadError::ResourceUnavailable(e.to_string())),
                    current: None,
                    events: event_rx,
                    cancel: None,
                }
            }
        }
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// Last failure, if the status is `Error`.
    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    /// The texture to draw with, if any.
    pub fn texture(&self) -> Option<&T> {
        self.current.as_ref().map(|t| &t.handle)
    }

    pub fn current(&self) -> Option<&LoadedTexture<T>> {
        self.current.as_ref()
    }

    /// True once the full-resolution texture is live.
    pub fn is_high_quality(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| t.resolution == Resolution::Full)
    }

    /// Apply finished loader work. Returns true if the visible texture or
    /// status changed.
    pub fn poll<A>(&mut self, allocator: &mut A) -> bool
    where
        A: TextureAllocator<Texture = T>,
    {
        let mut changed = false;
        loop {
            let event = match self.events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };
            changed = true;
            match event {
                LoaderEvent::Decoded { resolution, image } => {
                    self.install(resolution, &image, allocator);
                }
                LoaderEvent::Failed { resolution, error } => self.fail(resolution, error),
            }
        }
        changed
    }

    /// Cancel the current load, release its texture, and start `request`.
    pub fn restart<A>(&mut self, request: LoadRequest, fetcher: Arc<dyn Fetcher>, allocator: &mut A)
    where
        A: TextureAllocator<Texture = T>,
    {
        self.unmount(allocator);
        *self = Self::start(request, fetcher, allocator);
    }

    /// Abort in-flight work and release every GPU texture this loader owns.
    pub fn unmount<A>(&mut self, allocator: &mut A)
    where
        A: TextureAllocator<Texture = T>,
    {
        if self.cancel.take().is_some() {
            debug!("texture loader cancelled");
        }
        // Decoded images still queued hold only CPU memory.
        while self.events.try_recv().is_ok() {}
        if let Some(loaded) = self.current.take() {
            allocator.release(loaded.handle);
        }
    }

    fn install<A>(&mut self, resolution: Resolution, image: &DecodedImage, allocator: &mut A)
    where
        A: TextureAllocator<Texture = T>,
    {
        let handle = match allocator.create(image) {
            Ok(handle) => handle,
            Err(error) => {
                self.fail(resolution, error);
                return;
            }
        };

        let replaced = self.current.replace(LoadedTexture {
            handle,
            resolution,
            width: image.width,
            height: image.height,
        });
        if let Some(old) = replaced {
            allocator.release(old.handle);
        }

        match resolution {
            Resolution::Preview => self.status = LoadStatus::LoadingFull,
            Resolution::Full => {
                self.status = LoadStatus::Ready;
                self.cancel = None;
                info!(
                    width = image.width,
                    height = image.height,
                    "full resolution texture ready"
                );
            }
        }
    }

    fn fail(&mut self, resolution: Resolution, error: LoadError) {
        warn!(?resolution, %error, "texture load failed");
        self.status = LoadStatus::Error;
        self.error = Some(error);
        // Nothing further is worth loading once either stage has failed.
        self.cancel = None;
    }
}

impl<T> Drop for ProgressiveTexture<T> {
    fn drop(&mut self) {
        if self.current.is_some() {
            debug!("progressive texture dropped without unmount; handle freed by drop");
        }
    }
}

fn run_loader(
    request: LoadRequest,
    fetcher: Arc<dyn Fetcher>,
    caps: DeviceCapabilities,
    events: Sender<LoaderEvent>,
    cancel: Receiver<()>,
) {
    for resolution in [Resolution::Preview, Resolution::Full] {
        match load_with_retry(&request, resolution, &fetcher, caps, &cancel) {
            Ok(image) => {
                if events.send(LoaderEvent::Decoded { resolution, image }).is_err() {
                    return;
                }
            }
            Err(LoadError::Cancelled) => return,
            Err(error) => {
                let _ = events.send(LoaderEvent::Failed { resolution, error });
                return;
            }
        }
    }
}

fn load_with_retry(
    request: &LoadRequest,
    resolution: Resolution,
    fetcher: &Arc<dyn Fetcher>,
    caps: DeviceCapabilities,
    cancel: &Receiver<()>,
) -> Result<DecodedImage, LoadError> {
    let url = request.url(resolution);
    let mut retries = 0;
    loop {
        let attempt = fetch_with_timeout(fetcher, url, request.timeout, cancel).and_then(|bytes| {
            if is_cancelled(cancel) {
                return Err(LoadError::Cancelled);
            }
            decode_image(&bytes, caps)
        });

        match attempt {
            Ok(image) => return Ok(image),
            Err(LoadError::Cancelled) => return Err(LoadError::Cancelled),
            Err(error) if retries < request.max_retries => {
                retries += 1;
                warn!(
                    url,
                    retry = retries,
                    max_retries = request.max_retries,
                    %error,
                    "retrying texture load"
                );
                if wait_or_cancel(cancel, request.retry_backoff * retries) {
                    return Err(LoadError::Cancelled);
                }
            }
            Err(error) => return Err(error),
        }
    }
}

/// Race the fetch against `timeout` and the cancel signal. A fetch that loses
/// the race keeps running on its own thread and its result is discarded.
fn fetch_with_timeout(
    fetcher: &Arc<dyn Fetcher>,
    url: &str,
    timeout: Duration,
    cancel: &Receiver<()>,
) -> Result<Vec<u8>, LoadError> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let worker_fetcher = Arc::clone(fetcher);
    let worker_url = url.to_string();
    thread::Builder::new()
        .name("atmos-fetch".to_string())
        .spawn(move || {
            let _ = tx.send(worker_fetcher.fetch(&worker_url));
        })
        .map_err(|e| LoadError::ResourceUnavailable(e.to_string()))?;

    crossbeam_channel::select! {
        recv(rx) -> result => {
            result.unwrap_or_else(|_| Err(LoadError::network(url, "fetch thread exited")))
        }
        recv(cancel) -> _ => Err(LoadError::Cancelled),
        default(timeout) => Err(LoadError::TimeoutExceeded {
            url: url.to_string(),
            timeout,
        }),
    }
}

fn is_cancelled(cancel: &Receiver<()>) -> bool {
    matches!(cancel.try_recv(), Err(TryRecvError::Disconnected))
}

/// Sleep for `duration` unless cancelled first. Returns true on cancel.
fn wait_or_cancel(cancel: &Receiver<()>, duration: Duration) -> bool {
    !matches!(cancel.recv_timeout(duration), Err(RecvTimeoutError::Timeout))
}

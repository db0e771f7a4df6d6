//! Background texture decoding
//!
//! Requests go to a worker thread; each request gets its own reply channel.
//! Dropping the receiver is how a caller cancels: the worker's reply simply
//! has nowhere to go.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use thiserror::Error;

/// Decoded image in linear RGBA float format
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Source URL
    pub url: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGBA texels, row-major
    pub pixels: Vec<f32>,
}

/// Texture loading errors
#[derive(Debug, Error)]
pub enum TextureLoadError {
    /// File could not be read
    #[error("IO error loading {url}: {source}")]
    Io {
        /// Requested URL
        url: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// Image data could not be decoded
    #[error("Failed to decode {url}: {reason}")]
    Decode {
        /// Requested URL
        url: String,
        /// Decoder message
        reason: String,
    },
    /// Image format not supported by the decoder
    #[error("Unsupported image format: {0}")]
    Unsupported(String),
    /// The loader shut down before replying
    #[error("Texture load cancelled: {0}")]
    Cancelled(String),
}

/// Reply delivered on a request's channel
pub type TextureReply = Result<TextureData, TextureLoadError>;

/// Asynchronous texture source
pub trait TextureLoader {
    /// Start loading `url`; the result arrives on the returned channel
    fn request(&mut self, url: &str) -> Receiver<TextureReply>;
}

struct LoadRequest {
    url: String,
    path: PathBuf,
    reply: Sender<TextureReply>,
}

/// Decodes files under a root directory on a worker thread
///
/// A URL maps to a path by stripping its leading `/` and joining it onto the
/// root.
pub struct ThreadedTextureLoader {
    root: PathBuf,
    request_tx: Option<Sender<LoadRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedTextureLoader {
    /// Spawn the worker
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (request_tx, request_rx) = unbounded::<LoadRequest>();

        let worker = std::thread::spawn(move || {
            for request in request_rx {
                log::debug!("Texture worker: decoding {}", request.path.display());
                let reply = decode(&request.url, &request.path);
                if request.reply.send(reply).is_err() {
                    log::debug!("Texture worker: {} was cancelled", request.url);
                }
            }
        });

        Self {
            root: root.into(),
            request_tx: Some(request_tx),
            worker: Some(worker),
        }
    }

    /// Filesystem path for a URL
    pub fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }
}

impl TextureLoader for ThreadedTextureLoader {
    fn request(&mut self, url: &str) -> Receiver<TextureReply> {
        let (reply, rx) = bounded(1);
        let request = LoadRequest {
            url: url.to_string(),
            path: self.resolve(url),
            reply,
        };
        let sent = self.request_tx.as_ref().map(|tx| tx.send(request));
        if !matches!(sent, Some(Ok(()))) {
            log::error!("Texture loader: worker is gone, cannot load {url}");
        }
        rx
    }
}

impl Drop for ThreadedTextureLoader {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.request_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Texture worker panicked");
            }
        }
    }
}

/// Loader whose requests are completed by hand
///
/// Clones share state, so a test can keep one clone while the engine owns
/// another. Replies sent after the requester dropped its receiver are lost,
/// just like a real late completion.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTextureLoader {
    inner: Rc<RefCell<ScriptedState>>,
}

#[derive(Debug, Default)]
struct ScriptedState {
    pending: Vec<(String, Sender<TextureReply>)>,
    requested: Vec<String>,
}

impl ScriptedTextureLoader {
    /// Create a loader with no pending requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Every URL requested so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.inner.borrow().requested.clone()
    }

    /// URLs still waiting for a reply
    pub fn pending(&self) -> Vec<String> {
        self.inner.borrow().pending.iter().map(|(url, _)| url.clone()).collect()
    }

    /// Complete the oldest pending request for `url` with a small image
    ///
    /// Returns whether the requester was still listening.
    pub fn complete(&self, url: &str) -> bool {
        self.reply(url, |url| {
            Ok(TextureData {
                url: url.to_string(),
                width: 2,
                height: 1,
                pixels: vec![1.0; 8],
            })
        })
    }

    /// Fail the oldest pending request for `url`
    pub fn fail(&self, url: &str) -> bool {
        self.reply(url, |url| {
            Err(TextureLoadError::Decode {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            })
        })
    }

    fn reply(&self, url: &str, make: impl FnOnce(&str) -> TextureReply) -> bool {
        let mut state = self.inner.borrow_mut();
        let Some(index) = state.pending.iter().position(|(u, _)| u == url) else {
            return false;
        };
        let (url, tx) = state.pending.remove(index);
        tx.send(make(&url)).is_ok()
    }
}

impl TextureLoader for ScriptedTextureLoader {
    fn request(&mut self, url: &str) -> Receiver<TextureReply> {
        let (tx, rx) = bounded(1);
        let mut state = self.inner.borrow_mut();
        state.requested.push(url.to_string());
        state.pending.push((url.to_string(), tx));
        rx
    }
}

fn decode(url: &str, path: &Path) -> TextureReply {
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(source) => TextureLoadError::Io {
            url: url.to_string(),
            source,
        },
        image::ImageError::Unsupported(e) => TextureLoadError::Unsupported(e.to_string()),
        other => TextureLoadError::Decode {
            url: url.to_string(),
            reason: other.to_string(),
        },
    })?;

    let rgba = img.to_rgba32f();
    let (width, height) = rgba.dimensions();
    Ok(TextureData {
        url: url.to_string(),
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("jewel_engine_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_decodes_png_on_worker() {
        let root = scratch_dir("png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]))
            .save(root.join("tex.png"))
            .unwrap();

        let mut loader = ThreadedTextureLoader::new(&root);
        let rx = loader.request("/tex.png");
        let data = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();

        assert_eq!((data.width, data.height), (4, 2));
        assert_eq!(data.pixels.len(), 4 * 2 * 4);
        assert!((data.pixels[0] - 1.0).abs() < 1e-6);
        assert_eq!(data.url, "/tex.png");
    }

    #[test]
    fn test_missing_file_reports_io_error() {
        let root = scratch_dir("missing");
        let mut loader = ThreadedTextureLoader::new(&root);
        let reply = loader.request("/nope.exr").recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(reply, Err(TextureLoadError::Io { .. })));
    }

    #[test]
    fn test_scripted_reply_after_cancel_is_lost() {
        let script = ScriptedTextureLoader::new();
        let mut loader = script.clone();
        let stale = loader.request("/env.exr");
        let live = loader.request("/env.exr");
        drop(stale);

        assert!(!script.complete("/env.exr"));
        assert!(script.complete("/env.exr"));
        assert!(live.try_recv().unwrap().is_ok());
        assert_eq!(script.requested().len(), 2);
        assert!(script.pending().is_empty());
    }

    #[test]
    fn test_dropped_receiver_does_not_stall_worker() {
        let root = scratch_dir("cancel");
        let mut loader = ThreadedTextureLoader::new(&root);
        drop(loader.request("/a.png"));
        let reply = loader.request("/b.png").recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(reply.is_err());
    }
}

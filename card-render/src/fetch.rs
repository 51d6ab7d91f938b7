//! Scene image loading
//!
//! Every image load is bounded by a timeout, and a timeout or failure means
//! "proceed without pixels": a missing background or photo must never block
//! card generation. A scene with zero image sources resolves immediately.

use image::RgbaImage;
use std::time::Duration;
use tracing::{debug, warn};

use crate::scene::{CardScene, ImageSlot, ImageSource};

/// Default per-image wait, matching the card page's load bound.
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3500);

/// Loads scene images from URLs or local paths.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-image wait bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load every unresolved image slot of the scene concurrently.
    ///
    /// Returns once all slots finished, errored, or timed out; never fails.
    pub async fn load_scene(&self, scene: &mut CardScene) {
        let pending: Vec<&mut ImageSlot> = scene
            .image_slots_mut()
            .into_iter()
            .filter(|slot| slot.source.is_some() && slot.pixels.is_none())
            .collect();

        if pending.is_empty() {
            return;
        }

        let loads = pending.into_iter().map(|slot| async move {
            let source = slot.source.clone();
            if let Some(source) = source {
                slot.pixels = self.fetch(&source).await;
            }
        });
        futures::future::join_all(loads).await;
    }

    /// Fetch and decode one image. Any failure yields `None`.
    async fn fetch(&self, source: &ImageSource) -> Option<RgbaImage> {
        let bytes = match tokio::time::timeout(self.timeout, self.read_bytes(source)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(_) => {
                warn!(source = ?source, "image load timed out, proceeding without it");
                return None;
            }
        };

        match image::load_from_memory(&bytes) {
            Ok(img) => {
                debug!(source = ?source, "image loaded");
                Some(img.to_rgba8())
            }
            Err(e) => {
                warn!(source = ?source, error = %e, "image decode failed, proceeding without it");
                None
            }
        }
    }

    async fn read_bytes(&self, source: &ImageSource) -> Option<Vec<u8>> {
        match source {
            ImageSource::Url(url) => {
                let resp = match self.client.get(url).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(url = %url, error = %e, "image request failed");
                        return None;
                    }
                };
                if !resp.status().is_success() {
                    warn!(url = %url, status = %resp.status(), "image request returned non-success");
                    return None;
                }
                resp.bytes().await.ok().map(|b| b.to_vec())
            }
            ImageSource::Path(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "image file read failed");
                    None
                }
            },
        }
    }
}

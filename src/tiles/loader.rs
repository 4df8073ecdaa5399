use crate::core::geo::TileAddress;
use crate::prelude::HashSet;
use crate::runtime::SharedSpawner;
use crate::tiles::cache::TileImage;
use crate::{MapError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::future::BoxFuture;
use futures::FutureExt;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;

/// Shared async HTTP client with a custom User-Agent so that public tile
/// servers (e.g. OpenStreetMap) don't reject the request. Building the client
/// once avoids the cost of TLS and connection pool setup for every tile.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("slippymap/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(8)
        .build()
        .unwrap_or_else(|e| {
            log::error!("falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
});

/// Something that can fetch tile images off the render thread.
///
/// `request` must return immediately. Completed tiles are collected with
/// `poll_completed` on the render thread, which stores them in the cache.
pub trait TileFetcher {
    fn request(&mut self, address: TileAddress, url: String);

    /// Tiles that finished downloading since the last call. Failures are logged
    /// and dropped so the next paint asks again.
    fn poll_completed(&mut self) -> Vec<(TileAddress, TileImage)>;

    /// Number of requests still running.
    fn pending(&self) -> usize {
        0
    }
}

/// Async function turning a URL into raw image bytes.
pub type FetchFn = Arc<dyn Fn(String) -> BoxFuture<'static, Result<Vec<u8>>> + Send + Sync>;

struct FetchOutcome {
    address: TileAddress,
    url: String,
    result: Result<TileImage>,
}

/// Tile loader that downloads on the async runtime and reports back over a
/// channel. At most one request per address is in flight at a time.
pub struct HttpTileLoader {
    spawner: SharedSpawner,
    fetch: FetchFn,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
    in_flight: HashSet<TileAddress>,
}

impl HttpTileLoader {
    pub fn new(spawner: SharedSpawner) -> Self {
        Self::with_fetch(spawner, Arc::new(|url: String| http_fetch(url).boxed()))
    }

    /// Loader with a custom byte source instead of HTTP.
    pub fn with_fetch(spawner: SharedSpawner, fetch: FetchFn) -> Self {
        let (tx, rx) = unbounded();
        Self {
            spawner,
            fetch,
            tx,
            rx,
            in_flight: HashSet::default(),
        }
    }

    pub fn is_in_flight(&self, address: &TileAddress) -> bool {
        self.in_flight.contains(address)
    }
}

impl TileFetcher for HttpTileLoader {
    fn request(&mut self, address: TileAddress, url: String) {
        if !self.in_flight.insert(address.clone()) {
            return;
        }
        log::debug!("fetch tile {}", url);

        let fetch = self.fetch.clone();
        let tx = self.tx.clone();
        self.spawner.spawn_boxed(
            async move {
                let result = match fetch(url.clone()).await {
                    Ok(bytes) => decode_tile(&bytes),
                    Err(e) => Err(e),
                };
                // The receiver only disappears with the loader itself.
                let _ = tx.send(FetchOutcome {
                    address,
                    url,
                    result,
                });
            }
            .boxed(),
        );
    }

    fn poll_completed(&mut self) -> Vec<(TileAddress, TileImage)> {
        let mut done = Vec::new();
        for outcome in self.rx.try_iter() {
            self.in_flight.remove(&outcome.address);
            match outcome.result {
                Ok(image) => {
                    log::debug!("downloaded tile {}", outcome.url);
                    done.push((outcome.address, image));
                }
                Err(e) => log::warn!("failed to load url \"{}\": {}", outcome.url, e),
            }
        }
        done
    }

    fn pending(&self) -> usize {
        self.in_flight.len()
    }
}

async fn http_fetch(url: String) -> Result<Vec<u8>> {
    let resp = HTTP_CLIENT.get(&url).send().await.map_err(MapError::from)?;
    if !resp.status().is_success() {
        return Err(MapError::Http(resp.status().as_u16()).into());
    }
    let bytes = resp.bytes().await.map_err(MapError::from)?;
    Ok(bytes.to_vec())
}

/// Decodes PNG or JPEG bytes into an RGBA tile.
pub fn decode_tile(bytes: &[u8]) -> Result<TileImage> {
    let image = image::load_from_memory(bytes).map_err(MapError::from)?;
    Ok(Arc::new(image.to_rgba8()))
}

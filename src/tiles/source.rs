use crate::core::config::TileServerConfig;
use crate::core::constants::{MAX_ZOOM, PROBE_TILE};
use crate::core::geo::{GeoPoint, TileAddress};
use crate::core::projection;
use crate::tiles::loader::HTTP_CLIENT;
use crate::{MapError, Result};
use async_trait::async_trait;
use std::fmt;

/// One tile endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileServer {
    url: String,
    max_zoom: u8,
    broken: bool,
}

impl TileServer {
    /// Server serving zoom levels up to `max_zoom`, capped at [`MAX_ZOOM`].
    pub fn new(url: impl Into<String>, max_zoom: u8) -> Self {
        Self {
            url: url.into(),
            max_zoom: max_zoom.min(MAX_ZOOM),
            broken: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Build a URL for the requested tile.
    pub fn tile_url(&self, x: u32, y: u32, zoom: u8) -> String {
        format!("{}{}/{}/{}.png", self.url, zoom, x, y)
    }

    /// URL of the tile covering a geographic coordinate.
    pub fn tile_url_for_geo(&self, point: GeoPoint, zoom: u8) -> String {
        let (x, y) = projection::geo_to_tile(point, zoom);
        format!("{}{}/{}/{}.png", self.url, zoom, x, y)
    }

    pub fn address(&self, x: u32, y: u32, zoom: u8) -> TileAddress {
        TileAddress::new(self.url.as_str(), x, y, zoom)
    }

    pub fn probe_url(&self) -> String {
        let (x, y, zoom) = PROBE_TILE;
        self.tile_url(x, y, zoom)
    }
}

impl From<&TileServerConfig> for TileServer {
    fn from(config: &TileServerConfig) -> Self {
        Self::new(config.url.clone(), config.max_zoom)
    }
}

impl fmt::Display for TileServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (max zoom {})", self.url, self.max_zoom)
    }
}

/// Liveness check for a tile server.
#[async_trait]
pub trait TileProbe: Send + Sync {
    /// True when `url` answered with a successful response.
    async fn check(&self, url: &str) -> bool;
}

/// Probe that performs a real GET through the shared HTTP client.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpProbe;

#[async_trait]
impl TileProbe for HttpProbe {
    async fn check(&self, url: &str) -> bool {
        match fetch_probe_tile(url).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to get content from url {}: {}", url, e);
                false
            }
        }
    }
}

async fn fetch_probe_tile(url: &str) -> Result<()> {
    let resp = HTTP_CLIENT.get(url).send().await.map_err(MapError::from)?;
    if !resp.status().is_success() {
        return Err(MapError::Http(resp.status().as_u16()).into());
    }
    resp.bytes().await.map_err(MapError::from)?;
    Ok(())
}

/// Warning raised when a server known to be unreachable becomes active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUnreachable {
    pub url: String,
}

impl fmt::Display for ServerUnreachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The tile server \"{}\" could not be reached. Maybe an HTTP proxy needs to be configured.",
            self.url
        )
    }
}

/// Ordered catalog of tile servers with one active entry.
#[derive(Debug, Clone)]
pub struct TileServerRegistry {
    servers: Vec<TileServer>,
    active: usize,
}

impl TileServerRegistry {
    /// Fails when `servers` is empty.
    pub fn new(servers: Vec<TileServer>) -> Result<Self> {
        if servers.is_empty() {
            return Err(MapError::Config("tile server list is empty".into()).into());
        }
        Ok(Self { servers, active: 0 })
    }

    pub fn from_config(configs: &[TileServerConfig]) -> Result<Self> {
        Self::new(configs.iter().map(TileServer::from).collect())
    }

    pub fn servers(&self) -> &[TileServer] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn active(&self) -> &TileServer {
        &self.servers[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn index_of(&self, url: &str) -> Option<usize> {
        self.servers.iter().position(|s| s.url == url)
    }

    /// Fetches the probe tile of one server and flags it broken on failure.
    /// A successful probe leaves the flag untouched.
    pub async fn probe(&mut self, index: usize, prober: &dyn TileProbe) -> Result<bool> {
        let url = self
            .servers
            .get(index)
            .ok_or(MapError::UnknownServer(index))?
            .probe_url();
        let alive = prober.check(&url).await;
        if !alive {
            self.servers[index].broken = true;
            log::warn!("tile server {} flagged broken", self.servers[index].url);
        }
        Ok(alive)
    }

    pub async fn probe_all(&mut self, prober: &dyn TileProbe) -> Vec<bool> {
        let mut results = Vec::with_capacity(self.servers.len());
        for index in 0..self.servers.len() {
            results.push(self.probe(index, prober).await.unwrap_or(false));
        }
        results
    }

    /// The warning owed for the active server, if it is broken.
    pub fn check_active(&self) -> Option<ServerUnreachable> {
        let active = self.active();
        active.broken.then(|| ServerUnreachable {
            url: active.url.clone(),
        })
    }

    /// Makes `index` the active server. Re-activating the current server does
    /// nothing; activating a broken one returns its warning once.
    pub fn activate(&mut self, index: usize) -> Result<Option<ServerUnreachable>> {
        if index >= self.servers.len() {
            return Err(MapError::UnknownServer(index).into());
        }
        if index == self.active {
            return Ok(None);
        }
        self.active = index;
        log::info!("active tile server is now {}", self.servers[index]);
        Ok(self.check_active())
    }

    /// Index of the server after `current`, wrapping; None if `current` is not
    /// one of ours.
    pub fn next_index(&self, current: &str) -> Option<usize> {
        let index = self.index_of(current)?;
        Some((index + 1) % self.servers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        alive_prefix: &'static str,
    }

    #[async_trait]
    impl TileProbe for FixedProbe {
        async fn check(&self, url: &str) -> bool {
            url.starts_with(self.alive_prefix)
        }
    }

    fn registry() -> TileServerRegistry {
        TileServerRegistry::new(vec![
            TileServer::new("https://a.example/", 18),
            TileServer::new("https://b.example/", 10),
            TileServer::new("https://c.example/", 17),
        ])
        .unwrap()
    }

    #[test]
    fn test_tile_url_format() {
        let server = TileServer::new("https://tile.openstreetmap.org/", 18);
        assert_eq!(server.tile_url(3, 5, 7), "https://tile.openstreetmap.org/7/3/5.png");
        assert_eq!(server.probe_url(), "https://tile.openstreetmap.org/1/1/1.png");
        assert_eq!(
            server.tile_url_for_geo(GeoPoint::new(6.96, 50.94), 10),
            "https://tile.openstreetmap.org/10/531/343.png"
        );
    }

    #[test]
    fn test_max_zoom_is_capped() {
        assert_eq!(TileServer::new("https://t/", 70).max_zoom(), 30);
        assert_eq!(TileServer::new("https://t/", 19).max_zoom(), 19);
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(TileServerRegistry::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_probe_flags_only_failures() {
        let mut registry = registry();
        let probe = FixedProbe {
            alive_prefix: "https://a.",
        };

        let results = registry.probe_all(&probe).await;
        assert_eq!(results, vec![true, false, false]);
        assert!(!registry.servers()[0].is_broken());
        assert!(registry.servers()[1].is_broken());
        assert!(registry.servers()[2].is_broken());
        assert_eq!(registry.len(), 3);

        // A later successful probe does not clear the flag.
        let everything = FixedProbe { alive_prefix: "" };
        assert!(registry.probe(1, &everything).await.unwrap());
        assert!(registry.servers()[1].is_broken());

        assert!(registry.probe(7, &everything).await.is_err());
    }

    #[tokio::test]
    async fn test_activating_broken_server_warns() {
        let mut registry = registry();
        let probe = FixedProbe {
            alive_prefix: "https://a.",
        };
        registry.probe_all(&probe).await;

        let warning = registry.activate(1).unwrap();
        assert_eq!(
            warning,
            Some(ServerUnreachable {
                url: "https://b.example/".into()
            })
        );
        // Same server again: nothing new to report.
        assert_eq!(registry.activate(1).unwrap(), None);
        assert_eq!(registry.activate(0).unwrap(), None);
        assert!(registry.activate(3).is_err());
    }

    #[test]
    fn test_next_index_wraps() {
        let registry = registry();
        assert_eq!(registry.next_index("https://a.example/"), Some(1));
        assert_eq!(registry.next_index("https://c.example/"), Some(0));
        assert_eq!(registry.next_index("https://nowhere/"), None);
    }
}

use anyhow::{anyhow, Context};
use slippymap::{
    prelude::*,
    runtime::current_spawner,
    tiles::source::HttpProbe,
};

const USAGE: &str = "usage: slippymap-app [--print-config] [CONFIG.json|-] [QUERY]";

/// Headless map session: probes the tile servers, optionally searches for a
/// place, loads the visible tiles and plays one animated zoom.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }
    if args.iter().any(|a| a == "--print-config") {
        let json = MapConfig::default().to_json_pretty().map_err(|e| anyhow!(e))?;
        println!("{}", json);
        return Ok(());
    }

    let config = match args.first().map(String::as_str) {
        Some("-") | None => MapConfig::default(),
        Some(path) => MapConfig::from_file(path)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("failed to load config {}", path))?,
    };
    let query = if args.len() > 1 { Some(args.remove(1)) } else { None };

    let spawner = current_spawner().context("no tokio runtime")?;
    let mut map = Map::with_http_loader(config.clone(), ScreenSize::new(800, 600), spawner)
        .map_err(|e| anyhow!(e))?;

    if let Some(warning) = map.probe_servers(&HttpProbe).await {
        log::warn!("{}", warning);
    }

    if let Some(query) = query {
        let geocoder = NominatimGeocoder::from_config(&config);
        match geocoder.search(&query).await {
            Ok(results) => {
                for result in &results {
                    println!("{}\n    {}", result.link_label(), result.summary());
                }
                if let Some(first) = results.first() {
                    map.show_search_result(first).map_err(|e| anyhow!(e))?;
                }
            }
            Err(e) => log::error!("failed to search for \"{}\": {}", query, e),
        }
    }

    load_visible_tiles(&mut map).await;

    let center = map.view().size().center();
    if map.zoom_in_animated(center, Instant::now()) {
        let interval = map.frame_interval();
        while map.is_in_transition() {
            tokio::time::sleep(interval).await;
            let frame = map.paint(Instant::now());
            log::debug!(
                "frame: {} commands, {} tiles drawn",
                frame.commands.len(),
                frame.stats.tiles_drawn
            );
        }
    }
    load_visible_tiles(&mut map).await;

    print!("{}", map.diagnostics());
    Ok(())
}

/// Paints until every visible tile is cached or a few seconds have passed.
async fn load_visible_tiles(map: &mut Map) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let frame = map.paint(Instant::now());
        if frame.stats.tiles_requested == 0 || Instant::now() >= deadline {
            log::info!(
                "{} of {} visible tiles loaded",
                frame.stats.tiles_drawn,
                frame.stats.tile_count
            );
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

use crate::core::config::MapConfig;
use crate::core::geo::GeoPoint;
use crate::tiles::loader::HTTP_CLIENT;
use crate::{MapError, Result};
use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// One place returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Place type such as `city` or `station`
    pub kind: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub category: Option<String>,
    /// Suggested zoom, 0 when the service gave none
    pub zoom: i32,
    pub description: String,
}

impl SearchResult {
    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.lon, self.lat)
    }

    /// Short label for a result list: the first word of the name, followed by
    /// the category in brackets when there is one.
    pub fn link_label(&self) -> String {
        let short = self.name.split(char::is_whitespace).next().unwrap_or("");
        let label = match self.category.as_deref() {
            Some(category) if !category.is_empty() => format!("{} [{}] ", short, category),
            _ => short.to_string(),
        };
        let label = label.trim();
        label.strip_suffix(',').unwrap_or(label).to_string()
    }

    /// Description with bracketed annotations removed, or the name when that
    /// leaves nothing.
    pub fn summary(&self) -> String {
        let stripped = strip_brackets(&self.description);
        if stripped.is_empty() {
            self.name.clone()
        } else {
            stripped
        }
    }
}

/// Removes every `[...]` span, shortest match first.
fn strip_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        match rest[open..].find(']') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Turns a free-text query into places.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Geocoder speaking the Nominatim XML search API.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(config.geocode_url.clone())
    }

    pub fn search_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(&self.base_url, &[("format", "xml"), ("q", query)]).map_err(|e| {
            MapError::Config(format!("invalid geocode url {}: {}", self.base_url, e)).into()
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = self.search_url(query)?;
        log::debug!("searching {}", url);
        let resp = HTTP_CLIENT.get(url).send().await.map_err(MapError::from)?;
        if !resp.status().is_success() {
            return Err(MapError::Http(resp.status().as_u16()).into());
        }
        let body = resp.text().await.map_err(MapError::from)?;
        let results = parse_places(&body);
        log::info!("search for \"{}\" found {} places", query, results.len());
        Ok(results)
    }
}

/// Parses a search response into its top-level `place` records.
///
/// Top-level means a child of the document root, or the root itself when the
/// input is a bare `place` fragment. Places nested inside other places are read but not returned. A nested
/// `description` belongs to the innermost open place. Numbers that do not
/// parse become 0. Malformed XML stops parsing; whatever was read up to that
/// point is returned.
pub fn parse_places(xml: &str) -> Vec<SearchResult> {
    let mut parser = PlaceParser::default();
    if let Err(e) = parser.run(xml) {
        log::error!("failed to parse search results: {}", e);
    }
    parser.results
}

enum OpenPlace {
    /// Index into the results list
    Listed(usize),
    Nested(SearchResult),
}

#[derive(Default)]
struct PlaceParser {
    results: Vec<SearchResult>,
    open: Vec<OpenPlace>,
    depth: usize,
    description: Option<String>,
    description_depth: usize,
}

impl PlaceParser {
    fn run(&mut self, xml: &str) -> Result<()> {
        let mut reader = Reader::from_str(xml);
        let mut buffer = Vec::new();

        loop {
            match reader.read_event_into(&mut buffer)? {
                Event::Start(ref e) => {
                    self.depth += 1;
                    match e.name().as_ref() {
                        b"place" => self.start_place(e)?,
                        b"description" => self.start_description(),
                        _ => {}
                    }
                }
                Event::Empty(ref e) => {
                    if e.name().as_ref() == b"place" {
                        self.depth += 1;
                        self.start_place(e)?;
                        self.open.pop();
                        self.depth -= 1;
                    }
                }
                Event::End(ref e) => {
                    match e.name().as_ref() {
                        b"place" => {
                            self.open.pop();
                        }
                        b"description" => self.end_description(),
                        _ => {}
                    }
                    self.depth = self.depth.saturating_sub(1);
                }
                Event::Text(e) => {
                    if let Some(text) = self.description.as_mut() {
                        text.push_str(&e.xml_content()?);
                    }
                }
                Event::GeneralRef(e) => {
                    if let Some(text) = self.description.as_mut() {
                        if let Some(ch) = e.resolve_char_ref()? {
                            text.push(ch);
                        } else {
                            let name = e.decode()?;
                            match quick_xml::escape::resolve_predefined_entity(&name) {
                                Some(resolved) => text.push_str(resolved),
                                None => log::debug!("unknown entity &{};", name),
                            }
                        }
                    }
                }
                Event::CData(e) => {
                    if let Some(text) = self.description.as_mut() {
                        text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buffer.clear();
        }
        Ok(())
    }

    fn start_place(&mut self, e: &BytesStart) -> Result<()> {
        let mut place = SearchResult::default();
        for attr in e.attributes().with_checks(false) {
            let attr = attr?;
            let value = attr.unescape_value()?;
            match attr.key.as_ref() {
                b"type" => place.kind = Some(value.into_owned()),
                b"class" => place.category = Some(value.into_owned()),
                b"lat" => place.lat = value.trim().parse().unwrap_or(0.0),
                b"lon" => place.lon = value.trim().parse().unwrap_or(0.0),
                b"display_name" => place.name = value.into_owned(),
                b"zoom" => place.zoom = value.parse().unwrap_or(0),
                _ => {}
            }
        }

        // The document root sits at depth 1, so its children are at depth 2.
        if self.depth == 2 || (self.depth == 1 && self.open.is_empty()) {
            self.results.push(place);
            self.open.push(OpenPlace::Listed(self.results.len() - 1));
        } else {
            self.open.push(OpenPlace::Nested(place));
        }
        Ok(())
    }

    fn start_description(&mut self) {
        if self.description_depth == 0 {
            self.description = Some(String::new());
        }
        self.description_depth += 1;
    }

    fn end_description(&mut self) {
        self.description_depth = self.description_depth.saturating_sub(1);
        if self.description_depth > 0 {
            return;
        }
        let Some(text) = self.description.take() else {
            return;
        };
        match self.open.last_mut() {
            Some(OpenPlace::Listed(index)) => self.results[*index].description = text,
            Some(OpenPlace::Nested(place)) => place.description = text,
            None => log::debug!("description outside of a place ignored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLOGNE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<searchresults querystring="köln" more_url="https://example/?a=1&amp;b=2">
  <place place_id="1" lat="50.9383610" lon="6.9599740" display_name="Köln, Nordrhein-Westfalen, Deutschland" class="boundary" type="administrative" zoom="10"/>
  <place lat="abc" lon="6.958" display_name="Köln Hbf, Trankgasse" type="station">
    <description>Main &amp; central [rail] station</description>
    <place lat="1" lon="2" display_name="Gleis 1"><description>inner</description></place>
  </place>
  <place lat="50.7" lon="7.1" display_name="Bonn, Nordrhein-Westfalen" zoom="99"></place>
</searchresults>"#;

    #[test]
    fn test_parses_top_level_places() {
        let results = parse_places(COLOGNE);
        assert_eq!(results.len(), 3);

        let cologne = &results[0];
        assert_eq!(cologne.kind.as_deref(), Some("administrative"));
        assert_eq!(cologne.category.as_deref(), Some("boundary"));
        assert_eq!(cologne.lat, 50.938361);
        assert_eq!(cologne.lon, 6.959974);
        assert_eq!(cologne.name, "Köln, Nordrhein-Westfalen, Deutschland");
        assert_eq!(cologne.zoom, 10);
        assert_eq!(cologne.description, "");

        let station = &results[1];
        assert_eq!(station.lat, 0.0);
        assert_eq!(station.lon, 6.958);
        assert_eq!(station.zoom, 0);
        assert_eq!(station.description, "Main & central [rail] station");

        assert_eq!(results[2].zoom, 99);
        assert!(results.iter().all(|r| r.name != "Gleis 1"));
    }

    #[test]
    fn test_link_label_and_summary() {
        let results = parse_places(COLOGNE);
        assert_eq!(results[0].link_label(), "Köln, [boundary]");
        assert_eq!(results[0].summary(), "Köln, Nordrhein-Westfalen, Deutschland");
        assert_eq!(results[1].link_label(), "Köln");
        assert_eq!(results[1].summary(), "Main & central  station");
        assert_eq!(results[2].link_label(), "Bonn");
    }

    #[test]
    fn test_escaped_attribute_values_are_literal() {
        let xml = r#"<r><place display_name="Ville &amp; Cie &lt;Nord&gt;" lat="1.5" lon="-2"/></r>"#;
        let results = parse_places(xml);
        assert_eq!(results[0].name, "Ville & Cie <Nord>");
        assert_eq!(results[0].geo(), GeoPoint::new(-2.0, 1.5));
    }

    #[test]
    fn test_parse_error_keeps_earlier_records() {
        let xml = r#"<r><place display_name="A" lat="1" lon="2"/><place display_name="B"></r>"#;
        let results = parse_places(xml);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "A");

        assert!(parse_places("<r></x>").is_empty());
        assert!(parse_places("").is_empty());
    }

    #[test]
    fn test_bare_place_fragment() {
        let xml = r#"<place lat="50.1" lon="6.2" display_name="Cologne" zoom="10"><description>Cathedral city [Rhine]</description></place>"#;
        let results = parse_places(xml);
        assert_eq!(results.len(), 1);

        let place = &results[0];
        assert_eq!(place.lat, 50.1);
        assert_eq!(place.lon, 6.2);
        assert_eq!(place.name, "Cologne");
        assert_eq!(place.zoom, 10);
        assert_eq!(place.description, "Cathedral city [Rhine]");
        assert_eq!(place.kind, None);
        assert_eq!(place.category, None);
        assert_eq!(place.summary(), "Cathedral city ");

        let empty = parse_places(r#"<place display_name="Solo" lat="1" lon="2"/>"#);
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].name, "Solo");
    }

    #[test]
    fn test_strip_brackets() {
        assert_eq!(strip_brackets("a [b] c [d]"), "a  c ");
        assert_eq!(strip_brackets("[x][y]"), "");
        assert_eq!(strip_brackets("open [ only"), "open [ only");
    }

    #[test]
    fn test_search_url_encodes_query() {
        let geocoder = NominatimGeocoder::new("https://nominatim.example/search");
        let url = geocoder.search_url("Köln Hbf").unwrap();
        assert_eq!(
            url.as_str(),
            "https://nominatim.example/search?format=xml&q=K%C3%B6ln+Hbf"
        );
        assert!(NominatimGeocoder::new("not a url").search_url("x").is_err());
    }
}

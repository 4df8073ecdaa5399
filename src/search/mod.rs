//! Place search against a Nominatim-style geocoding service.

pub mod geocode;

pub use geocode::{parse_places, Geocoder, NominatimGeocoder, SearchResult};

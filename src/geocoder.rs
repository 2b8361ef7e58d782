//! Geocoding collaborator for the `gps=town+km` / `gps=town1/town2`
//! syntaxes. The network backends (BAN France, Nominatim) live outside the
//! library; this module only defines the seam a caller plugs a backend
//! into, plus a `NullGeocoder` for configurations with `geocoder: none`.

use thiserror::Error;

/// A place name could not be resolved to coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("geocoding failed for \"{place}\": {reason}")]
pub struct GeoError {
    pub place: String,
    pub reason: String,
}

impl GeoError {
    pub fn new(place: impl Into<String>, reason: impl Into<String>) -> Self {
        GeoError { place: place.into(), reason: reason.into() }
    }
}

/// Resolves a place name to `(latitude, longitude)`.
pub trait Geocode {
    fn geocode(&self, place: &str) -> Result<(f64, f64), GeoError>;
}

/// Resolves a photo's stored name to `(latitude, longitude)`, backing the
/// `gps=photo:NAME+km` syntax.
pub trait PhotoLocator {
    fn locate(&self, name: &str) -> Result<(f64, f64), GeoError>;
}

/// `geocoder: none` — every lookup fails.
pub struct NullGeocoder;

impl Geocode for NullGeocoder {
    fn geocode(&self, place: &str) -> Result<(f64, f64), GeoError> {
        Err(GeoError::new(place, "no geocoder configured"))
    }
}

impl PhotoLocator for NullGeocoder {
    fn locate(&self, name: &str) -> Result<(f64, f64), GeoError> {
        Err(GeoError::new(name, "no catalog attached to resolve photo coordinates"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_geocoder_always_fails() {
        assert!(NullGeocoder.geocode("Paris").is_err());
        assert!(NullGeocoder.locate("IMG_0001").is_err());
    }
}

//! `gps` criterion: five input syntaxes resolving to a lat/lon rectangle —
//! a point plus a half-side in km, two corner points, one or two geocoded
//! place names, or a named photo's own coordinates plus a half-side.

use std::f64::consts::PI;

use regex::Regex;

use crate::error::Error;
use crate::geocoder::{Geocode, PhotoLocator};

use super::TransformError;

fn square_around(lat: f64, lon: f64, width_km: f64) -> ((f64, f64), (f64, f64)) {
    let delta_lat = (width_km / 6378.0) * (180.0 / PI);
    let delta_lon = delta_lat / (lat * PI / 180.0).cos();
    ((lat - delta_lat, lon - delta_lon), (lat + delta_lat, lon + delta_lon))
}

fn reorder(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn rectangle_clause(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> String {
    let (lat1, lat2) = reorder(lat1, lat2);
    let (lon1, lon2) = reorder(lon1, lon2);
    format!(
        "(em.hasGps = 1 AND em.gpsLatitude BETWEEN {} AND {} AND em.gpsLongitude BETWEEN {} AND {})",
        lat1, lat2, lon1, lon2
    )
}

/// `gps` criterion. Tries, in order: `lat;lon+km`, `lat1;lon1/lat2;lon2`,
/// `town+km`, `town1/town2`, `photo:NAME+km`.
pub fn gps_clause(
    value: &str,
    geocoder: &dyn Geocode,
    photos: &dyn PhotoLocator,
) -> Result<Vec<String>, Error> {
    let re_photo = Regex::new(r"^photo:([\w' _-]+)\+([\d.]+)$").unwrap();
    let re_gpsw = Regex::new(r"^([\d.\-]+);([\d.\-]+)\+([\d.]+)$").unwrap();
    let re_2gps = Regex::new(r"^([\d.\-]+);([\d.\-]+)/([\d.\-]+);([\d.\-]+)$").unwrap();
    let re_townw = Regex::new(r"^([\w' -]+)\+([\d.]+)$").unwrap();
    let re_2town = Regex::new(r"^([\w' -]+)/([\w' -]+)$").unwrap();

    let bad = |reason: &str| Error::BadValue(TransformError::new("gps", reason.to_string()));

    if let Some(caps) = re_photo.captures(value) {
        let name = &caps[1];
        let width: f64 = caps[2].parse().map_err(|_| bad("invalid GPS width"))?;
        let (lat, lon) = photos.locate(name)?;
        let ((lat1, lon1), (lat2, lon2)) = square_around(lat, lon, width);
        return Ok(vec![rectangle_clause(lat1, lon1, lat2, lon2)]);
    }
    if let Some(caps) = re_gpsw.captures(value) {
        let lat: f64 = caps[1].parse().map_err(|_| bad("invalid GPS coordinate"))?;
        let lon: f64 = caps[2].parse().map_err(|_| bad("invalid GPS coordinate"))?;
        let width: f64 = caps[3].parse().map_err(|_| bad("invalid GPS width"))?;
        let ((lat1, lon1), (lat2, lon2)) = square_around(lat, lon, width);
        return Ok(vec![rectangle_clause(lat1, lon1, lat2, lon2)]);
    }
    if let Some(caps) = re_2gps.captures(value) {
        let lat1: f64 = caps[1].parse().map_err(|_| bad("invalid GPS coordinate"))?;
        let lon1: f64 = caps[2].parse().map_err(|_| bad("invalid GPS coordinate"))?;
        let lat2: f64 = caps[3].parse().map_err(|_| bad("invalid GPS coordinate"))?;
        let lon2: f64 = caps[4].parse().map_err(|_| bad("invalid GPS coordinate"))?;
        return Ok(vec![rectangle_clause(lat1, lon1, lat2, lon2)]);
    }
    if let Some(caps) = re_townw.captures(value) {
        let town = caps[1].trim();
        let width: f64 = caps[2].parse().map_err(|_| bad("invalid GPS width"))?;
        let (lat, lon) = geocoder.geocode(town)?;
        let ((lat1, lon1), (lat2, lon2)) = square_around(lat, lon, width);
        return Ok(vec![rectangle_clause(lat1, lon1, lat2, lon2)]);
    }
    if let Some(caps) = re_2town.captures(value) {
        let (lat1, lon1) = geocoder.geocode(caps[1].trim())?;
        let (lat2, lon2) = geocoder.geocode(caps[2].trim())?;
        return Ok(vec![rectangle_clause(lat1, lon1, lat2, lon2)]);
    }
    Err(bad("GPS coordinates malformed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoder::{GeoError, NullGeocoder};

    struct FixedGeocoder(f64, f64);
    impl Geocode for FixedGeocoder {
        fn geocode(&self, _place: &str) -> Result<(f64, f64), GeoError> {
            Ok((self.0, self.1))
        }
    }

    #[test]
    fn point_plus_radius_produces_rectangle() {
        let frag = gps_clause("45.7;4.8+10", &NullGeocoder, &NullGeocoder).unwrap();
        assert!(frag[0].contains("em.hasGps = 1"));
        assert!(frag[0].contains("BETWEEN"));
    }

    #[test]
    fn two_points_reorders_min_max() {
        let frag = gps_clause("46.0;5.0/45.0;4.0", &NullGeocoder, &NullGeocoder).unwrap();
        assert!(frag[0].contains("BETWEEN 45 AND 46"));
    }

    #[test]
    fn town_plus_radius_uses_geocoder() {
        let geocoder = FixedGeocoder(48.85, 2.35);
        let frag = gps_clause("paris+50", &geocoder, &NullGeocoder).unwrap();
        assert!(frag[0].contains("em.hasGps = 1"));
    }

    #[test]
    fn malformed_value_is_rejected() {
        assert!(gps_clause("???", &NullGeocoder, &NullGeocoder).is_err());
    }
}

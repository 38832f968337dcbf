//! Great-circle distance, grounded on `examples/original_source/algorithms/inner_types.py`'s
//! `PointLL.distance_to`.

const N_DEG_TO_RAD: f64 = 0.01745329238;
const EARTH_RADIUS_IN_METERS: f64 = 6_372_797.560856;

/// A (longitude, latitude) pair in degrees, matching the `Graph::coord` convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        LonLat { lon, lat }
    }
}

/// Haversine distance in metres between two points.
pub fn haversine_distance_m(a: LonLat, b: LonLat) -> f64 {
    let lat_arc = (a.lat - b.lat) * N_DEG_TO_RAD;
    let lon_arc = (a.lon - b.lon) * N_DEG_TO_RAD;

    let lat_h = (lat_arc * 0.5).sin();
    let lat_h = lat_h * lat_h;
    let lon_h = (lon_arc * 0.5).sin();
    let lon_h = lon_h * lon_h;

    let tmp = (a.lat * N_DEG_TO_RAD).cos() * (b.lat * N_DEG_TO_RAD).cos();
    2.0 * EARTH_RADIUS_IN_METERS * (lat_h + tmp * lon_h).sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_between_identical_points() {
        let p = LonLat::new(13.404954, 52.520008);
        assert!(haversine_distance_m(p, p) < 1e-6);
    }

    #[test]
    fn known_distance_berlin_hamburg_is_roughly_correct() {
        let berlin = LonLat::new(13.404954, 52.520008);
        let hamburg = LonLat::new(9.993682, 53.551086);
        let d = haversine_distance_m(berlin, hamburg);
        // ~255 km great-circle
        assert!(d > 250_000.0 && d < 260_000.0, "distance was {}", d);
    }
}

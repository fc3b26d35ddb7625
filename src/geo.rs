//! Coordinate validation and great-circle distance helpers shared by the spatial index,
//! the CH engine's snapping step, and the routing facade's Haversine fallback.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate. Latitude/longitude are degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True for finite coordinates inside `[-90,90] x [-180,180]`.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance in meters between two coordinates.
pub fn haversine_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Derives travel duration in seconds from a distance in meters and a speed in km/h.
/// A non-positive speed yields zero duration rather than dividing by zero or going negative.
pub fn duration_seconds(distance_m: f64, speed_kmh: f64) -> f64 {
    if speed_kmh <= 0.0 {
        return 0.0;
    }
    let speed_m_per_s = speed_kmh * 1000.0 / 3600.0;
    distance_m / speed_m_per_s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_between_identical_points() {
        let p = Coordinate::new(25.0330, 121.5654);
        assert!(haversine_meters(p, p) < 1e-6);
    }

    #[test]
    fn known_distance_taipei_to_penghu_is_roughly_140km() {
        let taipei = Coordinate::new(25.0330, 121.5654);
        let penghu = Coordinate::new(23.5711, 119.5793);
        let d = haversine_meters(taipei, penghu);
        assert!((130_000.0..160_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn coordinate_validity() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn duration_from_positive_speed() {
        let d = duration_seconds(30_000.0, 30.0); // 30km at 30km/h = 1h
        assert!((d - 3600.0).abs() < 1e-9);
    }

    #[test]
    fn duration_zero_for_nonpositive_speed() {
        assert_eq!(duration_seconds(1000.0, 0.0), 0.0);
        assert_eq!(duration_seconds(1000.0, -5.0), 0.0);
    }
}

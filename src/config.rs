//! Environment-driven configuration for the routing engine, read from `ROUTING_*`-prefixed
//! env vars with documented defaults.

/// Routing engine configuration (§6.4 of the design doc).
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub enabled: bool,
    pub data_path: String,
    pub max_snap_distance_km: f64,
    pub default_speed_kmh: f64,
    pub max_query_radius_km: f64,
    pub one_to_many_workers: usize,
    pub pre_filter_radius_multiplier: f64,
    pub grid_cell_size_km: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            data_path: String::new(),
            max_snap_distance_km: 1.0,
            default_speed_kmh: 30.0,
            max_query_radius_km: 10.0,
            one_to_many_workers: 20,
            pre_filter_radius_multiplier: 1.3,
            grid_cell_size_km: 1.0,
        }
    }
}

impl RoutingConfig {
    pub fn max_snap_distance_meters(&self) -> f64 {
        self.max_snap_distance_km * 1000.0
    }

    pub fn max_query_radius_meters(&self) -> f64 {
        self.max_query_radius_km * 1000.0
    }

    /// Load from environment variables, falling back to the documented defaults
    /// for anything absent or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_bool("ROUTING_ENABLED", defaults.enabled),
            data_path: std::env::var("ROUTING_DATA_PATH").unwrap_or(defaults.data_path),
            max_snap_distance_km: env_f64("ROUTING_MAX_SNAP_DISTANCE_KM", defaults.max_snap_distance_km),
            default_speed_kmh: env_f64("ROUTING_DEFAULT_SPEED_KMH", defaults.default_speed_kmh),
            max_query_radius_km: env_f64("ROUTING_MAX_QUERY_RADIUS_KM", defaults.max_query_radius_km),
            one_to_many_workers: env_usize("ROUTING_ONE_TO_MANY_WORKERS", defaults.one_to_many_workers),
            pre_filter_radius_multiplier: env_f64(
                "ROUTING_PRE_FILTER_RADIUS_MULTIPLIER",
                defaults.pre_filter_radius_multiplier,
            ),
            grid_cell_size_km: env_f64("ROUTING_GRID_CELL_SIZE_KM", defaults.grid_cell_size_km),
        }
    }
}

/// Compile-time constant batch size for push dispatch (§6.4): not configurable by design.
pub const FIREBASE_BATCH_SIZE: usize = 500;

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.parse::<f64>().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse::<usize>().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_design_doc() {
        let c = RoutingConfig::default();
        assert!(!c.enabled);
        assert_eq!(c.max_snap_distance_km, 1.0);
        assert_eq!(c.default_speed_kmh, 30.0);
        assert_eq!(c.max_query_radius_km, 10.0);
        assert_eq!(c.one_to_many_workers, 20);
        assert_eq!(c.pre_filter_radius_multiplier, 1.3);
        assert_eq!(c.grid_cell_size_km, 1.0);
    }

    #[test]
    fn unit_conversions() {
        let c = RoutingConfig::default();
        assert_eq!(c.max_snap_distance_meters(), 1000.0);
        assert_eq!(c.max_query_radius_meters(), 10_000.0);
    }
}

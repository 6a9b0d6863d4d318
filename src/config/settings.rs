use log::warn;

use crate::rating::Points;

pub const BASELINE_RATING: Points = Points::from_whole(1200);

#[derive(Debug, Clone, PartialEq)]
pub struct RatingSettings {
    pub baseline_rating: Points,
    pub k_factor_new_player: f64,
    pub k_factor_established_player: f64,
    pub established_threshold_matches: u32,
    /// Run a full replay instead of returning consistency warnings.
    pub replay_on_out_of_order: bool,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            baseline_rating: BASELINE_RATING,
            k_factor_new_player: 32.0,
            k_factor_established_player: 16.0,
            established_threshold_matches: 30,
            replay_on_out_of_order: false,
        }
    }
}

impl RatingSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            baseline_rating: defaults.baseline_rating,
            k_factor_new_player: env_or("RATING_K_NEW", defaults.k_factor_new_player),
            k_factor_established_player: env_or(
                "RATING_K_ESTABLISHED",
                defaults.k_factor_established_player,
            ),
            established_threshold_matches: env_or(
                "RATING_ESTABLISHED_AFTER",
                defaults.established_threshold_matches,
            ),
            replay_on_out_of_order: env_or(
                "RATING_REPLAY_ON_OUT_OF_ORDER",
                defaults.replay_on_out_of_order,
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub database_path: String,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            database_path: "tournament_rating.db".to_string(),
            default_page_size: 100,
            max_page_size: 1000,
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| defaults.database_path.clone()),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub rating: RatingSettings,
    pub server: ServerSettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            rating: RatingSettings::from_env(),
            server: ServerSettings::from_env(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

//! Request limits for the elevation profile pipeline.

/// Default minimum resample distance in meters.
pub const DEFAULT_MIN_RESAMPLE: f64 = 10.0;

/// Default maximum number of shape points after resampling.
pub const DEFAULT_MAX_ELEVATION_SHAPE: usize = 750_000;

/// Bounds applied to every height request.
///
/// # Environment Variables
///
/// | Variable | Description | Default |
/// |----------|-------------|---------|
/// | `HEIGHTLINE_MIN_RESAMPLE` | Minimum resample distance (meters) | 10.0 |
/// | `HEIGHTLINE_MAX_SHAPE` | Maximum shape points after resampling | 750000 |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightLimits {
    /// Smallest accepted `resample_distance`, in meters.
    pub min_resample: f64,
    /// Largest accepted shape size, checked after any resampling.
    pub max_elevation_shape: usize,
}

impl Default for HeightLimits {
    fn default() -> Self {
        Self {
            min_resample: DEFAULT_MIN_RESAMPLE,
            max_elevation_shape: DEFAULT_MAX_ELEVATION_SHAPE,
        }
    }
}

impl HeightLimits {
    /// Create limits with explicit values.
    pub fn new(min_resample: f64, max_elevation_shape: usize) -> Self {
        Self {
            min_resample,
            max_elevation_shape,
        }
    }

    /// Read limits from environment variables, falling back to defaults for
    /// unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let min_resample = std::env::var("HEIGHTLINE_MIN_RESAMPLE")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(defaults.min_resample);

        let max_elevation_shape = std::env::var("HEIGHTLINE_MAX_SHAPE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_elevation_shape);

        Self {
            min_resample,
            max_elevation_shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = HeightLimits::default();
        assert_eq!(limits.min_resample, 10.0);
        assert_eq!(limits.max_elevation_shape, 750_000);
    }

    #[test]
    fn test_from_env_with_values() {
        let orig_min = std::env::var("HEIGHTLINE_MIN_RESAMPLE").ok();
        let orig_max = std::env::var("HEIGHTLINE_MAX_SHAPE").ok();

        std::env::set_var("HEIGHTLINE_MIN_RESAMPLE", "25.5");
        std::env::set_var("HEIGHTLINE_MAX_SHAPE", "1000");

        let limits = HeightLimits::from_env();
        assert_eq!(limits.min_resample, 25.5);
        assert_eq!(limits.max_elevation_shape, 1000);

        std::env::set_var("HEIGHTLINE_MIN_RESAMPLE", "-3");
        std::env::set_var("HEIGHTLINE_MAX_SHAPE", "lots");

        let limits = HeightLimits::from_env();
        assert_eq!(limits, HeightLimits::default());

        match orig_min {
            Some(v) => std::env::set_var("HEIGHTLINE_MIN_RESAMPLE", v),
            None => std::env::remove_var("HEIGHTLINE_MIN_RESAMPLE"),
        }
        match orig_max {
            Some(v) => std::env::set_var("HEIGHTLINE_MAX_SHAPE", v),
            None => std::env::remove_var("HEIGHTLINE_MAX_SHAPE"),
        }
    }
}

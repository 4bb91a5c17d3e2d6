use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ArkheConfig {
    pub space: SpaceConfig,
    pub torus: TorusConfig,
    pub camera: CameraConfig,
    pub scheduler: SchedulerConfig,
    pub panel: PanelConfig,
}

/// Constants of the semantic vector space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Upper bound of the omega (phase depth) scalar
    pub omega_max: f64,
    /// Omega gap at or beyond which two vectors are incompatible
    pub delta_omega_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorusConfig {
    /// Major radius R (distance from the torus centre to the tube centre)
    pub major_radius: f64,
    /// Minor radius r (tube radius)
    pub minor_radius: f64,
    /// Points sampled per wireframe ring
    pub ring_segments: usize,
    /// Tube cross-sections drawn in the backdrop mesh
    pub poloidal_rings: usize,
    /// Circles around the symmetry axis drawn in the backdrop mesh
    pub toroidal_rings: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov: f64,
    pub viewer_distance: f64,
    /// Fixed rotation about the X axis (radians)
    pub tilt_x: f64,
    /// Fixed rotation about the Y axis (radians)
    pub tilt_y: f64,
    pub user_scale: f64,
    /// Torus spin in radians per unit of scheduler time
    pub spin_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Logical time added per frame callback
    pub time_step: f64,
    /// Backing buffer pixels per displayed pixel
    pub pixel_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub node_base_radius: f64,
    /// Growth of the node radius per unit of ln(1 + satoshi)
    pub satoshi_gain: f64,
    pub show_labels: bool,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            omega_max: 0.33,
            delta_omega_max: 0.10,
        }
    }
}

impl Default for TorusConfig {
    fn default() -> Self {
        Self {
            major_radius: 120.0,
            minor_radius: 45.0,
            ring_segments: 48,
            poloidal_rings: 24,
            toroidal_rings: 12,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 400.0,
            viewer_distance: 300.0,
            tilt_x: 0.6,
            tilt_y: 0.0,
            user_scale: 1.0,
            spin_rate: 1.0,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            pixel_ratio: 1.0,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            node_base_radius: 4.0,
            satoshi_gain: 0.15,
            show_labels: true,
        }
    }
}

impl ArkheConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: ArkheConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables should be prefixed with ARKHE_
    /// Example: ARKHE_SPACE_DELTA_OMEGA_MAX=0.12
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists)
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    pub fn load_layered(
        default_path: Option<&Path>,
        user_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = ArkheConfig::default();

        if let Some(path) = default_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        // Sections missing from the user file keep their serde defaults, so the
        // user layer replaces the default layer wholesale.
        if let Some(path) = user_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub(crate) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        override_from_env("ARKHE_SPACE_OMEGA_MAX", &mut self.space.omega_max)?;
        override_from_env(
            "ARKHE_SPACE_DELTA_OMEGA_MAX",
            &mut self.space.delta_omega_max,
        )?;

        override_from_env("ARKHE_TORUS_MAJOR_RADIUS", &mut self.torus.major_radius)?;
        override_from_env("ARKHE_TORUS_MINOR_RADIUS", &mut self.torus.minor_radius)?;
        override_from_env("ARKHE_TORUS_RING_SEGMENTS", &mut self.torus.ring_segments)?;

        override_from_env("ARKHE_CAMERA_FOV", &mut self.camera.fov)?;
        override_from_env(
            "ARKHE_CAMERA_VIEWER_DISTANCE",
            &mut self.camera.viewer_distance,
        )?;
        override_from_env("ARKHE_CAMERA_TILT_X", &mut self.camera.tilt_x)?;
        override_from_env("ARKHE_CAMERA_TILT_Y", &mut self.camera.tilt_y)?;
        override_from_env("ARKHE_CAMERA_SPIN_RATE", &mut self.camera.spin_rate)?;

        override_from_env("ARKHE_SCHEDULER_TIME_STEP", &mut self.scheduler.time_step)?;
        override_from_env(
            "ARKHE_SCHEDULER_PIXEL_RATIO",
            &mut self.scheduler.pixel_ratio,
        )?;

        override_from_env("ARKHE_PANEL_SHOW_LABELS", &mut self.panel.show_labels)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Space validation
        if !(self.space.omega_max > 0.0 && self.space.omega_max.is_finite()) {
            return Err(ConfigError::Validation(
                "space.omega_max must be positive".to_string(),
            ));
        }
        if !(self.space.delta_omega_max > 0.0 && self.space.delta_omega_max.is_finite()) {
            return Err(ConfigError::Validation(
                "space.delta_omega_max must be positive".to_string(),
            ));
        }

        // Torus validation
        if !(self.torus.minor_radius.is_finite() && self.torus.minor_radius > 0.0) {
            return Err(ConfigError::Validation(
                "torus.minor_radius must be positive".to_string(),
            ));
        }
        if !(self.torus.major_radius.is_finite() && self.torus.major_radius > self.torus.minor_radius) {
            return Err(ConfigError::Validation(
                "torus.major_radius must be > minor_radius".to_string(),
            ));
        }
        if self.torus.ring_segments < 3 {
            return Err(ConfigError::Validation(
                "torus.ring_segments must be >= 3".to_string(),
            ));
        }

        // Camera validation: the projection denominator fov + z + distance must
        // stay positive for every z a torus point can reach.
        if !(self.camera.fov.is_finite() && self.camera.fov > 0.0) {
            return Err(ConfigError::Validation(
                "camera.fov must be positive".to_string(),
            ));
        }
        let z_reach = self.torus.major_radius + self.torus.minor_radius;
        let reach = self.camera.fov + self.camera.viewer_distance;
        if !(reach.is_finite() && reach > z_reach) {
            return Err(ConfigError::Validation(format!(
                "camera.fov + camera.viewer_distance must exceed the torus extent {}",
                z_reach
            )));
        }
        if !(self.camera.user_scale.is_finite() && self.camera.user_scale > 0.0) {
            return Err(ConfigError::Validation(
                "camera.user_scale must be positive".to_string(),
            ));
        }

        // Scheduler validation
        if !(self.scheduler.time_step.is_finite() && self.scheduler.time_step > 0.0) {
            return Err(ConfigError::Validation(
                "scheduler.time_step must be positive".to_string(),
            ));
        }
        if !(self.scheduler.pixel_ratio.is_finite() && self.scheduler.pixel_ratio > 0.0) {
            return Err(ConfigError::Validation(
                "scheduler.pixel_ratio must be positive".to_string(),
            ));
        }

        // Panel validation
        if !(self.panel.node_base_radius.is_finite() && self.panel.node_base_radius > 0.0) {
            return Err(ConfigError::Validation(
                "panel.node_base_radius must be positive".to_string(),
            ));
        }
        if !(self.panel.satoshi_gain.is_finite() && self.panel.satoshi_gain >= 0.0) {
            return Err(ConfigError::Validation(
                "panel.satoshi_gain must be non-negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Parse `key` into `slot` when set. An unset variable leaves `slot` alone;
/// a non-UTF-8 value is `EnvVar`, an unparsable one is `Validation`.
pub(crate) fn override_from_env<T: std::str::FromStr>(
    key: &str,
    slot: &mut T,
) -> Result<(), ConfigError> {
    let val = match std::env::var(key) {
        Ok(val) => val,
        Err(std::env::VarError::NotPresent) => return Ok(()),
        Err(e) => return Err(ConfigError::EnvVar(e)),
    };
    *slot = val
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid {}", key)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::env;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_valid() {
        let config = ArkheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.space.omega_max, 0.33);
        assert_eq!(config.space.delta_omega_max, 0.10);
    }

    #[test]
    fn test_config_validation_space() {
        let mut config = ArkheConfig::default();
        config.space.omega_max = 0.0;
        assert!(config.validate().is_err());

        config.space.omega_max = 0.33;
        config.space.delta_omega_max = -0.1;
        assert!(config.validate().is_err());

        config.space.delta_omega_max = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_torus() {
        let mut config = ArkheConfig::default();

        // major radius must exceed minor radius
        config.torus.major_radius = 40.0;
        config.torus.minor_radius = 45.0;
        assert!(config.validate().is_err());

        config.torus.major_radius = 120.0;
        config.torus.ring_segments = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_camera_reach() {
        let mut config = ArkheConfig::default();

        // fov + distance no larger than R + r could zero the projection denominator
        config.camera.fov = 100.0;
        config.camera.viewer_distance = 65.0;
        assert!(config.validate().is_err());

        config.camera.viewer_distance = 66.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_nan() {
        let base = ArkheConfig::default();
        let cases: [fn(&mut ArkheConfig); 10] = [
            |c: &mut ArkheConfig| c.torus.minor_radius = f64::NAN,
            |c: &mut ArkheConfig| c.torus.major_radius = f64::NAN,
            |c: &mut ArkheConfig| c.camera.fov = f64::NAN,
            |c: &mut ArkheConfig| c.camera.viewer_distance = f64::NAN,
            |c: &mut ArkheConfig| c.camera.user_scale = f64::NAN,
            |c: &mut ArkheConfig| c.scheduler.time_step = f64::NAN,
            |c: &mut ArkheConfig| c.scheduler.pixel_ratio = f64::NAN,
            |c: &mut ArkheConfig| c.panel.node_base_radius = f64::NAN,
            |c: &mut ArkheConfig| c.panel.satoshi_gain = f64::NAN,
            |c: &mut ArkheConfig| c.camera.viewer_distance = f64::INFINITY,
        ];
        for (i, corrupt) in cases.iter().enumerate() {
            let mut config = base.clone();
            corrupt(&mut config);
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "case {} passed validation",
                i
            );
        }
    }

    #[test]
    fn test_env_override_parse_failure_is_validation_error() {
        let mut slot = 1.0f64;
        env::set_var("ARKHE_TEST_UNPARSABLE_FLOAT", "many");
        let result = override_from_env("ARKHE_TEST_UNPARSABLE_FLOAT", &mut slot);
        env::remove_var("ARKHE_TEST_UNPARSABLE_FLOAT");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        assert_eq!(slot, 1.0);

        // unset leaves the slot untouched
        assert!(override_from_env("ARKHE_TEST_NEVER_SET", &mut slot).is_ok());
        assert_eq!(slot, 1.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_env_override_non_unicode_is_env_var_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut slot = 1.0f64;
        env::set_var("ARKHE_TEST_NON_UNICODE", OsStr::from_bytes(&[0x66, 0x80, 0xff]));
        let result = override_from_env("ARKHE_TEST_NON_UNICODE", &mut slot);
        env::remove_var("ARKHE_TEST_NON_UNICODE");
        assert!(matches!(
            result,
            Err(ConfigError::EnvVar(env::VarError::NotUnicode(_)))
        ));
    }

    #[test]
    fn test_config_to_toml_string() {
        let config = ArkheConfig::default();
        let toml_str = config.to_toml_string().unwrap();

        assert!(toml_str.contains("[space]"));
        assert!(toml_str.contains("[camera]"));
        assert!(toml_str.contains("delta_omega_max"));
        assert!(toml_str.contains("ring_segments"));
    }

    #[test]
    fn test_config_from_partial_toml_string() {
        let toml_str = r#"
            [space]
            omega_max = 0.5
            delta_omega_max = 0.2

            [torus]
            major_radius = 200.0
            minor_radius = 60.0
        "#;

        let config: ArkheConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.space.omega_max, 0.5);
        assert_eq!(config.torus.major_radius, 200.0);
        // unspecified fields keep their defaults
        assert_eq!(config.torus.ring_segments, 48);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_config_save_and_load() {
        let mut config = ArkheConfig::default();
        config.camera.tilt_y = 0.25;

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();
        config.save_to_file(path).unwrap();

        let loaded = ArkheConfig::from_file(path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_config_from_file_rejects_invalid() {
        let mut config = ArkheConfig::default();
        config.scheduler.time_step = 0.0;

        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), config.to_toml_string().unwrap()).unwrap();

        assert!(matches!(
            ArkheConfig::from_file(temp_file.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_config_env_overrides() {
        env::set_var("ARKHE_CAMERA_TILT_Y", "0.4");
        env::set_var("ARKHE_SCHEDULER_PIXEL_RATIO", "2.0");
        env::set_var("ARKHE_PANEL_SHOW_LABELS", "false");

        let mut config = ArkheConfig::default();
        config.apply_env_overrides().unwrap();

        assert_eq!(config.camera.tilt_y, 0.4);
        assert_eq!(config.scheduler.pixel_ratio, 2.0);
        assert!(!config.panel.show_labels);

        env::remove_var("ARKHE_CAMERA_TILT_Y");
        env::remove_var("ARKHE_SCHEDULER_PIXEL_RATIO");
        env::remove_var("ARKHE_PANEL_SHOW_LABELS");
    }

    #[test]
    fn test_config_layered_loading() {
        let default_file = NamedTempFile::new().unwrap();
        let user_file = NamedTempFile::new().unwrap();

        ArkheConfig::default()
            .save_to_file(default_file.path())
            .unwrap();

        let mut user_config = ArkheConfig::default();
        user_config.space.delta_omega_max = 0.15;
        user_config.torus.minor_radius = 30.0;
        user_config.save_to_file(user_file.path()).unwrap();

        let loaded =
            ArkheConfig::load_layered(Some(default_file.path()), Some(user_file.path())).unwrap();

        assert_eq!(loaded.space.delta_omega_max, 0.15);
        assert_eq!(loaded.torus.minor_radius, 30.0);
    }

    #[test]
    fn test_config_layered_missing_files_fall_back_to_defaults() {
        let missing = std::path::Path::new("/nonexistent/arkhe/config.toml");
        let loaded = ArkheConfig::load_layered(Some(missing), None).unwrap();
        assert_eq!(loaded.space, SpaceConfig::default());
        assert_eq!(loaded.torus, TorusConfig::default());
    }
}

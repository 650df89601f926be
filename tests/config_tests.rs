//! Configuration files drive the engine.

#[cfg(feature = "config")]
mod tests {
    use std::io::Write;

    use picsy_core::{Community, ConfigError, EngineConfig};

    const FULL: &str = r#"
budget_epsilon = 1e-10
decomposition_floor = 1e-9

[solver]
max_iterations = 200
tolerance = 1e-8

[seed]
names = ["Ann", "Bob"]
matrix = [[3.0, 1.0], [1.0, 1.0]]
"#;

    #[test]
    fn test_full_document() {
        let config = EngineConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.solver.max_iterations, 200);
        assert_eq!(config.tolerances().decomposition_floor, 1e-9);

        let view = Community::new(config).unwrap().get_state();
        assert_eq!(view.members[0].name, "Ann");
        assert_eq!(view.matrix[(0, 0)], 0.75);
        assert_eq!(view.matrix[(1, 0)], 0.5);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("picsy-config-{}.toml", std::process::id()));
        std::fs::File::create(&path).unwrap().write_all(FULL.as_bytes()).unwrap();
        let config = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.budget_epsilon, 1e-10);
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/nonexistent/picsy.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "{err}");
    }

    #[test]
    fn test_invalid_values() {
        let err = EngineConfig::from_toml_str("[solver]\nmax_iterations = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_seed_surfaces_on_build() {
        let config = EngineConfig::from_toml_str("[seed]\nmatrix = [[1.0, 0.0]]\n").unwrap();
        assert!(matches!(Community::new(config), Err(ConfigError::Seed(_))));
    }
}

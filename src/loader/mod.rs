//! Layered environment loading
//!
//! Folds layers into one configuration, lowest precedence first:
//! 1. `environments/all` (required)
//! 2. `environments/<env>` (required)
//! 3. `secrets/<env>` (optional)
//! 4. Environment variables, nested on `__`
//!
//! Finally `environment` is set to the environment name.

mod environment;
mod resolver;

pub use environment::{fold_environment, EnvironmentSnapshot};
pub use resolver::{
    FileResolver, LayerError, LayerFormat, MemoryResolver, ResolveLayer, ResolvedLayer,
    ALL_ENVIRONMENTS, ENVIRONMENTS_DIR,
};

use chrono::Utc;
use std::path::Path;
use tracing::debug;

use crate::config::{ConfError, Config, LayerOrigin, LayerSource, Provenance};

/// Directory holding the optional secrets overlays
pub const SECRETS_DIR: &str = "secrets";

/// Key stamped with the environment name after all layers are merged
pub const ENVIRONMENT_KEY: &str = "environment";

/// Name recorded for the environment variable layer
pub const VARIABLES_LAYER: &str = "variables";

/// One file-backed layer in the precedence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    pub origin: LayerOrigin,
    pub name: String,
    pub required: bool,
}

/// File-backed layers for `env`, lowest precedence first
pub fn layer_plan(env: &str) -> Vec<LayerSpec> {
    vec![
        LayerSpec {
            origin: LayerOrigin::Base,
            name: format!("{}/{}", ENVIRONMENTS_DIR, ALL_ENVIRONMENTS),
            required: true,
        },
        LayerSpec {
            origin: LayerOrigin::Environment,
            name: format!("{}/{}", ENVIRONMENTS_DIR, env),
            required: true,
        },
        LayerSpec {
            origin: LayerOrigin::Secrets,
            name: format!("{}/{}", SECRETS_DIR, env),
            required: false,
        },
    ]
}

/// Load the configuration for `env` below `root`.
///
/// Only a missing optional layer is tolerated. A missing required layer
/// fails with [`ConfError::SourceNotFound`]; a broken layer fails with
/// [`ConfError::SourceLoad`] whether or not it is required.
pub fn load_environment<R>(
    root: &Path,
    env: &str,
    resolver: &R,
    snapshot: &EnvironmentSnapshot,
) -> Result<Config, ConfError>
where
    R: ResolveLayer + ?Sized,
{
    if env.is_empty() {
        return Err(ConfError::invalid_argument("env must be set"));
    }
    if !root.is_absolute() {
        return Err(ConfError::invalid_argument(
            "configDir must be an absolute path",
        ));
    }

    let mut config = Config::new();
    let mut sources = Vec::new();

    for spec in layer_plan(env) {
        match resolver.resolve(root, &spec.name) {
            Ok(layer) => {
                debug!(layer = %spec.name, location = %layer.location, "Merging configuration layer");
                config.merge(layer.content);
                sources.push(LayerSource {
                    origin: spec.origin,
                    name: spec.name,
                    location: Some(layer.location),
                    digest: layer.digest,
                });
            }
            Err(LayerError::NotFound { location }) if !spec.required => {
                debug!(layer = %spec.name, location = %location, "Skipping missing optional layer");
            }
            Err(LayerError::NotFound { location }) => {
                return Err(ConfError::SourceNotFound {
                    layer: spec.name,
                    location,
                });
            }
            Err(LayerError::Broken { location, reason }) => {
                return Err(ConfError::SourceLoad {
                    layer: spec.name,
                    location,
                    reason,
                });
            }
        }
    }

    debug!(count = snapshot.len(), "Merging environment variables");
    config.merge(fold_environment(snapshot));
    sources.push(LayerSource {
        origin: LayerOrigin::Variables,
        name: VARIABLES_LAYER.to_string(),
        location: None,
        digest: None,
    });

    config.set(ENVIRONMENT_KEY, env)?;
    config.set_provenance(Provenance {
        environment: env.to_string(),
        loaded_at: Utc::now(),
        sources,
    });

    Ok(config)
}

/// Load `env` from TOML files below `root` and the current process environment
pub fn load_environment_from_process(root: &Path, env: &str) -> Result<Config, ConfError> {
    load_environment(
        root,
        env,
        &FileResolver::default(),
        &EnvironmentSnapshot::from_process(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorKind;
    use conf_tree::{Map, Value};
    use serde_json::json;

    fn map(json: serde_json::Value) -> Map {
        match Value::from(json) {
            Value::Map(map) => map,
            other => panic!("expected a map, got {:?}", other),
        }
    }

    fn resolver() -> MemoryResolver {
        MemoryResolver::new()
            .with_layer("environments/all", map(json!({"environments_all": true, "level": "all"})))
            .with_layer("environments/test", map(json!({"environments_test": true, "level": "test"})))
            .with_layer("secrets/test", map(json!({"secrets_test": true, "level": "secrets"})))
    }

    fn root() -> &'static Path {
        Path::new("/etc/app")
    }

    #[test]
    fn test_layer_plan_order() {
        let plan = layer_plan("staging");
        let names: Vec<&str> = plan.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["environments/all", "environments/staging", "secrets/staging"]);
        assert_eq!(
            plan.iter().map(|s| s.required).collect::<Vec<_>>(),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_later_layers_take_precedence() {
        let config = load_environment(root(), "test", &resolver(), &EnvironmentSnapshot::new()).unwrap();
        assert_eq!(config.get("level").unwrap().as_str(), Some("secrets"));

        let snapshot: EnvironmentSnapshot = [("level", "variables")].into_iter().collect();
        let config = load_environment(root(), "test", &resolver(), &snapshot).unwrap();
        assert_eq!(config.get("level").unwrap().as_str(), Some("variables"));
    }

    #[test]
    fn test_environment_key_overrides_layers_and_variables() {
        let resolver = resolver()
            .with_layer("environments/all", map(json!({"environment": "bogus"})));
        let snapshot: EnvironmentSnapshot = [("environment", "also-bogus")].into_iter().collect();

        let config = load_environment(root(), "test", &resolver, &snapshot).unwrap();
        assert_eq!(config.get("environment").unwrap().as_str(), Some("test"));
    }

    #[test]
    fn test_preconditions_checked_before_resolving() {
        let resolver = resolver();

        let err = load_environment(Path::new("relative/dir"), "test", &resolver, &EnvironmentSnapshot::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "configDir must be an absolute path");

        let err = load_environment(root(), "", &resolver, &EnvironmentSnapshot::new()).unwrap_err();
        assert_eq!(err.to_string(), "env must be set");

        assert!(resolver.requests().is_empty());
    }

    #[test]
    fn test_missing_optional_secrets_skipped() {
        let resolver = MemoryResolver::new()
            .with_layer("environments/all", map(json!({"a": 1})))
            .with_layer("environments/prod", map(json!({"b": 2})));

        let config = load_environment(root(), "prod", &resolver, &EnvironmentSnapshot::new()).unwrap();
        assert_eq!(config.get("b").unwrap(), &Value::from(2));

        let provenance = config.provenance().unwrap();
        assert_eq!(
            provenance.layer_names(),
            vec!["environments/all", "environments/prod", "variables"]
        );
    }

    #[test]
    fn test_missing_required_layer_aborts() {
        let resolver = MemoryResolver::new().with_layer("environments/all", map(json!({"a": 1})));

        let err = load_environment(root(), "prod", &resolver, &EnvironmentSnapshot::new()).unwrap_err();
        assert_eq!(
            err,
            ConfError::SourceNotFound {
                layer: "environments/prod".to_string(),
                location: "memory:environments/prod".to_string(),
            }
        );
        // Nothing after the failing layer is requested.
        assert_eq!(resolver.requests(), vec!["environments/all", "environments/prod"]);
    }

    #[test]
    fn test_broken_optional_layer_aborts() {
        let resolver = resolver().with_broken("secrets/test", "foobar is not defined");

        let err = load_environment(root(), "test", &resolver, &EnvironmentSnapshot::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceLoad);
        assert!(err.to_string().contains("foobar is not defined"));
    }

    #[test]
    fn test_broken_required_layer_aborts() {
        let resolver = resolver().with_broken("environments/all", "unexpected token");

        let err = load_environment(root(), "test", &resolver, &EnvironmentSnapshot::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceLoad);
    }

    #[test]
    fn test_provenance_records_layers() {
        let config = load_environment(root(), "test", &resolver(), &EnvironmentSnapshot::new()).unwrap();
        let provenance = config.provenance().unwrap();

        assert_eq!(provenance.environment, "test");
        assert_eq!(
            provenance.sources.iter().map(|s| s.origin).collect::<Vec<_>>(),
            vec![
                LayerOrigin::Base,
                LayerOrigin::Environment,
                LayerOrigin::Secrets,
                LayerOrigin::Variables
            ]
        );
        assert_eq!(
            provenance.sources[2].location.as_deref(),
            Some("memory:secrets/test")
        );
    }
}

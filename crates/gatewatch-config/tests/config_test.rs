#![allow(clippy::unwrap_used)]
// Config loading, layering, credential, and validation tests.
//
// Anything touching the environment runs inside `figment::Jail`, which
// serializes access and restores the environment afterwards.

use std::path::Path;
use std::time::Duration;

use figment::Jail;
use gatewatch_api::{GatewayModel, ModelSelection};
use gatewatch_config::{
    Config, ConfigError, Defaults, GatewayProfile, Overrides, load_config, parse_gateway_url,
    profile_to_monitor_config, resolve_password, save_config, starter_config,
};
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

const SAMPLE: &str = r#"
default_gateway = "home"

[defaults]
poll_interval_ms = 2000
sinr_drop_threshold_5g = 12.5

[gateways.home]
url = "http://192.168.12.1"

[gateways.cabin]
url = "https://10.0.0.1"
model = "nokia"
username = "admin"
password = "plain"
timeout_ms = 1500
"#;

fn jail_err(err: ConfigError) -> figment::Error {
    err.to_string().into()
}

#[test]
fn test_missing_file_yields_defaults() {
    Jail::expect_with(|_jail| {
        let cfg = load_config(Some(Path::new("nope.toml"))).map_err(jail_err)?;
        assert!(cfg.gateways.is_empty());
        assert_eq!(cfg.defaults, Defaults::default());
        assert_eq!(cfg.defaults.poll_interval_ms, 5000);
        assert_eq!(cfg.defaults.failure_threshold, 3);
        assert_eq!(cfg.export.listen, "0.0.0.0:9877");
        Ok(())
    });
}

#[test]
fn test_file_layers_over_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", SAMPLE)?;
        let cfg = load_config(Some(Path::new("config.toml"))).map_err(jail_err)?;

        assert_eq!(cfg.default_gateway.as_deref(), Some("home"));
        assert_eq!(cfg.gateways.len(), 2);
        assert_eq!(cfg.defaults.poll_interval_ms, 2000);
        // Untouched keys keep their defaults.
        assert_eq!(cfg.defaults.timeout_ms, 5000);
        assert_eq!(cfg.gateways["cabin"].overrides.timeout_ms, Some(1500));
        Ok(())
    });
}

#[test]
fn test_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", SAMPLE)?;
        jail.set_env("GATEWATCH_DEFAULTS__POLL_INTERVAL_MS", "750");
        jail.set_env("GATEWATCH_DEFAULT_GATEWAY", "cabin");

        let cfg = load_config(Some(Path::new("config.toml"))).map_err(jail_err)?;
        assert_eq!(cfg.defaults.poll_interval_ms, 750);
        assert_eq!(cfg.default_gateway.as_deref(), Some("cabin"));
        Ok(())
    });
}

#[test]
fn test_profile_translates_to_monitor_config() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", SAMPLE)?;
        let cfg = load_config(Some(Path::new("config.toml"))).map_err(jail_err)?;

        let (name, profile) = cfg.select_gateway(Some("cabin")).map_err(jail_err)?;
        let monitor = profile_to_monitor_config(&name, profile, &cfg.defaults).map_err(jail_err)?;

        assert_eq!(monitor.name, "cabin");
        assert_eq!(monitor.url.as_str(), "https://10.0.0.1/");
        assert_eq!(monitor.model, ModelSelection::Fixed(GatewayModel::Nokia));
        assert_eq!(monitor.poller.interval, Duration::from_millis(2000));
        assert_eq!(monitor.poller.timeout, Duration::from_millis(1500));
        assert_eq!(monitor.transport.timeout, Duration::from_millis(1500));
        assert!((monitor.detection.sinr_drop_5g - 12.5).abs() < f64::EPSILON);

        let creds = monitor.transport.credentials.as_ref().unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password.expose_secret(), "plain");
        Ok(())
    });
}

#[test]
fn test_default_gateway_selection() {
    let cfg: Config = toml::from_str(SAMPLE).unwrap();
    let (name, _) = cfg.select_gateway(None).unwrap();
    assert_eq!(name, "home");

    let err = cfg.select_gateway(Some("garage")).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownGateway { ref name } if name == "garage"));
}

#[test]
fn test_single_profile_is_implicit_default() {
    let cfg: Config = toml::from_str("[gateways.only]\nurl = \"http://a\"\n").unwrap();
    assert_eq!(cfg.select_gateway(None).unwrap().0, "only");

    let empty = Config::default();
    assert!(matches!(empty.select_gateway(None), Err(ConfigError::NoGateway)));
}

#[test]
fn test_password_resolution_order() {
    Jail::expect_with(|jail| {
        let mut profile = GatewayProfile {
            url: "http://gw".into(),
            username: Some("admin".into()),
            password: Some("plain".into()),
            password_env: Some("HOME_GW_PASS".into()),
            overrides: Overrides::default(),
        };
        assert_eq!(resolve_password(&profile).unwrap().expose_secret(), "plain");

        jail.set_env("GATEWATCH_PASSWORD", "global");
        assert_eq!(resolve_password(&profile).unwrap().expose_secret(), "global");

        jail.set_env("HOME_GW_PASS", "named");
        assert_eq!(resolve_password(&profile).unwrap().expose_secret(), "named");

        profile.password = None;
        profile.password_env = None;
        assert_eq!(resolve_password(&profile).unwrap().expose_secret(), "global");
        Ok(())
    });
}

#[test]
fn test_username_without_password_is_rejected() {
    Jail::expect_with(|_jail| {
        let profile = GatewayProfile {
            url: "http://gw".into(),
            username: Some("admin".into()),
            ..GatewayProfile::default()
        };
        let err = profile_to_monitor_config("gw", &profile, &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
        Ok(())
    });
}

#[test]
fn test_validation_rejects_bad_values() {
    let profile = |overrides: Overrides| GatewayProfile {
        url: "http://gw".into(),
        overrides,
        ..GatewayProfile::default()
    };
    let defaults = Defaults::default();
    let field_of = |overrides: Overrides| {
        match profile_to_monitor_config("gw", &profile(overrides), &defaults).unwrap_err() {
            ConfigError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    };

    assert_eq!(
        field_of(Overrides { poll_interval_ms: Some(0), ..Overrides::default() }),
        "poll_interval_ms"
    );
    assert_eq!(
        field_of(Overrides { failure_threshold: Some(0), ..Overrides::default() }),
        "failure_threshold"
    );
    assert_eq!(
        field_of(Overrides { rsrp_drop_threshold_4g: Some(-1.0), ..Overrides::default() }),
        "rsrp_drop_threshold_4g"
    );
    assert_eq!(
        field_of(Overrides { model: Some("huawei".into()), ..Overrides::default() }),
        "model"
    );
}

#[test]
fn test_gateway_url_must_be_http() {
    assert!(parse_gateway_url("http://192.168.12.1").is_ok());
    assert!(parse_gateway_url(" https://gw.local ").is_ok());
    assert!(matches!(
        parse_gateway_url("ftp://gw"),
        Err(ConfigError::Validation { .. })
    ));
    assert!(parse_gateway_url("not a url").is_err());
}

#[test]
fn test_starter_config_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    save_config(&starter_config(), &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let cfg: Config = toml::from_str(&text).unwrap();
    assert_eq!(cfg.default_gateway.as_deref(), Some("home"));
    assert_eq!(cfg.gateways["home"].url, "http://192.168.12.1");
    assert_eq!(cfg.defaults, Defaults::default());
}

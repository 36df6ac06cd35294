use crate::defaults::default_config;
use crate::errors::PolicyError;
use crate::loader::{load_config, load_config_with_options, LoadOptions};
use crate::model::ConfigSource;
use crate::AuthEngine;
use refgate_core_types::Role;
use std::env;
use std::io;
use std::sync::{Arc, Mutex, OnceLock};

#[test]
fn default_config_matches_query_limits() {
    let config = default_config();
    assert_eq!(config.max_query_len, 4096);
    assert_eq!(config.max_search_len, 512);
    assert_eq!(config.local_origin, "");
}

#[test]
fn load_config_reads_yaml_file() {
    let _guard = env_guard().lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("refgate.yaml");
    std::fs::write(
        &file_path,
        r#"local_origin: "@home"
max_query_len: 1024
role_hierarchy:
  - ADMIN > MOD > USER
  - USER > VIEWER
"#,
    )
    .unwrap();

    let config = load_config(Some(&file_path)).unwrap();
    assert_eq!(config.local_origin, "@home");
    assert_eq!(config.max_query_len, 1024);
    assert_eq!(config.max_search_len, 512);
    assert_eq!(config.source_of("local_origin"), Some(ConfigSource::File));
    assert_eq!(config.source_of("max_search_len"), Some(ConfigSource::Builtin));

    let engine = AuthEngine::new(config).unwrap();
    assert!(engine.hierarchy().implies(Role::Admin, Role::Viewer));
    assert!(!engine.hierarchy().implies(Role::Sysadmin, Role::Admin));
}

#[test]
fn load_config_reads_json_file() {
    let _guard = env_guard().lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("refgate.json");
    std::fs::write(&file_path, r#"{"local_origin": "default", "max_search_len": 64}"#).unwrap();

    let config = load_config(Some(&file_path)).unwrap();
    assert_eq!(config.local_origin, "");
    assert_eq!(config.max_search_len, 64);
    assert_eq!(config.source_of("local_origin"), Some(ConfigSource::Builtin));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let _guard = env_guard().lock().unwrap();
    let config = load_config(Some(std::path::Path::new("/nonexistent/refgate.yaml"))).unwrap();
    let defaults = default_config();
    assert_eq!(config.local_origin, defaults.local_origin);
    assert_eq!(config.role_hierarchy, defaults.role_hierarchy);
    assert!(config
        .provenance
        .values()
        .all(|entry| entry.source == ConfigSource::Builtin));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn missing_file_is_reported_at_warn() {
    let _guard = env_guard().lock().unwrap();
    let logs = CapturedLogs::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || sink.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        load_config(Some(std::path::Path::new("/nonexistent/refgate.yaml"))).unwrap();
    });

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("WARN"), "{output}");
    assert!(output.contains("auth config file absent"), "{output}");
    assert!(output.contains("/nonexistent/refgate.yaml"), "{output}");
}

#[test]
fn env_overrides_file_and_records_provenance() {
    let _guard = env_guard().lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("refgate.yaml");
    std::fs::write(&file_path, "max_query_len: 1024\n").unwrap();

    env::set_var("REFGATE_AUTH__MAX_QUERY_LEN", "2048");
    env::set_var("REFGATE_AUTH__ROLE_HIERARCHY", "ADMIN > MOD, MOD > USER");
    let config = load_config(Some(&file_path));
    env::remove_var("REFGATE_AUTH__MAX_QUERY_LEN");
    env::remove_var("REFGATE_AUTH__ROLE_HIERARCHY");

    let config = config.expect("load config");
    assert_eq!(config.max_query_len, 2048);
    assert_eq!(config.role_hierarchy, vec!["ADMIN > MOD", "MOD > USER"]);
    assert_eq!(config.source_of("max_query_len"), Some(ConfigSource::Env));
    assert_eq!(config.source_of("role_hierarchy"), Some(ConfigSource::Env));
}

#[test]
fn explicit_overrides_apply_last() {
    let _guard = env_guard().lock().unwrap();
    env::set_var("REFGATE_AUTH__LOCAL_ORIGIN", "@env");
    let options = LoadOptions {
        paths: Vec::new(),
        include_env: true,
        overrides: vec!["local_origin=@cli".into()],
    };
    let config = load_config_with_options(&options);
    env::remove_var("REFGATE_AUTH__LOCAL_ORIGIN");

    let config = config.expect("load config");
    assert_eq!(config.local_origin, "@cli");
    assert_eq!(config.source_of("local_origin"), Some(ConfigSource::Cli));
}

#[test]
fn rejects_bad_values() {
    let _guard = env_guard().lock().unwrap();
    let load = |pair: &str| {
        load_config_with_options(&LoadOptions {
            overrides: vec![pair.to_string()],
            ..LoadOptions::default()
        })
    };
    assert!(matches!(load("local_origin=remote"), Err(PolicyError::InvalidValue(_))));
    assert!(matches!(load("max_query_len=0"), Err(PolicyError::InvalidValue(_))));
    assert!(matches!(load("scheduler.slots=4"), Err(PolicyError::UnsupportedPath(_))));
    assert!(matches!(
        load("role_hierarchy=USER > ADMIN, ADMIN > USER"),
        Err(PolicyError::HierarchyCycle(_))
    ));
    assert!(matches!(
        load("role_hierarchy=ADMIN > ROOT"),
        Err(PolicyError::UnknownRole(_))
    ));
}

fn env_guard() -> &'static Mutex<()> {
    static ENV_GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_GUARD.get_or_init(|| Mutex::new(()))
}

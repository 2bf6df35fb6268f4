use repokit::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    unsafe {
        env::remove_var("REPOKIT_PROFILE");
        env::remove_var("REPOKIT_DATABASE_URL");
        env::remove_var("REPOKIT_LOG_LEVEL");
        env::remove_var("REPOKIT_LOG_FORMAT");
        env::remove_var("REPOKIT_DB_MAX_CONNECTIONS");
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.log_format, "json");
    assert_eq!(cfg.db_max_connections, 10);
    assert_eq!(cfg.db_acquire_timeout_ms, 5000);
    assert!(cfg.database_url.starts_with("sqlite://"));
    assert!(!cfg.db_sqlx_logging);
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "REPOKIT_DATABASE_URL=sqlite://base.db\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "REPOKIT_DATABASE_URL=sqlite://profile.db\nREPOKIT_LOG_LEVEL=debug\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "REPOKIT_DATABASE_URL=sqlite://profile-local.db\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "REPOKIT_PROFILE=test\nREPOKIT_DATABASE_URL=sqlite://local.db\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.database_url, "sqlite://profile-local.db");
    assert_eq!(cfg.log_level, "debug");
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "REPOKIT_DATABASE_URL=sqlite://file.db\nREPOKIT_DB_MAX_CONNECTIONS=3\n",
    );

    unsafe {
        env::set_var("REPOKIT_DATABASE_URL", "sqlite::memory:");
    }

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with env override");
    assert_eq!(cfg.database_url, "sqlite::memory:");
    assert_eq!(cfg.db_max_connections, 3);

    clear_env();
}

#[test]
fn unparsable_number_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("REPOKIT_DB_MAX_CONNECTIONS", "lots");
    }
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("non-numeric pool size should fail");
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
    assert!(format!("{}", err).contains("REPOKIT_DB_MAX_CONNECTIONS"));

    clear_env();
}

#[test]
fn invalid_log_format_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("REPOKIT_LOG_FORMAT", "xml");
    }
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("unknown log format should fail");
    assert!(format!("{}", err).contains("log format"));

    clear_env();
}

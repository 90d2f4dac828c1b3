use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_root(label: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let root = env::temp_dir().join(format!("edu_console_{label}_{suffix}"));
    fs::create_dir_all(&root).expect("temp root");
    root
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_yields_defaults() {
    let root = temp_root("defaults");
    let settings =
        load_settings_with(&root.join("console.toml"), &Overrides::default(), no_env)
            .expect("settings");

    assert_eq!(settings.base_url, "http://localhost:7070");
    assert_eq!(settings.timeout_seconds, 10);
    assert_eq!(settings.locale, Locale::Uz);
    assert!(settings
        .session_file
        .to_string_lossy()
        .ends_with("session.json"));

    fs::remove_dir_all(root).expect("cleanup");
}

#[test]
fn file_then_env_then_flags() {
    let root = temp_root("layers");
    let path = root.join("console.toml");
    fs::write(
        &path,
        "base_url = \"http://file:1\"\ntimeout_seconds = 3\nlocale = \"en\"\n",
    )
    .expect("write config");

    let from_file = load_settings_with(&path, &Overrides::default(), no_env).expect("file");
    assert_eq!(from_file.base_url, "http://file:1");
    assert_eq!(from_file.timeout_seconds, 3);
    assert_eq!(from_file.locale, Locale::En);

    let env_vars: HashMap<&str, &str> = [
        ("NEXT_PUBLIC_BASE_URL", "http://next:2"),
        ("BASE_URL", "http://plain:3/"),
        ("APP__SESSION_FILE", "/tmp/edu-session.json"),
    ]
    .into_iter()
    .collect();
    let env_lookup = |key: &str| env_vars.get(key).map(|v| v.to_string());
    let from_env = load_settings_with(&path, &Overrides::default(), env_lookup).expect("env");
    assert_eq!(from_env.base_url, "http://plain:3");
    assert_eq!(from_env.session_file, PathBuf::from("/tmp/edu-session.json"));

    let overrides = Overrides {
        base_url: Some("http://flag:4".into()),
        locale: Some("uz".into()),
        ..Overrides::default()
    };
    let from_flags = load_settings_with(&path, &overrides, env_lookup).expect("flags");
    assert_eq!(from_flags.base_url, "http://flag:4");
    assert_eq!(from_flags.locale, Locale::Uz);
    assert_eq!(from_flags.timeout_seconds, 3);
    assert_eq!(
        from_flags.client_config().timeout,
        Duration::from_secs(3)
    );

    fs::remove_dir_all(root).expect("cleanup");
}

#[test]
fn malformed_file_is_an_error() {
    let root = temp_root("malformed");
    let path = root.join("console.toml");
    fs::write(&path, "timeout_seconds = \"soon\"").expect("write config");

    let err = load_settings_with(&path, &Overrides::default(), no_env).expect_err("bad file");
    assert!(matches!(err, ConfigError::Parse { .. }));

    fs::remove_dir_all(root).expect("cleanup");
}

#[test]
fn invalid_values_are_rejected() {
    let root = temp_root("invalid");
    let path = root.join("console.toml");

    let err = load_settings_with(&path, &Overrides::default(), |key| {
        (key == "APP__TIMEOUT_SECONDS").then(|| "ten".to_string())
    })
    .expect_err("bad timeout");
    assert!(matches!(err, ConfigError::InvalidTimeout(_)));

    let overrides = Overrides {
        timeout_seconds: Some(0),
        ..Overrides::default()
    };
    assert!(matches!(
        load_settings_with(&path, &overrides, no_env),
        Err(ConfigError::InvalidTimeout(_))
    ));

    let overrides = Overrides {
        locale: Some("ru".into()),
        ..Overrides::default()
    };
    assert!(matches!(
        load_settings_with(&path, &overrides, no_env),
        Err(ConfigError::InvalidLocale(_))
    ));

    fs::remove_dir_all(root).expect("cleanup");
}

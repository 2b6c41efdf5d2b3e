use super::*;

use std::{collections::HashMap, io::Write};

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

fn settings_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write settings");
    file
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let settings = load_settings_from(&dir.path().join(SETTINGS_FILE), no_env);
    assert_eq!(settings, Settings::default());
}

#[test]
fn reads_native_and_quoted_values_from_file() {
    let file = settings_file(
        r#"
api_url = "https://swapi.example/api/"
request_timeout_secs = 3
revalidate_on_mount = "yes"
"#,
    );
    let settings = load_settings_from(file.path(), no_env);
    assert_eq!(settings.api_url, "https://swapi.example/api/");
    assert_eq!(settings.request_timeout_secs, 3);
    assert!(settings.revalidate_on_mount);
}

#[test]
fn environment_overrides_file() {
    let file = settings_file(r#"api_url = "https://file.example/api""#);
    let settings = load_settings_from(
        file.path(),
        env_from(&[
            ("CATALOG_API_URL", "https://env.example/api"),
            ("APP__REQUEST_TIMEOUT_SECS", "30"),
            ("APP__REVALIDATE_ON_MOUNT", "true"),
        ]),
    );
    assert_eq!(settings.api_url, "https://env.example/api");
    assert_eq!(settings.request_timeout_secs, 30);
    assert!(settings.revalidate_on_mount);
}

#[test]
fn app_prefixed_variable_wins_over_plain_one() {
    let dir = tempfile::tempdir().expect("temp dir");
    let settings = load_settings_from(
        &dir.path().join(SETTINGS_FILE),
        env_from(&[
            ("CATALOG_API_URL", "https://plain.example"),
            ("APP__API_URL", "https://prefixed.example"),
        ]),
    );
    assert_eq!(settings.api_url, "https://prefixed.example");
}

#[test]
fn unparsable_values_keep_previous_setting() {
    let file = settings_file("request_timeout_secs = \"soon\"\nrevalidate_on_mount = \"maybe\"\n");
    let settings = load_settings_from(file.path(), no_env);
    assert_eq!(settings.request_timeout_secs, Settings::default().request_timeout_secs);
    assert!(!settings.revalidate_on_mount);
}

#[test]
fn broken_toml_falls_back_to_defaults() {
    let file = settings_file("api_url = [unterminated");
    let settings = load_settings_from(file.path(), no_env);
    assert_eq!(settings, Settings::default());
}

#[test]
fn validates_base_url_scheme() {
    let mut settings = Settings::default();
    assert!(settings.base_url().is_ok());

    settings.api_url = "ftp://catalog.example/api".into();
    assert!(matches!(
        settings.base_url(),
        Err(SettingsError::UnsupportedScheme { scheme, .. }) if scheme == "ftp"
    ));

    settings.api_url = "not a url".into();
    assert!(matches!(
        settings.base_url(),
        Err(SettingsError::InvalidApiUrl { .. })
    ));
}

#[test]
fn timeout_is_never_zero() {
    let settings = Settings {
        request_timeout_secs: 0,
        ..Settings::default()
    };
    assert_eq!(settings.request_timeout(), Duration::from_secs(1));
    assert!(!settings.cache_options().revalidate_on_mount);
}

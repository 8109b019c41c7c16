use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

/// Config file name inside the workspace directory
pub const CONFIG_FILE: &str = "lewtwo.toml";

/// Keys accepted by `lew config`
pub const CONFIG_KEYS: &[&str] = &[STORE_FILE_KEY, "display.default_due_display", "log.level"];

const STORE_FILE_KEY: &str = "store.file";

const CONFIG_TEMPLATE: &str = r##"# lewtwo workspace settings

[store]
# Task store, relative to this directory
file = "{store_file}"

[display]
# Due display for new task trees: "none", "dates", "badges" or "colours"
default_due_display = "{due_display}"

[log]
# tracing filter directive; LEWTWO_LOG overrides it
level = "{log_level}"
"##;

/// Error type for config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse lewtwo.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse lewtwo.toml: {0}")]
    DocumentError(#[from] toml_edit::TomlError),
    #[error("unknown config key {0:?} (known keys: {keys})", keys = CONFIG_KEYS.join(", "))]
    UnknownKey(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_config(dir: &Path) -> Result<(AppConfig, toml_edit::DocumentMut), ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: AppConfig = toml::from_str(&config_text)?;
    validate_store_file(&config.store.file)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    fs::write(&config_path, doc.to_string()).map_err(|e| ConfigError::WriteError {
        path: config_path,
        source: e,
    })
}

/// Write a fresh, commented config file holding every key.
pub fn write_default_config(dir: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let text = CONFIG_TEMPLATE
        .replace("{store_file}", &config.store.file)
        .replace("{due_display}", config.display.default_due_display.as_str())
        .replace("{log_level}", &config.log.level);
    let doc: toml_edit::DocumentMut = text.parse()?;
    write_config(dir, &doc)
}

/// Look up a dotted key in the document.
pub fn get_config_value(doc: &toml_edit::DocumentMut, key: &str) -> Result<Option<String>, ConfigError> {
    let (section, field) = split_key(key)?;
    Ok(doc
        .get(section)
        .and_then(|table| table.get(field))
        .and_then(|item| item.as_str())
        .map(str::to_string))
}

/// Set a dotted key, e.g. `display.default_due_display`.
///
/// The edited document must still parse as a valid config, otherwise the
/// document is left unchanged.
pub fn set_config_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let (section, field) = split_key(key)?;
    if key == STORE_FILE_KEY {
        validate_store_file(value)?;
    }

    let mut edited = doc.clone();
    let table = edited
        .entry(section)
        .or_insert(toml_edit::Item::Table(toml_edit::Table::new()))
        .as_table_like_mut()
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("`{}` in lewtwo.toml is not a table", section),
        })?;
    table.insert(field, toml_edit::value(value));

    toml::from_str::<AppConfig>(&edited.to_string()).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.message().to_string(),
    })?;
    *doc = edited;
    Ok(())
}

/// A store file must be a plain `.json` file name inside `.lewtwo/`.
pub fn validate_store_file(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: STORE_FILE_KEY.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("store file name cannot be empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name.starts_with('.') {
        return Err(invalid(format!(
            "'{}' is not a plain file name such as tasks.json",
            name
        )));
    }
    if !name.ends_with(".json") {
        return Err(invalid(format!("'{}' must end in .json", name)));
    }
    Ok(())
}

fn split_key(key: &str) -> Result<(&str, &str), ConfigError> {
    if !CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey(key.to_string()));
    }
    key.split_once('.')
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::DueDisplay;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r#"# lewtwo settings
[store]
file = "tasks.json"

[display]
default_due_display = "none"  # none, dates, badges or colours
"#
    }

    #[test]
    fn test_round_trip_preserves_formatting() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), sample_config()).unwrap();

        let (config, doc) = read_config(tmp.path()).unwrap();
        assert_eq!(config.log.level, "warn");
        write_config(tmp.path(), &doc).unwrap();

        let written = fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(written, sample_config());
    }

    #[test]
    fn test_set_value_keeps_comments() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_config_value(&mut doc, "display.default_due_display", "badges").unwrap();
        let text = doc.to_string();
        assert!(text.starts_with("# lewtwo settings"));

        let config: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.display.default_due_display, DueDisplay::Badges);
        assert_eq!(
            get_config_value(&doc, "display.default_due_display").unwrap(),
            Some("badges".to_string())
        );
    }

    #[test]
    fn test_set_value_adds_missing_section() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_config_value(&mut doc, "log.level", "debug").unwrap();
        let config: AppConfig = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_invalid_value_leaves_doc_unchanged() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        let before = doc.to_string();
        let err = set_config_value(&mut doc, "display.default_due_display", "loud").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(doc.to_string(), before);
    }

    #[test]
    fn test_unknown_key() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        assert!(matches!(
            set_config_value(&mut doc, "store.path", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            get_config_value(&doc, "nope"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_store_file_must_stay_in_workspace() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        let before = doc.to_string();
        let bad_names = [
            "../../outside.txt",
            "../tasks.json",
            "sub/tasks.json",
            "/tmp/x.json",
            ".hidden.json",
            "tasks.txt",
            "",
        ];
        for bad in bad_names {
            let err = set_config_value(&mut doc, "store.file", bad).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "store.file"),
                "accepted {:?}",
                bad
            );
        }
        assert_eq!(doc.to_string(), before);

        set_config_value(&mut doc, "store.file", "home-tasks.json").unwrap();
        assert_eq!(
            get_config_value(&doc, "store.file").unwrap(),
            Some("home-tasks.json".to_string())
        );
    }

    #[test]
    fn test_hand_edited_store_file_is_rejected_on_read() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "[store]\nfile = \"../elsewhere.json\"\n",
        )
        .unwrap();
        assert!(matches!(
            read_config(tmp.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_set_value_under_non_table_section() {
        let mut doc: toml_edit::DocumentMut = "store = \"x\"\n".parse().unwrap();
        let err = set_config_value(&mut doc, "store.file", "tasks.json").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(doc.to_string(), "store = \"x\"\n");
    }

    #[test]
    fn test_default_config_file() {
        let tmp = TempDir::new().unwrap();
        write_default_config(tmp.path(), &AppConfig::default()).unwrap();
        let (config, doc) = read_config(tmp.path()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(doc.to_string().contains("# tracing filter directive"));
    }
}

//! Configuration file loading.
//!
//! Each loader reads one file and produces a [`MapSource`] whose keys are
//! the document's entries flattened to dotted form (`server.port`,
//! `hosts[0]`). Parsing itself is delegated to `serde_yaml` and
//! `serde_json`; env files use plain `KEY=VALUE` lines.

use std::fs;
use std::path::{Path, PathBuf};

use super::MapSource;
use crate::error::{Error, Result};
use crate::value::Value;

/// Name given to a source loaded from `path`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use propchain::source::file::source_name;
///
/// assert_eq!(source_name(Path::new("conf/app.yaml")), "file [conf/app.yaml]");
/// ```
#[must_use]
pub fn source_name(path: &Path) -> String {
    format!("file [{}]", path.display())
}

/// Load a file, choosing the format from its extension.
///
/// Recognized extensions: `yaml`, `yml`, `json`, `env`. Dotfiles named
/// `.env` or `.env.<suffix>` (`.env.local`) are env files too. A leading
/// `~/` is expanded to the home directory.
///
/// # Errors
///
/// Returns [`Error::FileLoad`] for unknown extensions or unreadable files,
/// and the parser's error for malformed documents.
pub fn load_file(path: &Path) -> Result<MapSource> {
    let path = expand_home(path);
    if is_dotenv(&path) {
        return load_env_file(&path);
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml" | "yml") => load_yaml(&path),
        Some("json") => load_json(&path),
        Some("env") => load_env_file(&path),
        _ => Err(Error::FileLoad {
            path,
            reason: "unsupported file extension (expected yaml, yml, json or env)".into(),
        }),
    }
}

/// Load and flatten a YAML document.
///
/// An empty document yields an empty source.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the YAML is invalid, or the
/// top level is not a mapping.
pub fn load_yaml(path: &Path) -> Result<MapSource> {
    let contents = read(path)?;
    let document: serde_yaml::Value = serde_yaml::from_str(&contents)?;
    if document.is_null() {
        return Ok(MapSource::new(source_name(path)));
    }
    from_document(path, Value::from(document))
}

/// Load and flatten a JSON document.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the JSON is invalid, or the
/// top level is not an object.
pub fn load_json(path: &Path) -> Result<MapSource> {
    let contents = read(path)?;
    let document: serde_json::Value = serde_json::from_str(&contents)?;
    from_document(path, Value::from(document))
}

/// Load an env file of `KEY=VALUE` lines.
///
/// Blank lines and lines starting with `#` are skipped, an optional
/// `export ` prefix is ignored, and values wrapped in matching single or
/// double quotes are unquoted.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line has no `=`.
pub fn load_env_file(path: &Path) -> Result<MapSource> {
    let contents = read(path)?;
    let mut source = MapSource::new(source_name(path));

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::FileLoad {
                path: path.to_path_buf(),
                reason: format!("line {}: expected KEY=VALUE", idx + 1),
            });
        };
        source.insert(key.trim(), unquote(value.trim()));
    }

    log::debug!("loaded {} entries from {}", source.len(), path.display());
    Ok(source)
}

fn is_dotenv(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == ".env" || name.starts_with(".env."))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn from_document(path: &Path, document: Value) -> Result<MapSource> {
    if !matches!(document, Value::Map(_)) {
        return Err(Error::FileLoad {
            path: path.to_path_buf(),
            reason: format!("top level must be a mapping, found {}", document.kind()),
        });
    }
    let source = MapSource::from_map(source_name(path), document.flatten());
    log::debug!("loaded {} entries from {}", source.len(), path.display());
    Ok(source)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::FileLoad {
        path: path.to_path_buf(),
        reason: format!("failed to read file: {e}"),
    })
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PropertySource;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_yaml_flattens() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.yaml", "server:\n  port: 8080\n  host: \"#{HOST:localhost}\"\n");

        let source = load_file(&path).unwrap();
        assert_eq!(source.name(), source_name(&path));
        assert_eq!(source.get_property("server.port"), Some(Value::Integer(8080)));
        assert_eq!(
            source.get_property("server.host"),
            Some(Value::from("#{HOST:localhost}"))
        );
    }

    #[test]
    fn test_load_empty_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.yml", "");
        assert!(load_file(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_yaml_rejects_scalar_document() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "scalar.yaml", "just text\n");
        assert!(matches!(load_file(&path), Err(Error::FileLoad { .. })));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.yaml", "invalid: yaml: syntax:");
        assert!(matches!(load_file(&path), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", r#"{"db": {"pool": 4, "urls": ["a", "b"]}}"#);

        let source = load_file(&path).unwrap();
        assert_eq!(source.get_property("db.pool"), Some(Value::Integer(4)));
        assert_eq!(source.get_property("db.urls[1]"), Some(Value::from("b")));
    }

    #[test]
    fn test_load_env_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "local.env",
            "# comment\n\nexport DB_USER=admin\nDB_PASS=\"s3cret\"\nEMPTY=\n",
        );

        let source = load_file(&path).unwrap();
        assert_eq!(source.get_property("DB_USER"), Some(Value::from("admin")));
        assert_eq!(source.get_property("DB_PASS"), Some(Value::from("s3cret")));
        assert_eq!(source.get_property("EMPTY"), Some(Value::from("")));
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn test_load_dotenv_names() {
        let dir = TempDir::new().unwrap();

        let path = write(&dir, ".env", "A=1\n");
        let source = load_file(&path).unwrap();
        assert_eq!(source.get_property("A"), Some(Value::from("1")));
        assert_eq!(source.name(), source_name(&path));

        let path = write(&dir, ".env.local", "B=2\n");
        assert_eq!(load_file(&path).unwrap().get_property("B"), Some(Value::from("2")));

        let err = load_file(Path::new(".envrc")).unwrap_err();
        assert!(format!("{err}").contains("unsupported file extension"));
    }

    #[test]
    fn test_env_file_line_without_equals() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.env", "A=1\nnot an assignment\n");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err}").contains("line 2"));
    }

    #[test]
    fn test_unknown_extension() {
        let err = load_file(Path::new("settings.toml")).unwrap_err();
        assert!(matches!(err, Error::FileLoad { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_file(Path::new("/nonexistent/path/config.yaml")).unwrap_err();
        assert!(format!("{err}").contains("failed to read file"));
    }
}

//! Environment Configuration Loader
//!
//! Loads environment variables from `/etc/powerlink/environment` (or a
//! local `.env` during development) so the host shim picks up the API key
//! and endpoint without exporting them by hand.
//!
//! ## Usage
//!
//! ```rust
//! use pl_core::config::{get_config, load_environment};
//!
//! load_environment();
//! let api_key = get_config("POWERLINK_API_KEY", "");
//! ```

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default path for the environment file
pub const DEFAULT_ENV_FILE: &str = "/etc/powerlink/environment";

/// Variable naming a custom environment file
pub const ENV_FILE_VAR: &str = "PL_ENV_FILE";

/// Alternative paths to check (in order of priority)
pub const ENV_FILE_PATHS: &[&str] = &[DEFAULT_ENV_FILE, ".env"];

/// Load environment variables from the first configuration file found.
///
/// `PL_ENV_FILE` wins over the default locations. Variables that are
/// already set are never overridden.
///
/// Returns the path that was loaded, or None if no file was found.
pub fn load_environment() -> Option<String> {
    if let Ok(custom_path) = std::env::var(ENV_FILE_VAR) {
        if let Some(path) = try_load_env_file(&custom_path) {
            return Some(path);
        }
    }

    for path in ENV_FILE_PATHS {
        if let Some(loaded_path) = try_load_env_file(path) {
            return Some(loaded_path);
        }
    }

    debug!("No environment file found, using existing environment");
    None
}

/// Try to load an environment file from the given path.
pub fn try_load_env_file(path: &str) -> Option<String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return None;
    }

    match fs::read_to_string(path_obj) {
        Ok(content) => {
            let mut loaded_count = 0;
            let mut skipped_count = 0;

            for line in content.lines() {
                let line = line.trim();

                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                if let Some((key, value)) = parse_env_line(line) {
                    if std::env::var(&key).is_err() {
                        std::env::set_var(&key, &value);
                        loaded_count += 1;
                        debug!("Loaded: {}={}", key, mask_secret(&key, &value));
                    } else {
                        skipped_count += 1;
                        debug!("Skipped (already set): {}", key);
                    }
                }
            }

            info!(
                "Loaded {} environment variables from {} ({} skipped - already set)",
                loaded_count, path, skipped_count
            );

            Some(path.to_string())
        }
        Err(e) => {
            warn!("Failed to read environment file {}: {}", path, e);
            None
        }
    }
}

fn mask_secret<'a>(key: &str, value: &'a str) -> &'a str {
    if key.contains("KEY") || key.contains("TOKEN") || key.contains("SECRET") {
        "***"
    } else {
        value
    }
}

/// Parse a single environment line into key-value pair.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    // KEY=VALUE, KEY="VALUE", KEY='VALUE'
    let mut parts = line.splitn(2, '=');
    let key = parts.next()?.trim();
    let value = parts.next()?.trim();

    if key.is_empty() {
        return None;
    }

    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    Some((key.to_string(), value.to_string()))
}

/// Get a configuration value with a default.
pub fn get_config(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_env_line_simple() {
        let (k, v) = parse_env_line("POWERLINK_API_KEY=abc").unwrap();
        assert_eq!(k, "POWERLINK_API_KEY");
        assert_eq!(v, "abc");
    }

    #[test]
    fn test_parse_env_line_quoted() {
        let (k, v) = parse_env_line("FOO=\"bar baz\"").unwrap();
        assert_eq!(k, "FOO");
        assert_eq!(v, "bar baz");

        let (_, v) = parse_env_line("FOO='bar'").unwrap();
        assert_eq!(v, "bar");
    }

    #[test]
    fn test_parse_env_line_keeps_equals_in_value() {
        let (k, v) = parse_env_line("POWERLINK_BASE_URL=http://h/api?a=b").unwrap();
        assert_eq!(k, "POWERLINK_BASE_URL");
        assert_eq!(v, "http://h/api?a=b");
    }

    #[test]
    fn test_parse_env_line_empty() {
        assert!(parse_env_line("").is_none());
        assert!(parse_env_line("=value").is_none());
        assert!(parse_env_line("NO_EQUALS").is_none());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("POWERLINK_API_KEY", "abc"), "***");
        assert_eq!(mask_secret("POWERLINK_BASE_URL", "http://x"), "http://x");
    }

    #[test]
    fn test_load_env_file_does_not_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "PL_CORE_TEST_LOADED=from_file").unwrap();
        writeln!(file, "PL_CORE_TEST_PRESET=from_file").unwrap();
        std::env::set_var("PL_CORE_TEST_PRESET", "preset");

        let path = file.path().to_str().unwrap().to_string();
        assert_eq!(try_load_env_file(&path), Some(path.clone()));

        assert_eq!(get_config("PL_CORE_TEST_LOADED", ""), "from_file");
        assert_eq!(get_config("PL_CORE_TEST_PRESET", ""), "preset");
    }

    #[test]
    fn test_missing_env_file() {
        assert!(try_load_env_file("/nonexistent/powerlink/environment").is_none());
    }
}

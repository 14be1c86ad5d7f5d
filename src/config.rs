//! Configuration management for the e2e harness
//!
//! Settings are a flat key/value map loaded from a properties or TOML file,
//! overlaid by `E2E_*` environment variables. [`HarnessConfig`] is the typed,
//! immutable view resolved once per run.

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides (`E2E_IMPLICIT_WAIT` -> `implicit.wait`)
pub const ENV_PREFIX: &str = "E2E_";

pub const DEFAULT_BROWSER: &str = "chrome";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_EVIDENCE_DIR: &str = "test-results/screenshots";
pub const DEFAULT_IMPLICIT_WAIT_SECS: u64 = 10;
pub const DEFAULT_EXPLICIT_WAIT_SECS: u64 = 20;
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LAUNCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_WINDOW_WIDTH: u32 = 1920;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 1080;

/// Raw key/value settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` lines. `key: value` is accepted too; `#` and `!` start comments.
    pub fn from_properties(text: &str) -> Self {
        let mut values = HashMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (key, value) = match line.find(['=', ':']) {
                Some(idx) => (&line[..idx], &line[idx + 1..]),
                None => (line, ""),
            };

            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            values.insert(key.to_string(), value.trim().to_string());
        }

        Self { values }
    }

    /// Parse a TOML document, flattening nested tables into dotted keys
    pub fn from_toml(text: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(text)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        let mut values = HashMap::new();
        flatten_toml("", &table, &mut values);
        Ok(Self { values })
    }

    /// Load settings from a file; `.toml` files are parsed as TOML, anything else as properties
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Ok(Self::from_properties(&content)),
        }
    }

    /// Overlay `E2E_*` variables from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(std::env::vars())
    }

    /// Overlay `E2E_*` variables from an arbitrary source
    pub fn with_overrides_from<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            if let Some(suffix) = name.strip_prefix(ENV_PREFIX) {
                if suffix.is_empty() {
                    continue;
                }
                let key = suffix.to_lowercase().replace('_', ".");
                self.values.insert(key, value);
            }
        }
        self
    }

    /// Set a value, replacing any previous one
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Whether a key is present (with any value, including empty)
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value of a key that must be present
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::configuration_missing(format!("required key `{}`", key)))
    }

    /// String value, defaulted only when the key is absent
    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Boolean value, defaulted only when the key is absent
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(invalid(key, raw, "a boolean")),
            },
        }
    }

    /// Unsigned integer value, defaulted only when the key is absent
    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| invalid(key, raw, "an unsigned integer")),
        }
    }

    /// Duration in seconds (decimals allowed), defaulted only when the key is absent
    pub fn seconds_or(&self, key: &str, default: Duration) -> Result<Duration> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => {
                let secs: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| invalid(key, raw, "a number of seconds"))?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(invalid(key, raw, "a non-negative number of seconds"));
                }
                Ok(Duration::from_secs_f64(secs))
            }
        }
    }

    /// Optional string value; an empty value counts as present
    pub fn optional(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

fn invalid(key: &str, raw: &str, expected: &str) -> Error {
    Error::configuration(format!(
        "`{}` must be {}, got {:?}",
        key, expected, raw
    ))
}

fn flatten_toml(prefix: &str, table: &toml::Table, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            toml::Value::Table(nested) => flatten_toml(&full_key, nested, out),
            toml::Value::String(s) => {
                out.insert(full_key, s.clone());
            }
            toml::Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|item| match item {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                out.insert(full_key, joined);
            }
            other => {
                out.insert(full_key, other.to_string());
            }
        }
    }
}

/// Read an out-of-band secret from the process environment.
///
/// Absent or empty values are a hard precondition failure.
pub fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::configuration_missing(format!(
            "environment variable `{}` must be set",
            name
        ))),
    }
}

/// Typed harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Browser identifier ("chrome", "edge", ...)
    pub browser: String,

    /// Run without a visible window
    pub headless: bool,

    /// Wait applied to every element lookup
    pub implicit_wait: Duration,

    /// Bound for condition-specific waits in the interaction layer
    pub explicit_wait: Duration,

    /// Bound for a navigation to reach `document.readyState == "complete"`
    pub page_load_timeout: Duration,

    /// Application under test
    pub base_url: String,

    /// Attach to an already running browser instead of launching one
    pub cdp_endpoint: Option<String>,

    /// Browser executable override
    pub chrome_path: Option<String>,

    /// Where failure evidence is written
    pub evidence_dir: PathBuf,

    pub window_width: u32,
    pub window_height: u32,

    /// Interval between polls of a waited condition
    pub poll_interval: Duration,

    /// Bound for a launched browser to expose its DevTools port
    pub launch_timeout: Duration,

    /// Bound for one test body
    pub test_timeout: Duration,

    /// Raw settings, for keys the harness does not interpret itself
    pub settings: Settings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            browser: DEFAULT_BROWSER.to_string(),
            headless: false,
            implicit_wait: Duration::from_secs(DEFAULT_IMPLICIT_WAIT_SECS),
            explicit_wait: Duration::from_secs(DEFAULT_EXPLICIT_WAIT_SECS),
            page_load_timeout: Duration::from_secs(DEFAULT_PAGE_LOAD_TIMEOUT_SECS),
            base_url: DEFAULT_BASE_URL.to_string(),
            cdp_endpoint: None,
            chrome_path: None,
            evidence_dir: PathBuf::from(DEFAULT_EVIDENCE_DIR),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            launch_timeout: Duration::from_secs(DEFAULT_LAUNCH_TIMEOUT_SECS),
            test_timeout: Duration::from_secs(DEFAULT_TEST_TIMEOUT_SECS),
            settings: Settings::default(),
        }
    }
}

impl HarnessConfig {
    /// Resolve typed configuration from raw settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let window_width = settings.u64_or("window.width", DEFAULT_WINDOW_WIDTH as u64)?;
        let window_height = settings.u64_or("window.height", DEFAULT_WINDOW_HEIGHT as u64)?;

        let config = Self {
            browser: settings.string_or("browser", DEFAULT_BROWSER),
            headless: settings.bool_or("headless", false)?,
            implicit_wait: settings.seconds_or(
                "implicit.wait",
                Duration::from_secs(DEFAULT_IMPLICIT_WAIT_SECS),
            )?,
            explicit_wait: settings.seconds_or(
                "explicit.wait",
                Duration::from_secs(DEFAULT_EXPLICIT_WAIT_SECS),
            )?,
            page_load_timeout: settings.seconds_or(
                "page.load.timeout",
                Duration::from_secs(DEFAULT_PAGE_LOAD_TIMEOUT_SECS),
            )?,
            base_url: settings.string_or("base.url", DEFAULT_BASE_URL),
            cdp_endpoint: settings.optional("cdp.endpoint"),
            chrome_path: settings.optional("chrome.path"),
            evidence_dir: PathBuf::from(settings.string_or("evidence.dir", DEFAULT_EVIDENCE_DIR)),
            window_width: u32::try_from(window_width)
                .map_err(|_| Error::configuration("`window.width` is out of range"))?,
            window_height: u32::try_from(window_height)
                .map_err(|_| Error::configuration("`window.height` is out of range"))?,
            poll_interval: Duration::from_millis(
                settings.u64_or("poll.interval.ms", DEFAULT_POLL_INTERVAL_MS)?,
            ),
            launch_timeout: settings.seconds_or(
                "browser.launch.timeout",
                Duration::from_secs(DEFAULT_LAUNCH_TIMEOUT_SECS),
            )?,
            test_timeout: settings.seconds_or(
                "test.timeout",
                Duration::from_secs(DEFAULT_TEST_TIMEOUT_SECS),
            )?,
            settings: settings.clone(),
        };

        if config.poll_interval.is_zero() {
            return Err(Error::configuration("`poll.interval.ms` must be greater than zero"));
        }

        Ok(config)
    }

    /// Absolute URL for a path on the application under test
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() || path == "/" {
            format!("{}/", base)
        } else if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_parsing() {
        let settings = Settings::from_properties(
            "# comment\n\
             ! another comment\n\
             browser = firefox\n\
             headless:true\n\
             base.url=https://app.example.com/path?a=b\n\
             \n\
             lonely.key\n",
        );

        assert_eq!(settings.get("browser"), Some("firefox"));
        assert_eq!(settings.get("headless"), Some("true"));
        assert_eq!(settings.get("base.url"), Some("https://app.example.com/path?a=b"));
        assert_eq!(settings.get("lonely.key"), Some(""));
        assert_eq!(settings.get("missing"), None);
    }

    #[test]
    fn test_defaults_when_absent() {
        let config = HarnessConfig::from_settings(&Settings::new()).unwrap();

        assert_eq!(config.browser, "chrome");
        assert!(!config.headless);
        assert_eq!(config.implicit_wait, Duration::from_secs(10));
        assert_eq!(config.explicit_wait, Duration::from_secs(20));
        assert_eq!(config.page_load_timeout, Duration::from_secs(30));
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.evidence_dir, PathBuf::from("test-results/screenshots"));
        assert!(config.cdp_endpoint.is_none());
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let settings = Settings::from_properties(
            "browser=edge\nheadless=true\nimplicit.wait=2\n\
             explicit.wait=0.5\npage.load.timeout=45\n",
        );
        let config = HarnessConfig::from_settings(&settings).unwrap();

        assert_eq!(config.browser, "edge");
        assert!(config.headless);
        assert_eq!(config.implicit_wait, Duration::from_secs(2));
        assert_eq!(config.explicit_wait, Duration::from_millis(500));
        assert_eq!(config.page_load_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_empty_string_overrides_default() {
        let settings = Settings::from_properties("browser=\nbase.url=\n");
        let config = HarnessConfig::from_settings(&settings).unwrap();

        assert_eq!(config.browser, "");
        assert_eq!(config.base_url, "");
    }

    #[test]
    fn test_empty_numeric_value_is_rejected_not_defaulted() {
        let settings = Settings::from_properties("implicit.wait=\n");
        let err = HarnessConfig::from_settings(&settings).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_invalid_values() {
        let settings = Settings::from_properties("headless=sometimes\n");
        assert!(matches!(
            HarnessConfig::from_settings(&settings),
            Err(Error::Configuration(_))
        ));

        let settings = Settings::from_properties("explicit.wait=-1\n");
        assert!(matches!(
            HarnessConfig::from_settings(&settings),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_require_missing_key() {
        let settings = Settings::new();
        let err = settings.require("invite.token").unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::from_properties("browser=chrome\nimplicit.wait=10\n")
            .with_overrides_from(vec![
                ("E2E_IMPLICIT_WAIT".to_string(), "3".to_string()),
                ("E2E_PAGE_LOAD_TIMEOUT".to_string(), "12".to_string()),
                ("E2E_".to_string(), "ignored".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ]);

        assert_eq!(settings.get("browser"), Some("chrome"));
        assert_eq!(settings.get("implicit.wait"), Some("3"));
        assert_eq!(settings.get("page.load.timeout"), Some("12"));
        assert!(!settings.contains("path"));
    }

    #[test]
    fn test_toml_flattening() {
        let settings = Settings::from_toml(
            r#"
browser = "chrome"
headless = true

[implicit]
wait = 4

[base]
url = "https://www.example.com"
"#,
        )
        .unwrap();

        assert_eq!(settings.get("browser"), Some("chrome"));
        assert_eq!(settings.get("headless"), Some("true"));
        assert_eq!(settings.get("implicit.wait"), Some("4"));
        assert_eq!(settings.get("base.url"), Some("https://www.example.com"));
    }

    #[test]
    fn test_url_joining() {
        let config = HarnessConfig {
            base_url: "https://www.example.com/".to_string(),
            ..Default::default()
        };

        assert_eq!(config.url("/pricing"), "https://www.example.com/pricing");
        assert_eq!(config.url("pricing"), "https://www.example.com/pricing");
        assert_eq!(config.url("/"), "https://www.example.com/");
    }

    #[test]
    fn test_require_env_missing() {
        let err = require_env("OXIDE_E2E_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let props = dir.path().join("e2e.properties");
        let toml_file = dir.path().join("e2e.toml");
        std::fs::write(&props, "explicit.wait=5\nbase.url=https://staging.example.com\n").unwrap();
        std::fs::write(&toml_file, "[explicit]\nwait = 7\n").unwrap();

        let from_props =
            HarnessConfig::from_settings(&Settings::from_file(&props).unwrap()).unwrap();
        assert_eq!(from_props.explicit_wait, Duration::from_secs(5));
        assert_eq!(from_props.base_url, "https://staging.example.com");

        let from_toml =
            HarnessConfig::from_settings(&Settings::from_file(&toml_file).unwrap()).unwrap();
        assert_eq!(from_toml.explicit_wait, Duration::from_secs(7));

        let missing = Settings::from_file(dir.path().join("absent.properties")).unwrap_err();
        assert!(matches!(missing, Error::Configuration(_)));
    }
}

//! Configuration: built-in defaults, optionally replaced by a JSON
//! settings file, then overridden by environment variables. The demo
//! binary applies its command line options last.

use std::env::VarError;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Name of the template the inclusion tag renders, unless configured
/// otherwise.
pub const DEFAULT_BREADCRUMBS_TEMPLATE: &str = "breadcrumbs.html";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("can't read settings file {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid settings file {path:?}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("{0:?} env var is not unicode")]
    NotUnicode(String),
    #[error("{0:?} env var is missing and no default provided")]
    Missing(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// The template rendered by `render_breadcrumbs`.
    pub breadcrumbs_template: String,
    /// Directory with Tera templates (`**/*.html`). Only the
    /// built-in templates are available when unset.
    pub template_dir: Option<PathBuf>,
    pub listen_http: String,
    /// Where to write `access.log` and `error.log`; stderr when unset.
    pub log_dir: Option<PathBuf>,
    /// Label of the first entry of path derived trails.
    pub home_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            breadcrumbs_template: DEFAULT_BREADCRUMBS_TEMPLATE.into(),
            template_dir: None,
            listen_http: "127.0.0.1:3000".into(),
            log_dir: None,
            home_label: "Home".into(),
        }
    }
}

/// Get an env var as a String; `None` if not set.
pub fn getenv(name: &str) -> Result<Option<String>, SettingsError> {
    match std::env::var(name) {
        Ok(s) => Ok(Some(s)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(SettingsError::NotUnicode(name.into())),
    }
}

/// Get an env var as a String, `fallbackvalue` if not set.
pub fn getenv_or(name: &str, fallbackvalue: Option<&str>) -> Result<String, SettingsError> {
    match getenv(name)? {
        Some(s) => Ok(s),
        None => fallbackvalue.map(String::from).ok_or_else(
            || SettingsError::Missing(name.into())),
    }
}

impl Settings {
    /// Defaults or the given file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        settings.apply_vars(getenv)?;
        Ok(settings)
    }

    /// Fields missing from the file keep their default values.
    pub fn from_json_file(path: &Path) -> Result<Self, SettingsError> {
        let s = fs::read_to_string(path).map_err(
            |source| SettingsError::Read { path: path.into(), source })?;
        serde_json::from_str(&s).map_err(
            |source| SettingsError::Parse { path: path.into(), source })
    }

    /// Override fields from variables: `BREADCRUMBS_TEMPLATE`,
    /// `TEMPLATE_DIR`, `LISTEN_HTTP`, `LOG_DIR`,
    /// `BREADCRUMBS_HOME_LABEL`.
    pub fn apply_vars<F>(&mut self, get: F) -> Result<(), SettingsError>
    where F: Fn(&str) -> Result<Option<String>, SettingsError>
    {
        if let Some(v) = get("BREADCRUMBS_TEMPLATE")? {
            self.breadcrumbs_template = v;
        }
        if let Some(v) = get("TEMPLATE_DIR")? {
            self.template_dir = Some(v.into());
        }
        if let Some(v) = get("LISTEN_HTTP")? {
            self.listen_http = v;
        }
        if let Some(v) = get("LOG_DIR")? {
            self.log_dir = Some(v.into());
        }
        if let Some(v) = get("BREADCRUMBS_HOME_LABEL")? {
            self.home_label = v;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn t_defaults() {
        let s = Settings::default();
        assert_eq!(s.breadcrumbs_template, "breadcrumbs.html");
        assert_eq!(s.template_dir, None);
        assert_eq!(s.home_label, "Home");
    }

    #[test]
    fn t_json_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"breadcrumbs_template": "nav/crumbs.html",
                      "log_dir": "/var/log/site"}}"#).unwrap();
        let s = Settings::from_json_file(f.path()).unwrap();
        assert_eq!(s.breadcrumbs_template, "nav/crumbs.html");
        assert_eq!(s.log_dir, Some(PathBuf::from("/var/log/site")));
        // untouched
        assert_eq!(s.listen_http, "127.0.0.1:3000");
    }

    #[test]
    fn t_json_file_errors() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"breadcrumb_template": "typo.html"}}"#).unwrap();
        assert!(matches!(Settings::from_json_file(f.path()),
                         Err(SettingsError::Parse { .. })));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Settings::from_json_file(&dir.path().join("missing.json")),
                         Err(SettingsError::Read { .. })));
    }

    #[test]
    fn t_apply_vars() {
        let mut s = Settings::default();
        s.apply_vars(|name| Ok(match name {
            "BREADCRUMBS_TEMPLATE" => Some("crumbs.html".into()),
            "BREADCRUMBS_HOME_LABEL" => Some("Start".into()),
            _ => None,
        })).unwrap();
        assert_eq!(s.breadcrumbs_template, "crumbs.html");
        assert_eq!(s.home_label, "Start");
        assert_eq!(s.listen_http, "127.0.0.1:3000");

        let r = s.apply_vars(|name| Err(SettingsError::NotUnicode(name.into())));
        assert!(matches!(r, Err(SettingsError::NotUnicode(n)) if n == "BREADCRUMBS_TEMPLATE"));
    }

    #[test]
    fn t_getenv_or() {
        const UNSET: &str = "FLEXIBLE_BREADCRUMBS_TEST_SURELY_UNSET_VAR";
        assert_eq!(getenv(UNSET).unwrap(), None);
        assert_eq!(getenv_or(UNSET, Some("fallback")).unwrap(), "fallback");
        assert!(matches!(getenv_or(UNSET, None),
                         Err(SettingsError::Missing(n)) if n == UNSET));
        // PATH is set in any test environment
        assert_eq!(getenv_or("PATH", Some("fallback")).unwrap(),
                   std::env::var("PATH").unwrap());
    }
}

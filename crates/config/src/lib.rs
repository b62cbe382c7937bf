//! Layered configuration for font2base64.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. the user configuration file ([`user_config_file`]), if present,
//! 3. an explicitly requested file (TOML, or YAML/JSON by extension),
//! 4. environment variables prefixed with [`ENV_PREFIX`], e.g.
//!    `F2B_RESAVE=false` or `F2B_FONT_TYPES='[".woff2"]'`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use f2b_inject::Options;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "F2B_";
/// File name of the user configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Serializable mirror of [`Options`], minus the validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font file extensions to scan for, with leading dot.
    pub font_types: Vec<String>,
    /// Stylesheet file extensions to scan for, with leading dot.
    pub css_types: Vec<String>,
    pub resave: bool,
    pub fullpath_match: bool,
    pub root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let options = Options::default();
        Self {
            font_types: options.font_types,
            css_types: options.css_types,
            resave: options.resave,
            fullpath_match: false,
            root: options.root,
        }
    }
}

/// Location of the per-user configuration file, e.g.
/// `~/.config/font2base64/config.toml` on Linux.
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "font2base64").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(OsStr::to_str) {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => figment.merge(Toml::file_exact(path)),
    }
}

fn layered(user_file: Option<&Path>, explicit: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = user_file {
        figment = merge_file(figment, path);
    }
    if let Some(path) = explicit {
        figment = merge_file(figment, path);
    }
    figment.merge(Env::prefixed(ENV_PREFIX))
}

impl Config {
    /// Loads and validates the layered configuration. `explicit` must exist
    /// when given; a missing user configuration file is ignored.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(user_config_file().as_deref(), explicit)
    }

    fn load_from(user_file: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit
            && !path.is_file()
        {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let config: Self = layered(user_file, explicit).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Every configured extension must be a leading dot followed by at least
    /// one character.
    pub fn validate(&self) -> Result<()> {
        for extension in self.font_types.iter().chain(&self.css_types) {
            if extension.len() < 2 || !extension.starts_with('.') {
                exn::bail!(ErrorKind::InvalidExtension(extension.clone()));
            }
        }
        Ok(())
    }

    pub fn into_options(self) -> Options {
        let options = Options::default()
            .with_font_types(self.font_types)
            .with_css_types(self.css_types)
            .with_resave(self.resave)
            .with_fullpath_match(self.fullpath_match);
        match self.root {
            Some(root) => options.with_root(root),
            None => options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use f2b_inject::MatchMode;
    use rstest::rstest;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_from(None, None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.css_types, vec![".css", ".scss", ".less"]);
        assert_eq!(config.font_types.len(), 7);
        assert!(config.resave);
        assert!(!config.fullpath_match);
    }

    #[test]
    fn test_explicit_file_overrides_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let user = write(&dir, "user.toml", "resave = false\ncss_types = [\".css\"]\n");
        let explicit = write(&dir, "project.toml", "resave = true\nfullpath_match = true\nroot = \"public/css\"\n");

        let config = Config::load_from(Some(&user), Some(&explicit)).unwrap();
        assert!(config.resave);
        assert!(config.fullpath_match);
        assert_eq!(config.css_types, vec![".css"]);
        assert_eq!(config.root, Some(PathBuf::from("public/css")));
    }

    #[test]
    fn test_missing_user_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(Some(&dir.path().join("absent.toml")), None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[rstest]
    #[case("f2b.yaml", "font_types: [\".woff2\", \".woff\"]\n")]
    #[case("f2b.json", "{\"font_types\": [\".woff2\", \".woff\"]}")]
    #[case("f2b.toml", "font_types = [\".woff2\", \".woff\"]\n")]
    fn test_formats_by_extension(#[case] name: &str, #[case] content: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, name, content);
        let config = Config::load_from(None, Some(&path)).unwrap();
        assert_eq!(config.font_types, vec![".woff2", ".woff"]);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load_from(None, Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(PathBuf::from("/definitely/not/here.toml")));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bad.toml", "resave = \"sometimes\"\n");
        let err = Config::load_from(None, Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::Load);
    }

    #[rstest]
    #[case("woff")]
    #[case(".")]
    #[case("")]
    fn test_invalid_extension(#[case] extension: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "f2b.toml", &format!("css_types = [\".css\", {extension:?}]\n"));
        let err = Config::load_from(None, Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidExtension(extension.to_string()));
    }

    #[test]
    fn test_into_options() {
        let config = Config {
            font_types: vec![".woff2".to_string()],
            css_types: vec![".scss".to_string()],
            resave: false,
            fullpath_match: true,
            root: Some(PathBuf::from("site")),
        };
        let options = config.into_options();
        assert_eq!(options.font_types, vec![".woff2"]);
        assert_eq!(options.css_types, vec![".scss"]);
        assert!(!options.resave);
        assert_eq!(options.match_mode, MatchMode::FullPath);
        assert_eq!(options.root, Some(PathBuf::from("site")));
    }
}

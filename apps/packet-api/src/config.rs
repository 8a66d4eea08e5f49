//! Forms configuration: which templates are served and with which profile.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use packet_forms::FormProfile;
use serde::Deserialize;

pub const DEFAULT_FORM: &str = "employee-handbook";

#[derive(Debug, Clone, Deserialize)]
pub struct FormsConfig {
    #[serde(default, rename = "form")]
    pub forms: Vec<FormConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormConfig {
    pub name: String,
    pub template: PathBuf,
    /// Path to a TOML or JSON profile file.
    #[serde(default)]
    pub profile: Option<PathBuf>,
    /// Name of a profile compiled into packet-forms.
    #[serde(default)]
    pub builtin_profile: Option<String>,
}

impl FormsConfig {
    /// Relative profile paths are resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read forms config {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid forms config {}", path.display()))?;
        if config.forms.is_empty() {
            bail!("forms config {} lists no forms", path.display());
        }

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for form in &mut config.forms {
            if let Some(profile) = form.profile.as_mut().filter(|p| p.is_relative()) {
                *profile = base.join(&*profile);
            }
        }
        Ok(config)
    }

    /// The employee handbook alone, with its template in `template_dir`.
    pub fn handbook_only() -> Self {
        Self {
            forms: vec![FormConfig {
                name: DEFAULT_FORM.to_string(),
                template: PathBuf::from("employee_handbook.pdf"),
                profile: None,
                builtin_profile: Some(DEFAULT_FORM.to_string()),
            }],
        }
    }
}

impl FormConfig {
    pub fn template_path(&self, template_dir: &Path) -> PathBuf {
        if self.template.is_absolute() {
            self.template.clone()
        } else {
            template_dir.join(&self.template)
        }
    }

    pub fn load_profile(&self) -> Result<FormProfile> {
        match (&self.profile, self.builtin_profile.as_deref()) {
            (Some(path), _) => FormProfile::from_file(path)
                .with_context(|| format!("form '{}': bad profile", self.name)),
            (None, Some(DEFAULT_FORM)) => Ok(FormProfile::employee_handbook()?),
            (None, Some(other)) => bail!("form '{}': unknown built-in profile '{other}'", self.name),
            (None, None) => bail!("form '{}' names no profile", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_tables() {
        let config: FormsConfig = toml::from_str(
            r#"
            [[form]]
            name = "employee-handbook"
            template = "handbook.pdf"
            builtin_profile = "employee-handbook"

            [[form]]
            name = "w4"
            template = "/srv/forms/w4.pdf"
            profile = "profiles/w4.toml"
            "#,
        )
        .unwrap();

        assert_eq!(config.forms.len(), 2);
        let dir = Path::new("/templates");
        assert_eq!(
            config.forms[0].template_path(dir),
            PathBuf::from("/templates/handbook.pdf")
        );
        assert_eq!(config.forms[1].template_path(dir), PathBuf::from("/srv/forms/w4.pdf"));
    }

    #[test]
    fn relative_profile_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("profiles")).unwrap();
        std::fs::write(
            dir.path().join("profiles/handbook.toml"),
            include_str!("../../../crates/packet-forms/profiles/employee_handbook.toml"),
        )
        .unwrap();
        let config_path = dir.path().join("forms.toml");
        std::fs::write(
            &config_path,
            r#"
            [[form]]
            name = "handbook"
            template = "handbook.pdf"
            profile = "profiles/handbook.toml"
            "#,
        )
        .unwrap();

        let config = FormsConfig::load(&config_path).unwrap();
        assert_eq!(
            config.forms[0].profile.as_deref(),
            Some(dir.path().join("profiles/handbook.toml").as_path())
        );
        let profile = config.forms[0].load_profile().unwrap();
        assert_eq!(profile.name, DEFAULT_FORM);
    }

    #[test]
    fn builtin_profile_resolves() {
        let profile = FormsConfig::handbook_only().forms[0].load_profile().unwrap();
        assert_eq!(profile.name, DEFAULT_FORM);
    }

    #[test]
    fn unknown_builtin_is_rejected() {
        let form = FormConfig {
            name: "i9".into(),
            template: "i9.pdf".into(),
            profile: None,
            builtin_profile: Some("i9".into()),
        };
        assert!(form.load_profile().is_err());
    }
}

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::config::{
    ConfigError, GEMINI_API_KEY_ENV, GITHUB_TOKEN_ENV, RepolensConfig, load_config,
    resolve_config_path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Warn => write!(f, "WARN"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: String,
    pub state: CheckState,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.count(CheckState::Fail) > 0
    }

    pub fn summary(&self) -> String {
        let passed = self.count(CheckState::Pass);
        let warned = self.count(CheckState::Warn);
        let failed = self.count(CheckState::Fail);
        if warned == 0 {
            format!("{passed} passed, {failed} failed")
        } else {
            format!("{passed} passed, {warned} warned, {failed} failed")
        }
    }

    fn count(&self, state: CheckState) -> usize {
        self.checks
            .iter()
            .filter(|check| check.state == state)
            .count()
    }
}

pub fn run_doctor() -> DoctorReport {
    run_doctor_with(
        resolve_config_path(),
        env::var(GITHUB_TOKEN_ENV).ok(),
        env::var(GEMINI_API_KEY_ENV).ok(),
    )
}

pub fn run_doctor_with(
    config_path: Result<PathBuf, ConfigError>,
    github_token_env: Option<String>,
    gemini_key_env: Option<String>,
) -> DoctorReport {
    let mut checks = Vec::new();

    let config = match config_path {
        Ok(config_path) => {
            checks.push(pass_check(
                "config path resolves",
                config_path.display().to_string(),
            ));

            if config_path.exists() {
                checks.push(pass_check(
                    "config file",
                    format!("found at {}", config_path.display()),
                ));

                match load_config(&config_path) {
                    Ok(config) => {
                        checks.push(pass_check("config parses and validates", "config is valid"));
                        Some(config)
                    }
                    Err(error) => {
                        checks.push(fail_check("config parses and validates", error.to_string()));
                        None
                    }
                }
            } else {
                checks.push(pass_check(
                    "config file",
                    format!("not present at {}, using defaults", config_path.display()),
                ));
                checks.push(pass_check("config parses and validates", "defaults are valid"));
                Some(RepolensConfig::default())
            }
        }
        Err(error) => {
            checks.push(fail_check("config path resolves", error.to_string()));
            checks.push(skipped_check(
                "config file",
                "config path could not be resolved",
            ));
            checks.push(pass_check("config parses and validates", "defaults are valid"));
            Some(RepolensConfig::default())
        }
    };

    match config {
        Some(config) => {
            let config = config.with_overrides(github_token_env, gemini_key_env);
            checks.push(check_github_token(&config));
            checks.push(check_gemini_key(&config));
        }
        None => push_skipped_checks(
            &mut checks,
            &["github token", "gemini api key"],
            "config is invalid",
        ),
    }

    DoctorReport { checks }
}

fn check_github_token(config: &RepolensConfig) -> DoctorCheck {
    if config.github_token().is_some() {
        pass_check("github token", "token configured")
    } else {
        DoctorCheck {
            name: "github token".to_string(),
            state: CheckState::Warn,
            details: format!(
                "{GITHUB_TOKEN_ENV} not set; unauthenticated requests have a low rate limit"
            ),
        }
    }
}

fn check_gemini_key(config: &RepolensConfig) -> DoctorCheck {
    if config.gemini_api_key().is_some() {
        pass_check(
            "gemini api key",
            format!("key configured for model {}", config.gemini.model),
        )
    } else {
        fail_check(
            "gemini api key",
            format!("set {GEMINI_API_KEY_ENV} or gemini.api_key to enable analysis"),
        )
    }
}

fn pass_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Pass,
        details: details.into(),
    }
}

fn fail_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Fail,
        details: details.into(),
    }
}

fn skipped_check(name: &str, reason: &str) -> DoctorCheck {
    fail_check(name, format!("skipped because {reason}"))
}

fn push_skipped_checks(checks: &mut Vec<DoctorCheck>, names: &[&str], reason: &str) {
    checks.extend(
        names
            .iter()
            .copied()
            .map(|name| skipped_check(name, reason)),
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn states(report: &DoctorReport) -> Vec<(&str, CheckState)> {
        report
            .checks
            .iter()
            .map(|check| (check.name.as_str(), check.state))
            .collect()
    }

    #[test]
    fn check_state_display_is_uppercase_label() {
        assert_eq!(CheckState::Pass.to_string(), "PASS");
        assert_eq!(CheckState::Warn.to_string(), "WARN");
        assert_eq!(CheckState::Fail.to_string(), "FAIL");
    }

    #[test]
    fn missing_config_uses_defaults_and_reports_secrets() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = run_doctor_with(Ok(dir.path().join("config.toml")), None, None);

        assert_eq!(
            states(&report),
            vec![
                ("config path resolves", CheckState::Pass),
                ("config file", CheckState::Pass),
                ("config parses and validates", CheckState::Pass),
                ("github token", CheckState::Warn),
                ("gemini api key", CheckState::Fail),
            ]
        );
        assert_eq!(report.summary(), "3 passed, 1 warned, 1 failed");
    }

    #[test]
    fn env_secrets_satisfy_checks() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = run_doctor_with(
            Ok(dir.path().join("config.toml")),
            Some("ghp".to_string()),
            Some("key".to_string()),
        );

        assert!(!report.has_failures());
        assert_eq!(report.summary(), "5 passed, 0 failed");
    }

    #[test]
    fn invalid_config_skips_secret_checks() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "version = 3\n").expect("write config");

        let report = run_doctor_with(Ok(path), Some("ghp".to_string()), None);
        assert_eq!(
            states(&report),
            vec![
                ("config path resolves", CheckState::Pass),
                ("config file", CheckState::Pass),
                ("config parses and validates", CheckState::Fail),
                ("github token", CheckState::Fail),
                ("gemini api key", CheckState::Fail),
            ]
        );
        assert!(report.checks[3].details.contains("skipped because config is invalid"));
    }

    #[test]
    fn unresolved_home_still_checks_env_secrets() {
        let report = run_doctor_with(
            Err(ConfigError::HomeDirectoryUnavailable),
            None,
            Some("key".to_string()),
        );
        assert_eq!(report.checks[0].state, CheckState::Fail);
        assert_eq!(report.checks[4].state, CheckState::Pass);
    }
}

//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_templates(config, &mut result);
        Self::validate_gateway(config, &mut result);
        Self::validate_panorama(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }

        if config.server.session_idle_minutes == 0 {
            result.add_error(ValidationError::new(
                "server.session_idle_minutes",
                "session_idle_minutes must be greater than 0",
            ));
        }
    }

    fn validate_templates(config: &Config, result: &mut ValidationResult) {
        let templates = &config.templates;

        if templates.root.trim().is_empty() {
            result.add_error(ValidationError::new(
                "templates.root",
                "Templates root cannot be empty",
            ));
            return;
        }

        if templates.git_timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "templates.git_timeout_seconds",
                "git_timeout_seconds must be greater than 0",
            ));
        }

        if templates.max_depth == 0 {
            result.add_error(ValidationError::new(
                "templates.max_depth",
                "max_depth must be greater than 0",
            ));
        }

        // Scanning the same tree twice would report every template twice
        let root = templates.root_path();
        if templates.builtin_paths().iter().any(|p| *p == root) {
            result.add_warning(ValidationWarning::new(
                "templates.builtin_dirs",
                "templates.root is also listed as a built-in directory",
            ));
        }

        if !templates.github_api.starts_with("http://")
            && !templates.github_api.starts_with("https://")
        {
            result.add_error(ValidationError::new(
                "templates.github_api",
                "github_api must start with http:// or https://",
            ));
        }
    }

    fn validate_gateway(config: &Config, result: &mut ValidationResult) {
        let gateway = &config.gateway;

        if gateway.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "gateway.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }

        for (name, service) in [
            ("gateway.bootstrapper", &gateway.bootstrapper),
            ("gateway.content_downloader", &gateway.content_downloader),
        ] {
            if service.host.is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.host", name),
                    "Host cannot be empty",
                ));
            }
            if service.port == 0 {
                result.add_error(ValidationError::new(
                    format!("{}.port", name),
                    "Port cannot be 0",
                ));
            }
        }
    }

    fn validate_panorama(config: &Config, result: &mut ValidationResult) {
        let panorama = &config.panorama;

        if panorama.scheme != "https" && panorama.scheme != "http" {
            result.add_error(ValidationError::new(
                "panorama.scheme",
                format!("Unknown scheme '{}', expected http or https", panorama.scheme),
            ));
        } else if panorama.scheme == "http" {
            result.add_warning(ValidationWarning::new(
                "panorama.scheme",
                "Panorama credentials will be sent over plain http",
            ));
        }

        if panorama.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "panorama.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }

        if panorama.auth_key_lifetime_hours == 0 {
            result.add_error(ValidationError::new(
                "panorama.auth_key_lifetime_hours",
                "auth_key_lifetime_hours must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

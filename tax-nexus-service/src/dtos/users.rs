use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A named bundle of permissions offered when creating users.
#[derive(Debug, Clone, Serialize)]
pub struct RoleTemplate {
    pub role: &'static str,
    pub label: &'static str,
    pub permissions: &'static [&'static str],
}

pub const ROLE_TEMPLATES: &[RoleTemplate] = &[
    RoleTemplate {
        role: "admin",
        label: "Administrator",
        permissions: &[
            "clients:write",
            "invoices:write",
            "fbr:submit",
            "settings:write",
            "users:write",
            "reports:read",
        ],
    },
    RoleTemplate {
        role: "accountant",
        label: "Accountant",
        permissions: &["clients:write", "invoices:write", "fbr:submit", "reports:read"],
    },
    RoleTemplate {
        role: "viewer",
        label: "Viewer",
        permissions: &["reports:read"],
    },
];

pub fn role_template(role: &str) -> Option<&'static RoleTemplate> {
    ROLE_TEMPLATES.iter().find(|t| t.role == role)
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    if role_template(role).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("role");
        err.message = Some("unknown role".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default = "default_role")]
    #[validate(custom(function = "validate_role"))]
    pub role: String,
    /// Defaults to the role template's permissions.
    pub permissions: Option<Vec<String>>,
    pub active: Option<bool>,
}

fn default_role() -> String {
    "viewer".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_fails_validation() {
        let request = CreateUserRequest {
            name: "Ayesha".into(),
            email: "ayesha@example.com".into(),
            role: "superuser".into(),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn role_defaults_to_viewer() {
        let request: CreateUserRequest =
            serde_json::from_str(r#"{"name":"Bilal","email":"bilal@example.com"}"#).unwrap();
        assert_eq!(request.role, "viewer");
        assert!(request.validate().is_ok());
    }
}

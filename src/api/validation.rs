//! Explicit validators, one per request type. Violations accumulate so a
//! client sees everything wrong with the payload in one round trip.

use regex::Regex;
use std::sync::LazyLock;

use super::ApiError;
use super::types::{ChangePasswordRequest, LoginRequest, RegisterRequest};
use crate::auth::password::is_strong_password;
use crate::db::RoleName;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

const PASSWORD_RULE: &str =
    "Password must contain at least 8 characters, one uppercase, one number and one special character";

const GENDERS: &[&str] = &["male", "female", "other"];

pub fn validate_login(req: &LoginRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    if req.username.trim().is_empty() {
        errors.push("Username is required".to_string());
    }
    if req.password.is_empty() {
        errors.push("Password is required".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

pub fn validate_register(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    if req.first_name.trim().is_empty() {
        errors.push("First name is required".to_string());
    }

    if req.email.trim().is_empty() {
        errors.push("Email is required".to_string());
    } else if !EMAIL_RE.is_match(&req.email) {
        errors.push("Please enter a valid email address".to_string());
    }

    if req.password.is_empty() {
        errors.push("Password is required".to_string());
    } else if !is_strong_password(&req.password) {
        errors.push(PASSWORD_RULE.to_string());
    }

    // Administrator accounts are never self-service.
    let assignable = RoleName::assignable();
    if !assignable.iter().any(|role| role.as_str() == req.role) {
        let allowed: Vec<&str> = assignable.iter().map(|r| r.as_str()).collect();
        errors.push(format!("Role must be either {}", allowed.join(", ")));
    }

    if let Some(gender) = &req.gender
        && !GENDERS.contains(&gender.to_lowercase().as_str())
    {
        errors.push("Gender must be one of: male, female, other".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

pub fn validate_change_password(req: &ChangePasswordRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    if req.current_password.is_empty() {
        errors.push("Current password is required".to_string());
    }

    if req.new_password.is_empty() {
        errors.push("New password is required".to_string());
    } else if !is_strong_password(&req.new_password) {
        errors.push(format!("New {}", PASSWORD_RULE.to_lowercase()));
    }

    if req.confirm_new_password.is_empty() {
        errors.push("Confirm new password is required".to_string());
    } else if req.new_password != req.confirm_new_password {
        errors.push("New password and confirm new password must match".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_register() -> RegisterRequest {
        RegisterRequest {
            first_name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "Passw0rd!".to_string(),
            role: "Student".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn login_requires_both_fields() {
        let req = LoginRequest {
            username: String::new(),
            password: String::new(),
            remember_me: None,
        };
        assert!(validate_login(&req).is_err());

        let req = LoginRequest {
            username: "jane".to_string(),
            password: "secret".to_string(),
            remember_me: None,
        };
        assert!(validate_login(&req).is_ok());
    }

    #[test]
    fn register_accepts_valid_payload() {
        assert!(validate_register(&valid_register()).is_ok());
    }

    #[test]
    fn register_rejects_bad_email() {
        let mut req = valid_register();
        req.email = "not-an-email".to_string();
        assert!(validate_register(&req).is_err());
    }

    #[test]
    fn register_rejects_weak_password() {
        let mut req = valid_register();
        req.password = "password".to_string();
        assert!(validate_register(&req).is_err());
    }

    #[test]
    fn register_rejects_administrator_role() {
        let mut req = valid_register();
        req.role = "Administrator".to_string();
        assert!(validate_register(&req).is_err());
    }

    #[test]
    fn register_rejects_unknown_gender() {
        let mut req = valid_register();
        req.gender = Some("dragon".to_string());
        assert!(validate_register(&req).is_err());

        req.gender = Some("Female".to_string());
        assert!(validate_register(&req).is_ok());
    }

    #[test]
    fn change_password_requires_matching_confirmation() {
        let req = ChangePasswordRequest {
            current_password: "Old-Passw0rd".to_string(),
            new_password: "New-Passw0rd!".to_string(),
            confirm_new_password: "Different1!".to_string(),
        };
        assert!(validate_change_password(&req).is_err());

        let req = ChangePasswordRequest {
            current_password: "Old-Passw0rd".to_string(),
            new_password: "New-Passw0rd!".to_string(),
            confirm_new_password: "New-Passw0rd!".to_string(),
        };
        assert!(validate_change_password(&req).is_ok());
    }
}

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{LoginForm, RegisterForm};
use crate::auth::repo_types::{Role, UserStatus};
use crate::error::{AppError, FieldErrors};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validated login credentials with the email case-folded for lookup.
#[derive(Debug)]
pub(crate) struct LoginCredentials {
    pub email: String,
    pub password: String,
}

pub(crate) fn validate_login(form: &LoginForm) -> Result<LoginCredentials, AppError> {
    let email = form.email.as_deref().unwrap_or("");
    let password = form.password.as_deref().unwrap_or("");

    if email.is_empty() || password.is_empty() {
        let mut field_errors = FieldErrors::new();
        if email.is_empty() {
            field_errors.insert("email", "Email is required".into());
        }
        if password.is_empty() {
            field_errors.insert("password", "Password is required".into());
        }
        return Err(AppError::validation(
            "Email and password are required",
            field_errors,
        ));
    }

    if !is_valid_email(email) {
        return Err(AppError::field(
            "email",
            "Please enter a valid email address",
        ));
    }

    Ok(LoginCredentials {
        email: email.to_lowercase(),
        password: password.to_string(),
    })
}

/// Validated registration input, normalized and ready to persist.
#[derive(Debug)]
pub(crate) struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub(crate) fn validate_registration(form: &RegisterForm) -> Result<Registration, AppError> {
    let name = form.name.as_deref().unwrap_or("").trim();
    let email = form.email.as_deref().unwrap_or("").to_lowercase();
    let email = email.trim();
    let password = form.password.as_deref().unwrap_or("");
    let confirm_password = form.confirm_password.as_deref().unwrap_or("");

    let mut field_errors = FieldErrors::new();

    if name.chars().count() < 2 {
        field_errors.insert("name", "Name must be at least 2 characters long".into());
    }

    if email.is_empty() {
        field_errors.insert("email", "Email is required".into());
    } else if !is_valid_email(email) {
        field_errors.insert("email", "Please enter a valid email address".into());
    }

    if password.is_empty() {
        field_errors.insert("password", "Password is required".into());
    } else if password.len() < 8 {
        field_errors.insert(
            "password",
            "Password must be at least 8 characters long".into(),
        );
    }

    if confirm_password.is_empty() {
        field_errors.insert("confirmPassword", "Please confirm your password".into());
    } else if confirm_password != password {
        field_errors.insert("confirmPassword", "Passwords do not match".into());
    }

    // A bad role short-circuits before the field errors are reported.
    let role = match form.role.as_deref() {
        Some("freelancer") => Role::Freelancer,
        Some("client") => Role::Client,
        _ => {
            return Err(AppError::validation(
                "Please select whether you want to find work or hire talent",
                FieldErrors::new(),
            ))
        }
    };

    if !field_errors.is_empty() {
        return Err(AppError::validation(
            "Please fix the errors below",
            field_errors,
        ));
    }

    Ok(Registration {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role,
    })
}

/// User-visible message for a login attempt against a non-active account.
pub(crate) fn inactive_message(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Suspended => "Your account has been suspended. Please contact support.",
        UserStatus::Deactivated => "Your account has been deactivated. Please contact support.",
        UserStatus::Active => "Your account is not active",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            name: Some("Jo Doe".into()),
            email: Some("jo@x.com".into()),
            password: Some("Abcd1234".into()),
            confirm_password: Some("Abcd1234".into()),
            role: Some("freelancer".into()),
        }
    }

    fn field_errors(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation { field_errors, .. } => field_errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_reasonable_emails_only() {
        assert!(is_valid_email("jo@x.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("jo@x"));
        assert!(!is_valid_email("jo x@y.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn login_requires_both_fields() {
        let err = validate_login(&LoginForm {
            email: None,
            password: None,
        })
        .unwrap_err();
        let errors = field_errors(err);
        assert_eq!(errors.get("email").unwrap(), "Email is required");
        assert_eq!(errors.get("password").unwrap(), "Password is required");
    }

    #[test]
    fn login_rejects_malformed_email() {
        let err = validate_login(&LoginForm {
            email: Some("not-an-email".into()),
            password: Some("whatever1".into()),
        })
        .unwrap_err();
        let errors = field_errors(err);
        assert_eq!(
            errors.get("email").unwrap(),
            "Please enter a valid email address"
        );
    }

    #[test]
    fn login_folds_email_case() {
        let credentials = validate_login(&LoginForm {
            email: Some("Jo@X.Com".into()),
            password: Some("Abcd1234".into()),
        })
        .unwrap();
        assert_eq!(credentials.email, "jo@x.com");
    }

    #[test]
    fn registration_accepts_a_valid_form() {
        let registration = validate_registration(&register_form()).unwrap();
        assert_eq!(registration.name, "Jo Doe");
        assert_eq!(registration.email, "jo@x.com");
        assert_eq!(registration.role, Role::Freelancer);
    }

    #[test]
    fn registration_normalizes_email() {
        let mut form = register_form();
        form.email = Some("  Jo@X.Com ".into());
        let registration = validate_registration(&form).unwrap();
        assert_eq!(registration.email, "jo@x.com");
    }

    #[test]
    fn mismatched_confirmation_is_a_confirm_password_field_error() {
        let mut form = register_form();
        form.confirm_password = Some("Abcd1235".into());
        let errors = field_errors(validate_registration(&form).unwrap_err());
        assert_eq!(
            errors.get("confirmPassword").unwrap(),
            "Passwords do not match"
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn short_name_and_password_collect_field_errors() {
        let mut form = register_form();
        form.name = Some(" J ".into());
        form.password = Some("short".into());
        form.confirm_password = Some("short".into());
        let errors = field_errors(validate_registration(&form).unwrap_err());
        assert_eq!(
            errors.get("name").unwrap(),
            "Name must be at least 2 characters long"
        );
        assert_eq!(
            errors.get("password").unwrap(),
            "Password must be at least 8 characters long"
        );
    }

    #[test]
    fn invalid_role_short_circuits_other_field_errors() {
        let mut form = register_form();
        form.name = Some("J".into());
        form.role = Some("admin".into());
        let err = validate_registration(&form).unwrap_err();
        match err {
            AppError::Validation {
                message,
                field_errors,
            } => {
                assert_eq!(
                    message,
                    "Please select whether you want to find work or hire talent"
                );
                assert!(field_errors.is_empty());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn inactive_messages_name_the_status() {
        assert!(inactive_message(UserStatus::Suspended).contains("suspended"));
        assert!(inactive_message(UserStatus::Deactivated).contains("deactivated"));
    }
}

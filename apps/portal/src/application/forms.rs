//! Form bodies posted by the portal pages and their validation.
//!
//! Every field defaults to an empty string so a missing field is reported as a
//! field error instead of an extractor rejection.

use serde::{Deserialize, Serialize};

const MAX_EMAIL_LEN: usize = 254;
const MAX_NAME_LEN: usize = 100;
const MAX_TOKEN_LEN: usize = 64;
const MIN_PASSWORD_LEN: usize = 8;

/// Errors keyed by form field name, in the order they were found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|(name, _)| *name == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, String)> {
        self.0.iter()
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub senha: String,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nome_completo: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct AddTokenForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub senha: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct NewRequestForm {
    #[serde(default)]
    pub tipo_profissional: String,
    #[serde(default)]
    pub jornada: String,
    #[serde(default)]
    pub observacoes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAddToken {
    pub email: String,
    pub password: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNewRequest {
    pub professional_type: String,
    pub shift: String,
    pub notes: String,
}

/// Emails double as usernames, so they are compared lower-cased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn check_email(errors: &mut FieldErrors, field: &'static str, raw: &str) -> String {
    let email = normalize_email(raw);
    match email.split_once('@') {
        _ if email.is_empty() => errors.add(field, "Este campo é obrigatório."),
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            if email.chars().count() > MAX_EMAIL_LEN {
                errors.add(field, "Email muito longo.");
            }
        }
        _ => errors.add(field, "Informe um endereço de email válido."),
    }
    email
}

fn check_required(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
    max_len: usize,
) -> String {
    let value = raw.trim().to_string();
    if value.is_empty() {
        errors.add(field, "Este campo é obrigatório.");
    } else if value.chars().count() > max_len {
        errors.add(field, format!("Use no máximo {max_len} caracteres."));
    }
    value
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<ValidRegistration, FieldErrors> {
        let mut errors = FieldErrors::default();
        let email = check_email(&mut errors, "email", &self.email);
        let full_name = check_required(&mut errors, "nome_completo", &self.nome_completo, MAX_NAME_LEN);
        if self.password1.is_empty() {
            errors.add("password1", "Este campo é obrigatório.");
        } else if self.password1.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password1",
                format!("A senha deve ter pelo menos {MIN_PASSWORD_LEN} caracteres."),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "As senhas não conferem.");
        }
        let token = check_required(&mut errors, "token", &self.token, MAX_TOKEN_LEN);

        errors.into_result(ValidRegistration {
            email,
            full_name,
            password: self.password1.clone(),
            token,
        })
    }
}

impl AddTokenForm {
    pub fn validate(&self) -> Result<ValidAddToken, FieldErrors> {
        let mut errors = FieldErrors::default();
        let email = check_email(&mut errors, "email", &self.email);
        if self.senha.is_empty() {
            errors.add("senha", "Este campo é obrigatório.");
        }
        let token = check_required(&mut errors, "token", &self.token, MAX_TOKEN_LEN);

        errors.into_result(ValidAddToken {
            email,
            password: self.senha.clone(),
            token,
        })
    }
}

impl NewRequestForm {
    pub fn validate(&self) -> Result<ValidNewRequest, FieldErrors> {
        let mut errors = FieldErrors::default();
        let professional_type =
            check_required(&mut errors, "tipo_profissional", &self.tipo_profissional, MAX_NAME_LEN);
        let shift = check_required(&mut errors, "jornada", &self.jornada, MAX_NAME_LEN);

        errors.into_result(ValidNewRequest {
            professional_type,
            shift,
            notes: self.observacoes.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            email: " NewUser@Example.com ".into(),
            nome_completo: "New User".into(),
            password1: "complexpass123".into(),
            password2: "complexpass123".into(),
            token: "test-token-123".into(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let valid = registration().validate().unwrap();
        assert_eq!(valid.email, "newuser@example.com");
        assert_eq!(valid.full_name, "New User");
        assert_eq!(valid.token, "test-token-123");
    }

    #[test]
    fn test_registration_password_mismatch() {
        let form = RegistrationForm {
            password2: "differentpass456".into(),
            ..registration()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.contains("password2"));
        assert!(!errors.contains("email"));
    }

    #[test]
    fn test_registration_missing_fields() {
        let errors = RegistrationForm::default().validate().unwrap_err();
        for field in ["email", "nome_completo", "password1", "token"] {
            assert!(errors.contains(field), "expected error for {field}");
        }
    }

    #[test]
    fn test_registration_rejects_bad_email_and_short_password() {
        let form = RegistrationForm {
            email: "not-an-email".into(),
            password1: "short".into(),
            password2: "short".into(),
            ..registration()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.contains("email"));
        assert!(errors.contains("password1"));
    }

    #[test]
    fn test_add_token_requires_all_fields() {
        let errors = AddTokenForm {
            email: "a@x.com".into(),
            senha: String::new(),
            token: "   ".into(),
        }
        .validate()
        .unwrap_err();
        assert!(errors.contains("senha"));
        assert!(errors.contains("token"));
        assert!(!errors.contains("email"));
    }

    #[test]
    fn test_new_request_notes_are_optional() {
        let valid = NewRequestForm {
            tipo_profissional: "Enfermeiro".into(),
            jornada: "12x36".into(),
            observacoes: String::new(),
        }
        .validate()
        .unwrap();
        assert_eq!(valid.notes, "");

        let errors = NewRequestForm::default().validate().unwrap_err();
        assert!(errors.contains("tipo_profissional"));
        assert!(errors.contains("jornada"));
    }

    #[test]
    fn test_new_request_length_limit() {
        let errors = NewRequestForm {
            tipo_profissional: "x".repeat(101),
            jornada: "Noturno".into(),
            observacoes: String::new(),
        }
        .validate()
        .unwrap_err();
        assert!(errors.contains("tipo_profissional"));
    }
}

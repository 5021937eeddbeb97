//! Field rules applied at the request boundary.
//!
//! Each field has a fixed, ordered list of rules. Every failing rule adds its
//! message, so a client sees all problems with a field at once.

use std::sync::LazyLock;

use regex::Regex;

use crate::FieldErrors;

static USERNAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("username pattern"));

static PASSWORD_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[a-zA-Z0-9!@#$%^&*()_+=\[\]{};:'"\\|,.<>/?~-]+$"#).expect("password pattern")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

pub struct Rule {
    pub check: fn(&str) -> bool,
    pub message: &'static str,
}

pub static USERNAME_RULES: &[Rule] = &[
    Rule {
        check: |v| USERNAME_CHARS.is_match(v),
        message: "Username must be alphanumeric and can include underscores",
    },
    Rule {
        check: |v| v.chars().count() >= 4,
        message: "Username must be at least 4 characters long.",
    },
    Rule {
        check: |v| v.chars().count() <= 20,
        message: "Username must be no longer than 20 characters.",
    },
];

pub static PASSWORD_RULES: &[Rule] = &[
    Rule {
        check: |v| PASSWORD_CHARS.is_match(v),
        message: "Password must consist of alphanumeric and special characters only.",
    },
    Rule {
        check: |v| v.chars().count() >= 8,
        message: "Password must be at least 8 characters long.",
    },
    Rule {
        check: |v| v.chars().count() <= 20,
        message: "Password must be no longer than 20 characters.",
    },
];

pub static EMAIL_RULES: &[Rule] = &[Rule {
    check: |v| v.len() <= 254 && EMAIL.is_match(v),
    message: "Enter a valid email address.",
}];

/// Messages of every rule `value` breaks, in rule order.
pub fn apply(rules: &[Rule], value: &str) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| !(rule.check)(value))
        .map(|rule| rule.message.to_owned())
        .collect()
}

/// Runs `rules` over a required field, recording failures under `field`.
pub fn field(errors: &mut FieldErrors, field: &str, value: Option<&str>, rules: &[Rule]) {
    match value {
        None => errors.add(field, "This field is required."),
        Some("") => errors.add(field, "This field may not be blank."),
        Some(value) => errors.extend(field, apply(rules, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_usernames() {
        assert!(apply(USERNAME_RULES, "john_doe").is_empty());
        assert!(apply(USERNAME_RULES, "abcd").is_empty());
        assert!(apply(USERNAME_RULES, &"a".repeat(20)).is_empty());
        assert!(apply(USERNAME_RULES, "guest_0a1b2c3d").is_empty());
    }

    #[test]
    fn reports_every_broken_username_rule() {
        let messages = apply(USERNAME_RULES, "a-b");
        assert_eq!(
            messages,
            [
                "Username must be alphanumeric and can include underscores",
                "Username must be at least 4 characters long.",
            ]
        );
        assert_eq!(apply(USERNAME_RULES, &"a".repeat(21)).len(), 1);
    }

    #[test]
    fn password_charset_and_length() {
        assert!(apply(PASSWORD_RULES, "S3cure!pass").is_empty());
        assert_eq!(
            apply(PASSWORD_RULES, r#"a[b]{c};:'"\|,.<>/?~-"#),
            ["Password must be no longer than 20 characters."]
        );
        assert_eq!(apply(PASSWORD_RULES, "short1!").len(), 1);
        assert_eq!(
            apply(PASSWORD_RULES, "with space"),
            ["Password must consist of alphanumeric and special characters only."]
        );
    }

    #[test]
    fn email_shape() {
        assert!(apply(EMAIL_RULES, "user@example.com").is_empty());
        assert!(!apply(EMAIL_RULES, "user@").is_empty());
        assert!(!apply(EMAIL_RULES, "invalid").is_empty());
    }

    #[test]
    fn missing_and_blank_fields() {
        let mut errors = FieldErrors::new();
        field(&mut errors, "username", None, USERNAME_RULES);
        field(&mut errors, "email", Some(""), EMAIL_RULES);
        assert_eq!(errors.get("username").unwrap(), ["This field is required."]);
        assert_eq!(errors.get("email").unwrap(), ["This field may not be blank."]);
    }
}

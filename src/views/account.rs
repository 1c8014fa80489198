use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{error_message, FormError};
use crate::{
    models::{ProfileUpdate, User},
    query::{QueryCache, QueryEntry, QueryKey},
};

pub const FULL_NAME_MAX: usize = 30;
pub const TOKEN_SAVED: &str = "Token saved!";
pub const TOKEN_SAVE_FAILED: &str = "Failed to save token.";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Profile form on the account page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

impl ProfileForm {
    /// Prefill from the signed-in user.
    pub fn from_user(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone().unwrap_or_default(),
            email: user.email.clone(),
        }
    }

    fn check_fields(&self) -> Result<(), FormError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(FormError::EmailRequired);
        }
        if !is_valid_email(email) {
            return Err(FormError::EmailInvalid);
        }
        if self.full_name.chars().count() > FULL_NAME_MAX {
            return Err(FormError::FullNameTooLong { max: FULL_NAME_MAX });
        }
        Ok(())
    }

    /// Whether any field differs from what the backend holds.
    pub fn is_dirty(&self, current: Option<&User>) -> bool {
        match current {
            Some(user) => {
                self.full_name != user.full_name.as_deref().unwrap_or_default()
                    || self.email.trim() != user.email
            }
            None => true,
        }
    }

    /// The save button is enabled once something changed and an email is
    /// present; full validation runs on submit.
    pub fn can_save(&self, current: Option<&User>) -> bool {
        self.is_dirty(current) && !self.email.trim().is_empty()
    }

    /// Validate against `current` and build the partial update carrying only
    /// the fields that changed.
    pub fn validate(&self, current: Option<&User>) -> Result<ProfileUpdate, FormError> {
        self.check_fields()?;
        if !self.is_dirty(current) {
            return Err(FormError::Unchanged);
        }

        let email = self.email.trim().to_owned();
        let full_name = self.full_name.clone();
        Ok(match current {
            None => ProfileUpdate {
                full_name: Some(full_name),
                email: Some(email),
            },
            Some(user) => ProfileUpdate {
                full_name: (user.full_name.as_deref().unwrap_or_default() != full_name)
                    .then_some(full_name),
                email: (user.email != email).then_some(email),
            },
        })
    }
}

/// Token form; an empty value is allowed and clears the integration token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenForm {
    #[serde(default)]
    pub coreiot_access_token: String,
}

/// Account page and header avatar.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AccountView {
    pub loading: bool,
    pub error: Option<String>,
    /// `N/A` when the user has not set a name.
    pub full_name: String,
    pub email: Option<String>,
    /// Avatar letters; `U` when nothing better is known.
    pub initials: String,
    pub is_active: Option<bool>,
    pub coreiot_access_token: Option<String>,
    pub profile_form: ProfileForm,
}

/// First letter of up to two words of the name, else of the email.
pub fn initials(user: Option<&User>) -> String {
    let Some(user) = user else {
        return "U".to_owned();
    };
    let from_name: String = user
        .full_name
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if !from_name.is_empty() {
        return from_name;
    }
    user.email
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "U".to_owned())
}

pub fn build(entry: &QueryEntry) -> AccountView {
    let user = entry.user();
    AccountView {
        loading: entry.is_loading(),
        error: error_message(entry, "user"),
        full_name: user
            .and_then(|u| u.full_name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("N/A")
            .to_owned(),
        email: user.map(|u| u.email.clone()),
        initials: initials(user),
        is_active: user.map(|u| u.is_active),
        coreiot_access_token: user.and_then(|u| u.coreiot_access_token.clone()),
        profile_form: user.map(ProfileForm::from_user).unwrap_or_default(),
    }
}

pub async fn load(cache: &QueryCache) -> AccountView {
    build(&cache.get(QueryKey::CurrentUser).await)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::query::QueryData;

    fn user(full_name: Option<&str>, email: &str) -> User {
        User {
            id: Uuid::nil(),
            email: email.to_owned(),
            full_name: full_name.map(str::to_owned),
            is_active: true,
            coreiot_access_token: Some("tok".into()),
        }
    }

    fn form(full_name: &str, email: &str) -> ProfileForm {
        ProfileForm {
            full_name: full_name.into(),
            email: email.into(),
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("jane.doe+home@example.co"));
        assert!(is_valid_email("ADMIN@EXAMPLE.COM"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane@example.c"));
        assert!(!is_valid_email("jane example@x.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn validation_messages() {
        assert_eq!(form("Jane", "").validate(None), Err(FormError::EmailRequired));
        assert_eq!(form("Jane", "nope").validate(None), Err(FormError::EmailInvalid));
        assert_eq!(
            form(&"x".repeat(31), "a@b.io").validate(None),
            Err(FormError::FullNameTooLong { max: 30 })
        );
        assert!(form(&"x".repeat(30), "a@b.io").validate(None).is_ok());
    }

    #[test]
    fn unchanged_form_cannot_be_saved() {
        let current = user(Some("Jane Doe"), "jane@example.com");
        let f = ProfileForm::from_user(&current);
        assert!(!f.is_dirty(Some(&current)));
        assert!(!f.can_save(Some(&current)));
        assert_eq!(f.validate(Some(&current)), Err(FormError::Unchanged));
    }

    #[test]
    fn update_carries_only_changed_fields() {
        let current = user(Some("Jane Doe"), "jane@example.com");
        let update = form("Jane Smith", "jane@example.com")
            .validate(Some(&current))
            .unwrap();
        assert_eq!(
            update,
            ProfileUpdate {
                full_name: Some("Jane Smith".into()),
                email: None,
            }
        );

        let update = form("Jane Doe", " new@example.com ")
            .validate(Some(&current))
            .unwrap();
        assert_eq!(update.full_name, None);
        assert_eq!(update.email.as_deref(), Some("new@example.com"));
    }

    #[test]
    fn save_needs_change_and_email() {
        let current = user(None, "jane@example.com");
        assert!(!form("Jane", "  ").can_save(Some(&current)));
        assert!(form("Jane", "jane@example.com").can_save(Some(&current)));
        // Enabled, but rejected on submit.
        assert!(form("", "broken").can_save(Some(&current)));
        assert_eq!(
            form("", "broken").validate(Some(&current)),
            Err(FormError::EmailInvalid)
        );
    }

    #[test]
    fn initials_from_name_then_email() {
        assert_eq!(initials(Some(&user(Some("jane doe smith"), "j@x.io"))), "JD");
        assert_eq!(initials(Some(&user(Some("Cher"), "c@x.io"))), "C");
        assert_eq!(initials(Some(&user(None, "zed@x.io"))), "Z");
        assert_eq!(initials(Some(&user(Some("   "), "zed@x.io"))), "Z");
        assert_eq!(initials(None), "U");
    }

    #[test]
    fn view_shows_placeholders() {
        let entry = QueryEntry {
            data: Some(QueryData::User(user(None, "jane@example.com"))),
            ..Default::default()
        };
        let view = build(&entry);
        assert_eq!(view.full_name, "N/A");
        assert_eq!(view.email.as_deref(), Some("jane@example.com"));
        assert_eq!(view.initials, "J");
        assert_eq!(view.coreiot_access_token.as_deref(), Some("tok"));
        assert_eq!(view.profile_form, form("", "jane@example.com"));
    }

    #[test]
    fn view_before_load() {
        let view = build(&QueryEntry::default());
        assert!(view.loading);
        assert_eq!(view.initials, "U");
        assert!(view.email.is_none());
    }
}

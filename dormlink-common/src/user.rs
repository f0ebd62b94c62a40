//! User profile as returned by `GET /profile/`.

use serde::{Deserialize, Serialize};

/// Full user profile.
///
/// The profile endpoint does not always include the numeric id; the session
/// layer overwrites `id` with the `user_id` claim of the access token that
/// authenticated the fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl UserProfile {
    /// Display name for UI surfaces: "First Last", falling back to the
    /// username when no name fields are set.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(username: &str, first: &str, last: &str) -> UserProfile {
        UserProfile {
            id: 1,
            username: username.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: String::new(),
            phone: String::new(),
            image: None,
        }
    }

    #[test]
    fn test_display_name_full() {
        assert_eq!(profile("jdoe", "Jane", "Doe").display_name(), "Jane Doe");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(profile("jdoe", "", "").display_name(), "jdoe");
    }

    #[test]
    fn test_display_name_single_field() {
        assert_eq!(profile("jdoe", "Jane", "").display_name(), "Jane");
    }
}

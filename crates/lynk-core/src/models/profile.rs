//! User profile model

use serde::{Deserialize, Serialize};

/// Per-user profile document, keyed by the provider-issued user id
///
/// The row is seeded at sign-up with the email only. Because the seed write
/// is not transactional with account creation, a profile may be missing
/// entirely; readers treat that as "no avatar, email sourced from the
/// session instead".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Email captured at sign-up time
    #[serde(default)]
    pub email: Option<String>,
    /// Local filesystem path of the stored avatar image (not a portable URL)
    #[serde(default)]
    pub avatar_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_row_deserializes_with_absent_fields() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"email":"a@x.com"}"#).unwrap();
        assert_eq!(profile.email.as_deref(), Some("a@x.com"));
        assert_eq!(profile.avatar_path, None);
    }
}

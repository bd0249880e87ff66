/// Token claim set
///
/// The signed payload carried by an access token: identity fields plus the
/// nested role, and the issuance timestamp. There is no `exp` claim by
/// design; a token stays valid until the signing key changes.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{Role, RoleRecord, UserRecord};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: RoleRecord,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

impl Claims {
    /// Build the claim set for a freshly authenticated user.
    pub fn from_user(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            role: user.role.clone(),
            iat: Utc::now().timestamp(),
        }
    }

    pub fn role(&self) -> Role {
        self.role.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> UserRecord {
        UserRecord {
            id: 420,
            name: "sussy baka".to_string(),
            email: "amongus@420.com".to_string(),
            image: Some("this_is_image".to_string()),
            role: RoleRecord {
                id: 2,
                name: Role::Admin,
            },
        }
    }

    #[test]
    fn test_claims_copy_identity_and_role() {
        let claims = Claims::from_user(&sample_user());

        assert_eq!(claims.id, 420);
        assert_eq!(claims.email, "amongus@420.com");
        assert_eq!(claims.role(), Role::Admin);
        assert!(claims.iat <= Utc::now().timestamp());
    }

    #[test]
    fn test_claims_json_shape() {
        let claims = Claims::from_user(&sample_user());
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["role"]["name"], "ADMIN");
        assert_eq!(json["role"]["id"], 2);
        assert!(json.get("exp").is_none());
    }
}

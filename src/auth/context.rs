use super::Claims;
use uuid::Uuid;

/// Authenticated user context extracted from JWT
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID (from JWT sub claim)
    pub user_id: Uuid,

    pub email: Option<String>,

    /// Roles from the `role` claim and `app_metadata.role`
    pub roles: Vec<String>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;

        let roles = claims
            .role
            .iter()
            .chain(claims.app_metadata.as_ref().and_then(|m| m.role.as_ref()))
            .cloned()
            .collect();

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            roles,
        })
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::AppMetadata;

    fn claims(sub: &str, role: Option<&str>, app_role: Option<&str>) -> Claims {
        Claims {
            sub: sub.to_string(),
            aud: "authenticated".to_string(),
            iss: "https://example.supabase.co/auth/v1".to_string(),
            iat: 0,
            exp: 0,
            email: Some("beheer@renobouw.be".to_string()),
            role: role.map(str::to_string),
            app_metadata: Some(AppMetadata {
                role: app_role.map(str::to_string),
            }),
        }
    }

    #[test]
    fn collects_roles_from_both_claims() {
        let ctx = AuthContext::from_claims(&claims(
            "6f1c1f9e-2f43-4a8e-9a55-1f0f4b7d9c11",
            Some("authenticated"),
            Some("admin"),
        ))
        .unwrap();

        assert!(ctx.has_role("admin"));
        assert!(ctx.has_role("authenticated"));
        assert!(!ctx.has_role("service_role"));
    }

    #[test]
    fn plain_user_is_not_admin() {
        let ctx = AuthContext::from_claims(&claims(
            "6f1c1f9e-2f43-4a8e-9a55-1f0f4b7d9c11",
            Some("authenticated"),
            None,
        ))
        .unwrap();

        assert!(!ctx.has_role("admin"));
    }

    #[test]
    fn rejects_non_uuid_subject() {
        assert!(AuthContext::from_claims(&claims("anon", None, None)).is_err());
    }
}

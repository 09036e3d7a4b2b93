//! Signed admin tokens.
//!
//! The admin surface authenticates with an opaque HMAC-SHA256 signed
//! credential: `expiry.role.permissions.signature`, signed with the server
//! secret. The wizard never authenticates; only admin routes verify.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Permission required to reset a student's attempt count.
pub const PERM_MANAGE_STUDENTS: &str = "manage-students";

/// Verified claims carried by an admin token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminClaims {
    pub role: String,
    pub permissions: Vec<String>,
    pub expires_at: i64,
}

impl AdminClaims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Issues and verifies admin tokens with a shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: String,
}

impl TokenVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a token for a role with the given permissions.
    ///
    /// Role and permission names must not contain `.` (the token field
    /// separator) or `,` (the permission separator).
    pub fn issue(
        &self,
        role: &str,
        permissions: &[String],
        ttl: chrono::Duration,
    ) -> anyhow::Result<String> {
        anyhow::ensure!(!self.secret.is_empty(), "admin secret is not configured");
        anyhow::ensure!(
            !role.contains('.') && !role.is_empty(),
            "invalid role name: {role:?}"
        );
        for permission in permissions {
            anyhow::ensure!(
                !permission.contains('.') && !permission.contains(','),
                "invalid permission name: {permission:?}"
            );
        }

        let expires_at = (Utc::now() + ttl).timestamp();
        let payload = format!("{expires_at}.{role}.{}", permissions.join(","));
        let signature = self.sign(&payload);
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token, returning its claims when the signature is valid
    /// and the token has not expired.
    pub fn verify(&self, token: &str) -> Option<AdminClaims> {
        // No secret, no admin surface.
        if self.secret.is_empty() {
            return None;
        }

        let (payload, signature) = token.rsplit_once('.')?;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take any key length");
        mac.update(payload.as_bytes());
        let provided = hex::decode(signature).ok()?;
        mac.verify_slice(&provided).ok()?;

        let mut parts = payload.splitn(3, '.');
        let expires_at: i64 = parts.next()?.parse().ok()?;
        let role = parts.next()?.to_string();
        let permissions: Vec<String> = parts
            .next()?
            .split(',')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        if expires_at < Utc::now().timestamp() {
            return None;
        }

        Some(AdminClaims {
            role,
            permissions,
            expires_at,
        })
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take any key length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

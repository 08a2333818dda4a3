//! Bearer-token authentication and role checks.
//!
//! The gateway does not register users or store credentials. It only
//! validates tokens minted elsewhere (or by [`JwtAuthenticator::issue`] in
//! tests and local development) and turns them into a [`Principal`].

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Role carried by a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// Authenticated caller. Echoed back as `user` in every response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Principal {
            id: id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// `Ok(())` for admins, `Error::Forbidden(denial)` otherwise.
    pub fn require_admin(&self, denial: &str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            warn!(
                "Admin operation refused for principal {} (role {})",
                self.id, self.role
            );
            Err(Error::Forbidden(denial.to_string()))
        }
    }
}

/// Turns a bearer token into a [`Principal`].
pub trait Authenticator: Send + Sync + 'static {
    /// # Errors
    /// `Error::InvalidToken` for malformed, badly signed or expired tokens.
    fn validate(&self, token: &str) -> Result<Principal>;
}

/// Extract the token from an `Authorization` header value.
///
/// # Errors
/// - `Error::Unauthenticated` when the header is absent
/// - `Error::InvalidToken` when it does not use the `Bearer` scheme
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header.ok_or(Error::Unauthenticated)?;
    let mut parts = header.trim().splitn(2, ' ');
    match (parts.next(), parts.next().map(str::trim)) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(token)
        }
        _ => Err(Error::InvalidToken(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}

/// JWT claims understood by the gateway.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// HS256 shared-secret authenticator.
#[derive(Clone)]
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiration: Duration,
}

impl JwtAuthenticator {
    pub fn new(secret: &str, expiration: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        JwtAuthenticator {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiration,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_expiration)
    }

    /// Mint a token for `subject` valid for the configured expiration.
    pub fn issue(&self, subject: &str, role: Role) -> Result<String> {
        let iat = now_epoch_secs();
        self.sign(&Claims {
            sub: subject.to_string(),
            role,
            iat,
            exp: iat + self.expiration.as_secs(),
        })
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|e| {
            error!("Failed to sign token for {}: {}", claims.sub, e);
            Error::Internal(format!("cannot sign token: {}", e))
        })
    }
}

impl fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("algorithm", &Algorithm::HS256)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

impl Authenticator for JwtAuthenticator {
    fn validate(&self, token: &str) -> Result<Principal> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            Error::from(e)
        })?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(Error::InvalidToken("token subject is empty".to_string()));
        }

        Ok(Principal::new(claims.sub, claims.role))
    }
}

fn now_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> JwtAuthenticator {
        JwtAuthenticator::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_validate() {
        let auth = authenticator();
        let token = auth.issue("alice", Role::Admin).unwrap();

        let principal = auth.validate(&token).unwrap();
        assert_eq!(principal, Principal::new("alice", Role::Admin));
        assert!(principal.is_admin());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = authenticator();
        let now = now_epoch_secs();
        let token = auth
            .sign(&Claims {
                sub: "bob".to_string(),
                role: Role::User,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        match auth.validate(&token) {
            Err(Error::InvalidToken(msg)) => assert_eq!(msg, "token expired"),
            other => panic!("expected expired token, got {:?}", other),
        }
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let token = JwtAuthenticator::new("other-secret", Duration::from_secs(60))
            .issue("mallory", Role::Admin)
            .unwrap();

        assert!(matches!(
            authenticator().validate(&token),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_and_empty_subject_rejected() {
        let auth = authenticator();
        assert!(matches!(
            auth.validate("not.a.jwt"),
            Err(Error::InvalidToken(_))
        ));

        let token = auth.issue("  ", Role::User).unwrap();
        assert!(matches!(auth.validate(&token), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(Some("bearer  abc ")).unwrap(), "abc");
        assert!(matches!(bearer_token(None), Err(Error::Unauthenticated)));
        assert!(matches!(
            bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(Error::InvalidToken(_))
        ));
        assert!(matches!(
            bearer_token(Some("Bearer")),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn test_require_admin() {
        let user = Principal::new("u1", Role::User);
        match user.require_admin("nope") {
            Err(Error::Forbidden(msg)) => assert_eq!(msg, "nope"),
            other => panic!("expected Forbidden, got {:?}", other),
        }
        assert!(Principal::new("a1", Role::Admin).require_admin("nope").is_ok());
    }

    #[test]
    fn test_principal_serializes_lowercase_role() {
        let json = serde_json::to_value(Principal::new("u1", Role::User)).unwrap();
        assert_eq!(json, serde_json::json!({"id": "u1", "role": "user"}));
    }
}

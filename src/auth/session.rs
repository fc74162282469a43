use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Signs a session for `user_id` that expires `max_age_secs` after `now`.
///
/// Token format: base64(user_id:expiry:hmac_hex). There is no server-side
/// session table; rotating the secret logs everyone out.
pub fn generate_session_token(
    user_id: i32,
    secret: &str,
    max_age_secs: i64,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let expiry = now.timestamp() + max_age_secs;
    let payload = format!("{}:{}", user_id, expiry);
    let signature = sign(&payload, secret)?;

    Ok(URL_SAFE_NO_PAD.encode(format!("{}:{}", payload, signature)))
}

/// Returns the user id of a valid, unexpired session token.
pub fn validate_session_token(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<i32, AppError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))?;

    let mut parts = decoded.splitn(3, ':');
    let (Some(user_id), Some(expiry), Some(signature)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::Unauthorized("Invalid session".to_string()));
    };

    let user_id: i32 = user_id
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid session".to_string()))?;
    let expiry: i64 = expiry
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid session".to_string()))?;

    let expected = sign(&format!("{}:{}", user_id, expiry), secret)?;
    if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        return Err(AppError::Unauthorized("Invalid session".to_string()));
    }

    if now.timestamp() > expiry {
        return Err(AppError::Unauthorized("Session expired".to_string()));
    }

    Ok(user_id)
}

fn sign(data: &str, secret: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("HMAC initialization error: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Only same-site relative paths are allowed as post-login redirects.
pub fn is_safe_redirect(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    #[test]
    fn test_generate_and_validate_token() {
        let now = Utc::now();
        let token = generate_session_token(42, SECRET, 3600, now).unwrap();

        assert_eq!(validate_session_token(&token, SECRET, now).unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = generate_session_token(42, SECRET, 3600, now).unwrap();

        assert!(matches!(
            validate_session_token(&token, "another_secret", now),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now();
        let token = generate_session_token(42, SECRET, 60, now).unwrap();

        assert!(validate_session_token(&token, SECRET, now + Duration::seconds(59)).is_ok());
        assert!(validate_session_token(&token, SECRET, now + Duration::seconds(61)).is_err());
    }

    #[test]
    fn test_tampered_user_id_is_rejected() {
        let now = Utc::now();
        let token = generate_session_token(42, SECRET, 3600, now).unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&token).unwrap()).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(decoded.replacen("42:", "43:", 1));

        assert!(validate_session_token(&forged, SECRET, now).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let now = Utc::now();
        assert!(validate_session_token("not a token", SECRET, now).is_err());
        assert!(validate_session_token(&URL_SAFE_NO_PAD.encode("1:2"), SECRET, now).is_err());
    }

    #[test]
    fn test_safe_redirects() {
        assert!(is_safe_redirect("/"));
        assert!(is_safe_redirect("/history?mode=older"));
        assert!(!is_safe_redirect("https://evil.example"));
        assert!(!is_safe_redirect("//evil.example"));
        assert!(!is_safe_redirect("/\\evil.example"));
        assert!(!is_safe_redirect("history"));
    }
}

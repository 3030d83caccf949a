use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

fn signature(secret: &str, profile_id: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(profile_id.as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}

/// Issues a bearer token of the form `<profile_id>.<base64url hmac>`.
pub fn issue_token(secret: &str, profile_id: &str) -> Option<String> {
    let sig = signature(secret, profile_id)?;
    let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(sig);
    Some(format!("{profile_id}.{encoded}"))
}

/// Returns the profile id a token was issued for, or `None` if the token is
/// malformed or was not signed with `secret`.
pub fn verify_token(secret: &str, token: &str) -> Option<String> {
    let (profile_id, encoded) = token.rsplit_once('.')?;
    if profile_id.is_empty() {
        return None;
    }
    let sig = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(encoded)
        .ok()?;

    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(profile_id.as_bytes());
    // constant-time comparison
    mac.verify_slice(&sig).ok()?;

    Some(profile_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies() {
        let token = issue_token("s3cret", "profile-42").unwrap();
        assert!(token.starts_with("profile-42."));
        assert_eq!(verify_token("s3cret", &token).as_deref(), Some("profile-42"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token("s3cret", "profile-42").unwrap();
        assert_eq!(verify_token("other", &token), None);
    }

    #[test]
    fn test_tampered_profile_is_rejected() {
        let token = issue_token("s3cret", "profile-42").unwrap();
        let (_, sig) = token.rsplit_once('.').unwrap();
        assert_eq!(verify_token("s3cret", &format!("profile-43.{sig}")), None);
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(verify_token("s3cret", ""), None);
        assert_eq!(verify_token("s3cret", "no-dot"), None);
        assert_eq!(verify_token("s3cret", ".abc"), None);
        assert_eq!(verify_token("s3cret", "profile-42.!!!"), None);
    }
}

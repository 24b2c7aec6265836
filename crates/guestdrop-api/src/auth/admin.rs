use axum::http::{header, HeaderMap};
use guestdrop_core::AppError;
use subtle::ConstantTimeEq;

/// Constant-time comparison of two secrets.
fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Token from an `Authorization: Bearer` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Check the admin secret, preferring the bearer header over `password`.
pub fn require_admin(
    expected: &str,
    headers: &HeaderMap,
    password: Option<&str>,
) -> Result<(), AppError> {
    let presented = bearer_token(headers).or(password);

    match presented {
        Some(secret) if secure_compare(secret, expected) => Ok(()),
        Some(_) => Err(AppError::Forbidden("Wrong password".to_string())),
        None => Err(AppError::Forbidden("Admin password required".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_password_field_accepted() {
        let headers = HeaderMap::new();
        assert!(require_admin("s3cret", &headers, Some("s3cret")).is_ok());
        assert!(matches!(
            require_admin("s3cret", &headers, Some("nope")),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            require_admin("s3cret", &headers, None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_bearer_header_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer s3cret"),
        );
        assert_eq!(bearer_token(&headers), Some("s3cret"));
        assert!(require_admin("s3cret", &headers, None).is_ok());
    }

    #[test]
    fn test_secure_compare() {
        assert!(secure_compare("abc", "abc"));
        assert!(!secure_compare("abc", "abd"));
        assert!(!secure_compare("abc", "abcd"));
    }
}

use axum::http::{header::InvalidHeaderValue, HeaderMap, HeaderValue};

/// Read a single cookie value from the request headers.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all(axum::http::header::COOKIE) {
        let Ok(s) = cookie.to_str() else { continue };
        for part in s.split(';') {
            if let Some((k, v)) = part.trim().split_once('=') {
                if k == name {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

/// `Set-Cookie` value for an HttpOnly cookie scoped to `/`.
pub fn set_cookie(
    name: &str,
    value: &str,
    max_age_secs: Option<i64>,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut s = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", name, value);
    if let Some(age) = max_age_secs {
        s.push_str(&format!("; Max-Age={}", age));
    }
    if secure {
        s.push_str("; Secure");
    }
    HeaderValue::from_str(&s)
}

pub fn clear_cookie(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Path=/",
        name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cookie_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("a=1; eduleaner_session=abc.def.ghi; flash=info:hi"),
        );
        assert_eq!(
            parse_cookie(&headers, "eduleaner_session").as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(parse_cookie(&headers, "flash").as_deref(), Some("info:hi"));
        assert_eq!(parse_cookie(&headers, "missing"), None);
    }

    #[test]
    fn set_cookie_carries_attributes() {
        let v = set_cookie("s", "tok", Some(60), true).expect("valid header");
        let s = v.to_str().unwrap();
        assert!(s.starts_with("s=tok;"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Max-Age=60"));
        assert!(s.contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let v = clear_cookie("flash").expect("valid header");
        assert!(v.to_str().unwrap().contains("Max-Age=0"));
    }
}

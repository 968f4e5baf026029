//! Login form parsing (`application/x-www-form-urlencoded`).

use bucketdesk_console::LoginRequest;

/// Parse the login form body.
///
/// Missing fields come back empty; the gateway rejects them.
#[must_use]
pub fn parse_login_form(body: &[u8]) -> LoginRequest {
    let mut request = LoginRequest::default();
    for (name, value) in form_urlencoded::parse(body) {
        let slot = match name.as_ref() {
            "access" => &mut request.access_key,
            "secret" => &mut request.secret_key,
            "region" => &mut request.region,
            "bucket" => &mut request.bucket,
            _ => continue,
        };
        *slot = value.into_owned();
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_login_fields() {
        let req = parse_login_form(
            b"access=AKIDEXAMPLE&secret=wJal%2Br%2FK7&region=eu-west-1&bucket=demo",
        );
        assert_eq!(req.access_key, "AKIDEXAMPLE");
        assert_eq!(req.secret_key, "wJal+r/K7");
        assert_eq!(req.region, "eu-west-1");
        assert_eq!(req.bucket, "demo");
    }

    #[test]
    fn test_should_decode_plus_as_space() {
        let req = parse_login_form(b"bucket=my+bucket");
        assert_eq!(req.bucket, "my bucket");
    }

    #[test]
    fn test_should_leave_missing_fields_empty() {
        let req = parse_login_form(b"access=AKID&unknown=1");
        assert_eq!(req.access_key, "AKID");
        assert!(req.secret_key.is_empty());
        assert!(req.bucket.is_empty());
    }
}

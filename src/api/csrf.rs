/// CSRF token handling
///
/// The backend sets a `csrftoken` cookie and expects it echoed back in the
/// `X-CSRFToken` header on every request that can change state.
use percent_encoding::percent_decode_str;
use reqwest::Method;

/// Cookie the server issues the token in
pub const COOKIE_NAME: &str = "csrftoken";

/// Header the token is echoed in
pub const HEADER_NAME: &str = "X-CSRFToken";

/// Methods that never carry the token
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Find `name` in a `Cookie` header value (`a=1; b=2`).
///
/// The value is percent-decoded. Bytes that do not decode to UTF-8 leave
/// the raw value in place.
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| decode(value))
        })
}

fn decode(value: &str) -> String {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

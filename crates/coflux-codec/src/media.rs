//! Media type helpers.

use http::header::CONTENT_TYPE;
use http::HeaderMap;
use indexmap::IndexMap;
use mime::Mime;

/// Multi-valued string map, used for form data and cookies.
///
/// Keys keep their insertion order.
pub type MultiValueMap = IndexMap<String, Vec<String>>;

/// Returns the media type declared by `headers`.
///
/// A missing or unparsable `Content-Type` is treated as
/// `application/octet-stream`.
///
/// # Example
///
/// ```
/// use coflux_codec::media::content_type;
/// use http::HeaderMap;
///
/// let mut headers = HeaderMap::new();
/// assert_eq!(content_type(&headers), mime::APPLICATION_OCTET_STREAM);
///
/// headers.insert("content-type", "application/json".parse().unwrap());
/// assert_eq!(content_type(&headers), mime::APPLICATION_JSON);
/// ```
pub fn content_type(headers: &HeaderMap) -> Mime {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| match value.parse::<Mime>() {
            Ok(media_type) => Some(media_type),
            Err(e) => {
                tracing::debug!(content_type = value, error = %e, "unparsable content type");
                None
            }
        })
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

/// True for `application/json` and any `+json` structured syntax suffix.
pub fn is_json(media_type: &Mime) -> bool {
    (media_type.type_() == mime::APPLICATION && media_type.subtype() == mime::JSON)
        || media_type.suffix() == Some(mime::JSON)
}

/// True for `application/x-www-form-urlencoded`.
pub fn is_form(media_type: &Mime) -> bool {
    media_type.type_() == mime::APPLICATION && media_type.subtype() == mime::WWW_FORM_URLENCODED
}

/// The `charset` parameter, lower-cased.
pub fn charset(media_type: &Mime) -> Option<String> {
    media_type
        .get_param(mime::CHARSET)
        .map(|charset| charset.as_str().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_suffix() {
        let problem: Mime = "application/problem+json".parse().unwrap();
        assert!(is_json(&problem));
        assert!(is_json(&mime::APPLICATION_JSON));
        assert!(!is_json(&mime::TEXT_PLAIN));
    }

    #[test]
    fn test_form_ignores_params() {
        let form: Mime = "application/x-www-form-urlencoded; charset=utf-8".parse().unwrap();
        assert!(is_form(&form));
        assert_eq!(charset(&form).as_deref(), Some("utf-8"));
    }

    #[test]
    fn test_garbage_content_type_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "not a media type".parse().unwrap());
        assert_eq!(content_type(&headers), mime::APPLICATION_OCTET_STREAM);
    }
}

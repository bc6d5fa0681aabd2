use url::Url;

use crate::error::ApiError;

/// A URL to check: the text the client sent plus its parsed form.
///
/// Responses echo `input`; outbound calls use `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub input: String,
    pub url: Url,
}

impl From<Url> for Target {
    fn from(url: Url) -> Self {
        Self {
            input: url.to_string(),
            url,
        }
    }
}

/// Parse the user-supplied target. Anything `Url::parse` accepts is valid;
/// there is no scheme allow-list.
pub fn parse_target(raw: Option<&str>) -> Result<Target, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingUrl)?;
    let url = Url::parse(raw).map_err(|_| ApiError::InvalidUrl)?;
    Ok(Target {
        input: raw.to_string(),
        url,
    })
}

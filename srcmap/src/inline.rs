// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Source maps embedded in generated code as a `sourceMappingURL` data url.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;

use crate::Error;

lazy_static! {
    static ref SOURCE_MAPPING_URL: Regex = Regex::new(
        r"(?m)^[ \t]*/[/*][@#][ \t]+sourceMappingURL=data:([^,\s]*),(\S*?)[ \t]*(?:\*/)?[ \t\r]*$"
    )
    .unwrap();
}

/// Return the decoded JSON of the last inline source map in `text`.
///
/// Both `//# sourceMappingURL=` and the legacy `//@` form are accepted, as is the `/* */`
/// comment style used in CSS.
///
/// # Errors
///
/// If no data url comment is present, its media type is not JSON, or the payload cannot be
/// decoded.
pub fn extract(text: &str) -> Result<Vec<u8>, Error> {
    let captures = SOURCE_MAPPING_URL
        .captures_iter(text)
        .last()
        .ok_or(Error::MissingInlineMap)?;

    let header = captures.get(1).map_or("", |m| m.as_str());
    let payload = captures.get(2).map_or("", |m| m.as_str());

    let mut parts = header.split(';');
    let media_type = parts.next().unwrap_or_default();

    if !(media_type.is_empty() || media_type.ends_with("json")) {
        return Err(Error::InvalidDataUrl(header.to_owned()));
    }

    if parts.any(|param| param.eq_ignore_ascii_case("base64")) {
        Ok(STANDARD.decode(payload)?)
    } else {
        Ok(url_escape::decode(payload).into_owned().into_bytes())
    }
}

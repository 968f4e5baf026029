//! Multipart form data parser for the upload form.
//!
//! Works on the already-collected body bytes. Only file parts are kept; the
//! console reads the `file` part and has no text fields.

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::HttpError;

/// One file part of a multipart submission.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Name supplied by the browser (may be empty when no file was chosen).
    pub filename: String,
    /// Declared content type of the part.
    pub content_type: Option<String>,
    /// Part contents.
    pub data: Bytes,
}

/// A parsed multipart form-data submission.
#[derive(Debug, Default)]
pub struct MultipartForm {
    /// File parts keyed by field name.
    pub files: HashMap<String, FilePart>,
}

impl MultipartForm {
    /// Take the file part submitted under `field`.
    pub fn take_file(&mut self, field: &str) -> Option<FilePart> {
        self.files.remove(field)
    }
}

/// Extract the boundary from a `multipart/form-data` content type.
///
/// # Errors
///
/// Returns an error if the content type is not `multipart/form-data` or has
/// no boundary parameter.
pub fn extract_boundary(content_type: &str) -> Result<String, HttpError> {
    let parsed: mime::Mime = content_type
        .parse()
        .map_err(|_| HttpError::InvalidMultipart(format!("bad content type: {content_type}")))?;

    if parsed.type_() != mime::MULTIPART || parsed.subtype() != mime::FORM_DATA {
        return Err(HttpError::InvalidMultipart(format!(
            "expected multipart/form-data, got: {content_type}"
        )));
    }

    match parsed.get_param(mime::BOUNDARY) {
        Some(b) if !b.as_str().is_empty() => Ok(b.as_str().to_owned()),
        _ => Err(HttpError::InvalidMultipart(
            "missing boundary in Content-Type".to_owned(),
        )),
    }
}

/// Parse the file parts of a multipart/form-data body.
///
/// A part counts as a file when its disposition carries a `filename`
/// parameter, even an empty one. Other parts are skipped.
///
/// # Errors
///
/// Returns an error if the body contains no boundary delimiter.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<MultipartForm, HttpError> {
    let delimiter = format!("--{boundary}");
    let end_delimiter = format!("--{boundary}--");

    if find_bytes(body, delimiter.as_bytes()).is_none() {
        return Err(HttpError::InvalidMultipart(
            "body does not contain the boundary".to_owned(),
        ));
    }

    let mut form = MultipartForm::default();
    for part in split_parts(body, delimiter.as_bytes(), end_delimiter.as_bytes()) {
        let Some((headers, data)) = split_headers_body(part) else {
            continue;
        };
        let headers = String::from_utf8_lossy(headers);
        let Some(disposition) = content_disposition(&headers) else {
            continue;
        };
        let (Some(name), Some(filename)) = (
            disposition_param(disposition, "name"),
            disposition_param(disposition, "filename"),
        ) else {
            continue;
        };
        form.files.insert(
            name,
            FilePart {
                filename,
                content_type: part_content_type(&headers),
                data: Bytes::copy_from_slice(data),
            },
        );
    }
    Ok(form)
}

fn split_parts<'a>(body: &'a [u8], delimiter: &[u8], end_delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let Some(first) = find_bytes(body, delimiter) else {
        return parts;
    };
    let mut remaining = skip_crlf(&body[first + delimiter.len()..]);

    loop {
        if remaining.starts_with(b"--")
            || remaining
                .strip_prefix(b"\r\n")
                .is_some_and(|r| r.starts_with(end_delimiter))
        {
            break;
        }
        if let Some(pos) = find_bytes(remaining, delimiter) {
            parts.push(strip_trailing_crlf(&remaining[..pos]));
            remaining = skip_crlf(&remaining[pos + delimiter.len()..]);
        } else {
            let part = strip_trailing_crlf(remaining);
            if !part.is_empty() {
                parts.push(part);
            }
            break;
        }
    }
    parts
}

fn split_headers_body(part: &[u8]) -> Option<(&[u8], &[u8])> {
    let separator = b"\r\n\r\n";
    find_bytes(part, separator).map(|pos| (&part[..pos], &part[pos + separator.len()..]))
}

/// The parameter list of the `Content-Disposition` header.
fn content_disposition(headers: &str) -> Option<&str> {
    headers.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-disposition")
            .then_some(value)
    })
}

fn part_content_type(headers: &str) -> Option<String> {
    headers.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        let value = value.trim();
        (name.trim().eq_ignore_ascii_case("content-type") && !value.is_empty())
            .then(|| value.to_owned())
    })
}

/// Read one `;`-separated parameter of a disposition value.
///
/// Parameters are matched by exact name, so `name` never matches `filename`.
/// Quoted values may contain `;`.
fn disposition_param(disposition: &str, param: &str) -> Option<String> {
    let mut rest = disposition;
    while let Some(pos) = rest.find(';') {
        rest = rest[pos + 1..].trim_start();
        let Some((key, value)) = rest.split_once('=') else {
            continue;
        };
        let value = value.trim_start();
        let (parsed, tail) = if let Some(quoted) = value.strip_prefix('"') {
            let end = quoted.find('"').unwrap_or(quoted.len());
            (&quoted[..end], quoted.get(end + 1..).unwrap_or(""))
        } else {
            let end = value.find(';').unwrap_or(value.len());
            (value[..end].trim_end(), &value[end..])
        };
        if key.trim().eq_ignore_ascii_case(param) {
            return Some(parsed.to_owned());
        }
        rest = tail;
    }
    None
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn skip_crlf(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\r\n").unwrap_or(data)
}

fn strip_trailing_crlf(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r\n").unwrap_or(data)
}

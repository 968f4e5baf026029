//! HTML pages for console views.
//!
//! Pages are plain server-rendered HTML. Every interpolated value is escaped,
//! and object keys placed in links are percent-encoded segment by segment so
//! the router can decode them back.

use std::fmt::Write as _;

use bucketdesk_console::{Flash, HistoryView, IndexView, View};
use bucketdesk_storage::VersioningState;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters escaped inside link paths (`/` separates key segments and is kept).
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters escaped in a single path segment.
const SEGMENT_ENCODE_SET: &AsciiSet = &PATH_ENCODE_SET.add(b'/');

const STYLE: &str = "\
body{font-family:'Segoe UI',Tahoma,Geneva,Verdana,sans-serif;margin:40px;background:#eef2f7}\
.container{max-width:860px;margin:auto;background:#fff;padding:30px;border-radius:12px;box-shadow:0 4px 20px rgba(0,0,0,.08)}\
h2{color:#2c3e50;border-bottom:2px solid #3498db;padding-bottom:10px}\
.flash{padding:10px 14px;border-radius:6px;margin-bottom:10px}\
.flash-success{background:#e8f8ef;color:#1e8449}\
.flash-error{background:#fdecea;color:#c0392b}\
.panel{background:#f8f9fa;padding:20px;border-radius:8px;margin-bottom:24px;border:1px dashed #cbd5e0}\
.item{display:flex;justify-content:space-between;align-items:center;padding:12px;border-bottom:1px solid #edf2f7}\
.btn{padding:6px 12px;border-radius:6px;text-decoration:none;font-weight:600;border:none;cursor:pointer;color:#fff}\
.btn-primary{background:#3498db}.btn-download{background:#2ecc71}.btn-history{background:#8e44ad}.btn-delete{background:#e74c3c}\
.muted{color:#7f8c8d;font-size:.9em}\
label{display:block;margin-top:10px}input[type=text],input[type=password]{width:100%;padding:8px;box-sizing:border-box}\
table{width:100%;border-collapse:collapse}td,th{padding:8px;border-bottom:1px solid #edf2f7;text-align:left}";

/// Render a console view with the flashes pending for the session.
#[must_use]
pub fn render_view(view: &View, flashes: &[Flash]) -> String {
    match view {
        View::Login => login_page(flashes),
        View::Index(index) => index_page(index, flashes),
        View::History(history) => history_page(history, flashes),
    }
}

/// A minimal page for HTTP-level errors (404, 405, 413).
#[must_use]
pub fn error_page(status: http::StatusCode, detail: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<h2>{} {}</h2><p>{}</p><p><a href=\"/\">Back to bucket</a></p>",
        status.as_u16(),
        escape_html(title),
        escape_html(detail)
    );
    layout(title, &[], &body)
}

fn login_page(flashes: &[Flash]) -> String {
    let body = "<h2>BucketDesk Login</h2>\
        <form action=\"/login\" method=\"post\" class=\"panel\">\
        <label>Access key<input type=\"text\" name=\"access\" autocomplete=\"off\" required></label>\
        <label>Secret key<input type=\"password\" name=\"secret\" autocomplete=\"off\" required></label>\
        <label>Region<input type=\"text\" name=\"region\" placeholder=\"us-east-1\" required></label>\
        <label>Bucket<input type=\"text\" name=\"bucket\" required></label>\
        <p><button type=\"submit\" class=\"btn btn-primary\">Connect</button></p>\
        </form>";
    layout("Login", flashes, body)
}

fn index_page(view: &IndexView, flashes: &[Flash]) -> String {
    let mut body = String::with_capacity(2048);
    let _ = write!(
        body,
        "<h2>Bucket: {} <span class=\"muted\">({})</span></h2>",
        escape_html(&view.bucket),
        escape_html(view.region.as_str())
    );

    let toggle_label = if view.versioning == VersioningState::Enabled {
        "Suspend versioning"
    } else {
        "Enable versioning"
    };
    let _ = write!(
        body,
        "<div class=\"panel\"><p>Versioning: <strong>{}</strong> \
         <a class=\"btn btn-primary\" href=\"/toggle_versioning\">{toggle_label}</a> \
         <a class=\"btn btn-delete\" href=\"/logout\">Logout</a></p>\
         <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" required> \
         <button type=\"submit\" class=\"btn btn-primary\">Upload</button></form></div>",
        view.versioning
    );

    if !view.listing.folders.is_empty() {
        let folders: Vec<String> = view.listing.folders.iter().map(|f| escape_html(f)).collect();
        let _ = write!(
            body,
            "<p class=\"muted\">Folders: {}</p>",
            folders.join(", ")
        );
    }

    body.push_str("<div class=\"files\">");
    for key in &view.listing.files {
        let path = encode_key_path(key);
        let _ = write!(
            body,
            "<div class=\"item\"><span>{name}</span><div>\
             <a class=\"btn btn-download\" href=\"/download/{path}\">Download</a> \
             <a class=\"btn btn-history\" href=\"/history/{path}\">History</a> \
             <a class=\"btn btn-delete\" href=\"/delete/{path}\" \
             onclick=\"return confirm('Delete this file?')\">Delete</a>\
             </div></div>",
            name = escape_html(key),
        );
    }
    if view.listing.is_empty() {
        body.push_str("<p class=\"muted\">No files found in this bucket.</p>");
    }
    body.push_str("</div>");

    layout(&view.bucket, flashes, &body)
}

fn history_page(view: &HistoryView, flashes: &[Flash]) -> String {
    let mut body = String::with_capacity(1024);
    let _ = write!(
        body,
        "<h2>History: {}</h2><p><a href=\"/\">Back to bucket</a></p>",
        escape_html(&view.key)
    );

    if view.versions.is_empty() {
        body.push_str("<p class=\"muted\">No versions found.</p>");
        return layout(&view.key, flashes, &body);
    }

    body.push_str(
        "<table><tr><th>Version</th><th>Last modified</th><th>Size</th><th></th></tr>",
    );
    let key_path = encode_key_path(&view.key);
    for version in &view.versions {
        let latest = if version.is_latest {
            " <strong>(latest)</strong>"
        } else {
            ""
        };
        let _ = write!(
            body,
            "<tr><td>{id}{latest}</td><td>{modified}</td><td>{size:.2} KB</td>\
             <td><a class=\"btn btn-download\" href=\"/download_version/{key_path}/{vid}\">Download</a></td></tr>",
            id = escape_html(&version.version_id),
            modified = version.last_modified.format("%Y-%m-%d %H:%M:%S UTC"),
            size = version.size_kb,
            vid = utf8_percent_encode(&version.version_id, SEGMENT_ENCODE_SET),
        );
    }
    body.push_str("</table>");

    layout(&view.key, flashes, &body)
}

fn layout(title: &str, flashes: &[Flash], body: &str) -> String {
    let mut html = String::with_capacity(body.len() + STYLE.len() + 512);
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{} - BucketDesk</title>\
         <style>{STYLE}</style></head><body><div class=\"container\">",
        escape_html(title)
    );
    for flash in flashes {
        let _ = write!(
            html,
            "<div class=\"flash flash-{}\">{}</div>",
            flash.level.as_str(),
            escape_html(&flash.message)
        );
    }
    html.push_str(body);
    html.push_str("</div></body></html>");
    html
}

/// Percent-encode an object key for use in a link path, keeping `/`.
#[must_use]
pub fn encode_key_path(key: &str) -> String {
    utf8_percent_encode(key, PATH_ENCODE_SET).to_string()
}

/// Escape text for HTML element content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use bucketdesk_console::FlashLevel;
    use bucketdesk_core::AwsRegion;
    use bucketdesk_storage::{ObjectListing, VersionRecord};
    use chrono::{TimeZone, Utc};

    use super::*;

    fn index(files: &[&str], versioning: VersioningState) -> IndexView {
        IndexView {
            bucket: "demo".to_owned(),
            region: AwsRegion::new("eu-west-1"),
            listing: ObjectListing::from_keys("", files.iter().copied()),
            versioning,
        }
    }

    #[test]
    fn test_should_escape_html_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_should_encode_key_path_keeping_slashes() {
        assert_eq!(
            encode_key_path("others/My Notes+1.txt"),
            "others/My%20Notes%2B1.txt"
        );
    }

    #[test]
    fn test_should_render_login_form_with_flashes() {
        let flashes = vec![Flash {
            level: FlashLevel::Error,
            message: "Region Error: Bucket is in eu-west-1, not us-east-1".to_owned(),
        }];
        let html = render_view(&View::Login, &flashes);
        assert!(html.contains("action=\"/login\""));
        assert!(html.contains("name=\"secret\""));
        assert!(html.contains("flash-error"));
        assert!(html.contains("Region Error: Bucket is in eu-west-1, not us-east-1"));
    }

    #[test]
    fn test_should_render_listing_links() {
        let html = render_view(
            &View::Index(index(&["images/a b.png"], VersioningState::Disabled)),
            &[],
        );
        assert!(html.contains("href=\"/download/images/a%20b.png\""));
        assert!(html.contains("href=\"/history/images/a%20b.png\""));
        assert!(html.contains("href=\"/delete/images/a%20b.png\""));
        assert!(html.contains("Versioning: <strong>Disabled</strong>"));
        assert!(html.contains("Enable versioning"));
        assert!(html.contains("Folders: images/"));
    }

    #[test]
    fn test_should_render_empty_listing_notice() {
        let html = render_view(&View::Index(index(&[], VersioningState::Unknown)), &[]);
        assert!(html.contains("No files found in this bucket."));
        assert!(html.contains("<strong>Unknown</strong>"));
    }

    #[test]
    fn test_should_escape_object_keys_in_listing() {
        let html = render_view(
            &View::Index(index(&["others/<script>.txt"], VersioningState::Enabled)),
            &[],
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Suspend versioning"));
    }

    #[test]
    fn test_should_render_version_history() {
        let view = HistoryView {
            key: "pdf/a.pdf".to_owned(),
            versions: vec![VersionRecord {
                version_id: "v/1".to_owned(),
                last_modified: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                size_kb: 2.5,
                is_latest: true,
            }],
        };
        let html = render_view(&View::History(view), &[]);
        assert!(html.contains("href=\"/download_version/pdf/a.pdf/v%2F1\""));
        assert!(html.contains("2024-05-01 12:00:00 UTC"));
        assert!(html.contains("2.50 KB"));
        assert!(html.contains("(latest)"));
    }

    #[test]
    fn test_should_render_empty_history() {
        let view = HistoryView {
            key: "ghost.txt".to_owned(),
            versions: Vec::new(),
        };
        assert!(render_view(&View::History(view), &[]).contains("No versions found."));
    }

    #[test]
    fn test_should_render_error_page() {
        let html = error_page(http::StatusCode::NOT_FOUND, "no route for /x");
        assert!(html.contains("404 Not Found"));
        assert!(html.contains("no route for /x"));
    }
}

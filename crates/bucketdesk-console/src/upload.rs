//! Upload routing.
//!
//! Uploaded files are filed under a folder chosen by extension:
//!
//! | Extension (any case) | Folder |
//! |----------------------|--------|
//! | `.jpg`, `.jpeg`, `.png` | `images/` |
//! | `.pdf` | `pdf/` |
//! | anything else | `others/` |

/// Content type recorded when the browser does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const ROUTES: &[(&[&str], &str)] = &[
    (&[".jpg", ".jpeg", ".png"], "images/"),
    (&[".pdf"], "pdf/"),
];

const FALLBACK_FOLDER: &str = "others/";

/// The routing folder for `filename`.
///
/// # Examples
///
/// ```
/// use bucketdesk_console::upload_folder;
///
/// assert_eq!(upload_folder("photo.PNG"), "images/");
/// assert_eq!(upload_folder("report.pdf"), "pdf/");
/// assert_eq!(upload_folder("notes"), "others/");
/// ```
#[must_use]
pub fn upload_folder(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    ROUTES
        .iter()
        .find(|(suffixes, _)| suffixes.iter().any(|s| lower.ends_with(s)))
        .map_or(FALLBACK_FOLDER, |(_, folder)| *folder)
}

/// The object key an upload named `filename` is stored under.
///
/// Browser-supplied directory parts are dropped; the remaining name keeps its
/// original case. Returns `None` when no name is left.
#[must_use]
pub fn upload_key(filename: &str) -> Option<String> {
    let name = base_name(filename);
    if name.is_empty() {
        return None;
    }
    Some(format!("{}{name}", upload_folder(name)))
}

fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_route_images() {
        for name in ["a.jpg", "a.JPEG", "photo.PNG", "x.Png"] {
            assert_eq!(upload_folder(name), "images/", "{name}");
        }
    }

    #[test]
    fn test_should_route_pdfs() {
        assert_eq!(upload_folder("Report.PDF"), "pdf/");
    }

    #[test]
    fn test_should_route_everything_else_to_others() {
        for name in ["notes.txt", "archive.tar.gz", "png", "photo.png.bak", ""] {
            assert_eq!(upload_folder(name), "others/", "{name}");
        }
    }

    #[test]
    fn test_should_keep_original_case_in_key() {
        assert_eq!(upload_key("photo.PNG").as_deref(), Some("images/photo.PNG"));
    }

    #[test]
    fn test_should_strip_browser_paths() {
        assert_eq!(
            upload_key(r"C:\Users\me\scan.pdf").as_deref(),
            Some("pdf/scan.pdf")
        );
        assert_eq!(upload_key("dir/sub/a.txt").as_deref(), Some("others/a.txt"));
    }

    #[test]
    fn test_should_reject_empty_names() {
        assert_eq!(upload_key(""), None);
        assert_eq!(upload_key("dir/"), None);
        assert_eq!(upload_key("   "), None);
    }
}

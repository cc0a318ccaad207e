// crates/ckan-assets/src/filename.rs

use percent_encoding::percent_decode_str;
use reqwest::Url;
use uuid::Uuid;

/// Derive a Distribution filename from its content URL and declared format.
///
/// The stem is the URL's percent-decoded last path segment, or a fresh UUID
/// when the URL cannot be parsed, has no segment, or the segment does not
/// decode to UTF-8. `.{format}` is appended unless the
/// stem already ends with it (case-insensitive). With no format the result
/// is a bare UUID.
pub fn derive_filename(url: &str, format: Option<&str>) -> String {
    let format = format
        .map(|f| f.trim().trim_start_matches('.'))
        .filter(|f| !f.is_empty());

    let Some(format) = format else {
        return Uuid::new_v4().to_string();
    };

    match last_segment(url) {
        Some(stem) => {
            let suffix = format!(".{}", format.to_lowercase());
            if stem.to_lowercase().ends_with(&suffix) {
                stem
            } else {
                format!("{}.{}", stem, format)
            }
        }
        None => {
            tracing::debug!("No filename in URL '{}', using a generated stem", url);
            format!("{}.{}", Uuid::new_v4(), format)
        }
    }
}

fn last_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let segment = parsed.path_segments()?.last()?;
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    if decoded.is_empty() {
        None
    } else {
        Some(decoded.into_owned())
    }
}

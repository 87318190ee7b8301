const MIME_PREFIXES: [&str; 4] = ["application/", "audio/", "image/", "video/"];

/// Derive a bare file extension from a content type label.
///
/// Labels produced by [`classify`](crate::classify) are already bare, but
/// labels may also come from MIME-aware sources (e.g. `application/pdf`).
/// The MIME type prefix is stripped along with any literal dot. An empty
/// result means "no extension can be derived".
///
/// ```
/// use refile_sniff::extension_for;
///
/// assert_eq!(extension_for("pdf"), "pdf");
/// assert_eq!(extension_for("application/pdf"), "pdf");
/// assert_eq!(extension_for("image/.png"), "png");
/// assert_eq!(extension_for(""), "");
/// ```
#[must_use]
pub fn extension_for(label: &str) -> String {
    let trimmed = label.trim();
    let bare = MIME_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    bare.replace('.', "")
}

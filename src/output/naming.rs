//! Output file naming.

use sha2::{Digest, Sha256};

/// Hex digits of the content hash used in file names.
pub const HASH_LENGTH: usize = 20;

/// Content hash for naming emitted files: truncated SHA-256, lowercase hex.
pub fn content_hash(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(HASH_LENGTH);
    digest
}

/// Values substituted into a filename pattern.
#[derive(Debug, Clone, Default)]
pub struct NameParts<'a> {
    pub name: &'a str,
    pub ext: &'a str,
    pub hash: &'a str,
}

/// Render a pattern with `[name]`, `[ext]` and `[hash]` placeholders.
pub fn render_filename(pattern: &str, parts: &NameParts<'_>) -> String {
    pattern
        .replace("[name]", parts.name)
        .replace("[ext]", parts.ext)
        .replace("[hash]", parts.hash)
}

/// Split an asset path into file stem and extension, ignoring any query
/// suffix such as `?v=4.7.0`.
pub fn split_asset_path(path: &str) -> (&str, &str) {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);

    match file.rfind('.') {
        Some(0) | None => (file, ""),
        Some(dot) => (&file[..dot], &file[dot + 1..]),
    }
}

/// MIME type for an asset extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "woff" => "application/font-woff",
        "woff2" => "font/woff2",
        "ttf" => "application/octet-stream",
        "eot" => "application/vnd.ms-fontobject",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_stable() {
        let a = content_hash(b"same bytes");
        let b = content_hash(b"same bytes");
        let c = content_hash(b"other bytes");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), HASH_LENGTH);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_render_filename() {
        let parts = NameParts {
            name: "app",
            ext: "js",
            hash: "abc123",
        };
        assert_eq!(render_filename("[name].js", &parts), "app.js");
        assert_eq!(render_filename("[hash].[ext]", &parts), "abc123.js");
        assert_eq!(render_filename("static/[name]-[hash].[ext]", &parts), "static/app-abc123.js");
        assert_eq!(render_filename("style.css", &parts), "style.css");
    }

    #[test]
    fn test_split_asset_path() {
        assert_eq!(split_asset_path("fonts/icons.woff?v=4.7.0"), ("icons", "woff"));
        assert_eq!(split_asset_path("/abs/img/photo.min.jpeg"), ("photo.min", "jpeg"));
        assert_eq!(split_asset_path("LICENSE"), ("LICENSE", ""));
        assert_eq!(split_asset_path("dir/.hidden"), (".hidden", ""));
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("SVG"), "image/svg+xml");
        assert_eq!(mime_for_extension("jpg"), "image/jpeg");
        assert_eq!(mime_for_extension("bin"), "application/octet-stream");
    }
}

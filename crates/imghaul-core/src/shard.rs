//! URL normalization and deterministic sharded path derivation.
//!
//! Two URLs that normalize to the same canonical string map to the same
//! target path. This is the dedup mechanism of the whole system: identical
//! images referenced under cosmetically different URLs are fetched and
//! stored once.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::NormalizeError;

/// Canonicalize a raw URL string.
///
/// Lowercases scheme and host, strips default ports, and canonicalizes
/// path escaping (all delegated to the `url` parser). Only http and https
/// URLs are accepted; anything else is rejected here, before any network
/// access is attempted.
pub fn normalize_url(raw: &str) -> Result<String, NormalizeError> {
    let parsed = Url::parse(raw.trim()).map_err(|source| NormalizeError::Parse {
        url: raw.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        scheme => Err(NormalizeError::Scheme {
            url: raw.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

/// Map a normalized URL to its sharded on-disk path.
///
/// The filename is the first 6 bytes of the BLAKE3 hash of the URL in hex;
/// the first two hex byte pairs are reused as two directory levels, so no
/// directory accumulates more than ~65536 average siblings at scale.
/// Pure and deterministic; never fails.
pub fn url_to_path(normalized_url: &str, root: &Path) -> PathBuf {
    let hash = blake3::hash(normalized_url.as_bytes());
    let hex = hash.to_hex();
    let hex = hex.as_str();
    root.join(&hex[0..2])
        .join(&hex[2..4])
        .join(format!("{}.jpg", &hex[0..12]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_scheme_and_host() {
        let url = normalize_url("HTTP://Example.com/x").unwrap();
        assert_eq!(url, "http://example.com/x");
    }

    #[test]
    fn test_normalize_strips_default_port() {
        let url = normalize_url("http://example.com:80/x").unwrap();
        assert_eq!(url, "http://example.com/x");
        let url = normalize_url("https://example.com:443/x").unwrap();
        assert_eq!(url, "https://example.com/x");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_url("not a url").is_err());
        assert!(normalize_url("").is_err());
    }

    #[test]
    fn test_normalize_rejects_non_http_scheme() {
        let err = normalize_url("ftp://example.com/x").unwrap_err();
        assert!(matches!(err, NormalizeError::Scheme { .. }));
    }

    #[test]
    fn test_path_is_deterministic() {
        let root = Path::new("/out");
        let a = url_to_path("http://example.com/x", root);
        let b = url_to_path("http://example.com/x", root);
        assert_eq!(a, b);
    }

    #[test]
    fn test_dedup_by_normalization() {
        let root = Path::new("/out");
        let a = url_to_path(&normalize_url("HTTP://Example.com/x").unwrap(), root);
        let b = url_to_path(&normalize_url("http://example.com/x").unwrap(), root);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_urls_get_distinct_paths() {
        let root = Path::new("/out");
        let a = url_to_path("http://example.com/x", root);
        let b = url_to_path("http://example.com/y", root);
        assert_ne!(a, b);
    }

    #[test]
    fn test_shard_layout() {
        let path = url_to_path("http://example.com/x", Path::new("/out"));
        let parts: Vec<_> = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        // /out / aa / bb / aabbcccccccc.jpg
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[2].len(), 2);
        assert_eq!(parts[3].len(), 2);
        let name = &parts[4];
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), 12 + 4);
        assert!(name.starts_with(&parts[2]));
        assert_eq!(&name[2..4], parts[3].as_str());
    }
}

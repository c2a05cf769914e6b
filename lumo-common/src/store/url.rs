//! Reference URL vocabulary
//!
//! Every image/file-bearing field in the shop database holds one of four
//! value shapes; classification happens before any identifier extraction so
//! that inline payloads and foreign URLs are never mistaken for store
//! references.
//!
//! Canonical delivery URL shape:
//! `{base}/{space}/media/upload/v{millis}/{remote_id}.{ext}`
//!
//! Identifier extraction recognizes exactly this shape. Assets served through
//! any other template (a CDN alias, for instance) fail extraction and are
//! treated as unreferenced by the liveness scan, a known limit inherited from
//! the reconciliation design.

/// Path marker that separates the fixed URL prefix from the versioned part.
pub const UPLOAD_MARKER: &str = "/media/upload/";

/// Classification of one stored reference value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Canonical remote-store delivery URL
    RemoteStore,
    /// Legacy local path under the shop's public directory
    LocalPath,
    /// Inline-encoded payload (`data:` URI)
    InlinePayload,
    /// Some other absolute URL (foreign host or unrecognized template)
    ExternalUrl,
}

/// Classify a stored reference value. Schemes match case-insensitively; the
/// path part does not.
pub fn classify_reference(value: &str) -> RefKind {
    if starts_with_scheme(value, "data:") {
        return RefKind::InlinePayload;
    }
    if starts_with_scheme(value, "http://") || starts_with_scheme(value, "https://") {
        if value.contains(UPLOAD_MARKER) {
            return RefKind::RemoteStore;
        }
        return RefKind::ExternalUrl;
    }
    RefKind::LocalPath
}

// RFC 3986: scheme names are case-insensitive.
fn starts_with_scheme(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
}

/// Extract the remote id from a canonical delivery URL.
///
/// Strips everything through the upload marker, skips an optional
/// `v<digits>/` version token, drops any query/fragment, and removes the
/// final extension. Returns `None` for any URL that does not match; the
/// caller treats that asset as unreferenced rather than failing the run.
pub fn extract_remote_id(url: &str) -> Option<String> {
    let idx = url.find(UPLOAD_MARKER)?;
    let mut rest = &url[idx + UPLOAD_MARKER.len()..];

    // Optional version token: v<digits>/
    if let Some(stripped) = rest.strip_prefix('v') {
        if let Some(slash) = stripped.find('/') {
            if slash > 0 && stripped[..slash].bytes().all(|b| b.is_ascii_digit()) {
                rest = &stripped[slash + 1..];
            }
        }
    }

    // Query string / fragment are not part of the id
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    if rest.is_empty() {
        return None;
    }

    // Drop the final extension, but only within the last path segment
    let id = match rest.rfind('.') {
        Some(dot) if dot > rest.rfind('/').map_or(0, |s| s + 1) => &rest[..dot],
        _ => rest,
    };

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Assemble the canonical delivery URL for an uploaded asset.
pub fn canonical_url(base_url: &str, space: &str, version_millis: i64, remote_id: &str, format: &str) -> String {
    format!(
        "{}/{}{}v{}/{}.{}",
        base_url.trim_end_matches('/'),
        space,
        UPLOAD_MARKER,
        version_millis,
        remote_id,
        format
    )
}

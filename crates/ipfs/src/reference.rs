/// Canonical public gateway used for display urls and as the last resort
/// for content a private gateway refuses to serve.
pub const PUBLIC_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Path segment marking the content identifier in a gateway url.
const IPFS_PATH_SEGMENT: &str = "/ipfs/";
/// Scheme prefix of content addressed uris.
const IPFS_SCHEME: &str = "ipfs://";

/// A classified content reference.
///
/// Classification never fails: anything without a recognizable content
/// identifier degrades to [`Reference::Direct`] and is fetched as is.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reference {
    /// Content addressed by identifier, servable by any gateway. May
    /// carry a path suffix ("Qm…/metadata.json").
    Cid(String),
    /// A self sufficient url with no extractable identifier, leaving no
    /// alternate access point to substitute when it fails.
    Direct(String),
}

impl Reference {
    pub fn parse(raw: &str) -> Self {
        if let Some((_, cid)) = raw.split_once(IPFS_PATH_SEGMENT) {
            if !cid.is_empty() {
                return Self::Cid(cid.to_string());
            }
        }
        if let Some(cid) = raw.strip_prefix(IPFS_SCHEME) {
            if !cid.is_empty() {
                return Self::Cid(cid.to_string());
            }
        }
        Self::Direct(raw.to_string())
    }

    /// The extracted content identifier, if any.
    pub fn cid(&self) -> Option<&str> {
        match self {
            Self::Cid(cid) => Some(cid),
            Self::Direct(_) => None,
        }
    }
}

/// Best effort, purely syntactic transform of a reference into a url a
/// browser can display. Never fails and is idempotent on its own output.
pub fn accessible_url(reference: &str) -> String {
    if reference.is_empty()
        || reference.starts_with("http://")
        || reference.starts_with("https://")
    {
        return reference.to_string();
    }
    if let Some(cid) = reference.strip_prefix(IPFS_SCHEME) {
        return format!("{PUBLIC_GATEWAY}{cid}");
    }
    if looks_like_cid(reference) {
        return format!("{PUBLIC_GATEWAY}{reference}");
    }
    reference.to_string()
}

/// Matches the identifier prefixes of CIDv0 ("Qm…") and the common
/// base32 encoding of CIDv1 ("bafy…").
fn looks_like_cid(reference: &str) -> bool {
    reference.starts_with("Qm") || reference.starts_with("bafy")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cid_after_path_segment() {
        assert_eq!(
            Reference::parse("https://gateway.pinata.cloud/ipfs/Qm111"),
            Reference::Cid("Qm111".to_string())
        );
        assert_eq!(
            Reference::parse("https://dweb.link/ipfs/Qm111/metadata.json"),
            Reference::Cid("Qm111/metadata.json".to_string())
        );
    }

    #[test]
    fn strips_scheme_prefix() {
        assert_eq!(
            Reference::parse("ipfs://Qm111"),
            Reference::Cid("Qm111".to_string())
        );
    }

    #[test]
    fn everything_else_is_direct() {
        for raw in [
            "https://host/2.json",
            "QmBareHashWithoutScheme",
            "not a url at all",
            "ipfs://",
        ] {
            assert_eq!(Reference::parse(raw), Reference::Direct(raw.to_string()));
        }
    }

    #[test]
    fn accessible_url_rules() {
        // Complete urls pass through untouched.
        assert_eq!(
            accessible_url("https://host/img2.png"),
            "https://host/img2.png"
        );
        assert_eq!(
            accessible_url("http://host/img2.png"),
            "http://host/img2.png"
        );
        // Content addressed uris move onto the public gateway.
        assert_eq!(
            accessible_url("ipfs://Qm_img"),
            "https://ipfs.io/ipfs/Qm_img"
        );
        // So do bare identifiers.
        assert_eq!(accessible_url("Qm_img"), "https://ipfs.io/ipfs/Qm_img");
        assert_eq!(
            accessible_url("bafybeigdyrzt5sfp7udm7hu76uh7y26nf"),
            "https://ipfs.io/ipfs/bafybeigdyrzt5sfp7udm7hu76uh7y26nf"
        );
        // Anything else is left alone.
        assert_eq!(accessible_url(""), "");
        assert_eq!(accessible_url("data:image/png;base64,xyz"), "data:image/png;base64,xyz");
    }

    #[test]
    fn accessible_url_is_idempotent() {
        for reference in ["https://host/img2.png", "ipfs://Qm_img", "Qm_img", ""] {
            let once = accessible_url(reference);
            assert_eq!(accessible_url(&once), once);
        }
    }
}

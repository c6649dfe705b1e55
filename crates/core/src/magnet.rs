//! Magnet URI construction from an info-hash and a display name.

/// Public trackers appended to every built magnet link.
pub const PUBLIC_TRACKERS: &[&str] = &[
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://open.stealth.si:80/announce",
    "udp://tracker.torrent.eu.org:451/announce",
    "udp://tracker.bittor.pw:1337/announce",
    "udp://public.popcorn-tracker.org:6969/announce",
    "udp://tracker.dler.org:6969/announce",
    "udp://exodus.desync.com:6969",
    "udp://open.demonii.com:1337/announce",
];

/// Whether `hash` is a v1 info-hash: exactly 40 hex characters.
pub fn is_valid_info_hash(hash: &str) -> bool {
    hash.len() == 40 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Whether `uri` already is a usable magnet link.
pub fn is_magnet_uri(uri: &str) -> bool {
    uri.starts_with("magnet:?") && uri.contains("xt=")
}

/// Build `magnet:?xt=urn:btih:<hash>&dn=<title>&tr=...`.
///
/// The hash keeps the caller's casing. Returns `None` for a missing or
/// malformed hash; an empty title omits `dn`.
pub fn build_magnet_link(info_hash: &str, title: &str) -> Option<String> {
    let hash = info_hash.trim();
    if !is_valid_info_hash(hash) {
        return None;
    }

    let mut uri = format!("magnet:?xt=urn:btih:{}", hash);

    if !title.is_empty() {
        uri.push_str("&dn=");
        uri.push_str(&urlencoding::encode(title));
    }

    for tracker in PUBLIC_TRACKERS {
        uri.push_str("&tr=");
        uri.push_str(&urlencoding::encode(tracker));
    }

    Some(uri)
}

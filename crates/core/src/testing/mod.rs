//! Testing utilities and mock implementations.
//!
//! `MockTransport` stands in for the HTTP layer so both source adapters and
//! the whole fetch pipeline can be exercised without a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use torrent_api_core::testing::{fixtures, MockTransport};
//!
//! let transport = MockTransport::new();
//! transport.push_json(json!([fixtures::tpb_item("Movie.2019.1080p", 50, "abc...")])).await;
//!
//! let sources = Sources::new(&Config::default(), Arc::new(transport.clone()));
//! ```

mod mock_transport;

pub use mock_transport::{MockTransport, RecordedRequest};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::record::{NormalizedRecord, Resolution, Source};

    /// A 40-character info-hash derived from `n`, distinct per `n`.
    pub fn info_hash(n: u32) -> String {
        format!("{:040x}", n)
    }

    /// An apibay result object; every value is a string, as apibay sends them.
    pub fn tpb_item(name: &str, seeders: u64, info_hash: &str) -> Value {
        json!({
            "id": format!("{}", 1000 + seeders),
            "name": name,
            "info_hash": info_hash,
            "leechers": "3",
            "seeders": seeders.to_string(),
            "num_files": "1",
            "size": "2147483648",
            "username": "uploader",
            "added": "1600000000",
            "status": "member",
            "category": "207",
            "imdb": ""
        })
    }

    /// An EZTV result object with mixed number/string fields.
    pub fn eztv_item(title: &str, season: u32, episode: u32, seeds: u64, hash: &str) -> Value {
        json!({
            "id": seeds * 1000 + u64::from(episode),
            "hash": hash,
            "filename": format!("{}.mkv", title),
            "magnet_url": format!("magnet:?xt=urn:btih:{}&dn={}", hash, urlencoding::encode(title)),
            "title": title,
            "imdb_id": "1442462",
            "season": season.to_string(),
            "episode": episode.to_string(),
            "seeds": seeds,
            "peers": 4,
            "date_released_unix": 1700000000,
            "size_bytes": "524288000"
        })
    }

    /// EZTV envelope around `items`.
    pub fn eztv_page(items: Vec<Value>) -> Value {
        json!({
            "torrents_count": items.len(),
            "limit": 100,
            "page": 1,
            "torrents": items
        })
    }

    /// A record with neutral defaults, for ranking and export tests.
    pub fn record(source: Source, title: &str, seeders: u64) -> NormalizedRecord {
        NormalizedRecord {
            source,
            title: title.to_string(),
            year: None,
            resolution: Resolution::Unknown,
            seeders,
            leechers: 0,
            size: "0.00 B".to_string(),
            date: None,
            uploader: None,
            id: None,
            season: None,
            episode: None,
            magnet_link: None,
        }
    }
}

//! Logo references, classified once when an organization is stored.

use serde::{Deserialize, Serialize};

/// Prefix marking logos shipped with the frontend's static files.
const LOCAL_STATIC_PREFIX: &str = "nko-logo/";

/// Where an organization's logo lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LogoRef {
    /// Absolute URL, used as-is.
    External(String),
    /// Path relative to the static logo directory.
    LocalStatic(String),
    /// Key in the old object storage, resolved through the storage proxy.
    LegacyKey(String),
}

impl LogoRef {
    /// Classify a raw logo value. Blank input means "no logo".
    pub fn classify(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let logo = if raw.starts_with("http") {
            LogoRef::External(raw.to_string())
        } else if let Some(path) = raw.strip_prefix(LOCAL_STATIC_PREFIX) {
            LogoRef::LocalStatic(path.to_string())
        } else {
            LogoRef::LegacyKey(raw.to_string())
        };
        Some(logo)
    }

    /// Storage column values: `(kind, value)`.
    pub fn to_parts(&self) -> (&'static str, &str) {
        match self {
            LogoRef::External(url) => ("external", url),
            LogoRef::LocalStatic(path) => ("local_static", path),
            LogoRef::LegacyKey(key) => ("legacy_key", key),
        }
    }

    /// Rebuild from storage columns. Unknown kinds are treated as legacy keys.
    pub fn from_parts(kind: &str, value: String) -> Self {
        match kind {
            "external" => LogoRef::External(value),
            "local_static" => LogoRef::LocalStatic(value),
            _ => LogoRef::LegacyKey(value),
        }
    }

    /// URL the frontend should load for this logo.
    pub fn resolve(&self, bases: &LogoBases) -> String {
        match self {
            LogoRef::External(url) => url.clone(),
            LogoRef::LocalStatic(path) => join_url(&bases.static_base, path),
            LogoRef::LegacyKey(key) => join_url(&bases.storage_proxy_base, key),
        }
    }
}

/// URL prefixes used when resolving logos.
#[derive(Debug, Clone)]
pub struct LogoBases {
    pub static_base: String,
    pub storage_proxy_base: String,
    pub default_logo: String,
}

impl LogoBases {
    /// Resolve an optional logo, falling back to the default image.
    pub fn resolve(&self, logo: Option<&LogoRef>) -> String {
        match logo {
            Some(logo) => logo.resolve(self),
            None => self.default_logo.clone(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bases() -> LogoBases {
        LogoBases {
            static_base: "/nko-logo/".to_string(),
            storage_proxy_base: "/api/storage".to_string(),
            default_logo: "/static/default.png".to_string(),
        }
    }

    #[test]
    fn test_classify_external() {
        let logo = LogoRef::classify("https://cdn.example.org/fund.png").unwrap();
        assert_eq!(
            logo,
            LogoRef::External("https://cdn.example.org/fund.png".to_string())
        );
        assert_eq!(logo.resolve(&bases()), "https://cdn.example.org/fund.png");
    }

    #[test]
    fn test_classify_local_static_strips_prefix() {
        let logo = LogoRef::classify("nko-logo/fund.svg").unwrap();
        assert_eq!(logo, LogoRef::LocalStatic("fund.svg".to_string()));
        assert_eq!(logo.resolve(&bases()), "/nko-logo/fund.svg");
    }

    #[test]
    fn test_classify_legacy_key() {
        let logo = LogoRef::classify("bucket/abc123.png").unwrap();
        assert_eq!(logo, LogoRef::LegacyKey("bucket/abc123.png".to_string()));
        assert_eq!(logo.resolve(&bases()), "/api/storage/bucket/abc123.png");
    }

    #[test]
    fn test_blank_logo_falls_back_to_default() {
        assert!(LogoRef::classify("   ").is_none());
        assert_eq!(bases().resolve(None), "/static/default.png");
    }

    #[test]
    fn test_storage_parts() {
        let logo = LogoRef::LocalStatic("a.png".to_string());
        let (kind, value) = logo.to_parts();
        assert_eq!(LogoRef::from_parts(kind, value.to_string()), logo);
    }
}

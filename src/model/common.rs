use sha2::{Digest, Sha256};

pub type Id = String;

pub type Timestamp = chrono::DateTime<chrono::Utc>;

pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Hex-encoded SHA-256 of the given bytes
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Treat empty and whitespace-only strings as missing
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint(br#"["a","b"]"#);
        let b = fingerprint(br#"["a","b"]"#);
        let c = fingerprint(br#"["b","a"]"#);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("Name")), Some("Name"));
        assert_eq!(non_blank(Some("")), None);
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}

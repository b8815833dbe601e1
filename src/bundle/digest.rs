//! Content fingerprints and subresource-integrity digests.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use md5::Md5;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::config::SriAlgorithm;

/// Hex MD5 of the final artifact bytes.
pub fn fingerprint(content: &[u8]) -> String {
    hex::encode(Md5::digest(content))
}

/// `<alg>-<base64 digest>`, the value format of an `integrity` attribute.
pub fn integrity(algorithm: SriAlgorithm, content: &[u8]) -> String {
    let digest = match algorithm {
        SriAlgorithm::Sha256 => Sha256::digest(content).to_vec(),
        SriAlgorithm::Sha384 => Sha384::digest(content).to_vec(),
        SriAlgorithm::Sha512 => Sha512::digest(content).to_vec(),
    };
    format!("{algorithm}-{}", STANDARD.encode(digest))
}

/// `app.js` -> `app-<hash>.js`; extensionless names get a plain suffix.
pub fn fingerprinted_name(file_name: &str, hash: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{hash}.{ext}"),
        _ => format!("{file_name}-{hash}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_md5_hex() {
        assert_eq!(fingerprint(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
    }

    #[test]
    fn test_integrity_values() {
        assert_eq!(
            integrity(SriAlgorithm::Sha256, b"abc"),
            "sha256-ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0="
        );
        assert!(integrity(SriAlgorithm::Sha384, b"abc").starts_with("sha384-"));
        // 64 byte digest -> 88 base64 chars
        assert_eq!(integrity(SriAlgorithm::Sha512, b"abc").len(), "sha512-".len() + 88);
    }

    #[test]
    fn test_fingerprinted_name() {
        assert_eq!(fingerprinted_name("app.js", "abc"), "app-abc.js");
        assert_eq!(fingerprinted_name("app.min.js", "abc"), "app.min-abc.js");
        assert_eq!(fingerprinted_name("LICENSE", "abc"), "LICENSE-abc");
        assert_eq!(fingerprinted_name(".htaccess", "abc"), ".htaccess-abc");
    }
}

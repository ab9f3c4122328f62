use sha1::Sha1;
use sha2::{Digest, Sha256};

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Template id: 40-char SHA-1 hex of the stable key (the domain).
pub fn template_id(stable_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(stable_key.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn template_id_is_fixed_width_and_stable() {
        let a = template_id("example.com");
        assert_eq!(a.len(), 40);
        assert_eq!(a, template_id("example.com"));
        assert_ne!(a, template_id("other.com"));
        assert_eq!(
            template_id("abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }
}

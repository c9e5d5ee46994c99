use sha2::{Digest, Sha256};

/// Strips every whitespace character and lowercases.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Hex SHA-256 over the normalized title followed by the normalized body.
pub fn fingerprint(title: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(title).as_bytes());
    hasher.update(normalize(body).as_bytes());
    format!("{:x}", hasher.finalize())
}

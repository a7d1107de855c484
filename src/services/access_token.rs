use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Random bytes behind every public invoice link (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Opaque, URL-safe token granting read access to a single invoice.
///
/// Drawn from the thread-local CSPRNG; unrelated to the invoice id or number.
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tokens_are_url_safe_and_full_length() {
        let token = generate_access_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_access_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }
}

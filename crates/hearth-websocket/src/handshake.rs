use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha1::{Digest, Sha1};

const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// the `Sec-WebSocket-Accept` value a server sends back for a given
/// `Sec-WebSocket-Key`: base64(sha1(key ++ the RFC 6455 magic GUID)).
pub fn accept_hash(websocket_key: &str) -> String {
    let hash = Sha1::new()
        .chain_update(websocket_key)
        .chain_update(WEBSOCKET_GUID)
        .finalize();
    BASE64.encode(hash)
}

/// a random `Sec-WebSocket-Key` suitable for a client handshake, exposed
/// for tests and for clients embedding this crate.
pub fn generate_key() -> String {
    BASE64.encode(fastrand::u128(..).to_ne_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_hash_matches_the_rfc_example() {
        // RFC 6455 section 1.3's worked example
        assert_eq!(accept_hash("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }
}

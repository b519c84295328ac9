use async_compression::futures::bufread::GzipEncoder;
use futures_lite::{
    io::{BufReader, Cursor},
    AsyncReadExt,
};

/// does this `Accept-Encoding` header value admit gzip?
pub(crate) fn accepts_gzip(header: &str) -> bool {
    header.split(',').any(|entry| {
        let mut parts = entry.trim().split(';');
        let coding = parts.next().unwrap_or("").trim();
        if !coding.eq_ignore_ascii_case("gzip") && coding != "*" {
            return false;
        }
        let q = parts.next().and_then(|q| {
            q.trim()
                .strip_prefix("q=")
                .and_then(|q| q.parse::<f32>().ok())
        });
        !matches!(q, Some(q) if q <= 0.0)
    })
}

/// gzip an in-memory buffer eagerly, used for bodies at or under
/// [`crate::HttpConfig::gzip_in_memory_up_to_size`].
pub(crate) async fn gzip_in_memory(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = GzipEncoder::new(BufReader::new(Cursor::new(bytes)));
    encoder.read_to_end(&mut out).await?;
    Ok(out)
}

/// gzip a sample chunk and report whether it shrank, used to decide
/// whether a body of unknown compressibility (e.g. an already-compressed
/// image) is worth streaming through the gzip encoder at all.
///
/// bodies below [`crate::HttpConfig::gzip_autodetect_threshold`] skip this
/// check entirely and are sent as-is; the caller is expected to enforce
/// that before calling this.
pub(crate) async fn is_compressible(sample: &[u8]) -> std::io::Result<bool> {
    if sample.is_empty() {
        return Ok(false);
    }
    let compressed = gzip_in_memory(sample).await?;
    Ok(compressed.len() < sample.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_gzip() {
        assert!(accepts_gzip("gzip"));
        assert!(accepts_gzip("deflate, gzip"));
    }

    #[test]
    fn rejects_zero_quality_gzip() {
        assert!(!accepts_gzip("gzip;q=0"));
        assert!(!accepts_gzip("gzip;q=0.0"));
    }

    #[test]
    fn wildcard_accepts_gzip() {
        assert!(accepts_gzip("*"));
    }

    #[test]
    fn rejects_unrelated_codings() {
        assert!(!accepts_gzip("br, deflate"));
    }

    #[test]
    fn repetitive_text_is_compressible() {
        let sample = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".repeat(20);
        let compressible = futures_lite::future::block_on(is_compressible(sample.as_bytes())).unwrap();
        assert!(compressible);
    }

    #[test]
    fn empty_sample_is_not_compressible() {
        let compressible = futures_lite::future::block_on(is_compressible(&[])).unwrap();
        assert!(!compressible);
    }
}

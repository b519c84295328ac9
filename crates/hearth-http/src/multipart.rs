use crate::{
    upload::{UploadDescriptor, UploadStorage},
    Error, Result,
};
use memchr::memmem::Finder;
use std::{
    fs,
    io::{Read, Write},
    path::Path,
};

/// bytes pulled from the source per read, before we go looking for the
/// next boundary in what's accumulated so far.
const CHUNK_SIZE: usize = 64 * 1024;

struct Part<'a> {
    headers: Vec<(String, String)>,
    body: &'a [u8],
}

impl Part<'_> {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// parse a `multipart/form-data` body into form fields and file uploads,
/// reading `source` incrementally instead of requiring its bytes up front.
///
/// Parts whose `Content-Disposition` carries a `filename` parameter become
/// uploads; everything else becomes a form field. Uploads at or below
/// `store_in_file_at_size` bytes are kept in memory; larger ones are
/// spooled into `temp_dir` under a name that retries on collision. Only
/// the part currently being scanned, plus whatever hasn't been read yet
/// past it, is ever held in memory — not the whole body.
pub fn parse<R: Read>(
    source: R,
    boundary: &str,
    store_in_file_at_size: u64,
    temp_dir: &Path,
) -> Result<(Vec<(String, String)>, Vec<UploadDescriptor>)> {
    let delimiter = format!("--{boundary}");
    let finder = Finder::new(delimiter.as_bytes());
    let mut source = source;
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut buf: Vec<u8> = Vec::with_capacity(CHUNK_SIZE);
    let mut fields = Vec::new();
    let mut uploads = Vec::new();
    let mut found_boundary = false;

    loop {
        // a part's bounds are the span between two consecutive delimiter
        // occurrences, so make sure at least two are visible (or we've hit
        // eof) before deciding how to treat what's left.
        let mut positions: Vec<usize> = finder.find_iter(&buf).collect();
        let mut eof = false;
        while positions.len() < 2 && !eof {
            let n = source.read(&mut chunk).map_err(Error::Io)?;
            if n == 0 {
                eof = true;
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            positions = finder.find_iter(&buf).collect();
        }

        let Some(&start_pos) = positions.first() else {
            break;
        };
        found_boundary = true;

        let start = start_pos + delimiter.len();
        if buf[start..].starts_with(b"--") {
            break; // final boundary
        }

        let end = match positions.get(1) {
            Some(&end) => end,
            // no further delimiter and nothing left to read: treat eof as
            // the implicit final boundary rather than erroring out.
            None if eof => buf.len(),
            None => break,
        };

        let part = parse_one_part(&buf[start..end])?;
        let disposition = part
            .header("content-disposition")
            .ok_or_else(|| Error::MalformedMultipart("missing content-disposition".into()))?;
        let name = disposition_param(disposition, "name")
            .ok_or_else(|| Error::MalformedMultipart("missing name parameter".into()))?;

        if let Some(file_name) = disposition_param(disposition, "filename") {
            let content_type = part.header("content-type").map(str::to_owned);
            let storage = if (part.body.len() as u64) <= store_in_file_at_size {
                UploadStorage::InMemory(part.body.to_vec())
            } else {
                UploadStorage::TempFile(spool(part.body, temp_dir)?)
            };
            uploads.push(UploadDescriptor::new(name, Some(file_name), content_type, storage));
        } else {
            fields.push((name, String::from_utf8_lossy(part.body).into_owned()));
        }

        // drop everything up through this part's closing delimiter: the
        // buffer never holds more than one part plus unread lookahead.
        buf.drain(..end);
    }

    if !found_boundary {
        return Err(Error::MalformedMultipart("boundary not found".into()));
    }

    Ok((fields, uploads))
}

fn parse_one_part(segment: &[u8]) -> Result<Part<'_>> {
    let mut segment = segment;
    segment = segment.strip_prefix(b"\r\n").unwrap_or(segment);
    segment = segment.strip_suffix(b"\r\n").unwrap_or(segment);

    let header_end = Finder::new(b"\r\n\r\n")
        .find(segment)
        .ok_or_else(|| Error::MalformedMultipart("missing header terminator".into()))?;
    let header_block = &segment[..header_end];
    let body = &segment[header_end + 4..];
    let headers = parse_headers(header_block)?;
    Ok(Part { headers, body })
}

fn parse_headers(block: &[u8]) -> Result<Vec<(String, String)>> {
    let text = std::str::from_utf8(block)
        .map_err(|_| Error::MalformedMultipart("non-utf8 part headers".into()))?;
    let mut headers = Vec::new();
    for line in text.split("\r\n").filter(|l| !l.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::MalformedMultipart("malformed part header".into()))?;
        headers.push((name.trim().to_owned(), value.trim().to_owned()));
    }
    Ok(headers)
}

/// pull a `key="value"` or `key=value` parameter out of a
/// `Content-Disposition` header value.
fn disposition_param(disposition: &str, key: &str) -> Option<String> {
    disposition.split(';').find_map(|segment| {
        let segment = segment.trim();
        let (k, v) = segment.split_once('=')?;
        if !k.trim().eq_ignore_ascii_case(key) {
            return None;
        }
        Some(v.trim().trim_matches('"').to_owned())
    })
}

fn spool(bytes: &[u8], temp_dir: &Path) -> Result<std::path::PathBuf> {
    for _ in 0..16 {
        let path = temp_dir.join(format!("hearth-upload-{}", fastrand::u64(..)));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut file) => {
                file.write_all(bytes).map_err(Error::Io)?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Err(Error::MalformedMultipart(
        "could not allocate a unique spool filename".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fields_and_in_memory_upload() {
        let body = concat!(
            "--boundary\r\n",
            "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
            "hello\r\n",
            "--boundary\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "file contents\r\n",
            "--boundary--\r\n",
        );
        let (fields, uploads) =
            parse(body.as_bytes(), "boundary", 1024 * 1024, &std::env::temp_dir()).unwrap();
        assert_eq!(fields, vec![("title".to_owned(), "hello".to_owned())]);
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].file_name(), Some("a.txt"));
        assert_eq!(uploads[0].bytes().unwrap(), b"file contents");
    }

    #[test]
    fn large_upload_spools_to_disk() {
        let mut body = Vec::new();
        body.extend_from_slice(b"--boundary\r\n");
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"big.bin\"\r\n\r\n",
        );
        body.extend_from_slice(&vec![b'x'; 32]);
        body.extend_from_slice(b"\r\n--boundary--\r\n");

        let (_, uploads) = parse(body.as_slice(), "boundary", 8, &std::env::temp_dir()).unwrap();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].path().is_some());
        assert_eq!(uploads[0].len().unwrap(), 32);
    }

    #[test]
    fn part_spanning_multiple_reader_chunks_still_parses() {
        let mut body = Vec::new();
        body.extend_from_slice(b"--boundary\r\n");
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"big.bin\"\r\n\r\n",
        );
        let payload = vec![b'x'; CHUNK_SIZE * 3];
        body.extend_from_slice(&payload);
        body.extend_from_slice(b"\r\n--boundary--\r\n");

        let (_, uploads) =
            parse(body.as_slice(), "boundary", CHUNK_SIZE as u64 * 4, &std::env::temp_dir()).unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].bytes().unwrap(), payload);
    }

    #[test]
    fn parses_from_a_file_reader_not_just_a_byte_slice() {
        let body = concat!(
            "--boundary\r\n",
            "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
            "hello\r\n",
            "--boundary--\r\n",
        );
        let path = std::env::temp_dir().join(format!("hearth-multipart-test-{}", fastrand::u64(..)));
        fs::write(&path, body).unwrap();
        let file = fs::File::open(&path).unwrap();

        let (fields, _) = parse(file, "boundary", 1024, &std::env::temp_dir()).unwrap();
        assert_eq!(fields, vec![("title".to_owned(), "hello".to_owned())]);
        let _ = fs::remove_file(&path);
    }
}

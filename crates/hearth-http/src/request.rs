use crate::{
    body::ReceivedBody,
    multipart,
    url::{decode_form, encode_form},
    upload::UploadDescriptor,
    Error, Headers, KnownHeaderName, Method, Result, Url, Version,
};
use std::path::PathBuf;

/// A parsed HTTP request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: Url,
    version: Version,
    headers: Headers,
    body: ReceivedBody,
    multipart_store_threshold: u64,
    temp_dir: PathBuf,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        url: Url,
        version: Version,
        headers: Headers,
        body: ReceivedBody,
        multipart_store_threshold: u64,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            method,
            url,
            version,
            headers,
            body,
            multipart_store_threshold,
            temp_dir,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> &ReceivedBody {
        &self.body
    }

    /// replace this request's URL, used by the resolver as it rewrites the
    /// request on each dispatch hop
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    fn content_type(&self) -> Option<&str> {
        self.headers.get_str(KnownHeaderName::ContentType)
    }

    /// parse an `application/x-www-form-urlencoded` body into key -> values
    pub fn form(&self) -> Result<Vec<(String, Vec<String>)>> {
        let is_form = self
            .content_type()
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if !is_form {
            return Ok(Vec::new());
        }
        let bytes = match &self.body {
            ReceivedBody::Empty => return Ok(Vec::new()),
            ReceivedBody::InMemory(bytes) => bytes.clone(),
            ReceivedBody::File(spooled) => std::fs::read(spooled.path()).map_err(Error::Io)?,
        };
        let text = String::from_utf8_lossy(&bytes);
        let mut pairs: Vec<(String, Vec<String>)> = Vec::new();
        for segment in text.split('&').filter(|s| !s.is_empty()) {
            let (key, value) = match segment.split_once('=') {
                Some((k, v)) => (decode_form(k), decode_form(v)),
                None => (decode_form(segment), String::new()),
            };
            match pairs.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value),
                None => pairs.push((key, vec![value])),
            }
        }
        Ok(pairs)
    }

    /// parse a `multipart/form-data` body into form fields and file uploads
    pub fn multipart(&self) -> Result<(Vec<(String, String)>, Vec<UploadDescriptor>)> {
        let content_type = self
            .content_type()
            .ok_or_else(|| Error::MalformedMultipart("no content-type".into()))?;
        if !content_type.starts_with("multipart/form-data") {
            return Err(Error::MalformedMultipart(
                "content-type is not multipart/form-data".into(),
            ));
        }
        let boundary = content_type
            .split(';')
            .find_map(|p| p.trim().strip_prefix("boundary="))
            .map(|b| b.trim_matches('"'))
            .ok_or_else(|| Error::MalformedMultipart("missing boundary parameter".into()))?;

        // read the body incrementally rather than buffering it up front: a
        // multipart body large enough to have been spooled to disk is
        // exactly the case where we don't want to load it all into memory
        // just to scan it for boundaries.
        match &self.body {
            ReceivedBody::Empty => multipart::parse(
                std::io::empty(),
                boundary,
                self.multipart_store_threshold,
                &self.temp_dir,
            ),
            ReceivedBody::InMemory(bytes) => multipart::parse(
                bytes.as_slice(),
                boundary,
                self.multipart_store_threshold,
                &self.temp_dir,
            ),
            ReceivedBody::File(spooled) => {
                let file = std::fs::File::open(spooled.path()).map_err(Error::Io)?;
                multipart::parse(file, boundary, self.multipart_store_threshold, &self.temp_dir)
            }
        }
    }
}

pub(crate) fn serialize_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode_form(k), encode_form(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content_type: &str, body: Vec<u8>) -> Request {
        let mut headers = Headers::new();
        headers.insert(KnownHeaderName::ContentType, content_type.to_owned());
        Request::new(
            Method::Post,
            Url::new(false, "example.com", 80, "/", ""),
            Version::Http1_1,
            headers,
            ReceivedBody::InMemory(body),
            1024,
            std::env::temp_dir(),
        )
    }

    #[test]
    fn parses_urlencoded_form() {
        let req = request(
            "application/x-www-form-urlencoded",
            b"a=1&b=2&b=3".to_vec(),
        );
        let form = req.form().unwrap();
        assert_eq!(form[0], ("a".to_owned(), vec!["1".to_owned()]));
        assert_eq!(form[1], ("b".to_owned(), vec!["2".to_owned(), "3".to_owned()]));
    }

    #[test]
    fn non_form_content_type_yields_empty_form() {
        let req = request("application/json", b"{}".to_vec());
        assert!(req.form().unwrap().is_empty());
    }
}

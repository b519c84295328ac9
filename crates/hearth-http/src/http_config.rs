use std::path::PathBuf;

/// Tuning knobs for request parsing, body handling, and the low-level
/// connection buffers. Constructed with [`HttpConfig::default`] and
/// customized with the chainable `with_*` methods.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub(crate) write_buffer_len: usize,
    pub(crate) read_buffer_len: usize,
    pub(crate) copy_loops_per_yield: usize,

    pub(crate) max_size_headers: usize,
    pub(crate) max_size_post_content: u64,
    pub(crate) store_file_upload_in_file_at_size: u64,
    pub(crate) gzip_in_memory_up_to_size: u64,
    pub(crate) gzip_autodetect_threshold: u64,
    pub(crate) idle_timeout_ms: u64,
    pub(crate) temp_dir: PathBuf,
    pub(crate) output_exception_information: bool,
    pub(crate) default_content_type: String,
}

impl HttpConfig {
    #[must_use]
    pub fn with_write_buffer_len(mut self, write_buffer_len: usize) -> Self {
        self.write_buffer_len = write_buffer_len;
        self
    }

    #[must_use]
    pub fn with_read_buffer_len(mut self, read_buffer_len: usize) -> Self {
        self.read_buffer_len = read_buffer_len;
        self
    }

    #[must_use]
    pub fn with_copy_loops_per_yield(mut self, copy_loops_per_yield: usize) -> Self {
        self.copy_loops_per_yield = copy_loops_per_yield;
        self
    }

    /// maximum size, in bytes, of the request line plus headers
    #[must_use]
    pub fn with_max_size_headers(mut self, max_size_headers: usize) -> Self {
        self.max_size_headers = max_size_headers;
        self
    }

    /// maximum size, in bytes, of a request body
    #[must_use]
    pub fn with_max_size_post_content(mut self, max_size_post_content: u64) -> Self {
        self.max_size_post_content = max_size_post_content;
        self
    }

    /// multipart file parts at or under this size are kept in memory;
    /// larger parts are spooled to `temp_dir`
    #[must_use]
    pub fn with_store_file_upload_in_file_at_size(mut self, size: u64) -> Self {
        self.store_file_upload_in_file_at_size = size;
        self
    }

    /// response bodies at or under this size are gzipped eagerly in memory
    /// rather than streamed through the gzip encoder
    #[must_use]
    pub fn with_gzip_in_memory_up_to_size(mut self, size: u64) -> Self {
        self.gzip_in_memory_up_to_size = size;
        self
    }

    /// bodies below this size are not considered for compressibility
    /// autodetection and are sent as-is
    #[must_use]
    pub fn with_gzip_autodetect_threshold(mut self, size: u64) -> Self {
        self.gzip_autodetect_threshold = size;
        self
    }

    #[must_use]
    pub fn with_idle_timeout_ms(mut self, idle_timeout_ms: u64) -> Self {
        self.idle_timeout_ms = idle_timeout_ms;
        self
    }

    #[must_use]
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// whether unhandled handler errors are reported to the client as
    /// 500 response bodies (useful in development, dangerous in production)
    #[must_use]
    pub fn with_output_exception_information(mut self, output: bool) -> Self {
        self.output_exception_information = output;
        self
    }

    #[must_use]
    pub fn with_default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    pub fn max_size_headers(&self) -> usize {
        self.max_size_headers
    }

    pub fn max_size_post_content(&self) -> u64 {
        self.max_size_post_content
    }

    pub fn store_file_upload_in_file_at_size(&self) -> u64 {
        self.store_file_upload_in_file_at_size
    }

    pub fn gzip_in_memory_up_to_size(&self) -> u64 {
        self.gzip_in_memory_up_to_size
    }

    pub fn gzip_autodetect_threshold(&self) -> u64 {
        self.gzip_autodetect_threshold
    }

    pub fn idle_timeout_ms(&self) -> u64 {
        self.idle_timeout_ms
    }

    pub fn temp_dir(&self) -> &std::path::Path {
        &self.temp_dir
    }

    pub fn output_exception_information(&self) -> bool {
        self.output_exception_information
    }

    pub fn default_content_type(&self) -> &str {
        &self.default_content_type
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            write_buffer_len: 512,
            read_buffer_len: 128,
            copy_loops_per_yield: 16,
            max_size_headers: 262_144,
            max_size_post_content: 1024 * 1024 * 1024,
            store_file_upload_in_file_at_size: 1024 * 1024,
            gzip_in_memory_up_to_size: 1024 * 1024,
            gzip_autodetect_threshold: 1024 * 1024,
            idle_timeout_ms: 10_000,
            temp_dir: std::env::temp_dir(),
            output_exception_information: false,
            default_content_type: "text/html; charset=utf-8".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = HttpConfig::default();
        assert_eq!(config.max_size_headers(), 262_144);
        assert_eq!(config.max_size_post_content(), 1024 * 1024 * 1024);
        assert_eq!(config.store_file_upload_in_file_at_size(), 1024 * 1024);
        assert_eq!(config.idle_timeout_ms(), 10_000);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = HttpConfig::default()
            .with_max_size_headers(4096)
            .with_idle_timeout_ms(5_000);
        assert_eq!(config.max_size_headers(), 4096);
        assert_eq!(config.idle_timeout_ms(), 5_000);
    }
}

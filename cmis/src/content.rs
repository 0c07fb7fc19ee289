//! Content streams.
use std::fmt;
use std::io;
use std::io::Read;

/// Mime type assumed when a stream does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
/// Largest buffer reserved up front when reading a body into memory.
pub const MAX_PREALLOCATION: u64 = 1024 * 1024;

/// A lazily-read byte stream with its metadata.
///
/// The body is only read when the stream is sent or consumed.
pub struct ContentStream {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    /// Length in bytes, if known up front.
    pub length: Option<u64>,
    body: Box<dyn Read + Send>,
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStream")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl ContentStream {
    /// Create a stream from a reader of unknown length.
    pub fn new(body: impl Read + Send + 'static) -> Self {
        Self {
            file_name: None,
            mime_type: None,
            length: None,
            body: Box::new(body),
        }
    }

    /// Create a stream over an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let length = bytes.len() as u64;

        Self {
            length: Some(length),
            ..Self::new(io::Cursor::new(bytes))
        }
    }

    pub fn with_file_name(mut self, name: impl ToString) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    pub fn with_mime_type(mut self, mime: impl ToString) -> Self {
        self.mime_type = Some(mime.to_string());
        self
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    /// The declared mime type, or [`DEFAULT_MIME_TYPE`].
    pub fn mime_type_or_default(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Read the whole body into memory.
    ///
    /// The declared length is only a sizing hint, capped at [`MAX_PREALLOCATION`].
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let hint = self.length.unwrap_or_default().min(MAX_PREALLOCATION);
        let mut buf = Vec::with_capacity(hint as usize);
        self.body.read_to_end(&mut buf)?;

        Ok(buf)
    }

    /// Replace the body with an in-memory copy of it, fixing the length.
    pub fn buffered(self) -> io::Result<Self> {
        let file_name = self.file_name.clone();
        let mime_type = self.mime_type.clone();
        let bytes = self.into_bytes()?;

        Ok(Self {
            file_name,
            mime_type,
            ..Self::from_bytes(bytes)
        })
    }
}

impl Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

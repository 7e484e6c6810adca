//! Flushing, encoding-safe output stream wrapper.
//!
//! Plugin diagnostics are only useful if they reach the console in
//! order, including when the host buffers its streams or the process
//! dies mid-run. [`FlushingWriter`] wraps any sink and flushes it after
//! every single write. Text handed to the wrapper is encoded to the
//! sink's declared encoding first, substituting characters the
//! encoding cannot represent instead of failing, so a stray dictionary
//! headword in the wrong script never kills the log line.
//!
//! This module provides:
//! - [`EncodedWrite`]: the capability contract for wrappable sinks
//!   (a byte sink plus an optional declared encoding)
//! - [`EncodedStream`]: attaches a declared encoding to any writer
//! - [`StreamData`]: tagged text-or-bytes input for [`FlushingWriter::write`]
//! - [`FlushingWriter`]: the wrapper itself
//!
//! # Examples
//!
//! ```
//! use ebook_utils::stream::{FlushingWriter, StreamData};
//!
//! # fn main() -> ebook_utils::Result<()> {
//! // Vec<u8> declares no encoding, so the wrapper assumes UTF-8
//! let mut writer = FlushingWriter::new(Vec::new());
//! writer.write("loaded 3 formats\n")?;
//! writer.write(StreamData::Bytes(b"raw trailer"))?;
//!
//! let sink = writer.into_inner();
//! assert!(sink.starts_with("loaded 3 formats\n".as_bytes()));
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Stderr, StderrLock, Stdout, StdoutLock, Write};
use std::ops::{Deref, DerefMut};

use encoding_rs::Encoding;
use log::debug;

use crate::{Result, UtilError};

/// Capability contract for a wrappable output stream: a byte sink that
/// may additionally declare the character encoding its consumer
/// expects.
///
/// The default implementation declares no encoding, which makes
/// [`FlushingWriter`] fall back to UTF-8. Use [`EncodedStream`] to
/// attach an explicit encoding to a sink that needs one.
pub trait EncodedWrite: Write {
    /// The encoding the stream's consumer expects, if the stream
    /// declares one.
    fn encoding(&self) -> Option<&'static Encoding> {
        None
    }
}

// Standard sinks a plugin wraps; none of them declares an encoding.
impl EncodedWrite for Stdout {}
impl EncodedWrite for StdoutLock<'_> {}
impl EncodedWrite for Stderr {}
impl EncodedWrite for StderrLock<'_> {}
impl EncodedWrite for File {}
impl EncodedWrite for Vec<u8> {}

/// Gets an encoding object by its WHATWG label string.
///
/// The bare "utf-16" label is aliased to "utf-16le", matching how
/// dictionary and console metadata use it.
///
/// # Errors
///
/// Returns an error if the encoding label is not recognized.
pub fn encoding_from_label(label: &str) -> Result<&'static Encoding> {
    let encoding = label.to_lowercase();
    let label = match encoding.as_str() {
        "utf-16" => "utf-16le",
        _ => encoding.as_str(),
    };
    match Encoding::for_label(label.as_bytes()) {
        Some(encoding_obj) => Ok(encoding_obj),
        None => Err(UtilError::invalid_parameter(format!("Invalid encoding: {}", encoding))),
    }
}

/// A writer paired with the encoding its consumer expects.
///
/// Wrap a sink in this before handing it to [`FlushingWriter`] when
/// text must come out in something other than UTF-8, e.g. a legacy
/// console stream known to be GBK.
///
/// # Examples
///
/// ```
/// use ebook_utils::stream::{EncodedStream, FlushingWriter};
///
/// # fn main() -> ebook_utils::Result<()> {
/// let sink = EncodedStream::from_label(Vec::new(), "gbk")?;
/// let mut writer = FlushingWriter::new(sink);
/// writer.write("书")?;
/// # Ok(())
/// # }
/// ```
pub struct EncodedStream<W: Write> {
    inner: W,
    encoding: &'static Encoding,
}

impl<W: Write> EncodedStream<W> {
    /// Pairs a writer with the given encoding.
    pub fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self { inner, encoding }
    }

    /// Pairs a writer with the encoding named by a WHATWG label.
    ///
    /// # Errors
    ///
    /// Returns an error if the label is not a known encoding.
    pub fn from_label(inner: W, label: &str) -> Result<Self> {
        Ok(Self::new(inner, encoding_from_label(label)?))
    }

    /// Consumes the adapter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for EncodedStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> EncodedWrite for EncodedStream<W> {
    fn encoding(&self) -> Option<&'static Encoding> {
        Some(self.encoding)
    }
}

/// Input to [`FlushingWriter::write`]: either text to be encoded to the
/// stream's encoding, or bytes to be passed through unchanged.
#[derive(Debug, Clone, Copy)]
pub enum StreamData<'a> {
    /// Text; encoded with the wrapper's captured encoding before the write.
    Text(&'a str),
    /// Raw bytes; written as-is.
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for StreamData<'a> {
    fn from(text: &'a str) -> Self {
        StreamData::Text(text)
    }
}

impl<'a> From<&'a String> for StreamData<'a> {
    fn from(text: &'a String) -> Self {
        StreamData::Text(text)
    }
}

impl<'a> From<&'a [u8]> for StreamData<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        StreamData::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for StreamData<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        StreamData::Bytes(bytes)
    }
}

fn str_to_utf16le_bytes(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|c| c.to_le_bytes()).collect()
}

/// Encodes text to bytes in the given encoding, substituting
/// unencodable characters instead of failing.
///
/// UTF-8 borrows the input's bytes directly. UTF-16LE is converted
/// manually because `encoding_rs` has no UTF-16 encoder. Everything
/// else goes through `encoding_rs`, which replaces unmappable
/// characters with numeric character references; a replacement is
/// logged at debug level.
pub fn encode_text<'a>(text: &'a str, encoding_obj: &'static Encoding) -> Cow<'a, [u8]> {
    if encoding_rs::UTF_8 == encoding_obj {
        Cow::Borrowed(text.as_bytes())
    } else if encoding_rs::UTF_16LE == encoding_obj {
        Cow::Owned(str_to_utf16le_bytes(text))
    } else {
        let (encoded, _, had_errors) = encoding_obj.encode(text);
        if had_errors {
            debug!("Replaced characters unencodable in {}", encoding_obj.name());
        }
        encoded
    }
}

/// Wraps an output stream so that text is encoded to the stream's
/// declared encoding and every write is followed by an immediate
/// flush.
///
/// The encoding is captured once at construction; a stream that
/// declares none gets UTF-8 for the wrapper's lifetime. The wrapper
/// trades throughput for guaranteed visibility: interleaved
/// diagnostics from plugin and host come out in the order they were
/// written. It adds no locking, so concurrent writes interleave
/// exactly as the underlying stream allows.
///
/// The wrapper borrows the stream's role, not its lifecycle: dropping
/// the wrapper (or calling [`into_inner`](Self::into_inner)) never
/// closes the stream.
///
/// Anything the wrapper does not define itself is reachable on the
/// wrapped stream through `Deref`/`DerefMut`.
pub struct FlushingWriter<W: EncodedWrite> {
    stream: W,
    encoding: &'static Encoding,
}

impl<W: EncodedWrite> FlushingWriter<W> {
    /// Wraps a stream, capturing its declared encoding (UTF-8 if it
    /// declares none).
    pub fn new(stream: W) -> Self {
        let encoding = stream.encoding().unwrap_or(encoding_rs::UTF_8);
        Self { stream, encoding }
    }

    /// The encoding captured at construction.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Writes text or bytes to the wrapped stream, then flushes it.
    ///
    /// Text is encoded to the captured encoding, substituting
    /// unencodable characters rather than failing. Bytes pass through
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Underlying write and flush failures are propagated unmodified;
    /// nothing is retried or swallowed.
    pub fn write<'a>(&mut self, data: impl Into<StreamData<'a>>) -> Result<()> {
        let bytes = match data.into() {
            StreamData::Text(text) => encode_text(text, self.encoding),
            StreamData::Bytes(bytes) => Cow::Borrowed(bytes),
        };
        self.stream.write_all(&bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Gets a reference to the wrapped stream.
    pub fn get_ref(&self) -> &W {
        &self.stream
    }

    /// Gets a mutable reference to the wrapped stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.stream
    }

    /// Consumes the wrapper, returning the wrapped stream without
    /// closing or flushing it.
    pub fn into_inner(self) -> W {
        self.stream
    }
}

// Everything not defined on the wrapper falls through to the stream.
impl<W: EncodedWrite> Deref for FlushingWriter<W> {
    type Target = W;

    fn deref(&self) -> &W {
        &self.stream
    }
}

impl<W: EncodedWrite> DerefMut for FlushingWriter<W> {
    fn deref_mut(&mut self) -> &mut W {
        &mut self.stream
    }
}

/// Byte-level `Write` passthrough so the wrapper is a drop-in writer;
/// each write is still followed by a flush.
impl<W: EncodedWrite> Write for FlushingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.stream.write(buf)?;
        self.stream.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UtilError;

    /// Test double recording writes and flush calls, optionally
    /// declaring an encoding or failing on demand.
    struct RecordingSink {
        data: Vec<u8>,
        flushes: usize,
        encoding: Option<&'static Encoding>,
        fail_write: bool,
        fail_flush: bool,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                data: Vec::new(),
                flushes: 0,
                encoding: None,
                fail_write: false,
                fail_flush: false,
            }
        }

        fn with_encoding(encoding: &'static Encoding) -> Self {
            Self { encoding: Some(encoding), ..Self::new() }
        }

        fn name(&self) -> &'static str {
            "recording-sink"
        }
    }

    impl Write for RecordingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_write {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.fail_flush {
                return Err(io::Error::new(io::ErrorKind::Other, "flush failed"));
            }
            self.flushes += 1;
            Ok(())
        }
    }

    impl EncodedWrite for RecordingSink {
        fn encoding(&self) -> Option<&'static Encoding> {
            self.encoding
        }
    }

    #[test]
    fn test_write_flushes_exactly_once_per_call() {
        let mut writer = FlushingWriter::new(RecordingSink::new());

        writer.write("first").unwrap();
        assert_eq!(writer.get_ref().flushes, 1);

        writer.write("second").unwrap();
        assert_eq!(writer.get_ref().flushes, 2);

        writer.write(b"bytes").unwrap();
        assert_eq!(writer.get_ref().flushes, 3);

        assert_eq!(writer.get_ref().data, b"firstsecondbytes");
    }

    #[test]
    fn test_encoding_captured_once_at_construction() {
        let writer = FlushingWriter::new(RecordingSink::new());
        assert_eq!(writer.encoding(), encoding_rs::UTF_8);

        let mut writer = FlushingWriter::new(RecordingSink::with_encoding(encoding_rs::GBK));
        assert_eq!(writer.encoding(), encoding_rs::GBK);

        // Changing what the sink reports later must not affect the wrapper
        writer.get_mut().encoding = Some(encoding_rs::BIG5);
        assert_eq!(writer.encoding(), encoding_rs::GBK);
    }

    #[test]
    fn test_text_encoded_to_declared_encoding() {
        let mut writer = FlushingWriter::new(RecordingSink::with_encoding(encoding_rs::GBK));
        writer.write("中").unwrap();
        assert_eq!(writer.get_ref().data, [0xd6, 0xd0]);
    }

    #[test]
    fn test_unencodable_text_substituted_not_raised() {
        let mut writer = FlushingWriter::new(RecordingSink::with_encoding(encoding_rs::GBK));

        // U+1F980 has no GBK mapping; encoding_rs substitutes a numeric
        // character reference and the write still succeeds and flushes
        writer.write("🦀").unwrap();
        assert_eq!(writer.get_ref().data, b"&#129408;");
        assert_eq!(writer.get_ref().flushes, 1);
    }

    #[test]
    fn test_bytes_bypass_encoding() {
        let mut writer = FlushingWriter::new(RecordingSink::with_encoding(encoding_rs::GBK));
        writer.write(&[0xff, 0x00, 0xfe][..]).unwrap();
        assert_eq!(writer.get_ref().data, [0xff, 0x00, 0xfe]);
    }

    #[test]
    fn test_write_failure_propagates() {
        let mut sink = RecordingSink::new();
        sink.fail_write = true;
        let mut writer = FlushingWriter::new(sink);

        let err = writer.write("lost").unwrap_err();
        assert!(err.is_io(), "expected Io error, got {:?}", err);
        assert_eq!(writer.get_ref().flushes, 0, "failed write must not flush");
    }

    #[test]
    fn test_flush_failure_propagates() {
        let mut sink = RecordingSink::new();
        sink.fail_flush = true;
        let mut writer = FlushingWriter::new(sink);

        let err = writer.write("buffered").unwrap_err();
        assert!(err.is_io(), "expected Io error, got {:?}", err);
        // The write itself landed before the flush failed
        assert_eq!(writer.get_ref().data, b"buffered");
    }

    #[test]
    fn test_delegation_to_wrapped_stream() {
        let mut writer = FlushingWriter::new(RecordingSink::new());
        writer.write("kept").unwrap();

        // Fields and methods the wrapper does not define fall through
        assert_eq!(writer.flushes, 1);
        assert_eq!(writer.name(), "recording-sink");

        let sink = writer.into_inner();
        assert_eq!(sink.data, b"kept");
    }

    #[test]
    fn test_io_write_passthrough_flushes() {
        let mut writer = FlushingWriter::new(RecordingSink::new());
        let written = Write::write(&mut writer, b"abc").unwrap();
        assert_eq!(written, 3);
        assert_eq!(writer.get_ref().flushes, 1);
    }

    #[test]
    fn test_encode_text_paths() {
        assert_eq!(encode_text("abc", encoding_rs::UTF_8).as_ref(), b"abc");
        assert_eq!(
            encode_text("A中", encoding_rs::UTF_16LE).as_ref(),
            [0x41, 0x00, 0x2d, 0x4e]
        );
        assert_eq!(encode_text("中", encoding_rs::GBK).as_ref(), [0xd6, 0xd0]);
    }

    #[test]
    fn test_encoding_from_label() {
        assert_eq!(encoding_from_label("UTF-8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(encoding_from_label("utf-16").unwrap(), encoding_rs::UTF_16LE);
        assert_eq!(encoding_from_label("gbk").unwrap(), encoding_rs::GBK);

        let err = encoding_from_label("martian-7").unwrap_err();
        match err {
            UtilError::InvalidParameter { .. } => {}
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_encoded_stream_declares_encoding() {
        let stream = EncodedStream::from_label(Vec::new(), "big5").unwrap();
        let writer = FlushingWriter::new(stream);
        assert_eq!(writer.encoding(), encoding_rs::BIG5);
    }
}

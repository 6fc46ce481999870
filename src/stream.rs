//! # Token Stream Adapters
//!
//! The parse state pulls tokens through one narrow interface,
//! [`TokenStream`]: append up to `limit` tokens to a buffer, report how many
//! arrived, with zero meaning end of input. Everything else — seeking,
//! lookahead, rewinding — is the state's job, so adapters stay trivial.
//!
//! Provided adapters:
//!
//! * [`SliceStream`] — an in-memory contiguous slice.
//! * [`IterStream`] — any iterator of tokens.
//! * [`ReaderStream`] — an [`std::io::Read`] yielding bytes.
//! * [`CharReaderStream`] — an [`std::io::Read`] yielding chars, with
//!   incremental UTF-8 decoding.
//!
//! The [`IntoTokenStream`] trait lets the driver accept `&str`, `String`,
//! `&[I]`, `Vec<I>`, or any of the adapters directly, and lets text-shaped
//! inputs pick the newline-aware default configuration.

use std::collections::VecDeque;
use std::io;

use crate::config::ParseConfig;
use crate::error::StreamError;

/// Read chunk size for I/O-backed adapters, in bytes.
const READ_CHUNK: usize = 4096;

/// A pull interface over a token source.
pub trait TokenStream<I> {
    /// Append up to `limit` tokens to `into`, returning how many were
    /// appended. `Ok(0)` means end of input. Must not block beyond the
    /// underlying I/O.
    fn pull(&mut self, into: &mut Vec<I>, limit: usize) -> Result<usize, StreamError>;
}

/// Anything the driver can parse: a stream, or a value convertible into
/// one.
///
/// `config_hint` supplies the configuration used when the caller does not
/// pass one; text-shaped inputs override it to track newlines.
pub trait IntoTokenStream<I: 'static> {
    type Stream: TokenStream<I>;

    fn into_token_stream(self) -> Self::Stream;

    fn config_hint() -> ParseConfig<I> {
        ParseConfig::default()
    }
}

/// Stream over a borrowed contiguous slice.
#[derive(Debug)]
pub struct SliceStream<'a, I> {
    slice: &'a [I],
    read: usize,
}

impl<'a, I> SliceStream<'a, I> {
    pub fn new(slice: &'a [I]) -> Self {
        Self { slice, read: 0 }
    }
}

impl<I: Clone> TokenStream<I> for SliceStream<'_, I> {
    fn pull(&mut self, into: &mut Vec<I>, limit: usize) -> Result<usize, StreamError> {
        let n = limit.min(self.slice.len() - self.read);
        into.extend_from_slice(&self.slice[self.read..self.read + n]);
        self.read += n;
        Ok(n)
    }
}

/// Stream over any iterator of tokens.
#[derive(Debug)]
pub struct IterStream<It> {
    iter: It,
}

impl<It> IterStream<It> {
    pub fn new(iter: It) -> Self {
        Self { iter }
    }
}

impl<I, It: Iterator<Item = I>> TokenStream<I> for IterStream<It> {
    fn pull(&mut self, into: &mut Vec<I>, limit: usize) -> Result<usize, StreamError> {
        let mut n = 0;
        while n < limit {
            match self.iter.next() {
                Some(token) => {
                    into.push(token);
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

/// Byte stream over an [`io::Read`].
#[derive(Debug)]
pub struct ReaderStream<R> {
    reader: R,
}

impl<R: io::Read> ReaderStream<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: io::Read> TokenStream<u8> for ReaderStream<R> {
    fn pull(&mut self, into: &mut Vec<u8>, limit: usize) -> Result<usize, StreamError> {
        let mut chunk = [0u8; READ_CHUNK];
        let want = limit.min(READ_CHUNK);
        let got = read_uninterrupted(&mut self.reader, &mut chunk[..want])?;
        into.extend_from_slice(&chunk[..got]);
        Ok(got)
    }
}

/// Character stream over an [`io::Read`], decoding UTF-8 incrementally.
///
/// A multi-byte sequence split across reads is carried over to the next
/// pull; an invalid sequence (or a truncated one at end of input) surfaces
/// as [`StreamError::InvalidUtf8`].
#[derive(Debug)]
pub struct CharReaderStream<R> {
    reader: R,
    carry: Vec<u8>,
    decoded: VecDeque<char>,
    bytes_decoded: usize,
    at_end: bool,
}

impl<R: io::Read> CharReaderStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            carry: Vec::new(),
            decoded: VecDeque::new(),
            bytes_decoded: 0,
            at_end: false,
        }
    }

    fn refill(&mut self) -> Result<(), StreamError> {
        let mut chunk = [0u8; READ_CHUNK];
        let got = read_uninterrupted(&mut self.reader, &mut chunk)?;
        if got == 0 {
            self.at_end = true;
            if !self.carry.is_empty() {
                // A multi-byte sequence was cut off by end of input.
                return Err(StreamError::InvalidUtf8 {
                    offset: self.bytes_decoded,
                });
            }
            return Ok(());
        }
        self.carry.extend_from_slice(&chunk[..got]);
        match std::str::from_utf8(&self.carry) {
            Ok(text) => {
                self.decoded.extend(text.chars());
                self.bytes_decoded += self.carry.len();
                self.carry.clear();
            }
            Err(error) => {
                let valid = error.valid_up_to();
                if error.error_len().is_some() {
                    return Err(StreamError::InvalidUtf8 {
                        offset: self.bytes_decoded + valid,
                    });
                }
                let tail = self.carry.split_off(valid);
                match std::str::from_utf8(&self.carry) {
                    Ok(text) => self.decoded.extend(text.chars()),
                    Err(_) => unreachable!("prefix up to valid_up_to is valid UTF-8"),
                }
                self.bytes_decoded += valid;
                self.carry = tail;
            }
        }
        Ok(())
    }
}

impl<R: io::Read> TokenStream<char> for CharReaderStream<R> {
    fn pull(&mut self, into: &mut Vec<char>, limit: usize) -> Result<usize, StreamError> {
        while self.decoded.is_empty() && !self.at_end {
            self.refill()?;
        }
        let mut n = 0;
        while n < limit {
            match self.decoded.pop_front() {
                Some(c) => {
                    into.push(c);
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

fn read_uninterrupted<R: io::Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, StreamError> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

impl<'a, I: Clone + 'static> IntoTokenStream<I> for &'a [I] {
    type Stream = SliceStream<'a, I>;

    fn into_token_stream(self) -> Self::Stream {
        SliceStream::new(self)
    }
}

impl<I: 'static> IntoTokenStream<I> for Vec<I> {
    type Stream = IterStream<std::vec::IntoIter<I>>;

    fn into_token_stream(self) -> Self::Stream {
        IterStream::new(self.into_iter())
    }
}

impl<'a> IntoTokenStream<char> for &'a str {
    type Stream = IterStream<std::str::Chars<'a>>;

    fn into_token_stream(self) -> Self::Stream {
        IterStream::new(self.chars())
    }

    fn config_hint() -> ParseConfig<char> {
        ParseConfig::text()
    }
}

impl IntoTokenStream<char> for String {
    type Stream = IterStream<std::vec::IntoIter<char>>;

    fn into_token_stream(self) -> Self::Stream {
        IterStream::new(self.chars().collect::<Vec<_>>().into_iter())
    }

    fn config_hint() -> ParseConfig<char> {
        ParseConfig::text()
    }
}

impl<'a, I: Clone + 'static> IntoTokenStream<I> for SliceStream<'a, I> {
    type Stream = SliceStream<'a, I>;

    fn into_token_stream(self) -> Self::Stream {
        self
    }
}

impl<I: 'static, It: Iterator<Item = I>> IntoTokenStream<I> for IterStream<It> {
    type Stream = IterStream<It>;

    fn into_token_stream(self) -> Self::Stream {
        self
    }
}

impl<R: io::Read> IntoTokenStream<u8> for ReaderStream<R> {
    type Stream = ReaderStream<R>;

    fn into_token_stream(self) -> Self::Stream {
        self
    }
}

impl<R: io::Read> IntoTokenStream<char> for CharReaderStream<R> {
    type Stream = CharReaderStream<R>;

    fn into_token_stream(self) -> Self::Stream {
        self
    }

    fn config_hint() -> ParseConfig<char> {
        ParseConfig::text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<I, S: TokenStream<I>>(mut stream: S) -> Vec<I> {
        let mut out = Vec::new();
        loop {
            match stream.pull(&mut out, 3) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) => panic!("stream failed: {e}"),
            }
        }
        out
    }

    #[test]
    fn test_slice_stream_respects_limit() {
        let data = [1, 2, 3, 4, 5];
        let mut stream = SliceStream::new(&data);
        let mut out = Vec::new();
        assert_eq!(stream.pull(&mut out, 2).unwrap(), 2);
        assert_eq!(stream.pull(&mut out, 10).unwrap(), 3);
        assert_eq!(stream.pull(&mut out, 10).unwrap(), 0);
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_iter_stream() {
        let stream = IterStream::new("hello".chars());
        assert_eq!(drain(stream), vec!['h', 'e', 'l', 'l', 'o']);
    }

    #[test]
    fn test_reader_stream() {
        let stream = ReaderStream::new(io::Cursor::new(b"bytes".to_vec()));
        assert_eq!(drain(stream), b"bytes".to_vec());
    }

    #[test]
    fn test_char_reader_decodes_multibyte() {
        let stream = CharReaderStream::new(io::Cursor::new("héllo ☃".as_bytes().to_vec()));
        assert_eq!(drain(stream), "héllo ☃".chars().collect::<Vec<_>>());
    }

    #[test]
    fn test_char_reader_rejects_invalid_utf8() {
        let mut stream = CharReaderStream::new(io::Cursor::new(vec![b'a', 0xff, b'b']));
        let mut out = Vec::new();
        let result = stream.pull(&mut out, 8);
        assert!(matches!(result, Err(StreamError::InvalidUtf8 { offset: 1 })));
    }

    #[test]
    fn test_char_reader_rejects_truncated_tail() {
        // First two bytes of a three-byte sequence.
        let mut stream = CharReaderStream::new(io::Cursor::new(vec![0xe2, 0x98]));
        let mut out = Vec::new();
        let result = stream.pull(&mut out, 8);
        assert!(matches!(result, Err(StreamError::InvalidUtf8 { .. })));
    }
}

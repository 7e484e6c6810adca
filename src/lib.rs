//! # ebook-utils - Text Helpers for E-book Management Plugins
//!
//! This crate provides the small text utilities an e-book management plugin
//! needs around metadata matching and console output.
//!
//! ## Features
//!
//! - **Unicode-normalized comparison**: Equality of strings and displayable
//!   values after NFC normalization, optionally case-insensitive
//! - **Flushing encoded output**: A stream wrapper that encodes text to the
//!   wrapped sink's declared encoding (substituting unencodable characters)
//!   and flushes after every write
//!
//! ## Quick Start
//!
//! ### Comparing metadata strings
//!
//! ```
//! use ebook_utils::compare::{str_eq, unicode_eq};
//!
//! # fn main() -> ebook_utils::Result<()> {
//! // Precomposed and decomposed forms of the same title compare equal
//! assert!(str_eq("Le café", "Le cafe\u{301}", false));
//!
//! // Author lookups are usually caseless
//! assert!(str_eq("BRONTË", "brontë", true));
//!
//! // Non-string values are coerced to text first
//! assert!(unicode_eq(2024, "2024", false)?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Unbuffered diagnostic output
//!
//! ```no_run
//! use std::io;
//! use ebook_utils::stream::FlushingWriter;
//!
//! # fn main() -> ebook_utils::Result<()> {
//! // Every write reaches the console immediately, even if the host
//! // buffers stdout
//! let mut out = FlushingWriter::new(io::stdout());
//! out.write("scanning library...\n")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return a [`Result<T>`] type, where errors are
//! represented by [`UtilError`]. The crate uses the `snafu` library for
//! ergonomic error handling with context and backtraces.
//!
//! ```
//! use ebook_utils::{Result, UtilError};
//!
//! fn example() -> Result<String> {
//!     // Operations that may fail return Result<T>
//!     Ok("success".to_string())
//! }
//! ```

pub mod compare;
pub mod error;
pub mod stream;

// Re-export commonly used types for convenience
pub use compare::{str_eq, unicode_eq};
pub use stream::{EncodedStream, EncodedWrite, FlushingWriter, StreamData};

// Re-export error types for convenience
pub use error::{UtilError, Result, snafu};

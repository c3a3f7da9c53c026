//! Utility functions and helpers.
//!
//! - [`time`] - Go-style duration parsing and timestamp formatting
//! - [`format`] - Number formatting for status messages
//! - [`progress`] - Spinner shown while event pages are fetched
//!
//! # Examples
//!
//! ```
//! use cloudtrailctl::utils::time::parse_duration;
//!
//! let since = parse_duration("1h30m").unwrap();
//! assert_eq!(since.num_minutes(), 90);
//! ```

pub mod format;
pub mod progress;
pub mod time;

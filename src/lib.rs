/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

//! # mail-arf
//!
//! Generates Abuse Reporting Format (RFC 5965) reports out of previously
//! received messages, and reads them back.
//!
//! ```ignore
//! use mail_arf::report::ArfReport;
//!
//! let report = ArfReport::from_message(raw_message, "postmaster@example.org", None)?;
//! println!("{}", report.as_rfc5322()?);
//! ```

use std::{borrow::Cow, fmt::Display};

pub mod common;
pub mod report;
pub mod transport;

/// A single raw header, name and value as they appear in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader<'x> {
    pub(crate) name: Cow<'x, str>,
    pub(crate) value: Cow<'x, str>,
}

/// Ordered multi-map of the headers of a message. Repeated names are kept
/// in the order they were found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderStore<'x> {
    pub(crate) headers: Vec<RawHeader<'x>>,
    pub(crate) body: &'x [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    MalformedHeaderBlock,
    UnknownFeedbackType(String),
    MalformedSenderAddress(String),
    UnsupportedContentObject,
    MailParseError,
    NoReportsFound,
    Io(String),
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MalformedHeaderBlock => write!(f, "Malformed header block."),
            Error::UnknownFeedbackType(ft) => write!(f, "Unknown Feedback-Type {:?}.", ft),
            Error::MalformedSenderAddress(addr) => {
                write!(f, "Sender address {:?} has no domain part.", addr)
            }
            Error::UnsupportedContentObject => {
                write!(f, "Unsupported content object for this content type.")
            }
            Error::MailParseError => write!(f, "Failed to parse message."),
            Error::NoReportsFound => write!(f, "No feedback report found in message."),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => std::io::Error::new(std::io::ErrorKind::Other, err),
            err => std::io::Error::new(std::io::ErrorKind::InvalidData, err),
        }
    }
}

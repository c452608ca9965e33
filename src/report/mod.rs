/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

pub mod arf;
pub mod extract;
pub mod handler;

use std::{borrow::Cow, fmt::Display, net::IpAddr, str::FromStr};

use serde::{Deserialize, Serialize};

pub use arf::builder::ArfReportBuilder;
pub use extract::abuse_address;
pub use handler::{Content, ContentHandler};

/// Product token written in the `User-Agent` field of generated reports.
pub const USER_AGENT: &str = "arf-message-generator/1.0";

pub const FEEDBACK_REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feedback<'x> {
    pub(crate) feedback_type: FeedbackType,
    pub(crate) user_agent: Cow<'x, str>,
    pub(crate) version: u32,

    pub(crate) arrival_date: Option<Cow<'x, str>>,
    pub(crate) authentication_results: Vec<Cow<'x, str>>,
    pub(crate) incidents: u32,
    pub(crate) original_envelope_id: Option<Cow<'x, str>>,
    pub(crate) original_mail_from: Option<Cow<'x, str>>,
    pub(crate) original_rcpt_to: Vec<Cow<'x, str>>,
    pub(crate) reported_domain: Vec<Cow<'x, str>>,
    pub(crate) reported_uri: Vec<Cow<'x, str>>,
    pub(crate) reporting_mta: Option<Cow<'x, str>>,
    pub(crate) source_ip: Option<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Serialize, Deserialize, Default)]
pub enum FeedbackType {
    #[default]
    Abuse,
    AuthFailure,
    Fraud,
    NotSpam,
    Other,
    Virus,
}

/// An ARF message: human readable text, machine readable feedback and
/// the reported message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArfReport<'x> {
    pub(crate) from: Cow<'x, str>,
    pub(crate) to: Cow<'x, str>,
    pub(crate) subject: Cow<'x, str>,
    pub(crate) human_text: Cow<'x, str>,
    pub(crate) feedback: Feedback<'x>,
    pub(crate) original: OriginalMessage<'x>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginalMessage<'x> {
    Message(Cow<'x, [u8]>),
    Headers(Cow<'x, [u8]>),
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Abuse => "abuse",
            FeedbackType::AuthFailure => "auth-failure",
            FeedbackType::Fraud => "fraud",
            FeedbackType::NotSpam => "not-spam",
            FeedbackType::Other => "other",
            FeedbackType::Virus => "virus",
        }
    }
}

impl Display for FeedbackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [
            FeedbackType::Abuse,
            FeedbackType::AuthFailure,
            FeedbackType::Fraud,
            FeedbackType::NotSpam,
            FeedbackType::Other,
            FeedbackType::Virus,
        ]
        .into_iter()
        .find(|ft| s.eq_ignore_ascii_case(ft.as_str()))
        .ok_or_else(|| crate::Error::UnknownFeedbackType(s.to_string()))
    }
}

impl<'x> OriginalMessage<'x> {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            OriginalMessage::Message(bytes) | OriginalMessage::Headers(bytes) => bytes,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OriginalMessage::Message(_) => "message/rfc822",
            OriginalMessage::Headers(_) => "text/rfc822-headers",
        }
    }

    pub fn into_owned<'y>(self) -> OriginalMessage<'y> {
        match self {
            OriginalMessage::Message(bytes) => OriginalMessage::Message(bytes.into_owned().into()),
            OriginalMessage::Headers(bytes) => OriginalMessage::Headers(bytes.into_owned().into()),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{report::FeedbackType, Error};

    #[test]
    fn feedback_type_tokens() {
        for (token, expected) in [
            ("abuse", FeedbackType::Abuse),
            ("Fraud", FeedbackType::Fraud),
            (" virus ", FeedbackType::Virus),
            ("other", FeedbackType::Other),
            ("NOT-SPAM", FeedbackType::NotSpam),
            ("auth-failure", FeedbackType::AuthFailure),
        ] {
            assert_eq!(token.parse::<FeedbackType>(), Ok(expected));
            assert!(expected.to_string().eq_ignore_ascii_case(token.trim()));
        }

        assert_eq!(
            "not-a-real-type".parse::<FeedbackType>(),
            Err(Error::UnknownFeedbackType("not-a-real-type".to_string()))
        );
        assert_eq!(FeedbackType::default(), FeedbackType::Abuse);
    }
}

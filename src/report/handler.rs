/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{
    borrow::Cow,
    io::{self, Read},
};

use crate::Error;

use super::Feedback;

/// Content types that can be read and written as typed objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentHandler {
    FeedbackReport,
    PlainText,
    Rfc822Message,
}

/// A decoded body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content<'x> {
    FeedbackReport(Feedback<'x>),
    Text(Cow<'x, str>),
    Message(Cow<'x, [u8]>),
}

impl ContentHandler {
    pub const ALL: [ContentHandler; 3] = [
        ContentHandler::FeedbackReport,
        ContentHandler::PlainText,
        ContentHandler::Rfc822Message,
    ];

    /// Looks up the handler for a content type. Parameters such as
    /// `charset` are ignored.
    pub fn for_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type
            .split_once(';')
            .map_or(content_type, |(ct, _)| ct)
            .trim();
        Self::ALL.into_iter().find(|handler| {
            handler
                .supported_flavors()
                .iter()
                .any(|flavor| flavor.eq_ignore_ascii_case(content_type))
        })
    }

    pub fn content_type(&self) -> &'static str {
        self.supported_flavors()[0]
    }

    pub fn description(&self) -> &'static str {
        match self {
            ContentHandler::FeedbackReport => "Feedback Report",
            ContentHandler::PlainText => "Plain Text",
            ContentHandler::Rfc822Message => "Message",
        }
    }

    pub fn supported_flavors(&self) -> &'static [&'static str] {
        match self {
            ContentHandler::FeedbackReport => &["message/feedback-report"],
            ContentHandler::PlainText => &["text/plain"],
            ContentHandler::Rfc822Message => &["message/rfc822", "text/rfc822-headers"],
        }
    }

    pub fn decode(&self, mut source: impl Read) -> crate::Result<Content<'static>> {
        let mut bytes = Vec::<u8>::new();
        source.read_to_end(&mut bytes)?;
        self.decode_bytes(&bytes).map(Content::into_owned)
    }

    pub fn decode_bytes<'x>(&self, bytes: &'x [u8]) -> crate::Result<Content<'x>> {
        match self {
            ContentHandler::FeedbackReport => Feedback::parse_arf(bytes).map(Content::FeedbackReport),
            ContentHandler::PlainText => Ok(Content::Text(String::from_utf8_lossy(bytes))),
            ContentHandler::Rfc822Message => Ok(Content::Message(bytes.into())),
        }
    }

    pub fn encode(&self, content: &Content<'_>, mut sink: impl io::Write) -> crate::Result<()> {
        match (self, content) {
            (ContentHandler::FeedbackReport, Content::FeedbackReport(feedback)) => {
                feedback.write_arf(&mut sink)?;
            }
            (ContentHandler::PlainText, Content::Text(text)) => {
                sink.write_all(text.as_bytes())?;
            }
            (ContentHandler::Rfc822Message, Content::Message(message)) => {
                sink.write_all(message)?;
            }
            _ => return Err(Error::UnsupportedContentObject),
        }
        Ok(())
    }
}

impl<'x> Content<'x> {
    pub fn into_owned<'y>(self) -> Content<'y> {
        match self {
            Content::FeedbackReport(feedback) => Content::FeedbackReport(feedback.into_owned()),
            Content::Text(text) => Content::Text(text.into_owned().into()),
            Content::Message(message) => Content::Message(message.into_owned().into()),
        }
    }

    pub fn into_feedback(self) -> Option<Feedback<'x>> {
        match self {
            Content::FeedbackReport(feedback) => Some(feedback),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        report::{Content, ContentHandler, Feedback, FeedbackType},
        Error,
    };

    #[test]
    fn content_handler_lookup() {
        assert_eq!(
            ContentHandler::for_content_type("message/feedback-report"),
            Some(ContentHandler::FeedbackReport)
        );
        assert_eq!(
            ContentHandler::for_content_type("Message/Feedback-Report; charset=us-ascii"),
            Some(ContentHandler::FeedbackReport)
        );
        assert_eq!(
            ContentHandler::for_content_type("text/rfc822-headers"),
            Some(ContentHandler::Rfc822Message)
        );
        assert_eq!(ContentHandler::for_content_type("application/pdf"), None);
        assert_eq!(
            ContentHandler::FeedbackReport.supported_flavors(),
            &["message/feedback-report"]
        );
        assert_eq!(
            ContentHandler::FeedbackReport.content_type(),
            "message/feedback-report"
        );
    }

    #[test]
    fn content_handler_feedback_report() {
        let handler = ContentHandler::FeedbackReport;
        let feedback = Feedback::new(FeedbackType::Fraud);

        let mut bytes = Vec::<u8>::new();
        handler
            .encode(&Content::FeedbackReport(feedback.clone()), &mut bytes)
            .unwrap();
        assert_eq!(bytes, feedback.as_arf().into_bytes());

        let decoded = handler.decode(&bytes[..]).unwrap();
        assert_eq!(decoded.into_feedback(), Some(feedback.into_owned()));

        assert_eq!(
            handler.decode(&b"Feedback-Type: spam-ish\r\n"[..]),
            Err(Error::UnknownFeedbackType("spam-ish".to_string()))
        );
        assert_eq!(
            handler.encode(&Content::Text("not a report".into()), &mut Vec::<u8>::new()),
            Err(Error::UnsupportedContentObject)
        );
    }

    #[test]
    fn content_handler_passthrough() {
        let message = b"Subject: hi\r\n\r\nbody\r\n";
        let mut bytes = Vec::<u8>::new();
        ContentHandler::Rfc822Message
            .encode(&Content::Message(message[..].into()), &mut bytes)
            .unwrap();
        assert_eq!(bytes, message);
        assert_eq!(
            ContentHandler::PlainText.decode(&b"hello"[..]).unwrap(),
            Content::Text("hello".into())
        );
        assert_eq!(
            ContentHandler::PlainText.encode(&Content::Message(message[..].into()), &mut bytes),
            Err(Error::UnsupportedContentObject)
        );
    }
}

/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use mail_parser::MessageParser;

use crate::{
    report::{abuse_address, ArfReport, Feedback, OriginalMessage},
    Error, HeaderStore,
};

const UNKNOWN: &str = "unknown";

/// Assembles an [`ArfReport`] around a previously received message.
#[derive(Debug, Clone)]
pub struct ArfReportBuilder<'x> {
    from: Cow<'x, str>,
    to: Cow<'x, str>,
    subject: Cow<'x, str>,
    source_ip: Option<Cow<'x, str>>,
    arrival_date: Option<Cow<'x, str>>,
    feedback: Feedback<'x>,
}

impl<'x> ArfReportBuilder<'x> {
    pub fn new(from: impl Into<Cow<'x, str>>, to: impl Into<Cow<'x, str>>) -> Self {
        ArfReportBuilder {
            from: from.into(),
            to: to.into(),
            subject: Cow::Borrowed(""),
            source_ip: None,
            arrival_date: None,
            feedback: Feedback::default(),
        }
    }

    /// Sets the subject of the report.
    pub fn subject(mut self, subject: impl Into<Cow<'x, str>>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the address the reported message was received from.
    pub fn source_ip(mut self, source_ip: impl Into<Cow<'x, str>>) -> Self {
        self.source_ip = Some(source_ip.into());
        self
    }

    /// Sets the date the reported message arrived.
    pub fn arrival_date(mut self, arrival_date: impl Into<Cow<'x, str>>) -> Self {
        self.arrival_date = Some(arrival_date.into());
        self
    }

    /// Replaces the default `abuse` feedback.
    pub fn feedback(mut self, feedback: Feedback<'x>) -> Self {
        self.feedback = feedback;
        self
    }

    /// Builds the report. The original message is embedded as is.
    pub fn build(self, original: &'x [u8]) -> ArfReport<'x> {
        let human_text = human_readable_text(
            self.source_ip.as_deref().unwrap_or(UNKNOWN),
            self.arrival_date.as_deref().unwrap_or(UNKNOWN),
        );

        ArfReport {
            from: self.from,
            to: self.to,
            subject: self.subject,
            human_text: human_text.into(),
            feedback: self.feedback,
            original: OriginalMessage::Message(original.into()),
        }
    }

    pub fn build_report(
        original: &'x [u8],
        from: &'x str,
        to: &'x str,
        subject: &'x str,
        source_ip: Option<&'x str>,
        arrival_date: Option<&'x str>,
    ) -> ArfReport<'x> {
        let mut builder = ArfReportBuilder::new(from, to).subject(subject);
        if let Some(source_ip) = source_ip {
            builder = builder.source_ip(source_ip);
        }
        if let Some(arrival_date) = arrival_date {
            builder = builder.arrival_date(arrival_date);
        }
        builder.build(original)
    }
}

impl<'x> ArfReport<'x> {
    /// Builds an abuse report for `raw_message` on behalf of `reporter`. The
    /// report goes to `abuse_to` when given, otherwise to `abuse@` the domain
    /// of the message's sender.
    pub fn from_message(
        raw_message: &'x [u8],
        reporter: &'x str,
        abuse_to: Option<&'x str>,
    ) -> crate::Result<Self> {
        let headers = HeaderStore::parse(raw_message)?;

        let to = match abuse_to {
            Some(abuse_to) => Cow::Borrowed(abuse_to),
            None => {
                let sender = sender_address(raw_message)
                    .or_else(|| headers.last_value("From").map(|from| from.trim().to_string()))
                    .ok_or_else(|| Error::MalformedSenderAddress(String::new()))?;
                abuse_address(None, &sender)?.into_owned().into()
            }
        };
        let source_ip = headers.source_ip();
        let arrival_date = headers.last_value("Date").map(str::trim);

        log::debug!(
            "Building ARF report for message from {:?} received on {:?}, reporting to {:?}.",
            source_ip,
            arrival_date,
            to
        );

        let mut builder = ArfReportBuilder::new(reporter, to).subject(headers.forwarded_subject());
        if let Some(source_ip) = source_ip {
            builder = builder.source_ip(source_ip.to_string());
        }
        if let Some(arrival_date) = arrival_date {
            builder = builder.arrival_date(arrival_date.to_string());
        }

        Ok(builder.build(raw_message))
    }
}

/// Address of the first `From` mailbox of a message.
pub fn sender_address(raw_message: &[u8]) -> Option<String> {
    let message = MessageParser::new().parse(raw_message)?;
    message
        .from()?
        .first()?
        .address()
        .map(|address| address.to_string())
}

/// Address of the first recipient of a message, looking at `To` then `Cc`.
pub fn recipient_address(raw_message: &[u8]) -> Option<String> {
    let message = MessageParser::new().parse(raw_message)?;
    let address = message
        .to()
        .into_iter()
        .chain(message.cc())
        .find_map(|addresses| addresses.first()?.address())
        .map(|address| address.to_string());
    address
}

fn human_readable_text(source_ip: &str, arrival_date: &str) -> String {
    format!(
        concat!(
            "This is an email abuse report for an email message received from IP\n",
            "{} on {}.  For more information\n",
            "about this format please see http://www.mipassoc.org/arf/.\n"
        ),
        source_ip, arrival_date
    )
}

#[cfg(test)]
mod test {
    use super::{recipient_address, sender_address, ArfReportBuilder};
    use crate::{
        report::{ArfReport, FeedbackType},
        Error,
    };

    const ORIGINAL: &str = concat!(
        "Received: from relay.example.org ([192.0.2.10]) by mx.example.com\r\n",
        "Received: from origin.example.net (origin.example.net [198.51.100.7])\r\n",
        "\tby relay.example.org\r\n",
        "From: \"Spammer\" <spammer@example.net>\r\n",
        "To: Victim <victim@example.com>, other@example.com\r\n",
        "Subject: Cheap watches\r\n",
        "Date: Tue, 1 Aug 2023 09:59:58 +0000\r\n",
        "\r\n",
        "Buy now!\r\n"
    );

    #[test]
    fn arf_report_build() {
        let report = ArfReportBuilder::build_report(
            ORIGINAL.as_bytes(),
            "victim@example.com",
            "abuse@example.net",
            "FW: Cheap watches",
            Some("198.51.100.7"),
            Some("Tue, 1 Aug 2023 09:59:58 +0000"),
        );

        assert_eq!(report.from(), "victim@example.com");
        assert_eq!(report.to(), "abuse@example.net");
        assert_eq!(report.subject(), "FW: Cheap watches");
        assert_eq!(
            report.human_text(),
            concat!(
                "This is an email abuse report for an email message received from IP\n",
                "198.51.100.7 on Tue, 1 Aug 2023 09:59:58 +0000.  For more information\n",
                "about this format please see http://www.mipassoc.org/arf/.\n"
            )
        );
        assert_eq!(report.feedback().feedback_type(), FeedbackType::Abuse);
        assert_eq!(report.feedback().version(), 1);
        assert_eq!(report.feedback().user_agent(), "arf-message-generator/1.0");
        assert!(std::ptr::eq(report.original_message(), ORIGINAL.as_bytes()));
    }

    #[test]
    fn arf_report_from_message() {
        let report =
            ArfReport::from_message(ORIGINAL.as_bytes(), "victim@example.com", None).unwrap();

        assert_eq!(report.to(), "abuse@example.net");
        assert_eq!(report.subject(), "FW: Cheap watches");
        assert!(report
            .human_text()
            .contains("\n198.51.100.7 on Tue, 1 Aug 2023 09:59:58 +0000."));

        let report = ArfReport::from_message(
            ORIGINAL.as_bytes(),
            "victim@example.com",
            Some("abuse@isp.example"),
        )
        .unwrap();
        assert_eq!(report.to(), "abuse@isp.example");

        assert_eq!(
            ArfReport::from_message(b"Subject: hi\r\n\r\n", "victim@example.com", None),
            Err(Error::MalformedSenderAddress(String::new()))
        );
        assert_eq!(
            ArfReport::from_message(b"From: nobody\r\n\r\n", "victim@example.com", None),
            Err(Error::MalformedSenderAddress("nobody".to_string()))
        );
        assert_eq!(
            ArfReport::from_message(b"garbage\r\n\r\n", "victim@example.com", None),
            Err(Error::MalformedHeaderBlock)
        );
    }

    #[test]
    fn message_addresses() {
        assert_eq!(
            sender_address(ORIGINAL.as_bytes()).as_deref(),
            Some("spammer@example.net")
        );
        assert_eq!(
            recipient_address(ORIGINAL.as_bytes()).as_deref(),
            Some("victim@example.com")
        );
        assert_eq!(
            recipient_address(b"Cc: copy@example.com\r\n\r\n").as_deref(),
            Some("copy@example.com")
        );
        assert_eq!(recipient_address(b"Subject: none\r\n\r\n"), None);
    }
}

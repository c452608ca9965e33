/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{
    borrow::Cow,
    io::{self, Write},
    net::IpAddr,
};

use mail_builder::{
    headers::{date::Date, text::Text, Header},
    mime::make_boundary,
};

use crate::report::{ArfReport, Content, ContentHandler, Feedback};

impl<'x> Feedback<'x> {
    /// Writes the `message/feedback-report` body. Optional fields come first,
    /// the report always ends with `Feedback-Type`, `User-Agent` and `Version`.
    pub fn write_arf(&self, mut writer: impl Write) -> io::Result<()> {
        let fields = self.fields();
        let mut fields = fields.iter().peekable();

        while let Some((name, value)) = fields.next() {
            write!(writer, "{}: {}", name, value)?;
            if fields.peek().is_some() {
                writer.write_all(b"\r\n")?;
            }
        }

        // The last field is written unterminated, this supplies its CRLF.
        writer.write_all(b"\r\n")
    }

    pub fn as_arf(&self) -> String {
        let mut arf = Vec::with_capacity(128);
        self.write_arf(&mut arf).ok();
        String::from_utf8(arf)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
    }

    fn fields(&self) -> Vec<(&'static str, Cow<'_, str>)> {
        let mut fields: Vec<(&'static str, Cow<'_, str>)> = Vec::with_capacity(8);

        if let Some(value) = &self.arrival_date {
            fields.push(("Arrival-Date", value.as_ref().into()));
        }
        for value in &self.authentication_results {
            fields.push(("Authentication-Results", value.as_ref().into()));
        }
        if self.incidents > 1 {
            fields.push(("Incidents", self.incidents.to_string().into()));
        }
        if let Some(value) = &self.original_envelope_id {
            fields.push(("Original-Envelope-Id", value.as_ref().into()));
        }
        if let Some(value) = &self.original_mail_from {
            fields.push(("Original-Mail-From", value.as_ref().into()));
        }
        for value in &self.original_rcpt_to {
            fields.push(("Original-Rcpt-To", value.as_ref().into()));
        }
        for value in &self.reported_domain {
            fields.push(("Reported-Domain", value.as_ref().into()));
        }
        for value in &self.reported_uri {
            fields.push(("Reported-URI", value.as_ref().into()));
        }
        if let Some(value) = &self.reporting_mta {
            fields.push((
                "Reporting-MTA",
                if value.contains(';') {
                    value.as_ref().into()
                } else {
                    format!("dns; {}", value).into()
                },
            ));
        }
        match &self.source_ip {
            Some(IpAddr::V4(ip)) => fields.push(("Source-IP", ip.to_string().into())),
            Some(IpAddr::V6(ip)) => fields.push(("Source-IP", format!("IPv6:{}", ip).into())),
            None => (),
        }

        fields.push(("Feedback-Type", self.feedback_type.as_str().into()));
        fields.push(("User-Agent", self.user_agent.as_ref().into()));
        fields.push(("Version", self.version.to_string().into()));

        fields
    }
}

impl<'x> ArfReport<'x> {
    /// Writes the report as a `multipart/report` message.
    pub fn write_rfc5322(&self, mut writer: impl Write) -> io::Result<()> {
        let boundary = make_boundary("_");

        write!(writer, "From: {}\r\n", self.from)?;
        write!(writer, "To: {}\r\n", self.to)?;
        writer.write_all(b"Subject: ")?;
        if self.subject.is_ascii() {
            writer.write_all(crlf(&self.subject).as_bytes())?;
            writer.write_all(b"\r\n")?;
        } else {
            Text::new(self.subject.as_ref()).write_header(&mut writer, "Subject: ".len())?;
        }
        write!(writer, "Date: {}\r\n", Date::now().to_rfc822())?;
        write!(
            writer,
            "Message-ID: <{}@{}>\r\n",
            make_boundary("."),
            message_id_domain(&self.from)
        )?;
        writer.write_all(b"Auto-Submitted: auto-generated\r\n")?;
        writer.write_all(b"MIME-Version: 1.0\r\n")?;
        write!(
            writer,
            "Content-Type: multipart/report; report-type=\"feedback-report\";\r\n\tboundary=\"{}\"\r\n\r\n",
            boundary
        )?;

        // Part I: human readable text
        let text = crlf(&self.human_text);
        write!(writer, "--{}\r\n", boundary)?;
        write!(
            writer,
            "Content-Type: text/plain; charset=\"utf-8\"\r\nContent-Transfer-Encoding: {}\r\n\r\n",
            transfer_encoding(text.as_bytes())
        )?;
        ContentHandler::PlainText.encode(&Content::Text(text), &mut writer)?;

        // Part II: machine readable feedback
        write!(writer, "\r\n--{}\r\n", boundary)?;
        writer.write_all(b"Content-Type: message/feedback-report\r\n\r\n")?;
        ContentHandler::FeedbackReport
            .encode(&Content::FeedbackReport(self.feedback.clone()), &mut writer)?;

        // Part III: original message
        let original = self.original.as_bytes();
        write!(writer, "\r\n--{}\r\n", boundary)?;
        write!(
            writer,
            "Content-Type: {}\r\nContent-Transfer-Encoding: {}\r\n\r\n",
            self.original.content_type(),
            transfer_encoding(original)
        )?;
        ContentHandler::Rfc822Message
            .encode(&Content::Message(original.into()), &mut writer)?;

        write!(writer, "\r\n--{}--\r\n", boundary)
    }

    pub fn as_rfc5322(&self) -> io::Result<String> {
        let mut buf = Vec::new();
        self.write_rfc5322(&mut buf)?;
        String::from_utf8(buf).map_err(|err| io::Error::new(io::ErrorKind::Other, err))
    }

    pub fn to_rfc5322_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.original.as_bytes().len() + 1024);
        self.write_rfc5322(&mut buf)?;
        Ok(buf)
    }
}

/// Domain of the `From` address, which may be a bare address or a
/// `Name <address>` mailbox.
fn message_id_domain(from: &str) -> &str {
    let address = from.rsplit_once('<').map_or(from, |(_, address)| {
        address.split_once('>').map_or(address, |(address, _)| address)
    });
    address
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim())
        .filter(|domain| {
            !domain.is_empty()
                && domain
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '[' | ']' | ':'))
        })
        .unwrap_or("localhost")
}

fn transfer_encoding(bytes: &[u8]) -> &'static str {
    if bytes.is_ascii() {
        "7bit"
    } else {
        "8bit"
    }
}

/// Converts bare LF line endings to CRLF.
fn crlf(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    if !bytes
        .iter()
        .enumerate()
        .any(|(pos, &ch)| ch == b'\n' && (pos == 0 || bytes[pos - 1] != b'\r'))
    {
        return text.into();
    }

    let mut result = String::with_capacity(text.len() + 8);
    for (pos, line) in text.split('\n').enumerate() {
        if pos > 0 {
            result.push_str("\r\n");
        }
        result.push_str(line.strip_suffix('\r').unwrap_or(line));
    }
    result.into()
}

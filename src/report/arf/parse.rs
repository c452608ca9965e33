/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use mail_parser::{MessageParser, MimeHeaders, PartType};

use crate::{
    report::{ArfReport, ContentHandler, Feedback, FeedbackType, OriginalMessage},
    Error, HeaderStore,
};

impl<'x> Feedback<'x> {
    /// Parses a `message/feedback-report` body. A missing `Feedback-Type`
    /// leaves the default `abuse` type in place.
    pub fn parse_arf(arf: &'x [u8]) -> crate::Result<Self> {
        let fields = HeaderStore::parse(arf)?;
        let mut f = Feedback::default();
        let mut has_ft = false;

        for field in fields.headers {
            let key = field.name.as_bytes();
            let value = trim(field.value);

            match key.first() {
                Some(b'A' | b'a') => {
                    if key.eq_ignore_ascii_case(b"Arrival-Date") {
                        f.arrival_date = Some(value);
                    } else if key.eq_ignore_ascii_case(b"Authentication-Results") {
                        f.authentication_results.push(value);
                    }
                }
                Some(b'F' | b'f') => {
                    if key.eq_ignore_ascii_case(b"Feedback-Type") {
                        let feedback_type = value.parse::<FeedbackType>()?;
                        if !has_ft {
                            f.feedback_type = feedback_type;
                            has_ft = true;
                        }
                    }
                }
                Some(b'I' | b'i') => {
                    if key.eq_ignore_ascii_case(b"Incidents") {
                        f.incidents = value.parse::<u32>().unwrap_or(1).max(1);
                    }
                }
                Some(b'O' | b'o') => {
                    if key.eq_ignore_ascii_case(b"Original-Envelope-Id") {
                        f.original_envelope_id = Some(value);
                    } else if key.eq_ignore_ascii_case(b"Original-Mail-From") {
                        f.original_mail_from = Some(value);
                    } else if key.eq_ignore_ascii_case(b"Original-Rcpt-To") {
                        f.original_rcpt_to.push(value);
                    }
                }
                Some(b'R' | b'r') => {
                    if key.eq_ignore_ascii_case(b"Reported-Domain") {
                        f.reported_domain.push(value);
                    } else if key.eq_ignore_ascii_case(b"Reported-URI") {
                        f.reported_uri.push(value);
                    } else if key.eq_ignore_ascii_case(b"Reporting-MTA") {
                        f.reporting_mta = Some(match value {
                            Cow::Borrowed(mta) => Cow::Borrowed(strip_mta_type(mta)),
                            Cow::Owned(mta) => strip_mta_type(&mta).to_string().into(),
                        });
                    } else if key.eq_ignore_ascii_case(b"Received-Date") {
                        f.arrival_date = Some(value);
                    }
                }
                Some(b'S' | b's') => {
                    if key.eq_ignore_ascii_case(b"Source-IP") {
                        let ip = value.split_once(' ').map_or(value.as_ref(), |(ip, _)| ip);
                        f.source_ip = strip_prefix_ignore_case(ip, "IPv6:")
                            .unwrap_or(ip)
                            .parse()
                            .ok();
                    }
                }
                Some(b'U' | b'u') => {
                    if key.eq_ignore_ascii_case(b"User-Agent") {
                        f.user_agent = value;
                    }
                }
                Some(b'V' | b'v') => {
                    if key.eq_ignore_ascii_case(b"Version") {
                        if let Ok(version @ 1..) = value.parse::<u32>() {
                            f.version = version;
                        }
                    }
                }
                _ => (),
            }
        }

        Ok(f)
    }
}

impl<'x> ArfReport<'x> {
    /// Parses an ARF message. The `message/feedback-report` part is
    /// mandatory, the others default to empty.
    pub fn parse_rfc5322(message: &'x [u8]) -> crate::Result<Self> {
        let parsed = MessageParser::new()
            .parse(message)
            .ok_or(Error::MailParseError)?;

        let address = |addr: Option<&mail_parser::Address<'_>>| -> Cow<'x, str> {
            addr.and_then(|addr| addr.first())
                .and_then(|addr| addr.address())
                .unwrap_or_default()
                .to_string()
                .into()
        };
        let from = address(parsed.from());
        let to = address(parsed.to());
        let subject: Cow<'x, str> = parsed.subject().unwrap_or_default().to_string().into();

        let mut feedback: Option<Feedback<'x>> = None;
        let mut human_text: Option<Cow<'x, str>> = None;
        let mut original: Option<OriginalMessage<'x>> = None;

        for part in parsed.parts {
            let arf = match part.body {
                PartType::Text(arf) | PartType::Html(arf)
                    if part.is_content_type("message", "feedback-report") =>
                {
                    match arf {
                        Cow::Borrowed(arf) => Cow::Borrowed(arf.as_bytes()),
                        Cow::Owned(arf) => Cow::Owned(arf.into_bytes()),
                    }
                }
                PartType::Binary(arf) | PartType::InlineBinary(arf)
                    if part.is_content_type("message", "feedback-report") =>
                {
                    arf
                }
                PartType::Text(text)
                    if human_text.is_none() && part.is_content_type("text", "plain") =>
                {
                    human_text = text.into();
                    continue;
                }
                PartType::Text(headers) if part.is_content_type("text", "rfc822-headers") => {
                    original = OriginalMessage::Headers(match headers {
                        Cow::Borrowed(headers) => Cow::Borrowed(headers.as_bytes()),
                        Cow::Owned(headers) => Cow::Owned(headers.into_bytes()),
                    })
                    .into();
                    continue;
                }
                PartType::Message(_) => {
                    original = OriginalMessage::Message(
                        message
                            .get(part.offset_body..part.offset_end)
                            .unwrap_or_default()
                            .into(),
                    )
                    .into();
                    continue;
                }
                _ => continue,
            };

            let handler = ContentHandler::FeedbackReport;
            feedback = match arf {
                Cow::Borrowed(arf) => handler.decode_bytes(arf)?,
                Cow::Owned(arf) => handler.decode_bytes(&arf)?.into_owned(),
            }
            .into_feedback();
        }

        let feedback = feedback.ok_or(Error::NoReportsFound)?;

        log::debug!(
            "Parsed ARF report of type {} from {:?} to {:?}.",
            feedback.feedback_type(),
            from,
            to
        );

        Ok(ArfReport {
            from,
            to,
            subject,
            human_text: human_text.unwrap_or_default(),
            feedback,
            original: original.unwrap_or(OriginalMessage::Message(Cow::Borrowed(&[]))),
        })
    }
}

fn strip_mta_type(mta: &str) -> &str {
    strip_prefix_ignore_case(mta, "dns;").unwrap_or(mta).trim()
}

fn strip_prefix_ignore_case<'x>(value: &'x str, prefix: &str) -> Option<&'x str> {
    value
        .get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .and_then(|_| value.get(prefix.len()..))
}

fn trim(value: Cow<'_, str>) -> Cow<'_, str> {
    match value {
        Cow::Borrowed(value) => Cow::Borrowed(value.trim()),
        Cow::Owned(value) if value.trim().len() == value.len() => Cow::Owned(value),
        Cow::Owned(value) => Cow::Owned(value.trim().to_string()),
    }
}

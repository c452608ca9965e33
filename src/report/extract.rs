/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use crate::{Error, HeaderStore};

const FORWARD_PREFIX: &str = "FW: ";

impl<'x> HeaderStore<'x> {
    /// Returns the last `[...]` literal found while walking every `Received`
    /// header from top to bottom. The literal is not validated as an address.
    pub fn source_ip(&self) -> Option<&str> {
        self.all_values("Received")
            .flat_map(BracketedLiterals::new)
            .last()
    }

    /// Builds the subject of the report: `FW: ` followed by every `Subject`
    /// value, concatenated without a separator.
    pub fn forwarded_subject(&self) -> String {
        self.all_values("Subject").fold(
            String::from(FORWARD_PREFIX),
            |mut subject, value| {
                subject.push_str(value);
                subject
            },
        )
    }
}

/// Returns `explicit` when given, otherwise `abuse@` followed by the domain of
/// `sender` (the text after its last `@`).
pub fn abuse_address<'x>(explicit: Option<&'x str>, sender: &str) -> crate::Result<Cow<'x, str>> {
    if let Some(explicit) = explicit {
        return Ok(explicit.into());
    }

    match sender.rsplit_once('@') {
        Some((_, domain)) if !domain.is_empty() => Ok(format!("abuse@{}", domain).into()),
        _ => Err(Error::MalformedSenderAddress(sender.to_string())),
    }
}

/// Iterates over the shortest `[...]` substrings of a value. A literal
/// never spans a line break.
struct BracketedLiterals<'x> {
    value: &'x str,
    pos: usize,
}

impl<'x> BracketedLiterals<'x> {
    fn new(value: &'x str) -> Self {
        BracketedLiterals { value, pos: 0 }
    }
}

impl<'x> Iterator for BracketedLiterals<'x> {
    type Item = &'x str;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.value.as_bytes();

        while let Some(open) = bytes
            .get(self.pos..)?
            .iter()
            .position(|&ch| ch == b'[')
            .map(|offset| self.pos + offset)
        {
            for (offset, &ch) in bytes[open + 1..].iter().enumerate() {
                match ch {
                    b']' => {
                        let close = open + 1 + offset;
                        self.pos = close + 1;
                        return self.value.get(open + 1..close);
                    }
                    b'\r' | b'\n' => break,
                    _ => (),
                }
            }
            self.pos = open + 1;
        }

        self.pos = bytes.len();
        None
    }
}

#[cfg(test)]
mod test {
    use super::{abuse_address, BracketedLiterals};
    use crate::{Error, HeaderStore};

    #[test]
    fn source_ip_extract() {
        for (message, expected) in [
            ("Subject: no trace headers\r\n\r\n", None),
            ("Received: from localhost by mx\r\n\r\n", None),
            (
                "Received: from mail.example.net (mail.example.net [198.51.100.7]) by mx\r\n\r\n",
                Some("198.51.100.7"),
            ),
            (
                concat!(
                    "Received: from relay.example.org ([192.0.2.10]) by mx.example.com\r\n",
                    "Received: from origin.example.net ([198.51.100.7])\r\n",
                    "\tby relay.example.org\r\n",
                    "Subject: test [not an ip]\r\n\r\n"
                ),
                Some("198.51.100.7"),
            ),
            (
                concat!(
                    "Received: from a ([192.0.2.1]) by b ([192.0.2.2])\r\n",
                    "X-Other: [203.0.113.9]\r\n",
                    "Received: from c by d\r\n\r\n"
                ),
                Some("192.0.2.2"),
            ),
            (
                "Received: from a ([IPv6:2001:db8::1]) by b\r\n\r\n",
                Some("IPv6:2001:db8::1"),
            ),
        ] {
            let store = HeaderStore::parse(message.as_bytes()).unwrap();
            assert_eq!(store.source_ip(), expected, "{message:?}");
        }
    }

    #[test]
    fn bracketed_literals() {
        for (value, expected) in [
            ("[a] [b]", vec!["a", "b"]),
            ("[a[b] c]", vec!["a[b"]),
            ("[]", vec![""]),
            ("[open\r\n\t[closed]", vec!["closed"]),
            ("no brackets ] here [", vec![]),
        ] {
            assert_eq!(
                BracketedLiterals::new(value).collect::<Vec<_>>(),
                expected,
                "{value:?}"
            );
        }
    }

    #[test]
    fn forwarded_subject() {
        for (message, expected) in [
            ("Subject: Hello\r\n\r\n", "FW: Hello"),
            ("Subject: A\r\nSubject: B\r\n\r\n", "FW: AB"),
            ("From: a@b.c\r\n\r\n", "FW: "),
            ("SUBJECT: Re: offer\r\n\r\n", "FW: Re: offer"),
        ] {
            let store = HeaderStore::parse(message.as_bytes()).unwrap();
            assert_eq!(store.forwarded_subject(), expected);
        }
    }

    #[test]
    fn abuse_address_resolve() {
        assert_eq!(
            abuse_address(None, "user@example.com").unwrap(),
            "abuse@example.com"
        );
        assert_eq!(
            abuse_address(Some("x@y.com"), "user@example.com").unwrap(),
            "x@y.com"
        );
        assert_eq!(
            abuse_address(Some("x@y.com"), "no-at-sign").unwrap(),
            "x@y.com"
        );
        assert_eq!(
            abuse_address(None, "\"odd@local\"@mail.example.org").unwrap(),
            "abuse@mail.example.org"
        );
        assert_eq!(
            abuse_address(None, "nobody"),
            Err(Error::MalformedSenderAddress("nobody".to_string()))
        );
        assert_eq!(
            abuse_address(None, "nobody@"),
            Err(Error::MalformedSenderAddress("nobody@".to_string()))
        );
    }
}

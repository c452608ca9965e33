/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{
    iter::{Enumerate, Peekable},
    slice::Iter,
};

use crate::Error;

#[derive(Clone, Copy)]
enum State {
    Name { start: usize },
    Value { start: usize, colon: usize },
}

/// Splits a header block into raw `(name, value)` pairs. Values keep their
/// leading whitespace, folding and line terminator.
pub(crate) struct HeaderIterator<'x> {
    message: &'x [u8],
    iter: Peekable<Enumerate<Iter<'x, u8>>>,
    state: State,
    done: bool,
}

impl<'x> HeaderIterator<'x> {
    pub fn new(message: &'x [u8]) -> Self {
        HeaderIterator {
            message,
            iter: message.iter().enumerate().peekable(),
            state: State::Name { start: 0 },
            done: false,
        }
    }

    pub fn body_offset(&mut self) -> Option<usize> {
        self.iter.peek().map(|(pos, _)| *pos)
    }
}

impl<'x> Iterator for HeaderIterator<'x> {
    type Item = crate::Result<(&'x [u8], &'x [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut last_ch = 0;
        while let Some((pos, &ch)) = self.iter.next() {
            if ch == b':' {
                if let State::Name { start } = self.state {
                    self.state = State::Value { start, colon: pos };
                }
            } else if ch == b'\n' {
                let is_folded = self
                    .iter
                    .peek()
                    .map_or(false, |(_, next_byte)| [b' ', b'\t'].contains(next_byte));

                match self.state {
                    State::Value { start, colon } => {
                        if !is_folded {
                            let header_name = self.message.get(start..colon).unwrap_or_default();
                            let header_value =
                                self.message.get(colon + 1..pos + 1).unwrap_or_default();
                            self.state = State::Name { start: pos + 1 };
                            return Some(Ok((header_name, header_value)));
                        }
                    }
                    State::Name { start } => {
                        if start == pos || (start + 1 == pos && last_ch == b'\r') {
                            // End of headers
                            self.done = true;
                            return None;
                        } else if !is_folded {
                            // Line without a colon
                            self.done = true;
                            return Some(Err(Error::MalformedHeaderBlock));
                        }
                    }
                }
            }

            last_ch = ch;
        }

        // End of input before a blank line.
        self.done = true;
        match self.state {
            State::Value { start, colon } => Some(Ok((
                self.message.get(start..colon).unwrap_or_default(),
                self.message.get(colon + 1..).unwrap_or_default(),
            ))),
            State::Name { start } => {
                if self
                    .message
                    .get(start..)
                    .unwrap_or_default()
                    .iter()
                    .all(|ch| ch.is_ascii_whitespace())
                {
                    None
                } else {
                    Some(Err(Error::MalformedHeaderBlock))
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::HeaderIterator;
    use crate::Error;

    #[test]
    fn header_iterator() {
        for (message, headers) in [
            (
                "From: a\nTo: b\nEmpty:\nMulti: 1\n 2\nSubject: c\n\nNot-header: ignore\n",
                vec![
                    ("From", " a\n"),
                    ("To", " b\n"),
                    ("Empty", "\n"),
                    ("Multi", " 1\n 2\n"),
                    ("Subject", " c\n"),
                ],
            ),
            (
                concat!(
                    "A: X\r\n",
                    "B : Y\t\r\n",
                    "\tZ  \r\n",
                    "\r\n",
                    " C \r\n",
                    "D \t E\r\n"
                ),
                vec![("A", " X\r\n"), ("B ", " Y\t\r\n\tZ  \r\n")],
            ),
            (
                "Feedback-Type: abuse\r\nVersion: 1",
                vec![("Feedback-Type", " abuse\r\n"), ("Version", " 1")],
            ),
            ("", vec![]),
            ("\r\nBody: only\r\n", vec![]),
        ] {
            assert_eq!(
                HeaderIterator::new(message.as_bytes())
                    .map(|result| {
                        let (h, v) = result.unwrap();
                        (
                            std::str::from_utf8(h).unwrap(),
                            std::str::from_utf8(v).unwrap(),
                        )
                    })
                    .collect::<Vec<_>>(),
                headers
            );
        }
    }

    #[test]
    fn header_iterator_errors() {
        for message in [
            "From: a\r\nnot a header\r\nTo: b\r\n\r\n",
            "From: a\r\ntrailing garbage",
            "no colon at all\n\n",
        ] {
            assert_eq!(
                HeaderIterator::new(message.as_bytes())
                    .find_map(|result| result.err()),
                Some(Error::MalformedHeaderBlock),
                "{message:?}"
            );
        }
    }

    #[test]
    fn header_iterator_body_offset() {
        let message = b"Subject: hi\r\n\r\nbody\r\n";
        let mut iter = HeaderIterator::new(message);
        assert_eq!(iter.by_ref().count(), 1);
        assert_eq!(iter.body_offset(), Some(15));
    }
}

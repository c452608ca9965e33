/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use crate::{Error, HeaderStore, RawHeader};

use super::headers::HeaderIterator;

impl<'x> HeaderStore<'x> {
    /// Parses the header block of a message. The block ends at the first
    /// empty line or at the end of the input.
    pub fn parse(raw_message: &'x [u8]) -> crate::Result<Self> {
        let mut headers = Vec::new();
        let mut iter = HeaderIterator::new(raw_message);

        for header in iter.by_ref() {
            let (name, value) = header?;
            let name = name.trim_ascii_end_wsp();
            if name.is_empty() || !name.iter().all(|&ch| (33..=126).contains(&ch)) {
                return Err(Error::MalformedHeaderBlock);
            }

            headers.push(RawHeader {
                name: String::from_utf8_lossy(name),
                value: String::from_utf8_lossy(value.trim_value()),
            });
        }

        Ok(HeaderStore {
            headers,
            body: iter
                .body_offset()
                .and_then(|offset| raw_message.get(offset..))
                .unwrap_or_default(),
        })
    }

    /// All values of the header `name`, in the order they appear.
    pub fn all_values<'y>(&'y self, name: &'y str) -> impl Iterator<Item = &'y str> + 'y {
        self.headers
            .iter()
            .filter(move |header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_ref())
    }

    pub fn last_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawHeader<'x>> {
        self.headers.iter()
    }

    pub fn body(&self) -> &'x [u8] {
        self.body
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn into_owned<'y>(self) -> HeaderStore<'y> {
        HeaderStore {
            headers: self
                .headers
                .into_iter()
                .map(|header| header.into_owned())
                .collect(),
            body: &[],
        }
    }
}

impl<'x> RawHeader<'x> {
    pub fn new(name: impl Into<Cow<'x, str>>, value: impl Into<Cow<'x, str>>) -> Self {
        RawHeader {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_owned<'y>(self) -> RawHeader<'y> {
        RawHeader {
            name: self.name.into_owned().into(),
            value: self.value.into_owned().into(),
        }
    }
}

trait TrimHeader {
    fn trim_ascii_end_wsp(&self) -> &Self;
    fn trim_value(&self) -> &Self;
}

impl TrimHeader for [u8] {
    fn trim_ascii_end_wsp(&self) -> &Self {
        let end = self
            .iter()
            .rposition(|ch| ![b' ', b'\t'].contains(ch))
            .map_or(0, |pos| pos + 1);
        &self[..end]
    }

    fn trim_value(&self) -> &Self {
        let start = self
            .iter()
            .position(|ch| ![b' ', b'\t'].contains(ch))
            .unwrap_or(self.len());
        let value = &self[start..];
        let value = value.strip_suffix(b"\n").unwrap_or(value);
        value.strip_suffix(b"\r").unwrap_or(value)
    }
}

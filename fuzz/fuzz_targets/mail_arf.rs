/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

#![no_main]
use libfuzzer_sys::fuzz_target;

use mail_arf::{
    report::{ArfReport, Feedback},
    HeaderStore,
};

static RFC822_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz:=-[]@; \t\r\n";
static ARF_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz-:;. \r\n";

fuzz_target!(|data: &[u8]| {
    let data_rfc822 = into_alphabet(data, RFC822_ALPHABET);
    let data_arf = into_alphabet(data, ARF_ALPHABET);

    for data in [data, &data_rfc822[..]] {
        if let Ok(headers) = HeaderStore::parse(data) {
            headers.source_ip();
            headers.forwarded_subject();
        }
        if let Ok(report) = ArfReport::from_message(data, "fuzz@example.org", None) {
            report.to_rfc5322_bytes().ok();
        }
        ArfReport::parse_rfc5322(data).ok();
    }

    Feedback::parse_arf(data).ok();
    Feedback::parse_arf(&data_arf).ok();
});

fn into_alphabet(data: &[u8], alphabet: &[u8]) -> Vec<u8> {
    data.iter()
        .map(|&byte| alphabet[byte as usize % alphabet.len()])
        .collect()
}

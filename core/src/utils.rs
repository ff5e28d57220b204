// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Utility functions and types.

use std::fmt::Debug;

use http::uri::Scheme;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
pub static QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a raw query name or value.
pub fn encode_query_component(raw: &str) -> String {
    utf8_percent_encode(raw, &QUERY_ENCODE_SET).to_string()
}

/// Redacts a string by replacing all but the first and last three characters with asterisks.
///
/// - If the input string has fewer than 12 characters, it should be entirely redacted.
/// - If the input string has 12 or more characters, only the first three and the last three.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value {
            None => Redact(""),
            Some(v) => Redact(v),
        }
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let length = self.0.len();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 {
            f.write_str("***")
        } else {
            f.write_str(&self.0[..3])?;
            f.write_str("***")?;
            f.write_str(&self.0[length - 3..])
        }
    }
}

/// Check whether `port` is the standard port for `scheme`.
///
/// `None` always counts as standard: the scheme's default applies.
pub fn is_standard_port(scheme: &Scheme, port: Option<u16>) -> bool {
    match port {
        None => true,
        Some(80) => *scheme == Scheme::HTTP,
        Some(443) => *scheme == Scheme::HTTPS,
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_redact() {
        let cases = vec![
            ("Short", "***"),
            ("Hello World!", "Hel***ld!"),
            ("This is a longer string", "Thi***ing"),
            ("", "EMPTY"),
            ("HelloWorld", "***"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                format!("{:?}", Redact(input)),
                expected,
                "Failed on input: {}",
                input
            );
        }
    }

    #[test]
    fn test_encode_query_component() {
        assert_eq!(encode_query_component("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode_query_component("a b+c/d"), "a%20b%2Bc%2Fd");
        assert_eq!(encode_query_component("é"), "%C3%A9");
    }

    #[test_case(Scheme::HTTP, None, true; "http without port")]
    #[test_case(Scheme::HTTPS, None, true; "https without port")]
    #[test_case(Scheme::HTTP, Some(80), true; "http on 80")]
    #[test_case(Scheme::HTTPS, Some(443), true; "https on 443")]
    #[test_case(Scheme::HTTP, Some(443), false; "http on 443")]
    #[test_case(Scheme::HTTPS, Some(80), false; "https on 80")]
    #[test_case(Scheme::HTTPS, Some(8443), false; "https on 8443")]
    fn test_is_standard_port(scheme: Scheme, port: Option<u16>, expected: bool) {
        assert_eq!(is_standard_port(&scheme, port), expected);
    }
}

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

use percent_encoding::percent_decode_str;
use sigbridge_core::{Error, Result};

/// Decode an `application/x-www-form-urlencoded` query name or value.
///
/// `+` decodes to a space and `%XX` to the byte `XX`. Unlike lenient
/// decoders, a `%` that is not followed by two hex digits is an error, and so
/// is a result that is not valid UTF-8. Unreserved characters pass through,
/// so decoding an already decoded component built from them is a no-op.
pub fn decode_query_component(raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    let mut idx = 0;
    while let Some(pos) = bytes[idx..].iter().position(|b| *b == b'%') {
        let at = idx + pos;
        let valid = bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(Error::signing(format!(
                "malformed percent escape at byte {at} in query component {raw:?}"
            )));
        }
        idx = at + 3;
    }

    let plus_decoded = raw.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8()
        .map(|v| v.into_owned())
        .map_err(|e| {
            Error::signing(format!("query component {raw:?} is not valid UTF-8")).with_source(e)
        })
}

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

use std::collections::BTreeMap;
use std::fmt::Write;

use http::header::{self, HeaderValue};
use http::{HeaderMap, Method, Uri};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use sigbridge_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use sigbridge_core::time::{format_date, format_iso8601, now, DateTime};
use sigbridge_core::{Error, Result, TransportRequest};

use crate::constants::*;
use crate::query::decode_query_component;
use crate::Credential;

/// Headers that are never part of the signature.
///
/// Proxies and transports add or rewrite them on the way out.
const UNSIGNED_HEADERS: [&str; 6] = [
    "authorization",
    "user-agent",
    "x-amzn-trace-id",
    "expect",
    "transfer-encoding",
    "connection",
];

/// RequestSigner that implement AWS SigV4 in header mode.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
#[derive(Debug, Clone)]
pub struct RequestSigner {
    service: String,
    region: String,
    content_sha256_header: bool,
    double_encode_path: bool,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for `service` in `region`.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
            content_sha256_header: false,
            double_encode_path: true,

            time: None,
        }
    }

    /// Also send the payload hash as `x-amz-content-sha256`.
    pub fn with_content_sha256_header(mut self, enabled: bool) -> Self {
        self.content_sha256_header = enabled;
        self
    }

    /// Encode the already encoded path once more, as every service except S3
    /// expects. Enabled by default.
    pub fn with_double_encode_path(mut self, enabled: bool) -> Self {
        self.double_encode_path = enabled;
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Compute the headers that sign `req`.
    ///
    /// `payload_hash` is the hex encoded SHA-256 of the exact bytes that will
    /// be sent. `req` is left untouched so that callers can merge the result
    /// only once everything succeeded.
    pub fn sign(
        &self,
        req: &TransportRequest,
        payload_hash: &str,
        cred: &Credential,
    ) -> Result<HeaderMap> {
        let now = self.time.unwrap_or_else(now);

        let uri: Uri = req.url.parse().map_err(|e| {
            Error::signing(format!("request url {} is invalid", req.url)).with_source(e)
        })?;
        let authority = uri
            .authority()
            .ok_or_else(|| Error::signing(format!("request url {} has no host", req.url)))?;

        let mut signing = HeaderMap::new();
        signing.insert(X_AMZ_DATE, HeaderValue::try_from(format_iso8601(now))?);
        if let Some(token) = &cred.session_token {
            let mut value = HeaderValue::from_str(token)?;
            // Set token value sensitive to avoid leaking.
            value.set_sensitive(true);
            signing.insert(X_AMZ_SECURITY_TOKEN, value);
        }
        if self.content_sha256_header {
            signing.insert(X_AMZ_CONTENT_SHA_256, HeaderValue::from_str(payload_hash)?);
        }

        let headers = canonical_headers(&req.headers, &signing, authority.as_str())?;
        let signed_headers = headers.keys().map(String::as_str).collect::<Vec<_>>().join(";");

        let path = canonical_path(uri.path(), self.double_encode_path)?;
        let query = canonical_query(&req.query)?;
        let creq = canonical_request_string(
            &req.method,
            &path,
            &query,
            &headers,
            &signed_headers,
            payload_hash,
        )?;
        debug!("calculated canonical request: {creq}");

        // Scope: "20220313/<region>/<service>/aws4_request"
        let scope = format!(
            "{}/{}/{}/aws4_request",
            format_date(now),
            self.region,
            self.service
        );
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20220313T072004Z
        // 20220313/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = {
            let mut f = String::new();
            writeln!(f, "AWS4-HMAC-SHA256")?;
            writeln!(f, "{}", format_iso8601(now))?;
            writeln!(f, "{}", &scope)?;
            write!(f, "{}", hex_sha256(creq.as_bytes()))?;
            f
        };
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key =
            generate_signing_key(&cred.secret_access_key, now, &self.region, &self.service);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let mut authorization = HeaderValue::from_str(&format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            cred.access_key_id, scope, signed_headers, signature
        ))?;
        authorization.set_sensitive(true);
        signing.insert(header::AUTHORIZATION, authorization);

        Ok(signing)
    }
}

/// Lower-cased header names mapped to their normalized values.
///
/// Signing headers replace request headers of the same name. Values of a
/// repeated header are joined with `,`.
fn canonical_headers(
    headers: &HeaderMap,
    signing: &HeaderMap,
    authority: &str,
) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();

    for name in headers.keys() {
        if UNSIGNED_HEADERS.contains(&name.as_str()) || signing.contains_key(name) {
            continue;
        }
        let mut values = Vec::new();
        for value in headers.get_all(name) {
            let value = value.to_str().map_err(|e| {
                Error::signing(format!("header {name} is not visible ascii")).with_source(e)
            })?;
            values.push(normalize_header_value(value));
        }
        out.insert(name.as_str().to_string(), values.join(","));
    }

    for (name, value) in signing {
        let value = value.to_str().map_err(|e| {
            Error::signing(format!("header {name} is not visible ascii")).with_source(e)
        })?;
        out.insert(name.as_str().to_string(), normalize_header_value(value));
    }

    out.entry(header::HOST.as_str().to_string())
        .or_insert_with(|| authority.to_string());
    Ok(out)
}

/// Trim the value and collapse inner runs of whitespace.
fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonical_path(path: &str, double_encode: bool) -> Result<String> {
    let path = if path.is_empty() { "/" } else { path };
    if double_encode {
        return Ok(utf8_percent_encode(path, &AWS_URI_ENCODE_SET).to_string());
    }

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|e| Error::signing(format!("path {path} is not valid UTF-8")).with_source(e))?;
    Ok(utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string())
}

/// Decode the encoded pairs, encode them the SigV4 way and sort.
fn canonical_query(query: &[(String, String)]) -> Result<String> {
    let mut pairs = query
        .iter()
        .map(|(k, v)| {
            Ok((
                utf8_percent_encode(&decode_query_component(k)?, &AWS_QUERY_ENCODE_SET)
                    .to_string(),
                utf8_percent_encode(&decode_query_component(v)?, &AWS_QUERY_ENCODE_SET)
                    .to_string(),
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    pairs.sort();

    Ok(pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&"))
}

fn canonical_request_string(
    method: &Method,
    path: &str,
    query: &str,
    headers: &BTreeMap<String, String>,
    signed_headers: &str,
    payload_hash: &str,
) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    writeln!(f, "{method}")?;
    writeln!(f, "{path}")?;
    writeln!(f, "{query}")?;
    for (name, value) in headers {
        writeln!(f, "{name}:{value}")?;
    }
    writeln!(f)?;
    writeln!(f, "{signed_headers}")?;
    write!(f, "{payload_hash}")?;

    Ok(f)
}

fn generate_signing_key(secret: &str, time: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use aws_credential_types::Credentials;
    use aws_sigv4::http_request::PayloadChecksumKind;
    use aws_sigv4::http_request::PercentEncodingMode;
    use aws_sigv4::http_request::SignableBody;
    use aws_sigv4::http_request::SignableRequest;
    use aws_sigv4::http_request::SigningSettings;
    use aws_sigv4::sign::v4;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use sigbridge_core::utils::encode_query_component;
    use test_case::test_case;

    fn request(
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TransportRequest {
        let mut req = TransportRequest::new(method, url);
        req.query = query
            .iter()
            .map(|(k, v)| (encode_query_component(k), encode_query_component(v)))
            .collect();
        for (k, v) in headers {
            req.headers.append(
                header::HeaderName::from_bytes(k.as_bytes()).expect("header name must be valid"),
                HeaderValue::from_str(v).expect("header value must be valid"),
            );
        }
        req
    }

    fn aws_sign(
        req: &TransportRequest,
        body: &[u8],
        token: Option<&str>,
        content_sha256: bool,
        encoding: PercentEncodingMode,
        now: DateTime,
    ) -> HeaderMap {
        let mut ss = SigningSettings::default();
        ss.percent_encoding_mode = encoding;
        ss.payload_checksum_kind = if content_sha256 {
            PayloadChecksumKind::XAmzSha256
        } else {
            PayloadChecksumKind::NoHeader
        };
        let id = Credentials::new(
            "access_key_id",
            "secret_access_key",
            token.map(|t| t.to_string()),
            None,
            "hardcoded-credentials",
        )
        .into();
        let sp = v4::SigningParams::builder()
            .identity(&id)
            .region("test")
            .name(API_GATEWAY_SERVICE_NAME)
            .time(SystemTime::from(now))
            .settings(ss)
            .build()
            .expect("signing params must be valid");

        let output = aws_sigv4::http_request::sign(
            SignableRequest::new(
                req.method.as_str(),
                req.full_url(),
                req.headers
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.to_str().expect("must be valid"))),
                SignableBody::Bytes(body),
            )
            .expect("signable request must be valid"),
            &sp.into(),
        )
        .expect("signing must succeed");
        let (aws_sig, _) = output.into_parts();

        let mut signed = http::Request::new(());
        *signed.headers_mut() = req.headers.clone();
        aws_sig.apply_to_request_http1x(&mut signed);
        signed.headers().clone()
    }

    fn format_headers(headers: &HeaderMap) -> Vec<String> {
        let mut hs = headers
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v.to_str().expect("must be valid")))
            .collect::<Vec<_>>();
        hs.sort();
        hs
    }

    #[test_case(Method::GET, "http://127.0.0.1:9000/hello", &[], &[], b"", None, false; "get")]
    #[test_case(Method::GET, "https://api.example.com/items", &[], &[], b"", Some("security_token"), false; "get with token")]
    #[test_case(Method::GET, "http://127.0.0.1:9000/hello", &[("list-type", "2"), ("max-keys", "3"), ("prefix", "CI/"), ("start-after", "ExampleGuide.pdf")], &[], b"", None, false; "get with query")]
    #[test_case(Method::GET, "https://api.example.com/search", &[("q", "a b"), ("tag", "x"), ("tag", "a")], &[], b"", None, false; "get with spaces and repeated query")]
    #[test_case(Method::GET, "https://api.example.com/hello%20world/%E4%BD%A0", &[], &[], b"", None, false; "get with encoded path")]
    #[test_case(Method::GET, "https://api.example.com/items", &[], &[("x-custom", "  a   b  "), ("accept", "application/json")], b"", None, false; "get with headers")]
    #[test_case(Method::PUT, "http://127.0.0.1:9000/hello", &[], &[("content-length", "12")], b"Hello,World!", None, false; "put")]
    #[test_case(Method::PUT, "http://127.0.0.1:9000/hello", &[], &[("content-length", "12")], b"Hello,World!", Some("security_token"), true; "put with body digest")]
    #[test_case(Method::POST, "https://abc123.execute-api.us-east-1.amazonaws.com/prod/items", &[], &[("content-type", "application/json")], br#"{"name":"widget"}"#, None, false; "post to api gateway")]
    fn test_signature_matches_aws_sigv4(
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
        body: &[u8],
        token: Option<&str>,
        content_sha256: bool,
    ) {
        let _ = env_logger::builder().is_test(true).try_init();

        let req = request(method, url, query, headers);
        let now = now();

        let expected = aws_sign(
            &req,
            body,
            token,
            content_sha256,
            PercentEncodingMode::Double,
            now,
        );

        let mut cred = Credential::new("access_key_id", "secret_access_key");
        cred.session_token = token.map(|t| t.to_string());
        let signed = RequestSigner::new(API_GATEWAY_SERVICE_NAME, "test")
            .with_content_sha256_header(content_sha256)
            .with_time(now)
            .sign(&req, &hex_sha256(body), &cred)
            .expect("signing must succeed");

        let mut actual = req.headers.clone();
        for (name, value) in &signed {
            actual.insert(name.clone(), value.clone());
        }

        assert_eq!(format_headers(&expected), format_headers(&actual));
    }

    #[test]
    fn test_single_encoded_path_matches_aws_sigv4() {
        let req = request(
            Method::GET,
            "https://api.example.com/hello%20world/%E4%BD%A0",
            &[("q", "1")],
            &[],
        );
        let now = now();
        let expected = aws_sign(&req, b"", None, false, PercentEncodingMode::Single, now);

        let cred = Credential::new("access_key_id", "secret_access_key");
        let signed = RequestSigner::new(API_GATEWAY_SERVICE_NAME, "test")
            .with_double_encode_path(false)
            .with_time(now)
            .sign(&req, &hex_sha256(b""), &cred)
            .expect("signing must succeed");

        assert_eq!(expected[header::AUTHORIZATION], signed[header::AUTHORIZATION]);
    }

    #[test]
    fn test_canonical_request() {
        let mut req = request(
            Method::GET,
            "https://api.example.com/items",
            &[("b", "2"), ("a", "x y")],
            &[
                ("user-agent", "sigbridge"),
                ("x-multi", "one"),
                ("x-multi", " two "),
            ],
        );
        req.headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer stale"),
        );
        let time = chrono::Utc
            .with_ymd_and_hms(2024, 3, 13, 7, 20, 4)
            .single()
            .expect("time must be valid");
        let cred = Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");

        let signed = RequestSigner::new("execute-api", "us-east-1")
            .with_time(time)
            .sign(&req, &hex_sha256(b""), &cred)
            .expect("signing must succeed");

        assert_eq!(signed[X_AMZ_DATE], "20240313T072004Z");
        assert!(signed.get(X_AMZ_SECURITY_TOKEN).is_none());
        assert!(signed.get(X_AMZ_CONTENT_SHA_256).is_none());

        let authorization = signed[header::AUTHORIZATION].to_str().unwrap();
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240313/us-east-1/execute-api/aws4_request, \
             SignedHeaders=host;x-amz-date;x-multi, Signature="
        ));

        let mut signing = HeaderMap::new();
        signing.insert(X_AMZ_DATE, HeaderValue::from_static("20240313T072004Z"));
        let headers = canonical_headers(&req.headers, &signing, "api.example.com").unwrap();
        let creq = canonical_request_string(
            &req.method,
            &canonical_path("/items", true).unwrap(),
            &canonical_query(&req.query).unwrap(),
            &headers,
            "host;x-amz-date;x-multi",
            &hex_sha256(b""),
        )
        .unwrap();
        assert_eq!(
            creq,
            "GET\n\
             /items\n\
             a=x%20y&b=2\n\
             host:api.example.com\n\
             x-amz-date:20240313T072004Z\n\
             x-multi:one,two\n\
             \n\
             host;x-amz-date;x-multi\n\
             e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test_case("/hello%20world", true, "/hello%2520world")]
    #[test_case("/hello%20world", false, "/hello%20world")]
    #[test_case("", true, "/")]
    #[test_case("/a/b-c_d.e~f", true, "/a/b-c_d.e~f")]
    fn test_canonical_path(path: &str, double_encode: bool, expected: &str) {
        assert_eq!(canonical_path(path, double_encode).unwrap(), expected);
    }

    #[test]
    fn test_canonical_query_rejects_malformed_escape() {
        let query = vec![("q".to_string(), "100%".to_string())];
        let err = canonical_query(&query).expect_err("malformed escape must fail");
        assert!(err.is_signing_error());
    }

    #[test]
    fn test_url_without_host() {
        let req = TransportRequest::new(Method::GET, "/relative");
        let err = RequestSigner::new("execute-api", "us-east-1")
            .sign(&req, &hex_sha256(b""), &Credential::new("ak", "sk"))
            .expect_err("relative url must fail");
        assert!(err.is_signing_error());
    }
}

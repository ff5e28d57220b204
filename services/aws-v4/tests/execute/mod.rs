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

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    PayloadChecksumKind, PercentEncodingMode, SignableBody, SignableRequest, SigningSettings,
};
use aws_sigv4::sign::v4;
use bytes::Bytes;
use futures::StreamExt;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::uri::Scheme;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use pretty_assertions::assert_eq;
use sigbridge_aws_v4::{
    Config, Credential, SigningTransport, StaticCredentialProvider, StaticRegionProvider,
};
use sigbridge_core::hash::hex_sha256;
use sigbridge_core::{
    to_push_stream, AsyncExecuteRequest, AsyncHttpClient, ByteStream, Context, Error,
    HttpTransport, OutboundRequest, ProvideCredential, RequestBody, ResponseHandler,
    ResponseHead, Result, StreamResponseHandler, Subscriber, TransportClient,
    TransportRequest, TransportResponse,
};

/// What the wrapped transport received.
#[derive(Debug, Clone)]
struct Sent {
    method: Method,
    url: String,
    full_url: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

#[derive(Default)]
struct Collect(Vec<u8>);

impl Subscriber for Collect {
    fn on_next(&mut self, chunk: Bytes) {
        self.0.extend_from_slice(&chunk);
    }
    fn on_error(&mut self, _: Error) {}
    fn on_complete(&mut self) {}
}

#[derive(Debug, Default)]
struct MockTransport {
    sent: Mutex<Vec<Sent>>,
    chunks: Vec<usize>,
}

impl MockTransport {
    fn with_chunks(chunks: &[usize]) -> Self {
        Self {
            chunks: chunks.to_vec(),
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse> {
        let full_url = req.full_url();
        let body = match req.body {
            Some(body) => {
                let mut sub = body.into_push_body().subscribe(Collect::default());
                while sub.request(1).await == 1 {}
                Some(sub.into_subscriber().0)
            }
            None => None,
        };
        self.sent.lock().unwrap().push(Sent {
            method: req.method,
            url: req.url,
            full_url,
            headers: req.headers,
            body,
        });

        let chunks: Vec<Result<Bytes>> = self
            .chunks
            .iter()
            .map(|n| Ok(Bytes::from(vec![b'a'; *n])))
            .collect();
        Ok(TransportResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: to_push_stream(futures::stream::iter(chunks), None),
        })
    }
}

#[derive(Debug)]
struct FailingCredential;

#[async_trait]
impl ProvideCredential for FailingCredential {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Credential>> {
        Err(Error::credential_invalid("credential service unavailable"))
    }
}

#[derive(Clone, Default)]
struct Outcome {
    events: Arc<Mutex<Vec<String>>>,
}

impl ResponseHandler for Outcome {
    fn on_headers(&mut self, head: ResponseHead) {
        self.events.lock().unwrap().push(format!("headers {}", head.status));
    }

    fn on_stream(&mut self, _: ByteStream) {
        self.events.lock().unwrap().push("stream".to_string());
    }

    fn on_error(&mut self, err: &Error) {
        self.events.lock().unwrap().push(format!("error {:?}", err.kind()));
    }
}

fn signing_transport(
    inner: &Arc<MockTransport>,
    config: Config,
) -> SigningTransport<Arc<MockTransport>> {
    SigningTransport::new(inner.clone(), Context::new(), &config)
        .with_credential_provider(StaticCredentialProvider::new(
            "access_key_id",
            "secret_access_key",
        ))
        .with_region_provider(StaticRegionProvider::new("us-east-1"))
}

/// Recompute the authorization header of a sent request with aws-sigv4.
fn expected_authorization(sent: &Sent, content_sha256: bool) -> String {
    let date = sent.headers["x-amz-date"].to_str().unwrap();
    let time = chrono::NaiveDateTime::parse_from_str(date, "%Y%m%dT%H%M%SZ")
        .expect("x-amz-date must parse")
        .and_utc();

    let mut ss = SigningSettings::default();
    ss.percent_encoding_mode = PercentEncodingMode::Double;
    ss.payload_checksum_kind = if content_sha256 {
        PayloadChecksumKind::XAmzSha256
    } else {
        PayloadChecksumKind::NoHeader
    };
    let id = Credentials::new(
        "access_key_id",
        "secret_access_key",
        None,
        None,
        "hardcoded-credentials",
    )
    .into();
    let sp = v4::SigningParams::builder()
        .identity(&id)
        .region("us-east-1")
        .name("execute-api")
        .time(SystemTime::from(time))
        .settings(ss)
        .build()
        .expect("signing params must be valid");

    let unsigned = sent
        .headers
        .iter()
        .filter(|(k, _)| {
            !matches!(
                k.as_str(),
                "authorization" | "x-amz-date" | "x-amz-content-sha256"
            )
        })
        .map(|(k, v)| (k.as_str(), v.to_str().unwrap()))
        .collect::<Vec<_>>();
    let body = sent.body.as_deref().unwrap_or_default();

    let output = aws_sigv4::http_request::sign(
        SignableRequest::new(
            sent.method.as_str(),
            sent.full_url.as_str(),
            unsigned.into_iter(),
            SignableBody::Bytes(body),
        )
        .expect("signable request must be valid"),
        &sp.into(),
    )
    .expect("signing must succeed");
    let (aws_sig, _) = output.into_parts();

    let mut req = http::Request::new(());
    aws_sig.apply_to_request_http1x(&mut req);
    req.headers()[AUTHORIZATION].to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_get_without_body() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mock = Arc::new(MockTransport::with_chunks(&[]));
    let client = TransportClient::new(signing_transport(&mock, Config::default()));

    let req = OutboundRequest::new(Method::GET, Scheme::HTTPS, "api.example.com")
        .with_port(443)
        .with_encoded_path("/items");
    let outcome = Outcome::default();
    client
        .execute(AsyncExecuteRequest::new(req, outcome.clone()))
        .await
        .expect("execute must succeed");

    let sent = mock.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "https://api.example.com/items");
    assert!(sent[0].body.is_none());
    assert!(sent[0].headers.contains_key("x-amz-date"));
    assert!(sent[0].headers[AUTHORIZATION]
        .to_str()
        .unwrap()
        .contains("/us-east-1/execute-api/aws4_request"));
    assert_eq!(
        sent[0].headers[AUTHORIZATION].to_str().unwrap(),
        expected_authorization(&sent[0], false)
    );
    assert_eq!(
        *outcome.events.lock().unwrap(),
        vec!["headers 200 OK".to_string(), "stream".to_string()]
    );
}

#[tokio::test]
async fn test_streaming_body_is_signed_and_sent_identically() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mock = Arc::new(MockTransport::with_chunks(&[]));
    let client = TransportClient::new(signing_transport(
        &mock,
        Config::default().with_content_sha256_header(true),
    ));

    let chunks = vec![
        Ok(Bytes::from_static(b"012")),
        Ok(Bytes::from_static(b"3456")),
        Ok(Bytes::from_static(b"789")),
    ];
    let req = OutboundRequest::new(Method::POST, Scheme::HTTPS, "api.example.com")
        .with_encoded_path("/items")
        .with_query("dry run", "yes/no")
        .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .with_body(RequestBody::from_stream(
            futures::stream::iter(chunks),
            Some(10),
        ));
    client
        .execute(AsyncExecuteRequest::new(req, Outcome::default()))
        .await
        .expect("execute must succeed");

    let sent = mock.sent();
    let body = sent[0].body.as_deref().expect("body must be sent");
    assert_eq!(body, b"0123456789");
    assert_eq!(sent[0].full_url, "https://api.example.com/items?dry%20run=yes%2Fno");
    assert_eq!(sent[0].headers["x-amz-content-sha256"], hex_sha256(body));
    assert_eq!(
        sent[0].headers[AUTHORIZATION].to_str().unwrap(),
        expected_authorization(&sent[0], true)
    );
}

#[tokio::test]
async fn test_credential_failure_never_reaches_transport() {
    let mock = Arc::new(MockTransport::with_chunks(&[]));
    let transport = signing_transport(&mock, Config::default())
        .with_credential_provider(FailingCredential);
    let client = TransportClient::new(transport);

    let req = OutboundRequest::new(Method::GET, Scheme::HTTPS, "api.example.com")
        .with_encoded_path("/items");
    let outcome = Outcome::default();
    let err = client
        .execute(AsyncExecuteRequest::new(req, outcome.clone()))
        .await
        .expect_err("execute must fail");

    assert!(err.is_signing_error());
    assert!(mock.sent().is_empty());
    assert_eq!(
        *outcome.events.lock().unwrap(),
        vec!["error Signing".to_string()]
    );
}

#[tokio::test]
async fn test_stalled_body_times_out() {
    let mock = Arc::new(MockTransport::with_chunks(&[]));
    let client = TransportClient::new(signing_transport(
        &mock,
        Config::default().with_body_timeout(Duration::from_millis(50)),
    ));

    let req = OutboundRequest::new(Method::PUT, Scheme::HTTPS, "api.example.com")
        .with_encoded_path("/upload")
        .with_body(RequestBody::from_stream(futures::stream::pending(), Some(10)));
    let err = client
        .execute(AsyncExecuteRequest::new(req, Outcome::default()))
        .await
        .expect_err("execute must fail");

    assert!(err.is_signing_error());
    assert!(mock.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_query_fails_signing() {
    let mock = Arc::new(MockTransport::with_chunks(&[]));
    let transport = signing_transport(&mock, Config::default());

    let mut req = TransportRequest::new(Method::GET, "https://api.example.com/items");
    req.query.push(("discount".to_string(), "100%".to_string()));
    let err = transport.send(req).await.expect_err("send must fail");

    assert!(err.is_signing_error());
    assert!(mock.sent().is_empty());
}

#[tokio::test]
async fn test_response_chunks_after_signing() {
    let mock = Arc::new(MockTransport::with_chunks(&[100, 0, 250]));
    let client = TransportClient::new(signing_transport(&mock, Config::default()));

    let req = OutboundRequest::new(Method::GET, Scheme::HTTP, "localhost")
        .with_port(8080)
        .with_encoded_path("/items");
    let (handler, response) = StreamResponseHandler::prepare();
    client
        .execute(AsyncExecuteRequest::new(req, handler))
        .await
        .expect("execute must succeed");

    let (head, body) = response.await.expect("response must resolve").into_parts();
    assert_eq!(head.status, StatusCode::OK);
    let sizes: Vec<usize> = body.map(|c| c.expect("chunk must be ok").len()).collect().await;
    assert_eq!(sizes, vec![100, 250]);

    assert_eq!(mock.sent()[0].url, "http://localhost:8080/items");
}

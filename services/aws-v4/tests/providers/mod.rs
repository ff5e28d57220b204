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

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::{HeaderMap, Method, StatusCode};
use sigbridge_aws_v4::{
    Config, DefaultCredentialProvider, DefaultRegionProvider, LazyRegionProvider,
    SigningTransport,
};
use sigbridge_core::{
    Context, HttpTransport, ProvideCredential, ProvideRegion, PushBody, Result, StaticEnv,
    TransportRequest, TransportResponse,
};
use sigbridge_file_read_tokio::TokioFileRead;
use tempfile::TempDir;

fn home_with_profiles() -> TempDir {
    let home = tempfile::tempdir().expect("temp dir must be created");
    let aws = home.path().join(".aws");
    fs::create_dir_all(&aws).unwrap();
    fs::write(
        aws.join("credentials"),
        "[default]\n\
         aws_access_key_id = DEFAULTACCESSKEYID\n\
         aws_secret_access_key = DEFAULTSECRETACCESSKEY\n\
         \n\
         [staging]\n\
         aws_access_key_id = STAGINGACCESSKEYID\n\
         aws_secret_access_key = STAGINGSECRETACCESSKEY\n\
         aws_session_token = STAGINGSESSIONTOKEN\n",
    )
    .unwrap();
    fs::write(
        aws.join("config"),
        "[default]\n\
         region = us-east-1\n\
         \n\
         [profile staging]\n\
         region = eu-west-1\n",
    )
    .unwrap();
    home
}

fn ctx(home: &TempDir, envs: &[(&str, &str)]) -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_env(StaticEnv {
            home_dir: Some(home.path().to_path_buf()),
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        })
}

#[tokio::test]
async fn test_default_providers_read_home_profiles() {
    let _ = env_logger::builder().is_test(true).try_init();

    let home = home_with_profiles();
    let ctx = ctx(&home, &[]);

    let cred = DefaultCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .unwrap()
        .expect("credential must be found");
    assert_eq!(cred.access_key_id, "DEFAULTACCESSKEYID");

    let region = DefaultRegionProvider::new().provide_region(&ctx).await.unwrap();
    assert_eq!(region.as_deref(), Some("us-east-1"));
}

#[tokio::test]
async fn test_profile_selected_by_env() {
    let home = home_with_profiles();
    let ctx = ctx(&home, &[("AWS_PROFILE", "staging")]);
    let config = Config::default().from_env(&ctx);

    let cred = DefaultCredentialProvider::with_config(&config)
        .provide_credential(&ctx)
        .await
        .unwrap()
        .expect("credential must be found");
    assert_eq!(cred.access_key_id, "STAGINGACCESSKEYID");
    assert_eq!(cred.session_token.as_deref(), Some("STAGINGSESSIONTOKEN"));

    let region = LazyRegionProvider::new(DefaultRegionProvider::with_config(&config))
        .provide_region(&ctx)
        .await
        .unwrap();
    assert_eq!(region.as_deref(), Some("eu-west-1"));
}

#[derive(Debug, Default)]
struct Capture {
    headers: Mutex<Vec<HeaderMap>>,
}

#[async_trait]
impl HttpTransport for Capture {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse> {
        self.headers.lock().unwrap().push(req.headers);
        Ok(TransportResponse {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: PushBody::empty(),
        })
    }
}

#[tokio::test]
async fn test_signing_transport_uses_profile() {
    let home = home_with_profiles();
    let ctx = ctx(&home, &[("AWS_PROFILE", "staging")]);
    let config = Config::default().from_env(&ctx);

    let capture = Arc::new(Capture::default());
    let transport = SigningTransport::new(capture.clone(), ctx, &config);
    transport
        .send(TransportRequest::new(
            Method::DELETE,
            "https://api.example.com/items/42",
        ))
        .await
        .expect("send must succeed");

    let headers = capture.headers.lock().unwrap().pop().expect("must be sent");
    let authorization = headers[AUTHORIZATION].to_str().unwrap();
    assert!(authorization.contains("Credential=STAGINGACCESSKEYID/"));
    assert!(authorization.contains("/eu-west-1/execute-api/aws4_request"));
    assert_eq!(headers["x-amz-security-token"], "STAGINGSESSIONTOKEN");
}

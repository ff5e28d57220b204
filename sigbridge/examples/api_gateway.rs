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

use std::env;

use futures::TryStreamExt;
use http::uri::Scheme;
use http::Method;
use sigbridge::aws::{default_client, Config};
use sigbridge::{AsyncExecuteRequest, AsyncHttpClient, OutboundRequest, StreamResponseHandler};

/// Call `GET https://$SIGBRIDGE_HOST/$SIGBRIDGE_PATH` on an IAM protected
/// API Gateway endpoint with credentials from the environment or profile.
#[tokio::main]
async fn main() -> sigbridge::Result<()> {
    env_logger::init();

    let host = env::var("SIGBRIDGE_HOST").unwrap_or_else(|_| "api.example.com".to_string());
    let path = env::var("SIGBRIDGE_PATH").unwrap_or_else(|_| "/".to_string());

    let client = default_client(Config::default());
    let req = OutboundRequest::new(Method::GET, Scheme::HTTPS, host).with_encoded_path(path);

    let (handler, response) = StreamResponseHandler::prepare();
    client
        .execute(AsyncExecuteRequest::new(req, handler))
        .await?;

    let (head, body) = response.await?.into_parts();
    println!("status: {}", head.status);
    let chunks: Vec<_> = body.try_collect().await?;
    println!("{}", String::from_utf8_lossy(&chunks.concat()));

    client.close();
    Ok(())
}

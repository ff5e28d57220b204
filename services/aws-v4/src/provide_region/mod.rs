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

//! Region providers.
//!
//! These mirror the credential providers: each answers `Ok(None)` when it
//! has nothing to offer, and chains try them in order.

mod chain;
pub use chain::ProvideRegionChain;

mod default;
pub use default::DefaultRegionProvider;

mod env;
pub use env::EnvRegionProvider;

mod lazy;
pub use lazy::LazyRegionProvider;

mod profile;
pub use profile::ProfileRegionProvider;

mod r#static;
pub use r#static::StaticRegionProvider;

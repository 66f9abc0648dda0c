//! Mock baseline server
//!
//! Serves the three baseline endpoints from one `httpmock` server and
//! produces a matching `Config` with a fast retry schedule.

use httpmock::prelude::*;
use httpmock::Mock;
use pkgcheck_config::Config;
use serde_json::json;

pub struct MockRegistry {
    pub server: MockServer,
}

impl MockRegistry {
    pub fn start() -> Self {
        Self {
            server: MockServer::start(),
        }
    }

    /// Configuration pointing every baseline at this server
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.baselines.registry_url = self.server.url("/registry");
        config.baselines.builtins_url = Some(self.server.url("/builtins"));
        config.baselines.confidential_url = Some(self.server.url("/index/cix1.bin"));
        config.network.timeout_secs = 5;
        config.network.retry_delays_ms = vec![1, 1];
        config
    }

    pub fn published(&self, name: &str, version: &str, status: u16) -> Mock<'_> {
        let path = format!("/registry/{name}/{version}");
        let body = json!({"name": name, "version": version}).to_string();
        self.server.mock(|when, then| {
            when.method(GET).path(path);
            then.status(status).body(body);
        })
    }

    pub fn builtins(&self, release: &str, packages: &[&str]) -> Mock<'_> {
        let path = format!("/builtins/{release}.json");
        self.server.mock(|when, then| {
            when.method(GET).path(path);
            then.status(200).json_body(json!({ "packages": packages }));
        })
    }

    pub fn index(&self, blob: Vec<u8>) -> Mock<'_> {
        self.server.mock(|when, then| {
            when.method(GET).path("/index/cix1.bin");
            then.status(200).body(blob);
        })
    }
}

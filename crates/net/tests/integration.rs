//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use pkgcheck_errors::NetworkError;
    use pkgcheck_net::*;
    use pkgcheck_types::PlatformVersion;
    use std::time::Duration;

    fn fast_client(retries: usize) -> NetClient {
        NetClient::new(NetConfig {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
            retry_delays: vec![Duration::ZERO; retries],
            user_agent: "pkgcheck-test".to_string(),
        })
        .unwrap()
    }

    fn service(server: &MockServer, retries: usize) -> RegistryBaselines {
        RegistryBaselines::new(
            fast_client(retries),
            &server.url("/registry"),
            Some(&server.url("/builtins")),
            Some(&server.url("/index/cix1.bin")),
        )
        .unwrap()
    }

    #[test]
    fn test_published_manifest_found() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/registry/com.example.tools/1.2.0");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"name":"com.example.tools","version":"1.2.0"}"#);
        });

        let doc = service(&server, 4)
            .published_manifest("com.example.tools", "1.2.0")
            .unwrap()
            .unwrap();
        mock.assert_hits(1);
        assert_eq!(doc.root().get("version").as_str().unwrap(), "1.2.0");
    }

    #[test]
    fn test_not_found_is_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/registry/com.example.tools/2.0.0");
            then.status(404).body("Not Found");
        });

        let published = service(&server, 4)
            .published_manifest("com.example.tools", "2.0.0")
            .unwrap();
        assert!(published.is_none());
        mock.assert_hits(1);
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/index/cix1.bin");
            then.status(403);
        });

        let err = service(&server, 4).confidential_blob().unwrap_err();
        mock.assert_hits(1);
        assert!(matches!(err, NetworkError::HttpError { status: 403, .. }));
    }

    #[test]
    fn test_server_errors_use_every_attempt() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/registry/com.example.tools/1.0.0");
            then.status(503);
        });

        let err = service(&server, 4)
            .published_manifest("com.example.tools", "1.0.0")
            .unwrap_err();
        mock.assert_hits(5);
        assert!(matches!(err, NetworkError::HttpError { status: 503, .. }));
    }

    #[test]
    fn test_builtin_packages() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/builtins/2021.3.json");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"packages":["com.unity.ugui","com.unity.modules.audio"]}"#);
        });

        let names = service(&server, 0)
            .builtin_packages(PlatformVersion::new(2021, 3))
            .unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("com.unity.ugui"));
    }

    #[test]
    fn test_malformed_builtin_list() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/builtins/2022.1.json");
            then.status(200).body(r#"{"names":[]}"#);
        });

        let err = service(&server, 0)
            .builtin_packages(PlatformVersion::new(2022, 1))
            .unwrap_err();
        assert!(matches!(err, NetworkError::DownloadFailed(_)));
    }

    #[test]
    fn test_confidential_blob_bytes() {
        let server = MockServer::start();
        let blob = vec![0x49, 0x43, 0x58, 0x31, 0, 0, 0, 0];
        server.mock(|when, then| {
            when.method(GET).path("/index/cix1.bin");
            then.status(200).body(blob.clone());
        });

        assert_eq!(service(&server, 0).confidential_blob().unwrap(), blob);
    }

    #[test]
    fn test_connection_refused_after_retries() {
        // Nothing listens on the discard port in the test environment
        let service =
            RegistryBaselines::new(fast_client(2), "http://127.0.0.1:9", None, None).unwrap();
        let err = service
            .published_manifest("com.example.tools", "1.0.0")
            .unwrap_err();
        assert!(matches!(
            err,
            NetworkError::ConnectionRefused(_) | NetworkError::Timeout { .. }
        ));
    }

    #[test]
    fn test_offline_config_selects_offline_service() {
        let mut config = pkgcheck_config::Config::default();
        config.network.offline = true;
        let service = baselines_for(&config).unwrap();
        assert!(matches!(
            service.builtin_packages(PlatformVersion::new(2021, 3)),
            Err(NetworkError::NetworkUnavailable)
        ));
    }
}

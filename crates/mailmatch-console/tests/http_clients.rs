#[cfg(test)]
pub mod tests {
    use mailmatch_console::http::build_agent;
    use mailmatch_console::mock_backend::MockBackend;
    use mailmatch_console::{
        Config, Error, HttpLogSource, LogQuery, LogSource, StreamSession, UploadError, Uploader,
        ValidationError,
    };
    use serde_json::json;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn backend() -> MockBackend {
        MockBackend::start("127.0.0.1:0").expect("Failed to start mock backend")
    }

    fn config_for(backend: &MockBackend) -> Config {
        Config::default().with_backend(&backend.base_url())
    }

    fn log_source(backend: &MockBackend) -> HttpLogSource {
        HttpLogSource::new(build_agent(), backend.base_url(), None)
    }

    #[test]
    fn lists_groups_under_prefix() {
        let backend = backend();
        backend.add_group("/aws/lambda/email-processor");
        backend.add_group("/aws/lambda/billing-report");
        backend.add_group("/ecs/email-processor");

        let groups = log_source(&backend)
            .describe_log_groups("/aws/lambda/")
            .expect("Failed to list groups");

        let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(
            ids,
            ["/aws/lambda/billing-report", "/aws/lambda/email-processor"]
        );
        assert_eq!(groups[1].display_name, "email-processor");
        assert_eq!(backend.request_count("log-groups"), 1);
    }

    #[test]
    fn fetches_events_inside_trailing_window() {
        let backend = backend();
        let group = "/aws/lambda/email-processor";
        let now = now_ms();
        backend.push_event(group, now - 20 * 60_000, "too old");
        backend.push_event(group, now - 2_000, "second");
        backend.push_event(group, now - 5_000, "first");

        let records = log_source(&backend)
            .filter_log_events(&LogQuery::trailing_window(group, now_ms()))
            .expect("Failed to fetch events");

        let messages: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
    }

    #[test]
    fn unknown_group_is_an_error() {
        let backend = backend();

        let result = log_source(&backend)
            .filter_log_events(&LogQuery::trailing_window("/aws/lambda/missing", now_ms()));

        assert!(matches!(result, Err(Error::Http(_))), "{result:?}");
    }

    #[test]
    fn session_discovers_and_streams_over_http() {
        let backend = MockBackend::seeded("127.0.0.1:0").expect("Failed to start mock backend");
        let config = config_for(&backend);
        let source = config
            .log_source(&build_agent())
            .into_result()
            .expect("log source should be ready");
        let mut session = StreamSession::new(Arc::new(source), config.log_group_prefix.clone());

        assert!(session.discover_groups());
        assert!(session.wait_for_outcome(WAIT));
        let selected = session.state().selected_group.clone().expect("default group");
        assert_eq!(selected.id, "/aws/lambda/email-processor");
        assert_eq!(session.catalog().all.len(), 4);
        assert_eq!(session.catalog().relevant.len(), 3);

        assert!(session.refresh());
        assert!(session.wait_for_outcome(WAIT));
        assert_eq!(session.state().accumulated.len(), 1);

        backend.push_event(&selected.id, now_ms() - 1_000, "INFO parsed email-42");
        assert!(session.start_streaming(std::time::Instant::now()));
        assert!(session.wait_for_outcome(WAIT));
        session.stop_streaming();

        assert_eq!(session.state().accumulated.len(), 2);
        assert!(session.state().last_error.is_none());

        session.set_correlation(Some("email-42".to_string()));
        let shown: Vec<&str> = session
            .projection()
            .iter()
            .map(|r| r.message.as_str())
            .collect();
        assert_eq!(shown, ["INFO parsed email-42"]);
    }

    #[test]
    fn upload_stores_object_and_logs_processing() {
        let backend = MockBackend::seeded("127.0.0.1:0").expect("Failed to start mock backend");
        let uploader = config_for(&backend)
            .uploader(&build_agent())
            .into_result()
            .expect("uploader should be ready");

        let mut file = tempfile::Builder::new()
            .prefix("invoice")
            .suffix(".eml")
            .tempfile()
            .expect("Failed to create temp file");
        file.write_all(b"From: billing@acme.test\r\nSubject: Invoice\r\n\r\nTotal: 12.00\r\n")
            .expect("Failed to write temp file");

        let receipt = uploader.upload_file(file.path()).expect("upload failed");

        assert!(receipt.file_id.starts_with("email-"));
        assert_eq!(receipt.object_key, format!("emails/{}.eml", receipt.file_id));
        assert_eq!(receipt.content_type, "message/rfc822");

        let objects = backend.objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].key, receipt.object_key);
        assert_eq!(objects[0].content_type.as_deref(), Some("message/rfc822"));
        assert_eq!(objects[0].size as u64, receipt.size);

        let events = log_source(&backend)
            .filter_log_events(&LogQuery::trailing_window(
                "/aws/lambda/email-processor",
                now_ms() + 1_000,
            ))
            .expect("Failed to fetch events");
        assert!(events
            .iter()
            .any(|e| e.message.contains(&receipt.file_id)));
    }

    #[test]
    fn rejected_uploads_never_reach_the_bucket() {
        let backend = backend();
        let uploader = config_for(&backend)
            .uploader(&build_agent())
            .into_result()
            .expect("uploader should be ready");
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let pdf = dir.path().join("report.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").expect("Failed to write pdf");
        let err = uploader.upload_file(&pdf).unwrap_err();
        assert!(matches!(
            err,
            UploadError::Validation(ValidationError::UnsupportedExtension { .. })
        ));

        let big = dir.path().join("big.eml");
        let file = std::fs::File::create(&big).expect("Failed to create eml");
        file.set_len(15 * 1024 * 1024).expect("Failed to size eml");
        let err = uploader.upload_file(&big).unwrap_err();
        assert!(matches!(
            err,
            UploadError::Validation(ValidationError::TooLarge { .. })
        ));

        assert_eq!(backend.total_requests(), 0);
    }

    #[test]
    fn bucket_rejection_reports_status() {
        let backend = backend();
        let uploader = Uploader::new(build_agent(), format!("{}/no-such-bucket", backend.base_url()));

        let err = uploader
            .upload_bytes("invoice.eml", b"Subject: hi\r\n\r\nbody")
            .unwrap_err();

        assert!(matches!(err, UploadError::Status(404)), "{err:?}");
        assert!(backend.objects().is_empty());
    }

    #[test]
    fn supplier_endpoints_round_trip() {
        let backend = backend();
        let client = config_for(&backend)
            .supplier_client(&build_agent())
            .into_result()
            .expect("supplier client should be ready");

        let suggestions = client
            .suggest(&json!({ "name": "Acme" }))
            .expect("suggest failed");
        assert_eq!(suggestions["query"]["name"], "Acme");
        assert!(suggestions["suggestions"].as_array().is_some_and(|s| !s.is_empty()));

        let ack = client
            .feedback(&json!({ "emailId": "email-1", "supplierId": "SUP-001", "correct": true }))
            .expect("feedback failed");
        assert_eq!(ack["status"], "recorded");
        assert_eq!(backend.feedback().len(), 1);
        assert_eq!(backend.feedback()[0]["supplierId"], "SUP-001");
    }

    #[test]
    fn matches_follow_uploads() {
        let backend = backend();
        let config = config_for(&backend);
        let agent = build_agent();
        let client = config.supplier_client(&agent).into_result().unwrap();
        let uploader = config.uploader(&agent).into_result().unwrap();

        let err = client.matches("email-unknown").unwrap_err();
        assert!(matches!(err, Error::Http(_)), "{err:?}");

        let receipt = uploader
            .upload_bytes("note.txt", b"please match me")
            .expect("upload failed");
        let matches = client.matches(&receipt.file_id).expect("matches failed");

        assert_eq!(matches["emailId"], receipt.file_id.as_str());
        assert_eq!(backend.request_count("matches"), 2);
    }
}

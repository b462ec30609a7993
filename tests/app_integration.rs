use ratewatch::core::RunOutcome;
use std::fs;
use tracing::{error, info};

mod test_utils {
    use ratewatch::core::RunOutcome;
    use ratewatch::core::config::AppConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_bank_mock_server(
        privatbank_response: (u16, &str),
        monobank_response: (u16, &str),
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/p24api/pubinfo"))
            .respond_with(
                ResponseTemplate::new(privatbank_response.0)
                    .set_body_string(privatbank_response.1),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/bank/currency"))
            .respond_with(
                ResponseTemplate::new(monobank_response.0).set_body_string(monobank_response.1),
            )
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn privatbank_json(sale: &str) -> String {
        format!(
            r#"[
                {{"ccy": "EUR", "base_ccy": "UAH", "buy": "43.90000", "sale": "44.90000"}},
                {{"ccy": "USD", "base_ccy": "UAH", "buy": "26.90000", "sale": "{sale}"}}
            ]"#
        )
    }

    pub fn monobank_json(rate_sell: f64) -> String {
        format!(
            r#"[
                {{"currencyCodeA": 840, "currencyCodeB": 980, "date": 1729000000, "rateBuy": 27.1, "rateSell": {rate_sell}}},
                {{"currencyCodeA": 978, "currencyCodeB": 980, "date": 1729000000, "rateBuy": 44.7, "rateSell": 45.3}}
            ]"#
        )
    }

    pub fn write_config(
        file: &tempfile::NamedTempFile,
        base_url: &str,
        threshold: &str,
        smtp_port: u16,
    ) {
        let config_content = format!(
            r#"
threshold: {threshold}
http:
  timeout_secs: 5
sources:
  privatbank:
    url: "{base_url}/p24api/pubinfo?json&exchange&coursid=5"
  monobank:
    url: "{base_url}/bank/currency"
mail:
  from: "alert@example.com"
  to: "user@example.com"
  smtp:
    host: "127.0.0.1"
    port: {smtp_port}
"#
        );
        std::fs::write(file.path(), config_content).expect("Failed to write config file");
    }

    /// Loads the config without consulting `RATEWATCH_*` variables from the
    /// surrounding shell, then runs one check.
    pub async fn run_check(
        file: &tempfile::NamedTempFile,
        dry_run: bool,
    ) -> anyhow::Result<RunOutcome> {
        let config = AppConfig::load_from_path_with(file.path(), |_| None)?;
        ratewatch::run_with_config(&config, dry_run).await
    }

    /// A local port with nothing listening on it.
    pub fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_sends_alert() {
    let mock_server = test_utils::create_bank_mock_server(
        (200, &test_utils::privatbank_json("27.35000")),
        (200, &test_utils::monobank_json(28.90)),
    )
    .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "1.5", 25);

    let result = test_utils::run_check(&config_file, true).await;
    assert!(
        result.is_ok(),
        "Rate check failed with: {:?}",
        result.as_ref().err()
    );
    assert_eq!(result.unwrap(), RunOutcome::NotificationSent);
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_below_threshold() {
    let mock_server = test_utils::create_bank_mock_server(
        (200, &test_utils::privatbank_json("27.35000")),
        (200, &test_utils::monobank_json(27.50)),
    )
    .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    // Closed SMTP port: any delivery attempt would fail the run.
    test_utils::write_config(
        &config_file,
        &mock_server.uri(),
        "1.5",
        test_utils::closed_port(),
    );

    let outcome = test_utils::run_check(&config_file, false)
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::NoSignificantChanges);
    assert_eq!(
        outcome.status_line(),
        "No significant changes detected in currency rates."
    );
}

#[test_log::test(tokio::test)]
async fn test_failed_source_yields_no_changes() {
    let mock_server = test_utils::create_bank_mock_server(
        (500, "Internal Server Error"),
        (200, &test_utils::monobank_json(45.0)),
    )
    .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(
        &config_file,
        &mock_server.uri(),
        "1.5",
        test_utils::closed_port(),
    );

    let outcome = test_utils::run_check(&config_file, false)
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::NoSignificantChanges);
}

#[test_log::test(tokio::test)]
async fn test_both_sources_failing_yields_no_changes() {
    let mock_server = test_utils::create_bank_mock_server(
        (502, "Bad Gateway"),
        (200, "not json"),
    )
    .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(
        &config_file,
        &mock_server.uri(),
        "1.5",
        test_utils::closed_port(),
    );

    let outcome = test_utils::run_check(&config_file, false)
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::NoSignificantChanges);
}

#[test_log::test(tokio::test)]
async fn test_delivery_failure_fails_run() {
    let mock_server = test_utils::create_bank_mock_server(
        (200, &test_utils::privatbank_json("27.35000")),
        (200, &test_utils::monobank_json(28.90)),
    )
    .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(
        &config_file,
        &mock_server.uri(),
        "1.5",
        test_utils::closed_port(),
    );

    let result = test_utils::run_check(&config_file, false).await;
    let err = result.expect_err("Delivery to a closed port should fail");
    assert!(err.to_string().contains("Failed to deliver rate alert"));
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_fails_before_fetching() {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri(), "-2.0", 25);

    let result = test_utils::run_check(&config_file, true).await;
    let err = result.expect_err("Negative threshold should be rejected");
    assert!(err.to_string().contains("Threshold must be a non-negative number"));
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.yaml");

    let result = ratewatch::run_check(Some(path.to_str().unwrap()), true).await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
#[ignore = "hits the live bank APIs"]
async fn test_real_bank_apis() {
    use ratewatch::core::RateSource;
    use ratewatch::core::config::{MONOBANK_URL, PRIVATBANK_URL};
    use ratewatch::providers::http::build_client;
    use ratewatch::providers::{MonobankSource, PrivatBankSource};

    let client = build_client(std::time::Duration::from_secs(10)).unwrap();
    let sources: Vec<Box<dyn RateSource>> = vec![
        Box::new(PrivatBankSource::new(PRIVATBANK_URL, client.clone())),
        Box::new(MonobankSource::new(MONOBANK_URL, client)),
    ];

    for source in sources {
        info!(source = source.name(), "Fetching live rate");
        match source.fetch_rate().await {
            Ok(Some(rate)) => {
                info!(source = source.name(), rate, "Received live rate");
                assert!(rate > 0.0, "Rate should be positive");
            }
            Ok(None) => panic!("No USD/UAH record from {}", source.name()),
            Err(e) => {
                error!("Rate request failed: {e}\n{e:?}");
                panic!("Rate request failed for {}: {e}", source.name());
            }
        }
    }
}

#[test]
fn test_setup_writes_loadable_config() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");

    ratewatch::cli::setup::setup_at_path(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("threshold: 1.5"));
    let config = ratewatch::core::config::AppConfig::load_from_path_with(&path, |_| None);
    assert!(config.is_ok(), "Config failed to load: {:?}", config.err());
}

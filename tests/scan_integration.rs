//! End-to-end scans against the in-memory connector.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{scanner_with, MockConnector};
use hickory_proto::op::ResponseCode;
use mailsec_scanner::{
    ConfigError, RecordType, ScanError, ScanResult, Scanner, ScannerConfig, ScannerOption,
};

fn no_cache() -> ScannerConfig {
    ScannerConfig::default().cache_duration(Duration::ZERO)
}

fn by_domain(mut results: Vec<ScanResult>) -> Vec<ScanResult> {
    results.sort_by(|a, b| a.domain.cmp(&b.domain));
    results
}

#[tokio::test]
async fn test_spf_and_dmarc_scan() {
    let connector = Arc::new(
        MockConnector::new()
            .txt("example.org", &["v=spf1 -all"])
            .txt("_dmarc.example.org", &["v=DMARC1; p=reject;"]),
    );
    let scanner = scanner_with(connector, no_cache());

    let results = scanner.scan(["example.org"]).await.unwrap();
    assert_eq!(results.len(), 1);

    let result = &results[0];
    assert_eq!(result.domain, "example.org");
    assert_eq!(result.spf, "v=spf1 -all");
    assert_eq!(result.dmarc, "v=DMARC1; p=reject;");
    assert_eq!(result.error, "");
    assert!(result.bimi.is_empty());
    assert!(result.dkim.is_empty());
    assert!(result.mx.is_empty());
}

#[tokio::test]
async fn test_nonexistent_domain_is_invalid() {
    let connector = Arc::new(MockConnector::new());
    let scanner = scanner_with(connector.clone(), no_cache());

    let mut results = scanner.scan(["nxdomain.invalid"]).await.unwrap();
    assert_eq!(results.len(), 1);

    let mut result = results.remove(0);
    result.elapsed = Duration::ZERO;
    assert_eq!(
        result,
        ScanResult::failed("nxdomain.invalid", "invalid domain name")
    );
    // existence check only: NS then TXT
    assert_eq!(connector.calls(), 2);
}

#[tokio::test]
async fn test_invalid_domain_does_not_affect_batch() {
    let connector = Arc::new(
        MockConnector::new()
            .ns("example.org", "ns1.example.net")
            .txt("example.org", &["v=spf1 mx -all"]),
    );
    let scanner = scanner_with(connector, no_cache());

    let results = by_domain(
        scanner
            .scan(["nxdomain.invalid", "example.org"])
            .await
            .unwrap(),
    );
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].domain, "example.org");
    assert_eq!(results[0].error, "");
    assert_eq!(results[0].spf, "v=spf1 mx -all");
    assert_eq!(results[1].error, "invalid domain name");
}

#[tokio::test]
async fn test_zone_scan_skips_apex() {
    let connector = Arc::new(MockConnector::new().ns("host.example.com", "ns1.example.com"));
    let scanner = scanner_with(connector, no_cache());

    let zone = b"example.com. 3600 IN NS ns1.example.com.\nhost.example.com. 3600 IN A 192.0.2.1\n";
    let results = scanner.scan_zone(&zone[..]).await.unwrap();

    let domains: Vec<&str> = results.iter().map(|r| r.domain.as_str()).collect();
    assert_eq!(domains, vec!["host.example.com"]);
    assert_eq!(results[0].ns, vec!["ns1.example.com."]);
}

#[tokio::test]
async fn test_zone_errors_fail_the_call() {
    let scanner = scanner_with(Arc::new(MockConnector::new()), no_cache());

    let zone = b"$INCLUDE other.zone\n";
    assert!(matches!(
        scanner.scan_zone(&zone[..]).await,
        Err(ScanError::Zone(_))
    ));
}

#[tokio::test]
async fn test_oversized_buffer_fails_construction() {
    let err = Scanner::with_connector(
        ScannerConfig::default().dns_buffer(5000),
        Arc::new(MockConnector::new()),
    )
    .err()
    .unwrap();
    assert_eq!(err, ConfigError::DnsBufferTooLarge(5000));
    assert!(err.to_string().contains("should not be larger than 4096"));
}

#[tokio::test]
async fn test_full_record_set() {
    let connector = Arc::new(
        MockConnector::new()
            .ns("example.com", "ns1.example.net")
            .ns("example.com", "ns2.example.net")
            .mx("example.com", 10, "mx1.example.com")
            .mx("example.com", 20, "mx2.example.com")
            .txt("example.com", &["v=spf1 redirect=_spf.example.com"])
            .txt("_spf.example.com", &["v=spf1 ip4:192.0.2.0/24 -all"])
            .txt("_dmarc.example.com", &["v=DMARC1; p=quarantine; rua=mailto:d@example.com"])
            .txt(
                "default._bimi.example.com",
                &["v=BIMI1; l=https://example.com/logo.svg;"],
            )
            .txt(
                "s2024._domainkey.example.com",
                &["v=DKIM1; k=rsa; ", "p=MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8A"],
            ),
    );
    let scanner = scanner_with(connector, no_cache().dkim_selectors(["s2024"]));

    let results = scanner.scan(["example.com"]).await.unwrap();
    let result = &results[0];

    assert_eq!(result.error, "");
    assert_eq!(result.ns, vec!["ns1.example.net.", "ns2.example.net."]);
    assert_eq!(result.mx, vec!["mx1.example.com.", "mx2.example.com."]);
    assert_eq!(result.spf, "v=spf1 ip4:192.0.2.0/24 -all");
    assert_eq!(
        result.dmarc,
        "v=DMARC1; p=quarantine; rua=mailto:d@example.com"
    );
    assert_eq!(result.bimi, "v=BIMI1; l=https://example.com/logo.svg;");
    assert_eq!(result.dkim, "v=DKIM1; k=rsa; p=MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8A");
}

#[tokio::test]
async fn test_subdomain_exists_through_txt() {
    let connector = Arc::new(
        MockConnector::new().txt("mail.example.org", &["v=spf1 include:_spf.example.net ~all"]),
    );
    let scanner = scanner_with(connector, no_cache());

    let results = scanner.scan(["mail.example.org"]).await.unwrap();
    assert_eq!(results[0].error, "");
    assert!(results[0].ns.is_empty());
    assert_eq!(results[0].spf, "v=spf1 include:_spf.example.net ~all");
}

#[tokio::test]
async fn test_mx_failure_is_recorded_on_result() {
    let connector = Arc::new(
        MockConnector::new()
            .ns("example.org", "ns1.example.net")
            .txt("example.org", &["v=spf1 -all"])
            .failing("example.org", RecordType::MX),
    );
    let scanner = scanner_with(connector, no_cache());

    let results = scanner.scan(["example.org"]).await.unwrap();
    let result = &results[0];
    assert!(result.is_error());
    assert_ne!(result.error, "invalid domain name");
    assert!(result.spf.is_empty());
    assert!(result.ns.is_empty());
    assert!(result.mx.is_empty());
}

#[tokio::test]
async fn test_refused_mx_keeps_other_records() {
    let connector = Arc::new(
        MockConnector::new()
            .ns("example.org", "ns1.example.net")
            .txt("example.org", &["v=spf1 -all"])
            .txt("_dmarc.example.org", &["v=DMARC1; p=reject;"])
            .rcode("example.org", RecordType::MX, ResponseCode::Refused),
    );
    let scanner = scanner_with(connector, no_cache());

    let results = scanner.scan(["example.org"]).await.unwrap();
    let result = &results[0];
    assert!(!result.is_error());
    assert!(result.mx.is_empty());
    assert_eq!(result.spf, "v=spf1 -all");
    assert_eq!(result.dmarc, "v=DMARC1; p=reject;");
    assert_eq!(result.ns, vec!["ns1.example.net."]);
}

#[tokio::test]
async fn test_ns_failure_is_recorded_on_result() {
    let connector = Arc::new(
        MockConnector::new()
            .txt("example.org", &["v=spf1 -all"])
            .failing("example.org", RecordType::NS),
    );
    let scanner = scanner_with(connector.clone(), no_cache());

    let results = scanner.scan(["example.org"]).await.unwrap();
    assert!(results[0].is_error());
    assert_ne!(results[0].error, "invalid domain name");
    assert!(results[0].spf.is_empty());
    assert_eq!(connector.calls(), 1);
}

#[tokio::test]
async fn test_dkim_selector_override() {
    let connector = Arc::new(
        MockConnector::new()
            .ns("example.org", "ns1.example.net")
            .txt("custom._domainkey.example.org", &["v=DKIM1; p=custom"]),
    );
    let scanner = scanner_with(connector, no_cache());

    let before = scanner.scan(["example.org"]).await.unwrap();
    assert_eq!(before[0].dkim, "");

    scanner
        .overwrite_option(ScannerOption::DkimSelectors(vec!["custom".to_string()]))
        .await
        .unwrap();
    let after = scanner.scan(["example.org"]).await.unwrap();
    assert_eq!(after[0].dkim, "v=DKIM1; p=custom");
}

#[tokio::test]
async fn test_truncated_answers_are_retried() {
    let connector = Arc::new(
        MockConnector::new()
            .ns("example.org", "ns1.example.net")
            .txt("example.org", &["v=spf1 -all"])
            .truncate_below(4096),
    );
    let scanner = scanner_with(connector.clone(), no_cache().dns_buffer(1232));

    let results = scanner.scan(["example.org"]).await.unwrap();
    assert_eq!(results[0].spf, "v=spf1 -all");

    let payloads: Vec<u16> = connector
        .seen()
        .into_iter()
        .filter(|q| q.name == "example.org." && q.record_type == RecordType::MX)
        .map(|q| q.payload)
        .collect();
    assert_eq!(payloads, vec![1232, 4096]);
}

#[tokio::test]
async fn test_raw_lookup_follows_cname() {
    let connector = Arc::new(
        MockConnector::new()
            .cname("www.example.org", RecordType::MX, "example.org")
            .mx("example.org", 10, "mx.example.org"),
    );
    let scanner = scanner_with(connector, no_cache());

    let mx = scanner
        .lookup("www.example.org", RecordType::MX)
        .await
        .unwrap();
    assert_eq!(mx, vec!["mx.example.org."]);
}

#[tokio::test]
async fn test_nameservers_are_rotated() {
    let connector = Arc::new(MockConnector::new().ns("example.org", "ns1.example.net"));
    let scanner = scanner_with(
        connector.clone(),
        no_cache().nameservers(["192.0.2.1", "192.0.2.2", "192.0.2.3"]),
    );

    for _ in 0..3 {
        scanner.lookup("example.org", RecordType::NS).await.unwrap();
    }

    let mut used: Vec<String> = connector.seen().into_iter().map(|q| q.nameserver).collect();
    used.sort();
    assert_eq!(used, vec!["192.0.2.1:53", "192.0.2.2:53", "192.0.2.3:53"]);
}

#[tokio::test]
async fn test_scan_text_from_file() {
    let connector = Arc::new(
        MockConnector::new()
            .ns("example.org", "ns1.example.net")
            .ns("example.com", "ns1.example.net"),
    );
    let scanner = scanner_with(connector, no_cache());

    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "# targets\nexample.org.\n\nexample.com\n").unwrap();

    let input = tokio::fs::File::open(file.path()).await.unwrap();
    let results = by_domain(scanner.scan_text(input).await.unwrap());

    let domains: Vec<&str> = results.iter().map(|r| r.domain.as_str()).collect();
    assert_eq!(domains, vec!["example.com", "example.org"]);
    assert!(results.iter().all(|r| !r.is_error()));
}

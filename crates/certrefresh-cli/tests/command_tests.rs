//! Commands run against in-memory accounts

mod common;

use certrefresh_cdn::mock::MockDirectory;
use certrefresh_cdn::{ApiError, HttpsConfig};
use certrefresh_cli::commands::{DeleteCmd, InfoCmd, RefreshCmd, UploadCmd};
use certrefresh_cli::context::AppContext;
use certrefresh_engine::{Account, RefreshError, Refresher};
use common::write_cert_files;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const PREFIX: &str = "[CertRefresh-Managed]";
const DAY: i64 = 86_400;

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn https(cert_id: &str) -> Option<HttpsConfig> {
    Some(HttpsConfig {
        cert_id: cert_id.to_string(),
        force_https: true,
        http2_enabled: true,
    })
}

fn context(accounts: &[(&str, &MockDirectory)]) -> AppContext {
    let accounts = accounts
        .iter()
        .map(|(name, mock)| Account::new(*name, PREFIX, Arc::new((*mock).clone())))
        .collect();
    AppContext::new(accounts, Refresher::default())
}

/// An account with one managed certificate for www.example.com bound to two domains
async fn seeded_account() -> MockDirectory {
    let mock = MockDirectory::new();
    let t = now();
    mock.add_certificate("old", &format!("{} www.example.com (1)", PREFIX), t - 80 * DAY, t + 10 * DAY)
        .await;
    mock.add_domain("a.example.com", https("old")).await;
    mock.add_domain("b.example.com", https("old")).await;
    mock
}

fn upload_cmd(dir: &TempDir, key: &str) -> UploadCmd {
    let (cert, pem) = write_cert_files(dir.path(), "www.example.com");
    UploadCmd {
        key: key.to_string(),
        cert,
        pem,
        no_activate: false,
    }
}

#[tokio::test]
async fn test_upload_repoints_domains_to_new_certificate() {
    let dir = TempDir::new().unwrap();
    let mock = seeded_account().await;
    let ctx = context(&[("prod", &mock)]);

    upload_cmd(&dir, "www.example.com").execute(&ctx).await.unwrap();

    let uploads = mock.uploads().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].common_name, "www.example.com");
    assert!(uploads[0].name.starts_with("[CertRefresh-Managed] www.example.com ("));

    let new_id = mock.bound_cert("a.example.com").await.unwrap();
    assert_ne!(new_id, "old");
    assert_eq!(mock.bound_cert("b.example.com").await.unwrap(), new_id);

    let domain = mock.domain("a.example.com").await.unwrap();
    let https = domain.https.unwrap();
    assert!(https.force_https);
    assert!(https.http2_enabled);
}

#[tokio::test]
async fn test_upload_stops_at_first_failing_account() {
    let dir = TempDir::new().unwrap();
    let first = seeded_account().await;
    let second = seeded_account().await;
    first.fail_upload(ApiError::new(400500, "quota exceeded")).await;
    let ctx = context(&[("first", &first), ("second", &second)]);

    let err = upload_cmd(&dir, "www.example.com")
        .execute(&ctx)
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("account first"));
    assert!(second.uploads().await.is_empty());
    assert_eq!(second.bound_cert("a.example.com").await.unwrap(), "old");
}

#[tokio::test]
async fn test_upload_rejects_empty_key_before_reading_files() {
    let ctx = context(&[]);
    let cmd = UploadCmd {
        key: " ".to_string(),
        cert: "does-not-exist.pem".into(),
        pem: "does-not-exist.key".into(),
        no_activate: false,
    };
    let err = cmd.execute(&ctx).await.unwrap_err();
    assert!(err.to_string().contains("tracing key"));
}

#[tokio::test]
async fn test_refresh_with_explicit_certificate() {
    let mock = seeded_account().await;
    let t = now();
    mock.add_certificate("new", &format!("{} www.example.com (2)", PREFIX), t - DAY, t + 89 * DAY)
        .await;
    let ctx = context(&[("prod", &mock)]);

    RefreshCmd {
        key: "www.example.com".into(),
        cert_id: Some("new".into()),
    }
    .execute(&ctx)
    .await
    .unwrap();

    assert_eq!(mock.bound_cert("a.example.com").await.unwrap(), "new");
    assert_eq!(mock.bound_cert("b.example.com").await.unwrap(), "new");
}

#[tokio::test]
async fn test_failed_refresh_keeps_domain_lists() {
    let mock = seeded_account().await;
    let t = now();
    mock.add_certificate("new", &format!("{} www.example.com (2)", PREFIX), t - DAY, t + 89 * DAY)
        .await;
    mock.set_update_delay("b.example.com", Duration::from_millis(50)).await;
    mock.fail_update("b.example.com", ApiError::new(500, "unavailable")).await;
    let ctx = context(&[("prod", &mock)]);

    let err = RefreshCmd {
        key: "www.example.com".into(),
        cert_id: Some("new".into()),
    }
    .execute(&ctx)
    .await
    .unwrap_err();

    match err.downcast_ref::<RefreshError>() {
        Some(RefreshError::PartialRefresh {
            failed_domain,
            completed,
            unconfirmed,
            ..
        }) => {
            assert_eq!(failed_domain, "b.example.com");
            assert_eq!(completed, &vec!["a.example.com".to_string()]);
            assert!(unconfirmed.is_empty());
        }
        other => panic!("expected a partial refresh, got {:?}", other),
    }
    assert_eq!(mock.bound_cert("a.example.com").await.unwrap(), "new");
    assert_eq!(mock.bound_cert("b.example.com").await.unwrap(), "old");
}

#[tokio::test]
async fn test_refresh_rejects_foreign_certificate() {
    let mock = seeded_account().await;
    mock.add_certificate("other", "[CertRefresh-Managed] api.example.com (3)", 0, i64::MAX)
        .await;
    let ctx = context(&[("prod", &mock)]);

    let err = RefreshCmd {
        key: "www.example.com".into(),
        cert_id: Some("other".into()),
    }
    .execute(&ctx)
    .await
    .unwrap_err();

    assert!(format!("{:#}", err).contains("not a candidate"));
    assert_eq!(mock.update_count("a.example.com").await, 0);
}

#[tokio::test]
async fn test_info_skips_failing_account() {
    let broken = MockDirectory::new();
    broken
        .fail_list_certificates(ApiError::new(500, "unavailable"))
        .await;
    let healthy = seeded_account().await;
    let ctx = context(&[("broken", &broken), ("healthy", &healthy)]);

    InfoCmd { json: true }.execute(&ctx).await.unwrap();
    InfoCmd::default().execute(&ctx).await.unwrap();
}

#[tokio::test]
async fn test_delete_needs_account_when_several_configured() {
    let first = seeded_account().await;
    let second = seeded_account().await;
    let ctx = context(&[("first", &first), ("second", &second)]);

    let cmd = DeleteCmd {
        cert_id: "old".into(),
        account: None,
    };
    assert!(cmd.execute(&ctx).await.is_err());
}

#[tokio::test]
async fn test_delete_bound_certificate_is_refused() {
    let mock = seeded_account().await;
    let ctx = context(&[("prod", &mock)]);

    let err = DeleteCmd {
        cert_id: "old".into(),
        account: Some("prod".into()),
    }
    .execute(&ctx)
    .await
    .unwrap_err();

    assert!(err.to_string().contains("400611"));
    assert_eq!(mock.certificates().await.len(), 1);
}

#[tokio::test]
async fn test_delete_unbound_certificate() {
    let mock = MockDirectory::new();
    mock.add_certificate("stale", "[CertRefresh-Managed] www.example.com (0)", 0, 1)
        .await;
    let ctx = context(&[("prod", &mock)]);

    DeleteCmd {
        cert_id: "stale".into(),
        account: None,
    }
    .execute(&ctx)
    .await
    .unwrap();

    assert!(mock.certificates().await.is_empty());
}

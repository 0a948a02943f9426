use super::*;

#[tokio::test]
async fn every_operation_reports_backend_unsupported() {
    let adapter = UnsupportedAdapter::new("redis");
    let err = SessionStorePort::prepare(&adapter).await.expect_err("should fail");
    assert_eq!(err.status_code(), memengine_error::StatusCode::BackendUnsupported);
    match err {
        MemoryError::BackendUnsupported { backend, .. } => assert_eq!(backend, "redis"),
        other => panic!("unexpected error variant: {other:?}"),
    }
}

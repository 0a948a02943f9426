use super::*;

#[test]
fn not_initialized_maps_to_its_status_code() {
    let err = MemoryError::NotInitialized;
    assert_eq!(err.status_code(), StatusCode::NotInitialized);
    assert!(err.to_string().contains("not initialized"));
}

#[test]
fn already_exists_carries_the_session_id() {
    let err = AlreadyExistsSnafu {
        session_id: "s1".to_string(),
    }
    .build();
    assert_eq!(err.status_code(), StatusCode::AlreadyExists);
    assert!(err.to_string().contains("s1"));
}

#[test]
fn backend_unsupported_names_the_backend_and_is_not_retryable() {
    let err = BackendUnsupportedSnafu {
        backend: "document".to_string(),
        message: "not implemented".to_string(),
    }
    .build();
    assert_eq!(err.status_code(), StatusCode::BackendUnsupported);
    assert!(!err.status_code().retryable());
}

#[test]
fn write_failure_is_retryable() {
    let err = WriteFailureSnafu {
        path: "sessions/s1.json".to_string(),
    }
    .into_error(std::io::Error::other("disk full"));
    assert!(err.status_code().retryable());
}

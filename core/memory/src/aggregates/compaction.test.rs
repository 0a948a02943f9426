use super::*;

#[test]
fn compaction_record_round_trips_through_json() {
    let record = CompactionRecord {
        record_id: "rec-1".to_string(),
        session_id: "s1".to_string(),
        compacted_at: Utc::now(),
        message_count_before: 10,
        message_count_after: 3,
        archived_message_ids: vec!["m1".to_string(), "m2".to_string()],
        summary_message_id: "sum-1".to_string(),
        reason: CompactionReason::TokenLimit,
        token_count_before: Some(5000),
        token_count_after: Some(800),
    };

    let json = serde_json::to_string(&record).expect("serialize");
    let back: CompactionRecord = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.record_id, record.record_id);
    assert_eq!(back.archived_message_ids, record.archived_message_ids);
    assert_eq!(back.reason, record.reason);
}

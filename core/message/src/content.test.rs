use super::*;

#[test]
fn text_content_char_len_matches_string_length() {
    let content = MessageContent::text("hello");
    assert_eq!(content.char_len(), 5);
    assert!(!content.is_empty());
}

#[test]
fn empty_parts_is_empty() {
    let content = MessageContent::Parts(vec![]);
    assert!(content.is_empty());
}

#[test]
fn plain_text_concatenates_text_parts_only() {
    let content = MessageContent::Parts(vec![
        ContentPart::text("a"),
        ContentPart::ImageUrl {
            url: "http://x/y.png".to_string(),
            detail: None,
        },
        ContentPart::text("b"),
    ]);
    assert_eq!(content.to_plain_text(), "a\nb");
}

#[test]
fn untagged_content_round_trips_as_string_when_possible() {
    let content = MessageContent::text("hi");
    let json = serde_json::to_value(&content).expect("serialize");
    assert_eq!(json, serde_json::json!("hi"));
    let back: MessageContent = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, content);
}

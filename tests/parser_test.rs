use eml_stage::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_simple_message() {
    let raw = b"From: John Doe john@x.com\r\n\
                To: a@x.com;\r\n b@x.com\r\n\
                Subject: =?UTF-8?Q?Hi?=\r\n\
                Message-ID: <id@x>\r\n\
                \r\n\
                Body text";

    let message = parse_message(5, raw).unwrap();

    assert_eq!(message.record.id, 5);
    assert_eq!(message.record.from_addr, "John Doe john@x.com");
    assert_eq!(message.record.subject, "=?UTF-8?Q?Hi?=");
    assert_eq!(message.record.message_id, "<id@x>");
    assert_eq!(message.to, "a@x.com; b@x.com");
    assert_eq!(message.body, "Body text");
}

#[test]
fn test_parse_missing_headers_are_empty() {
    let raw = b"FROM: a@x.com\r\n\r\nHello";

    let message = parse_message(1, raw).unwrap();

    assert_eq!(message.record.from_addr, "a@x.com");
    assert_eq!(message.record.date, "");
    assert_eq!(message.record.content_type, "");
    assert_eq!(message.to, "");
}

#[test]
fn test_parse_folded_received() {
    let raw = b"Received: from mx.example.com\r\n\tby relay.example.com\r\n\
                Content-Type: text/plain;\r\n charset=utf-8\r\n\
                \r\n";

    let message = parse_message(2, raw).unwrap();

    assert_eq!(
        message.record.received,
        "from mx.example.com\tby relay.example.com"
    );
    assert_eq!(message.record.content_type, "text/plain; charset=utf-8");
    assert_eq!(message.body, "");
}

#[test]
fn test_parse_then_stage() {
    let raw = b"From: \"Doe, Jane\" <jane@x.com>\r\n\
                To: Alice <a@x.com>; Bob <b@x.com>\r\n\
                Subject: Report\r\n\
                Date: Mon, 1 Jan 2024 00:00:00 +0000\r\n\
                MIME-Version: 1.0\r\n\
                \r\n\
                See attached.";
    let root = TempDir::new().unwrap();
    let workspace = Workspace::create(&StageConfig::default().with_temp_root(root.path())).unwrap();

    let message = parse_message(11, raw).unwrap();
    let path = stage_message(&workspace, message.record, &message.to, &message.body).unwrap();

    let written = fs::read_to_string(path).unwrap();
    assert!(written.starts_with("From:jane@x.com\nTo:a@x.com,b@x.com\nSubject:Report\n"));
    assert!(written.contains("\nMIME-Version:1.0\n"));
    assert!(written.ends_with("\n\nSee attached."));
}

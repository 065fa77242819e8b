use eml_stage::*;
use std::fs;
use tempfile::TempDir;

fn workspace_in(root: &TempDir) -> Workspace {
    let config = StageConfig::default().with_temp_root(root.path());
    Workspace::create(&config).unwrap()
}

fn sample_record(id: i64) -> MessageRecord {
    MessageRecord {
        id,
        from_addr: "a@x.com\n".into(),
        subject: "Multi\nline\r\nsubject".into(),
        message_id: "<m@x>\n".into(),
        received: "from a\n\tby b\n".into(),
        date: "Mon, 1 Jan 2024 00:00:00 +0000\n".into(),
        mime_version: "1.0".into(),
        content_type: "text/plain; charset=utf-8\n".into(),
        content_transfer_encoding: "7bit\n".into(),
    }
}

// --- Workspace ---

#[test]
fn test_workspace_created_when_absent() {
    let root = TempDir::new().unwrap();
    let workspace = workspace_in(&root);

    assert!(workspace.path().is_dir());
    assert_eq!(workspace.path(), root.path().join(DEFAULT_STAGE_NAME).join(""));
    assert!(workspace.to_string().ends_with(std::path::MAIN_SEPARATOR));
}

#[test]
fn test_workspace_reset_discards_stale_files() {
    let root = TempDir::new().unwrap();
    let first = workspace_in(&root);
    fs::write(first.file_path(1), "stale").unwrap();
    fs::create_dir(first.path().join("nested")).unwrap();

    let second = workspace_in(&root);

    assert_eq!(first, second);
    assert!(second.path().is_dir());
    assert_eq!(fs::read_dir(second.path()).unwrap().count(), 0);
}

#[test]
fn test_workspace_replaces_plain_file() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join(DEFAULT_STAGE_NAME), "not a dir").unwrap();

    let workspace = workspace_in(&root);

    assert!(workspace.path().is_dir());
}

#[cfg(unix)]
#[test]
fn test_workspace_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let root = TempDir::new().unwrap();
    let workspace = workspace_in(&root);

    let mode = fs::metadata(workspace.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o700);
}

#[test]
fn test_workspace_inaccessible_root() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("missing");
    let config = StageConfig::default().with_temp_root(&missing);

    let err = Workspace::create(&config).unwrap_err();

    match err {
        StageError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_discard_missing_path_is_quiet() {
    let root = TempDir::new().unwrap();
    discard(&root.path().join("nothing-here"));
    assert!(root.path().is_dir());
}

// --- Files ---

#[test]
fn test_write_layout() {
    let root = TempDir::new().unwrap();
    let workspace = workspace_in(&root);

    let file = create_file(7, workspace.path()).unwrap();
    assert_eq!(file.path(), workspace.file_path(7));
    let path = file
        .write(&sample_record(7), "b@x.com", "Hello\r\nWorld\n")
        .unwrap();

    let written = fs::read_to_string(path).unwrap();
    assert_eq!(
        written,
        "From:a@x.com\n\
         To:b@x.com\n\
         Subject:Multi line subject\n\
         Message-ID:<m@x>\n\
         Received:from a\n\tby b\n\
         Date:Mon, 1 Jan 2024 00:00:00 +0000\n\
         MIME-Version:1.0\n\
         Content-Type:text/plain; charset=utf-8\n\
         Content-Transfer-Encoding:7bit\n\
         \n\
         Hello\r\nWorld\n"
    );
}

#[test]
fn test_render_header_order() {
    let header = render_header(&MessageRecord::default(), "");
    let names: Vec<&str> = header
        .lines()
        .take(9)
        .map(|line| line.split(':').next().unwrap())
        .collect();

    assert_eq!(
        names,
        [
            "From",
            "To",
            "Subject",
            "Message-ID",
            "Received",
            "Date",
            "MIME-Version",
            "Content-Type",
            "Content-Transfer-Encoding",
        ]
    );
    assert!(header.ends_with(":\n\n"));
}

#[test]
fn test_create_file_missing_dir() {
    let root = TempDir::new().unwrap();
    let err = create_file(9, &root.path().join("gone")).unwrap_err();

    match err {
        StageError::Io { path, .. } => assert!(path.ends_with("9.eml")),
        other => panic!("unexpected error: {other}"),
    }
}

// --- Pipeline ---

#[test]
fn test_stage_message_decodes_and_normalizes() {
    let root = TempDir::new().unwrap();
    let workspace = workspace_in(&root);
    let record = MessageRecord {
        id: 42,
        from_addr: "=?UTF-8?B?SmFuZQ==?= (jane@x.com)".into(),
        subject: "=?UTF-8?Q?caf=C3=A9?=".into(),
        ..MessageRecord::default()
    };

    let path = stage_message(&workspace, record, "a@x.com; b@x.com", "Body").unwrap();

    assert_eq!(path, workspace.file_path(42));
    let written = fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "From:jane@x.com");
    assert_eq!(lines[1], "To:a@x.com,b@x.com");
    assert_eq!(lines[2], "Subject:café");
    assert!(written.ends_with("\n\nBody"));
}

#[test]
fn test_stage_message_with_discarded_to() {
    let root = TempDir::new().unwrap();
    let workspace = workspace_in(&root);
    let record = MessageRecord {
        id: 3,
        from_addr: "John Doe john@x.com".into(),
        ..MessageRecord::default()
    };

    let path = stage_message(&workspace, record, "@x.com, b@x.com", "").unwrap();

    let written = fs::read_to_string(path).unwrap();
    assert!(written.starts_with("From:john@x.com\nTo:\n"));
}

#[test]
fn test_stage_message_without_workspace_dir() {
    let root = TempDir::new().unwrap();
    let workspace = workspace_in(&root);
    fs::remove_dir_all(workspace.path()).unwrap();

    let result = stage_message(&workspace, MessageRecord::default(), "", "");

    assert!(matches!(result, Err(StageError::Io { .. })));
}

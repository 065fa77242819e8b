//! Flattened `.eml` output

use crate::decoder::decode;
use crate::error::{Result, StageError};
use crate::normalizer::normalize_addresses;
use crate::types::MessageRecord;
use crate::workspace::Workspace;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// A newly created, still empty `.eml` file
///
/// [`EmlFile::write`] consumes the handle, so the file is closed once the
/// write returns, whether it succeeded or not.
#[derive(Debug)]
pub struct EmlFile {
    file: File,
    path: PathBuf,
}

/// File name for message `id`
#[must_use]
pub fn eml_file_name(id: i64) -> String {
    format!("{id}.eml")
}

/// Create `<dir>/<id>.eml`.
pub fn create_file(id: i64, dir: &Path) -> Result<EmlFile> {
    let path = dir.join(eml_file_name(id));
    let file = File::create(&path).map_err(|e| {
        error!("Failed to create {}: {e}", path.display());
        StageError::io(&path, e)
    })?;
    Ok(EmlFile { file, path })
}

impl EmlFile {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header block, a blank line and the body. Returns the file path.
    pub fn write(self, record: &MessageRecord, to: &str, body: &str) -> Result<PathBuf> {
        let Self { file, path } = self;
        match write_eml(file, record, to, body) {
            Ok(()) => Ok(path),
            Err(e) => {
                error!("Failed to write {}: {e}", path.display());
                Err(StageError::io(path, e))
            }
        }
    }
}

/// Decode, normalize and write one message into the workspace.
///
/// Address problems never fail this call; only filesystem errors do.
pub fn stage_message(
    workspace: &Workspace,
    mut record: MessageRecord,
    to: &str,
    body: &str,
) -> Result<PathBuf> {
    let from = decode(&record.from_addr);
    let to = decode(to);
    record.subject = decode(&record.subject);

    let addresses = normalize_addresses(&from, &to);
    record.from_addr = addresses.from;

    let path = create_file(record.id, workspace.path())?.write(&record, &addresses.to, body)?;
    debug!("Staged message {} at {}", record.id, path.display());
    Ok(path)
}

/// Render the nine header lines and the separating blank line.
#[must_use]
pub fn render_header(record: &MessageRecord, to: &str) -> String {
    let subject = flatten_line_breaks(&record.subject);
    let fields = [
        ("From", trim_line_break(&record.from_addr)),
        ("To", trim_line_break(to)),
        ("Subject", subject.as_str()),
        ("Message-ID", trim_line_break(&record.message_id)),
        ("Received", trim_line_break(&record.received)),
        ("Date", trim_line_break(&record.date)),
        ("MIME-Version", trim_line_break(&record.mime_version)),
        ("Content-Type", trim_line_break(&record.content_type)),
        (
            "Content-Transfer-Encoding",
            trim_line_break(&record.content_transfer_encoding),
        ),
    ];

    let mut header = String::new();
    for (name, value) in fields {
        header.push_str(name);
        header.push(':');
        header.push_str(value);
        header.push('\n');
    }
    header.push('\n');
    header
}

fn write_eml<W: Write>(mut out: W, record: &MessageRecord, to: &str, body: &str) -> io::Result<()> {
    let mut message = render_header(record, to);
    debug!("Writing header: {message:?}");
    message.push_str(body);

    out.write_all(message.as_bytes())?;
    out.flush()
}

/// Drop one trailing line break; embedded ones stay.
fn trim_line_break(value: &str) -> &str {
    value
        .strip_suffix("\r\n")
        .or_else(|| value.strip_suffix('\n'))
        .unwrap_or(value)
}

/// Every line break becomes a single space.
fn flatten_line_breaks(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

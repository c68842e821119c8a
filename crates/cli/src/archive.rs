//! Session archiving — the user/assistant transcript of an interactive
//! session, written once when the session ends.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local};
use skillloop_core::message::{ConversationEntry, ConversationLog};
use tracing::{debug, info};

static ARCHIVED: AtomicBool = AtomicBool::new(false);

/// Render the user questions and final assistant answers as markdown.
///
/// Tool traffic and intermediate assistant entries that only request tools
/// are left out.
pub fn render_transcript(log: &ConversationLog) -> String {
    let mut out = String::new();
    for entry in log.iter() {
        match entry {
            ConversationEntry::User { content } => {
                out.push_str("## User\n");
                out.push_str(content.trim_end());
                out.push_str("\n\n");
            }
            ConversationEntry::Assistant(msg) if !msg.has_tool_calls() && !msg.content.is_empty() => {
                out.push_str("## AI\n");
                out.push_str(msg.content.trim_end());
                out.push_str("\n\n");
            }
            _ => {}
        }
    }
    out
}

/// `<archive_dir>/logs/<YYYY-MM-DD>/<HHMMSS>_session.md`
pub fn archive_path(archive_dir: &Path, at: DateTime<Local>) -> PathBuf {
    archive_dir
        .join("logs")
        .join(at.format("%Y-%m-%d").to_string())
        .join(format!("{}_session.md", at.format("%H%M%S")))
}

/// Write the transcript under `archive_dir`.
///
/// Only the first call in a process writes anything; later calls and
/// sessions without a single user message return `Ok(None)`.
pub fn archive_once(archive_dir: &Path, log: &ConversationLog) -> std::io::Result<Option<PathBuf>> {
    let transcript = render_transcript(log);
    if transcript.is_empty() {
        debug!("Nothing to archive");
        return Ok(None);
    }
    if ARCHIVED.swap(true, Ordering::SeqCst) {
        debug!("Session already archived");
        return Ok(None);
    }

    let path = archive_path(archive_dir, Local::now());
    write_transcript(&path, &transcript)?;
    info!(path = %path.display(), "Session archived");
    Ok(Some(path))
}

fn write_transcript(path: &Path, transcript: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, transcript)
}

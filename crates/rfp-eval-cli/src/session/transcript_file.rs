use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rfp_eval::models::message::Message;

/// Append-only JSON lines log of everything said in a chat session
#[derive(Debug, Clone)]
pub struct TranscriptFile {
    path: PathBuf,
}

impl TranscriptFile {
    /// `<documents>/sessions/<session-id>.jsonl`
    pub fn create(documents_dir: &Path, session_id: &str) -> Result<Self> {
        let dir = documents_dir.join("sessions");
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self {
            path: dir.join(format!("{}.jsonl", session_id)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, message: &Message) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, message)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<Message>> {
        let file = fs::File::open(&self.path)?;
        let mut messages = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                messages.push(serde_json::from_str(&line)?);
            }
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfp_eval::models::agent_role::AgentRole;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_read() -> Result<()> {
        let dir = tempdir()?;
        let transcript = TranscriptFile::create(dir.path(), "session-1")?;
        assert_eq!(
            transcript.path(),
            dir.path().join("sessions").join("session-1.jsonl")
        );

        let question = Message::user().with_text("Any compliance issues?");
        let answer = Message::assistant()
            .with_text("Clause 4.2 conflicts with\nthe data residency policy.")
            .with_name(AgentRole::LegalCompliance);
        transcript.append(&question)?;
        transcript.append(&answer)?;

        let content = fs::read_to_string(transcript.path())?;
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("\"name\":\"LegalCompliance\""));

        assert_eq!(transcript.read()?, vec![question, answer]);
        Ok(())
    }
}

use anyhow::{Context, Result};
use futures::StreamExt;

use crate::prompt::{InputType, Prompt};
use rfp_eval::models::message::Message;
use rfp_eval::session::EvaluationSession;

pub mod transcript_file;

use transcript_file::TranscriptFile;

/// The interactive console over a prepared evaluation session
pub struct ChatSession<'a> {
    session: EvaluationSession,
    prompt: Box<dyn Prompt + 'a>,
    transcript: TranscriptFile,
}

impl<'a> ChatSession<'a> {
    pub fn new(
        session: EvaluationSession,
        prompt: Box<impl Prompt + 'a>,
        transcript: TranscriptFile,
    ) -> Self {
        ChatSession {
            session,
            prompt,
            transcript,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.session.chat().is_none() {
            anyhow::bail!("The session has no chat to run");
        }
        self.prompt.notify(&format!(
            "Recording session to {}",
            self.transcript.path().display()
        ));
        self.prompt.ready();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = &input.content {
                        self.send(content)?;
                    }
                }
                InputType::Reset => {
                    if let Some(chat) = self.session.chat_mut() {
                        chat.reset();
                    }
                    self.prompt.notify("[Conversation has been reset]");
                    continue;
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }

            self.prompt.show_busy();
            self.process_turns().await;
            self.prompt.hide_busy();
        }

        self.prompt.notify(&format!(
            "Closing session. Recorded to {}",
            self.transcript.path().display()
        ));
        self.prompt.close();
        Ok(())
    }

    /// Run a single request without prompting, as `analyze` does for its opening turn
    pub async fn headless(&mut self, request: &str) -> Result<()> {
        self.send(request)?;
        self.prompt.show_busy();
        self.process_turns().await;
        self.prompt.hide_busy();
        Ok(())
    }

    pub fn into_session(self) -> EvaluationSession {
        self.session
    }

    fn send(&mut self, text: &str) -> Result<()> {
        let message = Message::user().with_text(text);
        if let Some(chat) = self.session.chat_mut() {
            chat.add_user_message(text);
        }
        self.transcript
            .append(&message)
            .context("Failed to record the user message")
    }

    async fn process_turns(&mut self) {
        let Some(chat) = self.session.chat_mut() else {
            return;
        };
        let mut stream = chat.invoke();
        let mut interrupted = false;
        loop {
            tokio::select! {
                reply = stream.next() => {
                    match reply {
                        Some(Ok(message)) => {
                            self.prompt.hide_busy();
                            self.transcript
                                .append(&message)
                                .unwrap_or_else(|e| eprintln!("Failed to record reply: {}", e));
                            self.prompt.render(&message);
                            self.prompt.show_busy();
                        }
                        Some(Err(e)) => {
                            self.prompt.hide_busy();
                            eprintln!("Error during chat invocation: {}", e);
                            break;
                        }
                        None => break,
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    interrupted = true;
                    self.prompt.hide_busy();
                    self.prompt.notify("Interrupted. Replies received so far are kept.");
                    break;
                }
            }
        }
        drop(stream);
        if interrupted {
            chat.interrupt();
        }
    }
}

//! CLI channel over stdin/stdout REPL for local testing.
//!
//! Lines typed on stdin become messages from `local-user`. Since a terminal
//! has no share-contact button, `/contact <phone>` stands in for sharing your
//! own contact and `/contact <phone> <owner>` for sharing someone else's.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, Keyboard, MessageStream, OutgoingResponse, SharedContact};
use crate::document::Document;
use crate::error::{ChannelError, NotifyError};
use crate::notify::Notifier;

/// Identity of the single CLI user.
pub const CLI_USER: &str = "local-user";

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        if tx.send(parse_line(&line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}", response.content);
        match response.keyboard {
            Keyboard::QuickReplies(labels) => println!("   [{}]", labels.join("] [")),
            Keyboard::RequestContact(label) => {
                println!("   [{label}]  (type /contact <phone> to share)")
            }
            Keyboard::None | Keyboard::Remove => {}
        }
        println!();
        eprint!("> ");
        Ok(())
    }

    async fn send_document(
        &self,
        _msg: &IncomingMessage,
        document: Document,
    ) -> Result<(), ChannelError> {
        println!("📎 {} ({} bytes)\n", document.file_name, document.bytes.len());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[async_trait]
impl Notifier for CliChannel {
    async fn notify(&self, operator: &str, text: &str) -> Result<(), NotifyError> {
        eprintln!("── to operator {operator} ──\n{text}\n");
        Ok(())
    }
}

/// Turn a stdin line into a message, expanding `/contact`.
fn parse_line(line: &str) -> IncomingMessage {
    let mut parts = line.split_whitespace();
    if parts.next() == Some("/contact") {
        if let Some(phone) = parts.next() {
            let owner = parts.next().unwrap_or(CLI_USER);
            return IncomingMessage::new("cli", CLI_USER, "").with_contact(SharedContact {
                phone_number: phone.to_string(),
                user_id: Some(owner.to_string()),
            });
        }
    }
    IncomingMessage::new("cli", CLI_USER, line)
}

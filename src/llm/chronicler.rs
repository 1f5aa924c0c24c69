use crate::{
    chat::im_channel::{Message, MessageRx, MessageTx},
    sys::llm::Turn,
};

use super::{GenerateRequest, GenerativeService};

pub const NOT_RECORDED: &str = "기록을 찾을 수 없습니다.";
pub const CHRONICLE_UNAVAILABLE: &str =
    "오류가 발생하여 연대기를 펼칠 수 없습니다. (API Key를 확인해주세요)";

pub struct Chronicler<S> {
    service: S,
    system_instruction: String,
}

impl<S: GenerativeService> Chronicler<S> {
    /// `system_instruction` already carries the serialized world document.
    pub fn new(service: S, system_instruction: String) -> Self {
        Self {
            service,
            system_instruction,
        }
    }

    pub fn request(&self, user_message: &str, history: &[Turn]) -> GenerateRequest {
        let mut contents = Vec::with_capacity(history.len() + 1);
        contents.extend(history.iter().cloned());
        contents.push(Turn::user(user_message));

        GenerateRequest {
            system_instruction: self.system_instruction.clone(),
            contents,
        }
    }

    /// Never fails: errors become [`CHRONICLE_UNAVAILABLE`], empty replies [`NOT_RECORDED`].
    pub fn ask(&self, user_message: &str, history: &[Turn]) -> String {
        let request = self.request(user_message, history);

        match self.service.generate(&request) {
            Ok(Some(text)) if !text.is_empty() => text,
            Ok(_) => {
                log::warn!("chronicler returned no text");
                NOT_RECORDED.to_string()
            }
            Err(e) => {
                log::error!("chronicler request failed: {e:#}");
                CHRONICLE_UNAVAILABLE.to_string()
            }
        }
    }
}

pub struct ChroniclerWorker<S> {
    chronicler: Chronicler<S>,
    rx: MessageRx,
    tx: MessageTx,
}

impl<S: GenerativeService> ChroniclerWorker<S> {
    pub fn new(chronicler: Chronicler<S>, rx: MessageRx, tx: MessageTx) -> Self {
        Self { chronicler, rx, tx }
    }

    /// Answers every `Ask` exactly once, until either side of the channel closes.
    pub fn run_loop(self) -> anyhow::Result<()> {
        while let Ok(message) = self.rx.recv() {
            match message {
                Message::Ask { question, history } => {
                    let reply = self.chronicler.ask(&question, &history);
                    if self.tx.send(Message::Answer { question, reply }).is_err() {
                        break;
                    }
                }
                Message::Answer { .. } => continue,
            }
        }
        log::debug!("chronicler worker stopped");
        Ok(())
    }
}

impl<S: GenerativeService + 'static> ChroniclerWorker<S> {
    pub fn spawn(self) -> std::thread::JoinHandle<anyhow::Result<()>> {
        std::thread::spawn(move || self.run_loop())
    }
}

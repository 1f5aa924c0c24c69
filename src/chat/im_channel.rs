use crate::sys::llm::Turn;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Ask { question: String, history: Vec<Turn> },
    Answer { question: String, reply: String },
}

pub type MessageTx = crossbeam::channel::Sender<Message>;
pub type MessageRx = crossbeam::channel::Receiver<Message>;

/// One channel pair for the UI side and one for the chronicler side.
pub fn channel() -> ((MessageTx, MessageRx), (MessageTx, MessageRx)) {
    let (ui_tx, worker_rx) = crossbeam::channel::unbounded();
    let (worker_tx, ui_rx) = crossbeam::channel::unbounded();
    ((ui_tx, ui_rx), (worker_tx, worker_rx))
}

use crate::{
    chat::{
        history::ConversationLog,
        im_channel::{Message, MessageRx, MessageTx},
    },
    llm::{GenerateRequest, GenerativeService},
    sys::llm::Role,
};

/// Offline service: answers with the last user turn.
pub struct EchoService;

impl GenerativeService for EchoService {
    fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Option<String>> {
        Ok(request
            .contents
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| format!("(echo) {}", turn.text)))
    }
}

/// Line-mode front-end over stdin/stdout.
pub struct TerminalApp {
    pub tx: MessageTx,
    pub rx: MessageRx,
    pub log: ConversationLog,
}

impl TerminalApp {
    fn listen_user_input(tx: crossbeam::channel::Sender<String>) {
        let stdin = std::io::stdin();
        loop {
            let mut line = String::new();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            if line.starts_with("exit!") {
                break;
            }
            if tx.send(line.trim_end().to_string()).is_err() {
                break;
            }
        }
    }

    pub fn run_loop(mut self) -> anyhow::Result<()> {
        let (input_tx, input_rx) = crossbeam::channel::unbounded();
        std::thread::spawn(move || Self::listen_user_input(input_tx));

        for message in self.log.messages() {
            println!("[{}] {}", message.role, message.text);
        }

        let mut pending = false;
        loop {
            crossbeam::select! {
                recv(input_rx) -> line => {
                    let Ok(line) = line else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    if pending {
                        println!("(the chronicler is still writing)");
                        continue;
                    }
                    pending = true;
                    let history = self.log.history();
                    self.tx.send(Message::Ask { question: line, history })?;
                }
                recv(self.rx) -> message => {
                    let Ok(message) = message else { break };
                    if let Message::Answer { question, reply } = message {
                        pending = false;
                        self.log.append_user(question);
                        let reply = self.log.append_model(reply);
                        println!("[{}] {}", reply.role, reply.text);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::llm::Turn;

    #[test]
    fn echo_repeats_latest_user_turn() {
        let request = GenerateRequest {
            system_instruction: String::new(),
            contents: vec![Turn::user("first"), Turn::model("a"), Turn::user("second")],
        };
        assert_eq!(
            EchoService.generate(&request).unwrap().as_deref(),
            Some("(echo) second")
        );
    }

    #[test]
    fn echo_without_user_turn_is_empty() {
        let request = GenerateRequest {
            system_instruction: String::new(),
            contents: vec![Turn::model("a")],
        };
        assert!(EchoService.generate(&request).unwrap().is_none());
    }
}

use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    widgets::{Block, Paragraph, Tabs},
    Frame, Terminal,
};

use crossbeam::channel::TryRecvError;

use crate::chat::{
    history::ConversationLog,
    im_channel::{self, MessageRx, MessageTx},
};
use crate::llm::chronicler::CHRONICLE_UNAVAILABLE;
use crate::sys::WorldData;

pub mod chat;
pub mod nations;

#[derive(Debug)]
pub enum Input {
    Event(Event),
    Message(im_channel::Message),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Output {
    Exit,
    Ask(String),
    Normal,
}

pub struct App {
    pub world: WorldData,
    pub log: ConversationLog,
    pub nations: nations::NationsComponent,
    pub chat: chat::ChatComponent,
    chat_open: bool,
    exit_n: u8,
}

impl App {
    pub fn new(world: WorldData, log: ConversationLog) -> Self {
        Self {
            nations: nations::NationsComponent::new(&world),
            chat: chat::ChatComponent::new(),
            world,
            log,
            chat_open: false,
            exit_n: 0,
        }
    }

    pub fn is_chat_open(&self) -> bool {
        self.chat_open
    }

    pub fn render(&mut self, f: &mut Frame) {
        let vertical = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ]);

        let [tabs_area, main_area, help_area, event_area] = vertical.areas(f.size());

        let tabs = Tabs::new(vec!["Nations", "Chronicler"])
            .select(self.chat_open as usize)
            .padding("[", "]")
            .block(Block::bordered());
        f.render_widget(tabs, tabs_area);

        if self.chat_open {
            let horizontal = Layout::horizontal([Constraint::Percentage(45), Constraint::Min(20)]);
            let [nations_area, chat_area] = horizontal.areas(main_area);
            self.nations.render(&self.world, f, nations_area);
            self.chat.render(&self.log, f, chat_area);
        } else {
            self.nations.render(&self.world, f, main_area);
        }

        let help = if self.chat_open {
            "help: [Enter ask] [F2 close chronicler] [Esc+Esc quit]"
        } else {
            "help: [Up/Down nation] [PgUp/PgDn scroll] [F2 open chronicler] [Esc+Esc quit]"
        };
        f.render_widget(Paragraph::new(help), help_area);
        f.render_widget(Paragraph::new(self.chat.event.clone()), event_area);
    }

    /// A pending question can no longer be answered: close it with the fallback reply.
    pub fn worker_disconnected(&mut self) {
        if let Some(question) = self.chat.pending().map(str::to_string) {
            log::error!("chronicler worker is gone, dropping pending question");
            self.chat
                .finish(&mut self.log, question, CHRONICLE_UNAVAILABLE.to_string());
        }
        self.chat.event = "the chronicler has left".to_string();
    }

    pub fn handler_input(&mut self, input: Input) -> Output {
        let is_event = matches!(&input, Input::Event(..));

        let output = match input {
            Input::Message(im_channel::Message::Answer { question, reply }) => {
                self.chat.finish(&mut self.log, question, reply);
                Output::Normal
            }
            Input::Message(im_channel::Message::Ask { .. }) => Output::Normal,
            Input::Event(Event::Key(key)) if key.code == KeyCode::Esc => {
                self.exit_n += 2;
                if self.exit_n >= 3 {
                    return Output::Exit;
                }
                Output::Normal
            }
            Input::Event(Event::Key(key))
                if key.code == KeyCode::F(2)
                    || (key.code == KeyCode::Char('t')
                        && key.modifiers.contains(KeyModifiers::CONTROL)) =>
            {
                self.chat_open = !self.chat_open;
                Output::Normal
            }
            input if self.chat_open => self.chat.handler_input(input),
            input => {
                self.nations.handler_input(input, &self.world);
                Output::Normal
            }
        };

        if is_event {
            self.exit_n = self.exit_n.saturating_sub(1);
        }
        output
    }

    pub fn run_loop(mut self, tx: MessageTx, rx: MessageRx) -> anyhow::Result<()> {
        // setup terminal
        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let mut main_loop = || -> anyhow::Result<()> {
            loop {
                terminal.draw(|f| self.render(f))?;

                match rx.try_recv() {
                    Ok(message) => {
                        self.handler_input(Input::Message(message));
                        continue;
                    }
                    Err(TryRecvError::Disconnected) => self.worker_disconnected(),
                    Err(TryRecvError::Empty) => {}
                }

                if !event::poll(Duration::from_millis(100))? {
                    continue;
                }

                match self.handler_input(Input::Event(event::read()?)) {
                    Output::Exit => break,
                    Output::Ask(question) => {
                        let history = self.log.history();
                        if tx
                            .send(im_channel::Message::Ask { question, history })
                            .is_err()
                        {
                            self.worker_disconnected();
                        }
                    }
                    Output::Normal => {}
                }
            }
            Ok(())
        };

        let r = main_loop();

        // restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        r
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEvent;

    use super::*;
    use crate::chat::history::GREETING;
    use crate::sys::{llm::Role, sample_world};

    fn key(code: KeyCode) -> Input {
        Input::Event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn app() -> App {
        App::new(sample_world(), ConversationLog::with_greeting(GREETING))
    }

    #[test]
    fn toggle_chat_panel() {
        let mut app = app();
        assert!(!app.is_chat_open());
        app.handler_input(key(KeyCode::F(2)));
        assert!(app.is_chat_open());
        app.handler_input(key(KeyCode::F(2)));
        assert!(!app.is_chat_open());
    }

    #[test]
    fn typing_goes_to_chat_only_when_open() {
        let mut app = app();
        app.handler_input(key(KeyCode::Char('x')));
        assert_eq!(app.handler_input(key(KeyCode::Enter)), Output::Normal);

        app.handler_input(key(KeyCode::F(2)));
        app.handler_input(key(KeyCode::Char('x')));
        assert_eq!(
            app.handler_input(key(KeyCode::Enter)),
            Output::Ask("x".to_string())
        );
    }

    #[test]
    fn answer_commits_exchange_after_greeting() {
        let mut app = app();
        app.handler_input(key(KeyCode::F(2)));
        app.handler_input(key(KeyCode::Char('q')));
        app.handler_input(key(KeyCode::Enter));
        assert_eq!(app.log.len(), 1);

        app.handler_input(Input::Message(im_channel::Message::Answer {
            question: "q".to_string(),
            reply: "a".to_string(),
        }));

        let roles: Vec<_> = app.log.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Model, Role::User, Role::Model]);
        assert!(!app.chat.is_busy());
    }

    #[test]
    fn lost_worker_closes_pending_question_with_fallback() {
        let mut app = app();
        app.handler_input(key(KeyCode::F(2)));
        app.handler_input(key(KeyCode::Char('q')));
        app.handler_input(key(KeyCode::Enter));
        assert!(app.chat.is_busy());

        app.worker_disconnected();

        assert!(!app.chat.is_busy());
        let last = app.log.messages().last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.text, CHRONICLE_UNAVAILABLE);
        assert_eq!(app.log.len(), 3);

        // nothing pending any more: the log is left alone
        app.worker_disconnected();
        assert_eq!(app.log.len(), 3);
    }

    #[test]
    fn double_escape_exits() {
        let mut app = app();
        assert_eq!(app.handler_input(key(KeyCode::Esc)), Output::Normal);
        assert_eq!(app.handler_input(key(KeyCode::Esc)), Output::Exit);
    }

    #[test]
    fn spaced_escapes_do_not_exit() {
        let mut app = app();
        app.handler_input(key(KeyCode::Esc));
        app.handler_input(key(KeyCode::Down));
        app.handler_input(key(KeyCode::Down));
        assert_eq!(app.handler_input(key(KeyCode::Esc)), Output::Normal);
    }
}

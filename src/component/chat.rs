use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEventKind};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Text},
    widgets::{Block, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use crate::chat::history::ConversationLog;
use crate::sys::llm::{Message, Role};

use super::{Input, Output};

pub struct MessagesComponent {
    cursor: (u16, u16),
    lock_on_bottom: bool,
}

impl MessagesComponent {
    pub fn new() -> Self {
        Self {
            cursor: (0, 0),
            lock_on_bottom: true,
        }
    }

    fn push_wrapped(text: &mut Text<'static>, message: &str, max_len: usize, style: Style) {
        let mut s = String::with_capacity(max_len);
        let mut len = 0;
        for c in message.chars() {
            if c == '\n' {
                text.extend([Line::raw(std::mem::take(&mut s)).style(style)]);
                len = 0;
                continue;
            }
            // wide glyphs (hangul) take two cells
            let w = if c.is_ascii() { 1 } else { 2 };
            if len + w > max_len && !s.is_empty() {
                text.extend([Line::raw(std::mem::take(&mut s)).style(style)]);
                len = 0;
            }
            s.push(c);
            len += w;
        }
        if !s.is_empty() {
            text.extend([Line::raw(s).style(style)]);
        }
    }

    pub fn build_text(messages: &[Message], pending: Option<&str>, width: u16) -> Text<'static> {
        let max_len = (width.max(4) - 2) as usize;
        let mut text = Text::default();

        for message in messages {
            let (label, style) = match message.role {
                Role::Model => ("연대기 기록자", Style::new().fg(Color::Cyan)),
                Role::User => ("여행자", Style::new().fg(Color::Yellow)),
            };
            text.extend([Line::styled(
                format!("{label} [{}]", message.at.format("%H:%M")),
                style.add_modifier(Modifier::BOLD),
            )]);
            Self::push_wrapped(&mut text, &message.text, max_len, style);
            text.extend([Line::raw("")]);
        }

        if let Some(question) = pending {
            let style = Style::new().fg(Color::Yellow);
            text.extend([Line::styled("여행자".to_string(), style.add_modifier(Modifier::BOLD))]);
            Self::push_wrapped(&mut text, question, max_len, style);
            text.extend([Line::raw("")]);
            text.extend([Line::styled(
                "연대기 기록자가 기록을 뒤지는 중...".to_string(),
                Style::new().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )]);
        }

        text
    }

    pub fn render(
        &mut self,
        messages: &[Message],
        pending: Option<&str>,
        frame: &mut Frame,
        area: Rect,
    ) {
        let text = Self::build_text(messages, pending, area.width);
        let line_n = text.lines.len();

        let max_line = area.height.saturating_sub(2) as usize;
        if line_n > max_line {
            let max_cursor = (line_n - max_line) as u16;
            if self.cursor.0 >= max_cursor {
                self.lock_on_bottom = true;
            }
            if self.lock_on_bottom {
                self.cursor.0 = max_cursor;
            }
        } else {
            self.cursor.0 = 0;
        }

        let paragraph = Paragraph::new(text)
            .block(Block::bordered().title("대륙의 연대기 기록자").gray())
            .scroll(self.cursor);
        frame.render_widget(paragraph, area);
    }

    pub fn handler_input(&mut self, input: Input) {
        if let Input::Event(Event::Mouse(event)) = input {
            match event.kind {
                MouseEventKind::ScrollDown => {
                    self.cursor.0 += 3;
                }
                MouseEventKind::ScrollUp => {
                    self.cursor.0 = self.cursor.0.saturating_sub(3);
                    self.lock_on_bottom = false;
                }
                _ => {}
            }
        }
    }
}

pub struct ChatComponent {
    pub messages: MessagesComponent,
    input: TextArea<'static>,
    pending: Option<String>,
    pub event: String,
}

impl ChatComponent {
    pub fn new() -> Self {
        Self {
            messages: MessagesComponent::new(),
            input: Self::new_textarea(),
            pending: None,
            event: String::new(),
        }
    }

    fn new_textarea() -> TextArea<'static> {
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text("질문을 입력하세요...");
        textarea
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn render(&mut self, log: &ConversationLog, frame: &mut Frame, area: Rect) {
        let vertical = Layout::vertical([Constraint::Min(5), Constraint::Length(3)]);
        let [messages_area, input_area] = vertical.areas(area);

        self.messages
            .render(log.messages(), self.pending.as_deref(), frame, messages_area);

        let title = if self.is_busy() { "Input (busy)" } else { "Input" };
        self.input.set_block(Block::bordered().title(title).gray());
        frame.render_widget(&self.input, input_area);
    }

    fn submit_message(&mut self) -> Output {
        if self.is_busy() {
            self.event = "the chronicler is still writing".to_string();
            return Output::Normal;
        }

        let message = self.input.lines().join("\n");
        if message.trim().is_empty() {
            return Output::Normal;
        }

        self.input = Self::new_textarea();
        self.pending = Some(message.clone());
        self.messages.lock_on_bottom = true;
        Output::Ask(message)
    }

    /// Commits the finished exchange to the log: the question first, then the reply.
    pub fn finish(&mut self, log: &mut ConversationLog, question: String, reply: String) {
        if self.pending.take().is_none() {
            log::warn!("answer received with no pending question");
        }
        log.append_user(question);
        log.append_model(reply);
        self.messages.lock_on_bottom = true;
    }

    pub fn handler_input(&mut self, input: Input) -> Output {
        match input {
            Input::Event(Event::Key(KeyEvent {
                code: KeyCode::Enter,
                ..
            })) => self.submit_message(),
            Input::Event(Event::Key(key))
                if key.code == KeyCode::Char('j')
                    && key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                self.submit_message()
            }
            Input::Event(Event::Key(key)) => {
                self.input.input(key);
                Output::Normal
            }
            input => {
                self.messages.handler_input(input);
                Output::Normal
            }
        }
    }
}

use crossterm::event::{Event, KeyCode};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Text},
    widgets::{Block, List, ListState, Paragraph, Wrap},
    Frame,
};

use crate::sys::{Nation, WorldData};

use super::Input;

pub struct NationsComponent {
    state: ListState,
    scroll: u16,
}

impl NationsComponent {
    pub fn new(world: &WorldData) -> Self {
        let mut state = ListState::default();
        if !world.nations.is_empty() {
            state.select(Some(0));
        }
        Self { state, scroll: 0 }
    }

    pub fn selected<'w>(&self, world: &'w WorldData) -> Option<&'w Nation> {
        self.state.selected().and_then(|i| world.nations.get(i))
    }

    fn section(text: &mut Text<'static>, title: &str) {
        text.extend([Line::raw("")]);
        text.extend([Line::styled(
            title.to_string(),
            Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]);
    }

    pub fn detail_text(nation: &Nation) -> Text<'static> {
        let mut text = Text::default();
        text.extend([Line::styled(
            format!("{} ({})", nation.name, nation.english_name),
            Style::new().add_modifier(Modifier::BOLD),
        )]);
        text.extend([Line::raw(nation.short_description.clone())]);
        text.extend([Line::raw("")]);
        text.extend([Line::raw(format!("수도: {}", nation.capital))]);
        text.extend([Line::raw(format!("체제: {}", nation.system))]);
        text.extend([Line::raw(format!("상징: {}", nation.symbol))]);
        text.extend([Line::raw(format!(
            "랜드마크: {} - {}",
            nation.landmark.name, nation.landmark.description
        ))]);
        text.extend([Line::raw(format!("군사: {}", nation.military))]);
        if let Some(religion) = &nation.religion {
            text.extend([Line::raw(format!("종교: {religion}"))]);
        }

        if !nation.characteristics.is_empty() {
            Self::section(&mut text, "특징");
            for c in &nation.characteristics {
                text.extend([Line::raw(format!("- {c}"))]);
            }
        }

        if !nation.leadership.is_empty() {
            Self::section(&mut text, "지도부");
            for leader in &nation.leadership {
                text.extend([Line::raw(format!(
                    "{} {}: {}",
                    leader.title, leader.name, leader.description
                ))]);
            }
        }

        if !nation.key_figures.is_empty() {
            Self::section(&mut text, "주요 인물");
            for figure in &nation.key_figures {
                let age = figure
                    .age
                    .as_ref()
                    .map(|age| format!(", {age}"))
                    .unwrap_or_default();
                text.extend([Line::raw(format!("{} ({}{age})", figure.name, figure.role))]);
                for d in &figure.description {
                    text.extend([Line::raw(format!("  {d}"))]);
                }
            }
        }

        if !nation.key_groups.is_empty() {
            Self::section(&mut text, "주요 세력");
            for group in &nation.key_groups {
                text.extend([Line::raw(format!("{}: {}", group.name, group.description))]);
            }
        }

        if !nation.relations.is_empty() {
            Self::section(&mut text, "국제 관계");
            for relation in &nation.relations {
                text.extend([Line::raw(format!(
                    "{} [{}] {}",
                    relation.target, relation.relationship, relation.view
                ))]);
                for d in &relation.description {
                    text.extend([Line::raw(format!("  {d}"))]);
                }
            }
        }

        if let Some(history) = &nation.history {
            Self::section(&mut text, "역사");
            for line in history.lines() {
                text.extend([Line::raw(line.to_string())]);
            }
        }

        text
    }

    pub fn render(&mut self, world: &WorldData, frame: &mut Frame, area: Rect) {
        let horizontal = Layout::horizontal([Constraint::Percentage(30), Constraint::Min(10)]);
        let [list_area, detail_area] = horizontal.areas(area);

        let list = List::new(world.nations.iter().map(|n| n.name.clone()))
            .block(Block::bordered().title(world.title.clone()).gray())
            .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, list_area, &mut self.state);

        let detail = match self.selected(world) {
            Some(nation) => Self::detail_text(nation),
            None => Text::raw(world.description.clone()),
        };
        let paragraph = Paragraph::new(detail)
            .block(Block::bordered().gray())
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, detail_area);
    }

    pub fn handler_input(&mut self, input: Input, world: &WorldData) {
        let len = world.nations.len();
        if len == 0 {
            return;
        }
        let current = self.state.selected().unwrap_or(0);

        if let Input::Event(Event::Key(key)) = input {
            match key.code {
                KeyCode::Down => {
                    self.state.select(Some((current + 1) % len));
                    self.scroll = 0;
                }
                KeyCode::Up => {
                    self.state.select(Some((current + len - 1) % len));
                    self.scroll = 0;
                }
                KeyCode::PageDown => {
                    let max = self
                        .selected(world)
                        .map(|n| Self::detail_text(n).lines.len().saturating_sub(1))
                        .unwrap_or(0);
                    let max = u16::try_from(max).unwrap_or(u16::MAX);
                    self.scroll = self.scroll.saturating_add(5).min(max);
                }
                KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(5),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEvent, KeyModifiers};

    use super::*;
    use crate::sys::sample_world;

    fn key(code: KeyCode) -> Input {
        Input::Event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[test]
    fn selection_wraps_around() {
        let mut world = sample_world();
        let mut second = world.nations[0].clone();
        second.id = "holy".to_string();
        world.nations.push(second);

        let mut nations = NationsComponent::new(&world);
        assert_eq!(nations.selected(&world).unwrap().id, "empire");

        nations.handler_input(key(KeyCode::Up), &world);
        assert_eq!(nations.selected(&world).unwrap().id, "holy");
        nations.handler_input(key(KeyCode::Down), &world);
        assert_eq!(nations.selected(&world).unwrap().id, "empire");
    }

    #[test]
    fn page_down_stops_at_last_detail_line() {
        let world = sample_world();
        let mut nations = NationsComponent::new(&world);
        let lines = NationsComponent::detail_text(&world.nations[0]).lines.len() as u16;

        for _ in 0..100 {
            nations.handler_input(key(KeyCode::PageDown), &world);
        }
        assert_eq!(nations.scroll, lines - 1);

        nations.handler_input(key(KeyCode::PageUp), &world);
        assert_eq!(nations.scroll, lines - 6);
    }

    #[test]
    fn empty_world_has_no_selection() {
        let mut world = sample_world();
        world.nations.clear();
        let mut nations = NationsComponent::new(&world);
        nations.handler_input(key(KeyCode::Down), &world);
        assert!(nations.selected(&world).is_none());
    }

    #[test]
    fn detail_lists_capital_and_relations() {
        let world = sample_world();
        let text = NationsComponent::detail_text(&world.nations[0]);
        let lines: Vec<String> = text.lines.iter().map(|l| l.to_string()).collect();

        assert_eq!(lines[0], "아렌티나 제국 (Arentina Empire)");
        assert!(lines.contains(&"수도: 아렌".to_string()));
        assert!(lines.contains(&"holy [긴장] 이단의 땅".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("종교")));
    }
}

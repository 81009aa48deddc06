pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use spectype::matcher::{LetterState, TypedWord};
use unicode_width::UnicodeWidthChar;

use crate::{ui::screen::current_screen, App};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const INPUT_PROMPT: &str = "› ";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        current_screen(self.session.state()).render(self, area, buf);
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

/// Colour for the ghost meter: calm while there is room, red when it is close
fn meter_color(progress: f64) -> Color {
    if progress > 60.0 {
        Color::Green
    } else if progress > 30.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// The target word, one span per letter, coloured by how it was typed.
/// The next letter to type is underlined.
fn word_spans(typed: &TypedWord) -> Vec<Span<'static>> {
    let cursor = typed
        .letter_states
        .iter()
        .position(|s| *s == LetterState::Pending);

    typed
        .target_word
        .chars()
        .zip(typed.letter_states.iter())
        .enumerate()
        .map(|(idx, (c, state))| {
            let style = match state {
                LetterState::Correct => bold().fg(Color::Green),
                LetterState::Incorrect => bold().fg(Color::Red),
                LetterState::Pending if Some(idx) == cursor => {
                    dim_bold().add_modifier(Modifier::UNDERLINED)
                }
                LetterState::Pending => dim_bold(),
            };
            Span::styled(c.to_string(), style)
        })
        .collect()
}

/// The end of `input` that fits in `max_width` columns once the prompt is
/// drawn in front of it
fn visible_input(input: &str, max_width: usize) -> String {
    let budget = max_width.saturating_sub(INPUT_PROMPT.chars().count());
    let mut width = 0;
    let mut tail: Vec<char> = Vec::new();

    for c in input.chars().rev() {
        width += c.width().unwrap_or(0);
        if width > budget {
            break;
        }
        tail.push(c);
    }

    tail.iter().rev().collect()
}

/// Draw lines stacked in the vertical middle of `area`
fn render_centered(lines: Vec<Line<'_>>, area: Rect, buf: &mut Buffer) {
    let height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
}

fn legend(keys: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(keys, Style::default().add_modifier(Modifier::ITALIC)))
        .alignment(Alignment::Center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_app, test_app_with_rules};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::time::Duration;

    fn render(app: &App, width: u16, height: u16) -> (Buffer, String) {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);

        let rendered = buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        (buffer, rendered)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), Duration::ZERO);
        }
    }

    fn start(app: &mut App) {
        app.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), Duration::ZERO);
    }

    /// First cell where `needle` starts, as (x, y)
    fn find(buffer: &Buffer, needle: &str) -> (u16, u16) {
        let needle: Vec<String> = needle.chars().map(|c| c.to_string()).collect();
        let area = buffer.area;

        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let matches = needle.iter().enumerate().all(|(i, c)| {
                    let cx = x + i as u16;
                    cx < area.right() && buffer[(cx, y)].symbol() == c
                });
                if matches {
                    return (x, y);
                }
            }
        }
        panic!("{needle:?} not rendered");
    }

    #[test]
    fn test_ui_widget_title_screen() {
        let app = test_app(&["ghost"], 31);
        let (_, rendered) = render(&app, 80, 24);

        assert!(rendered.contains("spectype"));
        assert!(rendered.contains("high score 31"));
        assert!(rendered.contains("(enter) start"));
    }

    #[test]
    fn test_ui_widget_playing() {
        let mut app = test_app(&["ghost"], 0);
        start(&mut app);
        let (_, rendered) = render(&app, 80, 24);

        assert!(rendered.contains("ghost"));
        assert!(rendered.contains("score 0"));
        assert!(rendered.contains("level 1"));
        assert!(rendered.contains("100%"));
    }

    #[test]
    fn test_ui_widget_letter_colours() {
        let mut app = test_app(&["ghost"], 0);
        start(&mut app);
        type_str(&mut app, "gha");

        let (buffer, rendered) = render(&app, 80, 24);
        let (x, y) = find(&buffer, "ghost");

        assert_eq!(buffer[(x, y)].fg, Color::Green);
        assert_eq!(buffer[(x + 1, y)].fg, Color::Green);
        assert_eq!(buffer[(x + 2, y)].fg, Color::Red);
        assert!(buffer[(x + 3, y)].modifier.contains(Modifier::UNDERLINED));
        assert!(buffer[(x + 4, y)].modifier.contains(Modifier::DIM));
        assert!(rendered.contains("› gha"));
    }

    #[test]
    fn test_ui_widget_game_over() {
        let mut app = test_app(&["boo"], 2);
        start(&mut app);
        type_str(&mut app, "boo");
        app.session.advance_to(Duration::from_secs(600));

        let (_, rendered) = render(&app, 80, 24);

        assert!(rendered.contains("the ghost caught you"));
        assert!(rendered.contains("final score 3"));
        assert!(rendered.contains("high score 3"));
        assert!(rendered.contains("(enter) play again"));
    }

    #[test]
    fn test_ui_widget_small_area() {
        let mut app = test_app(&["ghost"], 0);
        start(&mut app);

        let (buffer, _) = render(&app, 10, 4);
        assert_eq!(buffer.area, Rect::new(0, 0, 10, 4));
    }

    #[test]
    fn test_ui_widget_survives_broken_rules() {
        use spectype::scoring::Rules;
        use spectype::session::SessionState;

        let rules = Rules {
            base_decrease_rate: 0.0,
            decay_divisor: 0.0,
            rate_step: -0.5,
            ..Rules::default()
        };
        let mut app = test_app_with_rules(&["ghost"], 0, rules);
        start(&mut app);

        app.session.advance_to(Duration::from_millis(100));
        let (_, rendered) = render(&app, 80, 24);
        assert!(rendered.contains("%"));

        app.session.advance_to(Duration::from_secs(600));
        assert_eq!(app.session.state(), SessionState::GameOver);
        let (_, rendered) = render(&app, 80, 24);
        assert!(rendered.contains("the ghost caught you"));
    }

    #[test]
    fn test_meter_color_thresholds() {
        assert_eq!(meter_color(100.0), Color::Green);
        assert_eq!(meter_color(45.0), Color::Yellow);
        assert_eq!(meter_color(30.0), Color::Red);
        assert_eq!(meter_color(0.0), Color::Red);
    }

    #[test]
    fn test_visible_input_keeps_the_tail() {
        assert_eq!(visible_input("phantom", 20), "phantom");
        assert_eq!(visible_input("phantom", 6), "ntom");
        assert_eq!(visible_input("phantom", 1), "");
    }

    #[test]
    fn test_ui_constants() {
        assert_eq!(HORIZONTAL_MARGIN, 5);
        assert_eq!(VERTICAL_MARGIN, 2);
    }
}

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};
use spectype::{scoring::MAX_PROGRESS, session::SessionState};

use crate::{
    ui::{
        bold, dim_bold, legend, meter_color, render_centered, visible_input, word_spans,
        HORIZONTAL_MARGIN, INPUT_PROMPT, VERTICAL_MARGIN,
    },
    App,
};

/// One screen per session state
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Title screen shown before the first game
pub struct IdleScreen;

impl Screen for IdleScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let data = app.session.data();

        let lines = vec![
            Line::from(Span::styled("spectype", bold().fg(Color::Magenta))),
            Line::from(Span::styled(
                "type the words before the ghost catches up",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("high score {}", data.high_score),
                dim_bold(),
            )),
            Line::from(""),
            Line::from(Span::styled("(enter) start / (esc)ape", dim_bold())),
        ];

        render_centered(lines, area, buf);
    }
}

pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let data = app.session.data();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // score line
                Constraint::Length(3), // meter
                Constraint::Min(0),
                Constraint::Length(1), // word
                Constraint::Length(1), // input
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        let status = Line::from(vec![
            Span::styled(format!("score {}", data.current_score), bold()),
            Span::raw("   "),
            Span::styled(format!("high score {}", data.high_score), dim_bold()),
            Span::raw("   "),
            Span::styled(format!("level {}", data.level), bold().fg(Color::Magenta)),
            Span::raw("   "),
            Span::styled(format!("{}s", data.elapsed_seconds), dim_bold()),
        ]);
        Paragraph::new(status)
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let ratio = if data.progress.is_finite() {
            (data.progress / MAX_PROGRESS).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" lead "))
            .gauge_style(Style::default().fg(meter_color(data.progress)))
            .ratio(ratio)
            .label(format!("{:.0}%", data.progress))
            .render(chunks[1], buf);

        Paragraph::new(Line::from(word_spans(app.session.typed())))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let input = visible_input(&app.input, chunks[4].width as usize);
        Paragraph::new(Line::from(vec![
            Span::styled(INPUT_PROMPT, dim_bold()),
            Span::styled(input, bold()),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        legend("(esc)ape").render(chunks[6], buf);
    }
}

pub struct GameOverScreen;

impl Screen for GameOverScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let data = app.session.data();

        let lines = vec![
            Line::from(Span::styled("the ghost caught you", bold().fg(Color::Red))),
            Line::from(""),
            Line::from(Span::styled(format!("final score {}", data.final_score), bold())),
            Line::from(Span::styled(
                format!("high score {}", data.high_score),
                dim_bold(),
            )),
            Line::from(Span::styled(
                format!(
                    "lasted {}s and reached level {}",
                    data.elapsed_seconds, data.level
                ),
                dim_bold(),
            )),
            Line::from(""),
            Line::from(Span::styled("(enter) play again / (esc)ape", dim_bold())),
        ];

        render_centered(lines, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: SessionState) -> Box<dyn Screen> {
    match state {
        SessionState::Idle => Box::new(IdleScreen),
        SessionState::Playing => Box::new(PlayingScreen),
        SessionState::GameOver => Box::new(GameOverScreen),
    }
}

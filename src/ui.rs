use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::session::{Session, Status};
use crate::store::leaderboard::ScoreOutcome;
use crate::time_series::peak_wpm;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Read-only view of the live session plus whatever the stores reported
pub struct SessionView<'a> {
    pub session: &'a Session,
    pub score: Option<&'a ScoreOutcome>,
}

impl<'a> SessionView<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            score: None,
        }
    }

    pub fn with_score(mut self, score: Option<&'a ScoreOutcome>) -> Self {
        self.score = score;
        self
    }
}

fn prompt_spans(session: &Session) -> Vec<Span<'static>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = bold_style.fg(Color::Green);
    let red_bold_style = bold_style.fg(Color::Red);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = dim_bold_style.add_modifier(Modifier::UNDERLINED);

    let mut spans: Vec<Span> = session
        .outcomes()
        .zip(session.prompt.chars())
        .map(|((typed, correct), expected)| {
            if correct {
                Span::styled(expected.to_string(), green_bold_style)
            } else {
                let shown = match typed {
                    ' ' => '·',
                    c => c,
                };
                Span::styled(shown.to_string(), red_bold_style)
            }
        })
        .collect();

    let mut rest = session.prompt.chars().skip(session.cursor);
    if let Some(current) = rest.next() {
        spans.push(Span::styled(current.to_string(), underlined_dim_bold_style));
    }
    let remaining: String = rest.collect();
    if !remaining.is_empty() {
        spans.push(Span::styled(remaining, dim_bold_style));
    }
    spans
}

impl Widget for SessionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        match session.status {
            Status::Idle | Status::Running => {
                let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
                let prompt_width = session.prompt.width();
                let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
                    1
                } else {
                    (prompt_width as f64 / max_chars_per_line as f64).ceil() as u16 + 1
                };
                let padding = area.height.saturating_sub(prompt_occupied_lines + 4) / 2;

                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .constraints([
                        Constraint::Length(padding),
                        Constraint::Length(2), // timer
                        Constraint::Length(prompt_occupied_lines),
                        Constraint::Length(2), // hint
                        Constraint::Min(0),
                    ])
                    .split(area);

                let timer = Paragraph::new(Span::styled(
                    format!("{}  {}s", session.mode, session.time_left),
                    dim_bold_style,
                ))
                .alignment(Alignment::Center);
                timer.render(chunks[1], buf);

                let prompt = Paragraph::new(Line::from(prompt_spans(session)))
                    .alignment(if prompt_occupied_lines == 1 {
                        Alignment::Center
                    } else {
                        Alignment::Left
                    })
                    .wrap(Wrap { trim: true });
                prompt.render(chunks[2], buf);

                let hint = if session.status == Status::Idle {
                    "start typing / (tab) mode / (up/down) time / (esc)ape"
                } else {
                    "(left) retry / (right) new / (esc)ape"
                };
                Paragraph::new(Span::styled(hint, italic_style))
                    .alignment(Alignment::Center)
                    .render(chunks[3], buf);
            }
            Status::Finished => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .vertical_margin(VERTICAL_MARGIN)
                    .constraints([
                        Constraint::Min(0),
                        Constraint::Length(1), // stats
                        Constraint::Length(1), // detail
                        Constraint::Length(1), // record
                        Constraint::Length(1), // padding
                        Constraint::Length(1), // legend
                    ])
                    .split(area);

                let stats = session.stats();
                Paragraph::new(Span::styled(
                    format!("{} wpm   {}% acc", stats.wpm, stats.accuracy),
                    bold_style,
                ))
                .alignment(Alignment::Center)
                .render(chunks[1], buf);

                Paragraph::new(Span::styled(
                    format!(
                        "{} correct / {} incorrect   peak {} wpm   {} {}s",
                        stats.correct_chars,
                        stats.incorrect_chars,
                        peak_wpm(&session.wpm_history),
                        session.mode,
                        session.duration_secs
                    ),
                    dim_bold_style,
                ))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);

                if let Some(line) = self.score.and_then(record_line) {
                    Paragraph::new(Span::styled(
                        line,
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Center)
                    .render(chunks[3], buf);
                }

                Paragraph::new(Span::styled("(r)etry / (n)ew / (esc)ape", italic_style))
                    .render(chunks[5], buf);
            }
        }
    }
}

fn record_line(score: &ScoreOutcome) -> Option<String> {
    if !score.is_new_record {
        return None;
    }
    Some(match &score.previous_best {
        Some(previous) => format!("new personal best! (previous {} wpm)", previous.wpm),
        None => "new personal best!".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::mode::Mode;
    use crate::store::leaderboard::LeaderboardEntry;
    use crate::timer::tick;
    use crate::typing_policy::apply;

    fn render(view: SessionView, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        view.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    fn typed(prompt: &str, text: &str) -> Session {
        text.chars().fold(
            Session::new(prompt.to_string(), Mode::Words, 30),
            |s, c| apply(&s, Key::Char(c)),
        )
    }

    #[test]
    fn idle_shows_prompt_and_timer() {
        let session = Session::new("hello world".to_string(), Mode::Words, 30);
        let out = render(SessionView::new(&session), 80, 24);

        assert!(out.contains("hello world"));
        assert!(out.contains("words  30s"));
        assert!(out.contains("start typing"));
    }

    #[test]
    fn prompt_spans_mark_outcomes() {
        let session = typed("abc", "ax");
        let spans = prompt_spans(&session);

        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].content, "a");
        assert_eq!(spans[0].style.fg, Some(Color::Green));
        assert_eq!(spans[1].content, "x");
        assert_eq!(spans[1].style.fg, Some(Color::Red));
        assert_eq!(spans[2].content, "c");
        assert!(spans[2].style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn mistyped_space_is_visible() {
        let session = typed("a b", "a ");
        let session = apply(&session, Key::Backspace);
        let session = apply(&session, Key::Char('x'));
        let spans = prompt_spans(&session);
        assert_eq!(spans[1].content, "x");

        let session = typed("ab", "a ");
        assert_eq!(prompt_spans(&session)[1].content, "·");
    }

    #[test]
    fn finished_shows_stats_and_record() {
        let mut session = typed("hello world", "hello");
        session = tick(&session);
        session.status = Status::Finished;
        let score = ScoreOutcome {
            is_new_record: true,
            previous_best: Some(LeaderboardEntry {
                wpm: 10,
                accuracy: 90,
                date: chrono::Local::now(),
            }),
        };

        let out = render(SessionView::new(&session).with_score(Some(&score)), 80, 24);
        assert!(out.contains("60 wpm"));
        assert!(out.contains("100% acc"));
        assert!(out.contains("previous 10 wpm"));
        assert!(out.contains("(r)etry"));
    }

    #[test]
    fn no_record_line_without_new_best() {
        let score = ScoreOutcome {
            is_new_record: false,
            previous_best: None,
        };
        assert_eq!(record_line(&score), None);
    }

    #[test]
    fn tiny_and_wrapped_areas_do_not_panic() {
        let session = typed(&"word ".repeat(60), "wo");
        for (w, h) in [(1, 1), (10, 3), (20, 40), (200, 10)] {
            render(SessionView::new(&session), w, h);
        }
    }
}

// TUI module for rendering the terminal interface
pub mod colors;
pub mod input;

pub use colors::*;
pub use input::{handle_key_event, DragTracker, KeyAction, PointerAction, CELL_ASPECT};

use crate::domain::{FeedStatus, MediaItem, MediaKind, Offset, SessionStatistics};
use crate::session::Session;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// UI view state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Swiping,
    Help,
    /// Summary screen shown on quit
    Summary,
}

impl ViewState {
    /// Where any key press leads from an overlay. `None` means leave the app.
    pub fn dismiss(&self) -> Option<ViewState> {
        match self {
            ViewState::Summary => None,
            ViewState::Help | ViewState::Swiping => Some(ViewState::Swiping),
        }
    }
}

/// Header, content and footer areas
pub fn screen_layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header with burn count
            Constraint::Min(0),    // Card stack
            Constraint::Length(3), // Footer
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Resting position of the card inside the content area
pub fn card_area(content: Rect) -> Rect {
    centered_rect(50, 90, content)
}

/// Width in columns the swipe threshold is measured against
pub fn viewport_width(area: Rect) -> f32 {
    f32::from(card_area(screen_layout(area)[1]).width.max(1))
}

pub fn render(frame: &mut Frame, session: &Session) {
    let [header, content, footer] = screen_layout(frame.area());

    render_header(frame, header, session);
    render_content(frame, content, session);
    render_footer(frame, footer);
}

/// Label and colour stamped on a card pulled sideways by `offset_x`
pub fn stamp(offset_x: f32, threshold: f32) -> Option<(&'static str, Color, bool)> {
    if offset_x.abs() < 1.0 {
        return None;
    }
    let committed = offset_x.abs() > threshold;
    if offset_x < 0.0 {
        Some(("BURN", ACCENT_PRIMARY, committed))
    } else {
        Some(("KEEP", ACCENT_SECONDARY, committed))
    }
}

/// `rect` moved by `offset` and clipped to `bounds`; `None` once it has left
pub fn shift_rect(rect: Rect, offset: Offset, bounds: Rect) -> Option<Rect> {
    let dx = offset.x.round() as i32;
    let dy = (offset.y / CELL_ASPECT).round() as i32;

    let left = (i32::from(rect.x) + dx).max(i32::from(bounds.x));
    let top = (i32::from(rect.y) + dy).max(i32::from(bounds.y));
    let right = (i32::from(rect.right()) + dx).min(i32::from(bounds.right()));
    let bottom = (i32::from(rect.bottom()) + dy).min(i32::from(bounds.bottom()));

    if right <= left || bottom <= top {
        return None;
    }

    Some(Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

fn render_header(frame: &mut Frame, area: Rect, session: &Session) {
    let stats = session.statistics();

    let title_line = Line::from(vec![
        Span::styled(
            " Photoburn ",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("🔥 Burned: {}", session.burn_count()),
            Style::default()
                .fg(ACCENT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let session_line = Line::from(vec![
        Span::styled(" This session: ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled(
            format!("{} kept", stats.kept),
            Style::default().fg(ACCENT_SECONDARY),
        ),
        Span::styled(" • ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled(
            format!("{} burned", stats.burned),
            Style::default().fg(ACCENT_PRIMARY),
        ),
        Span::styled(
            if session.is_loading() { "  ⟳" } else { "" },
            Style::default().fg(TEXT_SECONDARY),
        ),
    ]);

    let header = Paragraph::new(vec![title_line, session_line])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Left);

    frame.render_widget(header, area);
}

fn render_content(frame: &mut Frame, area: Rect, session: &Session) {
    match session.status() {
        FeedStatus::Ready => render_card_stack(frame, area, session),
        FeedStatus::Loading => frame.render_widget(
            message_widget(
                &format!("{} Loading your library", spinner()),
                ACCENT_HIGHLIGHT,
                &["Fetching photos and videos..."],
            ),
            area,
        ),
        FeedStatus::PermissionDenied => frame.render_widget(
            message_widget(
                "Library access denied",
                ACCENT_PRIMARY,
                &[
                    "Photoburn needs permission to read your media library.",
                    "Press r to ask again.",
                ],
            ),
            area,
        ),
        FeedStatus::Failed => {
            let reason = session.feed().last_error().unwrap_or("unknown error");
            frame.render_widget(
                message_widget(
                    "Could not load photos",
                    ACCENT_PRIMARY,
                    &[reason, "Press r to retry."],
                ),
                area,
            )
        }
        FeedStatus::Empty => frame.render_widget(
            message_widget(
                "No photos or videos found",
                ACCENT_HIGHLIGHT,
                &["Try a different directory or --type filter."],
            ),
            area,
        ),
        FeedStatus::Finished => frame.render_widget(
            message_widget(
                "All caught up!",
                ACCENT_SECONDARY,
                &["Every item has been reviewed. Press q for the summary."],
            ),
            area,
        ),
    }
}

fn render_card_stack(frame: &mut Frame, area: Rect, session: &Session) {
    let rest = card_area(area);

    if let Some(next) = session.next() {
        let behind = Rect::new(
            rest.x + 1,
            rest.y + 1,
            rest.width.saturating_sub(2),
            rest.height.saturating_sub(1),
        );
        frame.render_widget(
            Paragraph::new(card_lines(next, None, None)).block(card_block(next, BORDER_MUTED)),
            behind,
        );
    }

    let current = match session.current() {
        Some(item) => item,
        None => return,
    };

    let swipe = session.swipe();
    let offset = session.offset();
    let card = match shift_rect(rest, offset, area) {
        Some(card) => card,
        None => return,
    };

    let stamp = stamp(offset.x, swipe.threshold());
    let border = match stamp {
        Some((_, color, true)) => color,
        _ => BORDER_COLOR,
    };

    frame.render_widget(Clear, card);
    frame.render_widget(
        Paragraph::new(card_lines(current, stamp, Some(swipe.rotation_degrees())))
            .block(card_block(current, border).style(Style::default().bg(BG_DARK)))
            .wrap(Wrap { trim: true }),
        card,
    );
}

fn card_block(item: &MediaItem, border: Color) -> Block<'_> {
    Block::default()
        .title(format!(" {} ", item.display_name))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
}

fn card_lines(
    item: &MediaItem,
    stamp: Option<(&'static str, Color, bool)>,
    tilt: Option<f32>,
) -> Vec<Line<'static>> {
    let kind = match item.kind {
        MediaKind::Photo => "▣ Photo",
        MediaKind::Video => "▶ Video",
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            kind,
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(""),
        Line::from(Span::styled(
            item.display_name.clone(),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            item.created_at.format("%Y-%m-%d %H:%M").to_string(),
            Style::default().fg(TEXT_SECONDARY),
        ))
        .alignment(Alignment::Center),
        Line::from(""),
        Line::from(Span::styled(
            item.uri.clone(),
            Style::default().fg(TEXT_SECONDARY),
        ))
        .alignment(Alignment::Center),
        Line::from(""),
    ];

    if let Some((label, color, committed)) = stamp {
        let mut style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        if committed {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(format!(" {} ", label), style)).alignment(Alignment::Center));
    }

    if let Some(degrees) = tilt {
        if degrees.abs() >= 0.1 {
            lines.push(
                Line::from(Span::styled(
                    format!("tilt {:+.1}°", degrees),
                    Style::default().fg(TEXT_SECONDARY),
                ))
                .alignment(Alignment::Center),
            );
        }
    }

    lines
}

fn message_widget<'a>(title: &str, color: Color, body: &[&str]) -> Paragraph<'a> {
    let mut lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(body.iter().map(|text| {
        Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(TEXT_SECONDARY),
        ))
    }));

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn spinner() -> &'static str {
    let spinners = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    spinners[(now / 100) as usize % spinners.len()]
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let controls = Line::from(vec![
        Span::styled(
            " ← ",
            Style::default()
                .fg(ACCENT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("Burn", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("  │  "),
        Span::styled(
            "→ ",
            Style::default()
                .fg(ACCENT_SECONDARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("Keep", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("  │  "),
        Span::styled("drag ", Style::default().fg(ACCENT_HIGHLIGHT)),
        Span::styled("Swipe", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("  │  "),
        Span::styled("? ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled("Help", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("  │  "),
        Span::styled("q ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled("Quit", Style::default().fg(TEXT_SECONDARY)),
    ]);

    let footer = Paragraph::new(controls)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(footer, area);
}

/// Renders the help overlay
pub fn render_help_overlay(frame: &mut Frame) {
    let help_area = centered_rect(50, 70, frame.area());
    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let help_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Controls",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  ← ", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("or "),
            Span::styled("b", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("     Burn (move to trash)"),
        ]),
        Line::from(vec![
            Span::styled("  → ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("or "),
            Span::styled("k", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("     Keep"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Drag ", Style::default().fg(ACCENT_HIGHLIGHT)),
            Span::raw("the card past a quarter of its width to swipe"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  r ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("          Retry loading / ask for access"),
        ]),
        Line::from(vec![
            Span::styled("  q ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("or "),
            Span::styled("Esc", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("     Quit"),
        ]),
        Line::from(vec![
            Span::styled("  ?", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("           Toggle help"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    let paragraph = Paragraph::new(help_lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Renders the summary screen shown on quit
pub fn render_summary(frame: &mut Frame, stats: &SessionStatistics, lifetime_burned: u64) {
    let summary_area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, summary_area);

    let block = Block::default()
        .title(" Session Complete ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(summary_area);
    frame.render_widget(block, summary_area);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("   Reviewed:  "),
            Span::styled(
                format!("{}", stats.reviewed()),
                Style::default()
                    .fg(ACCENT_HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("   ✓ ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Kept:     "),
            Span::styled(
                format!("{}", stats.kept),
                Style::default()
                    .fg(ACCENT_SECONDARY)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("   🔥 ", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("Burned:  "),
            Span::styled(
                format!("{}", stats.burned),
                Style::default()
                    .fg(ACCENT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    if stats.failed_deletes > 0 {
        lines.push(Line::from(vec![
            Span::styled("   ! ", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("Not trashed: "),
            Span::styled(
                format!("{}", stats.failed_deletes),
                Style::default().fg(ACCENT_PRIMARY),
            ),
        ]));
    }

    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            format!("Burned all-time: {}", lifetime_burned),
            Style::default().fg(TEXT_SECONDARY),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to exit",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ]);

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PhotoFeed;
    use crate::media_source::{MediaSource, MemoryLibrary, PermissionStatus};
    use crate::store::BurnCounter;
    use chrono::{TimeZone, Utc};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use std::time::Instant;

    fn item(i: usize) -> MediaItem {
        MediaItem {
            id: format!("id-{}", i),
            uri: format!("memory://id-{}", i),
            kind: if i % 2 == 0 {
                MediaKind::Photo
            } else {
                MediaKind::Video
            },
            created_at: Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap(),
            display_name: format!("IMG_{:04}.JPG", i),
        }
    }

    fn session_over(library: MemoryLibrary) -> Session {
        let source: Arc<dyn MediaSource> = Arc::new(library);
        let mut session = Session::new(
            source,
            vec![],
            PhotoFeed::with_seed(5),
            BurnCounter::in_memory(),
            40.0,
        )
        .unwrap();
        session.start();
        session.wait_idle();
        session
    }

    fn draw(session: &Session) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, session)).unwrap();
        buffer_text(&terminal)
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    mod helper_tests {
        use super::*;

        #[test]
        fn test_any_key_closes_help_and_summary_exits() {
            assert_eq!(ViewState::Help.dismiss(), Some(ViewState::Swiping));
            assert_eq!(ViewState::Summary.dismiss(), None);
            assert_eq!(ViewState::Swiping.dismiss(), Some(ViewState::Swiping));
        }

        #[test]
        fn test_stamp_direction_and_commitment() {
            assert_eq!(stamp(0.2, 10.0), None);
            assert_eq!(stamp(-4.0, 10.0), Some(("BURN", ACCENT_PRIMARY, false)));
            assert_eq!(stamp(12.0, 10.0), Some(("KEEP", ACCENT_SECONDARY, true)));
            assert_eq!(stamp(10.0, 10.0), Some(("KEEP", ACCENT_SECONDARY, false)));
        }

        #[test]
        fn test_shift_rect_moves_and_clips() {
            let bounds = Rect::new(0, 0, 100, 20);
            let card = Rect::new(25, 2, 50, 16);

            assert_eq!(shift_rect(card, Offset::ZERO, bounds), Some(card));
            assert_eq!(
                shift_rect(card, Offset::new(10.0, 4.0), bounds),
                Some(Rect::new(35, 4, 50, 16))
            );
            // Clipped at the left edge
            assert_eq!(
                shift_rect(card, Offset::new(-40.0, 0.0), bounds),
                Some(Rect::new(0, 2, 35, 16))
            );
        }

        #[test]
        fn test_shift_rect_off_screen() {
            let bounds = Rect::new(0, 0, 100, 20);
            let card = Rect::new(25, 2, 50, 16);
            assert_eq!(shift_rect(card, Offset::new(-150.0, 0.0), bounds), None);
            assert_eq!(shift_rect(card, Offset::new(80.0, 0.0), bounds), None);
        }

        #[test]
        fn test_viewport_width_tracks_card() {
            let area = Rect::new(0, 0, 100, 30);
            let content = screen_layout(area)[1];
            assert_eq!(viewport_width(area), f32::from(card_area(content).width));
            assert!(viewport_width(area) >= 40.0);
        }
    }

    mod layout_tests {
        use super::*;

        #[test]
        fn test_render_ready_card() {
            let session = session_over(MemoryLibrary::new((0..3).map(item).collect()));
            let text = draw(&session);

            let current = session.current().unwrap().display_name.clone();
            assert!(text.contains(&current));
            assert!(text.contains("Burned: 0"));
            assert!(text.contains("Photoburn"));
        }

        #[test]
        fn test_render_footer() {
            let session = session_over(MemoryLibrary::new(vec![item(0)]));
            let text = draw(&session);

            assert!(text.contains("Burn"));
            assert!(text.contains("Keep"));
            assert!(text.contains("Quit"));
        }

        #[test]
        fn test_render_stamp_while_dragging() {
            let mut session = session_over(MemoryLibrary::new((0..2).map(item).collect()));
            let now = Instant::now();
            session.gesture_start(now);
            session.gesture_update(-15.0, 0.0, now);

            let text = draw(&session);
            assert!(text.contains("BURN"));
            assert!(text.contains("tilt"));
        }

        #[test]
        fn test_render_permission_denied() {
            let session = session_over(
                MemoryLibrary::new(vec![]).with_permission(PermissionStatus::Denied, false),
            );
            assert!(draw(&session).contains("access denied"));
        }

        #[test]
        fn test_render_empty_library() {
            let session = session_over(MemoryLibrary::new(vec![]));
            assert!(draw(&session).contains("No photos or videos found"));
        }

        #[test]
        fn test_render_failed_load() {
            let library = MemoryLibrary::new(vec![item(0)]);
            library.fail_next_lists(1);
            let session = session_over(library);

            let text = draw(&session);
            assert!(text.contains("Could not load photos"));
            assert!(text.contains("Press r to retry"));
        }

        #[test]
        fn test_render_help_overlay() {
            let backend = TestBackend::new(80, 30);
            let mut terminal = Terminal::new(backend).unwrap();
            terminal.draw(render_help_overlay).unwrap();

            let text = buffer_text(&terminal);
            assert!(text.contains("Help"));
            assert!(text.contains("Burn"));
            assert!(text.contains("Keep"));
        }

        #[test]
        fn test_render_summary() {
            let stats = SessionStatistics {
                kept: 6,
                burned: 3,
                failed_deletes: 1,
            };

            let backend = TestBackend::new(80, 30);
            let mut terminal = Terminal::new(backend).unwrap();
            terminal
                .draw(|frame| render_summary(frame, &stats, 120))
                .unwrap();

            let text = buffer_text(&terminal);
            assert!(text.contains("Session Complete"));
            assert!(text.contains("Not trashed"));
            assert!(text.contains("120"));
        }
    }
}

use crate::app::{App, Phase, LEGEND_WIDTH};
use crate::braille::BrailleCanvas;
use crate::content::ContentOrigin;
use crate::render::{render_frame, FrameLayers, MarkerGlyph};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Marker colors cycled by journey load order; the legend uses the
/// same palette so markers and legend rows match up.
const JOURNEY_COLORS: [Color; 8] = [
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::LightBlue,
    Color::LightRed,
    Color::LightCyan,
    Color::LightGreen,
    Color::LightMagenta,
];

pub fn journey_color(index: usize) -> Color {
    JOURNEY_COLORS[index % JOURNEY_COLORS.len()]
}

/// Render the whole screen: globe pane, journey legend, status bar.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(LEGEND_WIDTH)])
        .split(rows[0]);

    render_globe(frame, app, columns[0]);
    render_legend(frame, app, columns[1]);
    render_status_bar(frame, app, rows[1]);
}

fn render_globe(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.phase {
        Phase::Loading => " Historia Globe — loading ",
        Phase::Error(_) => " Historia Globe — error ",
        _ => " Historia Globe ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &app.phase {
        Phase::Loading => {
            let msg = Paragraph::new("Loading historical content…")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(msg, centered_line(inner));
        }
        Phase::Error(reason) => {
            let lines = vec![
                Line::from(Span::styled(
                    "Could not load content",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(reason.clone(), Style::default().fg(Color::Red))),
                Line::from(Span::styled(
                    "press r to retry",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            let msg = Paragraph::new(lines).alignment(Alignment::Center);
            frame.render_widget(msg, centered_block(inner, 3));
        }
        Phase::Ready | Phase::Filtered => {
            let layers = render_frame(&app.basemap, &app.camera, app.render_entries());
            frame.render_widget(GlobeWidget { layers }, inner);

            if app.show_diagnostics {
                render_diagnostics(frame, app, inner);
            }
        }
    }
}

/// Paints the Braille base layer and overlays marker glyphs in journey
/// colors. Completed modules are solid, open ones hollow.
struct GlobeWidget {
    layers: FrameLayers,
}

impl GlobeWidget {
    fn render_base(&self, canvas: &BrailleCanvas, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;
            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                if ch == '\u{2800}' {
                    continue;
                }
                buf[(area.x + col_idx as u16, y)].set_char(ch).set_fg(Color::Cyan);
            }
        }
    }

    fn render_marker(&self, marker: &MarkerGlyph, area: Rect, buf: &mut Buffer) {
        if marker.cell_x >= area.width || marker.cell_y >= area.height {
            return;
        }
        let x = area.x + marker.cell_x;
        let y = area.y + marker.cell_y;
        let glyph = if marker.completed { '●' } else { '○' };
        let color = journey_color(marker.journey_index);
        buf[(x, y)].set_char(glyph).set_fg(color);

        if let Some(label) = &marker.label {
            let start = marker.cell_x + 2;
            let max_len = area.width.saturating_sub(start) as usize;
            for (i, ch) in label.chars().take(max_len.min(20)).enumerate() {
                buf[(area.x + start + i as u16, y)].set_char(ch).set_fg(Color::White);
            }
        }
    }
}

impl Widget for GlobeWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_base(&self.layers.base, area, buf);
        for marker in &self.layers.markers {
            self.render_marker(marker, area, buf);
        }
    }
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" Journeys ", Style::default().fg(Color::Cyan)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for (index, journey) in app.journeys.iter().enumerate() {
        let visible = app.visible.contains(&journey.id);
        let valid = journey
            .modules
            .iter()
            .filter(|m| m.has_valid_coordinates())
            .count();

        let key = if index < 9 {
            format!("{} ", index + 1)
        } else {
            "  ".to_string()
        };
        let mark = if visible { "▣ " } else { "▢ " };
        let name_style = if visible {
            Style::default().fg(journey_color(index))
        } else {
            Style::default().fg(Color::DarkGray)
        };

        lines.push(Line::from(vec![
            Span::styled(key, Style::default().fg(Color::DarkGray)),
            Span::styled(mark, name_style),
            Span::styled(journey.title.clone(), name_style),
            Span::styled(format!(" {valid}"), Style::default().fg(Color::DarkGray)),
        ]));
    }

    if app.journeys.is_empty() {
        lines.push(Line::from(Span::styled(
            "no journeys",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "1-9 toggle  a all  x none",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_diagnostics(frame: &mut Frame, app: &App, inner: Rect) {
    let text = vec![
        Line::from(format!("journeys      {}", app.stats.journeys)),
        Line::from(format!("modules       {}", app.stats.modules)),
        Line::from(format!("with coords   {}", app.stats.with_coordinates)),
        Line::from(format!("dropped       {}", app.stats.dropped())),
        Line::from(format!("rendered      {}", app.render_entries().len())),
        Line::from(format!("rebuilds      {}", app.rebuild_count())),
    ];
    let height = text.len() as u16;
    let width = 22u16.min(inner.width);
    let overlay = Rect {
        x: inner.x + inner.width.saturating_sub(width),
        y: inner.y,
        width,
        height: height.min(inner.height),
    };
    let panel = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(panel, overlay);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let phase = match &app.phase {
        Phase::Loading => Span::styled("LOADING", Style::default().fg(Color::Yellow)),
        Phase::Ready => Span::styled("READY", Style::default().fg(Color::Green)),
        Phase::Filtered => Span::styled("FILTERED", Style::default().fg(Color::Magenta)),
        Phase::Error(_) => Span::styled("ERROR", Style::default().fg(Color::Red)),
    };

    let mut spans = vec![
        Span::raw(" "),
        phase,
        Span::styled(
            format!(" | zoom {:.1}x | ", app.camera.effective_zoom()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];

    if app.origin == Some(ContentOrigin::CacheFallback) {
        spans.push(Span::styled(
            " | CACHED DATA",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    spans.push(Span::styled(
        " | drag:rotate +/-:zoom click:open r:refresh d:stats q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered_line(area: Rect) -> Rect {
    Rect {
        x: area.x,
        y: area.y + area.height / 2,
        width: area.width,
        height: 1.min(area.height),
    }
}

fn centered_block(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        x: area.x,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width: area.width,
        height,
    }
}

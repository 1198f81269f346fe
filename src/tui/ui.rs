//! Demo event loop and frame layout.

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::logging;
use crate::overlay::Rgba;
use crate::palette;
use crate::settings::Settings;

use super::app::{App, DemoOptions};
use super::widgets::{
    DebugPanelWidget, HeaderData, HeaderWidget, OverlayFrame, Renderable, StatusBubbleWidget,
    TranscriptWidget,
};

const COMPOSER_HEIGHT: u16 = 2;

/// Run the interactive demo until the user quits.
pub async fn run_demo(settings: Settings, options: DemoOptions) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, options);
    logging::info(format!(
        "demo started: theme={} debug_mode={}",
        app.settings.theme, app.settings.debug_mode
    ));

    let result = run_event_loop(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<()> {
    let frame_interval = Duration::from_millis(app.settings.frame_interval_ms);
    let mut next_frame = Instant::now() + frame_interval;

    loop {
        app.drain_events();

        let now = Instant::now();
        if now >= next_frame {
            app.tick();
            next_frame = now + frame_interval;
        }

        terminal.draw(|f| render(f, app))?;

        let timeout = next_frame.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(..) => terminal.clear()?,
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('d') if ctrl => app.toggle_debug_mode(),
        KeyCode::Char('t') if ctrl => app.cycle_theme(),
        KeyCode::Tab => app.toggle_debug_panel(),
        KeyCode::Enter => {
            if app.submit_input() {
                app.status_message = None;
            }
        }
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(c) if !ctrl => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
        app.handle_click(mouse.column, mouse.row);
    }
}

fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let overlay = OverlayFrame {
        renderer: &app.renderer,
        status: app.tracker.status(),
        animation: app.tracker.animation(),
        text: app.tracker.text(),
        theme: &app.theme,
    };
    let header = HeaderWidget::new(HeaderData {
        npc_name: &app.settings.npc_name,
        state: app.header_state,
        debug_mode: app.renderer.debug_mode(),
        theme: &app.theme,
    });
    let panel = DebugPanelWidget::new(overlay);
    let bubble = StatusBubbleWidget::new(overlay);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header.desired_height(area.width)),
            Constraint::Length(panel.desired_height(area.width)),
            Constraint::Min(1),
            Constraint::Length(bubble.desired_height(area.width)),
            Constraint::Length(COMPOSER_HEIGHT),
        ])
        .split(area);

    let buf = f.buffer_mut();
    header.render(chunks[0], buf);
    TranscriptWidget::new(&app.messages, &app.theme).render(chunks[2], buf);
    fill_background(buf, chunks[3], app.theme.background);
    bubble.render(chunks[3], buf);
    panel.render(chunks[1], buf);
    render_composer(f, chunks[4], app);

    app.last_debug_panel_area = (chunks[1].height > 0).then_some(chunks[1]);
}

fn fill_background(buf: &mut Buffer, area: Rect, color: Rgba) {
    buf.set_style(area, Style::default().bg(palette::to_color(color)));
}

fn render_composer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = palette::to_color(theme.text);
    let secondary = palette::to_color(theme.text_secondary);

    let input_line = if app.tracker.is_active() {
        Line::from(Span::styled(
            format!(" {} is answering...", app.settings.npc_name),
            Style::default().fg(secondary).add_modifier(Modifier::ITALIC),
        ))
    } else if app.input.is_empty() {
        Line::from(vec![
            Span::styled(" > ", Style::default().fg(text)),
            Span::styled("Type a message", Style::default().fg(secondary)),
        ])
    } else {
        Line::from(vec![
            Span::styled(" > ", Style::default().fg(text)),
            Span::styled(app.input.clone(), Style::default().fg(text)),
        ])
    };

    let hint = app.status_message.clone().unwrap_or_else(|| {
        " Enter send · Ctrl+D debug · Tab panel · Ctrl+T theme · Esc quit".to_string()
    });
    let lines = vec![
        input_line,
        Line::from(Span::styled(hint, Style::default().fg(secondary))),
    ];
    f.render_widget(
        Paragraph::new(lines).style(Style::default().bg(palette::to_color(theme.input_bg))),
        area,
    );
}

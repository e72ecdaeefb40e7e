use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use historia_globe::app::App;
use historia_globe::basemap::Basemap;
use historia_globe::globe::LessonOpener;
use historia_globe::ui;
use ratatui::DefaultTerminal;
use simplelog::{Config, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

fn main() -> Result<()> {
    init_logger();

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// File logger — a TUI owns the terminal, so diagnostics go to disk.
fn init_logger() {
    let path = std::env::var("HISTORIA_LOG").unwrap_or_else(|_| "historia-globe.log".to_string());
    if let Ok(file) = File::create(&path) {
        let _ = WriteLogger::init(LevelFilter::Info, Config::default(), file);
    }
}

fn data_dir() -> PathBuf {
    std::env::var("HISTORIA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn run(terminal: &mut DefaultTerminal) -> Result<()> {
    let size = terminal.size()?;
    let data_dir = data_dir();

    let mut app = App::new(
        size.width as usize,
        size.height as usize,
        data_dir.join("modules.json"),
        data_dir.join("cache/modules.json"),
        Box::new(LessonOpener::from_env()),
    );

    app.basemap = Basemap::load(&data_dir);
    if !app.basemap.has_data() {
        app.basemap = Basemap::builtin();
    }

    app.request_refresh();

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps event poll; fetches complete via the channel, never
        // blocking the loop
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Rotate with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.camera.rotate_drag(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.camera.rotate_drag(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.camera.rotate_drag(0, -8),
                    KeyCode::Down | KeyCode::Char('j') => app.camera.rotate_drag(0, 8),

                    KeyCode::Char('+') | KeyCode::Char('=') => app.camera.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.camera.zoom_out(),

                    // Journey visibility
                    KeyCode::Char(c @ '1'..='9') => {
                        app.toggle_journey(c as usize - '1' as usize);
                    }
                    KeyCode::Char('a') => app.show_all(),
                    KeyCode::Char('x') => app.clear_all(),

                    KeyCode::Char('r') => app.request_refresh(),
                    KeyCode::Char('d') => app.show_diagnostics = !app.show_diagnostics,

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        app.poll_fetch();
        app.commit();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Mouse: drag rotates, scroll zooms at the cursor, a motionless left
/// click picks the marker under the cursor.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::Down(MouseButton::Left) => app.begin_drag(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(mouse.column, mouse.row),
        _ => {}
    }
}

use anyhow::Result;
use blockpad_config::Config;
use blockpad_engine::{
    BlockKind, InlineStyle, SaveOutcome, Selection, Session, Snapshot, Store,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{env, io::stdout, path::PathBuf, process};

struct App {
    session: Session,
    store: Store,
    status: String,
    last_autosaved: u64,
}

impl App {
    fn new(data_path: PathBuf) -> Result<Self> {
        let store = Store::new(data_path);
        let session = Session::from_store(&store)?;
        let last_autosaved = session.version();
        Ok(Self {
            session,
            store,
            status: String::new(),
            last_autosaved,
        })
    }

    fn save(&mut self) {
        match self.session.save_to(&self.store) {
            Ok(SaveOutcome::Saved) => self.status = "Content saved!".to_string(),
            Ok(SaveOutcome::NothingToSave) => {
                self.status = "Editor is empty. Nothing to save.".to_string();
            }
            Err(e) => self.status = format!("Save failed: {e}"),
        }
    }

    /// Write-behind save whenever the committed version moved.
    fn autosave(&mut self) {
        if self.session.version() != self.last_autosaved {
            let _ = self.session.save_to(&self.store);
            self.last_autosaved = self.session.version();
        }
    }

    fn move_caret(&mut self, code: KeyCode, extend: bool) {
        let doc = self.session.document();
        let sel = self.session.selection();
        let index = match doc.index_of(sel.focus_block) {
            Ok(i) => i,
            Err(_) => return,
        };
        let blocks = doc.blocks();

        let (block, offset) = match code {
            KeyCode::Left => {
                if sel.focus_offset > 0 {
                    (sel.focus_block, sel.focus_offset - 1)
                } else if index > 0 {
                    let prev = &blocks[index - 1];
                    (prev.id, prev.char_len())
                } else {
                    return;
                }
            }
            KeyCode::Right => {
                if sel.focus_offset < blocks[index].char_len() {
                    (sel.focus_block, sel.focus_offset + 1)
                } else if index + 1 < blocks.len() {
                    (blocks[index + 1].id, 0)
                } else {
                    return;
                }
            }
            KeyCode::Up if index > 0 => {
                let prev = &blocks[index - 1];
                (prev.id, sel.focus_offset.min(prev.char_len()))
            }
            KeyCode::Down if index + 1 < blocks.len() => {
                let next = &blocks[index + 1];
                (next.id, sel.focus_offset.min(next.char_len()))
            }
            KeyCode::Home => (sel.focus_block, 0),
            KeyCode::End => (sel.focus_block, blocks[index].char_len()),
            _ => return,
        };

        let selection = if extend {
            Selection::range(sel.anchor_block, sel.anchor_offset, block, offset)
        } else {
            Selection::caret(block, offset)
        };
        let _ = self.session.set_selection(selection);
    }

    fn on_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match code {
                KeyCode::Char('q') => {
                    self.autosave();
                    return Ok(true);
                }
                KeyCode::Char('s') => self.save(),
                KeyCode::Char('b') => {
                    self.session.on_key_command("bold")?;
                }
                KeyCode::Char('r') => {
                    self.session.on_key_command("red")?;
                }
                KeyCode::Char('u') => {
                    self.session.on_key_command("underline")?;
                }
                KeyCode::Char('t') => {
                    self.session.on_key_command("header")?;
                }
                KeyCode::Char('z') => {
                    self.session.on_key_command("undo")?;
                }
                KeyCode::Char('y') => {
                    self.session.on_key_command("redo")?;
                }
                _ => {}
            }
            return Ok(false);
        }

        match code {
            KeyCode::Char(ch) => {
                self.session.on_before_input(ch)?;
            }
            KeyCode::Enter => {
                self.session.on_key_command("split-block")?;
            }
            KeyCode::Backspace => {
                self.session.on_key_command("backspace")?;
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Home
            | KeyCode::End => {
                self.move_caret(code, modifiers.contains(KeyModifiers::SHIFT));
            }
            _ => {}
        }
        Ok(false)
    }
}

/// Map the engine's abstract style tags onto terminal attributes.
fn run_style(styles: &[InlineStyle]) -> Style {
    let mut style = Style::default();
    for s in styles {
        style = match s {
            InlineStyle::Bold => style.add_modifier(Modifier::BOLD),
            InlineStyle::ColorRed => style.fg(Color::Red),
            InlineStyle::Underline => style.add_modifier(Modifier::UNDERLINED),
        };
    }
    style
}

fn render_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    snapshot
        .blocks
        .iter()
        .map(|block| {
            let base = match block.kind {
                BlockKind::Header => Style::default().add_modifier(Modifier::BOLD),
                BlockKind::Paragraph => Style::default(),
            };
            let spans: Vec<Span> = block
                .runs
                .iter()
                .map(|run| Span::styled(block.run_text(run), base.patch(run_style(&run.styles))))
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn main() -> Result<()> {
    // Determine the data directory from CLI args or the config file
    let args: Vec<String> = env::args().collect();

    let data_path = if args.len() == 2 {
        PathBuf::from(&args[1])
    } else if args.len() == 1 {
        match Config::load_or_default() {
            Ok(config) => config.data_path,
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} [data-folder-path]", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [data-folder-path]", args[0]);
        process::exit(1);
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(data_path)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.on_key(key.code, key.modifiers)? {
                return Ok(());
            }
            app.autosave();
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let snapshot = app.session.snapshot();

    let editor = Paragraph::new(render_lines(&snapshot))
        .block(Block::default().borders(Borders::ALL).title("blockpad"));
    f.render_widget(editor, chunks[0]);

    // Each block is a single line, so the caret maps straight to
    // (block index, char offset) inside the bordered area.
    if let Ok(row) = app.session.document().index_of(snapshot.selection.focus_block) {
        let col = snapshot.selection.focus_offset;
        f.set_cursor_position(Position::new(
            chunks[0].x + 1 + col as u16,
            chunks[0].y + 1 + row as u16,
        ));
    }

    let help = Line::from(vec![
        Span::raw("^S: Save | ^Z/^Y: Undo/Redo | ^B/^R/^U: Style | ^T: Header | ^Q: Quit"),
    ]);
    let status = Line::from(Span::styled(
        app.status.clone(),
        Style::default().fg(Color::Yellow),
    ));
    f.render_widget(Paragraph::new(vec![status, help]), chunks[1]);
}

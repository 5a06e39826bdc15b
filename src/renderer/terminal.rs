//! Terminal host - plays a [`Page`] in the terminal with crossterm.
//!
//! The host owns the thread's [`VirtualClock`] and [`SimulatedViewport`]:
//! each frame moves virtual time up to real elapsed time, redraws the visible
//! slice of the document and polls input for one frame.
//!
//! # Keys
//!
//! - `↑`/`↓`/`PgUp`/`PgDn`/mouse wheel scroll
//! - `←`/`→`/`Tab` select a control, `Enter` activates it
//! - `q`/`Esc`/`Ctrl+C` quit
//!
//! # Example
//!
//! ```ignore
//! let mut host = TerminalHost::new()?;   // install clock + viewport first
//! let page = Page::new(script)?;         // timers start against the clock
//! match host.run(&page)? {
//!     Exit::Navigated(route) => println!("next: {route}"),
//!     Exit::Quit => {}
//! }
//! ```

use std::cell::{Cell, RefCell};
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEventKind,
};
use crossterm::style::{PrintStyledContent, StyledContent, Stylize};
use crossterm::terminal::{
    self, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};

use super::layout::{render_document, LineStyle, PageLayout, StyledLine};
use crate::error::Result;
use crate::page::Page;
use crate::state::action::{Activation, Navigator, Notice, Notifier};
use crate::state::clock::VirtualClock;
use crate::state::viewport::SimulatedViewport;
use crate::types::ElementHandle;

/// Frame interval (~60fps).
pub const FRAME_MS: u64 = 16;

const PAGE_SCROLL_FRACTION: f32 = 0.8;

const HINT: &str = "↑/↓ scroll  ←/→ select  Enter activate  q quit";

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    Quit,
    Navigated(String),
}

/// What the loop should do after an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
    Navigate(String),
}

// =============================================================================
// TERMINAL GUARD
// =============================================================================

/// Raw mode + alternate screen for the lifetime of the guard.
struct TerminalGuard;

impl TerminalGuard {
    fn enter(out: &mut Stdout) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(e) = execute!(out, EnterAlternateScreen, Hide, EnableMouseCapture) {
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best effort: the terminal must come back even if drawing failed
        let _ = execute!(io::stdout(), DisableMouseCapture, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

// =============================================================================
// HOST EFFECTS
// =============================================================================

/// Receives navigation and notices from the page's controls.
#[derive(Default)]
struct HostEffects {
    now: Cell<u64>,
    last_route: RefCell<Option<String>>,
    /// Notice with the virtual time it expires at
    notice: RefCell<Option<(Notice, u64)>>,
}

impl Navigator for HostEffects {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "navigation requested");
        *self.last_route.borrow_mut() = Some(route.to_string());
    }
}

impl Notifier for HostEffects {
    fn notify(&self, notice: &Notice) {
        let expires = self.now.get().saturating_add(notice.duration_ms);
        *self.notice.borrow_mut() = Some((notice.clone(), expires));
    }
}

// =============================================================================
// TERMINAL HOST
// =============================================================================

struct Mounted {
    layout: PageLayout,
    hero: ElementHandle,
    items: Vec<ElementHandle>,
}

/// Plays one page at a time in the terminal.
pub struct TerminalHost {
    clock: VirtualClock,
    viewport: SimulatedViewport,
    started: Instant,
    size: (u16, u16),
    effects: HostEffects,
    selected: usize,
    mounted: Option<Mounted>,
}

impl TerminalHost {
    /// Host sized to the current terminal. Installs the clock and viewport,
    /// so create it before the page.
    pub fn new() -> Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(width, height))
    }

    /// Host with a fixed size; does no terminal I/O until [`run`](Self::run).
    pub fn with_size(width: u16, height: u16) -> Self {
        let clock = VirtualClock::new();
        clock.install();

        let viewport = SimulatedViewport::new(f32::from(width), f32::from(body_rows(height)));
        viewport.install();

        Self {
            clock,
            viewport,
            started: Instant::now(),
            size: (width, height),
            effects: HostEffects::default(),
            selected: 0,
            mounted: None,
        }
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    pub fn viewport(&self) -> &SimulatedViewport {
        &self.viewport
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Route most recently requested by a control.
    pub fn last_route(&self) -> Option<String> {
        self.effects.last_route.borrow().clone()
    }

    /// Lay `page` out and bind its parts to viewport elements.
    pub fn attach(&mut self, page: &Page) {
        let layout = PageLayout::compute(page.script(), self.size.0);
        let hero = self.viewport.add_element(layout.hero);
        page.attach_hero(hero);

        let items = layout
            .items
            .iter()
            .enumerate()
            .map(|(k, rect)| {
                let element = self.viewport.add_element(*rect);
                page.attach_item(k, element);
                element
            })
            .collect();

        self.selected = 0;
        self.mounted = Some(Mounted {
            layout,
            hero,
            items,
        });
    }

    pub fn layout(&self) -> Option<&PageLayout> {
        self.mounted.as_ref().map(|m| &m.layout)
    }

    /// Run until the user quits or a control navigates away.
    pub fn run(&mut self, page: &Page) -> Result<Exit> {
        if self.mounted.is_none() {
            self.attach(page);
        }

        let mut out = io::stdout();
        let _guard = TerminalGuard::enter(&mut out)?;

        loop {
            self.sync_time();
            self.draw(&mut out, page)?;

            if !event::poll(self.poll_timeout())? {
                continue;
            }

            let flow = match event::read()? {
                Event::Key(key) => self.handle_key(key, page),
                Event::Mouse(mouse) => {
                    match mouse.kind {
                        MouseEventKind::ScrollUp => self.scroll_by(-1.0),
                        MouseEventKind::ScrollDown => self.scroll_by(1.0),
                        _ => {}
                    }
                    Flow::Continue
                }
                Event::Resize(width, height) => {
                    self.resize(page, width, height);
                    Flow::Continue
                }
                _ => Flow::Continue,
            };

            match flow {
                Flow::Continue => {}
                Flow::Quit => return Ok(Exit::Quit),
                Flow::Navigate(route) => return Ok(Exit::Navigated(route)),
            }
        }
    }

    /// How long to wait for input: one frame, or less when a tick is due
    /// sooner.
    pub fn poll_timeout(&self) -> Duration {
        let now = self.clock.now();
        let wait = self
            .clock
            .next_due()
            .map_or(FRAME_MS, |due| due.saturating_sub(now).min(FRAME_MS));
        Duration::from_millis(wait)
    }

    /// Move virtual time up to real elapsed time.
    fn sync_time(&self) {
        let elapsed = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.advance_to(elapsed);
    }

    /// Advance virtual time and expire notices.
    pub fn advance_to(&self, now: u64) {
        self.clock.advance_to(now);
        self.effects.now.set(self.clock.now());

        let expired = matches!(
            &*self.effects.notice.borrow(),
            Some((_, expires)) if *expires <= self.clock.now()
        );
        if expired {
            self.effects.notice.borrow_mut().take();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, page: &Page) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }

        let page_rows = f32::from(body_rows(self.size.1)) * PAGE_SCROLL_FRACTION;
        let actions = page.actions().len();

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Flow::Quit,
            KeyCode::Char('q') | KeyCode::Esc => Flow::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_by(-1.0);
                Flow::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_by(1.0);
                Flow::Continue
            }
            KeyCode::PageUp => {
                self.scroll_by(-page_rows.max(1.0));
                Flow::Continue
            }
            KeyCode::PageDown | KeyCode::Char(' ') => {
                self.scroll_by(page_rows.max(1.0));
                Flow::Continue
            }
            KeyCode::Left | KeyCode::BackTab if actions > 0 => {
                self.selected = (self.selected + actions - 1) % actions;
                Flow::Continue
            }
            KeyCode::Right | KeyCode::Tab if actions > 0 => {
                self.selected = (self.selected + 1) % actions;
                Flow::Continue
            }
            KeyCode::Enter => self.activate(page),
            _ => Flow::Continue,
        }
    }

    fn activate(&self, page: &Page) -> Flow {
        let Some(action) = page.actions().get(self.selected) else {
            return Flow::Continue;
        };
        match action.activate(&self.effects, &self.effects) {
            Activation::Proceeded { route } => Flow::Navigate(route),
            Activation::Blocked | Activation::Notified => Flow::Continue,
        }
    }

    /// Scroll by `rows`, clamped to the document.
    pub fn scroll_by(&self, rows: f32) {
        let doc_height = self
            .mounted
            .as_ref()
            .map_or(0.0, |m| f32::from(m.layout.height));
        let max = (doc_height - self.viewport.viewport().height).max(0.0);
        let target = (self.viewport.scroll_y() + rows).clamp(0.0, max);
        if target != self.viewport.scroll_y() {
            self.viewport.scroll_to(target);
        }
    }

    /// Re-layout for a new terminal size, keeping every element's handle.
    pub fn resize(&mut self, page: &Page, width: u16, height: u16) {
        self.size = (width, height);
        self.viewport
            .resize(f32::from(width), f32::from(body_rows(height)));

        if let Some(mounted) = self.mounted.as_mut() {
            mounted.layout = PageLayout::compute(page.script(), width);
            self.viewport.move_element(mounted.hero, mounted.layout.hero);
            for (element, rect) in mounted.items.iter().zip(&mounted.layout.items) {
                self.viewport.move_element(*element, *rect);
            }
        }
        self.scroll_by(0.0);
    }

    /// Bottom line: the current notice, or key hints.
    pub fn status_line(&self) -> String {
        match &*self.effects.notice.borrow() {
            Some((notice, _)) => match &notice.description {
                Some(description) => format!("{}: {}", notice.title, description),
                None => notice.title.clone(),
            },
            None => HINT.to_string(),
        }
    }

    fn draw(&self, out: &mut Stdout, page: &Page) -> io::Result<()> {
        let Some(mounted) = self.mounted.as_ref() else {
            return Ok(());
        };

        let lines = render_document(page, &mounted.layout, self.selected);
        let top = self.viewport.scroll_y().max(0.0) as usize;
        let rows = body_rows(self.size.1);
        let width = usize::from(self.size.0);

        queue!(out, BeginSynchronizedUpdate)?;
        for row in 0..rows {
            queue!(out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
            if let Some(line) = lines.get(top + usize::from(row)) {
                queue!(out, PrintStyledContent(style_line(line)))?;
            }
        }

        let status: String = self.status_line().chars().take(width).collect();
        queue!(
            out,
            MoveTo(0, rows),
            Clear(ClearType::CurrentLine),
            PrintStyledContent(status.dim())
        )?;
        queue!(out, EndSynchronizedUpdate)?;
        out.flush()
    }
}

/// Rows available to the document (the last row holds the status line).
fn body_rows(height: u16) -> u16 {
    height.saturating_sub(1).max(1)
}

fn style_line(line: &StyledLine) -> StyledContent<String> {
    let text = line.text.clone();
    match line.style {
        LineStyle::Blank | LineStyle::Text => text.stylize(),
        LineStyle::Title => text.bold(),
        LineStyle::Description => text.italic(),
        LineStyle::ItemTitle => text.bold().cyan(),
        LineStyle::ItemBody => text.dim(),
        LineStyle::Action {
            actionable,
            selected,
        } => {
            let styled = if actionable { text.bold() } else { text.dim() };
            if selected { styled.reverse() } else { styled }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{features, intro};
    use crate::state::motion::reset_motion_state;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() {
        reset_motion_state();
    }

    #[test]
    fn test_enter_blocked_until_text_done() {
        setup();
        let mut host = TerminalHost::with_size(80, 24);
        let page = Page::new(intro()).unwrap();
        host.attach(&page);

        assert_eq!(host.handle_key(press(KeyCode::Enter), &page), Flow::Continue);

        host.advance_to(60_000);
        assert!(page.is_settled());
        assert_eq!(
            host.handle_key(press(KeyCode::Enter), &page),
            Flow::Navigate("/intake".into())
        );
        assert_eq!(host.last_route().as_deref(), Some("/intake"));
    }

    #[test]
    fn test_poll_timeout_wakes_for_next_tick() {
        setup();
        let host = TerminalHost::with_size(80, 24);
        let page = Page::new(intro().with_speed(40)).unwrap();

        assert_eq!(host.poll_timeout(), Duration::from_millis(FRAME_MS));
        host.advance_to(30);
        assert_eq!(host.poll_timeout(), Duration::from_millis(10));

        page.dispose();
        assert_eq!(host.clock().pending_timers(), 0);
        assert_eq!(host.poll_timeout(), Duration::from_millis(FRAME_MS));
    }

    #[test]
    fn test_quit_keys() {
        setup();
        let mut host = TerminalHost::with_size(80, 24);
        let page = Page::new(intro()).unwrap();

        assert_eq!(host.handle_key(press(KeyCode::Char('q')), &page), Flow::Quit);
        assert_eq!(host.handle_key(press(KeyCode::Esc), &page), Flow::Quit);
        assert_eq!(
            host.handle_key(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &page
            ),
            Flow::Quit
        );
    }

    #[test]
    fn test_coming_soon_notice_expires() {
        setup();
        let mut host = TerminalHost::with_size(80, 24);
        let page = Page::new(features()).unwrap();
        host.attach(&page);

        host.handle_key(press(KeyCode::Right), &page);
        assert_eq!(host.selected(), 1);
        assert_eq!(host.handle_key(press(KeyCode::Enter), &page), Flow::Continue);
        assert_eq!(
            host.status_line(),
            "Coming soon: See Our Services is not available yet."
        );

        host.advance_to(3_499);
        assert!(host.status_line().starts_with("Coming soon"));
        host.advance_to(3_500);
        assert_eq!(host.status_line(), HINT);
    }

    #[test]
    fn test_selection_wraps() {
        setup();
        let mut host = TerminalHost::with_size(80, 24);
        let page = Page::new(features()).unwrap();

        host.handle_key(press(KeyCode::Left), &page);
        assert_eq!(host.selected(), 1);
        host.handle_key(press(KeyCode::Tab), &page);
        assert_eq!(host.selected(), 0);
    }

    #[test]
    fn test_scroll_clamps_to_document() {
        setup();
        let mut host = TerminalHost::with_size(40, 10);
        let page = Page::new(features()).unwrap();
        host.attach(&page);

        let doc = f32::from(host.layout().unwrap().height);
        host.scroll_by(-5.0);
        assert_eq!(host.viewport().scroll_y(), 0.0);

        host.scroll_by(10_000.0);
        assert_eq!(host.viewport().scroll_y(), doc - 9.0);

        // Scrolling to the bottom reveals the last card
        assert!(page.items().last().unwrap().is_visible());
    }

    #[test]
    fn test_resize_relayouts() {
        setup();
        let mut host = TerminalHost::with_size(80, 24);
        let page = Page::new(intro()).unwrap();
        host.attach(&page);
        let wide = host.layout().unwrap().height;

        host.resize(&page, 30, 24);
        assert!(host.layout().unwrap().height > wide);
        assert_eq!(host.viewport().viewport().width, 30.0);
    }
}

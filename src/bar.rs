//! The progress bar itself: the [`ProgressBar`] configuration template, the
//! [`ActiveBar`] live instance it produces, and the lifecycle operations that
//! drive it.
//!
//! A `ProgressBar` is a plain value built up with `with_*` setters. Calling
//! [`ProgressBar::start`] copies it into a live instance, so one template can
//! start any number of independent bars and is never itself marked active.
//! The live instance is a cheap-to-clone shared handle; any thread may drive
//! it while, with elapsed-time display enabled, a background ticker re-renders
//! the line once per second so the clock keeps moving between updates.
//!
//! # Basic Usage
//!
//! ```no_run
//! use termbar::ProgressBar;
//!
//! # fn main() -> std::io::Result<()> {
//! let bar = ProgressBar::new().with_total(30).with_title("Downloading");
//! let live = bar.start()?;
//! for _ in 0..30 {
//!     // ... one unit of work ...
//!     live.increment();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Reaching the total stops the bar automatically; an explicit
//! [`ActiveBar::stop`] ends it early.

use crate::registry::Registry;
use crate::render::{self, Snapshot};
use crate::term;
use lipgloss::{Color, Style};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Period of the autonomous re-render while elapsed time is shown.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

fn lock_mutex<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_lock<T: ?Sized>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T: ?Sized>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A shared handle to an output stream.
///
/// Bars write their frames through a `Sink`; writes from one bar are
/// serialized, so a frame is never torn by the bar's own ticker. Distinct bars
/// pointed at the same sink still interleave whole frames, which is the
/// caller's hazard to manage.
#[derive(Clone)]
pub struct Sink {
    inner: Arc<Mutex<dyn Write + Send>>,
}

impl Sink {
    /// Wraps any writer in a shareable sink.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// A sink over standard output. The default for new bars.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// A sink over standard error, for bars that must not pollute piped
    /// output.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    fn lock(&self) -> MutexGuard<'_, dyn Write + Send + 'static> {
        lock_mutex(&self.inner)
    }
}

/// Configuration template for a progress bar.
///
/// Logically immutable once started: [`start`](ProgressBar::start) operates on
/// a copy, so the template can be reused and is never itself live. All display
/// fields are public; the `with_*` setters exist for chained construction.
#[derive(Clone)]
pub struct ProgressBar {
    /// Text rendered before the bar when `show_title` is set.
    pub title: String,
    /// Value at which the bar completes. Zero makes the bar a no-op.
    pub total: u64,
    /// Starting value for the live instance.
    pub current: u64,
    /// Character repeated for the filled portion.
    pub bar_character: String,
    /// Cap character drawn at the leading edge of the filled run.
    pub last_character: String,
    /// Character repeated for the unfilled portion.
    pub bar_filler: String,
    /// Maximum render width; zero means the full terminal width.
    pub max_width: usize,
    /// Whether the title is rendered.
    pub show_title: bool,
    /// Whether the zero-padded `[current/total]` block is rendered.
    pub show_count: bool,
    /// Whether the color-faded percentage is rendered.
    pub show_percentage: bool,
    /// Whether elapsed time is rendered. Also enables the background ticker.
    pub show_elapsed_time: bool,
    /// Clear the bar's line on stop instead of finalizing with a newline.
    pub remove_when_done: bool,
    /// Granularity the elapsed time is rounded to before formatting.
    pub elapsed_rounding: Duration,
    /// Style applied to the title.
    pub title_style: Style,
    /// Style applied to the filled portion of the bar.
    pub bar_style: Style,
    writer: Sink,
    registry: Arc<Registry>,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self {
            title: String::new(),
            total: 100,
            current: 0,
            bar_character: "█".to_string(),
            last_character: "█".to_string(),
            bar_filler: "░".to_string(),
            max_width: 80,
            show_title: true,
            show_count: true,
            show_percentage: true,
            show_elapsed_time: true,
            remove_when_done: false,
            elapsed_rounding: Duration::from_secs(1),
            title_style: Style::new(),
            bar_style: Style::new().foreground(Color::from("#7571F9")),
            writer: Sink::stdout(),
            registry: Registry::global(),
        }
    }
}

impl ProgressBar {
    /// Creates a template with the stock look: `█` fill, `░` filler, width 80,
    /// every decoration enabled, total 100.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the total value.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = total;
        self
    }

    /// Sets the starting value.
    pub fn with_current(mut self, current: u64) -> Self {
        self.current = current;
        self
    }

    /// Sets the character used for the filled portion.
    pub fn with_bar_character(mut self, c: impl Into<String>) -> Self {
        self.bar_character = c.into();
        self
    }

    /// Sets the cap character at the leading edge of the filled run.
    pub fn with_last_character(mut self, c: impl Into<String>) -> Self {
        self.last_character = c.into();
        self
    }

    /// Sets the character used for the unfilled portion.
    pub fn with_bar_filler(mut self, c: impl Into<String>) -> Self {
        self.bar_filler = c.into();
        self
    }

    /// Sets the maximum render width. If the terminal is narrower, the
    /// terminal width wins; zero means always use the full terminal width.
    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    /// Shows or hides the title.
    pub fn with_show_title(mut self, show: bool) -> Self {
        self.show_title = show;
        self
    }

    /// Shows or hides the `[current/total]` block.
    pub fn with_show_count(mut self, show: bool) -> Self {
        self.show_count = show;
        self
    }

    /// Shows or hides the percentage.
    pub fn with_show_percentage(mut self, show: bool) -> Self {
        self.show_percentage = show;
        self
    }

    /// Shows or hides elapsed time. When hidden, no ticker thread is spawned
    /// and the bar only redraws on explicit updates.
    pub fn with_show_elapsed_time(mut self, show: bool) -> Self {
        self.show_elapsed_time = show;
        self
    }

    /// Clears the bar's line on stop instead of finalizing with a newline.
    pub fn with_remove_when_done(mut self, remove: bool) -> Self {
        self.remove_when_done = remove;
        self
    }

    /// Sets the granularity elapsed time is rounded to.
    pub fn with_elapsed_rounding(mut self, granularity: Duration) -> Self {
        self.elapsed_rounding = granularity;
        self
    }

    /// Sets the title style.
    pub fn with_title_style(mut self, style: Style) -> Self {
        self.title_style = style;
        self
    }

    /// Sets the style of the filled bar portion.
    pub fn with_bar_style(mut self, style: Style) -> Self {
        self.bar_style = style;
        self
    }

    /// Sets the output sink. Defaults to standard output.
    pub fn with_writer(mut self, sink: Sink) -> Self {
        self.writer = sink;
        self
    }

    /// Sets the registry the live instance announces itself to. Defaults to
    /// [`Registry::global`].
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    /// Starts a live instance from this template.
    ///
    /// Hides the cursor, registers the instance, renders the first frame and,
    /// when elapsed time is shown, spawns the once-per-second re-render
    /// ticker. The template itself is untouched and can be started again.
    pub fn start(&self) -> io::Result<ActiveBar> {
        self.start_instance(None)
    }

    /// Like [`start`](Self::start), with the title overridden for this
    /// instance only.
    pub fn start_with_title(&self, title: impl Into<String>) -> io::Result<ActiveBar> {
        self.start_instance(Some(title.into()))
    }

    fn start_instance(&self, title: Option<String>) -> io::Result<ActiveBar> {
        let mut config = self.clone();
        if let Some(title) = title {
            config.title = title;
        }

        let core = Arc::new(BarCore {
            current: AtomicU64::new(config.current),
            total: AtomicU64::new(config.total),
            active: AtomicBool::new(true),
            title: RwLock::new(config.title.clone()),
            started_at: RwLock::new(Instant::now()),
            ticker: Mutex::new(None),
            config,
        });

        {
            let mut w = core.config.writer.lock();
            term::hide_cursor(&mut *w)?;
        }

        core.config.registry.register(&core);
        core.redraw();

        if core.config.show_elapsed_time {
            let (tx, rx) = mpsc::channel();
            let weak = Arc::downgrade(&core);
            let handle = thread::Builder::new()
                .name("termbar-tick".to_string())
                .spawn(move || loop {
                    match rx.recv_timeout(TICK_INTERVAL) {
                        Err(RecvTimeoutError::Timeout) => match weak.upgrade() {
                            Some(core) => core.redraw(),
                            None => break,
                        },
                        // Stop signal, or every handle to the bar is gone.
                        _ => break,
                    }
                })?;
            *lock_mutex(&core.ticker) = Some(Ticker { stop: tx, handle });
        }

        Ok(ActiveBar { core })
    }
}

struct Ticker {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Shared state of one live bar, behind the `ActiveBar` handles and the
/// ticker thread. Fields are synchronized independently: a render may combine
/// values stored instants apart, which is fine for a display.
pub(crate) struct BarCore {
    config: ProgressBar,
    current: AtomicU64,
    total: AtomicU64,
    active: AtomicBool,
    title: RwLock<String>,
    started_at: RwLock<Instant>,
    ticker: Mutex<Option<Ticker>>,
}

impl BarCore {
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            title: read_lock(&self.title).clone(),
            current: self.current.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
            elapsed: read_lock(&self.started_at).elapsed(),
        }
    }

    fn redraw(&self) {
        if !self.is_active() {
            return;
        }
        let snap = self.snapshot();
        let line = render::render_line(&self.config, &snap, term::width());
        if line.is_empty() {
            return;
        }
        let mut w = self.config.writer.lock();
        // Best effort: a failed write is superseded by the next frame.
        let _ = term::overwrite(&mut *w, &line);
    }
}

/// A live, started progress bar.
///
/// Cloning yields another handle to the same bar, so independent threads can
/// drive one bar concurrently. The bar stops automatically once `current`
/// reaches the total.
#[derive(Clone)]
pub struct ActiveBar {
    core: Arc<BarCore>,
}

impl ActiveBar {
    pub(crate) fn from_core(core: Arc<BarCore>) -> Self {
        Self { core }
    }

    /// Advances the bar by `n` and redraws immediately.
    ///
    /// Returns `None` when the bar was configured with a total of zero; such
    /// a bar is a no-op and produces no output. On reaching the total, the
    /// total is clamped to the final value, a 100% frame is rendered, and the
    /// bar stops itself.
    pub fn add(&self, n: u64) -> Option<&Self> {
        if self.core.total.load(Ordering::SeqCst) == 0 {
            return None;
        }

        let new = self.core.current.fetch_add(n, Ordering::SeqCst) + n;
        self.core.redraw();

        if new >= self.core.total.load(Ordering::SeqCst) {
            self.core.total.store(new, Ordering::SeqCst);
            self.core.redraw();
            let _ = self.stop();
        }
        Some(self)
    }

    /// Advances the bar by one. Shorthand for `add(1)`.
    pub fn increment(&self) -> Option<&Self> {
        self.add(1)
    }

    /// Replaces the title and redraws. Numeric progress is untouched; the two
    /// never contend.
    pub fn update_title(&self, title: impl Into<String>) -> &Self {
        *write_lock(&self.core.title) = title.into();
        self.core.redraw();
        self
    }

    /// Re-stamps the start time, restarting the elapsed-time display.
    pub fn reset_timer(&self) {
        *write_lock(&self.core.started_at) = Instant::now();
    }

    /// Time since the bar started (or since the last [`reset_timer`](Self::reset_timer)).
    pub fn elapsed(&self) -> Duration {
        read_lock(&self.core.started_at).elapsed()
    }

    /// Current progress value.
    pub fn current(&self) -> u64 {
        self.core.current.load(Ordering::SeqCst)
    }

    /// Total the bar is counting toward.
    pub fn total(&self) -> u64 {
        self.core.total.load(Ordering::SeqCst)
    }

    /// Whether the bar is still live.
    pub fn is_active(&self) -> bool {
        self.core.is_active()
    }

    /// The current title.
    pub fn title(&self) -> String {
        read_lock(&self.core.title).clone()
    }

    /// Stops the bar.
    ///
    /// Cancels the ticker and blocks until it can no longer fire. Then, only
    /// if the bar was still active, restores the cursor, emits exactly one
    /// terminal action (clear the line when remove-when-done is set, a
    /// trailing newline otherwise) and deregisters from the registry.
    /// Idempotent: a second call does nothing and writes nothing.
    pub fn stop(&self) -> io::Result<()> {
        let ticker = lock_mutex(&self.core.ticker).take();
        if let Some(ticker) = ticker {
            let _ = ticker.stop.send(());
            let _ = ticker.handle.join();
        }

        if !self.core.active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        {
            let mut w = self.core.config.writer.lock();
            term::show_cursor(&mut *w)?;
            if self.core.config.remove_when_done {
                term::clear_line(&mut *w)?;
            } else {
                w.write_all(b"\n")?;
                w.flush()?;
            }
        }

        self.core.config.registry.deregister(&self.core);
        Ok(())
    }
}

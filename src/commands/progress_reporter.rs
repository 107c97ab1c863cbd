//! An indicatif-backed progress display that stays invisible for short runs.

use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use gyre::crawl::Progress;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

type ProgressCallback = Box<dyn Fn() -> (u64, u64, String) + Send + Sync>;

/// Refresh rate for progress updates.
const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

const BAR_TEMPLATE: &str = "{prefix:>10.bold.cyan} [{bar:25}] {msg}";
const BAR_TEMPLATE_NO_COLOR: &str = "{prefix:>10} [{bar:25}] {msg}";
const SPINNER_TEMPLATE: &str = "{prefix:>10.bold.cyan} {spinner} {msg}";
const SPINNER_TEMPLATE_NO_COLOR: &str = "{prefix:>10} {spinner} {msg}";

const SPINNER_FRAMES: &[&str] = &["|", "/", "-", "\\"];

/// A progress bar that delays showing itself until a threshold is reached,
/// so quick runs never flash a bar at all.
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
    visible_after: Instant,
    visible: Arc<AtomicBool>,
    callback: Arc<Mutex<ProgressCallback>>,
    refresh_task: Arc<JoinHandle<()>>,
    use_colors: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter.
    ///
    /// The bar becomes visible only if the run continues beyond `delay`.
    /// When `use_colors` is false, the bar chrome is rendered without ANSI
    /// styling.
    #[must_use]
    pub fn new(delay: Duration, use_colors: bool) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_draw_target(ProgressDrawTarget::hidden());

        let visible = Arc::new(AtomicBool::new(false));
        let visible_after = Instant::now() + delay;
        let callback = Arc::new(Mutex::new(Box::new(|| (0u64, 0u64, String::new())) as ProgressCallback));

        Self {
            refresh_task: Arc::new(tokio::spawn(refresh(
                bar.clone(),
                visible_after,
                Arc::clone(&visible),
                Arc::clone(&callback),
            ))),
            bar,
            visible_after,
            visible,
            callback,
            use_colors,
        }
    }

    fn apply_style(&self, template: &str, template_no_color: &str, spinner: bool) {
        let template = if self.use_colors { template } else { template_no_color };
        let style = if spinner {
            ProgressStyle::default_spinner()
                .template(template)
                .expect("progress template is valid")
                .tick_strings(SPINNER_FRAMES)
        } else {
            ProgressStyle::default_bar()
                .template(template)
                .expect("progress template is valid")
                .progress_chars("=> ")
        };
        self.bar.set_style(style);
    }
}

impl Progress for ProgressReporter {
    fn set_phase(&self, phase: &str) {
        self.bar.set_prefix(phase.to_string());
    }

    fn set_determinate(&self, callback: Box<dyn Fn() -> (u64, u64, String) + Send + Sync + 'static>) {
        *self.callback.lock().expect("lock poisoned") = callback;
        self.bar.set_length(0);
        self.bar.set_position(0);
        self.apply_style(BAR_TEMPLATE, BAR_TEMPLATE_NO_COLOR, false);
    }

    fn set_indeterminate(&self, callback: Box<dyn Fn() -> String + Send + Sync + 'static>) {
        *self.callback.lock().expect("lock poisoned") = Box::new(move || (0, 0, callback()));
        self.apply_style(SPINNER_TEMPLATE, SPINNER_TEMPLATE_NO_COLOR, true);
    }

    fn println(&self, msg: &str) {
        self.bar.suspend(|| eprintln!("{msg}"));
    }

    fn done(&self) {
        self.refresh_task.abort();
        if self.visible.load(Ordering::Relaxed) {
            self.bar.finish_and_clear();
        }
    }
}

impl Debug for ProgressReporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("bar", &self.bar)
            .field("visible_after", &self.visible_after)
            .field("visible", &self.visible)
            .field("use_colors", &self.use_colors)
            .finish_non_exhaustive()
    }
}

/// Background task that periodically redraws the bar from the callback.
async fn refresh(bar: ProgressBar, visible_after: Instant, visible: Arc<AtomicBool>, callback: Arc<Mutex<ProgressCallback>>) {
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    loop {
        let _ = interval.tick().await;

        if !visible.load(Ordering::Relaxed) {
            if Instant::now() < visible_after {
                continue;
            }
            visible.store(true, Ordering::Relaxed);
            bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
            bar.tick();
        }

        let (length, position, message) = {
            let callback = callback.lock().expect("lock poisoned");
            callback()
        };

        if length > 0 {
            bar.set_length(length);
            bar.set_position(position);
        }
        bar.set_message(message);
    }
}

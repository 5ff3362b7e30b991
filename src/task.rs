use std::fmt::Debug;
use std::time::Instant;

#[cfg(feature = "live")]
use std::sync::Arc;

use camino::Utf8Path;
use console::style;
use glob::{MatchOptions, Pattern};

use crate::error::TaskError;
use crate::layout::Layout;

#[cfg(feature = "live")]
use crate::reload::ReloadHub;

/// This value controls whether a task runs as part of a one-shot `Build` or
/// inside the `Watch` loop. In `Watch` mode tasks have access to the
/// live-reload channel and the pages task references the reload client
/// script in its output.
#[derive(Debug, Clone, Copy)]
pub enum Mode {
    /// One-shot build, no reload channel.
    Build,
    /// Watch loop with a live-reload channel and a dev server.
    Watch,
}

/// A notification pushed to connected browsers. Best-effort, no
/// acknowledgement or retry.
#[derive(Debug, Clone)]
pub enum Signal {
    /// Full page reload.
    Reload,
    /// Swap the stylesheet at the given output-relative path in place.
    Styles(String),
}

/// Everything a task needs to run: the tree layout, the mode, and (in watch
/// mode) the reload channel.
pub struct Context {
    pub layout: Layout,
    pub mode: Mode,
    pub port: Option<u16>,
    #[cfg(feature = "live")]
    hub: Option<Arc<ReloadHub>>,
}

impl Context {
    pub fn build(layout: Layout) -> Self {
        Self {
            layout,
            mode: Mode::Build,
            port: None,
            #[cfg(feature = "live")]
            hub: None,
        }
    }

    #[cfg(feature = "live")]
    pub(crate) fn watch(layout: Layout, port: u16, hub: Arc<ReloadHub>) -> Self {
        Self {
            layout,
            mode: Mode::Watch,
            port: Some(port),
            hub: Some(hub),
        }
    }

    /// Push a signal to the live-reload channel. Outside watch mode this is
    /// a no-op.
    pub fn notify(&self, signal: Signal) {
        #[cfg(feature = "live")]
        if let Some(hub) = &self.hub {
            hub.send(signal);
        }

        #[cfg(not(feature = "live"))]
        let _ = signal;
    }
}

type TaskFn = Box<dyn Fn(&Context) -> Result<(), TaskError> + Send + Sync>;

/// A named build step: one adapter chain applied to a glob-matched input
/// set, plus the watch bindings that re-run it.
pub struct Task {
    pub name: &'static str,
    func: TaskFn,
    watched: Vec<Pattern>,
    reload: bool,
}

impl Task {
    pub fn new<F>(
        name: &'static str,
        watched: &[&str],
        reload: bool,
        func: F,
    ) -> Result<Self, glob::PatternError>
    where
        F: Fn(&Context) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        Ok(Self {
            name,
            func: Box::new(func),
            watched: watched
                .iter()
                .map(|p| Pattern::new(p))
                .collect::<Result<_, _>>()?,
            reload,
        })
    }

    pub fn run(&self, ctx: &Context) -> Result<(), TaskError> {
        let s = Instant::now();

        (self.func)(ctx)?;

        eprintln!(
            "Finished {} {}",
            style(self.name).green(),
            crate::io::as_overhead(s)
        );

        Ok(())
    }

    /// Whether a change to `path` (relative to the project root) re-runs
    /// this task.
    pub fn is_dirty(&self, path: &Utf8Path) -> bool {
        let opts = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::default()
        };

        self.watched
            .iter()
            .any(|p| p.matches_with(path.as_str(), opts))
    }

    /// Whether the watch controller should trigger a full browser reload
    /// after this task completes.
    pub fn reloads_page(&self) -> bool {
        self.reload
    }
}

impl Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task({})", self.name)
    }
}

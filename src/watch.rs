use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use notify::{EventKind, RecursiveMode};
use notify_debouncer_full::new_debouncer;

use crate::error::{AtelierError, WatchError};
use crate::layout::Layout;
use crate::pipeline::{Pipeline, Step};
use crate::reload;
use crate::task::{Context, Signal};

const PORT_PLACEHOLDER: &str = "__ATELIER_PORT__";

/// Run the initial sequence, then keep re-running tasks whose watch
/// bindings match file-system changes, pushing reload signals to connected
/// browsers. A failed task leaves stale output and the loop alive.
pub fn watch(pipeline: &Pipeline, initial: &Step, layout: Layout) -> Result<(), AtelierError> {
    let root = layout.root.canonicalize_utf8().map_err(WatchError::Io)?;

    let (hub, port) = reload::start()?;
    let ctx = Context::watch(layout, port, hub);

    pipeline.run(initial, &ctx)?;
    write_reload_client(&ctx, port).map_err(WatchError::Io)?;

    #[cfg(feature = "serve")]
    let _http = crate::serve::start(ctx.layout.out());

    let (tx, rx) = mpsc::channel();
    let mut debouncer =
        new_debouncer(Duration::from_millis(250), None, tx).map_err(WatchError::Notify)?;
    debouncer
        .watch(ctx.layout.src().as_std_path(), RecursiveMode::Recursive)
        .map_err(WatchError::Notify)?;

    eprintln!("Watching {} for changes", ctx.layout.src());

    for result in rx {
        let events = match result {
            Ok(events) => events,
            Err(errors) => {
                for e in errors {
                    tracing::error!("watch error: {e}");
                }
                continue;
            }
        };

        let changed: HashSet<Utf8PathBuf> = events
            .iter()
            .filter(|de| {
                matches!(
                    de.event.kind,
                    EventKind::Create(..) | EventKind::Modify(..) | EventKind::Remove(..)
                )
            })
            .flat_map(|de| &de.event.paths)
            .filter_map(|path| relative_to(path, &root))
            .collect();

        if changed.is_empty() {
            continue;
        }

        // One event batch at a time; dirty tasks run sequentially in
        // registry order.
        for task in pipeline.tasks() {
            if !changed.iter().any(|path| task.is_dirty(path)) {
                continue;
            }

            let s = Instant::now();

            match task.run(&ctx) {
                Ok(()) => {
                    if task.reloads_page() {
                        ctx.notify(Signal::Reload);
                    }
                    println!("Refreshed in {:?}", s.elapsed());
                }
                Err(e) => tracing::error!("task '{}' failed:\n{e}", task.name),
            }
        }
    }

    Ok(())
}

fn relative_to(path: &Path, root: &Utf8Path) -> Option<Utf8PathBuf> {
    let path = path.strip_prefix(root.as_std_path()).ok()?;
    Utf8PathBuf::try_from(path.to_path_buf()).ok()
}

/// The reload client connects back to the websocket port, so it is written
/// with the reserved port interpolated, into the served tree.
fn write_reload_client(ctx: &Context, port: u16) -> std::io::Result<()> {
    let client = include_str!("embed/reload.js").replace(PORT_PLACEHOLDER, &port.to_string());

    fs::create_dir_all(ctx.layout.out())?;
    fs::write(ctx.layout.reload_client(), client)
}

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::adapter;
use crate::error::BuildError;
use crate::task::{Context, Task};

/// Composition tree for tasks. `Series` runs strictly in order, `Parallel`
/// gives no ordering guarantee; parallel members write disjoint output
/// subtrees, so they need no coordination.
#[derive(Debug, Clone)]
pub enum Step {
    Task(&'static str),
    Series(Vec<Step>),
    Parallel(Vec<Step>),
}

/// The fixed set of named tasks plus the entry sequences composing them.
pub struct Pipeline {
    tasks: Vec<Task>,
}

impl Pipeline {
    /// The standard site pipeline: one task per asset kind, each with its
    /// watch bindings.
    pub fn site() -> Result<Self, glob::PatternError> {
        let tasks = vec![
            Task::new(
                "styles",
                &["src/scss/**/*.scss"],
                false,
                adapter::styles::run,
            )?,
            Task::new("scripts", &["src/js/scripts.js"], false, adapter::scripts::run)?,
            Task::new("fonts", &[], false, adapter::fonts::run)?,
            Task::new("imgmin", &["src/img/*.*"], false, adapter::images::run)?,
            Task::new(
                "svgsprite",
                &["src/img/svg/*.svg"],
                false,
                adapter::sprite::run,
            )?,
            Task::new(
                "pages",
                &[
                    "src/html/components/*.html",
                    "src/html/pages/*.html",
                    "src/*.html",
                ],
                true,
                adapter::pages::run,
            )?,
            Task::new("htmlmin", &[], false, adapter::htmlmin::run)?,
            Task::new("cleaning", &[], false, crate::io::clean_task)?,
        ];

        Ok(Self { tasks })
    }

    #[cfg(test)]
    pub(crate) fn with_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    /// Evaluate a composition tree once.
    pub fn run(&self, step: &Step, ctx: &Context) -> Result<(), BuildError> {
        match step {
            Step::Task(name) => {
                let task = self
                    .get(name)
                    .ok_or_else(|| BuildError::UnknownTask(name.to_string()))?;

                task.run(ctx).map_err(|e| BuildError::Task(task.name, e))
            }
            Step::Series(steps) => steps.iter().try_for_each(|step| self.run(step, ctx)),
            Step::Parallel(steps) => steps.par_iter().try_for_each(|step| self.run(step, ctx)),
        }
    }

    /// Full build: clean, every build task with no ordering guarantee, the
    /// HTML post-process, then (from the binary) watch.
    pub fn full() -> Step {
        Step::Series(vec![
            Step::Task("cleaning"),
            Step::Parallel(vec![
                Step::Task("pages"),
                Step::Task("fonts"),
                Step::Task("styles"),
                Step::Task("imgmin"),
                Step::Task("svgsprite"),
                Step::Task("scripts"),
            ]),
            Step::Task("htmlmin"),
        ])
    }

    /// Fast start: no cleaning, no fonts, no image optimization, no HTML
    /// minification.
    pub fn fast() -> Step {
        Step::Parallel(vec![
            Step::Task("pages"),
            Step::Task("styles"),
            Step::Task("scripts"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use camino::Utf8PathBuf;
    use std::fs;
    use std::sync::{Arc, Mutex};

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Task {
        let log = log.clone();
        Task::new(name, &[], false, move |_| {
            log.lock().unwrap().push(name);
            Ok(())
        })
        .unwrap()
    }

    fn ctx() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, Context::build(Layout::rooted(root)))
    }

    #[test]
    fn series_runs_in_declared_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::with_tasks(vec![
            recorder(&log, "a"),
            recorder(&log, "b"),
            recorder(&log, "c"),
        ]);
        let (_guard, ctx) = ctx();

        let step = Step::Series(vec![Step::Task("c"), Step::Task("a"), Step::Task("b")]);
        pipeline.run(&step, &ctx).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn parallel_runs_every_task_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::with_tasks(vec![
            recorder(&log, "a"),
            recorder(&log, "b"),
            recorder(&log, "c"),
        ]);
        let (_guard, ctx) = ctx();

        let step = Step::Parallel(vec![Step::Task("a"), Step::Task("b"), Step::Task("c")]);
        pipeline.run(&step, &ctx).unwrap();

        let mut ran = log.lock().unwrap().clone();
        ran.sort();
        assert_eq!(ran, vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_task_is_reported() {
        let pipeline = Pipeline::with_tasks(vec![]);
        let (_guard, ctx) = ctx();

        assert!(matches!(
            pipeline.run(&Step::Task("nope"), &ctx),
            Err(BuildError::UnknownTask(_))
        ));
    }

    /// End to end: cleaning followed by the full pipeline reproduces the
    /// documented destination tree with no leftovers from a prior run.
    #[test]
    fn full_pipeline_reproduces_the_destination_tree() {
        let (_guard, ctx) = ctx();
        let layout = &ctx.layout;

        // Sources covering every task.
        fs::create_dir_all(layout.scss_dir()).unwrap();
        fs::write(layout.style_entry(), "body { margin: 0; }").unwrap();

        fs::create_dir_all(layout.src().join("js")).unwrap();
        fs::write(layout.src().join("js/scripts.js"), "window.ready = true;").unwrap();

        fs::create_dir_all(layout.components_dir()).unwrap();
        fs::create_dir_all(layout.pages_dir()).unwrap();
        fs::write(layout.components_dir().join("header.html"), "<header/>").unwrap();
        fs::write(
            layout.src().join("index.html"),
            "<body><!--=include header.html--></body>",
        )
        .unwrap();

        fs::create_dir_all(layout.svg_dir()).unwrap();
        fs::write(
            layout.svg_dir().join("icon.svg"),
            r#"<svg viewBox="0 0 1 1"><rect/></svg>"#,
        )
        .unwrap();

        image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]))
            .save(layout.img_dir().join("dot.png").as_std_path())
            .unwrap();

        // A leftover from a previous run that cleaning must remove.
        crate::io::write_output(&layout.out().join("css/stale.css"), b"old").unwrap();

        let pipeline = Pipeline::site().unwrap();
        pipeline.run(&Pipeline::full(), &ctx).unwrap();

        let out = layout.out();
        assert!(out.join("css/styles.min.css").is_file());
        assert!(out.join("js/scripts.min.js").is_file());
        assert!(out.join("imgmin/dot.png").is_file());
        assert!(out.join("imgmin/sprite.svg").is_file());
        assert!(out.join("index.html").is_file());
        assert!(out.join("htmlmin/index.html").is_file());
        assert!(!out.join("css/stale.css").exists());
    }

    /// Re-running a task with unchanged inputs reproduces identical output.
    #[test]
    fn reruns_are_deterministic() {
        let (_guard, ctx) = ctx();
        let layout = &ctx.layout;

        fs::create_dir_all(layout.scss_dir()).unwrap();
        fs::write(layout.style_entry(), "nav { color: #aabbcc; }").unwrap();

        let pipeline = Pipeline::site().unwrap();
        pipeline.run(&Step::Task("styles"), &ctx).unwrap();
        let first = fs::read(layout.out_css().join("styles.min.css")).unwrap();

        pipeline.run(&Step::Task("styles"), &ctx).unwrap();
        let second = fs::read(layout.out_css().join("styles.min.css")).unwrap();

        assert_eq!(first, second);
    }
}

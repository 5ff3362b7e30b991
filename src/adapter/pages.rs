use std::fs;
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;

use crate::error::{PagesError, TaskError};
use crate::task::{Context, Mode};

/// `<!--=include header.html-->`, resolved against the components
/// directory. Textual splice only: no variables, no loops.
static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--=\s*include\s+([\w./-]+)\s*-->").expect("invalid include regex")
});

const CLIENT_SNIPPET: &str = r#"<script src="/__reload.js"></script>"#;

/// Assemble top-level and pages-directory HTML, splicing include
/// directives, and write the merged files flattened into the output root.
/// In watch mode a reference to the live-reload client is injected.
pub fn run(ctx: &Context) -> Result<(), TaskError> {
    let patterns = [
        format!("{}/*.html", ctx.layout.src()),
        format!("{}/*.html", ctx.layout.pages_dir()),
    ];
    let components = ctx.layout.components_dir();
    let out = ctx.layout.out();

    fs::create_dir_all(&out).map_err(PagesError::Io)?;

    for pattern in &patterns {
        for entry in glob::glob(pattern)? {
            let path = Utf8PathBuf::try_from(entry?)?;
            let source = fs::read_to_string(&path).map_err(PagesError::Io)?;

            let mut stack = Vec::new();
            let mut html = expand(&source, &components, &mut stack)?;

            if matches!(ctx.mode, Mode::Watch) {
                html = inject_client(&html);
            }

            let name = path.file_name().unwrap_or("index.html");
            fs::write(out.join(name), html).map_err(PagesError::Io)?;
        }
    }

    Ok(())
}

/// Recursively splice include directives. The stack holds the chain of
/// components being expanded and turns a cycle into an error instead of
/// infinite recursion.
fn expand(
    source: &str,
    components: &Utf8Path,
    stack: &mut Vec<Utf8PathBuf>,
) -> Result<String, PagesError> {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for caps in INCLUDE.captures_iter(source) {
        let directive = caps.get(0).expect("regex group 0");
        let target = components.join(&caps[1]);

        if stack.contains(&target) {
            return Err(PagesError::IncludeCycle(target));
        }

        let included = match fs::read_to_string(&target) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PagesError::MissingInclude(target));
            }
            Err(e) => return Err(PagesError::Io(e)),
        };

        stack.push(target);
        let nested = expand(&included, components, stack)?;
        stack.pop();

        out.push_str(&source[last..directive.start()]);
        out.push_str(&nested);
        last = directive.end();
    }

    out.push_str(&source[last..]);

    Ok(out)
}

fn inject_client(html: &str) -> String {
    match html.rfind("</body>") {
        Some(at) => format!("{}{}{}", &html[..at], CLIENT_SNIPPET, &html[at..]),
        None => format!("{html}{CLIENT_SNIPPET}"),
    }
}

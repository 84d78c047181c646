//! `render` command implementation.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

use formatter::Formatter;

use super::{input, load_config};
use crate::cli::RenderArgs;

/// Execute the `render` command
pub fn run_render(args: &RenderArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let template = args
        .template
        .clone()
        .unwrap_or_else(|| config.output_template.clone());
    let formatter = Formatter::new(&template, config.format_provider.clone())
        .context("Invalid output template")?;

    info!(input = %args.input, template = %formatter.template(), "Rendering events");

    let reader = input::open(&args.input)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let (rendered, skipped) = render_lines(reader, &formatter, &mut out)?;
    out.flush()?;

    info!(rendered, skipped, "Render finished");
    Ok(())
}

/// Render every event line; unparseable lines are skipped with a warning
fn render_lines(
    reader: impl BufRead,
    formatter: &Formatter,
    out: &mut impl Write,
) -> Result<(u64, u64)> {
    let mut rendered = 0;
    let mut skipped = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        match input::parse_event(idx + 1, &line) {
            Ok(Some(event)) => {
                out.write_all(formatter.format(&event).as_bytes())?;
                rendered += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Skipping line");
                skipped += 1;
            }
        }
    }
    Ok((rendered, skipped))
}

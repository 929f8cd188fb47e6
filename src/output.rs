//! Output formatting for ranked history matches

use crate::index::types::{ScoredMatch, TermMatch};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print matches as `score  url  title`, with matched terms highlighted
pub fn print_matches(matches: &[ScoredMatch], color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_matches(&mut stdout, matches)
}

pub fn write_matches(out: &mut impl WriteColor, matches: &[ScoredMatch]) -> io::Result<()> {
    for m in matches {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{:8.1}", m.raw_score)?;
        out.reset()?;

        if m.can_inline {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
            write!(out, " *")?;
            out.reset()?;
        } else {
            write!(out, "  ")?;
        }
        write!(out, " ")?;

        write_highlighted(out, &m.row.url, &m.url_matches, Color::Cyan)?;
        if !m.row.title.is_empty() {
            write!(out, "  ")?;
            write_highlighted(out, &m.row.title, &m.title_matches, Color::Magenta)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write `text` with `spans` in bold. Spans are offsets into the lower-cased
/// text; when lower-casing changed the byte layout they are not applied.
fn write_highlighted(
    out: &mut impl WriteColor,
    text: &str,
    spans: &[TermMatch],
    base: Color,
) -> io::Result<()> {
    let usable = text.to_lowercase().len() == text.len()
        && spans.iter().all(|s| {
            s.end() <= text.len() && text.is_char_boundary(s.offset) && text.is_char_boundary(s.end())
        });

    let mut plain = ColorSpec::new();
    plain.set_fg(Some(base));
    if !usable {
        out.set_color(&plain)?;
        write!(out, "{}", text)?;
        return out.reset();
    }

    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::Red)).set_bold(true);

    let mut pos = 0;
    for span in spans {
        if span.offset < pos {
            continue;
        }
        if span.offset > pos {
            out.set_color(&plain)?;
            write!(out, "{}", &text[pos..span.offset])?;
        }
        out.set_color(&bold)?;
        write!(out, "{}", &text[span.offset..span.end()])?;
        pos = span.end();
    }
    if pos < text.len() {
        out.set_color(&plain)?;
        write!(out, "{}", &text[pos..])?;
    }
    out.reset()
}

/// Print matches as a JSON array
pub fn print_json(matches: &[ScoredMatch]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, matches)?;
    writeln!(lock)
}

//! Terminal rendering of markdown reports.
//!
//! Rich output goes through termimad. Headings keep their hash marks and are
//! coloured directly; tables and fenced code blocks are handed to termimad as
//! whole blocks so their layout survives; everything else is rendered line
//! by line.

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

/// Terminal renderer that can switch between rich and plain text output
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

/// A piece of markdown rendered in one go.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Heading(&'a str),
    Line(&'a str),
    Block(String),
}

fn segments(markdown: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut block = String::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let fence = line.starts_with("```");
        if in_fence || fence || line.starts_with('|') {
            block.push_str(line);
            block.push('\n');
            if fence {
                in_fence = !in_fence;
            }
            continue;
        }
        if !block.is_empty() {
            segments.push(Segment::Block(std::mem::take(&mut block)));
        }
        if line.starts_with('#') {
            segments.push(Segment::Heading(line));
        } else {
            segments.push(Segment::Line(line));
        }
    }
    if !block.is_empty() {
        segments.push(Segment::Block(block));
    }

    segments
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();

        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.code_block.set_bg(Color::AnsiValue(238));
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Render markdown text to terminal
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        for segment in segments(markdown) {
            match segment {
                Segment::Heading(line) => println!("\x1b[34m{line}\x1b[0m"),
                Segment::Line(line) => {
                    self.skin.print_inline(line);
                    println!();
                }
                Segment::Block(block) => self.skin.print_text(&block),
            }
        }
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

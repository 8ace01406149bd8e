//! Terminal collaborators: width discovery, cursor visibility, and the
//! clear-and-overwrite primitive used for in-place redraws.
//!
//! Everything here is a thin wrapper over `crossterm` so the rest of the crate
//! never emits escape sequences by hand.

use crossterm::cursor::{Hide, MoveToColumn, Show};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use std::io::{self, Write};

/// Width assumed when the process is not attached to a terminal.
pub(crate) const FALLBACK_WIDTH: usize = 80;

/// Samples the terminal width. Called fresh on every render so resizes are
/// picked up without any event handling.
pub(crate) fn width() -> usize {
    terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(FALLBACK_WIDTH)
}

/// Sized adapter over a borrowed trait-object writer; the crossterm macros
/// require a sized `Write` receiver.
struct Out<'a>(&'a mut (dyn Write + Send));

impl Write for Out<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

pub(crate) fn hide_cursor(w: &mut (dyn Write + Send)) -> io::Result<()> {
    let mut out = Out(w);
    execute!(out, Hide)
}

pub(crate) fn show_cursor(w: &mut (dyn Write + Send)) -> io::Result<()> {
    let mut out = Out(w);
    execute!(out, Show)
}

/// Clears the current line, leaving the cursor at column zero.
pub(crate) fn clear_line(w: &mut (dyn Write + Send)) -> io::Result<()> {
    let mut out = Out(w);
    execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))
}

/// Replaces the current line with `line`. The flush matters: without it the
/// redraw is not visible until the next write.
pub(crate) fn overwrite(w: &mut (dyn Write + Send), line: &str) -> io::Result<()> {
    let mut out = Out(w);
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line))?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_ends_with_line_content() {
        let mut buf: Vec<u8> = Vec::new();
        overwrite(&mut buf, "hello").unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.ends_with("hello"));
    }

    #[test]
    fn clear_line_emits_output() {
        let mut buf: Vec<u8> = Vec::new();
        clear_line(&mut buf).unwrap();
        assert!(!buf.is_empty());
    }

    #[test]
    fn helpers_accept_a_trait_object_writer() {
        let mut buf: Vec<u8> = Vec::new();
        let w: &mut (dyn Write + Send) = &mut buf;
        hide_cursor(w).unwrap();
        show_cursor(w).unwrap();
        clear_line(w).unwrap();
        overwrite(w, "done").unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.ends_with("done"));
    }
}

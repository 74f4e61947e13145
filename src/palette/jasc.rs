//! # JASC Palette Files
//!
//! Plain text colour tables:
//!
//! ```text
//! JASC-PAL
//! 0100
//! 16
//! 255 255 255
//! ...
//! ```
//!
//! Blank lines are skipped. Error line numbers refer to the original text.

use crate::error::{Error, Result};

use super::{PaletteTable, Rgb, MAX_COLOURS};

pub const JASC_HEADER: &str = "JASC-PAL";
pub const JASC_VERSION: &str = "0100";

pub fn parse_jasc(text: &str) -> Result<PaletteTable> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());
    let mut last_line = 0;

    let (number, header) = next_line(&mut lines, &mut last_line, "header")?;
    if header != JASC_HEADER {
        return Err(Error::line(
            number,
            format!("expected {:?}, found {:?}", JASC_HEADER, header),
        ));
    }

    // Version string is not checked.
    let _ = next_line(&mut lines, &mut last_line, "version line")?;

    let (number, count) = next_line(&mut lines, &mut last_line, "colour count")?;
    let count: usize = count
        .parse()
        .map_err(|_| Error::line(number, format!("invalid colour count {:?}", count)))?;
    if count > MAX_COLOURS {
        return Err(Error::line(
            number,
            format!("colour count {} exceeds {}", count, MAX_COLOURS),
        ));
    }

    let mut colours = Vec::with_capacity(count);
    for i in 0..count {
        let (number, line) = next_line(
            &mut lines,
            &mut last_line,
            &format!("colour {} of {}", i, count),
        )?;
        colours.push(parse_colour(number, line)?);
    }

    Ok(PaletteTable::new(colours))
}

fn next_line<'a>(
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    last_line: &mut usize,
    what: &str,
) -> Result<(usize, &'a str)> {
    match lines.next() {
        Some((number, line)) => {
            *last_line = number;
            Ok((number, line))
        }
        None => Err(Error::line(*last_line + 1, format!("missing {}", what))),
    }
}

fn parse_colour(number: usize, line: &str) -> Result<Rgb> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(Error::line(
            number,
            format!("expected 3 colour components, found {}", fields.len()),
        ));
    }

    let mut rgb = [0u8; 3];
    for (component, field) in rgb.iter_mut().zip(&fields) {
        *component = field
            .parse()
            .map_err(|_| Error::line(number, format!("invalid colour component {:?}", field)))?;
    }
    Ok(Rgb {
        r: rgb[0],
        g: rgb[1],
        b: rgb[2],
    })
}

pub fn write_jasc(table: &PaletteTable) -> String {
    let mut out = format!("{}\r\n{}\r\n{}\r\n", JASC_HEADER, JASC_VERSION, table.len());
    for colour in table.colours() {
        out.push_str(&format!("{} {} {}\r\n", colour.r, colour.g, colour.b));
    }
    out
}

use std::io::{self, Write};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use galley_recon::{IngredientLine, IngredientRef};

use crate::CliError;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| unicode_width::UnicodeWidthChar::width(*ch).unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Width of the widest entry, capped at `max`.
pub(crate) fn column_width<'a>(items: impl IntoIterator<Item = &'a str>, min: usize, max: usize) -> usize {
    items
        .into_iter()
        .map(display_width)
        .max()
        .unwrap_or(0)
        .clamp(min, max)
}

/// Whole quantities print without a fractional part.
pub(crate) fn format_quantity(q: f64) -> String {
    if q.fract() == 0.0 && q.abs() < 1e15 {
        format!("{}", q as i64)
    } else {
        format!("{}", q)
    }
}

/// Parse `ID=QTY` from `--set`.
pub(crate) fn parse_assignment(raw: &str) -> Result<(i64, f64), CliError> {
    let (id, qty) = raw
        .split_once('=')
        .ok_or_else(|| CliError::usage(format!("expected ID=QTY, got \"{}\"", raw)))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|_| CliError::usage(format!("invalid id \"{}\" in \"{}\"", id.trim(), raw)))?;
    let qty = parse_quantity_arg(qty, raw)?;
    Ok((id, qty))
}

/// Parse `CODE[=QTY]` from `--barcode`. The last `=` splits.
pub(crate) fn parse_barcode_arg(raw: &str) -> Result<(String, Option<f64>), CliError> {
    match raw.rsplit_once('=') {
        Some((code, qty)) => Ok((code.trim().to_string(), Some(parse_quantity_arg(qty, raw)?))),
        None => Ok((raw.trim().to_string(), None)),
    }
}

/// Parse `KIND:ID=QTY` from `--ingredient`, e.g. `product:4=2` or `recipe:20=0.5`.
pub(crate) fn parse_ingredient_arg(raw: &str) -> Result<IngredientLine, CliError> {
    let (target, qty) = raw
        .split_once('=')
        .ok_or_else(|| CliError::usage(format!("expected KIND:ID=QTY, got \"{}\"", raw)))?;
    let ingredient = target.parse::<IngredientRef>().map_err(CliError::usage)?;
    let quantity = parse_quantity_arg(qty, raw)?;
    Ok(IngredientLine { ingredient, quantity })
}

fn parse_quantity_arg(qty: &str, raw: &str) -> Result<f64, CliError> {
    qty.trim()
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| CliError::usage(format!("invalid quantity \"{}\" in \"{}\"", qty.trim(), raw)))
}

/// Ask a yes/no question on stderr. Refuses when stdin is not a TTY.
pub(crate) fn confirm(question: &str) -> Result<bool, CliError> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError::usage("refusing to submit without confirmation (stdin is not a TTY)")
            .with_hint("pass --yes to skip the prompt"));
    }
    eprint!("{} [y/N] ", question);
    io::stderr().flush().ok();

    let mut buf = String::new();
    io::stdin()
        .read_line(&mut buf)
        .map_err(|e| CliError::general(e.to_string()))?;
    Ok(matches!(buf.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Pretty JSON on stdout, exactly one value.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{}", json);
    Ok(())
}

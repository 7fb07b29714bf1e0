/// A command line split into words.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedLine {
    pub argv: Vec<String>,
    /// The line ended in `&`.
    pub background: bool,
}

/// Split `line` on whitespace. A single-quoted run is kept together, quotes removed; an
/// unterminated quote extends to the end of the line. A final `&` word requests background
/// execution and is not part of `argv`.
///
/// Returns `None` for lines without any words.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let mut argv = Vec::new();
    let mut current: Option<String> = None;
    let mut quoted_last = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '\'' => {
                in_quotes = !in_quotes;
                current.get_or_insert_with(String::new);
                quoted_last = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if let Some(word) = current.take() {
                    argv.push((word, quoted_last));
                }
                quoted_last = false;
            }
            c => current.get_or_insert_with(String::new).push(c),
        }
    }
    if let Some(word) = current.take() {
        argv.push((word, quoted_last));
    }

    let background = matches!(argv.last(), Some((word, false)) if word == "&");
    if background {
        argv.pop();
    }

    if argv.is_empty() {
        return None;
    }

    Some(ParsedLine {
        argv: argv.into_iter().map(|(word, _)| word).collect(),
        background,
    })
}

//! Greedy word wrapping shared by the canvas and the column element.

/// Splits `text` into lines no wider than `max_width`.
///
/// Explicit newlines always start a new line; an empty input line yields an empty output line.
/// Words wider than `max_width` on their own are broken between characters. Runs of spaces
/// collapse to a single space.
pub fn wrap_text<F>(text: &str, max_width: f64, width_of: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut lines = Vec::new();
    for source_line in text.split('\n') {
        wrap_line(source_line, max_width, &width_of, &mut lines);
    }
    lines
}

fn wrap_line<F>(line: &str, max_width: f64, width_of: &F, lines: &mut Vec<String>)
where
    F: Fn(&str) -> f64,
{
    let mut current = String::new();
    let mut pushed_any = false;

    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };

        if width_of(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            pushed_any = true;
        }

        if width_of(word) <= max_width {
            current = word.to_owned();
        } else {
            for piece in break_word(word, max_width, width_of) {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    pushed_any = true;
                }
                current = piece;
            }
        }
    }

    if !current.is_empty() || !pushed_any {
        lines.push(current);
    }
}

fn break_word<F>(word: &str, max_width: f64, width_of: &F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        // A single character always stays on its line, even when it overflows.
        if width_of(&piece) > max_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

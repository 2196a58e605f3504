//! Cleanup of raw backend text before scoring.

/// (digit, uppercase letter, lowercase letter) pairs that OCR confuses
const CONFUSABLES: [(char, char, char); 5] = [
    ('0', 'O', 'o'),
    ('1', 'I', 'l'),
    ('5', 'S', 's'),
    ('6', 'G', 'G'),
    ('8', 'B', 'B'),
];

/// Normalize whitespace, fix confusable glyphs inside words and numbers, and
/// drop tokens that are nothing but punctuation. Line breaks are kept; blank
/// lines go.
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            line.split_whitespace()
                .filter(|token| token.chars().any(char::is_alphanumeric))
                .map(correct_token)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Correct each alphanumeric run of the token on its own; separators such as
/// hyphens and punctuation pass through.
fn correct_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut run: Vec<char> = Vec::new();

    for c in token.chars() {
        if c.is_alphanumeric() {
            run.push(c);
            continue;
        }
        if !run.is_empty() {
            out.push_str(&correct_run(&run));
            run.clear();
        }
        out.push(c);
    }
    if !run.is_empty() {
        out.push_str(&correct_run(&run));
    }
    out
}

/// A run is rewritten only when a single character disagrees with an
/// otherwise uniform word or number.
///
/// A stray letter must sit between digits (`1O5`). A stray digit may sit
/// anywhere inside a word, or at its edge when the word has a single case
/// (`HELL0`, `5um`). Ordinals like `1st` are left alone.
fn correct_run(run: &[char]) -> String {
    let digits = run.iter().filter(|c| c.is_ascii_digit()).count();
    let letters = run.len() - digits;

    let mut corrected = run.to_vec();
    if digits == 1 && letters >= 2 && !is_ordinal(run) {
        if let Some(i) = run.iter().position(char::is_ascii_digit) {
            if is_interior(i, run.len()) || is_single_case(run) {
                corrected[i] = digit_to_letter(run[i], prefers_uppercase(run));
            }
        }
    } else if letters == 1 && digits >= 2 {
        if let Some(i) = run.iter().position(|c| !c.is_ascii_digit()) {
            if is_interior(i, run.len()) {
                corrected[i] = letter_to_digit(run[i]);
            }
        }
    }
    corrected.into_iter().collect()
}

fn is_interior(index: usize, len: usize) -> bool {
    index > 0 && index + 1 < len
}

fn is_single_case(run: &[char]) -> bool {
    let upper = run.iter().any(|c| c.is_uppercase());
    let lower = run.iter().any(|c| c.is_lowercase());
    !(upper && lower)
}

fn prefers_uppercase(run: &[char]) -> bool {
    let upper = run.iter().filter(|c| c.is_uppercase()).count();
    let lower = run.iter().filter(|c| c.is_lowercase()).count();
    upper > lower
}

/// `1st`, `22nd`, `3RD`, `4th`
fn is_ordinal(run: &[char]) -> bool {
    let digits = run.iter().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || run.len() != digits + 2 {
        return false;
    }
    let suffix: String = run[digits..].iter().collect::<String>().to_ascii_lowercase();
    matches!(suffix.as_str(), "st" | "nd" | "rd" | "th")
}

fn letter_to_digit(c: char) -> char {
    CONFUSABLES
        .iter()
        .find(|(_, upper, lower)| c == *upper || c == *lower)
        .map(|(digit, _, _)| *digit)
        .unwrap_or(c)
}

fn digit_to_letter(c: char, uppercase: bool) -> char {
    CONFUSABLES
        .iter()
        .find(|(digit, _, _)| c == *digit)
        .map(|(_, upper, lower)| if uppercase { *upper } else { *lower })
        .unwrap_or(c)
}

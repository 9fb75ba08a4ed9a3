//! A1-style cell reference helpers.
//!
//! Rows and columns are 1-based everywhere in this crate, matching what a
//! spreadsheet user sees: column `A` is 1, row `1` is the first row.

/// Converts a 1-based column number to its letters: 1 = A, 26 = Z, 27 = AA.
/// Returns an empty string for column 0.
pub fn column_to_letters(column: u32) -> String {
    let mut letters = Vec::new();
    let mut rest = column;
    while rest > 0 {
        let digit = (rest - 1) % 26;
        letters.push(char::from(b'A' + digit as u8));
        rest = (rest - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Parses column letters (case-insensitive) to a 1-based column number.
/// Returns None for empty input or non-letter characters.
pub fn letters_to_column(letters: &str) -> Option<u32> {
    if letters.is_empty() || !letters.chars().all(|letter| letter.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .bytes()
        .map(|letter| u32::from(letter - b'A') + 1)
        .try_fold(0u32, |column, digit| column.checked_mul(26)?.checked_add(digit))
}

/// Parses a 1-based row number; zero is rejected.
pub fn parse_row(number: &str) -> Option<u32> {
    number.parse().ok().filter(|row| *row > 0)
}

/// Returns the A1 reference of a cell (e.g., "A1", "C12").
pub fn cell_reference(row: u32, column: u32) -> String {
    format!("{}{}", column_to_letters(column), row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_to_letters(0), "");
        assert_eq!(column_to_letters(1), "A");
        assert_eq!(column_to_letters(26), "Z");
        assert_eq!(column_to_letters(27), "AA");
        assert_eq!(column_to_letters(52), "AZ");
        assert_eq!(column_to_letters(53), "BA");
        assert_eq!(column_to_letters(702), "ZZ");
        assert_eq!(column_to_letters(703), "AAA");
    }

    #[test]
    fn letters_column() {
        assert_eq!(letters_to_column("A"), Some(1));
        assert_eq!(letters_to_column("z"), Some(26));
        assert_eq!(letters_to_column("AA"), Some(27));
        assert_eq!(letters_to_column("ba"), Some(53));
        assert_eq!(letters_to_column("AAA"), Some(703));
        assert_eq!(letters_to_column(""), None);
        assert_eq!(letters_to_column("A1"), None);
    }

    #[test]
    fn rows_and_references() {
        assert_eq!(parse_row("1"), Some(1));
        assert_eq!(parse_row("0"), None);
        assert_eq!(parse_row(""), None);
        assert_eq!(cell_reference(12, 3), "C12");
    }
}

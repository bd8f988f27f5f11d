//! Multiple-choice option lettering.
//!
//! Option `i` (0-based) is labelled `chr(65 + i)`: A, B, C, ... Both the
//! display and the submitted answer use the letter, never the option text.

/// Letter for the option at `index`, or `None` past `Z`.
pub fn option_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
}

/// Inverse of [`option_letter`]. Only a single uppercase ASCII letter maps.
pub fn letter_index(letter: &str) -> Option<usize> {
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some((c as u8 - b'A') as usize),
        _ => None,
    }
}

/// Letters valid for a question with `option_count` options.
pub fn valid_letters(option_count: usize) -> Vec<String> {
    (0..option_count)
        .filter_map(option_letter)
        .map(String::from)
        .collect()
}

/// Whether `answer` names one of `option_count` options.
pub fn is_valid_letter(answer: &str, option_count: usize) -> bool {
    letter_index(answer).is_some_and(|i| i < option_count)
}

/// Pair every option with its letter.
pub fn lettered_options(options: &[String]) -> Vec<(char, &str)> {
    options
        .iter()
        .enumerate()
        .filter_map(|(i, text)| option_letter(i).map(|l| (l, text.as_str())))
        .collect()
}

/// Abbreviations that end with a period but do not end a sentence.
const ABBREVIATIONS: [&str; 12] = [
    "mr", "mrs", "ms", "dr", "prof", "vs", "etc", "e.g", "i.e", "fig", "no", "al",
];

/// Splits text into sentences on `.`, `!`, or `?` (plus any trailing closing
/// quote or bracket) followed by whitespace and a capital, digit, or opening
/// quote. A short abbreviation list guards the common false boundaries.
///
/// Deliberately modest: word-budget chunking only needs boundaries that are
/// right most of the time, not a full segmenter.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut position = 0;

    while position < chars.len() {
        let current = chars[position];
        if current == '.' || current == '!' || current == '?' {
            let mut end = position + 1;
            while end < chars.len() && matches!(chars[end], '"' | '\'' | ')' | ']' | '\u{201d}') {
                end += 1;
            }

            let next_non_space = chars[end..].iter().position(|c| !c.is_whitespace());
            let boundary = match next_non_space {
                None => true,
                Some(0) => false,
                Some(offset) => {
                    let opener = chars[end + offset];
                    opener.is_uppercase()
                        || opener.is_ascii_digit()
                        || matches!(opener, '"' | '\u{201c}')
                }
            };

            if boundary && !(current == '.' && ends_with_abbreviation(&chars[start..position])) {
                let sentence: String = chars[start..end].iter().collect();
                let sentence = sentence.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                while end < chars.len() && chars[end].is_whitespace() {
                    end += 1;
                }
                start = end;
                position = end;
                continue;
            }
        }
        position += 1;
    }

    if start < chars.len() {
        let tail: String = chars[start..].iter().collect();
        let tail = tail.trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
    }

    sentences
}

fn ends_with_abbreviation(chars: &[char]) -> bool {
    let last_word: String = chars
        .iter()
        .rev()
        .take_while(|c| !c.is_whitespace())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let last_word = last_word.to_lowercase();
    ABBREVIATIONS
        .iter()
        .any(|abbreviation| last_word == *abbreviation)
}

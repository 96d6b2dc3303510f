use phf::phf_map;

static MORSE_TABLE: phf::Map<char, &'static str> = phf_map! {
    'A' => ".-",
    'B' => "-...",
    'C' => "-.-.",
    'D' => "-..",
    'E' => ".",
    'F' => "..-.",
    'G' => "--.",
    'H' => "....",
    'I' => "..",
    'J' => ".---",
    'K' => "-.-",
    'L' => ".-..",
    'M' => "--",
    'N' => "-.",
    'O' => "---",
    'P' => ".--.",
    'Q' => "--.-",
    'R' => ".-.",
    'S' => "...",
    'T' => "-",
    'U' => "..-",
    'V' => "...-",
    'W' => ".--",
    'X' => "-..-",
    'Y' => "-.--",
    'Z' => "--..",
    '0' => "-----",
    '1' => ".----",
    '2' => "..---",
    '3' => "...--",
    '4' => "....-",
    '5' => ".....",
    '6' => "-....",
    '7' => "--...",
    '8' => "---..",
    '9' => "----.",
    '.' => ".-.-.-",
    ',' => "--..--",
    '?' => "..--..",
    '\'' => ".----.",
    '!' => "-.-.--",
    '/' => "-..-.",
    '(' => "-.--.",
    ')' => "-.--.-",
    '&' => ".-...",
    ':' => "---...",
    ';' => "-.-.-.",
    '=' => "-...-",
    '+' => ".-.-.",
    '-' => "-....-",
    '_' => "..--.-",
    '"' => ".-..-.",
    '$' => "...-..-",
    '@' => ".--.-.",
};

/// One element of an encoded line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MorseSymbol {
    Dot,
    Dash,
    /// Separates two characters of the same word.
    LetterGap,
    /// Emitted for each space in the input.
    WordGap,
}

/// An encoded line of text, ready for playback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MorseLine {
    symbols: Vec<MorseSymbol>,
    display: String,
}

impl MorseLine {
    pub fn symbols(&self) -> &[MorseSymbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Human-readable dots and dashes, one space between characters.
    ///
    /// A word gap renders as an empty token, so "SOS " becomes `"... --- ... "`.
    /// Only used for diagnostics; playback never reads it.
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn iter(&self) -> impl Iterator<Item = MorseSymbol> + '_ {
        self.symbols.iter().copied()
    }
}

impl<'a> IntoIterator for &'a MorseLine {
    type Item = &'a MorseSymbol;
    type IntoIter = std::slice::Iter<'a, MorseSymbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}

/// Look up the dot/dash pattern for a character, ignoring ASCII case.
pub fn pattern(ch: char) -> Option<&'static str> {
    MORSE_TABLE.get(&ch.to_ascii_uppercase()).copied()
}

/// Encode text into Morse symbols.
///
/// Characters missing from the table are dropped without breaking the word they
/// appear in. Encoding never fails.
pub fn encode(text: &str) -> MorseLine {
    let mut symbols = Vec::new();
    let mut tokens: Vec<&'static str> = Vec::new();
    let mut last_was_letter = false;

    for ch in text.chars() {
        if ch == ' ' {
            symbols.push(MorseSymbol::WordGap);
            tokens.push("");
            last_was_letter = false;
            continue;
        }

        let Some(pattern) = pattern(ch) else {
            continue;
        };

        if last_was_letter {
            symbols.push(MorseSymbol::LetterGap);
        }
        emit_symbol(&mut symbols, pattern);
        tokens.push(pattern);
        last_was_letter = true;
    }

    MorseLine {
        symbols,
        display: tokens.join(" "),
    }
}

fn emit_symbol(symbols: &mut Vec<MorseSymbol>, pattern: &str) {
    for mark in pattern.chars() {
        match mark {
            '.' => symbols.push(MorseSymbol::Dot),
            '-' => symbols.push(MorseSymbol::Dash),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MorseSymbol::*;

    fn marks(line: &MorseLine) -> String {
        line.iter()
            .map(|s| match s {
                Dot => '.',
                Dash => '-',
                LetterGap => '|',
                WordGap => '/',
            })
            .collect()
    }

    #[test]
    fn sos_symbols() {
        let line = encode("SOS");
        assert_eq!(
            line.symbols(),
            &[Dot, Dot, Dot, LetterGap, Dash, Dash, Dash, LetterGap, Dot, Dot, Dot]
        );
    }

    #[test]
    fn every_table_entry_encodes_to_its_pattern() {
        for (ch, expected) in MORSE_TABLE.entries() {
            let upper = encode(&ch.to_string());
            assert_eq!(&marks(&upper), expected, "character {:?}", ch);
            let lower = encode(&ch.to_ascii_lowercase().to_string());
            assert_eq!(upper, lower);
        }
    }

    #[test]
    fn unmapped_characters_are_dropped() {
        for ch in ['#', '%', '\t', '\n', 'é', '\u{263A}'] {
            assert!(encode(&ch.to_string()).is_empty(), "character {:?}", ch);
        }
        assert_eq!(marks(&encode("E#T")), ".|-");
    }

    #[test]
    fn empty_input_is_empty_line() {
        let line = encode("");
        assert!(line.is_empty());
        assert_eq!(line.display(), "");
    }

    #[test]
    fn space_is_word_gap_without_letter_gaps() {
        assert_eq!(marks(&encode("E T")), "./-");
        assert_eq!(marks(&encode(" E ")), "/./");
    }

    #[test]
    fn display_separates_characters() {
        assert_eq!(encode("SOS ").display(), "... --- ... ");
        assert_eq!(encode("a b").display(), ".-  -...");
        assert_eq!(encode("cq\n").display(), "-.-. --.-");
    }
}

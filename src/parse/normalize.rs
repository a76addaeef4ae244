/// Canonical form of a raw paragraph: ASCII punctuation, single spaces,
/// and optionally accented vowels restored from `<vowel>'`.
#[derive(Debug, Clone, Copy)]
pub struct TextNormalizer {
    repair_accents: bool,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self {
            repair_accents: true,
        }
    }
}

impl TextNormalizer {
    pub fn new(repair_accents: bool) -> Self {
        Self { repair_accents }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let ascii = raw
            .chars()
            .map(canonical_punctuation)
            .collect::<String>();
        let collapsed = ascii.split_whitespace().collect::<Vec<&str>>().join(" ");

        if self.repair_accents {
            repair_accented_vowels(&collapsed)
        } else {
            collapsed
        }
    }
}

fn canonical_punctuation(ch: char) -> char {
    match ch {
        '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
        '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{00B4}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}' => '"',
        other => other,
    }
}

// Word processors that lost the accent leave `perche'`, `c'e'`, `citta'`.
// Only an apostrophe closing a word is rewritten, so elisions such as
// `dell'impianto` stay untouched, and so does a word quoted as `'casa'`.
fn repair_accented_vowels(text: &str) -> String {
    let chars = text.chars().collect::<Vec<char>>();
    let mut out = String::with_capacity(text.len());
    let mut index = 0;
    let mut quoted_word = false;

    while index < chars.len() {
        let ch = chars[index];
        if index == 0 || chars[index - 1].is_whitespace() {
            quoted_word = ch == '\'';
        }

        let closes_word = !quoted_word
            && chars.get(index + 1) == Some(&'\'')
            && chars
                .get(index + 2)
                .map(|next| !next.is_alphanumeric())
                .unwrap_or(true);

        match accented(ch) {
            Some(replacement) if closes_word => {
                out.push(replacement);
                index += 2;
            }
            _ => {
                out.push(ch);
                index += 1;
            }
        }
    }

    out
}

fn accented(vowel: char) -> Option<char> {
    match vowel {
        'a' => Some('à'),
        'e' => Some('è'),
        'i' => Some('ì'),
        'o' => Some('ò'),
        'u' => Some('ù'),
        'A' => Some('À'),
        'E' => Some('È'),
        'I' => Some('Ì'),
        'O' => Some('Ò'),
        'U' => Some('Ù'),
        _ => None,
    }
}

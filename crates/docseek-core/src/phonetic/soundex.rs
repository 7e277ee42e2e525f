//! American Soundex.

use super::{PhoneticEncoder, fold_letters};

const CODE_LENGTH: usize = 4;

/// Four-character American Soundex: the first letter followed by three digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Soundex;

fn digit(c: char) -> Option<char> {
    match c {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}

impl PhoneticEncoder for Soundex {
    fn name(&self) -> &'static str {
        "soundex"
    }

    fn encode_word(&self, word: &str) -> String {
        let letters = fold_letters(word);
        let Some((&first, rest)) = letters.split_first() else {
            return String::new();
        };

        let mut code = String::with_capacity(CODE_LENGTH);
        code.push(first.to_ascii_uppercase());
        let mut last = digit(first);

        for &c in rest {
            if code.len() == CODE_LENGTH {
                break;
            }
            // h and w neither code nor separate
            if c == 'h' || c == 'w' {
                continue;
            }
            let d = digit(c);
            if let Some(d) = d {
                if last != Some(d) {
                    code.push(d);
                }
            }
            last = d;
        }

        while code.len() < CODE_LENGTH {
            code.push('0');
        }
        code
    }
}

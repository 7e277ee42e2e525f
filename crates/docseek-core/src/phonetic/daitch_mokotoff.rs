//! Daitch-Mokotoff Soundex.
//!
//! Letter combinations are matched longest-first against a rule table. Each
//! rule has three codes: at the start of the word, before a vowel, and
//! elsewhere. Codes containing `|` are ambiguous and fork the encoding into
//! parallel branches.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::{PhoneticEncoder, fold_letters};

const CODE_LENGTH: usize = 6;
const FILL: char = '0';

/// Upper bound on code combinations produced for multi-word text.
const MAX_COMBINATIONS: usize = 64;

struct Rule {
    pattern: &'static str,
    at_start: &'static str,
    before_vowel: &'static str,
    other: &'static str,
}

impl Rule {
    fn codes(&self, at_start: bool, next_is_vowel: bool) -> Vec<&'static str> {
        let codes = if at_start {
            self.at_start
        } else if next_is_vowel {
            self.before_vowel
        } else {
            self.other
        };
        codes.split('|').collect()
    }
}

macro_rules! rules {
    ($(($pattern:literal, $start:literal, $vowel:literal, $other:literal)),* $(,)?) => {
        vec![$(Rule { pattern: $pattern, at_start: $start, before_vowel: $vowel, other: $other }),*]
    };
}

lazy_static! {
    /// Rules keyed by first letter, longest pattern first.
    static ref RULES: HashMap<char, Vec<Rule>> = {
        let table = rules![
            // vowels
            ("a", "0", "", ""),
            ("ai", "0", "1", ""),
            ("aj", "0", "1", ""),
            ("ay", "0", "1", ""),
            ("au", "0", "7", ""),
            ("e", "0", "", ""),
            ("ei", "0", "1", ""),
            ("ej", "0", "1", ""),
            ("ey", "0", "1", ""),
            ("eu", "1", "1", ""),
            ("i", "0", "", ""),
            ("ia", "1", "", ""),
            ("ie", "1", "", ""),
            ("io", "1", "", ""),
            ("iu", "1", "", ""),
            ("o", "0", "", ""),
            ("oi", "0", "1", ""),
            ("oj", "0", "1", ""),
            ("oy", "0", "1", ""),
            ("u", "0", "", ""),
            ("ue", "0", "", ""),
            ("ui", "0", "1", ""),
            ("uj", "0", "1", ""),
            ("uy", "0", "1", ""),
            ("y", "1", "", ""),
            // consonants
            ("b", "7", "7", "7"),
            ("c", "5|4", "5|4", "5|4"),
            ("ch", "5|4", "5|4", "5|4"),
            ("chs", "5", "54", "54"),
            ("ck", "5|45", "5|45", "5|45"),
            ("cs", "4", "4", "4"),
            ("csz", "4", "4", "4"),
            ("cz", "4", "4", "4"),
            ("czs", "4", "4", "4"),
            ("d", "3", "3", "3"),
            ("drs", "4", "4", "4"),
            ("drz", "4", "4", "4"),
            ("ds", "4", "4", "4"),
            ("dsh", "4", "4", "4"),
            ("dsz", "4", "4", "4"),
            ("dt", "3", "3", "3"),
            ("dz", "4", "4", "4"),
            ("dzh", "4", "4", "4"),
            ("dzs", "4", "4", "4"),
            ("f", "7", "7", "7"),
            ("fb", "7", "7", "7"),
            ("g", "5", "5", "5"),
            ("h", "5", "5", ""),
            ("j", "1|4", "|4", "|4"),
            ("k", "5", "5", "5"),
            ("kh", "5", "5", "5"),
            ("ks", "5", "54", "54"),
            ("l", "8", "8", "8"),
            ("m", "6", "6", "6"),
            ("mn", "66", "66", "66"),
            ("n", "6", "6", "6"),
            ("nm", "66", "66", "66"),
            ("p", "7", "7", "7"),
            ("pf", "7", "7", "7"),
            ("ph", "7", "7", "7"),
            ("q", "5", "5", "5"),
            ("r", "9", "9", "9"),
            ("rs", "94|4", "94|4", "94|4"),
            ("rz", "94|4", "94|4", "94|4"),
            ("s", "4", "4", "4"),
            ("sc", "2", "4", "4"),
            ("sch", "4", "4", "4"),
            ("schd", "2", "43", "43"),
            ("scht", "2", "43", "43"),
            ("schtch", "2", "4", "4"),
            ("schtsch", "2", "4", "4"),
            ("schtsh", "2", "4", "4"),
            ("sd", "2", "43", "43"),
            ("sh", "4", "4", "4"),
            ("shch", "2", "4", "4"),
            ("shd", "2", "43", "43"),
            ("sht", "2", "43", "43"),
            ("shtch", "2", "4", "4"),
            ("shtsh", "2", "4", "4"),
            ("st", "2", "43", "43"),
            ("stch", "2", "4", "4"),
            ("strs", "2", "4", "4"),
            ("strz", "2", "4", "4"),
            ("stsch", "2", "4", "4"),
            ("stsh", "2", "4", "4"),
            ("sz", "4", "4", "4"),
            ("szcz", "2", "4", "4"),
            ("szcs", "2", "4", "4"),
            ("szd", "2", "43", "43"),
            ("szt", "2", "43", "43"),
            ("t", "3", "3", "3"),
            ("tc", "4", "4", "4"),
            ("tch", "4", "4", "4"),
            ("th", "3", "3", "3"),
            ("trs", "4", "4", "4"),
            ("trz", "4", "4", "4"),
            ("ts", "4", "4", "4"),
            ("tsch", "4", "4", "4"),
            ("tsh", "4", "4", "4"),
            ("tsz", "4", "4", "4"),
            ("ttch", "4", "4", "4"),
            ("ttsch", "4", "4", "4"),
            ("ttsz", "4", "4", "4"),
            ("ttz", "4", "4", "4"),
            ("tz", "4", "4", "4"),
            ("tzs", "4", "4", "4"),
            ("v", "7", "7", "7"),
            ("w", "7", "7", "7"),
            ("x", "5", "54", "54"),
            ("z", "4", "4", "4"),
            ("zd", "2", "43", "43"),
            ("zdzh", "2", "4", "4"),
            ("zh", "4", "4", "4"),
            ("zhd", "2", "43", "43"),
            ("zhdzh", "2", "4", "4"),
            ("zs", "4", "4", "4"),
            ("zsch", "4", "4", "4"),
            ("zsh", "4", "4", "4"),
        ];

        let mut rules: HashMap<char, Vec<Rule>> = HashMap::new();
        for rule in table {
            if let Some(first) = rule.pattern.chars().next() {
                rules.entry(first).or_default().push(rule);
            }
        }
        for list in rules.values_mut() {
            list.sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
        }
        rules
    };
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// One partial encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Branch {
    code: String,
    last: Option<&'static str>,
}

impl Branch {
    fn push(&mut self, replacement: &'static str, force: bool) {
        // identical consecutive codes collapse; an empty (vowel) code resets
        let append = match self.last {
            None => true,
            Some(last) => !last.ends_with(replacement) || force,
        };
        if append && self.code.len() < CODE_LENGTH {
            self.code.push_str(replacement);
            self.code.truncate(CODE_LENGTH);
        }
        self.last = Some(replacement);
    }

    fn finish(mut self) -> String {
        while self.code.len() < CODE_LENGTH {
            self.code.push(FILL);
        }
        self.code
    }
}

/// Daitch-Mokotoff Soundex producing six-digit codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaitchMokotoff;

impl DaitchMokotoff {
    /// Every code an ambiguous word can take, primary code first.
    pub fn encode_branches(&self, word: &str) -> Vec<String> {
        encode_letters(&fold_letters(word), true)
    }
}

impl PhoneticEncoder for DaitchMokotoff {
    fn name(&self) -> &'static str {
        "daitch_mokotoff"
    }

    fn encode_word(&self, word: &str) -> String {
        encode_letters(&fold_letters(word), false)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Combine the branches of every word. Primary codes come first and the
    /// combinations are capped at [`MAX_COMBINATIONS`].
    fn codes(&self, text: &str) -> Vec<String> {
        let mut combined = vec![String::new()];
        for word in text.split_whitespace() {
            let branches = self.encode_branches(word);
            if branches.is_empty() {
                continue;
            }
            let mut next = Vec::with_capacity(combined.len() * branches.len());
            'outer: for prefix in &combined {
                for code in &branches {
                    if next.len() == MAX_COMBINATIONS {
                        break 'outer;
                    }
                    next.push(if prefix.is_empty() {
                        code.clone()
                    } else {
                        format!("{prefix} {code}")
                    });
                }
            }
            combined = next;
        }
        combined
    }
}

fn encode_letters(input: &[char], branching: bool) -> Vec<String> {
    if input.is_empty() {
        return Vec::new();
    }

    let mut branches = vec![Branch::default()];
    let mut last_char: Option<char> = None;
    let mut index = 0;

    while index < input.len() {
        let ch = input[index];
        let rule = RULES.get(&ch).and_then(|rules| {
            rules.iter().find(|rule| {
                let len = rule.pattern.len();
                index + len <= input.len()
                    && rule.pattern.chars().eq(input[index..index + len].iter().copied())
            })
        });
        let Some(rule) = rule else {
            index += 1;
            continue;
        };

        let next = input.get(index + rule.pattern.len()).copied();
        let codes = rule.codes(last_char.is_none(), next.is_some_and(is_vowel));
        let force = matches!((last_char, ch), (Some('m'), 'n') | (Some('n'), 'm'));

        if branching && codes.len() > 1 {
            let mut next_branches = Vec::with_capacity(branches.len() * codes.len());
            for branch in &branches {
                for &code in &codes {
                    let mut forked = branch.clone();
                    forked.push(code, force);
                    if !next_branches.contains(&forked) {
                        next_branches.push(forked);
                    }
                }
            }
            branches = next_branches;
        } else {
            for branch in &mut branches {
                branch.push(codes[0], force);
            }
        }

        index += rule.pattern.len();
        last_char = Some(ch);
    }

    let mut codes: Vec<String> = Vec::with_capacity(branches.len());
    for code in branches.into_iter().map(Branch::finish) {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

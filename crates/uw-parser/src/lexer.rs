use logos::Logos;
use std::fmt;

/// A lexical token of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A lowercased word. May contain embedded `'` or `-`.
    Word(String),
    /// A run of digits.
    Number(i64),
}

impl Token {
    /// The token as the player typed it, lowercased.
    pub fn text(&self) -> String {
        match self {
            Token::Word(w) => w.clone(),
            Token::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{w}"),
            Token::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Internal logos token; borrows from the input line.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n,.]+")]
enum RawToken {
    #[regex(r"[;!?]")]
    Stop,

    #[regex(r"[0-9]+", priority = 10)]
    Number,

    #[regex(r"[A-Za-z0-9]+(?:['-][A-Za-z0-9]+)*")]
    Word,
}

/// Split one line of input into tokens.
///
/// Words are case-folded. Periods and commas separate words like spaces do,
/// so "Mrs. Robner" lexes as two words. Other stray punctuation is dropped and
/// lexing stops at `;`, `!` or `?`, so only the first command of a line counts.
pub fn lex(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(input);

    while let Some(result) = lexer.next() {
        match result {
            Ok(RawToken::Stop) => break,
            Ok(RawToken::Number) => match lexer.slice().parse::<i64>() {
                Ok(n) => tokens.push(Token::Number(n)),
                Err(_) => tokens.push(Token::Word(lexer.slice().to_string())),
            },
            Ok(RawToken::Word) => tokens.push(Token::Word(lexer.slice().to_lowercase())),
            Err(()) => {}
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<String> {
        lex(input).iter().map(Token::text).collect()
    }

    #[test]
    fn folds_case_and_splits_whitespace() {
        assert_eq!(words("  Take   the NOTE "), ["take", "the", "note"]);
    }

    #[test]
    fn keeps_embedded_apostrophes_and_hyphens() {
        assert_eq!(words("read Robner's note"), ["read", "robner's", "note"]);
        assert_eq!(words("examine well-worn book"), ["examine", "well-worn", "book"]);
    }

    #[test]
    fn strips_stray_punctuation() {
        assert_eq!(words("\"hello\", (there)"), ["hello", "there"]);
        assert_eq!(words("-- north --"), ["north"]);
    }

    #[test]
    fn stops_at_sentence_end() {
        assert_eq!(words("take note; north"), ["take", "note"]);
        assert_eq!(words("wait! look"), ["wait"]);
    }

    #[test]
    fn periods_separate_words() {
        assert_eq!(words("ask Mrs. Robner about the will"), ["ask", "mrs", "robner", "about", "the", "will"]);
        assert_eq!(words("Mr.Dunbar"), ["mr", "dunbar"]);
        assert_eq!(words("look."), ["look"]);
    }

    #[test]
    fn numbers() {
        assert_eq!(lex("wait 30"), vec![Token::Word("wait".into()), Token::Number(30)]);
        assert_eq!(words("room 2b"), ["room", "2b"]);
    }

    #[test]
    fn empty_input() {
        assert!(lex("").is_empty());
        assert!(lex("   ...").is_empty());
    }
}

use std::collections::VecDeque;

use crate::error::{CompileError, Result};

use super::{
    token::{KEYWORDS, SYMBOLS},
    Token, TokenKind,
};

/// Turns the cleaned source lines of one compilation unit into an ordered
/// token sequence. Line comments are assumed to be already stripped by the
/// caller; block comments are handled here, at whole-line granularity.
#[derive(Debug)]
pub struct Tokenizer {
    tokens: Vec<Token>,
    // String literals in file order. Classification consumes the Nth entry
    // for the Nth string-constant token; recovery is positional, not
    // content-matched.
    literals: VecDeque<String>,
}

impl Tokenizer {
    fn new() -> Self {
        Self {
            tokens: vec![],
            literals: VecDeque::new(),
        }
    }

    pub fn tokenize(lines: &[String]) -> Result<Vec<Token>> {
        let mut tokenizer = Tokenizer::new();
        for line in remove_block_comments(lines) {
            let line = tokenizer.compact_literals(&line);
            let line = space_out_symbols(&line);
            tokenizer.classify_line(&line)?;
        }
        Ok(tokenizer.tokens)
    }

    /// Rewrites each string literal with its internal whitespace removed so
    /// it survives whitespace splitting as one pseudo-token, and queues the
    /// original text (spacing preserved, quotes excluded) on the side.
    fn compact_literals(&mut self, line: &str) -> String {
        let mut compacted = String::new();
        let mut literal = String::new();
        let mut in_literal = false;
        for c in line.chars() {
            if c == '"' {
                if in_literal {
                    self.literals.push_back(std::mem::take(&mut literal));
                }
                in_literal = !in_literal;
                compacted.push(c);
            } else if in_literal {
                literal.push(c);
                if c != ' ' {
                    compacted.push(c);
                }
            } else {
                compacted.push(c);
            }
        }
        compacted
    }

    fn classify_line(&mut self, line: &str) -> Result<()> {
        for word in line.split_whitespace() {
            self.classify(word)?;
        }
        Ok(())
    }

    // Classification order: keyword, symbol, integer constant, string
    // constant, identifier.
    fn classify(&mut self, word: &str) -> Result<()> {
        let kind = if let Some(keyword) = KEYWORDS.get(word) {
            TokenKind::Keyword(*keyword)
        } else if let Some(c) = single_symbol(word) {
            TokenKind::Symbol(c)
        } else if is_int_const(word) {
            TokenKind::IntConst(word.to_string())
        } else if is_str_const(word) {
            let text = self
                .literals
                .pop_front()
                .ok_or(CompileError::LiteralUnderrun)?;
            TokenKind::StrConst(text)
        } else {
            TokenKind::Ident(word.to_string())
        };
        self.tokens.push(Token { kind });
        Ok(())
    }
}

/// Drops every line that opens, closes, or sits inside a block comment.
/// Whole-line granularity: code sharing a line with a marker is dropped too.
fn remove_block_comments(lines: &[String]) -> Vec<String> {
    let mut kept = Vec::new();
    let mut in_block = false;
    for line in lines {
        if in_block || line.contains("/*") {
            in_block = !line.contains("*/");
        } else {
            kept.push(line.clone());
        }
    }
    kept
}

/// Pads every symbol with spaces so adjacent identifiers split cleanly.
/// Compacted literal spans are passed through untouched.
fn space_out_symbols(line: &str) -> String {
    let mut spaced = String::new();
    let mut in_literal = false;
    for c in line.chars() {
        if c == '"' {
            in_literal = !in_literal;
            spaced.push(c);
        } else if !in_literal && SYMBOLS.contains(&c) {
            spaced.push(' ');
            spaced.push(c);
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }
    spaced
}

fn single_symbol(word: &str) -> Option<char> {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if SYMBOLS.contains(&c) => Some(c),
        _ => None,
    }
}

/// `-?[0-9]+`, anchored.
fn is_int_const(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// A compacted literal: quote, at least one character, quote.
fn is_str_const(word: &str) -> bool {
    word.len() >= 3 && word.starts_with('"') && word.ends_with('"')
}

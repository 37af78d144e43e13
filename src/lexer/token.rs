use std::fmt;

use phf::{phf_map, phf_set};

/// The reserved words of the source language.
pub static KEYWORDS: phf::Map<&str, Keyword> = phf_map! {
    "class" => Keyword::Class,
    "constructor" => Keyword::Constructor,
    "method" => Keyword::Method,
    "function" => Keyword::Function,
    "field" => Keyword::Field,
    "static" => Keyword::Static,
    "boolean" => Keyword::Boolean,
    "var" => Keyword::Var,
    "int" => Keyword::Int,
    "char" => Keyword::Char,
    "void" => Keyword::Void,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "this" => Keyword::This,
    "let" => Keyword::Let,
    "do" => Keyword::Do,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "return" => Keyword::Return,
};

/// The single-character symbols of the source language.
pub static SYMBOLS: phf::Set<char> = phf_set! {
    '{', '}', '(', ')', '[', ']', '.', ';', ',',
    '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Constructor,
    Method,
    Function,
    Field,
    Static,
    Boolean,
    Var,
    Int,
    Char,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Constructor => "constructor",
            Keyword::Method => "method",
            Keyword::Function => "function",
            Keyword::Field => "field",
            Keyword::Static => "static",
            Keyword::Boolean => "boolean",
            Keyword::Var => "var",
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::Void => "void",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Symbol(char),
    /// Raw digits, emitted verbatim into `push constant` instructions.
    IntConst(String),
    /// The literal's original text, recovered positionally from the
    /// tokenizer's side queue. Never includes the quotes.
    StrConst(String),
    Ident(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(k) => write!(f, "`{}`", k.as_str()),
            TokenKind::Symbol(c) => write!(f, "`{}`", c),
            TokenKind::IntConst(s) => write!(f, "integer constant {}", s),
            TokenKind::StrConst(s) => write!(f, "string constant \"{}\"", s),
            TokenKind::Ident(s) => write!(f, "identifier `{}`", s),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
}

mod token;
mod tokenizer;

pub use token::*;
pub use tokenizer::*;

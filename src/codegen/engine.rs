use crate::error::{CompileError, Result};
use crate::lexer::{Keyword, Token, TokenKind};
use crate::symbol_table::{
    has_entry, lookup_local_then_outer, SymbolEntry, SymbolKind, SymbolTable,
};

use super::{Segment, VmWriter};

/// The output of one compilation unit: the class's name and its VM
/// instructions, in emission order.
#[derive(Debug, PartialEq)]
pub struct CompiledClass {
    pub class_name: String,
    pub instructions: Vec<String>,
}

/// Single-pass recursive descent over the token sequence, emitting VM
/// instructions as a side effect of parsing. One instance per compilation
/// unit; never reused after `compile` returns.
#[derive(Debug)]
pub struct CompilationEngine {
    tokens: Vec<Token>,
    index: usize,
    class_name: String,
    class_table: SymbolTable,
    // Counts field-kind class variables, one per comma-separated name.
    // Every constructor prologue allocates this many words.
    field_count: usize,
    // Label ids are file-scoped, never reset between subroutines.
    if_count: usize,
    while_count: usize,
    writer: VmWriter,
}

impl CompilationEngine {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            class_name: String::new(),
            class_table: SymbolTable::new(),
            field_count: 0,
            if_count: 0,
            while_count: 0,
            writer: VmWriter::new(),
        }
    }

    pub fn compile(mut self) -> Result<CompiledClass> {
        self.compile_class()?;
        Ok(CompiledClass {
            class_name: self.class_name,
            instructions: self.writer.into_instructions(),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn mismatch(&self, expected: &str) -> CompileError {
        let found = match self.peek() {
            Some(t) => t.kind.to_string(),
            None => "end of input".to_string(),
        };
        CompileError::StructuralMismatch {
            expected: expected.to_string(),
            found,
            at: self.index,
        }
    }

    fn peek_symbol(&self, c: char) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Symbol(s) }) if *s == c)
    }

    fn peek_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Keyword(k) }) if *k == keyword)
    }

    fn consume_symbol(&mut self, c: char) -> bool {
        let hit = self.peek_symbol(c);
        if hit {
            self.index += 1;
        }
        hit
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        let hit = self.peek_keyword(keyword);
        if hit {
            self.index += 1;
        }
        hit
    }

    fn expect_symbol(&mut self, c: char) -> Result<()> {
        if self.consume_symbol(c) {
            Ok(())
        } else {
            Err(self.mismatch(&format!("`{}`", c)))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.mismatch(&format!("`{}`", keyword.as_str())))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(name),
            }) => {
                let name = name.clone();
                self.index += 1;
                Ok(name)
            }
            _ => Err(self.mismatch("an identifier")),
        }
    }

    /// A declared type: `int`, `char`, `boolean`, or a class name.
    /// `void` is not a type; it is only accepted as a return type.
    fn expect_type(&mut self) -> Result<String> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Keyword(k),
            }) if matches!(k, Keyword::Int | Keyword::Char | Keyword::Boolean) => {
                let name = k.as_str().to_string();
                self.index += 1;
                Ok(name)
            }
            Some(Token {
                kind: TokenKind::Ident(name),
            }) => {
                let name = name.clone();
                self.index += 1;
                Ok(name)
            }
            _ => Err(self.mismatch("a type name")),
        }
    }

    fn expect_return_type(&mut self) -> Result<String> {
        if self.consume_keyword(Keyword::Void) {
            Ok(Keyword::Void.as_str().to_string())
        } else {
            self.expect_type()
        }
    }

    /// Subroutine table first, then the class table; a miss in both is fatal.
    fn resolve(&self, sub_table: &SymbolTable, name: &str) -> Result<SymbolEntry> {
        lookup_local_then_outer(sub_table, &self.class_table, name).map(|e| e.clone())
    }

    // class -> 'class' Identifier '{' classVarDec* subroutineDec* '}'
    fn compile_class(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Class)?;
        self.class_name = self.expect_ident()?;
        self.expect_symbol('{')?;
        while self.peek_keyword(Keyword::Static) || self.peek_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }
        while self.peek_keyword(Keyword::Constructor)
            || self.peek_keyword(Keyword::Function)
            || self.peek_keyword(Keyword::Method)
        {
            self.compile_subroutine()?;
        }
        self.expect_symbol('}')
    }

    // classVarDec -> ('static'|'field') Type Identifier (',' Identifier)* ';'
    fn compile_class_var_dec(&mut self) -> Result<()> {
        let kind = if self.consume_keyword(Keyword::Static) {
            SymbolKind::Static
        } else {
            self.expect_keyword(Keyword::Field)?;
            SymbolKind::Field
        };
        let declared_type = self.expect_type()?;
        loop {
            let name = self.expect_ident()?;
            self.class_table.add_entry(&name, &declared_type, kind);
            if kind == SymbolKind::Field {
                self.field_count += 1;
            }
            if !self.consume_symbol(',') {
                break;
            }
        }
        self.expect_symbol(';')
    }

    // subroutineDec -> ('constructor'|'function'|'method') (Type|'void')
    //                  Identifier '(' parameterList ')' '{' varDec* statement* '}'
    fn compile_subroutine(&mut self) -> Result<()> {
        let sub_kind = if self.consume_keyword(Keyword::Constructor) {
            Keyword::Constructor
        } else if self.consume_keyword(Keyword::Function) {
            Keyword::Function
        } else {
            self.expect_keyword(Keyword::Method)?;
            Keyword::Method
        };

        let mut sub_table = SymbolTable::new();
        if sub_kind == Keyword::Method {
            // hidden receiver, always argument 0, seeded before any
            // user parameter
            sub_table.add_entry("this", &self.class_name, SymbolKind::Argument);
        }

        let _return_type = self.expect_return_type()?;
        let name = self.expect_ident()?;
        self.expect_symbol('(')?;
        self.compile_parameter_list(&mut sub_table)?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;

        // all locals are declared up front; the count is known before any
        // statement is compiled
        let mut local_count = 0;
        while self.peek_keyword(Keyword::Var) {
            local_count += self.compile_var_dec(&mut sub_table)?;
        }
        self.emit_prologue(sub_kind, &name, local_count);

        self.compile_statements(&sub_table)?;
        self.expect_symbol('}')
    }

    // Constructors declare 0 locals in their header no matter how many they
    // have; methods and functions declare the real count.
    fn emit_prologue(&mut self, sub_kind: Keyword, name: &str, local_count: usize) {
        let qualified = format!("{}.{}", self.class_name, name);
        match sub_kind {
            Keyword::Constructor => {
                self.writer.function(&qualified, 0);
                self.writer.push(Segment::Constant, self.field_count);
                self.writer.call("Memory.alloc", 1);
                self.writer.pop(Segment::Pointer, 0);
            }
            Keyword::Method => {
                self.writer.function(&qualified, local_count);
                self.writer.push(Segment::Argument, 0);
                self.writer.pop(Segment::Pointer, 0);
            }
            _ => self.writer.function(&qualified, local_count),
        }
    }

    // parameterList -> (Type Identifier (',' Type Identifier)*)?
    fn compile_parameter_list(&mut self, sub_table: &mut SymbolTable) -> Result<()> {
        if self.peek_symbol(')') {
            return Ok(());
        }
        loop {
            let declared_type = self.expect_type()?;
            let name = self.expect_ident()?;
            sub_table.add_entry(&name, &declared_type, SymbolKind::Argument);
            if !self.consume_symbol(',') {
                break;
            }
        }
        Ok(())
    }

    // varDec -> 'var' Type Identifier (',' Identifier)* ';'
    fn compile_var_dec(&mut self, sub_table: &mut SymbolTable) -> Result<usize> {
        self.expect_keyword(Keyword::Var)?;
        let declared_type = self.expect_type()?;
        let mut count = 0;
        loop {
            let name = self.expect_ident()?;
            sub_table.add_entry(&name, &declared_type, SymbolKind::Local);
            count += 1;
            if !self.consume_symbol(',') {
                break;
            }
        }
        self.expect_symbol(';')?;
        Ok(count)
    }

    fn compile_statements(&mut self, sub_table: &SymbolTable) -> Result<()> {
        loop {
            if self.peek_keyword(Keyword::Let) {
                self.compile_let(sub_table)?;
            } else if self.peek_keyword(Keyword::If) {
                self.compile_if(sub_table)?;
            } else if self.peek_keyword(Keyword::While) {
                self.compile_while(sub_table)?;
            } else if self.peek_keyword(Keyword::Do) {
                self.compile_do(sub_table)?;
            } else if self.peek_keyword(Keyword::Return) {
                self.compile_return(sub_table)?;
            } else {
                return Ok(());
            }
        }
    }

    // letStmt -> 'let' Identifier ('[' expression ']')? '=' expression ';'
    fn compile_let(&mut self, sub_table: &SymbolTable) -> Result<()> {
        self.expect_keyword(Keyword::Let)?;
        let name = self.expect_ident()?;
        let entry = self.resolve(sub_table, &name)?;
        if self.consume_symbol('[') {
            self.compile_expression(sub_table)?;
            self.expect_symbol(']')?;
            // target address sits on the stack before the right-hand side
            // runs, so an array access on the right cannot clobber it
            self.writer.push(entry.kind.segment(), entry.index);
            self.writer.arithmetic("add");
            self.expect_symbol('=')?;
            self.compile_expression(sub_table)?;
            self.expect_symbol(';')?;
            self.writer.pop(Segment::Temp, 0);
            self.writer.pop(Segment::Pointer, 1);
            self.writer.push(Segment::Temp, 0);
            self.writer.pop(Segment::That, 0);
        } else {
            self.expect_symbol('=')?;
            self.compile_expression(sub_table)?;
            self.expect_symbol(';')?;
            self.writer.pop(entry.kind.segment(), entry.index);
        }
        Ok(())
    }

    // ifStmt -> 'if' '(' expression ')' '{' statement* '}'
    //           ('else' '{' statement* '}')?
    fn compile_if(&mut self, sub_table: &SymbolTable) -> Result<()> {
        let id = self.if_count;
        self.if_count += 1;
        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.compile_expression(sub_table)?;
        self.expect_symbol(')')?;
        self.writer.if_goto(&format!("IF_TRUE{}", id));
        self.writer.goto(&format!("IF_FALSE{}", id));
        self.writer.label(&format!("IF_TRUE{}", id));
        self.expect_symbol('{')?;
        self.compile_statements(sub_table)?;
        self.expect_symbol('}')?;
        if self.consume_keyword(Keyword::Else) {
            self.writer.goto(&format!("IF_END{}", id));
            self.writer.label(&format!("IF_FALSE{}", id));
            self.expect_symbol('{')?;
            self.compile_statements(sub_table)?;
            self.expect_symbol('}')?;
            self.writer.label(&format!("IF_END{}", id));
        } else {
            self.writer.label(&format!("IF_FALSE{}", id));
        }
        Ok(())
    }

    // whileStmt -> 'while' '(' expression ')' '{' statement* '}'
    fn compile_while(&mut self, sub_table: &SymbolTable) -> Result<()> {
        let id = self.while_count;
        self.while_count += 1;
        let exp = format!("WHILE_EXP{}", id);
        let end = format!("WHILE_END{}", id);
        self.writer.label(&exp);
        self.expect_keyword(Keyword::While)?;
        self.expect_symbol('(')?;
        self.compile_expression(sub_table)?;
        self.expect_symbol(')')?;
        self.writer.arithmetic("not");
        self.writer.if_goto(&end);
        self.expect_symbol('{')?;
        self.compile_statements(sub_table)?;
        self.expect_symbol('}')?;
        self.writer.goto(&exp);
        self.writer.label(&end);
        Ok(())
    }

    // doStmt -> 'do' subroutineCall ';'
    fn compile_do(&mut self, sub_table: &SymbolTable) -> Result<()> {
        self.expect_keyword(Keyword::Do)?;
        let name = self.expect_ident()?;
        self.compile_subroutine_call(sub_table, name)?;
        self.expect_symbol(';')?;
        // discard the callee's result
        self.writer.pop(Segment::Temp, 0);
        Ok(())
    }

    // returnStmt -> 'return' expression? ';'
    fn compile_return(&mut self, sub_table: &SymbolTable) -> Result<()> {
        self.expect_keyword(Keyword::Return)?;
        if self.peek_symbol(';') {
            // every subroutine pushes a value
            self.writer.push(Segment::Constant, 0);
        } else {
            self.compile_expression(sub_table)?;
        }
        self.expect_symbol(';')?;
        self.writer.ret();
        Ok(())
    }

    // expression -> term (binOp term)*
    //
    // No precedence grouping: terms and operators are compiled in textual
    // left-to-right order, matching stack evaluation.
    fn compile_expression(&mut self, sub_table: &SymbolTable) -> Result<()> {
        self.compile_term(sub_table)?;
        while let Some(op) = self.peek_binary_op() {
            self.index += 1;
            self.compile_term(sub_table)?;
            self.emit_binary_op(op);
        }
        Ok(())
    }

    fn peek_binary_op(&self) -> Option<char> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Symbol(c),
            }) if "+-*/&|<>=".contains(*c) => Some(*c),
            _ => None,
        }
    }

    fn emit_binary_op(&mut self, op: char) {
        match op {
            '+' => self.writer.arithmetic("add"),
            '-' => self.writer.arithmetic("sub"),
            '*' => self.writer.call("Math.multiply", 2),
            '/' => self.writer.call("Math.divide", 2),
            '&' => self.writer.arithmetic("and"),
            '|' => self.writer.arithmetic("or"),
            '<' => self.writer.arithmetic("lt"),
            '>' => self.writer.arithmetic("gt"),
            '=' => self.writer.arithmetic("eq"),
            _ => unreachable!("not a binary operator: {}", op),
        }
    }

    // term -> IntegerConstant | StringConstant | KeywordConstant
    //       | Identifier | Identifier '[' expression ']'
    //       | subroutineCall | '(' expression ')' | unaryOp term
    fn compile_term(&mut self, sub_table: &SymbolTable) -> Result<()> {
        let Some(token) = self.peek() else {
            return Err(self.mismatch("a term"));
        };
        match token.kind.clone() {
            TokenKind::IntConst(digits) => {
                self.index += 1;
                self.writer.push_constant_text(&digits);
            }
            TokenKind::StrConst(text) => {
                self.index += 1;
                self.emit_string_constant(&text);
            }
            TokenKind::Keyword(Keyword::Null | Keyword::False) => {
                self.index += 1;
                self.writer.push(Segment::Constant, 0);
            }
            TokenKind::Keyword(Keyword::True) => {
                self.index += 1;
                self.writer.push(Segment::Constant, 0);
                self.writer.arithmetic("not");
            }
            TokenKind::Keyword(Keyword::This) => {
                self.index += 1;
                self.writer.push(Segment::Pointer, 0);
            }
            TokenKind::Symbol('(') => {
                self.index += 1;
                self.compile_expression(sub_table)?;
                self.expect_symbol(')')?;
            }
            TokenKind::Symbol('-') => {
                self.index += 1;
                self.compile_term(sub_table)?;
                self.writer.arithmetic("neg");
            }
            TokenKind::Symbol('~') => {
                self.index += 1;
                self.compile_term(sub_table)?;
                self.writer.arithmetic("not");
            }
            TokenKind::Ident(name) => {
                self.index += 1;
                if self.consume_symbol('[') {
                    let entry = self.resolve(sub_table, &name)?;
                    self.compile_expression(sub_table)?;
                    self.expect_symbol(']')?;
                    self.writer.push(entry.kind.segment(), entry.index);
                    self.writer.arithmetic("add");
                    self.writer.pop(Segment::Pointer, 1);
                    self.writer.push(Segment::That, 0);
                } else if self.peek_symbol('(') || self.peek_symbol('.') {
                    self.compile_subroutine_call(sub_table, name)?;
                } else {
                    let entry = self.resolve(sub_table, &name)?;
                    self.writer.push(entry.kind.segment(), entry.index);
                }
            }
            _ => return Err(self.mismatch("a term")),
        }
        Ok(())
    }

    // subroutineCall -> Identifier '(' exprList ')'
    //                 | Identifier '.' Identifier '(' exprList ')'
    //
    // Exactly one of three forms, decided by the token after the callee name
    // and by whether that name is a known variable. Call targets come from
    // declared types; there is no dynamic dispatch.
    fn compile_subroutine_call(&mut self, sub_table: &SymbolTable, name: String) -> Result<()> {
        if self.consume_symbol('.') {
            let sub_name = self.expect_ident()?;
            self.expect_symbol('(')?;
            if has_entry(sub_table, &self.class_table, &name) {
                // known-variable receiver: its value is the hidden first
                // argument, its declared type names the callee class
                let entry = self.resolve(sub_table, &name)?;
                self.writer.push(entry.kind.segment(), entry.index);
                let n_args = self.compile_expression_list(sub_table)?;
                self.expect_symbol(')')?;
                let target = format!("{}.{}", entry.declared_type, sub_name);
                self.writer.call(&target, n_args + 1);
            } else {
                // class-qualified call, no hidden receiver
                let n_args = self.compile_expression_list(sub_table)?;
                self.expect_symbol(')')?;
                let target = format!("{}.{}", name, sub_name);
                self.writer.call(&target, n_args);
            }
        } else {
            // bare call on the current receiver
            self.expect_symbol('(')?;
            self.writer.push(Segment::Pointer, 0);
            let n_args = self.compile_expression_list(sub_table)?;
            self.expect_symbol(')')?;
            let target = format!("{}.{}", self.class_name, name);
            self.writer.call(&target, n_args + 1);
        }
        Ok(())
    }

    // exprList -> (expression (',' expression)*)?
    fn compile_expression_list(&mut self, sub_table: &SymbolTable) -> Result<usize> {
        if self.peek_symbol(')') {
            return Ok(0);
        }
        let mut count = 0;
        loop {
            self.compile_expression(sub_table)?;
            count += 1;
            if !self.consume_symbol(',') {
                break;
            }
        }
        Ok(count)
    }

    // push constant <length>; call String.new 1; then one
    // appendChar round per character.
    fn emit_string_constant(&mut self, text: &str) {
        self.writer.push(Segment::Constant, text.chars().count());
        self.writer.call("String.new", 1);
        for c in text.chars() {
            self.writer.push(Segment::Constant, c as usize);
            self.writer.call("String.appendChar", 2);
        }
    }
}

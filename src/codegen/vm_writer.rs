use std::fmt;

/// A named storage region addressed by `push`/`pop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        f.write_str(name)
    }
}

/// Append-only VM instruction sink. The grammar walk calls these as a side
/// effect of parsing; order of the calls is the order of the output.
#[derive(Debug, Default)]
pub struct VmWriter {
    instructions: Vec<String>,
}

impl VmWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment, index: usize) {
        self.instructions.push(format!("push {} {}", segment, index));
    }

    /// `push constant` with the token's raw digits, kept verbatim.
    pub fn push_constant_text(&mut self, digits: &str) {
        self.instructions.push(format!("push constant {}", digits));
    }

    pub fn pop(&mut self, segment: Segment, index: usize) {
        self.instructions.push(format!("pop {} {}", segment, index));
    }

    /// add, sub, neg, eq, gt, lt, and, or, not.
    pub fn arithmetic(&mut self, op: &str) {
        self.instructions.push(op.to_string());
    }

    pub fn label(&mut self, label: &str) {
        self.instructions.push(format!("label {}", label));
    }

    pub fn goto(&mut self, label: &str) {
        self.instructions.push(format!("goto {}", label));
    }

    pub fn if_goto(&mut self, label: &str) {
        self.instructions.push(format!("if-goto {}", label));
    }

    pub fn call(&mut self, target: &str, n_args: usize) {
        self.instructions.push(format!("call {} {}", target, n_args));
    }

    pub fn function(&mut self, name: &str, n_locals: usize) {
        self.instructions
            .push(format!("function {} {}", name, n_locals));
    }

    pub fn ret(&mut self) {
        self.instructions.push("return".to_string());
    }

    pub fn into_instructions(self) -> Vec<String> {
        self.instructions
    }
}

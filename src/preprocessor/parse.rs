//! Line parser and label resolution
//!
//! Preprocessing runs in two passes.  The first pass tokenizes and
//! parses every line, collecting instructions (still referring to
//! branch targets by label name) and a label table mapping each label
//! to the position of the next instruction.  The second pass resolves
//! label references to instruction positions.  The first unparseable
//! line aborts preprocessing with a [`SyntaxError`] carrying its
//! 1-based line number.
//!
//! Operand arity and typing are validated here, against the opcode's
//! expected shape and the configured register set and numeric range, so
//! a program that preprocesses cleanly can only fail at runtime on
//! data-dependent checks (bounds through a register, range overflow,
//! division by zero).

use super::instruction::{
    Address, BinOp, Expr, Instruction, NumericTarget, Op, Operand, Printable, Program,
};
use super::lexer::{tokenize, Token};
use crate::config::MachineConfig;
use crate::observer::SourceProvider;
use rustc_hash::FxHashMap;
use std::fmt;

/// Preprocessing error: the first malformed non-blank, non-comment
/// line, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// What a single source line parsed into.
enum Parsed {
    Label(String),
    Op(UnresolvedOp),
}

/// An [`Op`] whose branch targets are still label names.
enum UnresolvedOp {
    Assign { target: NumericTarget, value: Expr },
    AssignText { slot: Address, value: Printable },
    Jump { label: String },
    JumpZero { cond: Operand, label: String },
    JumpNegative { cond: Operand, label: String },
    Print { value: Printable },
    Halt { message: Option<String> },
}

/// Translates raw source lines into a [`Program`].
///
/// Blank lines, comment lines, and label definitions occupy no
/// instruction position but keep their line numbers, so errors on
/// neighboring lines stay correctly addressed.
pub fn preprocess<S: SourceProvider + ?Sized>(
    source: &S,
    config: &MachineConfig,
) -> Result<Program, SyntaxError> {
    let mut pending: Vec<(usize, UnresolvedOp)> = Vec::new();
    let mut labels: FxHashMap<String, usize> = FxHashMap::default();

    for index in 0..source.line_count() {
        let line_number = index + 1;
        let Some(text) = source.line(index) else {
            break;
        };

        let tokens =
            tokenize(text).map_err(|err| SyntaxError::new(line_number, err.message))?;
        if tokens.is_empty() {
            continue;
        }

        let parsed = LineParser::new(tokens)
            .parse_statement(config)
            .map_err(|message| SyntaxError::new(line_number, message))?;

        match parsed {
            Parsed::Label(name) => {
                if labels.insert(name.clone(), pending.len()).is_some() {
                    return Err(SyntaxError::new(
                        line_number,
                        format!("duplicate label '{}'", name),
                    ));
                }
            }
            Parsed::Op(op) => pending.push((line_number, op)),
        }
    }

    let mut instructions = Vec::with_capacity(pending.len());
    for (line, op) in pending {
        let resolve = |label: &str| {
            labels.get(label).copied().ok_or_else(|| {
                SyntaxError::new(line, format!("unknown label '{}'", label))
            })
        };
        let op = match op {
            UnresolvedOp::Assign { target, value } => Op::Assign { target, value },
            UnresolvedOp::AssignText { slot, value } => Op::AssignText { slot, value },
            UnresolvedOp::Jump { label } => Op::Jump {
                target: resolve(&label)?,
            },
            UnresolvedOp::JumpZero { cond, label } => Op::JumpZero {
                cond,
                target: resolve(&label)?,
            },
            UnresolvedOp::JumpNegative { cond, label } => Op::JumpNegative {
                cond,
                target: resolve(&label)?,
            },
            UnresolvedOp::Print { value } => Op::Print { value },
            UnresolvedOp::Halt { message } => Op::Halt { message },
        };
        instructions.push(Instruction { line, op });
    }

    Ok(Program::new(instructions))
}

/// Single-line recursive descent over the token stream.
struct LineParser {
    tokens: Vec<Token>,
    position: usize,
}

impl LineParser {
    fn new(tokens: Vec<Token>) -> Self {
        LineParser { tokens, position: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, context: &str) -> Result<(), String> {
        match self.next() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(format!(
                "expected '{}' {}, found '{}'",
                expected, context, token
            )),
            None => Err(format!("expected '{}' {}", expected, context)),
        }
    }

    fn finish(&mut self) -> Result<(), String> {
        match self.next() {
            None => Ok(()),
            Some(token) => Err(format!("unexpected '{}' after complete statement", token)),
        }
    }

    fn parse_statement(mut self, config: &MachineConfig) -> Result<Parsed, String> {
        let first = match self.next() {
            Some(Token::Ident(name)) => name,
            Some(token) => {
                return Err(format!(
                    "line must start with an opcode, register, or label, found '{}'",
                    token
                ))
            }
            None => return Err("empty statement".to_string()),
        };

        // Label definition: `NAME:`
        if self.peek() == Some(&Token::Colon) {
            self.next();
            self.finish()?;
            if config.is_register(&first) {
                return Err(format!("register '{}' cannot be used as a label", first));
            }
            return Ok(Parsed::Label(first));
        }

        let parsed = match first.as_str() {
            "JUMP" => {
                let label = self.parse_label()?;
                Parsed::Op(UnresolvedOp::Jump { label })
            }
            "JUMPZ" => {
                let cond = self.parse_operand(config)?;
                let label = self.parse_label()?;
                Parsed::Op(UnresolvedOp::JumpZero { cond, label })
            }
            "JUMPN" => {
                let cond = self.parse_operand(config)?;
                let label = self.parse_label()?;
                Parsed::Op(UnresolvedOp::JumpNegative { cond, label })
            }
            "PRINT" => {
                let value = self.parse_printable(config)?;
                Parsed::Op(UnresolvedOp::Print { value })
            }
            "HALT" => {
                let message = match self.peek() {
                    Some(Token::Text(_)) => match self.next() {
                        Some(Token::Text(text)) => Some(text),
                        _ => None,
                    },
                    _ => None,
                };
                Parsed::Op(UnresolvedOp::Halt { message })
            }
            _ => self.parse_assignment(first, config)?,
        };

        self.finish()?;
        Ok(parsed)
    }

    fn parse_assignment(
        &mut self,
        first: String,
        config: &MachineConfig,
    ) -> Result<Parsed, String> {
        // `M[..]` and `S[..]` targets; anything else must be a register.
        if first == "M" && self.peek() == Some(&Token::LBracket) {
            let address = self.parse_bracketed_address(config)?;
            self.expect(&Token::Eq, "after assignment target")?;
            let value = self.parse_numeric_expr(config, "main memory")?;
            return Ok(Parsed::Op(UnresolvedOp::Assign {
                target: NumericTarget::Memory(address),
                value,
            }));
        }

        if first == "S" && self.peek() == Some(&Token::LBracket) {
            let slot = self.parse_bracketed_address(config)?;
            self.expect(&Token::Eq, "after assignment target")?;
            let value = self.parse_printable(config)?;
            if matches!(
                self.peek(),
                Some(Token::Plus | Token::Minus | Token::Star | Token::Slash)
            ) {
                return Err("arithmetic is not defined on string-buffer cells".to_string());
            }
            return Ok(Parsed::Op(UnresolvedOp::AssignText { slot, value }));
        }

        if !config.is_register(&first) {
            return Err(format!("unknown opcode or register '{}'", first));
        }

        self.expect(&Token::Eq, "after assignment target")?;
        let value = self.parse_numeric_expr(config, "a register")?;
        Ok(Parsed::Op(UnresolvedOp::Assign {
            target: NumericTarget::Register(first),
            value,
        }))
    }

    /// `operand [binop operand]`, numeric context only.
    fn parse_numeric_expr(
        &mut self,
        config: &MachineConfig,
        target_kind: &str,
    ) -> Result<Expr, String> {
        match self.parse_printable(config)? {
            Printable::Operand(lhs) => {
                let op = match self.peek() {
                    Some(Token::Plus) => Some(BinOp::Add),
                    Some(Token::Minus) => Some(BinOp::Sub),
                    Some(Token::Star) => Some(BinOp::Mul),
                    Some(Token::Slash) => Some(BinOp::Div),
                    _ => None,
                };
                match op {
                    Some(op) => {
                        self.next();
                        let rhs = self.parse_operand(config)?;
                        Ok(Expr::Binary { lhs, op, rhs })
                    }
                    None => Ok(Expr::Operand(lhs)),
                }
            }
            Printable::Text(_) | Printable::StringSlot(_) => {
                Err(format!("cannot store text in {}", target_kind))
            }
        }
    }

    /// A numeric operand: literal, register, or `M[..]` cell.
    fn parse_operand(&mut self, config: &MachineConfig) -> Result<Operand, String> {
        match self.parse_printable(config)? {
            Printable::Operand(operand) => Ok(operand),
            Printable::Text(_) | Printable::StringSlot(_) => {
                Err("expected a number, register, or M[..] cell".to_string())
            }
        }
    }

    /// The widest operand form: numeric operand, `S[..]` cell, or
    /// string literal.  Callers narrow as their context requires.
    fn parse_printable(&mut self, config: &MachineConfig) -> Result<Printable, String> {
        match self.next() {
            Some(Token::Int(value)) => {
                self.check_literal(value, config)?;
                Ok(Printable::Operand(Operand::Literal(value)))
            }
            Some(Token::Minus) => match self.next() {
                Some(Token::Int(value)) => {
                    let value = -value;
                    self.check_literal(value, config)?;
                    Ok(Printable::Operand(Operand::Literal(value)))
                }
                other => Err(match other {
                    Some(token) => format!("expected a number after '-', found '{}'", token),
                    None => "expected a number after '-'".to_string(),
                }),
            },
            Some(Token::Text(text)) => Ok(Printable::Text(text)),
            Some(Token::Ident(name)) => {
                if name == "M" && self.peek() == Some(&Token::LBracket) {
                    let address = self.parse_bracketed_address(config)?;
                    Ok(Printable::Operand(Operand::Memory(address)))
                } else if name == "S" && self.peek() == Some(&Token::LBracket) {
                    let address = self.parse_bracketed_address(config)?;
                    Ok(Printable::StringSlot(address))
                } else if config.is_register(&name) {
                    Ok(Printable::Operand(Operand::Register(name)))
                } else {
                    Err(format!("unknown register '{}'", name))
                }
            }
            Some(token) => Err(format!("unexpected '{}' in operand position", token)),
            None => Err("missing operand".to_string()),
        }
    }

    /// `[ literal-or-register ]`, the `[` not yet consumed.
    fn parse_bracketed_address(&mut self, config: &MachineConfig) -> Result<Address, String> {
        self.expect(&Token::LBracket, "before address")?;
        let address = match self.next() {
            Some(Token::Int(value)) => Address::Literal(value),
            Some(Token::Ident(name)) if config.is_register(&name) => Address::Register(name),
            Some(Token::Ident(name)) => {
                return Err(format!("unknown register '{}'", name));
            }
            Some(token) => {
                return Err(format!(
                    "expected a number or register as address, found '{}'",
                    token
                ))
            }
            None => return Err("missing address".to_string()),
        };
        self.expect(&Token::RBracket, "after address")?;
        Ok(address)
    }

    fn parse_label(&mut self) -> Result<String, String> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            Some(token) => Err(format!("expected a label name, found '{}'", token)),
            None => Err("missing label name".to_string()),
        }
    }

    fn check_literal(&self, value: i32, config: &MachineConfig) -> Result<(), String> {
        if value < config.min_number_range || value > config.max_number_range {
            return Err(format!(
                "number {} outside allowed range [{}, {}]",
                value, config.min_number_range, config.max_number_range
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocess_str(source: &str) -> Result<Program, SyntaxError> {
        preprocess(source, &MachineConfig::default())
    }

    #[test]
    fn line_fidelity_skips_blanks_and_comments() {
        let source = "# header comment\n\nR0 = 5\n\n# middle\nR1 = R0 + 2\nPRINT R1\n";
        let program = preprocess_str(source).expect("preprocessing failed");
        assert_eq!(program.len(), 3);
        let lines: Vec<usize> = program.instructions().iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![3, 6, 7]);
    }

    #[test]
    fn labels_resolve_to_instruction_positions() {
        let source = "R0 = 3\nLOOP:\nR0 = R0 - 1\nJUMPZ R0 DONE\nJUMP LOOP\nDONE:\nHALT\n";
        let program = preprocess_str(source).expect("preprocessing failed");
        assert_eq!(program.len(), 5);
        assert_eq!(
            program.instruction(3).map(|i| &i.op),
            Some(&Op::Jump { target: 1 })
        );
        match program.instruction(2).map(|i| &i.op) {
            Some(Op::JumpZero { target, .. }) => assert_eq!(*target, 4),
            other => panic!("expected JUMPZ, got {:?}", other),
        }
    }

    #[test]
    fn unknown_label_errors_at_referencing_line() {
        let err = preprocess_str("R0 = 1\nJUMP NOWHERE\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("NOWHERE"));
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let err = preprocess_str("A:\nR0 = 1\nA:\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("duplicate label"));
    }

    #[test]
    fn unknown_register_errors_at_its_line() {
        // R9 does not exist under the default seven-register setup
        let err = preprocess_str("R0 = 5\nR1 = R0 + 2\nPRINT R1\nR9 = 1\n").unwrap_err();
        assert_eq!(err.line, 4);
        assert!(err.message.contains("R9"), "message: {}", err.message);
    }

    #[test]
    fn literal_outside_range_is_rejected() {
        let err = preprocess_str("R0 = 10000\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("outside allowed range"));
    }

    #[test]
    fn negative_literals_parse() {
        let program = preprocess_str("R0 = -42\n").expect("preprocessing failed");
        assert_eq!(
            program.instruction(0).map(|i| &i.op),
            Some(&Op::Assign {
                target: NumericTarget::Register("R0".to_string()),
                value: Expr::Operand(Operand::Literal(-42)),
            })
        );
    }

    #[test]
    fn memory_and_string_buffer_forms_parse() {
        let source = "M[MH] = R0\nR1 = M[3]\nS[0] = \"HI\"\nS[R1] = R0\nPRINT S[0]\n";
        let program = preprocess_str(source).expect("preprocessing failed");
        assert_eq!(program.len(), 5);
        assert_eq!(
            program.instruction(0).map(|i| &i.op),
            Some(&Op::Assign {
                target: NumericTarget::Memory(Address::Register("MH".to_string())),
                value: Expr::Operand(Operand::Register("R0".to_string())),
            })
        );
        assert_eq!(
            program.instruction(2).map(|i| &i.op),
            Some(&Op::AssignText {
                slot: Address::Literal(0),
                value: Printable::Text("HI".to_string()),
            })
        );
    }

    #[test]
    fn text_cannot_be_stored_in_numeric_cells() {
        let err = preprocess_str("R0 = \"HI\"\n").unwrap_err();
        assert!(err.message.contains("cannot store text"));
        let err = preprocess_str("M[0] = S[0]\n").unwrap_err();
        assert!(err.message.contains("cannot store text"));
    }

    #[test]
    fn string_arithmetic_is_rejected() {
        let err = preprocess_str("S[0] = \"A\" + \"B\"\n").unwrap_err();
        assert!(err.message.contains("arithmetic"));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = preprocess_str("HALT HALT\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("unexpected"));
    }

    #[test]
    fn halt_takes_an_optional_message() {
        let program = preprocess_str("HALT \"Stack empty\"\n").expect("preprocessing failed");
        assert_eq!(
            program.instruction(0).map(|i| &i.op),
            Some(&Op::Halt {
                message: Some("Stack empty".to_string())
            })
        );
    }

    #[test]
    fn register_names_cannot_label() {
        let err = preprocess_str("R0:\n").unwrap_err();
        assert!(err.message.contains("cannot be used as a label"));
    }

    #[test]
    fn lowercase_source_is_canonicalized() {
        let program = preprocess_str("r0 = 5\nprint r0\n").expect("preprocessing failed");
        assert_eq!(program.len(), 2);
        assert_eq!(
            program.instruction(1).map(|i| &i.op),
            Some(&Op::Print {
                value: Printable::Operand(Operand::Register("R0".to_string()))
            })
        );
    }
}

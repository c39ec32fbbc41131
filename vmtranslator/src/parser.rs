//! Parser module for Jack VM code
//!
//! Strips comments and blank lines up front, then exposes a cursor over the
//! remaining commands. Every advance tracks the 1-based source line of the
//! current command so callers can surface a `line N: ...` diagnostic (§7).

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    If,
    Function,
    Call,
    Return,
}

#[derive(Debug)]
pub enum ParserError {
    InvalidState(&'static str),
}

impl std::error::Error for ParserError {}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
        }
    }
}

pub struct Parser {
    /// (source line number, command text) pairs, comments/blanks already stripped.
    lines: Vec<(u32, String)>,
    current_line: usize,
    current_command: String,
    current_line_number: u32,
    /// Cached parts of the current command to avoid repeated parsing
    cached_parts: Vec<String>,
}

impl Parser {
    pub fn new(filename: &str) -> Result<Self, std::io::Error> {
        let file = File::open(filename)?;
        let reader = BufReader::new(file);

        let mut lines = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let stripped = if let Some(pos) = line.find("//") {
                &line[..pos]
            } else {
                &line
            };

            let trimmed = stripped.trim();

            if !trimmed.is_empty() {
                lines.push((idx as u32 + 1, trimmed.to_string()));
            }
        }

        Ok(Parser {
            lines,
            current_line: 0,
            current_command: String::new(),
            current_line_number: 0,
            cached_parts: Vec::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn has_more_commands(&self) -> bool {
        self.current_line < self.lines.len()
    }

    #[inline]
    pub fn advance(&mut self) {
        if self.has_more_commands() {
            let (line_number, text) = &mut self.lines[self.current_line];
            std::mem::swap(&mut self.current_command, text);
            self.current_line_number = *line_number;

            self.cached_parts.clear();
            self.cached_parts.extend(
                self.current_command
                    .split_whitespace()
                    .map(ToString::to_string),
            );

            self.current_line += 1;
        }
    }

    /// The 1-based source line number of the current command.
    #[inline]
    #[must_use]
    pub fn line_number(&self) -> u32 {
        self.current_line_number
    }

    #[inline]
    pub fn command_type(&self) -> Result<CommandType, ParserError> {
        if self.cached_parts.is_empty() {
            return Err(ParserError::InvalidState("no current command available"));
        }

        Ok(match self.cached_parts[0].as_str() {
            "push" => CommandType::Push,
            "pop" => CommandType::Pop,
            "label" => CommandType::Label,
            "goto" => CommandType::Goto,
            "if-goto" => CommandType::If,
            "function" => CommandType::Function,
            "call" => CommandType::Call,
            "return" => CommandType::Return,
            _ => CommandType::Arithmetic,
        })
    }

    #[inline]
    pub fn arg1(&self) -> Result<&str, ParserError> {
        let cmd_type = self.command_type()?;
        match cmd_type {
            CommandType::Arithmetic => Ok(&self.cached_parts[0]),
            CommandType::Return => Err(ParserError::InvalidState(
                "arg1 should not be called for return",
            )),
            _ => self
                .cached_parts
                .get(1)
                .map(String::as_str)
                .ok_or(ParserError::InvalidState("missing arg1")),
        }
    }

    #[inline]
    pub fn arg2(&self) -> Result<i32, ParserError> {
        let cmd_type = self.command_type()?;
        match cmd_type {
            CommandType::Push | CommandType::Pop | CommandType::Function | CommandType::Call => {
                self.cached_parts
                    .get(2)
                    .ok_or(ParserError::InvalidState("missing arg2"))?
                    .parse()
                    .map_err(|_| ParserError::InvalidState("arg2 is not a valid integer"))
            }
            _ => Err(ParserError::InvalidState(
                "arg2 should not be called for this command type",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_vm(contents: &str) -> std::path::PathBuf {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "vmtranslator_parser_test_{}_{}.vm",
            std::process::id(),
            unique
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn skips_comments_and_blank_lines_while_tracking_line_numbers() {
        let path = write_temp_vm("// header\npush constant 7\n\nadd // inline\n");
        let mut parser = Parser::new(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(parser.has_more_commands());
        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::Push);
        assert_eq!(parser.line_number(), 2);

        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::Arithmetic);
        assert_eq!(parser.line_number(), 4);

        assert!(!parser.has_more_commands());
    }

    #[test]
    fn parses_push_pop_arguments() {
        let path = write_temp_vm("push local 3\npop argument 1\n");
        let mut parser = Parser::new(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        parser.advance();
        assert_eq!(parser.arg1().unwrap(), "local");
        assert_eq!(parser.arg2().unwrap(), 3);

        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::Pop);
        assert_eq!(parser.arg1().unwrap(), "argument");
        assert_eq!(parser.arg2().unwrap(), 1);
    }

    #[test]
    fn parses_branching_and_calling_commands() {
        let path = write_temp_vm(
            "label LOOP\ngoto LOOP\nif-goto LOOP\nfunction Main.fib 2\ncall Main.fib 1\nreturn\n",
        );
        let mut parser = Parser::new(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::Label);
        assert_eq!(parser.arg1().unwrap(), "LOOP");

        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::Goto);

        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::If);

        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::Function);
        assert_eq!(parser.arg1().unwrap(), "Main.fib");
        assert_eq!(parser.arg2().unwrap(), 2);

        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::Call);
        assert_eq!(parser.arg2().unwrap(), 1);

        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::Return);
        assert!(parser.arg1().is_err());
    }
}

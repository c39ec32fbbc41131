//! Recursive-descent Jack parser.
//!
//! One method per grammar non-terminal, each opening a named tree region,
//! consuming its production, and closing the region — mirroring the
//! `printStartNonTerm`/`printEndNonTerm` bracketing idiom this is grounded
//! on. `subroutineCall` is the one deliberate exception: its tokens are
//! spliced directly into the caller's children with no region of its own.

use std::io::{self, Write};

use common::Diagnostic;

use crate::tokenizer::{SourceToken, Token, Tokenizer};

#[derive(Debug, Clone, PartialEq)]
pub enum ParseTree {
    Node {
        name: &'static str,
        children: Vec<ParseTree>,
    },
    Leaf(Token),
}

const OPERATORS: [char; 9] = ['+', '-', '*', '/', '&', '|', '<', '>', '='];
const UNARY_OPERATORS: [char; 2] = ['-', '~'];

pub struct Parser {
    tokenizer: Tokenizer,
}

impl Parser {
    #[must_use]
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Parses a whole `class ... { ... }` and fails unless every token was
    /// consumed (§8: parser completeness).
    pub fn parse_class(mut self) -> Result<ParseTree, Diagnostic> {
        let tree = self.compile_class()?;
        if self.tokenizer.has_more_tokens() {
            return Err(Diagnostic::syntactic(
                self.tokenizer.line(),
                format!(
                    "unexpected trailing {} after class body",
                    self.tokenizer.curr().unwrap().token.describe()
                ),
            ));
        }
        Ok(tree)
    }

    fn current(&self) -> Result<&SourceToken, Diagnostic> {
        self.tokenizer
            .curr()
            .ok_or_else(|| Diagnostic::syntactic(self.tokenizer.line(), "unexpected end of input"))
    }

    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self.tokenizer.curr(), Some(SourceToken { token: Token::Keyword(k), .. }) if *k == kw)
    }

    fn is_symbol(&self, c: char) -> bool {
        matches!(self.tokenizer.curr(), Some(SourceToken { token: Token::Symbol(s), .. }) if *s == c)
    }

    fn peek_is_symbol(&self, c: char) -> bool {
        matches!(self.tokenizer.peek(), Some(SourceToken { token: Token::Symbol(s), .. }) if *s == c)
    }

    /// Consumes the current token unconditionally, returning it as a leaf.
    fn take(&mut self) -> ParseTree {
        let token = self.tokenizer.curr().expect("caller checked has_more_tokens").token.clone();
        self.tokenizer.advance();
        ParseTree::Leaf(token)
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<ParseTree, Diagnostic> {
        let current = self.current()?;
        if !matches!(&current.token, Token::Keyword(k) if *k == kw) {
            return Err(Diagnostic::syntactic(
                current.line,
                format!("found {}, expected keyword '{kw}'", current.token.describe()),
            ));
        }
        Ok(self.take())
    }

    fn expect_symbol(&mut self, c: char) -> Result<ParseTree, Diagnostic> {
        let current = self.current()?;
        if !matches!(&current.token, Token::Symbol(s) if *s == c) {
            return Err(Diagnostic::syntactic(
                current.line,
                format!("found {}, expected symbol '{c}'", current.token.describe()),
            ));
        }
        Ok(self.take())
    }

    fn expect_identifier(&mut self) -> Result<ParseTree, Diagnostic> {
        let current = self.current()?;
        if !matches!(current.token, Token::Identifier(_)) {
            return Err(Diagnostic::syntactic(
                current.line,
                format!("found {}, expected an identifier", current.token.describe()),
            ));
        }
        Ok(self.take())
    }

    /// `'int' | 'char' | 'boolean' | identifier`
    fn expect_type(&mut self) -> Result<ParseTree, Diagnostic> {
        let current = self.current()?;
        match &current.token {
            Token::Keyword("int" | "char" | "boolean") => Ok(self.take()),
            Token::Identifier(_) => Ok(self.take()),
            other => Err(Diagnostic::syntactic(
                current.line,
                format!("found {}, expected a type", other.describe()),
            )),
        }
    }

    /// `'void' | type`
    fn expect_void_or_type(&mut self) -> Result<ParseTree, Diagnostic> {
        if self.is_keyword("void") {
            Ok(self.take())
        } else {
            self.expect_type()
        }
    }

    fn compile_class(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(self.expect_keyword("class")?);
        children.push(self.expect_identifier()?);
        children.push(self.expect_symbol('{')?);
        while self.is_keyword("static") || self.is_keyword("field") {
            children.push(self.compile_class_var_dec()?);
        }
        while self.is_keyword("constructor") || self.is_keyword("function") || self.is_keyword("method") {
            children.push(self.compile_subroutine_dec()?);
        }
        children.push(self.expect_symbol('}')?);
        Ok(ParseTree::Node { name: "class", children })
    }

    fn compile_class_var_dec(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(if self.is_keyword("static") {
            self.expect_keyword("static")?
        } else {
            self.expect_keyword("field")?
        });
        children.push(self.expect_type()?);
        children.push(self.expect_identifier()?);
        while self.is_symbol(',') {
            children.push(self.expect_symbol(',')?);
            children.push(self.expect_identifier()?);
        }
        children.push(self.expect_symbol(';')?);
        Ok(ParseTree::Node { name: "classVarDec", children })
    }

    fn compile_subroutine_dec(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(if self.is_keyword("constructor") {
            self.expect_keyword("constructor")?
        } else if self.is_keyword("function") {
            self.expect_keyword("function")?
        } else {
            self.expect_keyword("method")?
        });
        children.push(self.expect_void_or_type()?);
        children.push(self.expect_identifier()?);
        children.push(self.expect_symbol('(')?);
        children.push(self.compile_parameter_list()?);
        children.push(self.expect_symbol(')')?);
        children.push(self.compile_subroutine_body()?);
        Ok(ParseTree::Node { name: "subroutineDec", children })
    }

    fn compile_parameter_list(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        if !self.is_symbol(')') {
            children.push(self.expect_type()?);
            children.push(self.expect_identifier()?);
            while self.is_symbol(',') {
                children.push(self.expect_symbol(',')?);
                children.push(self.expect_type()?);
                children.push(self.expect_identifier()?);
            }
        }
        Ok(ParseTree::Node { name: "parameterList", children })
    }

    fn compile_subroutine_body(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(self.expect_symbol('{')?);
        while self.is_keyword("var") {
            children.push(self.compile_var_dec()?);
        }
        children.push(self.compile_statements()?);
        children.push(self.expect_symbol('}')?);
        Ok(ParseTree::Node { name: "subroutineBody", children })
    }

    fn compile_var_dec(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(self.expect_keyword("var")?);
        children.push(self.expect_type()?);
        children.push(self.expect_identifier()?);
        while self.is_symbol(',') {
            children.push(self.expect_symbol(',')?);
            children.push(self.expect_identifier()?);
        }
        children.push(self.expect_symbol(';')?);
        Ok(ParseTree::Node { name: "varDec", children })
    }

    fn compile_statements(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        loop {
            if self.is_keyword("let") {
                children.push(self.compile_let()?);
            } else if self.is_keyword("if") {
                children.push(self.compile_if()?);
            } else if self.is_keyword("while") {
                children.push(self.compile_while()?);
            } else if self.is_keyword("do") {
                children.push(self.compile_do()?);
            } else if self.is_keyword("return") {
                children.push(self.compile_return()?);
            } else {
                break;
            }
        }
        Ok(ParseTree::Node { name: "statements", children })
    }

    fn compile_let(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(self.expect_keyword("let")?);
        children.push(self.expect_identifier()?);
        if self.is_symbol('[') {
            children.push(self.expect_symbol('[')?);
            children.push(self.compile_expression()?);
            children.push(self.expect_symbol(']')?);
        }
        children.push(self.expect_symbol('=')?);
        children.push(self.compile_expression()?);
        children.push(self.expect_symbol(';')?);
        Ok(ParseTree::Node { name: "letStatement", children })
    }

    fn compile_if(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(self.expect_keyword("if")?);
        children.push(self.expect_symbol('(')?);
        children.push(self.compile_expression()?);
        children.push(self.expect_symbol(')')?);
        children.push(self.expect_symbol('{')?);
        children.push(self.compile_statements()?);
        children.push(self.expect_symbol('}')?);
        if self.is_keyword("else") {
            children.push(self.expect_keyword("else")?);
            children.push(self.expect_symbol('{')?);
            children.push(self.compile_statements()?);
            children.push(self.expect_symbol('}')?);
        }
        Ok(ParseTree::Node { name: "ifStatement", children })
    }

    fn compile_while(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(self.expect_keyword("while")?);
        children.push(self.expect_symbol('(')?);
        children.push(self.compile_expression()?);
        children.push(self.expect_symbol(')')?);
        children.push(self.expect_symbol('{')?);
        children.push(self.compile_statements()?);
        children.push(self.expect_symbol('}')?);
        Ok(ParseTree::Node { name: "whileStatement", children })
    }

    fn compile_do(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(self.expect_keyword("do")?);
        self.compile_subroutine_call(&mut children)?;
        children.push(self.expect_symbol(';')?);
        Ok(ParseTree::Node { name: "doStatement", children })
    }

    fn compile_return(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(self.expect_keyword("return")?);
        if !self.is_symbol(';') {
            children.push(self.compile_expression()?);
        }
        children.push(self.expect_symbol(';')?);
        Ok(ParseTree::Node { name: "returnStatement", children })
    }

    /// `term (op term)*` — deliberately flat, no operator precedence.
    fn compile_expression(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        children.push(self.compile_term()?);
        while let Some(SourceToken { token: Token::Symbol(c), .. }) = self.tokenizer.curr() {
            if !OPERATORS.contains(c) {
                break;
            }
            children.push(self.take());
            children.push(self.compile_term()?);
        }
        Ok(ParseTree::Node { name: "expression", children })
    }

    fn compile_term(&mut self) -> Result<ParseTree, Diagnostic> {
        let current = self.current()?;
        let children = match &current.token {
            Token::IntConst(_) | Token::StringConst(_) => vec![self.take()],
            Token::Keyword("true" | "false" | "null" | "this") => vec![self.take()],
            Token::Symbol('(') => {
                let mut c = vec![self.expect_symbol('(')?];
                c.push(self.compile_expression()?);
                c.push(self.expect_symbol(')')?);
                c
            }
            Token::Symbol(c) if UNARY_OPERATORS.contains(c) => {
                let mut c = vec![self.take()];
                c.push(self.compile_term()?);
                c
            }
            Token::Identifier(_) if self.peek_is_symbol('[') => {
                let mut c = vec![self.expect_identifier()?];
                c.push(self.expect_symbol('[')?);
                c.push(self.compile_expression()?);
                c.push(self.expect_symbol(']')?);
                c
            }
            Token::Identifier(_) if self.peek_is_symbol('(') || self.peek_is_symbol('.') => {
                let mut c = Vec::new();
                self.compile_subroutine_call(&mut c)?;
                c
            }
            Token::Identifier(_) => vec![self.expect_identifier()?],
            other => {
                return Err(Diagnostic::syntactic(
                    current.line,
                    format!("found {}, expected a term", other.describe()),
                ));
            }
        };
        Ok(ParseTree::Node { name: "term", children })
    }

    /// `identifier '(' expressionList ')' | identifier '.' identifier '(' expressionList ')'`
    ///
    /// Spliced directly into `out` with no enclosing region of its own.
    fn compile_subroutine_call(&mut self, out: &mut Vec<ParseTree>) -> Result<(), Diagnostic> {
        out.push(self.expect_identifier()?);
        if self.is_symbol('.') {
            out.push(self.expect_symbol('.')?);
            out.push(self.expect_identifier()?);
        }
        out.push(self.expect_symbol('(')?);
        out.push(self.compile_expression_list()?);
        out.push(self.expect_symbol(')')?);
        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<ParseTree, Diagnostic> {
        let mut children = Vec::new();
        if !self.is_symbol(')') {
            children.push(self.compile_expression()?);
            while self.is_symbol(',') {
                children.push(self.expect_symbol(',')?);
                children.push(self.compile_expression()?);
            }
        }
        Ok(ParseTree::Node { name: "expressionList", children })
    }
}

/// Renders a tree in nand2tetris's `<tag>value</tag>` / `<name>...</name>`
/// convention, two spaces of indent per nesting level.
pub fn write_xml<W: Write>(tree: &ParseTree, writer: &mut W, indent: usize) -> io::Result<()> {
    let pad = "  ".repeat(indent);
    match tree {
        ParseTree::Node { name, children } => {
            writeln!(writer, "{pad}<{name}>")?;
            for child in children {
                write_xml(child, writer, indent + 1)?;
            }
            writeln!(writer, "{pad}</{name}>")?;
        }
        ParseTree::Leaf(token) => {
            writeln!(writer, "{pad}<{}>{}</{}>", token.xml_tag(), token.xml_escaped_value(), token.xml_tag())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn parse(source: &str) -> ParseTree {
        let tokenizer = Tokenizer::new(source).unwrap();
        Parser::new(tokenizer).parse_class().unwrap()
    }

    #[test]
    fn minimal_class_matches_the_documented_scenario() {
        let tree = parse("class Foo { }");
        match tree {
            ParseTree::Node { name: "class", children } => {
                assert_eq!(children.len(), 4);
                assert_eq!(children[0], ParseTree::Leaf(Token::Keyword("class")));
                assert_eq!(children[1], ParseTree::Leaf(Token::Identifier("Foo".into())));
                assert_eq!(children[2], ParseTree::Leaf(Token::Symbol('{')));
                assert_eq!(children[3], ParseTree::Leaf(Token::Symbol('}')));
            }
            other => panic!("expected class node, got {other:?}"),
        }
    }

    #[test]
    fn parses_field_and_static_declarations_with_multiple_names() {
        let tree = parse("class Foo { field int x, y; static boolean flag; }");
        if let ParseTree::Node { children, .. } = tree {
            assert!(matches!(children[3], ParseTree::Node { name: "classVarDec", .. }));
            assert!(matches!(children[4], ParseTree::Node { name: "classVarDec", .. }));
        }
    }

    #[test]
    fn expression_is_flat_with_no_precedence_nesting() {
        let tree = parse("class Foo { function void bar() { var int x; let x = 1 + 2 * 3; return; } }");
        // dig down to the letStatement's expression
        let sub = find_node(&tree, "expression").expect("an expression node exists");
        if let ParseTree::Node { children, .. } = sub {
            // term op term op term: 5 children, not a nested (1 + (2*3)) tree
            assert_eq!(children.len(), 5);
        }
    }

    fn find_node<'a>(tree: &'a ParseTree, target: &str) -> Option<&'a ParseTree> {
        match tree {
            ParseTree::Node { name, children } => {
                if *name == target {
                    return Some(tree);
                }
                children.iter().find_map(|c| find_node(c, target))
            }
            ParseTree::Leaf(_) => None,
        }
    }

    #[test]
    fn disambiguates_array_access_subroutine_call_and_plain_variable() {
        let tree = parse(
            "class Foo { function void bar() { \
             do Output.println(); \
             let x = a[1]; \
             let y = foo(1); \
             let z = w; \
             return; } }",
        );
        let do_stmt = find_node(&tree, "doStatement").unwrap();
        if let ParseTree::Node { children, .. } = do_stmt {
            // identifier '.' identifier '(' expressionList ')' inlined, no subroutineCall region
            assert!(!children.iter().any(|c| matches!(c, ParseTree::Node { name: "subroutineCall", .. })));
            assert_eq!(children[1], ParseTree::Leaf(Token::Identifier("Output".into())));
        }
    }

    #[test]
    fn rejects_mismatched_closing_brace_with_line_number() {
        let tokenizer = Tokenizer::new("class Foo {\n  field int x;\n").unwrap();
        let err = Parser::new(tokenizer).parse_class().unwrap_err();
        assert!(err.to_string().starts_with("line"), "{err}");
    }

    #[test]
    fn writes_the_documented_minimal_class_xml() {
        let tree = parse("class Foo { }");
        let mut buf = Vec::new();
        write_xml(&tree, &mut buf, 0).unwrap();
        let xml = String::from_utf8(buf).unwrap();
        assert_eq!(
            xml,
            "<class>\n  <keyword>class</keyword>\n  <identifier>Foo</identifier>\n  <symbol>{</symbol>\n  <symbol>}</symbol>\n</class>\n"
        );
    }
}

mod syntax_tree;
mod token_set;

pub(crate) mod grammar;

use crate::error::DiagnosticData;
use crate::lexer::Lexer;
use crate::lexer::Token;
use crate::lexer::TokenKind;
use crate::tables::mode;
use crate::tables::IdentId;
use crate::tables::IdentTable;
use crate::tables::Item;
use crate::tables::ModeTable;
use crate::tables::OpCode;
use crate::tables::ReprId;
use crate::tables::ReprTable;
use crate::tables::Tree;
use crate::Error;
use crate::LimitTracker;

pub use syntax_tree::SyntaxTree;
pub(crate) use token_set::TokenSet;
pub(crate) use token_set::{
    CONDITION_RECOVERY, DECLARATION_RECOVERY, LIST_RECOVERY, STATEMENT_RECOVERY,
};

/// Parse a source file into a [`SyntaxTree`]: the tree arena, the
/// representations, identifiers and modes tables, and any diagnostics.
///
/// ## Example
///
/// ```rust
/// use mica_parser::Parser;
///
/// let source = "
/// int add(int a, int b) {
///     return a + b;
/// }
///
/// int main() {
///     return add(20, 22);
/// }
/// ";
/// let parser = Parser::new(source);
/// let syntax = parser.parse();
/// // Check for errors before handing the tables to a back-end.
/// assert!(syntax.ok());
/// assert_eq!(syntax.function_count(), 2);
/// assert!(syntax.has_main());
/// ```
#[derive(Debug)]
pub struct Parser<'input> {
    lexer: Lexer<'input>,
    source: &'input str,
    /// One token of lookahead. At end of input this stays `Eof`, which is
    /// idempotent on consume.
    current: Token<'input>,
    /// Byte index just past the most recently consumed token.
    last_end: usize,

    reprs: ReprTable,
    modes: ModeTable,
    idents: IdentTable,
    tree: Tree,
    /// Function number to tree offset of the definition, `-1` while only
    /// declared.
    functions: Vec<Item>,
    /// Labels of the function being parsed.
    labels: Vec<LabelRef>,

    /// The list of errors we've accumulated so far.
    errors: Vec<Error>,
    /// The limit to apply to parsing.
    recursion_limit: LimitTracker,
    /// Accept parsing errors?
    accept_errors: bool,
    /// Set after a diagnostic until the next token is consumed, so one bad
    /// token cannot produce a cascade.
    panicking: bool,

    /// Set by a `return` statement in the function being parsed.
    was_return: bool,
    /// Set once a well-formed `main` definition is seen.
    wasmain: bool,
}

/// Chosen to keep a comfortable margin against stack overflow in an
/// unoptimized build; expression and statement nesting both count against it.
const DEFAULT_RECURSION_LIMIT: usize = 500;

/// A label of the current function: its table entry plus enough bookkeeping
/// to resolve forward `goto`s and report the ones that never resolve.
#[derive(Debug)]
pub(crate) struct LabelRef {
    pub(crate) repr: ReprId,
    pub(crate) ident: IdentId,
    pub(crate) defined: bool,
    pub(crate) first_use: usize,
}

impl<'input> Parser<'input> {
    /// Create a new instance of a parser given an input string.
    pub fn new(input: &'input str) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(input),
            source: input,
            current: Token::eof(input.len()),
            last_end: 0,
            reprs: ReprTable::new(),
            modes: ModeTable::new(),
            idents: IdentTable::new(),
            tree: Tree::new(),
            functions: Vec::new(),
            labels: Vec::new(),
            errors: Vec::new(),
            recursion_limit: LimitTracker::new(DEFAULT_RECURSION_LIMIT),
            accept_errors: true,
            panicking: false,
            was_return: false,
            wasmain: false,
        };
        parser.current = parser.next_token();
        parser
    }

    /// Configure the recursion limit to use while parsing.
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = LimitTracker::new(limit);
        self
    }

    /// Configure the limit on the number of tokens to parse. If an input
    /// document is too big, parsing will be aborted.
    ///
    /// By default, there is no limit.
    pub fn token_limit(mut self, limit: usize) -> Self {
        self.lexer = self.lexer.with_limit(limit);
        self
    }

    /// Parse the input.
    pub fn parse(mut self) -> SyntaxTree {
        grammar::declaration::translation_unit(&mut self);
        self.tree.leaf(OpCode::Eof, mode::VOID, &[]);
        SyntaxTree::build(self)
    }

    /// The kind of the current token.
    pub(crate) fn peek(&self) -> TokenKind {
        self.current.kind()
    }

    /// The kind of the token after the current one.
    pub(crate) fn peek2(&self) -> TokenKind {
        self.lexer
            .clone()
            .filter_map(Result::ok)
            .next()
            .map_or(TokenKind::Eof, |token| token.kind())
    }

    /// Check if the current token is `kind`.
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current.kind() == kind
    }

    /// The current token.
    pub(crate) fn current(&self) -> &Token<'input> {
        &self.current
    }

    /// Consume the current token and lex the next one. At end of input this
    /// returns the `Eof` token over and over.
    pub(crate) fn pop(&mut self) -> Token<'input> {
        self.panicking = false;
        if self.current.kind() == TokenKind::Eof {
            return self.current;
        }
        self.last_end = self.current.end();
        let next = self.next_token();
        std::mem::replace(&mut self.current, next)
    }

    /// Consume the current token if it is `kind`.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pop();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it is `kind`, or report what was
    /// expected otherwise.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(DiagnosticData::Expected {
            expected: kind.describe(),
        });
        false
    }

    /// Byte index just past the most recently consumed token.
    pub(crate) fn last_end(&self) -> usize {
        self.last_end
    }

    /// Read tokens until one of the synchronization set: panic-mode
    /// recovery. Consumes at least one token unless the parser already
    /// stands on a synchronization point. Stops at end of input
    /// unconditionally, and never steps over a `}`: the enclosing compound
    /// statement must see it so scopes close on every recovery path.
    pub(crate) fn skip_until(&mut self, set: TokenSet) {
        while !set.contains(self.peek())
            && !self.at(TokenKind::Eof)
            && !self.at(TokenKind::RBrace)
        {
            self.pop();
        }
    }

    /// Report a diagnostic at the current token.
    pub(crate) fn error(&mut self, code: DiagnosticData) {
        let data = self.current.data().to_string();
        let index = self.current.index();
        self.push_err(Error::new(code, data, index));
    }

    /// Report a diagnostic over a source range, typically the range of an
    /// already-parsed expression.
    pub(crate) fn error_at(&mut self, start: usize, end: usize, code: DiagnosticData) {
        let data = self.source[start..end.min(self.source.len())].to_string();
        self.push_err(Error::new(code, data, start));
    }

    /// Report a warning over a source range.
    pub(crate) fn warning_at(&mut self, start: usize, end: usize, code: DiagnosticData) {
        let data = self.source[start..end.min(self.source.len())].to_string();
        self.push_err(Error::warning(code, data, start));
    }

    /// Report that the recursion limit was reached.
    ///
    /// Note: after a limit error, any further errors are silently discarded;
    /// the early termination would otherwise report phantom errors all the
    /// way up.
    pub(crate) fn limit_error(&mut self) {
        let error = Error::new(
            DiagnosticData::RecursionLimitReached,
            String::new(),
            self.current.index(),
        );
        if self.accept_errors {
            self.errors.push(error);
        }
        self.accept_errors = false;
    }

    fn push_err(&mut self, error: Error) {
        if self.accept_errors && !self.panicking {
            self.errors.push(error);
            self.panicking = true;
        }
    }

    /// Gets the next token from the lexer, forwarding lexical errors to the
    /// diagnostic list.
    fn next_token(&mut self) -> Token<'input> {
        loop {
            match self.lexer.next() {
                None => return Token::eof(self.source.len()),
                Some(Ok(token)) => return token,
                Some(Err(error)) => {
                    let is_limit = error.is_limit();
                    if self.accept_errors {
                        self.errors.push(error);
                    }
                    if is_limit {
                        self.accept_errors = false;
                    }
                }
            }
        }
    }

    /// Intern the spelling of an identifier token.
    pub(crate) fn intern(&mut self, token: &Token<'_>) -> ReprId {
        self.reprs.intern(token.data())
    }

    /// The identifier a spelling currently means, if any.
    pub(crate) fn meaning_of(&self, repr: ReprId) -> Option<IdentId> {
        self.reprs.get_at(repr).map(|id| IdentId(id as usize))
    }
}

use std::fmt;

/// How bad a diagnostic is. Warnings never fail a parse on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Structured data about a diagnostic: one variant per condition the lexer or
/// parser can report, with the user-facing message on the variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DiagnosticData {
    // Lexical
    #[error("unexpected character `{c}`")]
    UnexpectedCharacter { c: char },
    #[error("invalid escape sequence `\\{c}`")]
    InvalidEscape { c: char },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated character literal")]
    UnterminatedChar,
    #[error("empty character literal")]
    EmptyChar,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("malformed number literal")]
    MalformedNumber,
    #[error("integer literal is out of range")]
    IntLiteralTooLarge,

    // Limits
    #[error("token limit reached, aborting lexing")]
    TokenLimitReached,
    #[error("parser recursion limit reached")]
    RecursionLimitReached,

    // Syntactic
    #[error("expected {expected}")]
    Expected { expected: &'static str },
    #[error("expected a declaration specifier")]
    ExpectedDeclarationSpecifier,
    #[error("expected an expression")]
    ExpectedExpression,
    #[error("function declarations are only permitted at file scope")]
    NestedFunction,
    #[error("array bound is required here")]
    MissingArrayBound,

    // Types
    #[error("`{name}` is declared twice in the same scope")]
    Redeclaration { name: String },
    #[error("`{name}` is redeclared with a different type")]
    ConflictingDeclaration { name: String },
    #[error("duplicate struct field `{name}`")]
    DuplicateStructField { name: String },
    #[error("variable has incomplete type")]
    IncompleteType,
    #[error("array bound is not a constant expression")]
    ArrayBoundNotConstant,
    #[error("array bound must be positive")]
    ArrayBoundNotPositive,
    #[error("too many initializers for an array of {expected} elements")]
    InitializerTooLong { expected: usize },
    #[error("initializer does not match the shape of the declared type")]
    InitializerShapeMismatch,
    #[error("initializer type does not match the declared type")]
    IncompatibleInitializer,
    #[error("expression is not assignable")]
    AssignmentToNonLvalue,
    #[error("incompatible types in assignment")]
    IncompatibleAssignment,
    #[error("wrong number of arguments: expected {expected}, found {found}")]
    WrongArgumentCount { expected: usize, found: usize },
    #[error("called value is not a function")]
    NotAFunction,
    #[error("subscripted value is not an array")]
    SubscriptNotArray,
    #[error("array subscript is not an integer")]
    SubscriptNotInteger,
    #[error("member access on a value that is not a structure")]
    MemberOnNonStruct,
    #[error("no field `{name}` in this structure")]
    NoSuchField { name: String },
    #[error("invalid operand types for this operator")]
    OperandTypeMismatch,
    #[error("type name `{name}` used as a value")]
    TypeNameInExpression { name: String },
    #[error("`return` value does not match the function's return type")]
    ReturnTypeMismatch,
    #[error("missing `return` in a function returning a value")]
    MissingReturn,
    #[error("`main` must have the signature `int main()`")]
    WrongMainSignature,

    // Scope
    #[error("use of undeclared identifier `{name}`")]
    UndeclaredIdentifier { name: String },
    #[error("label `{name}` is defined twice")]
    LabelRedeclared { name: String },
    #[error("label `{name}` is used but never defined")]
    UndefinedLabel { name: String },
    #[error("`break` outside of a loop or switch")]
    BreakOutsideLoopOrSwitch,
    #[error("`continue` outside of a loop")]
    ContinueOutsideLoop,
    #[error("`case` outside of a switch")]
    CaseOutsideSwitch,
    #[error("`default` outside of a switch")]
    DefaultOutsideSwitch,

    // Constants
    #[error("constant expression required")]
    NotAConstantExpression,
    #[error("overflow in constant expression")]
    ConstantOverflow,
    #[error("division by zero in constant expression")]
    DivisionByZero,
}

/// A diagnostic produced by the lexer or the parser.
///
/// Diagnostics come back alongside the parse output; check them before
/// handing the tables to a back-end. `data` is the offending source text and
/// `index` is where it begins in the input.
#[derive(Clone, PartialEq, Eq)]
pub struct Error {
    pub(crate) severity: Severity,
    pub(crate) code: DiagnosticData,
    pub(crate) data: String,
    pub(crate) index: usize,
}

impl Error {
    /// Create an error-severity diagnostic.
    pub fn new(code: DiagnosticData, data: String, index: usize) -> Self {
        Self {
            severity: Severity::Error,
            code,
            data,
            index,
        }
    }

    /// Create a warning.
    pub fn warning(code: DiagnosticData, data: String, index: usize) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            data,
            index,
        }
    }

    /// Whether this diagnostic reports an exhausted parser or lexer limit.
    pub fn is_limit(&self) -> bool {
        matches!(
            self.code,
            DiagnosticData::TokenLimitReached | DiagnosticData::RecursionLimitReached
        )
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> &DiagnosticData {
        &self.code
    }

    /// The rendered message for this diagnostic.
    pub fn message(&self) -> String {
        self.code.to_string()
    }

    /// The offending source text.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Where the offending text begins in the input.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.index;
        let end = self.index + self.data.len();
        let tag = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        if self.data.is_empty() {
            write!(f, "{}@{}:{} {:?}", tag, start, end, self.message())
        } else {
            write!(f, "{}@{}:{} {:?} {}", tag, start, end, self.message(), self.data)
        }
    }
}

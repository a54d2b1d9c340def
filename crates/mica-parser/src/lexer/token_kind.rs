/// The kinds of token the lexer produces: C99 punctuators, keywords and the
/// three literal classes, plus identifiers and a distinguished end-of-file
/// token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LParen,        // (
    RParen,        // )
    LBracket,      // [
    RBracket,      // ]
    LBrace,        // {
    RBrace,        // }
    Semicolon,     // ;
    Comma,         // ,
    Colon,         // :
    Question,      // ?
    Dot,           // .
    Arrow,         // ->
    Tilde,         // ~
    Bang,          // !
    Plus,          // +
    Minus,         // -
    Star,          // *
    Slash,         // /
    Percent,       // %
    PlusPlus,      // ++
    MinusMinus,    // --
    Amp,           // &
    Pipe,          // |
    Caret,         // ^
    AmpAmp,        // &&
    PipePipe,      // ||
    Shl,           // <<
    Shr,           // >>
    Lt,            // <
    Gt,            // >
    LtEq,          // <=
    GtEq,          // >=
    EqEq,          // ==
    NotEq,         // !=
    Assign,        // =
    PlusAssign,    // +=
    MinusAssign,   // -=
    StarAssign,    // *=
    SlashAssign,   // /=
    PercentAssign, // %=
    ShlAssign,     // <<=
    ShrAssign,     // >>=
    AmpAssign,     // &=
    PipeAssign,    // |=
    CaretAssign,   // ^=

    Void,
    Char,
    Int,
    Long,
    Float,
    Bool,
    Struct,
    Typedef,
    If,
    Else,
    While,
    Do,
    For,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Goto,
    Thread,

    Ident,
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,

    Eof,
}

impl TokenKind {
    /// The keyword kind for an identifier spelling, if it is one.
    pub(crate) fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "void" => TokenKind::Void,
            "char" => TokenKind::Char,
            "int" => TokenKind::Int,
            "long" => TokenKind::Long,
            "float" => TokenKind::Float,
            "bool" => TokenKind::Bool,
            "struct" => TokenKind::Struct,
            "typedef" => TokenKind::Typedef,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "for" => TokenKind::For,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "goto" => TokenKind::Goto,
            "thread" => TokenKind::Thread,
            _ => return None,
        };
        Some(kind)
    }

    /// How this kind reads in a diagnostic.
    pub(crate) fn describe(self) -> &'static str {
        match self {
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Question => "`?`",
            TokenKind::Dot => "`.`",
            TokenKind::Arrow => "`->`",
            TokenKind::Tilde => "`~`",
            TokenKind::Bang => "`!`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::Amp => "`&`",
            TokenKind::Pipe => "`|`",
            TokenKind::Caret => "`^`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::PipePipe => "`||`",
            TokenKind::Shl => "`<<`",
            TokenKind::Shr => "`>>`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::LtEq => "`<=`",
            TokenKind::GtEq => "`>=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Assign => "`=`",
            TokenKind::PlusAssign => "`+=`",
            TokenKind::MinusAssign => "`-=`",
            TokenKind::StarAssign => "`*=`",
            TokenKind::SlashAssign => "`/=`",
            TokenKind::PercentAssign => "`%=`",
            TokenKind::ShlAssign => "`<<=`",
            TokenKind::ShrAssign => "`>>=`",
            TokenKind::AmpAssign => "`&=`",
            TokenKind::PipeAssign => "`|=`",
            TokenKind::CaretAssign => "`^=`",
            TokenKind::Void => "`void`",
            TokenKind::Char => "`char`",
            TokenKind::Int => "`int`",
            TokenKind::Long => "`long`",
            TokenKind::Float => "`float`",
            TokenKind::Bool => "`bool`",
            TokenKind::Struct => "`struct`",
            TokenKind::Typedef => "`typedef`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::While => "`while`",
            TokenKind::Do => "`do`",
            TokenKind::For => "`for`",
            TokenKind::Switch => "`switch`",
            TokenKind::Case => "`case`",
            TokenKind::Default => "`default`",
            TokenKind::Break => "`break`",
            TokenKind::Continue => "`continue`",
            TokenKind::Return => "`return`",
            TokenKind::Goto => "`goto`",
            TokenKind::Thread => "`thread`",
            TokenKind::Ident => "an identifier",
            TokenKind::IntLiteral => "an integer literal",
            TokenKind::FloatLiteral => "a float literal",
            TokenKind::CharLiteral => "a character literal",
            TokenKind::StringLiteral => "a string literal",
            TokenKind::Eof => "end of file",
        }
    }
}

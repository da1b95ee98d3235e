use std::fmt;

/// The kind of a [`SimpleToken`].
///
/// The set is closed. Grammar rules never look at token text directly when a
/// kind query answers the question, so the `is_*` helpers below carry the
/// escaping and operator rules of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// End of the input. Synthesized by the cursor, never scanned.
    Eol,

    /// Any character that is not part of a known token.
    Character,

    /// A space, tab, newline or carriage return.
    Whitespace,

    /// A backslash escape.
    ///
    /// # Examples
    /// ```text
    /// \n
    /// \}
    /// ```
    Escape,

    /// Start of a function block.
    ///
    /// # Examples
    /// ```text
    /// ${
    /// $simple{
    /// ```
    FunctionStart,

    /// End of a function block (`}`).
    FunctionEnd,

    /// `'`
    SingleQuote,

    /// `"`
    DoubleQuote,

    /// Digits, optionally with `.` or `,` decimal separators.
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0.02
    /// 1,5
    /// ```
    NumericValue,

    /// `true` or `false`
    BooleanValue,

    /// `null`
    NullValue,

    /// `++` or `--`, only directly after a function end.
    ///
    /// # Examples
    /// ```text
    /// ${header.counter}++
    /// ```
    UnaryOperator,

    /// Comparison operators of the predicate grammar.
    ///
    /// # Examples
    /// ```text
    /// ==
    /// not contains
    /// starts with
    /// ```
    BinaryOperator,

    /// `&&` or `||`
    LogicalOperator,

    /// The two halves of a ternary, `?` and `:`.
    ///
    /// # Examples
    /// ```text
    /// ${header.vip} ? 'gold' : 'silver'
    /// ```
    TernaryOperator,

    /// `~>`, feeds the left result into the right side as the body.
    ///
    /// # Examples
    /// ```text
    /// ${body} ~> ${trim()} ~> ${uppercase()}
    /// ```
    ChainOperator,

    /// Operators that fit no other group, currently the elvis `?:`.
    OtherOperator,

    /// `:=` inside an init block.
    InitOperator,

    /// `$$name` inside an init block.
    InitVariable,

    /// A bare `-` that may prefix a numeric right hand side.
    MinusValue,
}

impl TokenType {
    pub fn is_eol(self) -> bool {
        self == TokenType::Eol
    }

    pub fn is_whitespace(self) -> bool {
        self == TokenType::Whitespace
    }

    pub fn is_character(self) -> bool {
        self == TokenType::Character
    }

    pub fn is_escape(self) -> bool {
        self == TokenType::Escape
    }

    pub fn is_function_start(self) -> bool {
        self == TokenType::FunctionStart
    }

    pub fn is_function_end(self) -> bool {
        self == TokenType::FunctionEnd
    }

    pub fn is_single_quote(self) -> bool {
        self == TokenType::SingleQuote
    }

    pub fn is_double_quote(self) -> bool {
        self == TokenType::DoubleQuote
    }

    pub fn is_quote(self) -> bool {
        self.is_single_quote() || self.is_double_quote()
    }

    pub fn is_numeric_value(self) -> bool {
        self == TokenType::NumericValue
    }

    pub fn is_boolean_value(self) -> bool {
        self == TokenType::BooleanValue
    }

    pub fn is_null_value(self) -> bool {
        self == TokenType::NullValue
    }

    pub fn is_minus_value(self) -> bool {
        self == TokenType::MinusValue
    }

    pub fn is_unary(self) -> bool {
        self == TokenType::UnaryOperator
    }

    pub fn is_binary(self) -> bool {
        self == TokenType::BinaryOperator
    }

    pub fn is_logical(self) -> bool {
        self == TokenType::LogicalOperator
    }

    pub fn is_ternary(self) -> bool {
        self == TokenType::TernaryOperator
    }

    pub fn is_chain(self) -> bool {
        self == TokenType::ChainOperator
    }

    pub fn is_other(self) -> bool {
        self == TokenType::OtherOperator
    }

    pub fn is_init_operator(self) -> bool {
        self == TokenType::InitOperator
    }

    pub fn is_init_variable(self) -> bool {
        self == TokenType::InitVariable
    }

    /// Operators of the expression grammar that take a left and a right operand.
    pub fn is_expression_operator(self) -> bool {
        self.is_ternary() || self.is_chain() || self.is_other()
    }

    /// Tokens whose neighbouring whitespace carries no meaning.
    pub fn trims_whitespace(self) -> bool {
        self.is_expression_operator() || self.is_init_operator() || self.is_init_variable()
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Eol => "eol",
            TokenType::Character => "character",
            TokenType::Whitespace => "whiteSpace",
            TokenType::Escape => "escape",
            TokenType::FunctionStart => "functionStart",
            TokenType::FunctionEnd => "functionEnd",
            TokenType::SingleQuote => "singleQuote",
            TokenType::DoubleQuote => "doubleQuote",
            TokenType::NumericValue => "numericValue",
            TokenType::BooleanValue => "booleanValue",
            TokenType::NullValue => "nullValue",
            TokenType::UnaryOperator => "unaryOperator",
            TokenType::BinaryOperator => "binaryOperator",
            TokenType::LogicalOperator => "logicalOperator",
            TokenType::TernaryOperator => "ternaryOperator",
            TokenType::ChainOperator => "chainOperator",
            TokenType::OtherOperator => "otherOperator",
            TokenType::InitOperator => "initOperator",
            TokenType::InitVariable => "initVariable",
            TokenType::MinusValue => "minusValue",
        };
        f.write_str(name)
    }
}

/// A token scanned from the expression text.
///
/// `index` is the character position the token starts at and `length` is how
/// far the cursor moves past it. For escapes the two differ from `text`: `\n`
/// has the text of a newline but a length of 2.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleToken {
    pub kind: TokenType,
    pub text: String,
    pub index: usize,
    pub length: usize,
}

impl SimpleToken {
    pub fn new(kind: TokenType, text: impl Into<String>, index: usize) -> Self {
        let text = text.into();
        let length = text.chars().count();
        SimpleToken {
            kind,
            text,
            index,
            length,
        }
    }

    pub fn with_length(kind: TokenType, text: impl Into<String>, index: usize, length: usize) -> Self {
        SimpleToken {
            kind,
            text: text.into(),
            index,
            length,
        }
    }

    pub fn eol(index: usize) -> Self {
        SimpleToken::with_length(TokenType::Eol, "", index, 0)
    }
}

impl fmt::Display for SimpleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

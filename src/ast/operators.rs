use std::fmt;

/// Binary operators of the predicate grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Equal (`==`)
    Equal,
    /// Equal ignoring case (`=~`)
    EqualIgnoreCase,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Not equal (`!=`)
    NotEqual,
    /// Not equal ignoring case (`!=~`)
    NotEqualIgnoreCase,
    /// Substring or element test (`contains`)
    Contains,
    /// `!contains` or `not contains`
    NotContains,
    /// Case insensitive contains (`~~`)
    ContainsIgnoreCase,
    /// `!~~`
    NotContainsIgnoreCase,
    /// Regular expression match (`regex`)
    Regex,
    /// `!regex` or `not regex`
    NotRegex,
    /// Membership in a comma separated list (`in`)
    In,
    /// `!in` or `not in`
    NotIn,
    /// Type test (`is`)
    Is,
    /// `!is` or `not is`
    NotIs,
    /// Inclusive numeric range `from..to` (`range`)
    Range,
    /// `!range` or `not range`
    NotRange,
    /// `startsWith` or `starts with`
    StartsWith,
    /// `endsWith` or `ends with`
    EndsWith,
}

/// The kinds of right hand side a binary operator may be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Literal,
    LiteralWithFunction,
    Function,
    NumericValue,
    BooleanValue,
    NullValue,
    MinusValue,
}

impl BinaryOperator {
    /// Operator spellings in the order the tokenizer must try them.
    pub const TOKENS: &'static [&'static str] = &[
        "==",
        "=~",
        ">=",
        "<=",
        ">",
        "<",
        "!=~",
        "!=",
        "not is",
        "!is",
        "is",
        "not contains",
        "!contains",
        "contains",
        "!~~",
        "~~",
        "not regex",
        "!regex",
        "regex",
        "not in",
        "!in",
        "in",
        "not range",
        "!range",
        "range",
        "startsWith",
        "starts with",
        "endsWith",
        "ends with",
    ];

    pub fn from_text(text: &str) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        let op = match text {
            "==" => Equal,
            "=~" => EqualIgnoreCase,
            ">" => GreaterThan,
            ">=" => GreaterEqual,
            "<" => LessThan,
            "<=" => LessEqual,
            "!=" => NotEqual,
            "!=~" => NotEqualIgnoreCase,
            "contains" => Contains,
            "!contains" | "not contains" => NotContains,
            "~~" => ContainsIgnoreCase,
            "!~~" => NotContainsIgnoreCase,
            "regex" => Regex,
            "!regex" | "not regex" => NotRegex,
            "in" => In,
            "!in" | "not in" => NotIn,
            "is" => Is,
            "!is" | "not is" => NotIs,
            "range" => Range,
            "!range" | "not range" => NotRange,
            "startsWith" | "starts with" => StartsWith,
            "endsWith" | "ends with" => EndsWith,
            _ => return None,
        };
        Some(op)
    }

    /// Right hand side kinds this operator accepts. An empty slice means all of them.
    pub fn supported_parameter_types(self) -> &'static [ParameterType] {
        use BinaryOperator::*;
        use ParameterType::*;
        match self {
            Contains | NotContains | ContainsIgnoreCase | NotContainsIgnoreCase => {
                &[LiteralWithFunction, Function, NumericValue]
            }
            Regex | NotRegex | In | NotIn | Is | NotIs | Range | NotRange | StartsWith
            | EndsWith => &[LiteralWithFunction, Function],
            _ => &[],
        }
    }

    /// Whether the operator inverts its positive counterpart.
    pub fn is_negated(self) -> bool {
        use BinaryOperator::*;
        matches!(
            self,
            NotEqual
                | NotEqualIgnoreCase
                | NotContains
                | NotContainsIgnoreCase
                | NotRegex
                | NotIn
                | NotIs
                | NotRange
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOperator::*;
        let text = match self {
            Equal => "==",
            EqualIgnoreCase => "=~",
            GreaterThan => ">",
            GreaterEqual => ">=",
            LessThan => "<",
            LessEqual => "<=",
            NotEqual => "!=",
            NotEqualIgnoreCase => "!=~",
            Contains => "contains",
            NotContains => "not contains",
            ContainsIgnoreCase => "~~",
            NotContainsIgnoreCase => "!~~",
            Regex => "regex",
            NotRegex => "not regex",
            In => "in",
            NotIn => "not in",
            Is => "is",
            NotIs => "not is",
            Range => "range",
            NotRange => "not range",
            StartsWith => "startsWith",
            EndsWith => "endsWith",
        };
        f.write_str(text)
    }
}

/// Logical operators (`&&`, `||`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub const TOKENS: &'static [&'static str] = &["&&", "||"];

    pub fn from_text(text: &str) -> Option<LogicalOperator> {
        match text {
            "&&" => Some(LogicalOperator::And),
            "||" => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("&&"),
            LogicalOperator::Or => f.write_str("||"),
        }
    }
}

/// Unary operators, applied to the function result on their left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Increment,
    Decrement,
}

impl UnaryOperator {
    pub const TOKENS: &'static [&'static str] = &["++", "--"];

    pub fn from_text(text: &str) -> Option<UnaryOperator> {
        match text {
            "++" => Some(UnaryOperator::Increment),
            "--" => Some(UnaryOperator::Decrement),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Increment => f.write_str("++"),
            UnaryOperator::Decrement => f.write_str("--"),
        }
    }
}

/// The two halves of `condition ? when_true : when_false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TernaryOperator {
    Condition,
    Otherwise,
}

impl TernaryOperator {
    pub const TOKENS: &'static [&'static str] = &["?", ":"];

    pub fn from_text(text: &str) -> Option<TernaryOperator> {
        match text {
            "?" => Some(TernaryOperator::Condition),
            ":" => Some(TernaryOperator::Otherwise),
            _ => None,
        }
    }
}

impl fmt::Display for TernaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TernaryOperator::Condition => f.write_str("?"),
            TernaryOperator::Otherwise => f.write_str(":"),
        }
    }
}

/// Operators without a group of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtherOperator {
    /// `?:` returns the left value unless it is null, false, empty or zero.
    Elvis,
}

impl OtherOperator {
    pub const TOKENS: &'static [&'static str] = &["?:"];

    pub fn from_text(text: &str) -> Option<OtherOperator> {
        match text {
            "?:" => Some(OtherOperator::Elvis),
            _ => None,
        }
    }
}

impl fmt::Display for OtherOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OtherOperator::Elvis => f.write_str("?:"),
        }
    }
}

/// `~>`
pub const CHAIN_OPERATOR: &str = "~>";

/// `:=`
pub const INIT_OPERATOR: &str = ":=";

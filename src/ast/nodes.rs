use super::{
    operators::{BinaryOperator, LogicalOperator, OtherOperator, TernaryOperator, UnaryOperator},
    tokens::{SimpleToken, TokenType},
};
use crate::{
    evaluator::{BinaryPredicate, Expression, Predicate},
    function::{Function, split_call},
    parser::SimpleParserError,
    value::Value,
};

type Child = Option<Box<SimpleNode>>;

/// A node of the parsed expression, wrapping the token it was created from.
///
/// Parsing first produces a flat list of nodes. The shaping passes then move
/// nodes into the blocks and operators that own them, so after parsing the
/// list holds only top level nodes.
#[derive(Debug, Clone)]
pub struct SimpleNode {
    pub token: SimpleToken,
    pub kind: NodeKind,
}

/// The closed set of node kinds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Literal text, grown token by token while parsing
    Literal(String),

    /// A number literal
    ///
    /// # Examples
    /// ```text
    /// ${header.age} > 18
    /// ${header.delta} == -5
    /// ```
    Numeric(String),

    Boolean(bool),

    Null,

    /// `++` / `--` applied to the function on its left
    Unary { operator: UnaryOperator, left: Child },

    /// A comparison of the predicate grammar
    Binary {
        operator: BinaryOperator,
        left: Child,
        right: Child,
    },

    /// `&&` / `||`
    Logical {
        operator: LogicalOperator,
        left: Child,
        right: Child,
    },

    /// `?` takes all three operands; a `:` node only marks the split and is
    /// consumed by its `?`
    Ternary {
        operator: TernaryOperator,
        condition: Child,
        when_true: Child,
        when_false: Child,
    },

    /// `~>`
    Chain { left: Child, right: Child },

    /// `?:`
    Other {
        operator: OtherOperator,
        left: Child,
        right: Child,
    },

    /// `$$name := value` of an init block. The value may span several nodes.
    Init { left: Child, right: Vec<SimpleNode> },

    FunctionStart { children: Vec<SimpleNode> },
    FunctionEnd,
    SingleQuoteStart { children: Vec<SimpleNode> },
    SingleQuoteEnd,
    DoubleQuoteStart { children: Vec<SimpleNode> },
    DoubleQuoteEnd,
}

impl SimpleNode {
    pub fn new(token: SimpleToken, kind: NodeKind) -> Self {
        SimpleNode { token, kind }
    }

    /// A literal node starting out with the token's text.
    pub fn literal(token: SimpleToken) -> Self {
        let text = token.text.clone();
        SimpleNode::new(token, NodeKind::Literal(text))
    }

    /// The operator node for an operator token, if it is one.
    pub fn operator(token: SimpleToken) -> Option<Self> {
        let kind = match token.kind {
            TokenType::UnaryOperator => NodeKind::Unary {
                operator: UnaryOperator::from_text(&token.text)?,
                left: None,
            },
            TokenType::BinaryOperator => NodeKind::Binary {
                operator: BinaryOperator::from_text(&token.text)?,
                left: None,
                right: None,
            },
            TokenType::LogicalOperator => NodeKind::Logical {
                operator: LogicalOperator::from_text(&token.text)?,
                left: None,
                right: None,
            },
            TokenType::TernaryOperator => NodeKind::Ternary {
                operator: TernaryOperator::from_text(&token.text)?,
                condition: None,
                when_true: None,
                when_false: None,
            },
            TokenType::ChainOperator => NodeKind::Chain {
                left: None,
                right: None,
            },
            TokenType::OtherOperator => NodeKind::Other {
                operator: OtherOperator::from_text(&token.text)?,
                left: None,
                right: None,
            },
            TokenType::InitOperator => NodeKind::Init {
                left: None,
                right: Vec::new(),
            },
            _ => return None,
        };
        Some(SimpleNode::new(token, kind))
    }

    /// Append text to a literal node. Other kinds ignore it.
    pub fn add_text(&mut self, text: &str) {
        if let NodeKind::Literal(literal) = &mut self.kind {
            literal.push_str(text);
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Literal(text) | NodeKind::Numeric(text) => Some(text),
            _ => None,
        }
    }

    /// A `$$name` literal of an init block.
    pub fn is_init_variable(&self) -> bool {
        matches!(self.kind, NodeKind::Literal(_)) && self.token.kind.is_init_variable()
    }

    pub fn is_block_start(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::FunctionStart { .. } | NodeKind::SingleQuoteStart { .. } | NodeKind::DoubleQuoteStart { .. }
        )
    }

    pub fn is_block_end(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::FunctionEnd | NodeKind::SingleQuoteEnd | NodeKind::DoubleQuoteEnd
        )
    }

    /// Whether this end node closes the given start node.
    pub fn closes(&self, start: &SimpleNode) -> bool {
        matches!(
            (&self.kind, &start.kind),
            (NodeKind::FunctionEnd, NodeKind::FunctionStart { .. })
                | (NodeKind::SingleQuoteEnd, NodeKind::SingleQuoteStart { .. })
                | (NodeKind::DoubleQuoteEnd, NodeKind::DoubleQuoteStart { .. })
        )
    }

    /// Human readable name of a block, used in error messages.
    pub fn block_name(&self) -> &'static str {
        match self.kind {
            NodeKind::FunctionStart { .. } | NodeKind::FunctionEnd => "function",
            NodeKind::SingleQuoteStart { .. } | NodeKind::SingleQuoteEnd => "single quote",
            NodeKind::DoubleQuoteStart { .. } | NodeKind::DoubleQuoteEnd => "double quote",
            _ => "node",
        }
    }

    /// Blocks hold literal text and embedded functions only.
    pub fn accepts_child(&self, node: &SimpleNode) -> bool {
        self.is_block_start()
            && matches!(node.kind, NodeKind::Literal(_) | NodeKind::FunctionStart { .. })
    }

    /// Add a child to a block. Returns false when the node is refused.
    pub fn accept_and_add_node(&mut self, node: SimpleNode) -> bool {
        if !self.accepts_child(&node) {
            return false;
        }
        match &mut self.kind {
            NodeKind::FunctionStart { children }
            | NodeKind::SingleQuoteStart { children }
            | NodeKind::DoubleQuoteStart { children } => {
                children.push(node);
                true
            }
            _ => false,
        }
    }

    /// An operator node that has not been linked to its operands yet.
    pub fn is_unlinked_operator(&self) -> bool {
        match &self.kind {
            NodeKind::Unary { left, .. }
            | NodeKind::Binary { left, .. }
            | NodeKind::Logical { left, .. }
            | NodeKind::Chain { left, .. }
            | NodeKind::Other { left, .. }
            | NodeKind::Init { left, .. } => left.is_none(),
            NodeKind::Ternary { condition, .. } => condition.is_none(),
            _ => false,
        }
    }

    /// `"Binary operator =="`, `"Chain operator ~>"` and so on.
    pub fn describe(&self) -> String {
        let group = match self.kind {
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Logical { .. } => "Logical",
            NodeKind::Ternary { .. } => "Ternary",
            NodeKind::Chain { .. } => "Chain",
            NodeKind::Other { .. } => "Other",
            NodeKind::Init { .. } => "Init",
            _ => return self.token.text.clone(),
        };
        format!("{} operator {}", group, self.token.text)
    }

    pub fn accepts_left(&self, left: &SimpleNode) -> bool {
        match self.kind {
            NodeKind::Unary { .. } => matches!(left.kind, NodeKind::FunctionStart { .. }),
            NodeKind::Binary { .. } => {
                !left.is_unlinked_operator()
                    && !matches!(left.kind, NodeKind::Binary { .. } | NodeKind::Logical { .. })
            }
            NodeKind::Init { .. } => left.is_init_variable(),
            _ => !left.is_unlinked_operator(),
        }
    }

    pub fn accepts_right(&self, right: &SimpleNode) -> bool {
        match self.kind {
            NodeKind::Binary { .. } => {
                !right.is_unlinked_operator()
                    && !matches!(right.kind, NodeKind::Binary { .. } | NodeKind::Logical { .. })
            }
            NodeKind::Logical { .. } => {
                !right.is_unlinked_operator() && !matches!(right.kind, NodeKind::Logical { .. })
            }
            NodeKind::Init { .. } => !right.is_init_variable(),
            _ => !right.is_unlinked_operator(),
        }
    }

    /// Link the left operand. Callers check [`SimpleNode::accepts_left`] first.
    pub fn set_left(&mut self, node: SimpleNode) {
        match &mut self.kind {
            NodeKind::Unary { left, .. }
            | NodeKind::Binary { left, .. }
            | NodeKind::Logical { left, .. }
            | NodeKind::Chain { left, .. }
            | NodeKind::Other { left, .. }
            | NodeKind::Init { left, .. } => *left = Some(Box::new(node)),
            NodeKind::Ternary { condition, .. } => *condition = Some(Box::new(node)),
            _ => {}
        }
    }

    /// Link the right operand. Init nodes collect every value node.
    pub fn set_right(&mut self, node: SimpleNode) {
        match &mut self.kind {
            NodeKind::Binary { right, .. }
            | NodeKind::Logical { right, .. }
            | NodeKind::Chain { right, .. }
            | NodeKind::Other { right, .. } => *right = Some(Box::new(node)),
            NodeKind::Init { right, .. } => right.push(node),
            _ => {}
        }
    }

    /// Link both branches of a `?` node.
    pub fn set_branches(&mut self, true_node: SimpleNode, false_node: SimpleNode) {
        if let NodeKind::Ternary {
            when_true,
            when_false,
            ..
        } = &mut self.kind
        {
            *when_true = Some(Box::new(true_node));
            *when_false = Some(Box::new(false_node));
        }
    }

    /// The text of a function block with embedded functions written back out.
    pub fn function_text(&self) -> String {
        let mut text = String::new();
        if let NodeKind::FunctionStart { children } = &self.kind {
            for child in children {
                match &child.kind {
                    NodeKind::FunctionStart { .. } => {
                        text.push_str(&child.token.text);
                        text.push_str(&child.function_text());
                        text.push('}');
                    }
                    _ => text.push_str(child.text().unwrap_or(&child.token.text)),
                }
            }
        }
        text
    }

    fn missing(&self, side: &str) -> SimpleParserError {
        SimpleParserError::new(
            format!("{} has no {} hand side token", self.describe(), side),
            self.token.index,
        )
    }

    fn compile_child(child: &SimpleNode, allow_escape: bool) -> Result<Expression, SimpleParserError> {
        Ok(child
            .create_expression(allow_escape)?
            .unwrap_or_else(|| Expression::constant("")))
    }

    fn compile_operand(&self, child: &Child, side: &str, allow_escape: bool) -> Result<Expression, SimpleParserError> {
        match child {
            Some(node) => Self::compile_child(node, allow_escape),
            None => Err(self.missing(side)),
        }
    }

    fn compile_all(nodes: &[SimpleNode], allow_escape: bool) -> Result<Vec<Expression>, SimpleParserError> {
        let mut parts = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(expression) = node.create_expression(allow_escape)? {
                parts.push(expression);
            }
        }
        Ok(parts)
    }

    /// Compile this node and its children. Block ends compile to nothing.
    pub fn create_expression(&self, allow_escape: bool) -> Result<Option<Expression>, SimpleParserError> {
        let expression = match &self.kind {
            NodeKind::Literal(text) => Expression::constant(text.as_str()),
            NodeKind::Numeric(text) => Expression::Constant(numeric_value(text)),
            NodeKind::Boolean(b) => Expression::constant(*b),
            NodeKind::Null => Expression::Constant(Value::Null),

            NodeKind::FunctionStart { children } => self.compile_function(children, allow_escape)?,

            NodeKind::SingleQuoteStart { children } | NodeKind::DoubleQuoteStart { children } => {
                Expression::from_parts(Self::compile_all(children, allow_escape)?)
            }

            NodeKind::Unary { operator, left } => Expression::Unary {
                operator: *operator,
                operand: Box::new(self.compile_operand(left, "left", allow_escape)?),
            },

            NodeKind::Binary {
                operator,
                left,
                right,
            } => {
                let left_expression = self.compile_operand(left, "left", allow_escape)?;
                let right_expression = self.compile_operand(right, "right", allow_escape)?;
                let index = right.as_ref().map_or(self.token.index, |r| r.token.index);
                let binary = BinaryPredicate::new(*operator, left_expression, right_expression)
                    .map_err(|message| SimpleParserError::new(message, index))?;
                Expression::Predicate(Box::new(Predicate::Binary(binary)))
            }

            NodeKind::Logical {
                operator,
                left,
                right,
            } => {
                let left = Predicate::from_expression(self.compile_operand(left, "left", allow_escape)?);
                let right = Predicate::from_expression(self.compile_operand(right, "right", allow_escape)?);
                Expression::Predicate(Box::new(Predicate::Logical {
                    operator: *operator,
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }

            NodeKind::Ternary {
                operator: TernaryOperator::Otherwise,
                ..
            } => {
                return Err(SimpleParserError::new(
                    "Ternary operator : has no matching ? token",
                    self.token.index,
                ));
            }

            NodeKind::Ternary {
                condition,
                when_true,
                when_false,
                ..
            } => Expression::Ternary {
                condition: Box::new(self.compile_operand(condition, "left", allow_escape)?),
                when_true: Box::new(self.compile_operand(when_true, "right", allow_escape)?),
                when_false: Box::new(self.compile_operand(when_false, "right", allow_escape)?),
            },

            NodeKind::Chain { left, right } => Expression::Chain {
                left: Box::new(self.compile_operand(left, "left", allow_escape)?),
                right: Box::new(self.compile_operand(right, "right", allow_escape)?),
            },

            NodeKind::Other { left, right, .. } => Expression::Elvis {
                left: Box::new(self.compile_operand(left, "left", allow_escape)?),
                right: Box::new(self.compile_operand(right, "right", allow_escape)?),
            },

            NodeKind::Init { left, right } => {
                let Some(variable) = left else {
                    return Err(self.missing("left"));
                };
                if right.is_empty() {
                    return Err(self.missing("right"));
                }
                Expression::Init {
                    name: variable.token.text.trim_start_matches('$').to_string(),
                    value: Box::new(Expression::from_parts(Self::compile_all(right, allow_escape)?)),
                }
            }

            NodeKind::FunctionEnd | NodeKind::SingleQuoteEnd | NodeKind::DoubleQuoteEnd => return Ok(None),
        };
        Ok(Some(expression))
    }

    fn compile_function(&self, children: &[SimpleNode], allow_escape: bool) -> Result<Expression, SimpleParserError> {
        let text = self.function_text();
        let embedded = children
            .iter()
            .any(|child| matches!(child.kind, NodeKind::FunctionStart { .. }));

        if embedded && split_call(text.trim()).is_none() {
            return Ok(Expression::Dynamic {
                parts: Self::compile_all(children, allow_escape)?,
                allow_escape,
            });
        }

        Function::parse(&text, allow_escape)
            .map(|function| Expression::Function(Box::new(function)))
            .map_err(|message| SimpleParserError::new(message, self.token.index))
    }

    /// Emit source code for this node.
    pub fn create_code(&self) -> Result<String, SimpleParserError> {
        let code = match &self.kind {
            NodeKind::Literal(text) => quote_code(text),
            NodeKind::Numeric(text) => text.clone(),
            NodeKind::Boolean(b) => b.to_string(),
            NodeKind::Null => "null".to_string(),
            NodeKind::FunctionStart { .. } => {
                format!("function(exchange, {})", quote_code(&self.function_text()))
            }
            NodeKind::SingleQuoteStart { children } | NodeKind::DoubleQuoteStart { children } => {
                if children.is_empty() {
                    "\"\"".to_string()
                } else {
                    join_code(children)?
                }
            }
            NodeKind::Unary { operator, left } => {
                let name = match operator {
                    UnaryOperator::Increment => "increment",
                    UnaryOperator::Decrement => "decrement",
                };
                format!("{}(exchange, {})", name, self.operand_code(left, "left")?)
            }
            NodeKind::Binary {
                operator,
                left,
                right,
            } => format!(
                "binary(exchange, {}, {}, {})",
                quote_code(&operator.to_string()),
                self.operand_code(left, "left")?,
                self.operand_code(right, "right")?
            ),
            NodeKind::Logical {
                operator,
                left,
                right,
            } => {
                let name = match operator {
                    LogicalOperator::And => "and",
                    LogicalOperator::Or => "or",
                };
                format!(
                    "{}(exchange, {}, {})",
                    name,
                    self.operand_code(left, "left")?,
                    self.operand_code(right, "right")?
                )
            }
            NodeKind::Ternary {
                condition,
                when_true,
                when_false,
                ..
            } => format!(
                "ternary(exchange, {}, {}, {})",
                self.operand_code(condition, "left")?,
                self.operand_code(when_true, "right")?,
                self.operand_code(when_false, "right")?
            ),
            NodeKind::Chain { left, right } => format!(
                "chain(exchange, {}, {})",
                self.operand_code(left, "left")?,
                self.operand_code(right, "right")?
            ),
            NodeKind::Other { left, right, .. } => format!(
                "elvis(exchange, {}, {})",
                self.operand_code(left, "left")?,
                self.operand_code(right, "right")?
            ),
            NodeKind::Init { left, right } => {
                let Some(variable) = left else {
                    return Err(self.missing("left"));
                };
                format!(
                    "init(exchange, {}, {})",
                    quote_code(variable.token.text.trim_start_matches('$')),
                    join_code(right)?
                )
            }
            NodeKind::FunctionEnd | NodeKind::SingleQuoteEnd | NodeKind::DoubleQuoteEnd => String::new(),
        };
        Ok(code)
    }

    fn operand_code(&self, child: &Child, side: &str) -> Result<String, SimpleParserError> {
        match child {
            Some(node) => node.create_code(),
            None => Err(self.missing(side)),
        }
    }
}

/// Code for a list of nodes joined as string concatenation.
pub fn join_code(nodes: &[SimpleNode]) -> Result<String, SimpleParserError> {
    let mut parts = Vec::new();
    for node in nodes {
        let code = node.create_code()?;
        if !code.is_empty() {
            parts.push(code);
        }
    }
    Ok(parts.join(" + "))
}

/// A double quoted source literal.
pub fn quote_code(text: &str) -> String {
    let mut code = String::with_capacity(text.len() + 2);
    code.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => code.push_str("\\\\"),
            '"' => code.push_str("\\\""),
            '\n' => code.push_str("\\n"),
            '\t' => code.push_str("\\t"),
            '\r' => code.push_str("\\r"),
            other => code.push(other),
        }
    }
    code.push('"');
    code
}

/// Integers stay integers; text that is no number stays text.
pub fn numeric_value(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::Integer(n);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::String(text.to_string()),
    }
}

/// Whether literal text is a plain integer or floating point number.
pub fn is_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() {
        return false;
    }
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.is_none_or(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenType, text: &str, index: usize) -> SimpleToken {
        SimpleToken::new(kind, text, index)
    }

    #[test]
    fn test_is_number() {
        for text in ["0", "42", "-5", "3.14", "-0.5"] {
            assert!(is_number(text), "{}", text);
        }
        for text in ["", "-", "1.", ".5", "1,5", "1.2.3", "abc"] {
            assert!(!is_number(text), "{}", text);
        }
    }

    #[test]
    fn test_blocks_accept_literals_and_functions_only() {
        let mut function = SimpleNode::new(
            token(TokenType::FunctionStart, "${", 0),
            NodeKind::FunctionStart { children: vec![] },
        );
        assert!(function.accept_and_add_node(SimpleNode::literal(token(TokenType::Character, "b", 2))));
        let binary = SimpleNode::operator(token(TokenType::BinaryOperator, "==", 3)).unwrap();
        assert!(!function.accept_and_add_node(binary));
    }

    #[test]
    fn test_describe_and_missing_operand() {
        let node = SimpleNode::operator(token(TokenType::ChainOperator, "~>", 7)).unwrap();
        assert_eq!(node.describe(), "Chain operator ~>");
        let err = node.create_expression(true).unwrap_err();
        assert_eq!(err.message, "Chain operator ~> has no left hand side token");
        assert_eq!(err.index, 7);
    }

    #[test]
    fn test_quote_code() {
        assert_eq!(quote_code("say \"hi\"\n"), r#""say \"hi\"\n""#);
    }
}

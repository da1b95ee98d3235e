//! Init blocks: `$init{ $$name := value }init$` ahead of the template.

use log::debug;

use super::{SimpleParserError, expression::{ExpressionParser, compile_nodes}};
use crate::{
    ast::{NodeKind, SimpleNode, nodes::join_code},
    evaluator::Expression,
};

const INIT_START: &str = "$init{";
const INIT_END: &str = "}init$";

/// Whether the text opens with an init block.
pub fn has_init_block(expression: &str) -> bool {
    expression.trim_start().starts_with(INIT_START)
}

/// An expression split at its init block.
pub(super) struct InitBlock {
    preamble: String,
    preamble_start: usize,
    // the text after `}init$` without its leading whitespace
    remainder: Vec<char>,
    remainder_start: usize,
}

pub(super) fn split_init_block(expression: &str) -> Result<Option<InitBlock>, SimpleParserError> {
    if !has_init_block(expression) {
        return Ok(None);
    }
    let chars: Vec<char> = expression.chars().collect();
    let start = chars.iter().take_while(|c| c.is_whitespace()).count();
    let preamble_start = start + INIT_START.chars().count();

    let end_marker: Vec<char> = INIT_END.chars().collect();
    let Some(end) = chars[preamble_start..]
        .windows(end_marker.len())
        .position(|window| window == end_marker.as_slice())
        .map(|offset| preamble_start + offset)
    else {
        return Err(SimpleParserError::new(
            format!("init block has no ending token {}", INIT_END),
            start,
        ));
    };

    let after = end + end_marker.len();
    let remainder_start = after + chars[after..].iter().take_while(|c| c.is_whitespace()).count();

    Ok(Some(InitBlock {
        preamble: chars[preamble_start..end].iter().collect(),
        preamble_start,
        remainder: chars[remainder_start..].to_vec(),
        remainder_start,
    }))
}

impl InitBlock {
    fn parse_preamble(&self, allow_escape: bool) -> Result<Vec<SimpleNode>, SimpleParserError> {
        ExpressionParser::for_init_block(&self.preamble, allow_escape)
            .parse_tokens()
            .map_err(|e| SimpleParserError::new(e.message, e.index + self.preamble_start))
    }

    /// Parse the text after the block with `$name` rewritten to a variable lookup.
    fn parse_remainder(&self, names: &[String], allow_escape: bool) -> Result<Vec<SimpleNode>, SimpleParserError> {
        let (text, positions) = rewrite_variables(&self.remainder, names);
        ExpressionParser::new(&text, allow_escape).parse_tokens().map_err(|e| {
            let index = positions
                .get(e.index)
                .copied()
                .unwrap_or(self.remainder.len());
            SimpleParserError::new(e.message, self.remainder_start + index)
        })
    }

    fn nodes(&self, allow_escape: bool) -> Result<Vec<SimpleNode>, SimpleParserError> {
        let mut nodes = self.parse_preamble(allow_escape)?;
        let names = declared_names(&nodes);
        debug!("init block declares {:?}", names);
        nodes.extend(self.parse_remainder(&names, allow_escape)?);
        Ok(nodes)
    }

    pub(super) fn parse(&self, allow_escape: bool) -> Result<Expression, SimpleParserError> {
        let nodes = self.nodes(allow_escape)?;
        compile_nodes(&nodes, allow_escape)
    }

    pub(super) fn code(&self, allow_escape: bool) -> Result<String, SimpleParserError> {
        join_code(&self.nodes(allow_escape)?)
    }
}

fn declared_names(nodes: &[SimpleNode]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::Init { left: Some(variable), .. } => {
                Some(variable.token.text.trim_start_matches('$').to_string())
            }
            _ => None,
        })
        .collect()
}

/// Replace `$name` of every declared name with `${variable.name}`.
///
/// Returns the new text and, for each of its characters, the position in the
/// input it came from.
fn rewrite_variables(input: &[char], names: &[String]) -> (String, Vec<usize>) {
    let mut text = String::with_capacity(input.len());
    let mut positions = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i] == '$' && (i == 0 || input[i - 1] != '$') {
            let end = i + 1 + input[i + 1..].iter().take_while(|c| is_identifier_char(**c)).count();
            let name: String = input[i + 1..end].iter().collect();
            if !name.is_empty() && names.contains(&name) {
                let replacement = format!("${{variable.{}}}", name);
                positions.extend(std::iter::repeat_n(i, replacement.chars().count()));
                text.push_str(&replacement);
                i = end;
                continue;
            }
        }
        text.push(input[i]);
        positions.push(i);
        i += 1;
    }
    (text, positions)
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_init_block() {
        let block = split_init_block("  $init{ $$a := 1 }init$\n  text").unwrap().unwrap();
        assert_eq!(block.preamble, " $$a := 1 ");
        assert_eq!(block.preamble_start, 8);
        assert_eq!(block.remainder.iter().collect::<String>(), "text");

        let err = split_init_block("$init{ $$a := 1").err().unwrap();
        assert_eq!(err.message, "init block has no ending token }init$");
        assert_eq!(err.index, 0);
    }

    #[test]
    fn test_rewrite_variables_respects_boundaries() {
        let input: Vec<char> = "$a and $ab and $$a".chars().collect();
        let (text, positions) = rewrite_variables(&input, &["a".to_string()]);
        assert_eq!(text, "${variable.a} and $ab and $$a");
        assert_eq!(positions.len(), text.chars().count());
        assert_eq!(positions[0], 0);
    }

    #[test]
    fn test_declared_names() {
        let block = split_init_block("$init{ $$first := 1 $$second := 'two' }init$").unwrap().unwrap();
        let nodes = block.parse_preamble(true).unwrap();
        assert_eq!(declared_names(&nodes), vec!["first".to_string(), "second".to_string()]);
    }
}

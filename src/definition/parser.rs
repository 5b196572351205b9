use tracing::trace;

use crate::{
    ast::BinaryOperator,
    definition::{
        ast::{Condition, Definition, Term},
        lexer::{Token, tokenize},
    },
    error::ParseError,
    interpreter::parser::core::ParseResult,
    operator::{Arity, Associativity, Fixedness, OperatorKey, OperatorRecord, OperatorRegistry},
};

/// The role an operator symbol plays at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Prefix,
    Postfix,
    Binary,
}

/// Parses definition text against the symbols of a registry.
///
/// Symbol runs are split by longest match for the role expected at the
/// current position; the unmatched remainder stays in place and is read
/// next.
pub struct DefinitionParser<'r> {
    registry: &'r OperatorRegistry,
    tokens:   Vec<(Token, usize)>,
    pos:      usize,
    end:      usize,
}

/// Parses a complete definition.
///
/// Grammar:
/// ```text
///     definition := lhs "=" "{" branch (";" branch)* "}"
///     lhs        := symbol ident | ident symbol | ident symbol ident
///     branch     := expr ("," ("if" condition | "else"))?
/// ```
///
/// # Errors
/// - `UnknownSymbol` if a symbol matches no registered operator in its role.
/// - `MissingElseBranch` if guarded branches are not closed by `else`.
/// - `UnexpectedTrailingTokens` if input remains after the closing brace.
/// - Any other lexing or parsing error.
///
/// # Example
/// ```
/// use opulse::{
///     definition::parser::parse_definition,
///     operator::{OperatorData, OperatorRegistry, seed::set_initial_operators},
/// };
///
/// let mut registry = OperatorRegistry::new();
/// set_initial_operators(&mut registry).unwrap();
/// registry.add(OperatorData::binary("⊕")).unwrap();
///
/// let definition = parse_definition("a⊕b = { a*b+1 }", &registry).unwrap();
/// assert_eq!(definition.params, vec!["a", "b"]);
/// assert!(definition.branches.is_empty());
/// ```
pub fn parse_definition(source: &str, registry: &OperatorRegistry) -> ParseResult<Definition> {
    let tokens = tokenize(source)?;
    let mut parser = DefinitionParser { registry,
                                        tokens,
                                        pos: 0,
                                        end: source.len() };
    let definition = parser.parse_definition()?;

    if let Some((tok, offset)) = parser.peek_entry() {
        return Err(ParseError::UnexpectedTrailingTokens { token:  format!("{tok:?}"),
                                                          offset: *offset, });
    }
    Ok(definition)
}

impl DefinitionParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_entry(&self) -> Option<&(Token, usize)> {
        self.tokens.get(self.pos)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, o)| *o)
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        match self.peek_entry() {
            Some((tok, _)) if tok == expected => {
                self.pos += 1;
                Ok(())
            },
            Some((_, offset)) if *expected == Token::RParen => {
                Err(ParseError::ExpectedClosingParen { offset: *offset })
            },
            Some((tok, offset)) => {
                Err(ParseError::UnexpectedToken { token:  format!("Expected {expected:?}, found {tok:?}"),
                                                  offset: *offset, })
            },
            None => Err(ParseError::UnexpectedEndOfInput { offset: self.end }),
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.peek_entry() {
            Some((tok, offset)) => ParseError::UnexpectedToken { token:  format!("{tok:?}"),
                                                                 offset: *offset, },
            None => ParseError::UnexpectedEndOfInput { offset: self.end },
        }
    }

    fn find(&self, symbol: &str, role: Role) -> Option<OperatorKey> {
        let record = match role {
            Role::Binary => self.registry.lookup(symbol, Arity::Binary, None),
            Role::Prefix => {
                self.registry
                    .lookup(symbol, Arity::Unary, Some(Fixedness::Prefix))
            },
            Role::Postfix => {
                self.registry
                    .lookup(symbol, Arity::Unary, Some(Fixedness::Postfix))
            },
        };
        record.map(OperatorRecord::key)
    }

    /// Longest registered prefix of `run` in `role`, with its byte length.
    fn match_symbol(&self, run: &str, role: Role) -> Option<(OperatorKey, usize)> {
        run.char_indices()
           .map(|(i, c)| i + c.len_utf8())
           .rev()
           .find_map(|len| self.find(&run[..len], role).map(|key| (key, len)))
    }

    /// Consumes `len` bytes of the symbol run at the cursor.
    fn consume_symbol(&mut self, len: usize) {
        if let Some((Token::Symbol(run), offset)) = self.tokens.get_mut(self.pos)
           && len < run.len()
        {
            *run = run[len..].to_string();
            *offset += len;
            return;
        }
        self.pos += 1;
    }

    fn current_symbol(&self) -> Option<String> {
        match self.peek() {
            Some(Token::Symbol(run)) => Some(run.clone()),
            _ => None,
        }
    }

    fn parse_definition(&mut self) -> ParseResult<Definition> {
        let (operator, params) = self.parse_lhs()?;
        self.expect(&Token::Define)?;
        self.expect(&Token::LBrace)?;

        let mut branches = Vec::new();
        let otherwise = loop {
            let term = self.parse_expr(0)?;
            let offset = self.offset();
            let guard = if self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                match self.peek() {
                    Some(Token::If) => {
                        self.pos += 1;
                        Some(self.parse_condition()?)
                    },
                    Some(Token::Else) => {
                        self.pos += 1;
                        None
                    },
                    _ => return Err(self.unexpected()),
                }
            } else {
                None
            };

            let more = self.peek() == Some(&Token::Semicolon);
            match guard {
                Some(condition) if more => {
                    self.pos += 1;
                    branches.push((condition, term));
                },
                Some(_) => return Err(ParseError::MissingElseBranch { offset }),
                None if more => return Err(ParseError::MissingElseBranch { offset }),
                None => break term,
            }
        };
        self.expect(&Token::RBrace)?;

        trace!(?operator, branches = branches.len(), "definition parsed");
        Ok(Definition { operator,
                        params,
                        branches,
                        otherwise })
    }

    fn parse_lhs(&mut self) -> ParseResult<(OperatorKey, Vec<String>)> {
        let offset = self.offset();
        if let Some(symbol) = self.current_symbol() {
            self.pos += 1;
            let operand = self.parse_name()?;
            return Ok((self.exact(&symbol, Role::Prefix, offset)?, vec![operand]));
        }

        let left = self.parse_name()?;
        let offset = self.offset();
        let Some(symbol) = self.current_symbol() else {
            return Err(self.unexpected());
        };
        self.pos += 1;
        if let Some(Token::Identifier(_)) = self.peek() {
            let right = self.parse_name()?;
            Ok((self.exact(&symbol, Role::Binary, offset)?, vec![left, right]))
        } else {
            Ok((self.exact(&symbol, Role::Postfix, offset)?, vec![left]))
        }
    }

    fn exact(&self, symbol: &str, role: Role, offset: usize) -> ParseResult<OperatorKey> {
        self.find(symbol, role)
            .ok_or_else(|| ParseError::UnknownSymbol { symbol: symbol.to_string(),
                                                       offset })
    }

    fn parse_name(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            },
            _ => Err(self.unexpected()),
        }
    }

    /// Precedence climbing over binary symbols.
    ///
    /// Operators without a precedence level bind at level 0, left
    /// associative.
    fn parse_expr(&mut self, min_level: u32) -> ParseResult<Term> {
        let mut left = self.parse_operand()?;

        while let Some(run) = self.current_symbol() {
            let offset = self.offset();
            let Some((operator, len)) = self.match_symbol(&run, Role::Binary) else {
                return Err(ParseError::UnknownSymbol { symbol: run, offset });
            };
            let record = self.registry.record(operator);
            let level = record.and_then(OperatorRecord::precedence)
                              .unwrap_or(0);
            if level < min_level {
                break;
            }
            let next_min = match record.and_then(OperatorRecord::associativity) {
                Some(Associativity::Right) => level,
                _ => level + 1,
            };

            self.consume_symbol(len);
            let right = self.parse_expr(next_min)?;
            left = Term::Binary { operator,
                                  left: Box::new(left),
                                  right: Box::new(right) };
        }

        Ok(left)
    }

    fn parse_operand(&mut self) -> ParseResult<Term> {
        let offset = self.offset();
        let mut term = match self.peek().cloned() {
            Some(Token::Integer(n)) => {
                self.pos += 1;
                Term::Number(n)
            },
            Some(Token::Identifier(name)) => {
                self.pos += 1;
                Term::Variable(name)
            },
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_expr(0)?;
                self.expect(&Token::RParen)?;
                inner
            },
            Some(Token::Symbol(run)) => {
                if run == "-"
                   && let Some((Token::Integer(n), _)) = self.tokens.get(self.pos + 1)
                {
                    let n = *n;
                    self.pos += 2;
                    Term::Number(-n)
                } else {
                    let Some((operator, len)) = self.match_symbol(&run, Role::Prefix) else {
                        return Err(ParseError::UnknownSymbol { symbol: run, offset });
                    };
                    self.consume_symbol(len);
                    Term::Unary { operator,
                                  operand: Box::new(self.parse_operand()?) }
                }
            },
            _ => return Err(self.unexpected()),
        };

        while let Some(run) = self.current_symbol() {
            let Some((operator, len)) = self.match_symbol(&run, Role::Postfix) else {
                break;
            };
            if self.match_symbol(&run, Role::Binary).is_some() && self.operand_follows(len) {
                break;
            }
            self.consume_symbol(len);
            term = Term::Unary { operator,
                                 operand: Box::new(term) };
        }

        Ok(term)
    }

    /// Whether an operand starts right after the first `len` bytes of the
    /// symbol run at the cursor.
    fn operand_follows(&self, len: usize) -> bool {
        let rest_is_symbol = matches!(self.peek(), Some(Token::Symbol(run)) if run.len() > len);
        rest_is_symbol
        || matches!(self.tokens.get(self.pos + 1),
                    Some((Token::Integer(_) | Token::Identifier(_) | Token::LParen, _)))
    }

    fn parse_condition(&mut self) -> ParseResult<Condition> {
        let mut left = self.parse_condition_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_condition_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_condition_and(&mut self) -> ParseResult<Condition> {
        let mut left = self.parse_condition_not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_condition_not()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_condition_not(&mut self) -> ParseResult<Condition> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Condition::Not(Box::new(self.parse_condition_not()?)));
        }

        let left = self.parse_expr(0)?;
        let op = match self.peek() {
            Some(Token::EqualEqual) => BinaryOperator::Equal,
            Some(Token::BangEqual) => BinaryOperator::NotEqual,
            Some(Token::Less) => BinaryOperator::Less,
            Some(Token::Greater) => BinaryOperator::Greater,
            Some(Token::LessEqual) => BinaryOperator::LessEqual,
            Some(Token::GreaterEqual) => BinaryOperator::GreaterEqual,
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;
        let right = self.parse_expr(0)?;

        Ok(Condition::Compare { left, op, right })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{OperatorData, OperatorId, seed::set_initial_operators};

    fn registry() -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        registry.add(OperatorData::binary("⊕")).unwrap();
        registry.add(OperatorData::binary("⊕⊕")).unwrap();
        registry.add(OperatorData::unary("⊣", Fixedness::Postfix)).unwrap();
        registry
    }

    fn key(registry: &OperatorRegistry, id: u32) -> OperatorKey {
        registry.key_of(OperatorId(id)).unwrap()
    }

    #[test]
    fn precedence_and_associativity_come_from_the_registry() {
        let registry = registry();
        let definition = parse_definition("a⊕b = { a-b-1*b }", &registry).unwrap();
        let (minus, times) = (key(&registry, 2), key(&registry, 4));

        let expected = Term::Binary { operator: minus,
                                      left:     Box::new(Term::Binary { operator: minus,
                                                                        left:     Box::new(Term::Variable("a".into())),
                                                                        right:    Box::new(Term::Variable("b".into())), }),
                                      right:    Box::new(Term::Binary { operator: times,
                                                                        left:     Box::new(Term::Number(1)),
                                                                        right:    Box::new(Term::Variable("b".into())), }), };
        assert_eq!(definition.otherwise, expected);
    }

    #[test]
    fn symbol_runs_split_by_longest_match() {
        let registry = registry();
        let definition = parse_definition("a⊕b = { a⊕⊕b }", &registry).unwrap();
        assert!(matches!(definition.otherwise, Term::Binary { operator, .. } if operator == key(&registry, 8)));

        let definition = parse_definition("a⊕b = { a⊕-b }", &registry).unwrap();
        let Term::Binary { operator, right, .. } = definition.otherwise else {
            panic!("expected a binary term");
        };
        assert_eq!(operator, key(&registry, 7));
        assert!(matches!(*right, Term::Unary { operator, .. } if operator == key(&registry, 3)));
    }

    #[test]
    fn postfix_applies_when_no_operand_follows() {
        let registry = registry();
        let definition = parse_definition("a⊣ = { (a-1)⊣ }", &registry).unwrap();
        assert!(matches!(definition.otherwise, Term::Unary { .. }));
        assert_eq!(definition.params, vec!["a"]);
    }

    #[test]
    fn negative_literals_fold() {
        let registry = registry();
        let definition = parse_definition("a⊕b = { a*(-3) }", &registry).unwrap();
        let Term::Binary { right, .. } = definition.otherwise else {
            panic!("expected a binary term");
        };
        assert_eq!(*right, Term::Number(-3));
    }

    #[test]
    fn branches_need_a_trailing_else() {
        let registry = registry();
        let definition =
            parse_definition("a⊕b = { a, if b == 0 and not a > 1 ; b, if a < b ; a+b, else }", &registry).unwrap();
        assert_eq!(definition.branches.len(), 2);
        assert!(matches!(definition.branches[0].0, Condition::And(..)));

        let err = parse_definition("a⊕b = { a, if b == 0 ; b, if a < b }", &registry).unwrap_err();
        assert!(matches!(err, ParseError::MissingElseBranch { .. }));
    }

    #[test]
    fn unknown_symbols_are_reported() {
        let registry = registry();
        let err = parse_definition("a⊕b = { a⊗b }", &registry).unwrap_err();
        assert_eq!(err, ParseError::UnknownSymbol { symbol: "⊗".into(),
                                                    offset: 11 });

        let err = parse_definition("a⊗b = { a }", &registry).unwrap_err();
        assert!(matches!(err, ParseError::UnknownSymbol { .. }));
    }
}

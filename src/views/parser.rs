use super::ast::{Condition, Node, Template};
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{Error, Result};

/// Builds the node tree for one template source
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

/// Which closing directive ended a block
enum Terminator {
    Else,
    Fi,
    End,
    Eof,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    pub fn parse(&mut self) -> Result<Template> {
        let (nodes, terminator, token) = self.parse_until()?;
        match terminator {
            Terminator::Eof => Ok(Template::new(nodes)),
            _ => Err(Self::unexpected(&token)),
        }
    }

    fn next(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, 0, 0));
        self.position += 1;
        token
    }

    fn unexpected(token: &Token) -> Error {
        Error::template(format!(
            "Unexpected {:?} at {}:{}",
            token.kind, token.line, token.column
        ))
    }

    /// Parse nodes until a block terminator or end of input
    fn parse_until(&mut self) -> Result<(Vec<Node>, Terminator, Token)> {
        let mut nodes = Vec::new();

        loop {
            let token = self.next();
            let node = match &token.kind {
                TokenKind::Eof => return Ok((nodes, Terminator::Eof, token)),
                TokenKind::Else => return Ok((nodes, Terminator::Else, token)),
                TokenKind::Fi => return Ok((nodes, Terminator::Fi, token)),
                TokenKind::End => return Ok((nodes, Terminator::End, token)),

                TokenKind::Text(text) => Node::Text(text.clone()),
                TokenKind::Variable(path) => Node::Variable {
                    path: path.clone(),
                    raw: false,
                },
                TokenKind::RawVariable(path) => Node::Variable {
                    path: path.clone(),
                    raw: true,
                },
                TokenKind::If(condition) => self.parse_conditional(condition, &token)?,
                TokenKind::Foreach(item, collection) => {
                    self.parse_loop(item.clone(), collection.clone(), &token)?
                }
                TokenKind::Index => Node::Index,
                TokenKind::Extend(name) => Node::Extend(name.clone()),
                TokenKind::Section(name) => Node::Section(name.clone()),
                TokenKind::Close => Node::Close,
                TokenKind::Show(name) => Node::Show(name.clone()),
                TokenKind::Partial(name) => Node::Partial(name.clone()),
                TokenKind::Unknown(content) => {
                    return Err(Error::template(format!(
                        "Unknown directive '@{{{}}}' at {}:{}",
                        content, token.line, token.column
                    )))
                }
            };
            nodes.push(node);
        }
    }

    fn parse_conditional(&mut self, source: &str, opening: &Token) -> Result<Node> {
        let condition = Condition::parse(source).ok_or_else(|| {
            Error::template(format!(
                "Invalid condition '{}' at {}:{}",
                source, opening.line, opening.column
            ))
        })?;

        let (then_branch, terminator, token) = self.parse_until()?;
        let else_branch = match terminator {
            Terminator::Fi => Vec::new(),
            Terminator::Else => {
                let (else_branch, terminator, token) = self.parse_until()?;
                match terminator {
                    Terminator::Fi => else_branch,
                    Terminator::Eof => return Err(Self::unclosed("if", opening)),
                    _ => return Err(Self::unexpected(&token)),
                }
            }
            Terminator::Eof => return Err(Self::unclosed("if", opening)),
            Terminator::End => return Err(Self::unexpected(&token)),
        };

        Ok(Node::Conditional {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_loop(&mut self, item_name: String, collection: String, opening: &Token) -> Result<Node> {
        let (body, terminator, token) = self.parse_until()?;
        match terminator {
            Terminator::End => Ok(Node::Loop {
                item_name,
                collection,
                body,
            }),
            Terminator::Eof => Err(Self::unclosed("foreach", opening)),
            _ => Err(Self::unexpected(&token)),
        }
    }

    fn unclosed(block: &str, opening: &Token) -> Error {
        Error::template(format!(
            "Unclosed {} block opened at {}:{}",
            block, opening.line, opening.column
        ))
    }
}

/// Parse template source into a [`Template`]
pub fn parse(source: &str) -> Result<Template> {
    Parser::new(source)?.parse()
}

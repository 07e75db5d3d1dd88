/// AST node types for templates
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),

    /// `@{path}` (escaped) or `@{!path}` (raw)
    Variable { path: String, raw: bool },

    /// `@{if cond}...@{else}...@{fi}`
    Conditional {
        condition: Condition,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },

    /// `@{foreach item in collection}...@{end}`
    Loop {
        item_name: String,
        collection: String,
        body: Vec<Node>,
    },

    /// Zero-based position inside the innermost loop
    Index,

    Extend(String),
    Section(String),
    Close,
    Show(String),
    Partial(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: String,
    pub negated: bool,
}

impl Condition {
    pub fn parse(source: &str) -> Option<Self> {
        let source = source.trim();
        let (negated, path) = match source.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, source),
        };

        super::lexer::is_path(path).then(|| Self {
            path: path.to_string(),
            negated,
        })
    }
}

/// A parsed template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub nodes: Vec<Node>,
}

impl Template {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Whether the template calls `extend` anywhere, including inside blocks
    pub fn extends(&self) -> bool {
        fn walk(nodes: &[Node]) -> bool {
            nodes.iter().any(|node| match node {
                Node::Extend(_) => true,
                Node::Conditional {
                    then_branch,
                    else_branch,
                    ..
                } => walk(then_branch) || walk(else_branch),
                Node::Loop { body, .. } => walk(body),
                _ => false,
            })
        }
        walk(&self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_parse() {
        assert_eq!(
            Condition::parse("!user.admin"),
            Some(Condition {
                path: "user.admin".into(),
                negated: true
            })
        );
        assert_eq!(Condition::parse("a == b"), None);
    }
}

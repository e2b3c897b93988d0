//! Command tree: static command hierarchy plus dynamic child providers,
//! used to compute completion suggestions for a partial input line.

use std::fmt;
use std::sync::Arc;

use crate::BoxFuture;

/// Source of children computed at completion time.
pub trait ChildProvider: Send + Sync {
    /// Children for the tokens that follow the provider's node.
    ///
    /// Returns how many of `params` the provider consumed and the candidate
    /// nodes. The last consumed token is the one the candidates are filtered
    /// against. Failures are reported as no candidates.
    fn children<'a>(&'a self, params: &'a [&'a str]) -> BoxFuture<'a, (usize, Vec<CommandNode>)>;
}

/// One node of the command tree.
#[derive(Clone, Default)]
pub struct CommandNode {
    pub label: String,
    pub description: String,
    pub children: Vec<CommandNode>,
    pub provider: Option<Arc<dyn ChildProvider>>,
}

impl CommandNode {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// A node without a description.
    pub fn leaf(label: impl Into<String>) -> Self {
        Self::new(label, "")
    }

    pub fn with_children(mut self, children: Vec<CommandNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn ChildProvider>) -> Self {
        self.provider = Some(provider);
        self
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("label", &self.label)
            .field("description", &self.description)
            .field("children", &self.children)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

/// A completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub description: String,
}

impl From<&CommandNode> for Suggestion {
    fn from(node: &CommandNode) -> Self {
        Self {
            text: node.label.clone(),
            description: node.description.clone(),
        }
    }
}

/// The root level of the command hierarchy.
#[derive(Debug, Clone, Default)]
pub struct CommandTree {
    root: Vec<CommandNode>,
}

impl CommandTree {
    pub fn new(root: Vec<CommandNode>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &[CommandNode] {
        &self.root
    }

    /// Suggestions for the text left of the cursor.
    ///
    /// The line is split on single spaces, so consecutive spaces produce
    /// empty tokens, and an empty token stops the walk. Each complete token
    /// selects a child by exact label; a node with a provider hands the
    /// remaining tokens to it and ends the walk. The token under the cursor
    /// filters the final level by prefix, case-sensitively.
    pub async fn complete(&self, before_cursor: &str) -> Vec<Suggestion> {
        let args: Vec<&str> = before_cursor.split(' ').collect();
        let mut level: &[CommandNode] = &self.root;
        let mut dynamic: Option<Vec<CommandNode>> = None;
        let mut idx = 0;

        while idx + 1 < args.len() {
            let keyword = args[idx];
            if keyword.is_empty() {
                break;
            }
            let matched = level.iter().find(|node| node.label == keyword);

            if let Some(provider) = matched.and_then(|node| node.provider.as_ref()) {
                let (consumed, children) = provider.children(&args[idx + 1..]).await;
                idx += consumed;
                dynamic = Some(children);
                break;
            }

            idx += 1;
            match matched {
                Some(node) if !node.children.is_empty() => level = &node.children,
                _ => {
                    level = &[];
                    break;
                }
            }
        }

        let prefix = args.get(idx).copied().unwrap_or_default();
        dynamic
            .as_deref()
            .unwrap_or(level)
            .iter()
            .filter(|node| node.label.starts_with(prefix))
            .map(Suggestion::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Offers fixed names for the first parameter only.
    struct Fixed(Vec<&'static str>);

    impl ChildProvider for Fixed {
        fn children<'a>(&'a self, params: &'a [&'a str]) -> BoxFuture<'a, (usize, Vec<CommandNode>)> {
            Box::pin(async move {
                if params.len() > 1 {
                    return (0, Vec::new());
                }
                (1, self.0.iter().map(|name| CommandNode::leaf(*name)).collect())
            })
        }
    }

    /// Offers `g-<n>` for the first parameter and `m-<n>` for the second.
    struct TwoLevel;

    impl ChildProvider for TwoLevel {
        fn children<'a>(&'a self, params: &'a [&'a str]) -> BoxFuture<'a, (usize, Vec<CommandNode>)> {
            Box::pin(async move {
                let nodes = match params.len() {
                    1 => vec![CommandNode::leaf("g-1"), CommandNode::leaf("g-2")],
                    2 => vec![CommandNode::leaf(format!("m-{}", params[0]))],
                    _ => Vec::new(),
                };
                (params.len(), nodes)
            })
        }
    }

    fn tree() -> CommandTree {
        CommandTree::new(vec![
            CommandNode::new("proxy", "Manage proxies").with_children(vec![
                CommandNode::new("ls", "List proxies"),
                CommandNode::new("use", "Select a proxy"),
                CommandNode::new("set", "Set a group member").with_provider(Arc::new(TwoLevel)),
            ]),
            CommandNode::new("mode", "Routing mode").with_children(vec![
                CommandNode::leaf("rule"),
                CommandNode::leaf("global"),
                CommandNode::leaf("direct"),
            ]),
            CommandNode::new("server", "Manage servers").with_children(vec![
                CommandNode::new("ls", "List servers"),
                CommandNode::new("rm", "Remove a server")
                    .with_provider(Arc::new(Fixed(vec!["us1", "jp2"]))),
            ]),
            CommandNode::new("ping", "Ping servers"),
        ])
    }

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_empty_line_lists_root() {
        let out = tree().complete("").await;
        assert_eq!(texts(&out), vec!["proxy", "mode", "server", "ping"]);
    }

    #[tokio::test]
    async fn test_root_prefix() {
        let out = tree().complete("p").await;
        assert_eq!(texts(&out), vec!["proxy", "ping"]);
        assert_eq!(out[0].description, "Manage proxies");
    }

    #[tokio::test]
    async fn test_prefix_is_case_sensitive() {
        assert!(tree().complete("P").await.is_empty());
    }

    #[tokio::test]
    async fn test_static_children() {
        let out = tree().complete("proxy ").await;
        assert_eq!(texts(&out), vec!["ls", "use", "set"]);
        let out = tree().complete("mode g").await;
        assert_eq!(texts(&out), vec!["global"]);
    }

    #[tokio::test]
    async fn test_unknown_token_yields_nothing() {
        assert!(tree().complete("bogus ").await.is_empty());
        assert!(tree().complete("proxy bogus ").await.is_empty());
    }

    #[tokio::test]
    async fn test_leaf_has_no_children() {
        assert!(tree().complete("ping ").await.is_empty());
    }

    #[tokio::test]
    async fn test_double_space_stops_walk() {
        // The empty token ends the walk; the empty prefix matches every child.
        let out = tree().complete("proxy  ").await;
        assert_eq!(texts(&out), vec!["ls", "use", "set"]);
        let out = tree().complete("proxy  ls ").await;
        assert_eq!(texts(&out), vec!["ls", "use", "set"]);
    }

    #[tokio::test]
    async fn test_provider_first_param() {
        let out = tree().complete("server rm ").await;
        assert_eq!(texts(&out), vec!["us1", "jp2"]);
        let out = tree().complete("server rm j").await;
        assert_eq!(texts(&out), vec!["jp2"]);
    }

    #[tokio::test]
    async fn test_provider_declines_extra_params() {
        // Zero consumed: the filter token becomes "rm" itself.
        assert!(tree().complete("server rm us1 ").await.is_empty());
    }

    #[tokio::test]
    async fn test_two_level_provider() {
        let out = tree().complete("proxy set g").await;
        assert_eq!(texts(&out), vec!["g-1", "g-2"]);
        let out = tree().complete("proxy set g-1 m").await;
        assert_eq!(texts(&out), vec!["m-g-1"]);
    }
}

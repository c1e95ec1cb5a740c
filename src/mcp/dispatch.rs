//! JSON-RPC method names.

use std::fmt;

/// MCP method identifier.
///
/// Unknown methods are kept so the error can name them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum McpMethod {
    /// Handshake.
    Initialize,
    /// Client acknowledgement after the handshake (a notification).
    Initialized,
    /// List available tools.
    ListTools,
    /// Call a tool.
    CallTool,
    /// List available resources.
    ListResources,
    /// Read a resource.
    ReadResource,
    /// List available prompts.
    ListPrompts,
    /// Render a prompt.
    GetPrompt,
    /// Liveness check.
    Ping,
    /// Anything else.
    Unknown(String),
}

impl McpMethod {
    /// Returns the protocol method name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Initialize => "initialize",
            Self::Initialized => "notifications/initialized",
            Self::ListTools => "tools/list",
            Self::CallTool => "tools/call",
            Self::ListResources => "resources/list",
            Self::ReadResource => "resources/read",
            Self::ListPrompts => "prompts/list",
            Self::GetPrompt => "prompts/get",
            Self::Ping => "ping",
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Returns true if this is a known method.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<&str> for McpMethod {
    fn from(s: &str) -> Self {
        match s {
            "initialize" => Self::Initialize,
            "notifications/initialized" => Self::Initialized,
            "tools/list" => Self::ListTools,
            "tools/call" => Self::CallTool,
            "resources/list" => Self::ListResources,
            "resources/read" => Self::ReadResource,
            "prompts/list" => Self::ListPrompts,
            "prompts/get" => Self::GetPrompt,
            "ping" => Self::Ping,
            unknown => Self::Unknown(unknown.to_string()),
        }
    }
}

impl fmt::Display for McpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("initialize", McpMethod::Initialize)]
    #[test_case("notifications/initialized", McpMethod::Initialized)]
    #[test_case("tools/call", McpMethod::CallTool)]
    #[test_case("resources/read", McpMethod::ReadResource)]
    #[test_case("prompts/get", McpMethod::GetPrompt)]
    #[test_case("ping", McpMethod::Ping)]
    fn test_known_methods_round_trip(name: &str, expected: McpMethod) {
        let method = McpMethod::from(name);
        assert_eq!(method, expected);
        assert!(method.is_known());
        assert_eq!(method.as_str(), name);
    }

    #[test]
    fn test_unknown_method_keeps_name() {
        let method = McpMethod::from("tools/destroy");
        assert!(!method.is_known());
        assert_eq!(method.to_string(), "tools/destroy");
    }
}

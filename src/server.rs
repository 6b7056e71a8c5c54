//! MCP tool gateway
//!
//! Advertises exactly one tool, named after the crate this instance
//! serves, and routes calls to the semantic index. The handler is
//! implemented manually rather than through the macro router because the
//! tool name and input schema are derived from the library identity at
//! startup.
//!
//! Request-scoped failures map to distinct protocol errors:
//! - unknown tool name → METHOD_NOT_FOUND
//! - malformed arguments or a `crate` value other than the served
//!   identity → INVALID_PARAMS
//! - retrieval/synthesis failure → INTERNAL_ERROR
//!
//! None of these crash the process; the next call is served normally.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorCode, Implementation, JsonObject,
    ListToolsResult, PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    Tool, ToolAnnotations,
};
use rmcp::{ErrorData as McpError, ServerHandler};
use serde_json::json;

use crate::index::SemanticIndex;

/// MCP server for one crate's documentation
#[derive(Clone)]
pub struct DocsServer {
    crate_name: String,
    tool_name: String,
    index: Arc<SemanticIndex>,
}

/// Tool name for a crate identity, e.g. `query_serde_json_docs`
///
/// Hyphens are mapped to underscores so the name is a valid identifier.
pub fn tool_name_for(crate_name: &str) -> String {
    format!("query_{}_docs", crate_name.replace('-', "_"))
}

impl DocsServer {
    /// Create the gateway over a Ready index
    pub fn new(crate_name: impl Into<String>, index: Arc<SemanticIndex>) -> Self {
        let crate_name = crate_name.into();
        let tool_name = tool_name_for(&crate_name);
        Self {
            crate_name,
            tool_name,
            index,
        }
    }

    /// The single advertised tool
    fn tool(&self) -> Tool {
        let schema = json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": format!(
                        "The specific question about the '{}' crate's API or usage.",
                        self.crate_name
                    ),
                },
                "crate": {
                    "type": "string",
                    "enum": [self.crate_name],
                    "description": format!(
                        "Must be '{}'; this server answers for that crate only.",
                        self.crate_name
                    ),
                },
            },
            "required": ["question", "crate"],
        });
        let input_schema = match schema {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => unreachable!("tool schema is an object"),
        };

        Tool {
            name: Cow::Owned(self.tool_name.clone()),
            title: None,
            description: Some(Cow::Owned(format!(
                "Query the documentation of the '{}' Rust crate. Retrieves the most \
                 relevant documentation section and answers the question from it.",
                self.crate_name
            ))),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    /// Validate and execute one tool call
    ///
    /// Split out from [`ServerHandler::call_tool`] so tests can drive the
    /// full dispatch path without a transport.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        if name != self.tool_name {
            return Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Unknown tool: {name}"),
                None,
            ));
        }

        let args = arguments.ok_or_else(|| {
            McpError::new(
                ErrorCode::INVALID_PARAMS,
                "Missing arguments for tool call",
                None,
            )
        })?;
        let question = args.get("question").and_then(serde_json::Value::as_str);
        let crate_param = args.get("crate").and_then(serde_json::Value::as_str);
        let (question, crate_param) = match (question, crate_param) {
            (Some(q), Some(c)) => (q, c),
            _ => {
                return Err(McpError::new(
                    ErrorCode::INVALID_PARAMS,
                    "Missing 'question' or 'crate' string argument",
                    None,
                ));
            }
        };

        // Identity check happens before any provider call is issued.
        if crate_param != self.crate_name {
            return Err(McpError::new(
                ErrorCode::INVALID_PARAMS,
                format!(
                    "This server only answers queries for crate '{}', not '{}'",
                    self.crate_name, crate_param
                ),
                None,
            ));
        }

        tracing::info!(crate_name = %self.crate_name, question, "received query");

        let answer = self.index.query(question).await.map_err(|e| {
            tracing::error!(error = %e, "query failed");
            McpError::new(
                ErrorCode::INTERNAL_ERROR,
                format!("Query failed: {e}"),
                None,
            )
        })?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "From {} docs: {}",
            self.crate_name, answer
        ))]))
    }
}

impl ServerHandler for DocsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "rustdocs-mcp".to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "This server answers questions about the '{}' Rust crate from its \
                 official documentation. Use the '{}' tool with a specific question; \
                 the 'crate' argument must be '{}'.",
                self.crate_name, self.tool_name, self.crate_name
            )),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(vec![self.tool()])))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        (name == self.tool_name).then(|| self.tool())
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(&request.name, request.arguments).await
    }
}

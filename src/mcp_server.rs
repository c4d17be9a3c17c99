use crate::client::ContextClient;
use crate::types::*;

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    handler::server::{router::prompt::PromptRouter, tool::ToolRouter, wrapper::Parameters},
    model::*,
    prompt, prompt_handler, prompt_router,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ContextMcpServer {
    client: Arc<ContextClient>,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl ContextMcpServer {
    /// Create a new server with default configuration
    pub fn new() -> Result<Self> {
        let client = ContextClient::new()?;
        Ok(Self::with_client(Arc::new(client)))
    }

    /// Create a new server with an existing client
    pub fn with_client(client: Arc<ContextClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    /// Get the underlying client
    pub fn client(&self) -> &ContextClient {
        &self.client
    }
}

#[tool_router(router = tool_router)]
impl ContextMcpServer {
    #[tool(
        description = "Extract the minimal type context of a function: the declarations of its owning type, parameter types, return type and their member types, with the impl blocks written for them."
    )]
    async fn extract_type_context(
        &self,
        Parameters(req): Parameters<ExtractRequest>,
    ) -> Result<String, String> {
        req.validate()?;

        let response = self
            .client
            .extract(req)
            .await
            .map_err(|e| format!("{:#}", e))?;

        serde_json::to_string_pretty(&response).map_err(|e| format!("Serialization failed: {}", e))
    }
}

#[prompt_router]
impl ContextMcpServer {
    #[prompt(
        name = "type-context",
        description = "Extract the type context of a function for a code-generation prompt"
    )]
    async fn type_context_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<GetPromptResult, McpError> {
        let workspace = args.get("workspace").and_then(|v| v.as_str()).unwrap_or(".");
        let file = args.get("file").and_then(|v| v.as_str()).unwrap_or("");
        let signature = args.get("signature").and_then(|v| v.as_str()).unwrap_or("");

        let messages = vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Please extract the type context of `{}` declared in '{}' within the workspace '{}'.",
                signature, file, workspace
            ),
        )];

        Ok(GetPromptResult {
            description: Some(format!("Type context of `{}`", signature)),
            messages,
        })
    }
}

#[tool_handler(router = self.tool_router)]
#[prompt_handler]
impl ServerHandler for ContextMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "type-context".into(),
                title: Some("Type Context - Minimal Type Declarations for a Function".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Resolves the types a function depends on and renders their declarations. \
                Use extract_type_context with a workspace, a file and the function signature."
                    .into(),
            ),
        }
    }
}

impl ContextMcpServer {
    pub async fn serve_stdio() -> Result<()> {
        tracing::info!("Starting type-context MCP server");

        let server = Self::new().context("Failed to create MCP server")?;

        let transport = rmcp::transport::io::stdio();

        server.serve(transport).await?.waiting().await?;

        Ok(())
    }
}

//! MCP server implementation for elscan.
//!
//! Exposes ELS search and gematria as MCP tools for AI editors.

use std::borrow::Cow;
use std::fmt::Write;

use clap::ValueEnum;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, ErrorCode, ErrorData as McpError, ServerCapabilities, ServerInfo,
    },
    schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::Deserialize;

use crate::cli::{DEFAULT_RESULT_LIMIT, DirectionArg, SearchArgs};
use crate::provider::SAMPLE_SOURCE;
use crate::{commands, gematria, hebrew};

/// Parameters for `search_els` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Hebrew search term (2-20 letters)")]
    pub term: String,
    #[schemars(description = "Text source: sample, genesis, exodus, leviticus, numbers, deuteronomy or torah (default: sample)")]
    pub source: Option<String>,
    #[schemars(description = "Smallest skip distance")]
    pub min_skip: Option<usize>,
    #[schemars(description = "Largest skip distance")]
    pub max_skip: Option<usize>,
    #[schemars(description = "forward, backward or both")]
    pub direction: Option<String>,
    #[schemars(description = "Maximum number of results to list (default: 20)")]
    pub limit: Option<usize>,
}

/// Parameters for `find_crossings` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CrossingsParams {
    #[schemars(description = "First Hebrew term")]
    pub first: String,
    #[schemars(description = "Second Hebrew term")]
    pub second: String,
    #[schemars(description = "Text source (default: sample)")]
    pub source: Option<String>,
    #[schemars(description = "Largest skip distance")]
    pub max_skip: Option<usize>,
}

/// Parameters for `gematria` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GematriaParams {
    #[schemars(description = "Hebrew word or phrase")]
    pub text: String,
}

/// Parameters for `validate_term` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateParams {
    #[schemars(description = "Candidate search term")]
    pub term: String,
}

fn tool_error(context: &str, e: impl std::fmt::Display) -> McpError {
    McpError {
        code: ErrorCode::INTERNAL_ERROR,
        message: Cow::from(format!("{context}: {e}")),
        data: None,
    }
}

fn invalid_params(message: String) -> McpError {
    McpError {
        code: ErrorCode::INVALID_PARAMS,
        message: Cow::from(message),
        data: None,
    }
}

fn parse_direction(direction: Option<&str>) -> Result<Option<DirectionArg>, McpError> {
    direction
        .map(|d| {
            DirectionArg::from_str(d, true)
                .map_err(|_| invalid_params(format!("Unknown direction '{d}'")))
        })
        .transpose()
}

/// MCP server exposing elscan tools.
#[derive(Clone)]
pub struct ElscanServer {
    tool_router: ToolRouter<Self>,
}

impl Default for ElscanServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl ElscanServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Search a Hebrew text for a term spelled at equal letter intervals")]
    async fn search_els(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let args = SearchArgs {
            source: params.source.unwrap_or_else(|| SAMPLE_SOURCE.to_string()),
            min_skip: params.min_skip,
            max_skip: params.max_skip,
            direction: parse_direction(params.direction.as_deref())?,
            ..SearchArgs::default()
        };
        let limit = params.limit.unwrap_or(DEFAULT_RESULT_LIMIT);

        let set = commands::search(&params.term, &args, None, None, &mut |_| {})
            .map_err(|e| tool_error("Search failed", e))?;

        let mut output = commands::format_summary(&set);
        for result in set.results().iter().take(limit) {
            let _ = write!(output, "\n- {}", commands::format_result(result));
        }
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(description = "Find where the letter sequences of two terms cross each other")]
    async fn find_crossings(
        &self,
        Parameters(params): Parameters<CrossingsParams>,
    ) -> Result<CallToolResult, McpError> {
        let args = SearchArgs {
            source: params.source.unwrap_or_else(|| SAMPLE_SOURCE.to_string()),
            max_skip: params.max_skip,
            ..SearchArgs::default()
        };

        let crossings = commands::crossings(&params.first, &params.second, &args)
            .map_err(|e| tool_error("Crossing search failed", e))?;
        let intersections = crossings.intersections();

        if intersections.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "No crossings between '{}' and '{}'",
                params.first, params.second
            ))]));
        }

        let mut output = String::new();
        for intersection in intersections.iter().take(DEFAULT_RESULT_LIMIT) {
            let _ = writeln!(output, "- {}", commands::format_intersection(intersection));
        }
        let _ = write!(output, "*{} crossing(s) found*", intersections.len());
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(description = "Compute the gematria of Hebrew text under every method")]
    async fn gematria(
        &self,
        Parameters(params): Parameters<GematriaParams>,
    ) -> Result<CallToolResult, McpError> {
        let report = commands::gematria(&params.text).map_err(|e| invalid_params(e.to_string()))?;
        let analysis = gematria::analyze(report.standard);

        let output = format!("{report}\n{}", commands::format_analysis(&analysis));
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(description = "Check whether a term can be searched and show its normalized form")]
    async fn validate_term(
        &self,
        Parameters(params): Parameters<ValidateParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = match hebrew::validate_search_term(&params.term) {
            Ok(normalized) => format!(
                "Valid: {normalized} ({} letters)",
                normalized.chars().count()
            ),
            Err(e) => format!("Invalid: {e}"),
        };
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(description = "List the text sources that can be searched")]
    async fn list_sources(&self) -> Result<CallToolResult, McpError> {
        let sources = commands::sources().map_err(|e| tool_error("Listing failed", e))?;

        let mut output = String::new();
        for source in &sources {
            let missing = if source.available { "" } else { " (missing)" };
            let _ = writeln!(output, "- **{}**: {}{missing}", source.id, source.name);
        }
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}

#[tool_handler]
impl ServerHandler for ElscanServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "elscan searches Hebrew texts for equidistant letter sequences. \
                Use validate_term to check a term, search_els to find its sequences, \
                find_crossings to pair two terms, and gematria for numeric values."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Start the MCP server with stdio transport.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters a fatal error.
pub async fn serve() -> anyhow::Result<()> {
    let server = ElscanServer::new();
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parsing() {
        assert_eq!(parse_direction(None).unwrap(), None);
        assert_eq!(
            parse_direction(Some("Both")).unwrap(),
            Some(DirectionArg::Both)
        );
        assert!(parse_direction(Some("sideways")).is_err());
    }
}

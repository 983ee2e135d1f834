// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in step action names.

pub const CREATE_FILE: &str = "create_file";
pub const MODIFY_FILE: &str = "modify_file";
pub const DELETE_FILE: &str = "delete_file";
pub const EXECUTE_COMMAND: &str = "execute_command";
pub const AI_GENERATE: &str = "ai_generate";
pub const MCP_TOOL: &str = "mcp_tool";
pub const USE_MCP_TOOL: &str = "use_mcp_tool";
pub const ACCESS_MCP_RESOURCE: &str = "access_mcp_resource";
pub const LOAD_MCP_DOCUMENTATION: &str = "load_mcp_documentation";

/// Every action the default handler registry serves.
pub const BUILTIN: [&str; 9] = [
    CREATE_FILE,
    MODIFY_FILE,
    DELETE_FILE,
    EXECUTE_COMMAND,
    AI_GENERATE,
    MCP_TOOL,
    USE_MCP_TOOL,
    ACCESS_MCP_RESOURCE,
    LOAD_MCP_DOCUMENTATION,
];

/// Actions that change the workspace or the outside world.
///
/// A plan containing any of these always requires approval.
pub fn is_mutating(action: &str) -> bool {
    matches!(
        action,
        CREATE_FILE | MODIFY_FILE | DELETE_FILE | EXECUTE_COMMAND | MCP_TOOL | USE_MCP_TOOL
    )
}

//! Despensa MCP Server Implementation
//!
//! Implements the MCP server with all Despensa tools.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::models::{IngredientLine, MealType, RecipeSnapshot};
use crate::tools::quantities;
use crate::tools::shopping_lists::{self, MealPlanEntry};
use crate::tools::status::StatusTracker;

/// Despensa MCP Service
#[derive(Clone)]
pub struct DespensaService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    config: Config,
    tool_router: ToolRouter<DespensaService>,
}

impl DespensaService {
    pub fn new(config: Config) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config.clone()))),
            config,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientParam {
    /// Ingredient name (matched exactly when summing shopping lists)
    pub name: String,
    /// Quantity as written in the recipe, e.g. "2 c. de sopa", "1 lata (2x250g)"
    pub quantity: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeParam {
    /// Recipe name
    pub name: String,
    /// Portion text, e.g. "4 pessoas" (optional)
    pub portion: Option<String>,
    /// Ingredient lines
    pub ingredients: Vec<IngredientParam>,
}

impl From<RecipeParam> for RecipeSnapshot {
    fn from(p: RecipeParam) -> Self {
        RecipeSnapshot {
            name: p.name,
            portion: p.portion,
            ingredients: p
                .ingredients
                .into_iter()
                .map(|i| IngredientLine { name: i.name, quantity: i.quantity })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NormalizeQuantityParams {
    /// Quantity text, e.g. "1,5 kg", "2 c. de chá", "q.b."
    pub raw: String,
}

// ============================================================================
// Shopping List Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealParam {
    /// Date in ISO format: YYYY-MM-DD
    pub date: String,
    /// Meal type: breakfast, lunch, dinner, snack, or unspecified
    #[serde(default = "default_meal_type")]
    pub meal_type: String,
    /// Recipe planned for this meal
    pub recipe: RecipeParam,
}

fn default_meal_type() -> String { "unspecified".to_string() }

impl From<MealParam> for MealPlanEntry {
    fn from(p: MealParam) -> Self {
        MealPlanEntry {
            date: p.date,
            meal_type: MealType::from_str(&p.meal_type),
            recipe: p.recipe.into(),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BuildShoppingListParams {
    /// Start date (inclusive): YYYY-MM-DD
    pub start_date: String,
    /// End date (inclusive): YYYY-MM-DD
    pub end_date: String,
    /// Servings to scale every recipe to (optional)
    pub target_portion: Option<f64>,
    /// Planned meals; only those within the date range are used
    pub meals: Vec<MealParam>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExportShoppingListParams {
    /// Document title (default "Shopping List")
    #[serde(default)]
    pub title: String,
    /// Start date (inclusive): YYYY-MM-DD
    pub start_date: String,
    /// End date (inclusive): YYYY-MM-DD
    pub end_date: String,
    /// Servings to scale every recipe to (optional)
    pub target_portion: Option<f64>,
    /// Planned meals; only those within the date range are used
    pub meals: Vec<MealParam>,
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl DespensaService {
    // --- Status ---

    #[tool(description = "Get the current status of the Despensa service including build info, configuration, and process information")]
    async fn despensa_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        to_json(&tracker.get_status())
    }

    #[tool(description = "Get instructions for normalizing recipe quantities and building shopping lists. Call this before using the other tools.")]
    fn shopping_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::SHOPPING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(SHOPPING_INSTRUCTIONS)]))
    }

    // --- Quantities ---

    #[tool(description = "Normalize one recipe quantity (e.g. \"1,5 kg\", \"2 c. de chá\", \"1 lata (2x250g)\") to grams, ml, units, dentes, folhas or q.b.")]
    fn normalize_quantity(&self, Parameters(p): Parameters<NormalizeQuantityParams>) -> Result<CallToolResult, McpError> {
        let result = quantities::normalize_quantity(&p.raw).map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Normalize every ingredient quantity of a recipe. Lines that cannot be read are flagged individually; the rest are still normalized.")]
    fn normalize_recipe_ingredients(&self, Parameters(p): Parameters<RecipeParam>) -> Result<CallToolResult, McpError> {
        let result = quantities::normalize_recipe_ingredients(p.into()).map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    // --- Shopping Lists ---

    #[tool(description = "Build a shopping list from the meals planned between start_date and end_date, scaling each recipe to target_portion servings and summing ingredients by name")]
    fn build_shopping_list(&self, Parameters(p): Parameters<BuildShoppingListParams>) -> Result<CallToolResult, McpError> {
        let meals = p.meals.into_iter().map(MealPlanEntry::from).collect();
        let result = shopping_lists::build_shopping_list(&self.config, &p.start_date, &p.end_date, p.target_portion, meals)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Build a shopping list and export it as a markdown document")]
    fn export_shopping_list_markdown(&self, Parameters(p): Parameters<ExportShoppingListParams>) -> Result<CallToolResult, McpError> {
        let meals = p.meals.into_iter().map(MealPlanEntry::from).collect();
        let result = shopping_lists::export_shopping_list_markdown(
            &self.config, &p.title, &p.start_date, &p.end_date, p.target_portion, meals,
        )
        .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for DespensaService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "despensa".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Despensa".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Despensa - Portuguese recipe quantity normalization and shopping lists. \
                 IMPORTANT: Call shopping_instructions first. \
                 Quantities: normalize_quantity, normalize_recipe_ingredients. \
                 Shopping lists: build_shopping_list, export_shopping_list_markdown (meals are passed in each call). \
                 Status: despensa_status."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_param_conversion() {
        let param: MealParam = serde_json::from_value(serde_json::json!({
            "date": "2026-05-01",
            "meal_type": "jantar",
            "recipe": {
                "name": "Caldeirada",
                "portion": "4 pessoas",
                "ingredients": [{"name": "peixe", "quantity": "1 kg"}]
            }
        }))
        .unwrap();

        let entry = MealPlanEntry::from(param);
        assert_eq!(entry.meal_type, MealType::Dinner);
        assert_eq!(entry.recipe.ingredients[0].quantity, "1 kg");
        assert_eq!(entry.recipe.portion.as_deref(), Some("4 pessoas"));
    }

    #[test]
    fn test_meal_type_defaults_to_unspecified() {
        let param: MealParam = serde_json::from_value(serde_json::json!({
            "date": "2026-05-01",
            "recipe": {"name": "Sopa", "ingredients": []}
        }))
        .unwrap();

        assert_eq!(MealPlanEntry::from(param).meal_type, MealType::Unspecified);
    }

    #[test]
    fn test_server_info() {
        let service = DespensaService::new(Config::default());
        let info = service.get_info();
        assert_eq!(info.server_info.name, "despensa");
        assert!(info.instructions.unwrap().contains("shopping_instructions"));
    }
}

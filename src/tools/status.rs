//! Despensa Status Tool
//!
//! Provides runtime status information and usage instructions.

use serde::Serialize;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::config::Config;

/// Shopping list instructions for AI assistants
pub const SHOPPING_INSTRUCTIONS: &str = r#"
# Despensa Shopping List Instructions

Despensa normalizes Portuguese recipe quantities and sums them into shopping lists.
It keeps no state: every call carries the recipes it needs.

## Quantity Normalization

`normalize_quantity(raw: "2 c. de sopa")` returns the quantity in a canonical unit:

| Unit | Meaning |
|------|---------|
| g | grams (kg is converted) |
| ml | milliliters (L is converted) |
| U | whole units ("unid.", bare numbers) |
| D | garlic cloves ("dentes") |
| F | leaves ("folhas") |
| QB | quanto baste, to taste (always 1) |

Anything else (e.g. "lata", "pitada") is kept as written.

### Spoon and Cup Measures

| Written | Converted to |
|---------|--------------|
| c. de chá | 4 g |
| c. de sopa | 14 g |
| c. de sobremesa / c. sobremesa | 14 g |
| c. de café | 1.5 g |
| cháv. | 250 ml |

### Other Rules

- Decimal commas are accepted: "1,5 kg" = 1500 g
- Fractions: "½", "¼", "1⁄2", "1 ½ kg" = 1500 g
- "±", "(±)" and "+-" are ignored
- "100 + 50 g" = 150 g
- "1 lata (2x250g)" = 500 g with 1 lata as the extra quantity
- When grams appear in parentheses they become the main quantity

A quantity that cannot be read returns an `error` instead of failing the call.

## Recipes

`normalize_recipe_ingredients(name, portion, ingredients)` normalizes every line and
reports `normalized_count` / `failed_count`. Failed lines keep their error text;
the rest of the recipe is still normalized.

Portion text must read "<N> pessoas" (e.g. "4 pessoas") to be scaled.

## Shopping Lists

`build_shopping_list(start_date, end_date, target_portion, meals)`:

1. Only meals dated between start_date and end_date (inclusive, YYYY-MM-DD) count
2. Each recipe is scaled by target_portion / N for portions "<N> pessoas"
3. Without target_portion (and no server default) quantities are not scaled
4. Ingredients are summed by exact name: "Farinha" and "farinha" are separate lines
5. Lines that cannot be normalized are listed under `skipped`

Units are taken from the first recipe that uses an ingredient. Using the same
ingredient name with different units (g in one recipe, ml in another) sums
them anyway; keep units consistent per ingredient.

`export_shopping_list_markdown` takes the same arguments plus an optional title
and returns a markdown document.
"#;

/// Status response
#[derive(Debug, Serialize)]
pub struct DespensaStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Active configuration
    pub config: Config,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    config: Config,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(config: Config) -> Self {
        Self {
            start_time: Instant::now(),
            config,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> DespensaStatus {
        let build_info = BuildInfo::current();

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        DespensaStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            config: self.config.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_config_and_process() {
        let config = Config {
            default_target_portion: Some(2.0),
            report_unit_mismatch: true,
        };
        let status = StatusTracker::new(config).get_status();

        assert_eq!(status.process_id, std::process::id());
        assert_eq!(status.config.default_target_portion, Some(2.0));
        assert!(status.config.report_unit_mismatch);
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }
}

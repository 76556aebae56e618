use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ValidationError;

/// Hard cap on the number of assets in one portfolio.
pub const MAX_ASSETS: usize = 3;

/// One selectable entry from the backend's asset catalog.
///
/// The catalog is fetched once when the editor opens and is immutable for
/// the rest of the session.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub code: String,
    pub name: String,
    pub company: String,
    #[serde(default)]
    pub logo_url: String,
}

/// State of a portfolio under construction: the ordered asset selection,
/// the percentage assigned to each selected asset, and the portfolio name.
///
/// All mutations go through the methods below; nothing else touches the
/// selection or the allocation map. Invariants held after every operation:
/// the selection has at most [`MAX_ASSETS`] distinct codes, and the
/// allocation map has exactly one entry per selected code.
pub struct AllocationEditor {
    catalog: Vec<Asset>,
    selection: Vec<String>,
    allocations: HashMap<String, u8>,
    name: String,
}

impl AllocationEditor {
    pub fn new(catalog: Vec<Asset>) -> Self {
        AllocationEditor {
            catalog,
            selection: Vec::new(),
            allocations: HashMap::new(),
            name: String::new(),
        }
    }

    /// Pre-load the editor with a stored portfolio (edit flow). Entries with
    /// unknown codes are skipped, values are clamped, and anything beyond
    /// the asset cap is dropped. Stored weights are kept as-is; no
    /// rebalancing happens here.
    pub fn seed(&mut self, name: &str, entries: &[(String, i64)]) {
        self.name = name.to_string();
        self.selection.clear();
        self.allocations.clear();
        for (code, value) in entries {
            if self.selection.len() >= MAX_ASSETS || !self.in_catalog(code) {
                continue;
            }
            if self.selection.iter().any(|c| c == code) {
                continue;
            }
            self.selection.push(code.clone());
            self.allocations.insert(code.clone(), clamp_percent(*value));
        }
    }

    pub fn catalog(&self) -> &[Asset] {
        &self.catalog
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn is_selected(&self, code: &str) -> bool {
        self.selection.iter().any(|c| c == code)
    }

    /// Whether the catalog card for `code` should render as disabled:
    /// unselected cards grey out once the cap is reached. This is a visual
    /// hint only; `select_asset` enforces the cap on its own.
    pub fn is_card_disabled(&self, code: &str) -> bool {
        !self.is_selected(code) && self.selection.len() >= MAX_ASSETS
    }

    pub fn allocation(&self, code: &str) -> Option<u8> {
        self.allocations.get(code).copied()
    }

    /// Add an asset to the selection and rebalance. Silently ignored when
    /// the code is unknown, already selected, or the cap is reached.
    pub fn select_asset(&mut self, code: &str) {
        if !self.in_catalog(code) || self.is_selected(code) || self.selection.len() >= MAX_ASSETS {
            return;
        }
        self.selection.push(code.to_string());
        self.allocations.insert(code.to_string(), 0);
        self.rebalance();
    }

    /// Remove an asset from the selection and redistribute the remaining
    /// weights. Silently ignored when the code is not selected.
    pub fn deselect_asset(&mut self, code: &str) {
        let Some(pos) = self.selection.iter().position(|c| c == code) else {
            return;
        };
        self.selection.remove(pos);
        self.allocations.remove(code);
        self.rebalance();
    }

    /// Overwrite one allocation with a clamped value. The other entries are
    /// left alone on purpose: a total that drifts away from 100 surfaces as
    /// a validation failure instead of being silently corrected.
    pub fn set_allocation(&mut self, code: &str, value: i64) {
        if let Some(entry) = self.allocations.get_mut(code) {
            *entry = clamp_percent(value);
        }
    }

    /// Same as [`set_allocation`](Self::set_allocation) but for raw text
    /// input; anything that does not parse as an integer counts as 0.
    pub fn set_allocation_input(&mut self, code: &str, raw: &str) {
        let value = raw.trim().parse::<i64>().unwrap_or(0);
        self.set_allocation(code, value);
    }

    pub fn total_allocation(&self) -> u32 {
        self.allocations.values().map(|v| *v as u32).sum()
    }

    /// Gate for form submission. On failure the submit must be cancelled
    /// before any network call is made.
    pub fn validate_for_submit(&self) -> Result<(), ValidationError> {
        if self.selection.is_empty() {
            return Err(ValidationError::NoAssetsSelected);
        }
        if self.total_allocation() != 100 {
            return Err(ValidationError::TotalNotHundred);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }
        Ok(())
    }

    /// Allocation rows for display, in selection order. Entries a manual
    /// edit drove to zero stay in the map but are hidden here until the
    /// asset is deselected.
    pub fn visible_rows(&self) -> Vec<(&Asset, u8)> {
        self.selection
            .iter()
            .filter_map(|code| {
                let value = self.allocations.get(code).copied()?;
                if value == 0 {
                    return None;
                }
                let asset = self.catalog.iter().find(|a| &a.code == code)?;
                Some((asset, value))
            })
            .collect()
    }

    /// Serialize for the create/edit POST: one `allocation[<code>]` field
    /// per selected, non-zero-weight asset plus the portfolio name.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![("portfolio_name".to_string(), self.name.trim().to_string())];
        for code in &self.selection {
            let value = self.allocations.get(code).copied().unwrap_or(0);
            if value == 0 {
                continue;
            }
            fields.push((format!("allocation[{code}]"), value.to_string()));
        }
        fields
    }

    fn in_catalog(&self, code: &str) -> bool {
        self.catalog.iter().any(|a| a.code == code)
    }

    // Applied on select/deselect only, never on a manual edit. The most
    // recently added asset takes the rounding remainder.
    fn rebalance(&mut self) {
        match self.selection.len() {
            1 => {
                self.allocations.insert(self.selection[0].clone(), 100);
            }
            2 => {
                for code in &self.selection {
                    self.allocations.insert(code.clone(), 50);
                }
            }
            3 => {
                for (i, code) in self.selection.iter().enumerate() {
                    let value = if i == 2 { 34 } else { 33 };
                    self.allocations.insert(code.clone(), value);
                }
            }
            _ => {}
        }
    }
}

fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Asset> {
        ["AAPL", "TSLA", "MSFT", "NVDA", "AMZN"]
            .iter()
            .map(|code| Asset {
                code: code.to_string(),
                name: code.to_string(),
                company: format!("{code} Inc."),
                logo_url: String::new(),
            })
            .collect()
    }

    fn editor() -> AllocationEditor {
        AllocationEditor::new(catalog())
    }

    fn assert_keys_match(editor: &AllocationEditor) {
        assert_eq!(editor.selection().len(), editor.allocations.len());
        for code in editor.selection() {
            assert!(editor.allocation(code).is_some());
        }
    }

    #[test]
    fn rebalances_on_each_select() {
        let mut e = editor();

        e.select_asset("AAPL");
        assert_eq!(e.allocation("AAPL"), Some(100));
        assert_eq!(e.total_allocation(), 100);
        assert_keys_match(&e);

        e.select_asset("TSLA");
        assert_eq!(e.allocation("AAPL"), Some(50));
        assert_eq!(e.allocation("TSLA"), Some(50));
        assert_eq!(e.total_allocation(), 100);
        assert_keys_match(&e);

        e.select_asset("MSFT");
        assert_eq!(e.allocation("AAPL"), Some(33));
        assert_eq!(e.allocation("TSLA"), Some(33));
        assert_eq!(e.allocation("MSFT"), Some(34));
        assert_eq!(e.total_allocation(), 100);
        assert_keys_match(&e);
    }

    #[test]
    fn rebalances_remaining_assets_on_deselect() {
        let mut e = editor();
        e.select_asset("AAPL");
        e.select_asset("TSLA");
        e.select_asset("MSFT");

        e.deselect_asset("AAPL");
        assert_eq!(e.selection(), ["TSLA", "MSFT"]);
        assert_eq!(e.allocation("TSLA"), Some(50));
        assert_eq!(e.allocation("MSFT"), Some(50));
        assert_eq!(e.total_allocation(), 100);
        assert_keys_match(&e);

        e.deselect_asset("TSLA");
        assert_eq!(e.allocation("MSFT"), Some(100));
        assert_eq!(e.total_allocation(), 100);
        assert_keys_match(&e);
    }

    #[test]
    fn fourth_select_is_a_no_op() {
        let mut e = editor();
        e.select_asset("AAPL");
        e.select_asset("TSLA");
        e.select_asset("MSFT");
        e.select_asset("NVDA");

        assert_eq!(e.selection().len(), 3);
        assert!(!e.is_selected("NVDA"));
        assert_eq!(e.total_allocation(), 100);
        assert!(e.is_card_disabled("NVDA"));
        assert!(!e.is_card_disabled("AAPL"));
    }

    #[test]
    fn duplicate_and_unknown_selects_are_no_ops() {
        let mut e = editor();
        e.select_asset("AAPL");
        e.select_asset("AAPL");
        assert_eq!(e.selection().len(), 1);
        assert_eq!(e.allocation("AAPL"), Some(100));

        e.select_asset("DOGE");
        assert_eq!(e.selection().len(), 1);

        e.deselect_asset("TSLA");
        assert_eq!(e.selection().len(), 1);
    }

    #[test]
    fn manual_edit_clamps_and_never_redistributes() {
        let mut e = editor();
        e.select_asset("AAPL");
        e.select_asset("TSLA");

        e.set_allocation("AAPL", 70);
        assert_eq!(e.allocation("AAPL"), Some(70));
        assert_eq!(e.allocation("TSLA"), Some(50));
        assert_eq!(e.total_allocation(), 120);

        e.set_allocation("AAPL", -5);
        assert_eq!(e.allocation("AAPL"), Some(0));

        e.set_allocation("AAPL", 150);
        assert_eq!(e.allocation("AAPL"), Some(100));

        e.set_allocation_input("AAPL", "abc");
        assert_eq!(e.allocation("AAPL"), Some(0));

        e.set_allocation_input("AAPL", " 42 ");
        assert_eq!(e.allocation("AAPL"), Some(42));

        // editing an unselected code does nothing
        e.set_allocation("MSFT", 10);
        assert_eq!(e.allocation("MSFT"), None);
    }

    #[test]
    fn validation_reports_the_failing_condition() {
        let mut e = editor();
        assert_eq!(
            e.validate_for_submit(),
            Err(ValidationError::NoAssetsSelected)
        );

        e.select_asset("AAPL");
        e.select_asset("TSLA");
        e.set_name("Tech Focus");
        assert_eq!(e.validate_for_submit(), Ok(()));

        e.set_allocation("AAPL", 70);
        assert_eq!(e.total_allocation(), 120);
        assert_eq!(
            e.validate_for_submit(),
            Err(ValidationError::TotalNotHundred)
        );
        assert_eq!(
            e.validate_for_submit().unwrap_err().to_string(),
            "Total allocation must equal 100%"
        );

        e.set_allocation("AAPL", 50);
        e.set_name("   ");
        assert_eq!(e.validate_for_submit(), Err(ValidationError::NameRequired));
    }

    #[test]
    fn zero_weight_entries_stay_in_the_map_but_are_hidden() {
        let mut e = editor();
        e.select_asset("AAPL");
        e.select_asset("TSLA");
        e.set_name("Halfway");
        e.set_allocation("TSLA", 0);

        // still a valid map entry until deselected
        assert_eq!(e.allocation("TSLA"), Some(0));
        assert_eq!(e.selection().len(), 2);

        let rows = e.visible_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0.code, "AAPL");

        let fields = e.form_fields();
        assert_eq!(
            fields,
            vec![
                ("portfolio_name".to_string(), "Halfway".to_string()),
                ("allocation[AAPL]".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn form_fields_keep_selection_order() {
        let mut e = editor();
        e.select_asset("MSFT");
        e.select_asset("AAPL");
        e.select_asset("NVDA");
        e.set_name("Ordered");

        let fields = e.form_fields();
        assert_eq!(fields[0].0, "portfolio_name");
        assert_eq!(fields[1].0, "allocation[MSFT]");
        assert_eq!(fields[2].0, "allocation[AAPL]");
        assert_eq!(fields[3].0, "allocation[NVDA]");
        assert_eq!(fields[3].1, "34");
    }

    #[test]
    fn seed_restores_a_stored_portfolio_without_rebalancing() {
        let mut e = editor();
        e.seed(
            "Diversified Growth",
            &[
                ("AAPL".to_string(), 30),
                ("NVDA".to_string(), 30),
                ("DOGE".to_string(), 40),
                ("AMZN".to_string(), 40),
            ],
        );

        // unknown code skipped, later entry takes its slot
        assert_eq!(e.selection(), ["AAPL", "NVDA", "AMZN"]);
        assert_eq!(e.allocation("AMZN"), Some(40));
        assert_eq!(e.total_allocation(), 100);
        assert_eq!(e.name(), "Diversified Growth");
    }
}

use std::collections::HashMap;

use piechart::{Chart, Color};

use crate::api::{PortfolioRecord, PortfolioSummary, RadarMetrics};

/// Parse a stored allocation display string ("AAPL: 30%, NVDA: 30%,
/// BTC-USD: 40%") back into ordered (code, percent) pairs. Malformed
/// segments are skipped.
pub fn parse_allocation_display(allocation: &str) -> Vec<(String, i64)> {
    allocation
        .split(',')
        .filter_map(|segment| {
            let (code, value) = segment.split_once(':')?;
            let code = code.trim();
            let value = value.trim().trim_end_matches('%');
            if code.is_empty() {
                return None;
            }
            Some((code.to_string(), value.trim().parse::<i64>().ok()?))
        })
        .collect()
}

/// Integer percentages to the fractional weights the API expects.
pub fn weights_from_entries(entries: &[(String, i64)]) -> HashMap<String, f64> {
    entries
        .iter()
        .map(|(code, value)| (code.clone(), *value as f64 / 100.0))
        .collect()
}

pub fn find_record<'a>(
    records: &'a [PortfolioRecord],
    portfolio_id: i64,
) -> Option<&'a PortfolioRecord> {
    records.iter().find(|r| r.portfolio_id == portfolio_id)
}

// Print the stored portfolios as a table
pub fn print_portfolio_table(records: &[PortfolioRecord]) {
    use comfy_table::{
        presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor, ContentArrangement,
        Table,
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);

    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Allocation").add_attribute(Attribute::Bold),
        Cell::new("Owner").add_attribute(Attribute::Bold),
        Cell::new("Shared").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
        Cell::new("Return").add_attribute(Attribute::Bold),
        Cell::new("CAGR").add_attribute(Attribute::Bold),
        Cell::new("Volatility").add_attribute(Attribute::Bold),
        Cell::new("Max DD").add_attribute(Attribute::Bold),
    ]);

    let colorize_pct = |v: f64| {
        let c = if v >= 0.0 { TColor::Green } else { TColor::Red };
        Cell::new(format!("{:.2}%", v * 100.0))
            .set_alignment(CellAlignment::Right)
            .fg(c)
    };

    for record in records {
        let shared = if record.is_shared { "yes" } else { "no" };
        table.add_row(vec![
            Cell::new(record.portfolio_id).set_alignment(CellAlignment::Right),
            Cell::new(&record.portfolio_name),
            Cell::new(&record.allocation),
            Cell::new(&record.creator_username),
            Cell::new(shared),
            Cell::new(format!("{:.2}", record.current_value)).set_alignment(CellAlignment::Right),
            colorize_pct(record.return_percent),
            colorize_pct(record.cagr),
            Cell::new(format!("{:.2}%", record.volatility * 100.0))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", record.max_drawdown * 100.0))
                .set_alignment(CellAlignment::Right)
                .fg(TColor::Red),
        ]);
    }

    println!("{table}");
}

// Side-by-side summary metrics for the compare command
pub fn print_comparison_table(
    name_a: &str,
    name_b: &str,
    summary_a: &PortfolioSummary,
    summary_b: &PortfolioSummary,
) {
    use comfy_table::{
        presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor, ContentArrangement,
        Table,
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100)
        .set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new(name_a).add_attribute(Attribute::Bold),
            Cell::new(name_b).add_attribute(Attribute::Bold),
        ]);

    let money = |v: f64| Cell::new(format!("{v:.2}")).set_alignment(CellAlignment::Right);
    let pct = |v: f64| {
        let c = if v >= 0.0 { TColor::Green } else { TColor::Red };
        Cell::new(format!("{:.2}%", v * 100.0))
            .set_alignment(CellAlignment::Right)
            .fg(c)
    };
    let days = |v: i64| Cell::new(format!("{v} days")).set_alignment(CellAlignment::Right);

    table.add_row(vec![
        Cell::new("Net Worth"),
        money(summary_a.net_worth),
        money(summary_b.net_worth),
    ]);
    table.add_row(vec![
        Cell::new("Profit"),
        money(summary_a.profit),
        money(summary_b.profit),
    ]);
    table.add_row(vec![
        Cell::new("Total Return"),
        pct(summary_a.cumulative_return),
        pct(summary_b.cumulative_return),
    ]);
    table.add_row(vec![
        Cell::new("CAGR"),
        pct(summary_a.cagr),
        pct(summary_b.cagr),
    ]);
    table.add_row(vec![
        Cell::new("Volatility"),
        Cell::new(format!("{:.2}%", summary_a.volatility * 100.0))
            .set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.2}%", summary_b.volatility * 100.0))
            .set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Max Drawdown"),
        Cell::new(format!("{:.2}%", summary_a.max_drawdown * 100.0))
            .set_alignment(CellAlignment::Right)
            .fg(TColor::Red),
        Cell::new(format!("{:.2}%", summary_b.max_drawdown * 100.0))
            .set_alignment(CellAlignment::Right)
            .fg(TColor::Red),
    ]);
    table.add_row(vec![
        Cell::new("Longest DD"),
        days(summary_a.longest_dd),
        days(summary_b.longest_dd),
    ]);

    println!("{table}");
}

// Radar metrics as a table; percent axes and raw ratios format
// differently
pub fn print_radar_table(
    name_a: &str,
    name_b: &str,
    radar_a: &RadarMetrics,
    radar_b: &RadarMetrics,
) {
    use comfy_table::{
        presets::UTF8_FULL, Attribute, Cell, CellAlignment, ContentArrangement, Table,
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100)
        .set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new(name_a).add_attribute(Attribute::Bold),
            Cell::new(name_b).add_attribute(Attribute::Bold),
        ]);

    let pct = |v: f64| Cell::new(format!("{:.2}%", v * 100.0)).set_alignment(CellAlignment::Right);
    let ratio = |v: f64| Cell::new(format!("{v:.2}")).set_alignment(CellAlignment::Right);

    table.add_row(vec![Cell::new("CAGR"), pct(radar_a.cagr), pct(radar_b.cagr)]);
    table.add_row(vec![
        Cell::new("Volatility"),
        pct(radar_a.volatility),
        pct(radar_b.volatility),
    ]);
    table.add_row(vec![
        Cell::new("Sharpe Ratio"),
        ratio(radar_a.sharpe),
        ratio(radar_b.sharpe),
    ]);
    table.add_row(vec![
        Cell::new("Sortino Ratio"),
        ratio(radar_a.sortino),
        ratio(radar_b.sortino),
    ]);
    table.add_row(vec![
        Cell::new("Calmar Ratio"),
        ratio(radar_a.calmar),
        ratio(radar_b.calmar),
    ]);
    table.add_row(vec![
        Cell::new("Max Drawdown"),
        pct(radar_a.max_drawdown.abs()),
        pct(radar_b.max_drawdown.abs()),
    ]);
    table.add_row(vec![
        Cell::new("Win Rate"),
        pct(radar_a.win_rate),
        pct(radar_b.win_rate),
    ]);

    println!("{table}");
}

pub fn draw_allocation_pie(title: &str, entries: &[(String, i64)]) {
    let colors = [
        Color::Blue,
        Color::Yellow,
        Color::Green,
        Color::Red,
        Color::Cyan,
        Color::Purple,
        Color::White,
        Color::Black,
    ];

    let data: Vec<piechart::Data> = entries
        .iter()
        .enumerate()
        .filter(|(_, (_, value))| *value > 0)
        .map(|(i, (code, value))| piechart::Data {
            label: format!("{code} {value}%"),
            value: *value as f32,
            color: Some(colors[i % colors.len()].into()),
            fill: '•',
        })
        .collect();

    if data.is_empty() {
        return;
    }

    println!("{title}");
    Chart::new()
        .legend(true)
        .radius(9)
        .aspect_ratio(3)
        .draw(&data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_allocation_display_strings() {
        let entries = parse_allocation_display("AAPL: 30%, NVDA: 30%, BTC-USD: 40%");
        assert_eq!(
            entries,
            vec![
                ("AAPL".to_string(), 30),
                ("NVDA".to_string(), 30),
                ("BTC-USD".to_string(), 40),
            ]
        );
    }

    #[test]
    fn skips_malformed_allocation_segments() {
        let entries = parse_allocation_display("AAPL: 50%, garbage, : 10%, MSFT: x%");
        assert_eq!(entries, vec![("AAPL".to_string(), 50)]);
        assert!(parse_allocation_display("").is_empty());
    }

    #[test]
    fn converts_entries_to_fractional_weights() {
        let weights = weights_from_entries(&[
            ("AAPL".to_string(), 30),
            ("BTC-USD".to_string(), 40),
        ]);
        assert_eq!(weights["AAPL"], 0.30);
        assert_eq!(weights["BTC-USD"], 0.40);
    }
}

//! Reply formatting for Discord messages.

use crate::{
    core::analytics::{StockStats, WindowTotals},
    entities::{ProductModel, RequestAction, RequestModel, RequestStatus},
};

/// Discord rejects messages longer than this.
pub const MESSAGE_LIMIT: usize = 2000;

/// Notes longer than this are cut in one-line summaries.
pub const NOTE_PREVIEW_CHARS: usize = 200;

/// Product and employee names longer than this are cut in one-line summaries.
pub const NAME_PREVIEW_CHARS: usize = 100;

/// Keeps the first `max` characters of `text`, ending with `…` when anything was cut.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

const fn status_badge(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "⏳",
        RequestStatus::Approved => "✅",
        RequestStatus::Rejected => "❌",
    }
}

/// One-line summary: `#12 ⏳ IN x5 Polo Shirt by Ana (new product) | note`.
#[must_use]
pub fn format_request(request: &RequestModel) -> String {
    let direction = if request.is_stock_in() { "IN" } else { "OUT" };
    let mut line = format!(
        "#{} {} {direction} x{} **{}** by {}",
        request.id,
        status_badge(request.status),
        request.quantity.unsigned_abs(),
        truncate_chars(&request.product_name, NAME_PREVIEW_CHARS),
        truncate_chars(&request.employee_name, NAME_PREVIEW_CHARS),
    );
    match request.action {
        Some(RequestAction::NewProduct) => line.push_str(" (new product)"),
        Some(RequestAction::DirectAdjust) => line.push_str(" (direct adjustment)"),
        None => {}
    }
    if let Some(note) = &request.note {
        line.push_str(" | 📝 ");
        line.push_str(&truncate_chars(note, NOTE_PREVIEW_CHARS));
    }
    line
}

/// One-line product summary, flagging low stock.
#[must_use]
pub fn format_product(product: &ProductModel, low_stock_threshold: i64) -> String {
    let size = product.size.as_deref().unwrap_or("N/A");
    let mut line = format!(
        "#{} **{}** ({size}): {} in stock",
        product.id, product.name, product.stock
    );
    if crate::core::product::is_low_stock(product, low_stock_threshold) {
        line.push_str(" ⚠️ LOW STOCK");
    }
    line
}

fn format_totals(label: &str, totals: &WindowTotals) -> String {
    format!(
        "**{label}**: today {} | 7 days {} | this month {} | last month {}",
        totals.today, totals.last_7_days, totals.this_month, totals.previous_month
    )
}

/// Multi-line statistics summary.
#[must_use]
pub fn format_stats(stats: &StockStats) -> String {
    let mut text = format!(
        "📊 **Stock movement**\n{}\n{}\n",
        format_totals("In", &stats.stock_in),
        format_totals("Out", &stats.stock_out)
    );
    if stats.top_sellers.is_empty() {
        text.push_str("No stock-outs in the last 30 days.");
    } else {
        text.push_str("🏆 **Top sellers (30 days)**");
        for (rank, seller) in stats.top_sellers.iter().enumerate() {
            text.push_str(&format!(
                "\n{}. {} ({})",
                rank + 1,
                seller.product_name,
                seller.quantity
            ));
        }
    }
    text
}

/// Joins lines under a header, dropping trailing lines that would exceed
/// [`MESSAGE_LIMIT`] and saying how many were left out.
#[must_use]
pub fn join_lines(header: &str, lines: &[String]) -> String {
    let mut text = header.to_string();
    for (shown, line) in lines.iter().enumerate() {
        let remaining = lines.len() - shown;
        let footer = format!("\n…and {remaining} more");
        if text.len() + 1 + line.len() + footer.len() > MESSAGE_LIMIT {
            text.push_str(&footer);
            return text;
        }
        text.push('\n');
        text.push_str(line);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analytics::TopSeller;
    use chrono::Utc;

    fn request(quantity: i64, note: Option<&str>) -> RequestModel {
        RequestModel {
            id: 12,
            product_id: Some(3),
            product_name: "Polo Shirt".to_string(),
            employee_name: "Ana".to_string(),
            quantity,
            status: RequestStatus::Pending,
            note: note.map(ToString::to_string),
            action: None,
            created_by: "u-1".to_string(),
            created_at: Utc::now(),
            processed_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_format_request() {
        assert_eq!(
            format_request(&request(-5, Some("window display"))),
            "#12 ⏳ OUT x5 **Polo Shirt** by Ana | 📝 window display"
        );
        assert_eq!(
            format_request(&request(3, None)),
            "#12 ⏳ IN x3 **Polo Shirt** by Ana"
        );
    }

    #[test]
    fn test_format_request_caps_long_fields() {
        let mut long = request(-5, None);
        long.note = Some("n".repeat(10_000));
        long.product_name = "p".repeat(10_000);
        long.employee_name = "e".repeat(10_000);

        let line = format_request(&long);
        assert!(line.chars().count() < MESSAGE_LIMIT);
        assert!(line.ends_with('…'));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 4), "abc…");
        assert_eq!(truncate_chars("ééééé", 3).chars().count(), 3);
    }

    #[test]
    fn test_format_product_flags_low_stock() {
        let now = Utc::now();
        let product = ProductModel {
            id: 3,
            name: "Cap".to_string(),
            size: None,
            stock: 2,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            format_product(&product, 5),
            "#3 **Cap** (N/A): 2 in stock ⚠️ LOW STOCK"
        );
        assert_eq!(format_product(&product, 2), "#3 **Cap** (N/A): 2 in stock");
    }

    #[test]
    fn test_format_stats_lists_top_sellers() {
        let stats = StockStats {
            top_sellers: vec![
                TopSeller {
                    product_name: "Cap".to_string(),
                    quantity: 9,
                },
                TopSeller {
                    product_name: "Scarf".to_string(),
                    quantity: 4,
                },
            ],
            ..StockStats::default()
        };
        let text = format_stats(&stats);
        assert!(text.contains("1. Cap (9)"));
        assert!(text.contains("2. Scarf (4)"));
        assert!(format_stats(&StockStats::default()).contains("No stock-outs"));
    }

    #[test]
    fn test_join_lines_truncates() {
        let lines: Vec<String> = (0..500).map(|i| format!("line number {i}")).collect();
        let text = join_lines("Header", &lines);
        assert!(text.len() <= MESSAGE_LIMIT);
        assert!(text.ends_with("more"));

        assert_eq!(join_lines("H", &["a".to_string()]), "H\na");
    }
}

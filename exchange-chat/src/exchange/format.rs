use super::ExchangeRecord;

pub const CHAT_PREFIX: &str = "Курс гривні Приватбанку: ";

const TABLE_RULE_WIDTH: usize = 44;

/// Renders records as the single line broadcast into the chat.
pub fn chat_line(records: &[ExchangeRecord]) -> String {
    let mut line = String::from(CHAT_PREFIX);
    for record in records {
        line.push_str(&format!("[{}] -> ", record.date));
        for rate in &record.rates {
            line.push_str(&format!(
                "{} - купівля {}, продаж {}; ",
                rate.currency, rate.buy, rate.sell
            ));
        }
    }

    match line.strip_suffix("; ") {
        Some(trimmed) => trimmed.to_string(),
        None => line.trim_end().to_string(),
    }
}

/// Renders records as the fixed-width table printed by the `rates` command.
///
/// Rows follow the order of `currencies`; currencies missing upstream for a
/// date are left out of that date's block.
pub fn rates_table(records: &[ExchangeRecord], currencies: &[String]) -> String {
    let rule = "-".repeat(TABLE_RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        format!("{:^12} {:^10} {:<10} {:<10}", "Date", "Currency", "Sell", "Buy"),
    ];

    for record in records {
        lines.push(rule.clone());
        let rows = currencies.iter().filter_map(|currency| {
            let rate = record.rates.iter().find(|rate| &rate.currency == currency)?;
            Some(format!(
                "{:<12} {:^10} {:<10} {:<10}",
                record.date, rate.currency, rate.sell, rate.buy
            ))
        });
        lines.extend(rows);
    }
    lines.push(rule);

    let mut table = lines.join("\n");
    table.push('\n');
    table
}

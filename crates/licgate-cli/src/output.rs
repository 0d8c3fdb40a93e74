use licgate_core::Decision;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_decision(decision: Option<&Decision>, json: bool) -> anyhow::Result<()> {
    match (decision, json) {
        (Some(d), true) => print_json(d),
        (None, true) => print_json(&serde_json::json!({ "decision": null })),
        (Some(d), false) => {
            println!("{d}");
            Ok(())
        }
        (None, false) => {
            println!("no decision: job declares no license requirement");
            Ok(())
        }
    }
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

use crate::output::{print_json, print_table};
use licgate_core::alternative;

pub fn run(expression: &str, json: bool) -> anyhow::Result<()> {
    let alternatives = alternative::parse(expression)?;

    if json {
        return print_json(&alternatives);
    }

    if alternatives.is_empty() {
        println!("No license requirement.");
        return Ok(());
    }

    let rows = alternatives
        .iter()
        .enumerate()
        .flat_map(|(i, alt)| {
            alt.requirements().iter().map(move |r| {
                vec![(i + 1).to_string(), r.feature.clone(), r.count.to_string()]
            })
        })
        .collect();
    print_table(&["ALT", "FEATURE", "COUNT"], rows);
    Ok(())
}

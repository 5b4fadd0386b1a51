//! Policies command: list the built-in hospital policies.

use anyhow::Result;
use medgate_abac::StandardPolicies;

use crate::OutputFormat;
use crate::style::list_table;

pub fn run(format: OutputFormat) -> Result<()> {
    let policies = StandardPolicies::all();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&policies)?),
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = policies
                .iter()
                .map(|p| {
                    vec![
                        format!("@{}", p.name),
                        p.description.to_string(),
                        p.text.to_string(),
                    ]
                })
                .collect();
            println!("{}", list_table(&["Name", "Who", "Policy"], &rows));
        }
    }
    Ok(())
}

//! Summary table output

use crate::runner::{Outcome, ResultRecord};

/// Render the summary table, one row per record in matrix order.
pub fn render_summary(records: &[ResultRecord]) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&"=".repeat(50));
    out.push('\n');
    out.push_str(&format!("{:^50}\n", "SUMMARY"));
    out.push_str(&"-".repeat(50));
    out.push('\n');
    for record in records {
        match &record.outcome {
            Outcome::Measured(t) => {
                out.push_str(&format!(
                    "{:36} {:6.1} MiB/s  {:5.2} Gbps\n",
                    record.label,
                    t.mib_s,
                    t.gbit_s()
                ));
            }
            Outcome::Failed => {
                out.push_str(&format!("{:36} FAILED\n", record.label));
            }
        }
    }
    out.push_str(&"-".repeat(50));
    out.push('\n');
    out
}

/// Print the summary table to stdout.
pub fn print_summary(records: &[ResultRecord]) {
    print!("{}", render_summary(records));
}

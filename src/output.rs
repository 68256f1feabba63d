use tabled::settings::Style;
use tabled::{Table, Tabled};
use termtree::Tree;

use tfctl::{InstanceRecord, Instances, Readiness, ReadinessReport};

#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "ADDRESS")]
    address: String,
    #[tabled(rename = "CLOUD")]
    cloud: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PUBLIC IP")]
    public_ip: String,
    #[tabled(rename = "HOST")]
    host: String,
    #[tabled(rename = "USER")]
    username: String,
}

impl From<&InstanceRecord> for InstanceRow {
    fn from(record: &InstanceRecord) -> Self {
        Self {
            address: record.address.clone(),
            cloud: record.cloud.to_string(),
            name: record.name.clone(),
            public_ip: record.public_ip.clone(),
            host: record.public_dns.clone().unwrap_or_else(|| "-".to_string()),
            username: record.username.clone(),
        }
    }
}

pub fn instances_table(instances: &Instances) -> String {
    let rows: Vec<InstanceRow> = instances.values().map(InstanceRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn instances_json(instances: &Instances) -> serde_json::Result<String> {
    serde_json::to_string_pretty(instances)
}

pub fn readiness_tree(report: &ReadinessReport) -> Tree<String> {
    let leaves = report.outcomes.iter().map(|(address, outcome)| {
        let status = match outcome {
            Readiness::Reachable { elapsed } => format!("reachable after {}s", elapsed.as_secs()),
            Readiness::TimedOut { elapsed } => {
                format!("unreachable (gave up after {}s)", elapsed.as_secs())
            }
            Readiness::Failed { reason } => format!("probe failed: {reason}"),
        };
        Tree::new(format!("{address}: {status}"))
    });

    Tree::new(format!(
        "readiness ({}/{} reachable)",
        report.len() - report.unreachable().len(),
        report.len()
    ))
    .with_leaves(leaves)
}

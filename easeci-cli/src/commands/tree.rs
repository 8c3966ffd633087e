//! `easeci tree`: print every group, its projects and their pipelines.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use easeci_core::{ProjectGroup, Registry};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Print the raw registry document as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "project")]
    project: String,
    #[tabled(rename = "id")]
    id: u64,
    #[tabled(rename = "tag")]
    tag: String,
    #[tabled(rename = "pipelines")]
    pipelines: String,
}

impl TreeArgs {
    pub fn run(self, registry: &Registry) -> Result<()> {
        let snapshot = registry.snapshot().context("failed to read registry")?;

        if self.json {
            let json = serde_json::to_string_pretty(&snapshot)
                .context("failed to serialize registry")?;
            println!("{json}");
            return Ok(());
        }

        println!();
        println!("{}", format!("Registry: {}", registry.path().display()).bold());
        println!("{}", "─".repeat(60));

        for group in snapshot.groups() {
            print_group(group);
        }

        println!(
            "{} group(s), {} project(s), {} pipeline(s)",
            snapshot.group_count(),
            snapshot.project_count(),
            snapshot.pointer_count()
        );
        Ok(())
    }
}

fn print_group(group: &ProjectGroup) {
    let tag = group
        .tag
        .as_deref()
        .map(|t| format!(" [{t}]"))
        .unwrap_or_default();
    println!();
    println!("{} {}{}", format!("#{}", group.id).dimmed(), group.name.bold(), tag);
    if let Some(description) = &group.description {
        println!("  {}", description.dimmed());
    }

    if group.projects.is_empty() {
        println!("  (no projects)");
        return;
    }

    let rows: Vec<Row> = group
        .projects
        .values()
        .map(|project| Row {
            project: project.name.clone(),
            id: project.id.0,
            tag: project.tag.clone().unwrap_or_else(|| "-".to_string()),
            pipelines: if project.pipelines.is_empty() {
                "-".to_string()
            } else {
                project
                    .pipelines
                    .values()
                    .map(|p| format!("{}:{}", p.pipeline_pointer_id, p.name))
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

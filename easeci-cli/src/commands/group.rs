//! `easeci group add|rm|rename|tag|describe`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use easeci_core::{GroupId, NewProjectGroup, Registry};

/// Manage project groups.
#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create a new, empty project group.
    Add(AddArgs),

    /// Remove a project group. Without `--hard` its projects move to `other`.
    Rm {
        id: u64,

        /// Discard the group's projects and pipeline pointers too.
        #[arg(long)]
        hard: bool,
    },

    /// Rename a project group.
    Rename { id: u64, name: String },

    /// Change the tag of a project group.
    Tag { id: u64, tag: String },

    /// Change the description of a project group.
    Describe { id: u64, description: String },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Group name; must be unique.
    pub name: String,

    #[arg(long, short = 't')]
    pub tag: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

pub fn run(registry: &Registry, cmd: GroupCommand) -> Result<()> {
    match cmd {
        GroupCommand::Add(args) => {
            let name = args.name.clone();
            let group = registry
                .create_project_group(NewProjectGroup {
                    name: args.name,
                    tag: args.tag,
                    description: args.description,
                })
                .with_context(|| format!("failed to create project group '{name}'"))?;
            println!("{} Created project group '{}' (id {})", "✓".green(), group.name, group.id);
        }
        GroupCommand::Rm { id, hard } => {
            let group = registry
                .delete_project_group(GroupId(id), hard)
                .with_context(|| format!("failed to remove project group {id}"))?;
            let moved = if hard || group.projects.is_empty() {
                String::new()
            } else {
                format!("; {} project(s) moved to 'other'", group.projects.len())
            };
            println!("{} Removed project group '{}'{}", "✓".green(), group.name, moved);
        }
        GroupCommand::Rename { id, name } => {
            let group = registry
                .rename_project_group(GroupId(id), name)
                .with_context(|| format!("failed to rename project group {id}"))?;
            println!("{} Renamed project group {} to '{}'", "✓".green(), group.id, group.name);
        }
        GroupCommand::Tag { id, tag } => {
            let group = registry
                .change_project_group_tag(GroupId(id), tag)
                .with_context(|| format!("failed to change tag of project group {id}"))?;
            println!("{} Tagged project group '{}'", "✓".green(), group.name);
        }
        GroupCommand::Describe { id, description } => {
            let group = registry
                .change_project_group_description(GroupId(id), description)
                .with_context(|| format!("failed to change description of project group {id}"))?;
            println!("{} Updated description of project group '{}'", "✓".green(), group.name);
        }
    }
    Ok(())
}

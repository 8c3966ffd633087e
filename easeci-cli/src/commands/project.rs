//! `easeci project add|rm|rename|tag|describe`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use easeci_core::{GroupId, NewProject, ProjectId, Registry, SECURED_GROUP_ID};

/// Manage projects inside project groups.
#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a new project inside a project group.
    Add(AddArgs),

    /// Remove a project. Without `--hard` its pipelines move to project `other`.
    Rm {
        id: u64,

        /// Group currently holding the project.
        #[arg(long, short = 'g')]
        group: u64,

        /// Discard the project's pipeline pointers too.
        #[arg(long)]
        hard: bool,
    },

    /// Rename a project.
    Rename { id: u64, name: String },

    /// Change the tag of a project.
    Tag { id: u64, tag: String },

    /// Change the description of a project.
    Describe { id: u64, description: String },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project name; must be unique within its group.
    pub name: String,

    /// Target project group. Defaults to the `other` group.
    #[arg(long, short = 'g', default_value_t = SECURED_GROUP_ID.0)]
    pub group: u64,

    #[arg(long, short = 't')]
    pub tag: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

pub fn run(registry: &Registry, cmd: ProjectCommand) -> Result<()> {
    match cmd {
        ProjectCommand::Add(args) => {
            let (name, group) = (args.name.clone(), args.group);
            let project = registry
                .create_project(NewProject {
                    group_id: GroupId(args.group),
                    name: args.name,
                    tag: args.tag,
                    description: args.description,
                })
                .with_context(|| format!("failed to create project '{name}' in group {group}"))?;
            println!(
                "{} Created project '{}' (id {}) in group {}",
                "✓".green(),
                project.name,
                project.id,
                group
            );
        }
        ProjectCommand::Rm { id, group, hard } => {
            let removed = registry
                .delete_project(GroupId(group), ProjectId(id), hard)
                .with_context(|| format!("failed to remove project {id} from group {group}"))?;
            match removed {
                Some(project) => {
                    let moved = if hard || project.pipelines.is_empty() {
                        String::new()
                    } else {
                        format!("; {} pipeline(s) moved to 'other'", project.pipelines.len())
                    };
                    println!("{} Removed project '{}'{}", "✓".green(), project.name, moved);
                }
                None => println!("{} Project {} is secured; removal denied", "!".yellow(), id),
            }
        }
        ProjectCommand::Rename { id, name } => {
            let project = registry
                .rename_project(ProjectId(id), name)
                .with_context(|| format!("failed to rename project {id}"))?;
            println!("{} Renamed project {} to '{}'", "✓".green(), project.id, project.name);
        }
        ProjectCommand::Tag { id, tag } => {
            let project = registry
                .change_project_tag(ProjectId(id), tag)
                .with_context(|| format!("failed to change tag of project {id}"))?;
            println!("{} Tagged project '{}'", "✓".green(), project.name);
        }
        ProjectCommand::Describe { id, description } => {
            let project = registry
                .change_project_description(ProjectId(id), description)
                .with_context(|| format!("failed to change description of project {id}"))?;
            println!("{} Updated description of project '{}'", "✓".green(), project.name);
        }
    }
    Ok(())
}

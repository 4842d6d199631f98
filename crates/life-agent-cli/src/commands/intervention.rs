use clap::Subcommand;
use life_agent_core::context::hours_window;
use life_agent_core::{Domain, RequestContext, ValidationError};
use serde_json::json;

use super::{open, print_json, CliResult};

#[derive(Subcommand)]
pub enum InterventionAction {
    /// List interventions (open only unless --all)
    List {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        all: bool,
    },
    /// Resolve an intervention administratively
    Resolve {
        /// Intervention ID
        id: i64,
    },
    /// Record that the user responded to an intervention
    Respond {
        /// Intervention ID
        id: i64,
    },
    /// Recent triggers for a domain, newest first
    Triggers {
        #[arg(long)]
        user: i64,
        /// Domain (general when omitted)
        #[arg(long)]
        domain: Option<Domain>,
        /// Window in hours (defaults to escalation.display_window_hours)
        #[arg(long)]
        hours: Option<i64>,
    },
}

pub fn run(action: InterventionAction) -> CliResult {
    let (db, engine, config) = open()?;

    match action {
        InterventionAction::List { user, all } => {
            let interventions = if all {
                db.interventions_for_user(user)?
            } else {
                engine
                    .lifecycle()
                    .open_interventions(&db, &RequestContext::new(user))?
            };
            print_json(&interventions)?;
        }
        InterventionAction::Resolve { id } => {
            let owner = db
                .get_intervention(id)?
                .ok_or(ValidationError::NotFound {
                    kind: "intervention",
                    id,
                })?
                .user_id;
            let resolved = engine
                .lifecycle()
                .resolve(&db, &RequestContext::new(owner), id)?;
            print_json(&resolved)?;
        }
        InterventionAction::Respond { id } => {
            let updated = engine.lifecycle().record_response(&db, id)?;
            print_json(&updated)?;
        }
        InterventionAction::Triggers { user, domain, hours } => {
            let window = hours_window(hours.unwrap_or(config.escalation.display_window_hours));
            let reads = engine
                .lifecycle()
                .query_triggers(&db, &RequestContext::new(user), domain, window)?;
            let rows = reads
                .into_iter()
                .map(|read| match read {
                    Ok(trigger) => serde_json::to_value(trigger),
                    Err(e) => Ok(json!({ "error": e.to_string() })),
                })
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&rows)?;
        }
    }
    Ok(())
}

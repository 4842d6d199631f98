use clap::Subcommand;
use life_agent_core::{Domain, RequestContext};

use super::{open, print_json, CliResult};

#[derive(Subcommand)]
pub enum CommitAction {
    /// Log a commitment for today
    Add {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        domain: Domain,
        /// Commitment text
        text: String,
    },
    /// Mark a commitment completed
    Complete {
        /// Commitment ID
        id: i64,
        #[arg(long)]
        user: i64,
    },
    /// List recent commitments, most recent first
    List {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        domain: Option<Domain>,
        /// Window in days (defaults to analysis.default_window_days)
        #[arg(long)]
        days: Option<u32>,
    },
}

pub fn run(action: CommitAction) -> CliResult {
    let (db, engine, config) = open()?;

    match action {
        CommitAction::Add { user, domain, text } => {
            let ctx = RequestContext::new(user).with_domain(domain);
            let logged = engine.log_commitment(&db, &ctx, domain, &text)?;
            print_json(&logged)?;
        }
        CommitAction::Complete { id, user } => {
            let ctx = RequestContext::new(user);
            let outcome = engine.complete_commitment(&db, &ctx, id)?;
            print_json(&outcome)?;
        }
        CommitAction::List { user, domain, days } => {
            let ctx = RequestContext::new(user);
            let days = days.unwrap_or(config.analysis.default_window_days);
            let after = ctx.days_back(days);
            let commitments = db.commitments_after(user, domain, after)?;
            print_json(&commitments)?;
        }
    }
    Ok(())
}

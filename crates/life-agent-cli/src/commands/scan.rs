use life_agent_core::{Domain, RequestContext};

use super::{open, print_json, CliResult};

pub fn run(user: i64, domain: Option<Domain>, text: &str) -> CliResult {
    let (db, engine, _) = open()?;
    let mut ctx = RequestContext::new(user);
    if let Some(domain) = domain {
        ctx = ctx.with_domain(domain);
    }
    let scan = engine.scan_message(&db, &ctx, text)?;
    print_json(&scan)
}

use life_agent_core::RequestContext;

use super::{open, print_json, CliResult};

pub fn run(user: i64) -> CliResult {
    let (db, engine, _) = open()?;
    let report = engine.comprehensive_check(&db, &RequestContext::new(user))?;
    print_json(&report)
}

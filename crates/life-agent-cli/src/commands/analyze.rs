use life_agent_core::{Domain, RequestContext};
use serde_json::json;

use super::{open, print_json, CliResult};

pub fn analyze(user: i64, days: Option<u32>) -> CliResult {
    let (db, engine, _) = open()?;
    let report = engine.analyze(&db, &RequestContext::new(user), days)?;
    print_json(&report)
}

pub fn predict(user: i64, domain: Domain, text: &str) -> CliResult {
    let (db, engine, _) = open()?;
    let ctx = RequestContext::new(user).with_domain(domain);
    let estimate = engine.predict(&db, &ctx, domain, text)?;
    print_json(&json!({
        "domain": domain,
        "commitment": text,
        "predicted_success": estimate,
    }))
}

pub fn success(user: i64) -> CliResult {
    let (db, engine, _) = open()?;
    let patterns = engine.success_patterns(&db, &RequestContext::new(user))?;
    print_json(&patterns)
}

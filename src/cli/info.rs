use anyhow::Result;
use refgate_core_types::origin::display_name;
use refgate_core_types::Role;
use serde::Serialize;

use crate::cli::context::CliContext;

#[derive(Serialize)]
struct InfoReport {
    version: &'static str,
    build_date: &'static str,
    git_commit: &'static str,
    config_path: String,
    config_present: bool,
    local_origin: String,
    max_query_len: usize,
    max_search_len: usize,
    implied_roles: Vec<(Role, Vec<Role>)>,
}

pub fn cmd_info(ctx: &CliContext) -> Result<()> {
    let engine = ctx.engine();
    let config = engine.config();
    let report = InfoReport {
        version: env!("CARGO_PKG_VERSION"),
        build_date: env!("REFGATE_BUILD_DATE"),
        git_commit: env!("REFGATE_GIT_HASH"),
        config_path: ctx.config_path().display().to_string(),
        config_present: ctx.config_path().exists(),
        local_origin: config.local_origin.clone(),
        max_query_len: config.max_query_len,
        max_search_len: config.max_search_len,
        implied_roles: Role::ALL
            .iter()
            .map(|&role| {
                let implied: Vec<Role> = engine
                    .hierarchy()
                    .implied_by(role)
                    .into_iter()
                    .filter(|&lower| lower != role)
                    .collect();
                (role, implied)
            })
            .collect(),
    };

    ctx.output().print(&report, |r| {
        let mut lines = vec![
            "Refgate System Information".to_string(),
            "==========================".to_string(),
            format!("Version: {}", r.version),
            format!("Build Date: {}", r.build_date),
            format!("Git Commit: {}", r.git_commit),
            String::new(),
            "Configuration:".to_string(),
            format!(
                "- Config File: {}{}",
                r.config_path,
                if r.config_present { "" } else { " (not found, defaults)" }
            ),
            format!("- Local Origin: {}", display_name(&r.local_origin)),
            format!("- Max Query Length: {}", r.max_query_len),
            format!("- Max Search Length: {}", r.max_search_len),
            String::new(),
            "Role Hierarchy:".to_string(),
        ];
        for (role, implied) in &r.implied_roles {
            let implied: Vec<&str> = implied.iter().map(Role::as_str).collect();
            let implied = if implied.is_empty() {
                "-".to_string()
            } else {
                implied.join(", ")
            };
            lines.push(format!("- {:<10} {}", role.as_str(), implied));
        }
        lines.join("\n")
    })
}

// SPDX-License-Identifier: MPL-2.0

//! Headless driver: runs the cascade against a live server and takes
//! selection changes from stdin.
//!
//! ```text
//! select <level> <id>   change the selection at <level>
//! clear <level>         clear the selection at <level>
//! show                  print every control
//! quit
//! ```

use anyhow::{Context, Result};
use cascadia::{
    CascadeConfig, CascadeController, CascadeRuntime, ControlState, HierarchyClient,
    observability,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = CascadeConfig::load(config_path.as_deref()).context("loading configuration")?;
    observability::init(&config.observability)?;

    let client = HierarchyClient::new(&config).context("creating hierarchy client")?;
    let roots = match client.fetch_roots().await {
        Ok(roots) => roots,
        Err(e) => {
            error!(error = %e, "failed to load root categories");
            Vec::new()
        }
    };
    info!(count = roots.len(), base_url = %config.base_url, "root categories loaded");

    let controller = CascadeController::builder(Arc::new(client))
        .from_config(&config)
        .roots(roots)
        .build()?;
    let (handle, join) = CascadeRuntime::spawn(controller);

    print_states(&config, &handle.snapshot().await?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let result = match words.as_slice() {
            ["select", level, id] => match level.parse() {
                Ok(level) => handle.select(level, *id).await,
                Err(_) => {
                    eprintln!("bad level: {}", level);
                    continue;
                }
            },
            ["clear", level] => match level.parse() {
                Ok(level) => handle.select(level, "").await,
                Err(_) => {
                    eprintln!("bad level: {}", level);
                    continue;
                }
            },
            ["show"] => Ok(()),
            ["quit"] | ["exit"] => break,
            [] => continue,
            _ => {
                eprintln!("commands: select <level> <id> | clear <level> | show | quit");
                continue;
            }
        };

        if let Err(e) = result {
            eprintln!("{}", e);
            continue;
        }
        print_states(&config, &handle.settled().await?);
    }

    drop(handle);
    join.await?;
    Ok(())
}

fn print_states(config: &CascadeConfig, states: &[ControlState]) {
    for (level, state) in states.iter().enumerate() {
        let options: Vec<String> = state
            .options
            .iter()
            .map(|o| {
                let marker = if state.selected_id() == Some(o.id.as_str()) && !o.id.is_empty() {
                    "*"
                } else {
                    ""
                };
                if o.id.is_empty() {
                    o.label.clone()
                } else {
                    format!("{}{}={}", marker, o.id, o.label)
                }
            })
            .collect();
        println!(
            "{} [{}]: {}",
            level,
            config.level_name(level),
            options.join(" | ")
        );
    }
}

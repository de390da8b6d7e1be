//! CLI command handler: layer config, set up logging, run the harvest.

use anyhow::Result;
use log::{debug, warn};
use std::path::Path;
use std::time::Duration;

use crate::engine::arg_parser::Cli;
use crate::harvest::harvest;
use crate::types::{Opts, Source};
use crate::utils::{
    DEFAULT_BUCKET, DEFAULT_ENDPOINT, apply_file_to_opts, load_harvest_toml, setup_logging,
};

/// Overwrite opts fields set on the command line (or through the environment).
pub fn apply_cli_to_opts(cli: &Cli, opts: &mut Opts) {
    if let Some(ref dir) = cli.dir {
        opts.source = Source::Directory(dir.clone());
    } else if cli.bucket.is_some() || cli.endpoint.is_some() {
        opts.source = opts.source.with_bucket(
            cli.bucket.as_deref(),
            cli.endpoint.as_deref(),
            (DEFAULT_BUCKET, DEFAULT_ENDPOINT),
        );
    }
    if let Some(ref output) = cli.output {
        opts.output = Some(output.clone());
    }
    if let Some(format) = cli.format {
        opts.format = format;
    }
    opts.workers = cli.workers.or(opts.workers);
    opts.channel_capacity = cli.channel_capacity.or(opts.channel_capacity);
    opts.page_size = cli.page_size.or(opts.page_size);
    if let Some(ms) = cli.poll_interval_ms {
        opts.poll_interval = Duration::from_millis(ms);
    }
    if let Some(verbose) = cli.verbose {
        opts.verbose = verbose;
    }
}

/// Defaults → config file in `config_dir` → CLI. Also sets up logging.
fn setup_opts(cli: &Cli, config_dir: &Path) -> Opts {
    let file = load_harvest_toml(config_dir);
    let mut opts = Opts::default();
    if let Ok(Some(ref f)) = file {
        apply_file_to_opts(f, &mut opts);
    }
    apply_cli_to_opts(cli, &mut opts);
    setup_logging(opts.verbose);
    if let Err(e) = file {
        warn!("Ignoring config file: {:#}", e);
    }
    opts
}

/// Run one harvest with options layered from the working directory's config and `cli`.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli, Path::new("."));
    debug!("Harvesting {}", opts.source);
    let summary = harvest(&opts)?;
    println!("{}", summary.destination);
    Ok(())
}

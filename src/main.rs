//! # urlhunter
//!
//! Search the URLTeam releases of archive.org for keywords.
//!
//! Releases are resolved from a date, then downloaded, extracted and decompressed before being
//! streamed line by line. Every line that matches a keyword is printed as `source,target`.
//!
//! ## Getting started
//!
//! ```sh
//! # search the release of a given day
//! urlhunter -k keywords.txt -d 2020-11-20
//!
//! # search every release of a range, appending matches to a file
//! urlhunter -k keywords.txt -d 2020-11-01:2020-11-30 -o matches.txt --rm
//!
//! # search the most recent release
//! urlhunter -k keywords.txt -d latest
//! ```
//!
//! Keywords are read one per line. A keyword containing commas matches lines containing all of its
//! parts, and a keyword starting with `regex ` is a regular expression.
use std::sync::Arc;

use env_logger::Env;
use structopt::StructOpt;

use urlhunter::config::DateSpec;
use urlhunter::decompress::XzCommand;
use urlhunter::download::HttpFetcher;
use urlhunter::error::Error;
use urlhunter::io::Output;
use urlhunter::processing::{ArchiveJob, Scheduler, Searcher};

#[macro_use]
extern crate log;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let opt = cli::UrlHunter::from_args();
    debug!("cli args\n{:#?}", opt);

    if !opt.keywords.is_file() {
        error!("[ERROR]: keywords file not found: {:?}", opt.keywords);
        return Err(Error::Custom(format!(
            "keywords file not found: {}",
            opt.keywords.display()
        )));
    }

    let config = opt.config();
    std::fs::create_dir_all(config.archives())?;

    let output = match &opt.output {
        Some(path) => Output::append(path)?,
        None => Output::stdout(),
    };

    let searcher = Searcher::new(
        config,
        Arc::new(HttpFetcher::new()),
        Arc::new(XzCommand::default()),
    );
    let jobs = ArchiveJob::from_spec(opt.date, &opt.keywords, &output, opt.remove_after);

    match opt.date {
        DateSpec::Latest | DateSpec::Single(_) => {
            for job in &jobs {
                if let Err(e) = searcher.run(job).await {
                    error!("[ERROR]: {}: {}", job.date(), e);
                    return Err(e);
                }
            }
        }
        DateSpec::Range(_, _) => {
            let scheduler = Scheduler::new(Arc::new(searcher));
            info!(
                "Processing {} dates with {} workers",
                jobs.len(),
                scheduler.workers()
            );
            let report = scheduler.run(jobs).await;
            println!("\n{}", report);
        }
    }

    output.flush()?;
    info!("Search complete!");
    Ok(())
}

//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;
use urlhunter::config::{Config, DateSpec, DEFAULT_WORKERS};

#[derive(Debug, StructOpt)]
/// Search URLTeam releases for keywords.
///
/// ```sh
/// urlhunter 0.1.0
/// Search URLTeam releases for keywords.
///
/// USAGE:
///     urlhunter [FLAGS] [OPTIONS] --date <date> --keywords <keywords>
///
/// FLAGS:
///     -h, --help       Prints help information
///         --rm         remove downloaded archive folders after processing
///     -V, --version    Prints version information
///
/// OPTIONS:
///     -a, --archives <archives>    archives folder [default: archives]
///     -d, --date <date>            YYYY-MM-DD, YYYY-MM-DD:YYYY-MM-DD, YYYY or latest
///     -k, --keywords <keywords>    file containing one keyword per line
///     -o, --output <output>        append matches to this file instead of printing them
///     -w, --workers <workers>      number of dates processed concurrently [default: 3]
/// ```
#[structopt(name = "urlhunter", about = "Search URLTeam releases for keywords.")]
pub struct UrlHunter {
    #[structopt(
        short = "k",
        long = "keywords",
        parse(from_os_str),
        help = "file containing one keyword per line"
    )]
    pub keywords: PathBuf,

    #[structopt(
        short = "d",
        long = "date",
        help = "YYYY-MM-DD, YYYY-MM-DD:YYYY-MM-DD, YYYY or latest"
    )]
    pub date: DateSpec,

    #[structopt(
        short = "o",
        long = "output",
        parse(from_os_str),
        help = "append matches to this file instead of printing them"
    )]
    pub output: Option<PathBuf>,

    #[structopt(
        short = "a",
        long = "archives",
        parse(from_os_str),
        default_value = "archives",
        help = "archives folder"
    )]
    pub archives: PathBuf,

    #[structopt(long = "rm", help = "remove downloaded archive folders after processing")]
    pub remove_after: bool,

    #[structopt(
        short = "w",
        long = "workers",
        default_value = "3",
        help = "number of dates processed concurrently"
    )]
    pub workers: usize,
}

impl UrlHunter {
    pub fn config(&self) -> Config {
        let workers = if self.workers == 0 {
            DEFAULT_WORKERS
        } else {
            self.workers
        };
        Config::new(&self.archives).with_workers(workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args() {
        let opt = UrlHunter::from_iter_safe(&[
            "urlhunter",
            "-k",
            "keywords.txt",
            "--date",
            "2020-01-01:2020-01-03",
            "--rm",
        ])
        .unwrap();
        assert_eq!(opt.keywords, PathBuf::from("keywords.txt"));
        assert!(matches!(opt.date, DateSpec::Range(_, _)));
        assert!(opt.remove_after);
        assert!(opt.output.is_none());
        assert_eq!(opt.config().archives(), std::path::Path::new("archives"));
        assert_eq!(opt.config().workers(), 3);
    }

    #[test]
    fn missing_required_args() {
        assert!(UrlHunter::from_iter_safe(&["urlhunter", "-k", "keywords.txt"]).is_err());
        assert!(UrlHunter::from_iter_safe(&["urlhunter", "-d", "2020-11-20"]).is_err());
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(
            UrlHunter::from_iter_safe(&["urlhunter", "-k", "k.txt", "-d", "20-11-2020"]).is_err()
        );
    }
}

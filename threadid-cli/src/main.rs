//! Probes a thread identity source from many threads at once and reports the ids it hands out.

#![forbid(unsafe_code)]

use std::io::Write;
use std::num::NonZeroUsize;

use clap::Parser;
use comfy_table::Table;
use eyre::WrapErr;
use threadid_std::thread::{NativeThread, Thread};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;

use self::probe::{Sample, probe};

mod eyre_tracing_error;
mod probe;

/// Thread identity probe
///
/// Spawns threads that are all alive at the same time, has each of them query its own id repeatedly, and fails if any
/// thread sees its id change or two threads share an id.
#[derive(Parser, Debug)]
#[command(version)]
struct Arguments {
    /// Number of threads to spawn.
    #[arg(long, env = "THREADID_THREADS", default_value = "10")]
    threads: NonZeroUsize,

    /// Number of times each thread queries its id.
    #[arg(long, env = "THREADID_CALLS", default_value = "1000")]
    calls: NonZeroUsize,

    /// Where thread ids come from.
    #[arg(long, env = "THREADID_SOURCE", value_enum, default_value_t = Source::Counter)]
    source: Source,

    /// How to print the report.
    #[arg(long, env = "THREADID_FORMAT", value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    /// Runtime-assigned ids that are never reused within the process.
    Counter,
    /// The kernel's thread ids.
    Native,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    /// A human readable table.
    Table,
    /// A JSON array of `{ "thread", "id" }` objects.
    Json,
}

fn main() -> eyre::Result<()> {
    let args = Arguments::parse();

    eyre::set_hook(Box::new(eyre_tracing_error::ReportHandler::default_with))?;

    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .with_env_var("THREADID_LOG")
                    .from_env()?,
            )
            .with_writer(std::io::stderr)
            .compact()
            .finish()
            .with(tracing_error::ErrorLayer::default()),
    )?;

    tracing::debug!(?args, "starting probe");

    let samples = match args.source {
        Source::Counter => probe::<Thread>(args.threads, args.calls),
        Source::Native => probe::<NativeThread>(args.threads, args.calls),
    }
    .wrap_err_with(|| format!("probing the {:?} source failed", args.source))?;

    tracing::info!(
        threads = samples.len(),
        calls = args.calls.get(),
        "every thread saw a stable, distinct id"
    );

    let mut stdout = std::io::stdout().lock();
    match args.format {
        Format::Table => writeln!(stdout, "{}", render_table(&samples))?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut stdout, &samples)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}

fn render_table(samples: &[Sample]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_header(["Thread", "Id"])
        .add_rows(
            samples
                .iter()
                .map(|sample| [sample.thread.to_string(), sample.id.to_string()]),
        );
    table
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::ffi::OsStr;
    use std::num::NonZeroU64;

    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use threadid_api::ThreadId;

    use super::*;

    #[test]
    fn verify_cli() {
        Arguments::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Arguments::try_parse_from(["threadid"]).unwrap();
        assert_eq!(args.threads.get(), 10);
        assert_eq!(args.calls.get(), 1000);
        assert_eq!(args.source, Source::Counter);
        assert_eq!(args.format, Format::Table);
    }

    #[test]
    fn parses_options() {
        let args = Arguments::try_parse_from([
            "threadid",
            "--threads",
            "3",
            "--calls",
            "7",
            "--source",
            "native",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.threads.get(), 3);
        assert_eq!(args.calls.get(), 7);
        assert_eq!(args.source, Source::Native);
        assert_eq!(args.format, Format::Json);
    }

    #[test_case("threads", "THREADID_THREADS")]
    #[test_case("calls", "THREADID_CALLS")]
    #[test_case("source", "THREADID_SOURCE")]
    #[test_case("format", "THREADID_FORMAT")]
    fn options_read_environment(id: &str, env: &str) {
        let command = Arguments::command();
        let argument = command
            .get_arguments()
            .find(|argument| argument.get_id() == id)
            .unwrap();
        assert_eq!(argument.get_env(), Some(OsStr::new(env)));
    }

    #[test]
    fn rejects_zero_threads() {
        assert!(Arguments::try_parse_from(["threadid", "--threads", "0"]).is_err());
    }

    #[test]
    fn table_lists_every_sample() {
        let samples = [
            Sample {
                thread: 0,
                id: ThreadId::from_raw(NonZeroU64::new(1).unwrap()),
            },
            Sample {
                thread: 1,
                id: ThreadId::from_raw(NonZeroU64::new(0xbeef).unwrap()),
            },
        ];
        let rendered = render_table(&samples).to_string();
        assert!(rendered.contains("0000000000000001"));
        assert!(rendered.contains("000000000000beef"));
    }
}

use std::path::Path;
use std::process;
use std::sync::Arc;

use bytesize::ByteSize;
use clap::ArgEnum;
use env_logger;
use log;

use ext_line_sort::memory::process::{ProcessMemoryMonitor, DEFAULT_SAMPLE_EVERY};
use ext_line_sort::{
    BudgetedBufferBuilder, LineSorterBuilder, MemoryBudget, PlainRunFormat, RmpRunFormat, RunBufferBuilder,
    RunFormat, SortError,
};

const EXIT_FAILURE: i32 = 1;
const EXIT_INTEGRITY: i32 = 3;

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let run_format: RunFormatArg = arg_parser.value_of_t_or_exit("run_format");
    let tmp_dir: Option<&str> = arg_parser.value_of("tmp_dir");
    let threads: Option<usize> = arg_parser
        .is_present("threads")
        .then(|| arg_parser.value_of_t_or_exit("threads"));
    let merge_fan_in: Option<usize> = arg_parser
        .is_present("merge_fan_in")
        .then(|| arg_parser.value_of_t_or_exit("merge_fan_in"));
    let sample_every: u32 = arg_parser
        .is_present("sample_every")
        .then(|| arg_parser.value_of_t_or_exit("sample_every"))
        .unwrap_or(DEFAULT_SAMPLE_EVERY);

    let input = arg_parser.value_of("input").expect("value is required");
    let output = arg_parser.value_of("output").expect("value is required");
    let budget = arg_parser
        .value_of("budget")
        .expect("value is required")
        .parse::<ByteSize>()
        .expect("value is pre-validated");

    let monitor = match ProcessMemoryMonitor::new(sample_every) {
        Ok(monitor) => Arc::new(monitor),
        Err(err) => {
            log::error!("memory monitor initialization error: {}", err);
            process::exit(EXIT_FAILURE);
        }
    };

    let mut sorter_builder =
        LineSorterBuilder::new().with_buffer(BudgetedBufferBuilder::new(MemoryBudget::new(budget.as_u64()), monitor));
    if let Some(threads) = threads {
        sorter_builder = sorter_builder.with_threads_number(threads);
    }

    if let Some(merge_fan_in) = merge_fan_in {
        sorter_builder = sorter_builder.with_merge_fan_in(merge_fan_in);
    }

    if let Some(tmp_dir) = tmp_dir {
        sorter_builder = sorter_builder.with_tmp_dir(Path::new(tmp_dir));
    }

    let exit_code = match run_format {
        RunFormatArg::Plain => run_sort(sorter_builder.with_format::<PlainRunFormat>(), input, output),
        RunFormatArg::Msgpack => run_sort(sorter_builder.with_format::<RmpRunFormat>(), input, output),
    };
    process::exit(exit_code);
}

fn run_sort<B, F>(sorter_builder: LineSorterBuilder<B, F>, input: &str, output: &str) -> i32
where
    B: RunBufferBuilder,
    F: RunFormat,
{
    let sorter = match sorter_builder.build() {
        Ok(sorter) => sorter,
        Err(err) => {
            log::error!("sorter initialization error: {}", err);
            return EXIT_FAILURE;
        }
    };

    match sorter.sort_file(Path::new(input), Path::new(output)) {
        Ok(summary) => {
            log::info!("sorting finished (lines: {}, runs: {})", summary.lines, summary.runs);
            0
        }
        Err(err @ SortError::Integrity(_)) => {
            log::error!("data sorting error: {}", err);
            EXIT_INTEGRITY
        }
        Err(err) => {
            log::error!("data sorting error: {}", err);
            EXIT_FAILURE
        }
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum RunFormatArg {
    Plain,
    Msgpack,
}

/// Parses command line values of `ArgEnum` options.
macro_rules! arg_enum_value {
    ($name:ident) => {
        impl $name {
            pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
                Self::value_variants().iter().filter_map(|v| v.to_possible_value())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as clap::ArgEnum>::from_str(s, false)
            }
        }
    };
}

arg_enum_value!(LogLevel);
arg_enum_value!(RunFormatArg);

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("ext-line-sort")
        .about("sorts lines of a text file within a memory budget")
        .arg(
            clap::Arg::new("input")
                .help("file to be sorted")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("output")
                .help("result file")
                .required(true)
                .index(2),
        )
        .arg(
            clap::Arg::new("budget")
                .help("memory budget, in bytes or with a unit (64MiB)")
                .required(true)
                .index(3)
                .validator(|v| match v.parse::<ByteSize>() {
                    Ok(_) => Ok(()),
                    Err(err) => Err(format!("Memory budget format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .arg(
            clap::Arg::new("run_format")
                .short('f')
                .long("run-format")
                .help("format of temporary run files")
                .takes_value(true)
                .default_value("plain")
                .possible_values(RunFormatArg::possible_values()),
        )
        .arg(
            clap::Arg::new("threads")
                .short('t')
                .long("threads")
                .help("number of threads to use for parallel run sorting")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("merge_fan_in")
                .short('m')
                .long("merge-fan-in")
                .help("maximum number of runs merged at once")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("sample_every")
                .short('s')
                .long("sample-every")
                .help("number of admission checks sharing one process memory sample")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data")
                .takes_value(true),
        )
        .get_matches()
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(log_level.into())
        .format_module_path(false)
        .format_timestamp_millis()
        .init();
}

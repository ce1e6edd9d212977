//! External line sorter.

use std::fs;
use std::io::{self, prelude::*};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log;

use crate::buffer::{LineLimitedBufferBuilder, RunBufferBuilder};
use crate::builder::{RunBuilder, RunSet};
use crate::error::SortError;
use crate::line::ByteLines;
use crate::merger::KWayMerger;
use crate::run::{PlainRunFormat, RunFormat, RunHandle, RunStore};
use crate::sink::OutputSink;

/// Sorting result summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSummary {
    /// Number of sorted (non-empty) lines.
    pub lines: u64,
    /// Number of runs the input was split into.
    pub runs: usize,
}

/// Default maximum number of runs merged at once.
pub const DEFAULT_MERGE_FAN_IN: usize = 256;

/// Line sorter builder. Provides methods for [`LineSorter`] initialization.
pub struct LineSorterBuilder<B = LineLimitedBufferBuilder, F = PlainRunFormat>
where
    B: RunBufferBuilder,
    F: RunFormat,
{
    /// Number of threads to be used to sort runs in parallel.
    threads_number: Option<usize>,
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Run buffer builder.
    buffer_builder: B,
    /// Maximum number of runs merged at once.
    merge_fan_in: Option<usize>,
    /// Cancellation flag.
    cancel: Option<Arc<AtomicBool>>,

    /// Run format type.
    format: PhantomData<F>,
}

impl LineSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    /// By default the whole input is sorted in a single in-memory batch.
    pub fn new() -> Self {
        LineSorterBuilder::default()
    }
}

impl Default for LineSorterBuilder {
    fn default() -> Self {
        LineSorterBuilder {
            threads_number: None,
            tmp_dir: None,
            rw_buf_size: None,
            buffer_builder: LineLimitedBufferBuilder::default(),
            merge_fan_in: None,
            cancel: None,
            format: PhantomData,
        }
    }
}

impl<B, F> LineSorterBuilder<B, F>
where
    B: RunBufferBuilder,
    F: RunFormat,
{
    /// Builds a [`LineSorter`] instance using provided configuration.
    pub fn build(self) -> Result<LineSorter<B, F>, SortError> {
        LineSorter::new(
            self.threads_number,
            self.tmp_dir,
            self.buffer_builder,
            self.rw_buf_size,
            self.merge_fan_in,
            self.cancel,
        )
    }

    /// Sets number of threads to be used to sort runs in parallel.
    pub fn with_threads_number(mut self, threads_number: usize) -> Self {
        self.threads_number = Some(threads_number);
        return self;
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> Self {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets run file read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> Self {
        self.rw_buf_size = Some(buf_size);
        return self;
    }

    /// Sets the maximum number of runs merged at once. Runs beyond it are merged in intermediate passes.
    pub fn with_merge_fan_in(mut self, merge_fan_in: usize) -> Self {
        self.merge_fan_in = Some(merge_fan_in);
        return self;
    }

    /// Sets a flag stopping the sort between lines once raised.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        return self;
    }

    /// Sets run buffer builder.
    pub fn with_buffer<B2: RunBufferBuilder>(self, buffer_builder: B2) -> LineSorterBuilder<B2, F> {
        LineSorterBuilder {
            threads_number: self.threads_number,
            tmp_dir: self.tmp_dir,
            rw_buf_size: self.rw_buf_size,
            buffer_builder,
            merge_fan_in: self.merge_fan_in,
            cancel: self.cancel,
            format: PhantomData,
        }
    }

    /// Sets run storage format.
    pub fn with_format<F2: RunFormat>(self) -> LineSorterBuilder<B, F2> {
        LineSorterBuilder {
            threads_number: self.threads_number,
            tmp_dir: self.tmp_dir,
            rw_buf_size: self.rw_buf_size,
            buffer_builder: self.buffer_builder,
            merge_fan_in: self.merge_fan_in,
            cancel: self.cancel,
            format: PhantomData,
        }
    }
}

/// External line sorter.
///
/// Sorting runs in two phases: the input is split into sorted runs persisted in a temporary directory, then
/// the runs are merged into the output. The temporary directory is removed when the sort ends, whether it
/// succeeds or not.
pub struct LineSorter<B = LineLimitedBufferBuilder, F = PlainRunFormat>
where
    B: RunBufferBuilder,
    F: RunFormat,
{
    /// Run sorting thread pool.
    thread_pool: rayon::ThreadPool,
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Run buffer builder.
    buffer_builder: B,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Maximum number of runs merged at once.
    merge_fan_in: usize,
    /// Cancellation flag.
    cancel: Option<Arc<AtomicBool>>,

    /// Run format type.
    format: PhantomData<F>,
}

impl<B, F> LineSorter<B, F>
where
    B: RunBufferBuilder,
    F: RunFormat,
{
    /// Creates a new line sorter instance.
    ///
    /// # Arguments
    /// * `threads_number` - Number of threads to be used to sort runs in parallel. If the parameter is [`None`]
    ///   threads number will be selected based on available CPU core number.
    /// * `tmp_dir` - Directory to be used to store temporary data. If paramater is [`None`] default OS temporary
    ///   directory will be used.
    /// * `buffer_builder` - An instance of a buffer builder that will be used for run buffer creation.
    /// * `rw_buf_size` - Run and output file read/write buffer size.
    /// * `merge_fan_in` - Maximum number of runs merged at once, at least 2. If the parameter is [`None`]
    ///   [`DEFAULT_MERGE_FAN_IN`] is used.
    /// * `cancel` - Flag stopping the sort once raised.
    pub fn new(
        threads_number: Option<usize>,
        tmp_dir: Option<Box<Path>>,
        buffer_builder: B,
        rw_buf_size: Option<usize>,
        merge_fan_in: Option<usize>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Self, SortError> {
        return Ok(LineSorter {
            thread_pool: Self::init_thread_pool(threads_number)?,
            tmp_dir,
            buffer_builder,
            rw_buf_size,
            merge_fan_in: merge_fan_in.unwrap_or(DEFAULT_MERGE_FAN_IN).max(2),
            cancel,
            format: PhantomData,
        });
    }

    fn init_thread_pool(threads_number: Option<usize>) -> Result<rayon::ThreadPool, SortError> {
        let mut thread_pool_builder = rayon::ThreadPoolBuilder::new();

        if let Some(threads_number) = threads_number {
            log::info!("initializing thread-pool (threads: {})", threads_number);
            thread_pool_builder = thread_pool_builder.num_threads(threads_number);
        } else {
            log::info!("initializing thread-pool (threads: default)");
        }
        let thread_pool = thread_pool_builder
            .build()
            .map_err(|err| SortError::ThreadPoolBuildError(err))?;

        return Ok(thread_pool);
    }

    /// Sorts lines of the input file into the output file.
    /// The output file is created only after the input has been split into runs. If sorting fails after that
    /// point, the output file is left incomplete.
    ///
    /// # Arguments
    /// * `input` - File to be sorted
    /// * `output` - Result file
    pub fn sort_file(&self, input: &Path, output: &Path) -> Result<SortSummary, SortError> {
        let input_file = match fs::File::open(input) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SortError::InputNotFound(input.to_path_buf()))
            }
            Err(err) => return Err(SortError::Input(err)),
        };

        return self.sort_with(io::BufReader::new(input_file), || {
            fs::File::create(output).map_err(SortError::Output)
        });
    }

    /// Sorts lines read from the input stream into the output stream.
    ///
    /// # Arguments
    /// * `input` - Input stream data to be fetched from
    /// * `output` - Output stream sorted lines are written to
    pub fn sort<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<SortSummary, SortError> {
        self.sort_with(input, move || Ok(output))
    }

    fn sort_with<R, W, O>(&self, input: R, open_output: O) -> Result<SortSummary, SortError>
    where
        R: BufRead,
        W: Write,
        O: FnOnce() -> Result<W, SortError>,
    {
        self.buffer_builder.preflight()?;

        let mut store: RunStore<F> = RunStore::new(self.tmp_dir.as_deref(), self.rw_buf_size)?;
        let result = self.run_phases(&mut store, input, open_output);
        store.cleanup();

        return result;
    }

    fn run_phases<R, W, O>(&self, store: &mut RunStore<F>, input: R, open_output: O) -> Result<SortSummary, SortError>
    where
        R: BufRead,
        W: Write,
        O: FnOnce() -> Result<W, SortError>,
    {
        let mut run_builder = RunBuilder::new(&self.buffer_builder, &mut *store, &self.thread_pool);
        if let Some(cancel) = self.cancel.as_deref() {
            run_builder = run_builder.with_cancel_flag(cancel);
        }
        let run_set = run_builder.build(ByteLines::new(input))?;
        log::info!(
            "input split into runs (lines: {}, runs: {})",
            run_set.lines,
            run_set.runs()
        );

        let mut sink = OutputSink::new(open_output()?, self.rw_buf_size);
        let merged = self.merge(store, &run_set, &mut sink);
        let merged = match (merged, sink.finish()) {
            (Ok(merged), Ok(_)) => merged,
            (Err(err), _) | (Ok(_), Err(err)) => {
                log::warn!("sorted output is incomplete");
                return Err(err);
            }
        };

        log::info!("runs merged (lines: {})", merged);

        return Ok(SortSummary {
            lines: merged,
            runs: run_set.runs(),
        });
    }

    fn merge<W: Write>(
        &self,
        store: &mut RunStore<F>,
        run_set: &RunSet,
        sink: &mut OutputSink<W>,
    ) -> Result<u64, SortError> {
        let mut handles = run_set.handles.clone();
        while handles.len() > self.merge_fan_in {
            log::debug!("merging {} runs into intermediate runs ...", handles.len());
            handles = self.merge_pass(store, handles)?;
        }

        let cursors = handles
            .iter()
            .map(|handle| store.open_cursor(handle))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("merging {} runs ...", cursors.len());
        let merger = KWayMerger::new(cursors)?;

        return merger.merge_into(sink, run_set.lines, self.cancel.as_deref());
    }

    /// Merges every group of `merge_fan_in` runs into a new run, consumed runs are discarded.
    fn merge_pass(&self, store: &mut RunStore<F>, handles: Vec<RunHandle>) -> Result<Vec<RunHandle>, SortError> {
        let mut merged = Vec::with_capacity(handles.len() / self.merge_fan_in + 1);
        for group in handles.chunks(self.merge_fan_in) {
            if let [handle] = group {
                merged.push(handle.clone());
                continue;
            }

            let cursors = group
                .iter()
                .map(|handle| store.open_cursor(handle))
                .collect::<Result<Vec<_>, _>>()?;
            let expected = group.iter().map(RunHandle::lines).sum();

            let mut writer = store.create_run()?;
            KWayMerger::new(cursors)?.merge_into_run(&mut writer, expected, self.cancel.as_deref())?;
            merged.push(writer.finalize()?);

            for handle in group {
                store.discard(handle);
            }
        }

        return Ok(merged);
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io::{self, prelude::*};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use rand::seq::SliceRandom;
    use rand::Rng;
    use rstest::*;

    use super::{LineSorter, LineSorterBuilder, SortSummary};
    use crate::buffer::{BudgetedBufferBuilder, LineLimitedBufferBuilder, RunBufferBuilder};
    use crate::error::SortError;
    use crate::line::LINE_OVERHEAD;
    use crate::memory::{MemoryBudget, SimulatedMemoryMonitor};
    use crate::run::{RmpRunFormat, RunFormat};

    /// Working directory holding input and output files.
    #[fixture]
    fn work_dir() -> tempfile::TempDir {
        tempfile::tempdir_in("./").unwrap()
    }

    /// Parent of the sorter temporary directory.
    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir_in("./").unwrap()
    }

    fn budget_for(lines: u64, line_len: u64) -> BudgetedBufferBuilder<SimulatedMemoryMonitor> {
        BudgetedBufferBuilder::new(
            MemoryBudget::new(lines * (LINE_OVERHEAD + line_len)),
            Arc::new(SimulatedMemoryMonitor::constant(0)),
        )
    }

    fn sorter<B: RunBufferBuilder>(tmp_dir: &tempfile::TempDir, buffer_builder: B) -> LineSorter<B> {
        LineSorterBuilder::new()
            .with_buffer(buffer_builder)
            .with_threads_number(2)
            .with_tmp_dir(tmp_dir.path())
            .build()
            .unwrap()
    }

    fn write_input(work_dir: &tempfile::TempDir, content: &[u8]) -> (PathBuf, PathBuf) {
        let input = work_dir.path().join("input.txt");
        fs::write(&input, content).unwrap();
        (input, work_dir.path().join("output.txt"))
    }

    fn is_empty_dir(dir: &tempfile::TempDir) -> bool {
        fs::read_dir(dir.path()).unwrap().next().is_none()
    }

    fn random_input(lines: usize) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let mut input = Vec::new();
        for _ in 0..lines {
            let len = rng.gen_range(0..12);
            input.extend((0..len).map(|_| rng.gen_range(b'a'..=b'z')));
            input.push(b'\n');
        }
        input
    }

    fn non_empty_sorted(input: &[u8]) -> Vec<u8> {
        let mut lines: Vec<&[u8]> = input.split(|b| *b == b'\n').filter(|line| !line.is_empty()).collect();
        lines.sort();
        lines.iter().flat_map(|line| line.iter().copied().chain(Some(b'\n'))).collect()
    }

    #[rstest]
    fn test_single_run(work_dir: tempfile::TempDir, tmp_dir: tempfile::TempDir) {
        let (input, output) = write_input(&work_dir, b"banana\napple\n\ncherry\napple\n");

        let summary = sorter(&tmp_dir, budget_for(100, 10)).sort_file(&input, &output).unwrap();

        assert_eq!(summary, SortSummary { lines: 4, runs: 1 });
        assert_eq!(fs::read(&output).unwrap(), b"apple\napple\nbanana\ncherry\n");
        assert!(is_empty_dir(&tmp_dir));
    }

    #[rstest]
    fn test_multiple_runs(work_dir: tempfile::TempDir, tmp_dir: tempfile::TempDir) {
        let (input, output) = write_input(&work_dir, b"d\nb\na\nc");

        let summary = sorter(&tmp_dir, budget_for(2, 1)).sort_file(&input, &output).unwrap();

        assert_eq!(summary, SortSummary { lines: 4, runs: 2 });
        assert_eq!(fs::read(&output).unwrap(), b"a\nb\nc\nd\n");
        assert!(is_empty_dir(&tmp_dir));
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(100)]
    #[case(10_000)]
    fn test_sorted_and_complete(work_dir: tempfile::TempDir, tmp_dir: tempfile::TempDir, #[case] batch_lines: u64) {
        let content = random_input(300);
        let (input, output) = write_input(&work_dir, &content);

        let summary = sorter(&tmp_dir, budget_for(batch_lines, 12)).sort_file(&input, &output).unwrap();

        let expected = non_empty_sorted(&content);
        let actual = fs::read(&output).unwrap();
        assert_eq!(actual, expected);
        assert_eq!(summary.lines as usize, expected.iter().filter(|b| **b == b'\n').count());
        assert!(actual.split(|b| *b == b'\n').rev().skip(1).all(|line| !line.is_empty()));
        assert!(is_empty_dir(&tmp_dir));
    }

    #[rstest]
    fn test_budget_idempotence(work_dir: tempfile::TempDir, tmp_dir: tempfile::TempDir) {
        let content = random_input(300);
        let (input, output) = write_input(&work_dir, &content);
        let second_output = work_dir.path().join("output2.txt");

        let small = sorter(&tmp_dir, budget_for(5, 12)).sort_file(&input, &output).unwrap();
        let large = sorter(&tmp_dir, budget_for(1000, 12)).sort_file(&input, &second_output).unwrap();

        assert!(small.runs > 1);
        assert_eq!(large.runs, 1);
        assert_eq!(small.lines, large.lines);
        assert_eq!(fs::read(&output).unwrap(), fs::read(&second_output).unwrap());
    }

    #[rstest]
    fn test_budget_too_small(work_dir: tempfile::TempDir, tmp_dir: tempfile::TempDir) {
        let (input, output) = write_input(&work_dir, b"b\na\n");
        let buffer_builder = BudgetedBufferBuilder::new(
            MemoryBudget::new(1000),
            Arc::new(SimulatedMemoryMonitor::constant(1000)),
        );

        match sorter(&tmp_dir, buffer_builder).sort_file(&input, &output) {
            Err(SortError::BudgetTooSmall { required }) => assert_eq!(required, 1001),
            result => panic!("unexpected result: {:?}", result),
        }
        assert!(!output.exists());
        assert!(is_empty_dir(&tmp_dir));
    }

    #[rstest]
    fn test_input_not_found(work_dir: tempfile::TempDir, tmp_dir: tempfile::TempDir) {
        let input = work_dir.path().join("missing.txt");
        let output = work_dir.path().join("output.txt");

        let result = sorter(&tmp_dir, budget_for(2, 1)).sort_file(&input, &output);

        assert!(matches!(result, Err(SortError::InputNotFound(path)) if path == input));
        assert!(!output.exists());
        assert!(is_empty_dir(&tmp_dir));
    }

    #[rstest]
    fn test_output_failure_cleans_up(work_dir: tempfile::TempDir, tmp_dir: tempfile::TempDir) {
        let (input, _) = write_input(&work_dir, b"d\nb\na\nc\n");
        // a directory cannot be opened as the output file
        let output = work_dir.path().to_path_buf();

        let result = sorter(&tmp_dir, budget_for(2, 1)).sort_file(&input, &output);

        match result {
            Err(err) => assert!(err.is_storage(), "unexpected error: {}", err),
            Ok(summary) => panic!("unexpected success: {:?}", summary),
        }
        assert!(is_empty_dir(&tmp_dir));
    }

    #[rstest]
    fn test_cancelled(work_dir: tempfile::TempDir, tmp_dir: tempfile::TempDir) {
        let (input, output) = write_input(&work_dir, b"b\na\n");
        let sorter = LineSorterBuilder::new()
            .with_buffer(budget_for(2, 1))
            .with_tmp_dir(tmp_dir.path())
            .with_cancel_flag(Arc::new(AtomicBool::new(true)))
            .build()
            .unwrap();

        assert!(matches!(sorter.sort_file(&input, &output), Err(SortError::Cancelled)));
        assert!(is_empty_dir(&tmp_dir));
    }

    /// Output accepting its first write only. Later writes raise the cancel flag if one is set, or fail.
    struct InterruptingWriter {
        written: Vec<u8>,
        cancel: Option<Arc<AtomicBool>>,
    }

    impl Write for InterruptingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match &self.cancel {
                Some(cancel) => cancel.store(true, Ordering::Relaxed),
                None if !self.written.is_empty() => return Err(io::Error::new(io::ErrorKind::Other, "device full")),
                None => {}
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_merge_failure_cleans_up(tmp_dir: tempfile::TempDir, #[case] cancelled: bool) {
        let cancel = Arc::new(AtomicBool::new(false));
        let sorter = LineSorterBuilder::new()
            .with_buffer(LineLimitedBufferBuilder::new(2))
            .with_tmp_dir(tmp_dir.path())
            .with_rw_buf_size(1)
            .with_merge_fan_in(2)
            .with_cancel_flag(cancel.clone())
            .build()
            .unwrap();
        let mut output = InterruptingWriter {
            written: Vec::new(),
            cancel: cancelled.then(|| cancel.clone()),
        };

        let result = sorter.sort(&b"d\nb\na\nc\nf\ne\n"[..], &mut output);

        match result {
            Err(SortError::Cancelled) if cancelled => {}
            Err(err @ SortError::Output(_)) if !cancelled => assert!(err.is_storage()),
            result => panic!("unexpected result: {:?}", result),
        }
        let complete = b"a\nb\nc\nd\ne\nf\n";
        assert!(!output.written.is_empty());
        assert!(output.written.len() < complete.len());
        assert!(complete.starts_with(&output.written));
        assert!(is_empty_dir(&tmp_dir));
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(64)]
    #[case(crate::DEFAULT_MERGE_FAN_IN)]
    fn test_merge_fan_in(tmp_dir: tempfile::TempDir, #[case] merge_fan_in: usize) {
        let content: Vec<u8> = (0..600u32)
            .rev()
            .flat_map(|n| format!("{:04}\n", n).into_bytes())
            .collect();
        let sorter = LineSorterBuilder::new()
            .with_buffer(LineLimitedBufferBuilder::new(1))
            .with_tmp_dir(tmp_dir.path())
            .with_merge_fan_in(merge_fan_in)
            .build()
            .unwrap();

        let mut output = Vec::new();
        let summary = sorter.sort(&content[..], &mut output).unwrap();

        assert_eq!(summary, SortSummary { lines: 600, runs: 600 });
        assert_eq!(output, non_empty_sorted(&content));
        assert!(is_empty_dir(&tmp_dir));
    }

    #[rstest]
    fn test_merge_fan_in_lower_bound(tmp_dir: tempfile::TempDir) {
        let sorter = LineSorterBuilder::new()
            .with_buffer(LineLimitedBufferBuilder::new(1))
            .with_tmp_dir(tmp_dir.path())
            .with_merge_fan_in(0)
            .build()
            .unwrap();
        assert_eq!(sorter.merge_fan_in, 2);

        let mut output = Vec::new();
        sorter.sort(&b"c\nb\na\n"[..], &mut output).unwrap();
        assert_eq!(output, b"a\nb\nc\n");
    }

    fn check_stream_sort<F: RunFormat>(tmp_dir: &tempfile::TempDir) {
        let mut input: Vec<Vec<u8>> = (0..200u32).map(|n| format!("{:03}", n).into_bytes()).collect();
        input.push(vec![0xff, 0x00]);
        input.push(vec![0xc3, 0xa9, b'\r']);
        let mut shuffled = input.clone();
        shuffled.shuffle(&mut rand::thread_rng());
        let content: Vec<u8> = shuffled.join(&b'\n');

        let sorter = LineSorterBuilder::new()
            .with_buffer(LineLimitedBufferBuilder::new(16))
            .with_format::<F>()
            .with_tmp_dir(tmp_dir.path())
            .with_rw_buf_size(64)
            .build()
            .unwrap();
        let mut output = Vec::new();
        let summary = sorter.sort(&content[..], &mut output).unwrap();

        input.sort();
        let expected: Vec<u8> = input.iter().flat_map(|line| line.iter().copied().chain(Some(b'\n'))).collect();
        assert_eq!(summary, SortSummary { lines: 202, runs: 13 });
        assert_eq!(output, expected);
        assert!(is_empty_dir(tmp_dir));
    }

    #[rstest]
    fn test_stream_sort_plain(tmp_dir: tempfile::TempDir) {
        check_stream_sort::<crate::run::PlainRunFormat>(&tmp_dir);
    }

    #[rstest]
    fn test_stream_sort_rmp(tmp_dir: tempfile::TempDir) {
        check_stream_sort::<RmpRunFormat>(&tmp_dir);
    }

    #[rstest]
    fn test_empty_input(tmp_dir: tempfile::TempDir) {
        let mut output = Vec::new();
        let summary = sorter(&tmp_dir, budget_for(2, 1)).sort(&b"\n\n\n"[..], &mut output).unwrap();

        assert_eq!(summary, SortSummary { lines: 0, runs: 0 });
        assert!(output.is_empty());
        assert!(is_empty_dir(&tmp_dir));
    }
}

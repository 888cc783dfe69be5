//! Invocation of the external benefit calculator
//!
//! The calculator only knows fixed file names: it reads `<stem>.pia` from its
//! working directory, takes the stem on stdin and writes `output` next to it.
//! Every call therefore runs in its own temporary directory, which is removed
//! when the call returns, successfully or not.

use crate::error::CalculatorInvocationError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Default input file stem passed to the calculator
pub const DEFAULT_INPUT_STEM: &str = "CPS";

/// File the calculator writes its results to
pub const DEFAULT_OUTPUT_FILE: &str = "output";

/// Default bound on a single calculator run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Zero-based column of the benefit amount in an output line
const BENEFIT_COLUMN: usize = 2;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Maps one encoded record to a benefit amount
pub trait BenefitCalculator: Sync {
    fn benefit(&self, record: &str) -> Result<f64, CalculatorInvocationError>;
}

impl<F> BenefitCalculator for F
where
    F: Fn(&str) -> Result<f64, CalculatorInvocationError> + Sync,
{
    fn benefit(&self, record: &str) -> Result<f64, CalculatorInvocationError> {
        self(record)
    }
}

/// Settings for the external calculator process
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Calculator program
    pub executable: PathBuf,

    /// Extra arguments placed before any input
    pub args: Vec<String>,

    /// Input file stem; the record is written to `<stem>.pia`
    pub input_stem: String,

    /// Name of the result file written by the calculator
    pub output_file: String,

    /// Kill the calculator if it runs longer than this
    pub timeout: Duration,

    /// Directory under which per-call workspaces are created (system temp if None)
    pub workspace_root: Option<PathBuf>,
}

impl CalculatorConfig {
    pub fn new<P: AsRef<Path>>(executable: P) -> Self {
        let executable = executable.as_ref();
        Self {
            executable: fs::canonicalize(executable).unwrap_or_else(|_| executable.to_path_buf()),
            args: Vec::new(),
            input_stem: DEFAULT_INPUT_STEM.to_string(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            workspace_root: None,
        }
    }
}

/// Runs the calculator as a child process, one isolated workspace per call
#[derive(Debug, Clone)]
pub struct ExternalCalculator {
    config: CalculatorConfig,
}

impl ExternalCalculator {
    pub fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    fn workspace(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ss_mtr_calc_");
        match &self.config.workspace_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }

    fn spawn(&self, dir: &Path) -> Result<Child, CalculatorInvocationError> {
        Command::new(&self.config.executable)
            .args(&self.config.args)
            .current_dir(dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CalculatorInvocationError::Spawn {
                executable: self.config.executable.clone(),
                source,
            })
    }

    fn send_stem(&self, child: &mut Child) -> Result<(), CalculatorInvocationError> {
        // Dropping stdin closes the pipe so the calculator sees EOF
        if let Some(mut stdin) = child.stdin.take() {
            let line = format!("{}\n", self.config.input_stem);
            match stdin.write_all(line.as_bytes()) {
                Ok(()) => {}
                // Calculator exited without reading; its exit status decides
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(CalculatorInvocationError::Stdin(e)),
            }
        }
        Ok(())
    }
}

impl BenefitCalculator for ExternalCalculator {
    fn benefit(&self, record: &str) -> Result<f64, CalculatorInvocationError> {
        let workspace = self.workspace().map_err(CalculatorInvocationError::Workspace)?;
        let dir = workspace.path();

        let input = dir.join(format!("{}.pia", self.config.input_stem));
        fs::write(&input, format!("{}\n", record)).map_err(CalculatorInvocationError::Workspace)?;

        let mut child = self.spawn(dir)?;
        if let Err(e) = self.send_stem(&mut child) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        let status = wait_with_timeout(&mut child, self.config.timeout)?;
        if !status.success() {
            return Err(CalculatorInvocationError::NonZeroExit {
                status: status.code(),
            });
        }

        let output = dir.join(&self.config.output_file);
        let contents = match fs::read_to_string(&output) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CalculatorInvocationError::MissingOutput { path: output })
            }
            Err(e) => return Err(CalculatorInvocationError::Workspace(e)),
        };

        parse_benefit(&contents)
    }
}

/// Wait for the child, killing it once `timeout` has elapsed
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus, CalculatorInvocationError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CalculatorInvocationError::Timeout {
                    millis: timeout.as_millis(),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CalculatorInvocationError::Wait(e));
            }
        }
    }
}

/// Benefit amount from calculator output: third token of the first non-blank line
pub fn parse_benefit(output: &str) -> Result<f64, CalculatorInvocationError> {
    let mut lines = output.lines().filter(|line| !line.trim().is_empty());
    let line = lines.next().ok_or(CalculatorInvocationError::EmptyOutput)?;

    let token = line
        .split_whitespace()
        .nth(BENEFIT_COLUMN)
        .ok_or_else(|| CalculatorInvocationError::MalformedOutput {
            line: line.to_string(),
        })?;

    let benefit: f64 = token
        .parse()
        .ok()
        .filter(|benefit: &f64| benefit.is_finite())
        .ok_or_else(|| CalculatorInvocationError::UnparseableBenefit {
            token: token.to_string(),
        })?;

    let extra = lines.count();
    if extra > 0 {
        log::debug!("Ignoring {} additional calculator output line(s)", extra);
    }

    Ok(benefit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_benefit() {
        assert_eq!(parse_benefit("  001 2014   1234.50 x\n").unwrap(), 1234.5);
        assert_eq!(parse_benefit("\n\na b 17\nc d 99\n").unwrap(), 17.0);
    }

    #[test]
    fn test_parse_benefit_errors() {
        assert!(matches!(parse_benefit(""), Err(CalculatorInvocationError::EmptyOutput)));
        assert!(matches!(parse_benefit("  \n \n"), Err(CalculatorInvocationError::EmptyOutput)));
        assert!(matches!(
            parse_benefit("a b\n"),
            Err(CalculatorInvocationError::MalformedOutput { .. })
        ));
        match parse_benefit("a b n/a\n") {
            Err(CalculatorInvocationError::UnparseableBenefit { token }) => assert_eq!(token, "n/a"),
            other => panic!("expected UnparseableBenefit, got {:?}", other),
        }
        for token in ["NaN", "inf", "-inf", "infinity"] {
            assert!(matches!(
                parse_benefit(&format!("001 2014 {}\n", token)),
                Err(CalculatorInvocationError::UnparseableBenefit { .. })
            ));
        }
    }

    #[test]
    fn test_closure_calculator() {
        let calc = |record: &str| -> Result<f64, CalculatorInvocationError> { Ok(record.len() as f64) };
        assert_eq!(calc.benefit("abc").unwrap(), 3.0);
    }

    #[cfg(unix)]
    mod process {
        use crate::calculator::invoker::{BenefitCalculator, CalculatorConfig, ExternalCalculator};
        use crate::error::CalculatorInvocationError;
        use std::fs;
        use std::path::Path;
        use std::time::{Duration, Instant};

        /// Run a shell script as the calculator, workspaces under a private root
        fn script_calculator(script: &str, root: &Path, timeout: Duration) -> ExternalCalculator {
            let script_path = root.join("calculator.sh");
            fs::write(&script_path, script).unwrap();

            let workspaces = root.join("workspaces");
            fs::create_dir(&workspaces).unwrap();

            let mut config = CalculatorConfig::new("/bin/sh");
            config.args = vec![script_path.to_string_lossy().into_owned()];
            config.timeout = timeout;
            config.workspace_root = Some(workspaces);
            ExternalCalculator::new(config)
        }

        fn workspace_count(root: &Path) -> usize {
            fs::read_dir(root.join("workspaces")).unwrap().count()
        }

        #[test]
        fn test_reads_record_and_output() {
            let root = tempfile::tempdir().unwrap();
            // Echo back the number of record lines as the benefit
            let calc = script_calculator(
                "read stem\nn=$(wc -l < \"$stem.pia\")\necho \"001 2014 $n.25\" > output\n",
                root.path(),
                Duration::from_secs(10),
            );

            let benefit = calc.benefit("01\n03\n06\n16\n22\n402017551").unwrap();
            assert_eq!(benefit, 6.25);
            assert_eq!(workspace_count(root.path()), 0);
        }

        #[test]
        fn test_non_zero_exit() {
            let root = tempfile::tempdir().unwrap();
            let calc = script_calculator("exit 3\n", root.path(), Duration::from_secs(10));

            assert!(matches!(
                calc.benefit("x"),
                Err(CalculatorInvocationError::NonZeroExit { status: Some(3) })
            ));
            assert_eq!(workspace_count(root.path()), 0);
        }

        #[test]
        fn test_missing_output() {
            let root = tempfile::tempdir().unwrap();
            let calc = script_calculator("read stem\nexit 0\n", root.path(), Duration::from_secs(10));

            assert!(matches!(
                calc.benefit("x"),
                Err(CalculatorInvocationError::MissingOutput { .. })
            ));
        }

        #[test]
        fn test_timeout_kills_calculator() {
            let root = tempfile::tempdir().unwrap();
            let calc = script_calculator("sleep 5\n", root.path(), Duration::from_millis(100));

            let start = Instant::now();
            assert!(matches!(
                calc.benefit("x"),
                Err(CalculatorInvocationError::Timeout { millis: 100 })
            ));
            assert!(start.elapsed() < Duration::from_secs(4));
            assert_eq!(workspace_count(root.path()), 0);
        }

        #[test]
        fn test_spawn_failure() {
            let mut config = CalculatorConfig::new("/nonexistent/anypiab");
            config.timeout = Duration::from_secs(1);
            let calc = ExternalCalculator::new(config);

            assert!(matches!(
                calc.benefit("x"),
                Err(CalculatorInvocationError::Spawn { .. })
            ));
        }
    }
}

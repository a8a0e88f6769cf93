use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use fixture_cache::errors::Result;
use fixture_cache::exec::{Invocation, ProcessExecutor, ProcessOutput};
use fixture_cache::fs::FileSystem;
use fixture_cache::pipeline::{CONTRACT_STAGE, EXTRACT_STAGE};

/// What a fake program does when invoked.
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    /// Find the argument ending in `.<input_ext>`, strip that extension and
    /// write `<base>.<suffix>` for every suffix in `outputs`.
    Produce {
        input_ext: String,
        outputs: Vec<String>,
    },
    /// Exit with `code`, writing nothing.
    Fail { code: i32, stderr: String },
}

impl FakeBehaviour {
    pub fn produce(input_ext: &str, outputs: &[&str]) -> Self {
        FakeBehaviour::Produce {
            input_ext: input_ext.to_string(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// A well-behaved extractor: every required and optional output.
    pub fn extractor(input_ext: &str) -> Self {
        let outputs: Vec<&str> = EXTRACT_STAGE
            .required
            .iter()
            .chain(EXTRACT_STAGE.optional.iter())
            .copied()
            .collect();
        Self::produce(input_ext, &outputs)
    }

    /// A well-behaved contractor: every required output.
    pub fn contractor() -> Self {
        Self::produce("core", CONTRACT_STAGE.required)
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        FakeBehaviour::Fail {
            code,
            stderr: stderr.to_string(),
        }
    }
}

/// A fake executor that:
/// - records every invocation (so tests can count spawns per program)
/// - "runs" programs by writing their output files into a shared filesystem.
#[derive(Clone)]
pub struct FakeProcessExecutor {
    fs: Arc<dyn FileSystem>,
    behaviours: Arc<Mutex<HashMap<PathBuf, FakeBehaviour>>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeProcessExecutor {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            behaviours: Arc::new(Mutex::new(HashMap::new())),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with(self, program: impl Into<PathBuf>, behaviour: FakeBehaviour) -> Self {
        self.set(program, behaviour);
        self
    }

    /// Replace the behaviour of `program`; shared by all clones.
    pub fn set(&self, program: impl Into<PathBuf>, behaviour: FakeBehaviour) {
        self.behaviours
            .lock()
            .unwrap()
            .insert(program.into(), behaviour);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// How many times `program` was spawned.
    pub fn spawns(&self, program: &Path) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|inv| inv.program == program)
            .count()
    }

    fn execute(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());

        let behaviour = self
            .behaviours
            .lock()
            .unwrap()
            .get(&invocation.program)
            .cloned();

        match behaviour {
            Some(FakeBehaviour::Produce { input_ext, outputs }) => {
                let dotted = format!(".{input_ext}");
                let Some(input) = invocation.args.iter().find(|a| a.ends_with(&dotted)) else {
                    return Ok(ProcessOutput {
                        exit_code: 2,
                        stdout: String::new(),
                        stderr: format!("no {dotted} input argument"),
                    });
                };
                let base = &input[..input.len() - dotted.len()];
                for suffix in outputs {
                    let path = PathBuf::from(format!("{base}.{suffix}"));
                    self.fs
                        .write(&path, format!("{:?} {}", invocation.program, suffix).as_bytes())?;
                }
                Ok(ProcessOutput {
                    exit_code: 0,
                    stdout: format!("processed {input}\n"),
                    stderr: String::new(),
                })
            }
            Some(FakeBehaviour::Fail { code, stderr }) => Ok(ProcessOutput {
                exit_code: code,
                stdout: String::new(),
                stderr,
            }),
            None => Ok(ProcessOutput {
                exit_code: 127,
                stdout: String::new(),
                stderr: format!("{:?}: command not found", invocation.program),
            }),
        }
    }
}

impl ProcessExecutor for FakeProcessExecutor {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutput>> + Send + 'a>> {
        Box::pin(async move { self.execute(invocation) })
    }
}

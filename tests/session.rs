use std::error::Error;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fixture_cache::context::{Loader, Scenario};
use fixture_cache::errors::{CacheError, Result as CacheResult};
use fixture_cache::fs::mock::MockFileSystem;
use fixture_cache::fs::FileSystem;
use fixture_cache::guard::ensure_no_server;
use fixture_cache::pipeline::StageOutcome;
use fixture_cache::session::Session;
use fixture_cache_test_utils::builders::{populate_mock_tree, ConfigFileBuilder};
use fixture_cache_test_utils::fake_executor::{FakeBehaviour, FakeProcessExecutor};
use fixture_cache_test_utils::{init_tracing, with_timeout};
use tokio::net::TcpListener;

type TestResult = Result<(), Box<dyn Error>>;

const ROOT: &str = "/fixture";
const EXTRACT_BIN: &str = "/fixture/bin/extract";
const CONTRACT_BIN: &str = "/fixture/bin/contract";
const FEATURE: &str = "/fixture/features/car/access.feature";
const MAP: &str = "<osm><node id=\"1\"/></osm>";

#[derive(Default)]
struct RecordingLoader {
    loaded: Mutex<Vec<String>>,
}

impl RecordingLoader {
    fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }
}

impl Loader for RecordingLoader {
    fn load<'a>(
        &'a self,
        contracted_base: &'a str,
    ) -> Pin<Box<dyn Future<Output = CacheResult<()>> + Send + 'a>> {
        Box::pin(async move {
            self.loaded.lock().unwrap().push(contracted_base.to_string());
            Ok(())
        })
    }
}

struct World {
    fs: MockFileSystem,
    shared: Arc<dyn FileSystem>,
    exec: FakeProcessExecutor,
    loader: Arc<RecordingLoader>,
}

impl World {
    fn new() -> Self {
        init_tracing();
        let fs = MockFileSystem::new();
        populate_mock_tree(&fs, ROOT);
        let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
        let exec = FakeProcessExecutor::new(Arc::clone(&shared))
            .with(EXTRACT_BIN, FakeBehaviour::extractor("osm"))
            .with(CONTRACT_BIN, FakeBehaviour::contractor());
        Self {
            fs,
            shared,
            exec,
            loader: Arc::new(RecordingLoader::default()),
        }
    }

    async fn session(&self) -> CacheResult<Session> {
        Session::start(ConfigFileBuilder::new(ROOT).build(), Arc::clone(&self.shared)).await
    }

    fn spawns(&self, program: &str) -> usize {
        self.exec.spawns(Path::new(program))
    }
}

#[tokio::test]
async fn reprocess_and_load_is_idempotent() -> TestResult {
    let world = World::new();
    let session = world.session().await?;
    let ctx = session.context(world.exec.clone(), world.loader.clone());

    let first = ctx.reprocess_and_load(MAP).await?;
    let second = ctx.reprocess_and_load(MAP).await?;

    assert_eq!(first.extract, StageOutcome::Ran);
    assert_eq!(second.extract, StageOutcome::Skipped);
    assert_eq!(world.spawns(EXTRACT_BIN), 1);
    assert_eq!(world.spawns(CONTRACT_BIN), 1);

    let target = first.load_target();
    assert_eq!(world.loader.loaded(), vec![target.clone(), target]);
    Ok(())
}

#[tokio::test]
async fn profile_switch_reextracts() -> TestResult {
    let world = World::new();
    let mut session = world.session().await?;
    session
        .context(world.exec.clone(), world.loader.clone())
        .reprocess_and_load(MAP)
        .await?;

    session.set_profile("bicycle")?;
    let ctx = session.context(world.exec.clone(), world.loader.clone());
    ctx.reprocess_and_load(MAP).await?;

    assert_eq!(world.spawns(EXTRACT_BIN), 2);
    assert_eq!(world.spawns(CONTRACT_BIN), 2);

    let last_extract = world
        .exec
        .invocations()
        .into_iter()
        .filter(|inv| inv.program == Path::new(EXTRACT_BIN))
        .last()
        .expect("extract ran");
    assert_eq!(
        last_extract.args.last().map(String::as_str),
        Some("/fixture/profiles/bicycle.lua")
    );
    Ok(())
}

#[tokio::test]
async fn contract_args_change_skips_extraction() -> TestResult {
    let world = World::new();
    let mut session = world.session().await?;
    let before = session.fingerprints().clone();
    let first = session
        .context(world.exec.clone(), world.loader.clone())
        .reprocess_and_load(MAP)
        .await?;

    session.set_contract_args(vec!["--core".to_string(), "0.5".to_string()]);
    assert_eq!(session.fingerprints().extract, before.extract);
    assert_ne!(session.fingerprints().contract, before.contract);

    let second = session
        .context(world.exec.clone(), world.loader.clone())
        .reprocess_and_load(MAP)
        .await?;

    assert_eq!(second.extract, StageOutcome::Skipped);
    assert_eq!(second.contract, StageOutcome::Ran);
    assert_ne!(first.contracted_path, second.contracted_path);
    assert_eq!(world.spawns(EXTRACT_BIN), 1);
    assert_eq!(world.spawns(CONTRACT_BIN), 2);
    Ok(())
}

#[tokio::test]
async fn prepare_creates_scenario_artifacts() -> TestResult {
    let world = World::new();
    let session = world.session().await?;
    let ctx = session.context(world.exec.clone(), world.loader.clone());
    let spec_content = world.fs.read_to_string(Path::new(FEATURE))?;

    let scenario = Scenario {
        spec_path: Path::new(FEATURE),
        spec_content: &spec_content,
        title: "Basic access",
        line: 2,
        map_data: MAP,
    };
    let prepared = ctx.prepare(&scenario).await?;

    assert!(world.fs.is_dir(&prepared.entry.feature_cache_directory));
    assert!(prepared
        .entry
        .feature_cache_directory
        .starts_with("/fixture/cache/car/access.feature"));
    assert_eq!(world.fs.read_to_string(&prepared.files.osm_file())?, MAP);
    assert_eq!(prepared.descriptor, ctx.descriptor(MAP));
    assert!(ctx.runner().is_contracted(&prepared.report.contracted_path));
    assert_eq!(world.loader.loaded(), vec![prepared.report.load_target()]);

    let again = ctx.prepare(&scenario).await?;
    assert_eq!(again.entry, prepared.entry);
    assert_eq!(again.report.contract, StageOutcome::Skipped);
    assert_eq!(world.spawns(EXTRACT_BIN), 1);
    Ok(())
}

#[tokio::test]
async fn stage_failure_is_scenario_local() -> TestResult {
    let world = World::new();
    world
        .exec
        .set(EXTRACT_BIN, FakeBehaviour::fail(1, "bad tag on way 7"));
    let session = world.session().await?;
    let ctx = session.context(world.exec.clone(), world.loader.clone());

    let err = ctx.reprocess_and_load(MAP).await.unwrap_err();
    assert!(matches!(err, CacheError::ExtractError { code: 1, .. }));
    assert!(!err.is_fatal());
    assert!(world.loader.loaded().is_empty());

    // The same session keeps serving other scenarios.
    world.exec.set(EXTRACT_BIN, FakeBehaviour::extractor("osm"));
    ctx.reprocess_and_load(MAP).await?;
    assert_eq!(world.loader.loaded().len(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_binary_aborts_start() {
    let world = World::new();
    world
        .fs
        .remove_file(Path::new("/fixture/bin/libengine.so"))
        .expect("remove library");

    let err = world.session().await.unwrap_err();
    match err {
        CacheError::HashError { ref path, .. } => {
            assert_eq!(path, Path::new("/fixture/bin/libengine.so"))
        }
        ref other => panic!("expected HashError, got {other:?}"),
    }
    assert!(err.is_fatal());
}

#[tokio::test]
async fn running_server_aborts_start() -> TestResult {
    let world = World::new();
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();

    let config = ConfigFileBuilder::new(ROOT).server_address(&address).build();
    let err = with_timeout(Session::start(config, Arc::clone(&world.shared)))
        .await
        .unwrap_err();

    assert!(matches!(err, CacheError::AlreadyRunning(ref a) if *a == address));
    assert!(err.is_fatal());
    assert!(world.exec.invocations().is_empty());
    Ok(())
}

#[tokio::test]
async fn closed_port_passes_guard() -> TestResult {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();
    drop(listener);

    ensure_no_server(&address, Duration::from_millis(200)).await?;
    Ok(())
}

#[tokio::test]
async fn configured_args_and_force_reach_the_stages() -> TestResult {
    let world = World::new();
    let config = ConfigFileBuilder::new(ROOT)
        .extract_args(&["--threads", "1"])
        .contract_args(&["--core", "0.8"])
        .force(true)
        .build();
    let session = Session::start(config, Arc::clone(&world.shared)).await?;
    let ctx = session.context(world.exec.clone(), world.loader.clone());

    ctx.reprocess_and_load(MAP).await?;
    let again = ctx.reprocess_and_load(MAP).await?;
    assert_eq!(again.write, StageOutcome::Ran);
    assert_eq!(world.spawns(EXTRACT_BIN), 2);
    assert_eq!(world.spawns(CONTRACT_BIN), 2);

    let calls = world.exec.invocations();
    assert_eq!(calls[0].args[1..3], ["--threads", "1"]);
    assert_eq!(calls[1].args[..2], ["--core", "0.8"]);
    Ok(())
}

#[tokio::test]
async fn relative_library_path_reaches_stages_absolute() -> TestResult {
    let world = World::new();
    let config = ConfigFileBuilder::new(ROOT)
        .library_path("build/lib")
        .library_path_var("ENGINE_LIB_PATH")
        .build();
    let session = Session::start(config, Arc::clone(&world.shared)).await?;
    let expected = std::env::current_dir()?.join("build/lib");

    assert_eq!(session.config().pipeline.library_path.as_deref(), Some(expected.as_path()));
    let env = session.pipeline_settings().env;
    assert_eq!(Path::new(&env["ENGINE_LIB_PATH"]), expected);

    let ctx = session.context(world.exec.clone(), world.loader.clone());
    with_timeout(ctx.reprocess_and_load(MAP)).await?;
    for call in world.exec.invocations() {
        assert!(Path::new(&call.env["ENGINE_LIB_PATH"]).is_absolute());
    }
    Ok(())
}

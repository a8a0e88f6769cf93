use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fixture_cache::errors::CacheError;
use fixture_cache::fingerprint::{
    hash_files, hash_string, library_scripts, update_fingerprint, update_with_args,
    FingerprintComputer, FingerprintInputs,
};
use fixture_cache::fs::mock::MockFileSystem;
use fixture_cache::fs::FileSystem;
use fixture_cache_test_utils::builders::populate_mock_tree;
use fixture_cache_test_utils::init_tracing;
use proptest::prelude::*;

type TestResult = Result<(), Box<dyn Error>>;

const ROOT: &str = "/fixture";

fn mock_tree() -> MockFileSystem {
    init_tracing();
    let fs = MockFileSystem::new();
    populate_mock_tree(&fs, ROOT);
    fs
}

fn p(rel: &str) -> PathBuf {
    Path::new(ROOT).join(rel)
}

fn inputs() -> FingerprintInputs {
    FingerprintInputs {
        binaries: vec![p("bin/extract"), p("bin/contract"), p("bin/libengine.so")],
        profile: p("profiles/car.lua"),
        library_scripts: vec![p("profiles/lib/access.lua")],
        extract_args: Vec::new(),
        contract_args: Vec::new(),
    }
}

fn computer(fs: &MockFileSystem) -> FingerprintComputer {
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    FingerprintComputer::new(shared, &inputs()).expect("fingerprints for mock tree")
}

#[test]
fn hash_files_matches_plain_blake3_of_concatenation() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/a.txt", "hello ");
    fs.add_file("/b.txt", "world");

    let single = hash_files(&fs, [Path::new("/a.txt")])?;
    assert_eq!(single.as_str(), blake3::hash(b"hello ").to_hex().as_str());

    let both = hash_files(&fs, [Path::new("/a.txt"), Path::new("/b.txt")])?;
    assert_eq!(both.as_str(), blake3::hash(b"hello world").to_hex().as_str());
    assert_eq!(both.as_str().len(), 64);
    Ok(())
}

#[test]
fn hash_files_is_order_sensitive() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/a.txt", "first");
    fs.add_file("/b.txt", "second");

    let ab = hash_files(&fs, ["/a.txt", "/b.txt"])?;
    let ba = hash_files(&fs, ["/b.txt", "/a.txt"])?;
    assert_ne!(ab, ba);
    Ok(())
}

#[test]
fn missing_input_is_a_fatal_hash_error() {
    let fs = MockFileSystem::new();
    fs.add_file("/a.txt", "first");

    let err = hash_files(&fs, ["/a.txt", "/gone.so"]).unwrap_err();
    match err {
        CacheError::HashError { ref path, .. } => assert_eq!(path, Path::new("/gone.so")),
        ref other => panic!("expected HashError, got {other:?}"),
    }
    assert!(err.is_fatal());
}

#[test]
fn update_folds_delta_with_separator() {
    let base = hash_string("base");
    assert_eq!(
        update_fingerprint(&base, "--threads 2"),
        hash_string(&format!("{base}---threads 2"))
    );
    assert_ne!(update_fingerprint(&base, ""), base);
}

#[test]
fn computer_is_deterministic() {
    let fs = mock_tree();
    assert_eq!(computer(&fs).snapshot(), computer(&fs).snapshot());
}

#[test]
fn chain_links_are_layered() {
    let fs = mock_tree();
    let c = computer(&fs);
    let fp = c.fingerprints();

    assert_eq!(fp.extract, update_with_args(&fp.profile, &[]));
    assert_eq!(fp.contract, update_with_args(&fp.extract, &[]));
    assert_ne!(fp.binary, fp.profile);
}

#[test]
fn contract_args_only_change_contract() {
    let fs = mock_tree();
    let mut c = computer(&fs);
    let before = c.snapshot();

    c.set_contract_args(vec!["--core".into(), "0.8".into()]);
    let after = c.snapshot();

    assert_eq!(after.binary, before.binary);
    assert_eq!(after.profile, before.profile);
    assert_eq!(after.extract, before.extract);
    assert_ne!(after.contract, before.contract);
    assert_eq!(
        after.contract,
        update_with_args(&after.extract, &["--core".into(), "0.8".into()])
    );
}

#[test]
fn extract_args_change_extract_and_contract() {
    let fs = mock_tree();
    let mut c = computer(&fs);
    let before = c.snapshot();

    c.set_extract_args(vec!["--small-component-size".into(), "1000".into()]);
    let after = c.snapshot();

    assert_eq!(after.profile, before.profile);
    assert_ne!(after.extract, before.extract);
    assert_ne!(after.contract, before.contract);
}

#[test]
fn profile_switch_keeps_binary_and_is_reversible() -> TestResult {
    let fs = mock_tree();
    let mut c = computer(&fs);
    let car = c.snapshot();
    let scripts = vec![p("profiles/lib/access.lua")];

    c.set_profile(&p("profiles/bicycle.lua"), &scripts)?;
    let bicycle = c.snapshot();
    assert_eq!(bicycle.binary, car.binary);
    assert_ne!(bicycle.profile, car.profile);
    assert_ne!(bicycle.extract, car.extract);
    assert_ne!(bicycle.contract, car.contract);

    c.set_profile(&p("profiles/car.lua"), &scripts)?;
    assert_eq!(c.snapshot(), car);
    Ok(())
}

#[test]
fn editing_a_library_script_changes_profile_fingerprint() {
    let fs = mock_tree();
    let before = computer(&fs).snapshot();

    fs.add_file(p("profiles/lib/access.lua"), "-- access helpers, now with barriers");
    let after = computer(&fs).snapshot();

    assert_eq!(after.binary, before.binary);
    assert_ne!(after.profile, before.profile);
}

#[test]
fn replacing_a_binary_changes_every_link() {
    let fs = mock_tree();
    let before = computer(&fs).snapshot();

    fs.add_file(p("bin/contract"), "contract v2");
    let after = computer(&fs).snapshot();

    assert_ne!(after.binary, before.binary);
    assert_ne!(after.profile, before.profile);
    assert_ne!(after.contract, before.contract);
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn arg_lists_joining_to_the_same_text_stay_distinct() {
    let fs = mock_tree();
    let shared: Arc<dyn FileSystem> = Arc::new(fs);

    let mut split_late = inputs();
    split_late.extract_args = args(&["--a", "b c"]);
    let mut split_early = inputs();
    split_early.extract_args = args(&["--a b", "c"]);

    let late = FingerprintComputer::new(Arc::clone(&shared), &split_late).unwrap();
    let early = FingerprintComputer::new(shared, &split_early).unwrap();
    assert_ne!(late.fingerprints().extract, early.fingerprints().extract);
    assert_ne!(late.fingerprints().contract, early.fingerprints().contract);
}

#[test]
fn empty_args_differ_from_one_empty_arg() {
    let base = hash_string("profile");
    assert_ne!(update_with_args(&base, &[]), update_with_args(&base, &args(&[""])));
    assert_ne!(
        update_with_args(&base, &args(&["x"])),
        update_with_args(&base, &args(&["x", ""]))
    );
}

#[test]
fn missing_profile_fails_construction() {
    let fs = mock_tree();
    let shared: Arc<dyn FileSystem> = Arc::new(fs);
    let mut bad = inputs();
    bad.profile = p("profiles/nope.lua");

    let err = FingerprintComputer::new(shared, &bad).unwrap_err();
    assert!(matches!(err, CacheError::HashError { .. }));
}

#[test]
fn library_scripts_are_sorted_and_filtered() -> TestResult {
    let fs = mock_tree();
    fs.add_file(p("profiles/aaa.lua"), "-- sorts first");

    let scripts = library_scripts(&fs, &p("profiles"), "*.lua")?;
    assert_eq!(
        scripts,
        vec![
            p("profiles/aaa.lua"),
            p("profiles/bicycle.lua"),
            p("profiles/car.lua"),
            p("profiles/lib/access.lua"),
        ]
    );
    Ok(())
}

#[test]
fn library_scripts_without_lib_dir() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/profiles/car.lua", "-- car");

    let scripts = library_scripts(&fs, Path::new("/profiles"), "*.lua")?;
    assert_eq!(scripts, vec![PathBuf::from("/profiles/car.lua")]);

    let err = library_scripts(&fs, Path::new("/elsewhere"), "*.lua").unwrap_err();
    assert!(matches!(err, CacheError::HashError { .. }));
    Ok(())
}

proptest! {
    #[test]
    fn hash_string_is_stable_hex(s in ".*") {
        let a = hash_string(&s);
        prop_assert_eq!(&a, &hash_string(&s));
        prop_assert_eq!(a.as_str().len(), 64);
        prop_assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn different_deltas_give_different_links(a in "[a-z0-9 -]{0,24}", b in "[a-z0-9 -]{0,24}") {
        prop_assume!(a != b);
        let base = hash_string("binary");
        prop_assert_ne!(update_fingerprint(&base, &a), update_fingerprint(&base, &b));
    }

    #[test]
    fn distinct_arg_lists_give_distinct_links(
        a in proptest::collection::vec("[a-z -]{0,6}", 0..4),
        b in proptest::collection::vec("[a-z -]{0,6}", 0..4),
    ) {
        prop_assume!(a != b);
        let base = hash_string("profile");
        prop_assert_ne!(update_with_args(&base, &a), update_with_args(&base, &b));
    }
}

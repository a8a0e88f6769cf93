use std::path::{Path, PathBuf};

use fixture_cache::descriptor::{with_suffix, OsmDataDescriptor};
use fixture_cache::fingerprint::{hash_string, Fingerprint};
use proptest::prelude::*;

fn fp(s: &str) -> Fingerprint {
    hash_string(s)
}

fn derive(content: &str, extract: &str, contract: &str) -> OsmDataDescriptor {
    OsmDataDescriptor::derive(Path::new("/cache"), content, &fp(extract), &fp(contract), "osm")
}

#[test]
fn paths_nest_by_fingerprint() {
    let d = derive("<osm/>", "f1", "c1");
    let raw = hash_string(hash_string("<osm/>").as_str());

    assert_eq!(d.content_hash(), &hash_string("<osm/>"));
    assert_eq!(d.raw_path(), Path::new(&format!("/cache/{raw}")));
    assert_eq!(
        d.extracted_path(),
        Path::new(&format!("/cache/{raw}_{}", fp("f1")))
    );
    assert_eq!(
        d.contracted_path(),
        Path::new(&format!("/cache/{raw}_{}_{}", fp("f1"), fp("c1")))
    );
    assert_eq!(d.input_file(), PathBuf::from(format!("/cache/{raw}.osm")));
    assert_eq!(d.content(), "<osm/>");
}

#[test]
fn content_never_appears_in_paths() {
    let d = derive("needle-in-the-map", "f1", "c1");
    for path in [d.raw_path(), d.extracted_path(), d.contracted_path()] {
        assert!(!path.to_string_lossy().contains("needle"));
    }
}

#[test]
fn contract_change_keeps_upstream_paths() {
    let a = derive("<osm/>", "f1", "c1");
    let b = derive("<osm/>", "f1", "c2");

    assert_eq!(a.raw_path(), b.raw_path());
    assert_eq!(a.extracted_path(), b.extracted_path());
    assert_ne!(a.contracted_path(), b.contracted_path());
}

#[test]
fn extract_change_moves_both_downstream_paths() {
    let a = derive("<osm/>", "f1", "c1");
    let b = derive("<osm/>", "f2", "c1");

    assert_eq!(a.raw_path(), b.raw_path());
    assert_ne!(a.extracted_path(), b.extracted_path());
    assert_ne!(a.contracted_path(), b.contracted_path());
}

#[test]
fn input_extension_is_configurable() {
    let d = OsmDataDescriptor::derive(Path::new("/data"), "x", &fp("f"), &fp("c"), "osm.pbf");
    assert!(d.input_file().to_string_lossy().ends_with(".osm.pbf"));
}

#[test]
fn with_suffix_does_not_replace_dotted_names() {
    assert_eq!(
        with_suffix(Path::new("/data/base.v2"), "core"),
        PathBuf::from("/data/base.v2.core")
    );
}

proptest! {
    #[test]
    fn derivation_is_pure(content in ".{0,200}") {
        prop_assert_eq!(derive(&content, "f1", "c1"), derive(&content, "f1", "c1"));
    }

    #[test]
    fn distinct_content_gets_distinct_raw_paths(a in ".{0,64}", b in ".{0,64}") {
        prop_assume!(a != b);
        prop_assert_ne!(
            derive(&a, "f1", "c1").raw_path().to_path_buf(),
            derive(&b, "f1", "c1").raw_path().to_path_buf()
        );
    }
}

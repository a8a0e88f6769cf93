use std::path::{Path, PathBuf};

use fixture_cache::config::{
    BinariesSection, ConfigFile, PathsSection, PipelineSection, RawConfigFile, ServerSection,
};
use fixture_cache::fs::mock::MockFileSystem;

/// Builder for `ConfigFile` to simplify test setup.
///
/// All paths default to a layout under `root`:
///
/// ```text
/// <root>/bin/extract, <root>/bin/contract, <root>/bin/server, <root>/bin/libengine.so
/// <root>/profiles/{car,bicycle}.lua, <root>/profiles/lib/*.lua
/// <root>/data/        (flat artifact directory)
/// <root>/cache/       (scenario caches)
/// <root>/features/    (specification documents)
/// ```
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            config: RawConfigFile {
                paths: PathsSection {
                    data_dir: root.join("data"),
                    cache_dir: root.join("cache"),
                    features_dir: root.join("features"),
                    profiles_dir: root.join("profiles"),
                },
                binaries: BinariesSection {
                    extract: root.join("bin/extract"),
                    contract: root.join("bin/contract"),
                    server: Some(root.join("bin/server")),
                    libraries: vec![root.join("bin/libengine.so")],
                },
                pipeline: PipelineSection {
                    profile: "car".to_string(),
                    ..PipelineSection::default()
                },
                server: ServerSection::default(),
            },
        }
    }

    pub fn profile(mut self, name: &str) -> Self {
        self.config.pipeline.profile = name.to_string();
        self
    }

    pub fn extract_args(mut self, args: &[&str]) -> Self {
        self.config.pipeline.extract_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn contract_args(mut self, args: &[&str]) -> Self {
        self.config.pipeline.contract_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn force(mut self, val: bool) -> Self {
        self.config.pipeline.force = val;
        self
    }

    pub fn server_address(mut self, addr: &str) -> Self {
        self.config.server.address = Some(addr.to_string());
        self
    }

    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pipeline.library_path = Some(path.into());
        self
    }

    pub fn library_path_var(mut self, var: &str) -> Self {
        self.config.pipeline.library_path_var = Some(var.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Populate `fs` with the files `ConfigFileBuilder::new(root)` points at.
pub fn populate_mock_tree(fs: &MockFileSystem, root: impl AsRef<Path>) {
    let root = root.as_ref();
    fs.add_file(root.join("bin/extract"), "extract v1");
    fs.add_file(root.join("bin/contract"), "contract v1");
    fs.add_file(root.join("bin/server"), "server v1");
    fs.add_file(root.join("bin/libengine.so"), "engine v1");
    fs.add_file(root.join("profiles/car.lua"), "-- car profile");
    fs.add_file(root.join("profiles/bicycle.lua"), "-- bicycle profile");
    fs.add_file(root.join("profiles/lib/access.lua"), "-- access helpers");
    fs.add_file(root.join("profiles/lib/README.md"), "not a script");
    fs.add_dir(root.join("data"));
    fs.add_dir(root.join("cache"));
    fs.add_file(
        root.join("features/car/access.feature"),
        "Feature: Car - access\n  Scenario: Basic access\n",
    );
}

//! Suite Registry
//!
//! Builds the suite tree by running the declaration pass of each definition
//! file. A definition file is a named `fn(&mut Declarations)` registered with
//! [`inventory`]; because the pass is deterministic, every process that loads
//! the same file sees the same ids, which is what lets a worker process find
//! the benchmark the supervisor asked for.

use crate::options::OptionOverrides;
use fxhash::{FxHashMap, FxHashSet};
use isobench_ipc::{BenchResult, BenchmarkOptions};
use std::fmt;
use std::hint::black_box;
use std::rc::Rc;
use thiserror::Error;

/// Separator between the path segments of an id
pub const ID_SEPARATOR: char = ':';

/// Setup or teardown hook
pub type Hook = Rc<dyn Fn()>;

/// Declaration pass of one definition file
pub type DeclareFn = fn(&mut Declarations<'_>);

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No definition file with this name is registered
    #[error("unknown definition file: {0}")]
    UnknownFile(String),
    /// Two suites or benchmarks resolved to the same id
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// A setup or teardown hook was declared at the top level of a file
    #[error("{kind} hook declared outside of a suite in {filename}")]
    HookOutsideSuite {
        /// `setup` or `teardown`
        kind: &'static str,
        /// File being declared
        filename: String,
    },
    /// No benchmark with this id exists
    #[error("unknown benchmark: {0}")]
    UnknownBenchmark(String),
    /// A result was already attached to this benchmark
    #[error("result already attached to {0}")]
    ResultAlreadyAttached(String),
}

/// A registered definition file
#[derive(Clone, Copy)]
pub struct DefinitionFile {
    /// Name the file is loaded by
    pub filename: &'static str,
    /// Declaration pass
    pub declare: DeclareFn,
}

impl DefinitionFile {
    /// Create a definition file entry (usable in `inventory::submit!`)
    pub const fn new(filename: &'static str, declare: DeclareFn) -> Self {
        Self { filename, declare }
    }
}

impl fmt::Debug for DefinitionFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionFile")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// Where definition files are looked up
pub trait DefinitionSource {
    /// Declaration pass for `filename`, if known
    fn declaration(&self, filename: &str) -> Option<DeclareFn>;

    /// Every known file name, sorted
    fn filenames(&self) -> Vec<String>;
}

/// Files registered at link time with `inventory::submit!`
#[derive(Debug, Default, Clone, Copy)]
pub struct InventorySource;

impl DefinitionSource for InventorySource {
    fn declaration(&self, filename: &str) -> Option<DeclareFn> {
        inventory::iter::<DefinitionFile>
            .into_iter()
            .find(|file| file.filename == filename)
            .map(|file| file.declare)
    }

    fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = inventory::iter::<DefinitionFile>
            .into_iter()
            .map(|file| file.filename.to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// An explicit list of files
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    files: Vec<DefinitionFile>,
}

impl StaticSource {
    /// Create a source over `files`
    pub fn new(files: impl IntoIterator<Item = DefinitionFile>) -> Self {
        Self {
            files: files.into_iter().collect(),
        }
    }
}

impl DefinitionSource for StaticSource {
    fn declaration(&self, filename: &str) -> Option<DeclareFn> {
        self.files
            .iter()
            .find(|file| file.filename == filename)
            .map(|file| file.declare)
    }

    fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.iter().map(|f| f.filename.to_string()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// A named group of suites and benchmarks sharing options and hooks
pub struct Suite {
    /// `filename:Ancestor:...:name`
    pub id: String,
    /// Declared name
    pub name: String,
    /// Declaring file
    pub filename: String,
    /// Resolved options
    pub options: BenchmarkOptions,
    /// Children in declaration order
    pub children: Vec<Node>,
    setup: Vec<Hook>,
    teardown: Vec<Hook>,
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("children", &self.children)
            .field("setup", &self.setup.len())
            .field("teardown", &self.teardown.len())
            .finish()
    }
}

/// A measured function
pub struct Benchmark {
    /// `filename:Ancestor:...:name`
    pub id: String,
    /// Declared name
    pub name: String,
    /// Declaring file
    pub filename: String,
    /// Resolved options
    pub options: BenchmarkOptions,
    func: Rc<dyn Fn()>,
    result: Option<BenchResult>,
}

impl Benchmark {
    /// Invoke the measured function once
    #[inline]
    pub fn call(&self) {
        (self.func)()
    }

    /// Result attached after execution
    pub fn result(&self) -> Option<&BenchResult> {
        self.result.as_ref()
    }
}

impl fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Benchmark")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("result", &self.result.is_some())
            .finish_non_exhaustive()
    }
}

/// Tree node
#[derive(Debug)]
pub enum Node {
    /// Nested suite
    Suite(Suite),
    /// Leaf benchmark
    Benchmark(Benchmark),
}

impl Node {
    /// Node id
    pub fn id(&self) -> &str {
        match self {
            Node::Suite(suite) => &suite.id,
            Node::Benchmark(bench) => &bench.id,
        }
    }

    /// Node name
    pub fn name(&self) -> &str {
        match self {
            Node::Suite(suite) => &suite.name,
            Node::Benchmark(bench) => &bench.name,
        }
    }
}

/// Hooks that wrap one benchmark
#[derive(Default, Clone)]
pub struct Hooks {
    /// Setups, outermost suite first
    pub setup: Vec<Hook>,
    /// Teardowns, innermost suite first
    pub teardown: Vec<Hook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("setup", &self.setup.len())
            .field("teardown", &self.teardown.len())
            .finish()
    }
}

struct Frame {
    suite: Suite,
    position: usize,
}

/// Declaration context handed to a definition file's declaration pass.
///
/// Suites nest through the closure passed to [`Declarations::suite`];
/// benchmarks and hooks attach to the innermost open suite. The first error
/// stops the pass: every later declaration is ignored.
pub struct Declarations<'a> {
    filename: &'a str,
    defaults: BenchmarkOptions,
    taken: &'a FxHashSet<String>,
    ids: FxHashSet<String>,
    frames: Vec<Frame>,
    roots: Vec<Node>,
    benchmarks: Vec<(String, Vec<usize>)>,
    error: Option<RegistryError>,
}

impl<'a> Declarations<'a> {
    fn new(filename: &'a str, defaults: BenchmarkOptions, taken: &'a FxHashSet<String>) -> Self {
        Self {
            filename,
            defaults,
            taken,
            ids: FxHashSet::default(),
            frames: Vec::new(),
            roots: Vec::new(),
            benchmarks: Vec::new(),
            error: None,
        }
    }

    /// File being declared
    pub fn filename(&self) -> &str {
        self.filename
    }

    /// Declare a suite inheriting its parent's options
    pub fn suite(&mut self, name: &str, body: impl FnOnce(&mut Self)) {
        self.suite_with(name, OptionOverrides::default(), body);
    }

    /// Declare a suite with option overrides
    pub fn suite_with(
        &mut self,
        name: &str,
        overrides: OptionOverrides,
        body: impl FnOnce(&mut Self),
    ) {
        if self.error.is_some() {
            return;
        }
        let id = self.child_id(name);
        if !self.claim(&id) {
            return;
        }

        let position = self.next_position();
        let options = overrides.apply(&self.current_options());
        self.frames.push(Frame {
            suite: Suite {
                id,
                name: name.to_string(),
                filename: self.filename.to_string(),
                options,
                children: Vec::new(),
                setup: Vec::new(),
                teardown: Vec::new(),
            },
            position,
        });

        body(self);

        if let Some(frame) = self.frames.pop() {
            self.attach(Node::Suite(frame.suite));
        }
    }

    /// Declare a benchmark inheriting its suite's options
    pub fn bench<F, T>(&mut self, name: &str, f: F)
    where
        F: Fn() -> T + 'static,
    {
        self.bench_with(name, OptionOverrides::default(), f);
    }

    /// Declare a benchmark with option overrides
    pub fn bench_with<F, T>(&mut self, name: &str, overrides: OptionOverrides, f: F)
    where
        F: Fn() -> T + 'static,
    {
        if self.error.is_some() {
            return;
        }
        let id = self.child_id(name);
        if !self.claim(&id) {
            return;
        }

        let mut path: Vec<usize> = self.frames.iter().map(|frame| frame.position).collect();
        path.push(self.next_position());
        self.benchmarks.push((id.clone(), path));

        let benchmark = Benchmark {
            id,
            name: name.to_string(),
            filename: self.filename.to_string(),
            options: overrides.apply(&self.current_options()),
            func: Rc::new(move || {
                black_box(f());
            }),
            result: None,
        };
        self.attach(Node::Benchmark(benchmark));
    }

    /// Run `f` before every attempt of each benchmark in the current suite
    pub fn setup(&mut self, f: impl Fn() + 'static) {
        self.add_hook("setup", Rc::new(f));
    }

    /// Run `f` after each benchmark in the current suite finishes
    pub fn teardown(&mut self, f: impl Fn() + 'static) {
        self.add_hook("teardown", Rc::new(f));
    }

    fn add_hook(&mut self, kind: &'static str, hook: Hook) {
        if self.error.is_some() {
            return;
        }
        match self.frames.last_mut() {
            Some(frame) if kind == "setup" => frame.suite.setup.push(hook),
            Some(frame) => frame.suite.teardown.push(hook),
            None => {
                self.error = Some(RegistryError::HookOutsideSuite {
                    kind,
                    filename: self.filename.to_string(),
                })
            }
        }
    }

    fn child_id(&self, name: &str) -> String {
        match self.frames.last() {
            Some(frame) => format!("{}{ID_SEPARATOR}{name}", frame.suite.id),
            None => format!("{}{ID_SEPARATOR}{name}", self.filename),
        }
    }

    fn claim(&mut self, id: &str) -> bool {
        if self.taken.contains(id) || !self.ids.insert(id.to_string()) {
            self.error = Some(RegistryError::DuplicateId(id.to_string()));
            return false;
        }
        true
    }

    fn current_options(&self) -> BenchmarkOptions {
        self.frames
            .last()
            .map(|frame| frame.suite.options)
            .unwrap_or(self.defaults)
    }

    fn next_position(&self) -> usize {
        match self.frames.last() {
            Some(frame) => frame.suite.children.len(),
            None => self.roots.len(),
        }
    }

    fn attach(&mut self, node: Node) {
        match self.frames.last_mut() {
            Some(frame) => frame.suite.children.push(node),
            None => self.roots.push(node),
        }
    }
}

/// The suite tree of every loaded definition file
pub struct Registry {
    defaults: BenchmarkOptions,
    source: Box<dyn DefinitionSource>,
    roots: Vec<Node>,
    ids: FxHashSet<String>,
    paths: FxHashMap<String, Vec<usize>>,
    order: Vec<String>,
    loaded: Vec<String>,
}

impl Registry {
    /// Registry over the files registered at link time
    pub fn new(defaults: BenchmarkOptions) -> Self {
        Self::with_source(defaults, InventorySource)
    }

    /// Registry over an explicit source
    pub fn with_source(defaults: BenchmarkOptions, source: impl DefinitionSource + 'static) -> Self {
        Self {
            defaults,
            source: Box::new(source),
            roots: Vec::new(),
            ids: FxHashSet::default(),
            paths: FxHashMap::default(),
            order: Vec::new(),
            loaded: Vec::new(),
        }
    }

    /// Options that root suites and benchmarks resolve against
    pub fn defaults(&self) -> &BenchmarkOptions {
        &self.defaults
    }

    /// Every file the source knows about, sorted
    pub fn available_files(&self) -> Vec<String> {
        self.source.filenames()
    }

    /// Files loaded so far, in load order
    pub fn loaded_files(&self) -> &[String] {
        &self.loaded
    }

    /// Run the declaration pass of each file, in order.
    ///
    /// Stops at the first failing file; files loaded before it stay loaded and
    /// nothing of the failing file is kept.
    pub fn add_files<I, S>(&mut self, filenames: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for filename in filenames {
            self.add_file(filename.as_ref())?;
        }
        Ok(())
    }

    fn add_file(&mut self, filename: &str) -> Result<(), RegistryError> {
        let declare = self
            .source
            .declaration(filename)
            .ok_or_else(|| RegistryError::UnknownFile(filename.to_string()))?;

        let mut declarations = Declarations::new(filename, self.defaults, &self.ids);
        declare(&mut declarations);

        let Declarations {
            ids,
            roots,
            benchmarks,
            error,
            ..
        } = declarations;
        if let Some(error) = error {
            return Err(error);
        }

        let offset = self.roots.len();
        for (id, mut path) in benchmarks {
            path[0] += offset;
            self.order.push(id.clone());
            self.paths.insert(id, path);
        }
        self.ids.extend(ids);
        self.roots.extend(roots);
        self.loaded.push(filename.to_string());

        tracing::debug!(filename, benchmarks = self.order.len(), "definition file loaded");
        Ok(())
    }

    /// Top-level nodes in declaration order
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Every benchmark in declaration order
    pub fn benchmarks(&self) -> Vec<&Benchmark> {
        self.order
            .iter()
            .filter_map(|id| self.get_benchmark(id))
            .collect()
    }

    /// Look up a benchmark by id
    pub fn get_benchmark(&self, id: &str) -> Option<&Benchmark> {
        let path = self.paths.get(id)?;
        match self.walk(path)?.last()? {
            Node::Benchmark(bench) => Some(bench),
            Node::Suite(_) => None,
        }
    }

    /// Setup and teardown hooks of every suite enclosing `id`
    pub fn hooks_for(&self, id: &str) -> Option<Hooks> {
        let path = self.paths.get(id)?;
        let nodes = self.walk(path)?;

        let suites: Vec<&Suite> = nodes
            .iter()
            .filter_map(|node| match node {
                Node::Suite(suite) => Some(suite),
                Node::Benchmark(_) => None,
            })
            .collect();

        // Teardowns unwind innermost first; hooks of one suite keep their order.
        Some(Hooks {
            setup: suites.iter().flat_map(|s| s.setup.iter().cloned()).collect(),
            teardown: suites
                .iter()
                .rev()
                .flat_map(|s| s.teardown.iter().cloned())
                .collect(),
        })
    }

    /// Attach the result of running `id`. A benchmark takes at most one result.
    pub fn attach_result(&mut self, id: &str, result: BenchResult) -> Result<(), RegistryError> {
        let path = self
            .paths
            .get(id)
            .ok_or_else(|| RegistryError::UnknownBenchmark(id.to_string()))?;

        let (first, rest) = path
            .split_first()
            .ok_or_else(|| RegistryError::UnknownBenchmark(id.to_string()))?;
        let mut node = self
            .roots
            .get_mut(*first)
            .ok_or_else(|| RegistryError::UnknownBenchmark(id.to_string()))?;
        for index in rest {
            node = match node {
                Node::Suite(suite) => suite
                    .children
                    .get_mut(*index)
                    .ok_or_else(|| RegistryError::UnknownBenchmark(id.to_string()))?,
                Node::Benchmark(_) => return Err(RegistryError::UnknownBenchmark(id.to_string())),
            };
        }

        match node {
            Node::Benchmark(bench) if bench.result.is_some() => {
                Err(RegistryError::ResultAlreadyAttached(id.to_string()))
            }
            Node::Benchmark(bench) => {
                bench.result = Some(result);
                Ok(())
            }
            Node::Suite(_) => Err(RegistryError::UnknownBenchmark(id.to_string())),
        }
    }

    /// Nodes along `path`, root first
    fn walk(&self, path: &[usize]) -> Option<Vec<&Node>> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        let mut nodes = vec![node];
        for index in rest {
            node = match node {
                Node::Suite(suite) => suite.children.get(*index)?,
                Node::Benchmark(_) => return None,
            };
            nodes.push(node);
        }
        Some(nodes)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("defaults", &self.defaults)
            .field("loaded", &self.loaded)
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isobench_stats::{ConfidenceLevel, FullAnalysis};
    use std::cell::RefCell;

    thread_local! {
        static TRACE: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    fn record(event: &'static str) {
        TRACE.with(|t| t.borrow_mut().push(event));
    }

    fn nested(d: &mut Declarations<'_>) {
        d.suite_with("A", OptionOverrides::new().max_samples(50), |d| {
            d.setup(|| record("setup A"));
            d.teardown(|| record("teardown A"));
            d.bench("first", || 1 + 1);
            d.suite_with("B", OptionOverrides::new().min_samples(9), |d| {
                d.setup(|| record("setup B"));
                d.teardown(|| record("teardown B"));
                d.bench_with("inner", OptionOverrides::new().max_tries(1), || ());
            });
            d.bench("last", || ());
        });
        d.bench("top", || ());
    }

    fn other(d: &mut Declarations<'_>) {
        d.suite("S", |d| d.bench("x", || ()));
    }

    fn duplicate(d: &mut Declarations<'_>) {
        d.suite("S", |d| {
            d.bench("x", || ());
            d.bench("x", || ());
            d.bench("never", || ());
        });
    }

    fn stray_hook(d: &mut Declarations<'_>) {
        d.bench("ok", || ());
        d.setup(|| ());
    }

    fn source() -> StaticSource {
        StaticSource::new([
            DefinitionFile::new("nested.rs", nested),
            DefinitionFile::new("other.rs", other),
            DefinitionFile::new("duplicate.rs", duplicate),
            DefinitionFile::new("stray.rs", stray_hook),
        ])
    }

    fn registry() -> Registry {
        Registry::with_source(BenchmarkOptions::default(), source())
    }

    fn dummy_result(id: &str) -> BenchResult {
        BenchResult {
            id: id.to_string(),
            name: "inner".to_string(),
            filename: "nested.rs".to_string(),
            stats: FullAnalysis::compute(&[1.0, 1.0], ConfidenceLevel::P99_9).unwrap(),
            times: vec![1.0, 1.0],
            count: 1,
            options: BenchmarkOptions::default(),
            attempts: 1,
            degraded: false,
        }
    }

    #[test]
    fn test_ids_follow_nesting() {
        let mut registry = registry();
        registry.add_files(["nested.rs"]).unwrap();

        let ids: Vec<&str> = registry.benchmarks().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "nested.rs:A:first",
                "nested.rs:A:B:inner",
                "nested.rs:A:last",
                "nested.rs:top"
            ]
        );
        assert_eq!(registry.roots().len(), 2);
        assert_eq!(registry.roots()[0].id(), "nested.rs:A");
    }

    #[test]
    fn test_options_inherit_down_the_tree() {
        let mut registry = registry();
        registry.add_files(["nested.rs"]).unwrap();
        let defaults = BenchmarkOptions::default();

        let inner = registry.get_benchmark("nested.rs:A:B:inner").unwrap();
        assert_eq!(inner.options.max_samples, 50);
        assert_eq!(inner.options.min_samples, 9);
        assert_eq!(inner.options.max_tries, 1);
        assert_eq!(inner.options.min_time_ns, defaults.min_time_ns);

        let first = registry.get_benchmark("nested.rs:A:first").unwrap();
        assert_eq!(first.options.max_samples, 50);
        assert_eq!(first.options.min_samples, defaults.min_samples);

        assert_eq!(registry.get_benchmark("nested.rs:top").unwrap().options, defaults);
    }

    #[test]
    fn test_hooks_order() {
        let mut registry = registry();
        registry.add_files(["nested.rs"]).unwrap();

        let hooks = registry.hooks_for("nested.rs:A:B:inner").unwrap();
        TRACE.with(|t| t.borrow_mut().clear());
        hooks.setup.iter().for_each(|h| h());
        hooks.teardown.iter().for_each(|h| h());
        let trace = TRACE.with(|t| t.borrow().clone());
        assert_eq!(trace, vec!["setup A", "setup B", "teardown B", "teardown A"]);

        let top = registry.hooks_for("nested.rs:top").unwrap();
        assert!(top.setup.is_empty() && top.teardown.is_empty());
    }

    #[test]
    fn test_files_load_independently() {
        let mut registry = registry();
        registry.add_files(["other.rs", "nested.rs"]).unwrap();

        assert!(registry.get_benchmark("other.rs:S:x").is_some());
        assert!(registry.get_benchmark("nested.rs:A:B:inner").is_some());
        assert_eq!(registry.loaded_files(), ["other.rs", "nested.rs"]);
        assert_eq!(registry.benchmarks().len(), 5);
    }

    #[test]
    fn test_duplicate_id_fails_fast() {
        let mut registry = registry();
        let err = registry.add_files(["duplicate.rs"]).unwrap_err();

        assert_eq!(err, RegistryError::DuplicateId("duplicate.rs:S:x".into()));
        assert!(registry.get_benchmark("duplicate.rs:S:never").is_none());
        assert!(registry.roots().is_empty());
    }

    #[test]
    fn test_loading_file_twice_is_duplicate() {
        let mut registry = registry();
        registry.add_files(["other.rs"]).unwrap();
        let err = registry.add_files(["other.rs"]).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("other.rs:S".into()));
        assert_eq!(registry.benchmarks().len(), 1);
    }

    #[test]
    fn test_hook_outside_suite() {
        let mut registry = registry();
        let err = registry.add_files(["stray.rs"]).unwrap_err();
        assert!(matches!(err, RegistryError::HookOutsideSuite { kind: "setup", .. }));
    }

    #[test]
    fn test_unknown_file() {
        let mut registry = registry();
        let err = registry.add_files(["missing.rs"]).unwrap_err();
        assert_eq!(err, RegistryError::UnknownFile("missing.rs".into()));
    }

    #[test]
    fn test_attach_result_once() {
        let mut registry = registry();
        registry.add_files(["nested.rs"]).unwrap();
        let id = "nested.rs:A:B:inner";

        registry.attach_result(id, dummy_result(id)).unwrap();
        assert!(registry.get_benchmark(id).unwrap().result().is_some());
        assert_eq!(
            registry.attach_result(id, dummy_result(id)),
            Err(RegistryError::ResultAlreadyAttached(id.into()))
        );
        assert_eq!(
            registry.attach_result("nested.rs:A", dummy_result(id)),
            Err(RegistryError::UnknownBenchmark("nested.rs:A".into()))
        );
    }

    #[test]
    fn test_suite_id_is_not_a_benchmark() {
        let mut registry = registry();
        registry.add_files(["nested.rs"]).unwrap();
        assert!(registry.get_benchmark("nested.rs:A").is_none());
        assert!(registry.hooks_for("nested.rs:A").is_none());
    }

    #[test]
    fn test_declaration_is_deterministic() {
        let mut a = registry();
        let mut b = registry();
        a.add_files(["nested.rs", "other.rs"]).unwrap();
        b.add_files(["nested.rs", "other.rs"]).unwrap();

        let ids_a: Vec<&str> = a.benchmarks().iter().map(|x| x.id.as_str()).collect();
        let ids_b: Vec<&str> = b.benchmarks().iter().map(|x| x.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_available_files_sorted() {
        assert_eq!(
            registry().available_files(),
            vec!["duplicate.rs", "nested.rs", "other.rs", "stray.rs"]
        );
    }
}

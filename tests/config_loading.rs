// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use tempfile::NamedTempFile;

use cachedag::cli::CliArgs;
use cachedag::config::{default_config_path, load_and_validate, parse_str, PlanFile, PlanOverrides};
use cachedag::errors::CachedagError;
use cachedag::types::{CacheStrategy, OrderStrategy};
use cachedag_test_utils::builders::{NodeConfigBuilder, PlanFileBuilder};

fn write_plan(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_plan_file_loads_with_defaults() {
    let file = write_plan(
        r#"
[plan]
memory_limit = 10
order_strategy = "ma-dfs"

[node.A]
size = 10

[node.B]
size = 5
score = 3.0
after = ["A"]

[node.C]
size = 5
score = 3.0
after = ["A"]

[node.D]
size = 1
after = ["B", "C"]
"#,
    );

    let plan = load_and_validate(file.path()).unwrap();
    let graph = plan.graph();

    assert_eq!(graph.len(), 4);
    assert_eq!(plan.memory_limit(), 10);
    assert_eq!(plan.sizes(), &[10, 5, 5, 1]);
    assert_eq!(plan.scores(), &[0.0, 3.0, 3.0, 0.0]);
    assert_eq!(graph.names(graph.dependencies(graph.id("D").unwrap())), vec!["B", "C"]);

    let settings = plan.optimizer_settings();
    assert_eq!(settings.cache_strategy, CacheStrategy::Mkp);
    assert_eq!(settings.order_strategy, OrderStrategy::MaDfs);
    assert_eq!(settings.max_iters, 100);
    assert_eq!(settings.seed, None);
    assert_eq!(settings.annealing_iterations, 10_000);
    assert_eq!(settings.solver_timeout, Duration::from_secs(10));

    let runtime = plan.runtime_options();
    assert!(runtime.write_behind);
    assert!(runtime.async_release);
}

#[test]
fn node_ids_follow_name_order() {
    let plan = PlanFileBuilder::new(5)
        .with_node("zeta", NodeConfigBuilder::new(1, 1.0).build())
        .with_node("alpha", NodeConfigBuilder::new(2, 1.0).after("zeta").build())
        .build();

    let graph = plan.graph();
    assert_eq!(graph.id("alpha").unwrap().index(), 0);
    assert_eq!(graph.id("zeta").unwrap().index(), 1);
    assert_eq!(plan.sizes(), &[2, 1]);
}

#[test]
fn builder_toml_round_trips_through_the_loader() {
    let builder = PlanFileBuilder::new(42)
        .cache_strategy(CacheStrategy::Heuristic)
        .order_strategy(OrderStrategy::Separator)
        .max_iters(3)
        .seed(Some(99))
        .write_behind(false)
        .with_node("A", NodeConfigBuilder::new(4, 0.5).build())
        .with_node("B", NodeConfigBuilder::new(1, 0.0).after("A").build());

    let raw = parse_str(&builder.to_toml()).unwrap();
    let plan = PlanFile::try_from(raw).unwrap();

    let settings = plan.optimizer_settings();
    assert_eq!(settings.cache_strategy, CacheStrategy::Heuristic);
    assert_eq!(settings.order_strategy, OrderStrategy::Separator);
    assert_eq!(settings.max_iters, 3);
    assert_eq!(settings.seed, Some(99));
    assert!(!plan.runtime_options().write_behind);
    assert_eq!(plan.scores(), &[0.5, 0.0]);
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = write_plan(
        r#"
[plan]
memory_limit = 10

[node.A]
after = ["B"]

[node.B]
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(CachedagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_config_error() {
    let file = write_plan(
        r#"
[plan]
memory_limit = 10

[node.A]
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(CachedagError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn self_dependency_returns_config_error() {
    let file = write_plan(
        r#"
[plan]
memory_limit = 10

[node.A]
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(CachedagError::ConfigError(msg)) => assert!(msg.contains("cannot depend on itself")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn invalid_plan_sections_are_rejected() {
    let cases = [
        ("[plan]\nmemory_limit = 10\n", "at least one"),
        ("[plan]\nmemory_limit = 0\n\n[node.A]\n", "memory_limit"),
        ("[plan]\nmemory_limit = 10\nmax_iters = 0\n\n[node.A]\n", "max_iters"),
        ("[plan]\nmemory_limit = 10\n\n[node.A]\nscore = -1.0\n", "invalid score"),
        ("[plan]\nmemory_limit = 10\n\n[node.A]\nscore = nan\n", "invalid score"),
    ];

    for (contents, expected) in cases {
        let file = write_plan(contents);
        match load_and_validate(file.path()) {
            Err(CachedagError::ConfigError(msg)) => {
                assert!(msg.contains(expected), "{msg:?} should mention {expected:?}")
            }
            Err(e) => panic!("Expected ConfigError for {contents:?}, got: {:?}", e),
            Ok(_) => panic!("Expected error for {contents:?}, got Ok"),
        }
    }
}

#[test]
fn unknown_strategy_is_a_parse_error() {
    let file = write_plan(
        r#"
[plan]
memory_limit = 10
cache_strategy = "fastest"

[node.A]
"#,
    );

    match load_and_validate(file.path()) {
        Err(CachedagError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("missing.toml"));
    assert!(matches!(result, Err(CachedagError::IoError(_))));
}

#[test]
fn cli_defaults_and_flags() {
    let args = CliArgs::parse_from(["cachedag"]);
    assert_eq!(args.config, default_config_path().to_string_lossy());
    assert!(!args.dry_run);
    assert!(args.log_level.is_none());

    let args = CliArgs::parse_from(["cachedag", "--config", "plans/etl.toml", "--dry-run", "--log-level", "debug"]);
    assert_eq!(args.config, "plans/etl.toml");
    assert!(args.dry_run);
    assert!(args.log_level.is_some());
}

#[test]
fn cli_flags_override_the_plan_section() {
    let mut plan = PlanFileBuilder::new(10)
        .seed(Some(1))
        .with_node("A", NodeConfigBuilder::new(4, 1.0).build())
        .build();

    plan.apply_overrides(&PlanOverrides::default()).unwrap();
    assert_eq!(plan.optimizer_settings().seed, Some(1));
    assert_eq!(plan.memory_limit(), 10);

    let args = CliArgs::parse_from([
        "cachedag",
        "--cache-strategy",
        "greedy",
        "--order-strategy",
        "separator",
        "--memory-limit",
        "64",
        "--seed",
        "5",
    ]);
    plan.apply_overrides(&args.overrides()).unwrap();

    let settings = plan.optimizer_settings();
    assert_eq!(settings.cache_strategy, CacheStrategy::Greedy);
    assert_eq!(settings.order_strategy, OrderStrategy::Separator);
    assert_eq!(settings.seed, Some(5));
    assert_eq!(plan.memory_limit(), 64);
    assert_eq!(plan.problem().unwrap().memory_limit, 64);

    let zero = CliArgs::parse_from(["cachedag", "--memory-limit", "0"]);
    match plan.apply_overrides(&zero.overrides()) {
        Err(CachedagError::ConfigError(msg)) => assert!(msg.contains("memory limit")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
    assert_eq!(plan.memory_limit(), 64);

    assert!(CliArgs::try_parse_from(["cachedag", "--cache-strategy", "fastest"]).is_err());
}

#[test]
fn strategy_names_parse_from_strings() {
    assert_eq!("MKP".parse::<CacheStrategy>(), Ok(CacheStrategy::Mkp));
    assert_eq!("sa".parse::<OrderStrategy>(), Ok(OrderStrategy::SimulatedAnnealing));
    assert_eq!("ma-dfs".parse::<OrderStrategy>(), Ok(OrderStrategy::MaDfs));
    assert!("fastest".parse::<CacheStrategy>().is_err());
}
